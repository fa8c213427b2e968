//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock wishlist service on a random port, then drives
//! `WishlistClient` over real HTTP with `UreqFetcher`. Each test builds one
//! client per simulated page request around a shared `MemorySession`, the
//! way a storefront would.

use mock_server::{Db, API_KEY, PID};
use wishlist_core::{
    CacheStrategy, ItemRef, ListOp, MemoryCache, MemorySession, RequestContext, Session,
    SessionKey, SoftResult, UreqFetcher, WishlistClient, WishlistConfig, WishlistError,
};

/// Start the mock server on a random port; returns its base URL and state.
fn start_server() -> (String, Db) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let db = mock_server::new_db();
    let server_db = db.clone();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with(listener, server_db).await
        })
        .unwrap();
    });

    (format!("http://{addr}"), db)
}

fn client<'s>(
    base: &str,
    session: &'s mut MemorySession,
) -> WishlistClient<&'s mut MemorySession, UreqFetcher> {
    let config = WishlistConfig::new(base, PID, API_KEY);
    WishlistClient::new(&config, RequestContext::default(), session, UreqFetcher::new())
}

fn hits(db: &Db, endpoint: &str) -> usize {
    db.blocking_read().hits(endpoint)
}

#[test]
fn wishlist_lifecycle() {
    let (base, db) = start_server();
    let mut session = MemorySession::new();
    let shoes = ItemRef::new(100, 200, format!("{base}/products/shoes"));
    let hat = ItemRef::new(101, 201, format!("{base}/products/hat"));

    // Step 1: first add provisions identity and the default list.
    client(&base, &mut session)
        .add_item(&shoes, None, CacheStrategy::None)
        .unwrap();
    assert_eq!(hits(&db, "generate-regid"), 1);
    assert_eq!(hits(&db, "create"), 1);
    assert_eq!(hits(&db, "update-ctx"), 1);
    assert!(session.get(SessionKey::RegId).is_some());
    assert!(session.get(SessionKey::SessionId).is_some());

    // Step 2: second add reuses both.
    client(&base, &mut session)
        .add_item(&hat, None, CacheStrategy::None)
        .unwrap();
    assert_eq!(hits(&db, "generate-regid"), 1);
    assert_eq!(hits(&db, "create"), 1);

    // Step 3: one list holding two items.
    let lists = client(&base, &mut session)
        .fetch_lists(CacheStrategy::None)
        .unwrap()
        .ok()
        .expect("lists should load");
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].lname, "My Wishlist");
    assert_eq!(lists[0].extra["cnt"], 2);
    let lid = lists[0].lid.clone();

    // Step 4: contents.
    let contents = client(&base, &mut session)
        .fetch_list_with_contents(&lid, CacheStrategy::None)
        .unwrap();
    assert_eq!(contents["items"].as_array().unwrap().len(), 2);
    assert_eq!(contents["items"][0]["cprops"]["ou"], shoes.product_url.as_str());

    // Step 5: remove one.
    client(&base, &mut session)
        .remove_item(&shoes, &lid, CacheStrategy::None)
        .unwrap();
    let contents = client(&base, &mut session)
        .fetch_list_with_contents(&lid, CacheStrategy::None)
        .unwrap();
    assert_eq!(contents["items"][0]["epi"], 201);

    // Step 6: an explicit second list.
    let gifts = client(&base, &mut session)
        .create_list(Some("Gifts"), CacheStrategy::None)
        .unwrap();
    client(&base, &mut session)
        .add_item(&shoes, Some(&gifts.lid), CacheStrategy::None)
        .unwrap();
    let lists = client(&base, &mut session)
        .fetch_lists(CacheStrategy::None)
        .unwrap()
        .ok()
        .unwrap();
    assert_eq!(lists.len(), 2);
    assert_eq!(lists[1].extra["cnt"], 1);

    // Step 7: sharing.
    let mut c = client(&base, &mut session);
    c.mark_list_public(&lid, CacheStrategy::None).unwrap();
    c.email_share(&lid, "Jane", "bob@example.com", CacheStrategy::None)
        .unwrap();
    c.report_share_event(&lid, "copylink", "Jane", CacheStrategy::None)
        .unwrap();
    drop(c);
    let shares = db.blocking_read().shares.clone();
    assert_eq!(shares.len(), 2);
    assert_eq!(shares[0].toemail.as_deref(), Some("bob@example.com"));
    assert_eq!(shares[1].medium, "copylink");
}

#[test]
fn typed_failures_and_soft_degrades() {
    let (base, db) = start_server();
    let mut session = MemorySession::new();

    let mut c = client(&base, &mut session);
    c.create_list(Some("Saved"), CacheStrategy::None).unwrap();
    let err = c
        .create_list(Some("Saved"), CacheStrategy::None)
        .unwrap_err();
    assert!(matches!(err, WishlistError::ListOperation { kind: ListOp::Create, .. }));

    let err = c
        .fetch_list_with_contents("missing", CacheStrategy::None)
        .unwrap_err();
    assert!(matches!(err, WishlistError::ListOperation { kind: ListOp::FetchContents, .. }));

    let err = c
        .email_share("missing", "Jane", "bob@example.com", CacheStrategy::None)
        .unwrap_err();
    assert_eq!(err.operation(), "email");

    db.blocking_write().failing.push("fetch-lists");
    let soft = c.fetch_lists(CacheStrategy::None).unwrap();
    assert!(matches!(soft, SoftResult::Err(_)));
    assert_eq!(soft.status(), 500);
}

#[test]
fn bad_credentials_fail_bootstrap() {
    let (base, db) = start_server();
    let mut session = MemorySession::new();
    let config = WishlistConfig::new(&base, PID, "wrong-key");
    let mut c = WishlistClient::new(&config, RequestContext::default(), &mut session, UreqFetcher::new());

    let err = c.create_list(None, CacheStrategy::None).unwrap_err();
    assert!(matches!(err, WishlistError::Bootstrap(_)));
    drop(c);
    assert!(session.is_empty());
    assert_eq!(hits(&db, "create"), 0);
}

#[test]
fn guest_sync_after_login() {
    let (base, _db) = start_server();

    // A returning shopper already owns a list.
    let mut owner_session = MemorySession::new();
    let config = WishlistConfig::new(&base, PID, API_KEY);
    let context = RequestContext::from_url(&format!("{base}/account?useremail=jane%40example.com"));
    let mut owner = WishlistClient::new(&config, context, &mut owner_session, UreqFetcher::new());
    owner.create_list(Some("Owned"), CacheStrategy::None).unwrap();
    let owner_regid = owner.identity().unwrap().0;
    drop(owner);

    // The same shopper browsing anonymously, then logging in.
    let mut guest_session = MemorySession::new();
    client(&base, &mut guest_session)
        .create_list(Some("Guest"), CacheStrategy::None)
        .unwrap();
    let synced = client(&base, &mut guest_session)
        .validate_guest_sync("jane@example.com", CacheStrategy::None)
        .unwrap()
        .ok()
        .unwrap();
    assert_eq!(synced.regid, owner_regid);
    assert_eq!(guest_session.get(SessionKey::RegId), Some(owner_regid));

    let names: Vec<String> = client(&base, &mut guest_session)
        .fetch_lists(CacheStrategy::None)
        .unwrap()
        .ok()
        .unwrap()
        .into_iter()
        .map(|l| l.lname)
        .collect();
    assert_eq!(names, vec!["Owned", "Guest"]);
}

#[test]
fn logout_forces_fresh_identity() {
    let (base, db) = start_server();
    let mut session = MemorySession::new();

    client(&base, &mut session).ensure_identity().unwrap();
    let first = session.get(SessionKey::RegId).unwrap();

    client(&base, &mut session).forget_identity();
    client(&base, &mut session)
        .fetch_lists(CacheStrategy::None)
        .unwrap();

    assert_eq!(hits(&db, "generate-regid"), 2);
    assert_ne!(session.get(SessionKey::RegId).unwrap(), first);
}

#[test]
fn memory_cache_serves_repeat_reads() {
    let (base, db) = start_server();
    let config = WishlistConfig::new(&base, PID, API_KEY);
    let cache = MemoryCache::new(UreqFetcher::new());
    let mut session = MemorySession::new();

    for _ in 0..3 {
        let mut c = WishlistClient::new(&config, RequestContext::default(), &mut session, cache.clone());
        let lists = c.fetch_lists(CacheStrategy::Long).unwrap();
        assert!(lists.is_ok());
    }
    assert_eq!(hits(&db, "fetch-lists"), 1);

    let mut c = WishlistClient::new(&config, RequestContext::default(), &mut session, cache.clone());
    c.fetch_lists(CacheStrategy::None).unwrap();
    assert_eq!(hits(&db, "fetch-lists"), 2);
}
