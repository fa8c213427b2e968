//! Session-bound client for the wishlist service.
//!
//! # Design
//! `WishlistClient` is built per inbound request. It owns a handle to the
//! visitor's `Session`, the `RequestContext` and a `Fetch` implementation;
//! `WishlistRequests` shapes every request. Each operation first makes sure
//! an identity pair is in the session (bootstrapping one if not), then issues
//! exactly one call of its own and interprets the status.
//!
//! Failures split two ways. Most operations return a named `WishlistError`.
//! `fetch_lists` and `validate_guest_sync` feed page rendering, so a failure
//! of their own call comes back as `SoftResult::Err` instead; a failed
//! bootstrap ahead of them still propagates.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{CacheOptions, CacheStrategy};
use crate::config::WishlistConfig;
use crate::context::RequestContext;
use crate::error::{ListOp, ShareOp, TransportError, WishlistError};
use crate::fetch::Fetch;
use crate::http::{HttpRequest, HttpResponse};
use crate::requests::{Credentials, WishlistRequests};
use crate::session::{Session, SessionKey};
use crate::types::{GuestSync, Identity, ItemRef, SoftResult, WishlistList};

/// One outbound call kind: its cache key and log name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    GenerateRegId,
    CreateList,
    UpdateList,
    RemoveItem,
    FetchLists,
    FetchListWithContents,
    GuestValidateSync,
    MarkPublic,
    EmailShare,
    ReportShare,
}

impl Call {
    fn cache_key(self) -> &'static str {
        match self {
            Call::GenerateRegId => "generate-regid",
            Call::CreateList => "create-list",
            Call::UpdateList => "update-list",
            Call::RemoveItem => "remove-item",
            Call::FetchLists => "fetch-lists",
            Call::FetchListWithContents => "fetch-list-with-contents",
            Call::GuestValidateSync => "guest-validate-sync",
            Call::MarkPublic => "mark-public",
            Call::EmailShare => "email-share",
            Call::ReportShare => "report-share",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Call::GenerateRegId => "generateRegId",
            Call::CreateList => "createList",
            Call::UpdateList => "updateList",
            Call::RemoveItem => "removeItem",
            Call::FetchLists => "fetchLists",
            Call::FetchListWithContents => "fetchListWithContents",
            Call::GuestValidateSync => "guestValidateSync",
            Call::MarkPublic => "markListPublic",
            Call::EmailShare => "emailShare",
            Call::ReportShare => "reportShareEvent",
        }
    }
}

pub struct WishlistClient<S, F> {
    requests: WishlistRequests,
    default_list_name: String,
    context: RequestContext,
    session: S,
    fetcher: F,
}

impl<S: Session, F: Fetch> WishlistClient<S, F> {
    pub fn new(config: &WishlistConfig, context: RequestContext, session: S, fetcher: F) -> Self {
        Self {
            requests: WishlistRequests::new(config),
            default_list_name: config.default_list_name.clone(),
            context,
            session,
            fetcher,
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn into_parts(self) -> (S, F) {
        (self.session, self.fetcher)
    }

    /// The identity pair currently in the session, if complete.
    pub fn identity(&self) -> Option<(String, String)> {
        let regid = self.session.get(SessionKey::RegId)?;
        let sessionid = self.session.get(SessionKey::SessionId)?;
        Some((regid, sessionid))
    }

    /// Bootstrap an identity unless the session already holds one.
    pub fn ensure_identity(&mut self) -> Result<(), WishlistError> {
        if self.identity().is_none() {
            self.bootstrap_identity(CacheStrategy::None)?;
        }
        Ok(())
    }

    /// Forget the registration identity, as on logout.
    pub fn forget_identity(&mut self) {
        crate::session::clear_identity(&mut self.session);
    }

    /// Ask the service for a fresh identity pair and store it in the session.
    ///
    /// Uses the request's `useremail` query parameter when present, a random
    /// UUID otherwise. The session is only written on success.
    pub fn bootstrap_identity(&mut self, cache: CacheStrategy) -> Result<Identity, WishlistError> {
        let useremail = self.context.useremail();
        let request = self
            .requests
            .build_generate_regid(useremail, Uuid::new_v4());

        let identity: Identity = self
            .call(request, Call::GenerateRegId, cache)
            .map_err(|reason| {
                warn!(%reason, "failed to generate regid");
                WishlistError::Bootstrap(reason)
            })?;

        self.session
            .set(SessionKey::SessionId, identity.sessionid.clone());
        self.session.set(SessionKey::RegId, identity.regid.clone());
        info!(identified = useremail.is_some(), "wishlist identity bootstrapped");
        Ok(identity)
    }

    /// Create a list. `None` uses the configured default name. The name is
    /// passed through unchecked; see `validate_list_name`.
    pub fn create_list(
        &mut self,
        name: Option<&str>,
        cache: CacheStrategy,
    ) -> Result<WishlistList, WishlistError> {
        let (regid, sessionid) = self.credentials()?;
        let lname = name.unwrap_or(&self.default_list_name);
        let request = self
            .requests
            .build_create_list(lname, creds(&regid, &sessionid));
        self.call(request, Call::CreateList, cache)
            .map_err(|reason| list_failure(ListOp::Create, reason))
    }

    /// Add an item, provisioning the visitor's first list if needed.
    ///
    /// With a non-empty `list_id` the item goes straight there. Otherwise the
    /// first list the service returns is the target, and when there is none
    /// (or the lookup degraded) a default-named list is created first.
    pub fn add_item(
        &mut self,
        item: &ItemRef,
        list_id: Option<&str>,
        cache: CacheStrategy,
    ) -> Result<Value, WishlistError> {
        self.ensure_identity()?;

        if let Some(lid) = list_id.filter(|lid| !lid.is_empty()) {
            return self.update_list(item, lid, cache);
        }

        let first = self
            .fetch_lists(CacheStrategy::None)?
            .ok()
            .and_then(|lists| lists.into_iter().next())
            .filter(|list| !list.lid.is_empty());

        let lid = match first {
            Some(list) => list.lid,
            None => {
                debug!("no wishlist yet, creating the default one");
                self.create_list(None, CacheStrategy::None)?.lid
            }
        };

        self.update_list(item, &lid, cache)
    }

    pub fn update_list(
        &mut self,
        item: &ItemRef,
        list_id: &str,
        cache: CacheStrategy,
    ) -> Result<Value, WishlistError> {
        let (regid, sessionid) = self.credentials()?;
        let request =
            self.requests
                .build_update_list(item, list_id, creds(&regid, &sessionid))?;
        self.call(request, Call::UpdateList, cache)
            .map_err(|reason| list_failure(ListOp::Update, reason))
    }

    pub fn remove_item(
        &mut self,
        item: &ItemRef,
        list_id: &str,
        cache: CacheStrategy,
    ) -> Result<Value, WishlistError> {
        let (regid, sessionid) = self.credentials()?;
        let request =
            self.requests
                .build_remove_item(item, list_id, creds(&regid, &sessionid))?;
        self.call(request, Call::RemoveItem, cache)
            .map_err(|reason| list_failure(ListOp::Remove, reason))
    }

    /// All of the visitor's lists, in service order. Soft-degrades.
    pub fn fetch_lists(
        &mut self,
        cache: CacheStrategy,
    ) -> Result<SoftResult<Vec<WishlistList>>, WishlistError> {
        let (regid, sessionid) = self.credentials()?;
        let request = self.requests.build_fetch_lists(creds(&regid, &sessionid));
        Ok(match self.call(request, Call::FetchLists, cache) {
            Ok(lists) => SoftResult::Ok(lists),
            Err(reason) => {
                warn!(%reason, "failed to load wishlist");
                SoftResult::error("Failed to load wishlist")
            }
        })
    }

    pub fn fetch_list_with_contents(
        &mut self,
        list_id: &str,
        cache: CacheStrategy,
    ) -> Result<Value, WishlistError> {
        let (regid, sessionid) = self.credentials()?;
        let request = self
            .requests
            .build_fetch_list_with_contents(list_id, creds(&regid, &sessionid));
        self.call(request, Call::FetchListWithContents, cache)
            .map_err(|reason| list_failure(ListOp::FetchContents, reason))
    }

    /// Associate `email` with the current regid. On success the session's
    /// regid is replaced by the one the service merged into. Soft-degrades.
    pub fn validate_guest_sync(
        &mut self,
        email: &str,
        cache: CacheStrategy,
    ) -> Result<SoftResult<GuestSync>, WishlistError> {
        let (regid, _) = self.credentials()?;
        let request = self.requests.build_guest_validate_sync(&regid, email);
        Ok(match self.call::<GuestSync>(request, Call::GuestValidateSync, cache) {
            Ok(synced) => {
                self.session.set(SessionKey::RegId, synced.regid.clone());
                info!(merged = synced.regid != regid, "guest identity synced");
                SoftResult::Ok(synced)
            }
            Err(reason) => {
                warn!(%reason, "failed to sync guest identity");
                SoftResult::error("Failed to sync")
            }
        })
    }

    pub fn mark_list_public(
        &mut self,
        list_id: &str,
        cache: CacheStrategy,
    ) -> Result<Value, WishlistError> {
        let (regid, sessionid) = self.credentials()?;
        let request = self
            .requests
            .build_mark_public(list_id, creds(&regid, &sessionid));
        self.call(request, Call::MarkPublic, cache)
            .map_err(|reason| share_failure(ShareOp::MarkPublic, reason))
    }

    pub fn email_share(
        &mut self,
        list_id: &str,
        sender_name: &str,
        recipient_email: &str,
        cache: CacheStrategy,
    ) -> Result<Value, WishlistError> {
        let (regid, sessionid) = self.credentials()?;
        let request = self.requests.build_email_share(
            list_id,
            sender_name,
            recipient_email,
            creds(&regid, &sessionid),
        );
        self.call(request, Call::EmailShare, cache)
            .map_err(|reason| share_failure(ShareOp::Email, reason))
    }

    pub fn report_share_event(
        &mut self,
        list_id: &str,
        medium: &str,
        sender_name: &str,
        cache: CacheStrategy,
    ) -> Result<Value, WishlistError> {
        let (regid, sessionid) = self.credentials()?;
        let request = self.requests.build_report_share(
            list_id,
            medium,
            sender_name,
            creds(&regid, &sessionid),
        );
        self.call(request, Call::ReportShare, cache)
            .map_err(|reason| share_failure(ShareOp::ReportShare, reason))
    }

    /// Ensure an identity, then hand back owned copies of the pair.
    fn credentials(&mut self) -> Result<(String, String), WishlistError> {
        self.ensure_identity()?;
        self.identity().ok_or_else(|| {
            WishlistError::Bootstrap("session has no identity after bootstrap".to_string())
        })
    }

    /// Issue one request and decode its body. `Err` carries a reason string
    /// for the caller to wrap in its own failure.
    fn call<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
        call: Call,
        cache: CacheStrategy,
    ) -> Result<T, String> {
        let options = CacheOptions {
            key: call.cache_key(),
            strategy: cache,
            display_name: call.display_name(),
        };
        debug!(
            op = options.display_name,
            cache_key = options.key,
            cache = %cache.cache_control(),
            "calling wishlist service"
        );

        let response = self
            .fetcher
            .fetch(&request, &options)
            .map_err(|TransportError(e)| e)?;
        decode(&response)
    }
}

fn creds<'a>(regid: &'a str, sessionid: &'a str) -> Credentials<'a> {
    Credentials { regid, sessionid }
}

/// Map a non-2xx status to a reason, then parse the JSON body. An empty
/// body decodes as JSON `null`.
fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, String> {
    if !response.is_success() {
        return Err(format!("HTTP {}: {}", response.status, response.body));
    }
    let body = if response.body.trim().is_empty() {
        "null"
    } else {
        response.body.as_str()
    };
    serde_json::from_str(body).map_err(|e| format!("invalid response body: {e}"))
}

fn list_failure(kind: ListOp, reason: String) -> WishlistError {
    warn!(op = kind.as_str(), %reason, "wishlist list operation failed");
    WishlistError::ListOperation { kind, reason }
}

fn share_failure(kind: ShareOp, reason: String) -> WishlistError {
    warn!(op = kind.as_str(), %reason, "wishlist share operation failed");
    WishlistError::ShareOperation { kind, reason }
}
