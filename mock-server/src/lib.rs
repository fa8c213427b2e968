//! In-memory stand-in for the wishlist service, for tests and local runs.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Form, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub const PID: &str = "test-pid";
pub const API_KEY: &str = "test-key";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub epi: u64,
    pub empi: u64,
    pub du: String,
    #[serde(default = "default_qty")]
    pub qty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cprops: Option<Value>,
}

fn default_qty() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize)]
pub struct List {
    pub lid: String,
    pub lname: String,
    pub public: bool,
    pub items: Vec<Item>,
}

impl List {
    fn summary(&self) -> Value {
        json!({
            "lid": self.lid,
            "lname": self.lname,
            "cnt": self.items.len(),
            "public": self.public,
            "listcontents": self.items,
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct Visitor {
    pub sessions: Vec<String>,
    pub lists: Vec<List>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Share {
    pub lid: String,
    pub fromname: String,
    pub medium: String,
    pub toemail: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    pid: String,
    api_key: String,
    pub visitors: HashMap<String, Visitor>,
    pub emails: HashMap<String, String>,
    pub shares: Vec<Share>,
    /// Requests seen per endpoint name.
    pub hits: HashMap<&'static str, usize>,
    /// Endpoints answering 500 until cleared.
    pub failing: Vec<&'static str>,
}

impl Store {
    pub fn new(pid: &str, api_key: &str) -> Self {
        Self {
            pid: pid.to_string(),
            api_key: api_key.to_string(),
            ..Self::default()
        }
    }

    pub fn hits(&self, endpoint: &str) -> usize {
        self.hits.get(endpoint).copied().unwrap_or(0)
    }

    fn list_mut(&mut self, regid: &str, lid: &str) -> Result<&mut List, Rejection> {
        self.visitors
            .get_mut(regid)
            .and_then(|v| v.lists.iter_mut().find(|l| l.lid == lid))
            .ok_or_else(|| reject(StatusCode::NOT_FOUND, "list not found"))
    }
}

pub type Db = Arc<RwLock<Store>>;

type Rejection = (StatusCode, Json<Value>);
type ApiResult = Result<Json<Value>, Rejection>;

fn reject(status: StatusCode, message: &str) -> Rejection {
    (status, Json(json!({ "error": message })))
}

pub fn new_db() -> Db {
    Arc::new(RwLock::new(Store::new(PID, API_KEY)))
}

pub fn app() -> Router {
    router(new_db())
}

pub fn router(db: Db) -> Router {
    Router::new()
        .route("/storeadmin/v3/user/generate-regid", post(generate_regid))
        .route("/storeadmin/v3/user/guest-validate-sync", post(guest_validate_sync))
        .route("/api/v3/lists/create", post(create_list))
        .route("/api/v3/lists/update-ctx", post(update_ctx))
        .route("/api/v3/lists/fetch-lists", post(fetch_lists))
        .route("/api/v3/lists/fetch-list-with-contents", post(fetch_list_with_contents))
        .route("/api/v3/lists/markPublic", post(mark_public))
        .route("/api/v3/lists/emailList", post(email_list))
        .route("/api/v3/lists/reportShare", post(report_share))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, new_db()).await
}

pub async fn run_with(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, router(db)).await
}

#[derive(Deserialize)]
pub struct PidQuery {
    pub pid: Option<String>,
}

#[derive(Deserialize)]
pub struct Auth {
    pub regid: String,
    pub sessionid: String,
}

/// Count the hit and fail it if scripted to.
fn enter(store: &mut Store, endpoint: &'static str) -> Result<(), Rejection> {
    debug!(endpoint, "mock wishlist request");
    *store.hits.entry(endpoint).or_default() += 1;
    if store.failing.contains(&endpoint) {
        return Err(reject(StatusCode::INTERNAL_SERVER_ERROR, "scripted failure"));
    }
    Ok(())
}

fn check_pid(store: &Store, query: &PidQuery) -> Result<(), Rejection> {
    match query.pid.as_deref() {
        Some(pid) if pid == store.pid => Ok(()),
        _ => Err(reject(StatusCode::FORBIDDEN, "unknown pid")),
    }
}

fn check_basic(store: &Store, headers: &HeaderMap) -> Result<(), Rejection> {
    let expected = format!("Basic {}", STANDARD.encode(format!("{}:{}", store.pid, store.api_key)));
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(reject(StatusCode::UNAUTHORIZED, "invalid credentials")),
    }
}

fn check_session(store: &Store, auth: &Auth) -> Result<(), Rejection> {
    match store.visitors.get(&auth.regid) {
        Some(visitor) if visitor.sessions.contains(&auth.sessionid) => Ok(()),
        _ => Err(reject(StatusCode::UNAUTHORIZED, "invalid regid/sessionid")),
    }
}

#[derive(Deserialize)]
pub struct GenerateRegId {
    pub useragenttype: Option<String>,
    pub useremail: Option<String>,
    pub uuid: Option<String>,
}

async fn generate_regid(
    State(db): State<Db>,
    headers: HeaderMap,
    Form(input): Form<GenerateRegId>,
) -> ApiResult {
    let mut store = db.write().await;
    enter(&mut store, "generate-regid")?;
    check_basic(&store, &headers)?;
    if input.useragenttype.is_none() {
        return Err(reject(StatusCode::BAD_REQUEST, "useragenttype required"));
    }

    let sessionid = Uuid::new_v4().to_string();
    let regid = match (input.useremail, input.uuid) {
        (Some(email), _) => match store.emails.get(&email).cloned() {
            Some(existing) => existing,
            None => {
                let regid = Uuid::new_v4().to_string();
                store.emails.insert(email, regid.clone());
                regid
            }
        },
        (None, Some(_)) => Uuid::new_v4().to_string(),
        (None, None) => return Err(reject(StatusCode::BAD_REQUEST, "useremail or uuid required")),
    };

    store
        .visitors
        .entry(regid.clone())
        .or_default()
        .sessions
        .push(sessionid.clone());
    Ok(Json(json!({ "regid": regid, "sessionid": sessionid })))
}

#[derive(Deserialize)]
pub struct GuestValidateSync {
    pub regid: String,
    pub useremail: String,
    pub useragenttype: Option<String>,
}

/// Bind an email to a regid. If the email already belongs to another regid,
/// the guest's lists and sessions move there and that regid is returned.
async fn guest_validate_sync(
    State(db): State<Db>,
    headers: HeaderMap,
    Form(input): Form<GuestValidateSync>,
) -> ApiResult {
    let mut store = db.write().await;
    enter(&mut store, "guest-validate-sync")?;
    check_basic(&store, &headers)?;
    if !store.visitors.contains_key(&input.regid) {
        return Err(reject(StatusCode::NOT_FOUND, "unknown regid"));
    }

    let target = match store.emails.get(&input.useremail).cloned() {
        Some(existing) if existing != input.regid => {
            let guest = store.visitors.remove(&input.regid).unwrap_or_default();
            let owner = store.visitors.entry(existing.clone()).or_default();
            owner.sessions.extend(guest.sessions);
            owner.lists.extend(guest.lists);
            existing
        }
        _ => {
            store.emails.insert(input.useremail, input.regid.clone());
            input.regid
        }
    };
    Ok(Json(json!({ "regid": target })))
}

#[derive(Deserialize)]
pub struct CreateList {
    pub lname: String,
    #[serde(flatten)]
    pub auth: Auth,
}

async fn create_list(
    State(db): State<Db>,
    Query(query): Query<PidQuery>,
    Form(input): Form<CreateList>,
) -> ApiResult {
    let mut store = db.write().await;
    enter(&mut store, "create")?;
    check_pid(&store, &query)?;
    check_session(&store, &input.auth)?;

    let visitor = store
        .visitors
        .get_mut(&input.auth.regid)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "invalid regid/sessionid"))?;
    if visitor.lists.iter().any(|l| l.lname == input.lname) {
        return Err(reject(StatusCode::BAD_REQUEST, "list name already exists"));
    }
    let list = List {
        lid: Uuid::new_v4().to_string(),
        lname: input.lname,
        public: false,
        items: Vec::new(),
    };
    let summary = list.summary();
    visitor.lists.push(list);
    Ok(Json(summary))
}

#[derive(Deserialize)]
pub struct UpdateCtx {
    pub lid: String,
    pub a: Option<String>,
    pub d: Option<String>,
    #[serde(flatten)]
    pub auth: Auth,
}

fn parse_entries(raw: Option<&str>) -> Result<Vec<Item>, Rejection> {
    match raw {
        None => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(raw)
            .map_err(|_| reject(StatusCode::BAD_REQUEST, "malformed item array")),
    }
}

async fn update_ctx(
    State(db): State<Db>,
    Query(query): Query<PidQuery>,
    Form(input): Form<UpdateCtx>,
) -> ApiResult {
    let mut store = db.write().await;
    enter(&mut store, "update-ctx")?;
    check_pid(&store, &query)?;
    check_session(&store, &input.auth)?;

    let additions = parse_entries(input.a.as_deref())?;
    let deletions = parse_entries(input.d.as_deref())?;
    let list = store.list_mut(&input.auth.regid, &input.lid)?;

    for entry in &deletions {
        list.items.retain(|item| item.epi != entry.epi);
    }
    for entry in &additions {
        match list.items.iter_mut().find(|item| item.epi == entry.epi) {
            Some(existing) => existing.qty += entry.qty,
            None => list.items.push(entry.clone()),
        }
    }
    Ok(Json(json!({ "a": additions, "d": deletions, "lid": list.lid })))
}

async fn fetch_lists(
    State(db): State<Db>,
    Query(query): Query<PidQuery>,
    Form(auth): Form<Auth>,
) -> ApiResult {
    let mut store = db.write().await;
    enter(&mut store, "fetch-lists")?;
    check_pid(&store, &query)?;
    check_session(&store, &auth)?;

    let lists = store
        .visitors
        .get(&auth.regid)
        .map(|v| v.lists.iter().map(List::summary).collect::<Vec<_>>())
        .unwrap_or_default();
    Ok(Json(Value::Array(lists)))
}

#[derive(Deserialize)]
pub struct ListRef {
    pub lid: String,
    #[serde(flatten)]
    pub auth: Auth,
}

async fn fetch_list_with_contents(
    State(db): State<Db>,
    Query(query): Query<PidQuery>,
    Form(input): Form<ListRef>,
) -> ApiResult {
    let mut store = db.write().await;
    enter(&mut store, "fetch-list-with-contents")?;
    check_pid(&store, &query)?;
    check_session(&store, &input.auth)?;

    let list = store.list_mut(&input.auth.regid, &input.lid)?;
    Ok(Json(json!({
        "list": { "lid": list.lid, "lname": list.lname, "cnt": list.items.len() },
        "items": list.items,
    })))
}

async fn mark_public(
    State(db): State<Db>,
    Query(query): Query<PidQuery>,
    Form(input): Form<ListRef>,
) -> ApiResult {
    let mut store = db.write().await;
    enter(&mut store, "markPublic")?;
    check_pid(&store, &query)?;
    check_session(&store, &input.auth)?;

    let list = store.list_mut(&input.auth.regid, &input.lid)?;
    list.public = true;
    Ok(Json(json!({ "lid": list.lid, "public": true })))
}

#[derive(Deserialize)]
pub struct EmailList {
    pub lid: String,
    pub fromname: String,
    pub toemail: String,
    #[serde(flatten)]
    pub auth: Auth,
}

async fn email_list(
    State(db): State<Db>,
    Query(query): Query<PidQuery>,
    Form(input): Form<EmailList>,
) -> ApiResult {
    let mut store = db.write().await;
    enter(&mut store, "emailList")?;
    check_pid(&store, &query)?;
    check_session(&store, &input.auth)?;
    if !input.toemail.contains('@') {
        return Err(reject(StatusCode::BAD_REQUEST, "invalid recipient"));
    }

    store.list_mut(&input.auth.regid, &input.lid)?;
    store.shares.push(Share {
        lid: input.lid.clone(),
        fromname: input.fromname,
        medium: "email".to_string(),
        toemail: Some(input.toemail),
    });
    Ok(Json(json!({ "lid": input.lid, "sent": true })))
}

#[derive(Deserialize)]
pub struct ReportShare {
    pub lid: String,
    pub fromname: String,
    pub medium: String,
    #[serde(flatten)]
    pub auth: Auth,
}

async fn report_share(
    State(db): State<Db>,
    Query(query): Query<PidQuery>,
    Form(input): Form<ReportShare>,
) -> ApiResult {
    let mut store = db.write().await;
    enter(&mut store, "reportShare")?;
    check_pid(&store, &query)?;
    check_session(&store, &input.auth)?;

    store.list_mut(&input.auth.regid, &input.lid)?;
    store.shares.push(Share {
        lid: input.lid.clone(),
        fromname: input.fromname,
        medium: input.medium.clone(),
        toemail: None,
    });
    Ok(Json(json!({ "lid": input.lid, "medium": input.medium })))
}
