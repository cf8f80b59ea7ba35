//! In-memory stand-in for the aEi.ai HTTP surface.
//!
//! Every body carries a `status: {code, error, help}` object next to the
//! operation's payload key, and the HTTP status mirrors `status.code`. Affect
//! inference is a toy word lexicon: enough to make text input observable in
//! the derived user fields, nothing more.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub type Reply = (StatusCode, Json<Value>);

#[derive(Debug, Clone)]
pub struct Account {
    pub email: String,
    pub password: String,
    pub users: BTreeMap<String, Map<String, Value>>,
    pub interactions: BTreeMap<String, Vec<String>>,
    pub sources: BTreeMap<String, Map<String, Value>>,
    pub subscription_type: String,
    pub free_queries: u64,
    pub paid_queries: u64,
}

impl Account {
    fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            users: BTreeMap::new(),
            interactions: BTreeMap::new(),
            sources: BTreeMap::new(),
            subscription_type: "free".to_string(),
            free_queries: 0,
            paid_queries: 0,
        }
    }

    fn record_query(&mut self) {
        if self.subscription_type == "free" {
            self.free_queries += 1;
        } else {
            self.paid_queries += 1;
        }
    }
}

#[derive(Debug, Default)]
pub struct Store {
    pub accounts: HashMap<String, Account>,
    /// access token -> username
    pub tokens: HashMap<String, String>,
    /// reset token -> username
    pub reset_tokens: HashMap<String, String>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with_db(Db::default())
}

pub fn app_with_db(db: Db) -> Router {
    let api = Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/{facet}", get(get_user_facet))
        .route("/interactions", get(list_interactions).post(create_interaction))
        .route("/interactions/{id}", get(get_interaction))
        .route("/interactions/{id}/users", put(add_interaction_users))
        .route("/inputs/text", post(text_input))
        .route("/inputs/image", post(image_input))
        .route("/inputs/interaction-list", post(interaction_list_input))
        .route("/metrics/queries/used", get(free_queries))
        .route("/metrics/queries", get(paid_queries))
        .route("/sources", get(list_sources))
        .route(
            "/sources/{id}",
            get(get_source).post(add_source).put(update_source).delete(delete_source),
        )
        .route("/subscriptions", get(get_subscription).put(update_subscription))
        .route("/clients/password", put(change_password));

    Router::new()
        .route("/register", post(register))
        .route("/oauth/token", post(token))
        .route("/reset-password", post(reset_password))
        .route("/update-password", put(update_password))
        .nest("/api/v1", api)
        .fallback(not_found)
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_db(listener, Db::default()).await
}

pub async fn run_with_db(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_db(db)).await
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

fn ok(payload: Value) -> Reply {
    let mut body = match payload {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    body.insert("status".to_string(), json!({"code": 200, "error": null, "help": null}));
    (StatusCode::OK, Json(Value::Object(body)))
}

fn fail(code: StatusCode, error: &str, help: &str) -> Reply {
    tracing::debug!(code = code.as_u16(), error, "rejecting request");
    (
        code,
        Json(json!({"status": {"code": code.as_u16(), "error": error, "help": help}})),
    )
}

async fn not_found() -> Reply {
    fail(StatusCode::NOT_FOUND, "resource not found", "check the request path")
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn form_pairs(body: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(body.as_bytes()).into_owned().collect()
}

fn form_values(body: &str, key: &str) -> Vec<String> {
    form_pairs(body)
        .into_iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v)
        .collect()
}

/// Resolve the bearer token to a username.
fn authorize(headers: &HeaderMap, store: &Store) -> Result<String, Reply> {
    let token = header_value(headers, header::AUTHORIZATION.as_str())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| {
            fail(
                StatusCode::UNAUTHORIZED,
                "missing bearer token",
                "log in and pass the access token",
            )
        })?;
    store.tokens.get(token).cloned().ok_or_else(|| {
        fail(
            StatusCode::UNAUTHORIZED,
            "invalid access token",
            "log in again to obtain a fresh token",
        )
    })
}

fn account<'a>(store: &'a Store, headers: &HeaderMap) -> Result<&'a Account, Reply> {
    let username = authorize(headers, store)?;
    store
        .accounts
        .get(&username)
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "unknown client", "register first"))
}

fn account_mut<'a>(store: &'a mut Store, headers: &HeaderMap) -> Result<&'a mut Account, Reply> {
    let username = authorize(headers, store)?;
    store
        .accounts
        .get_mut(&username)
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "unknown client", "register first"))
}

fn user_missing(id: &str) -> Reply {
    fail(
        StatusCode::NOT_FOUND,
        &format!("user {id} not found"),
        "create the user before referencing it",
    )
}

// ---------------------------------------------------------------------------
// Account and authentication
// ---------------------------------------------------------------------------

async fn register(State(db): State<Db>, headers: HeaderMap) -> Reply {
    let (Some(username), Some(email), Some(password)) = (
        header_value(&headers, "username"),
        header_value(&headers, "email"),
        header_value(&headers, "password"),
    ) else {
        return fail(
            StatusCode::BAD_REQUEST,
            "missing credentials",
            "send username, email and password headers",
        );
    };
    if header_value(&headers, "agreed") != Some("true") {
        return fail(
            StatusCode::BAD_REQUEST,
            "terms not accepted",
            "agree to the statement of use and privacy policy",
        );
    }
    let mut store = db.write().await;
    if store.accounts.contains_key(username) {
        return fail(StatusCode::CONFLICT, "username taken", "pick another username");
    }
    store
        .accounts
        .insert(username.to_string(), Account::new(email, password));
    ok(json!({"client": {"username": username, "email": email}}))
}

async fn token(State(db): State<Db>, headers: HeaderMap, body: String) -> Reply {
    let credentials = header_value(&headers, header::AUTHORIZATION.as_str())
        .and_then(|v| v.strip_prefix("Basic "))
        .and_then(|v| BASE64_STANDARD.decode(v).ok())
        .and_then(|raw| String::from_utf8(raw).ok());
    let Some((username, password)) = credentials
        .as_deref()
        .and_then(|c| c.split_once(':'))
        .map(|(u, p)| (u.to_string(), p.to_string()))
    else {
        return fail(
            StatusCode::UNAUTHORIZED,
            "missing basic credentials",
            "send Authorization: Basic base64(username:password)",
        );
    };
    if form_values(&body, "grant_type") != ["client_credentials"] {
        return fail(
            StatusCode::BAD_REQUEST,
            "unsupported grant type",
            "use grant_type=client_credentials",
        );
    }

    let mut store = db.write().await;
    match store.accounts.get(&username) {
        Some(account) if account.password == password => {}
        _ => {
            return fail(
                StatusCode::UNAUTHORIZED,
                "bad credentials",
                "check username and password",
            )
        }
    }
    let access_token = Uuid::new_v4().simple().to_string();
    store.tokens.insert(access_token.clone(), username);
    (
        StatusCode::OK,
        Json(json!({
            "access_token": access_token,
            "token_type": "bearer",
            "expires_in": 3600,
            "scope": "read write",
        })),
    )
}

async fn reset_password(State(db): State<Db>, body: String) -> Reply {
    let emails = form_values(&body, "email");
    let Some(email) = emails.first() else {
        return fail(StatusCode::BAD_REQUEST, "missing email", "send email as a form field");
    };
    let mut store = db.write().await;
    let Some(username) = store
        .accounts
        .iter()
        .find(|(_, a)| &a.email == email)
        .map(|(u, _)| u.clone())
    else {
        return fail(StatusCode::NOT_FOUND, "unknown email", "register first");
    };
    store
        .reset_tokens
        .insert(Uuid::new_v4().simple().to_string(), username);
    ok(json!({}))
}

async fn update_password(State(db): State<Db>, headers: HeaderMap) -> Reply {
    let (Some(username), Some(reset_token), Some(password)) = (
        header_value(&headers, "username"),
        header_value(&headers, "token"),
        header_value(&headers, "password"),
    ) else {
        return fail(
            StatusCode::BAD_REQUEST,
            "missing fields",
            "send username, token and password headers",
        );
    };
    let mut store = db.write().await;
    if store.reset_tokens.get(reset_token).map(String::as_str) != Some(username) {
        return fail(
            StatusCode::UNAUTHORIZED,
            "invalid reset token",
            "request a new password reset email",
        );
    }
    store.reset_tokens.remove(reset_token);
    if let Some(account) = store.accounts.get_mut(username) {
        account.password = password.to_string();
    }
    ok(json!({}))
}

async fn change_password(State(db): State<Db>, headers: HeaderMap) -> Reply {
    let Some(password) = header_value(&headers, "password").map(str::to_string) else {
        return fail(StatusCode::BAD_REQUEST, "missing password", "send the password header");
    };
    let mut store = db.write().await;
    match account_mut(&mut store, &headers) {
        Ok(account) => {
            account.password = password;
            ok(json!({}))
        }
        Err(reply) => reply,
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

fn pad(pleasure: f64, arousal: f64, dominance: f64) -> Value {
    json!({"pleasure": pleasure, "arousal": arousal, "dominance": dominance})
}

fn new_user(id: &str, attributes: Map<String, Value>) -> Map<String, Value> {
    let mut user = attributes;
    user.insert("userId".to_string(), json!(id));
    user.insert("affect".to_string(), json!({"emotion": {"pad": pad(0.0, 0.0, 0.0)}}));
    user.insert("mood".to_string(), json!({"pad": pad(0.0, 0.0, 0.0)}));
    user.insert(
        "personality".to_string(),
        json!({
            "openness": 0.5,
            "conscientiousness": 0.5,
            "extraversion": 0.5,
            "agreeableness": 0.5,
            "neuroticism": 0.5,
        }),
    );
    user.insert("satisfaction".to_string(), json!({"score": 0.5}));
    user.insert(
        "socialPerception".to_string(),
        json!({"warmth": 0.5, "competence": 0.5}),
    );
    user
}

async fn create_user(State(db): State<Db>, headers: HeaderMap, body: String) -> Reply {
    let attributes = if body.trim().is_empty() {
        Map::new()
    } else {
        match serde_json::from_str::<Map<String, Value>>(&body) {
            Ok(map) => map,
            Err(_) => {
                return fail(
                    StatusCode::BAD_REQUEST,
                    "attributes must be a JSON object",
                    "send user attributes as key-value pairs",
                )
            }
        }
    };
    let mut store = db.write().await;
    let account = match account_mut(&mut store, &headers) {
        Ok(account) => account,
        Err(reply) => return reply,
    };
    let id = Uuid::new_v4().to_string();
    let user = new_user(&id, attributes);
    account.users.insert(id, user.clone());
    ok(json!({"user": user}))
}

async fn list_users(State(db): State<Db>, headers: HeaderMap) -> Reply {
    let store = db.read().await;
    match account(&store, &headers) {
        Ok(account) => ok(json!({"users": account.users.values().collect::<Vec<_>>()})),
        Err(reply) => reply,
    }
}

async fn get_user(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    let store = db.read().await;
    let account = match account(&store, &headers) {
        Ok(account) => account,
        Err(reply) => return reply,
    };
    match account.users.get(&id) {
        Some(user) => ok(json!({"user": user})),
        None => user_missing(&id),
    }
}

async fn get_user_facet(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((id, facet)): Path<(String, String)>,
) -> Reply {
    let store = db.read().await;
    let account = match account(&store, &headers) {
        Ok(account) => account,
        Err(reply) => return reply,
    };
    let Some(user) = account.users.get(&id) else {
        return user_missing(&id);
    };
    let (key, value) = match facet.as_str() {
        "emotion" => ("emotion", user["affect"]["emotion"].clone()),
        "mood" => ("mood", user["mood"].clone()),
        "personality" => ("personality", user["personality"].clone()),
        "satisfaction" => ("satisfaction", user["satisfaction"].clone()),
        "social-perception" => ("socialPerception", user["socialPerception"].clone()),
        _ => return not_found().await,
    };
    ok(json!({ key: value }))
}

// ---------------------------------------------------------------------------
// Interactions
// ---------------------------------------------------------------------------

fn interaction_json(id: &str, members: &[String]) -> Value {
    json!({"interactionId": id, "userIds": members})
}

async fn create_interaction(State(db): State<Db>, headers: HeaderMap, body: String) -> Reply {
    let user_ids = form_values(&body, "user_id");
    let mut store = db.write().await;
    let account = match account_mut(&mut store, &headers) {
        Ok(account) => account,
        Err(reply) => return reply,
    };
    if let Some(missing) = user_ids.iter().find(|id| !account.users.contains_key(*id)) {
        return user_missing(missing);
    }
    let id = Uuid::new_v4().to_string();
    let reply = ok(json!({"interaction": interaction_json(&id, &user_ids)}));
    account.interactions.insert(id, user_ids);
    reply
}

async fn list_interactions(State(db): State<Db>, headers: HeaderMap) -> Reply {
    let store = db.read().await;
    match account(&store, &headers) {
        Ok(account) => {
            let interactions: Vec<Value> = account
                .interactions
                .iter()
                .map(|(id, members)| interaction_json(id, members))
                .collect();
            ok(json!({"interactions": interactions}))
        }
        Err(reply) => reply,
    }
}

async fn get_interaction(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let store = db.read().await;
    let account = match account(&store, &headers) {
        Ok(account) => account,
        Err(reply) => return reply,
    };
    match account.interactions.get(&id) {
        Some(members) => ok(json!({"interaction": interaction_json(&id, members)})),
        None => fail(
            StatusCode::NOT_FOUND,
            &format!("interaction {id} not found"),
            "create the interaction first",
        ),
    }
}

async fn add_interaction_users(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: String,
) -> Reply {
    let user_ids = form_values(&body, "user_id");
    let mut store = db.write().await;
    let account = match account_mut(&mut store, &headers) {
        Ok(account) => account,
        Err(reply) => return reply,
    };
    if let Some(missing) = user_ids.iter().find(|uid| !account.users.contains_key(*uid)) {
        return user_missing(missing);
    }
    let Some(members) = account.interactions.get_mut(&id) else {
        return fail(
            StatusCode::NOT_FOUND,
            &format!("interaction {id} not found"),
            "create the interaction first",
        );
    };
    for uid in user_ids {
        if !members.contains(&uid) {
            members.push(uid);
        }
    }
    ok(json!({"interaction": interaction_json(&id, members)}))
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

const POSITIVE: &[&str] = &["happy", "glad", "great", "love", "good", "thanks"];
const NEGATIVE: &[&str] = &["sad", "angry", "hate", "bad", "awful", "upset"];

/// Pleasure shift for an utterance: +0.2 per positive word, -0.2 per
/// negative word, clamped to [-1, 1].
pub fn pleasure_delta(text: &str) -> f64 {
    let score: i32 = text
        .split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .map(|w| {
            if POSITIVE.contains(&w.as_str()) {
                1
            } else if NEGATIVE.contains(&w.as_str()) {
                -1
            } else {
                0
            }
        })
        .sum();
    (f64::from(score) * 0.2).clamp(-1.0, 1.0)
}

fn shift_pleasure(pad: &mut Value, delta: f64) {
    let current = pad["pleasure"].as_f64().unwrap_or(0.0);
    pad["pleasure"] = json!((current + delta).clamp(-1.0, 1.0));
}

/// Speaker takes the full shift; other members empathize at half strength.
fn apply_text(account: &mut Account, speaker: &str, members: &[String], text: &str) {
    let delta = pleasure_delta(text);
    if delta == 0.0 {
        return;
    }
    for member in members {
        let Some(user) = account.users.get_mut(member) else {
            continue;
        };
        let weight = if member == speaker { 1.0 } else { 0.5 };
        if let Some(pad) = user.get_mut("affect").map(|a| &mut a["emotion"]["pad"]) {
            shift_pleasure(pad, delta * weight);
        }
        if let Some(pad) = user.get_mut("mood").map(|m| &mut m["pad"]) {
            shift_pleasure(pad, delta * weight * 0.5);
        }
    }
}

/// Validates the `user_id`/`interaction_id` query pair shared by text and
/// image input, returning the interaction's members.
fn input_target(
    account: &Account,
    params: &HashMap<String, String>,
) -> Result<(String, Vec<String>), Reply> {
    let (Some(user_id), Some(interaction_id)) =
        (params.get("user_id"), params.get("interaction_id"))
    else {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            "missing user_id or interaction_id",
            "pass both as query parameters",
        ));
    };
    let Some(members) = account.interactions.get(interaction_id) else {
        return Err(fail(
            StatusCode::NOT_FOUND,
            &format!("interaction {interaction_id} not found"),
            "create the interaction first",
        ));
    };
    if !members.contains(user_id) {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            &format!("user {user_id} is not in interaction {interaction_id}"),
            "add the user to the interaction first",
        ));
    }
    Ok((user_id.clone(), members.clone()))
}

async fn text_input(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: String,
) -> Reply {
    let mut store = db.write().await;
    let account = match account_mut(&mut store, &headers) {
        Ok(account) => account,
        Err(reply) => return reply,
    };
    let (speaker, members) = match input_target(account, &params) {
        Ok(target) => target,
        Err(reply) => return reply,
    };
    apply_text(account, &speaker, &members, &body);
    account.record_query();
    ok(json!({}))
}

async fn image_input(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: String,
) -> Reply {
    let mut store = db.write().await;
    let account = match account_mut(&mut store, &headers) {
        Ok(account) => account,
        Err(reply) => return reply,
    };
    if let Err(reply) = input_target(account, &params) {
        return reply;
    }
    if !(body.starts_with("http://") || body.starts_with("https://")) {
        return fail(
            StatusCode::BAD_REQUEST,
            "image must be a URL",
            "send an http(s) image URL as the body",
        );
    }
    account.record_query();
    ok(json!({}))
}

async fn interaction_list_input(State(db): State<Db>, headers: HeaderMap, body: String) -> Reply {
    let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(&body) else {
        return fail(
            StatusCode::BAD_REQUEST,
            "interaction list must be a JSON array",
            "send the interaction list as a JSON string",
        );
    };
    let mut store = db.write().await;
    let account = match account_mut(&mut store, &headers) {
        Ok(account) => account,
        Err(reply) => return reply,
    };
    account.record_query();
    ok(json!({"analyzed": entries.len()}))
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

async fn free_queries(State(db): State<Db>, headers: HeaderMap) -> Reply {
    let store = db.read().await;
    match account(&store, &headers) {
        Ok(account) => ok(json!({"queries": account.free_queries})),
        Err(reply) => reply,
    }
}

async fn paid_queries(State(db): State<Db>, headers: HeaderMap) -> Reply {
    let store = db.read().await;
    match account(&store, &headers) {
        Ok(account) => ok(json!({"queries": account.paid_queries})),
        Err(reply) => reply,
    }
}

// ---------------------------------------------------------------------------
// Billing
// ---------------------------------------------------------------------------

fn source_missing(id: &str) -> Reply {
    fail(
        StatusCode::NOT_FOUND,
        &format!("source {id} not found"),
        "add the payment source first",
    )
}

async fn list_sources(State(db): State<Db>, headers: HeaderMap) -> Reply {
    let store = db.read().await;
    match account(&store, &headers) {
        Ok(account) => ok(json!({"sources": account.sources.values().collect::<Vec<_>>()})),
        Err(reply) => reply,
    }
}

async fn get_source(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    let store = db.read().await;
    let account = match account(&store, &headers) {
        Ok(account) => account,
        Err(reply) => return reply,
    };
    match account.sources.get(&id) {
        Some(source) => ok(json!({"source": source})),
        None => source_missing(&id),
    }
}

async fn add_source(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    let mut store = db.write().await;
    let account = match account_mut(&mut store, &headers) {
        Ok(account) => account,
        Err(reply) => return reply,
    };
    if account.sources.contains_key(&id) {
        return fail(StatusCode::CONFLICT, "source already added", "use PUT to update it");
    }
    let mut source = Map::new();
    source.insert("id".to_string(), json!(id));
    source.insert("object".to_string(), json!("source"));
    account.sources.insert(id, source.clone());
    ok(json!({"source": source}))
}

async fn update_source(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: String,
) -> Reply {
    let updates = if body.trim().is_empty() {
        Map::new()
    } else {
        match serde_json::from_str::<Map<String, Value>>(&body) {
            Ok(map) => map,
            Err(_) => {
                return fail(
                    StatusCode::BAD_REQUEST,
                    "update must be a JSON object",
                    "send key-value pairs to update",
                )
            }
        }
    };
    let mut store = db.write().await;
    let account = match account_mut(&mut store, &headers) {
        Ok(account) => account,
        Err(reply) => return reply,
    };
    let Some(source) = account.sources.get_mut(&id) else {
        return source_missing(&id);
    };
    for (key, value) in updates {
        if key != "id" {
            source.insert(key, value);
        }
    }
    ok(json!({"source": source}))
}

async fn delete_source(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    let mut store = db.write().await;
    let account = match account_mut(&mut store, &headers) {
        Ok(account) => account,
        Err(reply) => return reply,
    };
    match account.sources.remove(&id) {
        Some(_) => ok(json!({})),
        None => source_missing(&id),
    }
}

async fn get_subscription(State(db): State<Db>, headers: HeaderMap) -> Reply {
    let store = db.read().await;
    match account(&store, &headers) {
        Ok(account) => {
            ok(json!({"subscription": {"subscription_type": account.subscription_type}}))
        }
        Err(reply) => reply,
    }
}

async fn update_subscription(State(db): State<Db>, headers: HeaderMap, body: String) -> Reply {
    let types = form_values(&body, "subscription_type");
    let Some(subscription_type) = types.first().filter(|t| !t.is_empty()) else {
        return fail(
            StatusCode::BAD_REQUEST,
            "missing subscription_type",
            "send subscription_type as a form field",
        );
    };
    let mut store = db.write().await;
    let account = match account_mut(&mut store, &headers) {
        Ok(account) => account,
        Err(reply) => return reply,
    };
    if subscription_type != "free" && account.sources.is_empty() {
        return fail(
            StatusCode::PAYMENT_REQUIRED,
            "no payment source on file",
            "add a payment source before upgrading",
        );
    }
    account.subscription_type = subscription_type.clone();
    ok(json!({"subscription": {"subscription_type": subscription_type}}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pleasure_delta_counts_lexicon_words() {
        assert_eq!(pleasure_delta("I am happy"), 0.2);
        assert_eq!(pleasure_delta("I am SAD and upset"), -0.4);
        assert_eq!(pleasure_delta("the weather"), 0.0);
    }

    #[test]
    fn pleasure_delta_is_clamped() {
        let text = "happy ".repeat(20);
        assert_eq!(pleasure_delta(&text), 1.0);
    }

    #[test]
    fn form_values_keep_repeated_keys() {
        assert_eq!(
            form_values("user_id=a&user_id=b&other=c", "user_id"),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(form_values("", "user_id").is_empty());
    }

    #[test]
    fn new_user_has_every_derived_field() {
        let user = new_user("u1", Map::new());
        for key in ["userId", "affect", "mood", "personality", "satisfaction", "socialPerception"] {
            assert!(user.contains_key(key), "{key}");
        }
        assert_eq!(user["affect"]["emotion"]["pad"]["pleasure"], 0.0);
    }

    #[test]
    fn speaker_shifts_more_than_listener() {
        let mut account = Account::new("a@example.com", "pw");
        account.users.insert("a".to_string(), new_user("a", Map::new()));
        account.users.insert("b".to_string(), new_user("b", Map::new()));
        let members = vec!["a".to_string(), "b".to_string()];
        apply_text(&mut account, "a", &members, "I am happy");

        let pleasure = |id: &str| {
            account.users[id]["affect"]["emotion"]["pad"]["pleasure"]
                .as_f64()
                .unwrap()
        };
        assert!((pleasure("a") - 0.2).abs() < 1e-9);
        assert!((pleasure("b") - 0.1).abs() < 1e-9);
    }

    #[test]
    fn queries_count_against_current_tier() {
        let mut account = Account::new("a@example.com", "pw");
        account.record_query();
        account.subscription_type = "premium".to_string();
        account.record_query();
        account.record_query();
        assert_eq!(account.free_queries, 1);
        assert_eq!(account.paid_queries, 2);
    }
}
