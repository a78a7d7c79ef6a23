//! In-process stand-in for the hosted backend's REST and auth APIs.
//!
//! Speaks just enough PostgREST (`eq.` filters, `order`, `limit`, embedded
//! relations, single-object responses) and GoTrue (password and refresh
//! grants, sign-up, logout, user lookup, email verification) for the
//! storefront to run against it. Every request is recorded so tests can
//! assert on headers, query parameters and bodies.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use aqua_dekor_storefront::config::SupabaseConfig;
use aqua_dekor_storefront::supabase::SupabaseClient;

/// Project key the fake backend accepts in `apikey`.
pub const ANON_KEY: &str = "test-anon-key";

/// Lifetime of issued access tokens, in seconds.
const TOKEN_LIFETIME: i64 = 3600;

/// Timestamps handed out to inserted rows start here (2026-01-01T00:00:00Z)
/// and advance one second per row, so insertion order is creation order.
const CLOCK_START: i64 = 1_767_225_600;

/// Parameters that shape the response rather than filter rows.
const SHAPE_PARAMS: &[&str] = &["select", "order", "limit", "offset"];

/// Foreign key behind each embeddable relation.
const FOREIGN_KEYS: &[(&str, &str)] = &[
    ("products", "product_id"),
    ("categories", "category_id"),
    ("profiles", "user_id"),
];

/// Column sets that must be unique per table.
const UNIQUE_KEYS: &[(&str, &[&str])] = &[
    ("cart_items", &["user_id", "product_id"]),
    ("favorites", &["user_id", "product_id"]),
    ("categories", &["slug"]),
    ("articles", &["slug"]),
];

/// One request as the backend received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Value,
}

impl RecordedRequest {
    /// First query parameter named `key`.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        param(&self.query, key)
    }

    /// Every value of the query parameter `key`, in order.
    #[must_use]
    pub fn params(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The token from `Authorization: Bearer <token>`.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        bearer(&self.headers)
    }
}

/// A canned response for the next request to `path`.
struct Override {
    path: String,
    status: StatusCode,
    retry_after: Option<u64>,
    body: Value,
}

struct FakeUser {
    id: Uuid,
    email: String,
    password: String,
    confirmed: bool,
    metadata: Value,
}

#[derive(Default)]
struct BackendState {
    tables: HashMap<String, Vec<Value>>,
    users: Vec<FakeUser>,
    access_tokens: HashMap<String, Uuid>,
    refresh_tokens: HashMap<String, Uuid>,
    confirmations: HashMap<String, Uuid>,
    rpc: HashMap<String, Value>,
    overrides: Vec<Override>,
    requests: Vec<RecordedRequest>,
    autoconfirm: bool,
    next_ids: HashMap<String, i64>,
    next_token: u64,
    clock: i64,
}

type Shared = Arc<Mutex<BackendState>>;

/// Handle to a running fake backend.
///
/// Clones share the same tables, users and request log.
#[derive(Clone)]
pub struct FakeBackend {
    addr: SocketAddr,
    state: Shared,
}

impl FakeBackend {
    /// Bind to an ephemeral local port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState {
            autoconfirm: true,
            ..BackendState::default()
        }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener
            .local_addr()
            .expect("Fake backend has no local address");

        let router = Router::new().fallback(handle).with_state(Arc::clone(&state));
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self { addr, state }
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Connection settings pointing at this backend with [`ANON_KEY`].
    ///
    /// # Panics
    ///
    /// Panics if the local URL is rejected, which would be a harness bug.
    #[must_use]
    pub fn config(&self) -> SupabaseConfig {
        SupabaseConfig::new(&self.url(), SecretString::from(ANON_KEY))
            .expect("Fake backend URL is valid")
    }

    #[must_use]
    pub fn client(&self) -> SupabaseClient {
        SupabaseClient::new(&self.config())
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Tables
    // =========================================================================

    /// Insert rows as-is, filling `id` and `created_at` when absent.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        let mut state = self.lock();
        for row in rows {
            let row = state.stamp(table, row);
            state.table_mut(table).push(row);
        }
    }

    /// Current rows of `table`, in storage order.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    /// Result returned by `POST /rest/v1/rpc/<function>`.
    pub fn set_rpc(&self, function: &str, result: Value) {
        self.lock().rpc.insert(function.to_string(), result);
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Create a confirmed account and its `profiles` row.
    pub fn add_user(&self, email: &str, password: &str) -> Uuid {
        self.lock().create_user(email, password, true, Value::Null)
    }

    /// Create an account that has not confirmed its email yet.
    pub fn add_unconfirmed_user(&self, email: &str, password: &str) -> Uuid {
        self.lock().create_user(email, password, false, Value::Null)
    }

    /// Set `profiles.is_admin` for a user.
    pub fn grant_admin(&self, id: Uuid) {
        self.set_admin_flag(id, true);
    }

    /// Clear `profiles.is_admin` for a user.
    pub fn revoke_admin(&self, id: Uuid) {
        self.set_admin_flag(id, false);
    }

    fn set_admin_flag(&self, id: Uuid, is_admin: bool) {
        let mut state = self.lock();
        let id = id.to_string();
        for row in state.table_mut("profiles") {
            if text(row.get("id")) == id
                && let Some(fields) = row.as_object_mut()
            {
                fields.insert("is_admin".to_string(), Value::Bool(is_admin));
            }
        }
    }

    /// Whether sign-up returns a session (`true`) or emails a link.
    pub fn set_autoconfirm(&self, autoconfirm: bool) {
        self.lock().autoconfirm = autoconfirm;
    }

    /// The pending confirmation token emailed to `email`, if any.
    #[must_use]
    pub fn confirmation_token(&self, email: &str) -> Option<String> {
        let state = self.lock();
        let user = state.user_by_email(email)?;
        state
            .confirmations
            .iter()
            .find(|(_, id)| **id == user.id)
            .map(|(token, _)| token.clone())
    }

    /// Whether `token` is a live access token.
    #[must_use]
    pub fn is_token_active(&self, token: &str) -> bool {
        self.lock().access_tokens.contains_key(token)
    }

    // =========================================================================
    // Failure injection
    // =========================================================================

    /// Answer the next request to `path` with `status` and a JSON body.
    pub fn fail_next(&self, path: &str, status: u16, body: Value) {
        self.lock().overrides.push(Override {
            path: path.to_string(),
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            retry_after: None,
            body,
        });
    }

    /// Answer the next request to `path` with 429 and `Retry-After`.
    pub fn rate_limit_next(&self, path: &str, retry_after: u64) {
        self.lock().overrides.push(Override {
            path: path.to_string(),
            status: StatusCode::TOO_MANY_REQUESTS,
            retry_after: Some(retry_after),
            body: json!({"message": "Too many requests"}),
        });
    }

    // =========================================================================
    // Request log
    // =========================================================================

    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Recorded requests whose path is exactly `path`.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }
}

impl BackendState {
    fn table_mut(&mut self, table: &str) -> &mut Vec<Value> {
        self.tables.entry(table.to_string()).or_default()
    }

    fn now(&mut self) -> String {
        self.clock += 1;
        DateTime::<Utc>::from_timestamp(CLOCK_START + self.clock, 0)
            .unwrap_or_default()
            .to_rfc3339()
    }

    /// Fill the generated columns of a new row. Ids count up per table.
    fn stamp(&mut self, table: &str, mut row: Value) -> Value {
        let now = self.now();
        let next_id = self.next_ids.entry(table.to_string()).or_insert(1);
        if let Some(fields) = row.as_object_mut() {
            match fields.get("id").and_then(Value::as_i64) {
                Some(id) => *next_id = (*next_id).max(id + 1),
                None if !fields.contains_key("id") => {
                    fields.insert("id".to_string(), json!(*next_id));
                    *next_id += 1;
                }
                None => {}
            }
            fields
                .entry("created_at")
                .or_insert_with(|| Value::String(now));
        }
        row
    }

    fn create_user(
        &mut self,
        email: &str,
        password: &str,
        confirmed: bool,
        metadata: Value,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.users.push(FakeUser {
            id,
            email: email.to_lowercase(),
            password: password.to_string(),
            confirmed,
            metadata,
        });
        let profile = self.stamp("profiles", json!({
            "id": id,
            "email": email.to_lowercase(),
            "username": null,
            "display_name": null,
            "avatar_url": null,
            "is_admin": false,
            "email_verified": confirmed,
        }));
        self.table_mut("profiles").push(profile);
        id
    }

    fn user(&self, id: Uuid) -> Option<&FakeUser> {
        self.users.iter().find(|u| u.id == id)
    }

    fn user_by_email(&self, email: &str) -> Option<&FakeUser> {
        let email = email.to_lowercase();
        self.users.iter().find(|u| u.email == email)
    }

    fn user_json(&self, id: Uuid) -> Value {
        let Some(user) = self.user(id) else {
            return Value::Null;
        };
        let confirmed_at = user
            .confirmed
            .then(|| DateTime::<Utc>::from_timestamp(CLOCK_START, 0).unwrap_or_default());
        let metadata = if user.metadata.is_null() {
            Value::Object(Map::new())
        } else {
            user.metadata.clone()
        };
        json!({
            "id": user.id,
            "aud": "authenticated",
            "email": user.email,
            "email_confirmed_at": confirmed_at,
            "user_metadata": metadata,
        })
    }

    fn issue_session(&mut self, id: Uuid) -> Value {
        self.next_token += 1;
        let access = format!("access-token-{}", self.next_token);
        let refresh = format!("refresh-token-{}", self.next_token);
        self.access_tokens.insert(access.clone(), id);
        self.refresh_tokens.insert(refresh.clone(), id);

        json!({
            "access_token": access,
            "token_type": "bearer",
            "expires_in": TOKEN_LIFETIME,
            "expires_at": Utc::now().timestamp() + TOKEN_LIFETIME,
            "refresh_token": refresh,
            "user": self.user_json(id),
        })
    }
}

// =============================================================================
// Dispatch
// =============================================================================

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Response {
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    let request = RecordedRequest {
        method,
        path: uri.path().to_string(),
        query,
        headers,
        body,
    };
    respond(&state, request)
}

fn respond(state: &Shared, request: RecordedRequest) -> Response {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    state.requests.push(request.clone());

    if let Some(index) = state.overrides.iter().position(|o| o.path == request.path) {
        let canned = state.overrides.remove(index);
        let mut response = (canned.status, Json(canned.body)).into_response();
        if let Some(seconds) = canned.retry_after
            && let Ok(value) = HeaderValue::from_str(&seconds.to_string())
        {
            response.headers_mut().insert("retry-after", value);
        }
        return response;
    }

    if request.header("apikey") != Some(ANON_KEY) {
        return json_response(
            StatusCode::UNAUTHORIZED,
            json!({"message": "Invalid API key"}),
        );
    }

    let segments: Vec<&str> = request.path.trim_start_matches('/').split('/').collect();
    match segments.as_slice() {
        ["rest", "v1", "rpc", function] => rpc(&state, function, &request),
        ["rest", "v1", table] => rest(&mut state, table, &request),
        ["auth", "v1", endpoint] => auth(&mut state, endpoint, &request),
        _ => json_response(StatusCode::NOT_FOUND, json!({"message": "no route"})),
    }
}

fn json_response(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn param<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// A column value as PostgREST compares it in filters.
fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "null".to_string(),
        Some(other) => other.to_string(),
    }
}

// =============================================================================
// PostgREST
// =============================================================================

/// Results set through `set_rpc`, plus `get_current_profile`, which reads
/// the caller's `profiles` row like the real function does.
fn rpc(state: &BackendState, function: &str, request: &RecordedRequest) -> Response {
    if let Some(result) = state.rpc.get(function) {
        return json_response(StatusCode::OK, result.clone());
    }

    match function {
        "get_current_profile" => {
            let profile = request
                .bearer()
                .and_then(|token| state.access_tokens.get(token))
                .and_then(|id| {
                    let id = id.to_string();
                    state
                        .tables
                        .get("profiles")
                        .and_then(|rows| rows.iter().find(|r| text(r.get("id")) == id))
                })
                .cloned()
                .unwrap_or(Value::Null);
            json_response(StatusCode::OK, profile)
        }
        _ => json_response(
            StatusCode::NOT_FOUND,
            json!({
                "code": "PGRST202",
                "message": format!("Could not find the function public.{function} in the schema cache"),
            }),
        ),
    }
}

fn rest(state: &mut BackendState, table: &str, request: &RecordedRequest) -> Response {
    let filters = match filters(&request.query) {
        Ok(filters) => filters,
        Err(message) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                json!({"code": "PGRST100", "message": message}),
            );
        }
    };
    let matches = |row: &Value| {
        filters
            .iter()
            .all(|(column, expected)| text(row.get(column)) == *expected)
    };

    if request.method == Method::GET {
        select(state, table, request, &matches)
    } else if request.method == Method::POST {
        insert(state, table, request)
    } else if request.method == Method::PATCH {
        let changes = request.body.as_object().cloned().unwrap_or_default();
        for row in state.table_mut(table).iter_mut().filter(|r| matches(r)) {
            if let Some(fields) = row.as_object_mut() {
                fields.extend(changes.clone());
            }
        }
        StatusCode::NO_CONTENT.into_response()
    } else if request.method == Method::DELETE {
        state.table_mut(table).retain(|row| !matches(row));
        StatusCode::NO_CONTENT.into_response()
    } else {
        StatusCode::METHOD_NOT_ALLOWED.into_response()
    }
}

/// `column=eq.value` filters; any other operator is rejected.
fn filters(query: &[(String, String)]) -> Result<Vec<(String, String)>, String> {
    query
        .iter()
        .filter(|(k, _)| !SHAPE_PARAMS.contains(&k.as_str()))
        .map(|(column, value)| {
            value
                .strip_prefix("eq.")
                .map(|v| (column.clone(), v.to_string()))
                .ok_or_else(|| format!("unsupported filter {column}={value}"))
        })
        .collect()
}

fn select(
    state: &BackendState,
    table: &str,
    request: &RecordedRequest,
    matches: &dyn Fn(&Value) -> bool,
) -> Response {
    let mut rows: Vec<Value> = state
        .tables
        .get(table)
        .map(|rows| rows.iter().filter(|r| matches(r)).cloned().collect())
        .unwrap_or_default();

    // Stable sorts applied last-key-first give a multi-key ordering
    for order in request.params("order").into_iter().rev() {
        let (column, direction) = order.split_once('.').unwrap_or((order, "asc"));
        rows.sort_by(|a, b| {
            let ordering = compare(a.get(column), b.get(column));
            if direction.starts_with("desc") {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
    if let Some(limit) = request.param("limit").and_then(|l| l.parse().ok()) {
        rows.truncate(limit);
    }

    let columns = request.param("select").unwrap_or("*");
    for row in &mut rows {
        embed(&state.tables, row, columns);
    }

    if request.header("accept") == Some("application/vnd.pgrst.object+json") {
        return match rows.pop() {
            Some(row) if rows.is_empty() => json_response(StatusCode::OK, row),
            _ => json_response(
                StatusCode::NOT_ACCEPTABLE,
                json!({
                    "code": "PGRST116",
                    "message": "JSON object requested, multiple (or no) rows returned",
                }),
            ),
        };
    }
    json_response(StatusCode::OK, Value::Array(rows))
}

fn insert(state: &mut BackendState, table: &str, request: &RecordedRequest) -> Response {
    let rows = match &request.body {
        Value::Array(rows) => rows.clone(),
        Value::Object(_) => vec![request.body.clone()],
        _ => {
            return json_response(
                StatusCode::BAD_REQUEST,
                json!({"code": "PGRST102", "message": "Empty or invalid json"}),
            );
        }
    };

    let unique = UNIQUE_KEYS
        .iter()
        .find(|(t, _)| *t == table)
        .map_or(&[][..], |(_, columns)| *columns);
    let mut inserted = Vec::with_capacity(rows.len());
    for row in rows {
        let existing = state.tables.get(table).map_or(&[][..], Vec::as_slice);
        let duplicate = !unique.is_empty()
            && existing
                .iter()
                .chain(&inserted)
                .any(|other| unique.iter().all(|c| text(other.get(*c)) == text(row.get(*c))));
        if duplicate {
            return json_response(
                StatusCode::CONFLICT,
                json!({
                    "code": "23505",
                    "message": format!("duplicate key value violates unique constraint \"{table}_key\""),
                }),
            );
        }
        inserted.push(state.stamp(table, row));
    }
    state.table_mut(table).extend(inserted.iter().cloned());

    if request.header("prefer") == Some("return=representation") {
        return json_response(StatusCode::CREATED, Value::Array(inserted));
    }
    StatusCode::CREATED.into_response()
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (a, b) => is_set(a).cmp(&is_set(b)),
    }
}

fn is_set(value: Option<&Value>) -> bool {
    value.is_some_and(|v| !v.is_null())
}

/// An embedded relation in a `select`, e.g. `author:profiles(username)`.
struct Relation {
    key: String,
    table: String,
    foreign_key: String,
    columns: String,
}

fn relations(select: &str) -> Vec<Relation> {
    split_top_level(select)
        .into_iter()
        .filter_map(|item| {
            let open = item.find('(')?;
            let head = item.get(..open)?.trim();
            let columns = item.get(open + 1..item.len().checked_sub(1)?)?;
            let (key, table, foreign_key) = match head.split_once(':') {
                Some((alias, table)) => (alias, table, format!("{alias}_id")),
                None => {
                    let (_, fk) = FOREIGN_KEYS.iter().find(|(t, _)| *t == head)?;
                    (head, head, (*fk).to_string())
                }
            };
            Some(Relation {
                key: key.to_string(),
                table: table.to_string(),
                foreign_key,
                columns: columns.to_string(),
            })
        })
        .collect()
}

fn split_top_level(select: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_i32;
    let mut start = 0;
    for (i, c) in select.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(select.get(start..i).unwrap_or_default());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(select.get(start..).unwrap_or_default());
    parts
}

fn embed(tables: &HashMap<String, Vec<Value>>, row: &mut Value, select: &str) {
    for relation in relations(select) {
        let key = text(row.get(&relation.foreign_key));
        let target = tables
            .get(&relation.table)
            .and_then(|rows| rows.iter().find(|r| text(r.get("id")) == key))
            .cloned();
        let embedded = match target {
            Some(mut target) => {
                embed(tables, &mut target, &relation.columns);
                target
            }
            None => Value::Null,
        };
        if let Some(fields) = row.as_object_mut() {
            fields.insert(relation.key, embedded);
        }
    }
}

// =============================================================================
// GoTrue
// =============================================================================

fn gotrue_error(status: StatusCode, code: &str, message: &str) -> Response {
    json_response(
        status,
        json!({"code": status.as_u16(), "error_code": code, "msg": message}),
    )
}

fn auth(state: &mut BackendState, endpoint: &str, request: &RecordedRequest) -> Response {
    let post = request.method == Method::POST;
    match endpoint {
        "token" if post => match request.param("grant_type") {
            Some("password") => password_grant(state, &request.body),
            Some("refresh_token") => refresh_grant(state, &request.body),
            _ => gotrue_error(
                StatusCode::BAD_REQUEST,
                "validation_failed",
                "unsupported_grant_type",
            ),
        },
        "signup" if post => sign_up(state, &request.body),
        "logout" if post => {
            if let Some(token) = request.bearer() {
                state.access_tokens.remove(token);
            }
            StatusCode::NO_CONTENT.into_response()
        }
        "user" if request.method == Method::GET => {
            match request
                .bearer()
                .and_then(|token| state.access_tokens.get(token))
            {
                Some(id) => json_response(StatusCode::OK, state.user_json(*id)),
                None => gotrue_error(
                    StatusCode::UNAUTHORIZED,
                    "bad_jwt",
                    "invalid JWT: unable to parse or verify signature",
                ),
            }
        }
        "verify" if post => {
            let token = request.body.get("token_hash").and_then(Value::as_str);
            match token.and_then(|t| state.confirmations.remove(t)) {
                Some(id) => {
                    if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
                        user.confirmed = true;
                    }
                    let session = state.issue_session(id);
                    json_response(StatusCode::OK, session)
                }
                None => gotrue_error(
                    StatusCode::FORBIDDEN,
                    "otp_expired",
                    "Email link is invalid or has expired",
                ),
            }
        }
        _ => json_response(StatusCode::NOT_FOUND, json!({"message": "no route"})),
    }
}

fn password_grant(state: &mut BackendState, body: &Value) -> Response {
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    let password = body
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let Some(user) = state
        .user_by_email(email)
        .filter(|u| u.password == password)
    else {
        return json_response(
            StatusCode::BAD_REQUEST,
            json!({"error": "invalid_grant", "error_description": "Invalid login credentials"}),
        );
    };
    if !user.confirmed {
        return gotrue_error(
            StatusCode::BAD_REQUEST,
            "email_not_confirmed",
            "Email not confirmed",
        );
    }
    let id = user.id;
    json_response(StatusCode::OK, state.issue_session(id))
}

fn refresh_grant(state: &mut BackendState, body: &Value) -> Response {
    let token = body
        .get("refresh_token")
        .and_then(Value::as_str)
        .unwrap_or_default();
    match state.refresh_tokens.remove(token) {
        Some(id) => json_response(StatusCode::OK, state.issue_session(id)),
        None => gotrue_error(
            StatusCode::BAD_REQUEST,
            "refresh_token_not_found",
            "Invalid Refresh Token: Refresh Token Not Found",
        ),
    }
}

fn sign_up(state: &mut BackendState, body: &Value) -> Response {
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    let password = body
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if state.user_by_email(email).is_some() {
        return gotrue_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "user_already_exists",
            "User already registered",
        );
    }

    let metadata = body
        .get("data")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    let autoconfirm = state.autoconfirm;
    let id = state.create_user(email, password, autoconfirm, metadata);

    if autoconfirm {
        return json_response(StatusCode::OK, state.issue_session(id));
    }
    state
        .confirmations
        .insert(format!("confirm-{}", Uuid::new_v4()), id);
    json_response(StatusCode::OK, state.user_json(id))
}
