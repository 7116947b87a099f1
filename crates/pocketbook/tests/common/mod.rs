//! In-process mock of the finance API.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use api_types::{
    auth::{
        AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, ResendCodeRequest,
        UpdateUserRequest, User, VerifyRequest,
    },
    category::{Category, CategoryNew, CategoryUpdate},
    currency::Currency,
    report::AmountSummary,
    transaction::{Transaction, TransactionNew, TransactionType},
};
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use chrono::Utc;
use pocketbook::{AppConfig, AppContext, Storage};
use serde::Deserialize;
use serde_json::{Value, json};

pub const VERIFY_CODE: u32 = 123456;
pub const ANA_EMAIL: &str = "ana@example.com";
pub const ANA_PASSWORD: &str = "secret1";
pub const BOB_EMAIL: &str = "bob@example.com";
pub const BOB_PASSWORD: &str = "hunter22";
pub const SALARY: &str = "cat-salary";
pub const FOOD: &str = "cat-food";

type Reply<T> = Result<T, (StatusCode, Json<Value>)>;

fn reject(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "message": message })))
}

struct MockUser {
    user: User,
    password: String,
}

#[derive(Default)]
pub struct MockState {
    users: HashMap<String, MockUser>,
    tokens: HashMap<String, String>,
    currencies: Vec<Currency>,
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
    requests: Vec<(Method, String)>,
    next_id: u64,
    slow_transactions: Option<Duration>,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn issue_token(&mut self, email: &str) -> String {
        let token = self.next_id("token");
        self.tokens.insert(token.clone(), email.to_string());
        token
    }

    fn currency(&self, id: i64) -> Option<Currency> {
        self.currencies.iter().find(|c| c.id == id).cloned()
    }

    fn add_user(&mut self, id: &str, name: &str, email: &str, password: &str, verified: bool) {
        let user = User {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            verified,
            currency_id: 1,
            currency: self.currency(1),
        };
        self.users.insert(
            email.to_string(),
            MockUser {
                user,
                password: password.to_string(),
            },
        );
    }

    fn authorize(&self, headers: &HeaderMap) -> Reply<User> {
        let invalid = || reject(StatusCode::UNAUTHORIZED, "Invalid token");
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(invalid)?;
        let email = self.tokens.get(token).ok_or_else(invalid)?;
        let user = self.users.get(email).ok_or_else(invalid)?;
        Ok(user.user.clone())
    }
}

#[derive(Clone, Default)]
pub struct Mock(Arc<Mutex<MockState>>);

impl Mock {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn seeded() -> Self {
        let mock = Self::default();
        {
            let mut state = mock.lock();
            state.currencies = vec![
                currency(1, "USD", "United States", "en-US"),
                currency(2, "EUR", "Spain", "es-ES"),
                currency(3, "COP", "Colombia", "es-CO"),
            ];
            state.categories = vec![
                default_category(SALARY, "Salary", "💰"),
                default_category(FOOD, "Food", "🍔"),
            ];
            state.add_user("user-ana", "Ana", ANA_EMAIL, ANA_PASSWORD, false);
            state.add_user("user-bob", "Bob", BOB_EMAIL, BOB_PASSWORD, true);
        }
        mock
    }
}

fn currency(id: i64, code: &str, country: &str, country_id: &str) -> Currency {
    Currency {
        id,
        currency: code.to_string(),
        country: country.to_string(),
        country_id: country_id.to_string(),
    }
}

fn default_category(id: &str, name: &str, icon: &str) -> Category {
    Category {
        id: id.to_string(),
        user_id: None,
        name: name.to_string(),
        icon: icon.to_string(),
        editable: false,
    }
}

async fn record(State(mock): State<Mock>, request: Request, next: Next) -> Response {
    mock.lock()
        .requests
        .push((request.method().clone(), request.uri().path().to_string()));
    next.run(request).await
}

async fn register(
    State(mock): State<Mock>,
    Json(body): Json<RegisterRequest>,
) -> Reply<Json<AuthResponse>> {
    let mut state = mock.lock();
    if state.users.contains_key(&body.email) {
        return Err(reject(StatusCode::BAD_REQUEST, "Email already registered"));
    }
    let id = state.next_id("user");
    let user = User {
        id,
        name: body.name,
        email: body.email.clone(),
        verified: false,
        currency_id: body.currency_id,
        currency: state.currency(body.currency_id),
    };
    state.users.insert(
        body.email.clone(),
        MockUser {
            user: user.clone(),
            password: body.password,
        },
    );
    let token = state.issue_token(&body.email);
    Ok(Json(AuthResponse { user, token }))
}

async fn login(
    State(mock): State<Mock>,
    Json(body): Json<LoginRequest>,
) -> Reply<Json<AuthResponse>> {
    let mut state = mock.lock();
    let user = match state.users.get(&body.email) {
        Some(found) if found.password == body.password => found.user.clone(),
        _ => {
            return Err(reject(
                StatusCode::UNAUTHORIZED,
                "Invalid email or password",
            ));
        }
    };
    let token = state.issue_token(&body.email);
    Ok(Json(AuthResponse { user, token }))
}

async fn verify(State(mock): State<Mock>, Json(body): Json<VerifyRequest>) -> Reply<Json<Value>> {
    let mut state = mock.lock();
    match state.users.get_mut(&body.email) {
        Some(found) if body.code == VERIFY_CODE => {
            found.user.verified = true;
            Ok(Json(json!({ "message": "Email verified" })))
        }
        _ => Err(reject(StatusCode::BAD_REQUEST, "Invalid verification code")),
    }
}

async fn resend_code(
    State(mock): State<Mock>,
    Json(body): Json<ResendCodeRequest>,
) -> Reply<Json<Value>> {
    if !mock.lock().users.contains_key(&body.email) {
        return Err(reject(StatusCode::NOT_FOUND, "User not found"));
    }
    Ok(Json(json!({ "message": "Verification code sent" })))
}

async fn me(State(mock): State<Mock>, headers: HeaderMap) -> Reply<Json<User>> {
    mock.lock().authorize(&headers).map(Json)
}

async fn update_me(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Json(body): Json<UpdateUserRequest>,
) -> Reply<Json<User>> {
    let mut state = mock.lock();
    let user = state.authorize(&headers)?;
    let currency = state
        .currency(body.currency_id)
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "Unknown currency"))?;
    let found = state
        .users
        .get_mut(&user.email)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "User not found"))?;
    found.user.currency_id = currency.id;
    found.user.currency = Some(currency);
    Ok(Json(found.user.clone()))
}

#[derive(Deserialize)]
struct EmailQuery {
    email: String,
}

async fn change_password(
    State(mock): State<Mock>,
    Query(query): Query<EmailQuery>,
    Json(body): Json<ChangePasswordRequest>,
) -> Reply<Json<Value>> {
    let mut state = mock.lock();
    let found = state
        .users
        .get_mut(&query.email)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "User not found"))?;
    found.password = body.new_password;
    Ok(Json(json!({ "message": "Password updated" })))
}

async fn logout(State(mock): State<Mock>, headers: HeaderMap) -> StatusCode {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);
    if let Some(token) = token {
        mock.lock().tokens.remove(&token);
    }
    StatusCode::NO_CONTENT
}

async fn currencies(State(mock): State<Mock>) -> Json<Vec<Currency>> {
    Json(mock.lock().currencies.clone())
}

async fn list_categories(
    State(mock): State<Mock>,
    headers: HeaderMap,
) -> Reply<Json<Vec<Category>>> {
    let state = mock.lock();
    let user = state.authorize(&headers)?;
    let visible = state
        .categories
        .iter()
        .filter(|c| c.user_id.is_none() || c.user_id.as_deref() == Some(user.id.as_str()))
        .cloned()
        .collect();
    Ok(Json(visible))
}

async fn create_category(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Json(body): Json<CategoryNew>,
) -> Reply<(StatusCode, Json<Category>)> {
    let mut state = mock.lock();
    let user = state.authorize(&headers)?;
    let category = Category {
        id: state.next_id("cat"),
        user_id: Some(user.id),
        name: body.name,
        icon: body.icon,
        editable: true,
    };
    state.categories.push(category.clone());
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<CategoryUpdate>,
) -> Reply<Json<Category>> {
    let mut state = mock.lock();
    state.authorize(&headers)?;
    let category = state
        .categories
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Category not found"))?;
    if let Some(name) = body.name {
        if !category.editable && name != category.name {
            return Err(reject(
                StatusCode::FORBIDDEN,
                "Default categories cannot be renamed",
            ));
        }
        category.name = name;
    }
    if let Some(icon) = body.icon {
        category.icon = icon;
    }
    Ok(Json(category.clone()))
}

async fn delete_category(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply<StatusCode> {
    let mut state = mock.lock();
    state.authorize(&headers)?;
    let index = state
        .categories
        .iter()
        .position(|c| c.id == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Category not found"))?;
    if !state.categories[index].editable {
        return Err(reject(
            StatusCode::FORBIDDEN,
            "Default categories cannot be deleted",
        ));
    }
    state.categories.remove(index);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_transactions(
    State(mock): State<Mock>,
    headers: HeaderMap,
) -> Reply<Json<Vec<Transaction>>> {
    let delay = mock.lock().slow_transactions;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let state = mock.lock();
    let user = state.authorize(&headers)?;
    let own = state
        .transactions
        .iter()
        .filter(|tx| tx.user_id == user.id)
        .cloned()
        .collect();
    Ok(Json(own))
}

async fn create_transaction(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Json(body): Json<TransactionNew>,
) -> Reply<(StatusCode, Json<Transaction>)> {
    let mut state = mock.lock();
    let user = state.authorize(&headers)?;
    let transaction = Transaction {
        id: state.next_id("tx"),
        user_id: user.id,
        amount: body.amount,
        kind: body.kind,
        desc: body.desc,
        category_id: body.category_id,
        created_at: Some(Utc::now()),
        category: None,
    };
    state.transactions.push(transaction.clone());
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Applies the patch and answers with only the fields that changed.
async fn update_transaction(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply<Json<Value>> {
    let mut state = mock.lock();
    let user = state.authorize(&headers)?;
    let transaction = state
        .transactions
        .iter_mut()
        .find(|tx| tx.id == id && tx.user_id == user.id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Transaction not found"))?;

    let mut merged = serde_json::to_value(&*transaction)
        .map_err(|_| reject(StatusCode::INTERNAL_SERVER_ERROR, "encode"))?;
    let mut answer = json!({ "id": id });
    if let (Value::Object(merged), Value::Object(patch), Value::Object(answer)) =
        (&mut merged, body, &mut answer)
    {
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
            answer.insert(key, value);
        }
    }
    *transaction = serde_json::from_value(merged)
        .map_err(|_| reject(StatusCode::BAD_REQUEST, "Invalid transaction"))?;
    Ok(Json(answer))
}

async fn delete_transaction(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply<StatusCode> {
    let mut state = mock.lock();
    let user = state.authorize(&headers)?;
    let before = state.transactions.len();
    state
        .transactions
        .retain(|tx| !(tx.id == id && tx.user_id == user.id));
    if state.transactions.len() == before {
        return Err(reject(StatusCode::NOT_FOUND, "Transaction not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn amounts(State(mock): State<Mock>, headers: HeaderMap) -> Reply<Json<AmountSummary>> {
    let state = mock.lock();
    let user = state.authorize(&headers)?;
    let mut summary = AmountSummary::default();
    for tx in state.transactions.iter().filter(|tx| tx.user_id == user.id) {
        match tx.kind {
            TransactionType::Income => summary.total_income += tx.amount,
            TransactionType::Expense => summary.total_expense += tx.amount,
        }
    }
    summary.total = summary.total_income - summary.total_expense;
    Ok(Json(summary))
}

fn router(mock: Mock) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify", post(verify))
        .route("/auth/resendCode", put(resend_code))
        .route("/auth/me", get(me))
        .route("/auth/me/update", put(update_me))
        .route("/auth/changepass", put(change_password))
        .route("/auth/logout", post(logout))
        .route("/api/currency", get(currencies))
        .route("/api/category", get(list_categories).post(create_category))
        .route(
            "/api/category/{id}",
            put(update_category).delete(delete_category),
        )
        .route(
            "/api/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/api/transactions/{id}",
            put(update_transaction).delete(delete_transaction),
        )
        .route("/api/reports/amounts", get(amounts))
        .layer(middleware::from_fn_with_state(mock.clone(), record))
        .with_state(mock)
}

pub struct MockServer {
    addr: SocketAddr,
    mock: Mock,
}

impl MockServer {
    pub async fn spawn() -> Self {
        let mock = Mock::seeded();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(mock.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, mock }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Fresh client context with in-memory persisted state.
    pub fn context(&self) -> Arc<AppContext> {
        self.context_with(Storage::memory())
    }

    pub fn context_with(&self, storage: Storage) -> Arc<AppContext> {
        let config = AppConfig {
            base_url: self.base_url(),
            ..AppConfig::default()
        };
        Arc::new(AppContext::with_storage(config, storage).unwrap())
    }

    pub fn requests(&self) -> Vec<(Method, String)> {
        self.mock.lock().requests.clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.mock
            .lock()
            .requests
            .iter()
            .filter(|(m, p)| *m == method && p == path)
            .count()
    }

    /// Number of requests under `/api/`.
    pub fn api_requests(&self) -> usize {
        self.mock
            .lock()
            .requests
            .iter()
            .filter(|(_, p)| p.starts_with("/api/"))
            .count()
    }

    pub fn set_slow_transactions(&self, delay: Duration) {
        self.mock.lock().slow_transactions = Some(delay);
    }

    /// Invalidates every issued token server-side.
    pub fn revoke_tokens(&self) {
        self.mock.lock().tokens.clear();
    }

    pub fn is_verified(&self, email: &str) -> bool {
        self.mock
            .lock()
            .users
            .get(email)
            .is_some_and(|found| found.user.verified)
    }

    pub fn token_count(&self) -> usize {
        self.mock.lock().tokens.len()
    }
}

/// Polls `check` until it holds, failing after five seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}
