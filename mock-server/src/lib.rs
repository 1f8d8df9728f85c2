//! In-memory implementation of the companion chat service contract.
//!
//! Serves as the live fixture for the client's integration tests and as a
//! standalone binary for manual poking. State lives behind one
//! `Arc<RwLock<_>>`; nothing survives a restart. Error bodies always take
//! the `{"error": "..."}` shape the real service uses.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub nombre: String,
    pub email: String,
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub partner: Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct RegisterInput {
    pub nombre: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateChatInput {
    pub partner: Value,
}

#[derive(Deserialize)]
pub struct SendMessageInput {
    pub sender: String,
    pub content: String,
}

struct UserRecord {
    user: User,
    password: String,
}

struct ChatRecord {
    chat: Chat,
    owner: String,
}

#[derive(Default)]
pub struct ServerState {
    users: HashMap<String, UserRecord>,
    /// token -> user id
    tokens: HashMap<String, String>,
    chats: HashMap<String, ChatRecord>,
    /// chat id -> messages in send order
    messages: HashMap<String, Vec<Message>>,
}

pub type Db = Arc<RwLock<ServerState>>;

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<T, ApiError>;

fn reject(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(ServerState::default()));
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify/{token}", get(verify_email))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/resend-verification", post(resend_verification))
        .route("/users/me", get(get_current_user))
        .route("/users/preferences", patch(update_preferences))
        .route("/onboarding/complete", post(complete_onboarding))
        .route("/onboarding/status", get(onboarding_status))
        .route("/chats", get(list_chats).post(create_chat))
        .route("/chats/{id}", get(get_chat))
        .route("/chats/{id}/deactivate", patch(deactivate_chat))
        .route("/messages/test-new-character/{chat_id}", post(test_new_character))
        .route("/messages/{chat_id}", get(list_messages).post(send_message))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Resolve the bearer token in `headers` to a user id.
async fn authorize(db: &Db, headers: &HeaderMap) -> ApiResult<String> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "no token provided"))?;
    let state = db.read().await;
    state
        .tokens
        .get(token)
        .cloned()
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "invalid token"))
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

async fn register(
    State(db): State<Db>,
    Json(input): Json<RegisterInput>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut state = db.write().await;
    if state.users.values().any(|r| r.user.email == input.email) {
        return Err(reject(StatusCode::BAD_REQUEST, "email already registered"));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        nombre: input.nombre,
        email: input.email,
        onboarding_completed: false,
        created_at: now,
        updated_at: now,
    };
    let token = Uuid::new_v4().to_string();
    state.tokens.insert(token.clone(), user.id.clone());
    state.users.insert(
        user.id.clone(),
        UserRecord {
            user: user.clone(),
            password: input.password,
        },
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "token": token, "user": user })),
    ))
}

async fn login(State(db): State<Db>, Json(input): Json<LoginInput>) -> ApiResult<Json<Value>> {
    let mut state = db.write().await;
    let user = state
        .users
        .values()
        .find(|r| r.user.email == input.email && r.password == input.password)
        .map(|r| r.user.clone())
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "invalid credentials"))?;

    let token = Uuid::new_v4().to_string();
    state.tokens.insert(token.clone(), user.id.clone());
    Ok(Json(json!({ "token": token, "user": user })))
}

async fn verify_email(Path(_token): Path<String>) -> Json<Value> {
    Json(json!({ "message": "email verified" }))
}

async fn forgot_password(Json(_input): Json<Value>) -> Json<Value> {
    // Always acknowledges, matching the real service's no-enumeration stance.
    Json(json!({ "message": "reset email sent" }))
}

async fn reset_password(Json(_input): Json<Value>) -> Json<Value> {
    Json(json!({ "message": "password updated" }))
}

async fn resend_verification(Json(_input): Json<Value>) -> Json<Value> {
    Json(json!({ "message": "verification email sent" }))
}

// ---------------------------------------------------------------------------
// User + onboarding
// ---------------------------------------------------------------------------

async fn get_current_user(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let user_id = authorize(&db, &headers).await?;
    let state = db.read().await;
    let user = state
        .users
        .get(&user_id)
        .map(|r| r.user.clone())
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "invalid token"))?;
    Ok(Json(json!({ "user": user })))
}

async fn update_preferences(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(_preferences): Json<Value>,
) -> ApiResult<Json<Value>> {
    authorize(&db, &headers).await?;
    Ok(Json(json!({ "message": "preferences updated" })))
}

async fn complete_onboarding(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(_data): Json<Value>,
) -> ApiResult<Json<Value>> {
    let user_id = authorize(&db, &headers).await?;
    let mut state = db.write().await;
    if let Some(record) = state.users.get_mut(&user_id) {
        record.user.onboarding_completed = true;
        record.user.updated_at = Utc::now();
    }
    Ok(Json(json!({ "message": "onboarding completed" })))
}

async fn onboarding_status(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let user_id = authorize(&db, &headers).await?;
    let state = db.read().await;
    let completed = state
        .users
        .get(&user_id)
        .is_some_and(|r| r.user.onboarding_completed);
    Ok(Json(json!({ "completed": completed })))
}

// ---------------------------------------------------------------------------
// Chats
// ---------------------------------------------------------------------------

async fn list_chats(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let user_id = authorize(&db, &headers).await?;
    let state = db.read().await;
    let chats: Vec<Chat> = state
        .chats
        .values()
        .filter(|r| r.owner == user_id)
        .map(|r| r.chat.clone())
        .collect();
    Ok(Json(json!({ "chats": chats })))
}

async fn create_chat(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateChatInput>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let user_id = authorize(&db, &headers).await?;
    let now = Utc::now();
    let chat = Chat {
        id: Uuid::new_v4().to_string(),
        partner: input.partner,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.write().await.chats.insert(
        chat.id.clone(),
        ChatRecord {
            chat: chat.clone(),
            owner: user_id,
        },
    );
    Ok((StatusCode::CREATED, Json(json!({ "chat": chat }))))
}

async fn get_chat(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user_id = authorize(&db, &headers).await?;
    let state = db.read().await;
    let chat = state
        .chats
        .get(&id)
        .filter(|r| r.owner == user_id)
        .map(|r| r.chat.clone())
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "chat not found"))?;
    Ok(Json(json!({ "chat": chat })))
}

async fn deactivate_chat(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user_id = authorize(&db, &headers).await?;
    let mut state = db.write().await;
    let record = state
        .chats
        .get_mut(&id)
        .filter(|r| r.owner == user_id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "chat not found"))?;
    record.chat.is_active = false;
    record.chat.updated_at = Utc::now();
    Ok(Json(json!({ "message": "chat deactivated" })))
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// 404 unless `chat_id` names a chat owned by `user_id`.
fn check_chat(state: &ServerState, user_id: &str, chat_id: &str) -> ApiResult<()> {
    state
        .chats
        .get(chat_id)
        .filter(|r| r.owner == user_id)
        .map(|_| ())
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "chat not found"))
}

async fn list_messages(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user_id = authorize(&db, &headers).await?;
    let state = db.read().await;
    check_chat(&state, &user_id, &chat_id)?;
    let messages = state.messages.get(&chat_id).cloned().unwrap_or_default();
    Ok(Json(json!({ "messages": messages })))
}

async fn send_message(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(chat_id): Path<String>,
    Json(input): Json<SendMessageInput>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let user_id = authorize(&db, &headers).await?;
    let mut state = db.write().await;
    check_chat(&state, &user_id, &chat_id)?;
    let message = Message {
        id: Uuid::new_v4().to_string(),
        chat_id: chat_id.clone(),
        sender: input.sender,
        content: input.content,
        created_at: Utc::now(),
    };
    state
        .messages
        .entry(chat_id)
        .or_default()
        .push(message.clone());
    Ok((StatusCode::CREATED, Json(json!({ "message": message }))))
}

async fn test_new_character(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user_id = authorize(&db, &headers).await?;
    let state = db.read().await;
    check_chat(&state, &user_id, &chat_id)?;
    Ok(Json(json!({ "message": "test message queued" })))
}
