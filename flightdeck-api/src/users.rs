use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use flightdeck_core::repository::NewUser;
use flightdeck_core::users::{self, User};

use crate::error::AppError;
use crate::middleware::auth::{self, Claims, TOKEN_TYPE_ACCESS, TOKEN_TYPE_REFRESH};
use crate::state::{AppState, AuthConfig};

/// Routes reachable without a token.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(register))
        .route("/user/login", post(login))
        .route("/user/token/refresh", post(refresh))
        .route("/user/token/verify", post(verify))
}

/// Routes for the authenticated account itself.
pub fn account_routes() -> Router<AppState> {
    Router::new().route("/user/me", get(me).put(update_me).patch(patch_me))
}

#[derive(Debug, Serialize)]
struct UserOut {
    id: Uuid,
    email: String,
    is_staff: bool,
}

impl From<User> for UserOut {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_staff: user.is_staff,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegisterIn {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginIn {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct TokenPairOut {
    access: String,
    refresh: String,
}

#[derive(Debug, Deserialize)]
struct RefreshIn {
    refresh: String,
}

#[derive(Debug, Serialize)]
struct AccessOut {
    access: String,
}

#[derive(Debug, Deserialize)]
struct VerifyIn {
    token: String,
}

#[derive(Debug, Deserialize)]
struct AccountUpdateIn {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct AccountPatchIn {
    email: Option<String>,
    password: Option<String>,
}

const MIN_PASSWORD_LEN: usize = 5;

fn check_email(email: &str) -> Result<(), AppError> {
    if !users::valid_email(email) {
        return Err(AppError::validation_for(
            "email",
            "Enter a valid email address.",
        ));
    }
    Ok(())
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation_for(
            "password",
            format!(
                "Ensure this field has at least {} characters.",
                MIN_PASSWORD_LEN
            ),
        ));
    }
    Ok(())
}

fn claims_for(user: &User, token_type: &str, auth: &AuthConfig) -> Claims {
    let lifetime = match token_type {
        TOKEN_TYPE_REFRESH => Duration::days(auth.refresh_token_days as i64),
        _ => Duration::minutes(auth.access_token_minutes as i64),
    };
    let role = if user.is_staff { "ADMIN" } else { "CUSTOMER" };

    Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: role.to_string(),
        token_type: token_type.to_string(),
        exp: (Utc::now() + lifetime).timestamp() as usize,
    }
}

fn no_active_account() -> AppError {
    AppError::AuthenticationError("No active account found with the given credentials.".to_string())
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterIn>,
) -> Result<(StatusCode, Json<UserOut>), AppError> {
    check_email(&body.email)?;
    check_password(&body.password)?;

    let user = state
        .users
        .create_user(NewUser {
            email: body.email,
            password_hash: users::hash_password(&body.password),
            is_staff: false,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginIn>,
) -> Result<Json<TokenPairOut>, AppError> {
    let user = state
        .users
        .get_user_by_email(&body.email)
        .await?
        .filter(|user| users::verify_password(&body.password, &user.password_hash))
        .ok_or_else(no_active_account)?;

    Ok(Json(TokenPairOut {
        access: auth::issue_token(&claims_for(&user, TOKEN_TYPE_ACCESS, &state.auth), &state.auth.secret)?,
        refresh: auth::issue_token(&claims_for(&user, TOKEN_TYPE_REFRESH, &state.auth), &state.auth.secret)?,
    }))
}

/// Exchange a valid refresh token for a fresh access token.
async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshIn>,
) -> Result<Json<AccessOut>, AppError> {
    let claims = auth::decode_token(&body.refresh, &state.auth.secret)?;
    if claims.token_type != TOKEN_TYPE_REFRESH {
        return Err(AppError::AuthenticationError(
            "Token has wrong type.".to_string(),
        ));
    }

    let user = state
        .users
        .get_user(claims.user_id()?)
        .await?
        .ok_or_else(no_active_account)?;

    Ok(Json(AccessOut {
        access: auth::issue_token(&claims_for(&user, TOKEN_TYPE_ACCESS, &state.auth), &state.auth.secret)?,
    }))
}

/// Confirm that a token is well formed and unexpired. Accepts either type.
async fn verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyIn>,
) -> Result<Json<Value>, AppError> {
    auth::decode_token(&body.token, &state.auth.secret)?;
    Ok(Json(json!({})))
}

async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserOut>, AppError> {
    let user = state
        .users
        .get_user(claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    Ok(Json(user.into()))
}

async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<AccountUpdateIn>,
) -> Result<Json<UserOut>, AppError> {
    check_email(&body.email)?;
    check_password(&body.password)?;

    let user = state
        .users
        .update_user(
            claims.user_id()?,
            Some(body.email),
            Some(users::hash_password(&body.password)),
        )
        .await?;

    Ok(Json(user.into()))
}

async fn patch_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<AccountPatchIn>,
) -> Result<Json<UserOut>, AppError> {
    if let Some(email) = body.email.as_deref() {
        check_email(email)?;
    }
    if let Some(password) = body.password.as_deref() {
        check_password(password)?;
    }

    let user = state
        .users
        .update_user(
            claims.user_id()?,
            body.email,
            body.password.map(|password| users::hash_password(&password)),
        )
        .await?;

    Ok(Json(user.into()))
}
