use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub token_type: String,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::AuthenticationError("Token subject is invalid.".to_string()))
    }

    pub fn is_staff(&self) -> bool {
        self.role == "ADMIN"
    }
}

// ============================================================================
// Token encode / decode
// ============================================================================

pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::AuthenticationError("Token is invalid or expired.".to_string()))
}

// ============================================================================
// Authentication Middleware
// ============================================================================

/// Requires a valid access token on every request it guards and injects the
/// decoded claims into request extensions. Role checks stay in the handlers,
/// so reads and writes under one path can carry different requirements.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Extract token from Authorization header
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            AppError::AuthenticationError(
                "Authentication credentials were not provided.".to_string(),
            )
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::AuthenticationError("Authorization header must use the Bearer scheme.".to_string())
    })?;

    // 2. Decode and validate JWT
    let claims = decode_token(token, &state.auth.secret)?;

    // 3. Refresh tokens never grant API access
    if claims.token_type != TOKEN_TYPE_ACCESS {
        return Err(AppError::AuthenticationError(
            "Token has wrong type.".to_string(),
        ));
    }

    // 4. Inject claims into request extensions
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

// ============================================================================
// Permission Check Helper
// ============================================================================

pub fn require_staff(claims: &Claims) -> Result<(), AppError> {
    if claims.is_staff() {
        Ok(())
    } else {
        Err(AppError::AuthorizationError(
            "You do not have permission to perform this action.".to_string(),
        ))
    }
}
