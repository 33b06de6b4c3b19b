//! # Authentication
//!
//! Email + password login issuing short-lived JWT access tokens, and the
//! middleware that guards every `/api/*` route except login and register.
//!
//! ## Request Flow
//! ```text
//! POST /api/auth/login {email, password}
//!      │  argon2 verify (parlour-db)
//!      ▼
//! {token, tokenType: "Bearer", expiresIn, user}
//!
//! GET /api/jobs   Authorization: Bearer <token>
//!      │  require_auth: decode + validate → AuthUser in request extensions
//!      ▼
//! handler
//! ```
//!
//! Registration is open only while the users table is empty, so a fresh
//! install can create its first admin. After that only admins register
//! users.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use axum::{Extension, Json};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use parlour_core::{User, UserRole};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// =============================================================================
// Tokens
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub email: String,

    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Generate an access token for a user.
    pub fn issue(&self, user: &User) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.ttl_secs);

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate(&self, token: &str) -> ApiResult<Claims> {
        let token_data: TokenData<Claims> = decode(token, &self.decoding, &Validation::default())
            .map_err(|e| {
                debug!(error = %e, "Rejected token");
                ApiError::unauthorized("Invalid or expired token")
            })?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn bearer_claims(jwt: &JwtManager, headers: &HeaderMap) -> ApiResult<Claims> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;
    let token = extract_bearer_token(value)
        .ok_or_else(|| ApiError::unauthorized("Expected a Bearer token"))?;
    jwt.validate(token)
}

// =============================================================================
// Middleware
// =============================================================================

/// The caller, as established by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> ApiResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("This action needs an admin account"))
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Rejects requests without a valid bearer token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = bearer_claims(&state.jwt, request.headers())?;
    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub role: Option<UserRole>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .db
        .users()
        .verify_credentials(&body.email, &body.password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let token = state.jwt.issue(&user)?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: state.jwt.ttl_secs(),
        user,
    }))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<User>> {
    let user = state
        .db
        .users()
        .get_by_id(&caller.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;
    Ok(Json(user))
}

/// Creates a user. The first user becomes an admin without a token;
/// afterwards an admin token is required.
pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let bootstrap = state.db.users().count().await? == 0;

    let role = if bootstrap {
        UserRole::Admin
    } else {
        let caller = AuthUser::from(bearer_claims(&state.jwt, &headers)?);
        if let Err(e) = caller.require_admin() {
            warn!(user_id = %caller.id, "Non-admin tried to register a user");
            return Err(e);
        }
        body.role.unwrap_or(UserRole::Staff)
    };

    let user = state
        .db
        .users()
        .create(&body.email, &body.display_name, &body.password, role)
        .await?;

    if bootstrap {
        info!(user_id = %user.id, "First admin registered");
    }
    Ok((StatusCode::CREATED, Json(user)))
}
