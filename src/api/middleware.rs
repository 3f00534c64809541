//! API middleware
//!
//! Shared application state, the API error envelope and the session
//! authentication middleware.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::User;
use crate::services::{
    AuthService, AuthServiceError, CategoryService, CategoryServiceError, FailedLoginService,
    FailedLoginServiceError, FileService, FileServiceError, LoginRateLimiter, PermissionService,
    PermissionServiceError, PostService, PostServiceError, RoleService, RoleServiceError,
    TagService, TagServiceError, UserService, UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub role_service: Arc<RoleService>,
    pub permission_service: Arc<PermissionService>,
    pub category_service: Arc<CategoryService>,
    pub tag_service: Arc<TagService>,
    pub post_service: Arc<PostService>,
    pub failed_login_service: Arc<FailedLoginService>,
    pub file_service: Arc<FileService>,
    pub rate_limiter: Arc<LoginRateLimiter>,
}

/// Authenticated user extracted from the request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(details: serde_json::Value) -> Self {
        Self::with_details("VALIDATION_ERROR", "Validation failed", details)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new("RATE_LIMITED", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "INVALID_RESET_CODE" => StatusCode::BAD_REQUEST,
            "RATE_LIMITED" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

macro_rules! impl_from_service_error {
    ($err:ident, $entity:literal) => {
        impl From<$err> for ApiError {
            fn from(err: $err) -> Self {
                match err {
                    $err::NotFound(id) => {
                        ApiError::not_found(format!(concat!($entity, " not found: {}"), id))
                    }
                    $err::Validation(details) => ApiError::validation_error(details),
                    $err::Internal(err) => {
                        tracing::error!(error = %err, "internal error");
                        ApiError::internal_error(err.to_string())
                    }
                }
            }
        }
    };
}

impl_from_service_error!(UserServiceError, "User");
impl_from_service_error!(RoleServiceError, "Role");
impl_from_service_error!(PermissionServiceError, "Permission");
impl_from_service_error!(CategoryServiceError, "Category");
impl_from_service_error!(TagServiceError, "Tag");
impl_from_service_error!(PostServiceError, "Post");
impl_from_service_error!(FailedLoginServiceError, "Failed login");
impl_from_service_error!(FileServiceError, "File");

impl From<AuthServiceError> for ApiError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::InvalidCredentials => {
                ApiError::unauthorized("Invalid username or password")
            }
            AuthServiceError::RateLimited => {
                ApiError::rate_limited("Too many attempts, try again later")
            }
            AuthServiceError::InvalidSession => ApiError::unauthorized("Invalid or expired session"),
            AuthServiceError::InvalidResetCode => {
                ApiError::new("INVALID_RESET_CODE", "Invalid or expired reset code")
            }
            AuthServiceError::Validation(details) => ApiError::validation_error(details),
            AuthServiceError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                ApiError::internal_error(err.to_string())
            }
        }
    }
}

/// Extract a session token from the Authorization header or the
/// `session=` cookie
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Parse the token carried in the request, if any
pub(crate) fn session_token(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let token = extract_session_token(headers)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;
    Uuid::parse_str(&token).map_err(|_| ApiError::unauthorized("Invalid or expired session"))
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(request.headers())?;

    let (user, _roles) = state.auth_service.me(token).await?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}
