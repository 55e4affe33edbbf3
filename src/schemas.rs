use axum::{http::StatusCode, response::Json};
use common::{SipAccountPayload, WebphoneAccount, WebphoneConfig};
use directory::{ConstraintViolation, DirectoryError, ValidationError};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::config::Settings;
use crate::handlers::sip_accounts::{
    CreateSipAccountRequest, SipAccountResponse, UpdateSipAccountRequest,
};
use crate::handlers::users::{CreateUserRequest, MeResponse, UpdateUserRequest, UserResponse};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Settings the server was started with
    pub settings: Arc<Settings>,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: &str) -> Self {
        Self {
            data,
            message: message.to_string(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Map a directory error onto an HTTP status and error code.
pub fn directory_error(err: DirectoryError) -> ApiError {
    let message = err.to_string();
    match err {
        DirectoryError::Validation(ValidationError::WebsocketUri(_)) => {
            api_error(StatusCode::BAD_REQUEST, "INVALID_WS_URI", message)
        }
        DirectoryError::Constraint(violation) => match violation {
            ConstraintViolation::DuplicateExtension(_) => {
                api_error(StatusCode::CONFLICT, "DUPLICATE_EXTENSION", message)
            }
            ConstraintViolation::DuplicateOwner(_) => {
                api_error(StatusCode::CONFLICT, "DUPLICATE_OWNER", message)
            }
            ConstraintViolation::UnknownOwner(_) => {
                api_error(StatusCode::BAD_REQUEST, "INVALID_OWNER_ID", message)
            }
            ConstraintViolation::MissingField(_) => {
                api_error(StatusCode::BAD_REQUEST, "MISSING_FIELD", message)
            }
        },
        DirectoryError::NotFound { .. } => api_error(StatusCode::NOT_FOUND, "NOT_FOUND", message),
        DirectoryError::Forbidden(_) => api_error(StatusCode::FORBIDDEN, "FORBIDDEN", message),
        DirectoryError::Unauthorized => {
            api_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
        }
        DirectoryError::Database(db_error) => {
            error!("Database error: {}", db_error);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Internal server error",
            )
        }
    }
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

struct SessionAuth;

impl Modify for SessionAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_token",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::webphone::get_webphone_config,
        crate::handlers::webphone::post_webphone_config,
        crate::handlers::webphone::logout,
        crate::handlers::users::create_user,
        crate::handlers::users::get_users,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::users::get_me,
        crate::handlers::sip_accounts::create_sip_accounts,
        crate::handlers::sip_accounts::get_sip_accounts,
        crate::handlers::sip_accounts::get_sip_account,
        crate::handlers::sip_accounts::update_sip_account,
        crate::handlers::sip_accounts::delete_sip_account,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            WebphoneConfig,
            WebphoneAccount,
            SipAccountPayload,
            CreateUserRequest,
            UpdateUserRequest,
            UserResponse,
            MeResponse,
            CreateSipAccountRequest,
            UpdateSipAccountRequest,
            SipAccountResponse,
        )
    ),
    modifiers(&SessionAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "webphone", description = "Webphone configuration for the signed-in user"),
        (name = "users", description = "User management"),
        (name = "sip-accounts", description = "SIP account management"),
    ),
    info(
        title = "Sipdesk API",
        description = "SIP account directory and WebRTC webphone configuration service",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
