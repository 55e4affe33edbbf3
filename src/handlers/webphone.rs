use crate::auth::AuthenticatedUser;
use crate::schemas::{ApiError, AppState, ErrorResponse, directory_error};
use axum::{extract::State, http::StatusCode, response::Json};
use common::WebphoneConfig;
use directory::{projection, sessions};
use tracing::{debug, info, instrument, warn};

async fn webphone_config_for(
    state: &AppState,
    caller: &AuthenticatedUser,
) -> Result<Json<WebphoneConfig>, ApiError> {
    let config = projection::webphone_config(&state.db, &caller.user)
        .await
        .map_err(directory_error)?;
    debug!(
        "Webphone config for {}: has_account={}",
        caller.user.username, config.has_account
    );
    Ok(Json(config))
}

/// Webphone configuration of the signed-in user
///
/// Returns `{"has_account": false, "account": {}}` when the user has no usable
/// SIP account.
#[utoipa::path(
    get,
    path = "/phone/webphone/config",
    tag = "webphone",
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Webphone configuration", body = WebphoneConfig),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_webphone_config(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> Result<Json<WebphoneConfig>, ApiError> {
    webphone_config_for(&state, &caller).await
}

/// Webphone configuration of the signed-in user (POST variant for RPC-style clients)
#[utoipa::path(
    post,
    path = "/phone/webphone/config",
    tag = "webphone",
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Webphone configuration", body = WebphoneConfig),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn post_webphone_config(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> Result<Json<WebphoneConfig>, ApiError> {
    webphone_config_for(&state, &caller).await
}

/// End the caller's session
#[utoipa::path(
    delete,
    path = "/api/v1/session",
    tag = "webphone",
    security(("session_token" = [])),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    let revoked = sessions::revoke(&state.db, &caller.token)
        .await
        .map_err(directory_error)?;
    if revoked {
        info!("User {} logged out", caller.user.username);
    } else {
        warn!("Session for {} was already gone", caller.user.username);
    }
    Ok(StatusCode::NO_CONTENT)
}
