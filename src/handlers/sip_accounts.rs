use crate::auth::{AdminUser, AuthenticatedUser};
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse, directory_error};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use directory::accounts::{self, NewSipAccount, SipAccountChanges};
use directory::{ConstraintViolation, DirectoryError};
use model::entities::sip_account;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

/// One SIP account to create. Required fields default to empty when left out
/// of the body so they are reported as `MISSING_FIELD`.
#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateSipAccountRequest {
    /// Account name; defaults to the extension when omitted or blank
    pub label: Option<String>,
    /// Owning user ID
    #[serde(default)]
    pub user_id: Option<i32>,
    /// Internal phone number
    #[serde(default)]
    pub extension: String,
    /// Registrar login
    #[serde(default)]
    pub auth_username: String,
    /// Registrar secret
    #[serde(default)]
    pub auth_password: String,
    /// Registrar domain or host
    #[serde(default)]
    pub sip_domain: String,
    /// WebSocket signalling endpoint (`ws://` or `wss://`)
    #[serde(default)]
    pub sip_websocket_uri: String,
    pub outbound_proxy: Option<String>,
    pub stun_server: Option<String>,
    pub turn_server: Option<String>,
    pub turn_username: Option<String>,
    pub turn_password: Option<String>,
    /// Defaults to true
    pub enabled: Option<bool>,
}

impl std::fmt::Debug for CreateSipAccountRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateSipAccountRequest")
            .field("user_id", &self.user_id)
            .field("extension", &self.extension)
            .field("sip_domain", &self.sip_domain)
            .finish_non_exhaustive()
    }
}

impl TryFrom<CreateSipAccountRequest> for NewSipAccount {
    type Error = ConstraintViolation;

    fn try_from(request: CreateSipAccountRequest) -> Result<Self, Self::Error> {
        let user_id = request
            .user_id
            .ok_or(ConstraintViolation::MissingField("user_id"))?;
        Ok(Self {
            label: request.label,
            user_id,
            extension: request.extension,
            auth_username: request.auth_username,
            auth_password: request.auth_password,
            sip_domain: request.sip_domain,
            sip_websocket_uri: request.sip_websocket_uri,
            outbound_proxy: request.outbound_proxy,
            stun_server: request.stun_server,
            turn_server: request.turn_server,
            turn_username: request.turn_username,
            turn_password: request.turn_password,
            enabled: request.enabled,
        })
    }
}

/// Partial update of a SIP account. Omitted fields are left untouched; an
/// empty string clears an optional field.
#[derive(Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateSipAccountRequest {
    pub label: Option<String>,
    pub user_id: Option<i32>,
    pub extension: Option<String>,
    pub auth_username: Option<String>,
    pub auth_password: Option<String>,
    pub sip_domain: Option<String>,
    pub sip_websocket_uri: Option<String>,
    pub outbound_proxy: Option<String>,
    pub stun_server: Option<String>,
    pub turn_server: Option<String>,
    pub turn_username: Option<String>,
    pub turn_password: Option<String>,
    pub enabled: Option<bool>,
}

impl std::fmt::Debug for UpdateSipAccountRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateSipAccountRequest")
            .field("user_id", &self.user_id)
            .field("extension", &self.extension)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl From<UpdateSipAccountRequest> for SipAccountChanges {
    fn from(request: UpdateSipAccountRequest) -> Self {
        Self {
            label: request.label,
            user_id: request.user_id,
            extension: request.extension,
            auth_username: request.auth_username,
            auth_password: request.auth_password,
            sip_domain: request.sip_domain,
            sip_websocket_uri: request.sip_websocket_uri,
            outbound_proxy: request.outbound_proxy,
            stun_server: request.stun_server,
            turn_server: request.turn_server,
            turn_username: request.turn_username,
            turn_password: request.turn_password,
            enabled: request.enabled,
        }
    }
}

/// SIP account as seen through the management API. Secrets are omitted.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SipAccountResponse {
    pub id: i32,
    /// "label (extension)"
    pub display_name: String,
    pub label: String,
    pub user_id: i32,
    pub extension: String,
    pub auth_username: String,
    pub sip_domain: String,
    pub sip_websocket_uri: String,
    pub outbound_proxy: Option<String>,
    pub stun_server: Option<String>,
    pub turn_server: Option<String>,
    pub turn_username: Option<String>,
    pub enabled: bool,
}

impl From<sip_account::Model> for SipAccountResponse {
    fn from(model: sip_account::Model) -> Self {
        Self {
            id: model.id,
            display_name: model.display_name(),
            label: model.label,
            user_id: model.user_id,
            extension: model.extension,
            auth_username: model.auth_username,
            sip_domain: model.sip_domain,
            sip_websocket_uri: model.sip_websocket_uri,
            outbound_proxy: model.outbound_proxy,
            stun_server: model.stun_server,
            turn_server: model.turn_server,
            turn_username: model.turn_username,
            enabled: model.enabled,
        }
    }
}

/// Create SIP accounts in bulk. All records are created or none is.
#[utoipa::path(
    post,
    path = "/api/v1/sip-accounts",
    tag = "sip-accounts",
    request_body = Vec<CreateSipAccountRequest>,
    security(("session_token" = [])),
    responses(
        (status = 201, description = "SIP accounts created successfully", body = ApiResponse<Vec<SipAccountResponse>>),
        (status = 400, description = "Invalid field value or unknown owner", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Administrator access required", body = ErrorResponse),
        (status = 409, description = "Extension or owner already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, requests), fields(count = requests.len()))]
pub async fn create_sip_accounts(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(requests): Json<Vec<CreateSipAccountRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<SipAccountResponse>>>), ApiError> {
    trace!("Entering create_sip_accounts function");
    debug!(
        "User {} creating {} SIP account(s)",
        admin.user.username,
        requests.len()
    );

    let records = requests
        .into_iter()
        .map(NewSipAccount::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|violation| directory_error(DirectoryError::from(violation)))?;
    let created = accounts::create_many(&state.db, records)
        .await
        .map_err(directory_error)?;

    info!("Created {} SIP account(s)", created.len());
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            created.into_iter().map(SipAccountResponse::from).collect(),
            "SIP accounts created successfully",
        )),
    ))
}

/// List the SIP accounts visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/sip-accounts",
    tag = "sip-accounts",
    security(("session_token" = [])),
    responses(
        (status = 200, description = "SIP accounts retrieved successfully", body = ApiResponse<Vec<SipAccountResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_sip_accounts(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<SipAccountResponse>>>, ApiError> {
    trace!("Entering get_sip_accounts function");

    let visible = accounts::visible_to(&state.db, &caller.viewer())
        .await
        .map_err(directory_error)?;

    debug!(
        "User {} can see {} SIP account(s)",
        caller.user.username,
        visible.len()
    );
    Ok(Json(ApiResponse::ok(
        visible.into_iter().map(SipAccountResponse::from).collect(),
        "SIP accounts retrieved successfully",
    )))
}

/// Get a SIP account visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/sip-accounts/{sip_account_id}",
    tag = "sip-accounts",
    params(
        ("sip_account_id" = i32, Path, description = "SIP account ID"),
    ),
    security(("session_token" = [])),
    responses(
        (status = 200, description = "SIP account retrieved successfully", body = ApiResponse<SipAccountResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "SIP account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_sip_account(
    Path(sip_account_id): Path<i32>,
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> Result<Json<ApiResponse<SipAccountResponse>>, ApiError> {
    let account = accounts::find_visible(&state.db, &caller.viewer(), sip_account_id)
        .await
        .map_err(directory_error)?;

    Ok(Json(ApiResponse::ok(
        SipAccountResponse::from(account),
        "SIP account retrieved successfully",
    )))
}

/// Update a SIP account
#[utoipa::path(
    put,
    path = "/api/v1/sip-accounts/{sip_account_id}",
    tag = "sip-accounts",
    params(
        ("sip_account_id" = i32, Path, description = "SIP account ID"),
    ),
    request_body = UpdateSipAccountRequest,
    security(("session_token" = [])),
    responses(
        (status = 200, description = "SIP account updated successfully", body = ApiResponse<SipAccountResponse>),
        (status = 400, description = "Invalid field value or unknown owner", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "SIP account not found", body = ErrorResponse),
        (status = 409, description = "Extension or owner already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_sip_account(
    Path(sip_account_id): Path<i32>,
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(request): Json<UpdateSipAccountRequest>,
) -> Result<Json<ApiResponse<SipAccountResponse>>, ApiError> {
    trace!(
        "Entering update_sip_account function for id: {}",
        sip_account_id
    );

    let updated = accounts::update(&state.db, sip_account_id, request.into())
        .await
        .map_err(directory_error)?;

    Ok(Json(ApiResponse::ok(
        SipAccountResponse::from(updated),
        "SIP account updated successfully",
    )))
}

/// Delete a SIP account
#[utoipa::path(
    delete,
    path = "/api/v1/sip-accounts/{sip_account_id}",
    tag = "sip-accounts",
    params(
        ("sip_account_id" = i32, Path, description = "SIP account ID"),
    ),
    security(("session_token" = [])),
    responses(
        (status = 204, description = "SIP account deleted successfully"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "SIP account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_sip_account(
    Path(sip_account_id): Path<i32>,
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<StatusCode, ApiError> {
    accounts::delete(&state.db, sip_account_id)
        .await
        .map_err(directory_error)?;
    Ok(StatusCode::NO_CONTENT)
}
