use crate::auth::{AdminUser, AuthenticatedUser};
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse, api_error, directory_error};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use directory::{DirectoryError, projection};
use model::entities::user;
use sea_orm::{ActiveModelTrait, DbErr, EntityTrait, QueryOrder, Set, SqlErr};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidateEmail};

/// Request body for creating a new user
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    /// Username (must be unique)
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    /// Name shown in the webphone
    #[validate(length(min = 1, max = 128))]
    pub display_name: String,
    /// Contact email
    #[validate(email)]
    pub email: Option<String>,
    /// Grants access to the management API
    pub is_admin: Option<bool>,
}

/// Request body for updating a user
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[validate(schema(function = "validate_update_email"))]
pub struct UpdateUserRequest {
    /// Username (must be unique)
    #[validate(length(min = 1, max = 64))]
    pub username: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub display_name: Option<String>,
    /// Contact email; an empty string clears it
    pub email: Option<String>,
    pub is_admin: Option<bool>,
}

/// An empty email clears the stored one; anything else must be a valid address.
fn validate_update_email(request: &UpdateUserRequest) -> Result<(), validator::ValidationError> {
    match request.email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() && !email.validate_email() => {
            Err(validator::ValidationError::new("email"))
        }
        _ => Ok(()),
    }
}

/// User response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub is_admin: bool,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            display_name: model.display_name,
            email: model.email,
            is_admin: model.is_admin,
        }
    }
}

/// The calling user with their derived SIP extension
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    /// Extension of the primary SIP account, if any
    pub sip_extension: Option<String>,
}

fn user_write_error(db_error: DbErr, username: &str) -> ApiError {
    match db_error.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            warn!("Username '{}' already exists", username);
            api_error(
                StatusCode::CONFLICT,
                "USERNAME_ALREADY_EXISTS",
                format!("Username '{}' already exists", username),
            )
        }
        _ => directory_error(DirectoryError::Database(db_error)),
    }
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = CreateUserRequest,
    security(("session_token" = [])),
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Administrator access required", body = ErrorResponse),
        (status = 409, description = "Username already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Valid(Json(request)): Valid<Json<CreateUserRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    trace!("Entering create_user function");
    debug!("Creating user with username: {}", request.username);

    let new_user = user::ActiveModel {
        username: Set(request.username.clone()),
        display_name: Set(request.display_name),
        email: Set(request.email.filter(|e| !e.trim().is_empty())),
        is_admin: Set(request.is_admin.unwrap_or(false)),
        ..Default::default()
    };

    let user_model = new_user
        .insert(&state.db)
        .await
        .map_err(|e| user_write_error(e, &request.username))?;

    info!(
        "User created successfully with ID: {}, username: {}",
        user_model.id, user_model.username
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            UserResponse::from(user_model),
            "User created successfully",
        )),
    ))
}

/// Get all users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Administrator access required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    trace!("Entering get_users function");

    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| directory_error(e.into()))?;

    info!("Successfully retrieved {} users", users.len());
    Ok(Json(ApiResponse::ok(
        users.into_iter().map(UserResponse::from).collect(),
        "Users retrieved successfully",
    )))
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    security(("session_token" = [])),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    trace!("Entering get_user function for user_id: {}", user_id);

    let user_model = find_user(&state, user_id).await?;
    Ok(Json(ApiResponse::ok(
        UserResponse::from(user_model),
        "User retrieved successfully",
    )))
}

async fn find_user(state: &AppState, user_id: i32) -> Result<user::Model, ApiError> {
    match user::Entity::find_by_id(user_id).one(&state.db).await {
        Ok(Some(user_model)) => Ok(user_model),
        Ok(None) => {
            warn!("User with ID {} not found", user_id);
            Err(directory_error(DirectoryError::not_found("User", user_id)))
        }
        Err(db_error) => {
            error!("Failed to retrieve user with ID {}: {}", user_id, db_error);
            Err(directory_error(db_error.into()))
        }
    }
}

/// Update a user
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = UpdateUserRequest,
    security(("session_token" = [])),
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Username already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Valid(Json(request)): Valid<Json<UpdateUserRequest>>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    trace!("Entering update_user function for user_id: {}", user_id);

    let existing = find_user(&state, user_id).await?;
    let username = request
        .username
        .clone()
        .unwrap_or_else(|| existing.username.clone());
    let mut active: user::ActiveModel = existing.clone().into();

    if let Some(new_username) = request.username {
        debug!("Updating username to: {}", new_username);
        active.username = Set(new_username);
    }
    if let Some(display_name) = request.display_name {
        active.display_name = Set(display_name);
    }
    if let Some(email) = request.email {
        active.email = Set(Some(email).filter(|e| !e.trim().is_empty()));
    }
    if let Some(is_admin) = request.is_admin {
        active.is_admin = Set(is_admin);
    }

    if !active.is_changed() {
        debug!("No fields to update for user {}", user_id);
        return Ok(Json(ApiResponse::ok(
            UserResponse::from(existing),
            "User updated successfully",
        )));
    }

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| user_write_error(e, &username))?;

    info!("User {} updated successfully", updated.id);
    Ok(Json(ApiResponse::ok(
        UserResponse::from(updated),
        "User updated successfully",
    )))
}

/// Delete a user together with its SIP account and sessions
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    security(("session_token" = [])),
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<StatusCode, ApiError> {
    trace!("Entering delete_user function for user_id: {}", user_id);

    let result = user::Entity::delete_by_id(user_id)
        .exec(&state.db)
        .await
        .map_err(|e| directory_error(e.into()))?;

    if result.rows_affected == 0 {
        warn!("User with ID {} not found for deletion", user_id);
        return Err(directory_error(DirectoryError::not_found("User", user_id)));
    }

    info!("User with ID {} deleted successfully", user_id);
    Ok(StatusCode::NO_CONTENT)
}

/// The calling user and the extension of their primary SIP account
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "users",
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Current user", body = ApiResponse<MeResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let sip_extension = projection::computed_extension(&state.db, &caller.user)
        .await
        .map_err(directory_error)?;
    debug!(
        "User {} has extension {:?}",
        caller.user.username, sip_extension
    );

    Ok(Json(ApiResponse::ok(
        MeResponse {
            user: UserResponse::from(caller.user),
            sip_extension,
        },
        "Current user retrieved successfully",
    )))
}
