//! Session-token authentication for HTTP handlers.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, header::COOKIE, request::Parts},
};
use directory::{DirectoryError, Viewer, sessions};
use model::entities::user;
use std::fmt;
use tracing::{debug, warn};

use crate::schemas::{ApiError, AppState, directory_error};

pub const SESSION_COOKIE_NAME: &str = "session_id";

/// Reads the session token from `Authorization: Bearer`, falling back to the
/// `session_id` cookie.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }

    for cookie_header in headers.get_all(COOKIE) {
        if let Ok(s) = cookie_header.to_str() {
            let found = s.split(';').find_map(|pair| {
                let (key, value) = pair.trim().split_once('=')?;
                if key.trim() == SESSION_COOKIE_NAME && !value.trim().is_empty() {
                    Some(value.trim().to_string())
                } else {
                    None
                }
            });
            if found.is_some() {
                return found;
            }
        }
    }
    None
}

/// The user behind the request's session token.
#[derive(Clone)]
pub struct AuthenticatedUser {
    pub user: user::Model,
    pub token: String,
}

impl AuthenticatedUser {
    pub fn viewer(&self) -> Viewer {
        Viewer::from(&self.user)
    }
}

impl fmt::Debug for AuthenticatedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedUser")
            .field("user_id", &self.user.id)
            .field("username", &self.user.username)
            .finish_non_exhaustive()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = extract_session_token(&parts.headers).ok_or_else(|| {
            debug!("Request without session token: {}", parts.uri.path());
            directory_error(DirectoryError::Unauthorized)
        })?;

        match sessions::resolve(&state.db, &token).await {
            Ok(Some(user)) => Ok(AuthenticatedUser { user, token }),
            Ok(None) => {
                debug!("Unknown session token for {}", parts.uri.path());
                Err(directory_error(DirectoryError::Unauthorized))
            }
            Err(err) => {
                warn!("Failed to resolve session: {}", err);
                Err(directory_error(err))
            }
        }
    }
}

/// An authenticated user holding the administrator flag.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let caller = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !caller.user.is_admin {
            warn!(
                "User {} attempted admin operation {} {}",
                caller.user.username, parts.method, parts.uri.path()
            );
            return Err(directory_error(DirectoryError::Forbidden(
                "administrator access required".to_string(),
            )));
        }
        Ok(AdminUser(caller))
    }
}
