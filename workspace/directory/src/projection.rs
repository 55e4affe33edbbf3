//! Per-user projections of SIP accounts: the primary account, the derived
//! primary extension and the webphone configuration payload.
//!
//! Nothing here is stored; every value is recomputed from the account table
//! on each call.

use common::{WebphoneAccount, WebphoneConfig};
use model::entities::{sip_account, user};
use sea_orm::DatabaseConnection;
use tracing::{debug, instrument};

use crate::access::SystemAccess;
use crate::accounts::{self, to_payload};
use crate::error::Result;

/// Picks the first enabled account, falling back to the first account of any
/// state. With one account per user this is simply that account.
pub fn select_primary(accounts: &[sip_account::Model]) -> Option<&sip_account::Model> {
    accounts
        .iter()
        .find(|account| account.enabled)
        .or_else(|| accounts.first())
}

/// The user's primary SIP account, looked up independently of what the user
/// may read through the management API.
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn primary_account(
    db: &DatabaseConnection,
    user: &user::Model,
) -> Result<Option<sip_account::Model>> {
    let access = SystemAccess::grant("primary SIP account lookup");
    let owned = accounts::owned_by(&access, db, user.id).await?;
    debug!("User {} owns {} SIP account(s)", user.id, owned.len());
    Ok(select_primary(&owned).cloned())
}

/// Extension of the primary account, if the user has one.
pub async fn computed_extension(
    db: &DatabaseConnection,
    user: &user::Model,
) -> Result<Option<String>> {
    Ok(primary_account(db, user)
        .await?
        .map(|account| account.extension))
}

/// Shapes the webphone payload. Disabled primary accounts are reported as
/// absent.
pub fn build_webphone_config(
    user: &user::Model,
    primary: Option<&sip_account::Model>,
) -> WebphoneConfig {
    match primary {
        Some(account) if account.enabled => WebphoneConfig::with_account(WebphoneAccount {
            sip: to_payload(account),
            user_display_name: user.display_name.clone(),
            email: user.email.clone().unwrap_or_default(),
        }),
        _ => WebphoneConfig::without_account(),
    }
}

pub async fn webphone_config(db: &DatabaseConnection, user: &user::Model) -> Result<WebphoneConfig> {
    let primary = primary_account(db, user).await?;
    Ok(build_webphone_config(user, primary.as_ref()))
}
