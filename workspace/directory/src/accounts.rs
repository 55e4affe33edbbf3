//! Account store: creation, validation, edits and projections of SIP accounts.

use common::SipAccountPayload;
use model::entities::sip_account::{self, has_websocket_scheme};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::access::{SystemAccess, Viewer};
use crate::error::{ConstraintViolation, DirectoryError, Result, ValidationError};

/// Input for creating a SIP account.
///
/// Blank optional fields are stored as `NULL`. When `label` is blank it is
/// filled from `extension`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSipAccount {
    pub label: Option<String>,
    pub user_id: i32,
    pub extension: String,
    pub auth_username: String,
    pub auth_password: String,
    pub sip_domain: String,
    pub sip_websocket_uri: String,
    pub outbound_proxy: Option<String>,
    pub stun_server: Option<String>,
    pub turn_server: Option<String>,
    pub turn_username: Option<String>,
    pub turn_password: Option<String>,
    pub enabled: Option<bool>,
}

/// Partial edit of a SIP account. `None` leaves a field untouched; for the
/// optional columns `Some("")` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SipAccountChanges {
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

/// Rejects a non-empty URI that does not use the `ws://` or `wss://` scheme.
pub fn validate_websocket_uri(uri: &str) -> std::result::Result<(), ValidationError> {
    if has_websocket_scheme(uri) {
        Ok(())
    } else {
        Err(ValidationError::WebsocketUri(uri.to_string()))
    }
}

/// Flat webphone projection of a single account.
pub fn to_payload(account: &sip_account::Model) -> SipAccountPayload {
    SipAccountPayload {
        id: account.id,
        label: account.label.clone(),
        extension: account.extension.clone(),
        auth_username: account.auth_username.clone(),
        auth_password: account.auth_password.clone(),
        domain: account.sip_domain.clone(),
        ws_uri: account.sip_websocket_uri.clone(),
        outbound_proxy: account.outbound_proxy.clone().unwrap_or_default(),
        stun_server: account.stun_server.clone().unwrap_or_default(),
        turn_server: account.turn_server.clone().unwrap_or_default(),
        turn_username: account.turn_username.clone().unwrap_or_default(),
        turn_password: account.turn_password.clone().unwrap_or_default(),
    }
}

fn require(field: &'static str, value: &str) -> std::result::Result<(), ConstraintViolation> {
    if value.trim().is_empty() {
        Err(ConstraintViolation::MissingField(field))
    } else {
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl NewSipAccount {
    /// Applies the label default and checks every field rule that does not
    /// need the database.
    fn prepare(mut self) -> Result<sip_account::ActiveModel> {
        if self.label.as_deref().is_none_or(|l| l.trim().is_empty()) && !self.extension.is_empty() {
            self.label = Some(self.extension.clone());
        }

        require("extension", &self.extension)?;
        require("auth_username", &self.auth_username)?;
        require("auth_password", &self.auth_password)?;
        require("sip_domain", &self.sip_domain)?;
        require("sip_websocket_uri", &self.sip_websocket_uri)?;
        validate_websocket_uri(&self.sip_websocket_uri)?;
        let label = self.label.unwrap_or_default();
        require("label", &label)?;

        Ok(sip_account::ActiveModel {
            label: Set(label),
            user_id: Set(self.user_id),
            extension: Set(self.extension),
            auth_username: Set(self.auth_username),
            auth_password: Set(self.auth_password),
            sip_domain: Set(self.sip_domain),
            sip_websocket_uri: Set(self.sip_websocket_uri),
            outbound_proxy: Set(non_blank(self.outbound_proxy)),
            stun_server: Set(non_blank(self.stun_server)),
            turn_server: Set(non_blank(self.turn_server)),
            turn_username: Set(non_blank(self.turn_username)),
            turn_password: Set(non_blank(self.turn_password)),
            enabled: Set(self.enabled.unwrap_or(true)),
            ..Default::default()
        })
    }
}

/// Creates all records in a single transaction. Either every account is
/// inserted or none is.
#[instrument(skip_all, fields(count = records.len()))]
pub async fn create_many(
    db: &DatabaseConnection,
    records: Vec<NewSipAccount>,
) -> Result<Vec<sip_account::Model>> {
    trace!("Entering create_many");
    let txn = db.begin().await?;
    let mut created = Vec::with_capacity(records.len());

    for record in records {
        let extension = record.extension.clone();
        let user_id = record.user_id;
        debug!("Creating SIP account {} for user {}", extension, user_id);

        let active = record.prepare()?;
        let account = active
            .insert(&txn)
            .await
            .map_err(|e| DirectoryError::from_account_write(e, &extension, user_id))?;
        created.push(account);
    }

    txn.commit().await?;
    info!("Created {} SIP account(s)", created.len());
    Ok(created)
}

/// Applies a partial edit. Touched required fields must stay non-empty and a
/// touched WebSocket URI is re-validated.
#[instrument(skip(db, changes))]
pub async fn update(
    db: &DatabaseConnection,
    id: i32,
    changes: SipAccountChanges,
) -> Result<sip_account::Model> {
    let existing = sip_account::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DirectoryError::not_found("SIP account", id))?;

    let extension = changes
        .extension
        .clone()
        .unwrap_or_else(|| existing.extension.clone());
    let user_id = changes.user_id.unwrap_or(existing.user_id);

    let mut active: sip_account::ActiveModel = existing.clone().into();

    if let Some(label) = changes.label {
        require("label", &label)?;
        active.label = Set(label);
    }
    if let Some(user_id) = changes.user_id {
        active.user_id = Set(user_id);
    }
    if let Some(extension) = changes.extension {
        require("extension", &extension)?;
        active.extension = Set(extension);
    }
    if let Some(auth_username) = changes.auth_username {
        require("auth_username", &auth_username)?;
        active.auth_username = Set(auth_username);
    }
    if let Some(auth_password) = changes.auth_password {
        require("auth_password", &auth_password)?;
        active.auth_password = Set(auth_password);
    }
    if let Some(sip_domain) = changes.sip_domain {
        require("sip_domain", &sip_domain)?;
        active.sip_domain = Set(sip_domain);
    }
    if let Some(uri) = changes.sip_websocket_uri {
        require("sip_websocket_uri", &uri)?;
        validate_websocket_uri(&uri)?;
        active.sip_websocket_uri = Set(uri);
    }
    if let Some(value) = changes.outbound_proxy {
        active.outbound_proxy = Set(non_blank(Some(value)));
    }
    if let Some(value) = changes.stun_server {
        active.stun_server = Set(non_blank(Some(value)));
    }
    if let Some(value) = changes.turn_server {
        active.turn_server = Set(non_blank(Some(value)));
    }
    if let Some(value) = changes.turn_username {
        active.turn_username = Set(non_blank(Some(value)));
    }
    if let Some(value) = changes.turn_password {
        active.turn_password = Set(non_blank(Some(value)));
    }
    if let Some(enabled) = changes.enabled {
        active.enabled = Set(enabled);
    }

    if !active.is_changed() {
        debug!("No fields to update for SIP account {}", id);
        return Ok(existing);
    }

    let updated = active
        .update(db)
        .await
        .map_err(|e| DirectoryError::from_account_write(e, &extension, user_id))?;
    info!("SIP account {} updated", updated.display_name());
    Ok(updated)
}

#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<()> {
    let result = sip_account::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        warn!("SIP account {} not found for deletion", id);
        return Err(DirectoryError::not_found("SIP account", id));
    }
    info!("SIP account {} deleted", id);
    Ok(())
}

/// Accounts the viewer may read, ordered by extension.
pub async fn visible_to(db: &DatabaseConnection, viewer: &Viewer) -> Result<Vec<sip_account::Model>> {
    let mut query = sip_account::Entity::find().order_by_asc(sip_account::Column::Extension);
    if !viewer.is_admin {
        query = query.filter(sip_account::Column::UserId.eq(viewer.user_id));
    }
    Ok(query.all(db).await?)
}

/// A single account, reported as missing when the viewer may not read it.
pub async fn find_visible(
    db: &DatabaseConnection,
    viewer: &Viewer,
    id: i32,
) -> Result<sip_account::Model> {
    match sip_account::Entity::find_by_id(id).one(db).await? {
        Some(account) if viewer.can_see_owner(account.user_id) => Ok(account),
        Some(_) => {
            debug!("SIP account {} hidden from user {}", id, viewer.user_id);
            Err(DirectoryError::not_found("SIP account", id))
        }
        None => Err(DirectoryError::not_found("SIP account", id)),
    }
}

/// Every account owned by `user_id`, regardless of who is asking.
pub(crate) async fn owned_by(
    _access: &SystemAccess,
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<sip_account::Model>> {
    Ok(sip_account::Entity::find()
        .filter(sip_account::Column::UserId.eq(user_id))
        .order_by_asc(sip_account::Column::Extension)
        .all(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{new_user, sample_account, setup_db};

    #[tokio::test]
    async fn test_label_defaults_to_extension() {
        let db = setup_db().await;
        let user = new_user(&db, "alice", false).await;

        let created = create_many(&db, vec![sample_account(user.id, "101")])
            .await
            .unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].label, "101");
        assert_eq!(created[0].display_name(), "101 (101)");
        assert!(created[0].enabled);
    }

    #[tokio::test]
    async fn test_explicit_label_is_kept() {
        let db = setup_db().await;
        let user = new_user(&db, "alice", false).await;

        let mut record = sample_account(user.id, "102");
        record.label = Some("Reception".to_string());
        let created = create_many(&db, vec![record]).await.unwrap();

        assert_eq!(created[0].label, "Reception");
        assert_eq!(created[0].display_name(), "Reception (102)");
    }

    #[tokio::test]
    async fn test_websocket_uri_without_scheme_is_rejected() {
        let db = setup_db().await;
        let user = new_user(&db, "alice", false).await;

        let mut record = sample_account(user.id, "101");
        record.sip_websocket_uri = "pbx.example.com/ws".to_string();

        let err = create_many(&db, vec![record]).await.unwrap_err();
        match err {
            DirectoryError::Validation(ValidationError::WebsocketUri(value)) => {
                assert_eq!(value, "pbx.example.com/ws")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(visible_to(&db, &Viewer { user_id: user.id, is_admin: true })
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_plain_ws_scheme_is_accepted() {
        let db = setup_db().await;
        let user = new_user(&db, "alice", false).await;

        let mut record = sample_account(user.id, "101");
        record.sip_websocket_uri = "ws://10.0.0.5:8088/ws".to_string();

        let created = create_many(&db, vec![record]).await.unwrap();
        assert_eq!(created[0].sip_websocket_uri, "ws://10.0.0.5:8088/ws");
    }

    #[tokio::test]
    async fn test_duplicate_extension_fails() {
        let db = setup_db().await;
        let alice = new_user(&db, "alice", false).await;
        let bob = new_user(&db, "bob", false).await;

        create_many(&db, vec![sample_account(alice.id, "101")])
            .await
            .unwrap();
        let err = create_many(&db, vec![sample_account(bob.id, "101")])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DirectoryError::Constraint(ConstraintViolation::DuplicateExtension(ref ext)) if ext == "101"
        ));
    }

    #[tokio::test]
    async fn test_second_account_for_same_user_fails() {
        let db = setup_db().await;
        let alice = new_user(&db, "alice", false).await;

        create_many(&db, vec![sample_account(alice.id, "101")])
            .await
            .unwrap();
        let err = create_many(&db, vec![sample_account(alice.id, "102")])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DirectoryError::Constraint(ConstraintViolation::DuplicateOwner(id)) if id == alice.id
        ));
    }

    #[tokio::test]
    async fn test_unknown_owner_fails() {
        let db = setup_db().await;

        let err = create_many(&db, vec![sample_account(4242, "101")])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DirectoryError::Constraint(ConstraintViolation::UnknownOwner(4242))
        ));
    }

    #[tokio::test]
    async fn test_missing_required_field_fails() {
        let db = setup_db().await;
        let alice = new_user(&db, "alice", false).await;

        let mut record = sample_account(alice.id, "101");
        record.auth_password = String::new();

        let err = create_many(&db, vec![record]).await.unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::Constraint(ConstraintViolation::MissingField("auth_password"))
        ));
    }

    #[tokio::test]
    async fn test_bulk_create_is_all_or_nothing() {
        let db = setup_db().await;
        let alice = new_user(&db, "alice", false).await;
        let bob = new_user(&db, "bob", false).await;

        let err = create_many(
            &db,
            vec![sample_account(alice.id, "101"), sample_account(bob.id, "101")],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DirectoryError::Constraint(_)));

        let admin = Viewer {
            user_id: alice.id,
            is_admin: true,
        };
        assert!(visible_to(&db, &admin).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_optional_fields_are_stored_as_null() {
        let db = setup_db().await;
        let alice = new_user(&db, "alice", false).await;

        let mut record = sample_account(alice.id, "101");
        record.outbound_proxy = Some("  ".to_string());
        record.stun_server = Some("stun:stun.l.google.com:19302".to_string());

        let created = create_many(&db, vec![record]).await.unwrap();
        assert_eq!(created[0].outbound_proxy, None);
        assert_eq!(
            created[0].stun_server.as_deref(),
            Some("stun:stun.l.google.com:19302")
        );
    }

    #[tokio::test]
    async fn test_update_revalidates_websocket_uri() {
        let db = setup_db().await;
        let alice = new_user(&db, "alice", false).await;
        let account = create_many(&db, vec![sample_account(alice.id, "101")])
            .await
            .unwrap()
            .remove(0);

        let err = update(
            &db,
            account.id,
            SipAccountChanges {
                sip_websocket_uri: Some("http://pbx.example.com/ws".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DirectoryError::Validation(_)));

        let updated = update(
            &db,
            account.id,
            SipAccountChanges {
                sip_websocket_uri: Some("wss://sbc.example.com/ws".to_string()),
                enabled: Some(false),
                outbound_proxy: Some("sip:proxy.example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.sip_websocket_uri, "wss://sbc.example.com/ws");
        assert!(!updated.enabled);
        assert_eq!(updated.outbound_proxy.as_deref(), Some("sip:proxy.example.com"));
    }

    #[tokio::test]
    async fn test_update_to_taken_extension_fails() {
        let db = setup_db().await;
        let alice = new_user(&db, "alice", false).await;
        let bob = new_user(&db, "bob", false).await;
        let created = create_many(
            &db,
            vec![sample_account(alice.id, "101"), sample_account(bob.id, "102")],
        )
        .await
        .unwrap();

        let err = update(
            &db,
            created[1].id,
            SipAccountChanges {
                extension: Some("101".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::Constraint(ConstraintViolation::DuplicateExtension(_))
        ));
    }

    #[tokio::test]
    async fn test_update_without_changes_returns_existing() {
        let db = setup_db().await;
        let alice = new_user(&db, "alice", false).await;
        let account = create_many(&db, vec![sample_account(alice.id, "101")])
            .await
            .unwrap()
            .remove(0);

        let same = update(&db, account.id, SipAccountChanges::default())
            .await
            .unwrap();
        assert_eq!(same, account);
    }

    #[tokio::test]
    async fn test_delete_missing_account() {
        let db = setup_db().await;
        let err = delete(&db, 999).await.unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_visibility_of_accounts() {
        let db = setup_db().await;
        let alice = new_user(&db, "alice", false).await;
        let bob = new_user(&db, "bob", false).await;
        let created = create_many(
            &db,
            vec![sample_account(bob.id, "205"), sample_account(alice.id, "101")],
        )
        .await
        .unwrap();

        let alice_view = Viewer::from(&alice);
        let mine = visible_to(&db, &alice_view).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].extension, "101");

        let bobs_id = created[0].id;
        assert!(matches!(
            find_visible(&db, &alice_view, bobs_id).await,
            Err(DirectoryError::NotFound { .. })
        ));

        let admin = Viewer {
            user_id: alice.id,
            is_admin: true,
        };
        let all = visible_to(&db, &admin).await.unwrap();
        let extensions: Vec<_> = all.iter().map(|a| a.extension.as_str()).collect();
        assert_eq!(extensions, vec!["101", "205"]);
        assert_eq!(find_visible(&db, &admin, bobs_id).await.unwrap().id, bobs_id);
    }

    #[test]
    fn test_payload_defaults_optional_fields() {
        let account = sip_account::Model {
            id: 5,
            label: "101".to_string(),
            user_id: 1,
            extension: "101".to_string(),
            auth_username: "101".to_string(),
            auth_password: "secret".to_string(),
            sip_domain: "pbx.example.com".to_string(),
            sip_websocket_uri: "wss://pbx.example.com:8089/ws".to_string(),
            outbound_proxy: None,
            stun_server: None,
            turn_server: Some("turn:turn.example.com:3478".to_string()),
            turn_username: None,
            turn_password: None,
            enabled: true,
        };

        let payload = to_payload(&account);
        assert_eq!(payload.id, 5);
        assert_eq!(payload.domain, "pbx.example.com");
        assert_eq!(payload.ws_uri, "wss://pbx.example.com:8089/ws");
        assert_eq!(payload.outbound_proxy, "");
        assert_eq!(payload.stun_server, "");
        assert_eq!(payload.turn_server, "turn:turn.example.com:3478");
        assert_eq!(payload.turn_username, "");
    }
}
