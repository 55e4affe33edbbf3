use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;

/// URI schemes accepted for the SIP-over-WebSocket transport.
pub const WEBSOCKET_SCHEMES: [&str; 2] = ["ws://", "wss://"];

/// SIP/WebRTC credentials used by the browser webphone of a single user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sip_accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Friendly label. Defaults to the extension on creation.
    pub label: String,
    /// Owning user. Unique: a user has at most one SIP account.
    #[sea_orm(unique)]
    pub user_id: i32,
    /// Numeric or alphanumeric extension, unique across all accounts.
    #[sea_orm(unique)]
    pub extension: String,
    /// Username sent to the SIP registrar. Often matches the extension.
    pub auth_username: String,
    pub auth_password: String,
    /// Domain name or IP of the SIP registrar (e.g. pbx.example.com).
    pub sip_domain: String,
    /// `ws://` or `wss://` endpoint exposed by the PBX or SBC.
    pub sip_websocket_uri: String,
    pub outbound_proxy: Option<String>,
    /// STUN server for ICE (e.g. stun:stun.l.google.com:19302).
    pub stun_server: Option<String>,
    pub turn_server: Option<String>,
    pub turn_username: Option<String>,
    pub turn_password: Option<String>,
    /// Only enabled accounts are exposed to the webphone.
    #[sea_orm(default_value = "true")]
    pub enabled: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

/// Returns true when `uri` is empty or uses one of the WebSocket schemes.
pub fn has_websocket_scheme(uri: &str) -> bool {
    uri.is_empty() || WEBSOCKET_SCHEMES.iter().any(|scheme| uri.starts_with(scheme))
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// Rejects writes that set a malformed WebSocket URI, whichever code path
    /// issues them.
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let ActiveValue::Set(ref uri) = self.sip_websocket_uri {
            if !has_websocket_scheme(uri) {
                return Err(DbErr::Custom(format!(
                    "WebSocket URI must start with ws:// or wss:// (value: {})",
                    uri
                )));
            }
        }
        Ok(self)
    }
}

impl Model {
    /// Name shown in pickers and logs: `"{label} ({extension})"`.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.label, self.extension)
    }
}
