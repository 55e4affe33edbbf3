use sea_orm::entity::prelude::*;

/// Represents a user of the business application.
/// SIP credentials are attached to users through `sip_account`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    /// Human readable name shown by the webphone.
    pub display_name: String,
    pub email: Option<String>,
    /// Administrators may manage every user's SIP account.
    #[sea_orm(default_value = "false")]
    pub is_admin: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A user owns at most one SIP account (unique index on `sip_accounts.user_id`).
    #[sea_orm(has_one = "super::sip_account::Entity")]
    SipAccount,
    #[sea_orm(has_many = "super::session::Entity")]
    Session,
}

impl Related<super::sip_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SipAccount.def()
    }
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
