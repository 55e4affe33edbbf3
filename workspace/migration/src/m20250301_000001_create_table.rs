use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username).unique_key())
                    .col(string(Users::DisplayName))
                    .col(string_null(Users::Email))
                    .col(boolean(Users::IsAdmin).default(false))
                    .to_owned(),
            )
            .await?;

        // Create sip_accounts table
        manager
            .create_table(
                Table::create()
                    .table(SipAccounts::Table)
                    .if_not_exists()
                    .col(pk_auto(SipAccounts::Id))
                    .col(string(SipAccounts::Label))
                    .col(integer(SipAccounts::UserId))
                    .col(string(SipAccounts::Extension))
                    .col(string(SipAccounts::AuthUsername))
                    .col(string(SipAccounts::AuthPassword))
                    .col(string(SipAccounts::SipDomain))
                    .col(string(SipAccounts::SipWebsocketUri))
                    .col(string_null(SipAccounts::OutboundProxy))
                    .col(string_null(SipAccounts::StunServer))
                    .col(string_null(SipAccounts::TurnServer))
                    .col(string_null(SipAccounts::TurnUsername))
                    .col(string_null(SipAccounts::TurnPassword))
                    .col(boolean(SipAccounts::Enabled).default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sip_accounts_user")
                            .from(SipAccounts::Table, SipAccounts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Each SIP extension must be unique.
        manager
            .create_index(
                Index::create()
                    .name("idx_sip_accounts_extension_unique")
                    .table(SipAccounts::Table)
                    .col(SipAccounts::Extension)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Each user can only own a single SIP account.
        manager
            .create_index(
                Index::create()
                    .name("idx_sip_accounts_user_unique")
                    .table(SipAccounts::Table)
                    .col(SipAccounts::UserId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(SipAccounts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    Username,
    DisplayName,
    Email,
    IsAdmin,
}

#[derive(DeriveIden)]
enum SipAccounts {
    Table,
    Id,
    Label,
    UserId,
    Extension,
    AuthUsername,
    AuthPassword,
    SipDomain,
    SipWebsocketUri,
    OutboundProxy,
    StunServer,
    TurnServer,
    TurnUsername,
    TurnPassword,
    Enabled,
}
