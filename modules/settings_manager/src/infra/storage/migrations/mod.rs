//! Database migrations for the settings manager

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_settings::Migration),
            Box::new(m20250101_000002_create_user_settings::Migration),
            Box::new(m20250101_000003_create_setting_histories::Migration),
        ]
    }
}

mod m20250101_000001_create_settings {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_settings"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Settings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Settings::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Settings::Key).string().not_null().unique_key())
                        .col(ColumnDef::new(Settings::Group).string())
                        .col(ColumnDef::new(Settings::Value).text())
                        .col(
                            ColumnDef::new(Settings::Type)
                                .string()
                                .not_null()
                                .default("string"),
                        )
                        .col(
                            ColumnDef::new(Settings::Encrypted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Settings::Label).json())
                        .col(ColumnDef::new(Settings::Description).json())
                        .col(ColumnDef::new(Settings::ValidationRules).json())
                        .col(ColumnDef::new(Settings::Options).json())
                        .col(
                            ColumnDef::new(Settings::InputType)
                                .string()
                                .not_null()
                                .default("text"),
                        )
                        .col(
                            ColumnDef::new(Settings::IsPublic)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Settings::Order)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Settings::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(
                            ColumnDef::new(Settings::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_settings_group")
                        .table(Settings::Table)
                        .col(Settings::Group)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_settings_is_public")
                        .table(Settings::Table)
                        .col(Settings::IsPublic)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Settings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Settings {
        Table,
        Id,
        Key,
        Group,
        Value,
        Type,
        Encrypted,
        Label,
        Description,
        ValidationRules,
        Options,
        InputType,
        IsPublic,
        Order,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250101_000002_create_user_settings {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_user_settings"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(UserSettings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UserSettings::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(UserSettings::UserId).uuid().not_null())
                        .col(ColumnDef::new(UserSettings::Key).string().not_null())
                        .col(ColumnDef::new(UserSettings::Group).string())
                        .col(ColumnDef::new(UserSettings::Value).text())
                        .col(
                            ColumnDef::new(UserSettings::Type)
                                .string()
                                .not_null()
                                .default("string"),
                        )
                        .col(
                            ColumnDef::new(UserSettings::Encrypted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(UserSettings::Label).json())
                        .col(ColumnDef::new(UserSettings::Description).json())
                        .col(ColumnDef::new(UserSettings::ValidationRules).json())
                        .col(ColumnDef::new(UserSettings::Options).json())
                        .col(
                            ColumnDef::new(UserSettings::InputType)
                                .string()
                                .not_null()
                                .default("text"),
                        )
                        .col(
                            ColumnDef::new(UserSettings::Order)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(UserSettings::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(
                            ColumnDef::new(UserSettings::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_user_settings_user_key")
                        .table(UserSettings::Table)
                        .col(UserSettings::UserId)
                        .col(UserSettings::Key)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(UserSettings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum UserSettings {
        Table,
        Id,
        UserId,
        Key,
        Group,
        Value,
        Type,
        Encrypted,
        Label,
        Description,
        ValidationRules,
        Options,
        InputType,
        Order,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250101_000003_create_setting_histories {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_setting_histories"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SettingHistories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SettingHistories::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(SettingHistories::SettingKey)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SettingHistories::OldValue).text())
                        .col(ColumnDef::new(SettingHistories::NewValue).text())
                        .col(ColumnDef::new(SettingHistories::OldType).string())
                        .col(ColumnDef::new(SettingHistories::NewType).string())
                        .col(ColumnDef::new(SettingHistories::Action).string().not_null())
                        .col(ColumnDef::new(SettingHistories::UserId).uuid())
                        .col(ColumnDef::new(SettingHistories::IpAddress).string())
                        .col(ColumnDef::new(SettingHistories::UserAgent).text())
                        .col(
                            ColumnDef::new(SettingHistories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_setting_histories_key_created")
                        .table(SettingHistories::Table)
                        .col(SettingHistories::SettingKey)
                        .col(SettingHistories::CreatedAt)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SettingHistories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum SettingHistories {
        Table,
        Id,
        SettingKey,
        OldValue,
        NewValue,
        OldType,
        NewType,
        Action,
        UserId,
        IpAddress,
        UserAgent,
        CreatedAt,
    }
}
