//! SeaORM entities for database tables

/// Global settings table
pub mod setting {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "settings")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,

        /// Unique lookup key
        #[sea_orm(unique)]
        pub key: String,

        pub group: Option<String>,

        /// Stored text (plain, JSON or ciphertext)
        #[sea_orm(column_type = "Text", nullable)]
        pub value: Option<String>,

        /// Type tag driving decode
        pub r#type: String,

        pub encrypted: bool,

        /// Locale -> text
        pub label: Option<Json>,

        /// Locale -> text
        pub description: Option<Json>,

        /// Ordered rule descriptors
        pub validation_rules: Option<Json>,

        pub options: Option<Json>,

        pub input_type: String,

        pub is_public: bool,

        pub order: i32,

        pub created_at: DateTimeUtc,

        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Per-user settings table, unique on (user_id, key)
pub mod user_setting {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "user_settings")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,

        pub user_id: Uuid,

        pub key: String,

        pub group: Option<String>,

        #[sea_orm(column_type = "Text", nullable)]
        pub value: Option<String>,

        pub r#type: String,

        pub encrypted: bool,

        pub label: Option<Json>,

        pub description: Option<Json>,

        pub validation_rules: Option<Json>,

        pub options: Option<Json>,

        pub input_type: String,

        pub order: i32,

        pub created_at: DateTimeUtc,

        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Append-only history of global setting changes
pub mod setting_history {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "setting_histories")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,

        /// Key of the changed setting (no foreign key: rows outlive deletes)
        pub setting_key: String,

        #[sea_orm(column_type = "Text", nullable)]
        pub old_value: Option<String>,

        #[sea_orm(column_type = "Text", nullable)]
        pub new_value: Option<String>,

        pub old_type: Option<String>,

        pub new_type: Option<String>,

        /// created | updated | deleted
        pub action: String,

        pub user_id: Option<Uuid>,

        pub ip_address: Option<String>,

        #[sea_orm(column_type = "Text", nullable)]
        pub user_agent: Option<String>,

        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
