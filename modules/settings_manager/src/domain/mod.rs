//! Domain layer - settings semantics independent of storage and transport

pub mod audit;
pub mod cache;
pub mod codec;
pub mod crypto;
pub mod events;
pub mod manager;
pub mod repository;
pub mod transfer;
pub mod user_manager;
pub mod validation;

pub use cache::{CacheDriver, MemoryCacheDriver, NullCacheDriver, SettingsCache};
pub use events::{EventPublisher, NoOpEventPublisher, SettingEvent};
pub use manager::{BulkValue, SettingDefinition, SettingsManager};
pub use repository::{HistoryRepository, SettingsRepository, UserSettingsRepository};
pub use transfer::{ExportFormat, ExportOptions, ImportOptions, ImportSummary};
pub use user_manager::UserSettingsManager;
pub use validation::{RuleValidator, ValueValidator};
