//! Contract layer - public API for in-process consumers
//!
//! This layer contains transport-agnostic models and the native client trait.

pub mod client;
pub mod error;
pub mod model;

pub use client::SettingsLookup;
pub use error::SettingsError;
pub use model::{
    ActorContext, HistoryAction, Principal, Setting, SettingHistory, SettingType, Translations,
    UserSetting,
};
