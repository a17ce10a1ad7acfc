//! Settings Manager Module
//!
//! Global and per-user key/value settings backed by a relational store, with
//! a read-through cache, typed value encoding, optional encryption, rule
//! validation, bulk and import/export operations, and an audit trail that
//! can restore earlier values.

// Public exports
pub mod contract;
pub use contract::{
    client::SettingsLookup, error::SettingsError, ActorContext, HistoryAction, Principal,
    Setting, SettingHistory, SettingType, Translations, UserSetting,
};

pub mod config;
pub use config::Config;

pub mod domain;
pub use domain::{SettingsManager, UserSettingsManager};

pub mod module;
pub use module::SettingsModule;

// Transport and storage layers
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod infra;
