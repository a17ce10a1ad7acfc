//! Transport layers over the settings manager

pub mod native;
pub mod rest;
