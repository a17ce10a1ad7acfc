//! HTTP error mapping to RFC-9457 Problem Details

use crate::contract::SettingsError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// RFC-9457 Problem Details for HTTP API errors
#[derive(Debug, Serialize)]
pub struct Problem {
    /// A URI reference that identifies the problem type
    #[serde(rename = "type")]
    pub type_uri: String,

    /// A short, human-readable summary of the problem type
    pub title: String,

    /// The HTTP status code
    pub status: u16,

    /// A human-readable explanation specific to this occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// A URI reference that identifies the specific occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Field -> messages, for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<std::collections::BTreeMap<String, Vec<String>>>,
}

impl Problem {
    /// Create a new Problem Details response
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            type_uri: format!("https://httpstatuses.io/{}", status.as_u16()),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
            errors: None,
        }
    }

    /// Add detail message
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Add instance URI
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn with_errors(mut self, field: impl Into<String>, messages: Vec<String>) -> Self {
        self.errors
            .get_or_insert_with(Default::default)
            .insert(field.into(), messages);
        self
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Map domain errors to HTTP Problem Details
pub fn map_domain_error(error: SettingsError) -> Problem {
    match error {
        SettingsError::NotFound { resource, id } => Problem::new(
            StatusCode::NOT_FOUND,
            format!("{} Not Found", resource),
        )
        .with_detail(format!("{} with id '{}' was not found", resource, id)),

        SettingsError::Validation { field, messages } => Problem::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Validation Error",
        )
        .with_detail(messages.join(" "))
        .with_errors(field, messages),

        SettingsError::IdentityMismatch { key, history_key } => Problem::new(
            StatusCode::BAD_REQUEST,
            "History Mismatch",
        )
        .with_detail(format!(
            "History record belongs to '{}', not '{}'",
            history_key, key
        )),

        SettingsError::Unauthenticated => Problem::new(
            StatusCode::UNAUTHORIZED,
            "Unauthenticated",
        )
        .with_detail("No authenticated user found"),

        SettingsError::UnsupportedFormat { format } => Problem::new(
            StatusCode::BAD_REQUEST,
            "Unsupported Format",
        )
        .with_detail(format!("Unsupported format: {}", format)),

        SettingsError::MalformedInput { message } => Problem::new(
            StatusCode::BAD_REQUEST,
            "Malformed Input",
        )
        .with_detail(message),

        SettingsError::Conflict { reason } => {
            Problem::new(StatusCode::CONFLICT, "Conflict").with_detail(reason)
        }

        SettingsError::Internal => Problem::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
        )
        .with_detail("An unexpected error occurred"),
    }
}
