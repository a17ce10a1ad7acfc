//! Contract error types for the settings manager
//!
//! These errors are transport-agnostic; the REST layer maps them to problem
//! documents and any CLI wrapper maps them to exit codes.

/// Settings manager errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// Value failed its rule-set; nothing was written
    Validation {
        /// Field the messages belong to (always "value" for setting writes)
        field: String,
        /// Every failing rule, in rule order
        messages: Vec<String>,
    },
    /// Setting or history record not found
    NotFound {
        /// Resource type (setting, setting_history)
        resource: String,
        /// Resource identifier
        id: String,
    },
    /// History record belongs to a different key than the one being restored
    IdentityMismatch {
        /// Key passed by the caller
        key: String,
        /// Key recorded on the history entry
        history_key: String,
    },
    /// A mutating user-setting call without a principal
    Unauthenticated,
    /// Export/import format outside json/yaml
    UnsupportedFormat {
        format: String,
    },
    /// Import payload is not a list of records
    MalformedInput {
        message: String,
    },
    /// Create of a key that already exists
    Conflict {
        reason: String,
    },
    /// Storage or other internal failure
    Internal,
}

impl SettingsError {
    pub(crate) fn value_validation(messages: Vec<String>) -> Self {
        Self::Validation {
            field: "value".to_string(),
            messages,
        }
    }

    pub(crate) fn setting_not_found(key: &str) -> Self {
        Self::NotFound {
            resource: "setting".to_string(),
            id: key.to_string(),
        }
    }
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { field, messages } => {
                write!(f, "Validation failed for '{}': {}", field, messages.join(", "))
            }
            Self::NotFound { resource, id } => {
                write!(f, "{} not found: {}", resource, id)
            }
            Self::IdentityMismatch { key, history_key } => {
                write!(
                    f,
                    "History record does not match setting key: {} (record is for {})",
                    key, history_key
                )
            }
            Self::Unauthenticated => {
                write!(f, "No authenticated user found")
            }
            Self::UnsupportedFormat { format } => {
                write!(f, "Unsupported format: {}", format)
            }
            Self::MalformedInput { message } => {
                write!(f, "Malformed input: {}", message)
            }
            Self::Conflict { reason } => {
                write!(f, "Conflict: {}", reason)
            }
            Self::Internal => {
                write!(f, "Internal error")
            }
        }
    }
}

impl std::error::Error for SettingsError {}
