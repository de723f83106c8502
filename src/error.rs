//! Flowdeck Error Types with Error Codes
//!
//! Error code ranges:
//! - FD-000-009: Schema errors (workflow definition not dispatchable)
//! - FD-010-019: Input editing errors
//! - FD-020-029: Serialization errors (dispatch payload invariants)
//! - FD-030-039: Transport errors (REST API)
//! - FD-040-049: Sync errors (timeouts, cancellation, fan-out workers, selection)
//! - FD-050-059: Config / IO errors

use thiserror::Error;

use crate::schema::SchemaError;

pub type Result<T> = std::result::Result<T, FlowdeckError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum FlowdeckError {
    // ═══════════════════════════════════════════
    // SCHEMA ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[FD-00{}] {}", .0.code_suffix(), .0)]
    Schema(#[from] SchemaError),

    // ═══════════════════════════════════════════
    // INPUT EDITING ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[FD-010] Value for '{key}' must not start with a space")]
    LeadingSpace { key: String },

    #[error("[FD-011] Field '{key}' is a {kind} field and cannot be edited that way")]
    WrongFieldKind { key: String, kind: &'static str },

    #[error("[FD-012] Unknown input field '{key}'")]
    UnknownField { key: String },

    #[error("[FD-013] No input field is selected")]
    NoActiveField,

    // ═══════════════════════════════════════════
    // SERIALIZATION ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[FD-020] Entry '{key}.{subkey}' cannot be encoded as a JSON {expected}: '{value}'")]
    NonScalarEntry {
        key: String,
        subkey: String,
        expected: &'static str,
        value: String,
    },

    #[error("[FD-021] Value '{value}' for '{key}' is not one of its options")]
    ChoiceOutOfRange { key: String, value: String },

    #[error("[FD-022] Boolean input '{key}' has value '{value}' (expected true or false)")]
    InvalidBoolean { key: String, value: String },

    // ═══════════════════════════════════════════
    // TRANSPORT ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[FD-030] HTTP {status} from {endpoint}: {message}")]
    Http {
        status: u16,
        endpoint: String,
        message: String,
    },

    #[error("[FD-031] Request to {endpoint} failed: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("[FD-032] Could not decode response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    #[error("[FD-033] Not found: {what}")]
    NotFound { what: String },

    #[error("[FD-034] Invalid repository name '{name}' (expected owner/name)")]
    InvalidRepository { name: String },

    // ═══════════════════════════════════════════
    // SYNC ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[FD-040] Timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("[FD-041] Cancelled")]
    Cancelled,

    #[error("[FD-042] Background worker failed: {reason}")]
    WorkerFailed { reason: String },

    #[error("[FD-043] No {what} selected")]
    NoSelection { what: &'static str },

    // ═══════════════════════════════════════════
    // CONFIG / IO ERRORS (050-059)
    // ═══════════════════════════════════════════
    #[error("[FD-050] Configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("[FD-051] IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("[FD-052] JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl FlowdeckError {
    /// Get the error code (e.g., "FD-030")
    pub fn code(&self) -> &'static str {
        match self {
            Self::Schema(SchemaError::InvalidYaml { .. }) => "FD-001",
            Self::Schema(SchemaError::NotDispatchable { .. }) => "FD-002",
            Self::LeadingSpace { .. } => "FD-010",
            Self::WrongFieldKind { .. } => "FD-011",
            Self::UnknownField { .. } => "FD-012",
            Self::NoActiveField => "FD-013",
            Self::NonScalarEntry { .. } => "FD-020",
            Self::ChoiceOutOfRange { .. } => "FD-021",
            Self::InvalidBoolean { .. } => "FD-022",
            Self::Http { .. } => "FD-030",
            Self::Network { .. } => "FD-031",
            Self::Decode { .. } => "FD-032",
            Self::NotFound { .. } => "FD-033",
            Self::InvalidRepository { .. } => "FD-034",
            Self::Timeout { .. } => "FD-040",
            Self::Cancelled => "FD-041",
            Self::WorkerFailed { .. } => "FD-042",
            Self::NoSelection { .. } => "FD-043",
            Self::ConfigError { .. } => "FD-050",
            Self::IoError(_) => "FD-051",
            Self::JsonError(_) => "FD-052",
        }
    }

    /// Superseded or user-cancelled work. Never shown to the operator.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// A workflow without a dispatch trigger is a normal terminal state, not a failure.
    pub fn is_not_dispatchable(&self) -> bool {
        matches!(self, Self::Schema(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Http { status: 404, .. })
    }

    /// Errors that abort a dispatch before anything is sent
    pub fn is_serialization(&self) -> bool {
        matches!(
            self,
            Self::NonScalarEntry { .. } | Self::ChoiceOutOfRange { .. } | Self::InvalidBoolean { .. }
        )
    }
}

impl FixSuggestion for FlowdeckError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            Self::Schema(SchemaError::InvalidYaml { .. }) => {
                Some("Check the workflow YAML syntax on this branch")
            }
            Self::Schema(SchemaError::NotDispatchable { .. }) => {
                Some("Add an `on.workflow_dispatch` trigger to make the workflow runnable")
            }
            Self::LeadingSpace { .. } => Some("Remove the leading space"),
            Self::WrongFieldKind { .. } => Some("Use left/right to change choice and boolean inputs"),
            Self::UnknownField { .. } | Self::NoActiveField => Some("Select an input row first"),
            Self::NonScalarEntry { .. } => Some("Enter a value matching the default's type"),
            Self::ChoiceOutOfRange { .. } => Some("Pick one of the declared options"),
            Self::InvalidBoolean { .. } => Some("Use true or false"),
            Self::Http { status: 401, .. } | Self::Http { status: 403, .. } => {
                Some("Check the token (GITHUB_TOKEN) and its scopes: repo, workflow")
            }
            Self::Http { .. } | Self::Network { .. } => {
                Some("Check network access to the API and press r to retry")
            }
            Self::Decode { .. } => Some("Check that api_url points at a GitHub-compatible API"),
            Self::NotFound { .. } => Some("The resource may have been removed; refresh the list"),
            Self::InvalidRepository { .. } => Some("Use the owner/name form"),
            Self::Timeout { .. } => Some("Press r to retry, or raise sync.fetch_timeout_secs"),
            Self::Cancelled => None,
            Self::WorkerFailed { .. } => Some("Check the log file for a panic message"),
            Self::NoSelection { .. } => Some("Pick a row in the list first"),
            Self::ConfigError { .. } => Some("Check ~/.config/flowdeck/config.toml"),
            Self::IoError(_) => Some("Check file path and permissions"),
            Self::JsonError(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_codes() {
        let err: FlowdeckError = SchemaError::InvalidYaml {
            reason: "bad indent".to_string(),
        }
        .into();
        assert_eq!(err.code(), "FD-001");
        assert!(err.to_string().contains("[FD-001]"));
        assert!(err.to_string().contains("bad indent"));

        let err: FlowdeckError = SchemaError::NotDispatchable {
            workflow: "ci.yml".to_string(),
        }
        .into();
        assert_eq!(err.code(), "FD-002");
        assert!(err.to_string().starts_with("[FD-002]"));
        assert!(err.is_not_dispatchable());
    }

    #[test]
    fn test_cancelled_is_silent() {
        let err = FlowdeckError::Cancelled;
        assert!(err.is_cancelled());
        assert!(!err.is_timeout());
        assert!(err.fix_suggestion().is_none());
    }

    #[test]
    fn test_timeout_is_distinct() {
        let err = FlowdeckError::Timeout { timeout_secs: 30 };
        assert!(err.is_timeout());
        assert!(!err.is_cancelled());
        assert_eq!(err.code(), "FD-040");
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn test_http_auth_suggestion_mentions_token() {
        let err = FlowdeckError::Http {
            status: 401,
            endpoint: "/user/repos".to_string(),
            message: "Bad credentials".to_string(),
        };
        let suggestion = err.fix_suggestion().unwrap();
        assert!(suggestion.contains("GITHUB_TOKEN"));
    }

    #[test]
    fn test_not_found_covers_http_404() {
        let err = FlowdeckError::Http {
            status: 404,
            endpoint: "/repos/a/b".to_string(),
            message: "Not Found".to_string(),
        };
        assert!(err.is_not_found());
        assert!(FlowdeckError::NotFound {
            what: "x".to_string()
        }
        .is_not_found());
    }

    #[test]
    fn test_serialization_errors_classified() {
        let err = FlowdeckError::InvalidBoolean {
            key: "dry_run".to_string(),
            value: "maybe".to_string(),
        };
        assert!(err.is_serialization());
        assert_eq!(err.code(), "FD-022");
        assert!(!FlowdeckError::Cancelled.is_serialization());
    }
}
