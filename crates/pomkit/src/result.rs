//! Result and error types for pomkit.
//!
//! Two layers of errors exist. [`DriverError`] is the vocabulary spoken by
//! the underlying UI automation driver; most of its variants are transient
//! and are recovered inside waits and safe clicks. [`PomError`] is what a
//! page-object operation hands back to the scenario once recovery has been
//! exhausted, or when a business-level check fails.

use thiserror::Error;

/// Result type for pomkit operations
pub type PomResult<T> = Result<T, PomError>;

/// Errors reported by a [`UiDriver`](crate::driver::UiDriver) implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// Handle no longer points at a live node (tree was rebuilt)
    #[error("stale element reference: {message}")]
    StaleElement {
        /// Error message
        message: String,
    },

    /// No node matched the selector
    #[error("no such element: {message}")]
    NoSuchElement {
        /// Error message
        message: String,
    },

    /// Another node would receive the click
    #[error("click intercepted: {message}")]
    ClickIntercepted {
        /// Error message
        message: String,
    },

    /// Node exists but cannot be interacted with yet
    #[error("element not interactable: {message}")]
    NotInteractable {
        /// Error message
        message: String,
    },

    /// Script execution failed in the page
    #[error("script error: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Session is gone or the driver is unusable
    #[error("driver session error: {message}")]
    Session {
        /// Error message
        message: String,
    },
}

impl DriverError {
    /// Stale element error
    pub fn stale(message: impl Into<String>) -> Self {
        Self::StaleElement {
            message: message.into(),
        }
    }

    /// Missing element error
    pub fn no_such_element(message: impl Into<String>) -> Self {
        Self::NoSuchElement {
            message: message.into(),
        }
    }

    /// Intercepted click error
    pub fn intercepted(message: impl Into<String>) -> Self {
        Self::ClickIntercepted {
            message: message.into(),
        }
    }

    /// Not-interactable error
    pub fn not_interactable(message: impl Into<String>) -> Self {
        Self::NotInteractable {
            message: message.into(),
        }
    }

    /// Script error
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    /// Session error
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Whether polling may swallow this error and try again
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::StaleElement { .. }
                | Self::NoSuchElement { .. }
                | Self::ClickIntercepted { .. }
                | Self::NotInteractable { .. }
        )
    }

    /// Whether this error means the handle must be re-resolved
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::StaleElement { .. })
    }
}

/// Errors that can occur in page-object operations
#[derive(Debug, Error)]
pub enum PomError {
    /// A wait condition never became true
    #[error(
        "Timed out after {elapsed_ms}ms waiting for {condition}{}",
        last_error_suffix(.last_error.as_ref())
    )]
    Timeout {
        /// Description of the awaited condition
        condition: String,
        /// Time spent waiting in milliseconds
        elapsed_ms: u64,
        /// Last transient error swallowed while polling
        last_error: Option<DriverError>,
    },

    /// Required element was absent
    #[error("{what} not found. Visible: {visible:?}")]
    NotFound {
        /// What was looked for
        what: String,
        /// Alternatives visible at the time of the lookup
        visible: Vec<String>,
    },

    /// Element stayed stale after re-resolving
    #[error("Stale reference: {what}")]
    StaleReference {
        /// Description of the element
        what: String,
    },

    /// Click was intercepted and the forced click failed too
    #[error("Interaction blocked: {what}")]
    InteractionBlocked {
        /// Description of the element
        what: String,
    },

    /// Business-level mismatch
    #[error("Validation failed [{context}]: {message}")]
    Validation {
        /// Check that failed
        context: String,
        /// Mismatch details
        message: String,
    },

    /// Safe click gave up
    #[error("Failed to click '{label}': {source}")]
    Click {
        /// Human-readable label of the clicked element
        label: String,
        /// Underlying failure
        #[source]
        source: Box<PomError>,
    },

    /// Non-recoverable driver failure
    #[error("Driver error: {0}")]
    Driver(DriverError),

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

fn last_error_suffix(err: Option<&DriverError>) -> String {
    err.map(|e| format!(" (last error: {e})")).unwrap_or_default()
}

impl From<DriverError> for PomError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::StaleElement { message } => Self::StaleReference { what: message },
            DriverError::ClickIntercepted { message } => Self::InteractionBlocked { what: message },
            other => Self::Driver(other),
        }
    }
}

impl PomError {
    /// Validation failure
    pub fn validation(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Configuration failure
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this is a timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether this error came from a stale handle
    #[must_use]
    pub fn is_stale(&self) -> bool {
        match self {
            Self::StaleReference { .. } => true,
            Self::Timeout { last_error, .. } => {
                last_error.as_ref().is_some_and(DriverError::is_stale)
            }
            Self::Click { source, .. } => source.is_stale(),
            _ => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(DriverError::stale("x").is_transient());
        assert!(DriverError::no_such_element("x").is_transient());
        assert!(DriverError::intercepted("x").is_transient());
        assert!(DriverError::not_interactable("x").is_transient());
        assert!(!DriverError::script("x").is_transient());
        assert!(!DriverError::session("x").is_transient());
    }

    #[test]
    fn test_driver_error_mapping() {
        let stale: PomError = DriverError::stale("row 2").into();
        assert!(matches!(stale, PomError::StaleReference { ref what } if what == "row 2"));

        let blocked: PomError = DriverError::intercepted("overlay").into();
        assert!(matches!(blocked, PomError::InteractionBlocked { .. }));

        let session: PomError = DriverError::session("gone").into();
        assert!(matches!(session, PomError::Driver(DriverError::Session { .. })));
    }

    #[test]
    fn test_timeout_display_carries_last_error() {
        let err = PomError::Timeout {
            condition: "visibility of css=.x".to_string(),
            elapsed_ms: 1200,
            last_error: Some(DriverError::stale("detached")),
        };
        let msg = err.to_string();
        assert!(msg.contains("1200ms"));
        assert!(msg.contains("visibility of css=.x"));
        assert!(msg.contains("last error: stale element reference: detached"));
        assert!(err.is_timeout());
        assert!(err.is_stale());
    }

    #[test]
    fn test_timeout_display_without_last_error() {
        let err = PomError::Timeout {
            condition: "c".to_string(),
            elapsed_ms: 5,
            last_error: None,
        };
        assert_eq!(err.to_string(), "Timed out after 5ms waiting for c");
    }

    #[test]
    fn test_click_error_keeps_label_and_source() {
        let err = PomError::Click {
            label: "Send".to_string(),
            source: Box::new(DriverError::stale("btn").into()),
        };
        assert!(err.to_string().starts_with("Failed to click 'Send'"));
        assert!(err.is_stale());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_not_found_lists_visible() {
        let err = PomError::NotFound {
            what: "Topic 'Tax'".to_string(),
            visible: vec!["GST".to_string(), "Payroll".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Topic 'Tax' not found. Visible: [\"GST\", \"Payroll\"]"
        );
    }
}
