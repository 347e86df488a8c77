// ── Core error types ──
//
// Every failure aborts the workflow that raised it; there is no partial
// success. The `From<vchs_api::Error>` impl folds transport-layer errors
// into this taxonomy so callers never match on HTTP details.

use std::fmt;

use thiserror::Error;
use vchs_api::types::Task;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lookup errors ────────────────────────────────────────────────
    /// A required link, named resource or range match is missing.
    #[error("{what} not found in {context}")]
    NotFound { what: String, context: String },

    /// A lookup that must yield exactly one match yielded `count`.
    #[error("expected exactly one {what} named '{name}', found {count}")]
    Ambiguous {
        what: String,
        name: String,
        count: usize,
    },

    // ── Remote errors ────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The server refused a step or answered with the wrong status.
    #[error("Remote error: {message}")]
    Remote {
        message: String,
        status: Option<u16>,
        code: Option<String>,
    },

    /// A task reached the `error` state.
    #[error("Task failed: {0}")]
    TaskFailed(Box<TaskFailure>),

    /// A bounded wait ran out of attempts while the task was still running.
    #[error("Task timed out after {attempts} polls: {failure}")]
    PolicyExhausted {
        attempts: u32,
        failure: Box<TaskFailure>,
    },

    /// The wait was cancelled before the task finished.
    #[error("Interrupted while waiting for task {href}")]
    Interrupted { href: String },

    /// A step was cancelled before its requests completed.
    #[error("Interrupted during step '{step}'")]
    Cancelled { step: String },

    // ── Transport errors ─────────────────────────────────────────────
    #[error("Cannot reach {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Request timed out: {url}")]
    Timeout { url: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn not_found(what: impl Into<String>, context: impl Into<String>) -> Self {
        Self::NotFound {
            what: what.into(),
            context: context.into(),
        }
    }

    /// The task diagnostic attached to this error, if any.
    pub fn task_failure(&self) -> Option<&TaskFailure> {
        match self {
            Self::TaskFailed(failure) | Self::PolicyExhausted { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

// ── Task diagnostics ─────────────────────────────────────────────────

/// Diagnostic dump of a task that failed or never finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFailure {
    pub href: String,
    pub status: Option<String>,
    pub operation: Option<String>,
    pub description: Option<String>,
    pub details: Option<String>,
    pub message: Option<String>,
    pub code: Option<String>,
    pub stack_trace: Option<String>,
}

impl From<&Task> for TaskFailure {
    fn from(task: &Task) -> Self {
        let error = task.error.as_ref();
        Self {
            href: task.href.clone(),
            status: task.status.clone(),
            operation: task.operation.clone(),
            description: task.description.clone(),
            details: task.details.clone(),
            message: error.and_then(|e| e.message.clone()),
            code: error.and_then(|e| e.minor_error_code.clone().or_else(|| e.major_error_code.clone())),
            stack_trace: error.and_then(|e| e.stack_trace.clone()),
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operation = self.operation.as_deref().unwrap_or(&self.href);
        write!(f, "{operation}")?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        } else if let Some(details) = &self.details {
            write!(f, ": {details}")?;
        }
        if let Some(code) = &self.code {
            write!(f, " [{code}]")?;
        }
        Ok(())
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vchs_api::Error> for CoreError {
    fn from(err: vchs_api::Error) -> Self {
        match err {
            vchs_api::Error::Authentication { message } => CoreError::AuthenticationFailed { message },
            vchs_api::Error::Transport(ref e) => {
                let url = e.url().map(ToString::to_string).unwrap_or_else(|| "<unknown>".into());
                if e.is_timeout() {
                    CoreError::Timeout { url }
                } else if e.is_connect() || e.is_request() {
                    CoreError::Transport {
                        url,
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Remote {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                        code: None,
                    }
                }
            }
            vchs_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            vchs_api::Error::Tls(reason) => CoreError::Transport {
                url: String::new(),
                reason: format!("TLS error: {reason}"),
            },
            vchs_api::Error::Remote {
                status,
                message,
                code,
            } => CoreError::Remote {
                message,
                status: Some(status),
                code,
            },
            vchs_api::Error::UnexpectedStatus {
                status,
                expected,
                url,
                ..
            } => CoreError::Remote {
                message: format!("HTTP {status} from {url} (expected {expected})"),
                status: Some(status),
                code: None,
            },
            vchs_api::Error::Deserialization { message, body: _ } => CoreError::Remote {
                message: format!("Unreadable response: {message}"),
                status: None,
                code: None,
            },
            vchs_api::Error::Serialization(message) => CoreError::Config {
                message: format!("Could not encode request: {message}"),
            },
        }
    }
}
