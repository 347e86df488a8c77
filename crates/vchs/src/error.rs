//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use vchs_config::ConfigError;
use vchs_core::{CoreError, TaskFailure};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach {url}")]
    #[diagnostic(
        code(vchs::connection_failed),
        help(
            "{reason}\n\
             Check the service URL and your network. For a self-signed vCloud\n\
             cell, retry with --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out: {url}")]
    #[diagnostic(
        code(vchs::timeout),
        help("Increase the request timeout with --timeout.")
    )]
    Timeout { url: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(vchs::auth_failed),
        help(
            "Verify your vCHS username and password.\n\
             Run: vchs config set-password --profile <name>"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(vchs::no_credentials),
        help(
            "Pass --username and --password, set VCHS_USERNAME and VCHS_PASSWORD,\n\
             or add a username to the profile and run: vchs config set-password"
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{what} not found in {context}")]
    #[diagnostic(
        code(vchs::not_found),
        help("Run: vchs vdcs list to see the VDCs and templates available to you")
    )]
    NotFound { what: String, context: String },

    #[error("Expected exactly one {what} named '{name}', found {count}")]
    #[diagnostic(
        code(vchs::ambiguous),
        help("Use a name that matches a single {what}. Nothing was created.")
    )]
    Ambiguous {
        what: String,
        name: String,
        count: usize,
    },

    // ── Remote ───────────────────────────────────────────────────────

    #[error("vCloud error: {message}")]
    #[diagnostic(code(vchs::remote))]
    Remote { message: String },

    #[error("Task failed: {summary}")]
    #[diagnostic(code(vchs::task_failed), help("{dump}"))]
    TaskFailed { summary: String, dump: String },

    #[error("Task still running after {attempts} polls: {summary}")]
    #[diagnostic(
        code(vchs::task_timeout),
        help(
            "{dump}\n\
             Raise the ceiling with --max-polls, or wait without one using --unbounded-polls."
        )
    )]
    TaskTimedOut {
        attempts: u32,
        summary: String,
        dump: String,
    },

    #[error("Interrupted while waiting for task {href}")]
    #[diagnostic(
        code(vchs::interrupted),
        help("The task keeps running on the server; changes made so far are not rolled back.")
    )]
    Interrupted { href: String },

    #[error("Interrupted during step '{step}'")]
    #[diagnostic(
        code(vchs::interrupted),
        help("Requests already accepted by the server are not rolled back.")
    )]
    Cancelled { step: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vchs::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(vchs::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(vchs::config),
        help("Check the configuration file, see: vchs config path")
    )]
    Config { message: String },

    #[error("Could not render output: {0}")]
    #[diagnostic(code(vchs::render))]
    Render(String),

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Ambiguous { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } | Self::TaskTimedOut { .. } => exit_code::TIMEOUT,
            Self::Interrupted { .. } | Self::Cancelled { .. } => exit_code::INTERRUPTED,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

/// Multi-line dump of a failed task for the diagnostic help section.
fn task_dump(failure: &TaskFailure) -> String {
    let fields = [
        ("href", Some(failure.href.as_str())),
        ("status", failure.status.as_deref()),
        ("operation", failure.operation.as_deref()),
        ("description", failure.description.as_deref()),
        ("details", failure.details.as_deref()),
        ("code", failure.code.as_deref()),
        ("stack trace", failure.stack_trace.as_deref()),
    ];
    fields
        .iter()
        .filter_map(|(label, value)| value.map(|v| format!("{label}: {v}")))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { what, context } => CliError::NotFound { what, context },

            CoreError::Ambiguous { what, name, count } => CliError::Ambiguous { what, name, count },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Remote {
                message,
                status,
                code,
            } => CliError::Remote {
                message: match (status, code) {
                    (Some(status), Some(code)) => format!("{message} (HTTP {status}, {code})"),
                    (Some(status), None) => format!("{message} (HTTP {status})"),
                    (None, Some(code)) => format!("{message} ({code})"),
                    (None, None) => message,
                },
            },

            CoreError::TaskFailed(failure) => CliError::TaskFailed {
                summary: failure.to_string(),
                dump: task_dump(&failure),
            },

            CoreError::PolicyExhausted { attempts, failure } => CliError::TaskTimedOut {
                attempts,
                summary: failure.to_string(),
                dump: task_dump(&failure),
            },

            CoreError::Interrupted { href } => CliError::Interrupted { href },

            CoreError::Cancelled { step } => CliError::Cancelled { step },

            CoreError::Transport { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Timeout { url } => CliError::Timeout { url },

            CoreError::Config { message } => CliError::Config { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
