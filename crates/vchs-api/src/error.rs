use thiserror::Error;

/// Top-level error type for the `vchs-api` crate.
///
/// Covers every failure mode of the two API surfaces: the vCHS public API
/// (login, service discovery) and the per-VDC vCloud API. `vchs-core` maps
/// these into its workflow error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, locked account, missing token header).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Remote ──────────────────────────────────────────────────────
    /// The server answered with a structured `<Error>` document.
    #[error("Remote API error (HTTP {status}): {message}")]
    Remote {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// The server answered with a status code the caller did not expect.
    #[error("Unexpected HTTP {status} from {url} (expected {expected})")]
    UnexpectedStatus {
        status: u16,
        expected: u16,
        url: String,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// XML deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A request payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns `true` if the session token was rejected.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// The HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Remote { status, .. } | Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
