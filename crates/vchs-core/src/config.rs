// ── Runtime workflow configuration ──
//
// These types describe *where* and *how* a workflow talks to vCHS. They
// carry credentials and tuning but never touch disk: the CLI builds a
// `WorkflowConfig` (usually from a vchs-config profile) and hands it in.
// Flow-specific inputs live in the parameter structs next to each flow.

use std::time::Duration;

use url::Url;

use crate::task::PollPolicy;

pub use vchs_api::{Credentials, TlsVerification};

/// Public vCHS endpoint used when no URL is configured.
pub const DEFAULT_URL: &str = "https://vchs.vmware.com";
/// API version sent to both surfaces unless overridden.
pub const DEFAULT_API_VERSION: &str = "5.6";
/// Interval between two task polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Attempt ceiling of the bounded wait used while provisioning.
pub const DEFAULT_MAX_POLLS: u32 = 10;

/// Where the vCHS service lives and which API versions to ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    /// vCHS service URL (e.g. `https://vchs.vmware.com`).
    pub url: Url,
    /// Version for `Accept: application/xml;version=..`.
    pub vchs_version: String,
    /// Version for `Accept: application/*+xml;version=..`.
    pub vcloud_version: String,
}

impl ApiEndpoint {
    /// `url` with the default version on both surfaces.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            vchs_version: DEFAULT_API_VERSION.into(),
            vcloud_version: DEFAULT_API_VERSION.into(),
        }
    }
}

/// Wait policies per call site.
///
/// Provisioning steps wait with a bounded policy. The gateway rule flow
/// waits without a ceiling; both are kept explicit so either can be
/// changed on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub provision: PollPolicy,
    pub gateway: PollPolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            provision: PollPolicy::bounded(DEFAULT_POLL_INTERVAL, DEFAULT_MAX_POLLS),
            gateway: PollPolicy::unbounded(DEFAULT_POLL_INTERVAL),
        }
    }
}

/// Everything a workflow needs to run, composed from one source of options.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub endpoint: ApiEndpoint,
    pub credentials: Credentials,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    pub polling: PollSettings,
}

impl WorkflowConfig {
    pub fn new(endpoint: ApiEndpoint, credentials: Credentials) -> Self {
        Self {
            endpoint,
            credentials,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            polling: PollSettings::default(),
        }
    }
}
