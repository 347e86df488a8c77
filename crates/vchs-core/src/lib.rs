// vchs-core: Provisioning workflows on top of vchs-api (CLI and other consumers).

pub mod config;
pub mod error;
pub mod ip_range;
pub mod links;
pub mod task;
pub mod workflow;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ApiEndpoint, Credentials, PollSettings, TlsVerification, WorkflowConfig};
pub use error::{CoreError, TaskFailure};
pub use ip_range::{AddressRange, address_to_integer, in_range, select_uplink_network};
pub use links::{LinkMatch, find_link};
pub use task::{PollPolicy, TaskSource, TaskTracker};
pub use workflow::{
    GatewayRuleParams, GatewayRuleReport, Orchestrator, ProvisionParams, ProvisionReport, Step,
    StepObserver, VdcListing, VmAddress,
};
