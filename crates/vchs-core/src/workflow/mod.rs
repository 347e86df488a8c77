// ── Workflow orchestration ──
//
// Sequences the multi-step flows against vCHS and vCloud. Each run starts
// from a fresh login and threads an explicit context (the vCHS session, then
// the per-VDC vCloud client) through its steps; nothing is kept between runs.
// Any step that fails aborts the run and leaves remote state as it is.

mod gateway;
mod listing;
mod model;
mod provision;

use std::future::Future;
use std::sync::Arc;

use strum::Display;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vchs_api::types::{Compute, Service, media};
use vchs_api::{VchsClient, VchsSession, VcloudClient, http_client};

use crate::config::WorkflowConfig;
use crate::error::CoreError;
use crate::links::{LinkMatch, find_link};
use crate::task::{PollPolicy, TaskTracker};

pub use gateway::{GatewayRuleParams, service_configuration};
pub use model::{GatewayRuleReport, ProvisionReport, VdcListing, VmAddress};
pub use provision::ProvisionParams;

/// Media-type fragment of the VDC link that opens a vCloud session.
const VCLOUD_SESSION_TYPE: &str = "vnd.vmware.vchs.vcloudsession";

// ── Steps ────────────────────────────────────────────────────────────

/// A named stage of a workflow, reported to the [`StepObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Step {
    #[strum(to_string = "Connecting to vCHS")]
    Authenticate,
    #[strum(to_string = "Retrieving compute services")]
    DiscoverServices,
    #[strum(to_string = "Opening vCloud session")]
    OpenVdcSession,
    #[strum(to_string = "Listing templates")]
    ListTemplates,
    #[strum(to_string = "Retrieving VDC")]
    FetchVdc,
    #[strum(to_string = "Searching for template")]
    FindTemplate,
    #[strum(to_string = "Creating vApp")]
    CreateVApp,
    #[strum(to_string = "Waiting for vApp creation")]
    AwaitCreation,
    #[strum(to_string = "Refreshing vApp state")]
    RefreshVApp,
    #[strum(to_string = "Looking for vApp child VM")]
    FindVm,
    #[strum(to_string = "Looking up VDC network")]
    FindNetwork,
    #[strum(to_string = "Updating vApp network")]
    ConfigureVAppNetwork,
    #[strum(to_string = "Updating VM network")]
    ConfigureVmNetwork,
    #[strum(to_string = "Deploying and powering on vApp")]
    Deploy,
    #[strum(to_string = "Reading VM addresses")]
    CollectAddresses,
    #[strum(to_string = "Retrieving edge gateway")]
    FindGateway,
    #[strum(to_string = "Selecting external network")]
    SelectUplink,
    #[strum(to_string = "Adding NAT and firewall rules")]
    ConfigureGatewayRules,
}

/// Receives progress notifications. All methods default to no-ops.
pub trait StepObserver: Send + Sync {
    fn started(&self, _step: Step) {}
    fn finished(&self, _step: Step) {}
    fn failed(&self, _step: Step, _error: &CoreError) {}
}

impl StepObserver for () {}

// ── Context ──────────────────────────────────────────────────────────

/// Per-run state once a VDC session is open.
pub(crate) struct VdcContext {
    pub vchs: VchsSession,
    pub vcloud: VcloudClient,
    pub vdc_name: String,
}

/// A compute service paired with its VDC listing.
pub(crate) struct ComputeService {
    pub service: Service,
    pub compute: Compute,
}

// ── Orchestrator ─────────────────────────────────────────────────────

/// Entry point for the listing, provisioning and gateway-rule workflows.
pub struct Orchestrator {
    config: WorkflowConfig,
    cancel: CancellationToken,
    observer: Arc<dyn StepObserver>,
}

impl Orchestrator {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            observer: Arc::new(()),
        }
    }

    /// Report step progress to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Use `cancel` to interrupt the step in progress.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Token that interrupts the step in progress, including task waits.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    // ── Step plumbing ────────────────────────────────────────────────

    /// Run one step, logging and reporting its outcome. Pending requests
    /// are dropped once the cancel token fires.
    pub(crate) async fn step<T, F>(&self, step: Step, fut: F) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, CoreError>>,
    {
        info!(%step, "step started");
        self.observer.started(step);
        // The step's own result wins when both are ready, so a task wait
        // reports which task it was watching.
        let result = tokio::select! {
            biased;
            result = fut => result,
            () = self.cancel.cancelled() => Err(CoreError::Cancelled {
                step: step.to_string(),
            }),
        };
        match &result {
            Ok(_) => {
                debug!(%step, "step finished");
                self.observer.finished(step);
            }
            Err(e) => {
                info!(%step, error = %e, "step failed");
                self.observer.failed(step, e);
            }
        }
        result
    }

    pub(crate) fn tracker<'c>(
        &self,
        vcloud: &'c VcloudClient,
        policy: PollPolicy,
    ) -> TaskTracker<'c, VcloudClient> {
        TaskTracker::new(vcloud, policy, self.cancel.clone())
    }

    // ── Shared steps ─────────────────────────────────────────────────

    /// Log in to vCHS.
    pub(crate) async fn login(&self) -> Result<VchsSession, CoreError> {
        self.step(Step::Authenticate, async {
            let endpoint = &self.config.endpoint;
            let http = http_client(&self.config.tls, self.config.timeout)?;
            let client = VchsClient::new(http, endpoint.url.clone(), endpoint.vchs_version.clone());
            let credentials = &self.config.credentials;
            Ok(client
                .login(&credentials.username, &credentials.password)
                .await?)
        })
        .await
    }

    /// Every compute service on the account, in service-list order.
    pub(crate) async fn compute_services(
        &self,
        session: &VchsSession,
    ) -> Result<Vec<ComputeService>, CoreError> {
        self.step(Step::DiscoverServices, async {
            let href = find_link(
                session.links(),
                LinkMatch::TypeContains(media::SERVICE_LIST),
                "vCHS session",
            )?
            .href
            .clone();
            let list = session.service_list(&href).await?;

            let mut services = Vec::new();
            for service in list.services.into_iter().filter(Service::is_compute) {
                let compute = session.compute(&service.href).await?;
                debug!(
                    service = service.service_id.as_deref().unwrap_or(&service.href),
                    vdcs = compute.vdcs.len(),
                    "discovered compute service"
                );
                services.push(ComputeService { service, compute });
            }
            Ok(services)
        })
        .await
    }

    /// Exchange the vCHS token for a vCloud client scoped to the VDC whose
    /// session link is `session_href`.
    pub(crate) async fn vcloud_client(
        &self,
        session: &VchsSession,
        session_href: &str,
    ) -> Result<VcloudClient, CoreError> {
        let vcloud_session = session.create_vcloud_session(session_href).await?;
        let link = vcloud_session
            .vdc_link
            .ok_or_else(|| CoreError::not_found("VdcLink", session_href))?;
        Ok(VcloudClient::from_vdc_link(
            session.http().clone(),
            &link,
            self.config.endpoint.vcloud_version.clone(),
        )?)
    }

    /// Log in and open a vCloud session on the VDC called `vdc_name`.
    ///
    /// VDC names are matched ignoring case, across all compute services in
    /// order; the first hit wins.
    pub(crate) async fn open_vdc(&self, vdc_name: &str) -> Result<VdcContext, CoreError> {
        let vchs = self.login().await?;
        let services = self.compute_services(&vchs).await?;

        self.step(Step::OpenVdcSession, async {
            let vdc = services
                .iter()
                .flat_map(|s| s.compute.vdcs.iter())
                .find(|vdc| vdc.name.eq_ignore_ascii_case(vdc_name))
                .ok_or_else(|| CoreError::not_found(format!("VDC \"{vdc_name}\""), "compute services"))?;

            let session_link = find_link(
                &vdc.links,
                LinkMatch::TypeContains(VCLOUD_SESSION_TYPE),
                &vdc.href,
            )?;
            let vcloud = self.vcloud_client(&vchs, &session_link.href).await?;
            debug!(vdc = %vdc.name, base = %vcloud.base_url(), "vCloud session opened");

            Ok(VdcContext {
                vchs,
                vcloud,
                vdc_name: vdc.name.clone(),
            })
        })
        .await
    }
}
