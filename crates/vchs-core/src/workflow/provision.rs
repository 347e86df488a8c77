// ── Provisioning ──
//
// Instantiate a template into a new vApp, bridge it onto an org VDC network,
// point the VM's NIC at that network with pool addressing, then deploy and
// power on. Every wait here uses the bounded provisioning policy.

use tracing::{debug, warn};
use vchs_api::types::{
    DeployVAppParams, InstantiateVAppTemplateParams, NetworkConnectionSection, OrgVdcNetwork, Task,
    VApp, VAppNetworkConfig, VAppTemplate, Vdc, Vm, media,
};
use vchs_api::{StatusCode, VcloudClient, edit};

use super::listing::TEMPLATE_RECORD;
use super::{Orchestrator, ProvisionReport, Step, VmAddress};
use crate::error::CoreError;
use crate::links::{LinkMatch, exactly_one, find_link, find_named};
use crate::task::TaskTracker;

const DEFAULT_DESCRIPTION: &str = "VM creation using vCHS public API";

/// Inputs of [`Orchestrator::provision`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionParams {
    /// VDC to create the vApp in (case-insensitive).
    pub vdc: String,
    /// Template name; the query must return exactly one.
    pub template: String,
    /// Name of the new vApp.
    pub vapp_name: String,
    /// Org VDC network to bridge onto (case-insensitive).
    pub network: String,
    pub description: Option<String>,
}

impl Orchestrator {
    /// Create, connect and power on a vApp from a template.
    ///
    /// Stops at the first failing step. Nothing already created on the
    /// server is rolled back.
    pub async fn provision(&self, params: &ProvisionParams) -> Result<ProvisionReport, CoreError> {
        let ctx = self.open_vdc(&params.vdc).await?;
        let vcloud = &ctx.vcloud;
        let tracker = self.tracker(vcloud, self.config().polling.provision);

        let vdc: Vdc = self
            .step(Step::FetchVdc, async { Ok(vcloud.get(vcloud.vdc_href()).await?) })
            .await?;

        let template = self
            .step(Step::FindTemplate, find_template(vcloud, &params.template))
            .await?;

        let vapp = self
            .step(Step::CreateVApp, instantiate(vcloud, &vdc, &template, params))
            .await?;

        self.step(Step::AwaitCreation, async {
            tracker.await_all(vapp.pending_tasks().to_vec()).await
        })
        .await?;

        let vapp: VApp = self
            .step(Step::RefreshVApp, async { Ok(vcloud.get(&vapp.href).await?) })
            .await?;

        let vm = self
            .step(Step::FindVm, async { find_vm(&vapp, &params.vapp_name).cloned() })
            .await?;

        let network: OrgVdcNetwork = self
            .step(Step::FindNetwork, async {
                let reference = find_named(vdc.networks(), &params.network, "network", &vdc.href)?;
                Ok(vcloud.get(&reference.href).await?)
            })
            .await?;

        self.step(
            Step::ConfigureVAppNetwork,
            configure_vapp_network(vcloud, &tracker, &vapp, &network),
        )
        .await?;

        self.step(
            Step::ConfigureVmNetwork,
            configure_vm_network(vcloud, &tracker, &vm, &network.name),
        )
        .await?;

        self.step(Step::Deploy, deploy(vcloud, &tracker, &vapp)).await?;

        let vms = self
            .step(Step::CollectAddresses, collect_addresses(vcloud, &vapp.href))
            .await?;

        Ok(ProvisionReport {
            vdc: ctx.vdc_name,
            vapp_name: vapp.name,
            vapp_href: vapp.href,
            network: network.name,
            vms,
        })
    }
}

/// Query the template by name and fetch it. Zero or several hits is
/// `Ambiguous`, so nothing is created for a vague name.
async fn find_template(vcloud: &VcloudClient, name: &str) -> Result<VAppTemplate, CoreError> {
    let records = vcloud.query(TEMPLATE_RECORD, Some(name)).await?;
    let record = exactly_one(&records.vapp_templates, "template", name)?;
    debug!(template = %record.name, href = %record.href, "template found");
    Ok(vcloud.get(&record.href).await?)
}

async fn instantiate(
    vcloud: &VcloudClient,
    vdc: &Vdc,
    template: &VAppTemplate,
    params: &ProvisionParams,
) -> Result<VApp, CoreError> {
    let action = find_link(
        &vdc.links,
        LinkMatch::TypeContains("instantiateVAppTemplate"),
        &vdc.href,
    )?;
    let body = InstantiateVAppTemplateParams::new(
        params.vapp_name.clone(),
        Some(
            params
                .description
                .clone()
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.into()),
        ),
        template.href.clone(),
    );
    Ok(vcloud
        .post(
            &action.href,
            media::INSTANTIATE_VAPP_TEMPLATE_PARAMS,
            "InstantiateVAppTemplateParams",
            &body,
            StatusCode::CREATED,
        )
        .await?)
}

/// The VM to reconfigure: one whose `up` link leads back to the vApp when
/// the vApp carries the requested name, otherwise one named like the vApp.
pub(crate) fn find_vm<'a>(vapp: &'a VApp, name: &str) -> Result<&'a Vm, CoreError> {
    let vapp_matches = vapp.name.eq_ignore_ascii_case(name);
    vapp.vms()
        .iter()
        .find(|vm| {
            let child_of_vapp = vapp_matches
                && vm
                    .links
                    .iter()
                    .any(|l| LinkMatch::Rel("up").matches(l) && l.href == vapp.href);
            child_of_vapp || vm.name.eq_ignore_ascii_case(name)
        })
        .ok_or_else(|| CoreError::not_found(format!("VM \"{name}\""), &vapp.href))
}

/// Add a bridged vApp network on top of the org VDC network.
///
/// The section is fetched from its `edit` link and sent back with only the
/// new network added.
async fn configure_vapp_network(
    vcloud: &VcloudClient,
    tracker: &TaskTracker<'_, VcloudClient>,
    vapp: &VApp,
    network: &OrgVdcNetwork,
) -> Result<Task, CoreError> {
    let section = vapp
        .network_config_section
        .as_ref()
        .ok_or_else(|| CoreError::not_found("NetworkConfigSection", &vapp.href))?;
    let edit_href = &find_link(&section.links, LinkMatch::Rel("edit"), &vapp.href)?.href;

    let current = vcloud.get_document(edit_href).await?;
    let bridged = VAppNetworkConfig::bridged(network.name.clone(), network.href.clone());
    let updated = edit::add_network_config(&current, &bridged)?;

    let task: Task = vcloud
        .put_document(
            edit_href,
            media::NETWORK_CONFIG_SECTION,
            updated,
            StatusCode::ACCEPTED,
        )
        .await?;
    tracker.await_completion(task).await
}

/// Connect the VM's first ethernet adapter to `network` in pool mode.
async fn configure_vm_network(
    vcloud: &VcloudClient,
    tracker: &TaskTracker<'_, VcloudClient>,
    vm: &Vm,
    network: &str,
) -> Result<Task, CoreError> {
    let href = vm
        .hardware_section_href()
        .ok_or_else(|| CoreError::not_found("VirtualHardwareSection", &vm.href))?;

    let current = vcloud.get_document(href).await?;
    let updated = edit::connect_adapter_to_pool(&current, network)?
        .ok_or_else(|| CoreError::not_found("ethernet adapter", href))?;

    let task: Task = vcloud
        .put_document(
            href,
            media::VIRTUAL_HARDWARE_SECTION,
            updated,
            StatusCode::ACCEPTED,
        )
        .await?;
    tracker.await_completion(task).await
}

async fn deploy(
    vcloud: &VcloudClient,
    tracker: &TaskTracker<'_, VcloudClient>,
    vapp: &VApp,
) -> Result<Task, CoreError> {
    let action = find_link(&vapp.links, LinkMatch::Rel("deploy"), &vapp.href)?;
    let task: Task = vcloud
        .post(
            &action.href,
            media::DEPLOY_VAPP_PARAMS,
            "DeployVAppParams",
            &DeployVAppParams::power_on(),
            StatusCode::ACCEPTED,
        )
        .await?;
    tracker.await_completion(task).await
}

/// Primary address of every VM in the freshly deployed vApp.
///
/// A VM whose connection section answers with anything but 200 is reported
/// without an address; transport failures still abort.
async fn collect_addresses(
    vcloud: &VcloudClient,
    vapp_href: &str,
) -> Result<Vec<VmAddress>, CoreError> {
    let vapp: VApp = vcloud.get(vapp_href).await?;

    let mut addresses = Vec::with_capacity(vapp.vms().len());
    for vm in vapp.vms() {
        let href = format!("{}/networkConnectionSection/", vm.href.trim_end_matches('/'));
        let ip = match vcloud.get::<NetworkConnectionSection>(&href).await {
            Ok(section) => section
                .connections
                .into_iter()
                .next()
                .and_then(|c| c.ip_address),
            Err(e) if e.status().is_some() || e.is_auth_expired() => {
                warn!(vm = %vm.name, error = %e, "could not read network connections");
                None
            }
            Err(e) => return Err(e.into()),
        };
        addresses.push(VmAddress {
            name: vm.name.clone(),
            ip,
        });
    }
    Ok(addresses)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vchs_api::types::{Link, VAppChildren};

    use super::*;

    fn vm(name: &str, up: &str) -> Vm {
        Vm {
            name: name.into(),
            href: format!("https://vcd/vm/{name}"),
            links: vec![Link {
                rel: Some("up".into()),
                href: up.into(),
                ..Link::default()
            }],
            ..Vm::default()
        }
    }

    fn vapp(name: &str, vms: Vec<Vm>) -> VApp {
        VApp {
            name: name.into(),
            href: "https://vcd/vapp/1".into(),
            children: Some(VAppChildren { vms }),
            ..VApp::default()
        }
    }

    #[test]
    fn vm_under_named_vapp_is_found_by_up_link() {
        let app = vapp(
            "web",
            vec![vm("other", "https://vcd/vapp/9"), vm("centos", "https://vcd/vapp/1")],
        );
        assert_eq!(find_vm(&app, "WEB").unwrap().name, "centos");
    }

    #[test]
    fn vm_is_found_by_own_name_otherwise() {
        let app = vapp(
            "renamed",
            vec![vm("centos", "https://vcd/vapp/1"), vm("web", "https://vcd/vapp/1")],
        );
        assert_eq!(find_vm(&app, "web").unwrap().name, "web");
    }

    #[test]
    fn missing_vm_is_not_found() {
        let app = vapp("renamed", vec![vm("centos", "https://vcd/vapp/1")]);
        assert!(matches!(
            find_vm(&app, "web").unwrap_err(),
            CoreError::NotFound { .. }
        ));
    }
}
