// vCloud Director documents: VDC, query results, vApp/VM and the sections
// the provisioning flow edits.
//
// Sections are decoded into typed fields keyed by element name, so callers
// reach them through accessors instead of scanning a heterogeneous list.

use serde::{Deserialize, Serialize};

use super::gateway::IpRanges;
use super::task::TasksInProgress;
use super::{Link, Reference, ns};

// ── VDC ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Vdc {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@href")]
    pub href: String,
    #[serde(rename = "@status", default)]
    pub status: Option<String>,
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
    #[serde(rename = "AvailableNetworks", default)]
    pub available_networks: Option<AvailableNetworks>,
}

impl Vdc {
    /// Org VDC networks the VDC exposes, empty when the element is absent.
    pub fn networks(&self) -> &[Reference] {
        self.available_networks
            .as_ref()
            .map_or(&[], |n| n.networks.as_slice())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailableNetworks {
    #[serde(rename = "Network", default)]
    pub networks: Vec<Reference>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrgVdcNetwork {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@href")]
    pub href: String,
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
}

// ── Query service ───────────────────────────────────────────────────

/// `<QueryResultRecords>` in the `records` format.
///
/// Only the record kinds the workflows query for are decoded; a result page
/// holds a single kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResultRecords {
    #[serde(rename = "@total", default)]
    pub total: Option<u64>,
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
    #[serde(rename = "VAppTemplateRecord", default)]
    pub vapp_templates: Vec<QueryRecord>,
    #[serde(rename = "EdgeGatewayRecord", default)]
    pub edge_gateways: Vec<QueryRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryRecord {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@href")]
    pub href: String,
    #[serde(rename = "@status", default)]
    pub status: Option<String>,
    #[serde(rename = "@catalogName", default)]
    pub catalog_name: Option<String>,
    #[serde(rename = "@vdcName", default)]
    pub vdc_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VAppTemplate {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@href")]
    pub href: String,
    #[serde(rename = "@status", default)]
    pub status: Option<i32>,
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
}

// ── vApp / VM ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VApp {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@href")]
    pub href: String,
    #[serde(rename = "@status", default)]
    pub status: Option<i32>,
    #[serde(rename = "@deployed", default)]
    pub deployed: Option<bool>,
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
    #[serde(rename = "Tasks", default)]
    pub tasks: Option<TasksInProgress>,
    #[serde(rename = "NetworkConfigSection", default)]
    pub network_config_section: Option<NetworkConfigSection>,
    #[serde(rename = "Children", default)]
    pub children: Option<VAppChildren>,
}

impl VApp {
    /// Child VMs, empty until the creation task has finished.
    pub fn vms(&self) -> &[Vm] {
        self.children.as_ref().map_or(&[], |c| c.vms.as_slice())
    }

    /// Tasks still running against this vApp.
    pub fn pending_tasks(&self) -> &[super::Task] {
        self.tasks.as_ref().map_or(&[], |t| t.tasks.as_slice())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VAppChildren {
    #[serde(rename = "Vm", default)]
    pub vms: Vec<Vm>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Vm {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@href")]
    pub href: String,
    #[serde(rename = "@status", default)]
    pub status: Option<i32>,
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
    #[serde(rename = "VirtualHardwareSection", default)]
    pub virtual_hardware_section: Option<SectionRef>,
}

impl Vm {
    /// The href used to GET and PUT the VM's hardware section.
    pub fn hardware_section_href(&self) -> Option<&str> {
        self.virtual_hardware_section
            .as_ref()
            .and_then(|s| s.href.as_deref())
    }
}

/// An embedded section reduced to its `vcloud:href` / `vcloud:type`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionRef {
    #[serde(rename = "@href", default)]
    pub href: Option<String>,
    #[serde(rename = "@type", default)]
    pub media_type: Option<String>,
}

// ── Network configuration ───────────────────────────────────────────

/// `<NetworkConfigSection>` embedded in a vApp, read for its `edit` link.
///
/// Edits go through [`crate::edit::add_network_config`] on the section as
/// served by that link, never through this type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkConfigSection {
    #[serde(rename = "@href", default)]
    pub href: Option<String>,
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
    #[serde(rename = "NetworkConfig", default)]
    pub network_configs: Vec<VAppNetworkConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VAppNetworkConfig {
    #[serde(rename = "@networkName")]
    pub network_name: String,
    #[serde(
        rename = "Description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(rename = "Configuration")]
    pub configuration: NetworkConfiguration,
    #[serde(rename = "IsDeployed", default, skip_serializing_if = "Option::is_none")]
    pub is_deployed: Option<bool>,
}

impl VAppNetworkConfig {
    /// A vApp network bridged straight onto an org VDC network.
    pub fn bridged(network_name: impl Into<String>, parent_href: impl Into<String>) -> Self {
        Self {
            network_name: network_name.into(),
            description: None,
            configuration: NetworkConfiguration {
                ip_scopes: None,
                parent_network: Some(Reference::to_href(parent_href)),
                fence_mode: "bridged".into(),
                retain_net_info_across_deployments: None,
            },
            is_deployed: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NetworkConfiguration {
    #[serde(rename = "IpScopes", default, skip_serializing_if = "Option::is_none")]
    pub ip_scopes: Option<IpScopes>,
    #[serde(
        rename = "ParentNetwork",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_network: Option<Reference>,
    #[serde(rename = "FenceMode")]
    pub fence_mode: String,
    #[serde(
        rename = "RetainNetInfoAcrossDeployments",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub retain_net_info_across_deployments: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IpScopes {
    #[serde(rename = "IpScope", default)]
    pub scopes: Vec<IpScope>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IpScope {
    #[serde(rename = "IsInherited")]
    pub is_inherited: bool,
    #[serde(rename = "Gateway", default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(rename = "Netmask", default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
    #[serde(rename = "Dns1", default, skip_serializing_if = "Option::is_none")]
    pub dns1: Option<String>,
    #[serde(rename = "Dns2", default, skip_serializing_if = "Option::is_none")]
    pub dns2: Option<String>,
    #[serde(rename = "DnsSuffix", default, skip_serializing_if = "Option::is_none")]
    pub dns_suffix: Option<String>,
    #[serde(rename = "IsEnabled", default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    #[serde(rename = "IpRanges", default, skip_serializing_if = "Option::is_none")]
    pub ip_ranges: Option<IpRanges>,
}

/// `<NetworkConnectionSection>` of a VM, read for its assigned addresses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkConnectionSection {
    #[serde(rename = "PrimaryNetworkConnectionIndex", default)]
    pub primary_index: Option<u32>,
    #[serde(rename = "NetworkConnection", default)]
    pub connections: Vec<NetworkConnection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkConnection {
    #[serde(rename = "@network", default)]
    pub network: String,
    #[serde(rename = "NetworkConnectionIndex", default)]
    pub index: u32,
    #[serde(rename = "IpAddress", default)]
    pub ip_address: Option<String>,
    #[serde(rename = "IsConnected", default)]
    pub is_connected: bool,
    #[serde(rename = "MACAddress", default)]
    pub mac_address: Option<String>,
    #[serde(rename = "IpAddressAllocationMode", default)]
    pub allocation_mode: Option<String>,
}

// ── Virtual hardware ────────────────────────────────────────────────

/// DMTF resource types the workflows care about; everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Processor,
    Memory,
    IdeController,
    ScsiController,
    EthernetAdapter,
    Disk,
    Other(u32),
}

impl From<u32> for ResourceKind {
    fn from(code: u32) -> Self {
        match code {
            3 => Self::Processor,
            4 => Self::Memory,
            5 => Self::IdeController,
            6 => Self::ScsiController,
            10 => Self::EthernetAdapter,
            17 => Self::Disk,
            other => Self::Other(other),
        }
    }
}

// ── Request bodies ──────────────────────────────────────────────────

/// Body of the `instantiateVAppTemplate` action.
#[derive(Debug, Clone, Serialize)]
pub struct InstantiateVAppTemplateParams {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "@xmlns:ovf")]
    xmlns_ovf: &'static str,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@deploy")]
    pub deploy: bool,
    #[serde(rename = "@powerOn")]
    pub power_on: bool,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "InstantiationParams")]
    pub instantiation_params: InstantiationParams,
    #[serde(rename = "Source")]
    pub source: Reference,
    #[serde(rename = "AllEULAsAccepted")]
    pub all_eulas_accepted: bool,
}

impl InstantiateVAppTemplateParams {
    /// An undeployed, powered-off vApp built from `template_href`. The
    /// network has to be reconfigured before it may be deployed.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        template_href: impl Into<String>,
    ) -> Self {
        Self {
            xmlns: ns::VCLOUD,
            xmlns_ovf: ns::OVF,
            name: name.into(),
            deploy: false,
            power_on: false,
            description,
            instantiation_params: InstantiationParams {},
            source: Reference::to_href(template_href),
            all_eulas_accepted: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InstantiationParams {}

/// Body of the vApp `deploy` action.
#[derive(Debug, Clone, Serialize)]
pub struct DeployVAppParams {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "@powerOn")]
    pub power_on: bool,
}

impl DeployVAppParams {
    pub fn power_on() -> Self {
        Self {
            xmlns: ns::VCLOUD,
            power_on: true,
        }
    }
}
