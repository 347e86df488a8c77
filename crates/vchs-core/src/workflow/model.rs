// Workflow results. Plain data, serializable for the CLI's output formats.

use std::net::Ipv4Addr;

use serde::Serialize;

/// One active VDC and the templates visible from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VdcListing {
    pub name: String,
    pub service_type: String,
    pub region: String,
    pub templates: Vec<String>,
}

/// Address of one VM after deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VmAddress {
    pub name: String,
    /// `None` when the VM's connection section could not be read or lists
    /// no address.
    pub ip: Option<String>,
}

/// Outcome of a successful provisioning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionReport {
    pub vdc: String,
    pub vapp_name: String,
    pub vapp_href: String,
    pub network: String,
    pub vms: Vec<VmAddress>,
}

/// Outcome of a successful gateway rule run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRuleReport {
    pub vdc: String,
    pub gateway: String,
    pub uplink_network: String,
    pub external_ip: Ipv4Addr,
    pub internal_ip: Ipv4Addr,
    pub task_href: String,
}
