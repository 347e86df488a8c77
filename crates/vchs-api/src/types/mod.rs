// XML schema types for the vCHS and vCloud APIs.
//
// Only the attributes and elements the workflows read or write are modelled;
// everything else in a server document is skipped while decoding. Sections
// that are PUT back whole are edited by `crate::edit` instead. Request
// bodies spell out their namespace prefixes through `rename(serialize = ..)`
// while decoding matches local names.

pub mod gateway;
pub mod task;
pub mod vcloud;
pub mod vchs;

use serde::{Deserialize, Serialize};

pub use gateway::*;
pub use task::*;
pub use vcloud::*;
pub use vchs::*;

/// XML namespaces used in request bodies.
pub mod ns {
    pub const VCLOUD: &str = "http://www.vmware.com/vcloud/v1.5";
    pub const OVF: &str = "http://schemas.dmtf.org/ovf/envelope/1";
}

/// Media types that identify links and request bodies.
pub mod media {
    pub const SERVICE_LIST: &str = "application/xml;class=vnd.vmware.vchs.servicelist";
    pub const VCLOUD_SESSION: &str = "application/xml;class=vnd.vmware.vchs.vcloudsession";
    pub const INSTANTIATE_VAPP_TEMPLATE_PARAMS: &str =
        "application/vnd.vmware.vcloud.instantiateVAppTemplateParams+xml";
    pub const DEPLOY_VAPP_PARAMS: &str = "application/vnd.vmware.vcloud.deployVAppParams+xml";
    pub const NETWORK_CONFIG_SECTION: &str =
        "application/vnd.vmware.vcloud.networkConfigSection+xml";
    pub const VIRTUAL_HARDWARE_SECTION: &str =
        "application/vnd.vmware.vcloud.virtualHardwareSection+xml";
    pub const EDGE_GATEWAY_SERVICE_CONFIGURATION: &str =
        "application/vnd.vmware.admin.edgeGatewayServiceConfiguration+xml";
}

/// A typed hypermedia link: `<Link rel=".." type=".." href=".." name=".."/>`.
///
/// Neither field is unique on its own; callers pick links by relation,
/// media type or name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Link {
    #[serde(rename = "@rel", default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(rename = "@href")]
    pub href: String,
    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A reference to another entity: `<Network href=".." name=".." type=".."/>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Reference {
    #[serde(rename = "@href")]
    pub href: String,
    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl Reference {
    pub fn to_href(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }
}

/// The `<Error>` document vCloud returns on 4xx/5xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDocument {
    #[serde(rename = "@message", default)]
    pub message: Option<String>,
    #[serde(rename = "@majorErrorCode", default)]
    pub major_error_code: Option<String>,
    #[serde(rename = "@minorErrorCode", default)]
    pub minor_error_code: Option<String>,
}
