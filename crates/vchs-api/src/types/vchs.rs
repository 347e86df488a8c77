// vCHS public API documents: login session, service list, compute service
// and the per-VDC vCloud session.

use serde::Deserialize;

use super::Link;

/// Body of a successful `POST /api/vchs/sessions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Session {
    #[serde(rename = "@href", default)]
    pub href: Option<String>,
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
}

/// `<Services>` -- every service the account is entitled to.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceList {
    #[serde(rename = "Service", default)]
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Service {
    #[serde(rename = "@region", default)]
    pub region: Option<String>,
    #[serde(rename = "@serviceId", default)]
    pub service_id: Option<String>,
    #[serde(rename = "@serviceType", default)]
    pub service_type: Option<String>,
    #[serde(rename = "@type", default)]
    pub media_type: Option<String>,
    #[serde(rename = "@href")]
    pub href: String,
}

impl Service {
    /// Compute services are the ones that own virtual datacenters.
    pub fn is_compute(&self) -> bool {
        self.service_type
            .as_deref()
            .is_some_and(|t| t.starts_with("compute"))
    }
}

/// `<Compute>` -- a compute service and the VDCs it hosts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Compute {
    #[serde(rename = "@serviceId", default)]
    pub service_id: Option<String>,
    #[serde(rename = "@href", default)]
    pub href: Option<String>,
    #[serde(rename = "VdcRef", default)]
    pub vdcs: Vec<VdcRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VdcRef {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@status", default)]
    pub status: Option<String>,
    #[serde(rename = "@type", default)]
    pub media_type: Option<String>,
    #[serde(rename = "@href")]
    pub href: String,
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
}

impl VdcRef {
    pub fn is_active(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("active"))
    }
}

/// `<VCloudSession>` -- answer to the VDC session exchange.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VCloudSession {
    #[serde(rename = "@href", default)]
    pub href: Option<String>,
    #[serde(rename = "@name", default)]
    pub name: Option<String>,
    #[serde(rename = "VdcLink", default)]
    pub vdc_link: Option<VdcLink>,
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
}

/// The vCloud token plus the href of the VDC it grants access to.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VdcLink {
    #[serde(rename = "@authorizationToken")]
    pub authorization_token: String,
    #[serde(rename = "@authorizationHeader", default)]
    pub authorization_header: Option<String>,
    #[serde(rename = "@name", default)]
    pub name: Option<String>,
    #[serde(rename = "@type", default)]
    pub media_type: Option<String>,
    #[serde(rename = "@href")]
    pub href: String,
}
