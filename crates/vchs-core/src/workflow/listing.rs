// VDC listing: every active VDC on the account with the templates it can see.

use tracing::debug;
use vchs_api::types::VdcRef;

use super::{Orchestrator, Step, VCLOUD_SESSION_TYPE, VdcListing};
use crate::error::CoreError;
use crate::links::LinkMatch;

/// Query record type for vApp templates.
pub(crate) const TEMPLATE_RECORD: &str = "vAppTemplate";

impl Orchestrator {
    /// List active VDCs across all compute services, in document order.
    ///
    /// A VDC without a vCloud session link lists no templates. Any request
    /// that fails aborts the whole listing.
    pub async fn list_vdcs(&self) -> Result<Vec<VdcListing>, CoreError> {
        let session = self.login().await?;
        let services = self.compute_services(&session).await?;

        let mut listings = Vec::new();
        for entry in &services {
            for vdc in entry.compute.vdcs.iter().filter(|v| v.is_active()) {
                let templates = self
                    .step(Step::ListTemplates, self.vdc_templates(&session, vdc))
                    .await?;
                listings.push(VdcListing {
                    name: vdc.name.clone(),
                    service_type: entry.service.service_type.clone().unwrap_or_default(),
                    region: entry.service.region.clone().unwrap_or_default(),
                    templates,
                });
            }
        }
        Ok(listings)
    }

    async fn vdc_templates(
        &self,
        session: &vchs_api::VchsSession,
        vdc: &VdcRef,
    ) -> Result<Vec<String>, CoreError> {
        let wanted = LinkMatch::TypeContains(VCLOUD_SESSION_TYPE);
        let Some(link) = vdc.links.iter().find(|l| wanted.matches(l)) else {
            debug!(vdc = %vdc.name, "no vCloud session link, skipping templates");
            return Ok(Vec::new());
        };

        let vcloud = self.vcloud_client(session, &link.href).await?;
        let records = vcloud.query(TEMPLATE_RECORD, None).await?;
        Ok(records.vapp_templates.into_iter().map(|r| r.name).collect())
    }
}
