//! VDC command handlers.

use tabled::Tabled;
use vchs_core::VdcListing;

use crate::cli::{GlobalOpts, VdcsArgs, VdcsCommand};
use crate::error::CliError;
use crate::output;

use super::Workflow;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct VdcRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Service")]
    service_type: String,
    #[tabled(rename = "Templates")]
    templates: String,
}

impl From<&VdcListing> for VdcRow {
    fn from(v: &VdcListing) -> Self {
        Self {
            name: v.name.clone(),
            region: v.region.clone(),
            service_type: v.service_type.clone(),
            templates: if v.templates.is_empty() {
                "-".into()
            } else {
                v.templates.join("\n")
            },
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(workflow: &Workflow, args: VdcsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        VdcsCommand::List => {
            let listing = workflow.orchestrator.list_vdcs().await;
            workflow.done();
            let listing = listing?;

            if listing.is_empty() && !global.quiet {
                eprintln!("No active VDCs on this account");
            }
            let out = output::render_list(
                &global.output,
                &listing,
                |v| VdcRow::from(v),
                |v| v.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
