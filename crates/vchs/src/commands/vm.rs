//! VM command handlers.

use vchs_core::{ProvisionParams, ProvisionReport};

use crate::cli::{GlobalOpts, VmArgs, VmCommand};
use crate::error::CliError;
use crate::output;

use super::Workflow;

fn ip_or_none(ip: Option<&str>) -> &str {
    ip.unwrap_or("none")
}

/// Key/value view of a finished provisioning run.
fn detail(report: &ProvisionReport) -> String {
    let mut pairs = vec![
        ("VDC", report.vdc.clone()),
        ("vApp", report.vapp_name.clone()),
        ("Href", report.vapp_href.clone()),
        ("Network", report.network.clone()),
    ];
    for vm in &report.vms {
        pairs.push(("VM", format!("{} ({})", vm.name, ip_or_none(vm.ip.as_deref()))));
    }
    output::detail_lines(&pairs)
}

/// `name ip` per VM, for scripts.
fn plain(report: &ProvisionReport) -> String {
    report
        .vms
        .iter()
        .map(|vm| format!("{} {}", vm.name, ip_or_none(vm.ip.as_deref())))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(workflow: &Workflow, args: VmArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        VmCommand::Create {
            vdc,
            template,
            name,
            network,
            description,
        } => {
            let params = ProvisionParams {
                vdc,
                template,
                vapp_name: name,
                network,
                description,
            };
            let report = workflow.orchestrator.provision(&params).await;
            workflow.done();
            let report = report?;

            let out = output::render_single(&global.output, &report, detail, plain)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
