//! Gateway command handlers.

use vchs_core::{GatewayRuleParams, GatewayRuleReport};

use crate::cli::{GatewayArgs, GatewayCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::Workflow;

fn detail(report: &GatewayRuleReport) -> String {
    output::detail_lines(&[
        ("VDC", report.vdc.clone()),
        ("Gateway", report.gateway.clone()),
        ("Uplink", report.uplink_network.clone()),
        ("DNAT", format!("{} -> {}", report.external_ip, report.internal_ip)),
        ("SNAT", format!("{} -> {}", report.internal_ip, report.external_ip)),
        ("Firewall", format!("allow external -> {}", report.external_ip)),
        ("Task", report.task_href.clone()),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    workflow: &Workflow,
    args: GatewayArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        GatewayCommand::AddRules {
            vdc,
            gateway,
            external_ip,
            internal_ip,
        } => {
            let params = GatewayRuleParams {
                vdc,
                gateway,
                external_ip,
                internal_ip,
            };
            let report = workflow.orchestrator.add_gateway_rules(&params).await;
            workflow.done();
            let report = report?;

            let out = output::render_single(&global.output, &report, detail, |r| {
                r.task_href.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
