//! Command dispatch: bridges CLI args -> core workflows -> output formatting.

pub mod config_cmd;
pub mod gateway;
pub mod vdcs;
pub mod vm;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vchs_core::Orchestrator;

use crate::cli::{Cli, Command, CompletionsArgs, GlobalOpts};
use crate::config;
use crate::error::{CliError, exit_code};
use crate::output;
use crate::progress::StepProgress;

/// A configured orchestrator plus the progress display it reports to.
pub struct Workflow {
    pub orchestrator: Orchestrator,
    progress: Arc<StepProgress>,
}

impl Workflow {
    /// Clear progress output before results are printed.
    pub fn done(&self) {
        self.progress.finish();
    }
}

/// Dispatch a parsed command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    debug!(command = ?cmd, "dispatching command");
    match cmd {
        Command::Vdcs(args) => vdcs::handle(&connect(global)?, args, global).await,
        Command::Vm(args) => vm::handle(&connect(global)?, args, global).await,
        Command::Gateway(args) => gateway::handle(&connect(global)?, args, global).await,
        // Config and completions run without a vCHS connection
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(args) => {
            completions(&args);
            Ok(())
        }
    }
}

/// Resolve configuration and build the orchestrator for one run.
///
/// The first Ctrl-C cancels the step in progress; a second one exits.
fn connect(global: &GlobalOpts) -> Result<Workflow, CliError> {
    let workflow_config = config::build_workflow_config(global)?;
    let progress = Arc::new(StepProgress::new(
        global.quiet,
        output::should_color(&global.color),
    ));
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let orchestrator = Orchestrator::new(workflow_config)
        .with_cancel(cancel)
        .with_observer(progress.clone());
    Ok(Workflow {
        orchestrator,
        progress,
    })
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("interrupt received, cancelling");
        cancel.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(exit_code::INTERRUPTED);
        }
    });
}

fn completions(args: &CompletionsArgs) {
    use clap::CommandFactory;

    let mut cmd = Cli::command();
    clap_complete::generate(args.shell, &mut cmd, "vchs", &mut std::io::stdout());
}
