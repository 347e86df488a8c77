//! Clap derive structures for the `vchs` CLI.
//!
//! Defines the command tree, global flags, and shared types. This file is
//! also compiled by `build.rs` for man page generation, so it may only
//! depend on clap and the standard library.

use std::net::Ipv4Addr;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vchs -- provision VMs and gateway rules on vCloud Hybrid Service
#[derive(Debug, Parser)]
#[command(
    name = "vchs",
    version,
    about = "Provision vCloud Hybrid Service VDCs from the command line",
    long_about = "Logs in to vCloud Hybrid Service, opens a vCloud session on a\n\
        virtual data center and drives it: list templates, create and power on\n\
        a vApp on an org network, or publish an address through an edge gateway.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Account profile to use
    #[arg(long, short = 'p', env = "VCHS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// vCHS service URL (overrides profile)
    #[arg(long, env = "VCHS_URL", global = true)]
    pub url: Option<String>,

    /// vCHS login (overrides profile)
    #[arg(long, short = 'u', env = "VCHS_USERNAME", global = true)]
    pub username: Option<String>,

    /// vCHS password (prefer the keyring or VCHS_PASSWORD)
    #[arg(long, env = "VCHS_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// vCHS public API version
    #[arg(long, env = "VCHS_VCHS_VERSION", global = true)]
    pub vchs_version: Option<String>,

    /// vCloud API version
    #[arg(long, env = "VCHS_VCLOUD_VERSION", global = true)]
    pub vcloud_version: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VCHS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "VCHS_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "VCHS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Seconds between two task polls
    #[arg(long, env = "VCHS_POLL_INTERVAL", global = true)]
    pub poll_interval: Option<u64>,

    /// Give up on a provisioning task after this many polls
    #[arg(long, env = "VCHS_MAX_POLLS", global = true, conflicts_with = "unbounded_polls")]
    pub max_polls: Option<u32>,

    /// Wait for provisioning tasks without a poll ceiling
    #[arg(long, global = true)]
    pub unbounded_polls: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect virtual data centers
    #[command(alias = "vdc")]
    Vdcs(VdcsArgs),

    /// Create virtual machines
    Vm(VmArgs),

    /// Configure edge gateways
    #[command(alias = "gw")]
    Gateway(GatewayArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── VDCs ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VdcsArgs {
    #[command(subcommand)]
    pub command: VdcsCommand,
}

#[derive(Debug, Subcommand)]
pub enum VdcsCommand {
    /// List active VDCs with the templates each one can see
    #[command(alias = "ls")]
    List,
}

// ── VMs ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VmArgs {
    #[command(subcommand)]
    pub command: VmCommand,
}

#[derive(Debug, Subcommand)]
pub enum VmCommand {
    /// Create a vApp from a template, attach it to a network and power it on
    Create {
        /// VDC to create the vApp in
        #[arg(long)]
        vdc: String,

        /// Template name (must match exactly one template)
        #[arg(long, short = 't')]
        template: String,

        /// Name of the new vApp
        #[arg(long, short = 'n')]
        name: String,

        /// Org VDC network to connect the VM to
        #[arg(long)]
        network: String,

        /// vApp description
        #[arg(long)]
        description: Option<String>,
    },
}

// ── Gateway ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GatewayArgs {
    #[command(subcommand)]
    pub command: GatewayCommand,
}

#[derive(Debug, Subcommand)]
pub enum GatewayCommand {
    /// Add DNAT, SNAT and firewall rules publishing an internal address
    AddRules {
        /// VDC owning the gateway
        #[arg(long)]
        vdc: String,

        /// Edge gateway name
        #[arg(long, short = 'g')]
        gateway: String,

        /// Public address (selects the uplink network)
        #[arg(long)]
        external_ip: Ipv4Addr,

        /// Address of the VM behind the gateway
        #[arg(long)]
        internal_ip: Ipv4Addr,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the configuration (passwords masked)
    Show,

    /// Print the configuration file path
    Path,

    /// Store the active profile's password in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
