//! Clap derive structures for the `panctl` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use panos_config::DeviceKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// panctl -- query PAN-OS firewalls and Panorama
#[derive(Debug, Parser)]
#[command(
    name = "panctl",
    version,
    about = "Query PAN-OS firewalls and Panorama from the command line",
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
    /// Config file (YAML or TOML)
    #[arg(long, short = 'C', env = "PANCTL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Device profile to use
    #[arg(long, short = 'p', env = "PANCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Management address (overrides profile)
    #[arg(long, short = 'H', global = true)]
    pub host: Option<String>,

    /// Device kind when no profile is used
    #[arg(long, global = true)]
    pub kind: Option<DeviceKind>,

    /// API key (overrides the credential chain)
    #[arg(long, env = "PANOS_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// REST API version, e.g. 10.1
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// Delay before each request, in seconds
    #[arg(long, global = true)]
    pub request_delay: Option<f64>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Device identity, HA state and jobs
    #[command(alias = "sys")]
    System(SystemArgs),

    /// Panorama fleet, device groups and tags
    #[command(alias = "pano")]
    Panorama(PanoramaArgs),

    /// Security rules
    Rules(RulesArgs),

    /// Generate an API key for an admin account
    Keygen(KeygenArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── System ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SystemArgs {
    #[command(subcommand)]
    pub command: SystemCommand,
}

#[derive(Debug, Subcommand)]
pub enum SystemCommand {
    /// Show system info
    Info,

    /// Show the HA peer state
    Ha,

    /// List jobs
    Jobs {
        /// Only this job
        #[arg(long)]
        id: Option<u64>,
    },
}

// ── Panorama ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PanoramaArgs {
    #[command(subcommand)]
    pub command: PanoramaCommand,
}

#[derive(Debug, Subcommand)]
pub enum PanoramaCommand {
    /// List device groups and the firewalls they target
    #[command(alias = "dg")]
    DeviceGroups,

    /// List connected managed firewalls
    Devices,

    /// Show the device-group hierarchy
    Hierarchy,

    /// Show Panorama tags per device, or the devices carrying one tag
    Tags {
        #[arg(long)]
        tag: Option<String>,
    },
}

// ── Rules ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommand,
}

/// Where to read rules from. Panorama reads a device group (or `shared`);
/// firewalls read a vsys's local rulebase.
#[derive(Debug, Args)]
pub struct RuleLocation {
    /// Panorama device group, or `shared`
    #[arg(long, short = 'g', default_value = "shared")]
    pub device_group: String,

    /// Panorama rulebase half
    #[arg(long, default_value = "pre")]
    pub rulebase: Rulebase,

    /// Firewall vsys
    #[arg(long, default_value = "vsys1")]
    pub vsys: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Rulebase {
    Pre,
    Post,
}

#[derive(Debug, Subcommand)]
pub enum RulesCommand {
    /// List security rules
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        location: RuleLocation,
    },

    /// Show one security rule
    Show {
        /// Rule name
        name: String,

        #[command(flatten)]
        location: RuleLocation,
    },
}

// ── Keygen ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct KeygenArgs {
    /// Admin user
    #[arg(long, short = 'u')]
    pub user: String,

    /// Save the key in the system keyring for the active profile
    #[arg(long)]
    pub store: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
