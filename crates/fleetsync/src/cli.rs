//! Clap derive structures for the `fleetsync` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fleetsync -- watch a fleet of servers and attack jobs from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "fleetsync",
    version,
    about = "Monitor a fleet control panel from the command line",
    long_about = "Lists servers and attack jobs, shows fleet statistics, and follows\n\
        the panel's live event channel.",
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
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "FLEETSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Panel profile to use
    #[arg(long, short = 'p', env = "FLEETSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Panel URL (overrides profile)
    #[arg(long, env = "FLEETSYNC_PANEL", global = true)]
    pub panel: Option<String>,

    /// Admin token sent as X-Admin-Token
    #[arg(long, env = "FLEETSYNC_ADMIN_TOKEN", global = true, hide_env_values = true)]
    pub admin_token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FLEETSYNC_OUTPUT",
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
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
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
    /// List and inspect fleet servers
    #[command(alias = "srv", alias = "s")]
    Servers(ServersArgs),

    /// List and inspect attack jobs
    #[command(alias = "a")]
    Attacks(AttacksArgs),

    /// Fleet-wide statistics
    Stats,

    /// Follow the live event channel and print each store change
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),
}

// ── Servers ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ServersArgs {
    #[command(subcommand)]
    pub command: ServersCommand,
}

#[derive(Debug, Subcommand)]
pub enum ServersCommand {
    /// List servers
    #[command(alias = "ls")]
    List {
        /// Only online servers
        #[arg(long, conflicts_with = "offline")]
        online: bool,

        /// Only servers that are not online
        #[arg(long)]
        offline: bool,
    },

    /// Show one server
    Get {
        /// Server ID
        id: String,
    },
}

// ── Attacks ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AttacksArgs {
    #[command(subcommand)]
    pub command: AttacksCommand,
}

#[derive(Debug, Subcommand)]
pub enum AttacksCommand {
    /// List attack jobs
    #[command(alias = "ls")]
    List {
        /// Only running jobs
        #[arg(long, conflicts_with = "status")]
        active: bool,

        /// Only jobs with this status (e.g. pending, stopped)
        #[arg(long)]
        status: Option<String>,
    },

    /// Show one attack job
    Get {
        /// Job ID
        id: String,
    },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Exit after this many store updates
    #[arg(long, short = 'n')]
    pub count: Option<u64>,

    /// Fetch servers and attacks over REST before following pushes
    #[arg(long)]
    pub preload: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the current configuration (secrets masked)
    Show,

    /// Create or replace a profile
    Init {
        /// Panel base URL
        #[arg(long)]
        url: String,

        /// Environment variable holding the admin token
        #[arg(long)]
        admin_token_env: Option<String>,

        /// Make this the default profile
        #[arg(long)]
        default: bool,
    },
}
