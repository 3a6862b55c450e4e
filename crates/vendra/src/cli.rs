//! Clap derive structures for the `vendra` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};
use strum::IntoEnumIterator;

use vendra_core::EntityKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vendra -- inspect and edit Vendra studio data from the command line
#[derive(Debug, Parser)]
#[command(
    name = "vendra",
    version,
    about = "Sync and edit Vendra business data from the command line",
    long_about = "Loads every collection of a Vendra backend into a local cache,\n\
        applies edits optimistically and reconciles them with the backend.",
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
    /// Backend profile to use
    #[arg(long, short = 'p', env = "VENDRA_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend project URL (overrides profile)
    #[arg(long, env = "VENDRA_URL", global = true)]
    pub url: Option<String>,

    /// Public API key (overrides profile)
    #[arg(long, env = "VENDRA_API_KEY", global = true, hide_env_values = true)]
    pub key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VENDRA_OUTPUT",
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

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "VENDRA_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "VENDRA_TIMEOUT", global = true)]
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
    /// Load every collection and report counts
    Sync,

    /// Stay connected and report remote changes as they arrive
    Watch(WatchArgs),

    /// List the records of one collection
    #[command(alias = "ls")]
    List(ListArgs),

    /// Create a record
    Create(CreateArgs),

    /// Update fields of a record
    Update(UpdateArgs),

    /// Delete a record
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Tables to watch (default: the profile's watch list)
    #[arg(long, short = 't', value_delimiter = ',', value_parser = parse_kind)]
    pub tables: Vec<EntityKind>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Table name (e.g. clients, projects, transactions)
    #[arg(value_parser = parse_kind)]
    pub kind: EntityKind,

    /// Show at most this many records
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Table name
    #[arg(value_parser = parse_kind)]
    pub kind: EntityKind,

    /// Record fields as JSON, or @path to read them from a file
    #[arg(long, short = 'd')]
    pub data: String,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Table name
    #[arg(value_parser = parse_kind)]
    pub kind: EntityKind,

    /// Record id
    pub id: String,

    /// Fields to change as JSON, or @path to read them from a file
    #[arg(long, short = 'd')]
    pub data: String,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Table name
    #[arg(value_parser = parse_kind)]
    pub kind: EntityKind,

    /// Record id
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file
    Init(InitArgs),

    /// Display the current configuration
    Show,

    /// Store the active profile's API key in the system keyring
    SetKey {
        /// Key to store (prompted for when omitted)
        #[arg(long)]
        value: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Profile name (prompted for when omitted)
    #[arg(long)]
    pub name: Option<String>,

    /// Save the API key into the config file instead of the keyring
    #[arg(long)]
    pub plaintext_key: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

/// Accept a table name in snake_case or kebab-case.
fn parse_kind(s: &str) -> Result<EntityKind, String> {
    EntityKind::from_table(&s.replace('-', "_")).ok_or_else(|| {
        let known: Vec<&str> = EntityKind::iter().map(EntityKind::table).collect();
        format!("unknown table '{s}' (expected one of: {})", known.join(", "))
    })
}
