//! Clap derive structures for the `fieldbook` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fieldbook -- tasks, projects and merchant records from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "fieldbook",
    version,
    about = "Manage fieldbook projects, tasks and merchants from the command line",
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
    /// Server profile to use
    #[arg(long, short = 'p', env = "FIELDBOOK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 's', env = "FIELDBOOK_SERVER", global = true)]
    pub server: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FIELDBOOK_OUTPUT",
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "FIELDBOOK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "FIELDBOOK_TIMEOUT", global = true)]
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
    /// Plain text, one id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Color if stdout is a terminal
    Auto,
    Always,
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session token
    Login(LoginArgs),

    /// Forget the stored session token
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Show server version and enabled features
    Info,

    /// Manage projects
    #[command(alias = "p")]
    Projects(ProjectsArgs),

    /// Manage tasks
    #[command(alias = "t")]
    Tasks(TasksArgs),

    /// Manage labels
    Labels(LabelsArgs),

    /// Manage teams
    Teams(TeamsArgs),

    /// Manage merchants, imports and geocoding
    #[command(alias = "m")]
    Merchants(MerchantsArgs),

    /// Manage merchant tags
    Tags(TagsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Query arguments for list commands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Free-text search
    #[arg(long, short = 'f')]
    pub search: Option<String>,

    /// Page number (1-based)
    #[arg(long)]
    pub page: Option<u32>,

    /// Items per page
    #[arg(long, short = 'l')]
    pub limit: Option<u32>,
}

/// Field assignments for create/update commands.
#[derive(Debug, Args)]
pub struct FieldArgs {
    /// Field assignment, repeatable (e.g. --set priority=3)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Read fields from a JSON object file
    #[arg(long, short = 'F', value_name = "PATH")]
    pub from_file: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AUTH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Username (prompted when omitted and not in the profile)
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// Request a long-lived token
    #[arg(long)]
    pub long_token: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PROJECTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ProjectsArgs {
    #[command(subcommand)]
    pub command: ProjectsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProjectsCommand {
    /// List projects
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one project
    Get { id: String },

    /// Create a project
    Create {
        title: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Update a project
    Update {
        id: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Delete a project
    #[command(alias = "rm")]
    Delete { id: String },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TASKS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TasksArgs {
    #[command(subcommand)]
    pub command: TasksCommand,
}

#[derive(Debug, Subcommand)]
pub enum TasksCommand {
    /// List tasks of one project, or of every project
    #[command(alias = "ls")]
    List {
        /// Project id (omit for all projects)
        #[arg(long, short = 'P')]
        project: Option<String>,

        /// Only tasks not yet done
        #[arg(long)]
        open: bool,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Show one task
    Get { id: String },

    /// Create a task in a project
    Create {
        /// Project id
        #[arg(long, short = 'P')]
        project: String,

        title: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Update a task
    Update {
        id: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Flip a task between done and open
    Toggle { id: String },

    /// Delete a task
    #[command(alias = "rm")]
    Delete { id: String },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LABELS / TEAMS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LabelsArgs {
    #[command(subcommand)]
    pub command: LabelsCommand,
}

#[derive(Debug, Subcommand)]
pub enum LabelsCommand {
    /// List labels
    #[command(alias = "ls")]
    List(ListArgs),

    /// Create a label
    Create {
        title: String,

        /// Color as hex, with or without '#'
        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a label
    #[command(alias = "rm")]
    Delete { id: String },
}

#[derive(Debug, Args)]
pub struct TeamsArgs {
    #[command(subcommand)]
    pub command: TeamsCommand,
}

#[derive(Debug, Subcommand)]
pub enum TeamsCommand {
    /// List teams
    #[command(alias = "ls")]
    List(ListArgs),

    /// Create a team
    Create {
        name: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a team
    #[command(alias = "rm")]
    Delete { id: String },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MERCHANTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct MerchantsArgs {
    #[command(subcommand)]
    pub command: MerchantsCommand,
}

#[derive(Debug, Subcommand)]
pub enum MerchantsCommand {
    /// List merchants
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one merchant
    Get { id: String },

    /// Create a merchant
    Create {
        title: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Update a merchant
    Update {
        id: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Delete a merchant
    #[command(alias = "rm")]
    Delete { id: String },

    /// Import merchants from a .csv, .xls or .xlsx file
    Import {
        file: PathBuf,

        /// Geocode imported rows (CSV only)
        #[arg(long)]
        geocode: bool,
    },

    /// Re-run geocoding for one merchant
    Geocode { id: String },

    /// Resolve a free-text address to coordinates
    Locate { address: String },

    /// List geo points recorded for a merchant
    Points { id: String },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TAGS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TagsArgs {
    #[command(subcommand)]
    pub command: TagsCommand,
}

#[derive(Debug, Subcommand)]
pub enum TagsCommand {
    /// List merchant tags
    #[command(alias = "ls")]
    List(ListArgs),

    /// List the distinct tag classes in use
    Classes,

    /// Create a merchant tag
    Create {
        tag_name: String,

        #[arg(long)]
        class: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a merchant tag
    #[command(alias = "rm")]
    Delete { id: String },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (server, api_prefix, username, token_storage, insecure, timeout, ca_cert)
        key: String,

        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use { name: String },

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
