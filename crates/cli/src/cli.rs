//! Command-line arguments.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "studio", version)]
#[command(about = "Create prompts, start generation runs and follow them live", long_about = None)]
pub struct Cli {
    /// Path to studio.toml (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding persisted studio state and the auth token
    #[arg(long, global = true, env = "STUDIO_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Print JSON instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the auth token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "STUDIO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log out and forget the auth token
    Logout,
    /// Manage prompts
    #[command(subcommand)]
    Prompts(PromptCommand),
    /// Start, inspect and follow generation runs
    #[command(subcommand)]
    Runs(RunCommand),
    /// Recently used prompts
    #[command(subcommand)]
    History(HistoryCommand),
    /// Studio settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Show the resolved configuration
    Config,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

#[derive(Subcommand, Debug)]
pub enum PromptCommand {
    /// List prompts
    List(PageArgs),
    /// Show one prompt
    Show { id: String },
    /// Create a prompt and add it to the history
    Create {
        text: String,
        /// Tag to attach; repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Make the prompt visible to other users
        #[arg(long)]
        public: bool,
    },
    /// Update a prompt; only the given fields change
    Update {
        id: String,
        #[arg(long)]
        text: Option<String>,
        /// Replace the tags; repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        public: Option<bool>,
    },
    /// Delete a prompt
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum RunCommand {
    /// List runs
    List(PageArgs),
    /// Show one run
    Show { id: String },
    /// Start a run for a prompt
    Create {
        prompt_id: String,
        /// Quality preset (defaults to the studio setting)
        #[arg(long)]
        quality: Option<String>,
        /// Export format (defaults to the studio setting)
        #[arg(long)]
        format: Option<String>,
        /// Follow the run until it finishes
        #[arg(long)]
        follow: bool,
    },
    /// Cancel a run
    Cancel { id: String },
    /// Retry a failed or cancelled run
    Retry {
        id: String,
        #[arg(long)]
        follow: bool,
    },
    /// Follow a run's live progress until it finishes
    Watch { id: String },
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// Show recently used prompts, newest first
    Show,
    /// Forget all recently used prompts
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Show the current settings
    Show,
    /// Change one setting
    Set { key: SettingKey, value: String },
    /// Restore all studio state to its defaults
    Reset,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    AutoSave,
    AutoSaveInterval,
    MaxHistorySize,
    DefaultQuality,
    DefaultExportFormat,
    Theme,
}
