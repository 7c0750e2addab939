//! CLI command parsing.

pub mod prompt;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// hark - open apps and routines by name.
#[derive(Parser)]
#[command(name = "hark")]
#[command(about = "Resolve spoken app names to programs and run launch routines")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory holding learned apps, routines and the activity log.
    #[arg(long, env = "HARK_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Configuration file to use instead of the default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Never prompt; ambiguous names resolve to nothing.
    #[arg(long, global = true)]
    pub no_input: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open an app by name.
    #[command(visible_alias = "o")]
    Open {
        /// App name; several words are joined.
        #[arg(required = true, num_args = 1..)]
        app: Vec<String>,

        /// Launch with administrator rights.
        #[arg(short, long)]
        admin: bool,
    },

    /// Show how a name resolves without launching anything.
    Resolve {
        #[arg(required = true, num_args = 1..)]
        app: Vec<String>,
    },

    /// Manage and run routines.
    #[command(visible_alias = "r")]
    Routine {
        #[command(subcommand)]
        command: RoutineCommands,
    },

    /// Manage learned apps.
    Apps {
        #[command(subcommand)]
        command: AppsCommands,
    },

    /// Read commands line by line from standard input.
    Listen,

    /// Manage configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum RoutineCommands {
    /// List routines.
    List,

    /// Show the steps of a routine.
    Show { name: String },

    /// Create a routine.
    ///
    /// Without --step, apps are picked interactively from installed shortcuts.
    Create {
        name: String,

        /// App to open, as NAME or NAME:admin. Repeat for more steps.
        #[arg(short, long = "step")]
        steps: Vec<String>,
    },

    /// Delete a routine.
    Delete { name: String },

    /// Run a routine.
    Run { name: String },
}

#[derive(Subcommand)]
pub enum AppsCommands {
    /// List learned apps.
    List {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },

    /// Remember a path for a name.
    Add {
        name: String,
        path: PathBuf,

        /// Always launch with administrator rights.
        #[arg(short, long)]
        admin: bool,
    },

    /// Forget a learned app.
    Forget { name: String },

    /// List installed shortcuts.
    Available,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the current configuration.
    Show,

    /// Show the configuration file path.
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}
