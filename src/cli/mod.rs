//! CLI argument definitions for modsettings.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CONFIG_PATH_ENV;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("MODSETTINGS_GIT_COMMIT"),
    " built ",
    env!("MODSETTINGS_BUILD_TIMESTAMP"),
    ")"
);

/// modsettings - Inspect and edit Factorio mod-settings.dat files.
///
/// Start with `modsettings show` to see every stage and setting.
#[derive(Parser, Debug)]
#[command(name = "modsettings")]
#[command(author, version, long_version = LONG_VERSION, about = "Inspect and edit Factorio mod-settings.dat files", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Game user data directory. Defaults to the platform's Factorio directory.
    #[arg(
        short = 'u',
        long = "user-data-directory",
        global = true,
        env = "MODSETTINGS_USER_DATA_DIR"
    )]
    pub user_data_directory: Option<PathBuf>,

    /// Mods directory. Defaults to <user-data-directory>/mods.
    #[arg(
        short = 'm',
        long = "mod-directory",
        global = true,
        env = "MODSETTINGS_MOD_DIR"
    )]
    pub mod_directory: Option<PathBuf>,

    /// Settings file name inside the mods directory
    #[arg(short = 'f', long = "file", global = true)]
    pub settings_file: Option<String>,

    /// Maximum property tree nesting depth accepted when reading
    #[arg(long = "max-depth", global = true)]
    pub max_depth: Option<usize>,

    /// Also append events to this log file
    #[arg(long = "log-file", global = true)]
    pub log_file: Option<PathBuf>,

    /// Config file (KDL)
    #[arg(long = "config", global = true, env = CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the file version and every setting, grouped by stage
    Show,

    /// Show one setting's value
    Get {
        /// Stage (startup, runtime-global, runtime-per-user)
        stage: String,

        /// Setting name
        name: String,
    },

    /// Set one setting's value
    ///
    /// The value is parsed as JSON (true, 3, -1, 2.5, "text"); anything that
    /// isn't valid JSON is taken as a string.
    Set {
        /// Stage (startup, runtime-global, runtime-per-user)
        stage: String,

        /// Setting name
        name: String,

        /// New value
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Write to this file name instead of overwriting the settings file
        #[arg(short = 'o', long)]
        output: Option<String>,
    },

    /// Apply a JSON file of settings: {"<stage>": {"<name>": <value>}}
    Apply {
        /// Path to the JSON overrides file
        overrides: PathBuf,

        /// JSON file of default values applied where the overrides don't set one
        #[arg(long)]
        defaults: Option<PathBuf>,

        /// Write to this file name instead of overwriting the settings file
        #[arg(short = 'o', long)]
        output: Option<String>,

        /// Check the overrides without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Create a settings file with three empty stages
    Init {
        /// File version (a.b.c.d)
        #[arg(long = "file-version", default_value = "1.1.100.0")]
        file_version: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Copy the settings file to a backup next to it
    Backup {
        /// Backup suffix (default from config, or .bak)
        #[arg(long)]
        suffix: Option<String>,
    },

    /// Write the backup copy back over the settings file
    Restore {
        /// Backup suffix (default from config, or .bak)
        #[arg(long)]
        suffix: Option<String>,
    },

    /// Print the raw property tree with node types
    Dump,

    /// Show the resolved configuration and where each value came from
    Config {
        /// Write the flags given on this run into the config file
        #[arg(long)]
        save: bool,
    },
}
