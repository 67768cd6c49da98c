//! Configuration for the modsettings CLI.
//!
//! A single `config.kdl` file holds user preferences. It is read from
//! `--config`, the `MODSETTINGS_CONFIG` environment variable, or
//! `~/.config/modsettings/config.kdl`, in that order. A missing default file
//! is not an error.
//!
//! Contains:
//! - `user-data-directory` - Game user data directory
//! - `mod-directory` - Mods directory (defaults to `<user-data-directory>/mods`)
//! - `settings-file` - Settings file name (default `mod-settings.dat`)
//! - `max-depth` - Property tree nesting limit
//! - `output-format` - "json" or "human"
//! - `log-file` - Append events to this file
//! - `backup-suffix` - Suffix for backup copies (default `.bak`)
//!
//! Use the [`resolver`] module for precedence resolution. `config --save`
//! writes the given flags back to the file.

pub mod resolver;
pub mod schema;

pub use resolver::{
    CONFIG_PATH_ENV, ConfigOverrides, LoadedConfig, Resolved, ResolvedConfig, ValueSource,
    config_file_path, default_config_path, default_user_data_directory, expand_home, load_config,
    resolve_config, save_config,
};
pub use schema::{MAX_DEPTH_LIMIT, ModSettingsConfig, OutputFormat};
