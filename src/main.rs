//! modsettings CLI - Inspect and edit Factorio mod-settings.dat files.

use clap::Parser;
use modsettings::cli::{Cli, Commands};
use modsettings::commands::{self, Context, Output};
use modsettings::config::{self, ConfigOverrides, LoadedConfig, OutputFormat, ResolvedConfig};
use modsettings::log::{FileLogger, Logger, TracingLogger};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter, e.g. `debug` or `modsettings=trace`.
const LOG_FILTER_ENV: &str = "MODSETTINGS_LOG";

/// Filter used when `MODSETTINGS_LOG` is unset. Logger events stay off so stderr
/// carries only the command's own error.
const DEFAULT_LOG_FILTER: &str = "warn,modsettings::log=off";

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let mut human = cli.human_readable;

    let result = config::load_config(cli.config.as_deref()).and_then(|loaded| {
        let overrides = overrides(&cli);
        let resolved = config::resolve_config(&loaded, &overrides)?;
        human = human || resolved.output_format() == OutputFormat::Human;

        if let Commands::Config { save: true } = cli.command {
            return save_config(&cli, &loaded, &overrides, human);
        }
        let logger = make_logger(&resolved);
        run_command(cli.command, Context::new(resolved, logger), human)
    });

    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Collect the CLI flags (and their environment fallbacks) that override the config file.
fn overrides(cli: &Cli) -> ConfigOverrides {
    let mut overrides = ConfigOverrides::new();
    if let Some(ref dir) = cli.user_data_directory {
        overrides = overrides.with_user_data_directory(dir);
    }
    if let Some(ref dir) = cli.mod_directory {
        overrides = overrides.with_mod_directory(dir);
    }
    if let Some(ref name) = cli.settings_file {
        overrides = overrides.with_settings_file(name);
    }
    if let Some(depth) = cli.max_depth {
        overrides = overrides.with_max_depth(depth);
    }
    if cli.human_readable {
        overrides = overrides.with_output_format(OutputFormat::Human);
    }
    if let Some(ref path) = cli.log_file {
        overrides = overrides.with_log_file(path);
    }
    overrides
}

fn save_config(
    cli: &Cli,
    loaded: &LoadedConfig,
    overrides: &ConfigOverrides,
    human: bool,
) -> Result<(), modsettings::Error> {
    let path = config::config_file_path(cli.config.as_deref()).ok_or_else(|| {
        modsettings::Error::Config("no default config location; pass --config".to_string())
    })?;
    let result = commands::save_config(&path, loaded, overrides)?;
    output(&result, human);
    Ok(())
}

fn make_logger(resolved: &ResolvedConfig) -> Arc<dyn Logger> {
    match resolved.log_file() {
        Some(path) => Arc::new(FileLogger::new(path)),
        None => Arc::new(TracingLogger),
    }
}

fn run_command(command: Commands, ctx: Context, human: bool) -> Result<(), modsettings::Error> {
    match command {
        Commands::Show => {
            let result = commands::show(&ctx)?;
            output(&result, human);
        }
        Commands::Get { stage, name } => {
            let result = commands::get(&ctx, &stage, &name)?;
            output(&result, human);
        }
        Commands::Set {
            stage,
            name,
            value,
            output: out,
        } => {
            let result = commands::set(&ctx, &stage, &name, &value, out.as_deref())?;
            output(&result, human);
        }
        Commands::Apply {
            overrides,
            defaults,
            output: out,
            dry_run,
        } => {
            let result = commands::apply(
                &ctx,
                &overrides,
                defaults.as_deref(),
                out.as_deref(),
                dry_run,
            )?;
            output(&result, human);
        }
        Commands::Init {
            file_version,
            force,
        } => {
            let result = commands::init(&ctx, &file_version, force)?;
            output(&result, human);
        }
        Commands::Backup { suffix } => {
            let result = commands::backup(&ctx, suffix.as_deref())?;
            output(&result, human);
        }
        Commands::Restore { suffix } => {
            let result = commands::restore(&ctx, suffix.as_deref())?;
            output(&result, human);
        }
        Commands::Dump => {
            let result = commands::dump(&ctx)?;
            output(&result, human);
        }
        Commands::Config { .. } => {
            let result = commands::config(&ctx);
            output(&result, human);
        }
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
