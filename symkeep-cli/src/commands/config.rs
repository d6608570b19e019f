//! Config command implementation.
//!
//! Views the merged configuration and edits the global or directory
//! configuration file.

use crate::error::CliError;
use crate::utils::{load_configuration, print_json, GlobalOptions};
use clap::{Args, Subcommand};
use std::env;
use std::fs;
use std::path::PathBuf;
use symkeep::config::loader::DIRECTORY_CONFIG_FILE;
use symkeep::config::{ConfigLoader, ConfigValidator};
use symkeep::Config;

/// View or change configuration files.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the merged configuration
    View(ViewArgs),

    /// Set a key in a configuration file
    Set(SetArgs),

    /// Delete a configuration file
    Reset(FileArgs),
}

/// Options for `config view`.
#[derive(Args)]
pub struct ViewArgs {
    /// List the files that contributed, in precedence order
    #[arg(long)]
    pub sources: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Which configuration file to edit.
#[derive(Args)]
pub struct FileArgs {
    /// Edit the directory file (.symkeep.yaml) instead of the global one
    #[arg(long)]
    pub directory: bool,
}

/// Options for `config set`.
#[derive(Args)]
pub struct SetArgs {
    /// Configuration key
    #[arg(value_name = "KEY")]
    pub key: String,

    /// New value
    #[arg(value_name = "VALUE")]
    pub value: String,

    #[command(flatten)]
    pub file: FileArgs,
}

impl ConfigCommand {
    /// Execute the config command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        match self {
            Self::View(args) => view(&args, global),
            Self::Set(args) => set(&args, global),
            Self::Reset(args) => reset(&args, global),
        }
    }
}

impl FileArgs {
    /// The file to edit. The directory file is the nearest existing one,
    /// or a new one in the current directory.
    fn path(&self, global: &GlobalOptions) -> Result<PathBuf, CliError> {
        if !self.directory {
            return Ok(ConfigLoader::global_config_path(global.data_dir.as_deref())?);
        }
        let cwd = env::current_dir()?;
        Ok(ConfigLoader::discover_directory_config(&cwd)?
            .map_or_else(|| cwd.join(DIRECTORY_CONFIG_FILE), |source| source.path))
    }
}

fn view(args: &ViewArgs, global: &GlobalOptions) -> Result<(), CliError> {
    let config = load_configuration(global, Config::default())?;

    if args.sources && !global.quiet {
        let cwd = env::current_dir()?;
        for source in ConfigLoader::load_all(&cwd, global.data_dir.as_deref())? {
            eprintln!("# {} (precedence {})", source.path.display(), source.precedence);
        }
    }

    if args.json {
        return print_json(&config);
    }
    if config.is_empty() {
        if !global.quiet {
            eprintln!("No configuration set; built-in defaults apply");
        }
        return Ok(());
    }
    let yaml = serde_yaml::to_string(&config)
        .map_err(|e| CliError::Config(format!("Failed to serialize config: {e}")))?;
    print!("{yaml}");
    Ok(())
}

fn set(args: &SetArgs, global: &GlobalOptions) -> Result<(), CliError> {
    let path = args.file.path(global)?;
    let mut config = if path.exists() {
        ConfigLoader::load_file(&path).map_err(|e| CliError::Config(e.to_string()))?
    } else {
        Config::default()
    };

    config
        .set_key(&args.key, &args.value)
        .map_err(|e| CliError::InvalidArguments(e.to_string()))?;
    ConfigValidator::validate(&config).map_err(|e| CliError::InvalidArguments(e.to_string()))?;
    ConfigLoader::save_file(&path, &config)?;

    if !global.quiet {
        eprintln!("Set {} = {} in {}", args.key, args.value, path.display());
    }
    Ok(())
}

fn reset(args: &FileArgs, global: &GlobalOptions) -> Result<(), CliError> {
    let path = args.path(global)?;
    if path.exists() {
        fs::remove_file(&path)?;
        if !global.quiet {
            eprintln!("Removed {}", path.display());
        }
    } else if !global.quiet {
        eprintln!("No configuration file at {}", path.display());
    }
    Ok(())
}
