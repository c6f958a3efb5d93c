mod cli_args;
mod commands;
mod interactive;
mod output;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use std::path::{Path, PathBuf};
use std::process;

use cli_args::{Cli, Commands, ListingOpts};
use gitree_core::{AppError, Config, WalkConfig};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    let quiet = cli_args.quiet;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args, quiet) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let core_err = e.downcast_ref::<AppError>();
            let exit_code = match core_err {
                Some(AppError::Config(_)) => 1,
                Some(AppError::TomlParse(_)) => 1,
                Some(AppError::TomlSerialize(_)) => 1,
                Some(AppError::Io(_)) => 2,
                Some(AppError::FileRead { .. }) => 2,
                Some(AppError::FileWrite { .. }) => 2,
                Some(AppError::DirCreation { .. }) => 2,
                Some(AppError::RootNotFound(_)) => 2,
                Some(AppError::NotADirectory(_)) => 2,
                Some(AppError::Glob(_)) => 2,
                Some(AppError::InvalidArgument(_)) => 5,
                Some(AppError::JsonSerialize(_)) => 6,
                Some(AppError::YamlError(_)) => 6,
                Some(AppError::Archive(_)) => 7,
                Some(_) => 1,
                None => 1,
            };

            // Config and argument errors are always shown, even when quiet.
            if !quiet || exit_code == 1 || exit_code == 5 {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }

            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: Cli, quiet: bool) -> Result<()> {
    match cli.command {
        None => {
            Cli::command().print_help()?;
        }
        Some(command) => match command {
            Commands::Tree(args) => {
                log::debug!("Executing 'tree' command...");
                commands::tree::handle_tree_command(args, quiet)?;
            }
            Commands::Zip(args) => {
                log::debug!("Executing 'zip' command...");
                commands::zip::handle_zip_command(args, quiet)?;
            }
            Commands::Debug(args) => {
                log::debug!("Executing 'debug' command...");
                commands::debug::handle_debug_command(args)?;
            }
            Commands::Config(args) => {
                log::debug!("Executing 'config' command...");
                commands::config::handle_config_command(&args, quiet)?;
            }
            Commands::Completion(args) => {
                log::debug!("Executing 'completion' command...");
                commands::completion::handle_completion_command(&args, quiet)?;
            }
        },
    }
    Ok(())
}

/// Roots given on the command line, or the current directory.
pub fn roots_or_cwd(paths: &[PathBuf]) -> Vec<PathBuf> {
    if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths.to_vec()
    }
}

/// Loads the config file for `root` (honoring `--config` / `--no-config`) and
/// layers the listing flags on top of it.
pub fn load_config_for_command(root: &Path, listing: &ListingOpts) -> Result<Config> {
    let config_path = Config::resolve_config_path(
        root,
        listing.project_config.config.as_ref(),
        listing.project_config.no_config,
    )
    .context("Failed to resolve configuration path")?;

    let config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    Ok(merge_config_with_cli_overrides(config, listing))
}

fn merge_config_with_cli_overrides(mut config: Config, args: &ListingOpts) -> Config {
    log::trace!("Applying listing CLI overrides to config...");
    let listing = &mut config.listing;

    if let Some(depth) = args.max_depth {
        listing.max_depth = depth;
        listing.unbounded_depth = false;
    }
    if args.unbounded_depth {
        listing.unbounded_depth = true;
    }
    if let Some(depth) = args.gitignore_depth {
        listing.gitignore_depth = depth;
    }
    if let Some(depth) = args.exclude_depth {
        listing.exclude_depth = depth;
    }
    if let Some(items) = args.max_items {
        listing.max_items = items;
        listing.no_limit = false;
    }
    if args.no_limit {
        listing.no_limit = true;
    }
    if let Some(entries) = args.max_entries {
        listing.max_entries = entries;
        listing.no_max_entries = false;
    }
    if args.no_max_entries {
        listing.no_max_entries = true;
    }
    if args.hidden_items {
        listing.hidden_items = true;
    }
    if args.no_files {
        listing.no_files = true;
    }
    if args.files_first {
        listing.files_first = true;
    }
    if args.no_gitignore {
        listing.no_gitignore = true;
    }
    listing.exclude.extend(args.exclude.iter().cloned());
    listing.include.extend(args.include.iter().cloned());
    listing
        .include_file_types
        .extend(args.include_file_types.iter().cloned());

    log::trace!("Config after CLI overrides: {:?}", config);
    config
}

/// Resolves the effective walk configuration for one root.
pub fn walk_config_for(root: &Path, listing: &ListingOpts) -> Result<(Config, WalkConfig)> {
    let config = load_config_for_command(root, listing)?;
    let walk_config = config
        .to_walk_config()
        .context("Invalid listing configuration")?;
    Ok((config, walk_config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_file_values() {
        let config = Config::from_toml_str(
            "[listing]\nmax_depth = 2\nno_limit = true\nexclude = [\"*.tmp\"]\n",
        )
        .unwrap();
        let args = ListingOpts {
            max_depth: Some(7),
            max_items: Some(3),
            exclude: vec!["*.bak".to_string()],
            ..ListingOpts::default()
        };
        let merged = merge_config_with_cli_overrides(config, &args);
        assert_eq!(merged.listing.max_depth, 7);
        assert_eq!(merged.listing.max_items, 3);
        assert!(!merged.listing.no_limit);
        assert_eq!(merged.listing.exclude, vec!["*.tmp", "*.bak"]);
    }

    #[test]
    fn unset_flags_keep_file_values() {
        let config = Config::from_toml_str("[listing]\nhidden_items = true\n").unwrap();
        let merged = merge_config_with_cli_overrides(config, &ListingOpts::default());
        assert!(merged.listing.hidden_items);
        assert_eq!(merged.listing.max_depth, 5);
    }
}
