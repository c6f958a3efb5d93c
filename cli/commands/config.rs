use crate::cli_args::ConfigArgs;
use crate::output::{print_saved, write_to_stdout};
use anyhow::{Context, Result};
use gitree_core::Config;
use std::path::PathBuf;

pub fn handle_config_command(args: &ConfigArgs, quiet: bool) -> Result<()> {
    let project_root = args.path.clone().unwrap_or_else(|| PathBuf::from("."));

    if !args.init {
        let content = Config::default()
            .to_toml_string()
            .context("Failed to serialize default configuration")?;
        return write_to_stdout(&content);
    }

    let path = Config::default_path(&project_root);
    Config::write_default(&path, args.force)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    print_saved("Default config", &path, quiet);
    Ok(())
}
