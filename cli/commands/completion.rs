use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use colored::*;
use gitree_core::AppError;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::cli_args::{Cli, CompletionArgs};

fn parse_shell(name: &str) -> Result<Shell> {
    match name.to_lowercase().as_str() {
        "fish" => Ok(Shell::Fish),
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        other => Err(AppError::InvalidArgument(format!(
            "Unsupported shell for completion: {}",
            other
        ))
        .into()),
    }
}

/// Where each shell picks up user completion scripts.
fn default_save_path(shell: Shell, bin_name: &str) -> Result<PathBuf> {
    let (dir, filename) = match shell {
        Shell::Fish => (
            dirs::config_dir().map(|p| p.join("fish").join("completions")),
            format!("{}.fish", bin_name),
        ),
        Shell::Bash => (
            dirs::data_local_dir().map(|p| p.join("bash-completion").join("completions")),
            bin_name.to_string(),
        ),
        Shell::Zsh => (
            dirs::data_local_dir().map(|p| p.join("zsh").join("site-functions")),
            format!("_{}", bin_name),
        ),
        other => {
            return Err(AppError::InvalidArgument(format!(
                "Default save location not known for shell: {}",
                other
            ))
            .into());
        }
    };
    let dir = dir.ok_or_else(|| anyhow::anyhow!("Could not determine standard completion directory."))?;
    Ok(dir.join(filename))
}

fn confirm_overwrite(path: &std::path::Path) -> Result<bool> {
    print!(
        "{} Completion file already exists at '{}'. Overwrite? [{}/{}] ",
        "⚠️".yellow(),
        path.display().to_string().cyan(),
        "y".green(),
        "N".red()
    );
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut response = String::new();
    io::stdin()
        .read_line(&mut response)
        .context("Failed to read user input")?;
    Ok(response.trim().eq_ignore_ascii_case("y"))
}

pub fn handle_completion_command(args: &CompletionArgs, quiet: bool) -> Result<()> {
    let shell_name = args.shell.as_deref().unwrap_or("fish");
    let shell = parse_shell(shell_name)?;

    let mut command = Cli::command();
    let bin_name = command.get_name().to_string();

    if !args.save {
        generate(shell, &mut command, bin_name, &mut io::stdout());
        return Ok(());
    }

    let save_path = default_save_path(shell, &bin_name)?;
    if save_path.exists() {
        if quiet {
            anyhow::bail!(
                "Target file '{}' exists. Overwrite prevented in quiet mode.",
                save_path.display()
            );
        }
        if !confirm_overwrite(&save_path)? {
            println!("Save cancelled.");
            return Ok(());
        }
    }

    if let Some(dir) = save_path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    let mut file = File::create(&save_path)
        .with_context(|| format!("Failed to create file {}", save_path.display()))?;
    generate(shell, &mut command, bin_name, &mut file);

    if !quiet {
        println!(
            "{} {} completions saved to: {}",
            "✅".green(),
            shell_name.cyan(),
            save_path.display().to_string().blue()
        );
    }
    Ok(())
}
