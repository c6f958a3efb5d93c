use crate::cli_args::DebugArgs;
use crate::walk_config_for;
use anyhow::{Context, Result};
use colored::*;
use gitree_core::{Entry, RuleRegistry, WalkConfig, walk};
use std::path::{Path, PathBuf};

pub fn handle_debug_command(args: DebugArgs) -> Result<()> {
    let root = args.path.clone().unwrap_or_else(|| PathBuf::from("."));
    let (config, walk_config) = walk_config_for(&root, &args.listing)?;
    let walk_config = WalkConfig {
        emit_excluded: true,
        ..walk_config
    };

    let mut walker = walk(&root, walk_config)
        .with_context(|| format!("Failed to start walking {}", root.display()))?;
    let entries: Vec<Entry> = walker.by_ref().collect();
    log::debug!("Debug: {} entries collected.", entries.len());

    println!(
        "{}",
        "\n--- Effective Configuration ---"
            .green()
            .bold()
            .underline()
    );
    let config_toml =
        toml::to_string_pretty(&config).context("Failed to serialize effective config to TOML")?;
    println!("{}", config_toml);
    println!("{} {:?}", "Walk:".bold(), walker.config());

    display_rule_files(walker.registry(), walker.root());
    display_decisions(&entries);

    if walker.entry_limit_reached() {
        println!(
            "\n{}",
            "(Entry limit reached; later entries were not examined)".yellow()
        );
    }
    println!("{}", "\n--- End Debug Info ---".green().bold());
    Ok(())
}

fn display_rule_files(registry: &RuleRegistry, root: &Path) {
    println!("{}", "\n--- Ignore Files Loaded ---".green().bold().underline());
    let rule_sets = registry.loaded_rule_sets();
    if rule_sets.is_empty() {
        println!("{}", "(None)".dimmed());
        return;
    }
    println!("{:<40} {:<10}", "Directory".bold(), "Rules".bold());
    println!("{:-<52}", "");
    for rule_set in rule_sets {
        let dir = pathdiff::diff_paths(rule_set.base(), root)
            .map(|p| p.to_string_lossy().into_owned())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| ".".to_string());
        println!("{:<40} {:<10}", dir.blue(), rule_set.len());
        for pattern in rule_set.patterns() {
            println!("    {}", pattern.raw().dimmed());
        }
    }
}

fn display_decisions(entries: &[Entry]) {
    println!("{}", "\n--- Entries ---".green().bold().underline());
    let mut included = 0usize;
    let mut excluded = 0usize;
    for entry in entries.iter().filter(|e| e.depth > 0) {
        let indent = "  ".repeat(entry.depth - 1);
        let suffix = if entry.is_dir() { "/" } else { "" };
        let label = format!("{}{}{}", indent, entry.name(), suffix);
        if entry.included {
            included += 1;
            let mut notes = Vec::new();
            if let Some(summary) = entry.child_summary {
                if summary.truncated > 0 {
                    notes.push(format!("{} truncated", summary.truncated));
                }
                if summary.excluded > 0 {
                    notes.push(format!("{} excluded", summary.excluded));
                }
            }
            if entry.unreadable {
                notes.push("unreadable".to_string());
            }
            if entry.symlink {
                notes.push("symlink".to_string());
            }
            let notes = if notes.is_empty() {
                "".normal()
            } else {
                format!(" ({})", notes.join(", ")).dimmed()
            };
            println!("{} {}{}", "+".green(), label.cyan(), notes);
        } else {
            excluded += 1;
            println!("{} {}", "-".red(), label.dimmed().strikethrough());
        }
    }
    println!(
        "\n{} {} included, {} excluded",
        "Totals:".bold(),
        included.to_string().green(),
        excluded.to_string().red()
    );
}
