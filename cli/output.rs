use anyhow::{Context, Result};
use colored::*;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL};
use gitree_core::DirectorySummary;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

const CONNECTOR_END: &str = "── ";

/// Prints a rendered text tree, colouring directory names and marker lines.
pub fn print_tree(rendered: &str) -> Result<()> {
    let mut colored_out = String::with_capacity(rendered.len());
    for (index, line) in rendered.lines().enumerate() {
        if index == 0 {
            colored_out.push_str(&line.bold().to_string());
        } else {
            colored_out.push_str(&colorize_tree_line(line));
        }
        colored_out.push('\n');
    }
    write_to_stdout(&colored_out)
}

fn colorize_tree_line(line: &str) -> String {
    let Some(split) = line.rfind(CONNECTOR_END).map(|i| i + CONNECTOR_END.len()) else {
        return line.to_string();
    };
    let (prefix, label) = line.split_at(split);
    let label = if label.starts_with("... and ") || label.starts_with('[') {
        label.dimmed()
    } else if label.ends_with('/') {
        label.blue().bold()
    } else {
        label.normal()
    };
    format!("{}{}", prefix.dimmed(), label)
}

pub fn print_root_header(root: &Path) {
    println!("{}", format!("==> {} <==", root.display()).green().bold());
}

pub fn print_summary_table(summary: &DirectorySummary) {
    if summary.is_empty() {
        println!("{}", "(Nothing listed)".dimmed());
        return;
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Level").fg(Color::Green),
        Cell::new("Dirs").fg(Color::Green),
        Cell::new("Files").fg(Color::Green),
    ]);
    for (depth, counts) in summary.levels() {
        table.add_row(vec![
            Cell::new(format!("Level {}", depth)).fg(Color::Cyan),
            Cell::new(counts.dirs).set_alignment(CellAlignment::Right),
            Cell::new(counts.files).set_alignment(CellAlignment::Right),
        ]);
    }
    let total = summary.total();
    table.add_row(vec![
        Cell::new("Total").fg(Color::Yellow),
        Cell::new(total.dirs).set_alignment(CellAlignment::Right),
        Cell::new(total.files).set_alignment(CellAlignment::Right),
    ]);
    println!("{table}");
}

pub fn print_saved(what: &str, path: &Path, quiet: bool) {
    if !quiet {
        println!(
            "{} {} saved to: {}",
            "✅".green(),
            what,
            path.display().to_string().blue()
        );
    }
}

pub fn write_to_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut file =
        File::create(path).with_context(|| format!("Failed to create file {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to file {}", path.display()))?;
    Ok(())
}

pub fn write_to_stdout(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    if !content.ends_with('\n') {
        handle
            .write_all(b"\n")
            .context("Failed to write newline to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}
