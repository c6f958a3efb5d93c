//! Line-based picker over a materialized walk.

use anyhow::{Context, Result};
use colored::*;
use gitree_core::{Entry, SelectionState};
use std::io::{BufRead, Write};
use std::path::PathBuf;

enum Command {
    Accept,
    SelectAll,
    SelectNone,
    Toggle(Vec<usize>),
}

fn parse_command(line: &str, count: usize) -> std::result::Result<Command, String> {
    let line = line.trim();
    match line {
        "" | "q" => return Ok(Command::Accept),
        "a" => return Ok(Command::SelectAll),
        "n" => return Ok(Command::SelectNone),
        _ => {}
    }

    let mut indices = Vec::new();
    for token in line.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        let (start, end) = match token.split_once('-') {
            Some((a, b)) => (parse_index(a, count)?, parse_index(b, count)?),
            None => {
                let i = parse_index(token, count)?;
                (i, i)
            }
        };
        if start > end {
            return Err(format!("Range '{}' is reversed", token));
        }
        indices.extend(start..=end);
    }
    Ok(Command::Toggle(indices))
}

fn parse_index(token: &str, count: usize) -> std::result::Result<usize, String> {
    let n: usize = token
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", token))?;
    if n == 0 || n > count {
        return Err(format!("{} is out of range (1-{})", n, count));
    }
    Ok(n - 1)
}

fn render_listing(state: &SelectionState, items: &[Entry], out: &mut impl Write) -> Result<()> {
    for (index, entry) in items.iter().enumerate() {
        let mark = if state.is_selected(&entry.path) {
            "[x]".green()
        } else {
            "[ ]".dimmed()
        };
        let indent = "  ".repeat(entry.depth.saturating_sub(1));
        let name = if entry.is_dir() {
            format!("{}/", entry.name()).blue().bold()
        } else {
            entry.name().normal()
        };
        writeln!(out, "{:>4} {} {}{}", index + 1, mark, indent, name)?;
    }
    Ok(())
}

/// Runs the picker until the user accepts. Toggling a directory applies to its
/// whole subtree.
pub fn pick(state: &mut SelectionState, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    let items: Vec<Entry> = state
        .entries()
        .iter()
        .filter(|e| e.included && e.depth > 0)
        .cloned()
        .collect();
    if items.is_empty() {
        writeln!(out, "{}", "(Nothing to select)".dimmed())?;
        return Ok(());
    }

    loop {
        render_listing(state, &items, out)?;
        write!(
            out,
            "{} ",
            "Toggle [1-N, ranges like 2-5], a=all, n=none, Enter=accept:".cyan()
        )?;
        out.flush().context("Failed to flush prompt")?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .context("Failed to read selection input")?;
        if read == 0 {
            return Ok(());
        }

        match parse_command(&line, items.len()) {
            Ok(Command::Accept) => return Ok(()),
            Ok(Command::SelectAll) => state.select_all(),
            Ok(Command::SelectNone) => state.deselect_all(),
            Ok(Command::Toggle(indices)) => {
                for index in indices {
                    let entry = &items[index];
                    let path: PathBuf = entry.path.clone();
                    if entry.is_dir() {
                        let selected = state.is_selected(&path);
                        state.set_subtree(&path, !selected);
                    } else {
                        state.toggle(&path);
                    }
                }
            }
            Err(msg) => writeln!(out, "{} {}", "⚠️".yellow(), msg)?,
        }
    }
}

/// Interactive selection on the terminal. Returns the selected entries plus
/// the directories leading to them.
pub fn select_entries(entries: Vec<Entry>) -> Result<Vec<Entry>> {
    let mut state = SelectionState::new(entries);
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut stdout = std::io::stdout();
    pick(&mut state, &mut input, &mut stdout)?;
    log::debug!("{} file(s) selected", state.selected_files().len());
    Ok(state.materialize())
}
