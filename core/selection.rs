//! Toggle overlay over an already materialized walk.
//!
//! Selection is a pure post-filter: it never touches the rule registry and
//! never walks the filesystem again.

use crate::entry::Entry;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SelectionState {
    entries: Vec<Entry>,
    deselected: HashSet<PathBuf>,
}

impl SelectionState {
    /// Takes ownership of a fully materialized entry sequence. Everything
    /// starts selected.
    pub fn new(entries: impl IntoIterator<Item = Entry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            deselected: HashSet::new(),
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Flips the selection of one entry. Unknown paths are ignored.
    pub fn toggle(&mut self, entry_path: &Path) {
        if !self.entries.iter().any(|e| e.path == entry_path) {
            log::debug!("Ignoring toggle of unknown path {}", entry_path.display());
            return;
        }
        if !self.deselected.remove(entry_path) {
            self.deselected.insert(entry_path.to_path_buf());
        }
    }

    pub fn is_selected(&self, entry_path: &Path) -> bool {
        !self.deselected.contains(entry_path)
    }

    /// Selects or deselects a directory and everything below it.
    pub fn set_subtree(&mut self, dir: &Path, selected: bool) {
        let paths: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|e| e.path == dir || e.is_under(dir))
            .map(|e| e.path.clone())
            .collect();
        for path in paths {
            if selected {
                self.deselected.remove(&path);
            } else {
                self.deselected.insert(path);
            }
        }
    }

    pub fn select_all(&mut self) {
        self.deselected.clear();
    }

    pub fn deselect_all(&mut self) {
        self.deselected = self.entries.iter().map(|e| e.path.clone()).collect();
    }

    /// Selected included files, in walk order.
    pub fn selected_files(&self) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| e.included && e.is_file() && self.is_selected(&e.path))
            .collect()
    }

    /// The entries to hand to a presentation layer: every selected entry plus
    /// the ancestor directories needed to reach it, in the original order.
    pub fn materialize(&self) -> Vec<Entry> {
        let mut keep: HashSet<&Path> = HashSet::new();
        for entry in &self.entries {
            if !self.is_selected(&entry.path) {
                continue;
            }
            keep.insert(entry.path.as_path());
            for ancestor in entry.path.ancestors().skip(1) {
                if !keep.insert(ancestor) {
                    break;
                }
            }
        }
        self.entries
            .iter()
            .filter(|e| keep.contains(e.path.as_path()))
            .cloned()
            .collect()
    }
}
