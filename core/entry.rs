use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// Counts describing what happened to a directory's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildSummary {
    /// Children that survived the hidden-entry check and were resolved against
    /// the ignore rules.
    pub considered: usize,
    /// Children yielded as included entries.
    pub shown: usize,
    /// Children removed by ignore rules.
    pub excluded: usize,
    /// Included children dropped by the per-directory cap.
    pub truncated: usize,
}

/// One node of a filtered traversal. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub kind: EntryKind,
    pub depth: usize,
    pub included: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_summary: Option<ChildSummary>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unreadable: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub symlink: bool,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Final path component, or the full path for a filesystem root.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Whether this directory was listed and turned out to hold nothing worth
    /// showing. `None` when the directory was never listed (depth limit,
    /// symlink) or the entry is a file.
    pub fn is_empty_dir(&self) -> Option<bool> {
        self.child_summary.map(|s| s.shown == 0 && s.truncated == 0)
    }

    pub fn truncated_children(&self) -> usize {
        self.child_summary.map_or(0, |s| s.truncated)
    }

    pub fn is_under(&self, dir: &Path) -> bool {
        self.path != dir && self.path.starts_with(dir)
    }
}
