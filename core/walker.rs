//! Lazy, depth-first traversal producing filtered [`Entry`] values.
//!
//! A directory is listed when its own entry is produced, so the entry can carry
//! the summary of its children. Only included, non-capped children are queued;
//! nothing below an excluded directory is ever read.

use crate::config::WalkConfig;
use crate::entry::{ChildSummary, Entry, EntryKind};
use crate::error::{AppError, Result};
use crate::registry::RuleRegistry;
use crate::rule_set::RuleSet;
use std::cmp::Ordering;
use std::ffi::{OsStr, OsString};
use std::fs::{self, DirEntry};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Starts a walk of `root`. Fails before producing anything when the root is
/// missing, is not a directory, or the configuration is invalid.
pub fn walk(root: impl AsRef<Path>, config: WalkConfig) -> Result<Walker> {
    Walker::new(root, config)
}

#[derive(Debug)]
struct Candidate {
    path: PathBuf,
    name: OsString,
    kind: EntryKind,
    symlink: bool,
    depth: usize,
    included: bool,
}

struct Listing {
    children: Vec<Candidate>,
    summary: ChildSummary,
    unreadable: bool,
}

pub struct Walker {
    root: PathBuf,
    config: WalkConfig,
    registry: RuleRegistry,
    include_filter: Option<RuleSet>,
    include_types: Vec<String>,
    stack: Vec<std::vec::IntoIter<Candidate>>,
    started: bool,
    finished: bool,
    yielded: usize,
    entry_limit_reached: bool,
}

impl Walker {
    pub fn new(root: impl AsRef<Path>, config: WalkConfig) -> Result<Self> {
        config.validate()?;
        let root = root.as_ref();

        let metadata = fs::metadata(root).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::RootNotFound(root.to_path_buf()),
            _ => AppError::FileRead {
                path: root.to_path_buf(),
                source: e,
            },
        })?;
        if !metadata.is_dir() {
            return Err(AppError::NotADirectory(root.to_path_buf()));
        }
        let root = fs::canonicalize(root).map_err(|e| AppError::FileRead {
            path: root.to_path_buf(),
            source: e,
        })?;

        let registry = RuleRegistry::new(&root, &config);
        let include_filter = (!config.include_patterns.is_empty())
            .then(|| RuleSet::from_lines(&root, &config.include_patterns));
        let include_types = config
            .include_file_types
            .iter()
            .map(|t| normalize_extension(t))
            .filter(|t| t.len() > 1)
            .collect();

        log::info!("Walking directory: {}", root.display());
        log::debug!("Walk configuration: {:?}", config);

        Ok(Self {
            root,
            config,
            registry,
            include_filter,
            include_types,
            stack: Vec::new(),
            started: false,
            finished: false,
            yielded: 0,
            entry_limit_reached: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// True once the walk stopped early because `max_entries` was reached.
    pub fn entry_limit_reached(&self) -> bool {
        self.entry_limit_reached
    }

    fn root_entry(&mut self) -> Entry {
        let root = self.root.clone();
        let (child_summary, unreadable) = self.expand(&root, 0);
        Entry {
            path: root,
            relative_path: PathBuf::new(),
            kind: EntryKind::Directory,
            depth: 0,
            included: true,
            child_summary,
            unreadable,
            symlink: false,
        }
    }

    fn visit(&mut self, candidate: Candidate) -> Entry {
        let (child_summary, unreadable) = if candidate.included
            && candidate.kind == EntryKind::Directory
            && !candidate.symlink
        {
            self.expand(&candidate.path, candidate.depth)
        } else {
            (None, false)
        };

        let relative_path = candidate
            .path
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| candidate.path.clone());

        Entry {
            path: candidate.path,
            relative_path,
            kind: candidate.kind,
            depth: candidate.depth,
            included: candidate.included,
            child_summary,
            unreadable,
            symlink: candidate.symlink,
        }
    }

    /// Lists a directory and queues its children, unless the depth limit stops
    /// the descent here.
    fn expand(&mut self, dir: &Path, depth: usize) -> (Option<ChildSummary>, bool) {
        if self.config.max_depth.is_some_and(|max| depth >= max) {
            return (None, false);
        }
        let listing = self.list_children(dir, depth);
        if !listing.children.is_empty() {
            self.stack.push(listing.children.into_iter());
        }
        (Some(listing.summary), listing.unreadable)
    }

    fn list_children(&mut self, dir: &Path, depth: usize) -> Listing {
        self.registry.enter_directory(dir, depth);

        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                log::warn!("Cannot read directory {}: {}", dir.display(), e);
                return Listing {
                    children: Vec::new(),
                    summary: ChildSummary::default(),
                    unreadable: true,
                };
            }
        };

        let child_depth = depth + 1;
        let mut summary = ChildSummary::default();
        let mut candidates = Vec::new();

        for item in read_dir {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    log::warn!("Error reading an entry of {}: {}", dir.display(), e);
                    continue;
                }
            };
            let name = item.file_name();
            if !self.config.include_hidden && is_hidden(&name) {
                continue;
            }

            let path = item.path();
            let (kind, symlink) = classify(&item);
            summary.considered += 1;

            let included =
                self.registry
                    .decide_entry(&path, kind == EntryKind::Directory, child_depth);
            if !included {
                summary.excluded += 1;
                if !self.config.emit_excluded {
                    continue;
                }
            }

            if kind == EntryKind::File && !self.file_visible(&path) {
                continue;
            }

            candidates.push(Candidate {
                path,
                name,
                kind,
                symlink,
                depth: child_depth,
                included,
            });
        }

        let files_first = self.config.files_first;
        candidates.sort_by(|a, b| compare_candidates(a, b, files_first));

        let cap = self.config.max_items_per_directory;
        let mut children = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let cap_reached = cap.is_some_and(|max| summary.shown >= max);
            if candidate.included {
                if cap_reached {
                    summary.truncated += 1;
                    continue;
                }
                summary.shown += 1;
            } else if cap_reached {
                continue;
            }
            children.push(candidate);
        }

        log::debug!(
            "Listed {}: {} considered, {} shown, {} excluded, {} truncated",
            dir.display(),
            summary.considered,
            summary.shown,
            summary.excluded,
            summary.truncated
        );

        Listing {
            children,
            summary,
            unreadable: false,
        }
    }

    fn file_visible(&self, path: &Path) -> bool {
        if !self.config.include_files {
            return false;
        }
        if self.include_filter.is_none() && self.include_types.is_empty() {
            return true;
        }
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let by_pattern = self
            .include_filter
            .as_ref()
            .is_some_and(|filter| filter.selects(relative, false));
        by_pattern || matches_file_type(path, &self.include_types)
    }
}

impl Iterator for Walker {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        if !self.started {
            self.started = true;
            return Some(self.root_entry());
        }

        loop {
            let Some(frame) = self.stack.last_mut() else {
                if !self.finished {
                    self.finished = true;
                    log::info!(
                        "Walk of {} finished: {} entries",
                        self.root.display(),
                        self.yielded
                    );
                }
                return None;
            };
            let Some(candidate) = frame.next() else {
                self.stack.pop();
                continue;
            };

            if candidate.included {
                if let Some(limit) = self.config.max_entries {
                    if self.yielded >= limit {
                        log::info!("Entry limit of {} reached; stopping walk", limit);
                        self.entry_limit_reached = true;
                        self.stack.clear();
                        continue;
                    }
                }
                self.yielded += 1;
            }
            return Some(self.visit(candidate));
        }
    }
}

fn is_hidden(name: &OsStr) -> bool {
    name.as_encoded_bytes().first() == Some(&b'.')
}

fn classify(item: &DirEntry) -> (EntryKind, bool) {
    match item.file_type() {
        Ok(file_type) if file_type.is_symlink() => {
            let target_is_dir = fs::metadata(item.path()).is_ok_and(|m| m.is_dir());
            let kind = if target_is_dir {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            (kind, true)
        }
        Ok(file_type) if file_type.is_dir() => (EntryKind::Directory, false),
        Ok(_) => (EntryKind::File, false),
        Err(e) => {
            log::debug!("Cannot determine type of {}: {}", item.path().display(), e);
            (EntryKind::File, false)
        }
    }
}

fn compare_candidates(a: &Candidate, b: &Candidate, files_first: bool) -> Ordering {
    let rank = |c: &Candidate| match (c.kind, files_first) {
        (EntryKind::Directory, false) | (EntryKind::File, true) => 0,
        _ => 1,
    };
    rank(a)
        .cmp(&rank(b))
        .then_with(|| folded_name(&a.name).cmp(&folded_name(&b.name)))
        .then_with(|| a.name.cmp(&b.name))
}

fn folded_name(name: &OsStr) -> String {
    name.to_string_lossy().to_lowercase()
}

fn normalize_extension(file_type: &str) -> String {
    let lower = file_type.trim().to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

fn matches_file_type(path: &Path, normalized_types: &[String]) -> bool {
    let Some(ext) = path.extension() else {
        return false;
    };
    let ext = format!(".{}", ext.to_string_lossy().to_lowercase());
    normalized_types.iter().any(|t| *t == ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_normalization() {
        assert_eq!(normalize_extension("RS"), ".rs");
        assert_eq!(normalize_extension(".Py"), ".py");
        let types = vec![".rs".to_string()];
        assert!(matches_file_type(Path::new("src/MAIN.RS"), &types));
        assert!(!matches_file_type(Path::new("Makefile"), &types));
    }

    #[test]
    fn names_compare_case_insensitively() {
        let candidate = |name: &str| Candidate {
            path: PathBuf::from(name),
            name: OsString::from(name),
            kind: EntryKind::File,
            symlink: false,
            depth: 1,
            included: true,
        };
        let mut names: Vec<Candidate> = ["b.txt", "A.txt", "a.txt", "C.txt"]
            .into_iter()
            .map(candidate)
            .collect();
        names.sort_by(|a, b| compare_candidates(a, b, false));
        let order: Vec<&OsStr> = names.iter().map(|c| c.name.as_os_str()).collect();
        assert_eq!(order, vec!["A.txt", "a.txt", "b.txt", "C.txt"]);
    }

    #[test]
    fn hidden_names() {
        assert!(is_hidden(OsStr::new(".env")));
        assert!(!is_hidden(OsStr::new("app.py")));
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            walk(&missing, WalkConfig::default()),
            Err(AppError::RootNotFound(_))
        ));

        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            walk(&file, WalkConfig::default()),
            Err(AppError::NotADirectory(_))
        ));
    }
}
