//! Merges the ignore files discovered during a walk into one decision.
//!
//! Rule files are loaded lazily, the first time the walker enters their
//! directory, and only up to the configured discovery depth. For a given path
//! the rule files on its ancestor chain are consulted nearest first; the first
//! one with an opinion settles the outcome and a path nobody mentions is
//! included.
//!
//! The user-supplied extra pattern list is a separate layer, rooted at the walk
//! root and limited by `ignore_depth_limit`. It is evaluated after the ignore
//! files and can only exclude: a path the discovered files include (or do not
//! mention) is still excluded when the extra list selects it.

use crate::config::WalkConfig;
use crate::rule_set::{Decision, RuleSet};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub struct RuleRegistry {
    root: PathBuf,
    ignore_file_name: String,
    enabled: bool,
    discovery_depth: Option<usize>,
    rule_sets: HashMap<PathBuf, RuleSet>,
    visited: HashSet<PathBuf>,
    extra: Option<RuleSet>,
    extra_depth_limit: Option<usize>,
}

impl RuleRegistry {
    pub fn new(root: &Path, config: &WalkConfig) -> Self {
        let extra = (!config.extra_ignore_patterns.is_empty())
            .then(|| RuleSet::from_lines(root, &config.extra_ignore_patterns));

        Self {
            root: root.to_path_buf(),
            ignore_file_name: config.ignore_file_name.clone(),
            enabled: config.gitignore_enabled,
            discovery_depth: config.gitignore_discovery_depth,
            rule_sets: HashMap::new(),
            visited: HashSet::new(),
            extra,
            extra_depth_limit: config.ignore_depth_limit,
        }
    }

    /// Loads the ignore file of `dir` (at `depth` below the root) if discovery
    /// is enabled and reaches that far. Each directory is read at most once.
    pub fn enter_directory(&mut self, dir: &Path, depth: usize) {
        if !self.enabled || !self.visited.insert(dir.to_path_buf()) {
            return;
        }
        if self.discovery_depth.is_some_and(|max| depth > max) {
            log::trace!(
                "Not reading ignore file in {} (depth {} beyond discovery depth)",
                dir.display(),
                depth
            );
            return;
        }
        let rule_set = RuleSet::load(dir, &self.ignore_file_name);
        if !rule_set.is_empty() {
            self.rule_sets.insert(dir.to_path_buf(), rule_set);
        }
    }

    /// Full resolution of an arbitrary path under the root: every ancestor
    /// directory is loaded and checked first, so a child of an excluded
    /// directory is never re-included.
    pub fn resolve(&mut self, path: &Path, is_dir: bool, depth: usize) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            log::debug!("{} is outside the walk root; treating as included", path.display());
            return true;
        };

        let mut dir = self.root.clone();
        self.enter_directory(&dir, 0);
        let components: Vec<_> = relative.components().collect();
        let parent_count = components.len().saturating_sub(1);
        for (index, component) in components.iter().take(parent_count).enumerate() {
            dir.push(component);
            let dir_depth = index + 1;
            if !self.decide_entry(&dir, true, dir_depth) {
                log::trace!(
                    "{} excluded through ancestor {}",
                    path.display(),
                    dir.display()
                );
                return false;
            }
            self.enter_directory(&dir, dir_depth);
        }

        self.decide_entry(path, is_dir, depth)
    }

    /// Resolves a path whose parent is known to be included and whose
    /// ancestors' ignore files have already been entered.
    pub(crate) fn decide_entry(&self, path: &Path, is_dir: bool, depth: usize) -> bool {
        let relative_to_root = path.strip_prefix(&self.root).unwrap_or(path);

        let mut outcome = Decision::Unspecified;
        if self.enabled {
            for dir in path.ancestors().skip(1) {
                if let Some(rule_set) = self.rule_sets.get(dir) {
                    let relative = path.strip_prefix(dir).unwrap_or(path);
                    let decision = rule_set.decide(relative, is_dir);
                    if decision != Decision::Unspecified {
                        log::trace!(
                            "{} -> {:?} by rules in {}",
                            relative_to_root.display(),
                            decision,
                            dir.display()
                        );
                        outcome = decision;
                        break;
                    }
                }
                if dir == self.root {
                    break;
                }
            }
        }

        if outcome == Decision::Excluded {
            return false;
        }

        if let Some(extra) = &self.extra {
            let within_limit = self.extra_depth_limit.is_none_or(|limit| depth <= limit);
            if within_limit && extra.selects(relative_to_root, is_dir) {
                log::trace!(
                    "{} excluded by extra ignore patterns",
                    relative_to_root.display()
                );
                return false;
            }
        }

        true
    }

    /// Rule files loaded so far, ordered by directory.
    pub fn loaded_rule_sets(&self) -> Vec<&RuleSet> {
        let mut sets: Vec<&RuleSet> = self.rule_sets.values().collect();
        sets.sort_by(|a, b| a.base().cmp(b.base()));
        sets
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn config() -> WalkConfig {
        WalkConfig::unbounded()
    }

    #[test]
    fn deeper_rules_override_shallower_ones() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, ".gitignore", "*.log\n");
        write(root, "sub/.gitignore", "!debug.log\n");

        let mut registry = RuleRegistry::new(root, &config());
        assert!(!registry.resolve(&root.join("a.log"), false, 1));
        assert!(registry.resolve(&root.join("sub/debug.log"), false, 2));
        assert!(!registry.resolve(&root.join("sub/other.log"), false, 2));
    }

    #[test]
    fn cannot_reinclude_inside_excluded_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, ".gitignore", "build/\n!build/keep.txt\n");
        write(root, "build/keep.txt", "");

        let mut registry = RuleRegistry::new(root, &config());
        assert!(!registry.resolve(&root.join("build"), true, 1));
        assert!(!registry.resolve(&root.join("build/keep.txt"), false, 2));
    }

    #[test]
    fn explicitly_reincluded_directory_allows_children() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, ".gitignore", "out*/\n!out-keep/\n");
        write(root, "out-keep/a.txt", "");

        let mut registry = RuleRegistry::new(root, &config());
        assert!(!registry.resolve(&root.join("out-tmp"), true, 1));
        assert!(registry.resolve(&root.join("out-keep"), true, 1));
        assert!(registry.resolve(&root.join("out-keep/a.txt"), false, 2));
    }

    #[test]
    fn discovery_depth_bounds_loading() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "a/b/.gitignore", "*.txt\n");
        write(root, "a/b/x.txt", "");

        let mut shallow = RuleRegistry::new(
            root,
            &WalkConfig {
                gitignore_discovery_depth: Some(0),
                ..config()
            },
        );
        assert!(shallow.resolve(&root.join("a/b/x.txt"), false, 3));
        assert!(shallow.loaded_rule_sets().is_empty());

        let mut deep = RuleRegistry::new(root, &config());
        assert!(!deep.resolve(&root.join("a/b/x.txt"), false, 3));
        assert_eq!(deep.loaded_rule_sets().len(), 1);
    }

    #[test]
    fn disabled_registry_includes_everything_but_extra_patterns() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, ".gitignore", "*\n");

        let mut registry = RuleRegistry::new(
            root,
            &WalkConfig {
                gitignore_enabled: false,
                extra_ignore_patterns: vec!["*.bak".to_string()],
                ..config()
            },
        );
        assert!(registry.resolve(&root.join("main.rs"), false, 1));
        assert!(!registry.resolve(&root.join("main.rs.bak"), false, 1));
        assert!(registry.loaded_rule_sets().is_empty());
    }

    #[test]
    fn extra_patterns_respect_depth_limit() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut registry = RuleRegistry::new(
            root,
            &WalkConfig {
                extra_ignore_patterns: vec!["*.tmp".to_string()],
                ignore_depth_limit: Some(1),
                ..config()
            },
        );
        assert!(!registry.resolve(&root.join("a.tmp"), false, 1));
        assert!(registry.resolve(&root.join("sub/a.tmp"), false, 2));
    }

    #[test]
    fn extra_patterns_win_over_gitignore_negation() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, ".gitignore", "!notes.md\n");
        let mut registry = RuleRegistry::new(
            root,
            &WalkConfig {
                extra_ignore_patterns: vec!["notes.md".to_string()],
                ..config()
            },
        );
        assert!(!registry.resolve(&root.join("notes.md"), false, 1));
    }

    #[test]
    fn include_patterns_do_not_reinclude_ignored_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, ".gitignore", "*.py\n*.log\n");
        let mut registry = RuleRegistry::new(
            root,
            &WalkConfig {
                include_patterns: vec!["*.py".to_string()],
                ..config()
            },
        );
        assert!(!registry.resolve(&root.join("script.py"), false, 1));
        assert!(!registry.resolve(&root.join("error.log"), false, 1));
        assert!(registry.resolve(&root.join("main.rs"), false, 1));
    }
}
