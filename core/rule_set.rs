use crate::pattern::{Pattern, Skip};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Default name of the per-directory ignore file.
pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// Outcome of matching one path against one rule file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Included,
    Excluded,
    Unspecified,
}

/// The compiled contents of a single ignore file, in file order, together
/// with the directory the file was found in.
#[derive(Debug, Clone)]
pub struct RuleSet {
    base: PathBuf,
    patterns: Vec<Pattern>,
}

impl RuleSet {
    pub fn empty(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            patterns: Vec::new(),
        }
    }

    /// Reads `<directory>/<file_name>`. A missing file yields an empty set; an
    /// unreadable one is logged and also yields an empty set.
    pub fn load(directory: &Path, file_name: &str) -> Self {
        let path = directory.join(file_name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Self::empty(directory),
            Err(e) => {
                log::warn!(
                    "Could not read ignore file {}: {}. Continuing without it.",
                    path.display(),
                    e
                );
                return Self::empty(directory);
            }
        };
        let content = String::from_utf8_lossy(&bytes);
        let rule_set = Self::from_lines(directory, content.lines());
        log::debug!(
            "Loaded {} rule(s) from {}",
            rule_set.len(),
            path.display()
        );
        rule_set
    }

    /// Compiles rule lines relative to `base`. Lines that fail to compile are
    /// skipped with a warning; the rest are kept in order.
    pub fn from_lines<I, S>(base: impl Into<PathBuf>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let base = base.into();
        let mut patterns = Vec::new();
        for (index, line) in lines.into_iter().enumerate() {
            match Pattern::compile(line.as_ref()) {
                Ok(pattern) => patterns.push(pattern),
                Err(Skip::Blank) | Err(Skip::Comment) => {}
                Err(Skip::Malformed(reason)) => {
                    log::warn!(
                        "Skipping malformed ignore rule on line {} under {}: {}",
                        index + 1,
                        base.display(),
                        reason
                    );
                }
            }
        }
        Self { base, patterns }
    }

    /// Resolves a path relative to [`RuleSet::base`] against this file alone.
    ///
    /// Patterns are scanned first to last and the last one that matches wins.
    /// An ignoring pattern also matches a path when it matches one of the
    /// path's parent directories, so `build/` covers everything below `build`.
    /// Negated patterns only ever test the path itself.
    pub fn decide(&self, relative_path: &Path, is_dir: bool) -> Decision {
        let ancestors: Vec<&Path> = relative_path
            .ancestors()
            .skip(1)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();

        let mut decision = Decision::Unspecified;
        for pattern in &self.patterns {
            let through_ancestor = !pattern.is_negated()
                && ancestors.iter().any(|dir| pattern.matches(dir, true));
            let hit = through_ancestor || pattern.matches(relative_path, is_dir);
            if hit {
                decision = if pattern.is_negated() {
                    Decision::Included
                } else {
                    Decision::Excluded
                };
            }
        }
        decision
    }

    /// True when the last matching rule is a positive one. Used for pattern
    /// lists that select paths rather than ignore them.
    pub fn selects(&self, relative_path: &Path, is_dir: bool) -> bool {
        self.decide(relative_path, is_dir) == Decision::Excluded
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn rules(lines: &[&str]) -> RuleSet {
        RuleSet::from_lines("/proj", lines.iter().copied())
    }

    #[test]
    fn last_match_wins() {
        let set = rules(&["*.log", "!keep.log"]);
        assert_eq!(set.decide(Path::new("a.log"), false), Decision::Excluded);
        assert_eq!(set.decide(Path::new("keep.log"), false), Decision::Included);
        assert_eq!(set.decide(Path::new("b.txt"), false), Decision::Unspecified);

        let set = rules(&["!keep.log", "*.log"]);
        assert_eq!(set.decide(Path::new("keep.log"), false), Decision::Excluded);
    }

    #[test]
    fn negation_inside_excluded_directory() {
        let set = rules(&["build/", "!build/keep.txt"]);
        assert_eq!(set.decide(Path::new("build"), true), Decision::Excluded);
        assert_eq!(
            set.decide(Path::new("build/keep.txt"), false),
            Decision::Included
        );
        assert_eq!(
            set.decide(Path::new("build/other.txt"), false),
            Decision::Excluded
        );
    }

    #[test]
    fn directory_pattern_covers_descendants() {
        let set = rules(&["node_modules/"]);
        assert_eq!(
            set.decide(Path::new("web/node_modules/pkg/index.js"), false),
            Decision::Excluded
        );
        // A file named like the directory pattern is not affected.
        assert_eq!(
            set.decide(Path::new("node_modules"), false),
            Decision::Unspecified
        );
    }

    #[test]
    fn whitelist_negation_does_not_reach_through_directories() {
        let set = rules(&["*", "!*/", "!*.rs"]);
        assert_eq!(set.decide(Path::new("src"), true), Decision::Included);
        assert_eq!(set.decide(Path::new("src/main.rs"), false), Decision::Included);
        assert_eq!(
            set.decide(Path::new("src/readme.md"), false),
            Decision::Excluded
        );
        assert_eq!(set.decide(Path::new("Cargo.lock"), false), Decision::Excluded);
    }

    #[test]
    fn malformed_lines_do_not_abort_loading() {
        let set = rules(&["# comment", "", "[broken", "*.tmp", "!"]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.patterns()[0].raw(), "*.tmp");
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let set = RuleSet::load(dir.path(), IGNORE_FILE_NAME);
        assert!(set.is_empty());
        assert_eq!(set.base(), dir.path());
    }

    #[test]
    fn load_reads_rules_in_file_order() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(IGNORE_FILE_NAME),
            "# generated\n*.log\n\n!keep.log\r\ntarget/\n",
        )
        .unwrap();
        let set = RuleSet::load(dir.path(), IGNORE_FILE_NAME);
        let raw: Vec<&str> = set.patterns().iter().map(Pattern::raw).collect();
        assert_eq!(raw, vec!["*.log", "!keep.log", "target/"]);
    }
}
