use gitree_core::{ChildSummary, Entry, WalkConfig, walk};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn file(&self, rel: &str, content: &str) -> &Self {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    fn dir(&self, rel: &str) -> &Self {
        fs::create_dir_all(self.root().join(rel)).unwrap();
        self
    }

    fn entries(&self, config: WalkConfig) -> Vec<Entry> {
        walk(self.root(), config).unwrap().collect()
    }

    /// Relative paths of included entries, root omitted.
    fn listed(&self, config: WalkConfig) -> Vec<String> {
        self.entries(config)
            .into_iter()
            .filter(|e| e.included && e.depth > 0)
            .map(|e| rel(&e.relative_path))
            .collect()
    }
}

fn rel(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[test]
fn root_entry_comes_first() {
    let fx = Fixture::new();
    fx.file("a.txt", "");
    let entries = fx.entries(WalkConfig::default());
    assert_eq!(entries[0].depth, 0);
    assert!(entries[0].is_dir());
    assert_eq!(entries[0].relative_path, PathBuf::new());
    assert_eq!(
        entries[0].child_summary,
        Some(ChildSummary {
            considered: 1,
            shown: 1,
            excluded: 0,
            truncated: 0,
        })
    );
}

#[test]
fn last_match_wins_within_one_file() {
    let fx = Fixture::new();
    fx.file(".gitignore", "*.log\n!keep.log\n")
        .file("a.log", "")
        .file("keep.log", "")
        .file("b.txt", "");

    assert_eq!(fx.listed(WalkConfig::default()), vec!["b.txt", "keep.log"]);
}

#[test]
fn excluded_directory_hides_reincluded_child() {
    let fx = Fixture::new();
    fx.file(".gitignore", "build/\n!build/keep.txt\n")
        .file("build/keep.txt", "")
        .file("build/other.txt", "")
        .file("main.rs", "");

    assert_eq!(fx.listed(WalkConfig::default()), vec!["main.rs"]);
}

#[test]
fn nested_ignore_file_overrides_parent() {
    let fx = Fixture::new();
    fx.file(".gitignore", "*.log\n")
        .file("logs/.gitignore", "!important.log\n")
        .file("logs/important.log", "")
        .file("logs/noise.log", "")
        .file("root.log", "");

    assert_eq!(
        fx.listed(WalkConfig::default()),
        vec!["logs", "logs/important.log"]
    );
}

#[test]
fn per_directory_cap_records_truncation() {
    let fx = Fixture::new();
    for name in ["a", "b", "c", "d", "e"] {
        fx.file(&format!("many/{}.txt", name), "");
    }
    let config = WalkConfig {
        max_items_per_directory: Some(2),
        ..WalkConfig::default()
    };
    let entries = fx.entries(config);

    let many = entries.iter().find(|e| e.name() == "many").unwrap();
    let summary = many.child_summary.unwrap();
    assert_eq!(summary.shown, 2);
    assert_eq!(summary.truncated, 3);
    assert_eq!(summary.considered, 5);

    let children: Vec<String> = entries
        .iter()
        .filter(|e| e.depth == 2)
        .map(|e| rel(&e.relative_path))
        .collect();
    assert_eq!(children, vec!["many/a.txt", "many/b.txt"]);
}

#[test]
fn hidden_entries_skipped_by_default() {
    let fx = Fixture::new();
    fx.file(".env", "SECRET=1").file("app.py", "");

    assert_eq!(fx.listed(WalkConfig::default()), vec!["app.py"]);
    let config = WalkConfig {
        include_hidden: true,
        ..WalkConfig::default()
    };
    assert_eq!(fx.listed(config), vec![".env", "app.py"]);
}

#[test]
fn discovery_depth_zero_ignores_deeper_files() {
    let fx = Fixture::new();
    fx.file(".gitignore", "*.tmp\n")
        .file("a/b/.gitignore", "*.txt\n")
        .file("a/b/keep.txt", "")
        .file("a/b/drop.tmp", "");

    let config = WalkConfig {
        gitignore_discovery_depth: Some(0),
        ..WalkConfig::default()
    };
    assert_eq!(fx.listed(config), vec!["a", "a/b", "a/b/keep.txt"]);
    assert_eq!(fx.listed(WalkConfig::default()), vec!["a", "a/b"]);
}

#[test]
fn deeper_max_depth_is_a_superset() {
    let fx = Fixture::new();
    fx.file("top.txt", "")
        .file("a/mid.txt", "")
        .file("a/b/deep.txt", "")
        .file("a/b/c/deeper.txt", "");

    let mut previous: Vec<String> = Vec::new();
    for depth in 0..5 {
        let config = WalkConfig {
            max_depth: Some(depth),
            ..WalkConfig::default()
        };
        let current = fx.listed(config);
        for path in &previous {
            assert!(current.contains(path), "{} missing at depth {}", path, depth);
        }
        previous = current;
    }
    assert_eq!(previous.len(), 7);

    let shallow = fx.entries(WalkConfig {
        max_depth: Some(1),
        ..WalkConfig::default()
    });
    let a = shallow.iter().find(|e| e.name() == "a").unwrap();
    assert_eq!(a.child_summary, None);
}

#[test]
fn repeated_walks_are_identical() {
    let fx = Fixture::new();
    fx.file(".gitignore", "target/\n")
        .file("src/lib.rs", "")
        .file("src/bin/tool.rs", "")
        .file("target/debug/app", "")
        .file("Cargo.toml", "");

    let first = fx.entries(WalkConfig::unbounded());
    let second = fx.entries(WalkConfig::unbounded());
    assert_eq!(first, second);
}

#[test]
fn directories_sort_before_files_unless_files_first() {
    let fx = Fixture::new();
    fx.file("b.txt", "").file("a.txt", "").dir("zdir").dir("adir");

    assert_eq!(
        fx.listed(WalkConfig::default()),
        vec!["adir", "zdir", "a.txt", "b.txt"]
    );
    let config = WalkConfig {
        files_first: true,
        ..WalkConfig::default()
    };
    assert_eq!(fx.listed(config), vec!["a.txt", "b.txt", "adir", "zdir"]);
}

#[test]
fn sibling_names_sort_case_insensitively() {
    let fx = Fixture::new();
    fx.file("b.txt", "")
        .file("Apple.txt", "")
        .file("apricot.txt", "")
        .file("C.txt", "");
    assert_eq!(
        fx.listed(WalkConfig::default()),
        vec!["Apple.txt", "apricot.txt", "b.txt", "C.txt"]
    );
}

#[test]
fn directories_only_listing() {
    let fx = Fixture::new();
    fx.file("src/lib.rs", "").file("README.md", "");
    let config = WalkConfig {
        include_files: false,
        ..WalkConfig::default()
    };
    assert_eq!(fx.listed(config), vec!["src"]);
}

#[test]
fn include_filters_restrict_files() {
    let fx = Fixture::new();
    fx.file(".gitignore", "*.py\n")
        .file("src/app.py", "")
        .file("src/lib.rs", "")
        .file("notes.md", "");

    let by_type = WalkConfig {
        include_file_types: vec!["RS".to_string()],
        ..WalkConfig::default()
    };
    assert_eq!(fx.listed(by_type), vec!["src", "src/lib.rs"]);

    let by_pattern = WalkConfig {
        include_patterns: vec!["*.md".to_string()],
        ..WalkConfig::default()
    };
    assert_eq!(fx.listed(by_pattern), vec!["src", "notes.md"]);

    // Include lists only narrow the output; ignored files stay hidden.
    let ignored_pattern = WalkConfig {
        include_patterns: vec!["*.py".to_string()],
        ..WalkConfig::default()
    };
    assert_eq!(fx.listed(ignored_pattern), vec!["src"]);
}

#[test]
fn extra_patterns_apply_with_gitignore_disabled() {
    let fx = Fixture::new();
    fx.file(".gitignore", "*.txt\n")
        .file("a.txt", "")
        .file("b.bak", "");
    let config = WalkConfig {
        gitignore_enabled: false,
        extra_ignore_patterns: vec!["*.bak".to_string()],
        ..WalkConfig::default()
    };
    assert_eq!(fx.listed(config), vec!["a.txt"]);
}

#[test]
fn entry_limit_stops_the_walk() {
    let fx = Fixture::new();
    for name in ["a", "b", "c", "d"] {
        fx.file(&format!("{}.txt", name), "");
    }
    let config = WalkConfig {
        max_entries: Some(2),
        ..WalkConfig::default()
    };
    let mut walker = walk(fx.root(), config).unwrap();
    let entries: Vec<Entry> = walker.by_ref().collect();
    assert_eq!(entries.len(), 3);
    assert!(walker.entry_limit_reached());
}

#[test]
fn excluded_entries_are_reported_when_requested() {
    let fx = Fixture::new();
    fx.file(".gitignore", "build/\n")
        .file("build/out.o", "")
        .file("main.c", "");
    let config = WalkConfig {
        emit_excluded: true,
        ..WalkConfig::default()
    };
    let entries = fx.entries(config);
    let summary: Vec<(String, bool)> = entries
        .iter()
        .skip(1)
        .map(|e| (rel(&e.relative_path), e.included))
        .collect();
    assert_eq!(
        summary,
        vec![("build".to_string(), false), ("main.c".to_string(), true)]
    );
    assert_eq!(entries[0].child_summary.unwrap().excluded, 1);
}

#[test]
fn empty_directory_is_listed_with_empty_summary() {
    let fx = Fixture::new();
    fx.dir("empty");
    let entries = fx.entries(WalkConfig::default());
    let empty = entries.iter().find(|e| e.name() == "empty").unwrap();
    assert_eq!(empty.is_empty_dir(), Some(true));
}

#[cfg(unix)]
#[test]
fn unreadable_directory_is_flagged() {
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new();
    fx.file("locked/secret.txt", "").file("open.txt", "");
    let locked = fx.root().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&locked).is_ok() {
        // Running with privileges that bypass permission bits.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let entries = fx.entries(WalkConfig::default());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let entry = entries.iter().find(|e| e.name() == "locked").unwrap();
    assert!(entry.unreadable);
    assert_eq!(entry.child_summary, Some(ChildSummary::default()));
    assert!(entries.iter().any(|e| e.name() == "open.txt"));
    assert!(!entries.iter().any(|e| e.name() == "secret.txt"));
}
