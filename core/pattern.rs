//! Compilation and matching of single ignore-file rule lines.
//!
//! A rule line is compiled once into a [`Pattern`]. Wildcard handling is
//! delegated to `globset` with `literal_separator` enabled, so `*` and `?`
//! never cross a `/` while `**` spans whole segments. Backslash escapes are
//! honoured, which makes `\*`, `\!` and `\#` match literally.

use globset::{GlobBuilder, GlobMatcher};
use std::path::{Component, Path};

/// One compiled ignore rule. Immutable once built.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    negated: bool,
    dir_only: bool,
    anchored: bool,
    matcher: GlobMatcher,
}

/// Why a line did not produce a [`Pattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    Blank,
    Comment,
    /// The line had content but could not be compiled.
    Malformed(String),
}

impl Pattern {
    /// Compiles one rule line. Blank lines and comments are skipped; so is
    /// anything `globset` rejects. Leading whitespace is part of the pattern
    /// and trailing whitespace is dropped unless escaped with `\`.
    pub fn compile(line: &str) -> Result<Self, Skip> {
        let trimmed = trim_unescaped_trailing_whitespace(line);
        if trimmed.trim().is_empty() {
            return Err(Skip::Blank);
        }
        if trimmed.starts_with('#') {
            return Err(Skip::Comment);
        }

        let (negated, mut body) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let dir_only = body.ends_with('/') && !body.ends_with("\\/");
        if dir_only {
            body = &body[..body.len() - 1];
        }

        let leading_slash = body.starts_with('/');
        if leading_slash {
            body = &body[1..];
        }

        if body.is_empty() {
            return Err(Skip::Malformed(format!(
                "rule '{}' has no pattern text",
                trimmed
            )));
        }

        // A separator anywhere but the end ties the pattern to the base directory.
        let anchored = leading_slash || body.contains('/');

        let matcher = GlobBuilder::new(body)
            .literal_separator(true)
            .backslash_escape(true)
            .build()
            .map_err(|e| Skip::Malformed(format!("rule '{}': {}", trimmed, e)))?
            .compile_matcher();

        Ok(Self {
            raw: trimmed.to_string(),
            negated,
            dir_only,
            anchored,
            matcher,
        })
    }

    /// Tests a path, relative to the rule file's directory, against this pattern.
    ///
    /// Unanchored patterns are compared with the basename only, so they hit
    /// at any depth below the base.
    pub fn matches(&self, relative_path: &Path, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        if self.anchored {
            let slash_path = to_slash_path(relative_path);
            if slash_path.is_empty() {
                return false;
            }
            self.matcher.is_match(slash_path.as_str())
        } else {
            match relative_path.file_name() {
                Some(name) => self.matcher.is_match(Path::new(name)),
                None => false,
            }
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn is_dir_only(&self) -> bool {
        self.dir_only
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }
}

fn trim_unescaped_trailing_whitespace(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut end = bytes.len();
    while end > 0 && matches!(bytes[end - 1], b' ' | b'\t' | b'\r') {
        let backslashes = bytes[..end - 1]
            .iter()
            .rev()
            .take_while(|&&b| b == b'\\')
            .count();
        if backslashes % 2 == 1 {
            break;
        }
        end -= 1;
    }
    &line[..end]
}

/// Joins the normal components of a relative path with `/`, independent of
/// the platform separator.
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
