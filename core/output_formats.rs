use crate::entry::{Entry, EntryKind};
use crate::error::{AppError, Result};
use byte_unit::{Byte, UnitType};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::Path;

const BRANCH: &str = "├── ";
const LAST: &str = "└── ";
const VERT: &str = "│   ";
const SPACE: &str = "    ";

const FILE_EMOJI: &str = "📄";
const EMPTY_DIR_EMOJI: &str = "📂";
const NORMAL_DIR_EMOJI: &str = "📁";

const BINARY_SNIFF_LEN: u64 = 8 * 1024;
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Txt,
    Json,
    Yaml,
    Markdown,
}

impl ExportFormat {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "md" | "markdown" => Ok(Self::Markdown),
            other => Err(AppError::InvalidArgument(format!(
                "unknown output format '{}' (expected txt, json, yaml or md)",
                other
            ))),
        }
    }

    /// Infers the format from an output file extension; anything unknown is text.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Txt,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub emoji: bool,
    /// Replaces the root entry's name on the first line.
    pub root_label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub include_contents: bool,
    pub max_file_size_bytes: u64,
    /// Extensions (with or without a dot) whose contents are never embedded.
    pub no_contents_for: Vec<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_contents: true,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE,
            no_contents_for: Vec::new(),
        }
    }
}

impl ExportOptions {
    fn wants_contents(&self, path: &Path) -> bool {
        if !self.include_contents {
            return false;
        }
        let Some(ext) = path.extension() else {
            return true;
        };
        let ext = ext.to_string_lossy().to_lowercase();
        !self
            .no_contents_for
            .iter()
            .any(|skip| skip.trim_start_matches('.').to_lowercase() == ext)
    }
}

/// Nested, serializable view of a walk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeData {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeData>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated: Option<usize>,
}

impl TreeData {
    fn from_entry(entry: &Entry, options: &ExportOptions) -> Self {
        let path = if entry.depth == 0 {
            ".".to_string()
        } else {
            crate::pattern::to_slash_path(&entry.relative_path)
        };
        match entry.kind {
            EntryKind::Directory => Self {
                name: entry.name(),
                kind: EntryKind::Directory,
                path,
                children: Some(Vec::new()),
                contents: entry.unreadable.then(|| "[permission denied]".to_string()),
                truncated: Some(entry.truncated_children()).filter(|n| *n > 0),
            },
            EntryKind::File => Self {
                name: entry.name(),
                kind: EntryKind::File,
                path,
                children: None,
                contents: options
                    .wants_contents(&entry.path)
                    .then(|| read_file_contents(&entry.path, options.max_file_size_bytes)),
                truncated: None,
            },
        }
    }

    fn push_child(&mut self, child: TreeData) {
        self.children.get_or_insert_with(Vec::new).push(child);
    }

    /// Files of this subtree in pre-order.
    pub fn files(&self) -> Vec<&TreeData> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a TreeData>) {
        if self.kind == EntryKind::File {
            out.push(self);
        }
        for child in self.children.iter().flatten() {
            child.collect_files(out);
        }
    }
}

/// Renders included entries as a connector tree. `entries` must be in walk
/// order (pre-order, root first).
pub fn render_text_tree(entries: &[Entry], options: &RenderOptions) -> String {
    let visible: Vec<&Entry> = entries.iter().filter(|e| e.included).collect();
    let last_flags = last_sibling_flags(&visible);

    struct Open {
        depth: usize,
        child_prefix: String,
        truncated: usize,
        unreadable: bool,
    }

    fn close(open: Open, out: &mut String) {
        if open.unreadable {
            out.push_str(&format!("{}{}[permission denied]\n", open.child_prefix, LAST));
        } else if open.truncated > 0 {
            out.push_str(&format!(
                "{}{}... and {} more items\n",
                open.child_prefix, LAST, open.truncated
            ));
        }
    }

    let mut out = String::new();
    let mut stack: Vec<Open> = Vec::new();

    for (entry, is_last) in visible.iter().zip(last_flags) {
        while stack.last().is_some_and(|o| o.depth >= entry.depth) {
            if let Some(open) = stack.pop() {
                close(open, &mut out);
            }
        }

        let parent_prefix = stack.last().map(|o| o.child_prefix.clone());
        let Some(parent_prefix) = parent_prefix else {
            let label = options.root_label.clone().unwrap_or_else(|| entry.name());
            out.push_str(&label);
            out.push('\n');
            stack.push(Open {
                depth: entry.depth,
                child_prefix: String::new(),
                truncated: entry.truncated_children(),
                unreadable: entry.unreadable,
            });
            continue;
        };

        let parent_truncates = stack.last().is_some_and(|o| o.truncated > 0 || o.unreadable);
        let is_last = is_last && !parent_truncates;
        let connector = if is_last { LAST } else { BRANCH };

        out.push_str(&parent_prefix);
        out.push_str(connector);
        if options.emoji {
            out.push_str(emoji_for(entry));
            out.push(' ');
        }
        out.push_str(&entry.name());
        if entry.is_dir() {
            out.push('/');
            stack.push(Open {
                depth: entry.depth,
                child_prefix: format!("{}{}", parent_prefix, if is_last { SPACE } else { VERT }),
                truncated: entry.truncated_children(),
                unreadable: entry.unreadable,
            });
        }
        out.push('\n');
    }

    while let Some(open) = stack.pop() {
        close(open, &mut out);
    }
    out
}

fn emoji_for(entry: &Entry) -> &'static str {
    match (entry.kind, entry.is_empty_dir()) {
        (EntryKind::File, _) => FILE_EMOJI,
        (EntryKind::Directory, Some(true)) => EMPTY_DIR_EMOJI,
        (EntryKind::Directory, _) => NORMAL_DIR_EMOJI,
    }
}

/// For each entry, whether no later sibling follows it in the stream.
fn last_sibling_flags(entries: &[&Entry]) -> Vec<bool> {
    let mut flags = vec![false; entries.len()];
    let mut seen_at_depth: Vec<bool> = Vec::new();
    for (index, entry) in entries.iter().enumerate().rev() {
        let depth = entry.depth;
        if seen_at_depth.len() <= depth {
            seen_at_depth.resize(depth + 1, false);
        }
        flags[index] = !seen_at_depth[depth];
        seen_at_depth[depth] = true;
        seen_at_depth.truncate(depth + 1);
    }
    flags
}

/// Builds the nested export tree from included entries in walk order.
pub fn build_tree_data(entries: &[Entry], options: &ExportOptions) -> TreeData {
    let mut included = entries.iter().filter(|e| e.included);
    let Some(root) = included.next() else {
        return TreeData {
            name: String::new(),
            kind: EntryKind::Directory,
            path: ".".to_string(),
            children: Some(Vec::new()),
            contents: None,
            truncated: None,
        };
    };

    let mut stack: Vec<(usize, TreeData)> = vec![(root.depth, TreeData::from_entry(root, options))];
    for entry in included {
        while stack.len() > 1 && stack.last().is_some_and(|(d, _)| *d >= entry.depth) {
            if let Some((_, done)) = stack.pop() {
                if let Some((_, parent)) = stack.last_mut() {
                    parent.push_child(done);
                }
            }
        }
        let node = TreeData::from_entry(entry, options);
        if entry.is_dir() {
            stack.push((entry.depth, node));
        } else if let Some((_, parent)) = stack.last_mut() {
            parent.push_child(node);
        }
    }
    while stack.len() > 1 {
        if let Some((_, done)) = stack.pop() {
            if let Some((_, parent)) = stack.last_mut() {
                parent.push_child(done);
            }
        }
    }
    stack
        .pop()
        .map(|(_, tree)| tree)
        .unwrap_or_else(|| TreeData::from_entry(root, options))
}

/// Reads a file for embedding, substituting a placeholder for oversized,
/// binary or unreadable files.
pub fn read_file_contents(path: &Path, max_size_bytes: u64) -> String {
    match try_read_contents(path, max_size_bytes) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => "[permission denied]".to_string(),
        Err(e) => format!("[error reading file: {}]", e),
    }
}

fn try_read_contents(path: &Path, max_size_bytes: u64) -> std::io::Result<String> {
    let size = fs::metadata(path)?.len();
    if size > max_size_bytes {
        let adjusted = Byte::from_u64(size).get_appropriate_unit(UnitType::Binary);
        return Ok(format!("[file too large: {:.2}]", adjusted));
    }

    let mut file = File::open(path)?;
    let mut head = Vec::new();
    (&mut file).take(BINARY_SNIFF_LEN).read_to_end(&mut head)?;
    if head.contains(&0) {
        return Ok("[binary file]".to_string());
    }
    let mut bytes = head;
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn serialize_to_json<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data).map_err(AppError::JsonSerialize)
}

pub fn serialize_to_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    serde_yml::to_string(data).map_err(AppError::YamlError)
}

/// Wraps text in a fenced code block.
pub fn wrap_markdown(text: &str, language: &str) -> String {
    let body = text.strip_suffix('\n').unwrap_or(text);
    format!("```{}\n{}\n```\n", language, body)
}

fn language_hint(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "rs" => "rust",
        "py" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" => "typescript",
        "tsx" => "tsx",
        "go" => "go",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "cc" | "hpp" => "cpp",
        "sh" | "bash" => "bash",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        "json" => "json",
        "md" | "markdown" => "markdown",
        "html" => "html",
        "css" => "css",
        "sql" => "sql",
        _ => "",
    }
}

/// Renders a complete export document in the requested format.
pub fn render_export(
    entries: &[Entry],
    format: ExportFormat,
    export: &ExportOptions,
    render: &RenderOptions,
) -> Result<String> {
    match format {
        ExportFormat::Json => serialize_to_json(&build_tree_data(entries, export)),
        ExportFormat::Yaml => serialize_to_yaml(&build_tree_data(entries, export)),
        ExportFormat::Txt => {
            let mut out = render_text_tree(entries, render);
            if export.include_contents {
                let tree = build_tree_data(entries, export);
                let files: Vec<&TreeData> = tree
                    .files()
                    .into_iter()
                    .filter(|f| f.contents.is_some())
                    .collect();
                if !files.is_empty() {
                    let rule = "=".repeat(80);
                    let thin = "-".repeat(80);
                    out.push_str(&format!("\n{}\nFILE CONTENTS\n{}\n\n", rule, rule));
                    for file in files {
                        out.push_str(&format!("File: {}\n{}\n", file.path, thin));
                        out.push_str(file.contents.as_deref().unwrap_or_default());
                        out.push_str(&format!("\n{}\n\n", thin));
                    }
                }
            }
            Ok(out)
        }
        ExportFormat::Markdown => {
            let mut out = wrap_markdown(&render_text_tree(entries, render), "");
            if export.include_contents {
                let tree = build_tree_data(entries, export);
                let files: Vec<&TreeData> = tree
                    .files()
                    .into_iter()
                    .filter(|f| f.contents.is_some())
                    .collect();
                if !files.is_empty() {
                    out.push_str("\n## File Contents\n\n");
                    for file in files {
                        out.push_str(&format!("### {}\n\n", file.path));
                        out.push_str(&wrap_markdown(
                            file.contents.as_deref().unwrap_or_default(),
                            language_hint(&file.name),
                        ));
                        out.push('\n');
                    }
                }
            }
            Ok(out)
        }
    }
}
