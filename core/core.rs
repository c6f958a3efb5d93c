pub mod archive;
pub mod config;
pub mod entry;
pub mod error;
pub mod output_formats;
pub mod pattern;
pub mod registry;
pub mod rule_set;
pub mod selection;
pub mod summary;
pub mod walker;

pub use config::{Config, ListingConfig, OutputConfig, WalkConfig};
pub use entry::{ChildSummary, Entry, EntryKind};
pub use error::{AppError, Result};
pub use output_formats::{
    ExportFormat, ExportOptions, RenderOptions, TreeData, build_tree_data, render_text_tree,
};
pub use pattern::Pattern;
pub use registry::RuleRegistry;
pub use rule_set::{Decision, IGNORE_FILE_NAME, RuleSet};
pub use selection::SelectionState;
pub use summary::DirectorySummary;
pub use walker::{Walker, walk};
