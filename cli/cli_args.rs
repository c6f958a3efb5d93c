use clap::{Args, Parser, Subcommand};
use gitree_core::config::MAX_ITEMS_UPPER_BOUND;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectConfigOpts {
    #[arg(
        long,
        help = "Path of the TOML config file (default: <root>/.gitree/config.toml).",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config",
        help_heading = "Project Setup"
    )]
    pub config: Option<String>,

    #[arg(
        long,
        help = "Do not load any TOML config file.",
        conflicts_with = "config",
        help_heading = "Project Setup"
    )]
    pub no_config: bool,
}

/// Traversal flags shared by every command that walks a tree. Unset flags
/// fall back to the config file, then to built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct ListingOpts {
    #[arg(long, value_name = "DEPTH", help = "Maximum depth to descend [default: 5].", help_heading = "Listing")]
    pub max_depth: Option<i64>,

    #[arg(long, help = "Descend without a depth limit.", help_heading = "Listing")]
    pub unbounded_depth: bool,

    #[arg(long, help = "Show hidden files and directories.", help_heading = "Listing")]
    pub hidden_items: bool,

    #[arg(long, help = "List directories only.", help_heading = "Listing")]
    pub no_files: bool,

    #[arg(long, help = "List files before directories.", help_heading = "Listing")]
    pub files_first: bool,

    #[arg(
        long,
        value_name = "COUNT",
        value_parser = clap::value_parser!(i64).range(1..=MAX_ITEMS_UPPER_BOUND as i64),
        help = "Maximum items shown per directory [default: 20].",
        help_heading = "Listing"
    )]
    pub max_items: Option<i64>,

    #[arg(long, help = "Show every item of every directory.", conflicts_with = "max_items", help_heading = "Listing")]
    pub no_limit: bool,

    #[arg(long, value_name = "COUNT", help = "Maximum entries in the whole listing [default: 40].", help_heading = "Listing")]
    pub max_entries: Option<i64>,

    #[arg(long, help = "Do not cap the total number of entries.", conflicts_with = "max_entries", help_heading = "Listing")]
    pub no_max_entries: bool,

    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append, help = "Extra gitignore-style pattern to exclude (repeatable).", help_heading = "Ignore Rules")]
    pub exclude: Vec<String>,

    #[arg(long, value_name = "DEPTH", help = "Deepest level the --exclude patterns apply to [default: 5].", help_heading = "Ignore Rules")]
    pub exclude_depth: Option<i64>,

    #[arg(long, value_name = "DEPTH", help = "Deepest directory whose .gitignore is read [default: 5].", help_heading = "Ignore Rules")]
    pub gitignore_depth: Option<i64>,

    #[arg(long, help = "Ignore .gitignore files entirely.", help_heading = "Ignore Rules")]
    pub no_gitignore: bool,

    #[arg(long = "include", value_name = "PATTERN", action = clap::ArgAction::Append, help = "Only show files matching this pattern; overrides .gitignore for them (repeatable).", help_heading = "Ignore Rules")]
    pub include: Vec<String>,

    #[arg(long = "include-file-types", value_name = "EXT", num_args = 1.., action = clap::ArgAction::Append, help = "Only show files with these extensions.", help_heading = "Ignore Rules")]
    pub include_file_types: Vec<String>,

    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Print a directory tree that respects .gitignore rules.",
    long_about = "gitree walks one or more directories, applies every .gitignore it finds \n(plus your own exclude patterns) and prints, exports or archives what is left.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  gitree tree\n  gitree t src docs --max-depth 2 --emoji\n  gitree tree --output tree.json\n  gitree zip project.zip --include '*.rs'\n  gitree debug",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv, -vvv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(visible_alias = "t", about = "Print the filtered directory tree.")]
    Tree(TreeArgs),

    #[command(visible_alias = "z", about = "Archive the included files into a zip file.")]
    Zip(ZipArgs),

    #[command(
        visible_alias = "d",
        about = "Show the effective configuration and every inclusion decision."
    )]
    Debug(DebugArgs),

    #[command(about = "Show or write the default configuration file.")]
    Config(ConfigArgs),

    #[command(about = "Generate or save shell completion scripts.")]
    Completion(CompletionArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    #[arg(value_name = "PATHS", help = "Directories to list [default: current dir].")]
    pub paths: Vec<PathBuf>,

    #[clap(flatten)]
    pub listing: ListingOpts,

    #[arg(long, help = "Print per-level directory and file counts.", help_heading = "Output Control")]
    pub summary: bool,

    #[arg(long, help = "Prefix entries with file/folder emoji.", help_heading = "Output Control")]
    pub emoji: bool,

    #[arg(long, help = "Disable coloured output.", help_heading = "Output Control")]
    pub no_color: bool,

    #[arg(short = 'i', long, help = "Pick files interactively before printing.", help_heading = "Output Control")]
    pub interactive: bool,

    #[arg(short = 'o', long, value_name = "FILE", help = "Write the tree to FILE instead of stdout.", help_heading = "Output Control")]
    pub output: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_name = "FORMAT",
        value_parser = ["txt", "json", "yaml", "md"],
        help = "Export format [default: inferred from --output, else txt].",
        help_heading = "Output Control"
    )]
    pub format: Option<String>,

    #[arg(long, help = "Do not embed file contents in exported files.", help_heading = "Output Control")]
    pub no_contents: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ZipArgs {
    #[arg(value_name = "ARCHIVE", help = "Zip file to create.")]
    pub archive: PathBuf,

    #[arg(value_name = "PATHS", help = "Directories to archive [default: current dir].")]
    pub paths: Vec<PathBuf>,

    #[clap(flatten)]
    pub listing: ListingOpts,

    #[arg(short = 'i', long, help = "Pick files interactively before archiving.", help_heading = "Output Control")]
    pub interactive: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DebugArgs {
    #[arg(value_name = "PATH", help = "Directory to inspect [default: current dir].")]
    pub path: Option<PathBuf>,

    #[clap(flatten)]
    pub listing: ListingOpts,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionArgs {
    #[arg(
        long,
        value_name = "SHELL",
        value_parser = ["fish", "bash", "zsh"],
        help = "Shell to generate completions for [default: fish]"
    )]
    pub shell: Option<String>,
    #[arg(long, help = "Save completion script to the shell's default location.")]
    pub save: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(value_name = "PATH", help = "Project directory [default: current dir].")]
    pub path: Option<PathBuf>,

    #[arg(long, help = "Write the default config to <PATH>/.gitree/config.toml.")]
    pub init: bool,

    #[arg(long, requires = "init", help = "Overwrite an existing config file.")]
    pub force: bool,
}
