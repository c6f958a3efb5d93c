use crate::error::{AppError, Result};
use crate::rule_set::IGNORE_FILE_NAME;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_DIR: &str = ".gitree";
pub const DEFAULT_CONFIG_FILENAME: &str = "config.toml";
pub const MAX_ITEMS_UPPER_BOUND: usize = 10_000;

/// Options for one traversal. Handed to the walker at construction and never
/// changed during the walk. `None` means unbounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkConfig {
    pub max_depth: Option<usize>,
    pub include_hidden: bool,
    pub extra_ignore_patterns: Vec<String>,
    pub ignore_depth_limit: Option<usize>,
    pub gitignore_discovery_depth: Option<usize>,
    pub gitignore_enabled: bool,
    pub max_items_per_directory: Option<usize>,
    pub include_files: bool,
    pub include_patterns: Vec<String>,
    pub include_file_types: Vec<String>,
    pub files_first: bool,
    pub max_entries: Option<usize>,
    pub emit_excluded: bool,
    pub ignore_file_name: String,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            max_depth: Some(5),
            include_hidden: false,
            extra_ignore_patterns: Vec::new(),
            ignore_depth_limit: Some(5),
            gitignore_discovery_depth: Some(5),
            gitignore_enabled: true,
            max_items_per_directory: Some(20),
            include_files: true,
            include_patterns: Vec::new(),
            include_file_types: Vec::new(),
            files_first: false,
            max_entries: None,
            emit_excluded: false,
            ignore_file_name: IGNORE_FILE_NAME.to_string(),
        }
    }
}

impl WalkConfig {
    /// A configuration with every limit lifted, hidden entries still skipped.
    pub fn unbounded() -> Self {
        Self {
            max_depth: None,
            ignore_depth_limit: None,
            gitignore_discovery_depth: None,
            max_items_per_directory: None,
            ..Self::default()
        }
    }

    /// Drops the per-directory cap and the entry limit. Those only shape what
    /// is displayed; archiving must see every included file.
    pub fn without_display_limits(self) -> Self {
        Self {
            max_items_per_directory: None,
            max_entries: None,
            ..self
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_items_per_directory == Some(0) {
            return Err(AppError::InvalidArgument(
                "max items per directory must be at least 1 (or unbounded)".to_string(),
            ));
        }
        if self.ignore_file_name.is_empty() || self.ignore_file_name.contains(['/', '\\']) {
            return Err(AppError::InvalidArgument(format!(
                "invalid ignore file name '{}'",
                self.ignore_file_name
            )));
        }
        Ok(())
    }
}

/// The on-disk project configuration (`.gitree/config.toml`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ListingConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: i64,
    #[serde(default = "default_false")]
    pub unbounded_depth: bool,
    #[serde(default = "default_gitignore_depth")]
    pub gitignore_depth: i64,
    #[serde(default = "default_exclude_depth")]
    pub exclude_depth: i64,
    #[serde(default = "default_max_items")]
    pub max_items: i64,
    #[serde(default = "default_false")]
    pub no_limit: bool,
    #[serde(default = "default_max_entries")]
    pub max_entries: i64,
    #[serde(default = "default_false")]
    pub no_max_entries: bool,
    #[serde(default = "default_false")]
    pub hidden_items: bool,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub include_file_types: Vec<String>,
    #[serde(default = "default_false")]
    pub files_first: bool,
    #[serde(default = "default_false")]
    pub no_files: bool,
    #[serde(default = "default_false")]
    pub no_gitignore: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_false")]
    pub emoji: bool,
    #[serde(default = "default_false")]
    pub no_color: bool,
    #[serde(default = "default_false")]
    pub no_contents: bool,
    #[serde(default)]
    pub no_contents_for: Vec<String>,
    /// Largest file, in MiB, whose contents are embedded in exports.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: f64,
}

fn default_false() -> bool {
    false
}
fn default_max_depth() -> i64 {
    5
}
fn default_gitignore_depth() -> i64 {
    5
}
fn default_exclude_depth() -> i64 {
    5
}
fn default_max_items() -> i64 {
    20
}
fn default_max_entries() -> i64 {
    40
}
fn default_format() -> String {
    "txt".to_string()
}
fn default_max_file_size() -> f64 {
    1.0
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            unbounded_depth: default_false(),
            gitignore_depth: default_gitignore_depth(),
            exclude_depth: default_exclude_depth(),
            max_items: default_max_items(),
            no_limit: default_false(),
            max_entries: default_max_entries(),
            no_max_entries: default_false(),
            hidden_items: default_false(),
            exclude: Vec::new(),
            include: Vec::new(),
            include_file_types: Vec::new(),
            files_first: default_false(),
            no_files: default_false(),
            no_gitignore: default_false(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            emoji: default_false(),
            no_color: default_false(),
            no_contents: default_false(),
            no_contents_for: Vec::new(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn non_negative(name: &str, value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        AppError::InvalidArgument(format!("{} must be a non-negative integer, got {}", name, value))
    })
}

impl Config {
    /// Finds the config file to load. An explicit path must exist; the default
    /// location is optional.
    pub fn resolve_config_path(
        base_dir: &Path,
        cli_config_file: Option<&String>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(p_str) => {
                let path = PathBuf::from(shellexpand::tilde(p_str).as_ref());
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Specified config file not found at path: {}",
                        path.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", path.display());
                Ok(Some(path))
            }
            None => {
                let default_path = Self::default_path(base_dir);
                if default_path.exists() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Ok(Some(default_path))
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    Ok(None)
                }
            }
        }
    }

    pub fn default_path(base_dir: &Path) -> PathBuf {
        base_dir
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILENAME)
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&toml_content).map_err(|e| match e {
            AppError::TomlParse(msg) => AppError::TomlParse(format!(
                "Error parsing config file '{}': {}",
                config_path.display(),
                msg
            )),
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str::<Config>(content).map_err(|e| AppError::TomlParse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Writes the default configuration to `path`, refusing to replace an
    /// existing file unless `force` is set.
    pub fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(AppError::Config(format!(
                "Config file already exists at {} (use --force to overwrite)",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| AppError::DirCreation {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let content = Config::default().to_toml_string()?;
        fs::write(path, content).map_err(|e| AppError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::info!("Wrote default configuration to {}", path.display());
        Ok(())
    }

    /// Converts the file/CLI view of the options into a validated [`WalkConfig`].
    pub fn to_walk_config(&self) -> Result<WalkConfig> {
        let listing = &self.listing;

        let max_depth = non_negative("max_depth", listing.max_depth)?;
        let gitignore_depth = non_negative("gitignore_depth", listing.gitignore_depth)?;
        let exclude_depth = non_negative("exclude_depth", listing.exclude_depth)?;
        let max_entries = non_negative("max_entries", listing.max_entries)?;
        let max_items = non_negative("max_items", listing.max_items)?;
        if !listing.no_limit && !(1..=MAX_ITEMS_UPPER_BOUND).contains(&max_items) {
            return Err(AppError::InvalidArgument(format!(
                "max_items must be between 1 and {} (or use no_limit), got {}",
                MAX_ITEMS_UPPER_BOUND, max_items
            )));
        }

        let walk_config = WalkConfig {
            max_depth: (!listing.unbounded_depth).then_some(max_depth),
            include_hidden: listing.hidden_items,
            extra_ignore_patterns: listing.exclude.clone(),
            ignore_depth_limit: Some(exclude_depth),
            gitignore_discovery_depth: Some(gitignore_depth),
            gitignore_enabled: !listing.no_gitignore,
            max_items_per_directory: (!listing.no_limit).then_some(max_items),
            include_files: !listing.no_files,
            include_patterns: listing.include.clone(),
            include_file_types: listing.include_file_types.clone(),
            files_first: listing.files_first,
            max_entries: (!listing.no_max_entries).then_some(max_entries),
            emit_excluded: false,
            ignore_file_name: IGNORE_FILE_NAME.to_string(),
        };
        walk_config.validate()?;
        Ok(walk_config)
    }

    /// Maximum embedded file size in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        if self.output.max_file_size.is_finite() && self.output.max_file_size > 0.0 {
            (self.output.max_file_size * 1024.0 * 1024.0) as u64
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        let walk = config.to_walk_config().unwrap();
        assert_eq!(walk.max_depth, Some(5));
        assert_eq!(walk.max_items_per_directory, Some(20));
        assert_eq!(walk.max_entries, Some(40));
        assert!(walk.gitignore_enabled);
    }

    #[test]
    fn negative_depth_is_rejected() {
        let config = Config::from_toml_str("[listing]\nmax_depth = -1\n").unwrap();
        let err = config.to_walk_config().unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn max_items_range_is_checked_unless_unlimited() {
        let config = Config::from_toml_str("[listing]\nmax_items = 0\n").unwrap();
        assert!(config.to_walk_config().is_err());

        let config = Config::from_toml_str("[listing]\nmax_items = 0\nno_limit = true\n").unwrap();
        assert_eq!(config.to_walk_config().unwrap().max_items_per_directory, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("[listing]\ncolour = true\n").unwrap_err();
        assert!(matches!(err, AppError::TomlParse(_)));
    }

    #[test]
    fn switches_lift_limits() {
        let config = Config::from_toml_str(
            "[listing]\nunbounded_depth = true\nno_max_entries = true\nno_gitignore = true\nno_files = true\n",
        )
        .unwrap();
        let walk = config.to_walk_config().unwrap();
        assert_eq!(walk.max_depth, None);
        assert_eq!(walk.max_entries, None);
        assert!(!walk.gitignore_enabled);
        assert!(!walk.include_files);
    }

    #[test]
    fn default_file_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = Config::default_path(dir.path());
        Config::write_default(&path, false).unwrap();
        assert!(Config::write_default(&path, false).is_err());
        Config::write_default(&path, true).unwrap();

        let resolved = Config::resolve_config_path(dir.path(), None, false).unwrap();
        assert_eq!(resolved.as_deref(), Some(path.as_path()));
        assert_eq!(Config::load_from_path(&path).unwrap(), Config::default());

        assert!(Config::resolve_config_path(dir.path(), None, true)
            .unwrap()
            .is_none());
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml").to_string_lossy().into_owned();
        assert!(Config::resolve_config_path(dir.path(), Some(&missing), false).is_err());
    }

    #[test]
    fn walk_config_validation() {
        let mut walk = WalkConfig::default();
        assert!(walk.validate().is_ok());
        walk.max_items_per_directory = Some(0);
        assert!(walk.validate().is_err());
        walk.max_items_per_directory = None;
        walk.ignore_file_name = "a/b".to_string();
        assert!(walk.validate().is_err());
    }
}
