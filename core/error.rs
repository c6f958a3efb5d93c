use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("TOML Parsing Error: {0}")]
    TomlParse(String),

    #[error("TOML Serialization Error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON Serialization Error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("YAML Serialization Error: {0}")]
    YamlError(#[from] serde_yml::Error),

    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File Read Error: Path '{path}', Error: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File Write Error: Path '{path}', Error: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory Creation Error: Path '{path}', Error: {source}")]
    DirCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Walk root does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("Walk root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Glob Pattern Error: {0}")]
    Glob(String),

    #[error("Archive Error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),
}

impl From<globset::Error> for AppError {
    fn from(err: globset::Error) -> Self {
        AppError::Glob(format!("Globset error: {}", err))
    }
}
