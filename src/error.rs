use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Root path {} does not exist or is not a directory", .0.display())]
    RootMissing(PathBuf),

    /// Directory is not at capture depth (`CAMERA/DATE/HOUR/CAPTURE/DATE_HOUR`) below the root.
    #[error("Malformed capture path {} ({depth} segments below the root, expected {})", .path.display(), crate::decoder::EXPECTED_DEPTH)]
    MalformedPath { path: PathBuf, depth: usize },

    #[error("Capture path {} is not under a camera directory (found '{camera}')", .path.display())]
    NotACamera { path: PathBuf, camera: String },

    #[error("Capture path {} has a camera or date segment that is not UTF-8", .path.display())]
    NonUtf8Segment { path: PathBuf },

    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create link {} -> {}: {source}", .link.display(), .target.display())]
    CreateLink {
        link: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },
}
