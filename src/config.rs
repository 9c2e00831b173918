use crate::error::{Error, Result};
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

pub const DEFAULT_CONFIG_NAME: &str = "Config";
pub const DEFAULT_ROOT_PATH: &str = "/data/ipcameras";
pub const DEFAULT_BYDATE_DIRNAME: &str = "camera-ALL-bydate";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinkerConfig {
    /// Base of the recorder's capture tree.
    pub root_path: PathBuf,
    /// Aggregate output directory created directly under `root_path`.
    pub bydate_dirname: String,
    /// Every camera directory name starts with this.
    pub camera_prefix: String,
    /// `camera_prefix` followed by this marks a camera the operator has not renamed yet.
    pub raw_marker: String,
    pub video_extension: String,
    /// Glob patterns; matching directories are pruned from the walk.
    pub ignore_patterns: Vec<String>,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from(DEFAULT_ROOT_PATH),
            bydate_dirname: DEFAULT_BYDATE_DIRNAME.to_string(),
            camera_prefix: "camera-".to_string(),
            raw_marker: "0".to_string(),
            video_extension: "mkv".to_string(),
            ignore_patterns: Vec::new(),
        }
    }
}

impl LinkerConfig {
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root_path: root.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn bydate_root(&self) -> PathBuf {
        self.root_path.join(&self.bydate_dirname)
    }

    /// Prefix identifying an unconfigured camera directory, e.g. `camera-0`.
    pub fn raw_camera_marker(&self) -> String {
        format!("{}{}", self.camera_prefix, self.raw_marker)
    }

    /// Substring a file name must contain to be a capture candidate, e.g. `.mkv`.
    pub fn video_marker(&self) -> String {
        format!(".{}", self.video_extension)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bydate_dirname.is_empty() {
            return Err(Error::InvalidConfig("bydate_dirname is empty".into()));
        }
        if self.bydate_dirname.contains(MAIN_SEPARATOR) || self.bydate_dirname.contains('/') {
            return Err(Error::InvalidConfig(format!(
                "bydate_dirname '{}' must be a single directory name",
                self.bydate_dirname
            )));
        }
        if self.camera_prefix.is_empty() {
            return Err(Error::InvalidConfig("camera_prefix is empty".into()));
        }
        if self.video_extension.is_empty() {
            return Err(Error::InvalidConfig("video_extension is empty".into()));
        }
        Ok(())
    }
}

pub fn load_configuration(name: &str) -> std::result::Result<LinkerConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name(name).required(false))
        .add_source(
            Environment::with_prefix("CAMLINK")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<LinkerConfig>()
}
