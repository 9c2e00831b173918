use crate::engine::RunSummary;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    ByCamera,
    ByDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedLink {
    pub kind: LinkKind,
    pub date_stamp: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Relative target written into the link.
    pub target: PathBuf,
}

/// Trait for reporting linking progress.
///
/// The CLI implements it to print the run log; tests and embedders use `SilentReporter`.
/// All methods have default no-op implementations.
pub trait LinkReporter {
    fn on_run_start(&self, _root: &Path, _started_at: DateTime<Local>) {}
    fn on_link_created(&self, _link: &CreatedLink) {}
    fn on_directory_skipped(&self, _dir: &Path, _reason: &str) {}
    fn on_run_complete(&self, _summary: &RunSummary) {}
}

/// No-op reporter for silent operation.
pub struct SilentReporter;

impl LinkReporter for SilentReporter {}
