use camera_linker::{CreatedLink, LinkKind, LinkReporter, RunSummary};
use chrono::{DateTime, Local};
use colored::*;
use std::cell::RefCell;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

const RULE_WIDTH: usize = 80;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Writes the human-readable run log, to stdout unless another writer is given.
pub struct CliReporter<W: Write> {
    out: RefCell<W>,
    last_source: RefCell<Option<PathBuf>>,
}

impl CliReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> CliReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
            last_source: RefCell::new(None),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn emit(&self, line: std::fmt::Arguments<'_>) {
        let mut out = self.out.borrow_mut();
        if let Err(err) = writeln!(out, "{}", line) {
            warn!("Failed to write run log: {}", err);
        }
    }
}

impl<W: Write> LinkReporter for CliReporter<W> {
    fn on_run_start(&self, root: &Path, started_at: DateTime<Local>) {
        self.emit(format_args!("camera-linker {}", root.display()));
        self.emit(format_args!("{}", started_at.format(TIMESTAMP_FORMAT)));
    }

    fn on_link_created(&self, link: &CreatedLink) {
        // One header per source file, whichever of its links is new.
        let new_source = self.last_source.borrow().as_deref() != Some(link.source.as_path());
        if new_source {
            self.emit(format_args!("{}", "-".repeat(RULE_WIDTH)));
            self.emit(format_args!("datestamp  {}", link.date_stamp));
            self.emit(format_args!("source     {}", link.source.display()));
            *self.last_source.borrow_mut() = Some(link.source.clone());
        }

        let destination = link.destination.display().to_string();
        match link.kind {
            LinkKind::ByCamera => self.emit(format_args!("bycamera   {}", destination.green())),
            LinkKind::ByDate => self.emit(format_args!("bydate     {}", destination.cyan())),
        }
    }

    fn on_directory_skipped(&self, dir: &Path, reason: &str) {
        self.emit(format_args!("{} {} ({})", "skipped".yellow(), dir.display(), reason));
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        self.emit(format_args!("{}", "=".repeat(RULE_WIDTH)));
        self.emit(format_args!(
            "Links created: {}",
            format!("{}", summary.links_created).green()
        ));
        if let Some(finished_at) = summary.finished_at {
            self.emit(format_args!("{}", finished_at.format(TIMESTAMP_FORMAT)));
        }
        if let Err(err) = self.out.borrow_mut().flush() {
            warn!("Failed to flush run log: {}", err);
        }
    }
}
