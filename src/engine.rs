use crate::config::LinkerConfig;
use crate::decoder::{self, CaptureDir};
use crate::error::{Error, Result};
use crate::linker::{DiskFs, LinkFs, Linker};
use crate::paths;
use crate::progress::LinkReporter;
use crate::scanner::{DirListing, TreeWalker};
use chrono::{DateTime, Local};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct LinkEngine {
    config: LinkerConfig,
}

/// Tally of one pass. Lives only for the run that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub directories_scanned: usize,
    pub candidate_files: usize,
    pub links_created: usize,
    pub by_camera_created: usize,
    pub by_date_created: usize,
    pub symlinks_skipped: usize,
    pub directories_skipped: usize,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Local>) -> Self {
        Self {
            started_at,
            finished_at: None,
            directories_scanned: 0,
            candidate_files: 0,
            links_created: 0,
            by_camera_created: 0,
            by_date_created: 0,
            symlinks_skipped: 0,
            directories_skipped: 0,
        }
    }
}

impl LinkEngine {
    pub fn new(config: LinkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LinkerConfig {
        &self.config
    }

    /// Run one full pass over the real filesystem:
    /// 1. Walk eligible camera directories under the root
    /// 2. Decode camera and date for each directory holding video files
    /// 3. Create any missing by-camera and by-date links
    pub fn run(&self, reporter: &dyn LinkReporter) -> Result<RunSummary> {
        self.config.validate()?;

        let root = paths::normalize(&std::path::absolute(&self.config.root_path)?);
        if !root.is_dir() {
            return Err(Error::RootMissing(root));
        }

        // Walking, decoding and link targets all work from the resolved root.
        LinkEngine::new(LinkerConfig {
            root_path: root,
            ..self.config.clone()
        })
        .run_pass(reporter)
    }

    fn run_pass(&self, reporter: &dyn LinkReporter) -> Result<RunSummary> {
        let root = &self.config.root_path;
        let mut summary = RunSummary::new(Local::now());
        reporter.on_run_start(root, summary.started_at);
        info!("Linking captures under {}", root.display());

        let walker = TreeWalker::new(&self.config);
        let linker = Linker::new(&DiskFs, &self.config);

        walker.walk(|listing| {
            self.process_listing(&linker, &listing, &mut summary, reporter)
        })?;

        summary.finished_at = Some(Local::now());
        info!(
            "{} links created ({} by camera, {} by date) from {} candidate files in {} directories",
            summary.links_created,
            summary.by_camera_created,
            summary.by_date_created,
            summary.candidate_files,
            summary.directories_scanned,
        );
        reporter.on_run_complete(&summary);

        Ok(summary)
    }

    /// Link every candidate file of one walked directory, accumulating into `summary`.
    pub fn process_listing<F: LinkFs + ?Sized>(
        &self,
        linker: &Linker<'_, F>,
        listing: &DirListing,
        summary: &mut RunSummary,
        reporter: &dyn LinkReporter,
    ) -> Result<()> {
        summary.directories_scanned += 1;

        let candidates: Vec<&OsString> = listing
            .files
            .iter()
            .filter(|name| linker.is_candidate(name))
            .collect();
        if candidates.is_empty() {
            return Ok(());
        }

        let capture = match self.decode(&listing.dir) {
            Ok(capture) => capture,
            Err(err) => {
                self.skip_directory(linker, listing, &candidates, &err, summary, reporter);
                return Ok(());
            }
        };
        debug!(
            "{}: camera {} date {}",
            listing.dir.display(),
            capture.camera_name,
            capture.date_stamp
        );

        for name in candidates {
            summary.candidate_files += 1;
            let src = listing.dir.join(name);
            let outcome = linker.link_file(&src, &capture, reporter)?;

            if outcome.skipped_symlink {
                summary.symlinks_skipped += 1;
            }
            summary.by_camera_created += outcome.by_camera as usize;
            summary.by_date_created += outcome.by_date as usize;
            summary.links_created += outcome.created();
        }

        Ok(())
    }

    /// Decode `dir` relative to the root, also rejecting a camera segment without the camera prefix.
    fn decode(&self, dir: &Path) -> Result<CaptureDir> {
        let capture = decoder::decode(&self.config.root_path, dir)?;
        if !capture.camera_name.starts_with(&self.config.camera_prefix) {
            return Err(Error::NotACamera {
                path: dir.to_path_buf(),
                camera: capture.camera_name,
            });
        }
        Ok(capture)
    }

    fn skip_directory<F: LinkFs + ?Sized>(
        &self,
        linker: &Linker<'_, F>,
        listing: &DirListing,
        candidates: &[&OsString],
        err: &Error,
        summary: &mut RunSummary,
        reporter: &dyn LinkReporter,
    ) {
        // By-camera buckets hold only our own links and always land here.
        let stray: Vec<PathBuf> = candidates
            .iter()
            .map(|name| listing.dir.join(name))
            .filter(|path| !linker.is_symlink(path))
            .collect();

        if stray.is_empty() {
            debug!("{} holds only links, skipping", listing.dir.display());
            return;
        }

        warn!(
            "Skipping {} video files in {}: {}",
            stray.len(),
            listing.dir.display(),
            err
        );
        summary.directories_skipped += 1;
        reporter.on_directory_skipped(&listing.dir, &err.to_string());
    }
}
