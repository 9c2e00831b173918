use crate::config::LinkerConfig;
use crate::error::{Error, Result};
use crate::paths;
use glob::Pattern;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use walkdir::{DirEntry, WalkDir};

/// One visited directory and the non-directory entries it directly contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirListing {
    pub dir: PathBuf,
    /// Entry names in walk order, byte-exact. Symlinks to files and dangling links are included;
    /// the linker rejects them.
    pub files: Vec<OsString>,
}

/// Why a directory's files are not considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirFilter {
    /// Path has no camera directory in it.
    NoCamera,
    /// Camera directory still carries its raw hardware name.
    RawCamera,
    /// Inside the by-date output tree.
    ByDateOutput,
    /// Matched a configured ignore pattern.
    Ignored,
}

impl DirFilter {
    /// Whether every descendant is filtered too, so the walk need not descend.
    fn prunes(self) -> bool {
        !matches!(self, DirFilter::NoCamera)
    }
}

/// Recursive, link-following traversal of the recorder tree.
pub struct TreeWalker {
    root: PathBuf,
    camera_prefix: String,
    raw_camera_marker: String,
    bydate_dirname: String,
    ignore_patterns: Vec<Pattern>,
}

impl TreeWalker {
    pub fn new(config: &LinkerConfig) -> Self {
        let ignore_patterns: Vec<Pattern> = config
            .ignore_patterns
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();

        Self {
            root: config.root_path.clone(),
            camera_prefix: config.camera_prefix.clone(),
            raw_camera_marker: config.raw_camera_marker(),
            bydate_dirname: config.bydate_dirname.clone(),
            ignore_patterns,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Classify a directory. Markers are matched against the path below the root, so the location of
    /// the root itself never affects filtering.
    pub fn filter(&self, dir: &Path) -> Option<DirFilter> {
        if self
            .ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(dir))
        {
            return Some(DirFilter::Ignored);
        }

        let relative = dir.strip_prefix(&self.root).unwrap_or(dir);

        if paths::segments(relative)
            .iter()
            .any(|segment| *segment == self.bydate_dirname)
        {
            return Some(DirFilter::ByDateOutput);
        }

        let relative = relative.to_string_lossy();
        if !relative.contains(&self.camera_prefix) {
            return Some(DirFilter::NoCamera);
        }
        if relative.contains(&self.raw_camera_marker) {
            return Some(DirFilter::RawCamera);
        }
        None
    }

    fn keep_entry(&self, entry: &DirEntry) -> bool {
        !(entry.file_type().is_dir()
            && self
                .filter(entry.path())
                .is_some_and(DirFilter::prunes))
    }

    /// Visit every eligible directory under the root.
    ///
    /// Each directory is read once, by walkdir. A listing is handed to `visit` when the walk leaves
    /// its directory, so subdirectories are visited before their parent.
    pub fn walk<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(DirListing) -> Result<()>,
    {
        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| self.keep_entry(entry));

        let mut open: Vec<OpenDir> = Vec::new();

        for entry in walker {
            let (depth, path, is_dir) = match entry {
                Ok(entry) => (
                    entry.depth(),
                    entry.path().to_path_buf(),
                    entry.file_type().is_dir(),
                ),
                Err(err) => {
                    if let Some(ancestor) = err.loop_ancestor() {
                        warn!(
                            "Symlink loop at {} (back to {}), not descending",
                            err.path().map(|p| p.display().to_string()).unwrap_or_default(),
                            ancestor.display()
                        );
                        continue;
                    }
                    let kind = err.io_error().map(io::Error::kind);
                    let entry_path = err.path().map(Path::to_path_buf);
                    match (kind, entry_path) {
                        (Some(io::ErrorKind::PermissionDenied), _) => {
                            error!("Access denied while walking: {}", err);
                            continue;
                        }
                        // Dangling link: still listed, the linker refuses to link links.
                        (Some(io::ErrorKind::NotFound), Some(path)) => {
                            debug!("Dangling entry: {}", err);
                            (err.depth(), path, false)
                        }
                        _ => return Err(Error::Walk(err)),
                    }
                }
            };

            // Anything at this depth or deeper is finished.
            while open.last().is_some_and(|dir| dir.depth >= depth) {
                if let Some(done) = open.pop() {
                    visit(done.listing)?;
                }
            }

            if is_dir {
                match self.filter(&path) {
                    Some(reason) => debug!("Skipping {} ({:?})", path.display(), reason),
                    None => open.push(OpenDir {
                        depth,
                        listing: DirListing {
                            dir: path,
                            files: Vec::new(),
                        },
                    }),
                }
            } else if let Some(parent) = open.last_mut().filter(|dir| dir.depth + 1 == depth) {
                if let Some(name) = path.file_name() {
                    parent.listing.files.push(name.to_os_string());
                }
            }
        }

        while let Some(done) = open.pop() {
            visit(done.listing)?;
        }

        Ok(())
    }
}

/// A directory the walk is still inside of.
struct OpenDir {
    depth: usize,
    listing: DirListing,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walker() -> TreeWalker {
        TreeWalker::new(&LinkerConfig::with_root("/data/ipcameras"))
    }

    #[test]
    fn test_filter_root_has_no_camera() {
        assert_eq!(
            walker().filter(Path::new("/data/ipcameras")),
            Some(DirFilter::NoCamera)
        );
    }

    #[test]
    fn test_filter_root_name_is_not_a_marker() {
        let walker = TreeWalker::new(&LinkerConfig::with_root("/srv/camera-0-archive"));
        assert_eq!(
            walker.filter(Path::new("/srv/camera-0-archive/camera-lobby/20140428")),
            None
        );
    }

    #[test]
    fn test_filter_raw_camera() {
        let filter = walker().filter(Path::new("/data/ipcameras/camera-0040FF5A9D/20140428/19"));
        assert_eq!(filter, Some(DirFilter::RawCamera));
        assert!(filter.unwrap().prunes());
    }

    #[test]
    fn test_filter_bydate_output() {
        assert_eq!(
            walker().filter(Path::new("/data/ipcameras/camera-ALL-bydate/20140428")),
            Some(DirFilter::ByDateOutput)
        );
    }

    #[test]
    fn test_filter_friendly_camera() {
        assert_eq!(
            walker().filter(Path::new(
                "/data/ipcameras/camera-lobby/20140428/19/20140428_191525_8085_ABC/20140428_19"
            )),
            None
        );
    }

    #[test]
    fn test_filter_ignore_pattern() {
        let config = LinkerConfig {
            ignore_patterns: vec!["**/lost+found".to_string(), "[".to_string()],
            ..LinkerConfig::with_root("/data/ipcameras")
        };
        let walker = TreeWalker::new(&config);
        assert_eq!(
            walker.filter(Path::new("/data/ipcameras/camera-lobby/lost+found")),
            Some(DirFilter::Ignored)
        );
    }
}
