mod fs;

pub use fs::{DiskFs, LinkFs, MemoryFs, Node};

use crate::config::LinkerConfig;
use crate::decoder::CaptureDir;
use crate::error::{Error, Result};
use crate::paths;
use crate::progress::{CreatedLink, LinkKind, LinkReporter};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

/// Links actually created for one source file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkOutcome {
    pub by_camera: bool,
    pub by_date: bool,
    /// The source was itself a symlink and was left alone.
    pub skipped_symlink: bool,
}

impl LinkOutcome {
    pub fn created(&self) -> usize {
        self.by_camera as usize + self.by_date as usize
    }
}

/// Materializes the by-camera and by-date links for capture files.
pub struct Linker<'a, F: LinkFs + ?Sized> {
    fs: &'a F,
    bydate_root: PathBuf,
    video_marker: String,
}

impl<'a, F: LinkFs + ?Sized> Linker<'a, F> {
    pub fn new(fs: &'a F, config: &LinkerConfig) -> Self {
        Self {
            fs,
            bydate_root: config.bydate_root(),
            video_marker: config.video_marker(),
        }
    }

    pub fn bydate_root(&self) -> &Path {
        &self.bydate_root
    }

    pub fn is_candidate(&self, file_name: &OsStr) -> bool {
        find_last(file_name.as_encoded_bytes(), self.video_marker.as_bytes()).is_some()
    }

    pub fn is_symlink(&self, path: &Path) -> bool {
        self.fs.is_symlink(path)
    }

    /// Ensure both links for `src` exist. Existing destinations of any kind count as done.
    pub fn link_file(
        &self,
        src: &Path,
        capture: &CaptureDir,
        reporter: &dyn LinkReporter,
    ) -> Result<LinkOutcome> {
        let mut outcome = LinkOutcome::default();

        // Never link a link: covers our own by-camera links, which live inside the camera tree.
        if self.fs.is_symlink(src) {
            trace!("{} is a symlink, skipping", src.display());
            outcome.skipped_symlink = true;
            return Ok(outcome);
        }

        let Some(file_name) = src.file_name() else {
            return Ok(outcome);
        };

        let by_camera = capture.camera_root.join(file_name);
        if let Some(link) = self.create_link(LinkKind::ByCamera, src, &by_camera, capture)? {
            reporter.on_link_created(&link);
            outcome.by_camera = true;
        }

        let Some(dated_name) = name_with_camera(file_name, &capture.camera_name, &self.video_marker)
        else {
            warn!("No by-date link for {}: name cannot be rewritten", src.display());
            return Ok(outcome);
        };

        self.ensure_dir(&self.bydate_root)?;
        let dated_dir = self.bydate_root.join(&capture.date_stamp);
        self.ensure_dir(&dated_dir)?;

        let by_date = dated_dir.join(dated_name);
        if let Some(link) = self.create_link(LinkKind::ByDate, src, &by_date, capture)? {
            reporter.on_link_created(&link);
            outcome.by_date = true;
        }

        Ok(outcome)
    }

    fn create_link(
        &self,
        kind: LinkKind,
        src: &Path,
        destination: &Path,
        capture: &CaptureDir,
    ) -> Result<Option<CreatedLink>> {
        if self.fs.exists(destination) {
            trace!("{} exists", destination.display());
            return Ok(None);
        }

        let base = destination.parent().unwrap_or(Path::new(""));
        let target = paths::relative_to(src, base);

        self.fs
            .symlink(&target, destination)
            .map_err(|source| Error::CreateLink {
                link: destination.to_path_buf(),
                target: target.clone(),
                source,
            })?;
        info!(
            "{:?} link {} -> {} (date {})",
            kind,
            destination.display(),
            target.display(),
            capture.date_stamp
        );

        Ok(Some(CreatedLink {
            kind,
            date_stamp: capture.date_stamp.clone(),
            source: src.to_path_buf(),
            destination: destination.to_path_buf(),
            target,
        }))
    }

    fn ensure_dir(&self, dir: &Path) -> Result<()> {
        if self.fs.exists(dir) {
            return Ok(());
        }
        debug!("Creating directory {}", dir.display());
        self.fs.create_dir(dir).map_err(|source| Error::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
    }
}

/// Insert `-<camera>` before the last occurrence of the video marker:
/// `X.mkv` becomes `X-<camera>.mkv`.
///
/// Names that are not UTF-8 are rewritten byte-wise where the platform allows it; elsewhere they
/// yield `None`.
pub fn name_with_camera(
    file_name: &OsStr,
    camera_name: &str,
    video_marker: &str,
) -> Option<OsString> {
    if let Some(name) = file_name.to_str() {
        let spliced = match name.rfind(video_marker) {
            Some(idx) => format!("{}-{}{}", &name[..idx], camera_name, &name[idx..]),
            None => format!("{}-{}", name, camera_name),
        };
        return Some(OsString::from(spliced));
    }
    splice_bytes(file_name, camera_name, video_marker)
}

#[cfg(unix)]
fn splice_bytes(file_name: &OsStr, camera_name: &str, video_marker: &str) -> Option<OsString> {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    let bytes = file_name.as_bytes();
    let idx = find_last(bytes, video_marker.as_bytes()).unwrap_or(bytes.len());

    let mut spliced = Vec::with_capacity(bytes.len() + camera_name.len() + 1);
    spliced.extend_from_slice(&bytes[..idx]);
    spliced.push(b'-');
    spliced.extend_from_slice(camera_name.as_bytes());
    spliced.extend_from_slice(&bytes[idx..]);
    Some(OsString::from_vec(spliced))
}

#[cfg(not(unix))]
fn splice_bytes(_file_name: &OsStr, _camera_name: &str, _video_marker: &str) -> Option<OsString> {
    None
}

fn find_last(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder;
    use crate::progress::SilentReporter;
    use std::cell::RefCell;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    const CAPTURE_DIR: &str =
        "/data/camera-lobby/20140428/19/20140428_191525_8085_ABC/20140428_19";
    const FILE: &str = "20140428_191525_D751_ABC.mkv";

    fn setup() -> (MemoryFs, LinkerConfig, PathBuf, CaptureDir) {
        let fs = MemoryFs::new();
        let src = Path::new(CAPTURE_DIR).join(FILE);
        fs.add_file(&src);
        let capture = decoder::decode(Path::new("/data"), Path::new(CAPTURE_DIR)).unwrap();
        (fs, LinkerConfig::with_root("/data"), src, capture)
    }

    #[derive(Default)]
    struct Recorder {
        links: RefCell<Vec<CreatedLink>>,
    }

    impl LinkReporter for Recorder {
        fn on_link_created(&self, link: &CreatedLink) {
            self.links.borrow_mut().push(link.clone());
        }
    }

    #[test]
    fn test_name_with_camera() {
        let dated = |name: &str, camera: &str| name_with_camera(OsStr::new(name), camera, ".mkv");
        assert_eq!(dated("X.mkv", "camera-lobby"), Some(OsString::from("X-camera-lobby.mkv")));
        assert_eq!(dated("a.mkv.mkv", "c"), Some(OsString::from("a.mkv-c.mkv")));
    }

    #[cfg(unix)]
    #[test]
    fn test_name_with_camera_keeps_raw_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let name = OsStr::from_bytes(b"caf\xe9.mkv");
        let dated = name_with_camera(name, "camera-lobby", ".mkv").unwrap();
        assert_eq!(dated.as_bytes(), b"caf\xe9-camera-lobby.mkv");
    }

    #[cfg(unix)]
    #[test]
    fn test_link_file_non_utf8_name() {
        use std::os::unix::ffi::OsStrExt;

        let (fs, config, _, capture) = setup();
        let src = Path::new(CAPTURE_DIR).join(OsStr::from_bytes(b"caf\xe9.mkv"));
        fs.add_file(&src);
        let linker = Linker::new(&fs, &config);

        assert!(linker.is_candidate(src.file_name().unwrap()));
        let outcome = linker.link_file(&src, &capture, &SilentReporter).unwrap();
        assert_eq!(outcome.created(), 2);

        let by_camera = Path::new("/data/camera-lobby/20140428").join(OsStr::from_bytes(b"caf\xe9.mkv"));
        assert_eq!(fs.resolve_link(&by_camera), Some(src.clone()));
        let by_date = Path::new("/data/camera-ALL-bydate/20140428")
            .join(OsStr::from_bytes(b"caf\xe9-camera-lobby.mkv"));
        assert_eq!(fs.resolve_link(&by_date), Some(src));
    }

    #[test]
    fn test_is_candidate() {
        let (fs, config, _, _) = setup();
        let linker = Linker::new(&fs, &config);
        assert!(linker.is_candidate(OsStr::new("a.mkv")));
        assert!(linker.is_candidate(OsStr::new("a.mkv.part")));
        assert!(!linker.is_candidate(OsStr::new("index.xml")));
        assert!(!linker.is_candidate(OsStr::new("mkv")));
    }

    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_each_created_link_is_logged_at_info() {
        let (fs, config, src, capture) = setup();
        let linker = Linker::new(&fs, &config);

        let capture_log = LogCapture::default();
        let writer = capture_log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            linker.link_file(&src, &capture, &SilentReporter).unwrap();
        });

        let log = String::from_utf8(capture_log.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = log.lines().filter(|line| line.contains(" link ")).collect();
        assert_eq!(lines.len(), 2, "{log}");
        assert!(lines.iter().all(|line| line.contains("INFO")));
        assert!(lines[0].contains("ByCamera"));
        assert!(lines[1].contains("ByDate"));
        assert!(lines[1].contains("20140428_191525_D751_ABC-camera-lobby.mkv"));
    }

    #[test]
    fn test_link_file_creates_both_links() {
        let (fs, config, src, capture) = setup();
        let linker = Linker::new(&fs, &config);
        let recorder = Recorder::default();

        let outcome = linker.link_file(&src, &capture, &recorder).unwrap();
        assert_eq!(outcome.created(), 2);

        let by_camera = Path::new("/data/camera-lobby/20140428").join(FILE);
        assert_eq!(
            fs.read_link(&by_camera),
            Some(PathBuf::from("19/20140428_191525_8085_ABC/20140428_19").join(FILE))
        );
        assert_eq!(fs.resolve_link(&by_camera), Some(src.clone()));

        let by_date = Path::new(
            "/data/camera-ALL-bydate/20140428/20140428_191525_D751_ABC-camera-lobby.mkv",
        );
        assert_eq!(fs.resolve_link(by_date), Some(src.clone()));

        let links = recorder.links.borrow();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].kind, LinkKind::ByCamera);
        assert_eq!(links[1].kind, LinkKind::ByDate);
        assert_eq!(links[1].date_stamp, "20140428");
    }

    #[test]
    fn test_link_file_is_idempotent() {
        let (fs, config, src, capture) = setup();
        let linker = Linker::new(&fs, &config);

        assert_eq!(linker.link_file(&src, &capture, &SilentReporter).unwrap().created(), 2);
        let before = fs.links();
        assert_eq!(linker.link_file(&src, &capture, &SilentReporter).unwrap().created(), 0);
        assert_eq!(fs.links(), before);
    }

    #[test]
    fn test_link_file_skips_symlink_source() {
        let (fs, config, _, capture) = setup();
        let planted = Path::new(CAPTURE_DIR).join("planted.mkv");
        fs.add_symlink(Path::new(FILE), &planted);
        let linker = Linker::new(&fs, &config);

        let outcome = linker.link_file(&planted, &capture, &SilentReporter).unwrap();
        assert!(outcome.skipped_symlink);
        assert_eq!(outcome.created(), 0);
        assert!(!fs.exists(&config.bydate_root()));
    }

    #[test]
    fn test_existing_destination_is_left_alone() {
        let (fs, config, src, capture) = setup();
        let squatter = Path::new("/data/camera-lobby/20140428").join(FILE);
        fs.add_file(&squatter);
        let linker = Linker::new(&fs, &config);

        let outcome = linker.link_file(&src, &capture, &SilentReporter).unwrap();
        assert!(!outcome.by_camera);
        assert!(outcome.by_date);
        assert_eq!(fs.node(&squatter), Some(Node::File));
    }

    #[test]
    fn test_create_failure_propagates() {
        let (fs, config, src, capture) = setup();
        // A plain file squatting on the by-date root makes the dated directory impossible.
        fs.add_file(&config.bydate_root());
        let linker = Linker::new(&fs, &config);

        let err = linker.link_file(&src, &capture, &SilentReporter).unwrap_err();
        assert!(matches!(err, Error::CreateDir { .. }));
    }
}
