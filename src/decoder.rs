//! Recovers camera and date from a capture directory's position in the recorder tree.
//!
//! A capture file always sits at `ROOT/CAMERA/DATE/HOUR/CAPTURE_ID/DATE_HOUR/FILE`, so its directory
//! is decoded by position below the root:
//!
//! ```text
//!  root            camera       date     hour capture id                date_hour
//! /data/ipcameras/camera-lobby/20140428/19/20140428_191525_8085_ABC/20140428_19
//! ```
//!
//! No filesystem access happens here.

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Segments between the root and a capture file: camera, date, hour, capture id, date_hour.
pub const EXPECTED_DEPTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureDir {
    pub camera_name: String,
    pub date_stamp: String,
    /// `ROOT/CAMERA/DATE`: destination of by-camera links and base of their relative targets.
    pub camera_root: PathBuf,
}

/// Decode `dir`, which must sit exactly `EXPECTED_DEPTH` levels below `root`.
pub fn decode(root: &Path, dir: &Path) -> Result<CaptureDir> {
    let malformed = |depth: usize| Error::MalformedPath {
        path: dir.to_path_buf(),
        depth,
    };

    let relative = dir.strip_prefix(root).map_err(|_| malformed(0))?;
    let segments: Vec<&OsStr> = relative.iter().collect();
    if segments.len() != EXPECTED_DEPTH {
        return Err(malformed(segments.len()));
    }

    let utf8 = |segment: &OsStr| {
        segment
            .to_str()
            .map(str::to_string)
            .ok_or_else(|| Error::NonUtf8Segment {
                path: dir.to_path_buf(),
            })
    };

    Ok(CaptureDir {
        camera_name: utf8(segments[0])?,
        date_stamp: utf8(segments[1])?,
        camera_root: root.join(segments[0]).join(segments[1]),
    })
}
