//! Filename decoding for raw session footage.
//!
//! A recording is identified by two tokens embedded in its name: the capture
//! time prefix and the camera tag. Everything else in the name is kept only so
//! it can be reported or dropped when the file is renamed.

use crate::error::{Result, SortError};
use crate::patterns::{RE_CAMERA_TAG, RE_TIMESTAMP_PREFIX};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";

/// Extension of every renamed trial video, whatever the capture device wrote.
pub const TRIAL_VIDEO_EXTENSION: &str = "MP4";

/// One decoded video file. Immutable once built by [`decode_filename`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoRecord {
    pub source_path: PathBuf,
    pub file_name: String,
    /// Capture time truncated to the minute.
    pub capture_timestamp: NaiveDateTime,
    /// `CAMERA` followed by two digits, e.g. `CAMERA03`.
    pub camera_tag: String,
    /// Name up to and including the camera tag, e.g. `20240917_114139-CAMERA03`.
    pub stem_prefix: String,
    /// Device-specific remainder between the camera tag and the extension.
    pub raw_camera_suffix: String,
    /// Extension as written on disk, without the leading dot.
    pub extension: String,
}

impl VideoRecord {
    /// Name used inside `Trial_K/videos_raw`: prefix and camera tag, always
    /// with the `.MP4` extension.
    pub fn normalized_name(&self) -> String {
        format!("{}.{}", self.stem_prefix, TRIAL_VIDEO_EXTENSION)
    }
}

/// Decodes a video path into a [`VideoRecord`].
///
/// Fails with [`SortError::MalformedFilename`] when the name is not UTF-8,
/// has no parseable `YYYYMMDD_HHMM` prefix or has no `CAMERA<NN>` tag.
pub fn decode_filename(path: &Path) -> Result<VideoRecord> {
    let raw_name = path
        .file_name()
        .ok_or_else(|| malformed(path.display().to_string(), "path has no file name"))?;
    let file_name = raw_name
        .to_str()
        .map(str::to_string)
        .ok_or_else(|| {
            malformed(raw_name.to_string_lossy().into_owned(), "name is not valid UTF-8")
        })?;

    let prefix = RE_TIMESTAMP_PREFIX
        .captures(&file_name)
        .and_then(|c| c.get(1))
        .ok_or_else(|| malformed(file_name.clone(), "missing YYYYMMDD_HHMM prefix"))?;
    let capture_timestamp = NaiveDateTime::parse_from_str(prefix.as_str(), TIMESTAMP_FORMAT)
        .map_err(|e| malformed(file_name.clone(), &format!("invalid capture time: {}", e)))?;

    let tag = RE_CAMERA_TAG
        .find(&file_name)
        .ok_or_else(|| malformed(file_name.clone(), "missing CAMERA<NN> tag"))?;

    let (stem, extension) = match file_name.rfind('.') {
        Some(dot) if dot >= tag.end() => (&file_name[..dot], &file_name[dot + 1..]),
        _ => (file_name.as_str(), ""),
    };

    Ok(VideoRecord {
        source_path: path.to_path_buf(),
        capture_timestamp,
        camera_tag: tag.as_str().to_string(),
        stem_prefix: file_name[..tag.end()].to_string(),
        raw_camera_suffix: stem[tag.end()..].to_string(),
        extension: extension.to_string(),
        file_name: file_name.clone(),
    })
}

fn malformed(file: String, reason: &str) -> SortError {
    SortError::MalformedFilename {
        file,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_decode_gopro_labs_name() {
        let record =
            decode_filename(Path::new("/session/20240917_114139-CAMERA02-GX010042.MP4")).unwrap();

        assert_eq!(record.camera_tag, "CAMERA02");
        assert_eq!(record.stem_prefix, "20240917_114139-CAMERA02");
        assert_eq!(record.raw_camera_suffix, "-GX010042");
        assert_eq!(record.extension, "MP4");
        assert_eq!(record.capture_timestamp.hour(), 11);
        assert_eq!(record.capture_timestamp.minute(), 41);
        assert_eq!(record.capture_timestamp.second(), 0);
        assert_eq!(record.normalized_name(), "20240917_114139-CAMERA02.MP4");
    }

    #[test]
    fn test_seconds_are_ignored() {
        let a = decode_filename(Path::new("20240917_114101-CAMERA01.MP4")).unwrap();
        let b = decode_filename(Path::new("20240917_114159-CAMERA02.MP4")).unwrap();
        assert_eq!(a.capture_timestamp, b.capture_timestamp);
    }

    #[test]
    fn test_name_without_suffix() {
        let record = decode_filename(Path::new("20240917_1141CAMERA11.mp4")).unwrap();
        assert_eq!(record.camera_tag, "CAMERA11");
        assert_eq!(record.raw_camera_suffix, "");
        assert_eq!(record.extension, "mp4");
        assert_eq!(record.normalized_name(), "20240917_1141CAMERA11.MP4");
    }

    #[test]
    fn test_missing_timestamp_is_malformed() {
        let err = decode_filename(Path::new("GX010042-CAMERA01.MP4")).unwrap_err();
        assert_eq!(err.kind(), "MalformedFilename");
    }

    #[test]
    fn test_impossible_date_is_malformed() {
        let err = decode_filename(Path::new("20241317_1141-CAMERA01.MP4")).unwrap_err();
        assert!(matches!(err, SortError::MalformedFilename { .. }));
    }

    #[test]
    fn test_missing_camera_tag_is_malformed() {
        let err = decode_filename(Path::new("20240917_114139-GX010042.MP4")).unwrap_err();
        match err {
            SortError::MalformedFilename { file, reason } => {
                assert_eq!(file, "20240917_114139-GX010042.MP4");
                assert!(reason.contains("CAMERA"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_is_malformed() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let name = OsStr::from_bytes(b"20240917_1141-CAMERA01-\xff.MP4");
        let err = decode_filename(Path::new(name)).unwrap_err();
        match err {
            SortError::MalformedFilename { reason, .. } => assert!(reason.contains("UTF-8")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
