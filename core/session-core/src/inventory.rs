//! Session inventory: which recordings exist and which cameras made them.
//!
//! Only regular files directly inside the session directory are considered.
//! Records are ordered by `(capture minute, camera tag, file name)`. Seconds
//! are left out of the key so cameras started a few seconds apart still land
//! in the same group.

use crate::decoder::{decode_filename, VideoRecord};
use crate::error::{Result, SortError};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Distinct camera tags of a session, sorted. Position `k` is camera `k + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraSet {
    tags: Vec<String>,
}

impl CameraSet {
    pub fn from_records(records: &[VideoRecord]) -> Self {
        let tags: BTreeSet<&str> = records.iter().map(|r| r.camera_tag.as_str()).collect();
        Self {
            tags: tags.into_iter().map(str::to_string).collect(),
        }
    }

    /// Number of cameras (`nbcam`).
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.binary_search_by(|t| t.as_str().cmp(tag)).is_ok()
    }
}

/// A file that looked like footage but could not be decoded.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Ordered, decoded recordings of one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInventory {
    pub records: Vec<VideoRecord>,
    pub cameras: CameraSet,
    pub skipped: Vec<SkippedFile>,
}

impl SessionInventory {
    /// Scans `dir` for files with `extension` (case-insensitive, with or
    /// without the leading dot) and decodes them.
    ///
    /// Undecodable files are logged and listed in `skipped`; the scan only
    /// fails when nothing usable remains.
    pub fn scan(dir: &Path, extension: &str) -> Result<Self> {
        if !dir.is_dir() {
            return Err(SortError::io(
                format!("scanning session {}", dir.display()),
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }

        let wanted = extension.trim_start_matches('.').to_lowercase();
        let mut records = Vec::new();
        let mut skipped = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(readable_entry)
            .filter(|e| e.file_type().is_file())
        {
            let matches_extension = entry
                .path()
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().to_lowercase() == wanted);
            if !matches_extension {
                continue;
            }

            match decode_filename(entry.path()) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(
                        file = %entry.path().display(),
                        error = %err,
                        "Skipping undecodable video file"
                    );
                    let reason = match err {
                        SortError::MalformedFilename { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    skipped.push(SkippedFile {
                        path: entry.into_path(),
                        reason,
                    });
                }
            }
        }

        if records.is_empty() {
            return Err(SortError::NoVideosFound {
                dir: dir.to_path_buf(),
                extension: extension.to_string(),
            });
        }

        Ok(Self::from_records(records, skipped))
    }

    /// Builds an inventory from already-decoded records, applying the
    /// canonical ordering.
    pub fn from_records(mut records: Vec<VideoRecord>, skipped: Vec<SkippedFile>) -> Self {
        sort_records(&mut records);
        let cameras = CameraSet::from_records(&records);
        tracing::info!(
            files = records.len(),
            cameras = cameras.len(),
            skipped = skipped.len(),
            "Session inventory built"
        );
        Self {
            records,
            cameras,
            skipped,
        }
    }

    pub fn nbfiles(&self) -> usize {
        self.records.len()
    }

    pub fn nbcam(&self) -> usize {
        self.cameras.len()
    }
}

/// Keeps readable walk entries and logs the rest.
pub(crate) fn readable_entry(entry: walkdir::Result<DirEntry>) -> Option<DirEntry> {
    match entry {
        Ok(entry) => Some(entry),
        Err(err) => {
            tracing::warn!(
                path = ?err.path(),
                error = %err,
                "Skipping unreadable directory entry"
            );
            None
        }
    }
}

/// Sorts by capture minute, then camera tag, then file name.
pub fn sort_records(records: &mut [VideoRecord]) {
    records.sort_by(|a, b| {
        a.capture_timestamp
            .cmp(&b.capture_timestamp)
            .then_with(|| a.camera_tag.cmp(&b.camera_tag))
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs_err as fs;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), name.as_bytes()).unwrap();
    }

    #[test]
    fn test_scan_orders_by_minute_then_camera() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "20240917_1205-CAMERA01.MP4");
        touch(dir.path(), "20240917_114159-CAMERA02.MP4");
        touch(dir.path(), "20240917_114102-CAMERA01.MP4");
        touch(dir.path(), "20240917_120500-CAMERA02.mp4");

        let inventory = SessionInventory::scan(dir.path(), ".MP4").unwrap();
        let names: Vec<_> = inventory
            .records
            .iter()
            .map(|r| r.file_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "20240917_114102-CAMERA01.MP4",
                "20240917_114159-CAMERA02.MP4",
                "20240917_1205-CAMERA01.MP4",
                "20240917_120500-CAMERA02.mp4",
            ]
        );
        assert_eq!(inventory.nbcam(), 2);
        assert_eq!(inventory.cameras.tags(), ["CAMERA01", "CAMERA02"]);
    }

    #[test]
    fn test_scan_skips_other_extensions_and_malformed_names() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "20240917_1141-CAMERA01.MP4");
        touch(dir.path(), "GX010042.MP4");
        touch(dir.path(), "Config.toml");
        touch(dir.path(), "20240917_1141-CAMERA02.MOV");
        fs::create_dir(dir.path().join("20240917_1141-CAMERA03.MP4")).unwrap();

        let inventory = SessionInventory::scan(dir.path(), "mp4").unwrap();
        assert_eq!(inventory.nbfiles(), 1);
        assert_eq!(inventory.skipped.len(), 1);
        assert!(inventory.skipped[0].path.ends_with("GX010042.MP4"));
    }

    #[test]
    fn test_scan_empty_directory_fails() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "Config.toml");

        let err = SessionInventory::scan(dir.path(), ".MP4").unwrap_err();
        assert_eq!(err.kind(), "NoVideosFound");
    }

    #[test]
    fn test_scan_missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let err = SessionInventory::scan(&dir.path().join("absent"), ".MP4").unwrap_err();
        assert_eq!(err.kind(), "Io");
    }

    #[test]
    fn test_camera_set_contains() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "20240917_1141-CAMERA03.MP4");
        touch(dir.path(), "20240917_1141-CAMERA01.MP4");

        let inventory = SessionInventory::scan(dir.path(), ".MP4").unwrap();
        assert!(inventory.cameras.contains("CAMERA03"));
        assert!(!inventory.cameras.contains("CAMERA02"));
    }

    #[test]
    fn test_unreadable_entries_are_dropped() {
        let dir = tempdir().unwrap();
        let entries: Vec<_> = WalkDir::new(dir.path().join("absent"))
            .into_iter()
            .filter_map(readable_entry)
            .collect();
        assert!(entries.is_empty());
    }
}
