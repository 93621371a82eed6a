//! Trial partitioning.
//!
//! Recordings are taken in a fixed order: intrinsics, extrinsics, then
//! trials, one file per camera each time. The calibration state tells how many
//! leading groups are calibration footage; the rest are trials.
//!
//! Camera indices are positional: inside a group, the Kth record by camera tag
//! is camera `K + 1`, whatever its physical tag.

use crate::calibration::CalibrationState;
use crate::decoder::VideoRecord;
use crate::error::{Result, SortError};
use crate::inventory::CameraSet;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

/// What a group of recordings is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupRole {
    Intrinsics,
    Extrinsics,
    /// Trial number, starting at 1.
    Trial(usize),
}

/// `nbcam` recordings, one per camera, sorted by camera tag.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub role: GroupRole,
    pub records: Vec<VideoRecord>,
}

impl Group {
    /// Records paired with their 1-based camera index.
    pub fn indexed_records(&self) -> impl Iterator<Item = (usize, &VideoRecord)> {
        self.records.iter().enumerate().map(|(k, r)| (k + 1, r))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Partition {
    pub state: CalibrationState,
    pub nbfiles: usize,
    pub nbcam: usize,
    pub reserved_groups: usize,
    pub nbtrials: usize,
    pub groups: Vec<Group>,
}

impl Partition {
    pub fn calibration_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups
            .iter()
            .filter(|g| !matches!(g.role, GroupRole::Trial(_)))
    }

    pub fn trial_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups
            .iter()
            .filter(|g| matches!(g.role, GroupRole::Trial(_)))
    }
}

/// Computes the number of trials for a file count, without slicing.
///
/// Fails with [`SortError::FileCountMismatch`] when the files left after the
/// calibration groups do not split evenly across cameras.
pub fn trial_count(nbfiles: usize, nbcam: usize, state: CalibrationState) -> Result<usize> {
    let reserved_groups = state.reserved_groups();
    let mismatch = || SortError::FileCountMismatch {
        nbfiles,
        nbcam,
        reserved_groups,
    };

    if nbcam == 0 {
        return Err(mismatch());
    }
    let remaining = nbfiles
        .checked_sub(reserved_groups * nbcam)
        .ok_or_else(mismatch)?;
    if remaining % nbcam != 0 {
        return Err(mismatch());
    }
    Ok(remaining / nbcam)
}

/// Slices sorted records into calibration and trial groups.
///
/// `records` must already be in inventory order. Nothing is produced when the
/// counts do not line up or a group misses a camera.
pub fn partition(
    records: &[VideoRecord],
    cameras: &CameraSet,
    state: CalibrationState,
) -> Result<Partition> {
    let nbfiles = records.len();
    let nbcam = cameras.len();
    let nbtrials = match trial_count(nbfiles, nbcam, state) {
        Ok(n) => n,
        Err(err) => {
            let minutes = incomplete_minutes(records, nbcam);
            if !minutes.is_empty() {
                tracing::warn!(
                    minutes = ?minutes,
                    "Capture minutes with a file count that is not a multiple of the camera count"
                );
            }
            return Err(err);
        }
    };
    let reserved_groups = state.reserved_groups();

    let roles = group_roles(state, nbtrials);
    let mut groups = Vec::with_capacity(roles.len());
    for (index, (role, chunk)) in roles.into_iter().zip(records.chunks(nbcam)).enumerate() {
        let mut group_records = chunk.to_vec();
        group_records.sort_by(|a, b| a.camera_tag.cmp(&b.camera_tag));
        check_covers_cameras(index, &group_records, cameras)?;
        groups.push(Group {
            role,
            records: group_records,
        });
    }

    tracing::info!(
        nbfiles,
        nbcam,
        reserved_groups,
        nbtrials,
        "Session partitioned"
    );

    Ok(Partition {
        state,
        nbfiles,
        nbcam,
        reserved_groups,
        nbtrials,
        groups,
    })
}

/// Capture minutes whose record count is not a multiple of `nbcam`.
///
/// A trial missing one camera shows up here, which helps locate the gap when
/// the totals do not divide.
pub fn incomplete_minutes(records: &[VideoRecord], nbcam: usize) -> Vec<NaiveDateTime> {
    if nbcam == 0 {
        return Vec::new();
    }
    let mut per_minute: BTreeMap<NaiveDateTime, usize> = BTreeMap::new();
    for record in records {
        *per_minute.entry(record.capture_timestamp).or_default() += 1;
    }
    per_minute
        .into_iter()
        .filter(|(_, count)| count % nbcam != 0)
        .map(|(minute, _)| minute)
        .collect()
}

fn group_roles(state: CalibrationState, nbtrials: usize) -> Vec<GroupRole> {
    let calibration: &[GroupRole] = match state {
        CalibrationState::None => &[GroupRole::Intrinsics, GroupRole::Extrinsics],
        CalibrationState::IntrinsicsOnly => &[GroupRole::Extrinsics],
        CalibrationState::Full => &[],
    };
    calibration
        .iter()
        .copied()
        .chain((1..=nbtrials).map(GroupRole::Trial))
        .collect()
}

fn check_covers_cameras(index: usize, records: &[VideoRecord], cameras: &CameraSet) -> Result<()> {
    let found: Vec<String> = records.iter().map(|r| r.camera_tag.clone()).collect();
    if found.as_slice() != cameras.tags() {
        return Err(SortError::InconsistentCameraSet {
            group: index,
            expected: cameras.tags().to_vec(),
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_filename;
    use crate::inventory::SessionInventory;
    use std::path::Path;

    /// Builds an inventory of `groups` capture minutes with one file per camera.
    fn inventory(nbcam: usize, groups: usize) -> SessionInventory {
        let mut records = Vec::new();
        for g in 0..groups {
            for c in (1..=nbcam).rev() {
                let name = format!("20240917_10{:02}{:02}-CAMERA{:02}-GX01.MP4", g, c, c);
                records.push(decode_filename(Path::new(&name)).unwrap());
            }
        }
        SessionInventory::from_records(records, Vec::new())
    }

    #[test]
    fn test_trial_count_per_state() {
        assert_eq!(trial_count(12, 3, CalibrationState::None).unwrap(), 2);
        assert_eq!(trial_count(12, 3, CalibrationState::IntrinsicsOnly).unwrap(), 3);
        assert_eq!(trial_count(12, 3, CalibrationState::Full).unwrap(), 4);
        assert_eq!(trial_count(6, 3, CalibrationState::None).unwrap(), 0);
    }

    #[test]
    fn test_trial_count_mismatch_reports_inputs() {
        let err = trial_count(11, 3, CalibrationState::None).unwrap_err();
        match err {
            SortError::FileCountMismatch {
                nbfiles,
                nbcam,
                reserved_groups,
            } => {
                assert_eq!((nbfiles, nbcam, reserved_groups), (11, 3, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_trial_count_too_few_files_for_calibration() {
        let err = trial_count(3, 3, CalibrationState::None).unwrap_err();
        assert_eq!(err.kind(), "FileCountMismatch");
    }

    #[test]
    fn test_trial_count_divisibility_property() {
        for nbcam in 1..=5 {
            for state in [
                CalibrationState::None,
                CalibrationState::IntrinsicsOnly,
                CalibrationState::Full,
            ] {
                for nbfiles in 0..40 {
                    let reserved = state.reserved_groups() * nbcam;
                    let expected_ok = nbfiles >= reserved && (nbfiles - reserved) % nbcam == 0;
                    match trial_count(nbfiles, nbcam, state) {
                        Ok(n) => {
                            assert!(expected_ok);
                            assert_eq!(n * nbcam + reserved, nbfiles);
                        }
                        Err(_) => assert!(!expected_ok),
                    }
                }
            }
        }
    }

    #[test]
    fn test_partition_assigns_roles_in_order() {
        let inv = inventory(3, 4);
        let partition = partition(&inv.records, &inv.cameras, CalibrationState::None).unwrap();

        assert_eq!(partition.nbtrials, 2);
        let roles: Vec<_> = partition.groups.iter().map(|g| g.role).collect();
        assert_eq!(
            roles,
            vec![
                GroupRole::Intrinsics,
                GroupRole::Extrinsics,
                GroupRole::Trial(1),
                GroupRole::Trial(2),
            ]
        );
        assert_eq!(partition.calibration_groups().count(), 2);
        assert_eq!(partition.trial_groups().count(), 2);
        assert!(partition.groups.iter().all(|g| g.records.len() == 3));
    }

    #[test]
    fn test_partition_intrinsics_only_starts_with_extrinsics() {
        let inv = inventory(2, 3);
        let partition =
            partition(&inv.records, &inv.cameras, CalibrationState::IntrinsicsOnly).unwrap();

        assert_eq!(partition.groups[0].role, GroupRole::Extrinsics);
        assert_eq!(partition.groups[1].role, GroupRole::Trial(1));
        assert_eq!(partition.groups[2].role, GroupRole::Trial(2));
    }

    #[test]
    fn test_camera_index_is_positional() {
        let inv = inventory(3, 2);
        let partition = partition(&inv.records, &inv.cameras, CalibrationState::Full).unwrap();

        for group in &partition.groups {
            let tags: Vec<_> = group
                .indexed_records()
                .map(|(k, r)| (k, r.camera_tag.as_str()))
                .collect();
            assert_eq!(tags, vec![(1, "CAMERA01"), (2, "CAMERA02"), (3, "CAMERA03")]);
        }
    }

    #[test]
    fn test_group_missing_camera_is_inconsistent() {
        let names = [
            "20240917_1000-CAMERA01.MP4",
            "20240917_1000-CAMERA02.MP4",
            "20240917_1001-CAMERA01.MP4",
            "20240917_1001-CAMERA01-retake.MP4",
        ];
        let records = names
            .iter()
            .map(|n| decode_filename(Path::new(n)).unwrap())
            .collect();
        let inv = SessionInventory::from_records(records, Vec::new());

        let err = partition(&inv.records, &inv.cameras, CalibrationState::Full).unwrap_err();
        match err {
            SortError::InconsistentCameraSet { group, found, .. } => {
                assert_eq!(group, 1);
                assert_eq!(found, vec!["CAMERA01", "CAMERA01"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_incomplete_minutes_points_at_gap() {
        let mut inv = inventory(3, 3);
        inv.records.remove(4);

        let minutes = incomplete_minutes(&inv.records, 3);
        assert_eq!(minutes.len(), 1);
        assert_eq!(minutes[0], inv.records[3].capture_timestamp);
    }
}
