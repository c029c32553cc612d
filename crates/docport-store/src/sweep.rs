//! Retention sweep over the artifact tree.
//!
//! Deletes regular files whose age exceeds the retention window, then
//! removes directories left empty, deepest first. The store root itself is
//! never removed. Failures on individual entries are logged and counted; a
//! sweep never aborts part-way.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::artifact_store::ArtifactStore;

/// What one sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub files_scanned: usize,
    pub files_deleted: usize,
    pub dirs_removed: usize,
    pub errors: usize,
}

impl ArtifactStore {
    /// Run one sweep as of `now`. A no-op under infinite retention.
    ///
    /// Age is measured from each file's modification time; artifacts are
    /// written once and never modified afterwards.
    pub fn sweep(&self, now: SystemTime) -> SweepReport {
        let mut report = SweepReport::default();
        let Some(window) = self.retention().window() else {
            debug!("sweep: retention is infinite, skipping");
            return report;
        };
        if !self.root().is_dir() {
            debug!(root = %self.root().display(), "sweep: root missing, nothing to do");
            return report;
        }

        delete_expired_files(self.root(), now, window, &mut report);
        remove_empty_dirs(self.root(), &mut report);

        info!(
            files_scanned = report.files_scanned,
            files_deleted = report.files_deleted,
            dirs_removed = report.dirs_removed,
            errors = report.errors,
            "sweep: complete"
        );
        report
    }
}

fn delete_expired_files(root: &Path, now: SystemTime, window: Duration, report: &mut SweepReport) {
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "sweep: walk failed");
                report.errors += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        report.files_scanned += 1;

        let modified = match entry.metadata().map_err(|e| e.to_string()).and_then(|m| {
            m.modified().map_err(|e| e.to_string())
        }) {
            Ok(modified) => modified,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "sweep: stat failed");
                report.errors += 1;
                continue;
            }
        };

        // Files stamped in the future have age zero.
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age <= window {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => {
                info!(
                    path = %entry.path().display(),
                    age_secs = age.as_secs(),
                    "sweep: deleted expired artifact"
                );
                report.files_deleted += 1;
            }
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "sweep: delete failed");
                report.errors += 1;
            }
        }
    }
}

fn remove_empty_dirs(root: &Path, report: &mut SweepReport) {
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "sweep: walk failed");
                report.errors += 1;
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let is_empty = match fs::read_dir(entry.path()) {
            Ok(mut children) => children.next().is_none(),
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "sweep: read_dir failed");
                report.errors += 1;
                continue;
            }
        };
        if !is_empty {
            continue;
        }

        match fs::remove_dir(entry.path()) {
            Ok(()) => {
                debug!(path = %entry.path().display(), "sweep: removed empty directory");
                report.dirs_removed += 1;
            }
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "sweep: remove_dir failed");
                report.errors += 1;
            }
        }
    }
}
