//! Date-partitioned artifact storage on the local filesystem.
//!
//! Layout: `{root}/{YYYYMMDD}/{base}_{millis}.{ext}` where `YYYYMMDD` is the
//! local creation date and `millis` a per-store monotonic millisecond stamp.
//! Files are created with `create_new`, so an existing artifact is never
//! overwritten.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Local};
use docport_core::defaults::PARTITION_DATE_FORMAT;
use docport_core::{artifact_base_name, Error, Result, RetentionPolicy};
use tokio::fs;
use tracing::{debug, info, warn};

/// A file written into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Retrieval key, `{YYYYMMDD}/{filename}`.
    pub relative_path: String,
    pub absolute_path: PathBuf,
    /// Local creation time; drives the displayed expiry.
    pub created: DateTime<Local>,
}

/// A validated retrieval key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactKey {
    pub date: String,
    pub filename: String,
}

impl ArtifactKey {
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.date, self.filename)
    }
}

/// Filesystem artifact store rooted at one data directory.
#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    retention: RetentionPolicy,
    last_stamp: AtomicI64,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>, retention: RetentionPolicy) -> Self {
        Self {
            root: root.into(),
            retention,
            last_stamp: AtomicI64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Round-trip a probe file through the root to catch permission or
    /// mount problems at startup.
    pub async fn validate(&self) -> Result<()> {
        let test_dir = self.root.join(".health-check");
        let test_file = test_dir.join("probe.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| Error::Store(format!("create_dir_all({:?}): {}", test_dir, e)))?;

        let data = b"artifact-store-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| Error::Store(format!("write({:?}): {}", test_file, e)))?;

        let read_back = fs::read(&test_file)
            .await
            .map_err(|e| Error::Store(format!("read({:?}): {}", test_file, e)))?;
        if read_back != data {
            return Err(Error::Store("read-back mismatch".to_string()));
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| Error::Store(format!("remove_file({:?}): {}", test_file, e)))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }

    /// Copy `source` into today's partition under a fresh unique name.
    ///
    /// The name is `{base}_{millis}.{target_ext}` where `base` is the
    /// sanitized client filename without its last extension.
    pub async fn persist(
        &self,
        source: &Path,
        original_filename: &str,
        target_ext: &str,
    ) -> Result<StoredArtifact> {
        self.persist_at(source, original_filename, target_ext, Local::now())
            .await
    }

    pub(crate) async fn persist_at(
        &self,
        source: &Path,
        original_filename: &str,
        target_ext: &str,
        now: DateTime<Local>,
    ) -> Result<StoredArtifact> {
        let date = now.format(PARTITION_DATE_FORMAT).to_string();
        let stamp = self.next_stamp(now.timestamp_millis());
        let filename = format!(
            "{}_{}.{}",
            artifact_base_name(original_filename),
            stamp,
            target_ext.to_ascii_lowercase()
        );
        let partition = self.root.join(&date);
        let absolute_path = partition.join(&filename);

        let mut src = fs::File::open(source)
            .await
            .map_err(|e| Error::Store(format!("open({:?}): {}", source, e)))?;

        let dst = match self.create_new(&partition, &absolute_path).await {
            Ok(file) => file,
            // A concurrent sweep may remove the partition directory while it
            // is still empty; recreate it once.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self
                .create_new(&partition, &absolute_path)
                .await
                .map_err(|e| Error::Store(format!("create({:?}): {}", absolute_path, e)))?,
            Err(e) => {
                return Err(Error::Store(format!(
                    "create({:?}): {}",
                    absolute_path, e
                )))
            }
        };

        let copied = match write_artifact(&mut src, dst, source, &absolute_path).await {
            Ok(n) => n,
            Err(reason) => return Err(discard_partial(&absolute_path, reason).await),
        };

        let relative_path = format!("{}/{}", date, filename);
        info!(
            relative_path = %relative_path,
            size = copied,
            "artifact_store: persisted"
        );

        Ok(StoredArtifact {
            relative_path,
            absolute_path,
            created: now,
        })
    }

    async fn create_new(&self, partition: &Path, path: &Path) -> std::io::Result<fs::File> {
        fs::create_dir_all(partition).await.map_err(|e| {
            warn!(partition = %partition.display(), error = %e, "artifact_store: create_dir_all failed");
            e
        })?;
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
    }

    /// Millisecond stamp strictly greater than any previously issued by this
    /// store.
    fn next_stamp(&self, now_millis: i64) -> i64 {
        let mut prev = self.last_stamp.load(Ordering::Relaxed);
        loop {
            let next = now_millis.max(prev + 1);
            match self.last_stamp.compare_exchange_weak(
                prev,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    /// Validate a retrieval key without touching the filesystem.
    ///
    /// A key is exactly `{date}/{filename}`: `date` is eight ASCII digits and
    /// `filename` is a single non-empty segment other than `.` or `..` that
    /// contains no backslash or NUL.
    pub fn parse_key(relative: &str) -> Result<ArtifactKey> {
        let invalid = || Error::InvalidPath(relative.to_string());

        let mut segments = relative.split('/');
        let (Some(date), Some(filename), None) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(invalid());
        };

        if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if filename.is_empty()
            || filename == "."
            || filename == ".."
            || filename.contains(['\\', '\0'])
        {
            return Err(invalid());
        }

        Ok(ArtifactKey {
            date: date.to_string(),
            filename: filename.to_string(),
        })
    }

    /// Map a retrieval key to the absolute path of an existing artifact.
    pub async fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let key = Self::parse_key(relative)?;
        let path = self.root.join(&key.date).join(&key.filename);

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(Error::NotFound(key.relative_path())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(relative_path = %relative, "artifact_store: not found");
                Err(Error::NotFound(key.relative_path()))
            }
            Err(e) => Err(Error::Store(format!("stat({:?}): {}", path, e))),
        }
    }
}

/// Copy, fsync and set permissions on a freshly created artifact. `dst` is
/// closed before returning on every path.
async fn write_artifact(
    src: &mut fs::File,
    mut dst: fs::File,
    source: &Path,
    path: &Path,
) -> std::result::Result<u64, String> {
    let copied = tokio::io::copy(src, &mut dst)
        .await
        .map_err(|e| format!("copy({:?} -> {:?}): {}", source, path, e))?;
    dst.sync_all()
        .await
        .map_err(|e| format!("sync_all({:?}): {}", path, e))?;
    drop(dst);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
            .await
            .map_err(|e| format!("set_permissions({:?}): {}", path, e))?;
    }

    Ok(copied)
}

/// Remove a partially written artifact so no half-committed file stays
/// under a key the caller never receives.
async fn discard_partial(path: &Path, reason: String) -> Error {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(path = %path.display(), error = %e, "artifact_store: remove of partial artifact failed")
        }
    }
    warn!(path = %path.display(), reason = %reason, "artifact_store: discarded partial artifact");
    Error::Store(reason)
}
