//! Per-request scratch directories.
//!
//! A [`Workspace`] is a fresh `<tmp-root>/work_<uuid>` directory holding the
//! staged input and whatever the engine writes. It is removed recursively
//! when the value is dropped, so every exit path of a conversion (success,
//! error, panic, or a cancelled request future) cleans up.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use docport_core::defaults::WORKSPACE_PREFIX;
use docport_core::{input_extension, Error, Result};

#[derive(Debug)]
pub struct Workspace {
    id: Uuid,
    dir: PathBuf,
}

/// The input file as written into a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedInput {
    pub path: PathBuf,
    /// File stem, the workspace UUID.
    pub stem: String,
    /// Lower-cased original extension including the dot.
    pub ext: Option<String>,
}

impl Workspace {
    /// Create a new workspace under `tmp_root`, creating the root if needed.
    pub async fn create(tmp_root: &Path) -> Result<Self> {
        fs::create_dir_all(tmp_root)
            .await
            .map_err(|e| Error::Internal(format!("create_dir_all({:?}): {}", tmp_root, e)))?;

        let id = Uuid::new_v4();
        let dir = tmp_root.join(format!("{}{}", WORKSPACE_PREFIX, id));
        fs::create_dir(&dir)
            .await
            .map_err(|e| Error::Internal(format!("create_dir({:?}): {}", dir, e)))?;

        debug!(work_dir = %dir.display(), "workspace: created");
        Ok(Self { id, dir })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Write the uploaded bytes as `<uuid><ext>`, where `ext` is the
    /// lower-cased extension of the client filename (dropped when unsafe).
    pub async fn stage_input(&self, data: &[u8], original_filename: &str) -> Result<StagedInput> {
        let stem = self.id.to_string();
        let ext = input_extension(original_filename);
        let path = self
            .dir
            .join(format!("{}{}", stem, ext.as_deref().unwrap_or_default()));

        fs::write(&path, data).await?;
        debug!(input = %path.display(), size = data.len(), "workspace: staged input");

        Ok(StagedInput { path, stem, ext })
    }

    /// Names of every entry in the workspace, for diagnostics.
    pub async fn listing(&self) -> Vec<String> {
        list_dir(&self.dir).await
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => debug!(work_dir = %self.dir.display(), "workspace: removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(work_dir = %self.dir.display(), error = %e, "workspace: cleanup failed"),
        }
    }
}

/// Sorted entry names of `dir`; unreadable directories list as empty.
pub(crate) async fn list_dir(dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "workspace: read_dir failed");
            return names;
        }
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_makes_prefixed_dir() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::create(tmp.path()).await.unwrap();
        assert!(ws.path().is_dir());
        let name = ws.path().file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, format!("work_{}", ws.id()));
    }

    #[tokio::test]
    async fn test_create_makes_missing_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("nested/tmp");
        let ws = Workspace::create(&root).await.unwrap();
        assert!(ws.path().starts_with(&root));
    }

    #[tokio::test]
    async fn test_drop_removes_directory_and_contents() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::create(tmp.path()).await.unwrap();
        let dir = ws.path().to_path_buf();
        ws.stage_input(b"data", "report.docx").await.unwrap();
        std::fs::create_dir(dir.join("sub")).unwrap();
        std::fs::write(dir.join("sub/out.pdf"), b"x").unwrap();

        drop(ws);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_drop_tolerates_already_removed_dir() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::create(tmp.path()).await.unwrap();
        std::fs::remove_dir_all(ws.path()).unwrap();
        drop(ws);
    }

    #[tokio::test]
    async fn test_stage_input_uses_uuid_and_lowercase_ext() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::create(tmp.path()).await.unwrap();

        let staged = ws.stage_input(b"bytes", "My Report.DOCX").await.unwrap();

        assert_eq!(staged.stem, ws.id().to_string());
        assert_eq!(staged.ext.as_deref(), Some(".docx"));
        assert_eq!(staged.path, ws.path().join(format!("{}.docx", ws.id())));
        assert_eq!(std::fs::read(&staged.path).unwrap(), b"bytes");
    }

    #[tokio::test]
    async fn test_stage_input_drops_unsafe_ext() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::create(tmp.path()).await.unwrap();

        let staged = ws.stage_input(b"bytes", "evil.d/../x").await.unwrap();

        assert_eq!(staged.ext, None);
        assert_eq!(staged.path, ws.path().join(ws.id().to_string()));
    }

    #[tokio::test]
    async fn test_listing_is_sorted() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::create(tmp.path()).await.unwrap();
        std::fs::write(ws.path().join("b.txt"), b"").unwrap();
        std::fs::write(ws.path().join("a.txt"), b"").unwrap();
        assert_eq!(ws.listing().await, vec!["a.txt", "b.txt"]);
    }
}
