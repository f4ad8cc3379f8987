//! Filesystem-backed image store.
//!
//! Stores uploaded recipe images under `<root>/recipe/<uuid>.<ext>` and
//! returns the root-relative path as the reference persisted on the recipe
//! row. Filenames are generated server-side; nothing from the client reaches
//! the filesystem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ports::{ImageStore, ImageStoreError};

const RECIPE_DIR: &str = "recipe";

/// Image store rooted at a media directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, reference: &str) -> Result<PathBuf, ImageStoreError> {
        // References are server-generated; anything else is refused outright.
        let path = Path::new(reference);
        let traversal = path.components().any(|component| {
            !matches!(component, std::path::Component::Normal(_))
        });
        if traversal {
            return Err(ImageStoreError::io(format!(
                "refusing suspicious image reference: {reference}"
            )));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(&self, data: Vec<u8>, extension: &str) -> Result<String, ImageStoreError> {
        let reference = format!("{RECIPE_DIR}/{}.{extension}", Uuid::new_v4());
        let target = self.resolve(&reference)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| ImageStoreError::io(err.to_string()))?;
        }
        tokio::fs::write(&target, data)
            .await
            .map_err(|err| ImageStoreError::io(err.to_string()))?;
        Ok(reference)
    }

    async fn remove(&self, reference: &str) -> Result<(), ImageStoreError> {
        let target = self.resolve(reference)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ImageStoreError::io(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_writes_and_remove_deletes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsImageStore::new(dir.path());

        let reference = store
            .save(vec![1, 2, 3], "png")
            .await
            .expect("save succeeds");
        assert!(reference.starts_with("recipe/"));
        assert!(reference.ends_with(".png"));
        let on_disk = dir.path().join(&reference);
        assert_eq!(tokio::fs::read(&on_disk).await.expect("file"), vec![1, 2, 3]);

        store.remove(&reference).await.expect("remove succeeds");
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn removing_a_missing_file_is_a_no_op() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsImageStore::new(dir.path());
        store
            .remove("recipe/does-not-exist.png")
            .await
            .expect("missing file ignored");
    }

    #[tokio::test]
    async fn traversal_references_are_refused() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsImageStore::new(dir.path());
        let error = store
            .remove("../outside.png")
            .await
            .expect_err("traversal refused");
        assert!(matches!(error, ImageStoreError::Io { .. }));
    }
}
