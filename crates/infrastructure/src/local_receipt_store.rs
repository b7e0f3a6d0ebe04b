//! Receipt files on the local disk.
//!
//! Layout: `<root>/<owner id>/receipts/<item id>-<upload id>.<extension>`.
//! Every upload gets its own file, so a rejected upload never touches the
//! receipt currently attached. Stored paths are relative to the root so the
//! data directory can move.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use expensa_application::{ReceiptFile, ReceiptStore};
use expensa_core::{AppError, AppResult};
use expensa_domain::{ExpenseItemId, UserId};

/// Receipt store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct LocalReceiptStore {
    root: PathBuf,
}

impl LocalReceiptStore {
    /// Creates a store rooted at `root`. Directories are created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves a stored relative path, refusing anything that could leave the root.
    fn resolve(&self, receipt_path: &str) -> AppResult<PathBuf> {
        let relative = Path::new(receipt_path);
        let is_plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

        if receipt_path.is_empty() || !is_plain {
            return Err(AppError::Internal(format!(
                "refusing to read receipt outside the data directory: '{receipt_path}'"
            )));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ReceiptStore for LocalReceiptStore {
    async fn save(
        &self,
        owner_id: UserId,
        item_id: ExpenseItemId,
        extension: &str,
        bytes: &[u8],
    ) -> AppResult<String> {
        let upload_id = uuid::Uuid::new_v4().simple();
        let receipt_path = format!("{owner_id}/receipts/{item_id}-{upload_id}.{extension}");
        let target = self.resolve(&receipt_path)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                AppError::Internal(format!(
                    "failed to create receipt directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to create receipt '{}': {error}",
                    target.display()
                ))
            })?;
        file.write_all(bytes).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to write receipt '{}': {error}",
                target.display()
            ))
        })?;
        file.flush().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to flush receipt '{}': {error}",
                target.display()
            ))
        })?;

        tracing::debug!(path = %receipt_path, size = bytes.len(), "stored receipt");
        Ok(receipt_path)
    }

    async fn load(&self, receipt_path: &str) -> AppResult<ReceiptFile> {
        let source = self.resolve(receipt_path)?;

        let bytes = match tokio::fs::read(&source).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound("receipt file not found".to_owned()));
            }
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to read receipt '{}': {error}",
                    source.display()
                )));
            }
        };

        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(ReceiptFile { file_name, bytes })
    }

    async fn remove(&self, receipt_path: &str) {
        let target = match self.resolve(receipt_path) {
            Ok(target) => target,
            Err(error) => {
                tracing::warn!(path = %receipt_path, %error, "refusing to remove receipt");
                return;
            }
        };

        match tokio::fs::remove_file(&target).await {
            Ok(()) => tracing::debug!(path = %receipt_path, "removed receipt"),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => {
                tracing::warn!(path = %receipt_path, %error, "failed to remove receipt");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use expensa_application::ReceiptStore;
    use expensa_core::{AppError, AppResult};
    use expensa_domain::{ExpenseItemId, UserId};

    use super::LocalReceiptStore;

    #[tokio::test]
    async fn saved_receipt_is_read_back() -> AppResult<()> {
        let directory = tempfile::tempdir()
            .map_err(|error| AppError::Internal(error.to_string()))?;
        let store = LocalReceiptStore::new(directory.path());
        let owner_id = UserId::new();
        let item_id = ExpenseItemId::new();

        let first = store.save(owner_id, item_id, "png", b"first").await?;
        assert!(first.starts_with(&format!("{owner_id}/receipts/{item_id}-")));
        assert!(first.ends_with(".png"));

        let second = store.save(owner_id, item_id, "png", b"second").await?;
        assert_ne!(first, second);

        let file = store.load(&first).await?;
        assert_eq!(file.bytes, b"first".to_vec());
        assert!(file.file_name.starts_with(&item_id.to_string()));
        assert_eq!(store.load(&second).await?.bytes, b"second".to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn removed_receipt_is_gone_and_removal_is_idempotent() -> AppResult<()> {
        let directory = tempfile::tempdir()
            .map_err(|error| AppError::Internal(error.to_string()))?;
        let store = LocalReceiptStore::new(directory.path());

        let path = store
            .save(UserId::new(), ExpenseItemId::new(), "pdf", b"%PDF")
            .await?;
        store.remove(&path).await;
        store.remove(&path).await;
        store.remove("../outside").await;

        assert!(matches!(store.load(&path).await, Err(AppError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_not_found() -> AppResult<()> {
        let directory = tempfile::tempdir()
            .map_err(|error| AppError::Internal(error.to_string()))?;
        let store = LocalReceiptStore::new(directory.path());

        let result = store.load("nobody/receipts/none.pdf").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn escaping_paths_are_refused() -> AppResult<()> {
        let directory = tempfile::tempdir()
            .map_err(|error| AppError::Internal(error.to_string()))?;
        let store = LocalReceiptStore::new(directory.path());

        for path in ["../secret", "/etc/passwd", "a/../../b", ""] {
            assert!(matches!(
                store.load(path).await,
                Err(AppError::Internal(_))
            ));
        }
        Ok(())
    }
}
