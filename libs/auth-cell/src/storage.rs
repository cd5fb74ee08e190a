use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use shared_models::error::AppError;

/// Durable home of the session token.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    async fn load(&self) -> Result<Option<String>, AppError>;
    async fn save(&self, token: &str) -> Result<(), AppError>;
    async fn clear(&self) -> Result<(), AppError>;
}

/// Keeps the token in a single file so it survives restarts.
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStorage for FileTokenStorage {
    async fn load(&self) -> Result<Option<String>, AppError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!("{}: {}", self.path.display(), e))),
        }
    }

    async fn save(&self, token: &str) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(e.to_string()))?;
        }
        debug!("Persisting token to {}", self.path.display());
        tokio::fs::write(&self.path, token)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))
    }

    async fn clear(&self) -> Result<(), AppError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(e.to_string())),
        }
    }
}

#[derive(Default)]
pub struct MemoryTokenStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self { slot: Mutex::new(Some(token.to_string())) }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, AppError> {
        self.slot
            .lock()
            .map_err(|_| AppError::Storage("token slot poisoned".to_string()))
    }
}

#[async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn load(&self) -> Result<Option<String>, AppError> {
        Ok(self.lock()?.clone())
    }

    async fn save(&self, token: &str) -> Result<(), AppError> {
        *self.lock()? = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        *self.lock()? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn file_storage_round_trips_and_clears() {
        let dir = tempdir().unwrap();
        let storage = FileTokenStorage::new(dir.path().join("nested/token"));

        assert_eq!(storage.load().await.unwrap(), None);

        storage.save("abc.def.ghi").await.unwrap();
        assert_eq!(storage.load().await.unwrap().as_deref(), Some("abc.def.ghi"));

        storage.clear().await.unwrap();
        assert_eq!(storage.load().await.unwrap(), None);
        // clearing twice is fine
        storage.clear().await.unwrap();
    }

    #[tokio::test]
    async fn blank_file_reads_as_no_token() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");
        tokio::fs::write(&path, "  \n").await.unwrap();

        assert_eq!(FileTokenStorage::new(path).load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_storage_holds_one_token() {
        let storage = MemoryTokenStorage::with_token("first");
        storage.save("second").await.unwrap();
        assert_eq!(storage.load().await.unwrap().as_deref(), Some("second"));
        storage.clear().await.unwrap();
        assert_eq!(storage.load().await.unwrap(), None);
    }
}
