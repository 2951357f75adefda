//! Session storage backends.
//!
//! Holds the session between process runs so the initial fetch on startup
//! can find it. A missing or unreadable store means "no session".

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use common::{AppError, AppResult};
use domain::Session;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Storage for the single active session of this client.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Read the stored session, if any
    async fn load(&self) -> AppResult<Option<Session>>;

    /// Replace the stored session
    async fn save(&self, session: &Session) -> AppResult<()>;

    /// Remove the stored session
    async fn clear(&self) -> AppResult<()>;
}

/// JSON file storage.
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn storage_error(&self, err: std::io::Error) -> AppError {
        AppError::service(format!(
            "Session storage {} failed: {}",
            self.path.display(),
            err
        ))
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn load(&self) -> AppResult<Option<Session>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.storage_error(e)),
        };

        match serde_json::from_str(&contents) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    async fn save(&self, session: &Session) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.storage_error(e))?;
        }

        let contents = serde_json::to_vec_pretty(session)
            .map_err(|e| AppError::service(format!("Session encoding failed: {}", e)))?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        // The file holds a refresh token; never readable by others, even briefly
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&self.path)
            .await
            .map_err(|e| self.storage_error(e))?;

        // A file left by an older build keeps its mode on open
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| self.storage_error(e))?;
        }

        file.write_all(&contents)
            .await
            .map_err(|e| self.storage_error(e))?;
        file.flush().await.map_err(|e| self.storage_error(e))?;

        debug!("Session saved to {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error(e)),
        }
    }
}

/// In-process storage; the session ends with the process.
#[derive(Default)]
pub struct MemorySessionStorage {
    slot: Mutex<Option<Session>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with a session (as if left by a previous run)
    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn load(&self) -> AppResult<Option<Session>> {
        Ok(self.slot().clone())
    }

    async fn save(&self, session: &Session) -> AppResult<()> {
        *self.slot() = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use domain::AuthUser;
    use uuid::Uuid;

    use super::*;

    fn session() -> Session {
        Session {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            user: AuthUser {
                id: Uuid::new_v4(),
                email: "a@b.com".to_string(),
                full_name: None,
            },
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("aquarights-test-{}", Uuid::new_v4()))
            .join(name)
    }

    #[tokio::test]
    async fn test_file_storage_round_trip() {
        let path = temp_path("session.json");
        let storage = FileSessionStorage::new(path.clone());

        assert!(storage.load().await.unwrap().is_none());

        let s = session();
        storage.save(&s).await.unwrap();
        assert_eq!(storage.load().await.unwrap(), Some(s));

        storage.clear().await.unwrap();
        assert!(storage.load().await.unwrap().is_none());
        // Clearing twice is not an error
        storage.clear().await.unwrap();

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let path = temp_path("session.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        // A pre-existing world-readable file is tightened as well
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let storage = FileSessionStorage::new(path.clone());
        storage.save(&session()).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_new_file_is_created_private() {
        use std::os::unix::fs::PermissionsExt;

        let path = temp_path("session.json");
        let storage = FileSessionStorage::new(path.clone());
        storage.save(&session()).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_no_session() {
        let path = temp_path("session.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let storage = FileSessionStorage::new(path.clone());
        assert!(storage.load().await.unwrap().is_none());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let s = session();
        let storage = MemorySessionStorage::with_session(s.clone());
        assert_eq!(storage.load().await.unwrap(), Some(s));
        storage.clear().await.unwrap();
        assert!(storage.load().await.unwrap().is_none());
    }
}
