//! Durable storage for the session token.
//!
//! There is exactly one slot, named [`TOKEN_KEY`]. Only the session store
//! writes to it; anything read back must be revalidated before use.

use std::path::PathBuf;
use std::sync::Mutex;

use keyring::Entry;
use thiserror::Error;
use tracing::debug;

/// Well-known name of the persisted token slot.
pub const TOKEN_KEY: &str = "token";

/// Keyring service name
const SERVICE_NAME: &str = "tourbook";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Token file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Token storage lock poisoned")]
    Poisoned,
}

/// A single-slot key-value store holding the raw bearer token.
pub trait TokenStorage: Send + Sync {
    /// Read the persisted token, if any.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Persist `token`, replacing whatever was stored before.
    fn save(&self, token: &str) -> Result<(), StorageError>;

    /// Remove the persisted token. Clearing an empty slot is not an error.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Token kept in a plain file under the cache directory.
pub struct FileTokenStorage {
    dir: PathBuf,
}

impl FileTokenStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_KEY)
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        let path = self.token_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let token = contents.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(token.to_string()))
    }

    fn save(&self, token: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.token_path(), token)?;
        debug!(path = ?self.token_path(), "Token written");
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let path = self.token_path();
        if path.exists() {
            std::fs::remove_file(&path)?;
            debug!(?path, "Token file removed");
        }
        Ok(())
    }
}

/// Token kept in the OS keychain.
///
/// One `Entry` is held for the life of the storage so every operation
/// goes through the same credential.
pub struct KeyringTokenStorage {
    entry: Entry,
}

impl KeyringTokenStorage {
    pub fn new() -> Result<Self, StorageError> {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: &str) -> Result<Self, StorageError> {
        Ok(Self {
            entry: Entry::new(service, TOKEN_KEY)?,
        })
    }
}

impl TokenStorage for KeyringTokenStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match self.entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &str) -> Result<(), StorageError> {
        self.entry.set_password(token)?;
        debug!("Token written to keychain");
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local slot. Nothing survives the process.
#[derive(Default)]
pub struct MemoryTokenStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            slot: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        let slot = self.slot.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(slot.clone())
    }

    fn save(&self, token: &str) -> Result<(), StorageError> {
        let mut slot = self.slot.lock().map_err(|_| StorageError::Poisoned)?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut slot = self.slot.lock().map_err(|_| StorageError::Poisoned)?;
        *slot = None;
        Ok(())
    }
}

impl<T: TokenStorage + ?Sized> TokenStorage for std::sync::Arc<T> {
    fn load(&self) -> Result<Option<String>, StorageError> {
        (**self).load()
    }

    fn save(&self, token: &str) -> Result<(), StorageError> {
        (**self).save(token)
    }

    fn clear(&self) -> Result<(), StorageError> {
        (**self).clear()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FileTokenStorage::new(tmp.path().join("nested"));

        assert_eq!(storage.load().unwrap(), None);
        storage.save("abc.def.ghi").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("abc.def.ghi"));
        assert!(tmp.path().join("nested").join(TOKEN_KEY).exists());
    }

    #[test]
    fn test_file_storage_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FileTokenStorage::new(tmp.path().to_path_buf());

        storage.save("first").unwrap();
        storage.save("second").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_file_storage_clear_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FileTokenStorage::new(tmp.path().to_path_buf());

        storage.clear().unwrap();
        storage.save("token").unwrap();
        storage.clear().unwrap();
        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn test_file_storage_blank_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(TOKEN_KEY), "  \n").unwrap();
        let storage = FileTokenStorage::new(tmp.path().to_path_buf());
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn test_keyring_storage_roundtrip() {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        let storage = KeyringTokenStorage::with_service("tourbook-test").unwrap();

        assert_eq!(storage.load().unwrap(), None);
        storage.save("abc.def.ghi").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("abc.def.ghi"));
        storage.save("jkl.mno.pqr").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("jkl.mno.pqr"));
        storage.clear().unwrap();
        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryTokenStorage::with_token("seed");
        assert_eq!(storage.load().unwrap().as_deref(), Some("seed"));
        storage.save("next").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("next"));
        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);
    }
}
