use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, trace};

use crate::error::StorageError;

/// String-valued key/value records. Every call is atomic on its own and
/// nothing spans calls.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Default, Debug)]
pub struct MemoryStorage {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let records = self.records.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(records.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut records = self.records.lock().map_err(|_| StorageError::Poisoned)?;
        records.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut records = self.records.lock().map_err(|_| StorageError::Poisoned)?;
        records.remove(key);
        Ok(())
    }
}

/// One file per record inside `dir`. Writes go to a sibling temp file that is
/// renamed over the record, so readers see the old or the new value.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|err| StorageError::io(&dir.to_string_lossy(), err))?;
        debug!("using file storage in {}", dir.display());
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::io(key, err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;
        let temporary = path.with_extension("json.tmp");
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut file = fs::File::create(&temporary).map_err(|err| StorageError::io(key, err))?;
        file.write_all(value.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|err| StorageError::io(key, err))?;
        fs::rename(&temporary, &path).map_err(|err| StorageError::io(key, err))?;
        trace!("wrote record {key} ({} bytes)", value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Poisoned)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::io(key, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(storage: &dyn Storage) {
        assert_eq!(storage.get("sv_lodge_rooms").unwrap(), None);
        storage.set("sv_lodge_rooms", "[]").unwrap();
        assert_eq!(storage.get("sv_lodge_rooms").unwrap().as_deref(), Some("[]"));
        storage.set("sv_lodge_rooms", "[1]").unwrap();
        assert_eq!(storage.get("sv_lodge_rooms").unwrap().as_deref(), Some("[1]"));
        storage.remove("sv_lodge_rooms").unwrap();
        assert_eq!(storage.get("sv_lodge_rooms").unwrap(), None);
        // removing twice is fine
        storage.remove("sv_lodge_rooms").unwrap();
    }

    #[test]
    fn memory_storage_round_trip() {
        exercise(&MemoryStorage::new());
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        exercise(&FileStorage::open(dir.path()).unwrap());
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileStorage::open(dir.path())
            .unwrap()
            .set("sv_lodge_serial_counter", "42")
            .unwrap();
        let reopened = FileStorage::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get("sv_lodge_serial_counter").unwrap().as_deref(),
            Some("42")
        );
        assert!(!dir.path().join("sv_lodge_serial_counter.json.tmp").exists());
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        assert!(matches!(
            storage.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
