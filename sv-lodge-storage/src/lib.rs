pub mod backend;
pub mod error;
pub mod models;

use std::sync::Arc;

pub use backend::{FileStorage, MemoryStorage, Storage};
pub use error::StorageError;
use models::{Booking, Room, User};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

/// Names of the four records the front desk keeps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordKeys {
    pub rooms: String,
    pub bookings: String,
    pub serial_counter: String,
    pub auth_user: String,
}

impl RecordKeys {
    #[must_use]
    pub fn new(namespace: &str) -> Self {
        Self {
            rooms: format!("{namespace}_rooms"),
            bookings: format!("{namespace}_bookings"),
            serial_counter: format!("{namespace}_serial_counter"),
            auth_user: format!("{namespace}_auth_user"),
        }
    }
}

/// Typed access to the records on top of any [`Storage`].
#[derive(Clone)]
pub struct LocalStore {
    storage: Arc<dyn Storage>,
    keys: RecordKeys,
}

impl LocalStore {
    pub fn new(storage: Arc<dyn Storage>, namespace: &str) -> Self {
        Self {
            storage,
            keys: RecordKeys::new(namespace),
        }
    }

    #[must_use]
    pub const fn keys(&self) -> &RecordKeys {
        &self.keys
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        self.storage
            .get(key)?
            .map(|raw| serde_json::from_str(&raw).map_err(|err| StorageError::json(key, err)))
            .transpose()
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|err| StorageError::json(key, err))?;
        self.storage.set(key, &raw)
    }

    pub fn has_rooms(&self) -> Result<bool, StorageError> {
        Ok(self.storage.get(&self.keys.rooms)?.is_some())
    }

    pub fn has_bookings(&self) -> Result<bool, StorageError> {
        Ok(self.storage.get(&self.keys.bookings)?.is_some())
    }

    pub fn has_serial_counter(&self) -> Result<bool, StorageError> {
        Ok(self.storage.get(&self.keys.serial_counter)?.is_some())
    }

    /// Missing collection reads as empty.
    pub fn rooms(&self) -> Result<Vec<Room>, StorageError> {
        Ok(self.read(&self.keys.rooms)?.unwrap_or_default())
    }

    pub fn save_rooms(&self, rooms: &[Room]) -> Result<(), StorageError> {
        self.write(&self.keys.rooms, rooms)
    }

    pub fn bookings(&self) -> Result<Vec<Booking>, StorageError> {
        Ok(self.read(&self.keys.bookings)?.unwrap_or_default())
    }

    pub fn save_bookings(&self, bookings: &[Booking]) -> Result<(), StorageError> {
        self.write(&self.keys.bookings, bookings)
    }

    /// The counter is stored as a decimal string. Missing or unreadable
    /// values count as 1.
    pub fn serial_counter(&self) -> Result<u64, StorageError> {
        let Some(raw) = self.storage.get(&self.keys.serial_counter)? else {
            return Ok(1);
        };
        Ok(raw.trim().parse().unwrap_or_else(|_| {
            warn!("serial counter {raw:?} is not a number, starting over at 1");
            1
        }))
    }

    pub fn set_serial_counter(&self, value: u64) -> Result<(), StorageError> {
        self.storage.set(&self.keys.serial_counter, &value.to_string())
    }

    pub fn session_user(&self) -> Result<Option<User>, StorageError> {
        self.read(&self.keys.auth_user)
    }

    pub fn set_session_user(&self, user: &User) -> Result<(), StorageError> {
        self.write(&self.keys.auth_user, user)
    }

    pub fn clear_session_user(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.keys.auth_user)
    }
}

#[cfg(test)]
mod tests {
    use models::{RoomStatus, UserRole};

    use super::*;

    fn store() -> (Arc<MemoryStorage>, LocalStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = LocalStore::new(storage.clone(), "sv_lodge");
        (storage, store)
    }

    #[test]
    fn record_keys_follow_namespace() {
        let keys = RecordKeys::new("sv_lodge");
        assert_eq!(keys.rooms, "sv_lodge_rooms");
        assert_eq!(keys.bookings, "sv_lodge_bookings");
        assert_eq!(keys.serial_counter, "sv_lodge_serial_counter");
        assert_eq!(keys.auth_user, "sv_lodge_auth_user");
    }

    #[test]
    fn missing_collections_read_empty() {
        let (_, store) = store();
        assert!(store.rooms().unwrap().is_empty());
        assert!(store.bookings().unwrap().is_empty());
        assert!(!store.has_rooms().unwrap());
        assert_eq!(store.serial_counter().unwrap(), 1);
    }

    #[test]
    fn rooms_are_stored_as_json_array() {
        let (storage, store) = store();
        store
            .save_rooms(&[Room {
                number: 1,
                status: RoomStatus::Occupied,
            }])
            .unwrap();
        assert_eq!(
            storage.get("sv_lodge_rooms").unwrap().as_deref(),
            Some(r#"[{"number":1,"status":"OCCUPIED"}]"#)
        );
        assert!(store.rooms().unwrap()[0].is_occupied());
    }

    #[test]
    fn serial_counter_is_string_encoded() {
        let (storage, store) = store();
        store.set_serial_counter(7).unwrap();
        assert_eq!(
            storage.get("sv_lodge_serial_counter").unwrap().as_deref(),
            Some("7")
        );
        storage.set("sv_lodge_serial_counter", "seven").unwrap();
        assert_eq!(store.serial_counter().unwrap(), 1);
    }

    #[test]
    fn session_user_lifecycle() {
        let (_, store) = store();
        assert_eq!(store.session_user().unwrap(), None);
        let user = User {
            id: "a1b2c3d4e".to_owned(),
            name: "Lakshmi".to_owned(),
            phone: "9000000001".to_owned(),
            role: UserRole::Receptionist,
        };
        store.set_session_user(&user).unwrap();
        assert_eq!(store.session_user().unwrap(), Some(user));
        store.clear_session_user().unwrap();
        assert_eq!(store.session_user().unwrap(), None);
    }

    #[test]
    fn corrupt_record_is_an_error() {
        let (storage, store) = store();
        storage.set("sv_lodge_bookings", "{not json").unwrap();
        assert!(matches!(store.bookings(), Err(StorageError::Json { .. })));
    }
}
