use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use time::OffsetDateTime;

use crate::models::AuxiliaryState;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageUnavailableError {
    #[error("durable storage failure: {0}")]
    Backend(String),
}

/// Durable per-user storage for the two blobs: the opaque ledger snapshot
/// and the auxiliary state (stored as JSON text). Keys are namespaced by
/// user id; absence is a normal outcome, distinct from a backend failure.
///
/// Saves are wholesale: a failed save leaves the previous blob in place and
/// is always reported to the caller.
pub trait BlobStore: Send + Sync {
    fn load_snapshot(&self, user_id: &str) -> Result<Option<Vec<u8>>, StorageUnavailableError>;
    fn save_snapshot(&self, user_id: &str, bytes: &[u8]) -> Result<(), StorageUnavailableError>;
    fn load_auxiliary(&self, user_id: &str)
        -> Result<Option<AuxiliaryState>, StorageUnavailableError>;
    fn save_auxiliary(
        &self,
        user_id: &str,
        state: &AuxiliaryState,
    ) -> Result<(), StorageUnavailableError>;
}

fn auxiliary_to_text(state: &AuxiliaryState) -> Result<String, StorageUnavailableError> {
    serde_json::to_string(state).map_err(|e| StorageUnavailableError::Backend(e.to_string()))
}

/// Auxiliary text that no longer parses is reported as absent, so the
/// session re-seeds defaults instead of failing the login.
fn auxiliary_from_text(user_id: &str, text: &str) -> Option<AuxiliaryState> {
    match serde_json::from_str(text) {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::warn!(user_id, error = %e, "auxiliary blob does not parse, treating as absent");
            None
        }
    }
}

#[derive(Default, Clone)]
struct UserBlobs {
    snapshot: Option<Vec<u8>>,
    auxiliary: Option<String>,
}

/// Process-local backend; the default for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryBlobStore {
    users: RwLock<HashMap<String, UserBlobs>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn load_snapshot(&self, user_id: &str) -> Result<Option<Vec<u8>>, StorageUnavailableError> {
        let users = self.users.read().unwrap();
        Ok(users.get(user_id).and_then(|u| u.snapshot.clone()))
    }

    fn save_snapshot(&self, user_id: &str, bytes: &[u8]) -> Result<(), StorageUnavailableError> {
        let mut users = self.users.write().unwrap();
        users.entry(user_id.to_string()).or_default().snapshot = Some(bytes.to_vec());
        Ok(())
    }

    fn load_auxiliary(
        &self,
        user_id: &str,
    ) -> Result<Option<AuxiliaryState>, StorageUnavailableError> {
        let users = self.users.read().unwrap();
        Ok(users
            .get(user_id)
            .and_then(|u| u.auxiliary.as_deref())
            .and_then(|text| auxiliary_from_text(user_id, text)))
    }

    fn save_auxiliary(
        &self,
        user_id: &str,
        state: &AuxiliaryState,
    ) -> Result<(), StorageUnavailableError> {
        let text = auxiliary_to_text(state)?;
        let mut users = self.users.write().unwrap();
        users.entry(user_id.to_string()).or_default().auxiliary = Some(text);
        Ok(())
    }
}

/// SQLite-backed blob store surviving process restarts. One row per
/// (user, blob kind) in a single table; writes go through
/// `INSERT OR REPLACE` so a save either lands whole or not at all.
pub struct SqliteBlobStore {
    conn: Mutex<Connection>,
}

const KIND_SNAPSHOT: &str = "snapshot";
const KIND_AUXILIARY: &str = "auxiliary";

impl SqliteBlobStore {
    pub fn new(path: &str) -> Result<Self, StorageUnavailableError> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| StorageUnavailableError::Backend(e.to_string()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| StorageUnavailableError::Backend(e.to_string()))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StorageUnavailableError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS blobs (
                user_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                data BLOB NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (user_id, kind)
            );
            ",
        )
        .map_err(|e| StorageUnavailableError::Backend(e.to_string()))?;
        Ok(())
    }

    fn load_blob(&self, user_id: &str, kind: &str) -> Result<Option<Vec<u8>>, StorageUnavailableError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT data FROM blobs WHERE user_id = ?1 AND kind = ?2",
            params![user_id, kind],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| StorageUnavailableError::Backend(e.to_string()))
    }

    fn save_blob(&self, user_id: &str, kind: &str, data: &[u8]) -> Result<(), StorageUnavailableError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO blobs (user_id, kind, data, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user_id,
                kind,
                data,
                OffsetDateTime::now_utc().unix_timestamp()
            ],
        )
        .map_err(|e| StorageUnavailableError::Backend(e.to_string()))?;
        Ok(())
    }
}

impl BlobStore for SqliteBlobStore {
    fn load_snapshot(&self, user_id: &str) -> Result<Option<Vec<u8>>, StorageUnavailableError> {
        self.load_blob(user_id, KIND_SNAPSHOT)
    }

    fn save_snapshot(&self, user_id: &str, bytes: &[u8]) -> Result<(), StorageUnavailableError> {
        self.save_blob(user_id, KIND_SNAPSHOT, bytes)
    }

    fn load_auxiliary(
        &self,
        user_id: &str,
    ) -> Result<Option<AuxiliaryState>, StorageUnavailableError> {
        let bytes = self.load_blob(user_id, KIND_AUXILIARY)?;
        Ok(bytes
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .and_then(|text| auxiliary_from_text(user_id, &text)))
    }

    fn save_auxiliary(
        &self,
        user_id: &str,
        state: &AuxiliaryState,
    ) -> Result<(), StorageUnavailableError> {
        let text = auxiliary_to_text(state)?;
        self.save_blob(user_id, KIND_AUXILIARY, text.as_bytes())
    }
}
