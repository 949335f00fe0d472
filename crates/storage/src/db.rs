//! sled database wrapper with versioned serialization helpers.

use crate::codec;
use poa_core::{Address, ProposalId};
use sled::Db;
use std::path::Path;
use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Malformed key: {0}")]
    MalformedKey(String),

    #[error("Empty record under key {0}")]
    EmptyRecord(String),

    #[error("Unsupported record version {found} (supported: {supported})")]
    UnsupportedVersion { found: u8, supported: u8 },
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Wrapper around sled database with serialization helpers.
pub struct Storage {
    db: Db,
}

impl Storage {
    /// Open a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory database (for testing).
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Store a serializable value in the versioned record format.
    pub fn put<K, V>(&self, key: K, value: &V) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: serde::Serialize,
    {
        let encoded = codec::encode(value)?;
        self.db.insert(key, encoded)?;
        Ok(())
    }

    /// Retrieve and decode a value.
    pub fn get<K, V>(&self, key: K) -> Result<Option<V>>
    where
        K: AsRef<[u8]>,
        V: serde::de::DeserializeOwned,
    {
        let key = key.as_ref();
        match self.db.get(key)? {
            Some(bytes) => {
                let value = codec::decode(key, &bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Retrieve a value, returning error if not found.
    pub fn get_or_err<K, V>(&self, key: K) -> Result<V>
    where
        K: AsRef<[u8]>,
        V: serde::de::DeserializeOwned,
    {
        let key = key.as_ref();
        self.get(key)?
            .ok_or_else(|| StorageError::NotFound(display_key(key)))
    }

    /// Check if a key exists.
    pub fn contains<K: AsRef<[u8]>>(&self, key: K) -> Result<bool> {
        Ok(self.db.contains_key(key)?)
    }

    /// Decode every record under `prefix`, in key order.
    ///
    /// Each entry is returned with the key suffix that follows the prefix.
    pub fn scan<V>(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, V)>>
    where
        V: serde::de::DeserializeOwned,
    {
        let mut entries = Vec::new();
        for result in self.db.scan_prefix(prefix) {
            let (key, value) = result?;
            let record = codec::decode(&key, &value)?;
            entries.push((key[prefix.len()..].to_vec(), record));
        }
        Ok(entries)
    }

    /// Collect the key suffixes under `prefix` without decoding values.
    pub fn scan_keys(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        let mut keys = Vec::new();
        for result in self.db.scan_prefix(prefix) {
            let (key, _) = result?;
            keys.push(key[prefix.len()..].to_vec());
        }
        Ok(keys)
    }

    /// Apply multiple operations atomically.
    ///
    /// The batch is written with sled's `apply_batch`: readers see either
    /// none or all of it.
    pub fn batch(&self, operations: Vec<BatchOp>) -> Result<()> {
        let mut batch = sled::Batch::default();
        for op in operations {
            match op {
                BatchOp::Insert { key, value } => batch.insert(key, value),
                BatchOp::Remove { key } => batch.remove(key),
            }
        }
        self.db.apply_batch(batch)?;
        Ok(())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    // =========================================================================
    // Key Construction Helpers
    // =========================================================================

    /// Format: "validator:" + address_bytes
    pub fn validator_key(address: &Address) -> Vec<u8> {
        prefixed(VALIDATOR_PREFIX, &address.0)
    }

    /// Format: "application:" + id (big-endian, so keys sort by id)
    pub fn application_key(id: ProposalId) -> Vec<u8> {
        prefixed(APPLICATION_PREFIX, &id.to_be_bytes())
    }

    /// Format: "open-application:" + id
    pub fn open_application_key(id: ProposalId) -> Vec<u8> {
        prefixed(OPEN_APPLICATION_PREFIX, &id.to_be_bytes())
    }

    /// Format: "kick:" + id
    pub fn kick_key(id: ProposalId) -> Vec<u8> {
        prefixed(KICK_PREFIX, &id.to_be_bytes())
    }

    /// Format: "open-kick:" + id
    pub fn open_kick_key(id: ProposalId) -> Vec<u8> {
        prefixed(OPEN_KICK_PREFIX, &id.to_be_bytes())
    }

    /// Decode the id suffix of a proposal key.
    pub fn parse_id(suffix: &[u8]) -> Result<ProposalId> {
        let bytes: [u8; 8] = suffix
            .try_into()
            .map_err(|_| StorageError::MalformedKey(display_key(suffix)))?;
        Ok(ProposalId::from_be_bytes(bytes))
    }

    /// Decode the address suffix of a validator key.
    pub fn parse_address(suffix: &[u8]) -> Result<Address> {
        Address::from_slice(suffix).map_err(|_| StorageError::MalformedKey(display_key(suffix)))
    }
}

pub const VALIDATOR_PREFIX: &[u8] = b"validator:";
pub const APPLICATION_PREFIX: &[u8] = b"application:";
pub const OPEN_APPLICATION_PREFIX: &[u8] = b"open-application:";
pub const KICK_PREFIX: &[u8] = b"kick:";
pub const OPEN_KICK_PREFIX: &[u8] = b"open-kick:";
pub const PARAMS_KEY: &[u8] = b"params";
pub const NEXT_APPLICATION_ID_KEY: &[u8] = b"meta:next-application-id";
pub const NEXT_KICK_ID_KEY: &[u8] = b"meta:next-kick-id";
pub const LAST_HEIGHT_KEY: &[u8] = b"meta:last-height";

fn prefixed(prefix: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut key = prefix.to_vec();
    key.extend_from_slice(suffix);
    key
}

fn display_key(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

/// Batch operation for atomic updates.
pub enum BatchOp {
    Insert { key: Vec<u8>, value: Vec<u8> },
    Remove { key: Vec<u8> },
}
