//! Versioned record encoding.
//!
//! Every stored value is one schema-version byte followed by the bincode
//! encoding of the record. Readers refuse versions they do not know instead
//! of misreading them.

use crate::db::{Result, StorageError};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Schema version written by this build.
pub const RECORD_VERSION: u8 = 1;

/// Encode a record with the current schema version.
pub fn encode<V: Serialize>(value: &V) -> Result<Vec<u8>> {
    let mut out = vec![RECORD_VERSION];
    bincode::serialize_into(&mut out, value)?;
    Ok(out)
}

/// Decode a record stored under `key`.
pub fn decode<V: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> Result<V> {
    match bytes.split_first() {
        Some((&RECORD_VERSION, body)) => Ok(bincode::deserialize(body)?),
        Some((&found, _)) => Err(StorageError::UnsupportedVersion {
            found,
            supported: RECORD_VERSION,
        }),
        None => Err(StorageError::EmptyRecord(
            String::from_utf8_lossy(key).into_owned(),
        )),
    }
}
