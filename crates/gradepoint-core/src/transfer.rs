//! Export and import of persisted datasets.
//!
//! An export is the exact string held at a persistence key. An import must
//! parse, first as JSON and then as the dataset's shape, before anything is
//! written or replaced.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::error::TransferError;
use crate::persistence::{KeyValueStore, SaveStatus};

/// Default file name for an export of `key` taken at `at`.
pub fn export_file_name(key: &str, at: DateTime<Utc>) -> String {
    format!("export-{key}-{}.json", at.timestamp_millis())
}

/// The stored string at `key`, byte for byte.
pub fn export_raw<P: KeyValueStore + ?Sized>(port: &P, key: &str) -> Result<String, TransferError> {
    port.get(key)?.ok_or(TransferError::NoData)
}

/// Parse import text into a dataset without touching any state.
pub fn parse_import<T: DeserializeOwned>(content: &str) -> Result<T, TransferError> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(TransferError::InvalidJson)?;
    serde_json::from_value(value).map_err(TransferError::Schema)
}

/// Parse `content`, then write it verbatim to `key`.
///
/// Returns the parsed dataset for the caller to swap in. A failed write is
/// reported through the status, the parsed dataset is still returned.
pub(crate) fn import_raw<T, P>(port: &mut P, key: &str, content: &str) -> Result<(T, SaveStatus), TransferError>
where
    T: DeserializeOwned,
    P: KeyValueStore + ?Sized,
{
    let parsed = parse_import(content)?;
    let status = match port.set(key, content) {
        Ok(()) => {
            tracing::debug!(key, bytes = content.len(), "imported");
            SaveStatus::Saved
        }
        Err(e) => {
            tracing::warn!("imported data may not have persisted: {e}");
            SaveStatus::NotPersisted(e)
        }
    };
    Ok((parsed, status))
}
