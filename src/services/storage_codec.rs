//! Storage Codec for the Quick Tabs persisted envelope.
//!
//! Translates between the in-memory record list and the on-disk envelope
//! across schema versions: the current `tabs` array, the legacy
//! `containers` map, and a bounded best-effort recovery scan for envelopes
//! that match neither. Decoding never panics; an envelope that cannot be
//! interpreted yields `StorageError::FormatUnrecognized` and the live store
//! simply starts empty.

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::types::envelope::PersistedStateEnvelope;
use crate::types::errors::StorageError;
use crate::types::quick_tab::{QuickTabRecord, Size, Visibility};

/// Upper bound on top-level keys inspected during recovery.
pub const RECOVERY_KEY_SCAN_LIMIT: usize = 20;

/// Envelope metadata keys that must never be mistaken for tab lists.
const METADATA_KEYS: [&str; 3] = ["saveId", "timestamp", "writeSourceId"];

/// Trait defining the storage codec interface.
pub trait StorageCodecTrait {
    fn decode(&self, raw: &Value) -> Result<Vec<QuickTabRecord>, StorageError>;
    fn encode(&self, records: &[QuickTabRecord]) -> PersistedStateEnvelope;
}

/// Codec over the single well-known storage key.
#[derive(Debug, Default)]
pub struct StorageCodec;

impl StorageCodec {
    pub fn new() -> Self {
        Self
    }

    /// Generates a write token unique per call: timestamp plus random suffix.
    pub fn fresh_save_id() -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}-{}", now, &suffix[..8])
    }

    /// Parses a `tabs` array from the current format, skipping elements
    /// that no longer deserialize (individually malformed entries must not
    /// sink the whole envelope).
    fn decode_current(items: &[Value]) -> Vec<QuickTabRecord> {
        let mut records = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<QuickTabRecord>(item.clone()) {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "skipping malformed quick tab entry"),
            }
        }
        records
    }

    /// Flattens every container's `tabs` array from the legacy format into
    /// one ordered sequence.
    fn decode_containers(containers: &serde_json::Map<String, Value>) -> Vec<QuickTabRecord> {
        let mut records = Vec::new();
        for (key, container) in containers {
            if METADATA_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(items) = container.get("tabs").and_then(Value::as_array) {
                records.extend(Self::decode_current(items));
            }
        }
        records
    }

    /// Best-effort recovery: scan a bounded number of top-level keys for
    /// arrays that look like tab lists. A candidate array is accepted only
    /// if every element carries a valid id and url; one bad element rejects
    /// the whole array so malformed entries are never mixed in silently.
    fn recover(map: &serde_json::Map<String, Value>) -> Vec<QuickTabRecord> {
        let mut records = Vec::new();
        for (key, value) in map.iter().take(RECOVERY_KEY_SCAN_LIMIT) {
            if METADATA_KEYS.contains(&key.as_str()) {
                continue;
            }
            let Some(items) = value.as_array() else {
                continue;
            };
            if items.is_empty() || !items.iter().all(looks_like_tab) {
                continue;
            }
            debug!(key = %key, count = items.len(), "recovered candidate tab list");
            records.extend(items.iter().map(lenient_record));
        }
        records
    }
}

/// True if the element has a string/number `id` and a string `url`.
fn looks_like_tab(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    let id_ok = matches!(obj.get("id"), Some(Value::String(_)) | Some(Value::Number(_)));
    let url_ok = matches!(obj.get("url"), Some(Value::String(_)));
    id_ok && url_ok
}

/// Rebuilds a record from a recovered element, defaulting whatever the
/// original write lost. `looks_like_tab` has already guaranteed id and url.
fn lenient_record(value: &Value) -> QuickTabRecord {
    let id = match value.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    let url = value
        .get("url")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let title = value
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let origin_tab_id = value
        .get("originTabId")
        .and_then(Value::as_i64)
        .unwrap_or(-1);
    let position = value
        .get("position")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();
    let size = value
        .get("size")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_else(Size::default);
    let minimized = value
        .get("visibility")
        .and_then(|v| v.get("minimized"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    QuickTabRecord {
        id,
        url,
        title,
        origin_tab_id,
        position,
        size,
        visibility: Visibility { minimized },
        soloed_on_tabs: BTreeSet::new(),
        muted_on_tabs: BTreeSet::new(),
    }
}

impl StorageCodecTrait for StorageCodec {
    /// Decodes the persisted envelope into an ordered record list.
    ///
    /// Precedence when both current and legacy shapes are present: the
    /// `tabs` array wins and `containers` is ignored.
    fn decode(&self, raw: &Value) -> Result<Vec<QuickTabRecord>, StorageError> {
        let Some(map) = raw.as_object() else {
            return Err(StorageError::FormatUnrecognized);
        };

        if let Some(items) = map.get("tabs").and_then(Value::as_array) {
            return Ok(Self::decode_current(items));
        }

        if let Some(containers) = map.get("containers").and_then(Value::as_object) {
            return Ok(Self::decode_containers(containers));
        }

        let recovered = Self::recover(map);
        if recovered.is_empty() {
            warn!("storage envelope unrecognized after recovery scan");
            return Err(StorageError::FormatUnrecognized);
        }
        Ok(recovered)
    }

    /// Encodes records into a current-format envelope with a fresh `saveId`.
    fn encode(&self, records: &[QuickTabRecord]) -> PersistedStateEnvelope {
        PersistedStateEnvelope {
            tabs: records.to_vec(),
            save_id: Self::fresh_save_id(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as i64,
        }
    }
}
