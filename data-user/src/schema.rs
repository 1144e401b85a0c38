use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::{normalize_searches, UserRecord};
use data_error::{GameaidError, Result};

/*
Note on the persisted layout:

The slot holds `{"schemaVersion": N, "records": {<email>: <record>}}`.

Blobs written before versioning are a bare `{<email>: <record>}` object
with older field names (`loginTime`, `lastSearchedPlayers`,
`sessionHistory[].date/duration`). They are read as version 0 and migrated
in memory; the next write stores them in the current layout.

The layout grows by adding optional fields. Top-level keys and record
fields that this build does not know are carried through a read-modify-write
unchanged, and so is any record that does not decode at all.
*/
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_VERSION_KEY: &str = "schemaVersion";
const RECORDS_KEY: &str = "records";

/// All records, keyed by email.
pub type Records = BTreeMap<String, UserRecord>;

/// Everything a slot holds, as far as this build understands it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub records: Records,
    /// Entries that are not a valid [`UserRecord`], kept verbatim.
    pub unreadable: BTreeMap<String, Value>,
    /// Top-level keys besides the version and the records.
    pub extra: Map<String, Value>,
}

impl Document {
    /// Fails if the entry stored under `email` could not be decoded, so
    /// that it is never replaced by a fresh record.
    pub fn ensure_readable(&self, email: &str) -> Result<()> {
        if self.unreadable.contains_key(email) {
            return Err(GameaidError::InvalidRecord(format!(
                "the stored record of {} cannot be read",
                email
            )));
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum EntryRef<'a> {
    Record(&'a UserRecord),
    Unreadable(&'a Value),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRef<'a> {
    schema_version: u32,
    records: BTreeMap<&'a str, EntryRef<'a>>,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

/// Parse a blob read from storage. An empty slot is an empty record set.
/// Entries that do not decode are left out with a warning.
///
/// # Errors
/// See [`decode_document`].
pub fn decode(label: &str, blob: Option<&[u8]>) -> Result<Records> {
    decode_document(label, blob).map(|document| document.records)
}

/// Parse a blob read from storage, keeping what cannot be decoded.
///
/// # Errors
/// [`GameaidError::Parse`] only if the blob is not JSON at all.
/// [`GameaidError::Storage`] if it is JSON of an unexpected shape or of a
/// layout newer than [`SCHEMA_VERSION`].
pub fn decode_document(label: &str, blob: Option<&[u8]>) -> Result<Document> {
    let Some(blob) = blob else {
        return Ok(Document::default());
    };

    let value: Value = serde_json::from_slice(blob)?;
    let Value::Object(mut root) = value else {
        return Err(unexpected(label, "the top level is not an object"));
    };

    let version = match root.remove(SCHEMA_VERSION_KEY) {
        None => 0,
        Some(version) => version.as_u64().ok_or_else(|| {
            unexpected(
                label,
                &format!("{} is not a number: {}", SCHEMA_VERSION_KEY, version),
            )
        })?,
    };

    let (entries, extra) = match version {
        0 => (root, Map::new()),
        v if v == SCHEMA_VERSION as u64 => {
            match root.remove(RECORDS_KEY).unwrap_or_default() {
                Value::Object(entries) => (entries, root),
                Value::Null => (Map::new(), root),
                _ => {
                    return Err(unexpected(
                        label,
                        &format!("{} is not an object", RECORDS_KEY),
                    ))
                }
            }
        }
        v => {
            return Err(GameaidError::Storage(
                label.to_owned(),
                format!(
                    "Storage schema {} is newer than supported {}",
                    v, SCHEMA_VERSION
                ),
            ))
        }
    };

    let mut document = Document {
        extra,
        ..Default::default()
    };
    for (email, entry) in entries {
        match UserRecord::deserialize(&entry) {
            Ok(mut record) => {
                if version == 0 {
                    let searches = std::mem::take(&mut record.recent_searches);
                    record.recent_searches = normalize_searches(searches);
                }
                rekey(label, &email, &mut record);
                document.records.insert(email, record);
            }
            Err(err) => {
                log::warn!(
                    "{}: keeping unreadable record of {} as is: {}",
                    label,
                    email,
                    err
                );
                document.unreadable.insert(email, entry);
            }
        }
    }

    if version == 0 {
        log::info!(
            "{}: migrated {} records from the unversioned layout",
            label,
            document.records.len()
        );
    }
    Ok(document)
}

/// Serialize records in the current layout.
pub fn encode(records: &Records) -> Result<Vec<u8>> {
    encode_document(&Document {
        records: records.clone(),
        ..Default::default()
    })
}

/// Serialize a document in the current layout. A decoded record wins over
/// an unreadable entry with the same email.
pub fn encode_document(document: &Document) -> Result<Vec<u8>> {
    let mut records: BTreeMap<&str, EntryRef> = document
        .unreadable
        .iter()
        .map(|(email, entry)| (email.as_str(), EntryRef::Unreadable(entry)))
        .collect();
    records.extend(
        document
            .records
            .iter()
            .map(|(email, record)| (email.as_str(), EntryRef::Record(record))),
    );

    Ok(serde_json::to_vec(&EnvelopeRef {
        schema_version: SCHEMA_VERSION,
        records,
        extra: &document.extra,
    })?)
}

fn unexpected(label: &str, reason: &str) -> GameaidError {
    GameaidError::Storage(
        label.to_owned(),
        format!("Unexpected storage layout: {}", reason),
    )
}

/// The map key is authoritative for a record's email.
fn rekey(label: &str, email: &str, record: &mut UserRecord) {
    if record.email != email {
        if !record.email.is_empty() {
            log::warn!(
                "{}: record stored under {} claims email {:?}",
                label,
                email,
                record.email
            );
        }
        record.email = email.to_owned();
    }
}
