use fs_storage::monoid::Monoid;
use fs_storage::{modify, BaseStorage};

use crate::clock::{Clock, SystemClock};
use crate::record::{LinkedAccounts, SessionEntry, UserPatch, UserRecord};
use crate::schema::{self, Document, Records};
use data_error::{GameaidError, Result};

/// The user record store.
///
/// Holds one [`UserRecord`] per email inside a single blob of `S`. Every
/// write reads the whole blob, changes one record and publishes the blob
/// again through [`modify`], so a write racing another writer on the same
/// substrate is recomputed instead of lost.
pub struct UserStore<S, C = SystemClock> {
    storage: S,
    clock: C,
}

impl<S: BaseStorage> UserStore<S, SystemClock> {
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl<S: BaseStorage, C: Clock> UserStore<S, C> {
    pub fn with_clock(storage: S, clock: C) -> Self {
        Self { storage, clock }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Create the record for `patch.email` or merge `patch` into it, and
    /// count a login: `login_timestamp` becomes now, `login_count` grows by
    /// one and a session entry is appended. `registration_timestamp` is
    /// only set when the record is created.
    pub fn upsert_on_login(&mut self, patch: UserPatch) -> Result<UserRecord> {
        let email = patch.email.clone().ok_or_else(|| {
            GameaidError::InvalidRecord("an email is required".to_owned())
        })?;
        let label = self.storage.label().to_owned();

        self.write(&email, |records, now| {
            let record = records.entry(email.clone()).or_insert_with(|| {
                log::info!("{}: registering {}", label, email);
                let mut record = UserRecord::new(email.clone());
                record.registration_timestamp = Some(now);
                record
            });
            record.apply(&patch);
            record.login_timestamp = now;
            record.login_count += 1;
            record.session_history.push(SessionEntry {
                timestamp: now,
                duration_seconds: 0,
            });
            record.revision += 1;
            Ok(record.clone())
        })
    }

    pub fn get_record(&self, email: &str) -> Option<UserRecord> {
        self.get_all_records().remove(email)
    }

    /// All records by email. Unreadable storage reads as empty.
    pub fn get_all_records(&self) -> Records {
        self.load_records().unwrap_or_else(|err| {
            log::warn!(
                "{}: failed to read records, treating storage as empty: {}",
                self.storage.label(),
                err
            );
            Records::new()
        })
    }

    /// Like [`get_all_records`](Self::get_all_records) but reports why the
    /// storage could not be read.
    pub fn load_records(&self) -> Result<Records> {
        let snapshot = self.storage.load()?;
        schema::decode(self.storage.label(), snapshot.data.as_deref())
    }

    pub fn len(&self) -> usize {
        self.get_all_records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn emails(&self) -> Vec<String> {
        self.get_all_records().into_keys().collect()
    }

    /// Shallow-merge `patch` into an existing record. Login bookkeeping is
    /// left alone.
    ///
    /// # Errors
    /// [`GameaidError::NotFound`] if there is no record for `email`, and
    /// [`GameaidError::InvalidRecord`] if `patch` names another email.
    pub fn update_fields(
        &mut self,
        email: &str,
        patch: UserPatch,
    ) -> Result<UserRecord> {
        check_patch_email(email, &patch)?;
        self.update_existing(email, None, |record| record.apply(&patch))
    }

    /// [`update_fields`](Self::update_fields) for an edit buffer taken at
    /// `expected_revision`. Fails with [`GameaidError::RevisionMismatch`]
    /// if the record was written since.
    pub fn update_fields_checked(
        &mut self,
        email: &str,
        expected_revision: u64,
        patch: UserPatch,
    ) -> Result<UserRecord> {
        check_patch_email(email, &patch)?;
        self.update_existing(email, Some(expected_revision), |record| {
            record.apply(&patch)
        })
    }

    /// Put `query` at the front of the user's recent searches.
    pub fn record_search(
        &mut self,
        email: &str,
        query: &str,
    ) -> Result<UserRecord> {
        self.update_existing(email, None, |record| record.push_search(query))
    }

    pub fn attach_profile_photo(
        &mut self,
        email: &str,
        encoded_image: String,
    ) -> Result<UserRecord> {
        self.update_fields(
            email,
            UserPatch {
                profile_photo: Some(encoded_image),
                ..Default::default()
            },
        )
    }

    pub fn attach_voice_message(
        &mut self,
        email: &str,
        encoded_audio: String,
    ) -> Result<UserRecord> {
        self.update_fields(
            email,
            UserPatch {
                voice_message: Some(encoded_audio),
                ..Default::default()
            },
        )
    }

    /// Merge `accounts` into the linked accounts: providers it names are
    /// overwritten, the others are kept.
    pub fn update_linked_accounts(
        &mut self,
        email: &str,
        accounts: LinkedAccounts,
    ) -> Result<UserRecord> {
        self.update_existing(email, None, |record| {
            record.linked_accounts =
                LinkedAccounts::combine(&record.linked_accounts, &accounts);
        })
    }

    /// Drop every record. Whatever the slot held before, even content that
    /// cannot be read, is replaced by an empty record set.
    pub fn reset(&mut self) -> Result<()> {
        let empty = schema::encode(&Records::new())?;
        modify(&mut self.storage, |_| Ok((empty.clone(), ())))?;
        log::info!("{}: all records have been reset", self.storage.label());
        Ok(())
    }

    fn update_existing(
        &mut self,
        email: &str,
        expected_revision: Option<u64>,
        mut mutate: impl FnMut(&mut UserRecord),
    ) -> Result<UserRecord> {
        self.write(email, |records, _now| {
            let record = records
                .get_mut(email)
                .ok_or_else(|| GameaidError::NotFound(email.to_owned()))?;
            if let Some(expected) = expected_revision {
                if record.revision != expected {
                    return Err(GameaidError::RevisionMismatch {
                        expected,
                        found: record.revision,
                    });
                }
            }
            mutate(record);
            record.revision += 1;
            Ok(record.clone())
        })
    }

    /// Run `mutate` against the latest records and publish the result.
    /// `mutate` may run several times; an error aborts without writing.
    ///
    /// A blob that is not JSON at all is replaced. Anything else this
    /// build cannot fully decode is written back as it was, and a write
    /// to an `email` whose stored entry cannot be decoded is refused.
    fn write<T>(
        &mut self,
        email: &str,
        mut mutate: impl FnMut(&mut Records, i64) -> Result<T>,
    ) -> Result<T> {
        let label = self.storage.label().to_owned();
        let clock = &self.clock;
        modify(&mut self.storage, |data| {
            let mut document = match schema::decode_document(&label, data) {
                Ok(document) => document,
                Err(GameaidError::Parse(reason)) => {
                    log::warn!(
                        "{}: overwriting content that is not JSON: {}",
                        label,
                        reason
                    );
                    Document::default()
                }
                Err(err) => return Err(err),
            };
            document.ensure_readable(email)?;
            let output = mutate(&mut document.records, clock.now_millis())?;
            Ok((schema::encode_document(&document)?, output))
        })
    }
}

fn check_patch_email(email: &str, patch: &UserPatch) -> Result<()> {
    match &patch.email {
        Some(other) if other != email => Err(GameaidError::InvalidRecord(
            format!("cannot move record {} to {}", email, other),
        )),
        _ => Ok(()),
    }
}
