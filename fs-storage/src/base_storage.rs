use data_error::{GameaidError, Result};

/// How many write attempts [`modify`] makes before giving up with
/// [`GameaidError::Conflict`].
///
/// An attempt is only lost when a rival write lands between its load and
/// its compare-and-swap, so a call that races fewer than this many rival
/// writes always succeeds.
pub const MAX_MODIFY_ATTEMPTS: usize = 16;

/// A persisted blob together with the version it was read at.
///
/// Version `0` means that nothing has been written yet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub version: u64,
    pub data: Option<Vec<u8>>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A single named slot holding one opaque blob.
///
/// Writers never overwrite blindly: a write is computed from a [`Snapshot`]
/// and only lands if the slot is still at that snapshot's version.
pub trait BaseStorage {
    /// Diagnostic label used in logs and errors.
    fn label(&self) -> &str;

    /// Read the latest blob from the pre-configured location.
    fn load(&self) -> Result<Snapshot>;

    /// Replace the blob with `blob` if the latest version is still
    /// `current.version`, returning the new version.
    ///
    /// # Errors
    /// [`GameaidError::Conflict`] means another writer got there first and
    /// the write must be recomputed from a fresher snapshot. Any other
    /// error is forwarded as is.
    fn compare_and_swap(&mut self, current: &Snapshot, blob: &[u8])
        -> Result<u64>;

    /// Remove the persisted blob. The version keeps counting: a snapshot
    /// taken before the erase can no longer be written against.
    fn erase(&mut self) -> Result<()>;
}

impl<S: BaseStorage + ?Sized> BaseStorage for Box<S> {
    fn label(&self) -> &str {
        (**self).label()
    }

    fn load(&self) -> Result<Snapshot> {
        (**self).load()
    }

    fn compare_and_swap(
        &mut self,
        current: &Snapshot,
        blob: &[u8],
    ) -> Result<u64> {
        (**self).compare_and_swap(current, blob)
    }

    fn erase(&mut self) -> Result<()> {
        (**self).erase()
    }
}

/// Read-modify-write loop over a [`BaseStorage`].
///
/// `operator` receives the current blob (`None` if the slot is empty) and
/// returns the blob to write plus a value handed back to the caller. It is
/// re-run on a fresh snapshot every time the write loses a race, so it must
/// not have side effects outside of its return value.
pub fn modify<S, T>(
    storage: &mut S,
    mut operator: impl FnMut(Option<&[u8]>) -> Result<(Vec<u8>, T)>,
) -> Result<T>
where
    S: BaseStorage + ?Sized,
{
    for attempt in 1..=MAX_MODIFY_ATTEMPTS {
        let latest = storage.load()?;
        let (blob, output) = operator(latest.data.as_deref())?;
        match storage.compare_and_swap(&latest, &blob) {
            Ok(version) => {
                log::debug!(
                    "{}: wrote version {} ({} bytes)",
                    storage.label(),
                    version,
                    blob.len()
                );
                return Ok(output);
            }
            Err(err) if err.is_conflict() => {
                log::debug!(
                    "{}: version {} is stale, retrying (attempt {})",
                    storage.label(),
                    latest.version,
                    attempt
                );
            }
            Err(err) => return Err(err),
        }
    }

    log::warn!(
        "{}: giving up after {} conflicting writes",
        storage.label(),
        MAX_MODIFY_ATTEMPTS
    );
    Err(GameaidError::Conflict(storage.label().to_owned()))
}
