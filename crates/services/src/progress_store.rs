//! Write-back store of learner progress cursors.
//!
//! The live cursor table is held in memory, one mutex per (username, category),
//! so requests for different learners never contend on a shared lock. Updates
//! are recorded in a bounded journal of dirty keys; `force_persist` writes the
//! full table to the repository in one transaction and clears the journal.
//!
//! When the journal is full, `try_advance` refuses to take on another dirty key
//! and answers `Advance::NeedsPersist` instead. The caller flushes and retries
//! once with `Admission::Forced`, which is never refused.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use storage::repository::{ProgressRecord, ProgressRepository, StorageError};
use tracing::{debug, error, info, warn};
use vocab_core::Clock;
use vocab_core::model::{ProgressCursor, ProgressKey, TraversalMode};
use vocab_core::selection::{self, IndexError};

/// Default bound on keys with unflushed updates.
pub const DEFAULT_MAX_PENDING: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSettings {
    /// Dirty keys the journal accepts before asking for a flush.
    pub max_pending: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

/// Outcome of `ProgressStore::try_advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The index was recorded and should be served.
    Served(usize),
    /// Nothing was recorded; flush with `force_persist` and try again.
    NeedsPersist,
}

/// How `try_advance` treats a key that is not yet in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Refuse with `Advance::NeedsPersist` when the journal is full.
    Bounded,
    /// Always admit, even past `max_pending`; used for the single retry
    /// after a forced flush.
    Forced,
}

/// What a flush wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushReport {
    /// Cursors written (the full table).
    pub written: usize,
    /// Dirty keys the flush cleared.
    pub cleared: usize,
}

type Slot = Arc<Mutex<Option<ProgressCursor>>>;

#[derive(Debug, Default)]
struct Journal {
    dirty: HashSet<ProgressKey>,
}

impl Journal {
    fn admit(&mut self, key: &ProgressKey, admission: Admission, max_pending: usize) -> bool {
        if self.dirty.contains(key) {
            return true;
        }
        if admission == Admission::Bounded && self.dirty.len() >= max_pending {
            return false;
        }
        self.dirty.insert(key.clone());
        true
    }
}

/// Dirty keys taken out of the journal for one flush.
///
/// Unless `commit` is called, dropping this puts the keys back, which covers
/// both a failed write and a flush future that is cancelled mid-way.
struct DrainedKeys<'a> {
    journal: &'a Mutex<Journal>,
    keys: HashSet<ProgressKey>,
    committed: bool,
}

impl<'a> DrainedKeys<'a> {
    fn take(journal: &'a Mutex<Journal>) -> Self {
        let keys = std::mem::take(&mut journal.lock().dirty);
        Self {
            journal,
            keys,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for DrainedKeys<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.keys.is_empty() {
            self.journal.lock().dirty.extend(self.keys.drain());
        }
    }
}

pub struct ProgressStore {
    clock: Clock,
    settings: StoreSettings,
    repo: Arc<dyn ProgressRepository>,
    slots: RwLock<HashMap<ProgressKey, Slot>>,
    journal: Mutex<Journal>,
    flush_gate: tokio::sync::Mutex<()>,
}

impl ProgressStore {
    /// An empty store that flushes into `repo`.
    #[must_use]
    pub fn new(repo: Arc<dyn ProgressRepository>, clock: Clock, settings: StoreSettings) -> Self {
        Self {
            clock,
            settings,
            repo,
            slots: RwLock::new(HashMap::new()),
            journal: Mutex::new(Journal::default()),
            flush_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Rebuild the cursor table from the last successful flush.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the repository cannot be read.
    pub async fn load(
        repo: Arc<dyn ProgressRepository>,
        clock: Clock,
        settings: StoreSettings,
    ) -> Result<Self, StorageError> {
        let records = repo.load_cursors().await?;
        info!("Loaded {} progress cursors", records.len());
        let store = Self::new(repo, clock, settings);
        {
            let mut slots = store.slots.write();
            for record in records {
                slots.insert(record.key, Arc::new(Mutex::new(Some(record.cursor))));
            }
        }
        Ok(store)
    }

    /// Choose, record and return the next index for `key`.
    ///
    /// Ordered mode records `reported` after checking it against `count`.
    /// Unordered mode draws uniformly among every index except the one served
    /// last. Calls for the same key are serialized; the cursor is updated in a
    /// single critical section with no I/O.
    ///
    /// With `Admission::Bounded` a key outside a full journal gets
    /// `Advance::NeedsPersist` and nothing is recorded. `Admission::Forced`
    /// always records.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::OutOfRange` for an ordered index `>= count` and
    /// `IndexError::Empty` when `count == 0`. The cursor is untouched in both
    /// cases.
    pub fn try_advance(
        &self,
        key: &ProgressKey,
        mode: TraversalMode,
        reported: usize,
        count: usize,
        admission: Admission,
    ) -> Result<Advance, IndexError> {
        let slot = self.slot(key);
        let mut cursor = slot.lock();

        let previous = cursor.as_ref().map(ProgressCursor::last_index);
        let index = selection::next_index(&mut rand::rng(), mode, previous, reported, count)?;

        if !self
            .journal
            .lock()
            .admit(key, admission, self.settings.max_pending)
        {
            warn!(%key, "Progress journal is full, flush required");
            return Ok(Advance::NeedsPersist);
        }

        let now = self.clock.now();
        match cursor.as_mut() {
            Some(existing) => existing.record(index, mode, now),
            None => *cursor = Some(ProgressCursor::first(index, mode, now)),
        }
        Ok(Advance::Served(index))
    }

    /// Write the full cursor table to the repository.
    ///
    /// Flushes are serialized. Updates racing with a flush are either part of
    /// it or stay pending for the next one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails; pending keys are kept and the
    /// store stays usable.
    pub async fn force_persist(&self) -> Result<FlushReport, StorageError> {
        let _gate = self.flush_gate.lock().await;

        let drained = DrainedKeys::take(&self.journal);
        if drained.keys.is_empty() {
            debug!("No pending progress to flush");
            return Ok(FlushReport::default());
        }

        let records = self.snapshot();
        self.repo
            .flush_cursors(&records)
            .await
            .inspect_err(|err| {
                error!(%err, pending = drained.keys.len(), "Failed to flush progress cursors");
            })?;

        let report = FlushReport {
            written: records.len(),
            cleared: drained.keys.len(),
        };
        drained.commit();
        debug!(written = report.written, cleared = report.cleared, "Flushed progress cursors");
        Ok(report)
    }

    /// Point-in-time copy of the cursor for `key`.
    #[must_use]
    pub fn read_cursor(&self, key: &ProgressKey) -> Option<ProgressCursor> {
        let slot = self.slots.read().get(key).cloned()?;
        let cursor = slot.lock().clone();
        cursor
    }

    /// Number of keys with updates not yet flushed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.journal.lock().dirty.len()
    }

    /// Number of cursors held in memory.
    #[must_use]
    pub fn cursor_count(&self) -> usize {
        self.snapshot().len()
    }

    fn slot(&self, key: &ProgressKey) -> Slot {
        if let Some(slot) = self.slots.read().get(key) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write();
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    fn snapshot(&self) -> Vec<ProgressRecord> {
        let slots: Vec<(ProgressKey, Slot)> = self
            .slots
            .read()
            .iter()
            .map(|(key, slot)| (key.clone(), Arc::clone(slot)))
            .collect();

        slots
            .into_iter()
            .filter_map(|(key, slot)| {
                let cursor = slot.lock().clone()?;
                Some(ProgressRecord::new(key, cursor))
            })
            .collect()
    }
}
