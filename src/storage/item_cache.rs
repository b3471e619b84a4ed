use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::{Stream, StreamExt};

use crate::domain::Item;
use crate::errors::NewsboyResult;

#[derive(Debug, Default)]
struct CacheState {
    /// Items seen by a poll but not yet handed to a reader
    pending: HashMap<String, Item>,
    /// Items already handed out, kept so later polls don't resurface them
    delivered: HashMap<String, Item>,
}

/// Outcome of absorbing one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbsorbStats {
    pub added: usize,
    pub skipped: usize,
}

/// Deduplicating store of unread and read items.
///
/// One lock guards both maps and is never held across an await point, so
/// the cache can be shared freely between the poll loop and any number of
/// readers. `pending` and `delivered` never share an identity.
#[derive(Debug, Default)]
pub struct ItemCache {
    state: Mutex<CacheState>,
}

impl ItemCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // The maps stay consistent per entry, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge a poll cycle's stream into `pending`, skipping anything already delivered.
    pub async fn absorb<S>(&self, stream: S) -> AbsorbStats
    where
        S: Stream<Item = Item>,
    {
        let mut stats = AbsorbStats::default();
        let mut stream = std::pin::pin!(stream);

        while let Some(item) = stream.next().await {
            if self.absorb_one(item) {
                stats.added += 1;
            } else {
                stats.skipped += 1;
            }
        }

        stats
    }

    /// Synchronous form of [`absorb`](Self::absorb) for an in-memory batch.
    pub fn absorb_items<I>(&self, items: I) -> AbsorbStats
    where
        I: IntoIterator<Item = Item>,
    {
        let mut stats = AbsorbStats::default();
        for item in items {
            if self.absorb_one(item) {
                stats.added += 1;
            } else {
                stats.skipped += 1;
            }
        }
        stats
    }

    fn absorb_one(&self, item: Item) -> bool {
        let mut state = self.lock();
        if state.delivered.contains_key(item.identity()) {
            return false;
        }
        // Last write wins for an identity seen twice before a drain
        state.pending.insert(item.url.clone(), item);
        true
    }

    /// Move every pending item to `delivered` and return the moved items.
    ///
    /// Each item is returned by exactly one drain.
    pub fn drain_unread(&self) -> Vec<Item> {
        let mut state = self.lock();
        let pending = std::mem::take(&mut state.pending);

        let mut items = Vec::with_capacity(pending.len());
        for (identity, item) in pending {
            state.delivered.insert(identity, item.clone());
            items.push(item);
        }
        items
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn delivered_count(&self) -> usize {
        self.lock().delivered.len()
    }

    /// Case-insensitive title search over delivered items. An empty term matches everything.
    pub fn search(&self, term: &str) -> Vec<Item> {
        let term = term.to_lowercase();
        let state = self.lock();

        state
            .delivered
            .values()
            .filter(|item| item.title.to_lowercase().contains(&term))
            .cloned()
            .collect()
    }

    /// Forget every delivered item and return how many there were. Pending items are kept.
    pub fn flush(&self) -> usize {
        std::mem::take(&mut self.lock().delivered).len()
    }

    /// Every known item, delivered first then pending, without changing state.
    pub fn snapshot_all(&self) -> Vec<Item> {
        let state = self.lock();
        state
            .delivered
            .values()
            .chain(state.pending.values())
            .cloned()
            .collect()
    }

    /// Serialize the delivered map as a JSON object keyed by identity.
    pub fn dump(&self) -> NewsboyResult<String> {
        self.dump_counted().map(|(encoded, _)| encoded)
    }

    /// Like [`dump`](Self::dump), also returning the number of items
    /// written, both taken under one lock.
    pub fn dump_counted(&self) -> NewsboyResult<(String, usize)> {
        let state = self.lock();
        // Sorted keys keep dumps stable between runs
        let ordered: BTreeMap<&String, &Item> = state.delivered.iter().collect();
        Ok((serde_json::to_string(&ordered)?, ordered.len()))
    }

    pub fn dump_to<W: Write>(&self, mut writer: W) -> NewsboyResult<()> {
        let encoded = self.dump()?;
        writer.write_all(encoded.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Merge a previous dump into `delivered`, overwriting equal identities.
    ///
    /// Entries are keyed by each item's url, whatever key the dump used.
    /// Loaded identities are dropped from `pending` so the maps stay disjoint.
    /// Nothing changes if the input does not parse. Returns the number of
    /// items loaded.
    pub fn load(&self, encoded: &str) -> NewsboyResult<usize> {
        let parsed: HashMap<String, Item> = serde_json::from_str(encoded)?;
        let loaded: HashMap<String, Item> = parsed
            .into_values()
            .map(|item| (item.identity().to_string(), item))
            .collect();
        let count = loaded.len();

        let mut state = self.lock();
        for (identity, item) in loaded {
            state.pending.remove(&identity);
            state.delivered.insert(identity, item);
        }

        Ok(count)
    }

    pub fn load_from<R: Read>(&self, mut reader: R) -> NewsboyResult<usize> {
        let mut encoded = String::new();
        reader.read_to_string(&mut encoded)?;
        self.load(&encoded)
    }
}
