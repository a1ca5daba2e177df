//! Linear undo/redo log of pixelation results.
//!
//! The log holds at most `capacity` entries and a single cursor pointing
//! at the displayed state. Pushing while the cursor is behind the head
//! discards the redo tail, the same way a text editor forgets redo
//! history after a new edit.
//!
//! Every bitmap going in or coming out is deep-copied: callers never
//! share buffers with the log.

use std::collections::VecDeque;

use web_time::SystemTime;

use crate::types::{Bitmap, PixelationOptions};

/// Default number of entries kept.
pub const MAX_HISTORY_SIZE: usize = 20;

/// Identifier of a history entry, unique within one manager until the
/// next [`HistoryManager::clear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub u64);

/// One recorded pixelation result.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    bitmap: Bitmap,
    options: PixelationOptions,
    id: EntryId,
    timestamp: SystemTime,
}

impl HistoryEntry {
    /// The stored bitmap, for previews. Clone it to keep it.
    #[must_use]
    pub const fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// Options that produced this entry.
    #[must_use]
    pub const fn options(&self) -> PixelationOptions {
        self.options
    }

    /// Entry identifier.
    #[must_use]
    pub const fn id(&self) -> EntryId {
        self.id
    }

    /// Wall-clock time of the push.
    #[must_use]
    pub const fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            bitmap: self.bitmap.clone(),
            options: self.options,
            id: self.id,
        }
    }
}

/// An owned copy of a history entry handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    /// Independent copy of the stored bitmap.
    pub bitmap: Bitmap,
    /// Options that produced it.
    pub options: PixelationOptions,
    /// Identifier of the source entry.
    pub id: EntryId,
}

/// Bounded undo/redo log.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: VecDeque<HistoryEntry>,
    /// Index of the displayed entry; `None` when empty.
    cursor: Option<usize>,
    capacity: usize,
    next_id: u64,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryManager {
    /// An empty log holding up to [`MAX_HISTORY_SIZE`] entries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_SIZE)
    }

    /// An empty log holding up to `capacity` entries (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            cursor: None,
            capacity,
            next_id: 0,
        }
    }

    /// Maximum number of entries retained.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a new state and make it current.
    ///
    /// Entries after the cursor are discarded first. When the log is
    /// full the oldest entry is evicted.
    pub fn push_state(&mut self, bitmap: &Bitmap, options: PixelationOptions) -> EntryId {
        if let Some(cursor) = self.cursor {
            let dropped = self.entries.len() - cursor - 1;
            if dropped > 0 {
                log::debug!("history: discarding {dropped} redo entries");
            }
            self.entries.truncate(cursor + 1);
        }

        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push_back(HistoryEntry {
            bitmap: bitmap.clone(),
            options,
            id,
            timestamp: SystemTime::now(),
        });

        if self.entries.len() > self.capacity {
            self.entries.pop_front();
            log::debug!("history: evicted oldest entry (capacity {})", self.capacity);
        }
        self.cursor = Some(self.entries.len() - 1);
        log::debug!(
            "history: pushed {:?} ({options}), {} entries",
            id,
            self.entries.len()
        );
        id
    }

    /// Step back one entry and return a copy of it.
    pub fn undo(&mut self) -> Option<HistorySnapshot> {
        let cursor = self.cursor.filter(|&c| c > 0)? - 1;
        self.cursor = Some(cursor);
        log::debug!("history: undo to index {cursor}");
        self.entries.get(cursor).map(HistoryEntry::snapshot)
    }

    /// Step forward one entry and return a copy of it.
    pub fn redo(&mut self) -> Option<HistorySnapshot> {
        let cursor = self.cursor.filter(|&c| c + 1 < self.entries.len())? + 1;
        self.cursor = Some(cursor);
        log::debug!("history: redo to index {cursor}");
        self.entries.get(cursor).map(HistoryEntry::snapshot)
    }

    /// Drop every entry. Ids keep counting so they stay unique.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    /// Whether [`undo`](Self::undo) would succeed.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    /// Whether [`redo`](Self::redo) would succeed.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the displayed entry, or `None` when empty.
    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        self.cursor
    }

    /// Copy of the entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<HistorySnapshot> {
        self.entries.get(index).map(HistoryEntry::snapshot)
    }

    /// Copy of the displayed entry.
    #[must_use]
    pub fn current(&self) -> Option<HistorySnapshot> {
        self.get(self.cursor?)
    }

    /// Borrowing iterator over all entries, oldest first.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}
