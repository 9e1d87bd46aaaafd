//! Append-only row cache for the active sort epoch.
//!
//! Rows are indexed `0..len()` in the order the remote source returned them.
//! The cache never evicts; it only grows within an epoch and is cleared
//! wholesale by [`PageCache::reset`]. Subscribers are notified synchronously
//! on every change so the table can re-render without polling.

use crate::error::CacheError;
use crate::models::{Cursor, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

/// Generation counter bumped on every sort-order change.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Epoch(u64);

impl Epoch {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Change notification delivered to cache subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    /// Rows were appended at `range`.
    Appended { epoch: Epoch, range: Range<usize> },
    /// All rows were dropped and a new epoch started.
    Reset { epoch: Epoch },
    /// The row at `index` was replaced.
    RowUpdated { epoch: Epoch, index: usize, row: Row },
}

type CacheListener = Box<dyn FnMut(&CacheEvent) + Send>;

/// Ordered, cursor-indexed rows for one sort epoch.
#[derive(Default)]
pub struct PageCache {
    epoch: Epoch,
    rows: Vec<Row>,
    positions: HashMap<Cursor, usize>,
    listeners: Vec<CacheListener>,
}

impl fmt::Debug for PageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCache")
            .field("epoch", &self.epoch)
            .field("len", &self.rows.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current epoch.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Number of cached rows in the active epoch.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in `[start, end)`.
    ///
    /// Callers must keep `end <= len()`; out-of-range bounds are clamped
    /// rather than panicking.
    pub fn slice(&self, start: usize, end: usize) -> &[Row] {
        debug_assert!(start <= end && end <= self.rows.len());
        let end = end.min(self.rows.len());
        let start = start.min(end);
        &self.rows[start..end]
    }

    /// Cursor of the last cached row; the `after` argument for the next page.
    pub fn last_cursor(&self) -> Option<&Cursor> {
        self.rows.last().map(|row| &row.cursor)
    }

    /// Look up a cached row by cursor.
    pub fn get(&self, cursor: &Cursor) -> Option<&Row> {
        self.position(cursor).and_then(|index| self.rows.get(index))
    }

    /// Position of `cursor` in the active epoch.
    pub fn position(&self, cursor: &Cursor) -> Option<usize> {
        self.positions.get(cursor).copied()
    }

    /// Append rows fetched for `epoch`.
    ///
    /// The whole batch is validated before anything is written, so a rejected
    /// append leaves the cache untouched.
    ///
    /// # Returns
    /// The index range the rows now occupy.
    ///
    /// # Errors
    /// Returns [`CacheError::EpochMismatch`] when `epoch` is not the active
    /// epoch, or [`CacheError::DuplicateCursor`] when a cursor is already
    /// cached or repeated within the batch.
    pub fn append(&mut self, epoch: Epoch, rows: Vec<Row>) -> Result<Range<usize>, CacheError> {
        if epoch != self.epoch {
            return Err(CacheError::EpochMismatch {
                expected: self.epoch,
                actual: epoch,
            });
        }
        let mut batch = HashMap::with_capacity(rows.len());
        for (offset, row) in rows.iter().enumerate() {
            if self.positions.contains_key(&row.cursor)
                || batch.insert(row.cursor.clone(), offset).is_some()
            {
                return Err(CacheError::DuplicateCursor(row.cursor.clone()));
            }
        }

        let start = self.rows.len();
        for (cursor, offset) in batch {
            self.positions.insert(cursor, start + offset);
        }
        self.rows.extend(rows);
        let range = start..self.rows.len();
        if !range.is_empty() {
            self.notify(CacheEvent::Appended {
                epoch: self.epoch,
                range: range.clone(),
            });
        }
        Ok(range)
    }

    /// Drop every row and start a new epoch.
    ///
    /// # Returns
    /// The new epoch.
    pub fn reset(&mut self) -> Epoch {
        self.rows.clear();
        self.positions.clear();
        self.epoch = self.epoch.next();
        self.notify(CacheEvent::Reset { epoch: self.epoch });
        self.epoch
    }

    /// Replace the row at `cursor` with `mutator(row)`.
    ///
    /// The replacement always keeps the original cursor so positions stay
    /// consistent.
    ///
    /// # Returns
    /// `false` when `cursor` is not cached (nothing changes).
    pub fn update_row<F>(&mut self, cursor: &Cursor, mutator: F) -> bool
    where
        F: FnOnce(&Row) -> Row,
    {
        let Some(index) = self.position(cursor) else {
            return false;
        };
        let mut updated = mutator(&self.rows[index]);
        updated.cursor = cursor.clone();
        self.rows[index] = updated.clone();
        self.notify(CacheEvent::RowUpdated {
            epoch: self.epoch,
            index,
            row: updated,
        });
        true
    }

    /// Register a change listener. Listeners run synchronously, in
    /// registration order, after each mutation has been applied.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&CacheEvent) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, event: CacheEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CacheEvent, Epoch, PageCache};
    use crate::error::CacheError;
    use crate::models::{Cursor, FieldValue, Row};
    use std::sync::{Arc, Mutex};

    fn rows(range: std::ops::Range<usize>) -> Vec<Row> {
        range
            .map(|i| Row::new(Cursor::new(format!("c{i}")), format!("id-{i}")).with_field("name", format!("repo-{i}")))
            .collect()
    }

    #[test]
    fn appends_grow_monotonically_and_earlier_slices_stay_stable() {
        let mut cache = PageCache::new();
        let epoch = cache.epoch();
        cache.append(epoch, rows(0..50)).expect("first page");
        let snapshot = cache.slice(0, 50).to_vec();

        let range = cache.append(epoch, rows(50..90)).expect("second page");
        assert_eq!(range, 50..90);
        assert_eq!(cache.len(), 90);
        assert_eq!(cache.slice(0, 50), snapshot.as_slice());
        assert_eq!(cache.last_cursor(), Some(&Cursor::new("c89")));
        assert_eq!(cache.position(&Cursor::new("c60")), Some(60));
    }

    #[test]
    fn append_from_stale_epoch_fails_fast_without_mutation() {
        let mut cache = PageCache::new();
        let stale = cache.epoch();
        let fresh = cache.reset();
        assert_eq!(fresh, Epoch::new(1));

        let err = cache.append(stale, rows(0..5)).expect_err("stale append");
        assert_eq!(
            err,
            CacheError::EpochMismatch {
                expected: fresh,
                actual: stale
            }
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn duplicate_cursor_rejects_whole_batch() {
        let mut cache = PageCache::new();
        let epoch = cache.epoch();
        cache.append(epoch, rows(0..3)).expect("seed");

        let mut batch = rows(3..5);
        batch.push(Row::new(Cursor::new("c1"), "dup"));
        let err = cache.append(epoch, batch).expect_err("duplicate cursor");
        assert_eq!(err, CacheError::DuplicateCursor(Cursor::new("c1")));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.position(&Cursor::new("c3")), None);
    }

    #[test]
    fn update_row_replaces_in_place_and_ignores_unknown_cursor() {
        let mut cache = PageCache::new();
        let epoch = cache.epoch();
        cache.append(epoch, rows(0..3)).expect("seed");

        let changed = cache.update_row(&Cursor::new("c1"), |row| {
            let mut next = row.with_replaced("name", FieldValue::from("renamed"));
            next.cursor = Cursor::new("ignored");
            next
        });
        assert!(changed);
        let row = cache.get(&Cursor::new("c1")).expect("row still keyed by cursor");
        assert_eq!(row.field("name"), Some(&FieldValue::from("renamed")));

        assert!(!cache.update_row(&Cursor::new("missing"), |row| row.clone()));
    }

    #[test]
    fn reset_clears_rows_and_bumps_epoch() {
        let mut cache = PageCache::new();
        let epoch = cache.epoch();
        cache.append(epoch, rows(0..10)).expect("seed");
        let next = cache.reset();
        assert!(next > epoch);
        assert!(cache.is_empty());
        assert_eq!(cache.last_cursor(), None);
        assert!(cache.get(&Cursor::new("c0")).is_none());
    }

    #[test]
    fn subscribers_observe_appends_resets_and_updates_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut cache = PageCache::new();
        cache.subscribe(move |event| sink.lock().expect("sink").push(event.clone()));

        let epoch = cache.epoch();
        cache.append(epoch, rows(0..2)).expect("append");
        cache.update_row(&Cursor::new("c0"), |row| row.clone());
        cache.reset();
        cache.append(Epoch::new(1), Vec::new()).expect("empty append");

        let seen = seen.lock().expect("seen");
        assert_eq!(seen.len(), 3, "empty append must not notify");
        assert!(matches!(seen[0], CacheEvent::Appended { ref range, .. } if *range == (0..2)));
        assert!(matches!(seen[1], CacheEvent::RowUpdated { index: 0, .. }));
        assert!(matches!(seen[2], CacheEvent::Reset { epoch } if epoch == Epoch::new(1)));
    }
}
