//! Block row model backing the virtualized table.
//!
//! The table is split into blocks of `block_size` rows. Blocks are loaded
//! front to back: a block is only requested once every earlier block is
//! loaded, and only one block request is outstanding at a time. A block whose
//! request failed stays failed until it leaves the view and comes back.

use repogrid_core::models::Row;
use repogrid_core::{Epoch, RequestId};
use std::collections::BTreeMap;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BlockState {
    Loading(RequestId),
    Loaded,
    /// `rearmed` flips once the block has scrolled out of view.
    Failed { rearmed: bool },
}

/// A row-range request the table should send to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct BlockRequest {
    pub(super) id: RequestId,
    pub(super) start_row: usize,
    pub(super) end_row: usize,
}

#[derive(Debug)]
pub(super) struct RowBlocks {
    block_size: usize,
    rows: Vec<Option<Row>>,
    blocks: BTreeMap<usize, BlockState>,
    last_row: Option<usize>,
    total_count: Option<u64>,
    epoch: Epoch,
    last_requested: Option<usize>,
    next_request: u64,
}

impl RowBlocks {
    pub(super) fn new(block_size: usize) -> Self {
        Self {
            block_size: block_size.max(1),
            rows: Vec::new(),
            blocks: BTreeMap::new(),
            last_row: None,
            total_count: None,
            epoch: Epoch::default(),
            last_requested: None,
            next_request: 1,
        }
    }

    pub(super) fn block_size(&self) -> usize {
        self.block_size
    }

    pub(super) fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index).and_then(Option::as_ref)
    }

    pub(super) fn state(&self, block: usize) -> Option<BlockState> {
        self.blocks.get(&block).copied()
    }

    pub(super) fn last_row(&self) -> Option<usize> {
        self.last_row
    }

    pub(super) fn is_loading(&self) -> bool {
        self.blocks
            .values()
            .any(|state| matches!(state, BlockState::Loading(_)))
    }

    pub(super) fn has_failures(&self) -> bool {
        self.blocks
            .values()
            .any(|state| matches!(state, BlockState::Failed { .. }))
    }

    /// Rows the scroll area should size itself for.
    ///
    /// Exact once the end is known; otherwise the larger of the reported
    /// total and one block past what is loaded.
    pub(super) fn row_count(&self) -> usize {
        if let Some(last_row) = self.last_row {
            return last_row;
        }
        let loaded = self.rows.len();
        let reported = self
            .total_count
            .map(|count| usize::try_from(count).unwrap_or(usize::MAX))
            .unwrap_or(0);
        reported.max(loaded + self.block_size)
    }

    fn allocate_id(&mut self) -> RequestId {
        let id = RequestId(self.next_request);
        self.next_request += 1;
        id
    }

    fn block_range(&self, block: usize) -> (usize, usize) {
        let start = block * self.block_size;
        (start, start + self.block_size)
    }

    /// Decide which block, if any, to request for the visible rows.
    pub(super) fn plan_request(&mut self, visible: Range<usize>) -> Option<BlockRequest> {
        let first_visible = visible.start / self.block_size;
        let last_visible = visible.end.saturating_sub(1).max(visible.start) / self.block_size;
        for (block, state) in self.blocks.iter_mut() {
            if let BlockState::Failed { rearmed } = state {
                if *block < first_visible || *block > last_visible {
                    *rearmed = true;
                }
            }
        }
        if self.is_loading() {
            return None;
        }

        let mut block = 0;
        while block <= last_visible {
            let (start_row, end_row) = self.block_range(block);
            if self.last_row.is_some_and(|last| start_row >= last) {
                return None;
            }
            match self.blocks.get(&block) {
                Some(BlockState::Loaded) => block += 1,
                Some(BlockState::Loading(_)) | Some(BlockState::Failed { rearmed: false }) => {
                    return None;
                }
                Some(BlockState::Failed { rearmed: true }) if block < first_visible => {
                    return None;
                }
                Some(BlockState::Failed { rearmed: true }) | None => {
                    let id = self.allocate_id();
                    self.blocks.insert(block, BlockState::Loading(id));
                    self.last_requested = Some(block);
                    return Some(BlockRequest {
                        id,
                        start_row,
                        end_row,
                    });
                }
            }
        }
        None
    }

    /// Drop every block for a new sort order.
    ///
    /// # Returns
    /// The id to send with the sort change; its answer fills the block that
    /// was last requested.
    pub(super) fn purge(&mut self) -> RequestId {
        let block = self.last_requested.unwrap_or(0);
        self.rows.clear();
        self.blocks.clear();
        self.last_row = None;
        self.total_count = None;
        let id = self.allocate_id();
        self.blocks.insert(block, BlockState::Loading(id));
        id
    }

    fn block_for(&self, id: RequestId) -> Option<usize> {
        self.blocks.iter().find_map(|(block, state)| match state {
            BlockState::Loading(pending) if *pending == id => Some(*block),
            _ => None,
        })
    }

    /// Store rows answering `id`.
    ///
    /// A block is only marked loaded once it is full or the end of the
    /// collection is known; a short answer otherwise leaves it to be
    /// requested again.
    ///
    /// # Returns
    /// `false` when `id` is not an outstanding block request (e.g. it was
    /// purged by a sort change).
    pub(super) fn apply_loaded(
        &mut self,
        id: RequestId,
        start_row: usize,
        rows: Vec<Row>,
        last_row: Option<usize>,
        total_count: Option<u64>,
    ) -> bool {
        let Some(block) = self.block_for(id) else {
            return false;
        };
        let complete = last_row.is_some() || rows.len() >= self.block_size;
        let end = start_row + rows.len();
        if self.rows.len() < end {
            self.rows.resize(end, None);
        }
        for (offset, row) in rows.into_iter().enumerate() {
            self.rows[start_row + offset] = Some(row);
        }
        if complete {
            self.blocks.insert(block, BlockState::Loaded);
        } else {
            self.blocks.remove(&block);
        }
        if last_row.is_some() {
            self.last_row = last_row;
        }
        if total_count.is_some() {
            self.total_count = total_count;
        }
        true
    }

    /// Mark the block answering `id` as failed.
    pub(super) fn apply_failed(&mut self, id: RequestId) -> bool {
        let Some(block) = self.block_for(id) else {
            return false;
        };
        self.blocks.insert(block, BlockState::Failed { rearmed: false });
        true
    }

    /// Track the cache epoch announced by the backend.
    pub(super) fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch;
    }

    /// Replace a loaded row. Updates from another epoch are ignored.
    pub(super) fn update_row(&mut self, epoch: Epoch, index: usize, row: Row) -> bool {
        if epoch != self.epoch {
            return false;
        }
        match self.rows.get_mut(index) {
            Some(slot @ Some(_)) => {
                *slot = Some(row);
                true
            }
            _ => false,
        }
    }
}
