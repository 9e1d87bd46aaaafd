//! Protocol types for the grid backend worker.

use repogrid_core::models::{Cursor, FieldValue, Row, SortModelEntry};
use repogrid_core::{EditResolution, Epoch, RequestId, RowsError};

/// Commands issued by the UI thread for the backend worker to execute.
#[derive(Debug)]
pub enum GridCmd {
    /// Ask for rows `[start_row, end_row)` under the table's current sort model.
    RequestRows {
        id: RequestId,
        start_row: usize,
        end_row: usize,
        sort_model: Vec<SortModelEntry>,
    },
    /// The table's sort model changed; re-request the in-view range under `id`.
    SortChanged {
        id: RequestId,
        sort_model: Vec<SortModelEntry>,
    },
    /// Commit an inline edit of one cell.
    EditCell {
        cursor: Cursor,
        col_id: String,
        value: FieldValue,
    },
    /// Stop the worker loop.
    Shutdown,
}

/// Events produced by the backend worker and polled by the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// Rows answering request `id`, starting at `start_row`.
    RowsLoaded {
        id: RequestId,
        start_row: usize,
        rows: Vec<Row>,
        /// Known end of the collection, once the source reported it.
        last_row: Option<usize>,
        /// Approximate collection size for scrollbar sizing.
        total_count: Option<u64>,
    },
    /// Request `id` could not be answered.
    RowsFailed { id: RequestId, error: RowsError },
    /// A cached row changed (optimistic edit or rollback).
    RowUpdated { epoch: Epoch, index: usize, row: Row },
    /// The cache was cleared for a new sort order.
    CacheReset { epoch: Epoch },
    /// An edit was applied optimistically and its remote write started.
    EditSubmitted { cursor: Cursor, col_id: String },
    /// The remote write for an edit finished.
    EditSettled { col_id: String, resolution: EditResolution },
    /// The edit was not applied (unknown row, read-only column).
    EditRejected { cursor: Cursor, col_id: String },
}
