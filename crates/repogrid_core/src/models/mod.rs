//! Data models shared by the grid, the pagination core, and the HTTP surface.

/// Page requests and responses exchanged with the remote endpoint.
pub mod page;
/// Repository records and their wire shapes.
pub mod repository;
/// Grid rows, cursors, and cell values.
pub mod row;
/// Sort orders and the table-side sort model.
pub mod sort;

pub use page::{EditOutcome, EditRequest, FetchRequest, FieldError, Page};
pub use repository::{Connection, Edge, RenameRequest, RenameResponse, Repository};
pub use row::{Cursor, FieldValue, Row};
pub use sort::{SortDirection, SortField, SortModelEntry, SortOrder};

#[cfg(test)]
mod tests;
