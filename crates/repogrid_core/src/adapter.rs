//! Grid adapter: table events in, controller calls out.
//!
//! The adapter translates the table's column ids and sort model into the
//! controller's vocabulary and mirrors the in-view row range so a sort change
//! can re-request what the user is looking at.

use crate::constants::DEFAULT_PAGE_SIZE;
use crate::error::SourceError;
use crate::models::repository::{
    FIELD_CREATED_AT, FIELD_IS_FORK, FIELD_NAME, FIELD_STARGAZERS, FIELD_UPDATED_AT,
};
use crate::models::{Cursor, EditOutcome, FieldValue, Page, SortField, SortModelEntry, SortOrder};
use crate::pager::{
    EditDecision, EditResolution, EditTicket, FetchTicket, PagerEffect, PagerSettings,
    PaginationController, RequestId, RowRequest,
};

/// A table column and how it maps onto row fields and server sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column id used by the table's sort model.
    pub id: &'static str,
    /// Row field rendered in this column.
    pub field: &'static str,
    pub header: &'static str,
    pub sortable: bool,
    pub editable: bool,
}

/// Columns of the repository grid, in display order.
pub const REPOSITORY_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        id: "name",
        field: FIELD_NAME,
        header: "Name",
        sortable: true,
        editable: true,
    },
    ColumnSpec {
        id: "is_fork",
        field: FIELD_IS_FORK,
        header: "Fork",
        sortable: false,
        editable: false,
    },
    ColumnSpec {
        id: "stargazers",
        field: FIELD_STARGAZERS,
        header: "Stars",
        sortable: true,
        editable: false,
    },
    ColumnSpec {
        id: "created_at",
        field: FIELD_CREATED_AT,
        header: "Created",
        sortable: true,
        editable: false,
    },
    ColumnSpec {
        id: "updated_at",
        field: FIELD_UPDATED_AT,
        header: "Updated",
        sortable: true,
        editable: false,
    },
];

/// Map a column id onto the server's sort field. Unknown ids sort by name,
/// the way the upstream API falls back.
pub fn sort_field_for(col_id: &str) -> SortField {
    match col_id {
        "stargazers" => SortField::Stargazers,
        "created_at" => SortField::CreatedAt,
        "updated_at" => SortField::UpdatedAt,
        _ => SortField::Name,
    }
}

/// Derive the controller's sort order from a table sort model.
///
/// Only the first entry is honoured; an empty model means "no ordering".
pub fn sort_order_for(model: &[SortModelEntry]) -> Option<SortOrder> {
    model
        .first()
        .map(|entry| SortOrder::new(sort_field_for(&entry.col_id), entry.sort))
}

/// Owns the [`PaginationController`] on behalf of the table.
#[derive(Debug)]
pub struct GridAdapter {
    controller: PaginationController,
    columns: &'static [ColumnSpec],
    sort_model: Vec<SortModelEntry>,
    view: Option<(usize, usize)>,
    page_size: usize,
}

impl GridAdapter {
    /// Create an adapter over `columns` whose first epoch uses `sort_model`.
    ///
    /// # Arguments
    /// - `columns`: Column definitions the table renders.
    /// - `sort_model`: The table's initial sort model.
    /// - `settings`: Controller tunables.
    /// - `page_size`: Rows per block; the range re-requested on a sort change
    ///   before the table has asked for anything.
    pub fn new(
        columns: &'static [ColumnSpec],
        sort_model: Vec<SortModelEntry>,
        settings: PagerSettings,
        page_size: usize,
    ) -> Self {
        let controller = PaginationController::new(sort_order_for(&sort_model), settings);
        Self {
            controller,
            columns,
            sort_model,
            view: None,
            page_size: page_size.max(1),
        }
    }

    /// Adapter for [`REPOSITORY_COLUMNS`] with the default page size.
    pub fn for_repositories(sort_model: Vec<SortModelEntry>, settings: PagerSettings) -> Self {
        Self::new(REPOSITORY_COLUMNS, sort_model, settings, DEFAULT_PAGE_SIZE)
    }

    pub fn controller(&self) -> &PaginationController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PaginationController {
        &mut self.controller
    }

    pub fn columns(&self) -> &'static [ColumnSpec] {
        self.columns
    }

    pub fn column(&self, col_id: &str) -> Option<&'static ColumnSpec> {
        self.columns.iter().find(|column| column.id == col_id)
    }

    pub fn sort_model(&self) -> &[SortModelEntry] {
        &self.sort_model
    }

    /// Last row range the table asked for.
    pub fn view(&self) -> Option<(usize, usize)> {
        self.view
    }

    /// Row-range request from the table.
    pub fn request_rows(
        &mut self,
        id: RequestId,
        start_row: usize,
        end_row: usize,
        sort_model: &[SortModelEntry],
    ) -> Vec<PagerEffect> {
        self.view = Some((start_row, end_row));
        self.sort_model = sort_model.to_vec();
        self.controller.request_rows(
            RowRequest::new(id, start_row, end_row),
            sort_order_for(sort_model),
        )
    }

    /// Sort-change event from the table: re-issue the in-view range under
    /// the new ordering.
    pub fn sort_changed(&mut self, id: RequestId, sort_model: &[SortModelEntry]) -> Vec<PagerEffect> {
        let (start_row, end_row) = self.view.unwrap_or((0, self.page_size));
        self.request_rows(id, start_row, end_row, sort_model)
    }

    /// Cell-edit intent from the table.
    ///
    /// # Returns
    /// A rejected decision for unknown or read-only columns; otherwise the
    /// controller's decision.
    pub fn edit_cell(&mut self, cursor: &Cursor, col_id: &str, value: FieldValue) -> EditDecision {
        match self.column(col_id) {
            Some(column) if column.editable => self.controller.edit(cursor, column.field, value),
            _ => EditDecision::rejected(),
        }
    }

    /// Whether the table should refuse to open an editor on this cell.
    pub fn is_cell_edit_blocked(&self, cursor: &Cursor, col_id: &str) -> bool {
        self.column(col_id)
            .is_some_and(|column| self.controller.is_edit_pending(cursor, column.field))
    }

    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Page, SourceError>,
    ) -> Vec<PagerEffect> {
        self.controller.complete_fetch(ticket, result)
    }

    pub fn complete_edit(
        &mut self,
        ticket: EditTicket,
        result: Result<EditOutcome, SourceError>,
    ) -> Option<EditResolution> {
        self.controller.complete_edit(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Row, SortDirection};

    fn model(col: &str, dir: SortDirection) -> Vec<SortModelEntry> {
        vec![SortModelEntry::new(col, dir)]
    }

    fn page(range: std::ops::Range<usize>) -> Page {
        Page {
            rows: range
                .map(|i| {
                    Row::new(Cursor::new(format!("c{i}")), format!("id-{i}"))
                        .with_field(FIELD_NAME, format!("repo-{i}"))
                        .with_field(FIELD_STARGAZERS, i as i64)
                })
                .collect(),
            total_count: None,
            has_next_page: true,
        }
    }

    fn fetch_of(effects: &[PagerEffect]) -> crate::pager::FetchPlan {
        effects
            .iter()
            .find_map(|effect| match effect {
                PagerEffect::Fetch(plan) => Some(plan.clone()),
                _ => None,
            })
            .expect("fetch effect")
    }

    #[test]
    fn sort_model_maps_first_entry_only() {
        let entries = vec![
            SortModelEntry::new("created_at", SortDirection::Asc),
            SortModelEntry::new("name", SortDirection::Desc),
        ];
        assert_eq!(
            sort_order_for(&entries),
            Some(SortOrder::new(SortField::CreatedAt, SortDirection::Asc))
        );
        assert_eq!(sort_order_for(&[]), None);
        assert_eq!(
            sort_order_for(&model("language", SortDirection::Desc)),
            Some(SortOrder::new(SortField::Name, SortDirection::Desc))
        );
    }

    #[test]
    fn sort_change_reissues_the_in_view_range() {
        let stars = model("stargazers", SortDirection::Desc);
        let mut adapter = GridAdapter::for_repositories(stars.clone(), PagerSettings::default());

        let plan = fetch_of(&adapter.request_rows(RequestId(1), 0, 50, &stars));
        adapter.complete_fetch(plan.ticket, Ok(page(0..50)));
        let plan = fetch_of(&adapter.request_rows(RequestId(2), 50, 90, &stars));
        adapter.complete_fetch(plan.ticket, Ok(page(50..90)));
        assert_eq!(adapter.view(), Some((50, 90)));

        let by_name = model("name", SortDirection::Asc);
        let effects = adapter.sort_changed(RequestId(3), &by_name);
        let plan = fetch_of(&effects);
        assert_eq!(plan.request.count, 90);
        assert_eq!(plan.request.after, None);
        assert_eq!(
            plan.request.sort,
            Some(SortOrder::new(SortField::Name, SortDirection::Asc))
        );
        assert_eq!(adapter.sort_model(), by_name.as_slice());
        assert!(adapter.controller().cache().is_empty());
    }

    #[test]
    fn sort_change_before_any_request_uses_first_block() {
        let mut adapter = GridAdapter::for_repositories(Vec::new(), PagerSettings::default());
        let plan = fetch_of(&adapter.sort_changed(RequestId(1), &model("name", SortDirection::Asc)));
        assert_eq!(plan.request.count, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn only_editable_columns_accept_edits() {
        let mut adapter = GridAdapter::for_repositories(Vec::new(), PagerSettings::default());
        let plan = fetch_of(&adapter.request_rows(RequestId(1), 0, 10, &[]));
        adapter.complete_fetch(plan.ticket, Ok(page(0..10)));

        let c4 = Cursor::new("c4");
        assert!(!adapter.edit_cell(&c4, "stargazers", FieldValue::Int(1)).accepted);
        assert!(!adapter.edit_cell(&c4, "nope", FieldValue::from("x")).accepted);
        assert!(!adapter.is_cell_edit_blocked(&c4, "name"));

        let decision = adapter.edit_cell(&c4, "name", FieldValue::from("renamed"));
        assert!(decision.accepted);
        assert!(adapter.is_cell_edit_blocked(&c4, "name"));

        let ticket = decision.plan.expect("plan").ticket;
        adapter.complete_edit(ticket, Ok(EditOutcome::ok()));
        assert!(!adapter.is_cell_edit_blocked(&c4, "name"));
    }
}
