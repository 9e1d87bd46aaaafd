//! Optimistic single-field edits with rollback.
//!
//! An edit is written to the cache immediately and the remote write is
//! handed to the caller as an [`EditPlan`]. When the write fails, or comes
//! back with field errors, the cell is restored to the value captured at
//! submission, unless the cell no longer shows the value this edit wrote.

use super::PaginationController;
use crate::cache::Epoch;
use crate::error::SourceError;
use crate::models::{Cursor, EditOutcome, EditRequest, FieldValue};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound::{Excluded, Unbounded};
use tracing::{debug, warn};

/// Pairs a submitted write with its completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EditTicket(u64);

impl EditTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A remote write the caller must perform and report back.
#[derive(Debug, Clone, PartialEq)]
pub struct EditPlan {
    pub ticket: EditTicket,
    pub request: EditRequest,
}

/// Immediate answer to an edit intent.
#[derive(Debug, Clone, PartialEq)]
pub struct EditDecision {
    /// Whether the optimistic value was applied.
    pub accepted: bool,
    /// Remote write to perform when accepted.
    pub plan: Option<EditPlan>,
}

impl EditDecision {
    pub fn rejected() -> Self {
        Self {
            accepted: false,
            plan: None,
        }
    }
}

/// How a completed write left the cached cell.
#[derive(Debug, Clone, PartialEq)]
pub enum EditStatus {
    /// The write landed; the optimistic value stays.
    Committed,
    /// The write failed and the cell was restored.
    RolledBack { restored: FieldValue, reason: String },
    /// The write failed but the cell had already moved on.
    RollbackSkipped { reason: String },
}

/// Completion report for one edit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditResolution {
    pub ticket: EditTicket,
    pub cursor: Cursor,
    pub field: String,
    pub status: EditStatus,
}

type CellKey = (Cursor, String);

#[derive(Debug, Clone)]
struct PendingEdit {
    epoch: Epoch,
    cursor: Cursor,
    field: String,
    old_value: FieldValue,
    new_value: FieldValue,
}

/// Outstanding writes, plus each cell's chain of writes in submission order.
#[derive(Debug, Default)]
pub(super) struct PendingEdits {
    by_ticket: BTreeMap<EditTicket, PendingEdit>,
    by_cell: HashMap<CellKey, BTreeSet<EditTicket>>,
    next_ticket: u64,
}

impl PendingEdits {
    fn insert(&mut self, edit: PendingEdit) -> EditTicket {
        let ticket = EditTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.by_cell
            .entry((edit.cursor.clone(), edit.field.clone()))
            .or_default()
            .insert(ticket);
        self.by_ticket.insert(ticket, edit);
        ticket
    }

    fn take(&mut self, ticket: EditTicket) -> Option<PendingEdit> {
        let edit = self.by_ticket.remove(&ticket)?;
        let key = (edit.cursor.clone(), edit.field.clone());
        if let Some(chain) = self.by_cell.get_mut(&key) {
            chain.remove(&ticket);
            if chain.is_empty() {
                self.by_cell.remove(&key);
            }
        }
        Some(edit)
    }

    /// A failed edit hands its restore target to the next newer edit on the
    /// same cell, if that edit was stacked on this one's optimistic value.
    ///
    /// Must run after `take` removed the failed edit from its chain.
    fn rebase_successor(&mut self, ticket: EditTicket, failed: &PendingEdit) {
        let key = (failed.cursor.clone(), failed.field.clone());
        let Some(successor) = self
            .by_cell
            .get(&key)
            .and_then(|chain| chain.range((Excluded(ticket), Unbounded)).next())
            .copied()
        else {
            return;
        };
        if let Some(successor) = self.by_ticket.get_mut(&successor) {
            if successor.epoch == failed.epoch && successor.old_value == failed.new_value {
                successor.old_value = failed.old_value.clone();
            }
        }
    }

    fn is_pending(&self, cursor: &Cursor, field: &str) -> bool {
        self.by_cell
            .contains_key(&(cursor.clone(), field.to_string()))
    }

    fn len(&self) -> usize {
        self.by_ticket.len()
    }
}

impl PaginationController {
    /// Optimistically set `field` of the row at `cursor` to `value`.
    ///
    /// # Returns
    /// An accepted decision carrying the remote write, or a rejected one when
    /// the row is not cached or has no such field.
    pub fn edit(&mut self, cursor: &Cursor, field: &str, value: FieldValue) -> EditDecision {
        let Some(row) = self.cache.get(cursor) else {
            debug!(cursor = %cursor, "edit rejected: row not cached");
            return EditDecision::rejected();
        };
        let Some(old_value) = row.field(field).cloned() else {
            debug!(cursor = %cursor, field, "edit rejected: unknown field");
            return EditDecision::rejected();
        };
        let row_id = row.id.clone();

        self.cache
            .update_row(cursor, |row| row.with_replaced(field, value.clone()));
        let ticket = self.edits.insert(PendingEdit {
            epoch: self.cache.epoch(),
            cursor: cursor.clone(),
            field: field.to_string(),
            old_value,
            new_value: value.clone(),
        });
        debug!(ticket = ticket.0, cursor = %cursor, field, "optimistic edit applied");

        EditDecision {
            accepted: true,
            plan: Some(EditPlan {
                ticket,
                request: EditRequest {
                    row_id,
                    field: field.to_string(),
                    value,
                },
            }),
        }
    }

    /// Reconcile the write identified by `ticket`.
    ///
    /// # Returns
    /// `None` for unknown tickets, otherwise how the cell was left.
    pub fn complete_edit(
        &mut self,
        ticket: EditTicket,
        result: Result<EditOutcome, SourceError>,
    ) -> Option<EditResolution> {
        let edit = self.edits.take(ticket)?;
        let failure = match result {
            Ok(outcome) if outcome.is_ok() => None,
            Ok(outcome) => Some(outcome.summary()),
            Err(err) => Some(err.to_string()),
        };

        let status = match failure {
            None => {
                debug!(ticket = ticket.0, cursor = %edit.cursor, "edit committed");
                EditStatus::Committed
            }
            Some(reason) => {
                warn!(
                    ticket = ticket.0,
                    cursor = %edit.cursor,
                    field = edit.field.as_str(),
                    "edit failed: {}",
                    reason
                );
                self.edits.rebase_successor(ticket, &edit);
                self.roll_back(&edit, reason)
            }
        };

        Some(EditResolution {
            ticket,
            cursor: edit.cursor,
            field: edit.field,
            status,
        })
    }

    /// Whether a write is outstanding for this cell. Advisory: the
    /// controller itself never refuses edits on this basis.
    pub fn is_edit_pending(&self, cursor: &Cursor, field: &str) -> bool {
        self.edits.is_pending(cursor, field)
    }

    pub fn pending_edit_count(&self) -> usize {
        self.edits.len()
    }

    fn roll_back(&mut self, edit: &PendingEdit, reason: String) -> EditStatus {
        if edit.epoch != self.cache.epoch() {
            return EditStatus::RollbackSkipped {
                reason: format!("{reason} (sort order changed since the edit)"),
            };
        }
        let current = self
            .cache
            .get(&edit.cursor)
            .and_then(|row| row.field(&edit.field));
        if current != Some(&edit.new_value) {
            return EditStatus::RollbackSkipped {
                reason: format!("{reason} (cell was changed again since the edit)"),
            };
        }

        let restored = edit.old_value.clone();
        self.cache.update_row(&edit.cursor, |row| {
            row.with_replaced(&edit.field, restored.clone())
        });
        warn!(cursor = %edit.cursor, field = edit.field.as_str(), "edit rolled back");
        EditStatus::RolledBack { restored, reason }
    }
}
