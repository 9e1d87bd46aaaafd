//! App state tests driven through scripted backend channels.

use super::state_ops::next_sort_direction;
use super::*;
use crate::backend::{GridCmd, GridEvent};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use repogrid_core::models::{FieldValue, Row, SortDirection};
use repogrid_core::{EditResolution, EditStatus, EditTicket, Epoch, RequestId, RowsError};

struct TestHarness {
    app: RepoGridApp,
    cmd_rx: Receiver<GridCmd>,
    _evt_tx: Sender<GridEvent>,
}

fn make_app(page_size: usize) -> TestHarness {
    let (cmd_tx, cmd_rx) = unbounded();
    let (evt_tx, evt_rx) = unbounded();
    let backend = BackendHandle::from_test_channels(cmd_tx, evt_rx);
    TestHarness {
        app: RepoGridApp::with_backend(backend, page_size, "test".to_string(), None),
        cmd_rx,
        _evt_tx: evt_tx,
    }
}

fn rows(range: Range<usize>) -> Vec<Row> {
    range
        .map(|i| {
            Row::new(Cursor::new(format!("c{i}")), format!("id-{i}"))
                .with_field("name", format!("repo-{i}"))
        })
        .collect()
}

fn expect_request(rx: &Receiver<GridCmd>) -> (RequestId, usize, usize, Vec<SortModelEntry>) {
    match rx.try_recv() {
        Ok(GridCmd::RequestRows {
            id,
            start_row,
            end_row,
            sort_model,
        }) => (id, start_row, end_row, sort_model),
        other => panic!("expected row request, got {:?}", other),
    }
}

fn load_first_block(harness: &mut TestHarness) {
    harness.app.visible_rows = 0..10;
    harness.app.request_visible_blocks();
    let (id, start_row, _, _) = expect_request(&harness.cmd_rx);
    harness.app.apply_event(GridEvent::RowsLoaded {
        id,
        start_row,
        rows: rows(0..10),
        last_row: None,
        total_count: Some(40),
    });
}

fn settled(cursor: &str, status: EditStatus) -> GridEvent {
    GridEvent::EditSettled {
        col_id: "name".to_string(),
        resolution: EditResolution {
            ticket: EditTicket::default(),
            cursor: Cursor::new(cursor),
            field: "name".to_string(),
            status,
        },
    }
}

#[test]
fn header_clicks_cycle_desc_asc_none() {
    assert_eq!(next_sort_direction(None), Some(SortDirection::Desc));
    assert_eq!(
        next_sort_direction(Some(SortDirection::Desc)),
        Some(SortDirection::Asc)
    );
    assert_eq!(next_sort_direction(Some(SortDirection::Asc)), None);
}

#[test]
fn visible_rows_request_one_block_at_a_time() {
    let mut harness = make_app(10);
    harness.app.visible_rows = 0..25;
    harness.app.request_visible_blocks();
    let (id, start_row, end_row, sort_model) = expect_request(&harness.cmd_rx);
    assert_eq!((start_row, end_row), (0, 10));
    assert!(sort_model.is_empty());

    harness.app.request_visible_blocks();
    assert!(matches!(harness.cmd_rx.try_recv(), Err(TryRecvError::Empty)));

    harness.app.apply_event(GridEvent::RowsLoaded {
        id,
        start_row,
        rows: rows(0..10),
        last_row: None,
        total_count: Some(40),
    });
    harness.app.request_visible_blocks();
    let (_, start_row, end_row, _) = expect_request(&harness.cmd_rx);
    assert_eq!((start_row, end_row), (10, 20));
}

#[test]
fn sort_toggle_purges_and_sends_sort_change() {
    let mut harness = make_app(10);
    load_first_block(&mut harness);

    harness.app.toggle_sort("stargazers");
    match harness.cmd_rx.try_recv() {
        Ok(GridCmd::SortChanged { sort_model, .. }) => {
            assert_eq!(
                sort_model,
                vec![SortModelEntry::new("stargazers", SortDirection::Desc)]
            );
        }
        other => panic!("expected sort change, got {:?}", other),
    }
    assert!(harness.app.blocks.row(0).is_none());
    assert_eq!(
        harness.app.sort_direction_for("stargazers"),
        Some(SortDirection::Desc)
    );

    harness.app.toggle_sort("stargazers");
    harness.app.toggle_sort("stargazers");
    let last = harness.cmd_rx.try_iter().last();
    assert!(matches!(
        last,
        Some(GridCmd::SortChanged { sort_model, .. }) if sort_model.is_empty()
    ));
}

#[test]
fn superseded_failures_stay_quiet() {
    let mut harness = make_app(10);
    harness.app.visible_rows = 0..5;
    harness.app.request_visible_blocks();
    let (id, _, _, _) = expect_request(&harness.cmd_rx);
    harness.app.toggle_sort("name");

    harness.app.apply_event(GridEvent::RowsFailed {
        id,
        error: RowsError::Superseded {
            epoch: Epoch::new(1),
        },
    });
    assert!(harness.app.status.is_none());
}

#[test]
fn fetch_failures_surface_in_status() {
    let mut harness = make_app(10);
    harness.app.visible_rows = 0..5;
    harness.app.request_visible_blocks();
    let (id, _, _, _) = expect_request(&harness.cmd_rx);

    harness.app.apply_event(GridEvent::RowsFailed {
        id,
        error: RowsError::Fetch(repogrid_core::SourceError::Timeout),
    });
    let status = harness.app.status.as_ref().expect("status");
    assert!(status.text.contains("timed out"), "status: {}", status.text);
    assert!(harness.app.blocks.has_failures());
}

#[test]
fn commit_sends_edit_and_pending_blocks_reopening() {
    let mut harness = make_app(10);
    load_first_block(&mut harness);
    let cursor = Cursor::new("c2");

    assert!(harness.app.begin_edit(&cursor, "name", "repo-2"));
    if let Some(editor) = harness.app.editing.as_mut() {
        editor.draft = "renamed".to_string();
    }
    harness.app.commit_edit();
    match harness.cmd_rx.try_recv() {
        Ok(GridCmd::EditCell {
            cursor: sent,
            col_id,
            value,
        }) => {
            assert_eq!(sent, cursor);
            assert_eq!(col_id, "name");
            assert_eq!(value, FieldValue::from("renamed"));
        }
        other => panic!("expected edit, got {:?}", other),
    }

    harness.app.apply_event(GridEvent::EditSubmitted {
        cursor: cursor.clone(),
        col_id: "name".to_string(),
    });
    assert!(!harness.app.begin_edit(&cursor, "name", "renamed"));
    assert!(harness.app.editing.is_none());

    harness.app.apply_event(settled("c2", EditStatus::Committed));
    assert!(harness.app.begin_edit(&cursor, "name", "renamed"));
}

#[test]
fn unchanged_draft_sends_nothing() {
    let mut harness = make_app(10);
    load_first_block(&mut harness);
    assert!(harness.app.begin_edit(&Cursor::new("c1"), "name", "repo-1"));
    harness.app.commit_edit();
    assert!(matches!(harness.cmd_rx.try_recv(), Err(TryRecvError::Empty)));
    assert!(harness.app.editing.is_none());
}

#[test]
fn rollback_updates_row_and_reports_reason() {
    let mut harness = make_app(10);
    load_first_block(&mut harness);

    let optimistic = rows(3..4)[0].with_replaced("name", FieldValue::from("bad name"));
    harness.app.apply_event(GridEvent::RowUpdated {
        epoch: Epoch::new(0),
        index: 3,
        row: optimistic,
    });
    harness.app.apply_event(GridEvent::RowUpdated {
        epoch: Epoch::new(0),
        index: 3,
        row: rows(3..4).remove(0),
    });
    harness.app.apply_event(settled(
        "c3",
        EditStatus::RolledBack {
            restored: FieldValue::from("repo-3"),
            reason: "name may only contain letters".to_string(),
        },
    ));

    assert_eq!(
        harness.app.blocks.row(3).and_then(|row| row.field("name")),
        Some(&FieldValue::from("repo-3"))
    );
    let status = harness.app.status.as_ref().expect("status");
    assert!(status.text.contains("restored 'repo-3'"));
    assert_eq!(harness.app.toasts.len(), 1);
}

#[test]
fn toasts_collapse_duplicates_and_cap() {
    let mut harness = make_app(10);
    for _ in 0..3 {
        harness.app.push_toast("Rename saved".to_string());
    }
    assert_eq!(harness.app.toasts.len(), 1);
    for i in 0..(TOAST_LIMIT + 2) {
        harness.app.push_toast(format!("toast {i}"));
    }
    assert_eq!(harness.app.toasts.len(), TOAST_LIMIT);
    harness.app.expire_feedback(Instant::now() + TOAST_TTL + Duration::from_millis(1));
    assert!(harness.app.toasts.is_empty());
}
