use super::repository::{FIELD_NAME, FIELD_STARGAZERS};
use super::*;
use chrono::{TimeZone, Utc};

#[test]
fn field_value_decodes_timestamps_before_text() {
    let decoded: Vec<FieldValue> =
        serde_json::from_str(r#"[null, true, 42, "2024-03-01T12:00:00Z", "octo-repo"]"#)
            .expect("decode values");
    assert_eq!(decoded[0], FieldValue::Null);
    assert_eq!(decoded[1], FieldValue::Bool(true));
    assert_eq!(decoded[2], FieldValue::Int(42));
    assert_eq!(
        decoded[3],
        FieldValue::Timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    );
    assert_eq!(decoded[4], FieldValue::Text("octo-repo".to_string()));
}

#[test]
fn sort_field_and_direction_parse_case_insensitively() {
    assert_eq!(SortField::parse(" stargazers "), Some(SortField::Stargazers));
    assert_eq!(SortField::parse("created_at"), Some(SortField::CreatedAt));
    assert_eq!(SortField::parse("forks"), None);
    assert_eq!(SortDirection::parse("DESC"), Some(SortDirection::Desc));
    assert_eq!(SortDirection::parse("up"), None);
}

#[test]
fn rederived_sort_orders_compare_equal() {
    let first = SortOrder::new(SortField::Stargazers, SortDirection::Desc);
    let rederived = SortOrder::new(
        SortField::parse("STARGAZERS").expect("field"),
        SortDirection::parse("desc").expect("direction"),
    );
    assert_eq!(first, rederived);
    assert_eq!(Some(first), Some(SortOrder::upstream_default()));
    assert_ne!(
        Some(first),
        Some(SortOrder::new(SortField::Stargazers, SortDirection::Asc))
    );
}

#[test]
fn connection_into_page_keeps_edge_order_and_cursors() {
    let created = Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap();
    let alpha = Repository::new("alpha", 10, created, false);
    let beta = Repository::new("beta", 3, created, true);
    let connection = Connection {
        edges: vec![
            Edge {
                cursor: Cursor::new("c0"),
                node: alpha.clone(),
            },
            Edge {
                cursor: Cursor::new("c1"),
                node: beta.clone(),
            },
        ],
        total_count: 2,
        has_next_page: false,
    };

    let page = connection.into_page();
    assert_eq!(page.total_count, Some(2));
    assert!(!page.has_next_page);
    assert_eq!(page.rows.len(), 2);
    assert_eq!(page.rows[0].cursor, Cursor::new("c0"));
    assert_eq!(page.rows[0].id, alpha.id);
    assert_eq!(page.rows[1].field(FIELD_NAME), Some(&FieldValue::from("beta")));
    assert_eq!(page.rows[1].field(FIELD_STARGAZERS), Some(&FieldValue::Int(3)));
}

#[test]
fn with_replaced_keeps_row_identity() {
    let row = Row::new(Cursor::new("c17"), "repo-17").with_field(FIELD_NAME, "Foo");
    let updated = row.with_replaced(FIELD_NAME, FieldValue::from("Bar"));
    assert_eq!(updated.cursor, row.cursor);
    assert_eq!(updated.id, row.id);
    assert_eq!(updated.field(FIELD_NAME), Some(&FieldValue::from("Bar")));
    assert_eq!(row.field(FIELD_NAME), Some(&FieldValue::from("Foo")));
}

#[test]
fn edit_outcome_summary_joins_field_errors() {
    let outcome = EditOutcome::rejected(vec![
        FieldError::new("name", "name is already taken"),
        FieldError::new("name", "name is too long"),
    ]);
    assert!(!outcome.is_ok());
    assert_eq!(
        outcome.summary(),
        "name: name is already taken; name: name is too long"
    );
    assert!(EditOutcome::ok().is_ok());
}
