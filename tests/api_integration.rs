//! Integration tests across the root facade: the HTTP API and the pagination
//! controller sharing one catalog.

use axum_test::TestServer;
use repogrid::models::repository::FIELD_NAME;
use repogrid::models::FieldValue;
use repogrid::pager::{PagerEffect, PagerSettings, RequestId, RowRequest};
use repogrid::{create_app, AppState, CatalogSource, Config, PaginationController, RemoteSource};
use serde_json::{json, Value};

fn setup_test_server(seed_rows: usize) -> (TestServer, AppState) {
    let config = Config {
        port: 0,
        seed_rows,
        ..Config::default()
    };
    let state = AppState::seeded(config, 7);
    let server = TestServer::new(create_app(state.clone(), false)).expect("server");
    (server, state)
}

async fn answer(
    controller: &mut PaginationController,
    source: &CatalogSource,
    mut effects: Vec<PagerEffect>,
) -> Vec<PagerEffect> {
    let mut answers = Vec::new();
    while let Some(effect) = effects.pop() {
        match effect {
            PagerEffect::Fetch(plan) => {
                let result = source.fetch_page(plan.request).await;
                effects.extend(controller.complete_fetch(plan.ticket, result));
            }
            other => answers.push(other),
        }
    }
    answers
}

#[tokio::test]
async fn api_rename_is_seen_by_a_fresh_controller() {
    let (server, state) = setup_test_server(30);

    let page: Value = server
        .get("/api/repositories")
        .add_query_param("first", 5)
        .await
        .json();
    let id = page["edges"][2]["node"]["id"]
        .as_str()
        .expect("id")
        .to_string();

    let response = server
        .put(&format!("/api/repositories/{}/name", id))
        .json(&json!({ "name": "facade-rename" }))
        .await;
    assert_eq!(response.status_code().as_u16(), 200);

    let source = CatalogSource::new(state.catalog.clone());
    let mut controller = PaginationController::new(None, PagerSettings::default());
    let effects = controller.request_rows(RowRequest::new(RequestId(1), 0, 5), None);
    let answers = answer(&mut controller, &source, effects).await;

    let rows = match answers.as_slice() {
        [PagerEffect::Rows { request, rows, .. }] => {
            assert_eq!(*request, RequestId(1));
            rows.clone()
        }
        other => panic!("expected one row answer, got {:?}", other),
    };
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[2].id, id);
    assert_eq!(rows[2].field(FIELD_NAME), Some(&FieldValue::from("facade-rename")));
    assert_eq!(controller.total_count(), Some(30));
}

#[tokio::test]
async fn invalid_names_are_reported_as_field_errors() {
    let (server, _state) = setup_test_server(3);
    let page: Value = server
        .get("/api/repositories")
        .add_query_param("first", 1)
        .await
        .json();
    let id = page["edges"][0]["node"]["id"].as_str().expect("id");

    let response = server
        .put(&format!("/api/repositories/{}/name", id))
        .json(&json!({ "name": "   " }))
        .await;
    assert_eq!(response.status_code().as_u16(), 422);
    let body: Value = response.json();
    assert_eq!(body["field_errors"][0]["field"], "name");
}
