//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use repogrid_server::{create_app, AppState, Config, RepoCatalog};

pub(crate) const TEST_SEED: u64 = 11;

pub(crate) fn test_config(seed_rows: usize) -> Config {
    Config {
        port: 0,
        seed_rows,
        ..Config::default()
    }
}

pub(crate) fn setup_test_server(seed_rows: usize) -> (TestServer, AppState) {
    let config = test_config(seed_rows);
    let state = AppState::new(config, RepoCatalog::seeded(seed_rows, TEST_SEED));
    let app = create_app(state.clone(), false);
    let server = TestServer::new(app).expect("server");
    (server, state)
}
