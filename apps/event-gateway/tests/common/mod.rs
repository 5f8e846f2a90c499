#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use event_gateway::config::Config;
use event_gateway::store::MemoryStore;
use event_gateway::AppState;

pub const ALICE: &str = "usr_alice";
pub const BOB: &str = "usr_bob";
pub const CAROL: &str = "usr_carol";

pub const ALICE_TOKEN: &str = "tok-alice";
pub const BOB_TOKEN: &str = "tok-bob";
pub const CAROL_TOKEN: &str = "tok-carol";

/// Channel shared by alice and bob. Carol is not a member.
pub const GENERAL: &str = "ch_general";

/// Seed an in-memory store with three users, one channel and one friendship.
pub fn test_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.insert_token(ALICE_TOKEN, ALICE);
    store.insert_token(BOB_TOKEN, BOB);
    store.insert_token(CAROL_TOKEN, CAROL);
    store.set_channel_members(GENERAL, vec![ALICE.to_string(), BOB.to_string()]);
    store.add_friendship(ALICE, CAROL);
    Arc::new(store)
}

/// Build a test AppState over the seeded store with default config.
pub fn test_state() -> (AppState, Arc<MemoryStore>) {
    let store = test_store();
    let config = Config {
        identify_timeout_secs: 2,
        ..Config::default()
    };
    let state = AppState::new(config, store.clone(), store.clone());
    (state, store)
}

/// Build the full application router wired to the test state.
pub fn test_app() -> (Router, AppState, Arc<MemoryStore>) {
    let (state, store) = test_state();
    let app = event_gateway::routes::router().with_state(state.clone());
    (app, state, store)
}

/// Poll `check` until it holds, failing the test after two seconds.
pub async fn wait_until(mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
