//! Shared test doubles and setup helpers.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use chessbot_arena::{
    ControllerConfig, GameStore, Notification, Notifier, SessionController, SessionView,
    StrategyEngine,
};

/// Notifier that records every wire line for later assertions.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    lines: Mutex<Vec<String>>,
}

impl CollectingNotifier {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, line: &str) -> bool {
        self.lines().iter().any(|l| l == line)
    }
}

impl Notifier for CollectingNotifier {
    fn send(&self, note: Notification) {
        self.lines.lock().unwrap().push(note.to_string());
    }
}

/// Strategy double with a fixed evaluation and scripted replies.
#[derive(Debug, Default)]
pub struct FakeStrategy {
    pub eval: i32,
    replies: Mutex<VecDeque<String>>,
}

impl FakeStrategy {
    pub fn with_replies(replies: &[&str]) -> Self {
        Self {
            eval: 0,
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
        }
    }
}

#[async_trait]
impl StrategyEngine for FakeStrategy {
    async fn evaluate(&self, _fen: &str, _depth: u8) -> i32 {
        self.eval
    }

    async fn best_move(&self, _fen: &str, _depth: u8) -> Option<String> {
        self.replies.lock().unwrap().pop_front()
    }
}

/// Strategy double whose search takes long enough to observe mid-flight.
#[derive(Debug)]
pub struct SlowStrategy {
    pub reply: String,
    pub delay: Duration,
}

#[async_trait]
impl StrategyEngine for SlowStrategy {
    async fn evaluate(&self, _fen: &str, _depth: u8) -> i32 {
        0
    }

    async fn best_move(&self, _fen: &str, _depth: u8) -> Option<String> {
        tokio::time::sleep(self.delay).await;
        Some(self.reply.clone())
    }
}

/// Creates a migrated store in a temp directory. Keep the directory alive
/// for the lifetime of the store.
pub fn test_store() -> (GameStore, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("games.db");
    let store = GameStore::new(path.to_string_lossy().into_owned()).expect("store");
    store.run_migrations().expect("migrations");
    (store, dir)
}

/// Wires a controller around the given strategy with instant thinking.
pub fn test_controller(
    strategy: Arc<dyn StrategyEngine>,
    think_delay_ms: (u64, u64),
) -> (SessionController, Arc<CollectingNotifier>, TempDir) {
    let (store, dir) = test_store();
    let notifier = Arc::new(CollectingNotifier::default());
    let controller = SessionController::new(
        strategy,
        store,
        notifier.clone(),
        ControllerConfig { think_delay_ms },
    );
    (controller, notifier, dir)
}

/// Polls the session until `predicate` holds or the timeout elapses.
pub async fn wait_for(
    controller: &SessionController,
    predicate: impl Fn(&SessionView) -> bool,
) -> SessionView {
    for _ in 0..200 {
        let view = controller.snapshot().await;
        if predicate(&view) {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within timeout");
}
