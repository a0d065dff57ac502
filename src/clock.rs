//! The 1 Hz game clock service.

use tokio::time::{Duration, interval};
use tracing::{info, instrument};

use crate::controller::SessionController;

/// Clock behavior knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockConfig {
    /// Freeze the active clock while the opponent search is running.
    pub pause_while_thinking: bool,
}

/// Drives the session clock, one tick per second.
#[derive(Debug, Clone)]
pub struct ClockService {
    controller: SessionController,
    config: ClockConfig,
}

impl ClockService {
    /// Creates a clock service over a controller handle.
    pub fn new(controller: SessionController, config: ClockConfig) -> Self {
        Self { controller, config }
    }

    /// Applies one clock tick. Exposed so ticks can be driven manually.
    pub async fn tick(&self) {
        self.controller
            .tick_clock(self.config.pause_while_thinking)
            .await;
    }

    /// Runs the clock loop forever.
    #[instrument(skip(self))]
    pub async fn run(self) {
        info!("Clock service running");
        let mut ticker = interval(Duration::from_secs(1));
        // The first tick of a tokio interval fires immediately; swallow it
        // so the opening second is a full one.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }
}
