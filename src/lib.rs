//! ChessBot Arena: the session server behind a hardware chess board.
//!
//! A single live [`GameSession`] is owned by the [`SessionController`]
//! behind one exclusive lock. Inbound commands arrive on a line-oriented
//! channel and are routed by the [`CommandDispatcher`]; a [`ClockService`]
//! ticks the game clock once per second; opponent replies and hints run as
//! background searches that validate the session generation before
//! committing anything. Finished games land in a sqlite [`GameStore`].
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod clock;
pub mod controller;
pub mod db;
pub mod dispatcher;
pub mod engine;
pub mod notify;
pub mod quality;
mod resolve;
pub mod rules;
pub mod session;

pub use cli::Cli;
pub use clock::{ClockConfig, ClockService};
pub use controller::{ControllerConfig, MoveOutcome, SessionController};
pub use db::{DbError, GameRecord, GameStore, NewGameRecord};
pub use dispatcher::{Command, CommandDispatcher, CommandError};
pub use engine::{EngineError, NullEngine, StrategyEngine, UciEngine};
pub use notify::{ChannelNotifier, Notification, Notifier};
pub use quality::{QualityLabel, classify};
pub use rules::{Position, RulesError, Terminal};
pub use session::{EndReason, GameEnd, GameSession, MoveRecord, SessionView, Side, Status};
