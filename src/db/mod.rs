//! Database persistence layer for finished-game records.

mod error;
mod models;
mod repository;
mod schema; // Diesel schema - internal use only

pub use error::DbError;
pub use models::{GameRecord, NewGameRecord};
pub use repository::GameStore;
