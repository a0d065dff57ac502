//! Database models for finished games.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;

use crate::db::schema;

/// Finished-game database model.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::games)]
pub struct GameRecord {
    id: i32,
    white_player: String,
    black_player: String,
    result: String,
    pgn: String,
    played_at: NaiveDateTime,
}

/// Insertable model for recording a freshly finished game.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::games)]
pub struct NewGameRecord {
    white_player: String,
    black_player: String,
    result: String,
    pgn: String,
}
