//! Database repository for the long-term game store.

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

use crate::db::{DbError, GameRecord, NewGameRecord, schema};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Long-term store for finished games.
#[derive(Debug, Clone)]
pub struct GameStore {
    db_path: String,
}

impl GameStore {
    /// Creates a new store backed by the database at the given path.
    ///
    /// Use `":memory:"` for an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is invalid.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        info!(path = %db_path, "Creating GameStore");
        Ok(Self { db_path })
    }

    /// Establishes a database connection.
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))
    }

    /// Applies any pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Migration failed: {}", e)))?;
        info!("Database schema up to date");
        Ok(())
    }

    /// Records one finished game.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, record), fields(result = %record.result()))]
    pub fn save_game(&self, record: NewGameRecord) -> Result<GameRecord, DbError> {
        debug!("Recording finished game");
        let mut conn = self.connection()?;

        let saved = diesel::insert_into(schema::games::table)
            .values(&record)
            .returning(GameRecord::as_returning())
            .get_result(&mut conn)?;

        info!(game_id = saved.id(), result = %saved.result(), "Game recorded");
        Ok(saved)
    }

    /// Fetches the most recently finished games, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn recent_games(&self, limit: i64) -> Result<Vec<GameRecord>, DbError> {
        debug!(limit, "Loading recent games");
        let mut conn = self.connection()?;

        // Same-second timestamps are common in tests; id breaks the tie.
        let games = schema::games::table
            .order((
                schema::games::played_at.desc(),
                schema::games::id.desc(),
            ))
            .limit(limit)
            .load::<GameRecord>(&mut conn)?;

        info!(count = games.len(), "Recent games loaded");
        Ok(games)
    }
}
