//! Command-line interface for the session server binary.

use clap::Parser;

/// ChessBot Arena session server.
#[derive(Debug, Parser)]
#[command(name = "chessbot_arena", version, about)]
pub struct Cli {
    /// Path to the sqlite database for finished games.
    #[arg(long, default_value = "chessbot.db")]
    pub db_path: String,

    /// Path to the UCI engine binary.
    #[arg(long, default_value = "/usr/bin/stockfish")]
    pub engine: String,

    /// Run without an engine: human moves are validated and recorded but
    /// never answered or evaluated.
    #[arg(long)]
    pub no_engine: bool,

    /// Freeze the active clock while the engine is searching for its reply.
    #[arg(long)]
    pub pause_clock_while_thinking: bool,

    /// Minimum artificial thinking delay before an engine reply, in ms.
    #[arg(long, default_value_t = 2_000)]
    pub think_delay_min_ms: u64,

    /// Maximum artificial thinking delay before an engine reply, in ms.
    #[arg(long, default_value_t = 4_000)]
    pub think_delay_max_ms: u64,
}
