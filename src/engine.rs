//! Adapter over the external strategy-engine collaborator (a UCI process).
//!
//! The session core only ever asks two questions: "how good is this
//! position" and "what would you play here". Both degrade to neutral
//! answers when the engine process is missing or broken — a dead engine
//! reduces capability, it never takes the session down.

use async_trait::async_trait;
use derive_more::{Display, Error};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Mate scores are clamped to this centipawn magnitude.
const MATE_SCORE: i32 = 10_000;

/// Error raised by the UCI process plumbing.
#[derive(Debug, Display, Error)]
pub enum EngineError {
    /// Reading from or writing to the engine process failed.
    #[display("engine I/O error: {message}")]
    Io {
        /// Underlying I/O error text.
        message: String,
    },
    /// The engine closed its pipe mid-conversation.
    #[display("engine process closed its pipe")]
    Closed,
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

/// External move-strength collaborator.
///
/// Both operations are total: when the collaborator is unavailable they
/// return a neutral evaluation and "no move" respectively.
#[async_trait]
pub trait StrategyEngine: Send + Sync {
    /// Evaluates a position at the given depth.
    ///
    /// Returns centipawns from White's perspective; `0` when unavailable.
    async fn evaluate(&self, fen: &str, depth: u8) -> i32;

    /// Searches for the best move at the given depth.
    ///
    /// Returns the move in coordinate (UCI) notation, or `None` when the
    /// engine is unavailable or the position has no moves.
    async fn best_move(&self, fen: &str, depth: u8) -> Option<String>;
}

/// Strategy engine that knows nothing: neutral evaluations, no moves.
///
/// Used when running without an engine binary; the session then only
/// validates and records human moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEngine;

#[async_trait]
impl StrategyEngine for NullEngine {
    async fn evaluate(&self, _fen: &str, _depth: u8) -> i32 {
        0
    }

    async fn best_move(&self, _fen: &str, _depth: u8) -> Option<String> {
        None
    }
}

/// One search answer from the engine.
#[derive(Debug, Clone)]
struct SearchResult {
    /// Best move in UCI notation, if the engine produced one.
    best: Option<String>,
    /// Score in centipawns from White's perspective.
    score_cp: i32,
}

/// Live UCI engine process behind a per-call lock.
///
/// The inner option is `None` when the process never started or died; every
/// call then degrades without retrying. Calls are serialized because a UCI
/// conversation is stateful (`position` followed by `go`).
pub struct UciEngine {
    process: Mutex<Option<EngineProcess>>,
}

impl UciEngine {
    /// Spawns and handshakes the engine at `path`.
    ///
    /// Spawn failure is logged and yields a degraded adapter rather than an
    /// error: the session must come up even on hardware without the engine
    /// installed.
    #[instrument]
    pub async fn spawn(path: &str) -> Self {
        match EngineProcess::start(path).await {
            Ok(process) => {
                info!(path, "Strategy engine ready");
                Self {
                    process: Mutex::new(Some(process)),
                }
            }
            Err(err) => {
                warn!(path, error = %err, "Strategy engine unavailable, running degraded");
                Self {
                    process: Mutex::new(None),
                }
            }
        }
    }

    /// Runs one `position`/`go` exchange; drops the process on I/O failure.
    async fn search(&self, fen: &str, depth: u8) -> Option<SearchResult> {
        let mut guard = self.process.lock().await;
        let process = guard.as_mut()?;
        match process.go(fen, depth).await {
            Ok(result) => Some(result),
            Err(err) => {
                warn!(error = %err, "Engine conversation failed, dropping process");
                *guard = None;
                None
            }
        }
    }
}

#[async_trait]
impl StrategyEngine for UciEngine {
    async fn evaluate(&self, fen: &str, depth: u8) -> i32 {
        match self.search(fen, depth).await {
            Some(result) => result.score_cp,
            None => 0,
        }
    }

    async fn best_move(&self, fen: &str, depth: u8) -> Option<String> {
        self.search(fen, depth).await?.best
    }
}

impl std::fmt::Debug for UciEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UciEngine").finish_non_exhaustive()
    }
}

/// Child process plus its line-oriented stdio pipes.
struct EngineProcess {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl EngineProcess {
    /// Spawns the binary and completes the `uci`/`isready` handshake.
    async fn start(path: &str) -> Result<Self, EngineError> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().ok_or(EngineError::Closed)?;
        let stdout = child.stdout.take().ok_or(EngineError::Closed)?;

        let mut process = Self {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        process.send("uci").await?;
        process.wait_for("uciok").await?;
        process.send("isready").await?;
        process.wait_for("readyok").await?;

        Ok(process)
    }

    /// Writes one command line to the engine.
    async fn send(&mut self, line: &str) -> Result<(), EngineError> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Reads lines until one starts with `token`.
    async fn wait_for(&mut self, token: &str) -> Result<(), EngineError> {
        while let Some(line) = self.stdout.next_line().await? {
            if line.starts_with(token) {
                return Ok(());
            }
        }
        Err(EngineError::Closed)
    }

    /// Searches `fen` to `depth`, returning the best move and final score.
    async fn go(&mut self, fen: &str, depth: u8) -> Result<SearchResult, EngineError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth}")).await?;

        // UCI scores are from the side to move; normalize to White.
        let black_to_move = fen.split_whitespace().nth(1) == Some("b");
        let mut score = 0;

        loop {
            let line = self.stdout.next_line().await?.ok_or(EngineError::Closed)?;
            if let Some(cp) = parse_score(&line) {
                score = cp;
            }
            if let Some(rest) = line.strip_prefix("bestmove") {
                let best = rest
                    .split_whitespace()
                    .next()
                    .filter(|token| *token != "(none)")
                    .map(str::to_string);
                let score_cp = if black_to_move { -score } else { score };
                debug!(depth, score_cp, best = ?best, "Engine search finished");
                return Ok(SearchResult { best, score_cp });
            }
        }
    }
}

/// Extracts a score from a UCI `info` line, mate scores clamped.
fn parse_score(line: &str) -> Option<i32> {
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token != "score" {
            continue;
        }
        return match tokens.next()? {
            "cp" => tokens.next()?.parse().ok(),
            "mate" => {
                let plies: i32 = tokens.next()?.parse().ok()?;
                Some(if plies > 0 { MATE_SCORE } else { -MATE_SCORE })
            }
            _ => None,
        };
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_centipawn_score() {
        let line = "info depth 5 seldepth 7 score cp 34 nodes 1234 pv e2e4";
        assert_eq!(parse_score(line), Some(34));
    }

    #[test]
    fn parses_negative_score() {
        assert_eq!(parse_score("info depth 3 score cp -120 pv d7d5"), Some(-120));
    }

    #[test]
    fn parses_mate_scores() {
        assert_eq!(parse_score("info depth 9 score mate 3"), Some(MATE_SCORE));
        assert_eq!(parse_score("info depth 9 score mate -2"), Some(-MATE_SCORE));
    }

    #[test]
    fn ignores_lines_without_score() {
        assert_eq!(parse_score("info depth 5 currmove e2e4"), None);
        assert_eq!(parse_score("bestmove e2e4 ponder e7e5"), None);
    }

    #[tokio::test]
    async fn null_engine_is_neutral() {
        let engine = NullEngine;
        assert_eq!(engine.evaluate("whatever", 5).await, 0);
        assert_eq!(engine.best_move("whatever", 5).await, None);
    }

    #[tokio::test]
    async fn missing_binary_degrades_instead_of_failing() {
        let engine = UciEngine::spawn("/nonexistent/engine/binary").await;
        assert_eq!(engine.evaluate("startpos-fen", 5).await, 0);
        assert_eq!(engine.best_move("startpos-fen", 5).await, None);
    }
}
