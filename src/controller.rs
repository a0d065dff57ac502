//! The session controller: every mutation of the live game funnels through
//! here while the session lock is held.
//!
//! The controller is cheap to clone; clones share the same locked session,
//! strategy engine, store and notifier. Opponent replies and hints run as
//! spawned tasks that re-acquire the lock and validate the session
//! generation before touching anything, so a reset always wins over a
//! search that was started under an older game.

use std::sync::Arc;

use shakmaty::Move;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::db::{GameStore, NewGameRecord};
use crate::engine::StrategyEngine;
use crate::notify::{Notification, Notifier};
use crate::quality::classify;
use crate::resolve::resolve;
use crate::rules::Terminal;
use crate::session::{EndReason, GameEnd, GameSession, MoveRecord, SessionView, Side, Status};

/// Tunables for the controller's background behavior.
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    /// Inclusive range of the artificial "thinking" delay before an
    /// opponent reply, in milliseconds.
    pub think_delay_ms: (u64, u64),
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            think_delay_ms: (2_000, 4_000),
        }
    }
}

/// What happened to one submitted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// No game in progress; the input was dropped.
    NotPlaying,
    /// The text did not resolve to a legal move for the human side.
    Illegal,
    /// The move was committed and the game continues.
    Ok,
    /// The move was committed and ended the game.
    GameOver,
}

/// Owner of the single live [`GameSession`].
#[derive(Clone)]
pub struct SessionController {
    session: Arc<Mutex<GameSession>>,
    strategy: Arc<dyn StrategyEngine>,
    store: GameStore,
    notifier: Arc<dyn Notifier>,
    config: ControllerConfig,
}

impl SessionController {
    /// Creates a controller around a fresh `Waiting` session.
    pub fn new(
        strategy: Arc<dyn StrategyEngine>,
        store: GameStore,
        notifier: Arc<dyn Notifier>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(GameSession::new())),
            strategy,
            store,
            notifier,
            config,
        }
    }

    /// Starts a new game, invalidating any in-flight searches from the
    /// previous one.
    #[instrument(skip(self))]
    pub async fn reset(
        &self,
        difficulty: u8,
        total_seconds: u32,
        increment_seconds: u32,
        human_side: Side,
    ) {
        let generation = {
            let mut s = self.session.lock().await;
            s.generation += 1;
            s.status = Status::Playing;
            s.position = crate::rules::Position::new();
            s.human_side = human_side;
            s.difficulty = difficulty;
            s.clock_white = total_seconds;
            s.clock_black = total_seconds;
            s.increment = increment_seconds;
            s.history.clear();
            s.last_move = None;
            s.eval_value = 0;
            s.eval_label = None;
            s.pending_hint = None;
            s.end = None;
            s.thinking = false;
            s.set_display(0, "Last: None");
            let clock = s.clock_line();
            s.set_display(1, &clock);
            self.notifier.send(Notification::Time {
                white: s.clock_white,
                black: s.clock_black,
            });
            info!(
                generation = s.generation,
                difficulty,
                total_seconds,
                human_side = human_side.name(),
                "New game started"
            );
            s.generation
        };

        // The human took Black: the opponent opens.
        if human_side == Side::Black {
            self.spawn_opponent_reply(generation);
        }
    }

    /// Resolves and commits one human move.
    #[instrument(skip(self), fields(text = %text))]
    pub async fn process_move(&self, text: &str) -> MoveOutcome {
        let mut s = self.session.lock().await;
        if s.status != Status::Playing {
            debug!("Move ignored: no game in progress");
            return MoveOutcome::NotPlaying;
        }
        if s.turn() != s.human_side {
            debug!("Move rejected: not the human side's turn");
            self.notifier.send(Notification::Illegal);
            return MoveOutcome::Illegal;
        }

        let Some(m) = resolve(&s.position, text) else {
            debug!("Move text did not resolve");
            self.notifier.send(Notification::Illegal);
            s.set_display(0, "Illegal Move!");
            return MoveOutcome::Illegal;
        };

        self.commit_move(&mut s, &m, true).await;

        if self.finish_if_over(&mut s).await {
            return MoveOutcome::GameOver;
        }

        let generation = s.generation;
        drop(s);
        self.spawn_opponent_reply(generation);
        MoveOutcome::Ok
    }

    /// Applies a resolved legal move, updating evaluation, history, clocks
    /// and outbound notifications. The caller holds the session lock.
    async fn commit_move(&self, s: &mut GameSession, m: &Move, human: bool) {
        let mover = s.turn();
        let depth = s.difficulty;
        let san = s.position.san(m);
        let uci = s.position.uci(m);

        let eval_before = self.strategy.evaluate(&s.position.fen(), depth).await;
        s.position.apply(m);
        let eval_after = self.strategy.evaluate(&s.position.fen(), depth).await;

        // Evaluations are from White's perspective; the cost of the move is
        // how much it worsened the mover's own standing.
        let mut delta = eval_before - eval_after;
        if mover == Side::Black {
            delta = -delta;
        }
        let quality = classify(delta);

        s.history
            .push(MoveRecord::new(uci.clone(), san.clone(), eval_after, quality));
        s.last_move = Some(uci.clone());
        s.eval_value = eval_after;
        s.eval_label = Some(quality);
        s.pending_hint = None;

        match mover {
            Side::White => s.clock_white += s.increment,
            Side::Black => s.clock_black += s.increment,
        }

        if human {
            self.notifier.send(Notification::Last(san.clone()));
            self.notifier.send(Notification::Eval(quality));
            s.set_quality_emoticon(quality);
        }
        self.notifier.send(Notification::Time {
            white: s.clock_white,
            black: s.clock_black,
        });

        info!(%san, %uci, eval_after, ?quality, human, "Move committed");
    }

    /// Closes out the game if the position is terminal. Returns `true` when
    /// the game just ended.
    async fn finish_if_over(&self, s: &mut GameSession) -> bool {
        let Some(terminal) = s.position.terminal() else {
            return false;
        };

        let (reason, winner, result) = match terminal {
            Terminal::Checkmate { winner } => (
                EndReason::Checkmate,
                Some(winner),
                format!("{} Wins (Checkmate)", winner.name()),
            ),
            Terminal::Stalemate => (EndReason::Stalemate, None, "Draw (Stalemate)".to_string()),
            Terminal::InsufficientMaterial => (
                EndReason::InsufficientMaterial,
                None,
                "Draw (Material)".to_string(),
            ),
        };

        s.status = Status::GameOver;
        s.end = Some(GameEnd::new(reason, winner));
        s.thinking = false;

        match winner {
            Some(side) => {
                self.notifier.send(Notification::Checkmate(side));
                s.set_display(0, &format!("{} Wins!", side.name()));
            }
            None => {
                // Dead positions go out as STALEMATE too; the board firmware
                // only distinguishes decisive from drawn.
                self.notifier.send(Notification::Stalemate);
                s.set_display(0, "Draw!");
            }
        }
        s.set_display(1, reason.label());

        info!(?reason, winner = ?winner.map(|s| s.name()), "Game over");
        self.persist(s, &result);
        true
    }

    /// Records the finished game in the long-term store. Store failures are
    /// logged and swallowed; the session keeps running without persistence.
    fn persist(&self, s: &GameSession, result: &str) {
        let pgn = s
            .history
            .iter()
            .map(|record| record.san().as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let (white, black) = match s.human_side {
            Side::White => ("Player", "Engine"),
            Side::Black => ("Engine", "Player"),
        };
        let record = NewGameRecord::new(white.to_string(), black.to_string(), result.to_string(), pgn);
        if let Err(err) = self.store.save_game(record) {
            warn!(error = %err, "Failed to record finished game");
        }
    }

    /// Launches the opponent-reply task for the given session generation.
    fn spawn_opponent_reply(&self, generation: u64) {
        let controller = self.clone();
        tokio::spawn(async move {
            controller.opponent_reply(generation).await;
        });
    }

    /// Computes and commits the opponent's reply, unless the session moved
    /// on to a newer generation in the meantime.
    #[instrument(skip(self))]
    async fn opponent_reply(&self, generation: u64) {
        let delay_ms = {
            let (lo, hi) = self.config.think_delay_ms;
            if hi > lo {
                use rand::Rng as _;
                rand::rng().random_range(lo..=hi)
            } else {
                lo
            }
        };
        if delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
        }

        let (fen, depth) = {
            let mut s = self.session.lock().await;
            if s.generation != generation || s.status != Status::Playing {
                debug!("Opponent reply abandoned: session moved on");
                return;
            }
            if s.turn() == s.human_side {
                debug!("Opponent reply abandoned: human to move");
                return;
            }
            s.thinking = true;
            s.set_display(0, "Thinking...");
            (s.position.fen(), s.difficulty)
        };

        // Deep search runs outside the lock; the session stays responsive.
        let best = self.strategy.best_move(&fen, depth).await;

        let mut s = self.session.lock().await;
        if s.generation == generation {
            s.thinking = false;
        }
        if s.generation != generation || s.status != Status::Playing {
            debug!("Opponent reply discarded: session moved on during search");
            return;
        }

        let Some(uci) = best else {
            warn!("Strategy engine produced no reply");
            return;
        };
        let Some(m) = s.position.move_from_uci(&uci) else {
            warn!(%uci, "Engine reply is not legal here, discarding");
            return;
        };

        let san = s.position.san(&m);
        self.notifier.send(Notification::Best(san.clone()));
        s.set_display(0, &format!("Last: {san}"));
        self.commit_move(&mut s, &m, false).await;
        self.finish_if_over(&mut s).await;
    }

    /// Requests a hint for the human side; the answer arrives asynchronously
    /// as a notification and on the display mirror.
    #[instrument(skip(self))]
    pub fn request_hint(&self) {
        let controller = self.clone();
        tokio::spawn(async move {
            controller.hint_task().await;
        });
    }

    async fn hint_task(&self) {
        let (fen, depth, generation) = {
            let s = self.session.lock().await;
            if s.status != Status::Playing {
                debug!("Hint ignored: no game in progress");
                return;
            }
            (s.position.fen(), s.difficulty, s.generation)
        };

        let Some(uci) = self.strategy.best_move(&fen, depth).await else {
            debug!("No hint available");
            return;
        };

        let mut s = self.session.lock().await;
        if s.generation != generation || s.status != Status::Playing {
            debug!("Hint discarded: session moved on during search");
            return;
        }

        // Re-render against the searched position: the live one may have
        // advanced if the search raced a committed move.
        let searched = match crate::rules::Position::from_fen(&fen) {
            Ok(position) => position,
            Err(err) => {
                warn!(error = %err, "Hint position no longer parses");
                return;
            }
        };
        let Some(m) = searched.move_from_uci(&uci) else {
            warn!(%uci, "Hint move is not legal in the searched position");
            return;
        };
        let san = searched.san(&m);

        s.pending_hint = Some(san.clone());
        s.set_display(0, &format!("Hint: {san}"));
        self.notifier.send(Notification::Hint(san));
    }

    /// The human resigns; the opponent wins immediately.
    #[instrument(skip(self))]
    pub async fn resign(&self) {
        let mut s = self.session.lock().await;
        if s.status != Status::Playing {
            debug!("Resignation ignored: no game in progress");
            return;
        }

        let winner = s.human_side.opponent();
        s.status = Status::GameOver;
        s.end = Some(GameEnd::new(EndReason::Resignation, Some(winner)));
        s.thinking = false;
        s.set_display(0, &format!("{} Wins!", winner.name()));
        s.set_display(1, EndReason::Resignation.label());
        self.notifier.send(Notification::Resign);

        info!(winner = winner.name(), "Human resigned");
        self.persist(&s, &format!("{} Wins (Resign)", winner.name()));
    }

    /// Both players agree to a draw.
    #[instrument(skip(self))]
    pub async fn agree_draw(&self) {
        let mut s = self.session.lock().await;
        if s.status != Status::Playing {
            debug!("Draw agreement ignored: no game in progress");
            return;
        }

        s.status = Status::GameOver;
        s.end = Some(GameEnd::new(EndReason::DrawAgreed, None));
        s.thinking = false;
        s.set_display(0, "Draw Agreed");
        s.set_display(1, EndReason::DrawAgreed.label());
        self.notifier.send(Notification::Draw);

        info!("Draw agreed");
        self.persist(&s, "Draw (Agreed)");
    }

    /// Changes the strategy-engine search depth for subsequent moves.
    #[instrument(skip(self))]
    pub async fn set_difficulty(&self, depth: u8) {
        let mut s = self.session.lock().await;
        s.difficulty = depth;
        info!(depth, "Difficulty updated");
    }

    /// Takes an immutable snapshot of the session.
    pub async fn snapshot(&self) -> SessionView {
        self.session.lock().await.view()
    }

    /// Pushes the recent finished games to the display mirror.
    ///
    /// Store failures are logged and swallowed.
    #[instrument(skip(self))]
    pub fn send_recent_history(&self) {
        let games = match self.store.recent_games(5) {
            Ok(games) => games,
            Err(err) => {
                warn!(error = %err, "Failed to load recent games");
                return;
            }
        };

        self.notifier.send(Notification::HistoryClear);
        for game in games {
            let code = result_code(game.result());
            let entry = format!(
                "{}-{} {}",
                shorten(game.white_player(), 4),
                shorten(game.black_player(), 4),
                code
            );
            self.notifier.send(Notification::HistoryAdd(entry));
        }
    }

    /// Advances the game clock by one second for the side to move.
    ///
    /// Called by the clock service; a flag fall ends the game on the spot.
    pub(crate) async fn tick_clock(&self, pause_while_thinking: bool) {
        let mut s = self.session.lock().await;
        if s.status != Status::Playing {
            return;
        }
        if pause_while_thinking && s.thinking {
            return;
        }

        let side = s.turn();
        let clock = match side {
            Side::White => &mut s.clock_white,
            Side::Black => &mut s.clock_black,
        };
        *clock = clock.saturating_sub(1);

        if *clock == 0 {
            let winner = side.opponent();
            s.status = Status::GameOver;
            s.end = Some(GameEnd::new(EndReason::Timeout, Some(winner)));
            s.thinking = false;
            // Flag falls go out on the decisive-result channel.
            self.notifier.send(Notification::Checkmate(winner));
            s.set_display(0, &format!("{} Wins!", winner.name()));
            s.set_display(1, EndReason::Timeout.label());
            info!(winner = winner.name(), "Flag fell");
            self.persist(&s, &format!("{} Wins (Time)", winner.name()));
            return;
        }

        let clock_line = s.clock_line();
        s.set_display(1, &clock_line);
        self.notifier.send(Notification::Time {
            white: s.clock_white,
            black: s.clock_black,
        });
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Compresses a stored result string to a scoreline code.
fn result_code(result: &str) -> &'static str {
    if result.contains("White") && result.contains("Win") {
        "1-0"
    } else if result.contains("Black") && result.contains("Win") {
        "0-1"
    } else {
        "1/2"
    }
}

/// Truncates a player name to fit a display history entry.
fn shorten(name: &str, max: usize) -> String {
    name.chars().take(max).collect()
}
