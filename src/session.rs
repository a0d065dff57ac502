//! The live game session entity and its externally observable snapshot.
//!
//! A single [`GameSession`] exists per process. It is owned by the
//! [`SessionController`](crate::SessionController) behind one exclusive lock;
//! nothing outside that lock ever touches it. Observers get [`SessionView`]
//! copies instead.

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::quality::QualityLabel;
use crate::rules::Position;

/// Width of one row of the mirrored 16x2 character display.
const DISPLAY_COLS: usize = 16;

/// A side of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The white pieces.
    White,
    /// The black pieces.
    Black,
}

impl Side {
    /// Returns the other side.
    pub fn opponent(&self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Human-readable name, capitalized as it appears in persisted results.
    pub fn name(&self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }

    /// Uppercase wire form used on the command channel.
    pub(crate) fn wire(&self) -> &'static str {
        match self {
            Side::White => "WHITE",
            Side::Black => "BLACK",
        }
    }
}

/// Lifecycle phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Constructed, no game started yet.
    Waiting,
    /// A game is in progress; moves and clock ticks are accepted.
    Playing,
    /// The game reached a terminal state; see [`GameEnd`].
    GameOver,
}

/// Why a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A king was checkmated.
    Checkmate,
    /// The side to move had no legal moves and was not in check.
    Stalemate,
    /// Neither side can deliver mate.
    InsufficientMaterial,
    /// A player resigned.
    Resignation,
    /// Both players agreed to a draw.
    DrawAgreed,
    /// A clock reached zero.
    Timeout,
}

impl EndReason {
    /// Short label shown on the display mirror.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Checkmate => "Checkmate",
            Self::Stalemate => "Stalemate",
            Self::InsufficientMaterial => "Insuff. Material",
            Self::Resignation => "Resignation",
            Self::DrawAgreed => "Game Over",
            Self::Timeout => "Time Expired",
        }
    }
}

/// Terminal outcome of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, new, Getters)]
pub struct GameEnd {
    /// Why the game ended.
    reason: EndReason,
    /// Winning side, `None` for drawn games.
    winner: Option<Side>,
}

/// One committed move as recorded in the session history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, new, Getters)]
pub struct MoveRecord {
    /// Move in coordinate (UCI) notation.
    uci: String,
    /// Move in standard algebraic notation.
    san: String,
    /// Evaluation after the move, centipawns from White's perspective.
    eval: i32,
    /// Quality label assigned at commit time.
    quality: QualityLabel,
}

/// The single live game session.
///
/// Fields are crate-private: all mutation happens through the controller and
/// clock service while they hold the session lock.
#[derive(Debug)]
pub struct GameSession {
    pub(crate) generation: u64,
    pub(crate) status: Status,
    pub(crate) position: Position,
    pub(crate) human_side: Side,
    pub(crate) difficulty: u8,
    pub(crate) clock_white: u32,
    pub(crate) clock_black: u32,
    pub(crate) increment: u32,
    pub(crate) history: Vec<MoveRecord>,
    pub(crate) last_move: Option<String>,
    pub(crate) eval_value: i32,
    pub(crate) eval_label: Option<QualityLabel>,
    pub(crate) pending_hint: Option<String>,
    pub(crate) end: Option<GameEnd>,
    pub(crate) thinking: bool,
    pub(crate) display: [String; 2],
}

impl GameSession {
    /// Creates the session in the `Waiting` phase with default settings.
    pub fn new() -> Self {
        Self {
            generation: 0,
            status: Status::Waiting,
            position: Position::new(),
            human_side: Side::White,
            difficulty: 5,
            clock_white: 600,
            clock_black: 600,
            increment: 0,
            history: Vec::new(),
            last_move: None,
            eval_value: 0,
            eval_label: None,
            pending_hint: None,
            end: None,
            thinking: false,
            display: [pad("ChessBot Arena"), pad("Ready...")],
        }
    }

    /// Side to move, derived from the position.
    pub fn turn(&self) -> Side {
        self.position.turn()
    }

    /// Overwrites one display row, padded/truncated to the panel width.
    pub(crate) fn set_display(&mut self, row: usize, text: &str) {
        self.display[row] = pad(text);
    }

    /// Renders the clock row in `Wmm:ss Bmm:ss` form.
    pub(crate) fn clock_line(&self) -> String {
        format!(
            "W{:02}:{:02} B{:02}:{:02}",
            self.clock_white / 60,
            self.clock_white % 60,
            self.clock_black / 60,
            self.clock_black % 60
        )
    }

    /// Puts a random emoticon for the given quality label on the top row.
    pub(crate) fn set_quality_emoticon(&mut self, label: QualityLabel) {
        use rand::Rng as _;

        let options = emoticons(label);
        let pick = options[rand::rng().random_range(0..options.len())];
        self.set_display(0, pick);
    }

    /// Returns an immutable copy of every externally observable field.
    ///
    /// The rules-engine position handle itself is never exposed, only its
    /// FEN rendering.
    pub fn view(&self) -> SessionView {
        SessionView {
            generation: self.generation,
            status: self.status,
            turn: self.turn(),
            fen: self.position.fen(),
            last_move: self.last_move.clone(),
            check: self.position.is_check(),
            eval_value: self.eval_value,
            eval_label: self.eval_label,
            history: self.history.clone(),
            clock_white: self.clock_white,
            clock_black: self.clock_black,
            difficulty: self.difficulty,
            human_side: self.human_side,
            pending_hint: self.pending_hint.clone(),
            end: self.end,
            display: self.display.clone(),
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable snapshot of the session for the presentation layer.
#[derive(Debug, Clone, Serialize, Getters)]
pub struct SessionView {
    /// Session identifier; bumped on every reset.
    generation: u64,
    /// Lifecycle phase.
    status: Status,
    /// Side to move.
    turn: Side,
    /// Current position in FEN interchange notation.
    fen: String,
    /// Most recently committed move in UCI notation.
    last_move: Option<String>,
    /// Whether the side to move is in check.
    check: bool,
    /// Last evaluation, centipawns from White's perspective.
    eval_value: i32,
    /// Quality label of the last committed move.
    eval_label: Option<QualityLabel>,
    /// Committed moves in play order since the last reset.
    history: Vec<MoveRecord>,
    /// White's remaining seconds.
    clock_white: u32,
    /// Black's remaining seconds.
    clock_black: u32,
    /// Current strategy-engine search depth.
    difficulty: u8,
    /// Which side the human controls.
    human_side: Side,
    /// Most recent hint move, if one was requested.
    pending_hint: Option<String>,
    /// Terminal outcome, present once `status` is `GameOver`.
    end: Option<GameEnd>,
    /// Mirrored 16x2 display rows.
    display: [String; 2],
}

/// Pads or truncates a string to the fixed display width.
fn pad(text: &str) -> String {
    let mut row: String = text.chars().take(DISPLAY_COLS).collect();
    while row.chars().count() < DISPLAY_COLS {
        row.push(' ');
    }
    row
}

/// Emoticon rows shown after a committed human move.
fn emoticons(label: QualityLabel) -> &'static [&'static str] {
    match label {
        QualityLabel::Brilliant => &["(*^O^*) Super!!", "\\(^o^)/ Wow!!"],
        QualityLabel::Good => &["(^_^) Good!", "(o_o) Nice move"],
        QualityLabel::Inaccuracy => &["(O_O ) (_ _ )", "(-_-) Hmmm....."],
        QualityLabel::Mistake => &["(T_T) Mistake..", "(;_;) Oh no...."],
        QualityLabel::Blunder => &["(X_X) Blunder!!", "(>_<) Disaster!"],
    }
}
