//! Adapter over the external rules-evaluation collaborator (`shakmaty`).
//!
//! The controller owns exactly one [`Position`] inside the session lock.
//! The raw rules-engine handle never crosses the lock boundary; everything
//! that leaves is a derived string (FEN, SAN, UCI) or a plain flag.

use derive_more::{Display, Error};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, MoveList, Position as _};

use crate::session::Side;

/// Error raised when a position cannot be built from interchange notation.
#[derive(Debug, Clone, Display, Error)]
#[display("Rules engine rejected position: {message}")]
pub struct RulesError {
    /// What the rules collaborator complained about.
    pub message: String,
}

/// Terminal classification of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// The side to move is checkmated.
    Checkmate {
        /// The side that delivered mate.
        winner: Side,
    },
    /// The side to move has no legal moves but is not in check.
    Stalemate,
    /// Neither side retains mating material.
    InsufficientMaterial,
}

/// Opaque board position handle, owned by the session controller.
#[derive(Debug, Clone)]
pub struct Position {
    inner: Chess,
}

impl Position {
    /// Creates the standard starting position.
    pub fn new() -> Self {
        Self {
            inner: Chess::default(),
        }
    }

    /// Builds a position from FEN interchange notation.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError`] if the text is not a legal standard-chess FEN.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let parsed: Fen = fen.parse().map_err(|e| RulesError {
            message: format!("invalid FEN '{fen}': {e}"),
        })?;
        let inner = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| RulesError {
                message: format!("illegal position '{fen}': {e}"),
            })?;
        Ok(Self { inner })
    }

    /// Renders the position as a FEN string.
    pub fn fen(&self) -> String {
        Fen::from_position(self.inner.clone(), EnPassantMode::Legal).to_string()
    }

    /// Side to move.
    pub fn turn(&self) -> Side {
        match self.inner.turn() {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }

    /// Whether the side to move is in check.
    pub fn is_check(&self) -> bool {
        self.inner.is_check()
    }

    /// Classifies the position if it is terminal.
    pub fn terminal(&self) -> Option<Terminal> {
        if self.inner.is_checkmate() {
            Some(Terminal::Checkmate {
                winner: self.turn().opponent(),
            })
        } else if self.inner.is_stalemate() {
            Some(Terminal::Stalemate)
        } else if self.inner.is_insufficient_material() {
            Some(Terminal::InsufficientMaterial)
        } else {
            None
        }
    }

    /// All legal moves in the current position, in generation order.
    pub(crate) fn legal_moves(&self) -> MoveList {
        self.inner.legal_moves()
    }

    /// Parses coordinate (UCI) text into a legal move, if one matches.
    pub(crate) fn move_from_uci(&self, text: &str) -> Option<Move> {
        UciMove::from_ascii(text.as_bytes())
            .ok()?
            .to_move(&self.inner)
            .ok()
    }

    /// Parses standard algebraic notation into a legal move, if one matches.
    pub(crate) fn move_from_san(&self, text: &str) -> Option<Move> {
        San::from_ascii(text.as_bytes())
            .ok()?
            .to_move(&self.inner)
            .ok()
    }

    /// Renders a legal move in standard algebraic notation.
    ///
    /// Must be called before the move is applied.
    pub(crate) fn san(&self, m: &Move) -> String {
        San::from_move(&self.inner, m).to_string()
    }

    /// Renders a legal move in coordinate (UCI) notation.
    pub(crate) fn uci(&self, m: &Move) -> String {
        m.to_uci(CastlingMode::Standard).to_string()
    }

    /// Applies a move known to be legal in this position.
    pub(crate) fn apply(&mut self, m: &Move) {
        self.inner.play_unchecked(m);
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_round_trips_fen() {
        let position = Position::new();
        let fen = position.fen();
        assert_eq!(
            fen,
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
        let rebuilt = Position::from_fen(&fen).expect("FEN should parse");
        assert_eq!(rebuilt.fen(), fen);
    }

    #[test]
    fn from_fen_rejects_garbage() {
        assert!(Position::from_fen("not a fen").is_err());
    }

    #[test]
    fn apply_flips_turn_and_tracks_san() {
        let mut position = Position::new();
        let m = position.move_from_uci("e2e4").expect("e2e4 is legal");
        assert_eq!(position.san(&m), "e4");
        position.apply(&m);
        assert_eq!(position.turn(), Side::Black);
        assert_eq!(position.uci(&position.move_from_san("e5").unwrap()), "e7e5");
    }

    #[test]
    fn fools_mate_is_checkmate_for_black() {
        let mut position = Position::new();
        for uci in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            let m = position.move_from_uci(uci).expect("scripted move is legal");
            position.apply(&m);
        }
        assert_eq!(
            position.terminal(),
            Some(Terminal::Checkmate {
                winner: Side::Black
            })
        );
    }

    #[test]
    fn bare_kings_are_insufficient_material() {
        let position = Position::from_fen("8/8/4k3/8/8/4K3/8/8 w - - 0 1").expect("legal");
        assert_eq!(position.terminal(), Some(Terminal::InsufficientMaterial));
    }

    #[test]
    fn ongoing_game_has_no_terminal() {
        assert_eq!(Position::new().terminal(), None);
    }
}
