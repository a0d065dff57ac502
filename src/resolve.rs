//! Move-text resolution: ordered chain of pure resolvers.
//!
//! Inbound move text can arrive in three shapes, tried in fixed priority
//! order: exact coordinate (UCI) notation, standard algebraic notation, and
//! a bare destination square as reported by the hardware board. Each resolver
//! either produces a legal move or passes to the next one.

use shakmaty::{Move, Role, Square};
use tracing::debug;

use crate::rules::Position;

/// Resolves free-form move text against the legal moves of `position`.
///
/// Returns `None` when no resolver matches; the session must stay untouched
/// in that case.
pub(crate) fn resolve(position: &Position, text: &str) -> Option<Move> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    exact(position, text)
        .or_else(|| algebraic(position, text))
        .or_else(|| destination(position, text))
}

/// Exact coordinate match, e.g. `e2e4` or `e7e8q`. Case-insensitive.
fn exact(position: &Position, text: &str) -> Option<Move> {
    position.move_from_uci(&text.to_ascii_lowercase())
}

/// Standard algebraic notation, e.g. `Nf3`, `exd5`, `O-O`.
///
/// Bare square names are left to the destination resolver, which applies the
/// board's piece-priority rule instead of SAN's pawn-move reading.
fn algebraic(position: &Position, text: &str) -> Option<Move> {
    if parse_square(text).is_some() {
        return None;
    }
    position.move_from_san(text)
}

/// Destination-square-only input, e.g. `e4` from the board hardware.
///
/// When several legal moves target the square, the highest piece-value
/// priority wins (King > Queen > Rook > Knight > Bishop > Pawn); ties break
/// by encounter order in the legal-move list.
fn destination(position: &Position, text: &str) -> Option<Move> {
    let target = parse_square(text)?;

    let mut best: Option<Move> = None;
    let mut best_priority = 0u8;
    for m in position.legal_moves() {
        if m.to() != target {
            continue;
        }
        let priority = piece_priority(m.role());
        if priority > best_priority {
            best_priority = priority;
            best = Some(m);
        }
    }

    if let Some(ref m) = best {
        debug!(square = %target, priority = best_priority, uci = %position.uci(m), "Destination-square input resolved");
    }
    best
}

/// Parses a bare two-character square name, case-insensitive.
fn parse_square(text: &str) -> Option<Square> {
    if text.len() != 2 {
        return None;
    }
    text.to_ascii_lowercase().parse::<Square>().ok()
}

/// Piece-value priority for destination-square resolution.
fn piece_priority(role: Role) -> u8 {
    match role {
        Role::King => 6,
        Role::Queen => 5,
        Role::Rook => 4,
        Role::Knight => 3,
        Role::Bishop => 2,
        Role::Pawn => 1,
    }
}
