//! Outbound notifications for the command/display collaborator.
//!
//! The session core never talks to a transport directly. It emits typed
//! [`Notification`]s through a [`Notifier`]; the `Display` impl is the
//! line-oriented wire format the board firmware consumes.

use tokio::sync::mpsc;
use tracing::warn;

use crate::quality::QualityLabel;
use crate::session::Side;

/// One outbound message to the command/display collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The submitted move text did not resolve to a legal move.
    Illegal,
    /// A human move was committed (SAN).
    Last(String),
    /// Quality label of the committed human move.
    Eval(QualityLabel),
    /// The opponent reply about to be committed (SAN).
    Best(String),
    /// A computed hint move (SAN).
    Hint(String),
    /// The game ended with a winner (checkmate or timeout).
    Checkmate(Side),
    /// The game ended drawn on the board (stalemate or dead position).
    Stalemate,
    /// The human resigned.
    Resign,
    /// A draw was agreed.
    Draw,
    /// Clock sync, remaining seconds per side.
    Time {
        /// White's remaining seconds.
        white: u32,
        /// Black's remaining seconds.
        black: u32,
    },
    /// Clear the recent-games list on the display.
    HistoryClear,
    /// Append one formatted recent-game entry.
    HistoryAdd(String),
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Illegal => write!(f, "ILLEGAL"),
            Self::Last(san) => write!(f, "LAST:{san}"),
            Self::Eval(label) => write!(f, "EVAL:{label}"),
            Self::Best(san) => write!(f, "BEST:{san}"),
            Self::Hint(san) => write!(f, "HINT:{san}"),
            Self::Checkmate(winner) => write!(f, "CHECKMATE:{}", winner.wire()),
            Self::Stalemate => write!(f, "STALEMATE"),
            Self::Resign => write!(f, "RESIGN"),
            Self::Draw => write!(f, "DRAW"),
            Self::Time { white, black } => write!(f, "TIME:{white},{black}"),
            Self::HistoryClear => write!(f, "HISTORY_CLEAR"),
            Self::HistoryAdd(entry) => write!(f, "HISTORY_ADD:{entry}"),
        }
    }
}

/// Sink for outbound notifications.
///
/// Implementations must be cheap and non-blocking: notifiers are called while
/// the session lock is held.
pub trait Notifier: Send + Sync {
    /// Delivers one notification. Delivery failures must be swallowed; the
    /// session must keep running without a transport.
    fn send(&self, note: Notification);
}

/// Notifier feeding an unbounded channel of wire-formatted lines.
///
/// The transport side (serial writer, stdout, a test collector) drains the
/// receiving half at its own pace.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelNotifier {
    /// Wraps the sending half of a line channel.
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn send(&self, note: Notification) {
        if self.tx.send(note.to_string()).is_err() {
            warn!(%note, "Notification dropped: transport channel closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_matches_protocol() {
        assert_eq!(Notification::Illegal.to_string(), "ILLEGAL");
        assert_eq!(Notification::Last("e4".into()).to_string(), "LAST:e4");
        assert_eq!(
            Notification::Eval(QualityLabel::Mistake).to_string(),
            "EVAL:MISTAKE"
        );
        assert_eq!(Notification::Best("Nf6".into()).to_string(), "BEST:Nf6");
        assert_eq!(Notification::Hint("Qh4".into()).to_string(), "HINT:Qh4");
        assert_eq!(
            Notification::Checkmate(Side::White).to_string(),
            "CHECKMATE:WHITE"
        );
        assert_eq!(
            Notification::Time {
                white: 599,
                black: 600
            }
            .to_string(),
            "TIME:599,600"
        );
        assert_eq!(Notification::HistoryClear.to_string(), "HISTORY_CLEAR");
        assert_eq!(
            Notification::HistoryAdd("Play-Engi 1-0".into()).to_string(),
            "HISTORY_ADD:Play-Engi 1-0"
        );
    }

    #[test]
    fn channel_notifier_forwards_lines() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = ChannelNotifier::new(tx);
        notifier.send(Notification::Resign);
        notifier.send(Notification::Draw);
        assert_eq!(rx.try_recv().unwrap(), "RESIGN");
        assert_eq!(rx.try_recv().unwrap(), "DRAW");
    }

    #[test]
    fn channel_notifier_survives_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let notifier = ChannelNotifier::new(tx);
        notifier.send(Notification::Stalemate);
    }
}
