//! Move-quality classification from evaluation swings.

use serde::{Deserialize, Serialize};

/// Quality label assigned to a committed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLabel {
    /// The move improved the mover's standing.
    Brilliant,
    /// Within 30 centipawns of the best continuation.
    Good,
    /// Gave up between 31 and 90 centipawns.
    Inaccuracy,
    /// Gave up between 91 and 200 centipawns.
    Mistake,
    /// Gave up more than 200 centipawns.
    Blunder,
}

impl QualityLabel {
    /// Uppercase wire form used on the command channel.
    pub(crate) fn wire(&self) -> &'static str {
        match self {
            Self::Brilliant => "BRILLIANT",
            Self::Good => "GOOD",
            Self::Inaccuracy => "INAC",
            Self::Mistake => "MISTAKE",
            Self::Blunder => "BLUNDER",
        }
    }
}

impl std::fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire())
    }
}

/// Classifies a move by its evaluation cost to the mover, in centipawns.
///
/// `delta` is positive when the move worsened the mover's own standing and
/// negative when it improved it.
pub fn classify(delta: i32) -> QualityLabel {
    if delta < 0 {
        QualityLabel::Brilliant
    } else if delta <= 30 {
        QualityLabel::Good
    } else if delta <= 90 {
        QualityLabel::Inaccuracy
    } else if delta <= 200 {
        QualityLabel::Mistake
    } else {
        QualityLabel::Blunder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_table() {
        assert_eq!(classify(-5), QualityLabel::Brilliant);
        assert_eq!(classify(-1), QualityLabel::Brilliant);
        assert_eq!(classify(0), QualityLabel::Good);
        assert_eq!(classify(30), QualityLabel::Good);
        assert_eq!(classify(31), QualityLabel::Inaccuracy);
        assert_eq!(classify(90), QualityLabel::Inaccuracy);
        assert_eq!(classify(91), QualityLabel::Mistake);
        assert_eq!(classify(200), QualityLabel::Mistake);
        assert_eq!(classify(201), QualityLabel::Blunder);
        assert_eq!(classify(1_000), QualityLabel::Blunder);
    }

    #[test]
    fn wire_form_is_uppercase() {
        assert_eq!(QualityLabel::Inaccuracy.to_string(), "INAC");
        assert_eq!(QualityLabel::Brilliant.to_string(), "BRILLIANT");
    }
}
