//! Inbound command channel: line parsing and dispatch.
//!
//! The board hardware speaks a line-oriented verb protocol. Parsing is
//! total in the sense that a bad line never reaches the session; it is
//! logged and dropped at this boundary.

use derive_more::{Display, Error};
use tracing::{debug, instrument, warn};

use crate::controller::SessionController;
use crate::session::Side;

/// One parsed inbound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a new game.
    Start {
        /// Strategy-engine search depth.
        difficulty: u8,
        /// Clock budget per side, in minutes.
        timer_minutes: u32,
        /// Seconds credited after each committed move.
        increment_seconds: u32,
        /// Side the human plays.
        human_side: Side,
    },
    /// Submit a move for the human side.
    Move(String),
    /// Ask for a hint.
    Hint,
    /// Request the recent-games history.
    History,
    /// Resign the current game.
    Resign,
    /// Change the search depth mid-game.
    Depth(u8),
    /// Clock echo from the board; informational only.
    ClockSync,
}

/// Error raised when an inbound line cannot be parsed.
#[derive(Debug, Clone, Display, Error)]
pub enum CommandError {
    /// The line matched no known verb.
    #[display("unrecognized command line: {line}")]
    Unrecognized {
        /// The offending line.
        line: String,
    },
    /// The verb was known but its arguments did not parse.
    #[display("malformed {verb} arguments: {args}")]
    Malformed {
        /// The verb whose arguments failed to parse.
        verb: &'static str,
        /// The argument text as received.
        args: String,
    },
}

impl Command {
    /// Parses one line of the inbound protocol.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the verb is unknown or its arguments
    /// are malformed.
    pub fn parse(line: &str) -> Result<Command, CommandError> {
        let line = line.trim();

        if let Some(args) = line.strip_prefix("START:") {
            return parse_start(args);
        }
        if let Some(text) = line.strip_prefix("MOVE:") {
            return Ok(Command::Move(text.trim().to_string()));
        }
        if line == "HINT" {
            return Ok(Command::Hint);
        }
        if line == "REQ_HISTORY" {
            return Ok(Command::History);
        }
        if line == "RESIGN" {
            return Ok(Command::Resign);
        }
        if let Some(args) = line.strip_prefix("DEPTH:") {
            let depth = args.trim().parse().map_err(|_| CommandError::Malformed {
                verb: "DEPTH",
                args: args.to_string(),
            })?;
            return Ok(Command::Depth(depth));
        }
        if line.strip_prefix("TIME:").is_some() {
            return Ok(Command::ClockSync);
        }

        Err(CommandError::Unrecognized {
            line: line.to_string(),
        })
    }
}

/// Parses `START:<depth>,<minutes>,<increment>,<W|B>`.
fn parse_start(args: &str) -> Result<Command, CommandError> {
    let malformed = || CommandError::Malformed {
        verb: "START",
        args: args.to_string(),
    };

    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(malformed());
    }

    let difficulty: u8 = parts[0].parse().map_err(|_| malformed())?;
    let timer_minutes: u32 = parts[1].parse().map_err(|_| malformed())?;
    let increment_seconds: u32 = parts[2].parse().map_err(|_| malformed())?;
    let human_side = match parts[3] {
        "W" => Side::White,
        "B" => Side::Black,
        _ => return Err(malformed()),
    };

    Ok(Command::Start {
        difficulty,
        timer_minutes,
        increment_seconds,
        human_side,
    })
}

/// Routes parsed commands into the session controller.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    controller: SessionController,
}

impl CommandDispatcher {
    /// Creates a dispatcher over a controller handle.
    pub fn new(controller: SessionController) -> Self {
        Self { controller }
    }

    /// Parses and executes one inbound line. Bad lines are logged and
    /// dropped; the channel keeps running.
    #[instrument(skip(self), fields(line = %line))]
    pub async fn dispatch(&self, line: &str) {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(CommandError::Unrecognized { .. }) => {
                debug!("Dropping unrecognized line");
                return;
            }
            Err(err @ CommandError::Malformed { .. }) => {
                warn!(error = %err, "Dropping malformed command");
                return;
            }
        };

        match command {
            Command::Start {
                difficulty,
                timer_minutes,
                increment_seconds,
                human_side,
            } => {
                self.controller
                    .reset(difficulty, timer_minutes * 60, increment_seconds, human_side)
                    .await;
            }
            Command::Move(text) => {
                let outcome = self.controller.process_move(&text).await;
                debug!(?outcome, "Move processed");
            }
            Command::Hint => self.controller.request_hint(),
            Command::History => self.controller.send_recent_history(),
            Command::Resign => self.controller.resign().await,
            Command::Depth(depth) => self.controller.set_difficulty(depth).await,
            Command::ClockSync => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start() {
        let command = Command::parse("START:5,10,0,W").expect("parses");
        assert_eq!(
            command,
            Command::Start {
                difficulty: 5,
                timer_minutes: 10,
                increment_seconds: 0,
                human_side: Side::White,
            }
        );
    }

    #[test]
    fn parses_start_as_black() {
        let command = Command::parse("START:8,3,2,B").expect("parses");
        assert_eq!(
            command,
            Command::Start {
                difficulty: 8,
                timer_minutes: 3,
                increment_seconds: 2,
                human_side: Side::Black,
            }
        );
    }

    #[test]
    fn parses_simple_verbs() {
        assert_eq!(
            Command::parse("MOVE:e2e4").unwrap(),
            Command::Move("e2e4".into())
        );
        assert_eq!(Command::parse("HINT").unwrap(), Command::Hint);
        assert_eq!(Command::parse("REQ_HISTORY").unwrap(), Command::History);
        assert_eq!(Command::parse("RESIGN").unwrap(), Command::Resign);
        assert_eq!(Command::parse("DEPTH:7").unwrap(), Command::Depth(7));
        assert_eq!(Command::parse("TIME:12,34").unwrap(), Command::ClockSync);
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(
            Command::parse("  MOVE: Nf3 \n").unwrap(),
            Command::Move("Nf3".into())
        );
    }

    #[test]
    fn rejects_unknown_verbs() {
        assert!(matches!(
            Command::parse("FROBNICATE"),
            Err(CommandError::Unrecognized { .. })
        ));
    }

    #[test]
    fn rejects_malformed_start() {
        assert!(matches!(
            Command::parse("START:bad"),
            Err(CommandError::Malformed { verb: "START", .. })
        ));
        assert!(matches!(
            Command::parse("START:5,10,0,X"),
            Err(CommandError::Malformed { verb: "START", .. })
        ));
    }

    #[test]
    fn rejects_malformed_depth() {
        assert!(matches!(
            Command::parse("DEPTH:deep"),
            Err(CommandError::Malformed { verb: "DEPTH", .. })
        ));
    }
}
