//! Bot commands.

mod kills;
mod leaderboard;

use crate::{Data, TerminatorError};

/// Convenient type alias for [poise::Command].
pub type Command = poise::Command<Data, TerminatorError>;

/// Lists all the implemented commands
pub fn list() -> Vec<Command> {
    vec![leaderboard::leaderboard(), kills::kills()]
}
