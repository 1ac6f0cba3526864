//! Error types, split by who is supposed to see them.
//!
//! [UserError]s are shown to the command author, everything else is for the
//! logs (and the bug notify list).

use std::time::Duration;

use thiserror::Error;

use crate::serenity;

/// Top-level error for every fallible path in the bot.
#[derive(Error, Debug)]
pub enum TerminatorError {
    /// Errors caused by user mistakes, shown as ephemeral replies.
    #[error(transparent)]
    UserError(#[from] UserError),

    /// A ledger read or write failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The config file is missing or malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Errors from the Discord API.
    #[error("Discord API error: {0}")]
    Serenity(#[from] serenity::Error),

    /// A command check rejected the invocation.
    #[error("Command check failed. {reason:?}")]
    CheckFailed {
        /// Optional explanation given by the check.
        reason: Option<String>,
    },

    /// A command handler panicked.
    #[error("Command panicked. Payload: {payload:?}")]
    Panic {
        /// Stringified panic payload, if any.
        payload: Option<String>,
    },

    /// Discord sent a command invocation that doesn't match our definition.
    #[error("Command structure mismatch: {description}")]
    CommandStructureMismatch {
        /// Where the mismatch is.
        description: String,
    },
}

/// Errors caused by a user misusing the bot, never logged as failures.
#[derive(Error, Debug)]
pub enum UserError {
    /// Command needs a guild context.
    #[error("This command only works in a server.")]
    GuildOnly,

    /// Arguments didn't parse.
    #[error("Couldn't understand the given arguments: {input:?}")]
    BadArgs {
        /// The offending input, if captured.
        input: Option<String>,
    },

    /// Command invoked while still on cooldown.
    #[error("Slow down! Try again in {} seconds.", remaining_cooldown.as_secs())]
    OnCooldown {
        /// Time left on the cooldown.
        remaining_cooldown: Duration,
    },

    /// A parent command was invoked without one of its subcommands.
    #[error("Pick one of the subcommands: {subcmds}")]
    MissingSubcommand {
        /// Comma separated list of valid subcommands.
        subcmds: String,
    },

    /// The bot lacks permissions in this channel.
    #[error("I'm missing permissions: {missing_permissions}")]
    MissingBotPermissions {
        /// The permissions the bot is missing.
        missing_permissions: serenity::Permissions,
    },

    /// The author lacks permissions for this command.
    #[error("You're missing permissions: {missing_permissions:?}")]
    MissingUserPermissions {
        /// The permissions the author is missing, if known.
        missing_permissions: Option<serenity::Permissions>,
    },

    /// Owner-only command used by a non-owner.
    #[error("Only the bot owner may use this command.")]
    NotOwner,
}

/// Errors from reading or creating the config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No config file existed; a default one was written.
    #[error("No config file found. {action_msg} Fill it in and restart.")]
    MissingConfig {
        /// Describes what was done about the missing file.
        action_msg: String,
    },

    /// The config file exists but couldn't be used.
    #[error("Invalid config: {reason}")]
    InvalidConfig {
        /// What's wrong with it.
        reason: String,
    },

    /// Filesystem trouble while reading or writing the config.
    #[error("Config file IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A ledger storage operation failed.
///
/// Surfaced to the caller and logged; never retried internally. A failed
/// [record_ban](crate::ledger::Ledger::record_ban) rolls back completely.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The underlying SQLite operation failed.
    #[error("Storage operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
