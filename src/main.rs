//! A Discord moderation bot that keeps score.
//!
//! Every guild ban is attributed to the moderator who issued it (via the
//! audit log), tallied in a local SQLite database, and celebrated with a
//! Terminator-themed leaderboard.

pub use poise::serenity_prelude as serenity;

mod announce;
mod attributor;
mod commands;
mod data;
mod error;
mod ledger;
mod log;
mod setup;

pub use data::Data;
pub use error::ConfigError;
pub use error::PersistenceError;
pub use error::TerminatorError;
pub use error::UserError;
pub use setup::Config;

/// Convenient type alias, only this [poise::Context] type is used.
type Context<'a> = poise::Context<'a, Data, TerminatorError>;

#[tokio::main]
async fn main() -> Result<(), TerminatorError> {
    let config = Config::read()?;

    // Keep the guard alive so file logs keep flushing until exit.
    let _guard = log::install_tracing(&config);

    let mut client = setup::client(config).await?;

    // Shut the gateway connection down cleanly on ctrl-c.
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received exit signal. Shutting down...");
            shard_manager.shutdown_all().await;
        }
    });

    client.start().await?;

    Ok(())
}
