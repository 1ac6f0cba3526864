//! Implements the `/leaderboard` command.
//!
//! The bot responds with an embed displaying the top moderators by
//! attributed ban count.

use poise::CreateReply;
use tracing::instrument;

use crate::announce;
use crate::Context;
use crate::TerminatorError;

/// Show the current Terminator rankings.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_cooldown = 2)]
pub async fn leaderboard(ctx: Context<'_>) -> Result<(), TerminatorError> {
    // Storage errors render as an empty board rather than failing the
    // command; the error itself goes to the logs.
    let tallies = announce::top_or_empty(&ctx.data().ledger);

    let reply = CreateReply::default().embed(announce::rankings_embed(&tallies));
    ctx.send(reply).await?;

    Ok(())
}
