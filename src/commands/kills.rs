//! Implements the `/kills` command.
//!
//! Lists every user the given moderator has banned, oldest first.

use poise::CreateReply;
use tracing::instrument;

use crate::serenity;
use crate::Context;
use crate::TerminatorError;
use serenity::Colour;
use serenity::CreateEmbed;
use serenity::CreateEmbedAuthor;

/// Icon shown next to the detail title.
const DETAILS_ICON: &str = "https://i.stack.imgur.com/8zzel.jpg";

/// Name shown when a banned user's account can't be resolved anymore.
const UNKNOWN_USER: &str = "Unknown user";

/// Show a moderator's termination record.
#[instrument(skip(ctx, moderator))]
#[poise::command(slash_command, guild_cooldown = 2)]
pub async fn kills(
    ctx: Context<'_>,
    #[description = "The moderator whose terminations to show"] moderator: serenity::User,
) -> Result<(), TerminatorError> {
    // Empty on storage error, logged like the leaderboard query.
    let banned = ctx
        .data()
        .ledger
        .ban_details_for(moderator.id)
        .unwrap_or_else(|e| {
            tracing::error!("Error in getting ban details: {e}");
            Vec::new()
        });

    let title = format!("💀 TERMINATOR DETAILS FOR {} 💀", moderator.name.to_uppercase());
    let mut embed = CreateEmbed::default()
        .colour(Colour::DARK_MAGENTA)
        .author(CreateEmbedAuthor::new(title).icon_url(DETAILS_ICON));

    if banned.is_empty() {
        embed = embed.description(format!(
            "{} has not terminated any users. 🚫🤖",
            moderator.name
        ));
    } else {
        for user_id in banned {
            // A deleted account is no reason to hide the rest of the list.
            let name = match user_id.to_user(ctx).await {
                Ok(user) => user.name,
                Err(e) => {
                    tracing::debug!("Couldn't resolve banned user {user_id}: {e}");
                    UNKNOWN_USER.to_string()
                }
            };
            embed = embed.field(format!("Terminated: {name}"), "🔥👤", false);
        }
    }

    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}
