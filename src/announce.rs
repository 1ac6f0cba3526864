//! Leaderboard rendering and channel announcements.
//!
//! Everything here is fire-and-forget: a failed send is logged and never
//! propagated, so publishing can't disturb ledger state or event handling.

use rand::seq::SliceRandom;

use crate::ledger::Ledger;
use crate::ledger::ModeratorTally;
use crate::serenity;
use crate::Data;
use serenity::Colour;
use serenity::CreateEmbed;
use serenity::CreateEmbedAuthor;
use serenity::CreateEmbedFooter;
use serenity::CreateMessage;

/// How many moderators the leaderboard shows.
const LEADERBOARD_SIZE: usize = 10;

/// Icon shown next to the rankings title.
const RANKINGS_ICON: &str =
    "https://images.wallpapersden.com/image/download/terminator-6_a2tlbmiUmZqaraWkpJRmbmdlrWZlbWU.jpg";

/// Footer under every rankings embed.
const RANKINGS_FOOTER: &str = "The future is not set. There is no fate but what we make for ourselves. 🤖🔫 \nFor detailed terminations, use /kills [username]";

/// Builds the rankings embed for the given tallies.
pub fn rankings_embed(tallies: &[ModeratorTally]) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .colour(Colour::DARK_MAGENTA)
        .author(CreateEmbedAuthor::new("💀 TERMINATOR RANKINGS 💀").icon_url(RANKINGS_ICON))
        .footer(CreateEmbedFooter::new(RANKINGS_FOOTER));

    for (rank, tally) in tallies.iter().enumerate() {
        embed = embed.field(
            format!("{}. {}", rank + 1, tally.mod_name),
            format!("🔥 Terminations: {} 👤", tally.ban_count),
            false,
        );
    }
    embed
}

/// Fetches the current top tallies, mapping storage errors to an empty
/// board so a broken database never reaches the requester.
pub fn top_or_empty(ledger: &Ledger) -> Vec<ModeratorTally> {
    ledger.top_tallies(LEADERBOARD_SIZE).unwrap_or_else(|e| {
        tracing::error!("Error in getting leaderboard: {e}");
        Vec::new()
    })
}

/// Publishes the current leaderboard to the configured channel.
pub async fn post_leaderboard(ctx: &serenity::Context, data: &Data) {
    let tallies = top_or_empty(&data.ledger);
    let message = CreateMessage::new().embed(rankings_embed(&tallies));

    if let Err(e) = data.leaderboard_channel.send_message(ctx, message).await {
        tracing::error!("Failed to publish leaderboard: {e}");
    }
}

/// Startup announcement: leaderboard plus a congratulation for the leader.
/// Skipped entirely while the ledger is still empty.
pub async fn startup_summary(ctx: &serenity::Context, data: &Data) {
    let tallies = top_or_empty(&data.ledger);
    let Some(leader) = tallies.first() else {
        return;
    };

    let embed = CreateMessage::new().embed(rankings_embed(&tallies));
    if let Err(e) = data.leaderboard_channel.send_message(ctx, embed).await {
        tracing::error!("Failed to publish startup leaderboard: {e}");
        return;
    }

    let phrase = data
        .phrases
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_default();
    let message = congratulations(leader, tallies.get(1), &phrase);

    if let Err(e) = data
        .leaderboard_channel
        .send_message(ctx, CreateMessage::new().content(message))
        .await
    {
        tracing::error!("Failed to send congratulations: {e}");
    }
}

/// Builds the congratulatory message for the current leader, with a warning
/// about the runner-up when there is one.
fn congratulations(
    leader: &ModeratorTally,
    runner_up: Option<&ModeratorTally>,
    phrase: &str,
) -> String {
    let mut message = format!("🎉 Congratulations {}! 🎉\n{phrase}", leader.mod_name);
    if let Some(runner_up) = runner_up {
        message += &format!(
            "\n\n👀 Look out {}, {} is right behind you! Better step up your game!",
            leader.mod_name, runner_up.mod_name
        );
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::UserId;

    fn tally(id: u64, name: &str, count: u64) -> ModeratorTally {
        ModeratorTally {
            mod_id: UserId::new(id),
            mod_name: name.to_string(),
            ban_count: count,
        }
    }

    #[test]
    fn congratulations_mentions_runner_up() {
        let leader = tally(1, "Sarah", 9);
        let runner_up = tally(2, "Kyle", 7);
        let message = congratulations(&leader, Some(&runner_up), "No problemo.");

        assert!(message.contains("Congratulations Sarah"));
        assert!(message.contains("No problemo."));
        assert!(message.contains("Kyle is right behind you"));
    }

    #[test]
    fn congratulations_without_runner_up() {
        let leader = tally(1, "Sarah", 9);
        let message = congratulations(&leader, None, "Hasta la vista.");

        assert!(message.contains("Hasta la vista."));
        assert!(!message.contains("right behind you"));
    }
}
