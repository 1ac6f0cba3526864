//! Builds the serenity client and poise framework.

mod config;
mod framework;

use crate::serenity;
use crate::TerminatorError;

pub use config::Config;

/// Constructs a [serenity::Client] with the ban-tracking framework attached.
pub(super) async fn client(config: Config) -> Result<serenity::Client, TerminatorError> {
    // Get discord token from config file
    let token = config.token()?.clone();

    // Intents we wish to use. The non-privileged set includes
    // GUILD_MODERATION, which carries the ban events we listen for.
    // See https://discord.com/developers/docs/topics/gateway#gateway-intents
    let intents = serenity::GatewayIntents::non_privileged();

    let client = serenity::ClientBuilder::new(token, intents)
        .framework(framework::framework(config))
        .await?;

    Ok(client)
}
