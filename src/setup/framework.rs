//! Setup for [poise::Framework]

use crate::announce;
use crate::attributor;
use crate::commands;
use crate::ledger::Ledger;
use crate::serenity;
use crate::Config;
use crate::Data;
use crate::TerminatorError;

/// Convenient type alias, only this [poise::Framework] type is used.
type Framework = poise::Framework<Data, TerminatorError>;

/// Construct a [poise::Framework]
pub(super) fn framework(config: Config) -> Framework {
    poise::Framework::builder()
        .options(framework_options())
        .setup(|ctx, rdy, fw| framework_setup(ctx, rdy, fw, config))
        .build()
}

/// Configure options for the [Framework]
fn framework_options() -> poise::FrameworkOptions<Data, TerminatorError> {
    poise::FrameworkOptions {
        // Add commands to the framework
        commands: commands::list(),
        // Handle framework errors
        on_error: |e| crate::log::handle_framework_error(e),
        // Route gateway events (ban additions) to the attributor
        event_handler: |ctx, event, framework, data| {
            Box::pin(attributor::handle_event(ctx, event, framework, data))
        },
        // Log when commands start
        pre_command: |ctx| {
            Box::pin(async move {
                let cmd_name = &ctx.command().name;
                let user = &ctx.author();
                tracing::info!("Started '{cmd_name}' command from {user}.")
            })
        },
        // Log when finishing commands
        post_command: |ctx| {
            Box::pin(async move {
                let cmd_name = &ctx.command().name;
                let user = &ctx.author();
                tracing::info!("Finished '{cmd_name}' command from {user}.")
            })
        },
        ..Default::default()
    }
}

/// Construct future that runs on startup
fn framework_setup<'a>(
    ctx: &'a serenity::Context,
    rdy: &'a serenity::Ready,
    fw: &'a Framework,
    config: Config,
) -> poise::BoxFuture<'a, Result<Data, TerminatorError>> {
    Box::pin(async move {
        // Register the commands
        let commands = &commands::list();
        let app_commands = poise::builtins::create_application_commands(commands);

        serenity::Command::set_global_commands(&ctx.http, app_commands.clone()).await?;
        if let Some(dev_guild) = config.dev_guild() {
            // This is faster than global registers, useful for development.
            tracing::info!("Registering commands on dev guild.");
            dev_guild.set_commands(ctx, app_commands).await?;
        }

        // Simple message that logs when the bot has initialized
        let bot_name = &rdy.user.name;
        tracing::info!("{bot_name} is ready!");

        let notify_list = config.notify_list(fw);

        // One ledger handle for the whole process, owned by Data. Opened
        // here and closed when the client shuts down.
        tracing::info!("Connecting to the tally database...");
        let ledger = Ledger::open(config.database_path())?;

        let data = Data {
            ledger,
            mod_role: config.mod_role(),
            leaderboard_channel: config.leaderboard_channel(),
            phrases: config.phrases(),
            notify_list,
        };

        // Show the standings (and congratulate the leader) on startup.
        announce::startup_summary(ctx, &data).await;

        Ok(data)
    })
}
