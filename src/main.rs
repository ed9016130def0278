use std::env;
use std::sync::Arc;

use guildkeeper::reminders::{DiscordNotifier, ReminderSweeper};
use guildkeeper::{BotConfig, Data, Error, commands, handlers, logging};
use poise::serenity_prelude::{self as serenity};
use serenity::GatewayIntents;
use tracing::{error, info};

/// Bot token, from `DISCORD_TOKEN` or the older `DISCORD_BOT_TOKEN`
fn discord_token() -> Result<String, Error> {
    env::var("DISCORD_TOKEN")
        .or_else(|_| env::var("DISCORD_BOT_TOKEN"))
        .map_err(|_| "DISCORD_TOKEN must be set".into())
}

/// Main function to run the bot
async fn async_main() -> Result<(), Error> {
    let config = BotConfig::load()?;
    logging::init(&config.log_dir)?;

    let token = discord_token()?;
    let reminder_interval = config.reminder_interval();
    let mut cache_settings = ::serenity::cache::Settings::default();
    cache_settings.max_messages = config.message_cache_size;
    let data = Data::open(config)?;
    info!(path = %data.config.database_path.display(), "Database opened");

    let framework_data = data.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            pre_command: |ctx| {
                Box::pin(async move {
                    logging::log_command_start(ctx);
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    logging::log_command_end(ctx);
                })
            },
            on_error: |error| {
                Box::pin(async move {
                    logging::log_command_error(&error);
                    // Tell the user what went wrong
                    if let Err(e) = poise::builtins::on_error(error).await {
                        error!("Error while handling error: {e}");
                    }
                })
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                logging::log_console("Registering commands");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(framework_data)
            })
        })
        .build();

    let intents = GatewayIntents::non_privileged()
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::MESSAGE_CONTENT;
    let mut client = serenity::ClientBuilder::new(token, intents)
        .cache_settings(cache_settings)
        .event_handler(handlers::Handler::new(data.clone()))
        .framework(framework)
        .await?;

    let sweeper = ReminderSweeper::new(
        data.db.clone(),
        Arc::new(DiscordNotifier::new(client.http.clone())),
    )
    .spawn(reminder_interval);

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {e}");
            return;
        }
        info!("Shutdown signal received");
        shard_manager.shutdown_all().await;
    });

    info!("Starting {}...", guildkeeper::BOT_NAME);
    let result = client.start().await;
    sweeper.shutdown().await;
    result?;

    Ok(())
}

fn main() {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(async_main()) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
