use std::{env, sync::Arc};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use twilight_gateway::{EventTypeFlags, Intents, Shard, ShardId, StreamExt as _};
use twilight_http::Client;
use twilight_model::gateway::event::Event;

use rustls::crypto::ring::default_provider;

use sweeper_commands::handle_message;
use sweeper_core::{CleanupScheduler, Context, Settings};
use sweeper_store::ConfigStore;
use sweeper_utils::MessagePlatform;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load the .env file before anything reads the environment
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(|name| env::var(name).ok()))
        .init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    let settings = Settings::from_env()?;

    // Create a single shared HTTP Client
    let http = Arc::new(Client::new(settings.token.clone()));
    let store = ConfigStore::open(settings.config_path.clone()).await;

    let platform: Arc<dyn MessagePlatform> = http.clone();
    let scheduler = CleanupScheduler::new(
        platform,
        store.clone(),
        settings.log_channel_id,
        settings.cleanup_interval,
    );
    scheduler.sync_with(&store.snapshot().await);

    let ctx = Context::new(Arc::clone(&http), store, scheduler);

    let intents = Intents::GUILDS | Intents::GUILD_MESSAGES | Intents::MESSAGE_CONTENT;

    // A shard is one Gateway WebSocket connection to Discord
    let mut shard = Shard::new(ShardId::new(0, 1), settings.token, intents);

    info!("sweeper is connecting...");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        let event = match item {
            Ok(event) => event,
            Err(source) => {
                error!(?source, "gateway event stream error");
                continue;
            }
        };

        match event {
            Event::Ready(ready) => {
                info!(
                    user = %ready.user.name,
                    guilds = ready.guilds.len(),
                    auto_cleanup = ctx.scheduler.is_running(),
                    "sweeper is ready"
                );
            }

            // Handlers run detached so a pending confirmation can see later messages.
            Event::MessageCreate(msg) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(source) = handle_message(ctx, msg).await {
                        error!(?source, "message handler failed");
                    }
                });
            }
            _ => {}
        }
    }

    ctx.scheduler.stop();
    Ok(())
}

/// `RUST_LOG` directives, or `info` when unset or unparsable.
fn log_filter(lookup: impl Fn(&str) -> Option<String>) -> EnvFilter {
    lookup(EnvFilter::DEFAULT_ENV)
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
