//! Core bot logic using the Poise framework.

use crate::error::{AppError, AppResult};
use crate::events::handle_event;
use crate::platform::SerenityPlatform;
use crate::registration::register_guilds;
use crate::scheduler::Scheduler;
use beast_commands::{build_router, CommandContext, CooldownTracker, Router};
use beast_common::{GuildId, Platform};
use beast_config::{ConfigStore, Settings, StoreHandle};
use beast_i18n::{Catalog, Locale};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// State shared with every event.
pub struct Data {
    /// Handler context.
    pub ctx: CommandContext,
    /// The single dispatch table.
    pub router: Arc<Router>,
}

/// Main bot structure.
pub struct BeastBot {
    settings: Arc<Settings>,
    store: StoreHandle,
    i18n: Arc<Catalog>,
    router: Arc<Router>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for BeastBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeastBot")
            .field("store", &self.store)
            .field("commands", &self.router.len())
            .finish_non_exhaustive()
    }
}

impl BeastBot {
    /// Open the store, load the catalogue and build the router.
    ///
    /// # Errors
    ///
    /// Fails when the catalogue does not parse or two commands share a name.
    pub async fn new(settings: Settings) -> AppResult<Self> {
        let settings = Arc::new(settings);
        let fallback = Locale::from_code(&settings.locale).unwrap_or_default();
        let i18n = Arc::new(Catalog::embedded(fallback)?);
        let router = Arc::new(build_router()?);
        let store = StoreHandle::start(ConfigStore::new(&settings.storage.data_file)).await;
        info!(commands = router.len(), locale = fallback.short_code(), "Bot initialized");

        Ok(Self {
            settings,
            store,
            i18n,
            router,
            shutdown: CancellationToken::new(),
        })
    }

    /// Token that stops the bot when cancelled.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Connect to the gateway and run until shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Discord`] when the client cannot be built or the
    /// gateway connection fails.
    pub async fn run(self) -> AppResult<()> {
        let Self {
            settings,
            store,
            i18n,
            router,
            shutdown,
        } = self;

        let intents = serenity::GatewayIntents::non_privileged()
            | serenity::GatewayIntents::GUILD_MEMBERS
            | serenity::GatewayIntents::MESSAGE_CONTENT;

        let token = settings.discord.token.clone();
        let setup_shutdown = shutdown.clone();
        let framework = poise::Framework::builder()
            .options(poise::FrameworkOptions {
                on_error: |error| Box::pin(on_error(error)),
                event_handler: |ctx, event, framework, data| {
                    Box::pin(handle_event(ctx, event, framework, data))
                },
                ..Default::default()
            })
            .setup(move |ctx, ready, _framework| {
                Box::pin(async move {
                    Ok(setup(ctx, ready, settings, store, i18n, router, setup_shutdown))
                })
            })
            .build();

        let mut client = serenity::ClientBuilder::new(&token, intents)
            .framework(framework)
            .await?;

        let shard_manager = Arc::clone(&client.shard_manager);
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => info!("Received shutdown signal, starting graceful shutdown"),
                    Err(err) => {
                        error!(error = %err, "Failed to listen for shutdown signal");
                        shutdown.cancelled().await;
                    }
                },
                () = shutdown.cancelled() => info!("Shutdown requested"),
            }
            shutdown.cancel();
            shard_manager.shutdown_all().await;
            info!("Discord client shutdown complete");
        });

        info!("Beast Bot is starting up...");
        client.start().await?;
        info!("Beast Bot has shut down");
        Ok(())
    }
}

fn setup(
    ctx: &serenity::Context,
    ready: &serenity::Ready,
    settings: Arc<Settings>,
    store: StoreHandle,
    i18n: Arc<Catalog>,
    router: Arc<Router>,
    shutdown: CancellationToken,
) -> Data {
    info!(user = %ready.user.name, guilds = ready.guilds.len(), "Connected to Discord");

    let platform: Arc<dyn Platform> = Arc::new(SerenityPlatform::new(Arc::clone(&ctx.http)));
    let mut command_ctx = CommandContext::new(store, platform, Arc::clone(&settings), i18n);
    command_ctx.shutdown = shutdown.clone();

    let guilds: Vec<GuildId> = ready.guilds.iter().map(|g| GuildId(g.id.get())).collect();
    tokio::spawn(register_guilds(
        Arc::clone(&ctx.http),
        Arc::clone(&router),
        guilds,
        Duration::from_millis(settings.discord.registration_delay_ms),
    ));
    tokio::spawn(Scheduler::from_context(&command_ctx).run(shutdown.clone()));
    tokio::spawn(sweep_cooldowns(
        Arc::clone(&command_ctx.cooldowns),
        Duration::from_secs(settings.rate_limiting.sweep_interval_seconds.max(1)),
        shutdown,
    ));

    Data {
        ctx: command_ctx,
        router,
    }
}

/// Drop expired cooldown entries every `every` until `shutdown` is cancelled.
pub async fn sweep_cooldowns(
    cooldowns: Arc<CooldownTracker>,
    every: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(every);
    // The first tick completes immediately; nothing can have expired yet.
    ticker.tick().await;
    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let removed = cooldowns.sweep_expired();
                debug!(removed, remaining = cooldowns.len(), "Cooldown sweep");
            }
        }
    }
}

/// Global error handler for the framework.
async fn on_error(error: poise::FrameworkError<'_, Data, AppError>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!(error = %error, "Failed to start bot");
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!(error = %error, event = event.snake_case_name(), "Event handler failed");
        }
        error => {
            if let Err(err) = poise::builtins::on_error(error).await {
                error!(error = %err, "Error while handling framework error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_stops_on_shutdown() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let cooldowns = Arc::new(CooldownTracker::new());
        tokio::time::timeout(
            Duration::from_secs(1),
            sweep_cooldowns(cooldowns, Duration::from_secs(600), shutdown),
        )
        .await
        .unwrap();
    }
}
