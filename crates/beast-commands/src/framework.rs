//! Shared handler context and router assembly.

use crate::commands;
use crate::cooldown::CooldownTracker;
use crate::invocation::Invocation;
use crate::router::{Router, RouterError};
use beast_common::{ChannelId, Platform, UserId};
use beast_config::{Settings, StoreHandle, TicketLedger};
use beast_i18n::{Catalog, Locale, MessageArgs};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Everything a handler may touch. Cheap to clone.
#[derive(Clone)]
pub struct CommandContext {
    /// Single-writer document store.
    pub store: StoreHandle,
    /// Ticket view over the store.
    pub tickets: TicketLedger,
    /// Outbound platform calls.
    pub platform: Arc<dyn Platform>,
    /// Process settings.
    pub settings: Arc<Settings>,
    /// Message catalogue.
    pub i18n: Arc<Catalog>,
    /// Cooldown windows.
    pub cooldowns: Arc<CooldownTracker>,
    /// Cancelled to stop the process, e.g. by `owner restart`.
    pub shutdown: CancellationToken,
    /// Reply language.
    pub locale: Locale,
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("store", &self.store)
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

impl CommandContext {
    /// Build a context; the reply language comes from the settings.
    #[must_use]
    pub fn new(
        store: StoreHandle,
        platform: Arc<dyn Platform>,
        settings: Arc<Settings>,
        i18n: Arc<Catalog>,
    ) -> Self {
        let locale = Locale::from_code(&settings.locale).unwrap_or_else(|| i18n.fallback());
        Self {
            tickets: TicketLedger::new(store.clone()),
            store,
            platform,
            settings,
            i18n,
            cooldowns: Arc::new(CooldownTracker::new()),
            shutdown: CancellationToken::new(),
            locale,
        }
    }

    /// Translate `key` into the reply language.
    #[must_use]
    pub fn tr(&self, key: &str, args: &MessageArgs<'_>) -> String {
        self.i18n.tr(self.locale, key, args)
    }

    /// Owner configured in the environment or settings file.
    #[must_use]
    pub fn env_owner(&self) -> Option<UserId> {
        self.settings.discord.owner_id
    }

    /// Pause between sends of a broadcast.
    #[must_use]
    pub fn broadcast_delay(&self) -> Duration {
        Duration::from_millis(self.settings.scheduler.broadcast_delay_ms)
    }

    /// Parse a chat message as a prefix invocation, if a prefix is set and the
    /// message uses it.
    #[must_use]
    pub fn prefixed_invocation(
        &self,
        content: &str,
        user: UserId,
        channel: ChannelId,
    ) -> Option<Invocation> {
        let doc = self.store.snapshot();
        let prefix = doc.global.prefix.as_deref()?;
        Invocation::from_message(prefix, content, user, channel)
    }
}

/// A router with every command registered.
///
/// # Errors
///
/// Returns [`RouterError::Duplicate`] if two handlers share a name.
pub fn build_router() -> Result<Router, RouterError> {
    let mut router = Router::new();
    commands::register_all(&mut router)?;
    Ok(router)
}
