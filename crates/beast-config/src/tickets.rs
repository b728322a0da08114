//! Numbered support tickets, scoped to a guild or the global namespace.
//!
//! Numbers are unique within a scope only: guild ticket #3 and global ticket
//! #3 are different tickets, so every operation takes the scope explicitly.

use crate::document::{ExtraFields, TicketRecord, TicketStatus};
use crate::error::StoreError;
use crate::handle::StoreHandle;
use beast_common::{
    BotError, ChannelId, GuildId, MessageRef, OutboundError, Platform, Scope, UserId,
};
use thiserror::Error;
use tracing::{info, warn};

/// Errors raised by [`TicketLedger`] operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No ticket with that number exists in the scope.
    #[error("ticket #{number} not found in {scope}")]
    NotFound {
        /// Scope that was searched.
        scope: Scope,
        /// Requested number.
        number: u64,
    },

    /// The ticket has no thread to post into.
    #[error("ticket #{number} in {scope} has no thread")]
    NoThread {
        /// Scope of the ticket.
        scope: Scope,
        /// Ticket number.
        number: u64,
    },

    /// The store task is gone.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Posting into the thread failed.
    #[error(transparent)]
    Outbound(#[from] OutboundError),
}

impl From<LedgerError> for BotError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Store(err) => err.into(),
            LedgerError::Outbound(err) => Self::ExternalService(err),
            other => Self::validation(other.to_string()),
        }
    }
}

/// Ticket operations over the shared store.
#[derive(Debug, Clone)]
pub struct TicketLedger {
    store: StoreHandle,
}

impl TicketLedger {
    /// Creates a ledger over `store`.
    #[must_use]
    pub const fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Increment the scope's counter and insert an open ticket under the new
    /// number, in one store operation.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Store`] when the store is closed.
    pub async fn open(
        &self,
        scope: Scope,
        subject: impl Into<String>,
        creator: UserId,
        source_guild: Option<GuildId>,
    ) -> Result<u64, LedgerError> {
        let subject = subject.into();
        let number = self
            .store
            .update(move |doc| {
                let (counter, tickets) = doc.ticket_book_mut(scope);
                *counter += 1;
                let number = *counter;
                tickets.insert(
                    number,
                    TicketRecord {
                        thread_id: None,
                        creator_id: creator,
                        status: TicketStatus::Open,
                        subject,
                        source_guild_id: source_guild,
                        extra: ExtraFields::new(),
                    },
                );
                number
            })
            .await?;
        info!(%scope, number, creator = %creator, "Ticket opened");
        Ok(number)
    }

    /// Record the thread a ticket's conversation lives in.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for unknown tickets.
    pub async fn attach_thread(
        &self,
        scope: Scope,
        number: u64,
        thread: ChannelId,
    ) -> Result<(), LedgerError> {
        self.store
            .update(move |doc| {
                let (_, tickets) = doc.ticket_book_mut(scope);
                tickets.get_mut(&number).map(|ticket| ticket.thread_id = Some(thread))
            })
            .await?
            .ok_or(LedgerError::NotFound { scope, number })
    }

    /// Look a ticket up.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for unknown tickets.
    pub async fn status(&self, scope: Scope, number: u64) -> Result<TicketRecord, LedgerError> {
        self.store
            .read(move |doc| doc.tickets(scope).and_then(|t| t.get(&number)).cloned())
            .await?
            .ok_or(LedgerError::NotFound { scope, number })
    }

    /// Post `text` into the ticket's thread. The status is not changed.
    ///
    /// # Errors
    ///
    /// Fails when the ticket or its thread is missing or the send fails.
    pub async fn reply(
        &self,
        platform: &dyn Platform,
        scope: Scope,
        number: u64,
        text: &str,
    ) -> Result<MessageRef, LedgerError> {
        let ticket = self.status(scope, number).await?;
        let thread = ticket
            .thread_id
            .ok_or(LedgerError::NoThread { scope, number })?;
        Ok(platform.send_message(thread, text).await?)
    }

    /// Mark the ticket closed and archive its thread. Closing an already
    /// closed ticket is allowed; a failed archive is logged only.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for unknown tickets.
    pub async fn close(
        &self,
        platform: &dyn Platform,
        scope: Scope,
        number: u64,
    ) -> Result<TicketRecord, LedgerError> {
        let ticket = self.status(scope, number).await?;
        if let Some(thread) = ticket.thread_id {
            if let Err(err) = platform.archive_thread(thread).await {
                warn!(%scope, number, error = %err, "Failed to archive ticket thread");
            }
        }

        let closed = self
            .store
            .update(move |doc| {
                let (_, tickets) = doc.ticket_book_mut(scope);
                tickets.get_mut(&number).map(|ticket| {
                    ticket.status = TicketStatus::Closed;
                    ticket.clone()
                })
            })
            .await?
            .ok_or(LedgerError::NotFound { scope, number })?;
        info!(%scope, number, "Ticket closed");
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ConfigStore;
    use beast_common::test_utils::{discord_fixtures, OutboundCall, RecordingPlatform};

    async fn ledger(dir: &tempfile::TempDir) -> TicketLedger {
        TicketLedger::new(StoreHandle::start(ConfigStore::new(dir.path().join("doc.json"))).await)
    }

    #[tokio::test]
    async fn test_numbering_is_per_scope() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir).await;
        let guild = Scope::Guild(discord_fixtures::guild_a());
        let member = discord_fixtures::member_id();

        assert_eq!(ledger.open(guild, "a", member, None).await.unwrap(), 1);
        assert_eq!(ledger.open(guild, "b", member, None).await.unwrap(), 2);
        assert_eq!(ledger.open(guild, "c", member, None).await.unwrap(), 3);
        assert_eq!(ledger.open(Scope::Global, "x", member, None).await.unwrap(), 1);
        assert_eq!(ledger.open(Scope::Global, "y", member, None).await.unwrap(), 2);
        assert_eq!(ledger.open(Scope::Global, "z", member, None).await.unwrap(), 3);

        assert_eq!(ledger.status(guild, 3).await.unwrap().subject, "c");
        assert_eq!(ledger.status(Scope::Global, 3).await.unwrap().subject, "z");
        assert!(matches!(
            ledger.status(Scope::Guild(discord_fixtures::guild_b()), 3).await,
            Err(LedgerError::NotFound { number: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_reply_requires_thread_and_keeps_status() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir).await;
        let platform = RecordingPlatform::new();
        let scope = Scope::Global;
        let number = ledger
            .open(scope, "Hilfe", discord_fixtures::member_id(), Some(discord_fixtures::guild_a()))
            .await
            .unwrap();

        assert!(matches!(
            ledger.reply(&platform, scope, number, "hi").await,
            Err(LedgerError::NoThread { .. })
        ));

        let thread = ChannelId(777);
        ledger.attach_thread(scope, number, thread).await.unwrap();
        ledger.reply(&platform, scope, number, "hi").await.unwrap();
        assert_eq!(platform.messages_in(thread), vec!["hi".to_string()]);
        assert_eq!(ledger.status(scope, number).await.unwrap().status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn test_close_twice_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir).await;
        let platform = RecordingPlatform::new();
        let scope = Scope::Guild(discord_fixtures::guild_a());
        let number = ledger.open(scope, "s", discord_fixtures::member_id(), None).await.unwrap();
        ledger.attach_thread(scope, number, ChannelId(55)).await.unwrap();

        let first = ledger.close(&platform, scope, number).await.unwrap();
        let second = ledger.close(&platform, scope, number).await.unwrap();
        assert_eq!(first.status, TicketStatus::Closed);
        assert_eq!(second.status, TicketStatus::Closed);
        let archives = platform
            .calls()
            .into_iter()
            .filter(|call| matches!(call, OutboundCall::ArchiveThread { .. }))
            .count();
        assert_eq!(archives, 2);
    }

    #[tokio::test]
    async fn test_close_unknown_ticket() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir).await;
        let platform = RecordingPlatform::new();
        assert!(matches!(
            ledger.close(&platform, Scope::Global, 9).await,
            Err(LedgerError::NotFound { .. })
        ));
        assert!(platform.calls().is_empty());
    }
}
