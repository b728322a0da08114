//! The outbound interface to the chat platform.
//!
//! Handlers and the scheduler never talk to the platform SDK directly; they
//! go through [`Platform`], which the bot binary implements on top of the
//! gateway client and tests implement in memory.

use crate::error::OutboundError;
use crate::types::{ChannelId, GuildId, MessageRef, RoleId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result of an outbound call.
pub type OutboundResult<T> = Result<T, OutboundError>;

/// Side-effecting calls the bot core makes against the chat platform.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Post `content` into a channel or thread.
    async fn send_message(&self, channel: ChannelId, content: &str) -> OutboundResult<MessageRef>;

    /// Replace the content of a message previously sent by the bot.
    async fn edit_message(&self, message: MessageRef, content: &str) -> OutboundResult<()>;

    /// Send a private message. Fails with
    /// [`OutboundError::RecipientUnreachable`] when the user blocks them.
    async fn send_direct_message(&self, user: UserId, content: &str)
        -> OutboundResult<MessageRef>;

    /// Open a public thread under `channel` and return its id.
    async fn create_thread(&self, channel: ChannelId, name: &str) -> OutboundResult<ChannelId>;

    /// Archive a thread.
    async fn archive_thread(&self, thread: ChannelId) -> OutboundResult<()>;

    /// Remove a member from a guild.
    async fn kick_member(&self, guild: GuildId, user: UserId, reason: &str) -> OutboundResult<()>;

    /// Ban a user from a guild.
    async fn ban_member(&self, guild: GuildId, user: UserId, reason: &str) -> OutboundResult<()>;

    /// Time a member out until `until`, or lift the timeout when `None`.
    async fn set_member_timeout(
        &self,
        guild: GuildId,
        user: UserId,
        until: Option<DateTime<Utc>>,
    ) -> OutboundResult<()>;

    /// Bulk delete up to `count` recent messages; returns how many were removed.
    async fn purge_messages(&self, channel: ChannelId, count: u8) -> OutboundResult<usize>;

    /// Grant a role to a member.
    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> OutboundResult<()>;
}
