//! Test utilities and shared test helpers for Beast Bot.
//!
//! This module provides common testing utilities, fixtures, and an in-memory
//! [`Platform`] that can be used across all crates in the workspace for unit
//! and integration testing.

use crate::{
    ChannelId, GuildId, MessageId, MessageRef, OutboundError, OutboundResult, Platform, RoleId,
    UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, Once};
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Test fixture for creating a fixed timestamp.
pub fn mock_timestamp(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    min: u32,
    sec: u32,
) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
        .unwrap()
}

/// Discord-related test utilities.
pub mod discord_fixtures {
    use crate::{ChannelId, GuildId, RoleId, UserId};

    /// The bot owner used throughout the tests.
    pub const fn owner_id() -> UserId {
        UserId(100_000_000_000_000_001)
    }

    /// A regular guild member.
    pub const fn member_id() -> UserId {
        UserId(200_000_000_000_000_002)
    }

    /// A second regular member.
    pub const fn other_member_id() -> UserId {
        UserId(200_000_000_000_000_003)
    }

    /// Create a test guild ID.
    pub const fn guild_a() -> GuildId {
        GuildId(300_000_000_000_000_001)
    }

    /// Create a second test guild ID.
    pub const fn guild_b() -> GuildId {
        GuildId(300_000_000_000_000_002)
    }

    /// Create a test channel ID.
    pub const fn test_channel_id() -> ChannelId {
        ChannelId(123_456_789_012_345_678)
    }

    /// Announcement channel of guild A.
    pub const fn announce_a() -> ChannelId {
        ChannelId(400_000_000_000_000_001)
    }

    /// Announcement channel of guild B.
    pub const fn announce_b() -> ChannelId {
        ChannelId(400_000_000_000_000_002)
    }

    /// Create a test role ID.
    pub const fn test_role_id() -> RoleId {
        RoleId(500_000_000_000_000_001)
    }
}

/// Configuration-related test utilities.
pub mod config_fixtures {
    /// A settings file in TOML form.
    pub fn settings_toml() -> &'static str {
        r#"
locale = "en"

[discord]
token = "test_token"
owner_id = "100000000000000001"

[storage]
data_file = "guild-config.json"

[scheduler]
interval_seconds = 30
broadcast_delay_ms = 0

[rate_limiting]
default_cooldown_seconds = 5

[rate_limiting.commands]
"8ball" = 10
"#
    }

    /// A persisted document in the legacy layout written by earlier versions.
    pub fn legacy_document_json() -> &'static str {
        r#"{
  "ownerId": "100000000000000001",
  "_global": {
    "owners": ["100000000000000009"],
    "disabledCommands": ["/Ping", "ping"],
    "schedules": [
      { "id": 1, "type": "announce", "time": 1765015200000, "message": "hello", "createdBy": "100000000000000001" },
      { "id": 2, "type": "dm", "time": 1765015200000, "message": "psst", "targetId": "200000000000000002", "createdBy": "100000000000000001", "sent": false }
    ],
    "nextScheduleId": 3,
    "guildId": "300000000000000001",
    "channelId": "400000000000000009",
    "ticketCounter": 1,
    "tickets": { "1": { "threadId": "600000000000000001", "creatorId": "200000000000000002", "status": "open", "subject": "Hilfe", "sourceGuildId": "300000000000000002" } },
    "krampus": { "enabled": true }
  },
  "300000000000000001": {
    "welcomeChannelId": "400000000000000005",
    "announceChannelId": "400000000000000001",
    "disabledCommands": ["PURGE"],
    "customField": 42
  },
  "not-a-guild": { "anything": [1, 2, 3] }
}"#
    }
}

/// Property-based testing utilities using proptest.
#[cfg(feature = "proptest")]
pub mod property_testing {
    use crate::UserId;
    use proptest::prelude::*;

    /// Strategy for generating valid user IDs.
    pub fn user_id_strategy() -> impl Strategy<Value = UserId> {
        (100_000_000_000_000_000u64..=999_999_999_999_999_999u64).prop_map(UserId)
    }

    /// Strategy for command names as users type them.
    pub fn command_name_strategy() -> impl Strategy<Value = String> {
        r"/?[A-Za-z][A-Za-z0-9-]{0,15}".prop_map(|s| s.to_string())
    }
}

/// One call recorded by [`RecordingPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCall {
    /// [`Platform::send_message`].
    Message { channel: ChannelId, content: String },
    /// [`Platform::edit_message`].
    Edit { message: MessageRef, content: String },
    /// [`Platform::send_direct_message`].
    DirectMessage { user: UserId, content: String },
    /// [`Platform::create_thread`].
    CreateThread { channel: ChannelId, name: String },
    /// [`Platform::archive_thread`].
    ArchiveThread { thread: ChannelId },
    /// [`Platform::kick_member`].
    Kick { guild: GuildId, user: UserId, reason: String },
    /// [`Platform::ban_member`].
    Ban { guild: GuildId, user: UserId, reason: String },
    /// [`Platform::set_member_timeout`].
    Timeout { guild: GuildId, user: UserId, until: Option<DateTime<Utc>> },
    /// [`Platform::purge_messages`].
    Purge { channel: ChannelId, count: u8 },
    /// [`Platform::add_role`].
    AddRole { guild: GuildId, user: UserId, role: RoleId },
}

/// In-memory [`Platform`] that records every call.
///
/// Failed calls are recorded too, so tests can assert that an attempt was made.
#[derive(Debug, Default)]
pub struct RecordingPlatform {
    calls: Mutex<Vec<OutboundCall>>,
    failing_channels: Mutex<HashSet<ChannelId>>,
    unreachable_users: Mutex<HashSet<UserId>>,
    next_id: AtomicU64,
}

impl RecordingPlatform {
    /// Create a platform that accepts everything.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(900_000_000_000_000_000),
            ..Self::default()
        }
    }

    /// Make every send into `channel` fail.
    pub fn fail_channel(&self, channel: ChannelId) {
        self.failing_channels.lock().unwrap().insert(channel);
    }

    /// Make direct messages to `user` fail as unreachable.
    pub fn block_direct_messages(&self, user: UserId) {
        self.unreachable_users.lock().unwrap().insert(user);
    }

    /// All recorded calls in order.
    pub fn calls(&self) -> Vec<OutboundCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Contents posted into `channel`.
    pub fn messages_in(&self, channel: ChannelId) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                OutboundCall::Message { channel: c, content } if c == channel => Some(content),
                _ => None,
            })
            .collect()
    }

    /// Contents sent privately to `user`.
    pub fn direct_messages_to(&self, user: UserId) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                OutboundCall::DirectMessage { user: u, content } if u == user => Some(content),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: OutboundCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn fresh_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn check_channel(&self, channel: ChannelId) -> OutboundResult<()> {
        if self.failing_channels.lock().unwrap().contains(&channel) {
            Err(OutboundError::Request(format!("channel {channel} rejected the request")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Platform for RecordingPlatform {
    async fn send_message(&self, channel: ChannelId, content: &str) -> OutboundResult<MessageRef> {
        self.record(OutboundCall::Message {
            channel,
            content: content.to_string(),
        });
        self.check_channel(channel)?;
        Ok(MessageRef {
            channel,
            message: MessageId(self.fresh_id()),
        })
    }

    async fn edit_message(&self, message: MessageRef, content: &str) -> OutboundResult<()> {
        self.record(OutboundCall::Edit {
            message,
            content: content.to_string(),
        });
        self.check_channel(message.channel)
    }

    async fn send_direct_message(
        &self,
        user: UserId,
        content: &str,
    ) -> OutboundResult<MessageRef> {
        self.record(OutboundCall::DirectMessage {
            user,
            content: content.to_string(),
        });
        if self.unreachable_users.lock().unwrap().contains(&user) {
            return Err(OutboundError::RecipientUnreachable(user));
        }
        Ok(MessageRef {
            channel: ChannelId(self.fresh_id()),
            message: MessageId(self.fresh_id()),
        })
    }

    async fn create_thread(&self, channel: ChannelId, name: &str) -> OutboundResult<ChannelId> {
        self.record(OutboundCall::CreateThread {
            channel,
            name: name.to_string(),
        });
        self.check_channel(channel)?;
        Ok(ChannelId(self.fresh_id()))
    }

    async fn archive_thread(&self, thread: ChannelId) -> OutboundResult<()> {
        self.record(OutboundCall::ArchiveThread { thread });
        self.check_channel(thread)
    }

    async fn kick_member(&self, guild: GuildId, user: UserId, reason: &str) -> OutboundResult<()> {
        self.record(OutboundCall::Kick {
            guild,
            user,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn ban_member(&self, guild: GuildId, user: UserId, reason: &str) -> OutboundResult<()> {
        self.record(OutboundCall::Ban {
            guild,
            user,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn set_member_timeout(
        &self,
        guild: GuildId,
        user: UserId,
        until: Option<DateTime<Utc>>,
    ) -> OutboundResult<()> {
        self.record(OutboundCall::Timeout { guild, user, until });
        Ok(())
    }

    async fn purge_messages(&self, channel: ChannelId, count: u8) -> OutboundResult<usize> {
        self.record(OutboundCall::Purge { channel, count });
        self.check_channel(channel)?;
        Ok(usize::from(count))
    }

    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> OutboundResult<()> {
        self.record(OutboundCall::AddRole { guild, user, role });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_init_logging_multiple_calls() {
        // Should not panic when called multiple times
        init_test_logging();
        init_test_logging();
        init_test_logging();
    }

    #[test]
    fn test_mock_timestamp() {
        let timestamp = mock_timestamp(2024, 1, 1, 12, 0, 0);
        assert_eq!(timestamp.year(), 2024);
        assert_eq!(timestamp.month(), 1);
        assert_eq!(timestamp.day(), 1);
        assert_eq!(timestamp.hour(), 12);
    }

    #[tokio::test]
    async fn test_recording_platform_records_failures() {
        let platform = RecordingPlatform::new();
        let channel = discord_fixtures::test_channel_id();
        platform.fail_channel(channel);

        assert!(platform.send_message(channel, "hi").await.is_err());
        assert_eq!(platform.messages_in(channel), vec!["hi".to_string()]);

        let user = discord_fixtures::member_id();
        platform.block_direct_messages(user);
        let err = platform.send_direct_message(user, "psst").await.unwrap_err();
        assert!(err.is_recipient_unreachable());
        assert_eq!(platform.direct_messages_to(user).len(), 1);
    }
}
