//! [`Platform`] on top of the Serenity HTTP client.

use async_trait::async_trait;
use beast_common::{
    ChannelId, GuildId, MessageId, MessageRef, OutboundError, OutboundResult, Platform, RoleId,
    UserId, RECIPIENT_UNREACHABLE_CODE,
};
use chrono::{DateTime, Utc};
use serenity::builder::{CreateMessage, CreateThread, EditMember, EditMessage, EditThread, GetMessages};
use serenity::http::{Http, HttpError};
use serenity::model::channel::ChannelType;
use serenity::model::id as wire;
use serenity::model::Timestamp;
use std::sync::Arc;
use tracing::debug;

/// Outbound calls against the Discord REST API.
#[derive(Clone)]
pub struct SerenityPlatform {
    http: Arc<Http>,
}

impl std::fmt::Debug for SerenityPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerenityPlatform").finish_non_exhaustive()
    }
}

impl SerenityPlatform {
    /// Wrap the client's HTTP handle.
    #[must_use]
    pub const fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

/// Map a rejected request onto [`OutboundError`].
///
/// `recipient` is set for direct messages so that the "cannot send messages
/// to this user" code can name the user.
#[must_use]
pub fn classify_response(
    status: u16,
    code: isize,
    message: &str,
    recipient: Option<UserId>,
) -> OutboundError {
    match (code, recipient) {
        (RECIPIENT_UNREACHABLE_CODE, Some(user)) => OutboundError::RecipientUnreachable(user),
        _ => match status {
            403 => OutboundError::Forbidden(message.to_string()),
            404 => OutboundError::NotFound(message.to_string()),
            _ => OutboundError::Request(format!("{status} ({code}): {message}")),
        },
    }
}

fn classify(err: &serenity::Error, recipient: Option<UserId>) -> OutboundError {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = err {
        return classify_response(
            response.status_code.as_u16(),
            response.error.code,
            &response.error.message,
            recipient,
        );
    }
    OutboundError::Request(err.to_string())
}

fn channel_id(id: ChannelId) -> wire::ChannelId {
    wire::ChannelId::new(id.get())
}

fn guild_id(id: GuildId) -> wire::GuildId {
    wire::GuildId::new(id.get())
}

fn user_id(id: UserId) -> wire::UserId {
    wire::UserId::new(id.get())
}

fn message_ref(message: &serenity::model::channel::Message) -> MessageRef {
    MessageRef {
        channel: ChannelId(message.channel_id.get()),
        message: MessageId(message.id.get()),
    }
}

#[async_trait]
impl Platform for SerenityPlatform {
    async fn send_message(&self, channel: ChannelId, content: &str) -> OutboundResult<MessageRef> {
        channel_id(channel)
            .say(self.http.as_ref(), content)
            .await
            .map(|message| message_ref(&message))
            .map_err(|err| classify(&err, None))
    }

    async fn edit_message(&self, message: MessageRef, content: &str) -> OutboundResult<()> {
        channel_id(message.channel)
            .edit_message(
                self.http.as_ref(),
                wire::MessageId::new(message.message.get()),
                EditMessage::new().content(content),
            )
            .await
            .map(|_| ())
            .map_err(|err| classify(&err, None))
    }

    async fn send_direct_message(
        &self,
        user: UserId,
        content: &str,
    ) -> OutboundResult<MessageRef> {
        user_id(user)
            .direct_message(self.http.as_ref(), CreateMessage::new().content(content))
            .await
            .map(|message| message_ref(&message))
            .map_err(|err| classify(&err, Some(user)))
    }

    async fn create_thread(&self, channel: ChannelId, name: &str) -> OutboundResult<ChannelId> {
        let builder = CreateThread::new(name).kind(ChannelType::PublicThread);
        channel_id(channel)
            .create_thread(self.http.as_ref(), builder)
            .await
            .map(|thread| ChannelId(thread.id.get()))
            .map_err(|err| classify(&err, None))
    }

    async fn archive_thread(&self, thread: ChannelId) -> OutboundResult<()> {
        channel_id(thread)
            .edit_thread(self.http.as_ref(), EditThread::new().archived(true))
            .await
            .map(|_| ())
            .map_err(|err| classify(&err, None))
    }

    async fn kick_member(&self, guild: GuildId, user: UserId, reason: &str) -> OutboundResult<()> {
        guild_id(guild)
            .kick_with_reason(self.http.as_ref(), user_id(user), reason)
            .await
            .map_err(|err| classify(&err, None))
    }

    async fn ban_member(&self, guild: GuildId, user: UserId, reason: &str) -> OutboundResult<()> {
        guild_id(guild)
            .ban_with_reason(self.http.as_ref(), user_id(user), 0, reason)
            .await
            .map_err(|err| classify(&err, None))
    }

    async fn set_member_timeout(
        &self,
        guild: GuildId,
        user: UserId,
        until: Option<DateTime<Utc>>,
    ) -> OutboundResult<()> {
        let edit = match until {
            Some(until) => {
                let timestamp = Timestamp::from_unix_timestamp(until.timestamp())
                    .map_err(|err| OutboundError::Request(err.to_string()))?;
                EditMember::new().disable_communication_until_datetime(timestamp)
            }
            None => EditMember::new().enable_communication(),
        };
        guild_id(guild)
            .edit_member(self.http.as_ref(), user_id(user), edit)
            .await
            .map(|_| ())
            .map_err(|err| classify(&err, None))
    }

    async fn purge_messages(&self, channel: ChannelId, count: u8) -> OutboundResult<usize> {
        let target = channel_id(channel);
        let messages = target
            .messages(self.http.as_ref(), GetMessages::new().limit(count))
            .await
            .map_err(|err| classify(&err, None))?;
        let ids: Vec<wire::MessageId> = messages.iter().map(|message| message.id).collect();
        debug!(%channel, found = ids.len(), "Purging messages");

        match ids.as_slice() {
            [] => Ok(0),
            [single] => target
                .delete_message(self.http.as_ref(), *single)
                .await
                .map(|()| 1)
                .map_err(|err| classify(&err, None)),
            _ => target
                .delete_messages(self.http.as_ref(), &ids)
                .await
                .map(|()| ids.len())
                .map_err(|err| classify(&err, None)),
        }
    }

    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> OutboundResult<()> {
        self.http
            .add_member_role(
                guild_id(guild),
                user_id(user),
                wire::RoleId::new(role.get()),
                None,
            )
            .await
            .map_err(|err| classify(&err, None))
    }
}
