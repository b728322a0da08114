//! Inbound command invocations.

use crate::args::RawArgs;
use beast_common::{Capabilities, ChannelId, GuildId, Scope, UserId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How the command was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationSource {
    /// Application (slash) command.
    Slash,
    /// Text message starting with the configured prefix.
    Prefix,
}

/// The guild an invocation came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildInfo {
    /// Guild id.
    pub id: GuildId,
    /// Display name, used in ticket and welcome texts.
    pub name: String,
}

/// Marker shared by everything that might answer one invocation.
///
/// Exactly one party can [`claim`](Self::claim) it; everyone else must stay
/// silent. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct ResponseSlot(Arc<AtomicBool>);

impl ResponseSlot {
    /// A fresh, unclaimed slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the right to respond. Returns `false` if someone already has it.
    #[must_use]
    pub fn claim(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether the slot was claimed.
    #[must_use]
    pub fn is_claimed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One command invocation as received from the platform.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Command name as typed; normalized by the router.
    pub name: String,
    /// Subcommand for slash invocations. Prefix invocations carry it as the
    /// first token.
    pub subcommand: Option<String>,
    /// Unvalidated arguments.
    pub args: RawArgs,
    /// Invoking user.
    pub user: UserId,
    /// Invoking user's display name.
    pub user_name: String,
    /// Guild, when not in a direct message.
    pub guild: Option<GuildInfo>,
    /// Channel the invocation was issued in.
    pub channel: ChannelId,
    /// The invoking member's permissions in that channel.
    pub capabilities: Capabilities,
    /// Slash or prefix.
    pub source: InvocationSource,
    /// Shared single-response marker.
    pub slot: ResponseSlot,
}

impl Invocation {
    /// A slash invocation with no guild, no arguments and no permissions.
    #[must_use]
    pub fn slash(name: impl Into<String>, user: UserId, channel: ChannelId) -> Self {
        Self {
            name: name.into(),
            subcommand: None,
            args: RawArgs::default(),
            user,
            user_name: user.to_string(),
            guild: None,
            channel,
            capabilities: Capabilities::NONE,
            source: InvocationSource::Slash,
            slot: ResponseSlot::new(),
        }
    }

    /// Parse a prefixed chat message such as `!ping` or `!owner list`.
    ///
    /// Returns `None` when `content` does not start with `prefix` or no
    /// command name follows it.
    #[must_use]
    pub fn from_message(
        prefix: &str,
        content: &str,
        user: UserId,
        channel: ChannelId,
    ) -> Option<Self> {
        if prefix.is_empty() {
            return None;
        }
        let rest = content.trim_start().strip_prefix(prefix)?;
        let mut tokens = rest.split_whitespace();
        let name = tokens.next()?.to_string();
        let mut invocation = Self::slash(name, user, channel);
        invocation.source = InvocationSource::Prefix;
        invocation.args = RawArgs::Positional(tokens.map(str::to_string).collect());
        Some(invocation)
    }

    /// Set the guild.
    #[must_use]
    pub fn in_guild(mut self, id: GuildId, name: impl Into<String>) -> Self {
        self.guild = Some(GuildInfo {
            id,
            name: name.into(),
        });
        self
    }

    /// Set the subcommand.
    #[must_use]
    pub fn with_subcommand(mut self, subcommand: impl Into<String>) -> Self {
        self.subcommand = Some(subcommand.into());
        self
    }

    /// Set the arguments.
    #[must_use]
    pub fn with_args(mut self, args: RawArgs) -> Self {
        self.args = args;
        self
    }

    /// Set the member permissions.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the display name.
    #[must_use]
    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = name.into();
        self
    }

    /// Guild scope of the invocation, or global in direct messages.
    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope::of(self.guild.as_ref().map(|g| g.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_claims_once_across_clones() {
        let slot = ResponseSlot::new();
        let other = slot.clone();
        assert!(!other.is_claimed());
        assert!(slot.claim());
        assert!(!other.claim());
        assert!(other.is_claimed());
    }

    #[test]
    fn test_from_message() {
        let inv = Invocation::from_message("!", "!owner  list extra", UserId(1), ChannelId(2)).unwrap();
        assert_eq!(inv.name, "owner");
        assert_eq!(inv.source, InvocationSource::Prefix);
        assert_eq!(
            inv.args,
            RawArgs::Positional(vec!["list".into(), "extra".into()])
        );

        assert!(Invocation::from_message("!", "ping", UserId(1), ChannelId(2)).is_none());
        assert!(Invocation::from_message("!", "! ", UserId(1), ChannelId(2)).is_none());
        assert!(Invocation::from_message("", "ping", UserId(1), ChannelId(2)).is_none());
    }

    #[test]
    fn test_scope() {
        let inv = Invocation::slash("ping", UserId(1), ChannelId(2));
        assert_eq!(inv.scope(), Scope::Global);
        let inv = inv.in_guild(GuildId(3), "Den");
        assert_eq!(inv.scope(), Scope::Guild(GuildId(3)));
    }
}
