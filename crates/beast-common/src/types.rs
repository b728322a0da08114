//! Common type definitions and newtype wrappers for domain modeling.
//!
//! Platform identifiers are 64-bit snowflakes. They are persisted as JSON
//! strings (the form the platform itself uses) but numbers are accepted on
//! input so hand-edited documents still load.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw snowflake value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct IdVisitor;

                impl Visitor<'_> for IdVisitor {
                    type Value = $name;

                    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        write!(f, "a {} id as string or integer", $what)
                    }

                    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                        Ok($name(v))
                    }

                    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                        u64::try_from(v).map($name).map_err(E::custom)
                    }

                    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                        v.parse().map_err(E::custom)
                    }
                }

                deserializer.deserialize_any(IdVisitor)
            }
        }
    };
}

snowflake!(
    /// A guild (server) ID.
    GuildId,
    "guild"
);
snowflake!(
    /// A user ID.
    UserId,
    "user"
);
snowflake!(
    /// A channel or thread ID.
    ChannelId,
    "channel"
);
snowflake!(
    /// A role ID.
    RoleId,
    "role"
);
snowflake!(
    /// A message ID.
    MessageId,
    "message"
);

impl UserId {
    /// Mention markup for this user.
    #[must_use]
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl ChannelId {
    /// Mention markup for this channel.
    #[must_use]
    pub fn mention(self) -> String {
        format!("<#{}>", self.0)
    }
}

impl RoleId {
    /// Mention markup for this role.
    #[must_use]
    pub fn mention(self) -> String {
        format!("<@&{}>", self.0)
    }
}

/// A posted message, addressed by its channel and its own id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    /// Channel the message lives in.
    pub channel: ChannelId,
    /// The message itself.
    pub message: MessageId,
}

/// Partition key for settings, disabled commands, cooldowns and tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// The reserved cross-guild namespace.
    Global,
    /// A single guild.
    Guild(GuildId),
}

impl Scope {
    /// Document key of the global namespace.
    pub const GLOBAL_KEY: &'static str = "_global";

    /// Scope of an invocation: its guild, or global for direct messages.
    #[must_use]
    pub fn of(guild: Option<GuildId>) -> Self {
        guild.map_or(Self::Global, Self::Guild)
    }

    /// The guild, when this is a guild scope.
    #[must_use]
    pub const fn guild(self) -> Option<GuildId> {
        match self {
            Self::Global => None,
            Self::Guild(id) => Some(id),
        }
    }

    /// The key this scope is stored under in the persisted document.
    #[must_use]
    pub fn key(self) -> String {
        match self {
            Self::Global => Self::GLOBAL_KEY.to_string(),
            Self::Guild(id) => id.to_string(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Guild(id) => write!(f, "guild {id}"),
        }
    }
}

/// Guild-level capabilities of the invoking member, as reported by the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// May manage the guild.
    pub manage_guild: bool,
    /// May manage (delete) messages.
    pub manage_messages: bool,
    /// May manage roles.
    pub manage_roles: bool,
    /// Has the administrator permission, which implies all others.
    pub administrator: bool,
}

impl Capabilities {
    /// No capabilities at all.
    pub const NONE: Self = Self {
        manage_guild: false,
        manage_messages: false,
        manage_roles: false,
        administrator: false,
    };

    /// Every capability.
    pub const ALL: Self = Self {
        manage_guild: true,
        manage_messages: true,
        manage_roles: true,
        administrator: true,
    };

    /// Whether the member may manage the guild.
    #[must_use]
    pub const fn can_manage_guild(self) -> bool {
        self.manage_guild || self.administrator
    }

    /// Whether the member may manage messages.
    #[must_use]
    pub const fn can_manage_messages(self) -> bool {
        self.manage_messages || self.administrator
    }

    /// Whether the member may manage roles.
    #[must_use]
    pub const fn can_manage_roles(self) -> bool {
        self.manage_roles || self.administrator
    }
}
