//! The persisted guild document.
//!
//! The file is a JSON object keyed by guild id plus the reserved `_global`
//! namespace and the legacy top-level `ownerId` / `owners` entries. Every
//! record keeps the fields it does not know about in an `extra` map. Records
//! are decoded field by field: a malformed field or list element is dropped
//! with a warning and the rest of the record stays in force. Top-level
//! entries that are not records at all are carried verbatim.

use beast_common::{
    normalize_command_list, ChannelId, GuildId, RoleId, Scope, UserId,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

const OWNER_ID_KEY: &str = "ownerId";
const OWNERS_KEY: &str = "owners";
const SENT_KEY: &str = "sent";

/// Extra fields a record does not model.
pub type ExtraFields = Map<String, Value>;

/// Ticket ledger of one scope, keyed by ticket number.
pub type TicketMap = BTreeMap<u64, TicketRecord>;

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(value: &u64) -> bool {
    *value == 0
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

/// The whole persisted store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    /// Legacy single owner.
    pub owner_id: Option<UserId>,
    /// Legacy top-level owner list.
    pub owners: Vec<UserId>,
    /// The `_global` namespace.
    pub global: GlobalRecord,
    /// Per-guild records, created lazily on first write.
    pub guilds: BTreeMap<GuildId, GuildRecord>,
    /// Top-level entries that could not be decoded, written back unchanged.
    pub unknown: Map<String, Value>,
}

/// Settings of one guild.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct GuildRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_channel_id: Option<ChannelId>,
    /// Template with `{user}` and `{server}` placeholders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,
    /// Role granted to every joining member.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autorole_id: Option<RoleId>,
    /// Target of broadcasts and announcements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announce_channel_id: Option<ChannelId>,
    /// Channel under which ticket threads are opened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_channel_id: Option<ChannelId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Normalized names of commands disabled in this guild.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disabled_commands: Vec<String>,
    /// Prefix entertainment commands; absent means enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entertainment_enabled: Option<bool>,
    #[serde(skip_serializing_if = "is_zero")]
    pub ticket_counter: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tickets: TicketMap,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub watches: Vec<WatchRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitch_client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitch_client_secret: Option<String>,
    /// Combined `id:secret` Twitch credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitch_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevenlabs_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevenlabs_voice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiktok_key: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// The `_global` namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct GlobalRecord {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<UserId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub team: Vec<UserId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disabled_commands: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub owner_only: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub team_only: bool,
    /// Message prefix; prefix commands are off while unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub schedules: Vec<ScheduledAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_schedule_id: Option<u64>,
    /// Guild holding the global support channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<GuildId>,
    /// The global support channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<ChannelId>,
    #[serde(skip_serializing_if = "is_zero")]
    pub ticket_counter: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tickets: TicketMap,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub watches: Vec<WatchRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitch_client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitch_client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitch_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevenlabs_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevenlabs_voice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiktok_key: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// What a scheduled action does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    /// Post into every guild's announcement channel.
    #[serde(alias = "announce")]
    Broadcast,
    /// Send privately to the target user.
    #[serde(alias = "dm")]
    DirectMessage,
}

/// A persisted, time-deferred send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ScheduledAction {
    pub id: u64,
    #[serde(alias = "type")]
    pub kind: ActionKind,
    #[serde(alias = "time", with = "chrono::serde::ts_milliseconds")]
    pub due_at: DateTime<Utc>,
    #[serde(alias = "message")]
    pub payload: String,
    #[serde(default, alias = "targetId", skip_serializing_if = "Option::is_none")]
    pub target: Option<UserId>,
    pub created_by: UserId,
    /// Channel used when a direct message is refused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_channel_id: Option<ChannelId>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ScheduledAction {
    /// Whether the action fires at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }

    /// Whether a legacy document marked the action as already delivered.
    #[must_use]
    pub fn was_sent(&self) -> bool {
        self.extra.get(SENT_KEY).and_then(Value::as_bool) == Some(true)
    }
}

/// Lifecycle of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum TicketStatus {
    #[default]
    Open,
    Closed,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// A numbered support or application ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct TicketRecord {
    /// Thread the conversation happens in; unset until it was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<ChannelId>,
    pub creator_id: UserId,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub subject: String,
    /// Guild the ticket was opened from, recorded for global tickets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_guild_id: Option<GuildId>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// A live-status subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct WatchRecord {
    pub service: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<ChannelId>,
    pub created_by: UserId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Provider credential slots shared by guild and global records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    /// Image generation key.
    OpenAi,
    /// Video lookup key.
    YouTube,
    /// Twitch application id.
    TwitchClientId,
    /// Twitch application secret.
    TwitchClientSecret,
    /// Combined `id:secret` Twitch credential.
    TwitchKey,
    /// Speech synthesis key.
    ElevenLabs,
    /// Speech synthesis voice.
    ElevenLabsVoice,
    /// Instagram lookup key.
    Instagram,
    /// TikTok lookup key.
    TikTok,
}

impl CredentialField {
    /// Every slot, in display order.
    pub const ALL: [Self; 9] = [
        Self::OpenAi,
        Self::YouTube,
        Self::TwitchClientId,
        Self::TwitchClientSecret,
        Self::TwitchKey,
        Self::ElevenLabs,
        Self::ElevenLabsVoice,
        Self::Instagram,
        Self::TikTok,
    ];

    /// Stored field name.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::OpenAi => "openaiKey",
            Self::YouTube => "youtubeKey",
            Self::TwitchClientId => "twitchClientId",
            Self::TwitchClientSecret => "twitchClientSecret",
            Self::TwitchKey => "twitchKey",
            Self::ElevenLabs => "elevenlabsKey",
            Self::ElevenLabsVoice => "elevenlabsVoiceId",
            Self::Instagram => "instagramKey",
            Self::TikTok => "tiktokKey",
        }
    }
}

macro_rules! credential_slots {
    ($record:ty) => {
        impl $record {
            /// Stored value of a credential slot.
            #[must_use]
            pub fn credential(&self, field: CredentialField) -> Option<&str> {
                match field {
                    CredentialField::OpenAi => self.openai_key.as_deref(),
                    CredentialField::YouTube => self.youtube_key.as_deref(),
                    CredentialField::TwitchClientId => self.twitch_client_id.as_deref(),
                    CredentialField::TwitchClientSecret => self.twitch_client_secret.as_deref(),
                    CredentialField::TwitchKey => self.twitch_key.as_deref(),
                    CredentialField::ElevenLabs => self.elevenlabs_key.as_deref(),
                    CredentialField::ElevenLabsVoice => self.elevenlabs_voice_id.as_deref(),
                    CredentialField::Instagram => self.instagram_key.as_deref(),
                    CredentialField::TikTok => self.tiktok_key.as_deref(),
                }
            }

            /// Mutable access to a credential slot.
            pub fn credential_mut(&mut self, field: CredentialField) -> &mut Option<String> {
                match field {
                    CredentialField::OpenAi => &mut self.openai_key,
                    CredentialField::YouTube => &mut self.youtube_key,
                    CredentialField::TwitchClientId => &mut self.twitch_client_id,
                    CredentialField::TwitchClientSecret => &mut self.twitch_client_secret,
                    CredentialField::TwitchKey => &mut self.twitch_key,
                    CredentialField::ElevenLabs => &mut self.elevenlabs_key,
                    CredentialField::ElevenLabsVoice => &mut self.elevenlabs_voice_id,
                    CredentialField::Instagram => &mut self.instagram_key,
                    CredentialField::TikTok => &mut self.tiktok_key,
                }
            }
        }
    };
}

credential_slots!(GuildRecord);
credential_slots!(GlobalRecord);

impl GlobalRecord {
    /// Hand out the next schedule id. Ids start at 1 and never repeat, even
    /// when a legacy document lacks the counter but already holds actions.
    pub fn allocate_schedule_id(&mut self) -> u64 {
        let floor = self.schedules.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        let id = self.next_schedule_id.unwrap_or(1).max(floor);
        self.next_schedule_id = Some(id + 1);
        id
    }

    /// Whether the global support channel is fully configured.
    #[must_use]
    pub const fn support_target(&self) -> Option<(GuildId, ChannelId)> {
        match (self.guild_id, self.channel_id) {
            (Some(guild), Some(channel)) => Some((guild, channel)),
            _ => None,
        }
    }
}

impl ConfigDocument {
    /// Decode a document from its JSON text.
    ///
    /// # Errors
    ///
    /// Fails only when the text is not JSON at all. Malformed fields inside a
    /// valid object are dropped with a warning.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(value))
    }

    /// Decode a document from a JSON value; never fails.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let mut doc = Self::default();
        let Value::Object(entries) = value else {
            warn!("Configuration document is not a JSON object; starting empty");
            return doc;
        };

        for (key, raw) in entries {
            let kept = match key.as_str() {
                OWNER_ID_KEY => match UserId::deserialize(&raw) {
                    Ok(id) => {
                        doc.owner_id = Some(id);
                        None
                    }
                    Err(err) => {
                        warn!(key = %key, error = %err, "Keeping undecodable owner id verbatim");
                        Some(raw)
                    }
                },
                OWNERS_KEY => {
                    doc.owners = decode_list(&key, raw);
                    None
                }
                Scope::GLOBAL_KEY => decode_record::<GlobalRecord>(&key, raw)
                    .map(|mut global| {
                        drop_sent_schedules(&mut global);
                        doc.global = global;
                    })
                    .err(),
                _ => match key.parse::<GuildId>() {
                    Ok(guild) => decode_record::<GuildRecord>(&key, raw)
                        .map(|record| {
                            doc.guilds.insert(guild, record);
                        })
                        .err(),
                    Err(_) => Some(raw),
                },
            };
            if let Some(raw) = kept {
                doc.unknown.insert(key, raw);
            }
        }
        doc
    }

    /// Encode the document back into a JSON value. Typed sections always
    /// win over a verbatim entry stored under the same key.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut out = self.unknown.clone();
        if let Some(owner) = self.owner_id {
            out.insert(OWNER_ID_KEY.to_string(), Value::String(owner.to_string()));
        }
        if !self.owners.is_empty() {
            out.insert(OWNERS_KEY.to_string(), encode(&self.owners));
        }
        if self.global != GlobalRecord::default() || !out.contains_key(Scope::GLOBAL_KEY) {
            out.insert(Scope::GLOBAL_KEY.to_string(), encode(&self.global));
        }
        for (guild, record) in &self.guilds {
            out.insert(guild.to_string(), encode(record));
        }
        Value::Object(out)
    }

    /// Pretty JSON text of the document.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_value())
    }

    /// A guild's record, if it has one.
    #[must_use]
    pub fn guild(&self, guild: GuildId) -> Option<&GuildRecord> {
        self.guilds.get(&guild)
    }

    /// A guild's record, created on first access.
    pub fn guild_mut(&mut self, guild: GuildId) -> &mut GuildRecord {
        self.guilds.entry(guild).or_default()
    }

    /// Owners recorded in the document: `ownerId`, `owners` and
    /// `_global.owners`, without duplicates.
    #[must_use]
    pub fn document_owners(&self) -> Vec<UserId> {
        let mut owners: Vec<UserId> = Vec::new();
        for id in self
            .owner_id
            .iter()
            .chain(&self.owners)
            .chain(&self.global.owners)
        {
            if !owners.contains(id) {
                owners.push(*id);
            }
        }
        owners
    }

    /// Disabled commands of a scope.
    #[must_use]
    pub fn disabled_commands(&self, scope: Scope) -> &[String] {
        match scope {
            Scope::Global => &self.global.disabled_commands,
            Scope::Guild(id) => self
                .guild(id)
                .map_or(&[][..], |record| record.disabled_commands.as_slice()),
        }
    }

    /// Mutable disabled list of a scope.
    pub fn disabled_commands_mut(&mut self, scope: Scope) -> &mut Vec<String> {
        match scope {
            Scope::Global => &mut self.global.disabled_commands,
            Scope::Guild(id) => &mut self.guild_mut(id).disabled_commands,
        }
    }

    /// Tickets of a scope.
    #[must_use]
    pub fn tickets(&self, scope: Scope) -> Option<&TicketMap> {
        match scope {
            Scope::Global => Some(&self.global.tickets),
            Scope::Guild(id) => self.guild(id).map(|record| &record.tickets),
        }
    }

    /// Counter and tickets of a scope, for opening a new ticket.
    pub fn ticket_book_mut(&mut self, scope: Scope) -> (&mut u64, &mut TicketMap) {
        match scope {
            Scope::Global => (&mut self.global.ticket_counter, &mut self.global.tickets),
            Scope::Guild(id) => {
                let record = self.guild_mut(id);
                (&mut record.ticket_counter, &mut record.tickets)
            }
        }
    }

    /// Watches of a scope.
    pub fn watches_mut(&mut self, scope: Scope) -> &mut Vec<WatchRecord> {
        match scope {
            Scope::Global => &mut self.global.watches,
            Scope::Guild(id) => &mut self.guild_mut(id).watches,
        }
    }

    /// Guilds with an announcement channel, in id order.
    #[must_use]
    pub fn announce_channels(&self) -> Vec<(GuildId, ChannelId)> {
        self.guilds
            .iter()
            .filter_map(|(guild, record)| record.announce_channel_id.map(|ch| (*guild, ch)))
            .collect()
    }

    /// Normalize every disabled list in every scope.
    pub fn normalize(&mut self) {
        normalize_command_list(&mut self.global.disabled_commands);
        for record in self.guilds.values_mut() {
            normalize_command_list(&mut record.disabled_commands);
        }
    }
}

/// Decode a record, dropping the fields and list elements that do not fit.
///
/// Only a value that is not an object is handed back for verbatim storage.
fn decode_record<T: DeserializeOwned>(key: &str, raw: Value) -> Result<T, Value> {
    if let Ok(record) = T::deserialize(&raw) {
        return Ok(record);
    }
    let fields = match raw {
        Value::Object(fields) => fields,
        other => {
            warn!(key, "Keeping non-object configuration entry verbatim");
            return Err(other);
        }
    };

    let mut kept = Map::new();
    for (field, value) in fields {
        if let Some(value) = salvage_field::<T>(key, &field, value) {
            kept.insert(field, value);
        }
    }
    let kept = Value::Object(kept);
    match T::deserialize(&kept) {
        Ok(record) => Ok(record),
        Err(err) => {
            warn!(key, error = %err, "Keeping undecodable configuration entry verbatim");
            Err(kept)
        }
    }
}

/// Whether `T` accepts an object holding only `field: value`.
fn field_fits<T: DeserializeOwned>(field: &str, value: Value) -> bool {
    let mut single = Map::new();
    single.insert(field.to_string(), value);
    T::deserialize(&Value::Object(single)).is_ok()
}

fn salvage_field<T: DeserializeOwned>(key: &str, field: &str, value: Value) -> Option<Value> {
    if field_fits::<T>(field, value.clone()) {
        return Some(value);
    }
    let salvaged = match value {
        Value::Array(items) => {
            let total = items.len();
            let items: Vec<Value> = items
                .into_iter()
                .filter(|item| field_fits::<T>(field, Value::Array(vec![item.clone()])))
                .collect();
            warn!(key, field, dropped = total - items.len(), "Dropping malformed list entries");
            Value::Array(items)
        }
        Value::Object(entries) => {
            let total = entries.len();
            let entries: Map<String, Value> = entries
                .into_iter()
                .filter(|(name, item)| {
                    let mut single = Map::new();
                    single.insert(name.clone(), item.clone());
                    field_fits::<T>(field, Value::Object(single))
                })
                .collect();
            warn!(key, field, dropped = total - entries.len(), "Dropping malformed map entries");
            Value::Object(entries)
        }
        _ => {
            warn!(key, field, "Dropping malformed configuration field");
            return None;
        }
    };
    if field_fits::<T>(field, salvaged.clone()) {
        Some(salvaged)
    } else {
        warn!(key, field, "Dropping malformed configuration field");
        None
    }
}

/// Decode a list element by element, skipping the ones that do not fit.
fn decode_list<T: DeserializeOwned>(key: &str, raw: Value) -> Vec<T> {
    let items = match raw {
        Value::Array(items) => items,
        other => vec![other],
    };
    items
        .into_iter()
        .filter_map(|item| match T::deserialize(&item) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "Dropping malformed list entry");
                None
            }
        })
        .collect()
}

fn drop_sent_schedules(global: &mut GlobalRecord) {
    let before = global.schedules.len();
    global.schedules.retain(|action| !action.was_sent());
    let dropped = before - global.schedules.len();
    if dropped > 0 {
        warn!(dropped, "Dropping scheduled actions already marked as sent");
    }
}

fn encode<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|err| {
        warn!(error = %err, "Failed to encode configuration record");
        Value::Null
    })
}
