//! Provider credentials and live-status watches.
//!
//! Credentials are stored per guild, or globally when an owner asks for it.
//! Values from the environment always win over stored ones.

use crate::definition::{CommandDefinition, OptionDefinition, Requirement};
use crate::framework::CommandContext;
use crate::reply::Reply;
use crate::router::{Call, Command};
use async_trait::async_trait;
use beast_common::{BotError, Scope};
use beast_config::{ConfigDocument, CredentialField, ExtraFields, ProviderCredentials, WatchRecord};
use chrono::Utc;
use tracing::info;

/// Services a watch can follow.
pub const WATCH_SERVICES: &[&str] = &["twitch", "youtube", "tiktok", "instagram"];

fn provider_setting(name: &'static str, description: &'static str) -> CommandDefinition {
    CommandDefinition::new(name, description)
        .guild_only()
        .requires(Requirement::ManageGuild)
}

fn global_flag() -> OptionDefinition {
    OptionDefinition::boolean("global", "Als global speichern (nur Bot-Owner)")
}

/// Where a credential write goes, after checking that global writes come
/// from an owner.
fn target_scope(ctx: &CommandContext, call: &Call) -> Result<Scope, BotError> {
    if call.args.boolean("global").unwrap_or(false) {
        if !call.auth.is_owner {
            return Err(BotError::permission(
                ctx.tr("providers-global-owner-only", &[]),
            ));
        }
        return Ok(Scope::Global);
    }
    Ok(Scope::Guild(call.guild_id()?))
}

async fn store_credentials(
    ctx: &CommandContext,
    scope: Scope,
    values: Vec<(CredentialField, String)>,
) -> Result<(), BotError> {
    let fields: Vec<&'static str> = values.iter().map(|(field, _)| field.key()).collect();
    ctx.store
        .update(move |doc| {
            for (field, value) in values {
                let slot = match scope {
                    Scope::Global => doc.global.credential_mut(field),
                    Scope::Guild(id) => doc.guild_mut(id).credential_mut(field),
                };
                *slot = Some(value);
            }
        })
        .await?;
    info!(%scope, ?fields, "Provider credentials stored");
    Ok(())
}

fn saved_reply(ctx: &CommandContext, provider: &str, scope: Scope) -> Reply {
    let key = if scope == Scope::Global {
        "providers-saved-global"
    } else {
        "providers-saved"
    };
    Reply::private(ctx.tr(key, &[("provider", provider.to_string())]))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `/set-openai key`
pub struct SetOpenAi;

#[async_trait]
impl Command for SetOpenAi {
    fn definition(&self) -> CommandDefinition {
        provider_setting("set-openai", "Setzt den OpenAI API-Key (Admin)")
            .option(OptionDefinition::string("key", "OpenAI API Key").required())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let scope = Scope::Guild(call.guild_id()?);
        let key = call.args.required_string("key")?.trim().to_string();
        store_credentials(ctx, scope, vec![(CredentialField::OpenAi, key)]).await?;
        Ok(saved_reply(ctx, "OpenAI", scope))
    }
}

/// `/set-youtube key [global]`
pub struct SetYouTube;

#[async_trait]
impl Command for SetYouTube {
    fn definition(&self) -> CommandDefinition {
        provider_setting("set-youtube", "Setzt den YouTube API-Key für den Server (Admin)")
            .option(OptionDefinition::string("key", "YouTube API Key").required())
            .option(global_flag())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let scope = target_scope(ctx, call)?;
        let key = call.args.required_string("key")?.trim().to_string();
        store_credentials(ctx, scope, vec![(CredentialField::YouTube, key)]).await?;
        Ok(saved_reply(ctx, "YouTube", scope))
    }
}

/// Split a combined `id:secret` Twitch key. A key without a colon is a
/// legacy single key.
#[must_use]
pub fn split_twitch_key(key: &str) -> Vec<(CredentialField, String)> {
    match key.split_once(':') {
        Some((id, secret)) => {
            let mut values = vec![(CredentialField::TwitchClientId, id.to_string())];
            if !secret.is_empty() {
                values.push((CredentialField::TwitchClientSecret, secret.to_string()));
            }
            values
        }
        None => vec![(CredentialField::TwitchKey, key.to_string())],
    }
}

/// `/set-twitch [client_id] [client_secret] [key] [global]`
pub struct SetTwitch;

#[async_trait]
impl Command for SetTwitch {
    fn definition(&self) -> CommandDefinition {
        provider_setting(
            "set-twitch",
            "Setzt den Twitch API-Key oder Client-Credentials für den Server (Admin)",
        )
        .option(OptionDefinition::string("client_id", "Twitch Client ID"))
        .option(OptionDefinition::string("client_secret", "Twitch Client Secret"))
        .option(OptionDefinition::string("key", "Twitch API Key oder clientId:clientSecret"))
        .option(global_flag())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let client_id = non_empty(call.args.string("client_id"));
        let client_secret = non_empty(call.args.string("client_secret"));
        let key = non_empty(call.args.string("key"));

        let values = if client_id.is_some() || client_secret.is_some() {
            client_id
                .map(|v| (CredentialField::TwitchClientId, v))
                .into_iter()
                .chain(client_secret.map(|v| (CredentialField::TwitchClientSecret, v)))
                .collect()
        } else if let Some(key) = key {
            split_twitch_key(&key)
        } else {
            return Err(BotError::validation(ctx.tr("providers-twitch-missing", &[])));
        };

        let scope = target_scope(ctx, call)?;
        store_credentials(ctx, scope, values).await?;
        Ok(saved_reply(ctx, "Twitch", scope))
    }
}

/// `/set-elevenlabs [key] [voice_id] [global]`
pub struct SetElevenLabs;

#[async_trait]
impl Command for SetElevenLabs {
    fn definition(&self) -> CommandDefinition {
        provider_setting(
            "set-elevenlabs",
            "Setzt ElevenLabs API-Key und optional Voice-ID (Admin)",
        )
        .option(OptionDefinition::string("key", "ElevenLabs API Key"))
        .option(OptionDefinition::string("voice_id", "Voice ID"))
        .option(global_flag())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let values: Vec<_> = non_empty(call.args.string("key"))
            .map(|v| (CredentialField::ElevenLabs, v))
            .into_iter()
            .chain(non_empty(call.args.string("voice_id")).map(|v| (CredentialField::ElevenLabsVoice, v)))
            .collect();
        if values.is_empty() {
            return Err(BotError::validation(
                ctx.tr("providers-elevenlabs-missing", &[]),
            ));
        }
        let scope = target_scope(ctx, call)?;
        store_credentials(ctx, scope, values).await?;
        Ok(saved_reply(ctx, "ElevenLabs", scope))
    }
}

/// Where a provider credential comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Process environment.
    Environment,
    /// This guild's record.
    Guild,
    /// The global namespace.
    Global,
    /// Nowhere.
    Missing,
}

impl CredentialSource {
    const fn message_key(self) -> &'static str {
        match self {
            Self::Environment => "providers-source-env",
            Self::Guild => "providers-source-guild",
            Self::Global => "providers-source-global",
            Self::Missing => "providers-source-missing",
        }
    }
}

/// Resolve a provider credential: environment, then guild, then global.
/// Any of `fields` being set counts.
#[must_use]
pub fn credential_source(
    env: Option<&String>,
    doc: &ConfigDocument,
    scope: Scope,
    fields: &[CredentialField],
) -> CredentialSource {
    if env.is_some() {
        return CredentialSource::Environment;
    }
    let guild = scope.guild().and_then(|id| doc.guild(id));
    if guild.is_some_and(|record| fields.iter().any(|f| record.credential(*f).is_some())) {
        return CredentialSource::Guild;
    }
    if fields.iter().any(|f| doc.global.credential(*f).is_some()) {
        return CredentialSource::Global;
    }
    CredentialSource::Missing
}

const TWITCH_FIELDS: &[CredentialField] = &[
    CredentialField::TwitchClientId,
    CredentialField::TwitchClientSecret,
    CredentialField::TwitchKey,
];

/// Provider label, environment value and stored slots, in display order.
fn provider_rows(
    env: &ProviderCredentials,
) -> Vec<(&'static str, Option<&String>, &'static [CredentialField])> {
    vec![
        ("OpenAI", env.openai_key.as_ref(), std::slice::from_ref(&CredentialField::OpenAi)),
        ("Twitch", env.twitch_client_id.as_ref(), TWITCH_FIELDS),
        ("YouTube", env.youtube_key.as_ref(), std::slice::from_ref(&CredentialField::YouTube)),
        ("ElevenLabs", env.elevenlabs_key.as_ref(), std::slice::from_ref(&CredentialField::ElevenLabs)),
        ("Instagram", env.instagram_key.as_ref(), std::slice::from_ref(&CredentialField::Instagram)),
        ("TikTok", env.tiktok_key.as_ref(), std::slice::from_ref(&CredentialField::TikTok)),
    ]
}

/// `/token-status`: which credentials are configured, and where.
pub struct TokenStatus;

#[async_trait]
impl Command for TokenStatus {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new(
            "token-status",
            "Zeigt welche API-Keys / Tokens für diesen Server gespeichert sind",
        )
        .guild_only()
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let doc = ctx.store.snapshot();
        let scope = call.scope();
        let mut lines = vec![ctx.tr("providers-status-header", &[])];
        for (provider, env, fields) in provider_rows(&ctx.settings.providers) {
            let source = credential_source(env, &doc, scope, fields);
            lines.push(ctx.tr(
                "providers-status-line",
                &[
                    ("provider", provider.to_string()),
                    ("state", ctx.tr(source.message_key(), &[])),
                ],
            ));
        }
        Ok(Reply::private(lines.join("\n")))
    }
}

/// `/watch service username [channel] [global]`: store a live-status
/// subscription. Notifications are sent by a separate poller.
pub struct Watch;

#[async_trait]
impl Command for Watch {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new(
            "watch",
            "Überwacht einen Streamer auf einem Service (Twitch/YouTube/TikTok/Instagram)",
        )
        .guild_only()
        .requires(Requirement::ManageGuild)
        .option(OptionDefinition::choice("service", "Service", WATCH_SERVICES).required())
        .option(OptionDefinition::string("username", "Streamer Username").required())
        .option(OptionDefinition::channel("channel", "Channel zur Benachrichtigung"))
        .option(OptionDefinition::boolean("global", "Als globales Watch speichern"))
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let guild = call.guild_id()?;
        let service = call.args.required_string("service")?.to_string();
        let username = call.args.required_string("username")?.trim().to_string();
        let global = call.args.boolean("global").unwrap_or(false);

        let (scope, channel) = if global {
            (Scope::Global, None)
        } else {
            (
                Scope::Guild(guild),
                Some(call.args.channel("channel").unwrap_or(call.channel)),
            )
        };
        let record = WatchRecord {
            service: service.clone(),
            username: username.clone(),
            channel_id: channel,
            created_by: call.user,
            created_at: Utc::now(),
            extra: ExtraFields::new(),
        };
        ctx.store
            .update(move |doc| doc.watches_mut(scope).push(record))
            .await?;
        info!(%scope, %service, %username, "Watch stored");

        let reply = match channel {
            Some(channel) => ctx.tr(
                "watch-saved",
                &[
                    ("service", service),
                    ("username", username),
                    ("channel", channel.mention()),
                ],
            ),
            None => ctx.tr(
                "watch-saved-global",
                &[("service", service), ("username", username)],
            ),
        };
        Ok(Reply::private(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beast_common::test_utils::discord_fixtures::guild_a;

    #[test]
    fn test_split_twitch_key() {
        assert_eq!(
            split_twitch_key("abc:def"),
            vec![
                (CredentialField::TwitchClientId, "abc".to_string()),
                (CredentialField::TwitchClientSecret, "def".to_string()),
            ]
        );
        assert_eq!(
            split_twitch_key("abc:"),
            vec![(CredentialField::TwitchClientId, "abc".to_string())]
        );
        assert_eq!(
            split_twitch_key("legacy"),
            vec![(CredentialField::TwitchKey, "legacy".to_string())]
        );
    }

    #[test]
    fn test_credential_source_precedence() {
        let mut doc = ConfigDocument::default();
        let scope = Scope::Guild(guild_a());
        let fields = &[CredentialField::YouTube];
        assert_eq!(credential_source(None, &doc, scope, fields), CredentialSource::Missing);

        doc.global.youtube_key = Some("g".into());
        assert_eq!(credential_source(None, &doc, scope, fields), CredentialSource::Global);

        doc.guild_mut(guild_a()).youtube_key = Some("l".into());
        assert_eq!(credential_source(None, &doc, scope, fields), CredentialSource::Guild);

        let env = "e".to_string();
        assert_eq!(
            credential_source(Some(&env), &doc, scope, fields),
            CredentialSource::Environment
        );
    }
}
