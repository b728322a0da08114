//! Per-guild settings: welcome, autorole, announcement and support channels.

use super::state_label;
use crate::definition::{CommandDefinition, OptionDefinition, Requirement};
use crate::framework::CommandContext;
use crate::reply::Reply;
use crate::router::{Call, Command};
use async_trait::async_trait;
use beast_common::{render_welcome_template, BotError, UserId};
use beast_config::GuildRecord;
use beast_i18n::{Catalog, Locale};
use tracing::info;

fn guild_setting(name: &'static str, description: &'static str) -> CommandDefinition {
    CommandDefinition::new(name, description)
        .guild_only()
        .requires(Requirement::ManageGuild)
}

/// Welcome text for a new member: the guild's template, or the default.
#[must_use]
pub fn welcome_text(
    catalog: &Catalog,
    locale: Locale,
    record: Option<&GuildRecord>,
    user: UserId,
    server: &str,
) -> String {
    match record.and_then(|r| r.welcome_message.as_deref()) {
        Some(template) if !template.trim().is_empty() => {
            render_welcome_template(template, &user.mention(), server)
        }
        _ => catalog.tr(
            locale,
            "welcome-default",
            &[("user", user.mention()), ("server", server.to_string())],
        ),
    }
}

/// `/set-welcome channel`
pub struct SetWelcome;

#[async_trait]
impl Command for SetWelcome {
    fn definition(&self) -> CommandDefinition {
        guild_setting("set-welcome", "Setzt den Willkommenskanal")
            .option(OptionDefinition::channel("channel", "Kanal").required())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let guild = call.guild_id()?;
        let channel = call.args.required_channel("channel")?;
        ctx.store
            .update(move |doc| doc.guild_mut(guild).welcome_channel_id = Some(channel))
            .await?;
        info!(%guild, %channel, "Welcome channel set");
        Ok(Reply::private(ctx.tr(
            "settings-welcome-set",
            &[("channel", channel.mention())],
        )))
    }
}

/// `/set-welcome-message message`
pub struct SetWelcomeMessage;

#[async_trait]
impl Command for SetWelcomeMessage {
    fn definition(&self) -> CommandDefinition {
        guild_setting("set-welcome-message", "Setzt den Willkommenstext ({user}, {server})")
            .option(OptionDefinition::string("message", "Text").required())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let guild = call.guild_id()?;
        let message = call.args.required_string("message")?.to_string();
        ctx.store
            .update(move |doc| doc.guild_mut(guild).welcome_message = Some(message))
            .await?;
        Ok(Reply::private(ctx.tr("settings-welcome-message-set", &[])))
    }
}

/// `/test-welcome`: post the welcome text for the caller.
pub struct TestWelcome;

#[async_trait]
impl Command for TestWelcome {
    fn definition(&self) -> CommandDefinition {
        guild_setting("test-welcome", "Testet die Willkommensnachricht")
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let guild = call.guild()?;
        let doc = ctx.store.snapshot();
        let record = doc.guild(guild.id);
        let Some(channel) = record.and_then(|r| r.welcome_channel_id) else {
            return Err(BotError::validation(ctx.tr("settings-no-welcome-channel", &[])));
        };
        let text = welcome_text(&ctx.i18n, ctx.locale, record, call.user, &guild.name);
        ctx.platform.send_message(channel, &text).await?;
        Ok(Reply::private(ctx.tr(
            "settings-test-welcome-sent",
            &[("channel", channel.mention())],
        )))
    }
}

/// `/set-autorole role`
pub struct SetAutorole;

#[async_trait]
impl Command for SetAutorole {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("set-autorole", "Rolle für neue Mitglieder")
            .guild_only()
            .requires(Requirement::ManageRoles)
            .option(OptionDefinition::role("role", "Rolle").required())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let guild = call.guild_id()?;
        let role = call.args.required_role("role")?;
        ctx.store
            .update(move |doc| doc.guild_mut(guild).autorole_id = Some(role))
            .await?;
        Ok(Reply::private(
            ctx.tr("settings-autorole-set", &[("role", role.mention())]),
        ))
    }
}

/// `/set-announce channel`
pub struct SetAnnounce;

#[async_trait]
impl Command for SetAnnounce {
    fn definition(&self) -> CommandDefinition {
        guild_setting("set-announce", "Setzt den Ankündigungskanal")
            .option(OptionDefinition::channel("channel", "Kanal").required())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let guild = call.guild_id()?;
        let channel = call.args.required_channel("channel")?;
        ctx.store
            .update(move |doc| doc.guild_mut(guild).announce_channel_id = Some(channel))
            .await?;
        Ok(Reply::private(ctx.tr(
            "settings-announce-set",
            &[("channel", channel.mention())],
        )))
    }
}

/// `/set-support-group channel`
pub struct SetSupportGroup;

#[async_trait]
impl Command for SetSupportGroup {
    fn definition(&self) -> CommandDefinition {
        guild_setting("set-support-group", "Setzt den Support-Kanal dieses Servers")
            .option(OptionDefinition::channel("channel", "Kanal").required())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let guild = call.guild_id()?;
        let channel = call.args.required_channel("channel")?;
        ctx.store
            .update(move |doc| doc.guild_mut(guild).support_channel_id = Some(channel))
            .await?;
        Ok(Reply::private(ctx.tr(
            "settings-support-set",
            &[("channel", channel.mention())],
        )))
    }
}

/// `/set-global-support channel`: route global tickets into this guild.
///
/// With no owner configured anywhere, the caller becomes the document owner.
pub struct SetGlobalSupport;

#[async_trait]
impl Command for SetGlobalSupport {
    fn definition(&self) -> CommandDefinition {
        guild_setting("set-global-support", "Setzt den globalen Support-Kanal")
            .option(OptionDefinition::channel("channel", "Kanal").required())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let guild = call.guild_id()?;
        let channel = call.args.required_channel("channel")?;
        let caller = call.user;
        let has_env_owner = ctx.env_owner().is_some();
        let claimed = ctx
            .store
            .update(move |doc| {
                doc.global.guild_id = Some(guild);
                doc.global.channel_id = Some(channel);
                if !has_env_owner && doc.owner_id.is_none() {
                    doc.owner_id = Some(caller);
                    true
                } else {
                    false
                }
            })
            .await?;
        info!(%guild, %channel, claimed, "Global support channel set");

        let mut text = ctx.tr(
            "settings-global-support-set",
            &[("channel", channel.mention())],
        );
        if claimed {
            text.push('\n');
            text.push_str(&ctx.tr("settings-auto-owner", &[("user", caller.mention())]));
        }
        Ok(Reply::public(text))
    }
}

/// `/set-website url`
pub struct SetWebsite;

#[async_trait]
impl Command for SetWebsite {
    fn definition(&self) -> CommandDefinition {
        guild_setting("set-website", "Setzt die Webseite des Servers")
            .option(OptionDefinition::string("url", "Adresse").required())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let guild = call.guild_id()?;
        let url = call.args.required_string("url")?.trim().to_string();
        let shown = url.clone();
        ctx.store
            .update(move |doc| doc.guild_mut(guild).website = Some(url))
            .await?;
        Ok(Reply::private(
            ctx.tr("settings-website-set", &[("url", shown)]),
        ))
    }
}

/// `/website`
pub struct Website;

#[async_trait]
impl Command for Website {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("website", "Zeigt die Webseite des Servers")
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let doc = ctx.store.snapshot();
        let url = call
            .guild
            .as_ref()
            .and_then(|g| doc.guild(g.id))
            .and_then(|r| r.website.clone())
            .or_else(|| doc.global.website.clone());
        Ok(match url {
            Some(url) => Reply::public(ctx.tr("settings-website", &[("url", url)])),
            None => Reply::private(ctx.tr("settings-website-missing", &[])),
        })
    }
}

/// `/set-entertainment value`: toggle prefix entertainment commands.
pub struct SetEntertainment;

#[async_trait]
impl Command for SetEntertainment {
    fn definition(&self) -> CommandDefinition {
        guild_setting("set-entertainment", "Unterhaltungsbefehle an- oder ausschalten")
            .option(OptionDefinition::boolean("value", "An oder aus").required())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let guild = call.guild_id()?;
        let value = call
            .args
            .boolean("value")
            .ok_or_else(|| BotError::invalid("value", "missing option `value`"))?;
        ctx.store
            .update(move |doc| doc.guild_mut(guild).entertainment_enabled = Some(value))
            .await?;
        Ok(Reply::private(ctx.tr(
            "settings-entertainment-set",
            &[("state", state_label(ctx, value))],
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beast_common::test_utils::discord_fixtures::member_id;

    #[test]
    fn test_welcome_text_uses_template() {
        let catalog = Catalog::embedded(Locale::German).unwrap();
        let record = GuildRecord {
            welcome_message: Some("Hi {user}, willkommen auf {server}".into()),
            ..GuildRecord::default()
        };
        let text = welcome_text(&catalog, Locale::German, Some(&record), member_id(), "Beast");
        assert_eq!(text, format!("Hi {}, willkommen auf Beast", member_id().mention()));
    }

    #[test]
    fn test_welcome_text_default() {
        let catalog = Catalog::embedded(Locale::English).unwrap();
        let text = welcome_text(&catalog, Locale::English, None, member_id(), "Beast");
        assert!(text.contains("Beast"));
        assert!(text.contains(&member_id().mention()));
    }
}
