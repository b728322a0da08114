//! Moderation: kick, ban, timeouts and message purges.

use crate::definition::{CommandDefinition, OptionDefinition, Requirement};
use crate::framework::CommandContext;
use crate::reply::Reply;
use crate::router::{Call, Command};
use async_trait::async_trait;
use beast_common::{BotError, ChannelId};
use chrono::{Duration, Utc};
use tracing::info;

/// Actions of `/mod`.
pub const MOD_ACTIONS: &[&str] = &["kick", "ban", "mute", "unmute", "purge"];

const DEFAULT_MUTE_MINUTES: i64 = 10;
/// Longest timeout the platform accepts, 28 days.
const MAX_MUTE_MINUTES: i64 = 40_320;

fn amount_option() -> OptionDefinition {
    OptionDefinition::integer("amount", "Anzahl Nachrichten (max 100)").range(1, 100)
}

async fn purge(
    ctx: &CommandContext,
    channel: ChannelId,
    amount: i64,
) -> Result<Reply, BotError> {
    let count = u8::try_from(amount.clamp(1, 100))
        .map_err(|_| BotError::invalid("amount", ctx.tr("mod-need-amount", &[])))?;
    let deleted = ctx.platform.purge_messages(channel, count).await?;
    info!(%channel, requested = count, deleted, "Messages purged");
    Ok(Reply::private(
        ctx.tr("mod-purged", &[("count", deleted.to_string())]),
    ))
}

/// `/mod action [user] [reason] [duration] [amount] [channel]`
pub struct Mod;

#[async_trait]
impl Command for Mod {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("mod", "Moderationsbefehle (kick/ban/mute/unmute/purge) (Admin)")
            .guild_only()
            .requires(Requirement::ManageGuild)
            .option(OptionDefinition::choice("action", "Aktion", MOD_ACTIONS).required())
            .option(OptionDefinition::user("user", "Ziel-User"))
            .option(OptionDefinition::string("reason", "Begründung"))
            .option(
                OptionDefinition::integer("duration", "Dauer in Minuten (für mute)")
                    .range(1, MAX_MUTE_MINUTES),
            )
            .option(amount_option())
            .option(OptionDefinition::channel("channel", "Channel für Purge"))
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let guild = call.guild_id()?;
        let action = call.args.required_string("action")?;

        if action == "purge" {
            let amount = call
                .args
                .integer("amount")
                .ok_or_else(|| BotError::invalid("amount", ctx.tr("mod-need-amount", &[])))?;
            let channel = call.args.channel("channel").unwrap_or(call.channel);
            return purge(ctx, channel, amount).await;
        }

        let user = call
            .args
            .user("user")
            .ok_or_else(|| BotError::invalid("user", ctx.tr("mod-need-user", &[])))?;
        let reason = call
            .args
            .string("reason")
            .map_or_else(|| ctx.tr("mod-no-reason", &[]), str::to_string);
        let mention = user.mention();

        let text = match action {
            "kick" => {
                ctx.platform.kick_member(guild, user, &reason).await?;
                ctx.tr("mod-kicked", &[("user", mention), ("reason", reason)])
            }
            "ban" => {
                ctx.platform.ban_member(guild, user, &reason).await?;
                ctx.tr("mod-banned", &[("user", mention), ("reason", reason)])
            }
            "mute" => {
                let minutes = call.args.integer("duration").unwrap_or(DEFAULT_MUTE_MINUTES);
                let until = Utc::now() + Duration::minutes(minutes);
                ctx.platform.set_member_timeout(guild, user, Some(until)).await?;
                ctx.tr(
                    "mod-muted",
                    &[("user", mention), ("minutes", minutes.to_string())],
                )
            }
            "unmute" => {
                ctx.platform.set_member_timeout(guild, user, None).await?;
                ctx.tr("mod-unmuted", &[("user", mention)])
            }
            other => {
                return Err(BotError::invalid(
                    "action",
                    format!("unsupported action `{other}`"),
                ));
            }
        };
        info!(%guild, %user, action, moderator = %call.user, "Moderation action");
        Ok(Reply::public(text))
    }
}

/// `/purge amount`
pub struct Purge;

#[async_trait]
impl Command for Purge {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("purge", "Löscht Nachrichten (Admin)")
            .guild_only()
            .requires(Requirement::ManageMessages)
            .option(amount_option().required())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let amount = call.args.required_integer("amount")?;
        purge(ctx, call.channel, amount).await
    }
}

/// `/say message`: post as the bot in the current channel.
pub struct Say;

#[async_trait]
impl Command for Say {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("say", "Lässt den Bot eine Nachricht senden (Admin only)")
            .guild_only()
            .requires(Requirement::Administrator)
            .option(OptionDefinition::string("message", "Nachricht").required())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let message = call.args.required_string("message")?;
        ctx.platform.send_message(call.channel, message).await?;
        Ok(Reply::private(ctx.tr("mod-say-sent", &[])))
    }
}
