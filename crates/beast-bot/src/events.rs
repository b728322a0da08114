//! Gateway events: slash commands, prefix messages, guild joins and new members.

use crate::bot::Data;
use crate::error::AppError;
use crate::registration::register_guild;
use beast_commands::commands::guild_settings::welcome_text;
use beast_commands::{ArgValue, CommandContext, Invocation, RawArgs};
use beast_common::{normalize_command_name, Capabilities, ChannelId, GuildId, RoleId, UserId};
use poise::serenity_prelude as serenity;
use tracing::{debug, info, warn};

/// Central event handler for Discord events.
///
/// # Errors
///
/// Returns [`AppError::Discord`] when an interaction response cannot be sent.
pub async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, AppError>,
    data: &Data,
) -> Result<(), AppError> {
    match event {
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Command(command),
        } => handle_command(ctx, command, data).await?,
        serenity::FullEvent::Message { new_message } => {
            handle_message(ctx, new_message, data).await?;
        }
        serenity::FullEvent::GuildCreate { guild, is_new } => {
            // Guilds known at startup are registered from the ready payload.
            if *is_new == Some(true) {
                info!(guild = %guild.id, name = %guild.name, "Joined guild");
                register_guild(&ctx.http, &data.router, GuildId(guild.id.get())).await;
            }
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            let guild = new_member.guild_id;
            let name = guild.name(&ctx.cache).unwrap_or_else(|| guild.to_string());
            greet_member(
                &data.ctx,
                GuildId(guild.get()),
                &name,
                UserId(new_member.user.id.get()),
            )
            .await;
        }
        serenity::FullEvent::Ready { data_about_bot } => {
            debug!(user = %data_about_bot.user.name, "Ready event received");
        }
        _ => {}
    }
    Ok(())
}

/// Member capabilities from the platform's permission set.
#[must_use]
pub fn capabilities(permissions: Option<serenity::Permissions>) -> Capabilities {
    permissions.map_or(Capabilities::NONE, |permissions| Capabilities {
        manage_guild: permissions.manage_guild(),
        manage_messages: permissions.manage_messages(),
        manage_roles: permissions.manage_roles(),
        administrator: permissions.administrator(),
    })
}

fn arg_value(value: serenity::ResolvedValue<'_>) -> Option<ArgValue> {
    match value {
        serenity::ResolvedValue::String(text) => Some(ArgValue::String(text.to_string())),
        serenity::ResolvedValue::Integer(number) => Some(ArgValue::Integer(number)),
        serenity::ResolvedValue::Boolean(flag) => Some(ArgValue::Boolean(flag)),
        serenity::ResolvedValue::User(user, _) => Some(ArgValue::User(UserId(user.id.get()))),
        serenity::ResolvedValue::Channel(channel) => {
            Some(ArgValue::Channel(ChannelId(channel.id.get())))
        }
        serenity::ResolvedValue::Role(role) => Some(ArgValue::Role(RoleId(role.id.get()))),
        _ => None,
    }
}

/// Split resolved options into the chosen subcommand and its typed values.
fn collect_options(
    options: Vec<serenity::ResolvedOption<'_>>,
) -> (Option<String>, Vec<(String, ArgValue)>) {
    let mut subcommand = None;
    let mut values = Vec::new();
    for option in options {
        match option.value {
            serenity::ResolvedValue::SubCommand(inner) => {
                subcommand = Some(option.name.to_string());
                values = collect_options(inner).1;
            }
            serenity::ResolvedValue::SubCommandGroup(inner) => {
                let (nested, nested_values) = collect_options(inner);
                subcommand = nested;
                values = nested_values;
            }
            value => {
                if let Some(value) = arg_value(value) {
                    values.push((option.name.to_string(), value));
                }
            }
        }
    }
    (subcommand, values)
}

fn invocation_from_command(
    ctx: &serenity::Context,
    command: &serenity::CommandInteraction,
) -> Invocation {
    let (subcommand, values) = collect_options(command.data.options());
    let permissions = command.member.as_ref().and_then(|member| member.permissions);
    let mut invocation = Invocation::slash(
        command.data.name.clone(),
        UserId(command.user.id.get()),
        ChannelId(command.channel_id.get()),
    )
    .with_user_name(command.user.display_name())
    .with_args(RawArgs::Typed(values))
    .with_capabilities(capabilities(permissions));

    if let Some(subcommand) = subcommand {
        invocation = invocation.with_subcommand(subcommand);
    }
    if let Some(guild) = command.guild_id {
        let name = guild.name(&ctx.cache).unwrap_or_else(|| guild.to_string());
        invocation = invocation.in_guild(GuildId(guild.get()), name);
    }
    invocation
}

async fn handle_command(
    ctx: &serenity::Context,
    command: &serenity::CommandInteraction,
    data: &Data,
) -> Result<(), AppError> {
    let invocation = invocation_from_command(ctx, command);
    let (defer, ephemeral) = data
        .router
        .definition(&normalize_command_name(&command.data.name))
        .map_or((false, false), |definition| (definition.defer, definition.ephemeral));

    if defer {
        command
            .create_response(
                &ctx.http,
                serenity::CreateInteractionResponse::Defer(
                    serenity::CreateInteractionResponseMessage::new().ephemeral(ephemeral),
                ),
            )
            .await?;
    }

    let reply = data.router.dispatch(&data.ctx, invocation).await;
    match (reply, defer) {
        (Some(reply), true) => {
            command
                .edit_response(
                    &ctx.http,
                    serenity::EditInteractionResponse::new().content(reply.rendered()),
                )
                .await?;
        }
        (Some(reply), false) => {
            command
                .create_response(
                    &ctx.http,
                    serenity::CreateInteractionResponse::Message(
                        serenity::CreateInteractionResponseMessage::new()
                            .content(reply.rendered())
                            .ephemeral(reply.ephemeral),
                    ),
                )
                .await?;
        }
        (None, true) => command.delete_response(&ctx.http).await?,
        (None, false) => {}
    }
    Ok(())
}

async fn handle_message(
    ctx: &serenity::Context,
    message: &serenity::Message,
    data: &Data,
) -> Result<(), AppError> {
    if message.author.bot {
        return Ok(());
    }
    let Some(mut invocation) = data.ctx.prefixed_invocation(
        &message.content,
        UserId(message.author.id.get()),
        ChannelId(message.channel_id.get()),
    ) else {
        return Ok(());
    };

    invocation = invocation
        .with_user_name(message.author.display_name())
        .with_capabilities(capabilities(message.author_permissions(&ctx.cache)));
    if let Some(guild) = message.guild_id {
        let name = guild.name(&ctx.cache).unwrap_or_else(|| guild.to_string());
        invocation = invocation.in_guild(GuildId(guild.get()), name);
    }

    if let Some(reply) = data.router.dispatch(&data.ctx, invocation).await {
        message.channel_id.say(&ctx.http, reply.content).await?;
    }
    Ok(())
}

/// Give a new member the guild's autorole and post the welcome text.
///
/// Both steps are skipped when the guild has not configured them; failures are
/// logged.
pub async fn greet_member(ctx: &CommandContext, guild: GuildId, guild_name: &str, user: UserId) {
    let doc = ctx.store.snapshot();
    let record = doc.guild(guild);

    if let Some(role) = record.and_then(|record| record.autorole_id) {
        match ctx.platform.add_role(guild, user, role).await {
            Ok(()) => debug!(%guild, %user, %role, "Autorole assigned"),
            Err(err) => warn!(%guild, %user, %role, error = %err, "Autorole assignment failed"),
        }
    }

    let Some(channel) = record.and_then(|record| record.welcome_channel_id) else {
        return;
    };
    let text = welcome_text(&ctx.i18n, ctx.locale, record, user, guild_name);
    if let Err(err) = ctx.platform.send_message(channel, &text).await {
        warn!(%guild, %channel, error = %err, "Welcome message failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_from_permissions() {
        assert_eq!(capabilities(None), Capabilities::NONE);

        let caps = capabilities(Some(
            serenity::Permissions::MANAGE_MESSAGES | serenity::Permissions::SEND_MESSAGES,
        ));
        assert!(caps.manage_messages);
        assert!(!caps.manage_guild);
        assert!(!caps.administrator);

        let admin = capabilities(Some(serenity::Permissions::ADMINISTRATOR));
        assert!(admin.administrator);
        assert!(admin.can_manage_guild());
    }
}
