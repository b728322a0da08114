//! `/owner`: bot owner administration.

use super::state_label;
use crate::definition::{CommandDefinition, OptionDefinition, Requirement, SubcommandDefinition};
use crate::framework::CommandContext;
use crate::reply::Reply;
use crate::router::{Call, Command};
use async_trait::async_trait;
use beast_common::{normalize_command_name, BotError, ChannelId, Scope, UserId};
use std::time::Duration;
use tracing::{info, warn};

const SCOPES: &[&str] = &["global", "guild"];
const MAX_PREFIX_CHARS: usize = 5;
const RESTART_GRACE: Duration = Duration::from_secs(1);

fn user_option() -> OptionDefinition {
    OptionDefinition::user("user", "User").required()
}

fn toggle_options(sub: SubcommandDefinition) -> SubcommandDefinition {
    sub.option(OptionDefinition::string("cmd", "Command-Name").required())
        .option(OptionDefinition::choice("scope", "global oder guild", SCOPES))
}

/// Validate a message prefix: at most five characters, no whitespace.
#[must_use]
pub fn valid_prefix(value: &str) -> bool {
    let count = value.chars().count();
    count > 0 && count <= MAX_PREFIX_CHARS && !value.chars().any(char::is_whitespace)
}

/// The `/owner` command group.
pub struct Owner;

#[async_trait]
impl Command for Owner {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new(
            "owner",
            "Owner-Befehle (restart, add, remove, disable, enable, list, only, purge, prefix)",
        )
        .requires(Requirement::Owner)
        .subcommand(SubcommandDefinition::new("restart", "Startet den Bot neu"))
        .subcommand(SubcommandDefinition::new("add", "Fügt einen Owner hinzu").option(user_option()))
        .subcommand(SubcommandDefinition::new("remove", "Entfernt einen Owner").option(user_option()))
        .subcommand(SubcommandDefinition::new("list", "Zeigt alle Owner"))
        .subcommand(toggle_options(SubcommandDefinition::new(
            "disable",
            "Deaktiviert einen Befehl",
        )))
        .subcommand(toggle_options(SubcommandDefinition::new(
            "enable",
            "Aktiviert einen Befehl",
        )))
        .subcommand(
            SubcommandDefinition::new("only", "Owner-only Modus")
                .option(OptionDefinition::boolean("value", "An oder aus").required()),
        )
        .subcommand(
            SubcommandDefinition::new("purge", "Löscht Nachrichten")
                .option(
                    OptionDefinition::integer("amount", "Anzahl (max 100)")
                        .range(1, 100)
                        .required(),
                )
                .option(OptionDefinition::channel("channel", "Channel")),
        )
        .subcommand(
            SubcommandDefinition::new("prefix", "Setzt das Nachrichtenpräfix (off zum Abschalten)")
                .option(OptionDefinition::string("value", "Präfix").required()),
        )
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        match call.subcommand() {
            "restart" => Ok(restart(ctx, call)),
            "add" => add(ctx, call.args.required_user("user")?).await,
            "remove" => remove(ctx, call.args.required_user("user")?).await,
            "list" => Ok(list(ctx)),
            "disable" => toggle(ctx, call, true).await,
            "enable" => toggle(ctx, call, false).await,
            "only" => only(ctx, call).await,
            "purge" => {
                let amount = call.args.required_integer("amount")?;
                let channel: ChannelId = call.args.channel("channel").unwrap_or(call.channel);
                let count = u8::try_from(amount)
                    .map_err(|_| BotError::invalid("amount", ctx.tr("mod-need-amount", &[])))?;
                let deleted = ctx.platform.purge_messages(channel, count).await?;
                Ok(Reply::private(
                    ctx.tr("mod-purged", &[("count", deleted.to_string())]),
                ))
            }
            "prefix" => prefix(ctx, call.args.required_string("value")?).await,
            other => Err(BotError::validation(format!("unknown subcommand `{other}`"))),
        }
    }
}

fn restart(ctx: &CommandContext, call: &Call) -> Reply {
    warn!(user = %call.user, "Restart requested");
    let shutdown = ctx.shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(RESTART_GRACE).await;
        shutdown.cancel();
    });
    Reply::private(ctx.tr("owner-restart", &[]))
}

async fn add(ctx: &CommandContext, user: UserId) -> Result<Reply, BotError> {
    let added = ctx
        .store
        .update(move |doc| {
            if doc.owners.contains(&user) {
                false
            } else {
                doc.owners.push(user);
                true
            }
        })
        .await?;
    let key = if added {
        info!(%user, "Owner added");
        "owner-added"
    } else {
        "owner-already"
    };
    Ok(Reply::private(ctx.tr(key, &[("user", user.mention())])))
}

async fn remove(ctx: &CommandContext, user: UserId) -> Result<Reply, BotError> {
    let removed = ctx
        .store
        .update(move |doc| {
            let before = doc.owners.len() + doc.global.owners.len();
            doc.owners.retain(|id| *id != user);
            doc.global.owners.retain(|id| *id != user);
            before != doc.owners.len() + doc.global.owners.len()
        })
        .await?;
    let key = if removed {
        info!(%user, "Owner removed");
        "owner-removed"
    } else {
        "owner-not-found"
    };
    Ok(Reply::private(ctx.tr(key, &[("user", user.mention())])))
}

fn list(ctx: &CommandContext) -> Reply {
    let doc = ctx.store.snapshot();
    let mut lines = Vec::new();
    if let Some(owner) = ctx.env_owner() {
        lines.push(ctx.tr("owner-list-env", &[("user", owner.mention())]));
    }
    if let Some(owner) = doc.owner_id {
        lines.push(ctx.tr("owner-list-config", &[("user", owner.mention())]));
    }
    for owner in doc.owners.iter().chain(&doc.global.owners) {
        lines.push(ctx.tr("owner-list-entry", &[("user", owner.mention())]));
    }
    if lines.is_empty() {
        return Reply::private(ctx.tr("owner-list-empty", &[]));
    }
    Reply::private(lines.join("\n"))
}

/// Add `cmd` to (or remove it from) the disabled list of the chosen scope.
/// The scope defaults to global.
async fn toggle(ctx: &CommandContext, call: &Call, disable: bool) -> Result<Reply, BotError> {
    let command = normalize_command_name(call.args.required_string("cmd")?);
    if command.is_empty() {
        return Err(BotError::invalid("cmd", ctx.tr("owner-invalid-command", &[])));
    }
    let scope = match call.args.string("scope") {
        Some("guild") => Scope::Guild(call.guild_id()?),
        _ => Scope::Global,
    };

    let entry = command.clone();
    ctx.store
        .update(move |doc| {
            let list = doc.disabled_commands_mut(scope);
            if disable {
                if !list.contains(&entry) {
                    list.push(entry);
                }
            } else {
                list.retain(|c| *c != entry);
            }
        })
        .await?;
    info!(%scope, %command, disable, by = %call.user, "Disabled list changed");

    let key = match (disable, scope) {
        (true, Scope::Global) => "owner-disabled-global",
        (true, Scope::Guild(_)) => "owner-disabled-guild",
        (false, Scope::Global) => "owner-enabled-global",
        (false, Scope::Guild(_)) => "owner-enabled-guild",
    };
    Ok(Reply::private(ctx.tr(key, &[("command", command)])))
}

async fn only(ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
    let value = call
        .args
        .boolean("value")
        .ok_or_else(|| BotError::invalid("value", "missing option `value`"))?;
    ctx.store
        .update(move |doc| doc.global.owner_only = value)
        .await?;
    info!(value, "Owner-only mode changed");
    Ok(Reply::private(ctx.tr(
        "owner-only-set",
        &[("state", state_label(ctx, value))],
    )))
}

async fn prefix(ctx: &CommandContext, value: &str) -> Result<Reply, BotError> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("off") {
        ctx.store.update(|doc| doc.global.prefix = None).await?;
        return Ok(Reply::private(ctx.tr("owner-prefix-cleared", &[])));
    }
    if !valid_prefix(value) {
        return Err(BotError::invalid("value", ctx.tr("owner-prefix-invalid", &[])));
    }
    let stored = value.to_string();
    ctx.store
        .update(move |doc| doc.global.prefix = Some(stored))
        .await?;
    info!(prefix = value, "Message prefix set");
    Ok(Reply::private(
        ctx.tr("owner-prefix-set", &[("prefix", value.to_string())]),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_prefix() {
        assert!(valid_prefix("!"));
        assert!(valid_prefix("bb!"));
        assert!(!valid_prefix(""));
        assert!(!valid_prefix("a b"));
        assert!(!valid_prefix("toolong"));
    }

    #[test]
    fn test_every_subcommand_declared() {
        let def = Owner.definition();
        for sub in [
            "restart", "add", "remove", "list", "disable", "enable", "only", "purge", "prefix",
        ] {
            assert!(def.find_subcommand(sub).is_some(), "{sub}");
        }
        assert_eq!(def.requirement_for(Some("disable")), Requirement::Owner);
    }
}
