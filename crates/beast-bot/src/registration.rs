//! Turning [`CommandDefinition`]s into application command registrations.
//!
//! Commands are registered per guild: at startup for every guild the bot is
//! already in, and again when it joins a new one. Registration overwrites the
//! guild's command list, so repeating it is harmless.

use beast_commands::{CommandDefinition, OptionDefinition, OptionKind, Router, SubcommandDefinition};
use beast_common::{truncate_chars, GuildId};
use serenity::builder::{CreateCommand, CreateCommandOption};
use serenity::http::Http;
use serenity::model::application::CommandOptionType;
use serenity::model::id as wire;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest description the platform accepts.
const MAX_DESCRIPTION: usize = 100;

fn description(text: &str) -> String {
    truncate_chars(text, MAX_DESCRIPTION)
}

const fn option_type(kind: OptionKind) -> CommandOptionType {
    match kind {
        OptionKind::String | OptionKind::Choice(_) => CommandOptionType::String,
        OptionKind::Integer => CommandOptionType::Integer,
        OptionKind::Boolean => CommandOptionType::Boolean,
        OptionKind::User => CommandOptionType::User,
        OptionKind::Channel => CommandOptionType::Channel,
        OptionKind::Role => CommandOptionType::Role,
    }
}

fn option_builder(option: &OptionDefinition) -> CreateCommandOption {
    let mut builder = CreateCommandOption::new(
        option_type(option.kind),
        option.name,
        description(option.description),
    )
    .required(option.required);

    if let OptionKind::Choice(values) = option.kind {
        for value in values {
            builder = builder.add_string_choice(*value, *value);
        }
    }
    if let Some(min) = option.min.and_then(|min| u64::try_from(min).ok()) {
        builder = builder.min_int_value(min);
    }
    if let Some(max) = option.max.and_then(|max| u64::try_from(max).ok()) {
        builder = builder.max_int_value(max);
    }
    builder
}

fn subcommand_builder(subcommand: &SubcommandDefinition) -> CreateCommandOption {
    subcommand.options.iter().fold(
        CreateCommandOption::new(
            CommandOptionType::SubCommand,
            subcommand.name,
            description(subcommand.description),
        ),
        |builder, option| builder.add_sub_option(option_builder(option)),
    )
}

/// Registration payload for one command.
#[must_use]
pub fn command_builder(definition: &CommandDefinition) -> CreateCommand {
    let mut builder =
        CreateCommand::new(definition.name).description(description(definition.description));
    if definition.guild_only {
        builder = builder.dm_permission(false);
    }
    if definition.subcommands.is_empty() {
        for option in &definition.options {
            builder = builder.add_option(option_builder(option));
        }
    } else {
        for subcommand in &definition.subcommands {
            builder = builder.add_option(subcommand_builder(subcommand));
        }
    }
    builder
}

/// Registration payloads for every routed command.
#[must_use]
pub fn command_builders(router: &Router) -> Vec<CreateCommand> {
    router.definitions().into_iter().map(command_builder).collect()
}

/// Replace the command list of one guild. Failures are logged, not returned.
pub async fn register_guild(http: &Http, router: &Router, guild: GuildId) -> bool {
    let commands = command_builders(router);
    let count = commands.len();
    match wire::GuildId::new(guild.get()).set_commands(http, commands).await {
        Ok(_) => {
            info!(%guild, count, "Registered commands");
            true
        }
        Err(err) => {
            warn!(%guild, error = %err, "Command registration failed");
            false
        }
    }
}

/// Register in each guild in turn, pausing `delay` between guilds.
pub async fn register_guilds(
    http: Arc<Http>,
    router: Arc<Router>,
    guilds: Vec<GuildId>,
    delay: Duration,
) -> usize {
    let mut registered = 0;
    for (index, guild) in guilds.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if register_guild(&http, &router, *guild).await {
            registered += 1;
        }
    }
    debug!(registered, total = guilds.len(), "Guild registration finished");
    registered
}

#[cfg(test)]
mod tests {
    use super::*;
    use beast_commands::build_router;
    use serde_json::Value;

    fn payload(name: &str) -> Value {
        let router = build_router().unwrap();
        let definition = router.definition(name).unwrap();
        serde_json::to_value(command_builder(definition)).unwrap()
    }

    fn option<'a>(options: &'a Value, name: &str) -> &'a Value {
        options
            .as_array()
            .unwrap()
            .iter()
            .find(|option| option["name"] == name)
            .unwrap()
    }

    #[test]
    fn test_every_command_has_a_payload() {
        let router = build_router().unwrap();
        let builders = command_builders(&router);
        assert_eq!(builders.len(), router.len());
    }

    #[test]
    fn test_subcommands_become_subcommand_options() {
        let json = payload("owner");
        assert_eq!(json["name"], "owner");
        let disable = option(&json["options"], "disable");
        assert_eq!(disable["type"], 1);
    }

    #[test]
    fn test_integer_bounds_and_required_flag() {
        let json = payload("purge");
        let amount = option(&json["options"], "amount");
        assert_eq!(amount["type"], 4);
        assert_eq!(amount["required"], true);
        assert_eq!(amount["min_value"], 1);
        assert_eq!(amount["max_value"], 100);
    }

    #[test]
    fn test_choices_are_listed() {
        let json = payload("mod");
        let action = option(&json["options"], "action");
        let values: Vec<&str> = action["choices"]
            .as_array()
            .unwrap()
            .iter()
            .map(|choice| choice["value"].as_str().unwrap())
            .collect();
        assert_eq!(values, ["kick", "ban", "mute", "unmute", "purge"]);
    }

    #[test]
    fn test_descriptions_are_capped() {
        assert_eq!(description(&"x".repeat(150)).chars().count(), MAX_DESCRIPTION);
        assert_eq!(description("kurz"), "kurz");
    }
}
