//! Single dispatch table from command names to handlers.

use crate::args::{parse_args, ArgError, Args, RawArgs};
use crate::auth::AuthorizationContext;
use crate::definition::CommandDefinition;
use crate::framework::CommandContext;
use crate::guard::GuardPipeline;
use crate::invocation::{GuildInfo, Invocation, InvocationSource};
use crate::reply::Reply;
use async_trait::async_trait;
use beast_common::{normalize_command_name, BotError, ChannelId, ErrorKind, GuildId, Scope, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// A command handler.
///
/// Handlers receive guarded, validated input and return the reply text. Any
/// error becomes the reply instead.
#[async_trait]
pub trait Command: Send + Sync {
    /// Declaration used for registration, guards and argument validation.
    fn definition(&self) -> CommandDefinition;

    /// Run the command.
    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError>;
}

/// Validated invocation handed to a handler.
#[derive(Debug, Clone)]
pub struct Call {
    /// Invoking user.
    pub user: UserId,
    /// Invoking user's display name.
    pub user_name: String,
    /// Guild, when not in a direct message.
    pub guild: Option<GuildInfo>,
    /// Channel of the invocation.
    pub channel: ChannelId,
    /// Chosen subcommand.
    pub subcommand: Option<String>,
    /// Validated options.
    pub args: Args,
    /// Owner, team and capability facts.
    pub auth: AuthorizationContext,
    /// Slash or prefix.
    pub source: InvocationSource,
}

impl Call {
    /// Guild scope, or global in direct messages.
    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope::of(self.guild.as_ref().map(|g| g.id))
    }

    /// The guild; commands declared guild-only can rely on it.
    ///
    /// # Errors
    ///
    /// Returns a validation error outside guilds.
    pub fn guild(&self) -> Result<&GuildInfo, BotError> {
        self.guild
            .as_ref()
            .ok_or_else(|| BotError::validation("this command only works inside a server"))
    }

    /// The guild id.
    ///
    /// # Errors
    ///
    /// Returns a validation error outside guilds.
    pub fn guild_id(&self) -> Result<GuildId, BotError> {
        self.guild().map(|g| g.id)
    }

    /// Subcommand name, empty when there is none.
    #[must_use]
    pub fn subcommand(&self) -> &str {
        self.subcommand.as_deref().unwrap_or_default()
    }
}

impl From<ArgError> for BotError {
    fn from(err: ArgError) -> Self {
        match err.option() {
            Some(option) => Self::invalid(option, err.to_string()),
            None => Self::validation(err.to_string()),
        }
    }
}

/// Errors building the routing table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// Two handlers declared the same name.
    #[error("command `{0}` is registered twice")]
    Duplicate(String),
}

struct Entry {
    definition: CommandDefinition,
    handler: Arc<dyn Command>,
}

/// Maps normalized command names to exactly one handler each.
#[derive(Default)]
pub struct Router {
    entries: HashMap<String, Entry>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("Router").field("commands", &names).finish()
    }
}

impl Router {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Duplicate`] if the name is taken.
    pub fn register(&mut self, command: impl Command + 'static) -> Result<(), RouterError> {
        let definition = command.definition();
        let name = normalize_command_name(definition.name);
        if self.entries.contains_key(&name) {
            return Err(RouterError::Duplicate(name));
        }
        self.entries.insert(
            name,
            Entry {
                definition,
                handler: Arc::new(command),
            },
        );
        Ok(())
    }

    /// Declarations of every command, sorted by name.
    #[must_use]
    pub fn definitions(&self) -> Vec<&CommandDefinition> {
        let mut definitions: Vec<_> = self.entries.values().map(|e| &e.definition).collect();
        definitions.sort_by_key(|d| d.name);
        definitions
    }

    /// Declaration of one command.
    #[must_use]
    pub fn definition(&self, name: &str) -> Option<&CommandDefinition> {
        self.entries
            .get(&normalize_command_name(name))
            .map(|e| &e.definition)
    }

    /// Whether `name` is routed.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&normalize_command_name(name))
    }

    /// Number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no command is routed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Guard, validate and run one invocation.
    ///
    /// Returns the reply to send, or `None` when this call must stay silent:
    /// the invocation was already answered elsewhere, or it is a prefix
    /// message naming no known command.
    pub async fn dispatch(&self, ctx: &CommandContext, invocation: Invocation) -> Option<Reply> {
        let name = normalize_command_name(&invocation.name);
        let Some(entry) = self.entries.get(&name) else {
            if invocation.source == InvocationSource::Prefix {
                return None;
            }
            if !invocation.slot.claim() {
                return None;
            }
            warn!(command = %name, "Unknown command");
            return Some(Reply::private(
                ctx.tr("router-unknown-command", &[("command", name)]),
            ));
        };
        if !invocation.slot.claim() {
            debug!(command = %name, "Invocation already answered");
            return None;
        }

        let definition = &entry.definition;
        let resolved = split_subcommand(definition, &invocation);
        let subcommand = resolved.as_ref().ok().and_then(|(sub, _)| sub.clone());

        let doc = ctx.store.snapshot();
        let auth = AuthorizationContext::resolve(
            ctx.env_owner(),
            &doc,
            invocation.user,
            invocation.capabilities,
        );
        let pipeline = GuardPipeline::new(&ctx.settings, &ctx.cooldowns);
        if let Err(rejection) =
            pipeline.check(definition, subcommand.as_deref(), &invocation, &auth, &doc)
        {
            let text = rejection.message(&ctx.i18n, ctx.locale);
            return Some(Reply::private(text));
        }

        let args = match resolved.and_then(|(sub, raw)| {
            parse_args(definition.options_for(sub.as_deref()), raw)
        }) {
            Ok(args) => args,
            Err(err) => {
                debug!(command = %name, error = %err, "Invalid arguments");
                let (key, values) = err.message();
                return Some(Reply::private(ctx.tr(key, &values)));
            }
        };
        if let Err(rejection) = pipeline.start_cooldown(definition, &invocation, &auth) {
            return Some(Reply::private(rejection.message(&ctx.i18n, ctx.locale)));
        }

        info!(
            command = %name,
            subcommand = subcommand.as_deref().unwrap_or(""),
            user = %invocation.user,
            guild = ?invocation.guild.as_ref().map(|g| g.id),
            "Dispatching command"
        );
        let call = Call {
            user: invocation.user,
            user_name: invocation.user_name,
            guild: invocation.guild,
            channel: invocation.channel,
            subcommand,
            args,
            auth,
            source: invocation.source,
        };
        let reply = match entry.handler.run(ctx, &call).await {
            Ok(reply) => reply,
            Err(err) => failure_reply(ctx, &name, &err),
        };
        Some(reply)
    }
}

fn split_subcommand(
    definition: &CommandDefinition,
    invocation: &Invocation,
) -> Result<(Option<String>, RawArgs), ArgError> {
    if definition.subcommands.is_empty() {
        return Ok((None, invocation.args.clone()));
    }
    let unknown = || ArgError::UnknownSubcommand {
        allowed: definition
            .subcommands
            .iter()
            .map(|s| s.name)
            .collect::<Vec<_>>()
            .join(", "),
    };
    let (candidate, raw) = match (&invocation.subcommand, &invocation.args) {
        (Some(sub), raw) => (Some(sub.clone()), raw.clone()),
        (None, RawArgs::Positional(tokens)) => (
            tokens.first().cloned(),
            RawArgs::Positional(tokens.iter().skip(1).cloned().collect()),
        ),
        (None, raw) => (None, raw.clone()),
    };
    let sub = candidate
        .and_then(|c| definition.find_subcommand(&c))
        .ok_or_else(unknown)?;
    Ok((Some(sub.name.to_string()), raw))
}

fn failure_reply(ctx: &CommandContext, command: &str, err: &BotError) -> Reply {
    match err.kind() {
        ErrorKind::Validation | ErrorKind::Permission | ErrorKind::GuardRejection => {
            debug!(command, error = %err, "Command refused");
            Reply::private(err.to_string())
        }
        ErrorKind::RecipientUnreachable => {
            warn!(command, error = %err, "Recipient unreachable");
            Reply::private(ctx.tr("error-recipient-unreachable", &[]))
        }
        ErrorKind::ExternalService => {
            error!(command, error = %err, "External service failed");
            let detail = match err {
                BotError::ExternalService(inner) => inner.to_string(),
                other => other.to_string(),
            };
            Reply::private(ctx.tr("error-external", &[("detail", detail)]))
        }
        ErrorKind::Persistence => {
            error!(command, error = %err, "Persistence failed");
            Reply::private(ctx.tr("error-persistence", &[]))
        }
    }
}
