//! Pre-dispatch checks.
//!
//! Checks run in a fixed order and the first failing one decides the
//! rejection. Owners skip all of them, cooldowns included. The cooldown check
//! only looks at the window; [`GuardPipeline::start_cooldown`] opens it once
//! the invocation is certain to run.

use crate::auth::AuthorizationContext;
use crate::cooldown::CooldownTracker;
use crate::definition::{CommandDefinition, Requirement};
use crate::invocation::{Invocation, InvocationSource};
use beast_common::{compound_command_name, BotError, Scope, UserId};
use beast_config::{ConfigDocument, Settings};
use beast_i18n::{Catalog, Locale};
use tracing::debug;

/// Why an invocation was stopped before its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Owner-only mode is on.
    OwnerOnly,
    /// Team-only mode is on.
    TeamOnly,
    /// The command is in a disabled list.
    Disabled {
        /// Normalized name as listed.
        command: String,
        /// List it was found in.
        scope: Scope,
        /// Owner to contact.
        contact: Option<UserId>,
    },
    /// Entertainment commands are switched off in this guild.
    EntertainmentDisabled,
    /// The command needs a guild.
    GuildOnly,
    /// The user lacks what the command requires.
    Missing(Requirement),
    /// The user is on cooldown.
    Cooldown {
        /// Whole seconds left, rounded up.
        seconds: u64,
    },
}

impl Rejection {
    /// Localized text of the rejection.
    #[must_use]
    pub fn message(&self, catalog: &Catalog, locale: Locale) -> String {
        match self {
            Self::OwnerOnly => catalog.tr(locale, "guard-owner-only", &[]),
            Self::TeamOnly => catalog.tr(locale, "guard-team-only", &[]),
            Self::Disabled {
                command,
                scope,
                contact,
            } => {
                let key = match scope {
                    Scope::Global => "guard-disabled-global",
                    Scope::Guild(_) => "guard-disabled-guild",
                };
                let head = catalog.tr(locale, key, &[("command", command.clone())]);
                let tail = match contact {
                    Some(owner) => catalog.tr(locale, "guard-contact-owner", &[("owner", owner.mention())]),
                    None => catalog.tr(locale, "guard-contact-unknown", &[]),
                };
                format!("{head}\n{tail}")
            }
            Self::EntertainmentDisabled => catalog.tr(locale, "guard-entertainment-disabled", &[]),
            Self::GuildOnly => catalog.tr(locale, "guard-guild-only", &[]),
            Self::Missing(requirement) => catalog.tr(locale, requirement.message_key(), &[]),
            Self::Cooldown { seconds } => {
                catalog.tr(locale, "guard-cooldown", &[("seconds", seconds.to_string())])
            }
        }
    }

    /// The error this rejection maps to, carrying `message`.
    #[must_use]
    pub fn into_error(self, message: String) -> BotError {
        match self {
            Self::Missing(_) => BotError::Permission(message),
            Self::GuildOnly => BotError::validation(message),
            _ => BotError::GuardRejection(message),
        }
    }
}

/// The ordered guard checks.
#[derive(Debug, Clone, Copy)]
pub struct GuardPipeline<'a> {
    settings: &'a Settings,
    cooldowns: &'a CooldownTracker,
}

impl<'a> GuardPipeline<'a> {
    /// Create a pipeline over the process settings and the cooldown tracker.
    #[must_use]
    pub const fn new(settings: &'a Settings, cooldowns: &'a CooldownTracker) -> Self {
        Self {
            settings,
            cooldowns,
        }
    }

    /// Decide whether the invocation may reach its handler.
    ///
    /// # Errors
    ///
    /// Returns the first [`Rejection`] that applies.
    pub fn check(
        &self,
        definition: &CommandDefinition,
        subcommand: Option<&str>,
        invocation: &Invocation,
        auth: &AuthorizationContext,
        doc: &ConfigDocument,
    ) -> Result<(), Rejection> {
        if auth.is_owner {
            return Ok(());
        }
        let result = self.run_checks(definition, subcommand, invocation, auth, doc);
        if let Err(rejection) = &result {
            debug!(command = definition.name, user = %invocation.user, ?rejection, "Invocation rejected");
        }
        result
    }

    fn run_checks(
        &self,
        definition: &CommandDefinition,
        subcommand: Option<&str>,
        invocation: &Invocation,
        auth: &AuthorizationContext,
        doc: &ConfigDocument,
    ) -> Result<(), Rejection> {
        if doc.global.owner_only {
            return Err(Rejection::OwnerOnly);
        }
        if doc.global.team_only && !auth.is_team {
            return Err(Rejection::TeamOnly);
        }

        let guild = invocation.guild.as_ref().map(|g| g.id);
        match invocation.source {
            InvocationSource::Slash => {
                let names: Vec<String> = std::iter::once(definition.name.to_string())
                    .chain(compound_command_name(definition.name, subcommand))
                    .collect();
                let disabled_in = |scope: Scope| {
                    let list = doc.disabled_commands(scope);
                    names.iter().find(|name| list.contains(name)).cloned()
                };
                if let Some(command) = disabled_in(Scope::Global) {
                    return Err(Rejection::Disabled {
                        command,
                        scope: Scope::Global,
                        contact: auth.owner_contact,
                    });
                }
                if let Some(guild) = guild {
                    if !auth.capabilities.can_manage_guild() {
                        if let Some(command) = disabled_in(Scope::Guild(guild)) {
                            return Err(Rejection::Disabled {
                                command,
                                scope: Scope::Guild(guild),
                                contact: auth.owner_contact,
                            });
                        }
                    }
                }
            }
            InvocationSource::Prefix => {
                let switched_off = guild
                    .and_then(|g| doc.guild(g))
                    .and_then(|record| record.entertainment_enabled)
                    == Some(false);
                if definition.entertainment && switched_off {
                    return Err(Rejection::EntertainmentDisabled);
                }
            }
        }

        if definition.guild_only && guild.is_none() {
            return Err(Rejection::GuildOnly);
        }

        let requirement = definition.requirement_for(subcommand);
        if !auth.satisfies(requirement) {
            return Err(Rejection::Missing(requirement));
        }

        if definition.rate_limited {
            let window = self.settings.cooldown_for(definition.name);
            let seconds = self
                .cooldowns
                .remaining(invocation.scope(), invocation.user, definition.name, window);
            if seconds > 0 {
                return Err(Rejection::Cooldown { seconds });
            }
        }
        Ok(())
    }

    /// Open the cooldown window for an invocation that passed the guards and
    /// argument validation.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::Cooldown`] when a concurrent invocation opened the
    /// window first.
    pub fn start_cooldown(
        &self,
        definition: &CommandDefinition,
        invocation: &Invocation,
        auth: &AuthorizationContext,
    ) -> Result<(), Rejection> {
        if auth.is_owner || !definition.rate_limited {
            return Ok(());
        }
        let window = self.settings.cooldown_for(definition.name);
        match self
            .cooldowns
            .check(invocation.scope(), invocation.user, definition.name, window)
        {
            0 => Ok(()),
            seconds => Err(Rejection::Cooldown { seconds }),
        }
    }
}
