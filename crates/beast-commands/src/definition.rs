//! Command declarations.
//!
//! A [`CommandDefinition`] is everything the router and the guard pipeline
//! need to know about a command before its handler runs, and everything the
//! platform adapter needs to register it.

/// Type of a declared option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Free text.
    String,
    /// Whole number.
    Integer,
    /// `true`/`false`.
    Boolean,
    /// Reference to a user.
    User,
    /// Reference to a channel.
    Channel,
    /// Reference to a role.
    Role,
    /// One value out of a fixed list.
    Choice(&'static [&'static str]),
}

impl OptionKind {
    /// Short name shown in validation messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::String | Self::Choice(_) => "text",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::User => "user",
            Self::Channel => "channel",
            Self::Role => "role",
        }
    }
}

/// A named, typed option of a command or subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDefinition {
    /// Option name as the user types it.
    pub name: &'static str,
    /// Help text.
    pub description: &'static str,
    /// Value type.
    pub kind: OptionKind,
    /// Whether the invocation is rejected without it.
    pub required: bool,
    /// Inclusive lower bound for integers.
    pub min: Option<i64>,
    /// Inclusive upper bound for integers.
    pub max: Option<i64>,
}

impl OptionDefinition {
    const fn new(name: &'static str, description: &'static str, kind: OptionKind) -> Self {
        Self {
            name,
            description,
            kind,
            required: false,
            min: None,
            max: None,
        }
    }

    /// Optional text option.
    #[must_use]
    pub const fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, OptionKind::String)
    }

    /// Optional integer option.
    #[must_use]
    pub const fn integer(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, OptionKind::Integer)
    }

    /// Optional boolean option.
    #[must_use]
    pub const fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, OptionKind::Boolean)
    }

    /// Optional user option.
    #[must_use]
    pub const fn user(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, OptionKind::User)
    }

    /// Optional channel option.
    #[must_use]
    pub const fn channel(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, OptionKind::Channel)
    }

    /// Optional role option.
    #[must_use]
    pub const fn role(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, OptionKind::Role)
    }

    /// Optional choice option.
    #[must_use]
    pub const fn choice(
        name: &'static str,
        description: &'static str,
        values: &'static [&'static str],
    ) -> Self {
        Self::new(name, description, OptionKind::Choice(values))
    }

    /// Mark the option as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Bound an integer option.
    #[must_use]
    pub const fn range(mut self, min: i64, max: i64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

/// What the invoking user must hold for a command to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Requirement {
    /// No restriction.
    #[default]
    Everyone,
    /// "Manage server".
    ManageGuild,
    /// "Manage messages".
    ManageMessages,
    /// "Manage roles".
    ManageRoles,
    /// Administrator.
    Administrator,
    /// Team member, guild manager or owner.
    Team,
    /// Bot owner.
    Owner,
}

impl Requirement {
    /// Catalogue key of the rejection shown when the requirement is not met.
    #[must_use]
    pub const fn message_key(self) -> &'static str {
        match self {
            Self::Everyone => "guard-denied",
            Self::ManageGuild => "guard-need-manage-guild",
            Self::ManageMessages => "guard-need-manage-messages",
            Self::ManageRoles => "guard-need-manage-roles",
            Self::Administrator => "guard-need-administrator",
            Self::Team => "guard-need-team",
            Self::Owner => "guard-need-owner",
        }
    }
}

/// A subcommand such as `owner disable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcommandDefinition {
    /// Subcommand name.
    pub name: &'static str,
    /// Help text.
    pub description: &'static str,
    /// Options of this subcommand.
    pub options: Vec<OptionDefinition>,
    /// Overrides the parent requirement when set.
    pub requirement: Option<Requirement>,
}

impl SubcommandDefinition {
    /// Declare a subcommand.
    #[must_use]
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            options: Vec::new(),
            requirement: None,
        }
    }

    /// Add an option.
    #[must_use]
    pub fn option(mut self, option: OptionDefinition) -> Self {
        self.options.push(option);
        self
    }

    /// Override the parent's requirement.
    #[must_use]
    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requirement = Some(requirement);
        self
    }
}

/// Declaration of one top-level command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDefinition {
    /// Command name, already normalized.
    pub name: &'static str,
    /// Help text.
    pub description: &'static str,
    /// Options when the command has no subcommands.
    pub options: Vec<OptionDefinition>,
    /// Subcommands; when non-empty one of them must be chosen.
    pub subcommands: Vec<SubcommandDefinition>,
    /// Requirement for every subcommand that does not override it.
    pub requirement: Requirement,
    /// Only usable inside a guild.
    pub guild_only: bool,
    /// The handler may take longer than the platform's acknowledgement window.
    pub defer: bool,
    /// Reply privately when deferring.
    pub ephemeral: bool,
    /// Gated by the guild's entertainment flag on prefix invocations.
    pub entertainment: bool,
    /// Subject to the per-user cooldown.
    pub rate_limited: bool,
}

impl CommandDefinition {
    /// Declare a command with no options.
    #[must_use]
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            options: Vec::new(),
            subcommands: Vec::new(),
            requirement: Requirement::Everyone,
            guild_only: false,
            defer: false,
            ephemeral: false,
            entertainment: false,
            rate_limited: false,
        }
    }

    /// Add an option.
    #[must_use]
    pub fn option(mut self, option: OptionDefinition) -> Self {
        self.options.push(option);
        self
    }

    /// Add a subcommand.
    #[must_use]
    pub fn subcommand(mut self, subcommand: SubcommandDefinition) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    /// Set the requirement.
    #[must_use]
    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requirement = requirement;
        self
    }

    /// Refuse the command outside guilds.
    #[must_use]
    pub fn guild_only(mut self) -> Self {
        self.guild_only = true;
        self
    }

    /// Acknowledge first and answer later; `ephemeral` selects a private answer.
    #[must_use]
    pub fn deferred(mut self, ephemeral: bool) -> Self {
        self.defer = true;
        self.ephemeral = ephemeral;
        self
    }

    /// Mark as an entertainment command.
    #[must_use]
    pub fn entertainment(mut self) -> Self {
        self.entertainment = true;
        self
    }

    /// Apply the per-user cooldown.
    #[must_use]
    pub fn rate_limited(mut self) -> Self {
        self.rate_limited = true;
        self
    }

    /// Find a subcommand by name, case-insensitively.
    #[must_use]
    pub fn find_subcommand(&self, name: &str) -> Option<&SubcommandDefinition> {
        self.subcommands
            .iter()
            .find(|sub| sub.name.eq_ignore_ascii_case(name))
    }

    /// Options that apply to `subcommand`, or the command's own options.
    #[must_use]
    pub fn options_for(&self, subcommand: Option<&str>) -> &[OptionDefinition] {
        subcommand
            .and_then(|name| self.find_subcommand(name))
            .map_or(self.options.as_slice(), |sub| sub.options.as_slice())
    }

    /// Effective requirement for `subcommand`.
    #[must_use]
    pub fn requirement_for(&self, subcommand: Option<&str>) -> Requirement {
        subcommand
            .and_then(|name| self.find_subcommand(name))
            .and_then(|sub| sub.requirement)
            .unwrap_or(self.requirement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> CommandDefinition {
        CommandDefinition::new("owner", "Owner administration")
            .requires(Requirement::Owner)
            .subcommand(SubcommandDefinition::new("list", "List owners"))
            .subcommand(
                SubcommandDefinition::new("disable", "Disable a command")
                    .option(OptionDefinition::string("cmd", "Command").required())
                    .requires(Requirement::ManageGuild),
            )
    }

    #[test]
    fn test_subcommand_requirement_override() {
        let def = owner();
        assert_eq!(def.requirement_for(Some("list")), Requirement::Owner);
        assert_eq!(def.requirement_for(Some("DISABLE")), Requirement::ManageGuild);
        assert_eq!(def.requirement_for(None), Requirement::Owner);
    }

    #[test]
    fn test_options_for_subcommand() {
        let def = owner();
        assert_eq!(def.options_for(Some("disable"))[0].name, "cmd");
        assert!(def.options_for(Some("list")).is_empty());
        assert!(def.options_for(None).is_empty());
    }

    #[test]
    fn test_builder_flags() {
        let def = CommandDefinition::new("support", "Open a ticket")
            .guild_only()
            .deferred(true)
            .option(OptionDefinition::integer("amount", "Amount").range(1, 100));
        assert!(def.guild_only && def.defer && def.ephemeral);
        assert!(!def.rate_limited);
        assert_eq!(def.options[0].min, Some(1));
        assert_eq!(def.options[0].max, Some(100));
    }
}
