//! Argument validation.
//!
//! Slash invocations arrive with values the platform already typed; prefix
//! invocations arrive as whitespace-separated tokens. Both are checked
//! against the command's [`OptionDefinition`]s before any handler runs.

use crate::definition::{OptionDefinition, OptionKind};
use beast_common::{ChannelId, RoleId, UserId};
use std::collections::BTreeMap;
use thiserror::Error;

/// A validated option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// Text or a choice value.
    String(String),
    /// Whole number.
    Integer(i64),
    /// Flag.
    Boolean(bool),
    /// User reference.
    User(UserId),
    /// Channel reference.
    Channel(ChannelId),
    /// Role reference.
    Role(RoleId),
}

/// Arguments as they come from the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawArgs {
    /// Named values from a slash invocation.
    Typed(Vec<(String, ArgValue)>),
    /// Tokens following the command name of a prefix invocation.
    Positional(Vec<String>),
}

impl Default for RawArgs {
    fn default() -> Self {
        Self::Typed(Vec::new())
    }
}

/// Why arguments were rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgError {
    /// A required option is absent.
    #[error("missing option `{option}`")]
    Missing {
        /// Option name.
        option: String,
    },

    /// A value has the wrong type.
    #[error("option `{option}` expects a {expected}")]
    WrongType {
        /// Option name.
        option: String,
        /// Expected type label.
        expected: &'static str,
    },

    /// An integer is outside its declared bounds.
    #[error("option `{option}` must be between {min} and {max}")]
    OutOfRange {
        /// Option name.
        option: String,
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
    },

    /// A choice value is not one of the declared values.
    #[error("option `{option}` must be one of {allowed}")]
    InvalidChoice {
        /// Option name.
        option: String,
        /// Comma separated allowed values.
        allowed: String,
    },

    /// The command needs a subcommand and none or an unknown one was given.
    #[error("unknown subcommand, expected one of {allowed}")]
    UnknownSubcommand {
        /// Comma separated subcommand names.
        allowed: String,
    },
}

impl ArgError {
    /// Catalogue key and arguments for the user-facing message.
    #[must_use]
    pub fn message(&self) -> (&'static str, Vec<(&'static str, String)>) {
        match self {
            Self::Missing { option } => ("args-missing", vec![("option", option.clone())]),
            Self::WrongType { option, expected } => (
                "args-wrong-type",
                vec![("option", option.clone()), ("expected", (*expected).to_string())],
            ),
            Self::OutOfRange { option, min, max } => (
                "args-out-of-range",
                vec![
                    ("option", option.clone()),
                    ("min", min.to_string()),
                    ("max", max.to_string()),
                ],
            ),
            Self::InvalidChoice { option, allowed } => (
                "args-invalid-choice",
                vec![("option", option.clone()), ("allowed", allowed.clone())],
            ),
            Self::UnknownSubcommand { allowed } => {
                ("args-unknown-subcommand", vec![("allowed", allowed.clone())])
            }
        }
    }

    /// Name of the offending option, if any.
    #[must_use]
    pub fn option(&self) -> Option<&str> {
        match self {
            Self::Missing { option }
            | Self::WrongType { option, .. }
            | Self::OutOfRange { option, .. }
            | Self::InvalidChoice { option, .. } => Some(option),
            Self::UnknownSubcommand { .. } => None,
        }
    }
}

/// Validated arguments handed to a handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    values: BTreeMap<String, ArgValue>,
}

impl Args {
    /// Build from already validated values.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = (String, ArgValue)>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Raw value of an option.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    /// Text value.
    #[must_use]
    pub fn string(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(ArgValue::String(value)) => Some(value),
            _ => None,
        }
    }

    /// Integer value.
    #[must_use]
    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(ArgValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    /// Boolean value.
    #[must_use]
    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(ArgValue::Boolean(value)) => Some(*value),
            _ => None,
        }
    }

    /// User value.
    #[must_use]
    pub fn user(&self, name: &str) -> Option<UserId> {
        match self.get(name) {
            Some(ArgValue::User(value)) => Some(*value),
            _ => None,
        }
    }

    /// Channel value.
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<ChannelId> {
        match self.get(name) {
            Some(ArgValue::Channel(value)) => Some(*value),
            _ => None,
        }
    }

    /// Role value.
    #[must_use]
    pub fn role(&self, name: &str) -> Option<RoleId> {
        match self.get(name) {
            Some(ArgValue::Role(value)) => Some(*value),
            _ => None,
        }
    }

    /// Text value of an option the declaration marks as required.
    ///
    /// # Errors
    ///
    /// Returns [`ArgError::Missing`] when it is absent.
    pub fn required_string(&self, name: &str) -> Result<&str, ArgError> {
        self.string(name).ok_or_else(|| missing(name))
    }

    /// Integer value of a required option.
    ///
    /// # Errors
    ///
    /// Returns [`ArgError::Missing`] when it is absent.
    pub fn required_integer(&self, name: &str) -> Result<i64, ArgError> {
        self.integer(name).ok_or_else(|| missing(name))
    }

    /// User value of a required option.
    ///
    /// # Errors
    ///
    /// Returns [`ArgError::Missing`] when it is absent.
    pub fn required_user(&self, name: &str) -> Result<UserId, ArgError> {
        self.user(name).ok_or_else(|| missing(name))
    }

    /// Channel value of a required option.
    ///
    /// # Errors
    ///
    /// Returns [`ArgError::Missing`] when it is absent.
    pub fn required_channel(&self, name: &str) -> Result<ChannelId, ArgError> {
        self.channel(name).ok_or_else(|| missing(name))
    }

    /// Role value of a required option.
    ///
    /// # Errors
    ///
    /// Returns [`ArgError::Missing`] when it is absent.
    pub fn required_role(&self, name: &str) -> Result<RoleId, ArgError> {
        self.role(name).ok_or_else(|| missing(name))
    }
}

fn missing(name: &str) -> ArgError {
    ArgError::Missing {
        option: name.to_string(),
    }
}

/// Validate `raw` against `options`.
///
/// Positional tokens fill the options in declaration order; the last text
/// option takes the rest of the line.
///
/// # Errors
///
/// Returns the first problem found.
pub fn parse_args(options: &[OptionDefinition], raw: RawArgs) -> Result<Args, ArgError> {
    let mut values = BTreeMap::new();
    match raw {
        RawArgs::Typed(pairs) => {
            for (name, value) in pairs {
                let Some(option) = options.iter().find(|o| o.name == name) else {
                    continue;
                };
                let value = match value {
                    ArgValue::String(text) if option.kind != OptionKind::String => {
                        convert(option, &text)?
                    }
                    other => other,
                };
                values.insert(name, check(option, value)?);
            }
        }
        RawArgs::Positional(tokens) => {
            let last_text = options
                .iter()
                .rposition(|o| o.kind == OptionKind::String);
            let mut rest = tokens.into_iter();
            for (index, option) in options.iter().enumerate() {
                let token = if Some(index) == last_text {
                    let joined = rest.by_ref().collect::<Vec<_>>().join(" ");
                    (!joined.is_empty()).then_some(joined)
                } else {
                    rest.next()
                };
                if let Some(token) = token {
                    let value = convert(option, &token)?;
                    values.insert(option.name.to_string(), check(option, value)?);
                }
            }
        }
    }

    if let Some(option) = options
        .iter()
        .find(|o| o.required && !values.contains_key(o.name))
    {
        return Err(missing(option.name));
    }
    Ok(Args { values })
}

fn convert(option: &OptionDefinition, token: &str) -> Result<ArgValue, ArgError> {
    let wrong = || ArgError::WrongType {
        option: option.name.to_string(),
        expected: option.kind.label(),
    };
    let token = token.trim();
    Ok(match option.kind {
        OptionKind::String | OptionKind::Choice(_) => ArgValue::String(token.to_string()),
        OptionKind::Integer => ArgValue::Integer(token.parse().map_err(|_| wrong())?),
        OptionKind::Boolean => ArgValue::Boolean(parse_bool(token).ok_or_else(wrong)?),
        OptionKind::User => ArgValue::User(UserId(mention_id(token, &["<@!", "<@"]).ok_or_else(wrong)?)),
        OptionKind::Channel => ArgValue::Channel(ChannelId(mention_id(token, &["<#"]).ok_or_else(wrong)?)),
        OptionKind::Role => ArgValue::Role(RoleId(mention_id(token, &["<@&"]).ok_or_else(wrong)?)),
    })
}

fn check(option: &OptionDefinition, value: ArgValue) -> Result<ArgValue, ArgError> {
    let matches = matches!(
        (option.kind, &value),
        (OptionKind::String | OptionKind::Choice(_), ArgValue::String(_))
            | (OptionKind::Integer, ArgValue::Integer(_))
            | (OptionKind::Boolean, ArgValue::Boolean(_))
            | (OptionKind::User, ArgValue::User(_))
            | (OptionKind::Channel, ArgValue::Channel(_))
            | (OptionKind::Role, ArgValue::Role(_))
    );
    if !matches {
        return Err(ArgError::WrongType {
            option: option.name.to_string(),
            expected: option.kind.label(),
        });
    }

    match (&value, option.kind) {
        (ArgValue::Integer(n), _) => {
            let min = option.min.unwrap_or(i64::MIN);
            let max = option.max.unwrap_or(i64::MAX);
            if !(min..=max).contains(n) {
                return Err(ArgError::OutOfRange {
                    option: option.name.to_string(),
                    min,
                    max,
                });
            }
        }
        (ArgValue::String(text), OptionKind::Choice(allowed)) => {
            let lowered = text.to_lowercase();
            return match allowed.iter().find(|a| **a == lowered) {
                Some(found) => Ok(ArgValue::String((*found).to_string())),
                None => Err(ArgError::InvalidChoice {
                    option: option.name.to_string(),
                    allowed: allowed.join(", "),
                }),
            };
        }
        _ => {}
    }
    Ok(value)
}

/// Parse the boolean spellings accepted in prefix commands.
#[must_use]
pub fn parse_bool(token: &str) -> Option<bool> {
    match token.trim().to_lowercase().as_str() {
        "true" | "yes" | "ja" | "on" | "an" | "1" => Some(true),
        "false" | "no" | "nein" | "off" | "aus" | "0" => Some(false),
        _ => None,
    }
}

/// Extract an id from a raw number or a mention using one of `prefixes`.
fn mention_id(token: &str, prefixes: &[&str]) -> Option<u64> {
    if let Ok(id) = token.parse() {
        return Some(id);
    }
    let inner = token.strip_suffix('>')?;
    prefixes
        .iter()
        .find_map(|prefix| inner.strip_prefix(prefix))
        .and_then(|digits| digits.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn say() -> Vec<OptionDefinition> {
        vec![
            OptionDefinition::channel("channel", "Channel").required(),
            OptionDefinition::string("message", "Message").required(),
        ]
    }

    fn tokens(line: &str) -> RawArgs {
        RawArgs::Positional(line.split_whitespace().map(str::to_string).collect())
    }

    #[test]
    fn test_last_text_option_takes_the_rest() {
        let args = parse_args(&say(), tokens("<#42> hello there world")).unwrap();
        assert_eq!(args.channel("channel"), Some(ChannelId(42)));
        assert_eq!(args.string("message"), Some("hello there world"));
    }

    #[test]
    fn test_missing_required() {
        let err = parse_args(&say(), tokens("<#42>")).unwrap_err();
        assert_eq!(
            err,
            ArgError::Missing {
                option: "message".into()
            }
        );
    }

    #[test]
    fn test_mentions_and_raw_ids() {
        let options = [
            OptionDefinition::user("user", "User"),
            OptionDefinition::role("role", "Role"),
        ];
        let args = parse_args(&options, tokens("<@!7> <@&9>")).unwrap();
        assert_eq!(args.user("user"), Some(UserId(7)));
        assert_eq!(args.role("role"), Some(RoleId(9)));

        let args = parse_args(&options, tokens("7 9")).unwrap();
        assert_eq!(args.user("user"), Some(UserId(7)));

        let err = parse_args(&options, tokens("<#7>")).unwrap_err();
        assert!(matches!(err, ArgError::WrongType { expected: "user", .. }));
    }

    #[test]
    fn test_integer_range() {
        let options = [OptionDefinition::integer("amount", "Amount")
            .required()
            .range(1, 100)];
        assert_eq!(
            parse_args(&options, tokens("100")).unwrap().integer("amount"),
            Some(100)
        );
        assert_eq!(
            parse_args(&options, tokens("0")).unwrap_err(),
            ArgError::OutOfRange {
                option: "amount".into(),
                min: 1,
                max: 100
            }
        );
        let typed = RawArgs::Typed(vec![("amount".into(), ArgValue::Integer(101))]);
        assert!(matches!(
            parse_args(&options, typed),
            Err(ArgError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_choice_is_case_insensitive() {
        let options = [OptionDefinition::choice("scope", "Scope", &["global", "guild"])];
        let args = parse_args(&options, tokens("GLOBAL")).unwrap();
        assert_eq!(args.string("scope"), Some("global"));
        assert!(matches!(
            parse_args(&options, tokens("world")),
            Err(ArgError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn test_typed_values_are_checked() {
        let options = [OptionDefinition::boolean("global", "Global")];
        let typed = RawArgs::Typed(vec![("global".into(), ArgValue::Integer(1))]);
        assert!(matches!(
            parse_args(&options, typed),
            Err(ArgError::WrongType { .. })
        ));
        let typed = RawArgs::Typed(vec![("global".into(), ArgValue::String("ja".into()))]);
        assert_eq!(parse_args(&options, typed).unwrap().boolean("global"), Some(true));
    }

    #[test]
    fn test_bool_spellings() {
        for raw in ["true", "Ja", "on", "1"] {
            assert_eq!(parse_bool(raw), Some(true));
        }
        for raw in ["false", "NEIN", "off", "0"] {
            assert_eq!(parse_bool(raw), Some(false));
        }
        assert_eq!(parse_bool("vielleicht"), None);
    }
}
