//! Small entertainment commands.

use crate::definition::{CommandDefinition, OptionDefinition};
use crate::framework::CommandContext;
use crate::reply::Reply;
use crate::router::{Call, Command};
use async_trait::async_trait;
use beast_common::BotError;
use rand::Rng;

const EIGHT_BALL_ANSWERS: [&str; 8] = [
    "fun-8ball-yes",
    "fun-8ball-no",
    "fun-8ball-maybe",
    "fun-8ball-definitely",
    "fun-8ball-later",
    "fun-8ball-unsure",
    "fun-8ball-no-way",
    "fun-8ball-absolutely",
];

fn fun(name: &'static str, description: &'static str) -> CommandDefinition {
    CommandDefinition::new(name, description)
        .entertainment()
        .rate_limited()
}

/// `/hallo`
pub struct Hallo;

#[async_trait]
impl Command for Hallo {
    fn definition(&self) -> CommandDefinition {
        fun("hallo", "Sag hallo")
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        Ok(Reply::public(
            ctx.tr("fun-hallo", &[("name", call.user_name.clone())]),
        ))
    }
}

/// `/ping`
pub struct Ping;

#[async_trait]
impl Command for Ping {
    fn definition(&self) -> CommandDefinition {
        fun("ping", "Antwortet mit Pong")
    }

    async fn run(&self, ctx: &CommandContext, _call: &Call) -> Result<Reply, BotError> {
        Ok(Reply::public(ctx.tr("fun-ping", &[])))
    }
}

/// `/würfeln`
pub struct Dice;

#[async_trait]
impl Command for Dice {
    fn definition(&self) -> CommandDefinition {
        fun("würfeln", "Würfelt eine Zahl von 1 bis 6")
    }

    async fn run(&self, ctx: &CommandContext, _call: &Call) -> Result<Reply, BotError> {
        let value = rand::thread_rng().gen_range(1..=6);
        Ok(Reply::public(
            ctx.tr("fun-dice", &[("value", value.to_string())]),
        ))
    }
}

/// `/8ball question`
pub struct EightBall;

#[async_trait]
impl Command for EightBall {
    fn definition(&self) -> CommandDefinition {
        fun("8ball", "Stell der magischen Kugel eine Frage")
            .option(OptionDefinition::string("question", "Deine Frage").required())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let question = call.args.required_string("question")?;
        let key = EIGHT_BALL_ANSWERS[rand::thread_rng().gen_range(0..EIGHT_BALL_ANSWERS.len())];
        Ok(Reply::public(ctx.tr(
            "fun-8ball",
            &[
                ("question", question.to_string()),
                ("answer", ctx.tr(key, &[])),
            ],
        )))
    }
}

/// `/coinflip`
pub struct Coinflip;

#[async_trait]
impl Command for Coinflip {
    fn definition(&self) -> CommandDefinition {
        fun("coinflip", "Wirft eine Münze")
    }

    async fn run(&self, ctx: &CommandContext, _call: &Call) -> Result<Reply, BotError> {
        let side = if rand::thread_rng().gen_bool(0.5) {
            "fun-coin-heads"
        } else {
            "fun-coin-tails"
        };
        Ok(Reply::public(
            ctx.tr("fun-coin", &[("side", ctx.tr(side, &[]))]),
        ))
    }
}

/// `/color [hex]`
pub struct Color;

#[async_trait]
impl Command for Color {
    fn definition(&self) -> CommandDefinition {
        fun("color", "Zeigt eine Farbe")
            .option(OptionDefinition::string("hex", "Hex-Code (#rrggbb)"))
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let hex = match call.args.string("hex") {
            Some(raw) => parse_hex_color(raw)
                .ok_or_else(|| BotError::invalid("hex", ctx.tr("fun-color-invalid", &[])))?,
            None => format!("{:06X}", rand::thread_rng().gen_range(0..=0x00FF_FFFF_u32)),
        };
        Ok(Reply::public(ctx.tr("fun-color", &[("hex", hex)])))
    }
}

/// Accept `rrggbb` with or without a leading `#`; returns it uppercased.
#[must_use]
pub fn parse_hex_color(raw: &str) -> Option<String> {
    let digits = raw.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits);
    (digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()))
        .then(|| digits.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff8800"), Some("FF8800".into()));
        assert_eq!(parse_hex_color("a1B2c3"), Some("A1B2C3".into()));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("zzzzzz"), None);
    }

    #[test]
    fn test_fun_commands_are_entertainment() {
        for def in [Ping.definition(), Dice.definition(), Color.definition()] {
            assert!(def.entertainment && def.rate_limited, "{}", def.name);
        }
    }
}
