//! Support tickets and applications.
//!
//! A ticket is opened in the guild's ledger when the guild has its own
//! support channel, otherwise in the global ledger when a global support
//! channel is configured. Each ticket gets a thread under that channel.

use crate::definition::{CommandDefinition, OptionDefinition, Requirement};
use crate::framework::CommandContext;
use crate::reply::Reply;
use crate::router::{Call, Command};
use async_trait::async_trait;
use beast_common::{slug, truncate_chars, BotError, ChannelId, GuildId, Scope};
use beast_config::{ConfigDocument, LedgerError};
use tracing::{info, warn};

const THREAD_NAME_LIMIT: usize = 100;
const SUBJECT_SLUG_CHARS: usize = 20;
const APPLICATION_SUBJECT: &str = "Bewerbung";
const LEDGER_SCOPES: &[&str] = &["guild", "global"];

/// Thread name of a support ticket, e.g. `ticket-7-Logingehtnicht`.
#[must_use]
pub fn ticket_thread_name(number: u64, subject: &str) -> String {
    let name = format!("ticket-{number}-{}", slug(&truncate_chars(subject, SUBJECT_SLUG_CHARS)));
    truncate_chars(&name, THREAD_NAME_LIMIT)
}

/// Thread name of an application.
#[must_use]
pub fn application_thread_name(number: u64, user_name: &str) -> String {
    truncate_chars(&format!("bewerbung-{number}-{user_name}"), THREAD_NAME_LIMIT)
}

/// Ledger scope and support channel for tickets opened from `guild`.
#[must_use]
pub fn support_route(doc: &ConfigDocument, guild: GuildId) -> Option<(Scope, ChannelId)> {
    let global = doc.global.support_target();
    match doc.guild(guild).and_then(|r| r.support_channel_id) {
        Some(channel) if global.is_some_and(|(_, ch)| ch == channel) => {
            Some((Scope::Global, channel))
        }
        Some(channel) => Some((Scope::Guild(guild), channel)),
        None => global.map(|(_, channel)| (Scope::Global, channel)),
    }
}

fn ledger_error(ctx: &CommandContext, err: LedgerError) -> BotError {
    match err {
        LedgerError::NotFound { number, .. } => BotError::validation(
            ctx.tr("tickets-not-found", &[("number", number.to_string())]),
        ),
        LedgerError::NoThread { number, .. } => BotError::validation(
            ctx.tr("tickets-no-thread", &[("number", number.to_string())]),
        ),
        other => other.into(),
    }
}

/// Ledger selected by the optional `scope` option, guild by default.
fn lookup_scope(call: &Call) -> Result<Scope, BotError> {
    match call.args.string("scope") {
        Some("global") => Ok(Scope::Global),
        _ => Ok(Scope::Guild(call.guild_id()?)),
    }
}

fn ticket_number(call: &Call) -> Result<u64, BotError> {
    let raw = call.args.required_integer("ticket")?;
    u64::try_from(raw).map_err(|_| BotError::invalid("ticket", format!("invalid ticket number {raw}")))
}

#[derive(Clone, Copy)]
enum TicketKind<'a> {
    Support { subject: &'a str, message: &'a str },
    Application { text: &'a str },
}

/// Open a ticket, create its thread and post the opening message.
///
/// The ticket is recorded before the thread exists. If the thread cannot be
/// created the ticket stays without one and the user is told so.
async fn open_ticket(
    ctx: &CommandContext,
    call: &Call,
    kind: TicketKind<'_>,
) -> Result<Reply, BotError> {
    let guild = call.guild()?;
    let doc = ctx.store.snapshot();
    let Some((scope, channel)) = support_route(&doc, guild.id) else {
        return Err(BotError::validation(ctx.tr("tickets-no-support-channel", &[])));
    };
    let source_guild = (scope == Scope::Global).then_some(guild.id);
    let subject = match kind {
        TicketKind::Support { subject, .. } => subject,
        TicketKind::Application { .. } => APPLICATION_SUBJECT,
    };

    let number = ctx
        .tickets
        .open(scope, subject, call.user, source_guild)
        .await
        .map_err(|err| ledger_error(ctx, err))?;

    let (thread_name, opening) = match kind {
        TicketKind::Support { subject, message } => (
            ticket_thread_name(number, subject),
            ctx.tr(
                "tickets-thread-message",
                &[
                    ("number", number.to_string()),
                    ("user", call.user.mention()),
                    ("server", guild.name.clone()),
                    ("subject", subject.to_string()),
                    ("message", message.to_string()),
                ],
            ),
        ),
        TicketKind::Application { text } => (
            application_thread_name(number, &call.user_name),
            ctx.tr(
                "tickets-application-message",
                &[
                    ("number", number.to_string()),
                    ("user", call.user.mention()),
                    ("server", guild.name.clone()),
                    ("text", text.to_string()),
                ],
            ),
        ),
    };

    let thread = match ctx.platform.create_thread(channel, &thread_name).await {
        Ok(thread) => thread,
        Err(err) => {
            warn!(%scope, number, %channel, error = %err, "Failed to create ticket thread");
            return Ok(Reply::private(
                ctx.tr("tickets-create-failed", &[("number", number.to_string())]),
            ));
        }
    };
    ctx.tickets
        .attach_thread(scope, number, thread)
        .await
        .map_err(|err| ledger_error(ctx, err))?;
    if let Err(err) = ctx.platform.send_message(thread, &opening).await {
        warn!(%scope, number, %thread, error = %err, "Failed to post ticket opening message");
    }
    info!(%scope, number, %thread, "Ticket thread created");

    let key = match kind {
        TicketKind::Support { .. } => "tickets-created",
        TicketKind::Application { .. } => "tickets-application-sent",
    };
    Ok(Reply::private(ctx.tr(key, &[("number", number.to_string())])))
}

fn support_definition(name: &'static str, description: &'static str) -> CommandDefinition {
    CommandDefinition::new(name, description)
        .guild_only()
        .deferred(true)
        .rate_limited()
        .option(OptionDefinition::string("subject", "Kurzes Thema/Betreff").required())
        .option(OptionDefinition::string("message", "Beschreibung deines Problems").required())
}

async fn run_support(ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
    let subject = call.args.required_string("subject")?;
    let message = call.args.required_string("message")?;
    open_ticket(ctx, call, TicketKind::Support { subject, message }).await
}

fn lookup_definition(name: &'static str, description: &'static str) -> CommandDefinition {
    CommandDefinition::new(name, description)
        .guild_only()
        .option(OptionDefinition::integer("ticket", "Ticketnummer").required())
        .option(OptionDefinition::choice("scope", "guild oder global", LEDGER_SCOPES))
}

/// `/support subject message`
pub struct Support;

#[async_trait]
impl Command for Support {
    fn definition(&self) -> CommandDefinition {
        support_definition("support", "Erstellt eine Support-Anfrage (öffnet ein Ticket)")
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        run_support(ctx, call).await
    }
}

/// `/ticket subject message`
pub struct Ticket;

#[async_trait]
impl Command for Ticket {
    fn definition(&self) -> CommandDefinition {
        support_definition("ticket", "Erstellt ein Support-Ticket")
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        run_support(ctx, call).await
    }
}

/// `/bewerbung text`
pub struct Application;

#[async_trait]
impl Command for Application {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("bewerbung", "Sendet eine Bewerbung an das Team")
            .guild_only()
            .deferred(true)
            .rate_limited()
            .option(OptionDefinition::string("text", "Dein Bewerbungstext").required())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let text = call.args.required_string("text")?;
        open_ticket(ctx, call, TicketKind::Application { text }).await
    }
}

/// `/reply ticket message [scope]`
pub struct ReplyToTicket;

#[async_trait]
impl Command for ReplyToTicket {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("reply", "Antwortet auf ein Support-Ticket (Staff)")
            .guild_only()
            .requires(Requirement::ManageMessages)
            .deferred(true)
            .option(OptionDefinition::integer("ticket", "Ticketnummer").required())
            .option(OptionDefinition::string("message", "Antwort").required())
            .option(OptionDefinition::choice("scope", "guild oder global", LEDGER_SCOPES))
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let scope = lookup_scope(call)?;
        let number = ticket_number(call)?;
        let text = ctx.tr(
            "tickets-reply-message",
            &[
                ("user", call.user.mention()),
                ("message", call.args.required_string("message")?.to_string()),
            ],
        );
        ctx.tickets
            .reply(ctx.platform.as_ref(), scope, number, &text)
            .await
            .map_err(|err| ledger_error(ctx, err))?;
        Ok(Reply::private(
            ctx.tr("tickets-reply-sent", &[("number", number.to_string())]),
        ))
    }
}

/// `/close-ticket ticket [scope]`
pub struct CloseTicket;

#[async_trait]
impl Command for CloseTicket {
    fn definition(&self) -> CommandDefinition {
        lookup_definition("close-ticket", "Schließt ein Support-Ticket (Staff)")
            .requires(Requirement::ManageMessages)
            .deferred(true)
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let scope = lookup_scope(call)?;
        let number = ticket_number(call)?;
        ctx.tickets
            .close(ctx.platform.as_ref(), scope, number)
            .await
            .map_err(|err| ledger_error(ctx, err))?;
        Ok(Reply::private(
            ctx.tr("tickets-closed", &[("number", number.to_string())]),
        ))
    }
}

/// `/ticket-status ticket [scope]`
pub struct TicketStatus;

#[async_trait]
impl Command for TicketStatus {
    fn definition(&self) -> CommandDefinition {
        lookup_definition("ticket-status", "Zeigt den Status eines Tickets")
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let scope = lookup_scope(call)?;
        let number = ticket_number(call)?;
        let ticket = ctx
            .tickets
            .status(scope, number)
            .await
            .map_err(|err| ledger_error(ctx, err))?;
        let mut text = ctx.tr(
            "tickets-status",
            &[
                ("number", number.to_string()),
                ("status", ticket.status.to_string()),
                ("subject", ticket.subject.clone()),
                (
                    "thread",
                    ticket.thread_id.map_or_else(|| "n/a".to_string(), ChannelId::mention),
                ),
            ],
        );
        if let Some(origin) = ticket.source_guild_id {
            text.push('\n');
            text.push_str(&ctx.tr("tickets-status-origin", &[("guild", origin.to_string())]));
        }
        Ok(Reply::private(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beast_common::test_utils::discord_fixtures::{guild_a, guild_b};

    #[test]
    fn test_ticket_thread_name() {
        assert_eq!(ticket_thread_name(7, "Login geht nicht!"), "ticket-7-Logingehtnicht");
        assert_eq!(
            ticket_thread_name(1, "Ein sehr langer Betreff über vieles"),
            "ticket-1-EinsehrlangerBetr"
        );
        assert_eq!(application_thread_name(3, "krampus"), "bewerbung-3-krampus");
        assert_eq!(application_thread_name(3, &"x".repeat(200)).chars().count(), 100);
    }

    #[test]
    fn test_support_route() {
        let mut doc = ConfigDocument::default();
        assert_eq!(support_route(&doc, guild_a()), None);

        doc.global.guild_id = Some(guild_b());
        doc.global.channel_id = Some(ChannelId(900));
        assert_eq!(support_route(&doc, guild_a()), Some((Scope::Global, ChannelId(900))));

        doc.guild_mut(guild_a()).support_channel_id = Some(ChannelId(100));
        assert_eq!(
            support_route(&doc, guild_a()),
            Some((Scope::Guild(guild_a()), ChannelId(100)))
        );

        // The guild pointing at the global channel uses the global ledger.
        doc.guild_mut(guild_b()).support_channel_id = Some(ChannelId(900));
        assert_eq!(support_route(&doc, guild_b()), Some((Scope::Global, ChannelId(900))));
    }
}
