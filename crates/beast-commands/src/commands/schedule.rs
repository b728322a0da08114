//! Scheduled broadcasts and reminders.
//!
//! Commands only record actions; the bot's scheduler task delivers them.

use crate::definition::{CommandDefinition, OptionDefinition, Requirement};
use crate::framework::CommandContext;
use crate::reply::Reply;
use crate::router::{Call, Command};
use async_trait::async_trait;
use beast_common::{parse_due_time, BotError, ChannelId, UserId};
use beast_config::{ActionKind, ExtraFields, ScheduledAction};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;

const TIME_HELP: &str = "ISO Datetime oder relative (z.B. 10m, 2h)";

/// Due time as shown to users, e.g. `2025-12-06T12:00:00.000Z`.
#[must_use]
pub fn display_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn due_time(ctx: &CommandContext, call: &Call) -> Result<DateTime<Utc>, BotError> {
    let raw = call.args.required_string("time")?;
    parse_due_time(raw, Utc::now())
        .map_err(|_| BotError::invalid("time", ctx.tr("schedule-invalid-time", &[])))
}

/// Append an action under a freshly allocated id, in one store operation.
async fn record(
    ctx: &CommandContext,
    kind: ActionKind,
    due_at: DateTime<Utc>,
    payload: String,
    target: Option<UserId>,
    created_by: UserId,
    fallback_channel_id: Option<ChannelId>,
) -> Result<u64, BotError> {
    let id = ctx
        .store
        .update(move |doc| {
            let id = doc.global.allocate_schedule_id();
            doc.global.schedules.push(ScheduledAction {
                id,
                kind,
                due_at,
                payload,
                target,
                created_by,
                fallback_channel_id,
                extra: ExtraFields::new(),
            });
            id
        })
        .await?;
    info!(id, ?kind, due_at = %display_time(due_at), "Action scheduled");
    Ok(id)
}

/// `/schedule time message`: broadcast later.
pub struct Schedule;

#[async_trait]
impl Command for Schedule {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new(
            "schedule",
            "Sende eine Nachricht zu einer bestimmten Zeit an alle Server (Owner)",
        )
        .requires(Requirement::Owner)
        .option(OptionDefinition::string("time", TIME_HELP).required())
        .option(OptionDefinition::string("message", "Nachricht").required())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let due_at = due_time(ctx, call)?;
        let message = call.args.required_string("message")?.to_string();
        let id = record(ctx, ActionKind::Broadcast, due_at, message, None, call.user, None).await?;
        Ok(Reply::private(ctx.tr(
            "schedule-created",
            &[("id", id.to_string()), ("time", display_time(due_at))],
        )))
    }
}

/// `/schedule-cancel id`
pub struct ScheduleCancel;

#[async_trait]
impl Command for ScheduleCancel {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("schedule-cancel", "Bricht eine geplante Aufgabe ab (Owner)")
            .requires(Requirement::Owner)
            .option(OptionDefinition::integer("id", "ID der geplanten Aufgabe").required())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let raw = call.args.required_integer("id")?;
        let id = u64::try_from(raw)
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| BotError::invalid("id", ctx.tr("schedule-invalid-id", &[])))?;
        let removed = ctx
            .store
            .update(move |doc| {
                let before = doc.global.schedules.len();
                doc.global.schedules.retain(|action| action.id != id);
                before != doc.global.schedules.len()
            })
            .await?;
        let key = if removed {
            info!(id, "Scheduled action cancelled");
            "schedule-cancelled"
        } else {
            "schedule-not-found"
        };
        Ok(Reply::private(ctx.tr(key, &[("id", raw.to_string())])))
    }
}

/// `/schedule-list`
pub struct ScheduleList;

#[async_trait]
impl Command for ScheduleList {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("schedule-list", "Zeigt alle geplanten Aufgaben (Owner)")
            .requires(Requirement::Owner)
    }

    async fn run(&self, ctx: &CommandContext, _call: &Call) -> Result<Reply, BotError> {
        let doc = ctx.store.snapshot();
        if doc.global.schedules.is_empty() {
            return Ok(Reply::private(ctx.tr("schedule-list-empty", &[])));
        }
        let mut actions: Vec<&ScheduledAction> = doc.global.schedules.iter().collect();
        actions.sort_by_key(|a| (a.due_at, a.id));
        let lines: Vec<String> = actions
            .into_iter()
            .map(|action| {
                let kind = match action.kind {
                    ActionKind::Broadcast => ctx.tr("schedule-kind-broadcast", &[]),
                    ActionKind::DirectMessage => ctx.tr(
                        "schedule-kind-dm",
                        &[(
                            "user",
                            action.target.map_or_else(|| "?".to_string(), UserId::mention),
                        )],
                    ),
                };
                ctx.tr(
                    "schedule-list-entry",
                    &[
                        ("id", action.id.to_string()),
                        ("time", display_time(action.due_at)),
                        ("kind", kind),
                    ],
                )
            })
            .collect();
        Ok(Reply::private(lines.join("\n")))
    }
}

/// `/remind user time message`: private reminder. When the recipient does
/// not accept direct messages, it is posted in the invoking channel.
pub struct Remind;

#[async_trait]
impl Command for Remind {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("remind", "Erinnert jemanden per Direktnachricht")
            .rate_limited()
            .option(OptionDefinition::user("user", "User").required())
            .option(OptionDefinition::string("time", TIME_HELP).required())
            .option(OptionDefinition::string("message", "Erinnerungs-Nachricht").required())
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        let user = call.args.required_user("user")?;
        let due_at = due_time(ctx, call)?;
        let message = call.args.required_string("message")?.to_string();
        let id = record(
            ctx,
            ActionKind::DirectMessage,
            due_at,
            message,
            Some(user),
            call.user,
            Some(call.channel),
        )
        .await?;
        Ok(Reply::private(ctx.tr(
            "schedule-reminder-created",
            &[
                ("id", id.to_string()),
                ("user", user.mention()),
                ("time", display_time(due_at)),
            ],
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_display_time() {
        let at = Utc.with_ymd_and_hms(2025, 12, 6, 12, 0, 0).unwrap();
        assert_eq!(display_time(at), "2025-12-06T12:00:00.000Z");
    }
}
