//! `/team`: the global team roster and team-only mode.

use super::state_label;
use crate::definition::{CommandDefinition, OptionDefinition, Requirement, SubcommandDefinition};
use crate::framework::CommandContext;
use crate::reply::Reply;
use crate::router::{Call, Command};
use async_trait::async_trait;
use beast_common::BotError;
use tracing::info;

/// The `/team` command group. Owners, team members and server managers may
/// use it.
pub struct Team;

#[async_trait]
impl Command for Team {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("team", "Team-Befehle (add/remove/list/only)")
            .requires(Requirement::Team)
            .subcommand(
                SubcommandDefinition::new("add", "Fügt ein Team-Mitglied hinzu")
                    .option(OptionDefinition::user("user", "User").required()),
            )
            .subcommand(
                SubcommandDefinition::new("remove", "Entfernt ein Team-Mitglied")
                    .option(OptionDefinition::user("user", "User").required()),
            )
            .subcommand(SubcommandDefinition::new("list", "Zeigt das Team"))
            .subcommand(
                SubcommandDefinition::new("only", "Team-only Modus")
                    .option(OptionDefinition::boolean("value", "An oder aus").required()),
            )
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        match call.subcommand() {
            "add" => {
                let user = call.args.required_user("user")?;
                let added = ctx
                    .store
                    .update(move |doc| {
                        if doc.global.team.contains(&user) {
                            false
                        } else {
                            doc.global.team.push(user);
                            true
                        }
                    })
                    .await?;
                info!(%user, added, "Team add");
                let key = if added { "team-added" } else { "team-already" };
                Ok(Reply::private(ctx.tr(key, &[("user", user.mention())])))
            }
            "remove" => {
                let user = call.args.required_user("user")?;
                let removed = ctx
                    .store
                    .update(move |doc| {
                        let before = doc.global.team.len();
                        doc.global.team.retain(|id| *id != user);
                        before != doc.global.team.len()
                    })
                    .await?;
                info!(%user, removed, "Team remove");
                let key = if removed { "team-removed" } else { "team-not-found" };
                Ok(Reply::private(ctx.tr(key, &[("user", user.mention())])))
            }
            "list" => {
                let doc = ctx.store.snapshot();
                if doc.global.team.is_empty() {
                    return Ok(Reply::private(ctx.tr("team-list-empty", &[])));
                }
                let members = doc
                    .global
                    .team
                    .iter()
                    .map(|id| id.mention())
                    .collect::<Vec<_>>()
                    .join(", ");
                Ok(Reply::private(ctx.tr("team-list", &[("members", members)])))
            }
            "only" => {
                let value = call
                    .args
                    .boolean("value")
                    .ok_or_else(|| BotError::invalid("value", "missing option `value`"))?;
                ctx.store
                    .update(move |doc| doc.global.team_only = value)
                    .await?;
                Ok(Reply::private(ctx.tr(
                    "team-only-set",
                    &[("state", state_label(ctx, value))],
                )))
            }
            other => Err(BotError::validation(format!("unknown subcommand `{other}`"))),
        }
    }
}
