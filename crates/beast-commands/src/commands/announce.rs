//! Owner announcements to every guild with an announcement channel.

use crate::broadcast::broadcast;
use crate::definition::{CommandDefinition, OptionDefinition, Requirement};
use crate::framework::CommandContext;
use crate::reply::Reply;
use crate::router::{Call, Command};
use async_trait::async_trait;
use beast_common::BotError;
use tracing::info;

fn announcement(name: &'static str, description: &'static str) -> CommandDefinition {
    CommandDefinition::new(name, description)
        .requires(Requirement::Owner)
        .deferred(true)
        .option(OptionDefinition::string("message", "Die Nachricht für alle").required())
}

async fn announce(ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
    let message = call.args.required_string("message")?;
    let content = ctx.tr("announce-message", &[("message", message.to_string())]);
    let targets = ctx.store.snapshot().announce_channels();
    let report = broadcast(ctx.platform.as_ref(), &targets, &content, ctx.broadcast_delay()).await;
    info!(
        sent = report.sent,
        failed = report.failed,
        by = %call.user,
        "Announcement finished"
    );
    Ok(Reply::private(ctx.tr(
        "announce-result",
        &[
            ("sent", report.sent.to_string()),
            ("failed", report.failed.to_string()),
        ],
    )))
}

/// `/everyone message`
pub struct Everyone;

#[async_trait]
impl Command for Everyone {
    fn definition(&self) -> CommandDefinition {
        announcement(
            "everyone",
            "Sendet eine Ankündigung an alle Server, in denen ein Announce-Channel gesetzt ist (nur Owner)",
        )
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        announce(ctx, call).await
    }
}

/// `/server-announcement message`
pub struct ServerAnnouncement;

#[async_trait]
impl Command for ServerAnnouncement {
    fn definition(&self) -> CommandDefinition {
        announcement(
            "server-announcement",
            "Sendet eine Nachricht an alle Server mit konfiguriertem Announce-Channel (Owner)",
        )
    }

    async fn run(&self, ctx: &CommandContext, call: &Call) -> Result<Reply, BotError> {
        announce(ctx, call).await
    }
}
