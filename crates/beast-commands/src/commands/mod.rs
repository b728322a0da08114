//! Command handlers, grouped by area.

pub mod announce;
pub mod fun;
pub mod guild_settings;
pub mod moderation;
pub mod owner;
pub mod providers;
pub mod schedule;
pub mod team;
pub mod tickets;

use crate::router::{Router, RouterError};

/// Register every command with `router`.
///
/// # Errors
///
/// Returns [`RouterError::Duplicate`] if two handlers share a name.
pub fn register_all(router: &mut Router) -> Result<(), RouterError> {
    router.register(fun::Hallo)?;
    router.register(fun::Ping)?;
    router.register(fun::Dice)?;
    router.register(fun::EightBall)?;
    router.register(fun::Coinflip)?;
    router.register(fun::Color)?;

    router.register(guild_settings::SetWelcome)?;
    router.register(guild_settings::SetWelcomeMessage)?;
    router.register(guild_settings::TestWelcome)?;
    router.register(guild_settings::SetAutorole)?;
    router.register(guild_settings::SetAnnounce)?;
    router.register(guild_settings::SetSupportGroup)?;
    router.register(guild_settings::SetGlobalSupport)?;
    router.register(guild_settings::SetWebsite)?;
    router.register(guild_settings::Website)?;
    router.register(guild_settings::SetEntertainment)?;

    router.register(providers::SetOpenAi)?;
    router.register(providers::SetYouTube)?;
    router.register(providers::SetTwitch)?;
    router.register(providers::SetElevenLabs)?;
    router.register(providers::TokenStatus)?;
    router.register(providers::Watch)?;

    router.register(moderation::Mod)?;
    router.register(moderation::Purge)?;
    router.register(moderation::Say)?;

    router.register(owner::Owner)?;
    router.register(team::Team)?;

    router.register(announce::Everyone)?;
    router.register(announce::ServerAnnouncement)?;

    router.register(schedule::Schedule)?;
    router.register(schedule::ScheduleCancel)?;
    router.register(schedule::ScheduleList)?;
    router.register(schedule::Remind)?;

    router.register(tickets::Support)?;
    router.register(tickets::Ticket)?;
    router.register(tickets::Application)?;
    router.register(tickets::ReplyToTicket)?;
    router.register(tickets::CloseTicket)?;
    router.register(tickets::TicketStatus)?;
    Ok(())
}

/// Localized "on"/"off".
pub(crate) fn state_label(ctx: &crate::framework::CommandContext, on: bool) -> String {
    ctx.tr(if on { "state-on" } else { "state-off" }, &[])
}
