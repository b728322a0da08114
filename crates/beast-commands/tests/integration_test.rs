//! Integration tests for beast-commands crate.
//!
//! Every test drives the full router: guards, argument validation and
//! handlers, against a real store in a temporary directory and a recording
//! platform.

use beast_common::test_utils::discord_fixtures::{
    announce_a, announce_b, guild_a, guild_b, member_id, other_member_id, owner_id,
    test_channel_id,
};
use beast_common::test_utils::{init_test_logging, OutboundCall, RecordingPlatform};
use beast_common::{Capabilities, ChannelId, Scope};
use beast_commands::{
    build_router, ArgValue, CommandContext, Invocation, InvocationSource, RawArgs, Router,
    RouterError,
};
use beast_config::{ActionKind, ConfigStore, Settings, StoreHandle, TicketStatus};
use beast_i18n::{Catalog, Locale};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    ctx: CommandContext,
    router: Router,
    platform: Arc<RecordingPlatform>,
}

impl Harness {
    async fn new() -> Self {
        init_test_logging();
        let dir = tempfile::tempdir().unwrap();
        let store = StoreHandle::start(ConfigStore::new(dir.path().join("guild-config.json"))).await;
        let platform = Arc::new(RecordingPlatform::new());
        let mut settings = Settings::default();
        settings.discord.owner_id = Some(owner_id());
        settings.scheduler.broadcast_delay_ms = 0;
        let i18n = Arc::new(Catalog::embedded(Locale::German).unwrap());
        let ctx = CommandContext::new(store, platform.clone(), Arc::new(settings), i18n);
        Self {
            _dir: dir,
            ctx,
            router: build_router().unwrap(),
            platform,
        }
    }

    async fn run(&self, invocation: Invocation) -> String {
        self.router
            .dispatch(&self.ctx, invocation)
            .await
            .expect("invocation should be answered")
            .content
    }
}

fn typed(values: Vec<(&str, ArgValue)>) -> RawArgs {
    RawArgs::Typed(
        values
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    )
}

fn text(value: &str) -> ArgValue {
    ArgValue::String(value.to_string())
}

fn in_guild(name: &str, user: beast_common::UserId) -> Invocation {
    Invocation::slash(name, user, test_channel_id()).in_guild(guild_a(), "Krampus Höhle")
}

fn manager() -> Capabilities {
    Capabilities {
        manage_guild: true,
        manage_messages: true,
        ..Capabilities::NONE
    }
}

#[tokio::test]
async fn test_router_has_every_command_once() {
    let mut router = build_router().unwrap();
    for name in [
        "ping", "hallo", "8ball", "owner", "team", "everyone", "schedule", "remind", "support",
        "ticket", "bewerbung", "reply", "close-ticket", "ticket-status", "mod", "purge",
    ] {
        assert!(router.contains(name), "missing {name}");
    }
    assert!(router.contains("/PING"));

    let names: Vec<&str> = router.definitions().iter().map(|d| d.name).collect();
    let mut unique = names.clone();
    unique.dedup();
    assert_eq!(names, unique);

    assert_eq!(
        router.register(beast_commands::commands::fun::Ping),
        Err(RouterError::Duplicate("ping".into()))
    );
}

#[tokio::test]
async fn test_unknown_slash_command_answers_once() {
    let h = Harness::new().await;
    let reply = h.run(in_guild("/nope", member_id())).await;
    assert_eq!(reply, "Unbekannter Befehl: nope");

    let prefixed = Invocation::from_message("!", "!nope", member_id(), test_channel_id()).unwrap();
    assert!(h.router.dispatch(&h.ctx, prefixed).await.is_none());
}

#[tokio::test]
async fn test_single_response_per_invocation() {
    let h = Harness::new().await;
    let invocation = in_guild("ping", member_id());
    let duplicate = invocation.clone();

    assert!(h.router.dispatch(&h.ctx, invocation).await.is_some());
    assert!(h.router.dispatch(&h.ctx, duplicate.clone()).await.is_none());
    assert!(duplicate.slot.is_claimed());
}

#[tokio::test]
async fn test_prefix_ignores_guild_disabled_list() {
    let h = Harness::new().await;
    h.ctx
        .store
        .update(|doc| {
            doc.global.prefix = Some("!".into());
            doc.guild_mut(guild_a()).disabled_commands = vec!["ping".into()];
        })
        .await
        .unwrap();

    let reply = h.run(in_guild("ping", member_id())).await;
    assert_eq!(
        reply,
        format!(
            "Der Befehl `ping` wurde auf diesem Server deaktiviert.\nWende dich bei Fragen an {}.",
            owner_id().mention()
        )
    );

    let prefixed = h
        .ctx
        .prefixed_invocation("!ping", member_id(), test_channel_id())
        .unwrap()
        .in_guild(guild_a(), "Krampus Höhle");
    assert_eq!(prefixed.source, InvocationSource::Prefix);
    assert_eq!(h.run(prefixed).await, "Pong 🏓");
}

#[tokio::test]
async fn test_owner_disables_and_enables_globally() {
    let h = Harness::new().await;
    let disable = in_guild("owner", owner_id())
        .with_subcommand("disable")
        .with_args(typed(vec![("cmd", text("/Purge"))]));
    assert_eq!(h.run(disable).await, "✅ Befehl global deaktiviert: purge");
    assert_eq!(h.ctx.store.snapshot().disabled_commands(Scope::Global), ["purge"]);

    let purge = || {
        in_guild("purge", member_id())
            .with_capabilities(manager())
            .with_args(typed(vec![("amount", ArgValue::Integer(5))]))
    };
    assert!(h
        .run(purge())
        .await
        .starts_with("Der Befehl `purge` wurde global deaktiviert."));
    assert!(h.platform.calls().is_empty());

    let enable = in_guild("owner", owner_id())
        .with_subcommand("enable")
        .with_args(typed(vec![("cmd", text("PURGE"))]));
    assert_eq!(h.run(enable).await, "✅ Befehl global aktiviert: purge");
    assert!(h.ctx.store.snapshot().disabled_commands(Scope::Global).is_empty());

    assert_eq!(h.run(purge()).await, "Gelöscht: 5 Nachrichten.");
    assert_eq!(
        h.platform.calls(),
        vec![OutboundCall::Purge {
            channel: test_channel_id(),
            count: 5
        }]
    );
}

#[tokio::test]
async fn test_repeated_disable_keeps_a_single_entry() {
    let h = Harness::new().await;
    let disable = |cmd: &str, scope: Option<&str>| {
        let mut args = vec![("cmd", text(cmd))];
        if let Some(scope) = scope {
            args.push(("scope", text(scope)));
        }
        in_guild("owner", owner_id())
            .with_subcommand("disable")
            .with_args(typed(args))
    };

    for cmd in ["/Purge", "purge", "  PURGE  "] {
        assert_eq!(h.run(disable(cmd, None)).await, "✅ Befehl global deaktiviert: purge");
    }
    for cmd in ["Mod  Kick", "/mod kick"] {
        h.run(disable(cmd, Some("guild"))).await;
    }

    let doc = h.ctx.store.snapshot();
    assert_eq!(doc.disabled_commands(Scope::Global), ["purge"]);
    assert_eq!(doc.disabled_commands(Scope::Guild(guild_a())), ["mod kick"]);
}

#[tokio::test]
async fn test_owner_only_mode_precedes_other_guards() {
    let h = Harness::new().await;
    h.ctx
        .store
        .update(|doc| {
            doc.global.owner_only = true;
            doc.global.disabled_commands = vec!["ping".into()];
        })
        .await
        .unwrap();

    assert_eq!(
        h.run(in_guild("ping", member_id())).await,
        "Der Bot ist im Owner-only Modus."
    );
    assert_eq!(h.run(in_guild("ping", owner_id())).await, "Pong 🏓");
}

#[tokio::test]
async fn test_requirements_are_checked_before_arguments() {
    let h = Harness::new().await;
    let reply = h.run(in_guild("purge", member_id())).await;
    assert_eq!(reply, "Du brauchst die Berechtigung \"Nachrichten verwalten\".");

    let reply = h
        .run(
            in_guild("purge", member_id())
                .with_capabilities(manager())
                .with_args(typed(vec![("amount", ArgValue::Integer(500))])),
        )
        .await;
    assert_eq!(reply, "`amount` muss zwischen 1 und 100 liegen.");
    assert!(h.platform.calls().is_empty());
}

#[tokio::test]
async fn test_cooldown_applies_to_members_but_not_owners() {
    let h = Harness::new().await;
    assert_eq!(h.run(in_guild("ping", member_id())).await, "Pong 🏓");
    assert!(h
        .run(in_guild("ping", member_id()))
        .await
        .starts_with("Bitte warte noch"));
    assert_eq!(h.run(in_guild("ping", other_member_id())).await, "Pong 🏓");

    assert_eq!(h.run(in_guild("ping", owner_id())).await, "Pong 🏓");
    assert_eq!(h.run(in_guild("ping", owner_id())).await, "Pong 🏓");
}

#[tokio::test]
async fn test_rejected_arguments_do_not_start_cooldown() {
    let h = Harness::new().await;
    let remind = || in_guild("remind", member_id());

    let reply = h.run(remind()).await;
    assert!(reply.starts_with("Bitte gib `"), "{reply}");
    let reply = h.run(remind().with_args(typed(vec![("user", ArgValue::User(other_member_id()))]))).await;
    assert!(reply.starts_with("Bitte gib `"), "{reply}");

    let valid = || {
        remind().with_args(typed(vec![
            ("user", ArgValue::User(other_member_id())),
            ("time", text("2h")),
            ("message", text("Geschenke kaufen")),
        ]))
    };
    let reply = h.run(valid()).await;
    assert!(reply.starts_with("Erinnerung geplant"), "{reply}");
    assert!(h.run(valid()).await.starts_with("Bitte warte noch"));
    assert_eq!(h.ctx.store.snapshot().global.schedules.len(), 1);
}

#[tokio::test]
async fn test_schedule_relative_time() {
    let h = Harness::new().await;
    let before = Utc::now();
    let reply = h
        .run(
            in_guild("schedule", owner_id())
                .with_args(typed(vec![("time", text("10m")), ("message", text("Frohe Weihnachten"))])),
        )
        .await;
    assert!(reply.starts_with("Geplante Ankündigung erstellt (ID: 1)"), "{reply}");

    let doc = h.ctx.store.snapshot();
    let action = &doc.global.schedules[0];
    assert_eq!(action.kind, ActionKind::Broadcast);
    assert_eq!(action.payload, "Frohe Weihnachten");
    assert!(action.due_at >= before + Duration::seconds(600));
    assert!(action.due_at <= Utc::now() + Duration::seconds(600));

    let reply = h
        .run(
            in_guild("schedule", owner_id())
                .with_args(typed(vec![("time", text("bald")), ("message", text("x"))])),
        )
        .await;
    assert!(reply.starts_with("Ungültige Zeit."));
    assert_eq!(h.ctx.store.snapshot().global.schedules.len(), 1);

    let cancel = in_guild("schedule-cancel", owner_id())
        .with_args(typed(vec![("id", ArgValue::Integer(1))]));
    assert_eq!(h.run(cancel).await, "Aufgabe 1 wurde abgebrochen.");
    assert!(h.ctx.store.snapshot().global.schedules.is_empty());
}

#[tokio::test]
async fn test_schedule_cancel_rejects_non_positive_ids() {
    let h = Harness::new().await;
    for id in [-1, 0] {
        let cancel = in_guild("schedule-cancel", owner_id())
            .with_args(typed(vec![("id", ArgValue::Integer(id))]));
        assert_eq!(h.run(cancel).await, "Die ID muss eine positive Zahl sein.");
    }
    let cancel = in_guild("schedule-cancel", owner_id())
        .with_args(typed(vec![("id", ArgValue::Integer(7))]));
    assert_eq!(h.run(cancel).await, "Keine Aufgabe mit ID 7 gefunden.");
}

#[tokio::test]
async fn test_reminder_records_fallback_channel() {
    let h = Harness::new().await;
    h.run(in_guild("remind", member_id()).with_args(typed(vec![
        ("user", ArgValue::User(other_member_id())),
        ("time", text("2h")),
        ("message", text("Geschenke kaufen")),
    ])))
    .await;

    let doc = h.ctx.store.snapshot();
    let action = &doc.global.schedules[0];
    assert_eq!(action.kind, ActionKind::DirectMessage);
    assert_eq!(action.target, Some(other_member_id()));
    assert_eq!(action.created_by, member_id());
    assert_eq!(action.fallback_channel_id, Some(test_channel_id()));
}

#[tokio::test]
async fn test_announcement_reports_partial_failure() {
    let h = Harness::new().await;
    h.ctx
        .store
        .update(|doc| {
            doc.guild_mut(guild_a()).announce_channel_id = Some(announce_a());
            doc.guild_mut(guild_b()).announce_channel_id = Some(announce_b());
        })
        .await
        .unwrap();
    h.platform.fail_channel(announce_b());

    let reply = h
        .run(in_guild("everyone", owner_id()).with_args(typed(vec![("message", text("Hallo zusammen"))])))
        .await;
    assert_eq!(reply, "Ankündigung gesendet: 1 erfolgreich, 1 fehlgeschlagen.");
    assert_eq!(
        h.platform.messages_in(announce_a()),
        vec!["📢 Ankündigung vom Bot-Owner:\nHallo zusammen".to_string()]
    );
}

#[tokio::test]
async fn test_ticket_lifecycle() {
    let h = Harness::new().await;

    let reply = h
        .run(
            in_guild("ticket", owner_id())
                .with_args(typed(vec![("subject", text("Login")), ("message", text("Hilfe"))])),
        )
        .await;
    assert!(reply.starts_with("Kein Support-Kanal konfiguriert."));

    let set = in_guild("set-support-group", other_member_id())
        .with_capabilities(manager())
        .with_args(typed(vec![("channel", ArgValue::Channel(test_channel_id()))]));
    assert_eq!(
        h.run(set).await,
        format!("Support-Kanal gesetzt: {}", test_channel_id().mention())
    );

    let reply = h
        .run(in_guild("support", member_id()).with_args(typed(vec![
            ("subject", text("Login geht nicht!")),
            ("message", text("Passwort vergessen")),
        ])))
        .await;
    assert_eq!(reply, "Support-Ticket erstellt: #1. Team wird benachrichtigt.");

    assert!(h.platform.calls().contains(&OutboundCall::CreateThread {
        channel: test_channel_id(),
        name: "ticket-1-Logingehtnicht".into(),
    }));
    let thread: ChannelId = h
        .ctx
        .store
        .snapshot()
        .tickets(Scope::Guild(guild_a()))
        .and_then(|tickets| tickets.get(&1))
        .and_then(|ticket| ticket.thread_id)
        .unwrap();
    assert!(h.platform.messages_in(thread)[0].starts_with("Neues Ticket #1 von"));

    let staff = || in_guild("reply", other_member_id()).with_capabilities(manager());
    let reply = h
        .run(staff().with_args(typed(vec![
            ("ticket", ArgValue::Integer(1)),
            ("message", text("Schau in dein Postfach")),
        ])))
        .await;
    assert_eq!(reply, "Antwort zu Ticket #1 gesendet.");
    assert_eq!(
        h.platform.messages_in(thread)[1],
        format!("Antwort von {}:\nSchau in dein Postfach", other_member_id().mention())
    );

    let close = in_guild("close-ticket", other_member_id())
        .with_capabilities(manager())
        .with_args(typed(vec![("ticket", ArgValue::Integer(1))]));
    assert_eq!(h.run(close).await, "Ticket #1 wurde geschlossen.");
    assert!(h
        .platform
        .calls()
        .contains(&OutboundCall::ArchiveThread { thread }));

    let record = h
        .ctx
        .tickets
        .status(Scope::Guild(guild_a()), 1)
        .await
        .unwrap();
    assert_eq!(record.status, TicketStatus::Closed);

    let missing = in_guild("ticket-status", member_id())
        .with_args(typed(vec![("ticket", ArgValue::Integer(9))]));
    assert_eq!(h.run(missing).await, "Ticket #9 nicht gefunden.");
}

#[tokio::test]
async fn test_ticket_thread_failure_keeps_ticket() {
    let h = Harness::new().await;
    h.ctx
        .store
        .update(|doc| doc.guild_mut(guild_a()).support_channel_id = Some(test_channel_id()))
        .await
        .unwrap();
    h.platform.fail_channel(test_channel_id());

    let reply = h
        .run(in_guild("bewerbung", member_id()).with_args(typed(vec![("text", text("Ich mag Kekse"))])))
        .await;
    assert_eq!(
        reply,
        "Ticket #1 wurde angelegt, aber der Thread konnte nicht erstellt werden."
    );
    let record = h.ctx.tickets.status(Scope::Guild(guild_a()), 1).await.unwrap();
    assert_eq!(record.subject, "Bewerbung");
    assert_eq!(record.thread_id, None);
}
