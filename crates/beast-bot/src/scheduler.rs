//! Polling loop for scheduled announcements and reminders.
//!
//! Every tick takes the actions that are due, runs each once and then removes
//! all of them in a single store update. Delivery is best effort: an action
//! whose send fails is logged and dropped like one that succeeded.

use beast_commands::{broadcast, CommandContext};
use beast_common::{ChannelId, GuildId, OutboundError, Platform};
use beast_config::{ActionKind, ScheduledAction, StoreError, StoreHandle};
use beast_i18n::{Catalog, Locale};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Actions that ran to completion.
    pub executed: usize,
    /// Actions that failed and were dropped.
    pub failed: usize,
}

impl TickReport {
    /// Actions removed from the pending list.
    #[must_use]
    pub const fn processed(&self) -> usize {
        self.executed + self.failed
    }
}

/// Runs due [`ScheduledAction`]s against the platform.
pub struct Scheduler {
    store: StoreHandle,
    platform: Arc<dyn Platform>,
    i18n: Arc<Catalog>,
    locale: Locale,
    broadcast_delay: Duration,
    interval: Duration,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("interval", &self.interval)
            .field("broadcast_delay", &self.broadcast_delay)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// A scheduler sharing the store, platform and catalogue of the handlers.
    #[must_use]
    pub fn from_context(ctx: &CommandContext) -> Self {
        Self {
            store: ctx.store.clone(),
            platform: Arc::clone(&ctx.platform),
            i18n: Arc::clone(&ctx.i18n),
            locale: ctx.locale,
            broadcast_delay: ctx.broadcast_delay(),
            interval: Duration::from_secs(ctx.settings.scheduler.interval_seconds.max(1)),
        }
    }

    /// Time between two ticks.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Tick until `shutdown` is cancelled. The first tick runs immediately.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.interval, "Scheduler started");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(err) = self.tick().await {
                        error!(error = %err, "Scheduler tick failed");
                    }
                }
            }
        }
        info!("Scheduler stopped");
    }

    /// Run everything due now.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store task is gone.
    pub async fn tick(&self) -> Result<TickReport, StoreError> {
        self.tick_at(Utc::now()).await
    }

    /// Run everything due at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store task is gone.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> Result<TickReport, StoreError> {
        let (due, targets) = self
            .store
            .read(move |doc| {
                let due: Vec<ScheduledAction> = doc
                    .global
                    .schedules
                    .iter()
                    .filter(|action| action.is_due(now))
                    .cloned()
                    .collect();
                (due, doc.announce_channels())
            })
            .await?;

        let mut report = TickReport::default();
        if due.is_empty() {
            return Ok(report);
        }

        for action in &due {
            match self.execute(action, &targets).await {
                Ok(()) => {
                    report.executed += 1;
                    debug!(id = action.id, kind = ?action.kind, "Scheduled action executed");
                }
                Err(err) => {
                    report.failed += 1;
                    warn!(id = action.id, kind = ?action.kind, error = %err, "Scheduled action failed, dropping it");
                }
            }
        }

        let done: HashSet<u64> = due.iter().map(|action| action.id).collect();
        self.store
            .update(move |doc| doc.global.schedules.retain(|action| !done.contains(&action.id)))
            .await?;

        info!(executed = report.executed, failed = report.failed, "Scheduler tick processed due actions");
        Ok(report)
    }

    async fn execute(
        &self,
        action: &ScheduledAction,
        targets: &[(GuildId, ChannelId)],
    ) -> Result<(), OutboundError> {
        match action.kind {
            ActionKind::Broadcast => {
                let content = self.i18n.tr(
                    self.locale,
                    "schedule-announcement",
                    &[("message", action.payload.clone())],
                );
                let report =
                    broadcast(self.platform.as_ref(), targets, &content, self.broadcast_delay).await;
                if report.sent == 0 && report.failed > 0 {
                    return Err(OutboundError::Request(format!(
                        "broadcast reached none of {} channels",
                        report.failed
                    )));
                }
                info!(id = action.id, sent = report.sent, failed = report.failed, "Scheduled broadcast sent");
                Ok(())
            }
            ActionKind::DirectMessage => {
                let Some(user) = action.target else {
                    return Err(OutboundError::NotFound(format!(
                        "target of scheduled action {}",
                        action.id
                    )));
                };
                let content = self.i18n.tr(
                    self.locale,
                    "schedule-dm",
                    &[("message", action.payload.clone())],
                );
                match self.platform.send_direct_message(user, &content).await {
                    Ok(_) => Ok(()),
                    Err(err) if err.is_recipient_unreachable() => {
                        let Some(channel) = action.fallback_channel_id else {
                            return Err(err);
                        };
                        debug!(id = action.id, %user, %channel, "Direct message refused, using fallback channel");
                        let content = self.i18n.tr(
                            self.locale,
                            "schedule-dm-fallback",
                            &[("user", user.mention()), ("message", action.payload.clone())],
                        );
                        self.platform.send_message(channel, &content).await.map(|_| ())
                    }
                    Err(err) => Err(err),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processed_counts_both_outcomes() {
        let report = TickReport {
            executed: 2,
            failed: 1,
        };
        assert_eq!(report.processed(), 3);
        assert_eq!(TickReport::default().processed(), 0);
    }
}
