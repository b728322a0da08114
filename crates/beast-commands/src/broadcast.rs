//! Sending one text to every guild's announcement channel.

use beast_common::{ChannelId, GuildId, Platform};
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of a broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Channels that accepted the message.
    pub sent: usize,
    /// Channels where the send failed.
    pub failed: usize,
}

/// Send `content` to each target in order, pausing `delay` after every
/// successful send. Failures are counted and logged, never retried.
pub async fn broadcast(
    platform: &dyn Platform,
    targets: &[(GuildId, ChannelId)],
    content: &str,
    delay: Duration,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();
    for (guild, channel) in targets {
        match platform.send_message(*channel, content).await {
            Ok(_) => {
                report.sent += 1;
                debug!(%guild, %channel, "Broadcast delivered");
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(err) => {
                report.failed += 1;
                warn!(%guild, %channel, error = %err, "Broadcast send failed");
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use beast_common::test_utils::discord_fixtures::{announce_a, announce_b, guild_a, guild_b};
    use beast_common::test_utils::RecordingPlatform;

    #[tokio::test]
    async fn test_counts_failures_and_continues() {
        let platform = RecordingPlatform::new();
        platform.fail_channel(announce_a());
        let targets = [(guild_a(), announce_a()), (guild_b(), announce_b())];

        let report = broadcast(&platform, &targets, "hi", Duration::ZERO).await;

        assert_eq!(report, BroadcastReport { sent: 1, failed: 1 });
        assert_eq!(platform.messages_in(announce_b()), vec!["hi".to_string()]);
    }
}
