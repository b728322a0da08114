//! Per-user command cooldowns.

use beast_common::{normalize_command_name, Scope, UserId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cooldown key: one window per scope, user and command.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CooldownKey {
    scope: Scope,
    user: UserId,
    command: String,
}

/// In-memory cooldown windows. Lost on restart.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    /// Instant at which each key is permitted again.
    expiries: DashMap<CooldownKey, Instant>,
}

impl CooldownTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds until `command` is permitted again, or 0 when it is permitted
    /// now, in which case a new window of `window_seconds` starts.
    pub fn check(&self, scope: Scope, user: UserId, command: &str, window_seconds: u64) -> u64 {
        self.check_at(scope, user, command, window_seconds, Instant::now())
    }

    /// [`check`](Self::check) against an explicit clock. A repeated check during a
    /// window never moves its expiry.
    pub fn check_at(
        &self,
        scope: Scope,
        user: UserId,
        command: &str,
        window_seconds: u64,
        now: Instant,
    ) -> u64 {
        if window_seconds == 0 {
            return 0;
        }
        let key = CooldownKey {
            scope,
            user,
            command: normalize_command_name(command),
        };
        let next = now + Duration::from_secs(window_seconds);
        match self.expiries.entry(key) {
            Entry::Occupied(mut entry) => {
                let expiry = *entry.get();
                if expiry > now {
                    let remaining = ceil_seconds(expiry - now);
                    debug!(%scope, %user, command, remaining, "Command on cooldown");
                    remaining
                } else {
                    entry.insert(next);
                    0
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(next);
                0
            }
        }
    }

    /// Seconds left in the current window, without starting a new one.
    pub fn remaining(&self, scope: Scope, user: UserId, command: &str, window_seconds: u64) -> u64 {
        self.remaining_at(scope, user, command, window_seconds, Instant::now())
    }

    /// [`remaining`](Self::remaining) against an explicit clock.
    pub fn remaining_at(
        &self,
        scope: Scope,
        user: UserId,
        command: &str,
        window_seconds: u64,
        now: Instant,
    ) -> u64 {
        if window_seconds == 0 {
            return 0;
        }
        let key = CooldownKey {
            scope,
            user,
            command: normalize_command_name(command),
        };
        self.expiries
            .get(&key)
            .map_or(0, |expiry| if *expiry > now { ceil_seconds(*expiry - now) } else { 0 })
    }

    /// Drop windows that have elapsed. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    /// [`sweep_expired`](Self::sweep_expired) against an explicit clock.
    pub fn sweep_expired_at(&self, now: Instant) -> usize {
        let before = self.expiries.len();
        self.expiries.retain(|_, expiry| *expiry > now);
        let removed = before.saturating_sub(self.expiries.len());
        if removed > 0 {
            debug!(removed, "Swept expired cooldowns");
        }
        removed
    }

    /// Number of tracked windows, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }
}

fn ceil_seconds(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beast_common::test_utils::discord_fixtures::{guild_a, guild_b, member_id};
    use beast_common::test_utils::property_testing::{command_name_strategy, user_id_strategy};
    use proptest::prelude::*;

    const WINDOW: u64 = 10;

    #[test]
    fn test_window_is_not_extended_by_repeated_checks() {
        let tracker = CooldownTracker::new();
        let scope = Scope::Guild(guild_a());
        let start = Instant::now();

        assert_eq!(tracker.check_at(scope, member_id(), "ping", WINDOW, start), 0);
        assert_eq!(
            tracker.check_at(scope, member_id(), "ping", WINDOW, start + Duration::from_millis(2500)),
            8
        );
        assert_eq!(
            tracker.check_at(scope, member_id(), "ping", WINDOW, start + Duration::from_secs(9)),
            1
        );
        assert_eq!(
            tracker.check_at(scope, member_id(), "ping", WINDOW, start + Duration::from_secs(10)),
            0
        );
    }

    #[test]
    fn test_remaining_does_not_start_a_window() {
        let tracker = CooldownTracker::new();
        let start = Instant::now();
        assert_eq!(tracker.remaining_at(Scope::Global, member_id(), "ping", WINDOW, start), 0);
        assert!(tracker.is_empty());

        tracker.check_at(Scope::Global, member_id(), "ping", WINDOW, start);
        assert_eq!(
            tracker.remaining_at(Scope::Global, member_id(), "/PING", WINDOW, start + Duration::from_secs(4)),
            6
        );
        assert_eq!(
            tracker.remaining_at(Scope::Global, member_id(), "ping", WINDOW, start + Duration::from_secs(10)),
            0
        );
    }

    #[test]
    fn test_keys_are_independent() {
        let tracker = CooldownTracker::new();
        let now = Instant::now();
        assert_eq!(tracker.check_at(Scope::Guild(guild_a()), member_id(), "ping", WINDOW, now), 0);
        assert_eq!(tracker.check_at(Scope::Guild(guild_b()), member_id(), "ping", WINDOW, now), 0);
        assert_eq!(tracker.check_at(Scope::Guild(guild_a()), member_id(), "8ball", WINDOW, now), 0);
        assert_eq!(tracker.check_at(Scope::Guild(guild_a()), member_id(), "/PING", WINDOW, now), 10);
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn test_zero_window_is_always_permitted() {
        let tracker = CooldownTracker::new();
        let now = Instant::now();
        for _ in 0..3 {
            assert_eq!(tracker.check_at(Scope::Global, member_id(), "ping", 0, now), 0);
        }
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let tracker = CooldownTracker::new();
        let now = Instant::now();
        tracker.check_at(Scope::Global, member_id(), "ping", 5, now);
        tracker.check_at(Scope::Global, member_id(), "coinflip", 60, now);
        assert_eq!(tracker.sweep_expired_at(now + Duration::from_secs(30)), 1);
        assert_eq!(tracker.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_remaining_never_exceeds_window(offset_ms in 0u64..20_000) {
            let tracker = CooldownTracker::new();
            let start = Instant::now();
            tracker.check_at(Scope::Global, member_id(), "ping", WINDOW, start);
            let remaining = tracker.check_at(
                Scope::Global,
                member_id(),
                "ping",
                WINDOW,
                start + Duration::from_millis(offset_ms),
            );
            prop_assert!(remaining <= WINDOW);
            prop_assert_eq!(remaining == 0, offset_ms >= WINDOW * 1000);
        }

        #[test]
        fn prop_spellings_of_a_command_share_one_window(
            name in command_name_strategy(),
            user in user_id_strategy(),
        ) {
            let tracker = CooldownTracker::new();
            let now = Instant::now();
            prop_assert_eq!(tracker.check_at(Scope::Global, user, &name, WINDOW, now), 0);
            let shouted = format!("  {}  ", name.to_uppercase());
            prop_assert_eq!(tracker.check_at(Scope::Global, user, &shouted, WINDOW, now), WINDOW);
        }

        #[test]
        fn prop_users_never_share_a_window(
            first in user_id_strategy(),
            second in user_id_strategy(),
            name in command_name_strategy(),
        ) {
            prop_assume!(first != second);
            let tracker = CooldownTracker::new();
            let now = Instant::now();
            prop_assert_eq!(tracker.check_at(Scope::Global, first, &name, WINDOW, now), 0);
            prop_assert_eq!(tracker.check_at(Scope::Global, second, &name, WINDOW, now), 0);
            prop_assert_eq!(tracker.len(), 2);
        }
    }
}
