//! The tap session: a consumable hit pool gating tap actions, timed hit
//! recovery with multi-hit catch-up, and session-level upgrade multipliers.
//!
//! A tap composes: hit availability check -> account tap (energy gate and
//! resource grants) -> supplementary multiplier income -> hit consumption
//! and counter increment. A failed account tap never consumes a hit.
//!
//! The session is re-derived from configuration and account stats at
//! startup; it is not persisted.

use crate::account::PlayerAccount;
use crate::event::{Event, EventBus, TapFailReason};
use crate::fixed::{Seconds, drain_periods, f64_to_fixed64, Fixed64};
use crate::resource::TxnFailure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning constants for the hit pool. Missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    /// Hit pool size before upgrades.
    pub base_max_hits: u32,
    /// Seconds to regain one hit.
    pub hit_recovery_seconds: f64,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            base_max_hits: 10,
            hit_recovery_seconds: 5.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Upgrades
// ---------------------------------------------------------------------------

/// Session-level upgrades. Reversible only by applying an inverse upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapUpgrade {
    /// Adds to the per-tap income multiplier (0.2 = +20%).
    IncomePercent,
    /// Adds flat hits to the pool cap.
    MaxHitsFlat,
    /// Scales the recovery time by (1 + value); negative speeds recovery.
    RecoveryPercent,
    /// Adds to the offline-bonus multiplier.
    OfflinePercent,
}

/// Observable session state: hits remain, or the pool is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Ready,
    Depleted,
}

// ---------------------------------------------------------------------------
// TapSession
// ---------------------------------------------------------------------------

/// The hit-pool state machine. Recovery runs in both states.
#[derive(Debug)]
pub struct TapSession {
    hits: u32,
    max_hits: u32,
    recovery_seconds: Seconds,
    recovery_acc: Seconds,
    income_multiplier: Fixed64,
    offline_multiplier: Fixed64,
    total_taps: u64,
}

impl TapSession {
    /// Derive a session from config, seeding the total-tap counter from the
    /// account's lifetime stats. The pool starts full.
    pub fn new(config: &TapConfig, account: &PlayerAccount) -> Self {
        Self {
            hits: config.base_max_hits,
            max_hits: config.base_max_hits,
            recovery_seconds: f64_to_fixed64(config.hit_recovery_seconds),
            recovery_acc: Seconds::ZERO,
            income_multiplier: Fixed64::ONE,
            offline_multiplier: Fixed64::ONE,
            total_taps: account.stats().total_taps,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.hits > 0 {
            SessionState::Ready
        } else {
            SessionState::Depleted
        }
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn max_hits(&self) -> u32 {
        self.max_hits
    }

    pub fn recovery_seconds(&self) -> Seconds {
        self.recovery_seconds
    }

    pub fn total_taps(&self) -> u64 {
        self.total_taps
    }

    pub fn income_multiplier(&self) -> Fixed64 {
        self.income_multiplier
    }

    /// Advance hit recovery. Whole recovery periods contained in the
    /// accumulated time each restore one hit; the remainder carries over,
    /// so long pauses catch up multiple hits in one call.
    pub fn tick(&mut self, dt: Seconds, bus: &mut EventBus) {
        if dt <= Seconds::ZERO || self.hits >= self.max_hits {
            return;
        }
        self.recovery_acc += dt;
        let recovered = drain_periods(&mut self.recovery_acc, self.recovery_seconds);
        if recovered > 0 {
            let recovered = u32::try_from(recovered).unwrap_or(u32::MAX);
            self.hits = self.hits.saturating_add(recovered).min(self.max_hits);
            bus.emit(Event::HitsChanged {
                current: self.hits,
                max: self.max_hits,
            });
        }
    }

    /// Attempt one tap.
    ///
    /// With an empty pool the account is never consulted. When the account
    /// rejects the tap (energy gate), the hit is NOT consumed. On success:
    /// one hit is spent, the counter advances, and any income multiplier
    /// above 1 pays a supplementary currency grant of
    /// `floor((multiplier - 1) * per-tap income)`.
    pub fn handle_tap(
        &mut self,
        account: &mut PlayerAccount,
        now: DateTime<Utc>,
        bus: &mut EventBus,
    ) -> bool {
        if self.hits == 0 {
            bus.emit(Event::TapFailed {
                reason: TapFailReason::NoHits,
            });
            return false;
        }

        if !account.perform_tap(now, bus) {
            bus.emit(Event::TapFailed {
                reason: TapFailReason::AccountRejected(TxnFailure::Insufficient(
                    crate::resource::ResourceKind::Energy,
                )),
            });
            return false;
        }

        self.hits -= 1;
        self.total_taps += 1;

        let income = account.tap_income();
        let extra = self.supplementary_income(income);
        if extra > 0 {
            account.add_currency(extra, now, bus);
        }

        bus.emit(Event::HitsChanged {
            current: self.hits,
            max: self.max_hits,
        });
        bus.emit(Event::TapSucceeded {
            income: income.saturating_add(extra),
            xp: account.config().xp_per_tap,
        });
        true
    }

    fn supplementary_income(&self, per_tap_income: i64) -> i64 {
        if self.income_multiplier <= Fixed64::ONE {
            return 0;
        }
        let bonus = (self.income_multiplier - Fixed64::ONE)
            .saturating_mul(Fixed64::saturating_from_num(per_tap_income));
        bonus.to_num::<i64>().max(0)
    }

    /// Offline bonus: the account's capped offline income scaled by the
    /// session's offline multiplier, floored.
    pub fn offline_bonus(&self, account: &PlayerAccount, now: DateTime<Utc>) -> i64 {
        let base = account.offline_income(now);
        self.offline_multiplier
            .saturating_mul(Fixed64::saturating_from_num(base))
            .to_num::<i64>()
            .max(0)
    }

    /// Apply one upgrade. There is no built-in undo; reversing requires an
    /// inverse upgrade.
    pub fn apply_upgrade(
        &mut self,
        upgrade: TapUpgrade,
        value: f64,
        account: &PlayerAccount,
        now: DateTime<Utc>,
        bus: &mut EventBus,
    ) {
        match upgrade {
            TapUpgrade::IncomePercent => {
                self.income_multiplier += f64_to_fixed64(value);
            }
            TapUpgrade::MaxHitsFlat => {
                let delta = value as i64;
                let new_max = i64::from(self.max_hits).saturating_add(delta).max(0);
                self.max_hits = u32::try_from(new_max).unwrap_or(u32::MAX);
                self.hits = self.hits.min(self.max_hits);
                bus.emit(Event::HitsChanged {
                    current: self.hits,
                    max: self.max_hits,
                });
            }
            TapUpgrade::RecoveryPercent => {
                let factor = f64_to_fixed64(1.0 + value);
                if factor <= Fixed64::ZERO {
                    warn!(value, "recovery upgrade would zero the timer, ignored");
                    return;
                }
                self.recovery_seconds = self.recovery_seconds.saturating_mul(factor);
            }
            TapUpgrade::OfflinePercent => {
                self.offline_multiplier += f64_to_fixed64(value);
                bus.emit(Event::OfflineBonusChanged(self.offline_bonus(account, now)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::PlayerProfile;
    use crate::economy::EconomyConfig;
    use crate::event::EventKind;
    use crate::resource::ResourceKind;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap()
    }

    fn setup() -> (TapSession, PlayerAccount, EventBus) {
        let account = PlayerAccount::new(
            PlayerProfile::new("tester", 0),
            EconomyConfig::default(),
            t0(),
        );
        let session = TapSession::new(&TapConfig::default(), &account);
        (session, account, EventBus::new(64))
    }

    #[test]
    fn session_starts_full_and_ready() {
        let (session, _, _) = setup();
        assert_eq!(session.hits(), 10);
        assert_eq!(session.max_hits(), 10);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn tap_consumes_one_hit_and_counts() {
        let (mut session, mut account, mut bus) = setup();
        assert!(session.handle_tap(&mut account, t0(), &mut bus));
        assert_eq!(session.hits(), 9);
        assert_eq!(session.total_taps(), 1);
        assert_eq!(account.resources().get(ResourceKind::Currency), 1);
    }

    #[test]
    fn depleted_pool_blocks_taps_without_touching_account() {
        let (mut session, mut account, mut bus) = setup();
        for _ in 0..10 {
            assert!(session.handle_tap(&mut account, t0(), &mut bus));
        }
        assert_eq!(session.state(), SessionState::Depleted);
        let energy_before = account.resources().get(ResourceKind::Energy);
        assert!(!session.handle_tap(&mut account, t0(), &mut bus));
        assert_eq!(account.resources().get(ResourceKind::Energy), energy_before);
        assert_eq!(bus.total_emitted(EventKind::TapFailed), 1);
    }

    #[test]
    fn account_rejection_does_not_consume_a_hit() {
        // Energy gate: zero-energy account with plenty of hits.
        let config = EconomyConfig {
            base_max_energy: 1,
            xp_per_tap: 0,
            ..EconomyConfig::default()
        };
        let mut account = PlayerAccount::new(PlayerProfile::new("tester", 0), config, t0());
        let mut session = TapSession::new(&TapConfig::default(), &account);
        let mut bus = EventBus::new(64);

        assert!(session.handle_tap(&mut account, t0(), &mut bus));
        assert_eq!(session.hits(), 9);
        // Energy exhausted: the tap fails but the hit pool is untouched.
        assert!(!session.handle_tap(&mut account, t0(), &mut bus));
        assert_eq!(session.hits(), 9);
    }

    #[test]
    fn recovery_catch_up_preserves_remainder() {
        let (mut session, mut account, mut bus) = setup();
        for _ in 0..5 {
            session.handle_tap(&mut account, t0(), &mut bus);
        }
        assert_eq!(session.hits(), 5);

        // 17 seconds at 5s per hit: 3 hits back, 2s remainder.
        session.tick(f64_to_fixed64(17.0), &mut bus);
        assert_eq!(session.hits(), 8);
        session.tick(f64_to_fixed64(3.0), &mut bus);
        assert_eq!(session.hits(), 9);
    }

    #[test]
    fn recovery_clamps_at_max() {
        let (mut session, mut account, mut bus) = setup();
        session.handle_tap(&mut account, t0(), &mut bus);
        session.tick(f64_to_fixed64(500.0), &mut bus);
        assert_eq!(session.hits(), 10);
        // Full pool: further ticks accumulate nothing.
        session.tick(f64_to_fixed64(500.0), &mut bus);
        assert_eq!(session.hits(), 10);
    }

    #[test]
    fn income_multiplier_pays_supplementary_currency() {
        let (mut session, mut account, mut bus) = setup();
        // +200%: per-tap income 1 -> extra floor(2.0 * 1) = 2.
        session.apply_upgrade(TapUpgrade::IncomePercent, 2.0, &account, t0(), &mut bus);
        assert!(session.handle_tap(&mut account, t0(), &mut bus));
        assert_eq!(account.resources().get(ResourceKind::Currency), 3);
    }

    #[test]
    fn fractional_multiplier_bonus_floors_to_zero() {
        let (mut session, mut account, mut bus) = setup();
        // +20% of a 1-currency tap floors to 0 extra.
        session.apply_upgrade(TapUpgrade::IncomePercent, 0.2, &account, t0(), &mut bus);
        session.handle_tap(&mut account, t0(), &mut bus);
        assert_eq!(account.resources().get(ResourceKind::Currency), 1);
    }

    #[test]
    fn max_hits_upgrade_and_inverse() {
        let (mut session, account, mut bus) = setup();
        session.apply_upgrade(TapUpgrade::MaxHitsFlat, 5.0, &account, t0(), &mut bus);
        assert_eq!(session.max_hits(), 15);
        // Inverse upgrade clamps current hits to the reduced cap.
        session.apply_upgrade(TapUpgrade::MaxHitsFlat, -8.0, &account, t0(), &mut bus);
        assert_eq!(session.max_hits(), 7);
        assert_eq!(session.hits(), 7);
    }

    #[test]
    fn recovery_upgrade_scales_multiplicatively() {
        let (mut session, account, mut bus) = setup();
        session.apply_upgrade(TapUpgrade::RecoveryPercent, -0.5, &account, t0(), &mut bus);
        assert_eq!(session.recovery_seconds(), f64_to_fixed64(2.5));
        // A degenerate value that would zero the timer is ignored.
        session.apply_upgrade(TapUpgrade::RecoveryPercent, -1.0, &account, t0(), &mut bus);
        assert_eq!(session.recovery_seconds(), f64_to_fixed64(2.5));
    }

    #[test]
    fn offline_bonus_applies_session_multiplier() {
        let (mut session, mut account, mut bus) = setup();
        account.set_income_per_hour(100, t0());
        account.record_logout(t0());
        let later = t0() + chrono::Duration::hours(2);
        // Base offline income: 2 * 100 * 0.5 = 100.
        assert_eq!(session.offline_bonus(&account, later), 100);
        session.apply_upgrade(TapUpgrade::OfflinePercent, 0.5, &account, later, &mut bus);
        assert_eq!(session.offline_bonus(&account, later), 150);
        assert_eq!(bus.total_emitted(EventKind::OfflineBonusChanged), 1);
    }

    #[test]
    fn total_taps_seeded_from_account_history() {
        let (_, mut account, mut bus) = setup();
        for _ in 0..3 {
            account.perform_tap(t0(), &mut bus);
        }
        let session = TapSession::new(&TapConfig::default(), &account);
        assert_eq!(session.total_taps(), 3);
    }
}
