//! The player account: the single orchestrator that owns the canonical
//! player state and composes the ledger, economy rules, and inventory.
//!
//! External collaborators (presentation, persistence, the tap session) talk
//! only to this type. Every fallible operation returns an explicit success
//! indicator; expected failures (insufficient funds, unknown item id,
//! already-claimed bonus) are silent no-ops apart from a warning log.
//!
//! All operations that consult wall-clock time take `now` as a parameter,
//! so behavior is deterministic and directly testable.

use crate::economy::{self, EconomyConfig};
use crate::event::{Event, EventBus};
use crate::fixed::{Seconds, drain_periods, f64_to_fixed64};
use crate::id::{ItemId, PlayerId};
use crate::inventory::{Inventory, InventoryItem, ItemSlot};
use crate::resource::{ResourceKind, ResourceLedger, Transaction};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Profile and stats
// ---------------------------------------------------------------------------

/// Player identity and external-platform linkage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlayerProfile {
    pub player_id: PlayerId,
    pub nickname: String,
    /// External platform user id (0 when unlinked).
    pub platform_user_id: i64,
    pub wallet_address: Option<String>,
    pub avatar_url: Option<String>,
}

impl PlayerProfile {
    pub fn new(nickname: impl Into<String>, platform_user_id: i64) -> Self {
        Self {
            player_id: PlayerId::new(),
            nickname: nickname.into(),
            platform_user_id,
            wallet_address: None,
            avatar_url: None,
        }
    }
}

/// Lifetime counters kept for analytics and progression display.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub total_taps: u64,
    pub total_play_time_seconds: i64,
    /// Passive hourly income; feeds the offline-income computation.
    pub income_per_hour: i64,
    pub upgrades_purchased: u32,
    pub friends_count: u32,
    /// Current tournament position; 0 means unranked.
    pub tournament_rank: u32,
    pub best_tournament_rank: u32,
}

/// Outcome of a daily-bonus claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyBonus {
    pub claimed: bool,
    pub streak_day: u32,
    pub reward: i64,
}

// ---------------------------------------------------------------------------
// PlayerAccount
// ---------------------------------------------------------------------------

/// Canonical, long-lived player state. Created fresh for a new player or
/// rebuilt from a persisted snapshot (`crate::save`).
#[derive(Debug)]
pub struct PlayerAccount {
    profile: PlayerProfile,
    level: u32,
    xp_to_next_level: i64,
    ledger: ResourceLedger,
    inventory: Inventory,
    stats: PlayerStats,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login: DateTime<Utc>,
    last_logout: DateTime<Utc>,
    /// 0 until the first claim, then 1-7.
    daily_streak: u32,
    last_daily_bonus: Option<DateTime<Utc>>,
    energy_restore_interval: Seconds,
    energy_restore_acc: Seconds,
    play_time_acc: Seconds,
    config: EconomyConfig,
}

/// Snapshot fields needed to rebuild an account. Produced by `crate::save`.
pub(crate) struct AccountParts {
    pub profile: PlayerProfile,
    pub level: u32,
    pub currency: i64,
    pub energy: i64,
    pub experience: i64,
    pub token_micro: i64,
    pub stats: PlayerStats,
    pub inventory: Inventory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub last_logout: DateTime<Utc>,
    pub daily_streak: u32,
    pub last_daily_bonus: Option<DateTime<Utc>>,
}

impl PlayerAccount {
    /// A brand-new level-1 account with full energy and empty inventory.
    pub fn new(profile: PlayerProfile, config: EconomyConfig, now: DateTime<Utc>) -> Self {
        let xp_to_next_level = economy::xp_for_level(&config, 1);
        let ledger = ResourceLedger::new(config.base_max_energy);
        let energy_restore_interval = f64_to_fixed64(config.energy_restore_seconds);
        info!(player = %profile.player_id, nickname = %profile.nickname, "created new player");
        Self {
            profile,
            level: 1,
            xp_to_next_level,
            ledger,
            inventory: Inventory::new(),
            stats: PlayerStats::default(),
            created_at: now,
            updated_at: now,
            last_login: now,
            last_logout: now,
            daily_streak: 0,
            last_daily_bonus: None,
            energy_restore_interval,
            energy_restore_acc: Seconds::ZERO,
            play_time_acc: Seconds::ZERO,
            config,
        }
    }

    /// Rebuild from persisted parts. The energy cap and the XP threshold are
    /// recomputed from config and equipment rather than trusted from the
    /// snapshot; resource values are clamped into their valid ranges.
    pub(crate) fn from_parts(parts: AccountParts, config: EconomyConfig) -> Self {
        let level = parts.level.max(1);
        let inventory = parts.inventory;
        let equipped_energy: i64 =
            economy::equipment_bonus(inventory.equipped_items(), |i| i.energy_bonus);
        let max_energy = config.base_max_energy.saturating_add(equipped_energy);
        let ledger = ResourceLedger::from_saved(
            parts.currency,
            parts.energy,
            parts.experience,
            parts.token_micro,
            max_energy,
        );
        let xp_to_next_level = economy::xp_for_level(&config, level);
        let energy_restore_interval = f64_to_fixed64(config.energy_restore_seconds);
        Self {
            profile: parts.profile,
            level,
            xp_to_next_level,
            ledger,
            inventory,
            stats: parts.stats,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
            last_login: parts.last_login,
            last_logout: parts.last_logout,
            daily_streak: parts.daily_streak.min(7),
            last_daily_bonus: parts.last_daily_bonus,
            energy_restore_interval,
            energy_restore_acc: Seconds::ZERO,
            play_time_acc: Seconds::ZERO,
            config,
        }
    }

    // -- Accessors ---------------------------------------------------------

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn xp_to_next_level(&self) -> i64 {
        self.xp_to_next_level
    }

    pub fn resources(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn daily_streak(&self) -> u32 {
        self.daily_streak
    }

    pub fn last_daily_bonus(&self) -> Option<DateTime<Utc>> {
        self.last_daily_bonus
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn last_login(&self) -> DateTime<Utc> {
        self.last_login
    }

    pub fn last_logout(&self) -> DateTime<Utc> {
        self.last_logout
    }

    /// Full per-tap currency income: base plus equipped tap-income bonuses.
    pub fn tap_income(&self) -> i64 {
        let bonus =
            economy::equipment_bonus(self.inventory.equipped_items(), |i| i.tap_income_bonus);
        self.config.base_income_per_tap.saturating_add(bonus)
    }

    // -- Tap and progression -----------------------------------------------

    /// One tap: spend the energy cost, credit currency and XP, run the
    /// level-up loop. Fails without side effects when energy is short.
    pub fn perform_tap(&mut self, now: DateTime<Utc>, bus: &mut EventBus) -> bool {
        let cost = self.config.energy_cost_per_tap;
        if !self.ledger.has_enough(ResourceKind::Energy, cost) {
            return false;
        }
        let spent = self.ledger.spend(ResourceKind::Energy, cost, now, true, bus);
        debug_assert!(spent.succeeded());

        let income = self.tap_income();
        self.ledger.add(ResourceKind::Currency, income, now, true, bus);
        self.add_experience(self.config.xp_per_tap, now, bus);
        self.stats.total_taps += 1;
        self.touch(now);
        true
    }

    /// Credit currency directly (level rewards, offline income, bonuses).
    pub fn add_currency(
        &mut self,
        amount: i64,
        now: DateTime<Utc>,
        bus: &mut EventBus,
    ) -> Transaction {
        let txn = self.ledger.add(ResourceKind::Currency, amount, now, true, bus);
        if txn.succeeded() {
            self.touch(now);
        }
        txn
    }

    /// Credit fractional tokens. The decimal amount is floored toward zero
    /// at micro-unit (1e-6) precision before hitting the ledger.
    pub fn add_tokens(
        &mut self,
        amount: rust_decimal::Decimal,
        now: DateTime<Utc>,
        bus: &mut EventBus,
    ) -> Transaction {
        let micro = crate::fixed::micro_from_decimal(amount);
        let txn = self.ledger.add(ResourceKind::Token, micro, now, true, bus);
        if txn.succeeded() {
            self.touch(now);
        }
        txn
    }

    /// Grant XP and resolve as many level-ups as the new total crosses.
    pub fn add_experience(&mut self, amount: i64, now: DateTime<Utc>, bus: &mut EventBus) {
        if amount <= 0 {
            return;
        }
        self.ledger.add(ResourceKind::Experience, amount, now, true, bus);
        while self.ledger.get(ResourceKind::Experience) >= self.xp_to_next_level {
            if self.xp_to_next_level <= 0 {
                warn!(level = self.level, "non-positive XP threshold, level loop aborted");
                break;
            }
            self.level_up(now, bus);
        }
        self.touch(now);
    }

    fn level_up(&mut self, now: DateTime<Utc>, bus: &mut EventBus) {
        let consumed =
            self.ledger
                .spend(ResourceKind::Experience, self.xp_to_next_level, now, true, bus);
        debug_assert!(consumed.succeeded());

        self.level += 1;
        self.xp_to_next_level = economy::xp_for_level(&self.config, self.level);

        let reward = economy::level_up_reward(&self.config, self.level);
        self.ledger.add(ResourceKind::Currency, reward, now, true, bus);

        if self.config.restore_energy_on_level_up {
            let max = self
                .ledger
                .get_max(ResourceKind::Energy)
                .unwrap_or(self.config.base_max_energy);
            self.ledger.set(ResourceKind::Energy, max, true, bus);
        }

        info!(level = self.level, reward, "level up");
        bus.emit(Event::LevelUp {
            level: self.level,
            reward,
        });
        bus.emit(Event::DataChanged);
    }

    /// Atomically spend several resources, or nothing. Delegates to the
    /// ledger's two-phase check-then-commit.
    pub fn try_spend_all(
        &mut self,
        costs: &[(ResourceKind, i64)],
        now: DateTime<Utc>,
        bus: &mut EventBus,
    ) -> bool {
        let ok = self.ledger.try_spend_all(costs, now, bus);
        if ok {
            self.touch(now);
        }
        ok
    }

    // -- Inventory ---------------------------------------------------------

    /// Add an item to the inventory without equipping it.
    pub fn add_item(&mut self, item: InventoryItem, now: DateTime<Utc>, bus: &mut EventBus) {
        self.inventory.add(item);
        self.touch(now);
        bus.emit(Event::DataChanged);
    }

    /// Equip an owned item in its own slot and recompute the energy cap.
    pub fn equip_item(&mut self, id: ItemId, now: DateTime<Utc>, bus: &mut EventBus) -> bool {
        if !self.inventory.equip(id) {
            warn!(item = %id, "equip failed: unknown item");
            return false;
        }
        self.recalculate_max_energy(bus);
        self.touch(now);
        bus.emit(Event::DataChanged);
        true
    }

    /// Clear a slot and recompute the energy cap.
    pub fn unequip_slot(&mut self, slot: ItemSlot, now: DateTime<Utc>, bus: &mut EventBus) {
        self.inventory.unequip(slot);
        self.recalculate_max_energy(bus);
        self.touch(now);
        bus.emit(Event::DataChanged);
    }

    /// Pay `cost` currency and upgrade the item. Fails (without spending)
    /// when the item is unknown; fails when currency is short.
    pub fn upgrade_item(
        &mut self,
        id: ItemId,
        cost: i64,
        now: DateTime<Utc>,
        bus: &mut EventBus,
    ) -> bool {
        if self.inventory.get(id).is_none() {
            warn!(item = %id, "upgrade failed: unknown item");
            return false;
        }
        if !self.ledger.spend(ResourceKind::Currency, cost, now, true, bus).succeeded() {
            return false;
        }
        let config = self.config.clone();
        let item = self
            .inventory
            .get_mut(id)
            .unwrap_or_else(|| unreachable!("item presence checked above"));
        economy::upgrade_item(&config, item);
        self.stats.upgrades_purchased += 1;
        self.recalculate_max_energy(bus);
        self.touch(now);
        bus.emit(Event::DataChanged);
        true
    }

    /// Sell an item: unequip if needed, credit the sell price, remove it.
    /// Unknown ids are a logged no-op.
    pub fn sell_item(&mut self, id: ItemId, now: DateTime<Utc>, bus: &mut EventBus) {
        let Some(item) = self.inventory.remove(id) else {
            warn!(item = %id, "sell failed: unknown item");
            return;
        };
        let price = economy::sell_price(item.rarity, item.level);
        self.ledger.add(ResourceKind::Currency, price, now, true, bus);
        self.recalculate_max_energy(bus);
        self.touch(now);
        bus.emit(Event::DataChanged);
    }

    fn recalculate_max_energy(&mut self, bus: &mut EventBus) {
        let bonus = economy::equipment_bonus(self.inventory.equipped_items(), |i| i.energy_bonus);
        let max = self.config.base_max_energy.saturating_add(bonus);
        self.ledger.set_max(ResourceKind::Energy, max, bus);
    }

    // -- Daily bonus and offline income ------------------------------------

    /// Claim the daily login bonus at UTC-date granularity.
    ///
    /// Same-day repeat claims fail and leave the streak untouched. A gap of
    /// exactly one day continues the streak; any larger gap resets it to 1.
    /// The streak wraps 7 -> 1.
    pub fn claim_daily_bonus(&mut self, now: DateTime<Utc>, bus: &mut EventBus) -> DailyBonus {
        let today = now.date_naive();
        if let Some(last) = self.last_daily_bonus {
            if last.date_naive() == today {
                return DailyBonus {
                    claimed: false,
                    streak_day: self.daily_streak,
                    reward: 0,
                };
            }
        }

        let continued = self
            .last_daily_bonus
            .map(|last| Some(last.date_naive()) == today.pred_opt())
            .unwrap_or(false);
        self.daily_streak = if continued { self.daily_streak + 1 } else { 1 };
        if self.daily_streak > 7 {
            self.daily_streak = 1;
        }

        let reward =
            i64::from(self.daily_streak).saturating_mul(self.config.daily_bonus_base_reward);
        self.ledger.add(ResourceKind::Currency, reward, now, true, bus);
        self.last_daily_bonus = Some(now);
        self.touch(now);
        info!(streak = self.daily_streak, reward, "daily bonus claimed");
        bus.emit(Event::DailyBonusClaimed {
            streak_day: self.daily_streak,
            reward,
        });
        bus.emit(Event::DataChanged);
        DailyBonus {
            claimed: true,
            streak_day: self.daily_streak,
            reward,
        }
    }

    /// Currency owed for time spent offline since the last logout, capped
    /// and scaled per config. Pure; does not credit anything.
    pub fn offline_income(&self, now: DateTime<Utc>) -> i64 {
        let elapsed = now - self.last_logout;
        let hours = elapsed.num_milliseconds() as f64 / 3_600_000.0;
        economy::offline_income(&self.config, hours, self.stats.income_per_hour)
    }

    /// Credit the offline income once (the load path calls this after a
    /// successful restore). Returns the amount credited.
    pub fn apply_offline_income(&mut self, now: DateTime<Utc>, bus: &mut EventBus) -> i64 {
        let income = self.offline_income(now);
        if income > 0 {
            self.ledger.add(ResourceKind::Currency, income, now, true, bus);
            self.touch(now);
            info!(income, "offline income credited");
        }
        income
    }

    // -- Session lifecycle -------------------------------------------------

    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login = now;
        self.touch(now);
    }

    pub fn record_logout(&mut self, now: DateTime<Utc>) {
        self.last_logout = now;
        self.touch(now);
    }

    /// Per-frame upkeep: accumulate play time and regenerate energy on the
    /// configured per-unit interval, with multi-unit catch-up. The restore
    /// timer holds at zero while energy is full, so a full tank does not
    /// bank regeneration.
    pub fn tick(&mut self, dt: Seconds, now: DateTime<Utc>, bus: &mut EventBus) {
        if dt <= Seconds::ZERO {
            return;
        }

        self.play_time_acc += dt;
        let whole_seconds = drain_periods(&mut self.play_time_acc, Seconds::ONE);
        self.stats.total_play_time_seconds =
            self.stats.total_play_time_seconds.saturating_add(whole_seconds);

        let max = self
            .ledger
            .get_max(ResourceKind::Energy)
            .unwrap_or(self.config.base_max_energy);
        if self.ledger.get(ResourceKind::Energy) >= max {
            self.energy_restore_acc = Seconds::ZERO;
            return;
        }
        self.energy_restore_acc += dt;
        let units = drain_periods(&mut self.energy_restore_acc, self.energy_restore_interval);
        if units > 0 {
            self.ledger.add(ResourceKind::Energy, units, now, true, bus);
        }
    }

    // -- Platform supplements ----------------------------------------------

    /// Link an external wallet address. Empty addresses are rejected.
    pub fn connect_wallet(
        &mut self,
        address: &str,
        now: DateTime<Utc>,
        bus: &mut EventBus,
    ) -> bool {
        if address.is_empty() {
            warn!("wallet connect rejected: empty address");
            return false;
        }
        self.profile.wallet_address = Some(address.to_owned());
        self.touch(now);
        bus.emit(Event::DataChanged);
        true
    }

    /// Record a referred friend and grant the flat invite reward.
    pub fn invite_friend(&mut self, now: DateTime<Utc>, bus: &mut EventBus) {
        self.stats.friends_count += 1;
        let reward = self.config.friend_invite_reward;
        self.ledger.add(ResourceKind::Currency, reward, now, true, bus);
        self.touch(now);
        bus.emit(Event::DataChanged);
    }

    /// Update the tournament position, tracking the best (lowest) rank.
    pub fn update_tournament_rank(&mut self, rank: u32, now: DateTime<Utc>, bus: &mut EventBus) {
        self.stats.tournament_rank = rank;
        if self.stats.best_tournament_rank == 0 || rank < self.stats.best_tournament_rank {
            self.stats.best_tournament_rank = rank;
        }
        self.touch(now);
        bus.emit(Event::DataChanged);
    }

    /// Adjust the passive hourly income (set by passive-income upgrades).
    pub fn set_income_per_hour(&mut self, income: i64, now: DateTime<Utc>) {
        self.stats.income_per_hour = income.max(0);
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
