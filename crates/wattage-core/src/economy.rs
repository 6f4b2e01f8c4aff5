//! Pure economy rules: derived values computed from configuration and plain
//! data. No mutable state lives here; the [`crate::account::PlayerAccount`]
//! orchestrator calls these and commits the results through the ledger.

use crate::inventory::{InventoryItem, Rarity};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning constants for the economy. Every field has a documented default so
/// a missing or partial config file never crashes startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Base XP required to clear level 1.
    pub base_xp_for_level: i64,
    /// Growth exponent for the XP curve: `base * level^growth`.
    pub xp_growth: f64,
    /// Currency reward for reaching a level: `level * multiplier`.
    pub level_up_reward_multiplier: i64,
    /// Refill energy to its cap on level-up.
    pub restore_energy_on_level_up: bool,

    /// Currency granted per tap before equipment bonuses.
    pub base_income_per_tap: i64,
    /// XP granted per tap.
    pub xp_per_tap: i64,
    /// Energy consumed per tap.
    pub energy_cost_per_tap: i64,

    /// Energy cap before equipment bonuses.
    pub base_max_energy: i64,
    /// Seconds to regenerate one unit of energy.
    pub energy_restore_seconds: f64,

    /// Offline income accrues for at most this many hours.
    pub max_offline_hours: f64,
    /// Fraction of active hourly income earned while offline.
    pub offline_income_multiplier: f64,
    /// Elapsed offline time below this many hours yields nothing, so a
    /// near-instant reconnect does not produce spurious income.
    pub offline_deadzone_hours: f64,

    /// Daily bonus pays `streak_day * base_reward`.
    pub daily_bonus_base_reward: i64,
    /// Flat currency reward per invited friend.
    pub friend_invite_reward: i64,

    /// Per-upgrade growth of an item's tap income bonus.
    pub tap_bonus_growth: f64,
    /// Per-upgrade growth of an item's passive income bonus.
    pub passive_bonus_growth: f64,
    /// Per-upgrade growth of an item's energy capacity bonus.
    pub energy_bonus_growth: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            base_xp_for_level: 100,
            xp_growth: 1.5,
            level_up_reward_multiplier: 100,
            restore_energy_on_level_up: true,
            base_income_per_tap: 1,
            xp_per_tap: 1,
            energy_cost_per_tap: 1,
            base_max_energy: 100,
            energy_restore_seconds: 1.0,
            max_offline_hours: 4.0,
            offline_income_multiplier: 0.5,
            offline_deadzone_hours: 0.1,
            daily_bonus_base_reward: 500,
            friend_invite_reward: 1000,
            tap_bonus_growth: 1.2,
            passive_bonus_growth: 1.2,
            energy_bonus_growth: 1.1,
        }
    }
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

/// XP required to clear the given level: `floor(base * level^growth)`.
/// Strictly increasing for level >= 1 whenever `growth > 0`.
pub fn xp_for_level(config: &EconomyConfig, level: u32) -> i64 {
    let scaled = config.base_xp_for_level as f64 * f64::from(level).powf(config.xp_growth);
    scaled.floor() as i64
}

/// Currency reward for reaching a level.
pub fn level_up_reward(config: &EconomyConfig, level: u32) -> i64 {
    i64::from(level).saturating_mul(config.level_up_reward_multiplier)
}

/// Currency accrued over `hours_elapsed` hours offline, capped at the
/// configured maximum and scaled by the offline multiplier. Returns 0 inside
/// the dead-zone.
pub fn offline_income(config: &EconomyConfig, hours_elapsed: f64, income_per_hour: i64) -> i64 {
    if hours_elapsed < config.offline_deadzone_hours {
        return 0;
    }
    let hours = hours_elapsed.min(config.max_offline_hours);
    (hours * income_per_hour as f64 * config.offline_income_multiplier).floor() as i64
}

/// Sum of one bonus field over the items equipped in their own slots.
///
/// Equipping already enforces that an item only occupies its own type's
/// slot, so no cross-slot filtering happens here.
pub fn equipment_bonus<'a, I>(equipped: I, bonus: fn(&InventoryItem) -> i64) -> i64
where
    I: Iterator<Item = &'a InventoryItem>,
{
    equipped.map(bonus).fold(0i64, i64::saturating_add)
}

/// Sell price of an item: rarity multiplier times item level.
pub fn sell_price(rarity: Rarity, level: u32) -> i64 {
    let multiplier: i64 = match rarity {
        Rarity::Common => 10,
        Rarity::Uncommon => 25,
        Rarity::Rare => 50,
        Rarity::Epic => 100,
        Rarity::Legendary => 250,
    };
    multiplier.saturating_mul(i64::from(level))
}

/// Apply one upgrade to an item: level +1, bonuses scaled by the configured
/// growth factors (energy grows slower than income).
pub fn upgrade_item(config: &EconomyConfig, item: &mut InventoryItem) {
    item.level += 1;
    item.tap_income_bonus = scale(item.tap_income_bonus, config.tap_bonus_growth);
    item.passive_income_bonus = scale(item.passive_income_bonus, config.passive_bonus_growth);
    item.energy_bonus = scale(item.energy_bonus, config.energy_bonus_growth);
}

fn scale(value: i64, factor: f64) -> i64 {
    (value as f64 * factor).floor() as i64
}
