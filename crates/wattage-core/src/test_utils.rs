//! Shared test helpers for integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these
//! builders are available to unit tests and, via the `test-utils` feature,
//! to downstream integration-test crates.

use crate::account::{PlayerAccount, PlayerProfile};
use crate::economy::EconomyConfig;
use crate::event::EventBus;
use crate::fixed::Fixed64;
use crate::inventory::{InventoryItem, ItemSlot, Rarity};
use chrono::{DateTime, TimeZone, Utc};

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Time helpers
// ===========================================================================

/// A stable reference instant for deterministic tests.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

/// `epoch()` shifted by whole days.
pub fn epoch_plus_days(days: i64) -> DateTime<Utc> {
    epoch() + chrono::Duration::days(days)
}

// ===========================================================================
// Account and item builders
// ===========================================================================

pub fn test_account() -> PlayerAccount {
    PlayerAccount::new(
        PlayerProfile::new("tester", 0),
        EconomyConfig::default(),
        epoch(),
    )
}

pub fn test_account_with(config: EconomyConfig) -> PlayerAccount {
    PlayerAccount::new(PlayerProfile::new("tester", 0), config, epoch())
}

pub fn test_bus() -> EventBus {
    EventBus::new(128)
}

pub fn make_item(
    slot: ItemSlot,
    rarity: Rarity,
    tap_bonus: i64,
    passive_bonus: i64,
    energy_bonus: i64,
) -> InventoryItem {
    let mut item = InventoryItem::new(slot, rarity);
    item.tap_income_bonus = tap_bonus;
    item.passive_income_bonus = passive_bonus;
    item.energy_bonus = energy_bonus;
    item
}
