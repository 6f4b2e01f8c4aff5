//! Integration tests for the Wattage core.
//!
//! These exercise end-to-end behavior across the ledger, economy rules,
//! tap session, account orchestrator, events, and snapshots together.

use std::cell::RefCell;
use std::rc::Rc;

use wattage_core::economy::{self, EconomyConfig};
use wattage_core::event::{Event, EventKind};
use wattage_core::inventory::{ItemSlot, Rarity};
use wattage_core::resource::ResourceKind;
use wattage_core::save::SaveData;
use wattage_core::tap::{SessionState, TapConfig, TapSession, TapUpgrade};
use wattage_core::test_utils::*;

// ===========================================================================
// Test 1: a grind session -- hits and energy gate taps together
// ===========================================================================

#[test]
fn grind_session_until_both_gates_close() {
    let mut account = test_account();
    let mut session = TapSession::new(&TapConfig::default(), &account);
    let mut bus = test_bus();
    let now = epoch();

    // Ten hits in the pool, plenty of energy: exactly ten taps land.
    let mut landed = 0;
    for _ in 0..15 {
        if session.handle_tap(&mut account, now, &mut bus) {
            landed += 1;
        }
    }
    assert_eq!(landed, 10);
    assert_eq!(session.state(), SessionState::Depleted);
    assert_eq!(account.resources().get(ResourceKind::Currency), 10);
    assert_eq!(account.resources().get(ResourceKind::Energy), 90);
    assert_eq!(account.stats().total_taps, 10);

    // 25 seconds at 5s per hit: five hits recover, five more taps land.
    session.tick(fixed(25.0), &mut bus);
    assert_eq!(session.hits(), 5);
    for _ in 0..5 {
        assert!(session.handle_tap(&mut account, now, &mut bus));
    }
    assert_eq!(account.stats().total_taps, 15);
}

// ===========================================================================
// Test 2: level-up loop -- one big grant crosses several thresholds
// ===========================================================================

#[test]
fn one_grant_crosses_exactly_the_thresholds_it_covers() {
    let mut account = test_account();
    let mut bus = test_bus();
    let config = account.config().clone();

    let grant: i64 = (1..=3u32).map(|l| economy::xp_for_level(&config, l)).sum();
    account.add_experience(grant, epoch(), &mut bus);

    assert_eq!(account.level(), 4);
    assert_eq!(account.resources().get(ResourceKind::Experience), 0);
    assert_eq!(bus.total_emitted(EventKind::LevelUp), 3);
    // Rewards: 200 + 300 + 400 for reaching levels 2..=4.
    assert_eq!(account.resources().get(ResourceKind::Currency), 900);
}

// ===========================================================================
// Test 3: multi-resource atomicity at the account surface
// ===========================================================================

#[test]
fn partial_spend_never_leaks_through_try_spend_all() {
    let mut account = test_account();
    let mut bus = test_bus();
    let now = epoch();
    account.add_currency(1_000, now, &mut bus);

    let ok = account.try_spend_all(
        &[
            (ResourceKind::Currency, 10),
            (ResourceKind::Energy, 999_999),
        ],
        now,
        &mut bus,
    );
    assert!(!ok);
    assert_eq!(account.resources().get(ResourceKind::Currency), 1_000);
    assert_eq!(account.resources().get(ResourceKind::Energy), 100);

    assert!(account.try_spend_all(
        &[(ResourceKind::Currency, 100), (ResourceKind::Energy, 10)],
        now,
        &mut bus,
    ));
    assert_eq!(account.resources().get(ResourceKind::Currency), 900);
    assert_eq!(account.resources().get(ResourceKind::Energy), 90);
}

// ===========================================================================
// Test 4: equipment economy loop -- equip, upgrade, sell
// ===========================================================================

#[test]
fn equip_upgrade_sell_loop_keeps_caps_consistent() {
    let mut account = test_account();
    let mut bus = test_bus();
    let now = epoch();

    let item = make_item(ItemSlot::Armor, Rarity::Rare, 2, 0, 20);
    let id = item.id;
    account.add_item(item, now, &mut bus);
    account.equip_item(id, now, &mut bus);
    assert_eq!(account.resources().get_max(ResourceKind::Energy), Some(120));
    assert_eq!(account.tap_income(), 3);

    // Upgrade once: tap bonus 2 -> 2 (floor of 2.4), energy 20 -> 22.
    account.add_currency(500, now, &mut bus);
    assert!(account.upgrade_item(id, 500, now, &mut bus));
    assert_eq!(account.resources().get_max(ResourceKind::Energy), Some(122));

    // Sell while equipped: rare level 2 pays 100, cap returns to base.
    account.sell_item(id, now, &mut bus);
    assert_eq!(account.resources().get(ResourceKind::Currency), 100);
    assert_eq!(account.resources().get_max(ResourceKind::Energy), Some(100));
    assert!(account.resources().get(ResourceKind::Energy) <= 100);
}

// ===========================================================================
// Test 5: daily streak and offline income survive a save/load cycle
// ===========================================================================

#[test]
fn streak_and_logout_clock_survive_reload() {
    let mut account = test_account();
    let mut bus = test_bus();
    account.set_income_per_hour(100, epoch());

    for day in 0..3 {
        let bonus = account.claim_daily_bonus(epoch_plus_days(day), &mut bus);
        assert!(bonus.claimed);
        assert_eq!(bonus.streak_day, day as u32 + 1);
    }
    account.record_logout(epoch_plus_days(2));

    let json = SaveData::from_account(&account).encode().unwrap();
    let mut restored = SaveData::decode(&json)
        .unwrap()
        .into_account(EconomyConfig::default());

    // Ten hours after the persisted logout: capped at 4h * 100 * 0.5.
    let later = epoch_plus_days(2) + chrono::Duration::hours(10);
    assert_eq!(restored.apply_offline_income(later, &mut bus), 200);

    // Day 4 continues the streak recorded before the reload.
    let bonus = restored.claim_daily_bonus(epoch_plus_days(3), &mut bus);
    assert_eq!(bonus.streak_day, 4);
}

// ===========================================================================
// Test 6: event ordering -- listeners observe committed state, in order
// ===========================================================================

#[test]
fn listeners_see_state_after_commit_in_registration_order() {
    let mut account = test_account();
    let mut bus = test_bus();
    let seen: Rc<RefCell<Vec<(i64, i64)>>> = Rc::new(RefCell::new(Vec::new()));

    let sink = Rc::clone(&seen);
    bus.subscribe(
        EventKind::ResourceChanged,
        Box::new(move |event| {
            if let Event::ResourceChanged {
                kind: ResourceKind::Currency,
                previous,
                new,
            } = event
            {
                sink.borrow_mut().push((*previous, *new));
            }
        }),
    );

    account.add_currency(40, epoch(), &mut bus);
    account.add_currency(2, epoch(), &mut bus);

    assert_eq!(*seen.borrow(), vec![(0, 40), (40, 42)]);
}

// ===========================================================================
// Test 7: session upgrades change the composed tap outcome
// ===========================================================================

#[test]
fn income_upgrade_composes_with_equipment_bonus() {
    let mut account = test_account();
    let mut bus = test_bus();
    let now = epoch();

    let item = make_item(ItemSlot::Weapon, Rarity::Common, 9, 0, 0);
    let id = item.id;
    account.add_item(item, now, &mut bus);
    account.equip_item(id, now, &mut bus);

    let mut session = TapSession::new(&TapConfig::default(), &account);
    session.apply_upgrade(TapUpgrade::IncomePercent, 0.5, &account, now, &mut bus);

    assert!(session.handle_tap(&mut account, now, &mut bus));
    // Base income 10 (1 + 9 equipment), plus floor(0.5 * 10) = 5 extra.
    assert_eq!(account.resources().get(ResourceKind::Currency), 15);
}

// ===========================================================================
// Test 8: fresh-account fallback path builds a playable default
// ===========================================================================

#[test]
fn default_account_is_immediately_playable() {
    let account = test_account();
    assert_eq!(account.level(), 1);
    assert_eq!(account.resources().get(ResourceKind::Energy), 100);
    assert_eq!(account.xp_to_next_level(), 100);
    assert!(account.inventory().is_empty());

    let session = TapSession::new(&TapConfig::default(), &account);
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.total_taps(), 0);
}
