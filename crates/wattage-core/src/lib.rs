//! Wattage Core -- the resource ledger and tap-economy engine for idle games.
//!
//! This crate provides the validated resource ledger, pure economy rules,
//! the hit-gated tap session, and the player-account orchestrator that ties
//! them together, along with events, configuration, and versioned snapshots.
//!
//! # Architecture
//!
//! - [`resource::ResourceLedger`] -- current/maximum values per
//!   [`resource::ResourceKind`], with validated add/spend/set, all-or-nothing
//!   multi-resource spends, and an immutable [`resource::Transaction`] audit
//!   record per operation.
//! - [`economy`] -- pure functions deriving XP thresholds, level rewards,
//!   offline income, equipment bonuses, sell prices, and item upgrades from
//!   an [`economy::EconomyConfig`].
//! - [`tap::TapSession`] -- the consumable hit pool gating taps, with timed
//!   multi-hit recovery and session-level upgrade multipliers.
//! - [`account::PlayerAccount`] -- the orchestrator owning canonical player
//!   state; the only type external collaborators talk to.
//! - [`event::EventBus`] -- per-kind ring buffers plus synchronous,
//!   registration-order listener delivery after every committed change.
//! - [`save::SaveData`] -- versioned JSON snapshots with invariant-safe
//!   restore.
//!
//! # Threading
//!
//! Single-threaded and cooperative: state advances through an external
//! per-frame `tick(dt)` and discrete user-triggered calls. Every operation
//! completes synchronously; events are delivered in the same call, after
//! the state change they describe.
//!
//! # Failure model
//!
//! Expected gameplay failures (insufficient funds, unknown ids, an
//! already-claimed bonus) are in-band values -- failed transactions or
//! `false` -- logged at warning level. Panics are reserved for broken
//! internal invariants.

pub mod account;
pub mod config;
pub mod economy;
pub mod event;
pub mod fixed;
pub mod id;
pub mod inventory;
pub mod resource;
pub mod save;
pub mod tap;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
