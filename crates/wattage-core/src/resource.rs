//! The resource ledger: current/maximum values per resource kind, with
//! validated add/spend/set operations and an immutable [`Transaction`]
//! audit record for every operation.
//!
//! # Invariants
//!
//! - Every resource value is always >= 0. Operations that would drive a
//!   value negative fail without mutating state; nothing is clamped silently.
//! - If a kind has a configured maximum, current <= maximum at all times.
//!   [`ResourceLedger::add`] clamps to the maximum; [`ResourceLedger::set_max`]
//!   re-clamps current downward and emits a change event for the forced
//!   reduction.
//! - Token amounts are stored as i64 micro-units (1e-6) and exposed as
//!   decimals; see [`crate::fixed`] for the drift-free conversions.
//!
//! Expected failures (negative amounts, insufficient funds) are reported as
//! failed transactions, never as panics or `Err`. The `Premium` kind is
//! reserved: it reads as zero and every write fails.

use crate::event::{Event, EventBus};
use crate::fixed::decimal_from_micro;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// Resource kinds
// ---------------------------------------------------------------------------

/// The closed set of player resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Main game currency (Watts).
    Currency,
    /// Energy consumed by taps.
    Energy,
    /// Experience toward the next level.
    Experience,
    /// Fractional token balance, stored in micro-units.
    Token,
    /// Reserved for a future premium currency. Reads as 0; writes fail.
    Premium,
}

impl ResourceKind {
    /// All resource kinds, in declaration order.
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Currency,
        ResourceKind::Energy,
        ResourceKind::Experience,
        ResourceKind::Token,
        ResourceKind::Premium,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Currency => "currency",
            ResourceKind::Energy => "energy",
            ResourceKind::Experience => "experience",
            ResourceKind::Token => "token",
            ResourceKind::Premium => "premium",
        };
        f.write_str(name)
    }
}

const KIND_COUNT: usize = 5;

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Why a ledger operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnFailure {
    /// The requested amount was negative.
    NegativeAmount,
    /// The balance of the named kind was below the requested amount.
    Insufficient(ResourceKind),
    /// Write to a reserved, unimplemented kind.
    Unimplemented,
}

impl std::fmt::Display for TxnFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxnFailure::NegativeAmount => f.write_str("negative amount"),
            TxnFailure::Insufficient(kind) => write!(f, "insufficient {kind}"),
            TxnFailure::Unimplemented => f.write_str("unimplemented resource kind"),
        }
    }
}

/// Immutable record of one completed or failed ledger operation.
///
/// Purely for observability and audit; never used for rollback.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub kind: ResourceKind,
    /// Signed delta: negative for spends.
    pub amount: i64,
    pub previous: i64,
    pub new: i64,
    pub timestamp: DateTime<Utc>,
    /// `None` on success.
    pub failure: Option<TxnFailure>,
}

impl Transaction {
    fn success(
        kind: ResourceKind,
        amount: i64,
        previous: i64,
        new: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            amount,
            previous,
            new,
            timestamp: now,
            failure: None,
        }
    }

    fn failed(
        kind: ResourceKind,
        amount: i64,
        current: i64,
        now: DateTime<Utc>,
        reason: TxnFailure,
    ) -> Self {
        Self {
            kind,
            amount,
            previous: current,
            new: current,
            timestamp: now,
            failure: Some(reason),
        }
    }

    /// Whether the operation mutated the ledger.
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

// ---------------------------------------------------------------------------
// ResourceLedger
// ---------------------------------------------------------------------------

/// Holds current and maximum values for every resource kind.
#[derive(Debug, Clone)]
pub struct ResourceLedger {
    currency: i64,
    energy: i64,
    experience: i64,
    token_micro: i64,
    maxima: [Option<i64>; KIND_COUNT],
}

impl ResourceLedger {
    /// A fresh ledger: zero currency/experience/token, energy at its cap.
    pub fn new(max_energy: i64) -> Self {
        let max_energy = max_energy.max(0);
        let mut maxima = [None; KIND_COUNT];
        maxima[ResourceKind::Energy.index()] = Some(max_energy);
        Self {
            currency: 0,
            energy: max_energy,
            experience: 0,
            token_micro: 0,
            maxima,
        }
    }

    /// Rebuild a ledger from persisted values, clamping each into its valid
    /// range. Used by the load path; hostile snapshot values cannot break
    /// the non-negativity or cap invariants.
    pub fn from_saved(
        currency: i64,
        energy: i64,
        experience: i64,
        token_micro: i64,
        max_energy: i64,
    ) -> Self {
        let max_energy = max_energy.max(0);
        let mut maxima = [None; KIND_COUNT];
        maxima[ResourceKind::Energy.index()] = Some(max_energy);
        Self {
            currency: currency.max(0),
            energy: energy.clamp(0, max_energy),
            experience: experience.max(0),
            token_micro: token_micro.max(0),
            maxima,
        }
    }

    /// Current value of a resource. Token is reported in micro-units.
    /// Never fails; the reserved Premium kind reads as 0.
    pub fn get(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Currency => self.currency,
            ResourceKind::Energy => self.energy,
            ResourceKind::Experience => self.experience,
            ResourceKind::Token => self.token_micro,
            ResourceKind::Premium => 0,
        }
    }

    /// Configured maximum for a kind, if any.
    pub fn get_max(&self, kind: ResourceKind) -> Option<i64> {
        self.maxima[kind.index()]
    }

    /// Token balance as an exact decimal.
    pub fn token_balance(&self) -> Decimal {
        decimal_from_micro(self.token_micro)
    }

    /// Whether the current balance covers `amount`. A negative amount is an
    /// invalid query: logged and answered with `false`, never a panic.
    pub fn has_enough(&self, kind: ResourceKind, amount: i64) -> bool {
        if amount < 0 {
            warn!(%kind, amount, "has_enough called with negative amount");
            return false;
        }
        self.get(kind) >= amount
    }

    /// Add `amount` to a resource, clamping to the configured maximum.
    ///
    /// Returns a failed transaction for negative amounts and Premium writes.
    /// When `notify` is set, a resource-changed and a transaction event are
    /// emitted after the write.
    pub fn add(
        &mut self,
        kind: ResourceKind,
        amount: i64,
        now: DateTime<Utc>,
        notify: bool,
        bus: &mut EventBus,
    ) -> Transaction {
        if kind == ResourceKind::Premium {
            warn!("attempted to add to reserved premium resource");
            return Transaction::failed(kind, amount, 0, now, TxnFailure::Unimplemented);
        }
        if amount < 0 {
            warn!(%kind, amount, "attempted to add negative amount");
            return Transaction::failed(kind, amount, self.get(kind), now, TxnFailure::NegativeAmount);
        }

        let previous = self.get(kind);
        let mut new = previous.saturating_add(amount);
        if let Some(max) = self.maxima[kind.index()] {
            new = new.min(max);
        }
        self.write(kind, new);

        let txn = Transaction::success(kind, amount, previous, new, now);
        if notify {
            bus.emit(Event::ResourceChanged {
                kind,
                previous,
                new,
            });
            bus.emit(Event::TransactionRecorded(txn.clone()));
        }
        txn
    }

    /// Spend `amount` from a resource. On insufficient funds the ledger is
    /// left untouched and a failed transaction (also emitted when `notify`)
    /// is returned. The recorded delta of a successful spend is `-amount`.
    pub fn spend(
        &mut self,
        kind: ResourceKind,
        amount: i64,
        now: DateTime<Utc>,
        notify: bool,
        bus: &mut EventBus,
    ) -> Transaction {
        if kind == ResourceKind::Premium {
            warn!("attempted to spend reserved premium resource");
            return Transaction::failed(kind, amount, 0, now, TxnFailure::Unimplemented);
        }
        if amount < 0 {
            warn!(%kind, amount, "attempted to spend negative amount");
            return Transaction::failed(kind, amount, self.get(kind), now, TxnFailure::NegativeAmount);
        }

        let previous = self.get(kind);
        if previous < amount {
            let txn = Transaction::failed(kind, amount, previous, now, TxnFailure::Insufficient(kind));
            if notify {
                bus.emit(Event::TransactionRecorded(txn.clone()));
            }
            return txn;
        }

        let new = previous - amount;
        self.write(kind, new);

        let txn = Transaction::success(kind, -amount, previous, new, now);
        if notify {
            bus.emit(Event::ResourceChanged {
                kind,
                previous,
                new,
            });
            bus.emit(Event::TransactionRecorded(txn.clone()));
        }
        txn
    }

    /// Direct overwrite, used by restore paths. Clamps into `[0, max]`.
    /// Emits a change event only when `notify` is set and the value differs.
    pub fn set(
        &mut self,
        kind: ResourceKind,
        value: i64,
        notify: bool,
        bus: &mut EventBus,
    ) {
        if kind == ResourceKind::Premium {
            warn!("attempted to set reserved premium resource");
            return;
        }
        let previous = self.get(kind);
        let mut new = value.max(0);
        if let Some(max) = self.maxima[kind.index()] {
            new = new.min(max);
        }
        self.write(kind, new);
        if notify && previous != new {
            bus.emit(Event::ResourceChanged {
                kind,
                previous,
                new,
            });
        }
    }

    /// Spend several resources atomically: either every entry is spent, or
    /// nothing is mutated. Two phases: verify every balance first, then
    /// commit each spend.
    pub fn try_spend_all(
        &mut self,
        costs: &[(ResourceKind, i64)],
        now: DateTime<Utc>,
        bus: &mut EventBus,
    ) -> bool {
        for &(kind, amount) in costs {
            if kind == ResourceKind::Premium {
                warn!("try_spend_all includes reserved premium resource");
                return false;
            }
            if !self.has_enough(kind, amount) {
                warn!(
                    %kind,
                    need = amount,
                    have = self.get(kind),
                    "try_spend_all rejected"
                );
                return false;
            }
        }

        for &(kind, amount) in costs {
            let txn = self.spend(kind, amount, now, true, bus);
            // Verified above; single-threaded execution rules out interleaving.
            debug_assert!(txn.succeeded());
        }
        true
    }

    /// Update the configured cap for a kind. If the current value exceeds
    /// the new cap it is forcibly reduced, with a change event.
    pub fn set_max(
        &mut self,
        kind: ResourceKind,
        new_max: i64,
        bus: &mut EventBus,
    ) {
        let new_max = new_max.max(0);
        self.maxima[kind.index()] = Some(new_max);

        if kind == ResourceKind::Premium {
            return;
        }
        let current = self.get(kind);
        if current > new_max {
            self.write(kind, new_max);
            bus.emit(Event::ResourceChanged {
                kind,
                previous: current,
                new: new_max,
            });
        }
    }

    fn write(&mut self, kind: ResourceKind, value: i64) {
        debug_assert!(value >= 0);
        match kind {
            ResourceKind::Currency => self.currency = value,
            ResourceKind::Energy => self.energy = value,
            ResourceKind::Experience => self.experience = value,
            ResourceKind::Token => self.token_micro = value,
            // Public operations reject Premium before reaching here.
            ResourceKind::Premium => unreachable!("premium resource is reserved"),
        }
    }
}
