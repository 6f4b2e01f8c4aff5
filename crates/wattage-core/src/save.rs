//! Versioned account snapshots.
//!
//! A [`SaveData`] is a plain serde struct holding everything needed to
//! rebuild a [`PlayerAccount`], serialized as JSON with a leading `version`
//! field checked before use. Derived values (the XP threshold, the energy
//! cap) are recomputed from config and equipment on restore rather than
//! trusted from the snapshot, and resource values are clamped, so a
//! malformed or hostile snapshot cannot break ledger invariants.
//!
//! The token balance is persisted as a decimal, not micro-units; conversion
//! both ways is drift-free at 1e-6 (see [`crate::fixed`]).

use crate::account::{AccountParts, PlayerAccount, PlayerProfile, PlayerStats};
use crate::economy::EconomyConfig;
use crate::fixed::micro_from_decimal;
use crate::inventory::Inventory;
use crate::resource::ResourceKind;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Current snapshot format version. Increment on breaking changes.
pub const SAVE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from encoding or decoding a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {SAVE_VERSION})")]
    FutureVersion(u32),
}

// ---------------------------------------------------------------------------
// SaveData
// ---------------------------------------------------------------------------

/// The persisted shape of a player account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub profile: PlayerProfile,
    pub level: u32,
    pub currency: i64,
    pub energy: i64,
    pub experience: i64,
    /// Token balance as a decimal amount, not micro-units.
    pub token_balance: Decimal,
    #[serde(default)]
    pub stats: PlayerStats,
    #[serde(default)]
    pub inventory: Inventory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub last_logout: DateTime<Utc>,
    #[serde(default)]
    pub daily_streak: u32,
    #[serde(default)]
    pub last_daily_bonus: Option<DateTime<Utc>>,
}

impl SaveData {
    /// Capture a snapshot of the account.
    pub fn from_account(account: &PlayerAccount) -> Self {
        let ledger = account.resources();
        Self {
            version: SAVE_VERSION,
            profile: account.profile().clone(),
            level: account.level(),
            currency: ledger.get(ResourceKind::Currency),
            energy: ledger.get(ResourceKind::Energy),
            experience: ledger.get(ResourceKind::Experience),
            token_balance: ledger.token_balance(),
            stats: account.stats().clone(),
            inventory: account.inventory().clone(),
            created_at: account.created_at(),
            updated_at: account.updated_at(),
            last_login: account.last_login(),
            last_logout: account.last_logout(),
            daily_streak: account.daily_streak(),
            last_daily_bonus: account.last_daily_bonus(),
        }
    }

    /// Rebuild the account under the given config.
    pub fn into_account(self, config: EconomyConfig) -> PlayerAccount {
        PlayerAccount::from_parts(
            AccountParts {
                profile: self.profile,
                level: self.level,
                currency: self.currency,
                energy: self.energy,
                experience: self.experience,
                token_micro: micro_from_decimal(self.token_balance),
                stats: self.stats,
                inventory: self.inventory,
                created_at: self.created_at,
                updated_at: self.updated_at,
                last_login: self.last_login,
                last_logout: self.last_logout,
                daily_streak: self.daily_streak,
                last_daily_bonus: self.last_daily_bonus,
            },
            config,
        )
    }

    /// Serialize to pretty JSON.
    pub fn encode(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and version-check a snapshot.
    pub fn decode(data: &str) -> Result<Self, SaveError> {
        let save: SaveData = serde_json::from_str(data)?;
        if save.version > SAVE_VERSION {
            return Err(SaveError::FutureVersion(save.version));
        }
        migrate(save)
    }
}

/// Upgrade older snapshots in place. One arm per supported version.
fn migrate(save: SaveData) -> Result<SaveData, SaveError> {
    match save.version {
        SAVE_VERSION => Ok(save),
        v => Err(SaveError::UnsupportedVersion(v)),
    }
}
