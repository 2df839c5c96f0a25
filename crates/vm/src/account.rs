//! In-memory account records.
//!
//! One [`Account`] exists per address loaded during the transaction, owned
//! exclusively by the journaled state. Records are created on first load
//! (from the backing store, or synthetically for absent addresses), mutated
//! only through journaled operations, and flagged rather than removed on
//! self-destruct.

use ethereum_types::{H256, U256};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::bytecode::Bytecode;
use crate::constants::EMPTY_CODE_HASH;

/// Balance, nonce and code of one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub balance: U256,
    pub nonce: u64,
    pub code_hash: H256,
    /// Loaded lazily; `None` until the code is actually needed.
    #[serde(skip)]
    pub code: Option<Bytecode>,
}

impl Default for AccountInfo {
    fn default() -> Self {
        Self {
            balance: U256::zero(),
            nonce: 0,
            code_hash: EMPTY_CODE_HASH,
            code: None,
        }
    }
}

impl AccountInfo {
    /// Empty per EIP-161: no balance, no nonce, no code.
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && self.code_hash == EMPTY_CODE_HASH
    }

    pub fn has_code(&self) -> bool {
        self.code_hash != EMPTY_CODE_HASH
    }

    pub fn has_nonce(&self) -> bool {
        self.nonce != 0
    }
}

/// A storage slot tracking the value at first load alongside the live value.
///
/// `original_value` is pinned for the whole transaction; SSTORE pricing and
/// refunds depend on the full `(original, current, new)` triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSlot {
    pub original_value: U256,
    pub present_value: U256,
}

impl StorageSlot {
    pub fn new(value: U256) -> Self {
        Self {
            original_value: value,
            present_value: value,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.original_value != self.present_value
    }
}

/// Orthogonal per-transaction account markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatus {
    /// The backing store had no record for this address; a synthetic empty
    /// record stands in for it.
    pub loaded_as_not_existing: bool,
    /// Created during this transaction, so its stored state is known empty.
    pub created: bool,
    /// Flagged for removal at the end of the transaction.
    pub selfdestructed: bool,
    /// Actually interacted with, so the post-state clearing rule applies.
    pub touched: bool,
}

/// In-memory record of one account plus its accessed storage slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub info: AccountInfo,
    pub storage: FxHashMap<U256, StorageSlot>,
    pub status: AccountStatus,
}

impl From<AccountInfo> for Account {
    fn from(info: AccountInfo) -> Self {
        Self {
            info,
            storage: FxHashMap::default(),
            status: AccountStatus::default(),
        }
    }
}

impl Account {
    /// Record standing in for an address the backing store does not know.
    pub fn new_not_existing() -> Self {
        Self {
            status: AccountStatus {
                loaded_as_not_existing: true,
                ..AccountStatus::default()
            },
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_empty()
    }

    pub fn is_touched(&self) -> bool {
        self.status.touched
    }

    pub fn is_created(&self) -> bool {
        self.status.created
    }

    pub fn is_selfdestructed(&self) -> bool {
        self.status.selfdestructed
    }

    /// A create targeting this account would collide.
    pub fn has_code_or_nonce(&self) -> bool {
        self.info.has_code() || self.info.has_nonce()
    }
}
