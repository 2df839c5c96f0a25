//! Per-call-depth change log.
//!
//! Every state mutation appends the entry that exactly undoes it *before*
//! the mutation is applied, so reverse-replaying a frame always restores the
//! pre-frame state no matter how many entries it holds. Frames are opened at
//! call boundaries and closed exactly once, either keeping or undoing their
//! mutations; the outermost frame lives for the whole transaction.

use ethereum_types::{Address, H256, U256};

use crate::bytecode::Bytecode;

/// A single recorded state mutation, carrying enough data to reverse itself
/// in isolation.
#[derive(Debug, Clone, PartialEq)]
pub enum JournalEntry {
    /// First load of an address this transaction. Reverting evicts the
    /// record, restoring its cold status.
    AccountLoaded { address: Address },
    /// Account was interacted with. Reverting clears the touched marker.
    AccountTouched { address: Address },
    /// Account created by this transaction. Reverting clears the created
    /// marker and the nonce seeded at creation.
    AccountCreated { address: Address },
    /// Account flagged for destruction, balance moved to `target`.
    /// Reverting restores the balance and, unless the account was already
    /// destroyed when the entry was written, clears the flag.
    AccountDestroyed {
        address: Address,
        target: Address,
        had_balance: U256,
        was_already_destroyed: bool,
    },
    /// Reverting transfers `amount` back from `to` to `from`.
    BalanceTransfer {
        from: Address,
        to: Address,
        amount: U256,
    },
    /// Reverting decrements the nonce by one.
    NonceChange { address: Address },
    /// Storage slot written, or cold-loaded when `prior_value` is `None`.
    /// Reverting restores the prior value, or removes the slot entirely for
    /// a cold-load artifact.
    StorageChange {
        address: Address,
        key: U256,
        prior_value: Option<U256>,
    },
    /// Reverting reinserts the prior value, or removes the key when the
    /// prior value was zero.
    TransientStorageChange {
        address: Address,
        key: U256,
        prior_value: U256,
    },
    /// Code overwritten. The prior code and hash are captured here so the
    /// exact bytes come back on revert.
    CodeChange {
        address: Address,
        prior_code: Option<Bytecode>,
        prior_code_hash: H256,
    },
}

/// Position of a frame in the journal stack, handed out when the frame is
/// opened and consumed exactly once when it is committed or reverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub(crate) journal_i: usize,
}
