//! Journaled account state.
//!
//! Owns the account records, the transient storage, and the change journal.
//! Every mutating operation records its undo entry before touching state, so
//! reverting a frame is a reverse replay of its entries. One instance
//! belongs to exactly one transaction execution; parallel executions each
//! get their own.

use std::collections::hash_map::Entry;
use std::sync::Arc;

use ethereum_types::{Address, H256, U256};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::account::{Account, StorageSlot};
use crate::bytecode::Bytecode;
use crate::constants::EMPTY_CODE_HASH;
use crate::db::Database;
use crate::errors::{ExceptionalHalt, InternalError, VMError};
use crate::fork::Fork;
use crate::journal::{Checkpoint, JournalEntry};

/// Outcome of loading an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadResult {
    pub is_cold: bool,
    pub is_empty: bool,
}

/// Value triple an SSTORE needs for pricing, plus the slot's access state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SStoreResult {
    pub original_value: U256,
    pub present_value: U256,
    pub new_value: U256,
    pub is_cold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfDestructResult {
    pub had_balance: bool,
    pub target_exists: bool,
    pub is_cold: bool,
    pub previously_destroyed: bool,
}

/// Account store plus change journal for one transaction.
///
/// An address or storage slot is warm exactly when it is present in the
/// maps; the journal entries written at first load evict them again on
/// revert, restoring cold status.
#[derive(Clone)]
pub struct JournaledState {
    store: Arc<dyn Database>,
    pub accounts: FxHashMap<Address, Account>,
    transient_storage: FxHashMap<(Address, U256), U256>,
    /// One entry list per call depth; index 0 is the transaction frame.
    journal: Vec<Vec<JournalEntry>>,
    /// Journal indices of the nested frames still open, innermost last.
    open_frames: Vec<usize>,
    fork: Fork,
}

impl JournaledState {
    pub fn new(fork: Fork, store: Arc<dyn Database>) -> Self {
        Self {
            store,
            accounts: FxHashMap::default(),
            transient_storage: FxHashMap::default(),
            journal: vec![Vec::new()],
            open_frames: Vec::new(),
            fork,
        }
    }

    pub fn fork(&self) -> Fork {
        self.fork
    }

    /// Nesting depth of the call currently executing.
    pub fn depth(&self) -> usize {
        self.open_frames.len()
    }

    // ================== Account loading =====================

    /// Loads `address` into the store, hitting the backing store on first
    /// access. Returns the record and whether the access was cold.
    pub fn load_account(&mut self, address: Address) -> Result<(&mut Account, bool), VMError> {
        match self.accounts.entry(address) {
            Entry::Occupied(entry) => Ok((entry.into_mut(), false)),
            Entry::Vacant(entry) => {
                let account = match self.store.get_account_info(address)? {
                    Some(info) => Account::from(info),
                    None => Account::new_not_existing(),
                };
                self.journal
                    .last_mut()
                    .ok_or(InternalError::NoOpenFrame)?
                    .push(JournalEntry::AccountLoaded { address });
                Ok((entry.insert(account), true))
            }
        }
    }

    /// Loads `address` and reports emptiness the way the state-clearing rule
    /// wants it: EIP-161 emptiness from Spurious Dragon, plain non-existence
    /// before.
    pub fn load_account_exists(&mut self, address: Address) -> Result<LoadResult, VMError> {
        let spurious_dragon = self.fork.is_activated(Fork::SpuriousDragon);
        let (account, is_cold) = self.load_account(address)?;
        let is_empty = if spurious_dragon {
            account.is_empty()
        } else {
            account.status.loaded_as_not_existing && !account.is_touched()
        };
        Ok(LoadResult { is_cold, is_empty })
    }

    /// Loads the account's code from the backing store if it is not already
    /// in memory.
    pub fn load_code(&mut self, address: Address) -> Result<(&Bytecode, bool), VMError> {
        let (_, is_cold) = self.load_account(address)?;

        let code_hash = self
            .accounts
            .get(&address)
            .ok_or(InternalError::AccountNotLoaded)?
            .info
            .code_hash;
        let missing = self
            .accounts
            .get(&address)
            .is_some_and(|account| account.info.code.is_none());
        if missing {
            let code = if code_hash == EMPTY_CODE_HASH {
                Bytecode::new()
            } else {
                self.store.get_code(code_hash)?.ok_or_else(|| {
                    crate::errors::DatabaseError(format!(
                        "missing code for hash {code_hash:#x}"
                    ))
                })?
            };
            if let Some(account) = self.accounts.get_mut(&address) {
                account.info.code = Some(code);
            }
        }

        let code = self
            .accounts
            .get(&address)
            .and_then(|account| account.info.code.as_ref())
            .ok_or(InternalError::AccountNotLoaded)?;
        Ok((code, is_cold))
    }

    /// Returns the already-loaded record for `address`. Loading is the
    /// dispatch loop's responsibility; asking for an unloaded account is a
    /// programming error.
    pub fn get_account(&self, address: Address) -> Result<&Account, InternalError> {
        self.accounts
            .get(&address)
            .ok_or(InternalError::AccountNotLoaded)
    }

    pub fn block_hash(&self, block_number: u64) -> Result<Option<H256>, VMError> {
        Ok(self.store.get_block_hash(block_number)?)
    }

    // ================== Journaled mutations =====================

    /// Marks the account as interacted with, so the post-state clearing
    /// sweep can pick it up if it ends the transaction empty. Idempotent.
    pub fn touch(&mut self, address: Address) -> Result<(), InternalError> {
        let frame = self.journal.last_mut().ok_or(InternalError::NoOpenFrame)?;
        let account = self
            .accounts
            .get_mut(&address)
            .ok_or(InternalError::AccountNotLoaded)?;
        Self::touch_account(frame, address, account);
        Ok(())
    }

    fn touch_account(frame: &mut Vec<JournalEntry>, address: Address, account: &mut Account) {
        if !account.status.touched {
            frame.push(JournalEntry::AccountTouched { address });
            account.status.touched = true;
        }
    }

    /// Overwrites the account's code, capturing the previous code in the
    /// journal so a revert restores the exact bytes.
    pub fn set_code(&mut self, address: Address, code: Bytecode) -> Result<(), InternalError> {
        let code_hash = code.hash();
        let frame = self.journal.last_mut().ok_or(InternalError::NoOpenFrame)?;
        let account = self
            .accounts
            .get_mut(&address)
            .ok_or(InternalError::AccountNotLoaded)?;
        Self::touch_account(frame, address, account);
        frame.push(JournalEntry::CodeChange {
            address,
            prior_code: account.info.code.take(),
            prior_code_hash: account.info.code_hash,
        });
        account.info.code_hash = code_hash;
        account.info.code = Some(code);
        Ok(())
    }

    /// Increments the nonce, returning `None` without mutating anything once
    /// the maximum representable value is reached.
    pub fn increment_nonce(&mut self, address: Address) -> Result<Option<u64>, InternalError> {
        let frame = self.journal.last_mut().ok_or(InternalError::NoOpenFrame)?;
        let account = self
            .accounts
            .get_mut(&address)
            .ok_or(InternalError::AccountNotLoaded)?;
        if account.info.nonce == u64::MAX {
            return Ok(None);
        }
        Self::touch_account(frame, address, account);
        frame.push(JournalEntry::NonceChange { address });
        account.info.nonce += 1;
        Ok(Some(account.info.nonce))
    }

    /// Moves `amount` from `from` to `to`. Both accounts must be loaded.
    /// Nothing is recorded or mutated unless both sides check out.
    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), VMError> {
        let from_balance = self
            .accounts
            .get(&from)
            .ok_or(InternalError::AccountNotLoaded)?
            .info
            .balance;
        let new_from_balance = from_balance.checked_sub(amount).ok_or(VMError::OutOfFunds)?;

        let to_balance = if to == from {
            new_from_balance
        } else {
            self.accounts
                .get(&to)
                .ok_or(InternalError::AccountNotLoaded)?
                .info
                .balance
        };
        let new_to_balance = to_balance
            .checked_add(amount)
            .ok_or(ExceptionalHalt::OverflowPayment)?;

        let frame = self.journal.last_mut().ok_or(InternalError::NoOpenFrame)?;
        let from_account = self
            .accounts
            .get_mut(&from)
            .ok_or(InternalError::AccountNotLoaded)?;
        Self::touch_account(frame, from, from_account);
        let to_account = self
            .accounts
            .get_mut(&to)
            .ok_or(InternalError::AccountNotLoaded)?;
        Self::touch_account(frame, to, to_account);

        frame.push(JournalEntry::BalanceTransfer { from, to, amount });
        if let Some(from_account) = self.accounts.get_mut(&from) {
            from_account.info.balance = new_from_balance;
        }
        if let Some(to_account) = self.accounts.get_mut(&to) {
            to_account.info.balance = new_to_balance;
        }
        Ok(())
    }

    /// Marks the target of a create as created, seeds its nonce, and moves
    /// the endowment from the caller. Fails on a collision with existing
    /// code or nonce.
    pub fn create_account(
        &mut self,
        caller: Address,
        address: Address,
        balance: U256,
    ) -> Result<(), VMError> {
        let account = self
            .accounts
            .get(&address)
            .ok_or(InternalError::AccountNotLoaded)?;
        if account.has_code_or_nonce() {
            return Err(ExceptionalHalt::CreateCollision.into());
        }

        let frame = self.journal.last_mut().ok_or(InternalError::NoOpenFrame)?;
        let account = self
            .accounts
            .get_mut(&address)
            .ok_or(InternalError::AccountNotLoaded)?;
        frame.push(JournalEntry::AccountCreated { address });
        account.status.created = true;
        account.info.code = None;
        Self::touch_account(frame, address, account);

        // The created entry resets the nonce on revert.
        if self.fork.is_activated(Fork::SpuriousDragon) {
            account.info.nonce = 1;
        }

        self.transfer(caller, address, balance)
    }

    /// Flags `address` for destruction and moves its balance to `target`.
    ///
    /// From Cancun (EIP-6780) only accounts created in the same transaction
    /// are actually destroyed; otherwise the balance still moves.
    pub fn selfdestruct(
        &mut self,
        address: Address,
        target: Address,
    ) -> Result<SelfDestructResult, VMError> {
        let load = self.load_account_exists(target)?;

        let account = self
            .accounts
            .get(&address)
            .ok_or(InternalError::AccountNotLoaded)?;
        let balance = account.info.balance;
        let previously_destroyed = account.is_selfdestructed();
        let destroys = account.is_created() || !self.fork.is_activated(Fork::Cancun);

        let new_target_balance = if address != target {
            let target_balance = self
                .accounts
                .get(&target)
                .ok_or(InternalError::AccountNotLoaded)?
                .info
                .balance;
            Some(
                target_balance
                    .checked_add(balance)
                    .ok_or(ExceptionalHalt::OverflowPayment)?,
            )
        } else {
            None
        };

        let entry = if destroys {
            Some(JournalEntry::AccountDestroyed {
                address,
                target,
                had_balance: balance,
                was_already_destroyed: previously_destroyed,
            })
        } else if address != target {
            Some(JournalEntry::BalanceTransfer {
                from: address,
                to: target,
                amount: balance,
            })
        } else {
            // Not created in this transaction, balance sent to itself:
            // state does not change at all.
            None
        };

        if let Some(entry) = entry {
            let frame = self.journal.last_mut().ok_or(InternalError::NoOpenFrame)?;
            if address != target {
                let target_account = self
                    .accounts
                    .get_mut(&target)
                    .ok_or(InternalError::AccountNotLoaded)?;
                Self::touch_account(frame, target, target_account);
            }
            frame.push(entry);

            if let (Some(new_balance), Some(target_account)) =
                (new_target_balance, self.accounts.get_mut(&target))
            {
                target_account.info.balance = new_balance;
            }
            let account = self
                .accounts
                .get_mut(&address)
                .ok_or(InternalError::AccountNotLoaded)?;
            account.info.balance = U256::zero();
            if destroys {
                account.status.selfdestructed = true;
            }
        }

        Ok(SelfDestructResult {
            had_balance: !balance.is_zero(),
            target_exists: !load.is_empty,
            is_cold: load.is_cold,
            previously_destroyed,
        })
    }

    // ================== Storage =====================

    /// Reads a storage slot, pulling it from the backing store on first
    /// access. Returns the value and whether the access was cold.
    pub fn sload(&mut self, address: Address, key: U256) -> Result<(U256, bool), VMError> {
        let account = self
            .accounts
            .get_mut(&address)
            .ok_or(InternalError::AccountNotLoaded)?;
        // Accounts created this transaction have known-empty storage.
        let is_newly_created = account.is_created();

        match account.storage.entry(key) {
            Entry::Occupied(entry) => Ok((entry.get().present_value, false)),
            Entry::Vacant(entry) => {
                let value = if is_newly_created {
                    U256::zero()
                } else {
                    self.store
                        .get_storage_value(address, key)?
                        .unwrap_or_default()
                };
                // A cold-load artifact: reverting removes the slot again.
                self.journal
                    .last_mut()
                    .ok_or(InternalError::NoOpenFrame)?
                    .push(JournalEntry::StorageChange {
                        address,
                        key,
                        prior_value: None,
                    });
                entry.insert(StorageSlot::new(value));
                Ok((value, true))
            }
        }
    }

    /// Writes a storage slot, journaling the prior value, and returns the
    /// `(original, present, new)` pricing triple.
    pub fn sstore(
        &mut self,
        address: Address,
        key: U256,
        new_value: U256,
    ) -> Result<SStoreResult, VMError> {
        let (present_value, is_cold) = self.sload(address, key)?;

        let slot = self
            .accounts
            .get_mut(&address)
            .ok_or(InternalError::AccountNotLoaded)?
            .storage
            .get_mut(&key)
            .ok_or(InternalError::AccountNotLoaded)?;
        let original_value = slot.original_value;

        if present_value != new_value {
            self.journal
                .last_mut()
                .ok_or(InternalError::NoOpenFrame)?
                .push(JournalEntry::StorageChange {
                    address,
                    key,
                    prior_value: Some(present_value),
                });
            slot.present_value = new_value;
        }

        Ok(SStoreResult {
            original_value,
            present_value,
            new_value,
            is_cold,
        })
    }

    /// Reads transient storage; absent keys read as zero.
    pub fn tload(&self, address: Address, key: U256) -> U256 {
        self.transient_storage
            .get(&(address, key))
            .copied()
            .unwrap_or_default()
    }

    /// Writes transient storage. Cleared wholesale when the transaction
    /// finalizes; individual writes are still journaled so nested reverts
    /// undo them.
    pub fn tstore(&mut self, address: Address, key: U256, new_value: U256) -> Result<(), InternalError> {
        let prior_value = self.tload(address, key);
        if prior_value == new_value {
            return Ok(());
        }
        self.journal
            .last_mut()
            .ok_or(InternalError::NoOpenFrame)?
            .push(JournalEntry::TransientStorageChange {
                address,
                key,
                prior_value,
            });
        if new_value.is_zero() {
            self.transient_storage.remove(&(address, key));
        } else {
            self.transient_storage.insert((address, key), new_value);
        }
        Ok(())
    }

    // ================== Frames =====================

    /// Opens a journal frame for a nested call.
    pub fn begin_frame(&mut self) -> Checkpoint {
        let checkpoint = Checkpoint {
            journal_i: self.journal.len(),
        };
        self.open_frames.push(checkpoint.journal_i);
        self.journal.push(Vec::new());
        checkpoint
    }

    /// Closes the innermost frame keeping its mutations. The entries stay
    /// queued so an enclosing revert can still undo them.
    pub fn commit_frame(&mut self, checkpoint: Checkpoint) -> Result<(), InternalError> {
        let open = self.open_frames.pop().ok_or(InternalError::NoOpenFrame)?;
        if open != checkpoint.journal_i {
            self.open_frames.push(open);
            return Err(InternalError::StaleCheckpoint);
        }
        Ok(())
    }

    /// Closes the innermost frame undoing every mutation recorded since it
    /// opened, including those of nested frames that committed into it.
    pub fn revert_frame(&mut self, checkpoint: Checkpoint) -> Result<(), InternalError> {
        let open = self.open_frames.pop().ok_or(InternalError::NoOpenFrame)?;
        if open != checkpoint.journal_i {
            self.open_frames.push(open);
            return Err(InternalError::StaleCheckpoint);
        }

        debug!(
            frames = self.journal.len() - checkpoint.journal_i,
            depth = self.open_frames.len(),
            "reverting journal frames"
        );
        while self.journal.len() > checkpoint.journal_i {
            let frame = self.journal.pop().ok_or(InternalError::NoOpenFrame)?;
            for entry in frame.into_iter().rev() {
                Self::revert_entry(&mut self.accounts, &mut self.transient_storage, entry)?;
            }
        }
        Ok(())
    }

    fn revert_entry(
        accounts: &mut FxHashMap<Address, Account>,
        transient_storage: &mut FxHashMap<(Address, U256), U256>,
        entry: JournalEntry,
    ) -> Result<(), InternalError> {
        match entry {
            JournalEntry::AccountLoaded { address } => {
                accounts.remove(&address);
            }
            JournalEntry::AccountTouched { address } => {
                accounts
                    .get_mut(&address)
                    .ok_or(InternalError::AccountNotLoaded)?
                    .status
                    .touched = false;
            }
            JournalEntry::AccountCreated { address } => {
                let account = accounts
                    .get_mut(&address)
                    .ok_or(InternalError::AccountNotLoaded)?;
                account.status.created = false;
                account.info.nonce = 0;
            }
            JournalEntry::AccountDestroyed {
                address,
                target,
                had_balance,
                was_already_destroyed,
            } => {
                if address != target {
                    let target_account = accounts
                        .get_mut(&target)
                        .ok_or(InternalError::AccountNotLoaded)?;
                    target_account.info.balance = target_account
                        .info
                        .balance
                        .checked_sub(had_balance)
                        .ok_or(InternalError::Underflow)?;
                }
                let account = accounts
                    .get_mut(&address)
                    .ok_or(InternalError::AccountNotLoaded)?;
                account.status.selfdestructed = was_already_destroyed;
                account.info.balance = account
                    .info
                    .balance
                    .checked_add(had_balance)
                    .ok_or(InternalError::Overflow)?;
            }
            JournalEntry::BalanceTransfer { from, to, amount } => {
                let to_account = accounts
                    .get_mut(&to)
                    .ok_or(InternalError::AccountNotLoaded)?;
                to_account.info.balance = to_account
                    .info
                    .balance
                    .checked_sub(amount)
                    .ok_or(InternalError::Underflow)?;
                let from_account = accounts
                    .get_mut(&from)
                    .ok_or(InternalError::AccountNotLoaded)?;
                from_account.info.balance = from_account
                    .info
                    .balance
                    .checked_add(amount)
                    .ok_or(InternalError::Overflow)?;
            }
            JournalEntry::NonceChange { address } => {
                let account = accounts
                    .get_mut(&address)
                    .ok_or(InternalError::AccountNotLoaded)?;
                account.info.nonce = account
                    .info
                    .nonce
                    .checked_sub(1)
                    .ok_or(InternalError::Underflow)?;
            }
            JournalEntry::StorageChange {
                address,
                key,
                prior_value,
            } => {
                let storage = &mut accounts
                    .get_mut(&address)
                    .ok_or(InternalError::AccountNotLoaded)?
                    .storage;
                match prior_value {
                    Some(value) => {
                        storage
                            .get_mut(&key)
                            .ok_or(InternalError::AccountNotLoaded)?
                            .present_value = value;
                    }
                    // Cold-load artifact, not a real write: drop the slot.
                    None => {
                        storage.remove(&key);
                    }
                }
            }
            JournalEntry::TransientStorageChange {
                address,
                key,
                prior_value,
            } => {
                if prior_value.is_zero() {
                    transient_storage.remove(&(address, key));
                } else {
                    transient_storage.insert((address, key), prior_value);
                }
            }
            JournalEntry::CodeChange {
                address,
                prior_code,
                prior_code_hash,
            } => {
                let account = accounts
                    .get_mut(&address)
                    .ok_or(InternalError::AccountNotLoaded)?;
                account.info.code = prior_code;
                account.info.code_hash = prior_code_hash;
            }
        }
        Ok(())
    }

    /// Ends the transaction: drains the journal and the transient storage
    /// and hands the touched state to the finalizer. Fails if a nested frame
    /// is still open.
    pub fn finalize(&mut self) -> Result<FxHashMap<Address, Account>, InternalError> {
        if !self.open_frames.is_empty() {
            return Err(InternalError::UnbalancedFrames);
        }
        self.journal.clear();
        self.journal.push(Vec::new());
        self.transient_storage.clear();
        Ok(std::mem::take(&mut self.accounts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountInfo;
    use crate::db::InMemoryDatabase;
    use bytes::Bytes;
    use hex_literal::hex;

    fn addr(byte: u8) -> Address {
        Address::from_low_u64_be(u64::from(byte))
    }

    fn funded(balance: u64) -> AccountInfo {
        AccountInfo {
            balance: U256::from(balance),
            ..AccountInfo::default()
        }
    }

    fn test_state() -> JournaledState {
        let db = InMemoryDatabase::new()
            .with_account(addr(1), funded(1000))
            .with_account(addr(2), funded(50))
            .with_storage(addr(1), U256::from(5), U256::from(42));
        JournaledState::new(Fork::Cancun, Arc::new(db))
    }

    #[test]
    fn load_reports_cold_then_warm() {
        let mut state = test_state();
        let (_, is_cold) = state.load_account(addr(1)).unwrap();
        assert!(is_cold);
        let (_, is_cold) = state.load_account(addr(1)).unwrap();
        assert!(!is_cold);
    }

    #[test]
    fn absent_address_loads_as_not_existing() {
        let mut state = test_state();
        let (account, is_cold) = state.load_account(addr(9)).unwrap();
        assert!(is_cold);
        assert!(account.status.loaded_as_not_existing);
        assert!(account.is_empty());
    }

    #[test]
    fn get_account_requires_prior_load() {
        let state = test_state();
        assert_eq!(
            state.get_account(addr(1)),
            Err(InternalError::AccountNotLoaded)
        );
    }

    #[test]
    fn revert_restores_pre_frame_snapshot() {
        let mut state = test_state();
        state.load_account(addr(1)).unwrap();
        state.load_account(addr(2)).unwrap();
        state.sload(addr(1), U256::from(5)).unwrap();
        let snapshot = state.accounts.clone();

        let checkpoint = state.begin_frame();
        state.transfer(addr(1), addr(2), U256::from(300)).unwrap();
        state.increment_nonce(addr(1)).unwrap();
        state
            .sstore(addr(1), U256::from(5), U256::from(7))
            .unwrap();
        state
            .sstore(addr(1), U256::from(8), U256::from(1))
            .unwrap();
        state
            .set_code(addr(2), Bytecode::analyze(Bytes::from_static(&hex!("5b00"))))
            .unwrap();
        state.revert_frame(checkpoint).unwrap();

        assert_eq!(state.accounts, snapshot);
    }

    #[test]
    fn revert_evicts_cold_load_artifacts() {
        let mut state = test_state();
        state.load_account(addr(1)).unwrap();

        let checkpoint = state.begin_frame();
        // Account 2 and the slot are first loaded inside the frame
        state.load_account(addr(2)).unwrap();
        let (_, slot_cold) = state.sload(addr(1), U256::from(5)).unwrap();
        assert!(slot_cold);
        state.revert_frame(checkpoint).unwrap();

        assert!(state.accounts.get(&addr(2)).is_none());
        assert!(
            state
                .accounts
                .get(&addr(1))
                .unwrap()
                .storage
                .get(&U256::from(5))
                .is_none()
        );
        // Cold again after the revert
        let (_, slot_cold) = state.sload(addr(1), U256::from(5)).unwrap();
        assert!(slot_cold);
    }

    #[test]
    fn committed_inner_frame_is_undone_by_outer_revert() {
        let mut state = test_state();
        state.load_account(addr(1)).unwrap();
        state.load_account(addr(2)).unwrap();
        let snapshot = state.accounts.clone();

        let outer = state.begin_frame();
        state.transfer(addr(1), addr(2), U256::from(10)).unwrap();
        let inner = state.begin_frame();
        state.transfer(addr(1), addr(2), U256::from(20)).unwrap();
        state.commit_frame(inner).unwrap();
        assert_eq!(
            state.get_account(addr(2)).unwrap().info.balance,
            U256::from(80)
        );
        state.revert_frame(outer).unwrap();

        assert_eq!(state.accounts, snapshot);
    }

    #[test]
    fn committed_frame_keeps_mutations() {
        let mut state = test_state();
        state.load_account(addr(1)).unwrap();
        state.load_account(addr(2)).unwrap();

        let checkpoint = state.begin_frame();
        state.transfer(addr(1), addr(2), U256::from(10)).unwrap();
        state.commit_frame(checkpoint).unwrap();

        assert_eq!(
            state.get_account(addr(1)).unwrap().info.balance,
            U256::from(990)
        );
        assert_eq!(
            state.get_account(addr(2)).unwrap().info.balance,
            U256::from(60)
        );
    }

    #[test]
    fn closed_frames_fail_fast_on_reuse() {
        let mut state = test_state();
        let outer = state.begin_frame();
        let inner = state.begin_frame();

        // Closing out of order is refused
        assert_eq!(state.commit_frame(outer), Err(InternalError::StaleCheckpoint));
        state.commit_frame(inner).unwrap();
        // A frame transitions exactly once
        assert_eq!(state.revert_frame(inner), Err(InternalError::StaleCheckpoint));
        state.revert_frame(outer).unwrap();
        assert_eq!(state.commit_frame(outer), Err(InternalError::NoOpenFrame));
    }

    #[test]
    fn sstore_tracks_the_original_value() {
        let mut state = test_state();
        state.load_account(addr(1)).unwrap();
        let key = U256::from(5);

        let result = state.sstore(addr(1), key, U256::from(7)).unwrap();
        assert_eq!(result.original_value, U256::from(42));
        assert_eq!(result.present_value, U256::from(42));
        assert!(result.is_cold);

        // The original survives further writes in the same transaction
        let result = state.sstore(addr(1), key, U256::from(9)).unwrap();
        assert_eq!(result.original_value, U256::from(42));
        assert_eq!(result.present_value, U256::from(7));
        assert!(!result.is_cold);
    }

    #[test]
    fn sstore_noop_is_not_journaled() {
        let mut state = test_state();
        state.load_account(addr(1)).unwrap();
        let key = U256::from(5);
        state.sload(addr(1), key).unwrap();
        let snapshot = state.accounts.clone();

        let checkpoint = state.begin_frame();
        state.sstore(addr(1), key, U256::from(42)).unwrap();
        state.revert_frame(checkpoint).unwrap();
        assert_eq!(state.accounts, snapshot);
    }

    #[test]
    fn nonce_stops_at_maximum() {
        let mut state = test_state();
        let (account, _) = state.load_account(addr(1)).unwrap();
        account.info.nonce = u64::MAX;
        let before = state.accounts.clone();
        assert_eq!(state.increment_nonce(addr(1)).unwrap(), None);
        assert_eq!(state.accounts, before);
    }

    #[test]
    fn transfer_with_insufficient_funds_changes_nothing() {
        let mut state = test_state();
        state.load_account(addr(1)).unwrap();
        state.load_account(addr(2)).unwrap();
        let snapshot = state.accounts.clone();

        let result = state.transfer(addr(2), addr(1), U256::from(51));
        assert_eq!(result, Err(VMError::OutOfFunds));
        assert_eq!(state.accounts, snapshot);
    }

    #[test]
    fn self_transfer_preserves_balance() {
        let mut state = test_state();
        state.load_account(addr(1)).unwrap();
        state.transfer(addr(1), addr(1), U256::from(400)).unwrap();
        assert_eq!(
            state.get_account(addr(1)).unwrap().info.balance,
            U256::from(1000)
        );
    }

    #[test]
    fn touch_is_idempotent_and_reverts() {
        let mut state = test_state();
        state.load_account(addr(2)).unwrap();

        let checkpoint = state.begin_frame();
        state.touch(addr(2)).unwrap();
        state.touch(addr(2)).unwrap();
        assert!(state.get_account(addr(2)).unwrap().is_touched());
        state.revert_frame(checkpoint).unwrap();
        assert!(!state.get_account(addr(2)).unwrap().is_touched());
    }

    #[test]
    fn code_change_revert_restores_exact_bytes() {
        let mut state = test_state();
        state.load_account(addr(2)).unwrap();
        let first = Bytecode::analyze(Bytes::from_static(&hex!("6001600201")));
        state.set_code(addr(2), first.clone()).unwrap();
        let first_hash = state.get_account(addr(2)).unwrap().info.code_hash;

        let checkpoint = state.begin_frame();
        state
            .set_code(addr(2), Bytecode::analyze(Bytes::from_static(&hex!("5b00"))))
            .unwrap();
        state.revert_frame(checkpoint).unwrap();

        let account = state.get_account(addr(2)).unwrap();
        assert_eq!(account.info.code, Some(first));
        assert_eq!(account.info.code_hash, first_hash);
    }

    #[test]
    fn transient_storage_reverts_and_reads_zero_when_absent() {
        let mut state = test_state();
        let key = U256::from(3);
        assert_eq!(state.tload(addr(1), key), U256::zero());

        state.tstore(addr(1), key, U256::from(11)).unwrap();
        let checkpoint = state.begin_frame();
        state.tstore(addr(1), key, U256::from(22)).unwrap();
        state.tstore(addr(1), U256::from(4), U256::from(33)).unwrap();
        state.revert_frame(checkpoint).unwrap();

        assert_eq!(state.tload(addr(1), key), U256::from(11));
        assert_eq!(state.tload(addr(1), U256::from(4)), U256::zero());
    }

    #[test]
    fn selfdestruct_moves_balance_and_reverts() {
        let mut state = JournaledState::new(Fork::London, Arc::new(
            InMemoryDatabase::new()
                .with_account(addr(1), funded(1000))
                .with_account(addr(2), funded(50)),
        ));
        state.load_account(addr(1)).unwrap();
        state.load_account(addr(2)).unwrap();
        let snapshot = state.accounts.clone();

        let checkpoint = state.begin_frame();
        let result = state.selfdestruct(addr(1), addr(2)).unwrap();
        assert!(result.had_balance);
        assert!(!result.previously_destroyed);
        assert!(state.get_account(addr(1)).unwrap().is_selfdestructed());
        assert_eq!(
            state.get_account(addr(2)).unwrap().info.balance,
            U256::from(1050)
        );
        state.revert_frame(checkpoint).unwrap();
        assert_eq!(state.accounts, snapshot);
    }

    #[test]
    fn cancun_selfdestruct_only_destroys_same_tx_creations() {
        let mut state = test_state();
        state.load_account(addr(1)).unwrap();
        state.load_account(addr(2)).unwrap();

        // Pre-existing account: balance moves, flag stays clear
        state.selfdestruct(addr(1), addr(2)).unwrap();
        assert!(!state.get_account(addr(1)).unwrap().is_selfdestructed());
        assert_eq!(
            state.get_account(addr(2)).unwrap().info.balance,
            U256::from(1050)
        );

        // Freshly created account: actually destroyed
        state.load_account(addr(3)).unwrap();
        state.create_account(addr(2), addr(3), U256::from(5)).unwrap();
        state.selfdestruct(addr(3), addr(2)).unwrap();
        assert!(state.get_account(addr(3)).unwrap().is_selfdestructed());
    }

    #[test]
    fn create_collides_with_existing_code_or_nonce() {
        let mut state = test_state();
        state.load_account(addr(1)).unwrap();
        state.load_account(addr(4)).unwrap();
        state.increment_nonce(addr(4)).unwrap();

        let result = state.create_account(addr(1), addr(4), U256::zero());
        assert_eq!(
            result,
            Err(VMError::Halt(ExceptionalHalt::CreateCollision))
        );
    }

    #[test]
    fn created_accounts_skip_the_backing_store() {
        let mut state = test_state();
        state.load_account(addr(1)).unwrap();
        state.load_account(addr(5)).unwrap();
        state.create_account(addr(1), addr(5), U256::zero()).unwrap();
        assert_eq!(state.get_account(addr(5)).unwrap().info.nonce, 1);

        // Slot 5 exists in the store for addr(1), not for the new account;
        // creation guarantees empty storage either way.
        let (value, _) = state.sload(addr(5), U256::from(5)).unwrap();
        assert_eq!(value, U256::zero());
    }

    #[test]
    fn finalize_requires_balanced_frames() {
        let mut state = test_state();
        let _checkpoint = state.begin_frame();
        assert_eq!(state.finalize(), Err(InternalError::UnbalancedFrames));
    }

    #[test]
    fn finalize_clears_transient_storage() {
        let mut state = test_state();
        state.load_account(addr(1)).unwrap();
        state.tstore(addr(1), U256::one(), U256::from(9)).unwrap();

        let accounts = state.finalize().unwrap();
        assert!(accounts.contains_key(&addr(1)));
        assert!(state.accounts.is_empty());
        assert_eq!(state.tload(addr(1), U256::one()), U256::zero());
    }
}
