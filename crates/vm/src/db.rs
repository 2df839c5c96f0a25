//! Backing-store interface.
//!
//! The store holds committed chain state and is only ever read; all writes
//! stay in the journaled state until the transaction finalizes. A store
//! shared across parallel executions must provide its own concurrency
//! safety.

use ethereum_types::{Address, H256, U256};
use rustc_hash::FxHashMap;

use crate::account::AccountInfo;
use crate::bytecode::Bytecode;
use crate::errors::DatabaseError;

pub trait Database: Send + Sync {
    fn get_account_info(&self, address: Address) -> Result<Option<AccountInfo>, DatabaseError>;
    fn get_code(&self, code_hash: H256) -> Result<Option<Bytecode>, DatabaseError>;
    fn get_storage_value(&self, address: Address, key: U256)
    -> Result<Option<U256>, DatabaseError>;
    fn get_block_hash(&self, block_number: u64) -> Result<Option<H256>, DatabaseError>;
}

/// Map-backed store for tests and stand-alone runners.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    pub accounts: FxHashMap<Address, AccountInfo>,
    pub storage: FxHashMap<(Address, U256), U256>,
    pub codes: FxHashMap<H256, Bytecode>,
    pub block_hashes: FxHashMap<u64, H256>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, address: Address, info: AccountInfo) -> Self {
        self.accounts.insert(address, info);
        self
    }

    pub fn with_storage(mut self, address: Address, key: U256, value: U256) -> Self {
        self.storage.insert((address, key), value);
        self
    }

    pub fn with_code(mut self, code: Bytecode) -> Self {
        self.codes.insert(code.hash(), code);
        self
    }
}

impl Database for InMemoryDatabase {
    fn get_account_info(&self, address: Address) -> Result<Option<AccountInfo>, DatabaseError> {
        Ok(self.accounts.get(&address).cloned())
    }

    fn get_code(&self, code_hash: H256) -> Result<Option<Bytecode>, DatabaseError> {
        Ok(self.codes.get(&code_hash).cloned())
    }

    fn get_storage_value(
        &self,
        address: Address,
        key: U256,
    ) -> Result<Option<U256>, DatabaseError> {
        Ok(self.storage.get(&(address, key)).copied())
    }

    fn get_block_hash(&self, block_number: u64) -> Result<Option<H256>, DatabaseError> {
        Ok(self.block_hashes.get(&block_number).copied())
    }
}
