//! # ethrune-vm
//!
//! Execution core of an Ethereum-compatible virtual machine: gas accounting
//! with per-fork cost and refund formulas, bytecode preprocessing with O(1)
//! jump-destination checks, and a journaled account state with call-scoped
//! revert.
//!
//! The opcode dispatch loop, the precompiled contracts, and the persistent
//! store live outside this crate and consume it through:
//!
//! - [`gas_meter::GasMeter`]: the per-execution gas budget
//! - [`gas_cost`] / [`gas_schedule`]: pure cost and refund formulas,
//!   parameterized by [`fork::Fork`]
//! - [`bytecode::Bytecode`]: raw → checked → analyzed code forms
//! - [`state::JournaledState`]: account records, storage, and the
//!   frame-scoped change journal
//! - [`db::Database`]: the backing-store interface this crate reads from
//!
//! Everything is single-threaded per execution: one meter, one journal, one
//! state view per transaction. Parallel transactions each get their own
//! triple over a shared (internally synchronized) backing store.

pub mod account;
pub mod bytecode;
pub mod constants;
pub mod db;
pub mod errors;
pub mod fork;
pub mod gas_cost;
pub mod gas_meter;
pub mod gas_schedule;
pub mod journal;
pub mod state;

pub use account::{Account, AccountInfo, StorageSlot};
pub use bytecode::Bytecode;
pub use errors::{ExecutionResult, InstructionResult, VMError};
pub use fork::Fork;
pub use gas_meter::GasMeter;
pub use state::JournaledState;
