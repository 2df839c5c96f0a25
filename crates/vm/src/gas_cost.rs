//! Pure gas cost and refund formulas.
//!
//! Every fallible function here computes with checked arithmetic and reports
//! a `u64` overflow as [`ExceptionalHalt::OutOfGas`]; a wrapped cost could
//! otherwise slip below the gas limit check.

use crate::{
    constants::{MEMORY_EXPANSION_QUOTIENT, WORD_SIZE_IN_BYTES_U64, WORD_SIZE_IN_BYTES_USIZE},
    errors::ExceptionalHalt,
    fork::Fork,
    gas_schedule::GasSchedule,
};
use ExceptionalHalt::OutOfGas;
use ethereum_types::U256;

// Opcodes cost
pub const EXP_STATIC: u64 = 10;
pub const KECCAK256_STATIC: u64 = 30;
pub const KECCAK256_DYNAMIC_BASE: u64 = 6;
pub const COPY_STATIC: u64 = 3;
pub const COPY_DYNAMIC_BASE: u64 = 3;
pub const EXTCODECOPY_DYNAMIC_BASE: u64 = 3;
pub const LOGN_STATIC: u64 = 375;
pub const LOGN_DYNAMIC_BASE: u64 = 375;
pub const LOGN_DYNAMIC_BYTE_BASE: u64 = 8;

// SSTORE cannot run on the stipend a value-bearing CALL leaves behind.
// https://eips.ethereum.org/EIPS/eip-2200
pub const SSTORE_STIPEND: u64 = 2300;

// Costs in gas for create opcodes
pub const INIT_CODE_WORD_COST: u64 = 2;
pub const CODE_DEPOSIT_COST: u64 = 200;
pub const CREATE_BASE_COST: u64 = 32000;

// Access lists costs
pub const ACCESS_LIST_STORAGE_KEY_COST: u64 = 1900;
pub const ACCESS_LIST_ADDRESS_COST: u64 = 2400;

/// `ceil(len / 32)`, the word count every per-word formula is based on.
fn word_count(len: usize) -> Result<u64, ExceptionalHalt> {
    let len: u64 = len
        .try_into()
        .map_err(|_| ExceptionalHalt::VeryLargeNumber)?;
    let extra = u64::from(len % WORD_SIZE_IN_BYTES_U64 != 0);
    (len / WORD_SIZE_IN_BYTES_U64).checked_add(extra).ok_or(OutOfGas)
}

/// `static_cost + dynamic_base * ceil(size / 32)`, the shape shared by the
/// copy, hash and initcode meters.
pub fn copy_cost(static_cost: u64, dynamic_base: u64, size: usize) -> Result<u64, ExceptionalHalt> {
    let minimum_word_size_cost = dynamic_base.checked_mul(word_count(size)?).ok_or(OutOfGas)?;
    static_cost.checked_add(minimum_word_size_cost).ok_or(OutOfGas)
}

pub fn keccak256(size: usize) -> Result<u64, ExceptionalHalt> {
    copy_cost(KECCAK256_STATIC, KECCAK256_DYNAMIC_BASE, size)
}

pub fn calldatacopy(size: usize) -> Result<u64, ExceptionalHalt> {
    copy_cost(COPY_STATIC, COPY_DYNAMIC_BASE, size)
}

pub fn codecopy(size: usize) -> Result<u64, ExceptionalHalt> {
    copy_cost(COPY_STATIC, COPY_DYNAMIC_BASE, size)
}

pub fn returndatacopy(size: usize) -> Result<u64, ExceptionalHalt> {
    copy_cost(COPY_STATIC, COPY_DYNAMIC_BASE, size)
}

pub fn log(size: usize, number_of_topics: usize) -> Result<u64, ExceptionalHalt> {
    let number_of_topics: u64 = number_of_topics
        .try_into()
        .map_err(|_| ExceptionalHalt::VeryLargeNumber)?;
    let topics_cost = LOGN_DYNAMIC_BASE
        .checked_mul(number_of_topics)
        .ok_or(OutOfGas)?;

    let size: u64 = size
        .try_into()
        .map_err(|_| ExceptionalHalt::VeryLargeNumber)?;
    let bytes_cost = LOGN_DYNAMIC_BYTE_BASE.checked_mul(size).ok_or(OutOfGas)?;

    topics_cost
        .checked_add(LOGN_STATIC)
        .ok_or(OutOfGas)?
        .checked_add(bytes_cost)
        .ok_or(OutOfGas)
}

/// Gas cost for the EXP operation: base fee plus a per-byte fee over the
/// significant bytes of the exponent. A zero exponent costs the base fee
/// alone.
///
/// Pre-Spurious Dragon the byte fee is 10; EIP-160 raised it to 50.
pub fn exp(fork: Fork, exponent: U256) -> Result<u64, ExceptionalHalt> {
    let exponent_byte_size = (exponent.bits().checked_add(7).ok_or(OutOfGas)?) / 8;

    let exponent_byte_size: u64 = exponent_byte_size
        .try_into()
        .map_err(|_| ExceptionalHalt::VeryLargeNumber)?;

    let schedule = GasSchedule::for_fork(fork);
    let exponent_byte_size_cost = schedule
        .exp_byte
        .checked_mul(exponent_byte_size)
        .ok_or(OutOfGas)?;

    EXP_STATIC.checked_add(exponent_byte_size_cost).ok_or(OutOfGas)
}

/// [EIP-3860] per-word metering of initcode, active from Shanghai.
pub fn initcode_cost(fork: Fork, init_code_len: usize) -> Result<u64, ExceptionalHalt> {
    if !fork.is_activated(Fork::Shanghai) {
        return Ok(0);
    }
    word_count(init_code_len)?
        .checked_mul(INIT_CODE_WORD_COST)
        .ok_or(OutOfGas)
}

pub fn create(fork: Fork, init_code_len: usize) -> Result<u64, ExceptionalHalt> {
    CREATE_BASE_COST
        .checked_add(initcode_cost(fork, init_code_len)?)
        .ok_or(OutOfGas)
}

/// CREATE2 additionally pays for hashing the initcode.
pub fn create_2(fork: Fork, init_code_len: usize) -> Result<u64, ExceptionalHalt> {
    let hash_cost = word_count(init_code_len)?
        .checked_mul(KECCAK256_DYNAMIC_BASE)
        .ok_or(OutOfGas)?;

    CREATE_BASE_COST
        .checked_add(initcode_cost(fork, init_code_len)?)
        .ok_or(OutOfGas)?
        .checked_add(hash_cost)
        .ok_or(OutOfGas)
}

/// When a memory expansion is triggered, only the additional bytes of memory
/// must be paid for; shrinking is never charged.
#[inline]
pub fn memory_expansion_cost(
    new_memory_size: usize,
    current_memory_size: usize,
) -> Result<u64, ExceptionalHalt> {
    let cost = if new_memory_size <= current_memory_size {
        0
    } else {
        // cost(x) > cost(y) whenever x > y, so this cannot underflow.
        memory_cost(new_memory_size)?.wrapping_sub(memory_cost(current_memory_size)?)
    };
    Ok(cost)
}

/// The total cost for a given memory size: `3w + w²/512` over the word count.
#[inline]
fn memory_cost(memory_size: usize) -> Result<u64, ExceptionalHalt> {
    let memory_size_word = memory_size
        .checked_add(WORD_SIZE_IN_BYTES_USIZE.wrapping_sub(1))
        .ok_or(OutOfGas)?
        / WORD_SIZE_IN_BYTES_USIZE;

    let gas_cost = (memory_size_word
        .checked_mul(memory_size_word)
        .ok_or(OutOfGas)?
        / MEMORY_EXPANSION_QUOTIENT)
        .checked_add(3usize.checked_mul(memory_size_word).ok_or(OutOfGas)?)
        .ok_or(OutOfGas)?;

    gas_cost
        .try_into()
        .map_err(|_| ExceptionalHalt::VeryLargeNumber)
}

/// Gas cost for SLOAD.
pub fn sload(fork: Fork, storage_slot_was_cold: bool) -> u64 {
    GasSchedule::for_fork(fork).sload_cost(storage_slot_was_cold)
}

/// Gas cost for reading an account (BALANCE, EXTCODESIZE, EXTCODEHASH, the
/// CALL family address access).
pub fn account_access(fork: Fork, address_was_cold: bool) -> u64 {
    GasSchedule::for_fork(fork).account_access_cost(address_was_cold)
}

/// Gas cost for EXTCODECOPY: the per-word copy cost plus the account access
/// cost for the code owner.
pub fn extcodecopy(fork: Fork, size: usize, address_was_cold: bool) -> Result<u64, ExceptionalHalt> {
    let schedule = GasSchedule::for_fork(fork);
    copy_cost(0, EXTCODECOPY_DYNAMIC_BASE, size)?
        .checked_add(schedule.account_access_cost(address_was_cold))
        .ok_or(OutOfGas)
}

/// Gas cost for SSTORE over the `(original, current, new)` value triple.
///
/// Fails with [`ExceptionalHalt::OutOfGas`] when the remaining gas is within
/// the call stipend, so an SSTORE can never ride on the 2300 gas a
/// value-bearing CALL forwards.
pub fn sstore(
    fork: Fork,
    original_value: U256,
    current_value: U256,
    new_value: U256,
    remaining_gas: u64,
    storage_slot_was_cold: bool,
) -> Result<u64, ExceptionalHalt> {
    if remaining_gas <= SSTORE_STIPEND {
        return Err(OutOfGas);
    }

    let schedule = GasSchedule::for_fork(fork);

    let base_dynamic_gas = if !schedule.has_net_metering {
        if current_value.is_zero() && !new_value.is_zero() {
            schedule.sstore_set
        } else {
            schedule.sstore_reset
        }
    } else if new_value == current_value {
        // No-op: charge the (warm) read cost
        schedule.sload_cost(false)
    } else if current_value == original_value {
        // First write to this slot in the transaction
        if original_value.is_zero() {
            schedule.sstore_set
        } else {
            schedule.sstore_reset
        }
    } else {
        // Dirty slot: charge the (warm) read cost
        schedule.sload_cost(false)
    };

    // https://eips.ethereum.org/EIPS/eip-2929
    let cold_access_cost = if schedule.has_access_lists && storage_slot_was_cold {
        schedule.cold_sload
    } else {
        0
    };

    base_dynamic_gas.checked_add(cold_access_cost).ok_or(OutOfGas)
}

/// Refund for SSTORE over the `(original, current, new)` value triple.
///
/// Pre-Istanbul the rule is a flat credit for clearing a non-zero slot.
/// From Istanbul (EIP-2200) the refund is recomputed against the original
/// value, taking back credits a later write invalidated and crediting back
/// the gas a restored slot would never have cost.
pub fn sstore_refund(fork: Fork, original_value: U256, current_value: U256, new_value: U256) -> i64 {
    let schedule = GasSchedule::for_fork(fork);

    if !fork.is_activated(Fork::Istanbul) {
        return if !current_value.is_zero() && new_value.is_zero() {
            schedule.sstore_clears_refund
        } else {
            0
        };
    }

    if current_value == new_value {
        return 0;
    }

    if original_value == current_value && new_value.is_zero() {
        return schedule.sstore_clears_refund;
    }

    let mut refund = 0i64;

    if !original_value.is_zero() {
        if current_value.is_zero() {
            // Take back the credit an earlier clear of this slot earned
            refund -= schedule.sstore_clears_refund;
        } else if new_value.is_zero() {
            refund += schedule.sstore_clears_refund;
        }
    }

    if original_value == new_value {
        // The slot ends the transaction where it started; give back the gas
        // that would not have been spent had it never changed.
        let warm_read = schedule.sload_cost(false);
        let written_back = if original_value.is_zero() {
            schedule.sstore_set.saturating_sub(warm_read)
        } else {
            schedule.sstore_reset.saturating_sub(warm_read)
        };
        refund += written_back as i64;
    }

    refund
}

/// Gas cost for SELFDESTRUCT.
pub fn selfdestruct(
    fork: Fork,
    target_was_cold: bool,
    target_is_empty: bool,
    has_balance: bool,
) -> Result<u64, ExceptionalHalt> {
    let schedule = GasSchedule::for_fork(fork);

    let mut dynamic_cost = if schedule.has_access_lists && target_was_cold {
        schedule.cold_account_access
    } else {
        0
    };

    // Sending a positive balance to an empty account pays the new-account fee
    if target_is_empty && has_balance {
        dynamic_cost = dynamic_cost
            .checked_add(schedule.selfdestruct_new_account)
            .ok_or(OutOfGas)?;
    }

    schedule.selfdestruct.checked_add(dynamic_cost).ok_or(OutOfGas)
}

/// Refund for SELFDESTRUCT, removed by EIP-3529.
pub fn selfdestruct_refund(fork: Fork) -> i64 {
    GasSchedule::for_fork(fork).selfdestruct_refund
}

/// Intrinsic cost of transaction calldata: a cheap rate for zero bytes and a
/// fork-dependent rate for non-zero bytes.
pub fn tx_calldata(fork: Fork, calldata: &[u8]) -> Result<u64, ExceptionalHalt> {
    let schedule = GasSchedule::for_fork(fork);
    let mut calldata_cost: u64 = 0;
    for byte in calldata {
        calldata_cost = if *byte != 0 {
            calldata_cost
                .checked_add(schedule.calldata_nonzero)
                .ok_or(OutOfGas)?
        } else {
            calldata_cost
                .checked_add(schedule.calldata_zero)
                .ok_or(OutOfGas)?
        }
    }
    Ok(calldata_cost)
}
