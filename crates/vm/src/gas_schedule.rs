//! Fork-aware gas schedules.
//!
//! This module defines the gas costs that vary across hard forks. Each tier
//! has its own `GasSchedule`; costs that never changed stay as constants in
//! `gas_cost`.
//!
//! # Fork history (gas-relevant changes)
//!
//! - **Frontier/Homestead**: original costs
//! - **Tangerine Whistle (EIP-150)**: increased IO costs (SLOAD, BALANCE, CALL, etc.)
//! - **Spurious Dragon (EIP-160)**: EXP byte cost increase
//! - **Constantinople (EIP-1283)**: net gas metering, reverted in Petersburg
//! - **Istanbul (EIP-1884/2028/2200)**: SLOAD increase, calldata decrease, net gas metering
//! - **Berlin (EIP-2929)**: cold/warm access pricing
//! - **London (EIP-3529)**: reduced clear refund, removed self-destruct refund

use crate::fork::Fork;

/// Gas costs that vary by fork.
#[derive(Debug, Clone, Copy)]
pub struct GasSchedule {
    // Storage operations
    pub sload: u64,
    pub sstore_set: u64,
    pub sstore_reset: u64,
    pub sstore_clears_refund: i64,

    // Account access (BALANCE, EXTCODESIZE, EXTCODEHASH, CALL family)
    pub account_access: u64,

    // Self-destruct
    pub selfdestruct: u64,
    pub selfdestruct_new_account: u64,
    pub selfdestruct_refund: i64,

    // EXP operation
    pub exp_byte: u64,

    // Calldata costs
    pub calldata_zero: u64,
    pub calldata_nonzero: u64,

    // Whether this fork uses cold/warm access tracking (EIP-2929)
    pub has_access_lists: bool,

    // Cold/warm costs (only relevant if has_access_lists is true)
    pub cold_sload: u64,
    pub warm_sload: u64,
    pub cold_account_access: u64,
    pub warm_account_access: u64,

    // Whether this fork uses net gas metering for SSTORE (EIP-1283/2200)
    pub has_net_metering: bool,
}

impl GasSchedule {
    /// Get the gas schedule for a specific fork.
    pub const fn for_fork(fork: Fork) -> &'static GasSchedule {
        match fork {
            Fork::Frontier | Fork::Homestead => &FRONTIER_SCHEDULE,
            Fork::Tangerine => &TANGERINE_WHISTLE_SCHEDULE,
            Fork::SpuriousDragon | Fork::Byzantium => &SPURIOUS_DRAGON_SCHEDULE,
            Fork::Constantinople => &CONSTANTINOPLE_SCHEDULE,
            // Petersburg reverted EIP-1283 and otherwise kept the same costs
            Fork::Petersburg => &SPURIOUS_DRAGON_SCHEDULE,
            Fork::Istanbul => &ISTANBUL_SCHEDULE,
            Fork::Berlin => &BERLIN_SCHEDULE,
            // London and later
            _ => &LONDON_SCHEDULE,
        }
    }

    /// Get SLOAD cost, considering cold/warm access for Berlin+.
    #[inline]
    pub const fn sload_cost(&self, is_cold: bool) -> u64 {
        if self.has_access_lists {
            if is_cold { self.cold_sload } else { self.warm_sload }
        } else {
            self.sload
        }
    }

    /// Get account access cost (BALANCE, EXTCODESIZE, CALL family, etc.),
    /// considering cold/warm access for Berlin+.
    #[inline]
    pub const fn account_access_cost(&self, is_cold: bool) -> u64 {
        if self.has_access_lists {
            if is_cold {
                self.cold_account_access
            } else {
                self.warm_account_access
            }
        } else {
            self.account_access
        }
    }
}

/// Frontier/Homestead gas schedule.
///
/// Original Ethereum gas costs before any IO repricing.
pub static FRONTIER_SCHEDULE: GasSchedule = GasSchedule {
    sload: 50,
    sstore_set: 20000,
    sstore_reset: 5000,
    sstore_clears_refund: 15000,

    account_access: 20,

    selfdestruct: 0,
    selfdestruct_new_account: 0,
    selfdestruct_refund: 24000,

    exp_byte: 10, // EIP-160 changed this to 50 in Spurious Dragon

    calldata_zero: 4,
    calldata_nonzero: 68,

    has_access_lists: false,
    cold_sload: 0,
    warm_sload: 0,
    cold_account_access: 0,
    warm_account_access: 0,

    has_net_metering: false,
};

/// Tangerine Whistle gas schedule (EIP-150).
///
/// Major IO cost increases to prevent DoS attacks.
pub static TANGERINE_WHISTLE_SCHEDULE: GasSchedule = GasSchedule {
    sload: 200,
    account_access: 700,

    selfdestruct: 5000,
    selfdestruct_new_account: 25000,

    ..FRONTIER_SCHEDULE
};

/// Spurious Dragon gas schedule (EIP-160): EXP repricing.
/// Byzantium and Petersburg kept the same costs.
pub static SPURIOUS_DRAGON_SCHEDULE: GasSchedule = GasSchedule {
    exp_byte: 50,
    ..TANGERINE_WHISTLE_SCHEDULE
};

/// Constantinople gas schedule (EIP-1283).
///
/// Net gas metering with SLOAD_GAS = 200, reverted in Petersburg because of
/// the reentrancy bug it enabled.
pub static CONSTANTINOPLE_SCHEDULE: GasSchedule = GasSchedule {
    has_net_metering: true,
    ..SPURIOUS_DRAGON_SCHEDULE
};

/// Istanbul gas schedule (EIP-1884/2028/2200).
pub static ISTANBUL_SCHEDULE: GasSchedule = GasSchedule {
    sload: 800, // Increased from 200

    calldata_nonzero: 16, // Decreased from 68 (EIP-2028)

    has_net_metering: true,

    ..SPURIOUS_DRAGON_SCHEDULE
};

/// Berlin gas schedule (EIP-2929/2930).
///
/// Introduces cold/warm access pricing.
pub static BERLIN_SCHEDULE: GasSchedule = GasSchedule {
    // Base costs are 0 when using access lists; actual cost comes from cold/warm
    sload: 0,
    account_access: 0,

    sstore_set: 20000,
    sstore_reset: 2900, // Changed in EIP-2929
    sstore_clears_refund: 15000,

    selfdestruct: 5000,
    selfdestruct_new_account: 25000,
    selfdestruct_refund: 24000,

    exp_byte: 50,

    calldata_zero: 4,
    calldata_nonzero: 16,

    has_access_lists: true,
    cold_sload: 2100,
    warm_sload: 100,
    cold_account_access: 2600,
    warm_account_access: 100,

    has_net_metering: true,
};

/// London gas schedule (EIP-3529).
///
/// Reduced the storage clear refund and removed the self-destruct refund.
pub static LONDON_SCHEDULE: GasSchedule = GasSchedule {
    sstore_clears_refund: 4800, // sstore_reset + access list storage key cost
    selfdestruct_refund: 0,
    ..BERLIN_SCHEDULE
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontier_schedule() {
        let schedule = GasSchedule::for_fork(Fork::Frontier);
        assert_eq!(schedule.sload, 50);
        assert_eq!(schedule.account_access, 20);
        assert_eq!(schedule.exp_byte, 10);
        assert!(!schedule.has_access_lists);
        assert!(!schedule.has_net_metering);
    }

    #[test]
    fn test_tangerine_whistle_schedule() {
        let schedule = GasSchedule::for_fork(Fork::Tangerine);
        assert_eq!(schedule.sload, 200);
        assert_eq!(schedule.account_access, 700);
        assert_eq!(schedule.selfdestruct, 5000);
    }

    #[test]
    fn test_petersburg_reverts_net_metering() {
        assert!(GasSchedule::for_fork(Fork::Constantinople).has_net_metering);
        assert!(!GasSchedule::for_fork(Fork::Petersburg).has_net_metering);
        assert!(GasSchedule::for_fork(Fork::Istanbul).has_net_metering);
    }

    #[test]
    fn test_istanbul_schedule() {
        let schedule = GasSchedule::for_fork(Fork::Istanbul);
        assert_eq!(schedule.sload, 800);
        assert_eq!(schedule.calldata_nonzero, 16);
    }

    #[test]
    fn test_berlin_schedule() {
        let schedule = GasSchedule::for_fork(Fork::Berlin);
        assert!(schedule.has_access_lists);
        assert_eq!(schedule.cold_sload, 2100);
        assert_eq!(schedule.warm_sload, 100);
        assert_eq!(schedule.sstore_reset, 2900);
    }

    #[test]
    fn test_london_refund_cuts() {
        let schedule = GasSchedule::for_fork(Fork::London);
        assert_eq!(schedule.sstore_clears_refund, 4800);
        assert_eq!(schedule.selfdestruct_refund, 0);
        assert_eq!(GasSchedule::for_fork(Fork::Berlin).sstore_clears_refund, 15000);
    }

    #[test]
    fn test_sload_cost_pre_berlin() {
        let schedule = GasSchedule::for_fork(Fork::Istanbul);
        // Pre-Berlin ignores cold/warm
        assert_eq!(schedule.sload_cost(true), 800);
        assert_eq!(schedule.sload_cost(false), 800);
    }

    #[test]
    fn test_sload_cost_berlin() {
        let schedule = GasSchedule::for_fork(Fork::Berlin);
        assert_eq!(schedule.sload_cost(true), 2100);
        assert_eq!(schedule.sload_cost(false), 100);
    }

    #[test]
    fn test_cancun_uses_london_costs() {
        let schedule = GasSchedule::for_fork(Fork::Cancun);
        assert_eq!(schedule.sstore_clears_refund, 4800);
        assert!(schedule.has_access_lists);
    }
}
