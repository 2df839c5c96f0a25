//! Gas accounting for a single execution context.

use serde::{Deserialize, Serialize};

/// Tracks the gas budget of one top-level execution.
///
/// Consumption is split into a base bucket and a memory-expansion bucket,
/// with `total_used` always equal to their sum. The meter fails closed: a
/// charge that would exceed the limit leaves every field untouched and
/// reports failure, and additions saturate so a pathological cost cannot
/// wrap past the limit check.
///
/// One meter belongs to exactly one execution; it is never shared across
/// concurrent transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasMeter {
    limit: u64,
    used: u64,
    memory_used: u64,
    total_used: u64,
    refund: i64,
}

impl GasMeter {
    pub const fn new(limit: u64) -> Self {
        Self {
            limit,
            used: 0,
            memory_used: 0,
            total_used: 0,
            refund: 0,
        }
    }

    /// Charges `cost` against the budget. Returns `false`, leaving the meter
    /// unchanged, when the charge would exceed the limit.
    #[must_use = "an unchecked failed charge bypasses the gas limit"]
    pub fn record_cost(&mut self, cost: u64) -> bool {
        let new_total = self.total_used.saturating_add(cost);
        if new_total > self.limit {
            return false;
        }
        self.used = self.used.saturating_add(cost);
        self.total_used = new_total;
        true
    }

    /// Raises the memory-expansion charge to `new_memory_cost`. Memory cost
    /// is monotonic over a call: lower or equal values are accepted without
    /// effect, shrinking is never charged.
    #[must_use = "an unchecked failed charge bypasses the gas limit"]
    pub fn record_memory(&mut self, new_memory_cost: u64) -> bool {
        if new_memory_cost <= self.memory_used {
            return true;
        }
        let new_total = self.used.saturating_add(new_memory_cost);
        if new_total > self.limit {
            return false;
        }
        self.memory_used = new_memory_cost;
        self.total_used = new_total;
        true
    }

    /// Returns `amount` of already-charged base gas, for repricing
    /// corrections on gas charged up front. The caller guarantees
    /// `amount <= used`.
    pub fn erase_cost(&mut self, amount: u64) {
        self.used = self.used.saturating_sub(amount);
        self.total_used = self.total_used.saturating_sub(amount);
    }

    pub fn add_refund(&mut self, delta: i64) {
        self.refund = self.refund.saturating_add(delta);
    }

    pub fn set_refund(&mut self, value: i64) {
        self.refund = value;
    }

    pub const fn remaining(&self) -> u64 {
        self.limit - self.total_used
    }

    pub const fn limit(&self) -> u64 {
        self.limit
    }

    pub const fn used(&self) -> u64 {
        self.used
    }

    pub const fn memory_used(&self) -> u64 {
        self.memory_used
    }

    pub const fn total_used(&self) -> u64 {
        self.total_used
    }

    /// The raw refund counter. It may be negative mid-execution; the
    /// transaction finalizer clamps it against the fork's refund quotient
    /// before it affects the bill.
    pub const fn refund(&self) -> i64 {
        self.refund
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_cost_decrements_remaining_exactly() {
        let mut meter = GasMeter::new(21000);
        assert!(meter.record_cost(3));
        assert!(meter.record_cost(5000));
        assert_eq!(meter.used(), 5003);
        assert_eq!(meter.total_used(), 5003);
        assert_eq!(meter.remaining(), 21000 - 5003);
    }

    #[test]
    fn failed_charge_leaves_meter_unchanged() {
        let mut meter = GasMeter::new(100);
        assert!(meter.record_cost(60));
        let snapshot = meter;
        assert!(!meter.record_cost(41));
        assert_eq!(meter, snapshot);
        // The exact remainder still fits
        assert!(meter.record_cost(40));
        assert_eq!(meter.remaining(), 0);
    }

    #[test]
    fn saturating_cost_cannot_wrap_past_limit() {
        let mut meter = GasMeter::new(100);
        assert!(meter.record_cost(1));
        assert!(!meter.record_cost(u64::MAX));
        assert_eq!(meter.total_used(), 1);
    }

    #[test]
    fn record_memory_is_monotonic_and_idempotent() {
        let mut meter = GasMeter::new(1000);
        assert!(meter.record_memory(100));
        assert_eq!(meter.memory_used(), 100);

        // Non-increasing values never change the charge
        assert!(meter.record_memory(100));
        assert!(meter.record_memory(40));
        assert_eq!(meter.memory_used(), 100);
        assert_eq!(meter.total_used(), 100);

        // Strictly increasing values always do
        assert!(meter.record_memory(150));
        assert_eq!(meter.memory_used(), 150);
        assert_eq!(meter.total_used(), 150);
    }

    #[test]
    fn memory_and_base_buckets_share_the_limit() {
        let mut meter = GasMeter::new(200);
        assert!(meter.record_cost(150));
        assert!(!meter.record_memory(51));
        assert_eq!(meter.memory_used(), 0);
        assert!(meter.record_memory(50));
        assert_eq!(meter.total_used(), 200);
        assert_eq!(meter.remaining(), 0);
    }

    #[test]
    fn erase_cost_returns_charged_gas() {
        let mut meter = GasMeter::new(1000);
        assert!(meter.record_cost(500));
        meter.erase_cost(200);
        assert_eq!(meter.used(), 300);
        assert_eq!(meter.total_used(), 300);
        assert_eq!(meter.remaining(), 700);
    }

    #[test]
    fn refund_counter_is_signed_and_unclamped() {
        let mut meter = GasMeter::new(1000);
        meter.add_refund(4800);
        meter.add_refund(-10000);
        assert_eq!(meter.refund(), -5200);
        meter.set_refund(15000);
        assert_eq!(meter.refund(), 15000);
    }

    #[test]
    fn total_used_is_sum_of_buckets() {
        let mut meter = GasMeter::new(10000);
        assert!(meter.record_cost(123));
        assert!(meter.record_memory(456));
        assert!(meter.record_cost(7));
        assert_eq!(meter.total_used(), meter.used() + meter.memory_used());
    }
}
