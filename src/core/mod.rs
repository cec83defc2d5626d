//! Core business logic - framework-agnostic period math, applicability
//! resolution, aggregation, settlement, and wallet operations.

/// Expense CRUD, validation, and the installment auto-archive sweep
pub mod expense;
/// Pure calendar-period arithmetic (ordinals, shifting, due dates)
pub mod period;
/// Dashboard aggregation over expenses and payment status
pub mod report;
/// Installment-window applicability resolution
pub mod schedule;
/// Paid/unpaid state transitions and the wallet-ledger projection
pub mod settlement;
/// Manual wallet entries and balance
pub mod wallet;

/// Rounds a monetary value to two decimal places.
///
/// Used everywhere a derived amount is persisted (installment monthly
/// amounts, manual wallet entries) so stored values never carry float dust.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
