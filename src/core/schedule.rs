//! Installment-window applicability resolution.
//!
//! Decides whether an expense counts toward a given period and, for
//! installment expenses, which installment that period represents. Simple
//! expenses apply to every period. Installment expenses apply only inside
//! the window starting at (`installment_start_year`,
//! `installment_start_month`) and spanning `installment_total` periods.
//!
//! Malformed installment rows (missing or non-positive fields) resolve
//! **fail open**: the expense stays applicable rather than silently
//! vanishing from every month. That is a data-integrity warning, not an
//! error, and is logged as such.

use crate::core::period::Period;
use crate::entities::expense;
use tracing::warn;

/// A validated installment plan extracted from an expense row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallmentPlan {
    /// Number of installments (>= 1 after validation)
    pub total: u32,
    /// First applicable period
    pub start: Period,
}

impl InstallmentPlan {
    /// The last applicable period of the window.
    #[must_use]
    pub const fn end(self) -> Period {
        Period::from_index(self.start.index() + self.total as i64 - 1)
    }
}

/// How an expense relates to a single target period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthInfo {
    /// Whether the expense counts toward the period
    pub applicable: bool,
    /// 1-based installment position, when inside a valid window
    pub installment_index: Option<u32>,
    /// Total installment count, when known
    pub installment_total: Option<u32>,
}

impl MonthInfo {
    const ALWAYS: Self = Self {
        applicable: true,
        installment_index: None,
        installment_total: None,
    };
}

/// Extracts the installment plan from an expense, or None when the expense
/// is not installment-based or its fields are malformed.
#[must_use]
pub fn installment_plan(expense: &expense::Model) -> Option<InstallmentPlan> {
    if !expense.is_installment {
        return None;
    }

    let total = expense.installment_total.filter(|t| *t > 0)?;
    let start_year = expense.installment_start_year?;
    let start_month = expense.installment_start_month?;

    Some(InstallmentPlan {
        total: total.unsigned_abs(),
        start: Period::new(start_year, start_month.unsigned_abs()),
    })
}

/// Resolves whether `expense` counts toward `period`.
///
/// Installment rows with missing or invalid plan fields degrade to
/// applicable with no index; a positive `installment_total` is still passed
/// through when present. This exact fail-open policy is load-bearing:
/// malformed data must never hide an expense.
#[must_use]
pub fn resolve(expense: &expense::Model, period: Period) -> MonthInfo {
    if !expense.is_installment {
        return MonthInfo::ALWAYS;
    }

    let Some(plan) = installment_plan(expense) else {
        warn!(
            expense_id = expense.id,
            "installment expense has malformed plan fields, treating as always applicable"
        );
        return MonthInfo {
            applicable: true,
            installment_index: None,
            installment_total: expense
                .installment_total
                .filter(|t| *t > 0)
                .map(i32::unsigned_abs),
        };
    };

    let diff = period.index() - plan.start.index();
    let applicable = diff >= 0 && diff < i64::from(plan.total);

    MonthInfo {
        applicable,
        installment_index: if applicable {
            u32::try_from(diff).ok().map(|d| d + 1)
        } else {
            None
        },
        installment_total: Some(plan.total),
    }
}

/// True when an installment expense's window ends strictly before the
/// reference period. Simple and malformed rows never complete.
#[must_use]
pub fn is_installment_completed(expense: &expense::Model, reference: Period) -> bool {
    installment_plan(expense).is_some_and(|plan| reference.index() > plan.end().index())
}

/// The last applicable period of an installment expense, formatted as
/// `MM/YYYY`. None for simple or malformed rows.
#[must_use]
pub fn installment_end_label(expense: &expense::Model) -> Option<String> {
    installment_plan(expense).map(|plan| plan.end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::expense_model;

    fn installment(total: Option<i32>, start_year: Option<i32>, start_month: Option<i32>) -> expense::Model {
        expense::Model {
            is_installment: true,
            installment_total_amount: Some(1200.0),
            installment_total: total,
            installment_start_year: start_year,
            installment_start_month: start_month,
            ..expense_model(1, "Notebook", 120.0)
        }
    }

    #[test]
    fn test_simple_expense_always_applicable() {
        let simple = expense_model(1, "Internet", 99.9);
        for period in [Period::new(2000, 1), Period::new(2025, 6), Period::new(2099, 12)] {
            let info = resolve(&simple, period);
            assert!(info.applicable);
            assert_eq!(info.installment_index, None);
            assert_eq!(info.installment_total, None);
        }
    }

    #[test]
    fn test_installment_window_boundaries() {
        // Starts 2025-01, 3 installments: applicable 01..=03 only
        let e = installment(Some(3), Some(2025), Some(1));

        assert!(!resolve(&e, Period::new(2024, 12)).applicable);

        let first = resolve(&e, Period::new(2025, 1));
        assert!(first.applicable);
        assert_eq!(first.installment_index, Some(1));
        assert_eq!(first.installment_total, Some(3));

        let last = resolve(&e, Period::new(2025, 3));
        assert!(last.applicable);
        assert_eq!(last.installment_index, Some(3));

        let after = resolve(&e, Period::new(2025, 4));
        assert!(!after.applicable);
        assert_eq!(after.installment_index, None);
        assert_eq!(after.installment_total, Some(3));
    }

    #[test]
    fn test_installment_window_spans_year_boundary() {
        let e = installment(Some(4), Some(2024), Some(11));
        assert!(resolve(&e, Period::new(2024, 11)).applicable);
        assert_eq!(
            resolve(&e, Period::new(2025, 2)).installment_index,
            Some(4)
        );
        assert!(!resolve(&e, Period::new(2025, 3)).applicable);
    }

    #[test]
    fn test_fail_open_on_missing_count() {
        let e = installment(None, Some(2025), Some(1));
        for period in [Period::new(2020, 1), Period::new(2030, 12)] {
            let info = resolve(&e, period);
            assert!(info.applicable);
            assert_eq!(info.installment_index, None);
            assert_eq!(info.installment_total, None);
        }
    }

    #[test]
    fn test_fail_open_passes_total_through() {
        // Valid count but missing start: total still reported
        let e = installment(Some(10), None, None);
        let info = resolve(&e, Period::new(2025, 6));
        assert!(info.applicable);
        assert_eq!(info.installment_index, None);
        assert_eq!(info.installment_total, Some(10));
    }

    #[test]
    fn test_fail_open_on_nonpositive_count() {
        let e = installment(Some(0), Some(2025), Some(1));
        assert!(resolve(&e, Period::new(2030, 1)).applicable);
        assert!(!is_installment_completed(&e, Period::new(2030, 1)));
    }

    #[test]
    fn test_completion() {
        let e = installment(Some(3), Some(2025), Some(1));
        assert!(!is_installment_completed(&e, Period::new(2025, 1)));
        assert!(!is_installment_completed(&e, Period::new(2025, 3)));
        assert!(is_installment_completed(&e, Period::new(2025, 4)));
        assert!(is_installment_completed(&e, Period::new(2026, 1)));
    }

    #[test]
    fn test_simple_expense_never_completes() {
        let simple = expense_model(1, "Internet", 99.9);
        assert!(!is_installment_completed(&simple, Period::new(2099, 12)));
    }

    #[test]
    fn test_installment_end_label() {
        let e = installment(Some(3), Some(2025), Some(1));
        assert_eq!(installment_end_label(&e).as_deref(), Some("03/2025"));

        let crossing = installment(Some(14), Some(2025), Some(12));
        assert_eq!(installment_end_label(&crossing).as_deref(), Some("01/2027"));

        let malformed = installment(None, Some(2025), Some(1));
        assert_eq!(installment_end_label(&malformed), None);

        let simple = expense_model(1, "Internet", 99.9);
        assert_eq!(installment_end_label(&simple), None);
    }
}
