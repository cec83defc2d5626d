//! Dashboard aggregation over expenses and payment status.
//!
//! Every aggregate is computed over the period's *active applicable* set:
//! active expenses whose applicability resolves true for the target period.
//! All functions take their temporal context (`period`, `today`) explicitly;
//! nothing in here reads the clock or process-wide state, which keeps the
//! whole module deterministic and directly testable.

use crate::{
    core::{
        period::{Period, due_date_in, next_due_date},
        schedule,
    },
    entities::{MonthlyStatus, expense, monthly_status},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::{HashMap, HashSet};

/// Headline numbers for one period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlySummary {
    /// Sum of monthly amounts over the active applicable set
    pub total: f64,
    /// Number of active applicable expenses
    pub active_count: usize,
    /// Number of expenses on record, active or not
    pub all_count: usize,
}

/// One category's share of the monthly total.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    /// Category name ("Outros" when the expense has none)
    pub category: String,
    /// Summed monthly amounts
    pub total: f64,
}

/// One unpaid bill with its next due date, for the upcoming list.
#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingBill {
    /// The expense id
    pub expense_id: i64,
    /// Expense name
    pub name: String,
    /// Expense category
    pub category: String,
    /// Monthly amount
    pub amount: f64,
    /// Configured due day
    pub due_day: i32,
    /// Next date the bill falls due, relative to the given today
    pub next_due: NaiveDate,
    /// (index, total) when the expense is inside an installment window
    pub installment: Option<(u32, u32)>,
}

/// Unpaid bills bucketed by urgency. An item lands in exactly one bucket
/// or none.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DueAlerts {
    /// Bills whose due date this month already passed
    pub overdue_count: usize,
    /// Summed amount of overdue bills
    pub overdue_total: f64,
    /// Bills due today
    pub today_count: usize,
    /// Summed amount of bills due today
    pub today_total: f64,
    /// Bills due tomorrow
    pub tomorrow_count: usize,
    /// Summed amount of bills due tomorrow
    pub tomorrow_total: f64,
}

/// Paid versus pending totals for one period.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PaidPending {
    /// Sum of amounts actually paid (partial amounts when recorded)
    pub paid: f64,
    /// Sum of amounts still owed, floored at zero per expense
    pub pending: f64,
}

/// One period's paid total in the trailing history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryPoint {
    /// The period
    pub period: Period,
    /// Total paid in that period (0 when nothing was paid)
    pub total: f64,
}

/// The shared filter every aggregate starts from: active expenses
/// applicable to the target period.
pub fn active_applicable(expenses: &[expense::Model], period: Period) -> Vec<&expense::Model> {
    expenses
        .iter()
        .filter(|e| e.active)
        .filter(|e| schedule::resolve(e, period).applicable)
        .collect()
}

/// Sum of monthly amounts over the active applicable set.
#[must_use]
pub fn monthly_total(expenses: &[expense::Model], period: Period) -> f64 {
    active_applicable(expenses, period)
        .iter()
        .map(|e| e.amount)
        .sum()
}

/// Headline summary for one period.
#[must_use]
pub fn monthly_summary(expenses: &[expense::Model], period: Period) -> MonthlySummary {
    let active = active_applicable(expenses, period);
    MonthlySummary {
        total: active.iter().map(|e| e.amount).sum(),
        active_count: active.len(),
        all_count: expenses.len(),
    }
}

/// Groups the active applicable set by category and sums amounts, sorted
/// descending by total. Empty categories fall back to "Outros". The sort is
/// stable, so ties keep first-seen order.
#[must_use]
pub fn category_breakdown(expenses: &[expense::Model], period: Period) -> Vec<CategoryTotal> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, f64> = HashMap::new();

    for item in active_applicable(expenses, period) {
        let key = if item.category.trim().is_empty() {
            expense::DEFAULT_CATEGORY.to_string()
        } else {
            item.category.clone()
        };

        if !totals.contains_key(&key) {
            order.push(key.clone());
        }
        *totals.entry(key).or_insert(0.0) += item.amount;
    }

    let mut breakdown: Vec<CategoryTotal> = order
        .into_iter()
        .map(|category| {
            let total = totals.get(&category).copied().unwrap_or(0.0);
            CategoryTotal { category, total }
        })
        .collect();

    breakdown.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
    breakdown
}

/// The next `limit` unpaid bills ordered by due date, relative to `today`.
#[must_use]
pub fn upcoming_bills(
    expenses: &[expense::Model],
    period: Period,
    paid_ids: &HashSet<i64>,
    today: NaiveDate,
    limit: usize,
) -> Vec<UpcomingBill> {
    let mut bills: Vec<UpcomingBill> = active_applicable(expenses, period)
        .into_iter()
        .filter(|e| !paid_ids.contains(&e.id))
        .map(|e| {
            let info = schedule::resolve(e, period);
            UpcomingBill {
                expense_id: e.id,
                name: e.name.clone(),
                category: e.category.clone(),
                amount: e.amount,
                due_day: e.due_day,
                next_due: next_due_date(e.due_day, today),
                installment: info.installment_index.zip(info.installment_total),
            }
        })
        .collect();

    bills.sort_by_key(|b| b.next_due);
    bills.truncate(limit);
    bills
}

/// Buckets unpaid bills into overdue / due today / due tomorrow.
///
/// Overdue compares the bill's due date *within the target month* against
/// `today`; the today/tomorrow buckets use the rolling next-due date, so a
/// bill due early next month can still alert at month end.
#[must_use]
pub fn due_alerts(
    expenses: &[expense::Model],
    period: Period,
    paid_ids: &HashSet<i64>,
    today: NaiveDate,
) -> DueAlerts {
    let tomorrow = today.succ_opt();
    let mut alerts = DueAlerts::default();

    for item in active_applicable(expenses, period) {
        if paid_ids.contains(&item.id) {
            continue;
        }

        if due_date_in(period, item.due_day) < today {
            alerts.overdue_count += 1;
            alerts.overdue_total += item.amount;
            continue;
        }

        let next_due = next_due_date(item.due_day, today);
        if next_due == today {
            alerts.today_count += 1;
            alerts.today_total += item.amount;
        } else if Some(next_due) == tomorrow {
            alerts.tomorrow_count += 1;
            alerts.tomorrow_total += item.amount;
        }
    }

    alerts
}

/// Splits the period's active applicable set into paid and pending totals.
///
/// A paid row contributes `paid_amount` when recorded (partial payments),
/// otherwise the full monthly amount; its pending remainder is floored at
/// zero so overpayment never produces negative pending. Unpaid expenses
/// contribute their full amount to pending.
#[must_use]
pub fn paid_pending_split(
    expenses: &[expense::Model],
    period: Period,
    statuses: &[monthly_status::Model],
) -> PaidPending {
    let paid_rows: HashMap<i64, &monthly_status::Model> = statuses
        .iter()
        .filter(|s| s.paid && s.year == period.year && s.month.unsigned_abs() == period.month)
        .map(|s| (s.expense_id, s))
        .collect();

    let mut split = PaidPending::default();

    for item in active_applicable(expenses, period) {
        match paid_rows.get(&item.id) {
            Some(status) => {
                let paid = status.paid_amount.unwrap_or(item.amount);
                split.paid += paid;
                split.pending += (item.amount - paid).max(0.0);
            }
            None => split.pending += item.amount,
        }
    }

    split
}

/// Pure fold behind [`paid_history`]: sums paid amounts per window period,
/// re-resolving applicability for each historical period since installment
/// windows shift.
#[must_use]
pub fn fold_history(
    window: &[Period],
    expenses: &[expense::Model],
    statuses: &[monthly_status::Model],
) -> Vec<HistoryPoint> {
    let by_id: HashMap<i64, &expense::Model> = expenses
        .iter()
        .filter(|e| e.active)
        .map(|e| (e.id, e))
        .collect();

    let mut totals: HashMap<Period, f64> = window.iter().map(|p| (*p, 0.0)).collect();

    for row in statuses {
        if !row.paid {
            continue;
        }
        let Ok(month) = u32::try_from(row.month) else {
            continue;
        };
        let row_period = Period::new(row.year, month);
        let Some(total) = totals.get_mut(&row_period) else {
            continue;
        };
        let Some(item) = by_id.get(&row.expense_id) else {
            continue;
        };
        if !schedule::resolve(item, row_period).applicable {
            continue;
        }
        *total += row.paid_amount.unwrap_or(item.amount);
    }

    window
        .iter()
        .map(|p| HistoryPoint {
            period: *p,
            total: totals.get(p).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Paid totals for the trailing `window` periods ending at `ending`,
/// inclusive, oldest first. Periods with nothing paid report 0.
pub async fn paid_history(
    db: &DatabaseConnection,
    user_id: &str,
    expenses: &[expense::Model],
    ending: Period,
    window: usize,
) -> Result<Vec<HistoryPoint>> {
    let periods = ending.trailing(window);

    let years: Vec<i32> = periods.iter().map(|p| p.year).collect();
    let months: Vec<i32> = periods.iter().filter_map(|p| i32::try_from(p.month).ok()).collect();

    // The year/month IN-filters overmatch on windows crossing a year
    // boundary; fold_history drops rows outside the window.
    let statuses = MonthlyStatus::find()
        .filter(monthly_status::Column::UserId.eq(user_id))
        .filter(monthly_status::Column::Paid.eq(true))
        .filter(monthly_status::Column::Year.is_in(years))
        .filter(monthly_status::Column::Month.is_in(months))
        .all(db)
        .await?;

    Ok(fold_history(&periods, expenses, &statuses))
}
