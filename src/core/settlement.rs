//! Paid/unpaid state transitions and the wallet-ledger projection.
//!
//! Per (expense, period) the state machine is `Unpaid` (no row, or a row
//! with `paid = false`) and `Paid(amount)`. Transitions upsert the single
//! monthly-status row keyed on (user, expense, year, month); the backing
//! unique index makes the upsert race-safe with last-write-wins semantics.
//!
//! Every paid transition projects one automatic wallet entry
//! (`kind = "expense_payment"`, amount `= -|paid amount|`) keyed on
//! (user, kind, expense, year, month); unpaid removes it. The projection is
//! **best-effort**: the status row is authoritative, and a ledger failure is
//! logged and reported in the outcome without rolling anything back. A
//! corrective re-toggle repairs a partially synced ledger.

use crate::{
    core::{period::Period, round2, schedule},
    entities::{MonthlyStatus, WalletEntry, monthly_status, wallet_entry},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, sea_query::OnConflict,
};
use std::collections::HashSet;
use tracing::warn;

/// Outcome of the best-effort wallet projection step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerSync {
    /// The automatic entry was written (or overwritten)
    Synced,
    /// The automatic entry (or entries) was removed
    Removed,
    /// The projection failed; status is still correct
    Failed {
        /// What went wrong, for the caller to log or surface
        message: String,
    },
}

/// Result of a single settlement transition.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    /// The monthly-status row after the write (re-fetched)
    pub status: monthly_status::Model,
    /// How the wallet projection went
    pub ledger: LedgerSync,
}

/// Result of a whole-period batch settlement.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// How many expenses the status upsert covered
    pub updated: usize,
    /// How the batched wallet projection went
    pub ledger: LedgerSync,
}

fn status_conflict() -> OnConflict {
    OnConflict::columns([
        monthly_status::Column::UserId,
        monthly_status::Column::ExpenseId,
        monthly_status::Column::Year,
        monthly_status::Column::Month,
    ])
    .update_columns([
        monthly_status::Column::Paid,
        monthly_status::Column::PaidAmount,
        monthly_status::Column::PaidAt,
    ])
    .to_owned()
}

fn ledger_conflict() -> OnConflict {
    OnConflict::columns([
        wallet_entry::Column::UserId,
        wallet_entry::Column::Kind,
        wallet_entry::Column::RefExpenseId,
        wallet_entry::Column::RefYear,
        wallet_entry::Column::RefMonth,
    ])
    .update_columns([
        wallet_entry::Column::Amount,
        wallet_entry::Column::Description,
        wallet_entry::Column::CreatedAt,
    ])
    .to_owned()
}

fn status_row(
    user_id: &str,
    expense_id: i64,
    period: Period,
    paid: bool,
    paid_amount: Option<f64>,
) -> monthly_status::ActiveModel {
    monthly_status::ActiveModel {
        user_id: Set(user_id.to_string()),
        expense_id: Set(expense_id),
        year: Set(period.year),
        month: Set(period.month as i32),
        paid: Set(paid),
        paid_amount: Set(paid_amount),
        paid_at: Set(paid.then(Utc::now)),
        ..Default::default()
    }
}

fn payment_entry(
    user_id: &str,
    expense: &crate::entities::expense::Model,
    period: Period,
    amount: f64,
) -> wallet_entry::ActiveModel {
    wallet_entry::ActiveModel {
        user_id: Set(user_id.to_string()),
        kind: Set(wallet_entry::KIND_EXPENSE_PAYMENT.to_string()),
        amount: Set(-round2(amount).abs()),
        description: Set(Some(expense.name.clone())),
        ref_expense_id: Set(Some(expense.id)),
        ref_year: Set(Some(period.year)),
        ref_month: Set(Some(period.month as i32)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
}

async fn fetch_status(
    db: &DatabaseConnection,
    user_id: &str,
    expense_id: i64,
    period: Period,
) -> Result<Option<monthly_status::Model>> {
    MonthlyStatus::find()
        .filter(monthly_status::Column::UserId.eq(user_id))
        .filter(monthly_status::Column::ExpenseId.eq(expense_id))
        .filter(monthly_status::Column::Year.eq(period.year))
        .filter(monthly_status::Column::Month.eq(period.month as i32))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All status rows for a user and period.
pub async fn list_statuses(
    db: &DatabaseConnection,
    user_id: &str,
    period: Period,
) -> Result<Vec<monthly_status::Model>> {
    MonthlyStatus::find()
        .filter(monthly_status::Column::UserId.eq(user_id))
        .filter(monthly_status::Column::Year.eq(period.year))
        .filter(monthly_status::Column::Month.eq(period.month as i32))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Ids of expenses marked paid for the period. Feeds the dashboard's
/// unpaid-only aggregates.
pub async fn paid_expense_ids(
    db: &DatabaseConnection,
    user_id: &str,
    period: Period,
) -> Result<HashSet<i64>> {
    Ok(list_statuses(db, user_id, period)
        .await?
        .into_iter()
        .filter(|s| s.paid)
        .map(|s| s.expense_id)
        .collect())
}

/// Marks an expense paid for a period, recording the amount actually paid
/// (which may differ from the monthly amount for partial payments).
///
/// Requires a finite, strictly positive amount and that the expense is
/// applicable to the period. The status upsert is authoritative; the wallet
/// projection that follows is best-effort and reported in the outcome.
/// Calling this twice with the same amount is an effective no-op; a
/// different amount overwrites both the status row and the ledger entry.
pub async fn mark_paid(
    db: &DatabaseConnection,
    user_id: &str,
    expense_id: i64,
    period: Period,
    amount: f64,
) -> Result<SettlementOutcome> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }

    let expense = crate::core::expense::get_expense(db, user_id, expense_id)
        .await?
        .ok_or(Error::ExpenseNotFound { id: expense_id })?;

    if !schedule::resolve(&expense, period).applicable {
        return Err(Error::NotApplicable {
            id: expense_id,
            period,
        });
    }

    let paid_amount = round2(amount);
    MonthlyStatus::insert(status_row(user_id, expense_id, period, true, Some(paid_amount)))
        .on_conflict(status_conflict())
        .exec_without_returning(db)
        .await?;

    let status = fetch_status(db, user_id, expense_id, period)
        .await?
        .ok_or(Error::ExpenseNotFound { id: expense_id })?;

    let ledger = match WalletEntry::insert(payment_entry(user_id, &expense, period, paid_amount))
        .on_conflict(ledger_conflict())
        .exec_without_returning(db)
        .await
    {
        Ok(_) => LedgerSync::Synced,
        Err(e) => {
            warn!(expense_id, %period, error = %e, "wallet sync failed after mark_paid");
            LedgerSync::Failed {
                message: e.to_string(),
            }
        }
    };

    Ok(SettlementOutcome { status, ledger })
}

/// Marks an expense unpaid for a period and removes the automatic wallet
/// entry. The status row is kept with `paid = false` (absence and false are
/// equivalent for aggregation).
pub async fn mark_unpaid(
    db: &DatabaseConnection,
    user_id: &str,
    expense_id: i64,
    period: Period,
) -> Result<SettlementOutcome> {
    crate::core::expense::get_expense(db, user_id, expense_id)
        .await?
        .ok_or(Error::ExpenseNotFound { id: expense_id })?;

    MonthlyStatus::insert(status_row(user_id, expense_id, period, false, None))
        .on_conflict(status_conflict())
        .exec_without_returning(db)
        .await?;

    let status = fetch_status(db, user_id, expense_id, period)
        .await?
        .ok_or(Error::ExpenseNotFound { id: expense_id })?;

    let ledger = match WalletEntry::delete_many()
        .filter(wallet_entry::Column::UserId.eq(user_id))
        .filter(wallet_entry::Column::Kind.eq(wallet_entry::KIND_EXPENSE_PAYMENT))
        .filter(wallet_entry::Column::RefExpenseId.eq(expense_id))
        .filter(wallet_entry::Column::RefYear.eq(period.year))
        .filter(wallet_entry::Column::RefMonth.eq(period.month as i32))
        .exec(db)
        .await
    {
        Ok(_) => LedgerSync::Removed,
        Err(e) => {
            warn!(expense_id, %period, error = %e, "wallet cleanup failed after mark_unpaid");
            LedgerSync::Failed {
                message: e.to_string(),
            }
        }
    };

    Ok(SettlementOutcome { status, ledger })
}

/// Settles or clears every active applicable expense for a period in one
/// logical batch: a single batched status upsert (aborts on failure),
/// followed by one batched wallet projection (best-effort, reported in the
/// outcome). Mark-all records each expense's full monthly amount.
pub async fn set_all_for_period(
    db: &DatabaseConnection,
    user_id: &str,
    period: Period,
    paid: bool,
) -> Result<BatchOutcome> {
    let expenses = crate::core::expense::list_expenses(db, user_id).await?;
    let targets: Vec<_> = expenses
        .iter()
        .filter(|e| e.active)
        .filter(|e| schedule::resolve(e, period).applicable)
        .collect();

    if targets.is_empty() {
        return Ok(BatchOutcome {
            updated: 0,
            ledger: if paid {
                LedgerSync::Synced
            } else {
                LedgerSync::Removed
            },
        });
    }

    let rows = targets.iter().map(|e| {
        status_row(
            user_id,
            e.id,
            period,
            paid,
            paid.then_some(e.amount),
        )
    });

    MonthlyStatus::insert_many(rows)
        .on_conflict(status_conflict())
        .exec_without_returning(db)
        .await?;

    let ledger = if paid {
        let entries = targets
            .iter()
            .map(|e| payment_entry(user_id, e, period, e.amount));

        match WalletEntry::insert_many(entries)
            .on_conflict(ledger_conflict())
            .exec_without_returning(db)
            .await
        {
            Ok(_) => LedgerSync::Synced,
            Err(e) => {
                warn!(%period, error = %e, "batch wallet sync failed");
                LedgerSync::Failed {
                    message: e.to_string(),
                }
            }
        }
    } else {
        let ids: Vec<i64> = targets.iter().map(|e| e.id).collect();
        match WalletEntry::delete_many()
            .filter(wallet_entry::Column::UserId.eq(user_id))
            .filter(wallet_entry::Column::Kind.eq(wallet_entry::KIND_EXPENSE_PAYMENT))
            .filter(wallet_entry::Column::RefYear.eq(period.year))
            .filter(wallet_entry::Column::RefMonth.eq(period.month as i32))
            .filter(wallet_entry::Column::RefExpenseId.is_in(ids))
            .exec(db)
            .await
        {
            Ok(_) => LedgerSync::Removed,
            Err(e) => {
                warn!(%period, error = %e, "batch wallet cleanup failed");
                LedgerSync::Failed {
                    message: e.to_string(),
                }
            }
        }
    };

    Ok(BatchOutcome {
        updated: targets.len(),
        ledger,
    })
}
