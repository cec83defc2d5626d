//! Expense business logic - creation, editing, and the auto-archive sweep.
//!
//! All functions are async, user-scoped, and validate input before writing
//! anything. For installment expenses the monthly `amount` is never taken
//! from the caller: it is derived as `round2(total_amount / count)` at write
//! time and persisted, so reads never recompute it.

use crate::{
    core::{period::Period, round2, schedule},
    entities::{Expense, expense},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::warn;

/// How a new or edited expense is priced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExpensePricing {
    /// Flat monthly amount entered directly by the user
    Simple {
        /// The monthly amount
        amount: f64,
    },
    /// Installment purchase; the monthly amount is derived
    Installment {
        /// Total purchase amount
        total_amount: f64,
        /// Number of installments, minimum 2
        count: i32,
        /// First applicable year (2000-2100)
        start_year: i32,
        /// First applicable month (1-12)
        start_month: i32,
    },
}

/// Payload for creating or fully replacing an expense.
#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    /// Display name, must be non-empty
    pub name: String,
    /// Category; empty falls back to "Outros" at aggregation time
    pub category: String,
    /// Day of month the bill is due (1-31)
    pub due_day: i32,
    /// Optional free-text payment method
    pub payment_method: Option<String>,
    /// Whether the expense participates in forward aggregation
    pub active: bool,
    /// Simple or installment pricing
    pub pricing: ExpensePricing,
}

/// Result of loading the expense list together with the best-effort
/// auto-archive sweep.
#[derive(Debug, Clone)]
pub struct LoadedExpenses {
    /// All expenses for the user, newest first, sweep already applied
    pub expenses: Vec<expense::Model>,
    /// Ids deactivated by the sweep during this load
    pub archived_ids: Vec<i64>,
    /// Error message when the sweep failed; the load itself still succeeded
    pub sweep_error: Option<String>,
}

fn validate_common(draft: &ExpenseDraft) -> Result<()> {
    if draft.name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Expense name cannot be empty".to_string(),
        });
    }

    if draft.due_day < 1 || draft.due_day > 31 {
        return Err(Error::InvalidDueDay { day: draft.due_day });
    }

    Ok(())
}

fn validate_installment(
    total_amount: f64,
    count: i32,
    start_year: i32,
    start_month: i32,
) -> Result<()> {
    if !total_amount.is_finite() || total_amount <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: total_amount,
        });
    }

    if count < 2 {
        return Err(Error::Validation {
            message: format!("Installment count must be at least 2, got {count}"),
        });
    }

    if !(1..=12).contains(&start_month) {
        return Err(Error::Validation {
            message: format!("Installment start month must be 1-12, got {start_month}"),
        });
    }

    if !(2000..=2100).contains(&start_year) {
        return Err(Error::Validation {
            message: format!("Installment start year must be 2000-2100, got {start_year}"),
        });
    }

    Ok(())
}

/// Retrieves all expenses for a user, newest first.
pub async fn list_expenses(db: &DatabaseConnection, user_id: &str) -> Result<Vec<expense::Model>> {
    Expense::find()
        .filter(expense::Column::UserId.eq(user_id))
        .order_by_desc(expense::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds one expense by id, scoped to the requesting user.
pub async fn get_expense(
    db: &DatabaseConnection,
    user_id: &str,
    expense_id: i64,
) -> Result<Option<expense::Model>> {
    Expense::find_by_id(expense_id)
        .filter(expense::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new expense after validating the draft.
///
/// Simple expenses require a finite, strictly positive monthly amount.
/// Installment expenses require total > 0, count >= 2, and a start period
/// inside 2000-2100 / 1-12; the monthly amount is derived and persisted.
pub async fn create_expense(
    db: &DatabaseConnection,
    user_id: &str,
    draft: ExpenseDraft,
) -> Result<expense::Model> {
    validate_common(&draft)?;

    let (amount, installment) = match draft.pricing {
        ExpensePricing::Simple { amount } => {
            if !amount.is_finite() || amount <= 0.0 {
                return Err(Error::InvalidAmount { amount });
            }
            (round2(amount), None)
        }
        ExpensePricing::Installment {
            total_amount,
            count,
            start_year,
            start_month,
        } => {
            validate_installment(total_amount, count, start_year, start_month)?;
            (
                round2(total_amount / f64::from(count)),
                Some((round2(total_amount), count, start_year, start_month)),
            )
        }
    };

    let model = expense::ActiveModel {
        user_id: Set(user_id.to_string()),
        name: Set(draft.name.trim().to_string()),
        category: Set(draft.category),
        amount: Set(amount),
        due_day: Set(draft.due_day),
        payment_method: Set(draft.payment_method.filter(|p| !p.trim().is_empty())),
        active: Set(draft.active),
        is_installment: Set(installment.is_some()),
        installment_total_amount: Set(installment.map(|(total, ..)| total)),
        installment_total: Set(installment.map(|(_, count, ..)| count)),
        installment_start_year: Set(installment.map(|(_, _, year, _)| year)),
        installment_start_month: Set(installment.map(|(.., month)| month)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = model.insert(db).await?;
    Ok(result)
}

/// Fully replaces an editable expense from a draft, in the same shape the
/// edit form produces. Switching an installment expense back to simple
/// clears all four installment columns; switching to installment re-derives
/// the monthly amount. Unlike creation, a simple amount of zero is accepted
/// on edit.
pub async fn update_expense(
    db: &DatabaseConnection,
    user_id: &str,
    expense_id: i64,
    draft: ExpenseDraft,
) -> Result<expense::Model> {
    validate_common(&draft)?;

    let existing = get_expense(db, user_id, expense_id)
        .await?
        .ok_or(Error::ExpenseNotFound { id: expense_id })?;

    let mut model: expense::ActiveModel = existing.into();
    model.name = Set(draft.name.trim().to_string());
    model.category = Set(draft.category);
    model.due_day = Set(draft.due_day);
    model.payment_method = Set(draft.payment_method.filter(|p| !p.trim().is_empty()));
    model.active = Set(draft.active);

    match draft.pricing {
        ExpensePricing::Simple { amount } => {
            if !amount.is_finite() || amount < 0.0 {
                return Err(Error::InvalidAmount { amount });
            }
            model.amount = Set(round2(amount));
            model.is_installment = Set(false);
            model.installment_total_amount = Set(None);
            model.installment_total = Set(None);
            model.installment_start_year = Set(None);
            model.installment_start_month = Set(None);
        }
        ExpensePricing::Installment {
            total_amount,
            count,
            start_year,
            start_month,
        } => {
            validate_installment(total_amount, count, start_year, start_month)?;
            model.amount = Set(round2(total_amount / f64::from(count)));
            model.is_installment = Set(true);
            model.installment_total_amount = Set(Some(round2(total_amount)));
            model.installment_total = Set(Some(count));
            model.installment_start_year = Set(Some(start_year));
            model.installment_start_month = Set(Some(start_month));
        }
    }

    let result = model.update(db).await?;
    Ok(result)
}

/// Updates only the monthly amount of an expense. Accepts zero (a bill can
/// be free for a while) but rejects negative or non-finite values.
pub async fn update_amount(
    db: &DatabaseConnection,
    user_id: &str,
    expense_id: i64,
    amount: f64,
) -> Result<expense::Model> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }

    let existing = get_expense(db, user_id, expense_id)
        .await?
        .ok_or(Error::ExpenseNotFound { id: expense_id })?;

    let mut model: expense::ActiveModel = existing.into();
    model.amount = Set(round2(amount));
    let result = model.update(db).await?;
    Ok(result)
}

/// Activates or deactivates an expense without touching anything else.
pub async fn set_active(
    db: &DatabaseConnection,
    user_id: &str,
    expense_id: i64,
    active: bool,
) -> Result<expense::Model> {
    let existing = get_expense(db, user_id, expense_id)
        .await?
        .ok_or(Error::ExpenseNotFound { id: expense_id })?;

    let mut model: expense::ActiveModel = existing.into();
    model.active = Set(active);
    let result = model.update(db).await?;
    Ok(result)
}

/// Permanently deletes an expense. Status and ledger rows referencing it are
/// left in place as history.
pub async fn delete_expense(db: &DatabaseConnection, user_id: &str, expense_id: i64) -> Result<()> {
    let existing = get_expense(db, user_id, expense_id)
        .await?
        .ok_or(Error::ExpenseNotFound { id: expense_id })?;

    existing.delete(db).await?;
    Ok(())
}

/// Deactivates every active installment expense whose window ended strictly
/// before `reference`, as a single batch update. Returns the affected ids.
///
/// Rows are kept (not deleted) so history and past settlements stay
/// consultable.
pub async fn archive_completed_installments(
    db: &DatabaseConnection,
    user_id: &str,
    reference: Period,
) -> Result<Vec<i64>> {
    let candidates = Expense::find()
        .filter(expense::Column::UserId.eq(user_id))
        .filter(expense::Column::Active.eq(true))
        .filter(expense::Column::IsInstallment.eq(true))
        .all(db)
        .await?;

    let completed: Vec<i64> = candidates
        .iter()
        .filter(|e| schedule::is_installment_completed(e, reference))
        .map(|e| e.id)
        .collect();

    if completed.is_empty() {
        return Ok(Vec::new());
    }

    use sea_orm::sea_query::Expr;

    Expense::update_many()
        .col_expr(expense::Column::Active, Expr::value(false))
        .filter(expense::Column::UserId.eq(user_id))
        .filter(expense::Column::Id.is_in(completed.clone()))
        .exec(db)
        .await?;

    Ok(completed)
}

/// Loads the expense list and runs the auto-archive sweep against
/// `reference` (normally the current real-world period).
///
/// The sweep is best-effort: a failure is logged and reported in the
/// outcome, never propagated, and the list load still succeeds. In-memory
/// copies of swept rows are flipped inactive so callers see consistent
/// state without a re-fetch.
pub async fn load_expenses(
    db: &DatabaseConnection,
    user_id: &str,
    reference: Period,
) -> Result<LoadedExpenses> {
    let mut expenses = list_expenses(db, user_id).await?;

    let (archived_ids, sweep_error) =
        match archive_completed_installments(db, user_id, reference).await {
            Ok(ids) => (ids, None),
            Err(e) => {
                warn!(error = %e, "installment auto-archive sweep failed");
                (Vec::new(), Some(e.to_string()))
            }
        };

    for expense in &mut expenses {
        if archived_ids.contains(&expense.id) {
            expense.active = false;
        }
    }

    Ok(LoadedExpenses {
        expenses,
        archived_ids,
        sweep_error,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{installment_draft, setup_test_db, simple_draft};

    #[tokio::test]
    async fn test_create_simple_expense() -> Result<()> {
        let db = setup_test_db().await?;

        let expense = create_expense(&db, "u1", simple_draft("Internet", 99.9)).await?;
        assert_eq!(expense.name, "Internet");
        assert_eq!(expense.amount, 99.9);
        assert!(!expense.is_installment);
        assert_eq!(expense.installment_total, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_expense(&db, "u1", simple_draft("   ", 10.0)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_rejects_bad_due_day() -> Result<()> {
        let db = setup_test_db().await?;

        let mut draft = simple_draft("Internet", 10.0);
        draft.due_day = 0;
        assert!(matches!(
            create_expense(&db, "u1", draft).await,
            Err(Error::InvalidDueDay { day: 0 })
        ));

        let mut draft = simple_draft("Internet", 10.0);
        draft.due_day = 32;
        assert!(matches!(
            create_expense(&db, "u1", draft).await,
            Err(Error::InvalidDueDay { day: 32 })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_rejects_nonpositive_amount() -> Result<()> {
        let db = setup_test_db().await?;

        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = create_expense(&db, "u1", simple_draft("Internet", amount)).await;
            assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_installment_amount_is_derived() -> Result<()> {
        let db = setup_test_db().await?;

        let expense =
            create_expense(&db, "u1", installment_draft("Notebook", 1200.0, 10, 2025, 1)).await?;
        assert!(expense.is_installment);
        assert_eq!(expense.amount, 120.0);
        assert_eq!(expense.installment_total_amount, Some(1200.0));
        assert_eq!(expense.installment_total, Some(10));
        assert_eq!(expense.installment_start_year, Some(2025));
        assert_eq!(expense.installment_start_month, Some(1));

        // Uneven division rounds to cents
        let uneven =
            create_expense(&db, "u1", installment_draft("Sofa", 1000.0, 3, 2025, 1)).await?;
        assert_eq!(uneven.amount, 333.33);

        Ok(())
    }

    #[tokio::test]
    async fn test_installment_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let cases = [
            installment_draft("A", 0.0, 10, 2025, 1),
            installment_draft("B", 1200.0, 1, 2025, 1),
            installment_draft("C", 1200.0, 10, 2025, 0),
            installment_draft("D", 1200.0, 10, 2025, 13),
            installment_draft("E", 1200.0, 10, 1999, 1),
            installment_draft("F", 1200.0, 10, 2101, 1),
        ];

        for draft in cases {
            assert!(create_expense(&db, "u1", draft).await.is_err());
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_update_to_simple_clears_installment_fields() -> Result<()> {
        let db = setup_test_db().await?;

        let expense =
            create_expense(&db, "u1", installment_draft("Notebook", 1200.0, 10, 2025, 1)).await?;

        let updated =
            update_expense(&db, "u1", expense.id, simple_draft("Notebook", 50.0)).await?;
        assert!(!updated.is_installment);
        assert_eq!(updated.amount, 50.0);
        assert_eq!(updated.installment_total_amount, None);
        assert_eq!(updated.installment_total, None);
        assert_eq!(updated.installment_start_year, None);
        assert_eq!(updated.installment_start_month, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_to_installment_rederives_amount() -> Result<()> {
        let db = setup_test_db().await?;

        let expense = create_expense(&db, "u1", simple_draft("TV", 100.0)).await?;
        let updated = update_expense(
            &db,
            "u1",
            expense.id,
            installment_draft("TV", 2400.0, 12, 2025, 6),
        )
        .await?;

        assert!(updated.is_installment);
        assert_eq!(updated.amount, 200.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_amount_accepts_zero_rejects_negative() -> Result<()> {
        let db = setup_test_db().await?;

        let expense = create_expense(&db, "u1", simple_draft("Internet", 99.9)).await?;

        let updated = update_amount(&db, "u1", expense.id, 0.0).await?;
        assert_eq!(updated.amount, 0.0);

        assert!(matches!(
            update_amount(&db, "u1", expense.id, -1.0).await,
            Err(Error::InvalidAmount { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_user_scoping() -> Result<()> {
        let db = setup_test_db().await?;

        let expense = create_expense(&db, "u1", simple_draft("Internet", 99.9)).await?;

        // Another user cannot see, edit, or delete it
        assert!(get_expense(&db, "u2", expense.id).await?.is_none());
        assert!(matches!(
            update_amount(&db, "u2", expense.id, 5.0).await,
            Err(Error::ExpenseNotFound { .. })
        ));
        assert!(matches!(
            delete_expense(&db, "u2", expense.id).await,
            Err(Error::ExpenseNotFound { .. })
        ));
        assert!(list_expenses(&db, "u2").await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_archive_completed_installments() -> Result<()> {
        let db = setup_test_db().await?;

        // Window 2024-01..2024-03, completed by mid-2025
        let done =
            create_expense(&db, "u1", installment_draft("Done", 300.0, 3, 2024, 1)).await?;
        // Window still open at the reference period
        let open =
            create_expense(&db, "u1", installment_draft("Open", 1200.0, 24, 2025, 1)).await?;
        let simple = create_expense(&db, "u1", simple_draft("Internet", 99.9)).await?;

        let archived =
            archive_completed_installments(&db, "u1", Period::new(2025, 6)).await?;
        assert_eq!(archived, vec![done.id]);

        assert!(!get_expense(&db, "u1", done.id).await?.unwrap().active);
        assert!(get_expense(&db, "u1", open.id).await?.unwrap().active);
        assert!(get_expense(&db, "u1", simple.id).await?.unwrap().active);

        // A second sweep finds nothing new
        let again = archive_completed_installments(&db, "u1", Period::new(2025, 6)).await?;
        assert!(again.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_load_expenses_applies_sweep_in_memory() -> Result<()> {
        let db = setup_test_db().await?;

        let done =
            create_expense(&db, "u1", installment_draft("Done", 300.0, 3, 2024, 1)).await?;
        create_expense(&db, "u1", simple_draft("Internet", 99.9)).await?;

        let loaded = load_expenses(&db, "u1", Period::new(2025, 6)).await?;
        assert_eq!(loaded.archived_ids, vec![done.id]);
        assert!(loaded.sweep_error.is_none());
        assert_eq!(loaded.expenses.len(), 2);

        let swept = loaded.expenses.iter().find(|e| e.id == done.id).unwrap();
        assert!(!swept.active);

        Ok(())
    }
}
