//! Shared test utilities.
//!
//! Helpers for setting up in-memory test databases and building expense
//! rows and drafts with sensible defaults.

use crate::{
    core::{expense::ExpenseDraft, expense::ExpensePricing, period::Period},
    entities::{expense, monthly_status},
    errors::Result,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables and indexes in
/// place. The standard setup for every integration test.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a simple (non-installment) expense row without touching a
/// database. Defaults: user `test_user`, category `Contas`, due day 5,
/// active.
#[must_use]
pub fn expense_model(id: i64, name: &str, amount: f64) -> expense::Model {
    expense::Model {
        id,
        user_id: "test_user".to_string(),
        name: name.to_string(),
        category: "Contas".to_string(),
        amount,
        due_day: 5,
        payment_method: None,
        active: true,
        is_installment: false,
        installment_total_amount: None,
        installment_total: None,
        installment_start_year: None,
        installment_start_month: None,
        created_at: Utc::now(),
    }
}

/// Builds a monthly-status row for the given expense and period.
#[must_use]
pub fn status_model(
    expense_id: i64,
    period: Period,
    paid: bool,
    paid_amount: Option<f64>,
) -> monthly_status::Model {
    monthly_status::Model {
        id: expense_id,
        user_id: "test_user".to_string(),
        expense_id,
        year: period.year,
        month: period.month as i32,
        paid,
        paid_amount,
        paid_at: paid.then(Utc::now),
    }
}

/// A draft for a simple expense with the same defaults as
/// [`expense_model`].
#[must_use]
pub fn simple_draft(name: &str, amount: f64) -> ExpenseDraft {
    ExpenseDraft {
        name: name.to_string(),
        category: "Contas".to_string(),
        due_day: 5,
        payment_method: None,
        active: true,
        pricing: ExpensePricing::Simple { amount },
    }
}

/// A draft for an installment expense starting at the given period.
#[must_use]
pub fn installment_draft(
    name: &str,
    total_amount: f64,
    count: i32,
    start_year: i32,
    start_month: i32,
) -> ExpenseDraft {
    ExpenseDraft {
        name: name.to_string(),
        category: "Contas".to_string(),
        due_day: 5,
        payment_method: Some("Cartão".to_string()),
        active: true,
        pricing: ExpensePricing::Installment {
            total_amount,
            count,
            start_year,
            start_month,
        },
    }
}
