//! Database configuration module for `BillBuddy`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. The two composite unique indexes backing the at-most-one-row
//! invariants (monthly status per period, automatic ledger entry per
//! settlement) cannot be expressed through the entity derive and are created
//! with raw statements afterwards.

use crate::entities::{Expense, MonthlyStatus, WalletEntry};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from the `DATABASE_URL` environment variable or
/// returns the default local `SQLite` path.
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/bill_buddy.sqlite".to_string())
}

/// Establishes a connection to the database using [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url()).await.map_err(Into::into)
}

/// Creates all tables and the composite unique indexes.
///
/// Upserts in the settlement path rely on these indexes for their
/// `ON CONFLICT` targets, so this must run before any write.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let expense_table = schema.create_table_from_entity(Expense);
    let status_table = schema.create_table_from_entity(MonthlyStatus);
    let wallet_table = schema.create_table_from_entity(WalletEntry);

    db.execute(builder.build(&expense_table)).await?;
    db.execute(builder.build(&status_table)).await?;
    db.execute(builder.build(&wallet_table)).await?;

    // One status row per (user, expense, period)
    db.execute_unprepared(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_monthly_status_tuple \
         ON monthly_status (user_id, expense_id, year, month)",
    )
    .await?;

    // One automatic ledger entry per settled (user, expense, period).
    // NULL refs on manual entries compare distinct, leaving them unconstrained.
    db.execute_unprepared(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_wallet_ledger_auto_tuple \
         ON wallet_ledger (user_id, kind, ref_expense_id, ref_year, ref_month)",
    )
    .await?;

    Ok(())
}
