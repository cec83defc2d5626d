//! Wallet ledger entity - One signed money movement in the cash wallet.
//!
//! Manual entries (`"income"`, `"manual_expense"`) are created directly by
//! the user and carry NULL refs. Automatic entries (`"expense_payment"`) are
//! a projection of settlement: at most one exists per
//! (`user_id`, `kind`, `ref_expense_id`, `ref_year`, `ref_month`), enforced
//! by a composite unique index. Sqlite treats NULLs as distinct, so the
//! index leaves manual entries unconstrained.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind tag for a manually recorded deposit.
pub const KIND_INCOME: &str = "income";
/// Kind tag for a manually recorded withdrawal.
pub const KIND_MANUAL_EXPENSE: &str = "manual_expense";
/// Kind tag for the automatic entry created when an expense is marked paid.
pub const KIND_EXPENSE_PAYMENT: &str = "expense_payment";

/// Wallet ledger database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wallet_ledger")]
pub struct Model {
    /// Unique identifier for the ledger entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: String,
    /// Entry kind: `"income"`, `"manual_expense"`, or `"expense_payment"`
    pub kind: String,
    /// Signed amount (negative for money leaving the wallet)
    pub amount: f64,
    /// Optional free-text description; expense name for automatic entries
    pub description: Option<String>,
    /// Originating expense, set only for automatic entries
    pub ref_expense_id: Option<i64>,
    /// Originating period year, set only for automatic entries
    pub ref_year: Option<i32>,
    /// Originating period month, set only for automatic entries
    pub ref_month: Option<i32>,
    /// When the movement happened
    pub created_at: DateTimeUtc,
}

/// Defines relationships between WalletEntry and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// An automatic entry points back at the expense it settles
    #[sea_orm(
        belongs_to = "super::expense::Entity",
        from = "Column::RefExpenseId",
        to = "super::expense::Column::Id"
    )]
    Expense,
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
