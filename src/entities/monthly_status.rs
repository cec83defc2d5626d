//! Monthly status entity - Records whether an expense was paid for a period.
//!
//! At most one row exists per (`user_id`, `expense_id`, `year`, `month`);
//! the composite unique index backing that invariant is created in
//! [`crate::config::database::create_tables`]. Absence of a row means
//! unpaid. `paid_amount` supports partial payments and may differ from the
//! expense's monthly amount.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Monthly payment status database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "monthly_status")]
pub struct Model {
    /// Unique identifier for the status row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: String,
    /// The expense this status refers to
    pub expense_id: i64,
    /// Target period year
    pub year: i32,
    /// Target period month (1-12)
    pub month: i32,
    /// Whether the expense is settled for this period
    pub paid: bool,
    /// Amount actually paid; None when unpaid or recorded pre-partial-payment
    pub paid_amount: Option<f64>,
    /// When the payment was recorded; None when unpaid
    pub paid_at: Option<DateTimeUtc>,
}

/// Defines relationships between MonthlyStatus and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each status row belongs to one expense
    #[sea_orm(
        belongs_to = "super::expense::Entity",
        from = "Column::ExpenseId",
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
