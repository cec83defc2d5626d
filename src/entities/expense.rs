//! Expense entity - Represents a recurring ("fixed") expense.
//!
//! An expense is either simple (a flat monthly amount) or installment-based,
//! in which case the four `installment_*` columns are set and `amount` holds
//! the derived per-month value. Inactive expenses are kept for history but
//! excluded from all forward-looking aggregation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category applied when an expense has none recorded.
pub const DEFAULT_CATEGORY: &str = "Outros";

/// Expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Unique identifier for the expense
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user; every query is scoped to this value
    pub user_id: String,
    /// Human-readable name of the expense (e.g., "Internet")
    pub name: String,
    /// Category for grouping (e.g., "Contas", "Moradia")
    pub category: String,
    /// Monthly amount; derived from total/count for installment expenses
    pub amount: f64,
    /// Day of month the bill is due. Stored as given, clamped to 1-31 on use
    pub due_day: i32,
    /// Optional free-text payment method (e.g., "PIX")
    pub payment_method: Option<String>,
    /// Whether the expense counts toward forward-looking aggregation
    pub active: bool,
    /// Whether this expense is installment-based
    pub is_installment: bool,
    /// Total purchase amount, set only when `is_installment`
    pub installment_total_amount: Option<f64>,
    /// Number of installments (>= 2), set only when `is_installment`
    pub installment_total: Option<i32>,
    /// First applicable year, set only when `is_installment`
    pub installment_start_year: Option<i32>,
    /// First applicable month (1-12), set only when `is_installment`
    pub installment_start_month: Option<i32>,
    /// When the expense was created; lists order newest first
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Expense and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One expense has many monthly status rows
    #[sea_orm(has_many = "super::monthly_status::Entity")]
    MonthlyStatus,
}

impl Related<super::monthly_status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MonthlyStatus.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
