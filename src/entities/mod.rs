//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod expense;
pub mod monthly_status;
pub mod wallet_entry;

// Re-export specific types to avoid conflicts
pub use expense::{Column as ExpenseColumn, Entity as Expense, Model as ExpenseModel};
pub use monthly_status::{
    Column as MonthlyStatusColumn, Entity as MonthlyStatus, Model as MonthlyStatusModel,
};
pub use wallet_entry::{
    Column as WalletEntryColumn, Entity as WalletEntry, Model as WalletEntryModel,
};
