//! Manual wallet entries and the running balance.
//!
//! The wallet ledger mixes two families of rows: manual entries created
//! here (`income` for positive amounts, `manual_expense` for negative ones)
//! and automatic `expense_payment` entries projected by settlement. The
//! balance is the signed sum over the user's entire ledger, all kinds, all
//! time - it is not windowed by period.

use crate::{
    core::round2,
    entities::{WalletEntry, wallet_entry},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

/// Records a manual wallet entry. The kind is derived from the sign: a
/// positive amount is `income`, a negative one `manual_expense`. Zero and
/// non-finite amounts are rejected. `at` overrides the entry timestamp;
/// None means now.
pub async fn add_manual_entry(
    db: &DatabaseConnection,
    user_id: &str,
    amount: f64,
    description: Option<&str>,
    at: Option<DateTime<Utc>>,
) -> Result<wallet_entry::Model> {
    if !amount.is_finite() || amount == 0.0 {
        return Err(Error::InvalidAmount { amount });
    }

    let kind = if amount > 0.0 {
        wallet_entry::KIND_INCOME
    } else {
        wallet_entry::KIND_MANUAL_EXPENSE
    };

    let entry = wallet_entry::ActiveModel {
        user_id: Set(user_id.to_string()),
        kind: Set(kind.to_string()),
        amount: Set(round2(amount)),
        description: Set(description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(ToString::to_string)),
        ref_expense_id: Set(None),
        ref_year: Set(None),
        ref_month: Set(None),
        created_at: Set(at.unwrap_or_else(Utc::now)),
        ..Default::default()
    };

    let result = entry.insert(db).await?;
    Ok(result)
}

/// Deletes a wallet entry by id. Works on manual and automatic entries
/// alike; removing an `expense_payment` row does not flip the matching
/// monthly status back to unpaid.
pub async fn remove_entry(db: &DatabaseConnection, user_id: &str, entry_id: i64) -> Result<()> {
    let deleted = WalletEntry::delete_many()
        .filter(wallet_entry::Column::UserId.eq(user_id))
        .filter(wallet_entry::Column::Id.eq(entry_id))
        .exec(db)
        .await?;

    if deleted.rows_affected == 0 {
        return Err(Error::WalletEntryNotFound { id: entry_id });
    }
    Ok(())
}

/// The most recent ledger entries, newest first.
pub async fn recent_entries(
    db: &DatabaseConnection,
    user_id: &str,
    limit: u64,
) -> Result<Vec<wallet_entry::Model>> {
    WalletEntry::find()
        .filter(wallet_entry::Column::UserId.eq(user_id))
        .order_by_desc(wallet_entry::Column::CreatedAt)
        .order_by_desc(wallet_entry::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The signed sum over the user's whole ledger, every kind, since the
/// beginning of time.
pub async fn balance(db: &DatabaseConnection, user_id: &str) -> Result<f64> {
    let entries = WalletEntry::find()
        .filter(wallet_entry::Column::UserId.eq(user_id))
        .all(db)
        .await?;

    Ok(round2(entries.iter().map(|e| e.amount).sum()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::expense::create_expense;
    use crate::core::period::Period;
    use crate::core::settlement::mark_paid;
    use crate::test_utils::{setup_test_db, simple_draft};

    #[tokio::test]
    async fn test_manual_entry_kind_follows_sign() -> Result<()> {
        let db = setup_test_db().await?;

        let income = add_manual_entry(&db, "u1", 2500.0, Some("Salário"), None).await?;
        assert_eq!(income.kind, wallet_entry::KIND_INCOME);
        assert_eq!(income.amount, 2500.0);
        assert_eq!(income.description.as_deref(), Some("Salário"));

        let spend = add_manual_entry(&db, "u1", -42.5, Some("Mercado"), None).await?;
        assert_eq!(spend.kind, wallet_entry::KIND_MANUAL_EXPENSE);
        assert_eq!(spend.amount, -42.5);

        Ok(())
    }

    #[tokio::test]
    async fn test_manual_entry_rejects_zero_and_nonfinite() -> Result<()> {
        let db = setup_test_db().await?;

        for amount in [0.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                add_manual_entry(&db, "u1", amount, None, None).await,
                Err(Error::InvalidAmount { .. })
            ));
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_manual_entry_blank_description_stored_as_none() -> Result<()> {
        let db = setup_test_db().await?;

        let entry = add_manual_entry(&db, "u1", 10.0, Some("   "), None).await?;
        assert_eq!(entry.description, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_balance_sums_all_kinds() -> Result<()> {
        let db = setup_test_db().await?;
        let expense = create_expense(&db, "u1", simple_draft("Internet", 99.9)).await?;

        add_manual_entry(&db, "u1", 2500.0, Some("Salário"), None).await?;
        add_manual_entry(&db, "u1", -42.5, Some("Mercado"), None).await?;
        mark_paid(&db, "u1", expense.id, Period::new(2025, 3), 99.9).await?;

        assert_eq!(balance(&db, "u1").await?, 2357.6);

        Ok(())
    }

    #[tokio::test]
    async fn test_balance_spans_periods() -> Result<()> {
        let db = setup_test_db().await?;
        let expense = create_expense(&db, "u1", simple_draft("Internet", 100.0)).await?;

        mark_paid(&db, "u1", expense.id, Period::new(2025, 1), 100.0).await?;
        mark_paid(&db, "u1", expense.id, Period::new(2025, 2), 100.0).await?;
        mark_paid(&db, "u1", expense.id, Period::new(2025, 3), 100.0).await?;

        assert_eq!(balance(&db, "u1").await?, -300.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_balance_is_zero() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(balance(&db, "u1").await?, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_entry() -> Result<()> {
        let db = setup_test_db().await?;

        let entry = add_manual_entry(&db, "u1", 100.0, None, None).await?;
        remove_entry(&db, "u1", entry.id).await?;
        assert_eq!(balance(&db, "u1").await?, 0.0);

        assert!(matches!(
            remove_entry(&db, "u1", entry.id).await,
            Err(Error::WalletEntryNotFound { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_remove_entry_scoped_to_user() -> Result<()> {
        let db = setup_test_db().await?;

        let entry = add_manual_entry(&db, "u1", 100.0, None, None).await?;
        assert!(matches!(
            remove_entry(&db, "u2", entry.id).await,
            Err(Error::WalletEntryNotFound { .. })
        ));
        assert_eq!(balance(&db, "u1").await?, 100.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_recent_entries_ordered_and_limited() -> Result<()> {
        use chrono::TimeZone;
        let db = setup_test_db().await?;

        for (i, amount) in [10.0, 20.0, 30.0, 40.0].into_iter().enumerate() {
            let at = Utc
                .with_ymd_and_hms(2025, 3, 1 + u32::try_from(i).unwrap(), 12, 0, 0)
                .unwrap();
            add_manual_entry(&db, "u1", amount, None, Some(at)).await?;
        }

        let recent = recent_entries(&db, "u1", 3).await?;
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].amount, 40.0);
        assert_eq!(recent[2].amount, 20.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_balance_scoped_to_user() -> Result<()> {
        let db = setup_test_db().await?;

        add_manual_entry(&db, "u1", 100.0, None, None).await?;
        add_manual_entry(&db, "u2", 999.0, None, None).await?;

        assert_eq!(balance(&db, "u1").await?, 100.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_manual_entries_round_to_cents() -> Result<()> {
        let db = setup_test_db().await?;

        let entry = add_manual_entry(&db, "u1", 10.005, None, None).await?;
        assert_eq!(entry.amount, 10.01);

        Ok(())
    }
}
