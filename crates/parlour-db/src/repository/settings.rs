//! # Settings Repository
//!
//! The single company settings row (id = 1). The initial migration inserts
//! it with defaults, so reads never come back empty.

use chrono::Utc;
use parlour_core::{Settings, SettingsInput};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::clean;

const SETTINGS_COLUMNS: &str = r#"
    company_name, address, phone, email, vat_number, vat_rate_bps,
    default_labour_rate_pence, payment_terms_days, bank_name, sort_code,
    account_number, invoice_prefix, quote_prefix, statement_prefix,
    reminder_webhook_url, updated_at
"#;

/// Loads settings on any executor (pool or open transaction).
pub(crate) async fn load<'e, E>(executor: E) -> DbResult<Settings>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {} FROM settings WHERE id = 1", SETTINGS_COLUMNS);
    sqlx::query_as::<_, Settings>(&sql)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DbError::not_found("Settings", "1"))
}

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    pub async fn get(&self) -> DbResult<Settings> {
        load(&self.pool).await
    }

    /// Replaces all settings.
    ///
    /// Changing a prefix affects numbers allocated from now on; existing
    /// documents keep theirs.
    pub async fn update(&self, input: &SettingsInput) -> DbResult<Settings> {
        input.validate()?;

        debug!(company = %input.company_name, "Updating settings");

        sqlx::query(
            r#"
            UPDATE settings SET
                company_name = ?1,
                address = ?2,
                phone = ?3,
                email = ?4,
                vat_number = ?5,
                vat_rate_bps = ?6,
                default_labour_rate_pence = ?7,
                payment_terms_days = ?8,
                bank_name = ?9,
                sort_code = ?10,
                account_number = ?11,
                invoice_prefix = ?12,
                quote_prefix = ?13,
                statement_prefix = ?14,
                reminder_webhook_url = ?15,
                updated_at = ?16
            WHERE id = 1
            "#,
        )
        .bind(input.company_name.trim())
        .bind(clean(&input.address))
        .bind(clean(&input.phone))
        .bind(clean(&input.email))
        .bind(clean(&input.vat_number))
        .bind(input.vat_rate_bps)
        .bind(input.default_labour_rate_pence)
        .bind(input.payment_terms_days)
        .bind(clean(&input.bank_name))
        .bind(clean(&input.sort_code))
        .bind(clean(&input.account_number))
        .bind(input.invoice_prefix.trim())
        .bind(input.quote_prefix.trim())
        .bind(input.statement_prefix.trim())
        .bind(clean(&input.reminder_webhook_url))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!("Settings updated");
        self.get().await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::repository::test_support;
    use parlour_core::SettingsInput;

    #[tokio::test]
    async fn test_defaults_row_exists() {
        let db = test_support::db().await;
        let settings = db.settings().get().await.unwrap();

        assert_eq!(settings.vat_rate_bps, 2000);
        assert_eq!(settings.payment_terms_days, 30);
        assert_eq!(settings.invoice_prefix, "INV");
        assert_eq!(settings.quote_prefix, "QUO");
        assert_eq!(settings.statement_prefix, "STM");
        assert!(settings.reminder_webhook_url.is_none());
    }

    #[tokio::test]
    async fn test_update_round_trip() {
        let db = test_support::db().await;
        let mut input = SettingsInput::from(db.settings().get().await.unwrap());
        input.company_name = "Valley Dairy Services".to_string();
        input.vat_rate_bps = 500;
        input.bank_name = Some("  ".to_string());
        input.reminder_webhook_url = Some("https://hooks.example.com/remind".to_string());

        let saved = db.settings().update(&input).await.unwrap();
        assert_eq!(saved.company_name, "Valley Dairy Services");
        assert_eq!(saved.vat_rate_bps, 500);
        assert!(saved.bank_name.is_none());
        assert_eq!(
            saved.reminder_webhook_url.as_deref(),
            Some("https://hooks.example.com/remind")
        );
    }

    #[tokio::test]
    async fn test_update_rejects_invalid() {
        let db = test_support::db().await;
        let mut input = SettingsInput::from(db.settings().get().await.unwrap());
        input.vat_rate_bps = 20_000;

        assert!(db.settings().update(&input).await.is_err());
    }
}
