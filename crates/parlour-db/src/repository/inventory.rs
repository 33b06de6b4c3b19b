//! # Inventory Repository
//!
//! Parts and stock levels.
//!
//! ## Stock Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Part line added to a job      → stock − ceil(quantity)                 │
//! │  Part line removed from a job  → stock + ceil(quantity)                 │
//! │  Job deleted                   → every part line restored               │
//! │  Manual adjustment             → stock + delta (never below zero)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The decrement is a single conditional UPDATE, so two jobs taking the
//! last unit cannot both succeed.

use chrono::Utc;
use parlour_core::{CoreError, InventoryItem, InventoryItemInput};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, clean, like_pattern, new_id};

const ITEM_COLUMNS: &str = r#"
    id, part_number, name, description, unit_price_pence, cost_price_pence,
    quantity_in_stock, reorder_level, location, created_at, updated_at
"#;

pub(crate) async fn find<'e, E>(executor: E, id: &str) -> DbResult<Option<InventoryItem>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {} FROM inventory_items WHERE id = ?1", ITEM_COLUMNS);
    let item = sqlx::query_as::<_, InventoryItem>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(item)
}

pub(crate) async fn require<'e, E>(executor: E, id: &str) -> DbResult<InventoryItem>
where
    E: SqliteExecutor<'e>,
{
    find(executor, id)
        .await?
        .ok_or_else(|| DbError::not_found("Inventory item", id))
}

/// Takes `units` out of stock, failing with `InsufficientStock` when there
/// are not enough.
pub(crate) async fn take_stock(conn: &mut SqliteConnection, id: &str, units: i64) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE inventory_items
        SET quantity_in_stock = quantity_in_stock - ?2, updated_at = ?3
        WHERE id = ?1 AND quantity_in_stock >= ?2
        "#,
    )
    .bind(id)
    .bind(units)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let item = require(&mut *conn, id).await?;
        return Err(CoreError::InsufficientStock {
            part_number: item.part_number,
            available: item.quantity_in_stock,
            requested: units,
        }
        .into());
    }

    debug!(id = %id, units, "Stock taken");
    Ok(())
}

/// Puts `units` back into stock. A part deleted since the line was added
/// is skipped.
pub(crate) async fn restore_stock(conn: &mut SqliteConnection, id: &str, units: i64) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE inventory_items
        SET quantity_in_stock = quantity_in_stock + ?2, updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(units)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    debug!(id = %id, units, "Stock restored");
    Ok(())
}

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Lists parts by part number, optionally filtered by part number,
    /// name or description.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<InventoryItem>> {
        let term = search.map(str::trim).filter(|s| !s.is_empty());

        let items = match term {
            Some(term) => {
                let sql = format!(
                    r#"
                    SELECT {} FROM inventory_items
                    WHERE part_number LIKE ?1 ESCAPE '\'
                       OR name LIKE ?1 ESCAPE '\'
                       OR description LIKE ?1 ESCAPE '\'
                    ORDER BY part_number
                    "#,
                    ITEM_COLUMNS
                );
                sqlx::query_as::<_, InventoryItem>(&sql)
                    .bind(like_pattern(term))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {} FROM inventory_items ORDER BY part_number", ITEM_COLUMNS);
                sqlx::query_as::<_, InventoryItem>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(items)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        find(&self.pool, id).await
    }

    pub async fn get_by_part_number(&self, part_number: &str) -> DbResult<Option<InventoryItem>> {
        let sql = format!(
            "SELECT {} FROM inventory_items WHERE part_number = ?1",
            ITEM_COLUMNS
        );
        let item = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(part_number.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn create(&self, input: &InventoryItemInput) -> DbResult<InventoryItem> {
        input.validate()?;

        let id = new_id();
        let part_number = input.part_number.trim();

        debug!(id = %id, part_number = %part_number, "Creating inventory item");

        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, part_number, name, description, unit_price_pence,
                cost_price_pence, quantity_in_stock, reorder_level, location,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            "#,
        )
        .bind(&id)
        .bind(part_number)
        .bind(input.name.trim())
        .bind(clean(&input.description))
        .bind(input.unit_price_pence)
        .bind(input.cost_price_pence)
        .bind(input.quantity_in_stock)
        .bind(input.reorder_level)
        .bind(clean(&input.location))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: part_number.to_string(),
            },
            other => other,
        })?;

        require(&self.pool, &id).await
    }

    pub async fn update(&self, id: &str, input: &InventoryItemInput) -> DbResult<InventoryItem> {
        input.validate()?;

        let part_number = input.part_number.trim();
        let result = sqlx::query(
            r#"
            UPDATE inventory_items SET
                part_number = ?2,
                name = ?3,
                description = ?4,
                unit_price_pence = ?5,
                cost_price_pence = ?6,
                quantity_in_stock = ?7,
                reorder_level = ?8,
                location = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(part_number)
        .bind(input.name.trim())
        .bind(clean(&input.description))
        .bind(input.unit_price_pence)
        .bind(input.cost_price_pence)
        .bind(input.quantity_in_stock)
        .bind(input.reorder_level)
        .bind(clean(&input.location))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: part_number.to_string(),
            },
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory item", id));
        }

        require(&self.pool, id).await
    }

    /// Deletes a part. Job lines that used it keep their description and
    /// price; their link to the part is cleared.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory item", id));
        }

        info!(id = %id, "Inventory item deleted");
        Ok(())
    }

    /// Adjusts stock by `delta` (positive for a delivery, negative for a
    /// write-off). The level never goes below zero.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<InventoryItem> {
        let mut tx = begin_write(&self.pool).await?;

        if delta < 0 {
            take_stock(&mut tx, id, -delta).await?;
        } else {
            require(&mut *tx, id).await?;
            restore_stock(&mut tx, id, delta).await?;
        }

        let item = require(&mut *tx, id).await?;
        tx.commit().await?;

        info!(id = %id, delta, stock = item.quantity_in_stock, "Stock adjusted");
        Ok(item)
    }

    /// Parts at or below their reorder level, lowest stock first.
    pub async fn low_stock(&self) -> DbResult<Vec<InventoryItem>> {
        let sql = format!(
            r#"
            SELECT {} FROM inventory_items
            WHERE quantity_in_stock <= reorder_level
            ORDER BY quantity_in_stock, part_number
            "#,
            ITEM_COLUMNS
        );
        let items = sqlx::query_as::<_, InventoryItem>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = test_support::db().await;
        let part = test_support::part(&db, "CL-100", 10, 1250).await;

        let by_number = db
            .inventory()
            .get_by_part_number("CL-100")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_number.id, part.id);

        let hits = db.inventory().list(Some("cl-1")).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_part_number() {
        let db = test_support::db().await;
        test_support::part(&db, "CL-100", 10, 1250).await;

        let err = db
            .inventory()
            .create(&InventoryItemInput {
                part_number: "CL-100".to_string(),
                name: "Claw".to_string(),
                unit_price_pence: 100,
                ..Default::default()
            })
            .await
            .unwrap_err();

        match err {
            DbError::UniqueViolation { value, .. } => assert_eq!(value, "CL-100"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let db = test_support::db().await;
        let part = test_support::part(&db, "VP-200", 3, 800).await;

        let item = db.inventory().adjust_stock(&part.id, 5).await.unwrap();
        assert_eq!(item.quantity_in_stock, 8);

        let item = db.inventory().adjust_stock(&part.id, -8).await.unwrap();
        assert_eq!(item.quantity_in_stock, 0);

        let err = db.inventory().adjust_stock(&part.id, -1).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock { available: 0, requested: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_low_stock() {
        let db = test_support::db().await;
        test_support::part(&db, "A-1", 1, 100).await;
        test_support::part(&db, "B-2", 2, 100).await;
        test_support::part(&db, "C-3", 50, 100).await;

        let low = db.inventory().low_stock().await.unwrap();
        let numbers: Vec<&str> = low.iter().map(|p| p.part_number.as_str()).collect();
        assert_eq!(numbers, vec!["A-1", "B-2"]);
    }
}
