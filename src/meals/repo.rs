use async_trait::async_trait;
use sqlx::PgPool;
use time::Date;
use tracing::error;
use uuid::Uuid;

use crate::error::AppError;
use crate::meals::dto::{EnergyRow, LoggedItem, MealItemDraft};
use crate::meals::repo_types::{EnergyRowRecord, MealItemRow};
use crate::meals::store::MealStore;

/// Postgres-backed meal store (`meal_items` table).
#[derive(Clone)]
pub struct PgMealStore {
    db: PgPool,
}

impl PgMealStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn db_failure(code: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        error!(error = %e, code, "meal store query failed");
        AppError::upstream(code, e)
    }
}

#[async_trait]
impl MealStore for PgMealStore {
    async fn insert(&self, draft: &MealItemDraft) -> Result<LoggedItem, AppError> {
        let row = sqlx::query_as::<_, MealItemRow>(
            r#"
            INSERT INTO meal_items (date, meal_type, product_name, product_brands,
                                    product_energy_kcal, product_proteins_100g, product_fat_100g,
                                    product_carbs_100g, product_quantity, product_quantity_unit)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, created_at, date, meal_type, product_name, product_brands,
                      product_energy_kcal, product_proteins_100g, product_fat_100g,
                      product_carbs_100g, product_quantity, product_quantity_unit
            "#,
        )
        .bind(draft.date)
        .bind(draft.meal_slot.as_str())
        .bind(&draft.product_name)
        .bind(draft.product_brand.as_deref())
        .bind(draft.energy_kcal_per_100)
        .bind(draft.proteins_per_100)
        .bind(draft.fat_per_100)
        .bind(draft.carbs_per_100)
        .bind(draft.quantity)
        .bind(&draft.quantity_unit)
        .fetch_one(&self.db)
        .await
        .map_err(db_failure("db_insert_failed"))?;

        row.try_into()
    }

    async fn list(&self, date: Date) -> Result<Vec<LoggedItem>, AppError> {
        let rows = sqlx::query_as::<_, MealItemRow>(
            r#"
            SELECT id, created_at, date, meal_type, product_name, product_brands,
                   product_energy_kcal, product_proteins_100g, product_fat_100g,
                   product_carbs_100g, product_quantity, product_quantity_unit
              FROM meal_items
             WHERE date = $1
             ORDER BY created_at ASC
            "#,
        )
        .bind(date)
        .fetch_all(&self.db)
        .await
        .map_err(db_failure("db_query_failed"))?;

        rows.into_iter().map(LoggedItem::try_from).collect()
    }

    async fn update_quantity(&self, id: Uuid, quantity: f64) -> Result<LoggedItem, AppError> {
        let row = sqlx::query_as::<_, MealItemRow>(
            r#"
            UPDATE meal_items
               SET product_quantity = $2
             WHERE id = $1
            RETURNING id, created_at, date, meal_type, product_name, product_brands,
                      product_energy_kcal, product_proteins_100g, product_fat_100g,
                      product_carbs_100g, product_quantity, product_quantity_unit
            "#,
        )
        .bind(id)
        .bind(quantity)
        .fetch_optional(&self.db)
        .await
        .map_err(db_failure("db_update_failed"))?;

        row.ok_or(AppError::NotFound)?.try_into()
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(r#"DELETE FROM meal_items WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(db_failure("db_delete_failed"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn list_range(&self, from: Date, to: Date) -> Result<Vec<EnergyRow>, AppError> {
        let rows = sqlx::query_as::<_, EnergyRowRecord>(
            r#"
            SELECT date, product_energy_kcal, product_quantity, product_quantity_unit
              FROM meal_items
             WHERE date >= $1 AND date <= $2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await
        .map_err(db_failure("db_query_failed"))?;

        Ok(rows.into_iter().map(EnergyRow::from).collect())
    }
}
