use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AppError;
use crate::meals::dto::{EnergyRow, ItemId, LoggedItem, MealItemDraft};
use crate::meals::store::MealStore;

/// Process-local meal store. Backs `AppState::fake()` and the reconciler tests.
#[derive(Default)]
pub struct MemoryMealStore {
    items: Mutex<Vec<LoggedItem>>,
    unavailable: AtomicBool,
}

impl MemoryMealStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every call fails with `UpstreamUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self, code: &'static str) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::upstream(code, "store offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl MealStore for MemoryMealStore {
    async fn insert(&self, draft: &MealItemDraft) -> Result<LoggedItem, AppError> {
        self.check("db_insert_failed")?;
        let item = draft
            .clone()
            .into_item(ItemId::Stored(Uuid::new_v4()), Some(OffsetDateTime::now_utc()));
        self.items.lock().await.push(item.clone());
        Ok(item)
    }

    async fn list(&self, date: Date) -> Result<Vec<LoggedItem>, AppError> {
        self.check("db_query_failed")?;
        let items = self.items.lock().await;
        Ok(items.iter().filter(|i| i.date == date).cloned().collect())
    }

    async fn update_quantity(&self, id: Uuid, quantity: f64) -> Result<LoggedItem, AppError> {
        self.check("db_update_failed")?;
        let mut items = self.items.lock().await;
        let item = items
            .iter_mut()
            .find(|i| i.id == ItemId::Stored(id))
            .ok_or(AppError::NotFound)?;
        item.quantity = quantity;
        Ok(item.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.check("db_delete_failed")?;
        let mut items = self.items.lock().await;
        let before = items.len();
        items.retain(|i| i.id != ItemId::Stored(id));
        if items.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn list_range(&self, from: Date, to: Date) -> Result<Vec<EnergyRow>, AppError> {
        self.check("db_query_failed")?;
        let items = self.items.lock().await;
        Ok(items
            .iter()
            .filter(|i| i.date >= from && i.date <= to)
            .map(|i| EnergyRow {
                date: i.date,
                energy_kcal: i.energy_kcal_per_100,
                quantity: i.quantity,
                quantity_unit: i.quantity_unit.clone(),
            })
            .collect())
    }
}
