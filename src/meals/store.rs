use async_trait::async_trait;
use time::Date;
use uuid::Uuid;

use crate::error::AppError;
use crate::meals::dto::{EnergyRow, LoggedItem, MealItemDraft};

/// Durable record of logged meal items.
#[async_trait]
pub trait MealStore: Send + Sync {
    /// Persists a draft; the returned item carries the store-assigned id and creation time.
    async fn insert(&self, draft: &MealItemDraft) -> Result<LoggedItem, AppError>;

    /// Items logged for `date`, oldest first.
    async fn list(&self, date: Date) -> Result<Vec<LoggedItem>, AppError>;

    async fn update_quantity(&self, id: Uuid, quantity: f64) -> Result<LoggedItem, AppError>;

    /// Fails with `NotFound` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    /// Unordered kcal rows for `[from, to]`; days without items are simply absent.
    async fn list_range(&self, from: Date, to: Date) -> Result<Vec<EnergyRow>, AppError>;
}
