pub mod dto;
pub mod handlers;
pub mod memory;
pub mod repo;
mod repo_types;
pub mod services;
pub mod store;

pub use dto::{EnergyRow, ItemId, LoggedItem, MealItemDraft, MealSlot};
pub use memory::MemoryMealStore;
pub use repo::PgMealStore;
pub use store::MealStore;
