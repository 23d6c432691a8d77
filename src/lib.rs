pub mod app;
pub mod config;
pub mod dates;
pub mod error;
pub mod meals;
pub mod nutrition;
pub mod products;
pub mod reconcile;
pub mod state;

pub use app::{build_app, serve};
pub use error::AppError;
pub use state::AppState;
