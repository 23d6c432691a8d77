pub mod client;
pub mod dto;
pub mod handlers;

pub use client::{OpenFoodFacts, ProductLookup};
pub use dto::{Nutriments, Product, SearchPage};
