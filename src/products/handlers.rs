use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::{error, instrument, warn};

use crate::{
    error::AppError,
    products::dto::{Product, SearchPage, SearchQuery},
    state::AppState,
};

const DEFAULT_PAGE_SIZE: u32 = 10;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_products))
        .route("/products/:code", get(product_by_code))
}

fn invalid_query(message: impl Into<String>) -> AppError {
    let message = message.into();
    warn!(%message, "rejected search query");
    AppError::validation("invalid_query_parameters", message)
}

/// Validated search parameters: trimmed query of 2..=100 chars, page and size in 1..=100.
pub fn validate_search(q: SearchQuery) -> Result<(String, u32, u32), AppError> {
    let query = q.q.trim().to_string();
    let len = query.chars().count();
    if !(2..=100).contains(&len) {
        return Err(invalid_query("q must be between 2 and 100 characters"));
    }
    let page = q.page.unwrap_or(1);
    let page_size = q.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=100).contains(&page) || !(1..=100).contains(&page_size) {
        return Err(invalid_query("page and pageSize must be between 1 and 100"));
    }
    Ok((query, page, page_size))
}

fn is_valid_code(code: &str) -> bool {
    !code.is_empty() && code.len() <= 32 && code.chars().all(|c| c.is_ascii_alphanumeric())
}

#[instrument(skip(state))]
pub async fn search_products(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchPage>, AppError> {
    let Query(q) = query.map_err(|e| invalid_query(e.body_text()))?;
    let (query, page, page_size) = validate_search(q)?;

    let result = state
        .products
        .search(&query, page, page_size)
        .await
        .map_err(|e| {
            error!(error = %e, %query, "product search failed");
            e
        })?;
    Ok(Json(result))
}

#[instrument(skip(state))]
pub async fn product_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Product>, AppError> {
    let code = code.trim().to_string();
    if !is_valid_code(&code) {
        return Err(AppError::validation(
            "invalid_params",
            format!("invalid product code {code:?}"),
        ));
    }

    match state.products.by_code(&code).await {
        Ok(Some(product)) => Ok(Json(product)),
        Ok(None) => Err(AppError::NotFound),
        Err(e) => {
            error!(error = %e, %code, "product lookup failed");
            Err(e)
        }
    }
}
