use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use time::Date;
use tracing::warn;
use uuid::Uuid;

use crate::dates::format_date;
use crate::error::AppError;
use crate::meals::dto::ItemResponse;
use crate::meals::{EnergyRow, LoggedItem, MealItemDraft, MealStore};
use crate::nutrition::RangeSummary;

/// Error codes the server may send back, so they keep their meaning on this side.
const KNOWN_CODES: [&str; 11] = [
    "invalid_body",
    "invalid_params",
    "invalid_query_parameters",
    "invalid_date_range",
    "invalid_date",
    "invalid_meal_type",
    "db_insert_failed",
    "db_query_failed",
    "db_update_failed",
    "db_delete_failed",
    "upstream_error",
];

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ItemsBody {
    items: Vec<LoggedItem>,
}

/// The backend's `/api/v1/meals` endpoints seen as a `MealStore`.
#[derive(Clone)]
pub struct HttpMealStore {
    client: Client,
    base_url: String,
}

impl HttpMealStore {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build meal store http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }
}

fn transport_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::UpstreamTimeout
    } else {
        AppError::upstream("upstream_error", e)
    }
}

async fn error_from(res: Response) -> AppError {
    let status = res.status();
    let body = res.json::<ErrorBody>().await.ok();
    let code = body
        .as_ref()
        .and_then(|b| KNOWN_CODES.iter().copied().find(|known| *known == b.error))
        .unwrap_or("upstream_error");
    let message = body.map(|b| b.message).unwrap_or_else(|| status.to_string());
    warn!(%status, code, %message, "meal store request rejected");

    match status {
        StatusCode::NOT_FOUND => AppError::NotFound,
        StatusCode::GATEWAY_TIMEOUT => AppError::UpstreamTimeout,
        s if s.is_client_error() => AppError::validation(code, message),
        _ => AppError::upstream(code, message),
    }
}

async fn checked(res: Result<Response, reqwest::Error>) -> Result<Response, AppError> {
    let res = res.map_err(transport_error)?;
    if res.status().is_success() {
        Ok(res)
    } else {
        Err(error_from(res).await)
    }
}

#[async_trait]
impl MealStore for HttpMealStore {
    async fn insert(&self, draft: &MealItemDraft) -> Result<LoggedItem, AppError> {
        let res = checked(self.client.post(self.url("/meals")).json(draft).send().await).await?;
        let body: ItemResponse = res.json().await.map_err(transport_error)?;
        Ok(body.item)
    }

    async fn list(&self, date: Date) -> Result<Vec<LoggedItem>, AppError> {
        let res = checked(
            self.client
                .get(self.url("/meals"))
                .query(&[("date", format_date(date))])
                .send()
                .await,
        )
        .await?;
        let body: ItemsBody = res.json().await.map_err(transport_error)?;
        Ok(body.items)
    }

    async fn update_quantity(&self, id: Uuid, quantity: f64) -> Result<LoggedItem, AppError> {
        let res = checked(
            self.client
                .patch(self.url(&format!("/meals/{id}")))
                .json(&serde_json::json!({ "productQuantity": quantity }))
                .send()
                .await,
        )
        .await?;
        let body: ItemResponse = res.json().await.map_err(transport_error)?;
        Ok(body.item)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        checked(self.client.delete(self.url(&format!("/meals/{id}"))).send().await).await?;
        Ok(())
    }

    /// The server only returns per-day calories, so each day comes back as a
    /// single unscaled row.
    async fn list_range(&self, from: Date, to: Date) -> Result<Vec<EnergyRow>, AppError> {
        let res = checked(
            self.client
                .get(self.url("/meals/summary"))
                .query(&[("from", format_date(from)), ("to", format_date(to))])
                .send()
                .await,
        )
        .await?;
        let summary: RangeSummary = res.json().await.map_err(transport_error)?;
        Ok(summary
            .days
            .into_iter()
            .map(|day| EnergyRow {
                date: day.date,
                energy_kcal: day.calories as f64,
                quantity: 0.0,
                quantity_unit: String::new(),
            })
            .collect())
    }
}
