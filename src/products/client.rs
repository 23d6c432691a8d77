use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::error::AppError;
use crate::products::dto::{coerce_number, OffProductResponse, OffSearchResponse, Product, SearchPage};

/// Remote product database: free-text search and barcode lookup.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn search(&self, query: &str, page: u32, page_size: u32) -> Result<SearchPage, AppError>;
    async fn by_code(&self, code: &str) -> Result<Option<Product>, AppError>;
}

/// OpenFoodFacts over HTTPS.
#[derive(Clone)]
pub struct OpenFoodFacts {
    client: Client,
    base_url: String,
    language: String,
}

impl OpenFoodFacts {
    pub fn new(config: &SearchConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("build OpenFoodFacts http client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        })
    }
}

fn upstream_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        warn!(error = %e, "product lookup timed out");
        AppError::UpstreamTimeout
    } else {
        warn!(error = %e, "product lookup failed");
        AppError::upstream("upstream_error", e)
    }
}

#[async_trait]
impl ProductLookup for OpenFoodFacts {
    async fn search(&self, query: &str, page: u32, page_size: u32) -> Result<SearchPage, AppError> {
        let url = format!("{}/cgi/search.pl", self.base_url);
        let page_param = page.to_string();
        let page_size_param = page_size.to_string();
        let res = self
            .client
            .get(&url)
            .query(&[
                ("search_terms", query),
                ("search_simple", "1"),
                ("action", "process"),
                ("json", "1"),
                ("page", page_param.as_str()),
                ("page_size", page_size_param.as_str()),
                ("lc", self.language.as_str()),
            ])
            .send()
            .await
            .map_err(upstream_error)?;

        if !res.status().is_success() {
            warn!(status = %res.status(), "OpenFoodFacts search rejected");
            return Err(AppError::upstream(
                "upstream_error",
                format!("OpenFoodFacts responded {}", res.status()),
            ));
        }

        let raw: OffSearchResponse = res.json().await.map_err(upstream_error)?;
        let items: Vec<Product> = raw
            .products
            .into_iter()
            .map(|p| p.into_product(&self.language))
            .collect();
        debug!(query, page, count = items.len(), "OpenFoodFacts search");

        Ok(SearchPage {
            items,
            page,
            page_size,
            total: coerce_number(raw.count.as_ref()).map(|n| n.max(0.0) as u64),
        })
    }

    async fn by_code(&self, code: &str) -> Result<Option<Product>, AppError> {
        let url = format!("{}/api/v2/product/{}.json", self.base_url, code);
        let res = self.client.get(&url).send().await.map_err(upstream_error)?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !res.status().is_success() {
            warn!(status = %res.status(), code, "OpenFoodFacts product lookup rejected");
            return Err(AppError::upstream(
                "upstream_error",
                format!("OpenFoodFacts responded {}", res.status()),
            ));
        }

        let raw: OffProductResponse = res.json().await.map_err(upstream_error)?;
        if coerce_number(raw.status.as_ref()) == Some(0.0) {
            return Ok(None);
        }
        Ok(raw.product.map(|p| p.into_product(&self.language)))
    }
}
