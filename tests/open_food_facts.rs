use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::{Path, Query, State},
    http::{header::USER_AGENT, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use foodie::config::SearchConfig;
use foodie::products::{OpenFoodFacts, ProductLookup};
use foodie::{build_app, AppError, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

fn milk() -> Value {
    json!({
        "code": "5900512300108",
        "product_name": "Milk",
        "product_name_pl": "Mleko",
        "brands": "Mlekovita",
        "image_url": "https://images.local/milk.jpg",
        "nutriments": {
            "energy-kcal_100g": 64,
            "proteins_100g": "3.2",
            "fat_100g": 3.5,
            "carbohydrates_100g": 4.8
        },
        "product_quantity": "1000",
        "product_quantity_unit": "ml"
    })
}

async fn search(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Query(mut params): Query<HashMap<String, String>>,
) -> Response {
    let terms = params.get("search_terms").cloned().unwrap_or_default();
    if let Some(agent) = headers.get(USER_AGENT).and_then(|v| v.to_str().ok()) {
        params.insert("user_agent".into(), agent.into());
    }
    seen.lock().unwrap().push(params);

    match terms.as_str() {
        "boom" => (StatusCode::INTERNAL_SERVER_ERROR, "down for maintenance").into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({ "count": 0, "products": [] })).into_response()
        }
        _ => Json(json!({ "count": "42", "products": [milk()] })).into_response(),
    }
}

async fn product(Path(file): Path<String>) -> Response {
    match file.trim_end_matches(".json") {
        "5900512300108" => Json(json!({ "status": 1, "product": milk() })).into_response(),
        "0000" => Json(json!({ "status": 0, "status_verbose": "product not found" })).into_response(),
        "1111" => StatusCode::NOT_FOUND.into_response(),
        "2222" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({ "status": 1, "product": milk() })).into_response()
        }
        _ => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

/// Canned OpenFoodFacts on a local port; the client times out after one second.
async fn lookup() -> (OpenFoodFacts, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/cgi/search.pl", get(search))
        .route("/api/v2/product/:file", get(product))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = SearchConfig {
        base_url: format!("http://{addr}/"),
        timeout_secs: 1,
        language: "pl".into(),
        user_agent: "foodie-test/1.0".into(),
    };
    (OpenFoodFacts::new(&config).unwrap(), seen)
}

#[tokio::test]
async fn search_sends_the_expected_parameters() {
    let (off, seen) = lookup().await;

    let page = off.search("skyr", 2, 5).await.unwrap();
    assert_eq!(page.page, 2);
    assert_eq!(page.page_size, 5);
    assert_eq!(page.total, Some(42));
    assert_eq!(page.items.len(), 1);

    let params = seen.lock().unwrap()[0].clone();
    let expected = [
        ("search_terms", "skyr"),
        ("search_simple", "1"),
        ("action", "process"),
        ("json", "1"),
        ("page", "2"),
        ("page_size", "5"),
        ("lc", "pl"),
        ("user_agent", "foodie-test/1.0"),
    ];
    for (key, value) in expected {
        assert_eq!(params.get(key).map(String::as_str), Some(value), "{key}");
    }
}

#[tokio::test]
async fn products_are_mapped_with_localized_names_and_coerced_numbers() {
    let (off, _) = lookup().await;

    let product = off.by_code("5900512300108").await.unwrap().unwrap();
    assert_eq!(product.name, "Mleko");
    assert_eq!(product.brands, "Mlekovita");
    assert_eq!(product.nutriments.energy_kcal_100g, Some(64.0));
    assert_eq!(product.nutriments.proteins_100g, Some(3.2));
    assert_eq!(product.nutriments.carbs_100g, Some(4.8));
    assert_eq!(product.quantity, Some(1000.0));
    assert_eq!(product.quantity_unit.as_deref(), Some("ml"));
}

#[tokio::test]
async fn unknown_codes_are_none() {
    let (off, _) = lookup().await;

    assert!(off.by_code("0000").await.unwrap().is_none());
    assert!(off.by_code("1111").await.unwrap().is_none());
}

#[tokio::test]
async fn failed_responses_are_upstream_errors() {
    let (off, _) = lookup().await;

    let err = off.search("boom", 1, 10).await.unwrap_err();
    assert_eq!(err.code(), "upstream_error");
    assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

    let err = off.by_code("9999").await.unwrap_err();
    assert_eq!(err.code(), "upstream_error");
}

#[tokio::test]
async fn slow_responses_time_out() {
    let (off, _) = lookup().await;

    let err = off.search("slow", 1, 10).await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamTimeout));
    assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);

    let err = off.by_code("2222").await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamTimeout));
}

#[tokio::test]
async fn api_reports_lookup_failures() {
    let (off, _) = lookup().await;
    let mut state = AppState::fake();
    state.products = Arc::new(off) as Arc<dyn ProductLookup>;
    let app = build_app(state);

    let cases = [
        ("/api/v1/search?q=slow", StatusCode::GATEWAY_TIMEOUT, "upstream_timeout"),
        ("/api/v1/search?q=boom", StatusCode::BAD_GATEWAY, "upstream_error"),
        ("/api/v1/products/0000", StatusCode::NOT_FOUND, "not_found"),
    ];
    for (uri, status, code) in cases {
        let res = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), status, "{uri}");
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], code, "{uri}");
    }
}
