use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    error::AppError,
    meals::{
        dto::{
            CreateMealItemRequest, DateQuery, ItemResponse, ItemsResponse, RangeQuery,
            UpdateQuantityRequest,
        },
        services::{
            clamp_quantity, list_day, parse_day, parse_item_id, parse_range, summarize_range,
            validate_draft,
        },
    },
    nutrition::RangeSummary,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals).post(create_meal))
        .route("/meals/summary", get(meals_summary))
        .route("/meals/:id", patch(update_meal).delete(delete_meal))
}

fn rejected(code: &'static str, message: String) -> AppError {
    warn!(code, %message, "rejected request");
    AppError::validation(code, message)
}

#[instrument(skip(state, payload))]
pub async fn create_meal(
    State(state): State<AppState>,
    payload: Result<Json<CreateMealItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ItemResponse>), AppError> {
    let Json(body) = payload.map_err(|e| rejected("invalid_body", e.body_text()))?;
    let draft = validate_draft(body)?;

    let item = state.store.insert(&draft).await.map_err(|e| {
        error!(error = %e, date = %draft.date, "create meal item failed");
        e
    })?;

    info!(id = %item.id, date = %item.date, meal = %item.meal_slot, "meal item logged");
    Ok((StatusCode::CREATED, Json(ItemResponse { item })))
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<ItemsResponse>, AppError> {
    let Query(q) = query.map_err(|e| rejected("invalid_query_parameters", e.body_text()))?;
    let date = parse_day(&q.date)?;

    let listed = list_day(state.store.as_ref(), date).await.map_err(|e| {
        error!(error = %e, %date, "list meal items failed");
        e
    })?;
    Ok(Json(listed))
}

#[instrument(skip(state, payload))]
pub async fn update_meal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateQuantityRequest>, JsonRejection>,
) -> Result<Json<ItemResponse>, AppError> {
    let id = parse_item_id(&id)?;
    let Json(body) = payload.map_err(|e| rejected("invalid_body", e.body_text()))?;
    if body.product_quantity < 0.0 {
        return Err(rejected("invalid_body", "productQuantity must be >= 0".into()));
    }
    let quantity = clamp_quantity(body.product_quantity)?;

    let item = state
        .store
        .update_quantity(id, quantity)
        .await
        .map_err(|e| {
            error!(error = %e, %id, "update meal item failed");
            e
        })?;

    info!(%id, quantity, "meal item quantity updated");
    Ok(Json(ItemResponse { item }))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_item_id(&id)?;

    state.store.delete(id).await.map_err(|e| {
        error!(error = %e, %id, "delete meal item failed");
        e
    })?;

    info!(%id, "meal item deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn meals_summary(
    State(state): State<AppState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<RangeSummary>, AppError> {
    let Query(q) = query.map_err(|e| rejected("invalid_query_parameters", e.body_text()))?;
    let (from, to) = parse_range(&q)?;

    let summary = summarize_range(state.store.as_ref(), from, to)
        .await
        .map_err(|e| {
            error!(error = %e, %from, %to, "meals summary failed");
            e
        })?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{app::build_app, state::AppState};

    async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.expect("router responds");
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn oats(date: &str) -> Value {
        json!({
            "mealType": "breakfast",
            "date": date,
            "productName": "Oats",
            "productEnergyKcal": 200.0,
            "productProteins100g": 10.0,
            "productQuantity": 150.0,
            "productQuantityUnit": "g"
        })
    }

    #[tokio::test]
    async fn create_then_list_with_totals() {
        let app = build_app(AppState::fake());

        let (status, created) = send(app.clone(), post_json("/api/v1/meals", oats("2024-01-02"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["item"]["productName"], "Oats");
        assert_eq!(created["item"]["mealType"], "breakfast");

        let (status, listed) = send(app, get("/api/v1/meals?date=2024-01-02")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["items"].as_array().unwrap().len(), 1);
        assert_eq!(listed["items"][0]["contribution"]["energyKcal"], 300);
        assert_eq!(listed["totals"]["totalEnergyKcal"], 300);
        assert_eq!(listed["totals"]["totalProteins"], 15.0);
    }

    #[tokio::test]
    async fn create_rejects_unknown_meal_type() {
        let app = build_app(AppState::fake());
        let mut body = oats("2024-01-02");
        body["mealType"] = json!("brunch");
        let (status, err) = send(app, post_json("/api/v1/meals", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "invalid_body");
    }

    #[tokio::test]
    async fn create_rejects_malformed_json() {
        let app = build_app(AppState::fake());
        let req = Request::post("/api/v1/meals")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, err) = send(app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "invalid_body");
    }

    #[tokio::test]
    async fn summary_zero_fills_and_validates_range() {
        let app = build_app(AppState::fake());
        send(app.clone(), post_json("/api/v1/meals", oats("2024-01-02"))).await;

        let (status, summary) =
            send(app.clone(), get("/api/v1/meals/summary?from=2024-01-01&to=2024-01-03")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            summary,
            json!({ "days": [
                { "date": "2024-01-01", "calories": 0 },
                { "date": "2024-01-02", "calories": 300 },
                { "date": "2024-01-03", "calories": 0 }
            ]})
        );

        let (status, err) =
            send(app.clone(), get("/api/v1/meals/summary?from=2024-01-03&to=2024-01-01")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "invalid_date_range");

        let (status, err) =
            send(app.clone(), get("/api/v1/meals/summary?from=0000-01-01&to=9999-12-31")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "invalid_date_range");

        let (status, err) = send(app, get("/api/v1/meals/summary?from=2024-01-01")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "invalid_query_parameters");
    }

    #[tokio::test]
    async fn update_and_delete_lifecycle() {
        let app = build_app(AppState::fake());
        let (_, created) = send(app.clone(), post_json("/api/v1/meals", oats("2024-01-02"))).await;
        let id = created["item"]["id"].as_str().unwrap().to_string();

        let req = Request::patch(format!("/api/v1/meals/{id}"))
            .header("content-type", "application/json")
            .body(Body::from(json!({ "productQuantity": 50.0 }).to_string()))
            .unwrap();
        let (status, updated) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["item"]["productQuantity"], 50.0);

        let req = Request::delete(format!("/api/v1/meals/{id}")).body(Body::empty()).unwrap();
        let (status, _) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let req = Request::delete(format!("/api/v1/meals/{id}")).body(Body::empty()).unwrap();
        let (status, err) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["error"], "not_found");

        let req = Request::delete("/api/v1/meals/not-a-uuid").body(Body::empty()).unwrap();
        let (status, err) = send(app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "invalid_params");
    }

    #[tokio::test]
    async fn update_rejects_negative_quantity() {
        let app = build_app(AppState::fake());
        let req = Request::patch(format!("/api/v1/meals/{}", uuid::Uuid::new_v4()))
            .header("content-type", "application/json")
            .body(Body::from(json!({ "productQuantity": -1.0 }).to_string()))
            .unwrap();
        let (status, err) = send(app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "invalid_body");
    }
}
