use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{dto::MessageResponse, AuthUser},
    error::{AppError, AppResult},
    extract::{ApiJson, ApiPath},
    orders::{
        dto::{CreateOrderRequest, OrderResponse, UpdateOrderRequest},
        repo,
        repo_types::OrderRow,
        services::{check_lines, check_status, price_lines, product_ids},
    },
    products,
    state::AppState,
};

/// Every order route is scoped to the caller; other users' orders read as missing.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/:id",
            get(get_order).put(update_order).delete(delete_order),
        )
}

fn order_not_found() -> AppError {
    AppError::not_found("Order not found")
}

async fn with_items(state: &AppState, orders: Vec<OrderRow>) -> AppResult<Vec<OrderResponse>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = repo::items_for(&state.db, &ids).await?;
    let mut wanted: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    wanted.sort_unstable();
    wanted.dedup();
    let catalog = products::get_many(&state.db, &wanted).await?;
    Ok(orders
        .into_iter()
        .map(|o| OrderResponse::assemble(o, &items, &catalog))
        .collect())
}

async fn load(state: &AppState, order: OrderRow) -> AppResult<OrderResponse> {
    with_items(state, vec![order])
        .await?
        .pop()
        .ok_or_else(order_not_found)
}

#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<OrderResponse>>> {
    let orders = repo::list_for_user(&state.db, user_id).await?;
    Ok(Json(with_items(&state, orders).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderResponse>)> {
    check_lines(&payload.items)?;

    let mut tx = state.db.begin().await.context("begin tx")?;
    let found = products::lock_products(&mut tx, &product_ids(&payload.items)).await?;
    let (items, total) = price_lines(&payload.items, &found)?;
    let order_id = repo::insert_order_tx(&mut tx, user_id, total).await?;
    for item in &items {
        repo::insert_item_tx(&mut tx, order_id, item).await?;
    }
    tx.commit().await.context("commit tx")?;

    info!(order_id = %order_id, user_id = %user_id, items = items.len(), %total, "order placed");
    let order = repo::get_for_user(&state.db, order_id, user_id)
        .await?
        .ok_or_else(order_not_found)?;
    Ok((StatusCode::CREATED, Json(load(&state, order).await?)))
}

#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<OrderResponse>> {
    let order = repo::get_for_user(&state.db, id, user_id)
        .await?
        .ok_or_else(order_not_found)?;
    Ok(Json(load(&state, order).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateOrderRequest>,
) -> AppResult<Json<OrderResponse>> {
    let status = check_status(&payload.status)?;
    let order = repo::update_status(&state.db, id, user_id, &status)
        .await?
        .ok_or_else(order_not_found)?;
    info!(order_id = %id, status = %status, "order status changed");
    Ok(Json(load(&state, order).await?))
}

#[instrument(skip(state))]
pub async fn delete_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    if !repo::delete(&state.db, id, user_id).await? {
        return Err(order_not_found());
    }
    info!(order_id = %id, "order deleted");
    Ok(Json(MessageResponse {
        message: "Order deleted successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::require_auth;
    use crate::orders::repo_types::OrderItemRow;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
        middleware::from_fn_with_state,
    };
    use rust_decimal::Decimal;
    use serde_json::Value;
    use time::OffsetDateTime;
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        order_routes()
            .route_layer(from_fn_with_state(state.clone(), require_auth))
            .with_state(state)
    }

    async fn post_order(state: AppState, token: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut req = Request::post("/orders").header(header::CONTENT_TYPE, "application/json");
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let res = app(state)
            .oneshot(req.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn orders_require_a_token() {
        let (status, _) = post_order(AppState::fake(), None, r#"{"items":[]}"#).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn empty_order_is_rejected_before_touching_storage() {
        let state = AppState::fake();
        let token = state.keys.issue(Uuid::new_v4()).unwrap();
        let (status, body) = post_order(state, Some(&token), r#"{"items":[]}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Order must contain at least one item");
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let state = AppState::fake();
        let token = state.keys.issue(Uuid::new_v4()).unwrap();
        let body = format!(
            r#"{{"items":[{{"product_id":"{}","quantity":0}}]}}"#,
            Uuid::new_v4()
        );
        let (status, _) = post_order(state, Some(&token), &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn assemble_keeps_only_own_items() {
        let now = OffsetDateTime::now_utc();
        let order = OrderRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            total_amount: Decimal::new(900, 2),
            status: "pending".into(),
            created_at: now,
            updated_at: now,
        };
        let item = |order_id| OrderItemRow {
            id: Uuid::new_v4(),
            order_id,
            product_id: Uuid::new_v4(),
            quantity: 2,
            price: Decimal::new(450, 2),
        };
        let items = [item(order.id), item(Uuid::new_v4())];
        let json = serde_json::to_value(OrderResponse::assemble(order, &items, &[])).unwrap();
        let listed = json["items"].as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0]["product"].is_null());
        assert_eq!(json["total_amount"], "9.00");
    }
}
