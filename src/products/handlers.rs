use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{dto::MessageResponse, AuthUser},
    db::RepoError,
    error::{AppError, AppResult},
    extract::{ApiJson, ApiPath},
    products::{
        dto::{CreateProductRequest, UpdateProductRequest},
        repo,
        repo_types::Product,
        services::{new_product, product_changes},
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", put(update_product).delete(delete_product))
}

fn product_not_found() -> AppError {
    AppError::not_found("Product not found")
}

#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(repo::list(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Product>> {
    let product = repo::get(&state.db, id).await?.ok_or_else(product_not_found)?;
    Ok(Json(product))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let product = repo::insert(&state.db, new_product(payload)?).await?;
    info!(product_id = %product.id, created_by = %user_id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateProductRequest>,
) -> AppResult<Json<Product>> {
    let changes = product_changes(payload)?;
    let product = repo::update(&state.db, id, changes)
        .await?
        .ok_or_else(product_not_found)?;
    info!(product_id = %id, updated_by = %user_id, "product updated");
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let deleted = repo::delete(&state.db, id).await.map_err(|e| match e {
        RepoError::InvalidReference => {
            AppError::Conflict("Product is referenced by existing orders".into())
        }
        other => other.into(),
    })?;
    if !deleted {
        return Err(product_not_found());
    }
    info!(product_id = %id, deleted_by = %user_id, "product deleted");
    Ok(Json(MessageResponse {
        message: "Product deleted successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::require_auth;
    use axum::{
        body::Body,
        http::{header, Request},
        middleware::from_fn_with_state,
    };
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        write_routes()
            .route_layer(from_fn_with_state(state.clone(), require_auth))
            .merge(read_routes())
            .with_state(state)
    }

    #[tokio::test]
    async fn writes_require_a_token() {
        let res = app(AppState::fake())
            .oneshot(
                Request::post("/products")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"Mug","price":"4.50"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_price_is_bad_request() {
        let state = AppState::fake();
        let token = state.keys.issue(Uuid::new_v4()).unwrap();
        let res = app(state)
            .oneshot(
                Request::post("/products")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::COOKIE, format!("jwt={token}"))
                    .body(Body::from(r#"{"name":"Mug"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let res = app(AppState::fake())
            .oneshot(Request::get("/products/xyz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
