use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::orders::repo_types::{OrderItemRow, OrderRow};
use crate::products::Product;

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product: Option<Product>,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: Decimal,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl OrderResponse {
    /// Attaches the order's own items, each with its product when it still exists.
    pub fn assemble(order: OrderRow, items: &[OrderItemRow], products: &[Product]) -> Self {
        let items = items
            .iter()
            .filter(|i| i.order_id == order.id)
            .map(|i| OrderItemResponse {
                id: i.id,
                product_id: i.product_id,
                product: products.iter().find(|p| p.id == i.product_id).cloned(),
                quantity: i.quantity,
                price: i.price,
            })
            .collect();
        Self {
            id: order.id,
            user_id: order.user_id,
            total_amount: order.total_amount,
            status: order.status,
            items,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}
