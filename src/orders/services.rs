use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    orders::{dto::OrderItemRequest, repo_types::PricedItem},
    products::{Product, MAX_AMOUNT},
};

pub const STATUSES: [&str; 5] = ["pending", "paid", "shipped", "delivered", "cancelled"];

pub fn check_lines(items: &[OrderItemRequest]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::validation("Order must contain at least one item"));
    }
    if items.iter().any(|i| i.quantity < 1) {
        return Err(AppError::validation("Quantity must be at least 1"));
    }
    Ok(())
}

pub fn product_ids(items: &[OrderItemRequest]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn total_too_large() -> AppError {
    AppError::validation(format!("Order total must not exceed {MAX_AMOUNT}"))
}

/// Prices every line from the current product price and sums the order total.
pub fn price_lines(
    items: &[OrderItemRequest],
    products: &[Product],
) -> AppResult<(Vec<PricedItem>, Decimal)> {
    let mut priced = Vec::with_capacity(items.len());
    let mut total = Decimal::ZERO;
    for item in items {
        let product = products
            .iter()
            .find(|p| p.id == item.product_id)
            .ok_or_else(|| AppError::not_found("Product not found"))?;
        total = product
            .price
            .checked_mul(Decimal::from(item.quantity))
            .and_then(|line| total.checked_add(line))
            .filter(|t| *t <= MAX_AMOUNT)
            .ok_or_else(total_too_large)?;
        priced.push(PricedItem {
            product_id: product.id,
            quantity: item.quantity,
            price: product.price,
        });
    }
    Ok((priced, total))
}

pub fn check_status(status: &str) -> AppResult<String> {
    let status = status.trim().to_lowercase();
    if STATUSES.contains(&status.as_str()) {
        Ok(status)
    } else {
        Err(AppError::validation(format!(
            "Invalid status, expected one of {}",
            STATUSES.join(", ")
        )))
    }
}
