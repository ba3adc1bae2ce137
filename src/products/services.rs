use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    products::{
        dto::{CreateProductRequest, UpdateProductRequest},
        repo_types::{NewProduct, ProductChanges},
    },
};

fn checked_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    Ok(name.to_string())
}

/// Largest value a `NUMERIC(10, 2)` column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Prices are stored with two decimal places.
fn checked_price(price: Decimal) -> AppResult<Decimal> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::validation("Price must not be negative"));
    }
    let price = price.round_dp(2);
    if price > MAX_AMOUNT {
        return Err(AppError::validation(format!("Price must not exceed {MAX_AMOUNT}")));
    }
    Ok(price)
}

fn checked_stock(stock: i32) -> AppResult<i32> {
    if stock < 0 {
        return Err(AppError::validation("Stock must not be negative"));
    }
    Ok(stock)
}

pub fn new_product(req: CreateProductRequest) -> AppResult<NewProduct> {
    Ok(NewProduct {
        name: checked_name(&req.name)?,
        description: req.description.unwrap_or_default(),
        price: checked_price(req.price)?,
        stock: checked_stock(req.stock.unwrap_or(0))?,
        category: req.category.unwrap_or_default(),
        image_url: req.image_url.unwrap_or_default(),
        is_active: req.is_active.unwrap_or(true),
    })
}

pub fn product_changes(req: UpdateProductRequest) -> AppResult<ProductChanges> {
    Ok(ProductChanges {
        name: req.name.as_deref().map(checked_name).transpose()?,
        description: req.description,
        price: req.price.map(checked_price).transpose()?,
        stock: req.stock.map(checked_stock).transpose()?,
        category: req.category,
        image_url: req.image_url,
        is_active: req.is_active,
    })
}
