use sqlx::{Executor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::db::RepoResult;
use crate::orders::repo_types::{OrderItemRow, OrderRow, PricedItem};
use rust_decimal::Decimal;

const ORDER_COLUMNS: &str = "id, user_id, total_amount, status, created_at, updated_at";

pub async fn insert_order_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    total: Decimal,
) -> RepoResult<Uuid> {
    let id = Uuid::new_v4();
    tx.execute(
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, total_amount, status)
            VALUES ($1, $2, $3, 'pending')
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(total),
    )
    .await?;
    Ok(id)
}

pub async fn insert_item_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    item: &PricedItem,
) -> RepoResult<()> {
    tx.execute(
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, quantity, price)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price),
    )
    .await?;
    Ok(())
}

pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> RepoResult<Vec<OrderRow>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get_for_user(db: &PgPool, id: Uuid, user_id: Uuid) -> RepoResult<Option<OrderRow>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Items of every listed order, oldest first.
pub async fn items_for(db: &PgPool, order_ids: &[Uuid]) -> RepoResult<Vec<OrderItemRow>> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        r#"
        SELECT id, order_id, product_id, quantity, price
          FROM order_items
         WHERE order_id = ANY($1)
         ORDER BY created_at
        "#,
    )
    .bind(order_ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn update_status(
    db: &PgPool,
    id: Uuid,
    user_id: Uuid,
    status: &str,
) -> RepoResult<Option<OrderRow>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        UPDATE orders SET status = $3, updated_at = now()
         WHERE id = $1 AND user_id = $2
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(user_id)
    .bind(status)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid, user_id: Uuid) -> RepoResult<bool> {
    let res = sqlx::query("DELETE FROM orders WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
