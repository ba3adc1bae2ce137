use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::db::RepoResult;
use crate::products::repo_types::{NewProduct, Product, ProductChanges};

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, category, image_url, is_active, created_at, updated_at";

pub async fn list(db: &PgPool) -> RepoResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> RepoResult<Option<Product>> {
    let row = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn get_many(db: &PgPool, ids: &[Uuid]) -> RepoResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Fetch several products inside an open transaction, locking the rows.
pub async fn get_many_tx(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[Uuid],
) -> RepoResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) FOR UPDATE"
    ))
    .bind(ids)
    .fetch_all(&mut **tx)
    .await?;
    Ok(rows)
}

pub async fn insert(db: &PgPool, p: NewProduct) -> RepoResult<Product> {
    let row = sqlx::query_as::<_, Product>(&format!(
        r#"
        INSERT INTO products (id, name, description, price, stock, category, image_url, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&p.name)
    .bind(&p.description)
    .bind(p.price)
    .bind(p.stock)
    .bind(&p.category)
    .bind(&p.image_url)
    .bind(p.is_active)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update(db: &PgPool, id: Uuid, c: ProductChanges) -> RepoResult<Option<Product>> {
    let row = sqlx::query_as::<_, Product>(&format!(
        r#"
        UPDATE products SET
            name        = COALESCE($2, name),
            description = COALESCE($3, description),
            price       = COALESCE($4, price),
            stock       = COALESCE($5, stock),
            category    = COALESCE($6, category),
            image_url   = COALESCE($7, image_url),
            is_active   = COALESCE($8, is_active),
            updated_at  = now()
        WHERE id = $1
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(c.name)
    .bind(c.description)
    .bind(c.price)
    .bind(c.stock)
    .bind(c.category)
    .bind(c.image_url)
    .bind(c.is_active)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> RepoResult<bool> {
    let res = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
