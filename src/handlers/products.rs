use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use rusqlite::{Connection, OptionalExtension};

use crate::error::ApiError;
use crate::models::Product;
use crate::state::AppState;

pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let conn = state.db.lock()?;

    Ok(Json(all_products(&conn)?))
}

pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let conn = state.db.lock()?;

    let product = product_by_slug(&conn, &slug)?
        .ok_or_else(|| ApiError::NotFound("product not found".to_string()))?;

    Ok(Json(product))
}

pub(crate) fn all_products(conn: &Connection) -> Result<Vec<Product>, ApiError> {
    let mut stmt = conn.prepare(
        "SELECT id, slug, name, icon, summary, price_min, price_max, created_at
         FROM products
         ORDER BY name",
    )?;

    let products = stmt
        .query_map([], map_product)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(products)
}

pub(crate) fn product_by_slug(
    conn: &Connection,
    slug: &str,
) -> Result<Option<Product>, rusqlite::Error> {
    conn.query_row(
        "SELECT id, slug, name, icon, summary, price_min, price_max, created_at
         FROM products
         WHERE slug = ?1",
        [slug],
        map_product,
    )
    .optional()
}

fn map_product(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        slug: row.get(1)?,
        name: row.get(2)?,
        icon: row.get(3)?,
        summary: row.get(4)?,
        price_min: row.get(5)?,
        price_max: row.get(6)?,
        created_at: row.get(7)?,
    })
}
