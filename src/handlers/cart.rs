use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use rusqlite::{Connection, OptionalExtension};
use serde::Deserialize;

use crate::error::ApiError;
use crate::models::{AddCartItem, CartItem, CartResponse, UpdateCartItem};
use crate::sessions::AuthUser;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RemoveParams {
    pub product_slug: Option<String>,
}

pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<CartResponse>, ApiError> {
    let conn = state.db.lock()?;

    let items = items_for_user(&conn, &user.id)?;

    Ok(Json(CartResponse { items }))
}

pub async fn add_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<AddCartItem>,
) -> Result<Json<CartItem>, ApiError> {
    let conn = state.db.lock()?;

    let item = add_item_for_user(&conn, &user.id, &payload, state.config.max_item_quantity)?;

    Ok(Json(item))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<UpdateCartItem>,
) -> Result<Json<CartResponse>, ApiError> {
    let conn = state.db.lock()?;

    update_item_for_user(&conn, &user.id, &payload, state.config.max_item_quantity)?;

    let items = items_for_user(&conn, &user.id)?;

    Ok(Json(CartResponse { items }))
}

pub async fn remove_items(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<RemoveParams>,
) -> Result<StatusCode, ApiError> {
    let conn = state.db.lock()?;

    remove_items_for_user(&conn, &user.id, params.product_slug.as_deref())?;

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn items_for_user(conn: &Connection, user_id: &str) -> Result<Vec<CartItem>, ApiError> {
    // Carts are created lazily on first write; no row means an empty cart.
    let Some(cart_id) = cart_id_for_user(conn, user_id)? else {
        return Ok(Vec::new());
    };

    let mut stmt = conn.prepare(
        "SELECT product_slug, name, icon, price_min, price_max, quantity
         FROM cart_items
         WHERE cart_id = ?1
         ORDER BY product_slug",
    )?;

    let items = stmt
        .query_map([cart_id], map_cart_item)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

pub(crate) fn add_item_for_user(
    conn: &Connection,
    user_id: &str,
    payload: &AddCartItem,
    max_quantity: i64,
) -> Result<CartItem, ApiError> {
    if payload.product_slug.trim().is_empty() || payload.name.trim().is_empty() {
        return Err(ApiError::Validation(
            "product_slug and name are required".to_string(),
        ));
    }
    if payload.price_min < 0.0 || payload.price_max < payload.price_min {
        return Err(ApiError::Validation("invalid price range".to_string()));
    }

    let cart_id = ensure_cart(conn, user_id)?;

    let existing: Option<i64> = conn
        .query_row(
            "SELECT quantity FROM cart_items WHERE cart_id = ?1 AND product_slug = ?2",
            rusqlite::params![cart_id, payload.product_slug],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(quantity) => {
            // Saturate at the cap.
            let quantity = (quantity + 1).min(max_quantity);
            conn.execute(
                "UPDATE cart_items SET quantity = ?1 WHERE cart_id = ?2 AND product_slug = ?3",
                rusqlite::params![quantity, cart_id, payload.product_slug],
            )?;
        }
        None => {
            conn.execute(
                "INSERT INTO cart_items (cart_id, product_slug, name, icon, price_min, price_max, quantity)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
                rusqlite::params![
                    cart_id,
                    payload.product_slug,
                    payload.name,
                    payload.icon,
                    payload.price_min,
                    payload.price_max
                ],
            )?;
        }
    }

    let item = conn.query_row(
        "SELECT product_slug, name, icon, price_min, price_max, quantity
         FROM cart_items
         WHERE cart_id = ?1 AND product_slug = ?2",
        rusqlite::params![cart_id, payload.product_slug],
        map_cart_item,
    )?;

    Ok(item)
}

pub(crate) fn update_item_for_user(
    conn: &Connection,
    user_id: &str,
    payload: &UpdateCartItem,
    max_quantity: i64,
) -> Result<(), ApiError> {
    let cart_id = cart_id_for_user(conn, user_id)?
        .ok_or_else(|| ApiError::NotFound("cart not found".to_string()))?;

    if payload.quantity <= 0 {
        conn.execute(
            "DELETE FROM cart_items WHERE cart_id = ?1 AND product_slug = ?2",
            rusqlite::params![cart_id, payload.product_slug],
        )?;
        return Ok(());
    }

    if payload.quantity > max_quantity {
        return Err(ApiError::Validation(format!(
            "quantity may not exceed {max_quantity}"
        )));
    }

    // Overwrite semantics; an unknown slug leaves the cart unchanged.
    conn.execute(
        "UPDATE cart_items SET quantity = ?1 WHERE cart_id = ?2 AND product_slug = ?3",
        rusqlite::params![payload.quantity, cart_id, payload.product_slug],
    )?;

    Ok(())
}

pub(crate) fn remove_items_for_user(
    conn: &Connection,
    user_id: &str,
    product_slug: Option<&str>,
) -> Result<(), ApiError> {
    let Some(cart_id) = cart_id_for_user(conn, user_id)? else {
        return Ok(());
    };

    match product_slug {
        Some(slug) => {
            conn.execute(
                "DELETE FROM cart_items WHERE cart_id = ?1 AND product_slug = ?2",
                rusqlite::params![cart_id, slug],
            )?;
        }
        None => {
            conn.execute("DELETE FROM cart_items WHERE cart_id = ?1", [cart_id])?;
        }
    }

    Ok(())
}

pub(crate) fn cart_id_for_user(
    conn: &Connection,
    user_id: &str,
) -> Result<Option<i64>, rusqlite::Error> {
    conn.query_row("SELECT id FROM carts WHERE user_id = ?1", [user_id], |row| {
        row.get(0)
    })
    .optional()
}

fn ensure_cart(conn: &Connection, user_id: &str) -> Result<i64, rusqlite::Error> {
    if let Some(id) = cart_id_for_user(conn, user_id)? {
        return Ok(id);
    }

    conn.execute("INSERT INTO carts (user_id) VALUES (?1)", [user_id])?;

    Ok(conn.last_insert_rowid())
}

fn map_cart_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<CartItem> {
    Ok(CartItem {
        product_slug: row.get(0)?,
        name: row.get(1)?,
        icon: row.get(2)?,
        price_min: row.get(3)?,
        price_max: row.get(4)?,
        quantity: row.get(5)?,
    })
}
