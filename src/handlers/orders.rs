use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use rusqlite::Connection;

use crate::error::ApiError;
use crate::handlers::cart;
use crate::models::{CreateOrder, Order, OrderItem, OrderWithItems};
use crate::sessions::AuthUser;
use crate::state::AppState;

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateOrder>,
) -> Result<Json<OrderWithItems>, ApiError> {
    let mut conn = state.db.lock()?;

    let created = create_for_user(&mut conn, &user.id, payload)?;

    Ok(Json(created))
}

pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<OrderWithItems>>, ApiError> {
    let conn = state.db.lock()?;

    Ok(Json(orders_for_user(&conn, &user.id)?))
}

pub(crate) fn create_for_user(
    conn: &mut Connection,
    user_id: &str,
    payload: CreateOrder,
) -> Result<OrderWithItems, ApiError> {
    if payload.items.is_empty() {
        return Err(ApiError::Validation(
            "order requires at least one item".to_string(),
        ));
    }
    let Some(total_amount) = payload.total_amount else {
        return Err(ApiError::Validation("total_amount is required".to_string()));
    };
    for item in &payload.items {
        if item.product_slug.trim().is_empty() || item.name.trim().is_empty() {
            return Err(ApiError::Validation(
                "every item needs a product_slug and name".to_string(),
            ));
        }
        if item.quantity < 1 {
            return Err(ApiError::Validation(
                "item quantity must be at least 1".to_string(),
            ));
        }
    }

    let reference = payment_reference();
    let currency = payload.currency.unwrap_or_else(|| "EUR".to_string());
    let payment_method = payload
        .payment_method
        .unwrap_or_else(|| "bank_transfer".to_string());

    // Order, line items and the cart wipe commit or roll back as one unit.
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO orders (user_id, status, total_amount, currency, payment_method, payment_reference,
                             billing_name, billing_email, billing_company, billing_address, billing_city,
                             billing_country, notes)
         VALUES (?1, 'pending', ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        rusqlite::params![
            user_id,
            total_amount,
            currency,
            payment_method,
            reference,
            payload.billing_name,
            payload.billing_email,
            payload.billing_company,
            payload.billing_address,
            payload.billing_city,
            payload.billing_country,
            payload.notes
        ],
    )?;

    let order_id = tx.last_insert_rowid();

    for item in &payload.items {
        tx.execute(
            "INSERT INTO order_items (order_id, product_slug, name, quantity, price_min, price_max, final_price)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                order_id,
                item.product_slug,
                item.name,
                item.quantity,
                item.price_min,
                item.price_max,
                item.final_price
            ],
        )?;
    }

    // A committed order consumes the server-side cart.
    if let Some(cart_id) = cart::cart_id_for_user(&tx, user_id)? {
        tx.execute("DELETE FROM cart_items WHERE cart_id = ?1", [cart_id])?;
    }

    tx.commit()?;

    get_order(conn, user_id, order_id)
}

pub(crate) fn get_order(
    conn: &Connection,
    user_id: &str,
    order_id: i64,
) -> Result<OrderWithItems, ApiError> {
    let order = conn
        .query_row(
            "SELECT id, user_id, status, total_amount, currency, payment_method, payment_reference,
                    billing_name, billing_email, billing_company, billing_address, billing_city,
                    billing_country, notes, created_at
             FROM orders
             WHERE id = ?1 AND user_id = ?2",
            rusqlite::params![order_id, user_id],
            map_order,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                ApiError::NotFound("order not found".to_string())
            }
            other => ApiError::Storage(other),
        })?;

    let items = items_for_order(conn, order_id)?;

    Ok(OrderWithItems { order, items })
}

pub(crate) fn orders_for_user(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<OrderWithItems>, ApiError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, status, total_amount, currency, payment_method, payment_reference,
                billing_name, billing_email, billing_company, billing_address, billing_city,
                billing_country, notes, created_at
         FROM orders
         WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC",
    )?;

    let orders = stmt
        .query_map([user_id], map_order)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut result = Vec::new();

    for order in orders {
        let items = items_for_order(conn, order.id)?;
        result.push(OrderWithItems { order, items });
    }

    Ok(result)
}

fn items_for_order(conn: &Connection, order_id: i64) -> Result<Vec<OrderItem>, ApiError> {
    let mut stmt = conn.prepare(
        "SELECT id, order_id, product_slug, name, quantity, price_min, price_max, final_price
         FROM order_items
         WHERE order_id = ?1",
    )?;

    let items = stmt
        .query_map([order_id], |row| {
            Ok(OrderItem {
                id: row.get(0)?,
                order_id: row.get(1)?,
                product_slug: row.get(2)?,
                name: row.get(3)?,
                quantity: row.get(4)?,
                price_min: row.get(5)?,
                price_max: row.get(6)?,
                final_price: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

fn map_order(row: &rusqlite::Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        user_id: row.get(1)?,
        status: row.get(2)?,
        total_amount: row.get(3)?,
        currency: row.get(4)?,
        payment_method: row.get(5)?,
        payment_reference: row.get(6)?,
        billing_name: row.get(7)?,
        billing_email: row.get(8)?,
        billing_company: row.get(9)?,
        billing_address: row.get(10)?,
        billing_city: row.get(11)?,
        billing_country: row.get(12)?,
        notes: row.get(13)?,
        created_at: row.get(14)?,
    })
}

/// Human-readable reference quoted in the bank transfer, not a security
/// token.
pub(crate) fn payment_reference() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_uppercase();

    format!("PLT-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}
