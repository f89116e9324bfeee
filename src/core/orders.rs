//! Order lifecycle: submission, scheduling, fulfillment and payment.
//!
//! `cutoff_passed` is never stored. A submitted order whose slot cutoff has
//! passed is presented as such at read time, which is why every read takes
//! the caller's clock.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::info;

use crate::core::capacity;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateOrder, Order, OrderItem, OrderStatus, OrderWithItems, PaymentStatus,
};

const ORDER_SELECT: &str = "SELECT o.id, o.customer_id, c.name, o.bake_slot_id, o.total_amount,
            o.status, o.payment_status, o.payment_method, o.admin_notes,
            o.created_at, o.updated_at, b.cutoff_at
     FROM orders o
     LEFT JOIN customers c ON o.customer_id = c.id
     JOIN bake_slots b ON o.bake_slot_id = b.id";

fn invalid_text(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        message.into(),
    )
}

fn order_from_row(row: &rusqlite::Row, now: DateTime<Utc>) -> rusqlite::Result<Order> {
    let status_text: String = row.get(5)?;
    let status = OrderStatus::parse(&status_text)
        .ok_or_else(|| invalid_text(5, format!("unknown order status '{status_text}'")))?;
    let payment_text: String = row.get(6)?;
    let payment_status = PaymentStatus::parse(&payment_text)
        .ok_or_else(|| invalid_text(6, format!("unknown payment status '{payment_text}'")))?;
    let cutoff_at: String = row.get(11)?;

    Ok(Order {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        customer_name: row.get(2)?,
        bake_slot_id: row.get(3)?,
        total_amount: row.get(4)?,
        status: presented_status(status, &cutoff_at, now),
        payment_status,
        payment_method: row.get(7)?,
        admin_notes: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn presented_status(status: OrderStatus, cutoff_at: &str, now: DateTime<Utc>) -> OrderStatus {
    if status == OrderStatus::Submitted && capacity::cutoff_has_passed(cutoff_at, now) {
        OrderStatus::CutoffPassed
    } else {
        status
    }
}

fn load_items(conn: &Connection, order_id: i64) -> AppResult<Vec<OrderItem>> {
    let mut stmt = conn.prepare(
        "SELECT oi.id, oi.order_id, oi.flavor_id, f.name, oi.size, oi.quantity,
                oi.unit_price, oi.total_price
         FROM order_items oi
         LEFT JOIN flavors f ON oi.flavor_id = f.id
         WHERE oi.order_id = ?1",
    )?;

    let items = stmt
        .query_map([order_id], |row| {
            Ok(OrderItem {
                id: row.get(0)?,
                order_id: row.get(1)?,
                flavor_id: row.get(2)?,
                flavor_name: row.get(3)?,
                size: row.get(4)?,
                quantity: row.get(5)?,
                unit_price: row.get(6)?,
                total_price: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

/// Stored (not presented) status, for transition checks.
fn stored_status(conn: &Connection, order_id: i64) -> AppResult<OrderStatus> {
    let text: String = conn
        .query_row("SELECT status FROM orders WHERE id = ?1", [order_id], |row| {
            row.get(0)
        })
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound("order"),
            other => other.into(),
        })?;

    OrderStatus::parse(&text)
        .ok_or_else(|| AppError::Internal(format!("unknown order status '{text}' in store")))
}

/// Submit a customer order. Prices and the total are resolved server-side;
/// nothing price-shaped is trusted from the caller. Capacity admission and
/// row creation share one transaction, so a rejected order leaves no trace.
pub fn submit_order(
    conn: &mut Connection,
    order: &CreateOrder,
    now: DateTime<Utc>,
) -> AppResult<OrderWithItems> {
    if order.items.is_empty() {
        return Err(AppError::Validation(
            "order must contain at least one item".to_string(),
        ));
    }
    for item in &order.items {
        if item.quantity < 1 {
            return Err(AppError::InvalidQuantity(format!(
                "item quantity must be at least 1, got {}",
                item.quantity
            )));
        }
    }

    let tx = conn.transaction()?;

    tx.query_row(
        "SELECT id FROM customers WHERE id = ?1",
        [order.customer_id],
        |row| row.get::<_, i64>(0),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::NotFound("customer"),
        other => other.into(),
    })?;

    // Resolve unit prices and recompute every line total
    let mut total_amount = 0.0;
    let mut total_quantity = 0;
    let mut priced: Vec<(i64, String, i64, f64)> = Vec::new();

    for item in &order.items {
        let price: f64 = tx
            .query_row(
                "SELECT fp.price FROM flavor_prices fp
                 JOIN flavors f ON fp.flavor_id = f.id
                 WHERE fp.flavor_id = ?1 AND fp.size = ?2 AND f.active = 1",
                rusqlite::params![item.flavor_id, item.size],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => AppError::Validation(format!(
                    "no price configured for flavor {} size '{}'",
                    item.flavor_id, item.size
                )),
                other => other.into(),
            })?;

        total_amount += price * item.quantity as f64;
        total_quantity += item.quantity;
        priced.push((item.flavor_id, item.size.clone(), item.quantity, price));
    }

    capacity::try_commit(&tx, order.bake_slot_id, total_quantity, now)?;

    let stamp = now.to_rfc3339();
    tx.execute(
        "INSERT INTO orders (customer_id, bake_slot_id, total_amount, status, payment_status, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'submitted', 'pending', ?4, ?4)",
        rusqlite::params![order.customer_id, order.bake_slot_id, total_amount, stamp],
    )?;

    let order_id = tx.last_insert_rowid();

    for (flavor_id, size, quantity, price) in priced {
        tx.execute(
            "INSERT INTO order_items (order_id, flavor_id, size, quantity, unit_price, total_price)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![order_id, flavor_id, size, quantity, price, price * quantity as f64],
        )?;
    }

    tx.commit()?;

    info!(order_id, total_quantity, "order submitted");

    get_order(conn, order_id, now)
}

pub fn get_order(conn: &Connection, order_id: i64, now: DateTime<Utc>) -> AppResult<OrderWithItems> {
    let order = conn
        .query_row(&format!("{ORDER_SELECT} WHERE o.id = ?1"), [order_id], |row| {
            order_from_row(row, now)
        })
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound("order"),
            other => other.into(),
        })?;

    let items = load_items(conn, order_id)?;

    Ok(OrderWithItems { order, items })
}

pub fn get_orders_for_date(
    conn: &Connection,
    date: &str,
    now: DateTime<Utc>,
) -> AppResult<Vec<OrderWithItems>> {
    let mut stmt = conn.prepare(&format!(
        "{ORDER_SELECT} WHERE b.date = ?1 ORDER BY o.created_at ASC"
    ))?;
    let orders = stmt
        .query_map([date], |row| order_from_row(row, now))?
        .collect::<Result<Vec<_>, _>>()?;

    orders
        .into_iter()
        .map(|order| {
            let items = load_items(conn, order.id)?;
            Ok(OrderWithItems { order, items })
        })
        .collect()
}

pub fn get_orders_for_slot(
    conn: &Connection,
    slot_id: i64,
    now: DateTime<Utc>,
) -> AppResult<Vec<OrderWithItems>> {
    let mut stmt = conn.prepare(&format!(
        "{ORDER_SELECT} WHERE o.bake_slot_id = ?1 ORDER BY o.created_at ASC"
    ))?;
    let orders = stmt
        .query_map([slot_id], |row| order_from_row(row, now))?
        .collect::<Result<Vec<_>, _>>()?;

    orders
        .into_iter()
        .map(|order| {
            let items = load_items(conn, order.id)?;
            Ok(OrderWithItems { order, items })
        })
        .collect()
}

/// Move a submitted order into production. Called by the prep sheet planner
/// inside its own transaction.
pub(crate) fn schedule(conn: &Connection, order_id: i64, now: DateTime<Utc>) -> AppResult<()> {
    let status = stored_status(conn, order_id)?;
    if status != OrderStatus::Submitted {
        return Err(AppError::OrderNotEligible(format!(
            "order {} is not in a schedulable state ({})",
            order_id,
            status.as_str()
        )));
    }

    conn.execute(
        "UPDATE orders SET status = 'in_production', updated_at = ?1 WHERE id = ?2",
        rusqlite::params![now.to_rfc3339(), order_id],
    )?;
    Ok(())
}

/// Revert a scheduled order when it is pulled off a draft sheet.
pub(crate) fn unschedule(conn: &Connection, order_id: i64, now: DateTime<Utc>) -> AppResult<()> {
    let status = stored_status(conn, order_id)?;
    if status == OrderStatus::InProduction {
        conn.execute(
            "UPDATE orders SET status = 'submitted', updated_at = ?1 WHERE id = ?2",
            rusqlite::params![now.to_rfc3339(), order_id],
        )?;
    }
    Ok(())
}

/// Mark an order baked on sheet completion. Returns whether the order
/// actually transitioned; an order canceled after scheduling is skipped
/// rather than resurrected.
pub(crate) fn mark_baked(conn: &Connection, order_id: i64, now: DateTime<Utc>) -> AppResult<bool> {
    let status = stored_status(conn, order_id)?;
    if status != OrderStatus::InProduction {
        return Ok(false);
    }

    conn.execute(
        "UPDATE orders SET status = 'ready', updated_at = ?1 WHERE id = ?2",
        rusqlite::params![now.to_rfc3339(), order_id],
    )?;
    Ok(true)
}

pub fn mark_picked_up(conn: &Connection, order_id: i64, now: DateTime<Utc>) -> AppResult<()> {
    let status = stored_status(conn, order_id)?;
    if status != OrderStatus::Ready {
        return Err(AppError::Validation(format!(
            "order is not ready for pickup ({})",
            status.as_str()
        )));
    }

    conn.execute(
        "UPDATE orders SET status = 'picked_up', updated_at = ?1 WHERE id = ?2",
        rusqlite::params![now.to_rfc3339(), order_id],
    )?;
    Ok(())
}

pub fn mark_no_show(conn: &Connection, order_id: i64, now: DateTime<Utc>) -> AppResult<()> {
    let status = stored_status(conn, order_id)?;
    if status.is_terminal() {
        return Err(AppError::Validation(format!(
            "order is already {}",
            status.as_str()
        )));
    }

    conn.execute(
        "UPDATE orders SET status = 'no_show', updated_at = ?1 WHERE id = ?2",
        rusqlite::params![now.to_rfc3339(), order_id],
    )?;
    Ok(())
}

/// Cancel an order. Cancellation is a status, not a removal. Capacity is
/// handed back only while the order was still unscheduled; once it is on a
/// prep sheet the loaves are being baked regardless.
pub fn cancel(conn: &mut Connection, order_id: i64, now: DateTime<Utc>) -> AppResult<()> {
    let tx = conn.transaction()?;

    let status = stored_status(&tx, order_id)?;
    if status.is_terminal() {
        return Err(AppError::Validation(format!(
            "order is already {}",
            status.as_str()
        )));
    }

    tx.execute(
        "UPDATE orders SET status = 'canceled', updated_at = ?1 WHERE id = ?2",
        rusqlite::params![now.to_rfc3339(), order_id],
    )?;

    if status == OrderStatus::Submitted {
        let (slot_id, quantity): (i64, i64) = tx.query_row(
            "SELECT o.bake_slot_id, COALESCE(SUM(oi.quantity), 0)
             FROM orders o
             LEFT JOIN order_items oi ON oi.order_id = o.id
             WHERE o.id = ?1",
            [order_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        if quantity > 0 {
            capacity::release(&tx, slot_id, quantity)?;
        }
    }

    tx.commit()?;

    info!(order_id, "order canceled");

    Ok(())
}

/// Payment is a parallel attribute, not a lifecycle state. Last writer wins;
/// both the order view and the production view call through here.
pub fn set_payment(
    conn: &Connection,
    order_id: i64,
    payment_status: PaymentStatus,
    payment_method: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let changed = conn.execute(
        "UPDATE orders SET payment_status = ?1, payment_method = ?2, updated_at = ?3 WHERE id = ?4",
        rusqlite::params![payment_status.as_str(), payment_method, now.to_rfc3339(), order_id],
    )?;

    if changed == 0 {
        return Err(AppError::NotFound("order"));
    }
    Ok(())
}

pub fn update_admin_notes(
    conn: &Connection,
    order_id: i64,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let changed = conn.execute(
        "UPDATE orders SET admin_notes = ?1, updated_at = ?2 WHERE id = ?3",
        rusqlite::params![notes, now.to_rfc3339(), order_id],
    )?;

    if changed == 0 {
        return Err(AppError::NotFound("order"));
    }
    Ok(())
}
