use chrono::Utc;
use tauri::{AppHandle, Emitter};

use crate::core::orders;
use crate::db::DatabaseExt;
use crate::error::AppResult;
use crate::models::{CreateOrder, OrderWithItems, PaymentStatus};

#[tauri::command]
pub fn submit_order(app: AppHandle, order: CreateOrder) -> AppResult<OrderWithItems> {
    let db = app.db();
    let mut conn = db.connection()?;

    let created = orders::submit_order(&mut conn, &order, Utc::now())?;

    drop(conn);

    // Notification dispatch listens for this; delivery is not our problem
    let _ = app.emit("order-submitted", &created);

    Ok(created)
}

#[tauri::command]
pub fn get_order(app: AppHandle, id: i64) -> AppResult<OrderWithItems> {
    let db = app.db();
    let conn = db.connection()?;
    orders::get_order(&conn, id, Utc::now())
}

#[tauri::command]
pub fn get_orders_for_date(app: AppHandle, date: String) -> AppResult<Vec<OrderWithItems>> {
    let db = app.db();
    let conn = db.connection()?;
    orders::get_orders_for_date(&conn, &date, Utc::now())
}

#[tauri::command]
pub fn get_orders_for_slot(app: AppHandle, slot_id: i64) -> AppResult<Vec<OrderWithItems>> {
    let db = app.db();
    let conn = db.connection()?;
    orders::get_orders_for_slot(&conn, slot_id, Utc::now())
}

#[tauri::command]
pub fn mark_picked_up(app: AppHandle, order_id: i64) -> AppResult<OrderWithItems> {
    let db = app.db();
    let conn = db.connection()?;
    let now = Utc::now();
    orders::mark_picked_up(&conn, order_id, now)?;
    orders::get_order(&conn, order_id, now)
}

#[tauri::command]
pub fn mark_no_show(app: AppHandle, order_id: i64) -> AppResult<OrderWithItems> {
    let db = app.db();
    let conn = db.connection()?;
    let now = Utc::now();
    orders::mark_no_show(&conn, order_id, now)?;
    orders::get_order(&conn, order_id, now)
}

#[tauri::command]
pub fn cancel_order(app: AppHandle, order_id: i64) -> AppResult<OrderWithItems> {
    let db = app.db();
    let mut conn = db.connection()?;
    let now = Utc::now();
    orders::cancel(&mut conn, order_id, now)?;
    orders::get_order(&conn, order_id, now)
}

#[tauri::command]
pub fn update_order_payment(
    app: AppHandle,
    order_id: i64,
    payment_status: PaymentStatus,
    payment_method: Option<String>,
) -> AppResult<OrderWithItems> {
    let db = app.db();
    let conn = db.connection()?;
    let now = Utc::now();
    orders::set_payment(&conn, order_id, payment_status, payment_method.as_deref(), now)?;
    orders::get_order(&conn, order_id, now)
}

#[tauri::command]
pub fn update_admin_notes(
    app: AppHandle,
    order_id: i64,
    notes: Option<String>,
) -> AppResult<OrderWithItems> {
    let db = app.db();
    let conn = db.connection()?;
    let now = Utc::now();
    orders::update_admin_notes(&conn, order_id, notes.as_deref(), now)?;
    orders::get_order(&conn, order_id, now)
}
