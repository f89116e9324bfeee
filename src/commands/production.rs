use chrono::Utc;
use tauri::AppHandle;

use crate::core::{orders, production};
use crate::db::DatabaseExt;
use crate::error::AppResult;
use crate::models::{
    Disposition, OrderWithItems, PaymentStatus, ProductionRecord, UpdateProductionRecord,
};

#[tauri::command]
pub fn get_production_records(
    app: AppHandle,
    bake_date: Option<String>,
) -> AppResult<Vec<ProductionRecord>> {
    let db = app.db();
    let conn = db.connection()?;
    production::list_records(&conn, bake_date.as_deref())
}

#[tauri::command]
pub fn get_sheet_production(app: AppHandle, sheet_id: i64) -> AppResult<Vec<ProductionRecord>> {
    let db = app.db();
    let conn = db.connection()?;
    production::records_for_sheet(&conn, sheet_id)
}

#[tauri::command]
pub fn update_production_record(
    app: AppHandle,
    record_id: i64,
    update: UpdateProductionRecord,
) -> AppResult<ProductionRecord> {
    let db = app.db();
    let conn = db.connection()?;
    production::update_record(&conn, record_id, &update)
}

#[tauri::command]
pub fn split_production_record(
    app: AppHandle,
    record_id: i64,
    split_quantity: i64,
    new_status: Disposition,
) -> AppResult<ProductionRecord> {
    let db = app.db();
    let mut conn = db.connection()?;
    production::split_record(&mut conn, record_id, split_quantity, new_status)
}

/// Payment settled at the point of physical pickup, from the production view.
#[tauri::command]
pub fn update_payment_at_pickup(
    app: AppHandle,
    order_id: i64,
    payment_status: PaymentStatus,
    payment_method: Option<String>,
) -> AppResult<OrderWithItems> {
    let db = app.db();
    let conn = db.connection()?;
    let now = Utc::now();
    production::update_order_payment(
        &conn,
        order_id,
        payment_status,
        payment_method.as_deref(),
        now,
    )?;
    orders::get_order(&conn, order_id, now)
}
