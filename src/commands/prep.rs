use std::collections::HashMap;

use chrono::Utc;
use tauri::{AppHandle, Emitter};

use crate::core::prep;
use crate::db::DatabaseExt;
use crate::error::AppResult;
use crate::models::{PrepSheet, PrepSheetWithItems};

#[tauri::command]
pub fn create_prep_sheet(
    app: AppHandle,
    bake_date: String,
    notes: Option<String>,
) -> AppResult<PrepSheet> {
    let db = app.db();
    let conn = db.connection()?;
    prep::create_sheet(&conn, &bake_date, notes.as_deref())
}

#[tauri::command]
pub fn get_prep_sheets(app: AppHandle) -> AppResult<Vec<PrepSheet>> {
    let db = app.db();
    let conn = db.connection()?;
    prep::list_sheets(&conn)
}

#[tauri::command]
pub fn get_prep_sheet(app: AppHandle, id: i64) -> AppResult<PrepSheetWithItems> {
    let db = app.db();
    let conn = db.connection()?;
    prep::get_sheet(&conn, id)
}

#[tauri::command]
pub fn add_order_to_sheet(
    app: AppHandle,
    sheet_id: i64,
    order_id: i64,
) -> AppResult<PrepSheetWithItems> {
    let db = app.db();
    let mut conn = db.connection()?;
    prep::add_order(&mut conn, sheet_id, order_id, Utc::now())
}

#[tauri::command]
pub fn remove_order_from_sheet(
    app: AppHandle,
    sheet_id: i64,
    order_id: i64,
) -> AppResult<PrepSheetWithItems> {
    let db = app.db();
    let mut conn = db.connection()?;
    prep::remove_order(&mut conn, sheet_id, order_id, Utc::now())
}

#[tauri::command]
pub fn add_extra(
    app: AppHandle,
    sheet_id: i64,
    flavor_id: i64,
    quantity: i64,
) -> AppResult<PrepSheetWithItems> {
    let db = app.db();
    let conn = db.connection()?;
    prep::add_extra(&conn, sheet_id, flavor_id, quantity)
}

#[tauri::command]
pub fn remove_extra(app: AppHandle, sheet_id: i64, item_id: i64) -> AppResult<PrepSheetWithItems> {
    let db = app.db();
    let conn = db.connection()?;
    prep::remove_extra(&conn, sheet_id, item_id)
}

#[tauri::command]
pub fn complete_prep_sheet(
    app: AppHandle,
    sheet_id: i64,
    actual_quantities: HashMap<i64, i64>,
    completed_by: Option<i64>,
) -> AppResult<PrepSheetWithItems> {
    let db = app.db();
    let mut conn = db.connection()?;

    let (sheet, ready) = prep::complete(&mut conn, sheet_id, &actual_quantities, completed_by, Utc::now())?;

    drop(conn);

    for order_id in ready {
        let _ = app.emit("order-ready", order_id);
    }

    Ok(sheet)
}

#[tauri::command]
pub fn delete_prep_sheet(app: AppHandle, sheet_id: i64) -> AppResult<()> {
    let db = app.db();
    let mut conn = db.connection()?;
    prep::delete_sheet(&mut conn, sheet_id, Utc::now())
}
