use tauri::AppHandle;

use crate::core::capacity;
use crate::db::DatabaseExt;
use crate::error::AppResult;
use crate::models::{BakeSlot, CreateBakeSlot};

#[tauri::command]
pub fn get_bake_slots(app: AppHandle) -> AppResult<Vec<BakeSlot>> {
    let db = app.db();
    let conn = db.connection()?;
    capacity::list_slots(&conn)
}

#[tauri::command]
pub fn get_bake_slot(app: AppHandle, id: i64) -> AppResult<BakeSlot> {
    let db = app.db();
    let conn = db.connection()?;
    capacity::get_slot(&conn, id)
}

#[tauri::command]
pub fn create_bake_slot(app: AppHandle, slot: CreateBakeSlot) -> AppResult<BakeSlot> {
    let db = app.db();
    let conn = db.connection()?;
    capacity::create_slot(&conn, &slot)
}

#[tauri::command]
pub fn set_slot_open(
    app: AppHandle,
    id: i64,
    open: bool,
    staff_id: Option<i64>,
) -> AppResult<BakeSlot> {
    let db = app.db();
    let conn = db.connection()?;
    capacity::set_open(&conn, id, open, staff_id)
}

#[tauri::command]
pub fn update_slot_capacity(app: AppHandle, id: i64, total_capacity: i64) -> AppResult<BakeSlot> {
    let db = app.db();
    let conn = db.connection()?;
    capacity::update_capacity(&conn, id, total_capacity)
}

#[tauri::command]
pub fn delete_bake_slot(app: AppHandle, id: i64) -> AppResult<()> {
    let db = app.db();
    let conn = db.connection()?;
    capacity::delete_slot(&conn, id)
}
