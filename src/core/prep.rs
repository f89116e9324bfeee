//! Prep sheet planner: one draft planning document per bake date, fed by
//! eligible orders and ad-hoc extras, materialized into production records
//! on completion.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use tracing::info;

use crate::core::orders;
use crate::error::{AppError, AppResult};
use crate::models::{PrepSheet, PrepSheetItem, PrepSheetWithItems, SheetStatus};

fn sheet_from_row(row: &rusqlite::Row) -> rusqlite::Result<PrepSheet> {
    let status_text: String = row.get(2)?;
    let status = SheetStatus::parse(&status_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown sheet status '{status_text}'").into(),
        )
    })?;

    Ok(PrepSheet {
        id: row.get(0)?,
        bake_date: row.get(1)?,
        status,
        notes: row.get(3)?,
        completed_at: row.get(4)?,
        completed_by: row.get(5)?,
    })
}

fn sheet_row(conn: &Connection, sheet_id: i64) -> AppResult<PrepSheet> {
    conn.query_row(
        "SELECT id, bake_date, status, notes, completed_at, completed_by
         FROM prep_sheets WHERE id = ?1",
        [sheet_id],
        |row| sheet_from_row(row),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::NotFound("prep sheet"),
        other => other.into(),
    })
}

fn require_draft(sheet: &PrepSheet) -> AppResult<()> {
    if sheet.status != SheetStatus::Draft {
        return Err(AppError::SheetNotDraft);
    }
    Ok(())
}

fn load_items(conn: &Connection, sheet_id: i64) -> AppResult<Vec<PrepSheetItem>> {
    let mut stmt = conn.prepare(
        "SELECT i.id, i.prep_sheet_id, i.order_id, i.flavor_id, f.name,
                i.planned_quantity, i.actual_quantity
         FROM prep_sheet_items i
         LEFT JOIN flavors f ON i.flavor_id = f.id
         WHERE i.prep_sheet_id = ?1
         ORDER BY i.id ASC",
    )?;

    let items = stmt
        .query_map([sheet_id], |row| {
            Ok(PrepSheetItem {
                id: row.get(0)?,
                prep_sheet_id: row.get(1)?,
                order_id: row.get(2)?,
                flavor_id: row.get(3)?,
                flavor_name: row.get(4)?,
                planned_quantity: row.get(5)?,
                actual_quantity: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

pub fn get_sheet(conn: &Connection, sheet_id: i64) -> AppResult<PrepSheetWithItems> {
    let sheet = sheet_row(conn, sheet_id)?;
    let items = load_items(conn, sheet_id)?;
    Ok(PrepSheetWithItems { sheet, items })
}

pub fn list_sheets(conn: &Connection) -> AppResult<Vec<PrepSheet>> {
    let mut stmt = conn.prepare(
        "SELECT id, bake_date, status, notes, completed_at, completed_by
         FROM prep_sheets ORDER BY bake_date DESC, id DESC",
    )?;
    let sheets = stmt
        .query_map([], |row| sheet_from_row(row))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sheets)
}

/// Create a draft sheet. At most one draft may exist per bake date.
pub fn create_sheet(
    conn: &Connection,
    bake_date: &str,
    notes: Option<&str>,
) -> AppResult<PrepSheet> {
    if NaiveDate::parse_from_str(bake_date, "%Y-%m-%d").is_err() {
        return Err(AppError::Validation(format!(
            "invalid bake date '{bake_date}', expected YYYY-MM-DD"
        )));
    }

    let existing: i64 = conn.query_row(
        "SELECT COUNT(*) FROM prep_sheets WHERE bake_date = ?1 AND status = 'draft'",
        [bake_date],
        |row| row.get(0),
    )?;
    if existing > 0 {
        return Err(AppError::DuplicateActiveSheet);
    }

    conn.execute(
        "INSERT INTO prep_sheets (bake_date, status, notes) VALUES (?1, 'draft', ?2)",
        rusqlite::params![bake_date, notes],
    )?;

    sheet_row(conn, conn.last_insert_rowid())
}

/// Pull a submitted order onto a draft sheet: one item per order item, and
/// the order moves to `in_production`.
pub fn add_order(
    conn: &mut Connection,
    sheet_id: i64,
    order_id: i64,
    now: DateTime<Utc>,
) -> AppResult<PrepSheetWithItems> {
    let tx = conn.transaction()?;

    let sheet = sheet_row(&tx, sheet_id)?;
    require_draft(&sheet)?;

    let slot_date: String = tx
        .query_row(
            "SELECT b.date FROM orders o JOIN bake_slots b ON o.bake_slot_id = b.id
             WHERE o.id = ?1",
            [order_id],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound("order"),
            other => other.into(),
        })?;

    if slot_date != sheet.bake_date {
        return Err(AppError::OrderNotEligible(format!(
            "order pickup date {} does not match sheet bake date {}",
            slot_date, sheet.bake_date
        )));
    }

    // schedule() rejects anything not in `submitted`, which also covers an
    // order already sitting on another sheet.
    orders::schedule(&tx, order_id, now)?;

    let inserted = tx.execute(
        "INSERT INTO prep_sheet_items (prep_sheet_id, order_id, flavor_id, planned_quantity)
         SELECT ?1, order_id, flavor_id, quantity FROM order_items WHERE order_id = ?2",
        rusqlite::params![sheet_id, order_id],
    )?;

    if inserted == 0 {
        return Err(AppError::OrderNotEligible(format!(
            "order {order_id} has no items"
        )));
    }

    tx.commit()?;

    get_sheet(conn, sheet_id)
}

/// Drop an order's items from a draft sheet and hand the order back to the
/// submitted pool. Capacity is untouched; it was committed at submission.
pub fn remove_order(
    conn: &mut Connection,
    sheet_id: i64,
    order_id: i64,
    now: DateTime<Utc>,
) -> AppResult<PrepSheetWithItems> {
    let tx = conn.transaction()?;

    let sheet = sheet_row(&tx, sheet_id)?;
    require_draft(&sheet)?;

    let removed = tx.execute(
        "DELETE FROM prep_sheet_items WHERE prep_sheet_id = ?1 AND order_id = ?2",
        rusqlite::params![sheet_id, order_id],
    )?;
    if removed == 0 {
        return Err(AppError::NotFound("order on this sheet"));
    }

    orders::unschedule(&tx, order_id, now)?;

    tx.commit()?;

    get_sheet(conn, sheet_id)
}

/// Add planned loaves not tied to any customer order.
pub fn add_extra(
    conn: &Connection,
    sheet_id: i64,
    flavor_id: i64,
    quantity: i64,
) -> AppResult<PrepSheetWithItems> {
    let sheet = sheet_row(conn, sheet_id)?;
    require_draft(&sheet)?;

    if quantity < 1 {
        return Err(AppError::InvalidQuantity(
            "extra quantity must be at least 1".to_string(),
        ));
    }

    conn.query_row("SELECT id FROM flavors WHERE id = ?1", [flavor_id], |row| {
        row.get::<_, i64>(0)
    })
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::NotFound("flavor"),
        other => other.into(),
    })?;

    conn.execute(
        "INSERT INTO prep_sheet_items (prep_sheet_id, order_id, flavor_id, planned_quantity)
         VALUES (?1, NULL, ?2, ?3)",
        rusqlite::params![sheet_id, flavor_id, quantity],
    )?;

    get_sheet(conn, sheet_id)
}

pub fn remove_extra(conn: &Connection, sheet_id: i64, item_id: i64) -> AppResult<PrepSheetWithItems> {
    let sheet = sheet_row(conn, sheet_id)?;
    require_draft(&sheet)?;

    let order_id: Option<i64> = conn
        .query_row(
            "SELECT order_id FROM prep_sheet_items WHERE id = ?1 AND prep_sheet_id = ?2",
            rusqlite::params![item_id, sheet_id],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound("prep sheet item"),
            other => other.into(),
        })?;

    if order_id.is_some() {
        return Err(AppError::Validation(
            "item belongs to a customer order; remove the order instead".to_string(),
        ));
    }

    conn.execute("DELETE FROM prep_sheet_items WHERE id = ?1", [item_id])?;

    get_sheet(conn, sheet_id)
}

/// Complete a draft sheet: freeze the item set, materialize one production
/// record per item and mark every still-scheduled order baked.
///
/// This is the one transactional boundary of the pipeline. Everything below
/// runs in a single SQLite transaction; any failure rolls the sheet back to
/// draft with no orphan records. Returns the ids of the orders that became
/// ready so the caller can notify.
pub fn complete(
    conn: &mut Connection,
    sheet_id: i64,
    actual_quantities: &HashMap<i64, i64>,
    completed_by: Option<i64>,
    now: DateTime<Utc>,
) -> AppResult<(PrepSheetWithItems, Vec<i64>)> {
    let tx = conn.transaction()?;

    let sheet = sheet_row(&tx, sheet_id)?;
    require_draft(&sheet)?;

    let items = load_items(&tx, sheet_id)?;
    if items.is_empty() {
        return Err(AppError::EmptySheet);
    }

    // Resolve every actual up front so validation cannot half-apply
    let mut resolved: Vec<(i64, i64)> = Vec::with_capacity(items.len());
    for item in &items {
        let actual = *actual_quantities.get(&item.id).unwrap_or(&item.planned_quantity);
        if actual < 0 {
            return Err(AppError::InvalidQuantity(format!(
                "actual quantity for item {} cannot be negative",
                item.id
            )));
        }
        resolved.push((item.id, actual));
    }

    for (item, &(_, actual)) in items.iter().zip(resolved.iter()) {
        tx.execute(
            "UPDATE prep_sheet_items SET actual_quantity = ?1 WHERE id = ?2",
            rusqlite::params![actual, item.id],
        )?;

        tx.execute(
            "INSERT INTO production_records (prep_sheet_id, order_id, flavor_id, quantity, status, bake_date)
             VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
            rusqlite::params![sheet_id, item.order_id, item.flavor_id, actual, sheet.bake_date],
        )?;
    }

    let mut order_ids: Vec<i64> = Vec::new();
    for item in &items {
        if let Some(order_id) = item.order_id {
            if !order_ids.contains(&order_id) {
                order_ids.push(order_id);
            }
        }
    }

    let mut ready: Vec<i64> = Vec::new();
    for order_id in order_ids {
        if orders::mark_baked(&tx, order_id, now)? {
            ready.push(order_id);
        }
    }

    tx.execute(
        "UPDATE prep_sheets SET status = 'completed', completed_at = ?1, completed_by = ?2
         WHERE id = ?3",
        rusqlite::params![now.to_rfc3339(), completed_by, sheet_id],
    )?;

    tx.commit()?;

    info!(sheet_id, orders_ready = ready.len(), "prep sheet completed");

    Ok((get_sheet(conn, sheet_id)?, ready))
}

/// Delete a draft sheet, reverting its scheduled orders. Completed sheets
/// are history and stay. Capacity is untouched.
pub fn delete_sheet(conn: &mut Connection, sheet_id: i64, now: DateTime<Utc>) -> AppResult<()> {
    let tx = conn.transaction()?;

    let sheet = sheet_row(&tx, sheet_id)?;
    require_draft(&sheet)?;

    let items = load_items(&tx, sheet_id)?;
    let mut order_ids: Vec<i64> = Vec::new();
    for item in &items {
        if let Some(order_id) = item.order_id {
            if !order_ids.contains(&order_id) {
                order_ids.push(order_id);
            }
        }
    }

    for order_id in order_ids {
        orders::unschedule(&tx, order_id, now)?;
    }

    tx.execute(
        "DELETE FROM prep_sheet_items WHERE prep_sheet_id = ?1",
        [sheet_id],
    )?;
    tx.execute("DELETE FROM prep_sheets WHERE id = ?1", [sheet_id])?;

    tx.commit()?;

    Ok(())
}
