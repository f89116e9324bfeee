//! Capacity ledger: the sole gate for committing loaves against a bake slot.
//!
//! All writers share one connection mutex, and the increment itself carries
//! the capacity predicate, so `current_orders` can never exceed
//! `total_capacity`.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::models::{BakeSlot, Commit, CreateBakeSlot, Release};

const SLOT_SELECT: &str = "SELECT b.id, b.date, b.location_id, l.name, b.total_capacity,
            b.current_orders, b.cutoff_at, b.is_open, b.manually_closed_by
     FROM bake_slots b
     LEFT JOIN locations l ON b.location_id = l.id";

fn slot_from_row(row: &rusqlite::Row) -> rusqlite::Result<BakeSlot> {
    Ok(BakeSlot {
        id: row.get(0)?,
        date: row.get(1)?,
        location_id: row.get(2)?,
        location_name: row.get(3)?,
        total_capacity: row.get(4)?,
        current_orders: row.get(5)?,
        cutoff_at: row.get(6)?,
        is_open: row.get::<_, i64>(7)? != 0,
        manually_closed_by: row.get(8)?,
    })
}

pub fn get_slot(conn: &Connection, slot_id: i64) -> AppResult<BakeSlot> {
    conn.query_row(&format!("{SLOT_SELECT} WHERE b.id = ?1"), [slot_id], |row| {
        slot_from_row(row)
    })
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::SlotNotFound,
        other => other.into(),
    })
}

pub fn list_slots(conn: &Connection) -> AppResult<Vec<BakeSlot>> {
    let mut stmt = conn.prepare(&format!("{SLOT_SELECT} ORDER BY b.date ASC"))?;
    let slots = stmt
        .query_map([], |row| slot_from_row(row))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(slots)
}

/// True once new orders must be rejected for this cutoff timestamp.
/// A malformed timestamp counts as passed rather than silently open.
pub(crate) fn cutoff_has_passed(cutoff_at: &str, now: DateTime<Utc>) -> bool {
    match DateTime::parse_from_rfc3339(cutoff_at) {
        Ok(cutoff) => now > cutoff,
        Err(_) => true,
    }
}

fn is_closed(slot: &BakeSlot, now: DateTime<Utc>) -> bool {
    if !slot.is_open || slot.manually_closed_by.is_some() {
        return true;
    }
    if cutoff_has_passed(&slot.cutoff_at, now) {
        return true;
    }
    match NaiveDate::parse_from_str(&slot.date, "%Y-%m-%d") {
        Ok(date) => date < now.date_naive(),
        Err(_) => true,
    }
}

/// Atomically admit `quantity` loaves against a slot. Runs inside the
/// caller's transaction when order creation must succeed or fail with it.
pub fn try_commit(
    conn: &Connection,
    slot_id: i64,
    quantity: i64,
    now: DateTime<Utc>,
) -> AppResult<Commit> {
    if quantity < 1 {
        return Err(AppError::InvalidQuantity(
            "commit quantity must be at least 1".to_string(),
        ));
    }

    let slot = get_slot(conn, slot_id)?;

    if is_closed(&slot, now) {
        return Err(AppError::SlotClosed);
    }

    // The predicate rides on the UPDATE so the invariant holds even if the
    // read above raced another committer.
    let changed = conn.execute(
        "UPDATE bake_slots
         SET current_orders = current_orders + ?1
         WHERE id = ?2 AND current_orders + ?1 <= total_capacity",
        rusqlite::params![quantity, slot_id],
    )?;

    if changed == 0 {
        return Err(AppError::CapacityExceeded {
            remaining: slot.remaining(),
        });
    }

    Ok(Commit {
        remaining: slot.remaining() - quantity,
    })
}

/// Hand back committed capacity, clamping at zero. Underflow is reported,
/// not fatal: the order being released still goes through.
pub fn release(conn: &Connection, slot_id: i64, quantity: i64) -> AppResult<Release> {
    if quantity < 1 {
        return Err(AppError::InvalidQuantity(
            "release quantity must be at least 1".to_string(),
        ));
    }

    let slot = get_slot(conn, slot_id)?;

    let underflow = quantity > slot.current_orders;
    let decrement = quantity.min(slot.current_orders);

    conn.execute(
        "UPDATE bake_slots SET current_orders = current_orders - ?1 WHERE id = ?2",
        rusqlite::params![decrement, slot_id],
    )?;

    if underflow {
        warn!(
            slot_id,
            requested = quantity,
            held = slot.current_orders,
            "capacity release clamped at zero"
        );
    }

    Ok(Release {
        remaining: slot.total_capacity - (slot.current_orders - decrement),
        underflow,
    })
}

pub fn create_slot(conn: &Connection, slot: &CreateBakeSlot) -> AppResult<BakeSlot> {
    if NaiveDate::parse_from_str(&slot.date, "%Y-%m-%d").is_err() {
        return Err(AppError::Validation(format!(
            "invalid bake date '{}', expected YYYY-MM-DD",
            slot.date
        )));
    }
    if DateTime::parse_from_rfc3339(&slot.cutoff_at).is_err() {
        return Err(AppError::Validation(format!(
            "invalid cutoff timestamp '{}', expected RFC 3339",
            slot.cutoff_at
        )));
    }
    if slot.total_capacity < 0 {
        return Err(AppError::Validation(
            "total capacity cannot be negative".to_string(),
        ));
    }

    conn.execute(
        "INSERT INTO bake_slots (date, location_id, total_capacity, cutoff_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![slot.date, slot.location_id, slot.total_capacity, slot.cutoff_at],
    )?;

    get_slot(conn, conn.last_insert_rowid())
}

/// Manual open/close. Closing records who closed it; reopening clears that.
pub fn set_open(
    conn: &Connection,
    slot_id: i64,
    open: bool,
    staff_id: Option<i64>,
) -> AppResult<BakeSlot> {
    get_slot(conn, slot_id)?;

    if open {
        conn.execute(
            "UPDATE bake_slots SET is_open = 1, manually_closed_by = NULL WHERE id = ?1",
            [slot_id],
        )?;
    } else {
        conn.execute(
            "UPDATE bake_slots SET is_open = 0, manually_closed_by = ?1 WHERE id = ?2",
            rusqlite::params![staff_id, slot_id],
        )?;
    }

    get_slot(conn, slot_id)
}

pub fn update_capacity(conn: &Connection, slot_id: i64, total_capacity: i64) -> AppResult<BakeSlot> {
    let slot = get_slot(conn, slot_id)?;

    if total_capacity < slot.current_orders {
        return Err(AppError::Validation(format!(
            "cannot lower capacity below the {} loaves already committed",
            slot.current_orders
        )));
    }

    conn.execute(
        "UPDATE bake_slots SET total_capacity = ?1 WHERE id = ?2",
        rusqlite::params![total_capacity, slot_id],
    )?;

    get_slot(conn, slot_id)
}

/// Slots stay around while any order references them.
pub fn delete_slot(conn: &Connection, slot_id: i64) -> AppResult<()> {
    get_slot(conn, slot_id)?;

    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM orders WHERE bake_slot_id = ?1",
        [slot_id],
        |row| row.get(0),
    )?;

    if count > 0 {
        return Err(AppError::Validation(
            "cannot delete a bake slot with existing orders".to_string(),
        ));
    }

    conn.execute("DELETE FROM bake_slots WHERE id = ?1", [slot_id])?;

    Ok(())
}
