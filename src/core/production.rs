//! Production ledger: the system of record for every baked batch and what
//! became of it. Records are created only by prep sheet completion and by
//! splitting; they are never merged back together.

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::core::orders;
use crate::error::{AppError, AppResult};
use crate::models::{Disposition, PaymentStatus, ProductionRecord, UpdateProductionRecord};

const RECORD_SELECT: &str = "SELECT r.id, r.prep_sheet_id, r.order_id, r.flavor_id, f.name,
            r.quantity, r.status, r.sale_price, r.notes, r.bake_date
     FROM production_records r
     LEFT JOIN flavors f ON r.flavor_id = f.id";

fn record_from_row(row: &rusqlite::Row) -> rusqlite::Result<ProductionRecord> {
    let status_text: String = row.get(6)?;
    let status = Disposition::parse(&status_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            format!("unknown disposition '{status_text}'").into(),
        )
    })?;

    Ok(ProductionRecord {
        id: row.get(0)?,
        prep_sheet_id: row.get(1)?,
        order_id: row.get(2)?,
        flavor_id: row.get(3)?,
        flavor_name: row.get(4)?,
        quantity: row.get(5)?,
        status,
        sale_price: row.get(7)?,
        notes: row.get(8)?,
        bake_date: row.get(9)?,
    })
}

pub fn get_record(conn: &Connection, record_id: i64) -> AppResult<ProductionRecord> {
    conn.query_row(
        &format!("{RECORD_SELECT} WHERE r.id = ?1"),
        [record_id],
        |row| record_from_row(row),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::NotFound("production record"),
        other => other.into(),
    })
}

pub fn list_records(conn: &Connection, bake_date: Option<&str>) -> AppResult<Vec<ProductionRecord>> {
    let records = match bake_date {
        Some(date) => {
            let mut stmt = conn.prepare(&format!(
                "{RECORD_SELECT} WHERE r.bake_date = ?1 ORDER BY r.id ASC"
            ))?;
            let rows = stmt
                .query_map([date], |row| record_from_row(row))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt =
                conn.prepare(&format!("{RECORD_SELECT} ORDER BY r.bake_date DESC, r.id ASC"))?;
            let rows = stmt
                .query_map([], |row| record_from_row(row))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
    };

    Ok(records)
}

pub fn records_for_sheet(conn: &Connection, sheet_id: i64) -> AppResult<Vec<ProductionRecord>> {
    let mut stmt = conn.prepare(&format!(
        "{RECORD_SELECT} WHERE r.prep_sheet_id = ?1 ORDER BY r.id ASC"
    ))?;
    let records = stmt
        .query_map([sheet_id], |row| record_from_row(row))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Edit a record's disposition. There is no transition graph: staff correct
/// outcomes after the fact, so any disposition may follow any other. A sale
/// price is required exactly when the record is sold, cleared otherwise.
pub fn update_record(
    conn: &Connection,
    record_id: i64,
    update: &UpdateProductionRecord,
) -> AppResult<ProductionRecord> {
    get_record(conn, record_id)?;

    let sale_price = if update.status == Disposition::Sold {
        let price = update.sale_price.ok_or_else(|| {
            AppError::Validation("sale price is required when marking a record sold".to_string())
        })?;
        if price < 0.0 {
            return Err(AppError::Validation(
                "sale price cannot be negative".to_string(),
            ));
        }
        Some(price)
    } else {
        None
    };

    conn.execute(
        "UPDATE production_records SET status = ?1, sale_price = ?2, notes = ?3 WHERE id = ?4",
        rusqlite::params![update.status.as_str(), sale_price, update.notes, record_id],
    )?;

    get_record(conn, record_id)
}

/// Split a record in two, conserving total quantity: the original keeps
/// `quantity - split_quantity`, the new record takes `split_quantity` with
/// the given disposition and the same lineage (sheet, order, flavor, date).
pub fn split_record(
    conn: &mut Connection,
    record_id: i64,
    split_quantity: i64,
    new_status: Disposition,
) -> AppResult<ProductionRecord> {
    let tx = conn.transaction()?;

    let original = get_record(&tx, record_id)?;

    if split_quantity < 1 || split_quantity >= original.quantity {
        return Err(AppError::InvalidSplit(format!(
            "split quantity must be between 1 and {}, got {}",
            original.quantity - 1,
            split_quantity
        )));
    }

    tx.execute(
        "UPDATE production_records SET quantity = quantity - ?1 WHERE id = ?2",
        rusqlite::params![split_quantity, record_id],
    )?;

    tx.execute(
        "INSERT INTO production_records (prep_sheet_id, order_id, flavor_id, quantity, status, bake_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            original.prep_sheet_id,
            original.order_id,
            original.flavor_id,
            split_quantity,
            new_status.as_str(),
            original.bake_date
        ],
    )?;

    let new_id = tx.last_insert_rowid();

    tx.commit()?;

    get_record(conn, new_id)
}

/// Write-through to the originating order's payment fields, so staff can
/// settle payment at the point of physical pickup. Same mutation as the
/// order view's own setter, no extra rule.
pub fn update_order_payment(
    conn: &Connection,
    order_id: i64,
    payment_status: PaymentStatus,
    payment_method: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    orders::set_payment(conn, order_id, payment_status, payment_method, now)
}
