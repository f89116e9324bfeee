use rusqlite::{Connection, Result};
use std::path::PathBuf;
use std::sync::Mutex;
use tauri::AppHandle;

use crate::error::{AppError, AppResult};

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn new(app_handle: &AppHandle) -> Result<Self> {
        let app_dir = app_handle
            .path()
            .app_data_dir()
            .expect("Failed to get app data dir");

        std::fs::create_dir_all(&app_dir).expect("Failed to create app data directory");

        let db_path: PathBuf = app_dir.join("bakehouse.db");
        Self::open(db_path)
    }

    pub fn open(db_path: PathBuf) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the shared connection for a command. All writers serialize here.
    pub fn connection(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database lock poisoned".to_string()))
    }

    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        init_schema(&conn)?;

        // Run migrations for existing databases (pass connection to avoid deadlock)
        Self::migrate_conn(&conn)?;

        Ok(())
    }

    fn migrate_conn(conn: &Connection) -> Result<()> {
        // Older databases predate payment metadata and manual slot closing
        let order_columns: Vec<String> = conn
            .prepare("PRAGMA table_info(orders)")?
            .query_map([], |row| row.get::<_, String>(1))?
            .filter_map(|r| r.ok())
            .collect();

        if !order_columns.contains(&"payment_method".to_string()) {
            conn.execute("ALTER TABLE orders ADD COLUMN payment_method TEXT", [])?;
        }
        if !order_columns.contains(&"admin_notes".to_string()) {
            conn.execute("ALTER TABLE orders ADD COLUMN admin_notes TEXT", [])?;
        }

        let slot_columns: Vec<String> = conn
            .prepare("PRAGMA table_info(bake_slots)")?
            .query_map([], |row| row.get::<_, String>(1))?
            .filter_map(|r| r.ok())
            .collect();

        if !slot_columns.contains(&"manually_closed_by".to_string()) {
            conn.execute(
                "ALTER TABLE bake_slots ADD COLUMN manually_closed_by INTEGER",
                [],
            )?;
        }

        Ok(())
    }
}

/// Create the full schema. Shared with the test suite so tests exercise the
/// same tables production uses.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Pickup locations
        CREATE TABLE IF NOT EXISTS locations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );

        -- Customers placing pre-orders
        CREATE TABLE IF NOT EXISTS customers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            phone TEXT,
            email TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Staff members (referenced by manual closes and sheet completion)
        CREATE TABLE IF NOT EXISTS staff (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Bread flavors on offer
        CREATE TABLE IF NOT EXISTS flavors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            active INTEGER NOT NULL DEFAULT 1
        );

        -- Unit prices per flavor and size
        CREATE TABLE IF NOT EXISTS flavor_prices (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            flavor_id INTEGER NOT NULL,
            size TEXT NOT NULL,
            price REAL NOT NULL,
            UNIQUE (flavor_id, size),
            FOREIGN KEY (flavor_id) REFERENCES flavors(id)
        );

        -- Recipe ingredients, amounts for a reference batch of one loaf
        CREATE TABLE IF NOT EXISTS recipe_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            flavor_id INTEGER NOT NULL,
            section TEXT NOT NULL,
            name TEXT NOT NULL,
            unit TEXT NOT NULL,
            amount REAL NOT NULL,
            FOREIGN KEY (flavor_id) REFERENCES flavors(id)
        );

        -- Ordered instruction steps, durations are per batch
        CREATE TABLE IF NOT EXISTS recipe_steps (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            flavor_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            instruction TEXT NOT NULL,
            duration_minutes INTEGER,
            FOREIGN KEY (flavor_id) REFERENCES flavors(id)
        );

        -- Capacity-limited bake dates
        CREATE TABLE IF NOT EXISTS bake_slots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            location_id INTEGER,
            total_capacity INTEGER NOT NULL,
            current_orders INTEGER NOT NULL DEFAULT 0,
            cutoff_at TEXT NOT NULL,
            is_open INTEGER NOT NULL DEFAULT 1,
            manually_closed_by INTEGER,
            FOREIGN KEY (location_id) REFERENCES locations(id),
            FOREIGN KEY (manually_closed_by) REFERENCES staff(id)
        );

        -- Customer pre-orders
        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER NOT NULL,
            bake_slot_id INTEGER NOT NULL,
            total_amount REAL NOT NULL,
            status TEXT NOT NULL DEFAULT 'submitted',
            payment_status TEXT NOT NULL DEFAULT 'pending',
            payment_method TEXT,
            admin_notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (customer_id) REFERENCES customers(id),
            FOREIGN KEY (bake_slot_id) REFERENCES bake_slots(id)
        );

        CREATE TABLE IF NOT EXISTS order_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER NOT NULL,
            flavor_id INTEGER NOT NULL,
            size TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            unit_price REAL NOT NULL,
            total_price REAL NOT NULL,
            FOREIGN KEY (order_id) REFERENCES orders(id),
            FOREIGN KEY (flavor_id) REFERENCES flavors(id)
        );

        -- One planning document per bake date
        CREATE TABLE IF NOT EXISTS prep_sheets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bake_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'draft',
            notes TEXT,
            completed_at TEXT,
            completed_by INTEGER,
            FOREIGN KEY (completed_by) REFERENCES staff(id)
        );

        CREATE TABLE IF NOT EXISTS prep_sheet_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            prep_sheet_id INTEGER NOT NULL,
            order_id INTEGER,
            flavor_id INTEGER NOT NULL,
            planned_quantity INTEGER NOT NULL,
            actual_quantity INTEGER,
            FOREIGN KEY (prep_sheet_id) REFERENCES prep_sheets(id),
            FOREIGN KEY (order_id) REFERENCES orders(id),
            FOREIGN KEY (flavor_id) REFERENCES flavors(id)
        );

        -- Ground truth for every baked batch and its disposition
        CREATE TABLE IF NOT EXISTS production_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            prep_sheet_id INTEGER NOT NULL,
            order_id INTEGER,
            flavor_id INTEGER NOT NULL,
            quantity INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            sale_price REAL,
            notes TEXT,
            bake_date TEXT NOT NULL,
            FOREIGN KEY (prep_sheet_id) REFERENCES prep_sheets(id),
            FOREIGN KEY (order_id) REFERENCES orders(id),
            FOREIGN KEY (flavor_id) REFERENCES flavors(id)
        );

        CREATE INDEX IF NOT EXISTS idx_orders_bake_slot ON orders(bake_slot_id);
        CREATE INDEX IF NOT EXISTS idx_prep_items_sheet ON prep_sheet_items(prep_sheet_id);
        CREATE INDEX IF NOT EXISTS idx_production_bake_date ON production_records(bake_date);
        ",
    )?;

    Ok(())
}

use tauri::Manager;

pub trait DatabaseExt {
    fn db(&self) -> &Database;
}

impl DatabaseExt for AppHandle {
    fn db(&self) -> &Database {
        self.state::<Database>().inner()
    }
}
