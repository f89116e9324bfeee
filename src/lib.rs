mod commands;
mod core;
mod db;
mod error;
mod models;


use commands::{orders, prep, production, recipes, slots};
use db::Database;
use tauri::Manager;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            // Initialize database
            let db = Database::new(&app.handle()).expect("Failed to create database");
            db.initialize().expect("Failed to initialize database");
            app.manage(db);

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Bake slots
            slots::get_bake_slots,
            slots::get_bake_slot,
            slots::create_bake_slot,
            slots::set_slot_open,
            slots::update_slot_capacity,
            slots::delete_bake_slot,
            // Orders
            orders::submit_order,
            orders::get_order,
            orders::get_orders_for_date,
            orders::get_orders_for_slot,
            orders::mark_picked_up,
            orders::mark_no_show,
            orders::cancel_order,
            orders::update_order_payment,
            orders::update_admin_notes,
            // Prep sheets
            prep::create_prep_sheet,
            prep::get_prep_sheets,
            prep::get_prep_sheet,
            prep::add_order_to_sheet,
            prep::remove_order_from_sheet,
            prep::add_extra,
            prep::remove_extra,
            prep::complete_prep_sheet,
            prep::delete_prep_sheet,
            // Production
            production::get_production_records,
            production::get_sheet_production,
            production::update_production_record,
            production::split_production_record,
            production::update_payment_at_pickup,
            // Flavors and recipes
            recipes::get_flavors,
            recipes::get_recipe,
            recipes::get_prep_sheet_data,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
