use std::collections::HashMap;

use rusqlite::Connection;
use tauri::AppHandle;

use crate::core::{prep, recipe};
use crate::db::DatabaseExt;
use crate::error::AppResult;
use crate::models::{
    Flavor, PrepSheetData, Recipe, RecipeIngredient, RecipeSection, RecipeStep,
};

#[tauri::command]
pub fn get_flavors(app: AppHandle) -> AppResult<Vec<Flavor>> {
    let db = app.db();
    let conn = db.connection()?;

    let mut stmt = conn.prepare("SELECT id, name, active FROM flavors ORDER BY name")?;
    let flavors = stmt
        .query_map([], |row| {
            Ok(Flavor {
                id: row.get(0)?,
                name: row.get(1)?,
                active: row.get::<_, i64>(2)? != 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(flavors)
}

/// Load a flavor's recipe, or None when no recipe is configured.
pub fn load_recipe(conn: &Connection, flavor_id: i64) -> AppResult<Option<Recipe>> {
    let mut stmt = conn.prepare(
        "SELECT section, name, unit, amount FROM recipe_ingredients
         WHERE flavor_id = ?1 ORDER BY id ASC",
    )?;
    let ingredients = stmt
        .query_map([flavor_id], |row| {
            let section_text: String = row.get(0)?;
            let section = RecipeSection::parse(&section_text).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    format!("unknown recipe section '{section_text}'").into(),
                )
            })?;
            Ok(RecipeIngredient {
                name: row.get(1)?,
                unit: row.get(2)?,
                amount: row.get(3)?,
                section,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT position, instruction, duration_minutes FROM recipe_steps
         WHERE flavor_id = ?1 ORDER BY position ASC",
    )?;
    let steps = stmt
        .query_map([flavor_id], |row| {
            Ok(RecipeStep {
                position: row.get(0)?,
                instruction: row.get(1)?,
                duration_minutes: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    if ingredients.is_empty() && steps.is_empty() {
        return Ok(None);
    }

    Ok(Some(Recipe {
        flavor_id,
        ingredients,
        steps,
    }))
}

#[tauri::command]
pub fn get_recipe(app: AppHandle, flavor_id: i64) -> AppResult<Option<Recipe>> {
    let db = app.db();
    let conn = db.connection()?;
    load_recipe(&conn, flavor_id)
}

/// Shopping and instruction view for a sheet: aggregate its items (actual
/// quantities once completed, planned while drafting) over their recipes.
#[tauri::command]
pub fn get_prep_sheet_data(app: AppHandle, sheet_id: i64) -> AppResult<PrepSheetData> {
    let db = app.db();
    let conn = db.connection()?;

    let sheet = prep::get_sheet(&conn, sheet_id)?;

    let items: Vec<recipe::AggregationItem> = sheet
        .items
        .iter()
        .map(|item| recipe::AggregationItem {
            flavor_id: item.flavor_id,
            quantity: item.actual_quantity.unwrap_or(item.planned_quantity),
        })
        .collect();

    let mut flavor_names: HashMap<i64, String> = HashMap::new();
    let mut recipes: HashMap<i64, Recipe> = HashMap::new();

    for item in &sheet.items {
        if let Some(name) = &item.flavor_name {
            flavor_names.insert(item.flavor_id, name.clone());
        }
        if !recipes.contains_key(&item.flavor_id) {
            if let Some(loaded) = load_recipe(&conn, item.flavor_id)? {
                recipes.insert(item.flavor_id, loaded);
            }
        }
    }

    Ok(recipe::aggregate(&items, &flavor_names, &recipes))
}
