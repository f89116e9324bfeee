//! Recipe aggregation: a pure computation from planned quantities to a
//! shopping and instruction view. No persistence, no side effects, safe to
//! run repeatedly.

use std::collections::{BTreeMap, HashMap};

use crate::models::{
    FlavorBatch, PrepSheetData, Recipe, RecipeSection, ScaledIngredient,
};

#[derive(Debug, Clone, Copy)]
pub struct AggregationItem {
    pub flavor_id: i64,
    pub quantity: i64,
}

/// Aggregate planned items into per-flavor batches plus a combined
/// ingredient list.
///
/// Quantities for the same flavor sum first (an order's 2 loaves and an
/// extra loaf combine into a batch of 3), then each ingredient scales
/// linearly from its one-loaf reference amount. Instruction steps carry
/// through unscaled; durations are per batch, not per loaf. The combined
/// list is keyed by (name, unit) with no unit conversion, so the same
/// ingredient in grams and cups stays two lines. A flavor without a recipe
/// gets `no_recipe` and empty lists instead of failing the aggregation.
pub fn aggregate(
    items: &[AggregationItem],
    flavor_names: &HashMap<i64, String>,
    recipes: &HashMap<i64, Recipe>,
) -> PrepSheetData {
    let mut totals: BTreeMap<i64, i64> = BTreeMap::new();
    for item in items {
        *totals.entry(item.flavor_id).or_insert(0) += item.quantity;
    }

    let mut flavors: Vec<FlavorBatch> = Vec::with_capacity(totals.len());
    let mut combined: BTreeMap<(String, String), f64> = BTreeMap::new();
    let mut total_loaves = 0;

    for (&flavor_id, &quantity) in &totals {
        total_loaves += quantity;

        let flavor_name = flavor_names
            .get(&flavor_id)
            .cloned()
            .unwrap_or_else(|| format!("flavor {flavor_id}"));

        let recipe = match recipes.get(&flavor_id) {
            Some(recipe) => recipe,
            None => {
                flavors.push(FlavorBatch {
                    flavor_id,
                    flavor_name,
                    quantity,
                    base: Vec::new(),
                    fold_ins: Vec::new(),
                    laminations: Vec::new(),
                    steps: Vec::new(),
                    no_recipe: true,
                });
                continue;
            }
        };

        let mut base = Vec::new();
        let mut fold_ins = Vec::new();
        let mut laminations = Vec::new();

        for ingredient in &recipe.ingredients {
            let scaled = ScaledIngredient {
                name: ingredient.name.clone(),
                unit: ingredient.unit.clone(),
                amount: ingredient.amount * quantity as f64,
            };

            *combined
                .entry((scaled.name.clone(), scaled.unit.clone()))
                .or_insert(0.0) += scaled.amount;

            match ingredient.section {
                RecipeSection::Base => base.push(scaled),
                RecipeSection::FoldIn => fold_ins.push(scaled),
                RecipeSection::Lamination => laminations.push(scaled),
            }
        }

        flavors.push(FlavorBatch {
            flavor_id,
            flavor_name,
            quantity,
            base,
            fold_ins,
            laminations,
            steps: recipe.steps.clone(),
            no_recipe: false,
        });
    }

    let combined = combined
        .into_iter()
        .map(|((name, unit), amount)| ScaledIngredient { name, unit, amount })
        .collect();

    PrepSheetData {
        flavors,
        combined,
        total_loaves,
    }
}
