//! Recipe × ingredient concentration matrix
//!
//! Rows are recipes, columns are ingredients. Cells are optional: an absent
//! cell means "untested" and counts as zero wherever a number is needed.

use anyhow::Result;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ConcentrationMatrix {
    recipes: Vec<String>,
    ingredients: Vec<String>,
    /// Row-major, `recipes.len() * ingredients.len()` cells
    values: Vec<Option<f64>>,
    recipe_index: HashMap<String, usize>,
    ingredient_index: HashMap<String, usize>,
}

impl ConcentrationMatrix {
    /// Build a matrix from row ids, column ids and row-major cells.
    ///
    /// Fails on duplicate ids, ragged rows, and negative or non-finite values.
    pub fn new(
        recipes: Vec<String>,
        ingredients: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        if rows.len() != recipes.len() {
            anyhow::bail!(
                "matrix has {} recipe ids but {} rows",
                recipes.len(),
                rows.len()
            );
        }

        let recipe_index = index_unique(&recipes, "recipe")?;
        let ingredient_index = index_unique(&ingredients, "ingredient")?;

        let mut values = Vec::with_capacity(recipes.len() * ingredients.len());
        for (recipe, row) in recipes.iter().zip(rows) {
            if row.len() != ingredients.len() {
                anyhow::bail!(
                    "row '{}' has {} cells, expected {}",
                    recipe,
                    row.len(),
                    ingredients.len()
                );
            }
            for (ingredient, value) in ingredients.iter().zip(&row) {
                if let Some(v) = value {
                    if !v.is_finite() || *v < 0.0 {
                        anyhow::bail!(
                            "invalid concentration {} at ({}, {}): must be finite and non-negative",
                            v,
                            recipe,
                            ingredient
                        );
                    }
                }
            }
            values.extend(row);
        }

        Ok(ConcentrationMatrix {
            recipes,
            ingredients,
            values,
            recipe_index,
            ingredient_index,
        })
    }

    /// Convenience constructor for literal tables.
    pub fn from_rows(ingredients: &[&str], rows: &[(&str, Vec<Option<f64>>)]) -> Result<Self> {
        ConcentrationMatrix::new(
            rows.iter().map(|(r, _)| r.to_string()).collect(),
            ingredients.iter().map(|i| i.to_string()).collect(),
            rows.iter().map(|(_, cells)| cells.clone()).collect(),
        )
    }

    pub fn recipes(&self) -> &[String] {
        &self.recipes
    }

    pub fn ingredients(&self) -> &[String] {
        &self.ingredients
    }

    /// (recipes, ingredients)
    pub fn shape(&self) -> (usize, usize) {
        (self.recipes.len(), self.ingredients.len())
    }

    pub fn contains_recipe(&self, recipe: &str) -> bool {
        self.recipe_index.contains_key(recipe)
    }

    pub fn contains_ingredient(&self, ingredient: &str) -> bool {
        self.ingredient_index.contains_key(ingredient)
    }

    /// Raw cell; `None` when the cell is absent or either id is unknown
    pub fn get(&self, recipe: &str, ingredient: &str) -> Option<f64> {
        let row = *self.recipe_index.get(recipe)?;
        let col = *self.ingredient_index.get(ingredient)?;
        self.values[row * self.ingredients.len() + col]
    }

    /// Cell value with absent entries read as 0.0
    pub fn value(&self, recipe: &str, ingredient: &str) -> f64 {
        self.get(recipe, ingredient).unwrap_or(0.0)
    }

    /// Number of cells holding a value
    pub fn populated_cells(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

fn index_unique(ids: &[String], kind: &str) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        if index.insert(id.clone(), i).is_some() {
            anyhow::bail!("duplicate {} id: '{}'", kind, id);
        }
    }
    Ok(index)
}
