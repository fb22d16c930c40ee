//! The ordered heatmap and per-render views of it
//!
//! A [`Heatmap`] is built once per run and never mutated. Each render (or each
//! dashboard request) wraps it in a [`HeatmapView`] carrying the threshold and
//! selection for that render only.

use crate::classify::{classify_ingredients, SensoryGrouping, SensoryMap, SensoryMapStats};
use crate::color::{cell_color, Rgb};
use crate::groups::{GroupTables, RecipeFallback, UNGROUPED};
use crate::matrix::ConcentrationMatrix;
use crate::order::{build_layout, HeatmapLayout, OrderedAxis};
use crate::threshold::{CellState, Selection, Threshold, VisibilityStats};

/// Matrix plus its grouped, ordered axes
#[derive(Debug, Clone)]
pub struct Heatmap {
    matrix: ConcentrationMatrix,
    tables: GroupTables,
    grouping: SensoryGrouping,
    layout: HeatmapLayout,
    fallback: RecipeFallback,
    sensory_stats: SensoryMapStats,
    classified: usize,
}

impl Heatmap {
    /// Classify, then order. Pure: no I/O.
    pub fn build(
        matrix: ConcentrationMatrix,
        sensory: &SensoryMap,
        tables: GroupTables,
        fallback: RecipeFallback,
    ) -> Self {
        let grouping = classify_ingredients(matrix.ingredients(), sensory);
        let layout = build_layout(&matrix, &tables, &grouping, fallback);
        Heatmap {
            matrix,
            tables,
            grouping,
            layout,
            fallback,
            sensory_stats: sensory.stats(),
            classified: sensory.len(),
        }
    }

    pub fn matrix(&self) -> &ConcentrationMatrix {
        &self.matrix
    }

    pub fn tables(&self) -> &GroupTables {
        &self.tables
    }

    pub fn grouping(&self) -> &SensoryGrouping {
        &self.grouping
    }

    pub fn layout(&self) -> &HeatmapLayout {
        &self.layout
    }

    pub fn recipes(&self) -> &OrderedAxis {
        &self.layout.recipes
    }

    pub fn ingredients(&self) -> &OrderedAxis {
        &self.layout.ingredients
    }

    pub fn fallback(&self) -> RecipeFallback {
        self.fallback
    }

    pub fn sensory_stats(&self) -> SensoryMapStats {
        self.sensory_stats
    }

    /// Distinct ingredients carrying a label in the classification table
    pub fn classified_count(&self) -> usize {
        self.classified
    }

    /// Value at an ordered (row, column) position
    pub fn value_at(&self, row: usize, col: usize) -> Option<f64> {
        let recipe = self.layout.recipes.get(row)?;
        let ingredient = self.layout.ingredients.get(col)?;
        self.matrix.get(&recipe.id, &ingredient.id)
    }

    /// Display name with the group's short label, e.g. "G1-J1 Virginia Tobacco 5%"
    pub fn display_recipe(&self, row: usize) -> Option<String> {
        let entry = self.layout.recipes.get(row)?;
        Some(format!(
            "{}-{}",
            self.tables.label_for(&entry.group),
            entry.id
        ))
    }

    /// Selection holding one recipe group's rows, found by name or short label.
    /// `None` when no group answers to `key`.
    pub fn group_selection(&self, key: &str) -> Option<Selection> {
        let name = match self.tables.find_group(key) {
            Some(group) => group.name.as_str(),
            None if key == UNGROUPED && self.has_unlisted_band() => UNGROUPED,
            None => return None,
        };
        Some(Selection::group(self.recipes(), name))
    }

    fn has_unlisted_band(&self) -> bool {
        self.recipes().entries().iter().any(|e| e.group == UNGROUPED)
    }

    /// (name, short label) of every recipe group present on the row axis, in row order
    pub fn recipe_group_labels(&self) -> Vec<(String, String)> {
        self.recipes()
            .spans()
            .into_iter()
            .map(|span| {
                let label = self.tables.label_for(&span.group).to_string();
                (span.group, label)
            })
            .collect()
    }

    pub fn view<'a>(&'a self, threshold: Threshold, selection: &'a Selection) -> HeatmapView<'a> {
        HeatmapView {
            heatmap: self,
            threshold,
            selection,
        }
    }

    /// Visible cells over the ordered grid. Selection does not matter here.
    pub fn stats(&self, threshold: &Threshold) -> VisibilityStats {
        let rows = self.layout.recipes.len();
        let cols = self.layout.ingredients.len();
        let mut shown = 0;
        for row in 0..rows {
            for col in 0..cols {
                if threshold.is_visible(self.value_at(row, col)) {
                    shown += 1;
                }
            }
        }
        VisibilityStats::from_counts(shown, rows * cols)
    }
}

/// One cell as seen by a renderer
#[derive(Debug, Clone, PartialEq)]
pub struct Cell<'a> {
    pub row: usize,
    pub col: usize,
    pub recipe: &'a str,
    pub ingredient: &'a str,
    pub value: Option<f64>,
    pub state: CellState,
}

impl Cell<'_> {
    pub fn color(&self) -> Rgb {
        cell_color(self.state)
    }
}

/// A heatmap with threshold and selection applied
#[derive(Debug, Clone, Copy)]
pub struct HeatmapView<'a> {
    pub heatmap: &'a Heatmap,
    pub threshold: Threshold,
    pub selection: &'a Selection,
}

impl<'a> HeatmapView<'a> {
    pub fn rows(&self) -> usize {
        self.heatmap.recipes().len()
    }

    pub fn cols(&self) -> usize {
        self.heatmap.ingredients().len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Cell<'a>> {
        let recipe = self.heatmap.recipes().get(row)?;
        let ingredient = self.heatmap.ingredients().get(col)?;
        let value = self.heatmap.matrix().get(&recipe.id, &ingredient.id);
        let selected = self.selection.is_selected(&recipe.id);
        Some(Cell {
            row,
            col,
            recipe: &recipe.id,
            ingredient: &ingredient.id,
            value,
            state: CellState::evaluate(value, &self.threshold, selected),
        })
    }

    /// Cells of one row in column order
    pub fn row_cells(self, row: usize) -> impl Iterator<Item = Cell<'a>> + 'a {
        (0..self.cols()).filter_map(move |col| self.cell(row, col))
    }

    /// Every cell, row-major
    pub fn cells(self) -> impl Iterator<Item = Cell<'a>> + 'a {
        (0..self.rows()).flat_map(move |row| self.row_cells(row))
    }

    pub fn stats(&self) -> VisibilityStats {
        self.heatmap.stats(&self.threshold)
    }
}
