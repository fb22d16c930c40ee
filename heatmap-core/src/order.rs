//! Canonical row and column order
//!
//! Global invariants enforced:
//! - Rows follow recipe-group declaration order, then within-group list order
//! - Columns follow sensory-group declaration order, then matrix column order
//! - Every id appears at most once on its axis
//! - Identical inputs yield identical axes

use crate::classify::SensoryGrouping;
use crate::groups::{GroupTables, RecipeFallback, SensoryGroup, UNGROUPED};
use crate::matrix::ConcentrationMatrix;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// One position on an axis: the id and the group that owns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisEntry {
    pub id: String,
    pub group: String,
}

/// A consecutive run of one group along an axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSpan {
    pub group: String,
    pub start: usize,
    pub len: usize,
}

/// Final, immutable order of one heatmap axis
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderedAxis {
    entries: Vec<AxisEntry>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl OrderedAxis {
    fn push(&mut self, id: &str, group: &str) -> bool {
        if self.positions.contains_key(id) {
            return false;
        }
        self.positions.insert(id.to_string(), self.entries.len());
        self.entries.push(AxisEntry {
            id: id.to_string(),
            group: group.to_string(),
        });
        true
    }

    pub fn entries(&self) -> &[AxisEntry] {
        &self.entries
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AxisEntry> {
        self.entries.get(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Owning group of an id
    pub fn group_of(&self, id: &str) -> Option<&str> {
        self.position(id).map(|i| self.entries[i].group.as_str())
    }

    /// Runs of consecutive entries sharing a group, in axis order
    pub fn spans(&self) -> Vec<GroupSpan> {
        let mut spans: Vec<GroupSpan> = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            match spans.last_mut() {
                Some(span) if span.group == entry.group => span.len += 1,
                _ => spans.push(GroupSpan {
                    group: entry.group.clone(),
                    start: i,
                    len: 1,
                }),
            }
        }
        spans
    }

    /// Indices where the owning group changes (never 0)
    pub fn boundaries(&self) -> Vec<usize> {
        self.spans().iter().skip(1).map(|s| s.start).collect()
    }

    /// True when `index` opens a group run
    pub fn starts_group(&self, index: usize) -> bool {
        match index {
            0 => !self.entries.is_empty(),
            i if i < self.entries.len() => self.entries[i - 1].group != self.entries[i].group,
            _ => false,
        }
    }
}

impl PartialEq for OrderedAxis {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for OrderedAxis {}

/// Row and column order of a heatmap
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapLayout {
    pub recipes: OrderedAxis,
    pub ingredients: OrderedAxis,
}

/// Build the recipe (row) order from the group tables.
///
/// Recipes listed but missing from the matrix are skipped; a recipe listed in
/// several groups is kept under the first.
pub fn order_recipes(
    matrix: &ConcentrationMatrix,
    tables: &GroupTables,
    fallback: RecipeFallback,
) -> OrderedAxis {
    let mut axis = OrderedAxis::default();

    for group in &tables.recipe_groups {
        for recipe in &group.members {
            if matrix.contains_recipe(recipe) {
                axis.push(recipe, &group.name);
            }
        }
    }

    if fallback == RecipeFallback::Ungrouped {
        let listed: HashSet<&str> = tables
            .recipe_groups
            .iter()
            .flat_map(|g| g.members.iter().map(String::as_str))
            .collect();
        for recipe in matrix.recipes() {
            if !listed.contains(recipe.as_str()) {
                axis.push(recipe, UNGROUPED);
            }
        }
    }

    axis
}

/// Build the ingredient (column) order from the sensory grouping.
pub fn order_ingredients(matrix: &ConcentrationMatrix, grouping: &SensoryGrouping) -> OrderedAxis {
    let mut axis = OrderedAxis::default();
    for group in SensoryGroup::ALL {
        for ingredient in grouping.members(group) {
            if matrix.contains_ingredient(ingredient) {
                axis.push(ingredient, group.as_str());
            }
        }
    }
    axis
}

/// Build both axes.
pub fn build_layout(
    matrix: &ConcentrationMatrix,
    tables: &GroupTables,
    grouping: &SensoryGrouping,
    fallback: RecipeFallback,
) -> HeatmapLayout {
    HeatmapLayout {
        recipes: order_recipes(matrix, tables, fallback),
        ingredients: order_ingredients(matrix, grouping),
    }
}
