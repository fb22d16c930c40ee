//! Sensory classification of ingredients
//!
//! Turns the "product" / "Sensory Note" table into an ingredient lookup, then
//! buckets every matrix column into exactly one [`SensoryGroup`]. Columns with
//! no entry, or with a label outside the seven named groups, land in Ungrouped.

use crate::groups::SensoryGroup;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Ingredient → sensory label lookup built from the classification table
#[derive(Debug, Clone, Default)]
pub struct SensoryMap {
    labels: HashMap<String, String>,
    stats: SensoryMapStats,
}

/// Row accounting for the classification table (diagnostics only)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SensoryMapStats {
    pub rows: usize,
    /// Rows skipped because the ingredient or the label was blank
    pub ignored_rows: usize,
    /// Rows whose ingredient had already been seen (the later row wins)
    pub duplicate_rows: usize,
}

impl SensoryMap {
    /// Build the lookup from (ingredient, label) rows.
    ///
    /// Rows missing either side are ignored; on duplicate ingredients the last
    /// row wins.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Option<String>, Option<String>)>,
    {
        let mut labels = HashMap::new();
        let mut stats = SensoryMapStats::default();

        for (ingredient, label) in rows {
            stats.rows += 1;
            let (Some(ingredient), Some(label)) = (ingredient, label) else {
                stats.ignored_rows += 1;
                continue;
            };
            if let Some(previous) = labels.insert(ingredient.clone(), label) {
                stats.duplicate_rows += 1;
                debug!(
                    ingredient = %ingredient,
                    previous = %previous,
                    "duplicate sensory entry, keeping last"
                );
            }
        }

        if stats.duplicate_rows > 0 {
            warn!(
                "{} duplicate ingredient(s) in sensory table; later rows take precedence",
                stats.duplicate_rows
            );
        }

        SensoryMap { labels, stats }
    }

    pub fn label(&self, ingredient: &str) -> Option<&str> {
        self.labels.get(ingredient).map(String::as_str)
    }

    /// Number of distinct classified ingredients
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn stats(&self) -> SensoryMapStats {
        self.stats
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for SensoryMap {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        SensoryMap::from_rows(
            iter.into_iter()
                .map(|(i, l)| (Some(i.to_string()), Some(l.to_string()))),
        )
    }
}

/// Ingredients bucketed by sensory group, each list in matrix column order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensoryGrouping {
    groups: BTreeMap<SensoryGroup, Vec<String>>,
}

impl SensoryGrouping {
    pub fn members(&self, group: SensoryGroup) -> &[String] {
        self.groups.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All eight groups in traversal order, empty ones included
    pub fn iter(&self) -> impl Iterator<Item = (SensoryGroup, &[String])> {
        self.groups.iter().map(|(g, m)| (*g, m.as_slice()))
    }

    pub fn group_of(&self, ingredient: &str) -> Option<SensoryGroup> {
        self.groups
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == ingredient))
            .map(|(g, _)| *g)
    }

    /// Number of non-empty groups
    pub fn populated_groups(&self) -> usize {
        self.groups.values().filter(|m| !m.is_empty()).count()
    }

    pub fn total(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Bucket each ingredient (matrix column order) into its sensory group.
pub fn classify_ingredients(ingredients: &[String], map: &SensoryMap) -> SensoryGrouping {
    let mut groups: BTreeMap<SensoryGroup, Vec<String>> = SensoryGroup::ALL
        .iter()
        .map(|g| (*g, Vec::new()))
        .collect();

    for ingredient in ingredients {
        let group = map
            .label(ingredient)
            .and_then(SensoryGroup::from_label)
            .unwrap_or(SensoryGroup::Ungrouped);
        groups.entry(group).or_default().push(ingredient.clone());
    }

    for (group, members) in &groups {
        debug!(group = group.as_str(), count = members.len(), "sensory group");
    }

    SensoryGrouping { groups }
}
