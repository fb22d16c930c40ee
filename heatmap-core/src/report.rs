//! Grouping summary and visibility reports
//!
//! Global invariants enforced:
//! - Deterministic output ordering (group declaration order, then axis order)
//! - Byte-for-byte identical output across runs

use crate::groups::SensoryGroup;
use crate::heatmap::Heatmap;
use crate::threshold::{Threshold, VisibilityStats};
use serde::Serialize;
use std::collections::HashSet;

/// Ingredient count for one sensory group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensoryGroupCount {
    pub group: SensoryGroup,
    pub count: usize,
}

/// Declared vs present recipes for one recipe group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeGroupCount {
    pub name: String,
    pub label: String,
    pub declared: usize,
    pub present: usize,
}

/// Threshold statistics in report format
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibilityReport {
    pub threshold: f64,
    pub policy: String,
    pub shown: usize,
    pub possible: usize,
    pub density: f64,
}

impl VisibilityReport {
    pub fn new(threshold: &Threshold, stats: VisibilityStats) -> Self {
        VisibilityReport {
            threshold: threshold.cutoff,
            policy: threshold.policy.as_str().to_string(),
            shown: stats.shown,
            possible: stats.possible,
            density: stats.density,
        }
    }
}

/// How the loaded data was grouped and ordered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupingSummary {
    /// Matrix shape before ordering
    pub matrix_recipes: usize,
    pub matrix_ingredients: usize,
    /// Distinct ingredients present in the classification table
    pub classified: usize,
    pub sensory_groups: Vec<SensoryGroupCount>,
    /// Matrix ingredients that fell into Ungrouped, in column order
    pub ungrouped_ingredients: Vec<String>,
    pub recipe_groups: Vec<RecipeGroupCount>,
    /// Matrix recipes listed in no group, in matrix order
    pub unlisted_recipes: Vec<String>,
    pub recipe_fallback: String,
    pub rows: usize,
    pub columns: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<VisibilityReport>,
}

impl GroupingSummary {
    pub fn new(heatmap: &Heatmap) -> Self {
        let (matrix_recipes, matrix_ingredients) = heatmap.matrix().shape();
        let tables = heatmap.tables();

        let sensory_groups = heatmap
            .grouping()
            .iter()
            .map(|(group, members)| SensoryGroupCount {
                group,
                count: members.len(),
            })
            .collect();

        let recipe_groups = tables
            .recipe_groups
            .iter()
            .map(|group| RecipeGroupCount {
                name: group.name.clone(),
                label: group.label.clone(),
                declared: group.members.len(),
                present: heatmap
                    .recipes()
                    .entries()
                    .iter()
                    .filter(|e| e.group == group.name)
                    .count(),
            })
            .collect();

        let listed: HashSet<&str> = tables
            .recipe_groups
            .iter()
            .flat_map(|g| g.members.iter().map(String::as_str))
            .collect();
        let unlisted_recipes = heatmap
            .matrix()
            .recipes()
            .iter()
            .filter(|r| !listed.contains(r.as_str()))
            .cloned()
            .collect();

        GroupingSummary {
            matrix_recipes,
            matrix_ingredients,
            classified: heatmap.classified_count(),
            sensory_groups,
            ungrouped_ingredients: heatmap
                .grouping()
                .members(SensoryGroup::Ungrouped)
                .to_vec(),
            recipe_groups,
            unlisted_recipes,
            recipe_fallback: heatmap.fallback().as_str().to_string(),
            rows: heatmap.recipes().len(),
            columns: heatmap.ingredients().len(),
            visibility: None,
        }
    }

    /// Attach visible-cell statistics for a threshold
    pub fn with_visibility(mut self, heatmap: &Heatmap, threshold: &Threshold) -> Self {
        self.visibility = Some(VisibilityReport::new(threshold, heatmap.stats(threshold)));
        self
    }
}

/// Render the summary as text output
pub fn render_text(summary: &GroupingSummary) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Matrix: {} recipes x {} ingredients\n",
        summary.matrix_recipes, summary.matrix_ingredients
    ));
    output.push_str(&format!(
        "Sensory notes for {} ingredients\n\n",
        summary.classified
    ));

    output.push_str(&format!("{:<12} {}\n", "SENSORY", "INGREDIENTS"));
    for entry in &summary.sensory_groups {
        output.push_str(&format!("{:<12} {}\n", entry.group.as_str(), entry.count));
    }
    if !summary.ungrouped_ingredients.is_empty() {
        output.push_str(&format!(
            "Ungrouped ingredients: {}\n",
            summary.ungrouped_ingredients.join(", ")
        ));
    }

    output.push_str(&format!(
        "\n{:<24} {:<6} {:<8} {}\n",
        "RECIPE GROUP", "LABEL", "DECLARED", "PRESENT"
    ));
    for entry in &summary.recipe_groups {
        output.push_str(&format!(
            "{:<24} {:<6} {:<8} {}\n",
            truncate_or_pad(&entry.name, 24),
            entry.label,
            entry.declared,
            entry.present
        ));
    }
    if !summary.unlisted_recipes.is_empty() {
        output.push_str(&format!(
            "Recipes in no group ({}): {}\n",
            summary.recipe_fallback,
            summary.unlisted_recipes.join(", ")
        ));
    }

    output.push_str(&format!(
        "\nOrdered grid: {} rows x {} columns\n",
        summary.rows, summary.columns
    ));
    if let Some(ref v) = summary.visibility {
        output.push_str(&render_visibility(v));
    }

    output
}

/// Render visible-cell statistics as text
pub fn render_visibility(report: &VisibilityReport) -> String {
    let op = if report.policy == "exclusive" { ">" } else { ">=" };
    format!(
        concat!(
            "Data points shown: {} out of {} possible\n",
            "Data density: {:.1}%\n",
            "Threshold: values {} {} shown, others hidden\n",
        ),
        report.shown,
        report.possible,
        report.density * 100.0,
        op,
        report.threshold
    )
}

/// Render the summary as JSON output
pub fn render_json(summary: &GroupingSummary) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
}

/// Truncate or pad string to fixed width
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let cut: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        format!("{:<width$}", s, width = width)
    }
}
