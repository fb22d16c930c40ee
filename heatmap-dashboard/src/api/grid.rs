//! Grid endpoints
//!
//! Both endpoints take the same query:
//! - `threshold`: cutoff, defaults to the server's configured value
//! - `policy`: `inclusive` or `exclusive`, defaults to the configured policy
//! - `selected`: comma-separated row indices; absent selects every recipe,
//!   present but empty selects none
//! - `group`: one recipe group by short label (`G1`) or full name; selects
//!   exactly that group's rows and cannot be combined with `selected`

use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use heatmap_core::render::render_grid_fragment;
use heatmap_core::{Heatmap, Selection, Threshold, ThresholdPolicy, VisibilityStats};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub threshold: Option<String>,
    pub policy: Option<String>,
    pub selected: Option<String>,
    pub group: Option<String>,
}

impl ViewQuery {
    /// Resolve the query against the server defaults
    pub fn resolve(
        &self,
        heatmap: &Heatmap,
        default: Threshold,
    ) -> Result<(Threshold, Selection), ApiError> {
        let cutoff = match self.threshold.as_deref().map(str::trim) {
            None | Some("") => default.cutoff,
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .and_then(|v| Threshold::check_cutoff(v).ok())
                .ok_or_else(|| ApiError::InvalidThreshold(raw.to_string()))?,
        };

        let policy = match self.policy.as_deref().map(str::trim) {
            None | Some("") => default.policy,
            Some(raw) => raw
                .parse::<ThresholdPolicy>()
                .map_err(|_| ApiError::InvalidPolicy(raw.to_string()))?,
        };

        let group = self.group.as_deref().map(str::trim).filter(|g| !g.is_empty());
        let selection = match (group, self.selected.as_deref()) {
            (Some(_), Some(_)) => return Err(ApiError::ConflictingSelection),
            (Some(key), None) => heatmap
                .group_selection(key)
                .ok_or_else(|| ApiError::InvalidGroup(key.to_string()))?,
            (None, None) => Selection::All,
            (None, Some(raw)) => parse_selection(heatmap, raw)?,
        };

        Ok((Threshold { cutoff, policy }, selection))
    }
}

fn parse_selection(heatmap: &Heatmap, raw: &str) -> Result<Selection, ApiError> {
    let recipes = heatmap.recipes();
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let entry = part
            .parse::<usize>()
            .ok()
            .and_then(|row| recipes.get(row))
            .ok_or_else(|| ApiError::InvalidSelection(part.to_string()))?;
        ids.push(entry.id.clone());
    }
    Ok(Selection::only(ids))
}

/// GET /api/grid
///
/// Server-rendered grid fragment for the dashboard page
pub async fn get_grid(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Html<String>, ApiError> {
    let (threshold, selection) = query.resolve(&state.heatmap, state.default_threshold)?;
    let view = state.heatmap.view(threshold, &selection);
    debug!(
        cutoff = threshold.cutoff,
        policy = threshold.policy.as_str(),
        "rendering grid fragment"
    );
    Ok(Html(render_grid_fragment(&view)))
}

#[derive(Debug, Serialize)]
pub struct SpanResponse {
    pub group: String,
    pub start: usize,
    pub len: usize,
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: String,
    pub display: String,
    pub group: String,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct IngredientResponse {
    pub id: String,
    pub group: String,
}

#[derive(Debug, Serialize)]
pub struct HeatmapResponse {
    pub threshold: f64,
    pub policy: ThresholdPolicy,
    pub recipes: Vec<RecipeResponse>,
    pub ingredients: Vec<IngredientResponse>,
    pub recipe_spans: Vec<SpanResponse>,
    pub sensory_spans: Vec<SpanResponse>,
    /// Row-major, `null` where the matrix has no value
    pub values: Vec<Vec<Option<f64>>>,
    /// Row-major cell states: `hidden`, `active` or `inactive`
    pub states: Vec<Vec<&'static str>>,
    /// Row-major hex colors
    pub colors: Vec<Vec<String>>,
    pub stats: VisibilityStats,
}

/// GET /api/heatmap
///
/// The same view as `/api/grid`, as JSON
pub async fn get_heatmap(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<HeatmapResponse>, ApiError> {
    let (threshold, selection) = query.resolve(&state.heatmap, state.default_threshold)?;
    let heatmap = &state.heatmap;
    let view = heatmap.view(threshold, &selection);

    let recipes = heatmap
        .recipes()
        .entries()
        .iter()
        .enumerate()
        .map(|(row, entry)| RecipeResponse {
            id: entry.id.clone(),
            display: heatmap.display_recipe(row).unwrap_or_else(|| entry.id.clone()),
            group: entry.group.clone(),
            selected: selection.is_selected(&entry.id),
        })
        .collect();

    let ingredients = heatmap
        .ingredients()
        .entries()
        .iter()
        .map(|entry| IngredientResponse {
            id: entry.id.clone(),
            group: entry.group.clone(),
        })
        .collect();

    let to_spans = |spans: Vec<heatmap_core::GroupSpan>| -> Vec<SpanResponse> {
        spans
            .into_iter()
            .map(|s| SpanResponse {
                group: s.group,
                start: s.start,
                len: s.len,
            })
            .collect()
    };

    let mut values = Vec::with_capacity(view.rows());
    let mut states = Vec::with_capacity(view.rows());
    let mut colors = Vec::with_capacity(view.rows());
    for row in 0..view.rows() {
        let cells: Vec<_> = view.row_cells(row).collect();
        values.push(cells.iter().map(|c| c.value).collect());
        states.push(cells.iter().map(|c| c.state.as_str()).collect());
        colors.push(cells.iter().map(|c| c.color().hex()).collect());
    }

    Ok(Json(HeatmapResponse {
        threshold: threshold.cutoff,
        policy: threshold.policy,
        recipes,
        ingredients,
        recipe_spans: to_spans(heatmap.recipes().spans()),
        sensory_spans: to_spans(heatmap.ingredients().spans()),
        values,
        states,
        colors,
        stats: view.stats(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use heatmap_core::{ConcentrationMatrix, GroupTables, RecipeFallback, RecipeGroup, SensoryMap};

    fn sample() -> Heatmap {
        let matrix = ConcentrationMatrix::from_rows(
            &["vanillin", "menthol"],
            &[
                ("a", vec![Some(0.9), Some(0.1)]),
                ("b", vec![Some(0.5), None]),
            ],
        )
        .unwrap();
        let map: SensoryMap = [("vanillin", "Sweet"), ("menthol", "Cooling")]
            .into_iter()
            .collect();
        let tables = GroupTables::new(vec![
            RecipeGroup::new("Group1", "G1", &["a"]),
            RecipeGroup::new("Group2", "G2", &["b"]),
        ]);
        Heatmap::build(matrix, &map, tables, RecipeFallback::Drop)
    }

    #[test]
    fn test_empty_query_uses_defaults() {
        let heatmap = sample();
        let (threshold, selection) = ViewQuery::default()
            .resolve(&heatmap, Threshold::inclusive(0.4))
            .unwrap();
        assert_eq!(threshold, Threshold::inclusive(0.4));
        assert_eq!(selection, Selection::All);
    }

    #[test]
    fn test_selected_indices_map_to_recipe_ids() {
        let heatmap = sample();
        let query = ViewQuery {
            selected: Some("1".to_string()),
            ..Default::default()
        };
        let (_, selection) = query.resolve(&heatmap, Threshold::INTERACTIVE_DEFAULT).unwrap();
        let expected = heatmap.recipes().get(1).unwrap().id.clone();
        assert_eq!(selection, Selection::only([expected]));
    }

    #[test]
    fn test_empty_selected_means_none() {
        let heatmap = sample();
        let query = ViewQuery {
            selected: Some(String::new()),
            ..Default::default()
        };
        let (_, selection) = query.resolve(&heatmap, Threshold::INTERACTIVE_DEFAULT).unwrap();
        assert_eq!(selection, Selection::none());
    }

    #[test]
    fn test_group_selects_its_rows() {
        let heatmap = sample();
        for key in ["G2", "Group2", " G2 "] {
            let query = ViewQuery {
                group: Some(key.to_string()),
                ..Default::default()
            };
            let (_, selection) = query.resolve(&heatmap, Threshold::INTERACTIVE_DEFAULT).unwrap();
            assert_eq!(selection, Selection::only(["b"]));
        }

        // An empty group parameter is the "all groups" choice
        let query = ViewQuery {
            group: Some(String::new()),
            ..Default::default()
        };
        let (_, selection) = query.resolve(&heatmap, Threshold::INTERACTIVE_DEFAULT).unwrap();
        assert_eq!(selection, Selection::All);
    }

    #[test]
    fn test_group_errors() {
        let heatmap = sample();
        let unknown = ViewQuery {
            group: Some("G7".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            unknown.resolve(&heatmap, Threshold::INTERACTIVE_DEFAULT),
            Err(ApiError::InvalidGroup(g)) if g == "G7"
        ));

        let both = ViewQuery {
            group: Some("G1".to_string()),
            selected: Some("0".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            both.resolve(&heatmap, Threshold::INTERACTIVE_DEFAULT),
            Err(ApiError::ConflictingSelection)
        ));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let heatmap = sample();
        let bad = [
            ViewQuery {
                threshold: Some("abc".to_string()),
                ..Default::default()
            },
            ViewQuery {
                threshold: Some("NaN".to_string()),
                ..Default::default()
            },
            ViewQuery {
                threshold: Some("-0.1".to_string()),
                ..Default::default()
            },
            ViewQuery {
                policy: Some("sideways".to_string()),
                ..Default::default()
            },
            ViewQuery {
                selected: Some("0,7".to_string()),
                ..Default::default()
            },
        ];
        for query in bad {
            assert!(query.resolve(&heatmap, Threshold::INTERACTIVE_DEFAULT).is_err());
        }
    }
}
