//! Heatmap core library - grouping, ordering, thresholding and rendering of
//! recipe x ingredient concentration heatmaps

// Global invariants enforced in this crate:
// - Group tables are immutable values passed in explicitly, never globals
// - Every ingredient column lands in exactly one sensory group
// - Row and column order are a pure function of the inputs
// - Renderers consume one ordered view and never re-derive grouping
// - Identical input yields byte-for-byte identical output

pub mod classify;
pub mod color;
pub mod config;
pub mod groups;
pub mod heatmap;
pub mod loader;
pub mod matrix;
pub mod order;
pub mod render;
pub mod report;
pub mod threshold;

pub use classify::{classify_ingredients, SensoryGrouping, SensoryMap};
pub use config::ResolvedConfig;
pub use groups::{GroupTables, RecipeFallback, RecipeGroup, SensoryGroup};
pub use heatmap::{Cell, Heatmap, HeatmapView};
pub use matrix::ConcentrationMatrix;
pub use order::{build_layout, GroupSpan, HeatmapLayout, OrderedAxis};
pub use render::{RasterRenderer, Renderer, StandaloneRenderer};
pub use report::{render_json, render_text, GroupingSummary};
pub use threshold::{CellState, Selection, Threshold, ThresholdPolicy, VisibilityStats};

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

/// Load both workbooks and build the ordered heatmap
pub fn load_heatmap(
    data: &Path,
    sensory: &Path,
    tables: GroupTables,
    fallback: RecipeFallback,
) -> Result<Heatmap> {
    let matrix = loader::load_matrix(data)
        .with_context(|| format!("failed to load concentration data: {}", data.display()))?;
    let (recipes, ingredients) = matrix.shape();
    info!("loaded {} recipes x {} ingredients", recipes, ingredients);

    let map = loader::load_sensory_map(sensory)
        .with_context(|| format!("failed to load sensory notes: {}", sensory.display()))?;
    info!("loaded sensory notes for {} ingredients", map.len());

    let heatmap = Heatmap::build(matrix, &map, tables, fallback);
    debug!(
        rows = heatmap.recipes().len(),
        columns = heatmap.ingredients().len(),
        fallback = fallback.as_str(),
        "ordered heatmap"
    );
    Ok(heatmap)
}

/// [`load_heatmap`] with the paths and fallback from a resolved config and
/// the compiled-in tobacco group tables
pub fn load_with_config(config: &ResolvedConfig) -> Result<Heatmap> {
    load_heatmap(
        &config.data,
        &config.sensory,
        GroupTables::tobacco(),
        config.recipe_fallback,
    )
}
