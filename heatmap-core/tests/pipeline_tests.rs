//! End-to-end tests: spreadsheet fixtures in, ordered heatmap and artifacts out

use heatmap_core::render::{render_to_file, StandaloneRenderer};
use heatmap_core::{
    load_heatmap, loader, render_json, CellState, GroupTables, GroupingSummary, Heatmap,
    RasterRenderer, RecipeFallback, Selection, Threshold,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load(fallback: RecipeFallback) -> Heatmap {
    load_heatmap(
        &fixture_path("Data_Raw.xlsx"),
        &fixture_path("Sensory_Note.xlsx"),
        GroupTables::tobacco(),
        fallback,
    )
    .unwrap()
}

#[test]
fn test_loads_matrix_fixture() {
    let matrix = loader::load_matrix(&fixture_path("Data_Raw.xlsx")).unwrap();
    assert_eq!(matrix.shape(), (6, 7));
    assert_eq!(matrix.get("J1 Virginia Tobacco 5%", "Vanillin"), Some(0.9));
    // Blank cells are absent, explicit zeros are not
    assert_eq!(matrix.get("J1 Virginia Tobacco 5%", "Harsh Leaf"), None);
    assert_eq!(matrix.get("J1 Virginia Tobacco 5%", "Acetyl Pyrazine"), Some(0.0));
}

#[test]
fn test_loads_sensory_fixture() {
    let map = loader::load_sensory_map(&fixture_path("Sensory_Note.xlsx")).unwrap();
    assert_eq!(map.len(), 8);
    assert_eq!(map.label("Menthol"), Some("Cooling"));
    assert_eq!(map.label("Mystery Note"), Some("Earthy"));
    // The row with a blank product is skipped
    assert_eq!(map.stats().ignored_rows, 1);
}

#[test]
fn test_recipe_rows_follow_group_tables() {
    let heatmap = load(RecipeFallback::Drop);
    let rows: Vec<&str> = heatmap.recipes().ids().collect();
    assert_eq!(
        rows,
        vec![
            "J1 Virginia Tobacco 5%",
            "VIRGINIA TOBACCO 5% (DDS00451B)",
            "PURPLE TOBACCO3% (E-400514)",
            "VERMONT TOBACCO  5% (E-400454)",
            "Classic Tobacco 5% (345-00006)",
        ]
    );
    assert_eq!(heatmap.recipes().boundaries(), vec![2, 3, 4]);
    assert_eq!(
        heatmap.display_recipe(0).as_deref(),
        Some("G1-J1 Virginia Tobacco 5%")
    );
}

#[test]
fn test_unlisted_recipe_band_with_ungrouped_fallback() {
    let heatmap = load(RecipeFallback::Ungrouped);
    assert_eq!(heatmap.recipes().len(), 6);
    let last = heatmap.recipes().get(5).unwrap();
    assert_eq!(last.id, "House Blend X");
    assert_eq!(last.group, "Ungrouped");
}

#[test]
fn test_ingredient_columns_follow_sensory_order() {
    let heatmap = load(RecipeFallback::Drop);
    let cols: Vec<&str> = heatmap.ingredients().ids().collect();
    assert_eq!(
        cols,
        vec![
            "Vanillin",
            "Ethyl Maltol",
            "Acetyl Pyrazine",
            "Tobacco Absolute",
            "Harsh Leaf",
            "Menthol",
            "Mystery Note",
        ]
    );

    let spans: Vec<(String, usize)> = heatmap
        .ingredients()
        .spans()
        .into_iter()
        .map(|s| (s.group, s.len))
        .collect();
    assert_eq!(
        spans,
        vec![
            ("Sweet".to_string(), 2),
            ("Dry".to_string(), 1),
            ("Rich".to_string(), 1),
            ("Harsh".to_string(), 1),
            ("Cooling".to_string(), 1),
            ("Ungrouped".to_string(), 1),
        ]
    );
}

#[test]
fn test_visibility_counts_per_policy() {
    let heatmap = load(RecipeFallback::Drop);

    let exclusive = heatmap.stats(&Threshold::STATIC_DEFAULT);
    assert_eq!((exclusive.shown, exclusive.possible), (11, 35));

    let inclusive = heatmap.stats(&Threshold::inclusive(0.45));
    assert_eq!(inclusive.shown, 13);

    let interactive = heatmap.stats(&Threshold::INTERACTIVE_DEFAULT);
    assert_eq!(interactive.shown, 15);
}

#[test]
fn test_group_selection_on_fixture() {
    let heatmap = load(RecipeFallback::Drop);
    let g1 = heatmap.group_selection("G1").unwrap();
    assert_eq!(
        g1,
        Selection::only([
            "J1 Virginia Tobacco 5%",
            "VIRGINIA TOBACCO 5% (DDS00451B)",
        ])
    );
    assert_eq!(heatmap.group_selection("G4 - Unique"), heatmap.group_selection("G4"));
    assert!(heatmap.group_selection("Ungrouped").is_none());

    // Only G1's two rows keep ramp colors; passing cells in the other rows go gray
    let view = heatmap.view(Threshold::STATIC_DEFAULT, &g1);
    let active = view.cells().filter(|c| matches!(c.state, CellState::Active(_))).count();
    let inactive = view.cells().filter(|c| matches!(c.state, CellState::Inactive(_))).count();
    assert_eq!(active, 4);
    assert_eq!(inactive, 7);

    let with_unlisted = load(RecipeFallback::Ungrouped);
    assert_eq!(
        with_unlisted.group_selection("Ungrouped"),
        Some(Selection::only(["House Blend X"]))
    );
}

#[test]
fn test_summary_reports_unlisted_and_ungrouped() {
    let heatmap = load(RecipeFallback::Drop);
    let summary =
        GroupingSummary::new(&heatmap).with_visibility(&heatmap, &Threshold::STATIC_DEFAULT);
    assert_eq!(summary.unlisted_recipes, vec!["House Blend X".to_string()]);
    assert_eq!(summary.ungrouped_ingredients, vec!["Mystery Note".to_string()]);
    assert_eq!(summary.classified, 8);

    let json: serde_json::Value = serde_json::from_str(&render_json(&summary)).unwrap();
    assert_eq!(json["rows"], 5);
    assert_eq!(json["columns"], 7);
    assert_eq!(json["visibility"]["shown"], 11);
}

#[test]
fn test_writes_png_and_html_artifacts() {
    let heatmap = load(RecipeFallback::Drop);
    let dir = TempDir::new().unwrap();

    let all = Selection::All;
    let png_path = dir.path().join("static.png");
    let raster = RasterRenderer::new(640, 400).without_labels();
    let written = render_to_file(
        &raster,
        &heatmap.view(Threshold::STATIC_DEFAULT, &all),
        &png_path,
    )
    .unwrap();
    let png = fs::read(&png_path).unwrap();
    assert_eq!(png.len() as u64, written);
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let none = Selection::none();
    let html_path = dir.path().join("standalone.html");
    render_to_file(
        &StandaloneRenderer::default(),
        &heatmap.view(Threshold::INTERACTIVE_DEFAULT, &none),
        &html_path,
    )
    .unwrap();
    let html = fs::read_to_string(&html_path).unwrap();
    assert!(html.contains("Interactive Tobacco Heatmap"));
    assert!(html.contains("G1-J1 Virginia Tobacco 5%"));
    assert!(!html.contains("House Blend X"));
}

#[test]
fn test_renders_are_deterministic() {
    let first = load(RecipeFallback::Drop);
    let second = load(RecipeFallback::Drop);
    let none = Selection::none();

    let a = heatmap_core::render::html::render_standalone(
        &first.view(Threshold::INTERACTIVE_DEFAULT, &none),
        "t",
    )
    .unwrap();
    let b = heatmap_core::render::html::render_standalone(
        &second.view(Threshold::INTERACTIVE_DEFAULT, &none),
        "t",
    )
    .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_missing_sensory_column_is_an_error() {
    let err = loader::load_sensory_map(&fixture_path("Sensory_Missing_Column.xlsx")).unwrap_err();
    assert!(format!("{:#}", err).contains("missing required column 'Sensory Note'"));
}

#[test]
fn test_non_numeric_cell_is_absent() {
    let matrix = loader::load_matrix(&fixture_path("Data_Bad_Cell.xlsx")).unwrap();
    assert_eq!(matrix.shape(), (1, 1));
    assert_eq!(matrix.get("J1 Virginia Tobacco 5%", "Vanillin"), None);
}

#[test]
fn test_missing_workbook_is_an_error() {
    let err = load_heatmap(
        &fixture_path("does_not_exist.xlsx"),
        &fixture_path("Sensory_Note.xlsx"),
        GroupTables::tobacco(),
        RecipeFallback::Drop,
    )
    .unwrap_err();
    assert!(format!("{:#}", err).contains("does_not_exist.xlsx"));
}
