//! Property tests for ordering and threshold filtering

use heatmap_core::{
    ConcentrationMatrix, GroupTables, Heatmap, RecipeFallback, RecipeGroup, SensoryMap, Threshold,
};
use proptest::prelude::*;
use std::collections::HashSet;

const LABELS: [&str; 9] = [
    "Sweet", "Dry", "Rich", "Light", "Smooth", "Harsh", "Cooling", "Earthy", "sweet",
];

/// Matrix over a random subset of r0..r9 x i0..i7, plus labels and group tables
/// that may name recipes absent from the matrix.
fn scenario() -> impl Strategy<Value = (ConcentrationMatrix, SensoryMap, GroupTables)> {
    (
        proptest::collection::vec(any::<bool>(), 10),
        proptest::collection::vec(any::<bool>(), 8),
        proptest::collection::vec(proptest::option::of(0.0f64..1.0), 80),
        proptest::collection::vec(proptest::option::of(0..LABELS.len()), 8),
        proptest::collection::vec(proptest::collection::vec(0..12usize, 0..6), 1..5),
    )
        .prop_map(|(recipe_mask, ingredient_mask, cells, labels, groups)| {
            let recipes: Vec<String> = (0..10)
                .filter(|i| recipe_mask[*i])
                .map(|i| format!("r{}", i))
                .collect();
            let ingredients: Vec<String> = (0..8)
                .filter(|i| ingredient_mask[*i])
                .map(|i| format!("i{}", i))
                .collect();
            let rows = (0..recipes.len())
                .map(|r| {
                    (0..ingredients.len())
                        .map(|c| cells[r * 8 + c])
                        .collect()
                })
                .collect();
            let matrix = ConcentrationMatrix::new(recipes, ingredients, rows).unwrap();

            let map = SensoryMap::from_rows(labels.iter().enumerate().map(|(i, label)| {
                (
                    Some(format!("i{}", i)),
                    label.map(|l| LABELS[l].to_string()),
                )
            }));

            let tables = GroupTables::new(
                groups
                    .iter()
                    .enumerate()
                    .map(|(g, members)| RecipeGroup {
                        name: format!("Group {}", g),
                        label: format!("G{}", g),
                        members: members.iter().map(|m| format!("r{}", m)).collect(),
                    })
                    .collect(),
            );

            (matrix, map, tables)
        })
}

proptest! {
    #[test]
    fn prop_rows_are_unique_and_follow_tables(
        (matrix, map, tables) in scenario(),
    ) {
        let heatmap = Heatmap::build(matrix.clone(), &map, tables.clone(), RecipeFallback::Drop);
        let rows: Vec<&str> = heatmap.recipes().ids().collect();

        let unique: HashSet<&str> = rows.iter().copied().collect();
        prop_assert_eq!(unique.len(), rows.len());

        // Expected: table members in declaration order, first occurrence, present only
        let mut seen = HashSet::new();
        let expected: Vec<&str> = tables
            .recipe_groups
            .iter()
            .flat_map(|g| g.members.iter().map(String::as_str))
            .filter(|r| matrix.contains_recipe(r) && seen.insert(*r))
            .collect();
        prop_assert_eq!(rows, expected);
    }

    #[test]
    fn prop_ungrouped_fallback_keeps_every_recipe(
        (matrix, map, tables) in scenario(),
    ) {
        let heatmap = Heatmap::build(matrix.clone(), &map, tables, RecipeFallback::Ungrouped);
        let rows: HashSet<&str> = heatmap.recipes().ids().collect();
        let all: HashSet<&str> = matrix.recipes().iter().map(String::as_str).collect();
        prop_assert_eq!(heatmap.recipes().len(), matrix.recipes().len());
        prop_assert_eq!(rows, all);
    }

    #[test]
    fn prop_every_column_appears_exactly_once(
        (matrix, map, tables) in scenario(),
    ) {
        let heatmap = Heatmap::build(matrix.clone(), &map, tables, RecipeFallback::Drop);
        let mut cols: Vec<&str> = heatmap.ingredients().ids().collect();
        let mut expected: Vec<&str> = matrix.ingredients().iter().map(String::as_str).collect();
        cols.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(cols, expected);
        prop_assert_eq!(heatmap.grouping().total(), matrix.ingredients().len());
    }

    #[test]
    fn prop_columns_are_contiguous_by_group(
        (matrix, map, tables) in scenario(),
    ) {
        let heatmap = Heatmap::build(matrix, &map, tables, RecipeFallback::Drop);
        let spans = heatmap.ingredients().spans();
        let groups: HashSet<&str> = spans.iter().map(|s| s.group.as_str()).collect();
        prop_assert_eq!(groups.len(), spans.len());
    }

    #[test]
    fn prop_layout_is_deterministic(
        (matrix, map, tables) in scenario(),
    ) {
        let a = Heatmap::build(matrix.clone(), &map, tables.clone(), RecipeFallback::Ungrouped);
        let b = Heatmap::build(matrix, &map, tables, RecipeFallback::Ungrouped);
        prop_assert_eq!(a.layout(), b.layout());
    }

    #[test]
    fn prop_raising_cutoff_never_reveals_cells(
        (matrix, map, tables) in scenario(),
        low in 0.0f64..1.0,
        delta in 0.0f64..1.0,
    ) {
        let heatmap = Heatmap::build(matrix, &map, tables, RecipeFallback::Drop);
        let high = low + delta;

        for row in 0..heatmap.recipes().len() {
            for col in 0..heatmap.ingredients().len() {
                let value = heatmap.value_at(row, col);
                for (strict, loose) in [
                    (Threshold::inclusive(high), Threshold::inclusive(low)),
                    (Threshold::exclusive(high), Threshold::exclusive(low)),
                ] {
                    prop_assert!(
                        !strict.is_visible(value) || loose.is_visible(value),
                        "cell ({}, {}) = {:?} shown at {} but hidden at {}",
                        row, col, value, strict.describe(), loose.describe()
                    );
                }
                for cutoff in [low, high] {
                    prop_assert!(
                        !Threshold::exclusive(cutoff).is_visible(value)
                            || Threshold::inclusive(cutoff).is_visible(value)
                    );
                }
            }
        }

        let loose = heatmap.stats(&Threshold::inclusive(low));
        prop_assert!(loose.shown <= loose.possible);
    }
}
