//! Spreadsheet input
//!
//! Reads the first worksheet of each workbook (xlsx, xls, ods, ...).
//!
//! - Concentration workbook: header row of ingredient names, first column of
//!   recipe ids, numeric cells. Blank cells are absent values.
//! - Sensory workbook: header row containing `product` and `Sensory Note`.

use crate::classify::SensoryMap;
use crate::matrix::ConcentrationMatrix;
use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::debug;

pub const PRODUCT_COLUMN: &str = "product";
pub const SENSORY_NOTE_COLUMN: &str = "Sensory Note";

fn first_sheet(path: &Path) -> Result<Range<Data>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook: {}", path.display()))?;
    workbook
        .worksheet_range_at(0)
        .with_context(|| format!("workbook has no worksheets: {}", path.display()))?
        .with_context(|| format!("failed to read first worksheet of {}", path.display()))
}

/// Text of a cell, `None` when blank
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Numeric value of a cell. Blank, error (#N/A) and non-numeric cells are
/// absent.
fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Build the concentration matrix from a worksheet range.
pub fn matrix_from_range(range: &Range<Data>) -> Result<ConcentrationMatrix> {
    let mut rows = range.rows();
    let header = rows.next().context("concentration sheet is empty")?;

    // (sheet column, ingredient) for every named column after the index
    let columns: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(i, cell)| cell_text(cell).map(|name| (i, name)))
        .collect();
    if columns.len() + 1 < header.len() {
        debug!(
            skipped = header.len() - 1 - columns.len(),
            "ignoring unnamed matrix columns"
        );
    }

    let mut recipes = Vec::new();
    let mut values = Vec::new();
    for (offset, row) in rows.enumerate() {
        let sheet_row = offset + 2;
        let Some(recipe) = row.first().and_then(cell_text) else {
            debug!(row = sheet_row, "skipping matrix row without recipe id");
            continue;
        };
        let cells: Vec<Option<f64>> = columns
            .iter()
            .map(|(col, ingredient)| {
                let cell = row.get(*col).unwrap_or(&Data::Empty);
                let value = cell_number(cell);
                if value.is_none() && cell_text(cell).is_some() {
                    debug!(
                        row = sheet_row,
                        recipe = %recipe,
                        ingredient = %ingredient,
                        "non-numeric cell treated as absent"
                    );
                }
                value
            })
            .collect();
        recipes.push(recipe);
        values.push(cells);
    }

    let ingredients = columns.into_iter().map(|(_, name)| name).collect();
    ConcentrationMatrix::new(recipes, ingredients, values)
}

/// Build the sensory lookup from a worksheet range.
pub fn sensory_from_range(range: &Range<Data>) -> Result<SensoryMap> {
    let mut rows = range.rows();
    let header = rows.next().context("sensory sheet is empty")?;

    let find = |name: &str| {
        header
            .iter()
            .position(|cell| cell_text(cell).is_some_and(|h| h.trim() == name))
            .with_context(|| format!("missing required column '{}'", name))
    };
    let product = find(PRODUCT_COLUMN)?;
    let note = find(SENSORY_NOTE_COLUMN)?;

    Ok(SensoryMap::from_rows(rows.map(|row| {
        (
            row.get(product).and_then(cell_text),
            row.get(note).and_then(cell_text),
        )
    })))
}

/// Load the concentration matrix from the first sheet of a workbook.
pub fn load_matrix(path: &Path) -> Result<ConcentrationMatrix> {
    let range = first_sheet(path)?;
    let matrix = matrix_from_range(&range)
        .with_context(|| format!("invalid concentration data in {}", path.display()))?;
    let (rows, cols) = matrix.shape();
    debug!(path = %path.display(), rows, cols, "loaded concentration matrix");
    Ok(matrix)
}

/// Load the ingredient classification from the first sheet of a workbook.
pub fn load_sensory_map(path: &Path) -> Result<SensoryMap> {
    let range = first_sheet(path)?;
    let map = sensory_from_range(&range)
        .with_context(|| format!("invalid sensory data in {}", path.display()))?;
    debug!(path = %path.display(), ingredients = map.len(), "loaded sensory classification");
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[Data]]) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    #[test]
    fn test_matrix_from_range() {
        let range = sheet(&[
            &[Data::Empty, s("vanillin"), s("menthol")],
            &[s("r1"), Data::Float(0.5), Data::Empty],
            &[s("r2"), Data::Int(1), s(" 0.25 ")],
        ]);
        let m = matrix_from_range(&range).unwrap();
        assert_eq!(m.recipes(), &["r1".to_string(), "r2".to_string()]);
        assert_eq!(m.ingredients(), &["vanillin".to_string(), "menthol".to_string()]);
        assert_eq!(m.get("r1", "vanillin"), Some(0.5));
        assert_eq!(m.get("r1", "menthol"), None);
        assert_eq!(m.get("r2", "vanillin"), Some(1.0));
        assert_eq!(m.get("r2", "menthol"), Some(0.25));
    }

    #[test]
    fn test_blank_rows_and_unnamed_columns_skipped() {
        let range = sheet(&[
            &[Data::Empty, s("a"), Data::Empty, s("b")],
            &[s("r1"), Data::Float(0.1), Data::Float(9.0), Data::Float(0.2)],
            &[Data::Empty, Data::Float(0.3), Data::Empty, Data::Empty],
        ]);
        let m = matrix_from_range(&range).unwrap();
        assert_eq!(m.shape(), (1, 2));
        assert_eq!(m.get("r1", "b"), Some(0.2));
    }

    #[test]
    fn test_non_numeric_cells_are_absent() {
        let range = sheet(&[
            &[Data::Empty, s("a"), s("b")],
            &[s("r1"), s("lots"), Data::Error(calamine::CellErrorType::NA)],
        ]);
        let m = matrix_from_range(&range).unwrap();
        assert_eq!(m.get("r1", "a"), None);
        assert_eq!(m.get("r1", "b"), None);
        assert_eq!(m.value("r1", "a"), 0.0);
    }

    #[test]
    fn test_negative_cell_rejected() {
        let range = sheet(&[&[Data::Empty, s("a")], &[s("r1"), Data::Float(-0.2)]]);
        let err = matrix_from_range(&range).unwrap_err();
        assert!(format!("{:#}", err).contains("r1"));
    }

    #[test]
    fn test_duplicate_recipe_rejected() {
        let range = sheet(&[
            &[Data::Empty, s("a")],
            &[s("r1"), Data::Float(0.1)],
            &[s("r1"), Data::Float(0.2)],
        ]);
        assert!(matrix_from_range(&range).is_err());
    }

    #[test]
    fn test_sensory_from_range() {
        let range = sheet(&[
            &[s("Sensory Note"), s("id"), s("product")],
            &[s("Sweet"), Data::Int(1), s("vanillin")],
            &[Data::Empty, Data::Int(2), s("menthol")],
            &[s("Cooling"), Data::Int(3), s("menthol")],
        ]);
        let map = sensory_from_range(&range).unwrap();
        assert_eq!(map.label("vanillin"), Some("Sweet"));
        assert_eq!(map.label("menthol"), Some("Cooling"));
        assert_eq!(map.stats().ignored_rows, 1);
    }

    #[test]
    fn test_sensory_missing_column() {
        let range = sheet(&[&[s("product"), s("Note")], &[s("x"), s("Sweet")]]);
        let err = sensory_from_range(&range).unwrap_err();
        assert!(err.to_string().contains("Sensory Note"));
    }

    #[test]
    fn test_missing_workbook_reports_path() {
        let err = load_matrix(Path::new("no/such/Data_Raw.xlsx")).unwrap_err();
        assert!(format!("{:#}", err).contains("Data_Raw.xlsx"));
    }
}
