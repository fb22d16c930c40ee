//! Static PNG heatmap
//!
//! Draws in pixel space on an in-memory bitmap, then encodes it as PNG. Cells
//! below the threshold are left blank (white), group boundaries are red.

use super::Renderer;
use crate::color::{viridis, Rgb};
use crate::heatmap::HeatmapView;
use crate::threshold::CellState;
use anyhow::{Context, Result};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::warn;

pub const DEFAULT_TITLE: &str =
    "Tobacco Recipes Heatmap: Recipes by G1-G4 Groups x Ingredients by Sensory Notes";

const BOUNDARY: RGBColor = RGBColor(255, 0, 0);
const FRAME: RGBColor = RGBColor(128, 128, 128);
const COLORBAR_GAP: i32 = 30;
const COLORBAR_WIDTH: i32 = 30;

#[derive(Debug, Clone)]
pub struct RasterRenderer {
    pub width: u32,
    pub height: u32,
    /// Title, tick labels and legend text. Needs a system font.
    pub draw_labels: bool,
    pub title: String,
}

impl RasterRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        RasterRenderer {
            width,
            height,
            draw_labels: true,
            title: DEFAULT_TITLE.to_string(),
        }
    }

    pub fn without_labels(mut self) -> Self {
        self.draw_labels = false;
        self
    }

    /// Pixel geometry for a grid of `rows` x `cols`
    pub fn layout(&self, rows: usize, cols: usize) -> Result<PlotLayout> {
        let (w, h) = (self.width as i32, self.height as i32);
        let (left, top, bottom) = if self.draw_labels {
            ((w as f64 * 0.2) as i32, 90, 220)
        } else {
            (10, 10, 10)
        };
        let right = COLORBAR_GAP + COLORBAR_WIDTH + if self.draw_labels { 90 } else { 10 };

        let plot_w = w - left - right;
        let plot_h = h - top - bottom;
        if plot_w <= 0 || plot_h <= 0 {
            anyhow::bail!(
                "image {}x{} is too small for the heatmap layout",
                self.width,
                self.height
            );
        }

        Ok(PlotLayout {
            left,
            top,
            width: plot_w,
            height: plot_h,
            rows,
            cols,
        })
    }
}

impl Default for RasterRenderer {
    fn default() -> Self {
        RasterRenderer::new(2400, 1400)
    }
}

/// Where the grid sits inside the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotLayout {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub rows: usize,
    pub cols: usize,
}

impl PlotLayout {
    /// Left edge of column `col` (`col == cols` gives the right edge)
    pub fn col_x(&self, col: usize) -> i32 {
        if self.cols == 0 {
            return self.left;
        }
        self.left + (col as i64 * self.width as i64 / self.cols as i64) as i32
    }

    /// Top edge of row `row` (`row == rows` gives the bottom edge)
    pub fn row_y(&self, row: usize) -> i32 {
        if self.rows == 0 {
            return self.top;
        }
        self.top + (row as i64 * self.height as i64 / self.rows as i64) as i32
    }

    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub fn cell_center(&self, row: usize, col: usize) -> (i32, i32) {
        (
            (self.col_x(col) + self.col_x(col + 1)) / 2,
            (self.row_y(row) + self.row_y(row + 1)) / 2,
        )
    }

    pub fn colorbar_x(&self) -> (i32, i32) {
        let x0 = self.right() + COLORBAR_GAP;
        (x0, x0 + COLORBAR_WIDTH - 1)
    }
}

impl Renderer for RasterRenderer {
    fn name(&self) -> &'static str {
        "png"
    }

    fn extension(&self) -> &'static str {
        "png"
    }

    fn render(&self, view: &HeatmapView<'_>) -> Result<Vec<u8>> {
        let layout = self.layout(view.rows(), view.cols())?;
        let mut buffer = vec![255u8; self.width as usize * self.height as usize * 3];

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (self.width, self.height))
                .into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            draw_cells(&root, view, &layout)?;
            draw_boundaries(&root, view, &layout)?;
            draw_colorbar(&root, &layout)?;

            if self.draw_labels {
                if let Err(err) = draw_labels(&root, view, &layout, &self.title) {
                    warn!("could not draw heatmap labels: {:#}", err);
                }
            }

            root.present().map_err(draw_err)?;
        }

        encode_png(&buffer, self.width, self.height)
    }
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

fn draw_err<E: std::fmt::Display>(err: E) -> anyhow::Error {
    anyhow::anyhow!("drawing failed: {}", err)
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

fn fill(
    root: &Area<'_>,
    (x0, y0): (i32, i32),
    (x1, y1): (i32, i32),
    color: RGBColor,
) -> Result<()> {
    root.draw(&Rectangle::new([(x0, y0), (x1, y1)], color.filled()))
        .map_err(draw_err)
}

fn draw_cells(root: &Area<'_>, view: &HeatmapView<'_>, layout: &PlotLayout) -> Result<()> {
    for cell in view.cells() {
        if cell.state == CellState::Hidden {
            continue;
        }
        fill(
            root,
            (layout.col_x(cell.col), layout.row_y(cell.row)),
            (layout.col_x(cell.col + 1) - 1, layout.row_y(cell.row + 1) - 1),
            rgb(cell.color()),
        )?;
    }

    root.draw(&Rectangle::new(
        [(layout.left, layout.top), (layout.right(), layout.bottom())],
        FRAME.stroke_width(1),
    ))
    .map_err(draw_err)
}

/// Red separators between consecutive sensory groups and recipe groups
fn draw_boundaries(root: &Area<'_>, view: &HeatmapView<'_>, layout: &PlotLayout) -> Result<()> {
    for col in view.heatmap.ingredients().boundaries() {
        let x = layout.col_x(col);
        fill(root, (x - 1, layout.top), (x + 1, layout.bottom()), BOUNDARY)?;
    }
    for row in view.heatmap.recipes().boundaries() {
        let y = layout.row_y(row);
        fill(root, (layout.left, y - 1), (layout.right(), y + 1), BOUNDARY)?;
    }
    Ok(())
}

/// Vertical ramp, 1.0 at the top
fn draw_colorbar(root: &Area<'_>, layout: &PlotLayout) -> Result<()> {
    let (x0, x1) = layout.colorbar_x();
    let span = (layout.height - 1).max(1) as f64;
    for dy in 0..layout.height {
        let y = layout.top + dy;
        let value = 1.0 - dy as f64 / span;
        fill(root, (x0, y), (x1, y), rgb(viridis(value)))?;
    }
    root.draw(&Rectangle::new(
        [(x0, layout.top), (x1, layout.bottom() - 1)],
        FRAME.stroke_width(1),
    ))
    .map_err(draw_err)
}

fn draw_labels(
    root: &Area<'_>,
    view: &HeatmapView<'_>,
    layout: &PlotLayout,
    title: &str,
) -> Result<()> {
    let heatmap = view.heatmap;
    let (w, _) = root.dim_in_pixel();

    let title_style = TextStyle::from(("sans-serif", 28).into_font().style(FontStyle::Bold))
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));
    root.draw_text(title, &title_style, (w as i32 / 2, 10))
        .map_err(draw_err)?;

    let group_style = TextStyle::from(("sans-serif", 16).into_font().style(FontStyle::Bold))
        .color(&RGBColor(0, 0, 139))
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    for span in heatmap.ingredients().spans() {
        let x = (layout.col_x(span.start) + layout.col_x(span.start + span.len)) / 2;
        root.draw_text(&span.group, &group_style, (x, layout.top - 6))
            .map_err(draw_err)?;
    }

    let recipe_style = TextStyle::from(("sans-serif", 13).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Right, VPos::Center));
    for row in 0..view.rows() {
        let Some(name) = heatmap.display_recipe(row) else {
            continue;
        };
        let (_, y) = layout.cell_center(row, 0);
        root.draw_text(&name, &recipe_style, (layout.left - 8, y))
            .map_err(draw_err)?;
    }

    let ingredient_style = TextStyle::from(
        ("sans-serif", 11)
            .into_font()
            .transform(FontTransform::Rotate90),
    )
    .color(&BLACK);
    for (col, id) in heatmap.ingredients().ids().enumerate() {
        let (x, _) = layout.cell_center(0, col);
        root.draw_text(id, &ingredient_style, (x + 5, layout.bottom() + 6))
            .map_err(draw_err)?;
    }

    let axis_style = TextStyle::from(("sans-serif", 16).into_font().style(FontStyle::Bold))
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    root.draw_text(
        "Ingredients (Grouped by Sensory Notes)",
        &axis_style,
        ((layout.left + layout.right()) / 2, layout.bottom() + 215),
    )
    .map_err(draw_err)?;
    root.draw_text(
        "Tobacco Recipes (Grouped by G1-G4)",
        &axis_style,
        (layout.left / 2, layout.top - 30),
    )
    .map_err(draw_err)?;

    let tick_style = TextStyle::from(("sans-serif", 12).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));
    let (_, bar_right) = layout.colorbar_x();
    for i in 0..=5 {
        let value = i as f64 / 5.0;
        let y = layout.bottom() - 1 - ((layout.height - 1) as f64 * value) as i32;
        root.draw_text(&format!("{:.1}", value), &tick_style, (bar_right + 6, y))
            .map_err(draw_err)?;
    }
    let bar_title = TextStyle::from(("sans-serif", 14).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    root.draw_text(
        "Concentration",
        &bar_title,
        (layout.colorbar_x().0 + COLORBAR_WIDTH / 2, layout.top - 6),
    )
    .map_err(draw_err)?;

    Ok(())
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(buffer, width, height, ColorType::Rgb8)
        .context("failed to encode PNG")?;
    Ok(out)
}
