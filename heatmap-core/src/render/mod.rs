//! Heatmap renderers
//!
//! Every back-end consumes the same [`HeatmapView`]; none of them re-derives
//! grouping, ordering or visibility.

pub mod html;
pub mod raster;

use crate::heatmap::HeatmapView;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub use html::{render_dashboard_page, render_grid_fragment, StandaloneRenderer};
pub use raster::RasterRenderer;

/// A back-end turning a view into a file artifact
pub trait Renderer {
    /// Short name used in logs ("png", "html")
    fn name(&self) -> &'static str;

    /// File extension of the artifact, without the dot
    fn extension(&self) -> &'static str;

    fn render(&self, view: &HeatmapView<'_>) -> Result<Vec<u8>>;
}

/// `path` with the renderer's extension added when it has none
pub fn output_path(renderer: &dyn Renderer, path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(renderer.extension())
    }
}

/// Render a view and write it to `path` atomically.
pub fn render_to_file(
    renderer: &dyn Renderer,
    view: &HeatmapView<'_>,
    path: &Path,
) -> Result<u64> {
    let bytes = renderer
        .render(view)
        .with_context(|| format!("failed to render {} heatmap", renderer.name()))?;
    write_artifact(path, &bytes)?;
    Ok(bytes.len() as u64)
}

/// Write bytes to a file with the temp + rename pattern
pub fn write_artifact(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
    }

    let temp_path = path.with_extension("tmp");
    let written = write_temp(&temp_path, contents).and_then(|()| {
        fs::rename(&temp_path, path)
            .with_context(|| format!("failed to rename temp file to: {}", path.display()))
    });
    if written.is_err() {
        // A failed write must not leave a partial temp file next to the target
        let _ = fs::remove_file(&temp_path);
    }
    written
}

fn write_temp(temp_path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = fs::File::create(temp_path)
        .with_context(|| format!("failed to create temp file: {}", temp_path.display()))?;
    file.write_all(contents)
        .with_context(|| format!("failed to write to temp file: {}", temp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("failed to sync temp file: {}", temp_path.display()))
}
