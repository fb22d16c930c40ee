//! HTTP API handlers for the heatmap dashboard

pub mod error;
pub mod grid;
pub mod health;
pub mod ui;

pub use error::ApiError;
pub use grid::{get_grid, get_heatmap, ViewQuery};
pub use health::health_routes;
pub use ui::serve_index;
