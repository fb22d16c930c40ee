//! Dashboard page

use axum::{extract::State, response::Html};
use heatmap_core::render::render_dashboard_page;

use crate::AppState;

/// GET /
///
/// Serves the dashboard with the grid pre-rendered at the default threshold
pub async fn serve_index(State(state): State<AppState>) -> Html<String> {
    Html(render_dashboard_page(&state.heatmap, state.default_threshold))
}
