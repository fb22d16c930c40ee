//! HTML heatmap generation
//!
//! Two outputs share one stylesheet:
//! - a standalone document with the ordered grid embedded as JSON and a script
//!   that re-colors cells when the threshold or the recipe selection changes;
//! - a server-rendered grid fragment (plus the page hosting it) for the
//!   dashboard, where every cell color is computed in Rust.
//!
//! Both work offline and carry no external assets.

use super::Renderer;
use crate::color::{css_gradient, INACTIVE, NEUTRAL, VIRIDIS_STOPS};
use crate::groups::SensoryGroup;
use crate::heatmap::{Heatmap, HeatmapView};
use crate::threshold::{Selection, Threshold, ThresholdPolicy};
use anyhow::{Context, Result};
use serde_json::{json, Value};

pub const DEFAULT_TITLE: &str = "Interactive Tobacco Heatmap";

/// Self-contained interactive document
#[derive(Debug, Clone)]
pub struct StandaloneRenderer {
    pub title: String,
}

impl Default for StandaloneRenderer {
    fn default() -> Self {
        StandaloneRenderer {
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl Renderer for StandaloneRenderer {
    fn name(&self) -> &'static str {
        "html"
    }

    fn extension(&self) -> &'static str {
        "html"
    }

    fn render(&self, view: &HeatmapView<'_>) -> Result<Vec<u8>> {
        Ok(render_standalone(view, &self.title)?.into_bytes())
    }
}

/// Render the standalone document.
///
/// The view's threshold and selection become the page's initial state.
pub fn render_standalone(view: &HeatmapView<'_>, title: &str) -> Result<String> {
    let data = script_json(&embedded_data(view)).context("failed to serialize heatmap data")?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
        {controls}
        <div class="heatmap-container">
            <div class="heatmap-wrapper">
                <table class="heatmap" id="heatmap-table"></table>
            </div>
            {legend}
        </div>
    </div>
    <div class="tooltip" id="tooltip"></div>
    <script type="application/json" id="heatmap-data">{data}</script>
    <script>{js}</script>
</body>
</html>"#,
        title = html_escape(title),
        css = inline_css(),
        controls = render_controls(view.heatmap, &view.threshold, false),
        legend = render_legend(),
        data = data,
        js = standalone_javascript(),
    ))
}

/// Everything the standalone script needs, in display order
fn embedded_data(view: &HeatmapView<'_>) -> Value {
    let heatmap = view.heatmap;

    let recipes: Vec<Value> = heatmap
        .recipes()
        .entries()
        .iter()
        .enumerate()
        .map(|(row, entry)| {
            json!({
                "id": entry.id,
                "display": heatmap.display_recipe(row).unwrap_or_else(|| entry.id.clone()),
                "group": entry.group,
            })
        })
        .collect();

    let ingredients: Vec<Value> = heatmap
        .ingredients()
        .entries()
        .iter()
        .map(|entry| json!({ "id": entry.id, "group": entry.group }))
        .collect();

    let values: Vec<Vec<Option<f64>>> = (0..view.rows())
        .map(|row| (0..view.cols()).map(|col| heatmap.value_at(row, col)).collect())
        .collect();

    let spans: Vec<Value> = heatmap
        .ingredients()
        .spans()
        .into_iter()
        .map(|span| {
            json!({
                "group": span.group,
                "start": span.start,
                "len": span.len,
                "color": group_color(&span.group),
            })
        })
        .collect();

    let selected = match view.selection {
        Selection::All => Value::Null,
        Selection::Only(set) => json!(set),
    };

    json!({
        "recipes": recipes,
        "ingredients": ingredients,
        "values": values,
        "sensorySpans": spans,
        "threshold": view.threshold.cutoff,
        "policy": view.threshold.policy.as_str(),
        "selected": selected,
        "ramp": VIRIDIS_STOPS.iter().map(|c| [c.0, c.1, c.2]).collect::<Vec<_>>(),
        "neutral": NEUTRAL.css(),
        "inactive": INACTIVE.css(),
    })
}

/// Render the dashboard's grid: header row, one row per recipe, ingredient row
/// and a statistics line. Cell colors are final; the browser only swaps HTML.
pub fn render_grid_fragment(view: &HeatmapView<'_>) -> String {
    let heatmap = view.heatmap;
    let ingredients = heatmap.ingredients();

    let headers: String = ingredients
        .spans()
        .iter()
        .map(|span| {
            format!(
                r#"<td class="sensory-group-header {class}" colspan="{len}">{name}</td>"#,
                class = span.group.to_lowercase(),
                len = span.len,
                name = html_escape(&span.group),
            )
        })
        .collect();

    let mut rows = String::new();
    for row in 0..view.rows() {
        let Some(entry) = heatmap.recipes().get(row) else {
            continue;
        };
        let display = heatmap
            .display_recipe(row)
            .unwrap_or_else(|| entry.id.clone());
        let selected = match view.selection {
            Selection::All => false,
            Selection::Only(set) => set.contains(&entry.id),
        };
        let band = if heatmap.recipes().starts_group(row) && row > 0 {
            " group-start"
        } else {
            ""
        };

        let cells: String = view
            .row_cells(row)
            .map(|cell| {
                let border = if ingredients.starts_group(cell.col) {
                    format!(
                        " style=\"background-color: {}; border-left: 3px solid {}\"",
                        cell.color().css(),
                        group_color(ingredients.group_of(cell.ingredient).unwrap_or_default())
                    )
                } else {
                    format!(" style=\"background-color: {}\"", cell.color().css())
                };
                format!(
                    r#"<td class="heatmap-cell {state}"{border} title="Recipe: {recipe}&#10;Ingredient: {ingredient}&#10;Value: {value}"></td>"#,
                    state = cell.state.as_str(),
                    border = border,
                    recipe = html_escape(cell.recipe),
                    ingredient = html_escape(cell.ingredient),
                    value = format_value(cell.value),
                )
            })
            .collect();

        rows.push_str(&format!(
            r#"<tr class="recipe-row{band}"><td class="recipe-label" title="{display}"><span class="recipe-text">{display}</span><button class="recipe-button{selected}" data-row="{row}" title="Click to select/deselect {display}">&#9679;</button></td>{cells}</tr>
"#,
            band = band,
            display = html_escape(&display),
            selected = if selected { " selected" } else { "" },
            row = row,
            cells = cells,
        ));
    }

    let footer: String = ingredients
        .ids()
        .map(|id| {
            format!(
                r#"<td class="ingredient-header" title="{id}">{id}</td>"#,
                id = html_escape(id)
            )
        })
        .collect();

    let stats = view.stats();
    format!(
        r#"<table class="heatmap" id="heatmap-table">
<tr><td class="recipe-label corner"></td>{headers}</tr>
{rows}<tr><td class="recipe-label corner"></td>{footer}</tr>
</table>
<div class="stats" id="stats">{shown} of {possible} cells shown ({density:.1}%), values {op} {cutoff}</div>"#,
        headers = headers,
        rows = rows,
        footer = footer,
        shown = stats.shown,
        possible = stats.possible,
        density = stats.density * 100.0,
        op = view.threshold.policy.operator(),
        cutoff = view.threshold.cutoff,
    )
}

/// Render the dashboard page, pre-filled with the grid for `threshold` and
/// every recipe active.
pub fn render_dashboard_page(heatmap: &Heatmap, threshold: Threshold) -> String {
    let selection = Selection::All;
    let view = heatmap.view(threshold, &selection);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Tobacco Heatmap Dashboard</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
        {controls}
        <div class="heatmap-container">
            <div class="heatmap-wrapper" id="grid">{grid}</div>
            {legend}
        </div>
    </div>
    <script>{js}</script>
</body>
</html>"#,
        css = inline_css(),
        controls = render_controls(heatmap, &threshold, true),
        grid = render_grid_fragment(&view),
        legend = render_legend(),
        js = dashboard_javascript(),
    )
}

/// Recipe-group picker; option values are full group names
fn render_group_select(heatmap: &Heatmap) -> String {
    let options: String = heatmap
        .recipe_group_labels()
        .iter()
        .map(|(name, _)| {
            format!(
                r#"<option value="{name}">{name}</option>"#,
                name = html_escape(name)
            )
        })
        .collect();
    format!(
        r#"<div class="threshold-label">Recipes:</div>
            <select id="group-input" class="threshold-input group-input"><option value="">All groups</option>{options}</select>"#,
        options = options,
    )
}

/// Threshold input and group picker, plus policy picker and selection
/// shortcuts on the dashboard
fn render_controls(heatmap: &Heatmap, threshold: &Threshold, dashboard: bool) -> String {
    let extra = if dashboard {
        let option = |policy: ThresholdPolicy| {
            format!(
                r#"<option value="{value}"{sel}>{op}</option>"#,
                value = policy.as_str(),
                sel = if policy == threshold.policy {
                    " selected"
                } else {
                    ""
                },
                op = html_escape(policy.operator()),
            )
        };
        format!(
            r#"
            <select id="policy-input" class="threshold-input">{inclusive}{exclusive}</select>
            <button id="select-all" class="control-button">All recipes</button>
            <button id="select-none" class="control-button">None</button>"#,
            inclusive = option(ThresholdPolicy::Inclusive),
            exclusive = option(ThresholdPolicy::Exclusive),
        )
    } else {
        format!(
            r#"<span class="policy-label">values {}</span><span class="stats" id="stats"></span>"#,
            html_escape(threshold.policy.operator())
        )
    };

    format!(
        r#"<div class="top-controls">
            <div class="threshold-label">Threshold:</div>
            <input type="number" id="threshold-input" class="threshold-input" value="{cutoff}" min="0" max="1" step="0.01">
            {groups}
            {extra}
        </div>"#,
        cutoff = threshold.cutoff,
        groups = render_group_select(heatmap),
        extra = extra,
    )
}

/// Vertical color scale, 1.0 at the top
fn render_legend() -> String {
    let labels: String = ["1.0", "0.8", "0.6", "0.4", "0.2", "0.0"]
        .iter()
        .map(|l| format!(r#"<div class="color-scale-label">{}</div>"#, l))
        .collect();
    format!(
        r#"<div class="color-scale">
                <div class="color-scale-title">Value Scale</div>
                <div class="color-scale-body">
                    <div class="color-scale-bar" style="background: {gradient}"></div>
                    <div class="color-scale-labels">{labels}</div>
                </div>
            </div>"#,
        gradient = css_gradient(),
        labels = labels,
    )
}

fn group_color(group: &str) -> &'static str {
    SensoryGroup::from_label(group)
        .unwrap_or(SensoryGroup::Ungrouped)
        .border_color()
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}", v),
        None => "n/a".to_string(),
    }
}

/// Serialize JSON for embedding inside a `<script>` element
fn script_json(value: &Value) -> Result<String> {
    let text = serde_json::to_string(value)?;
    Ok(text.replace('<', "\\u003c"))
}

/// Inline CSS styles
fn inline_css() -> &'static str {
    r#"
body {
    font-family: Arial, sans-serif;
    margin: 0;
    padding: 5px;
    background-color: #f5f5f5;
}

.container {
    display: flex;
    flex-direction: column;
    height: calc(100vh - 10px);
}

/* Controls */
.top-controls {
    background: white;
    padding: 8px 12px;
    border-radius: 6px;
    box-shadow: 0 2px 4px rgba(0,0,0,0.1);
    margin-bottom: 5px;
    display: flex;
    align-items: center;
    gap: 15px;
}

.threshold-label {
    font-size: 14px;
    font-weight: bold;
    color: #333;
}

.threshold-input {
    padding: 5px;
    border: 2px solid #888;
    border-radius: 3px;
    font-size: 12px;
    width: 100px;
}

.group-input {
    width: auto;
}

.control-button {
    padding: 4px 10px;
    border: 1px solid #888;
    border-radius: 3px;
    background: #e0e0e0;
    cursor: pointer;
}

.stats, .policy-label {
    font-size: 12px;
    color: #555;
}

/* Grid */
.heatmap-container {
    flex: 1;
    background: white;
    padding: 8px;
    border-radius: 6px;
    box-shadow: 0 2px 4px rgba(0,0,0,0.1);
    display: flex;
    gap: 10px;
    min-height: 0;
}

.heatmap-wrapper {
    flex: 1;
    overflow: auto;
    min-width: 0;
    position: relative;
}

.heatmap {
    border-collapse: collapse;
    font-size: 8px;
}

.heatmap td {
    border: 1px solid white;
    padding: 1px;
    text-align: center;
    min-width: 8px;
    height: 14px;
}

.recipe-label {
    background-color: #f0f0f0;
    font-weight: bold;
    text-align: left;
    white-space: nowrap;
    position: sticky;
    left: 0;
    z-index: 15;
    min-width: 180px;
    max-width: 200px;
    overflow: hidden;
    border-right: 2px solid #ccc;
}

.recipe-row.group-start td {
    border-top: 2px solid #FF0000;
}

.recipe-text {
    display: inline-block;
    max-width: 170px;
    overflow: hidden;
    text-overflow: ellipsis;
    vertical-align: middle;
}

.recipe-button {
    float: right;
    width: 16px;
    background-color: #e0e0e0;
    border: 1px solid #888;
    border-radius: 2px;
    cursor: pointer;
    font-size: 6px;
    padding: 0;
}

.recipe-button.selected {
    background-color: #4CAF50;
    color: white;
}

.sensory-group-header {
    font-weight: bold;
    font-size: 16px;
    background-color: rgba(255,255,255,0.9);
}

.sweet, .rich, .smooth, .cooling { border-top: 3px solid #FF0000 !important; }
.dry, .light, .harsh { border-top: 3px solid #00FF00 !important; }
.ungrouped { border-top: 3px solid #808080 !important; }

.ingredient-header {
    writing-mode: vertical-rl;
    font-size: 10px;
    height: 100px;
    white-space: nowrap;
    vertical-align: top;
    background-color: #f0f0f0;
}

.heatmap-cell {
    cursor: pointer;
}

.heatmap-cell:hover {
    outline: 2px solid #333;
}

/* Legend */
.color-scale {
    width: 60px;
    display: flex;
    flex-direction: column;
    align-items: center;
}

.color-scale-title {
    font-size: 10px;
    font-weight: bold;
    margin-bottom: 8px;
}

.color-scale-body {
    display: flex;
}

.color-scale-bar {
    width: 16px;
    height: 150px;
    border: 1px solid #ccc;
}

.color-scale-labels {
    display: flex;
    flex-direction: column;
    justify-content: space-between;
    height: 150px;
    margin-left: 5px;
    font-size: 9px;
    color: #666;
}

.tooltip {
    position: absolute;
    background: rgba(0, 0, 0, 0.8);
    color: white;
    padding: 8px;
    border-radius: 4px;
    font-size: 12px;
    pointer-events: none;
    z-index: 1000;
    display: none;
}
"#
}

/// Inline JavaScript for the standalone document
fn standalone_javascript() -> &'static str {
    r#"
(function() {
    const data = JSON.parse(document.getElementById('heatmap-data').textContent);
    let threshold = data.threshold;
    // null means every recipe is active
    let selected = data.selected === null ? null : new Set(data.selected);

    function rampColor(value) {
        if (isNaN(value) || value <= 0) return data.neutral;
        const v = Math.min(value, 1);
        const index = v * (data.ramp.length - 1);
        const lower = Math.floor(index);
        const upper = Math.ceil(index);
        if (lower === upper) {
            const [r, g, b] = data.ramp[lower];
            return `rgb(${r}, ${g}, ${b})`;
        }
        const fraction = index - lower;
        const [r1, g1, b1] = data.ramp[lower];
        const [r2, g2, b2] = data.ramp[upper];
        const r = Math.round(r1 + (r2 - r1) * fraction);
        const g = Math.round(g1 + (g2 - g1) * fraction);
        const b = Math.round(b1 + (b2 - b1) * fraction);
        return `rgb(${r}, ${g}, ${b})`;
    }

    function isVisible(value) {
        const v = value === null ? 0 : value;
        return data.policy === 'exclusive' ? v > threshold : v >= threshold;
    }

    function isSelected(recipe) {
        return selected === null || selected.has(recipe);
    }

    function selectGroup(group) {
        selected = group === ''
            ? null
            : new Set(data.recipes.filter(r => r.group === group).map(r => r.id));
        updateHeatmap();
    }

    function toggleRecipe(recipe) {
        // A hand-picked set no longer matches any entry of the group picker
        document.getElementById('group-input').selectedIndex = -1;
        if (selected === null) {
            selected = new Set([recipe]);
        } else if (selected.has(recipe)) {
            selected.delete(recipe);
        } else {
            selected.add(recipe);
        }
        updateHeatmap();
    }

    function labelCell() {
        const td = document.createElement('td');
        td.className = 'recipe-label';
        return td;
    }

    function createHeatmap() {
        const table = document.getElementById('heatmap-table');
        table.innerHTML = '';

        const headerRow = document.createElement('tr');
        headerRow.appendChild(labelCell());
        data.sensorySpans.forEach(span => {
            const td = document.createElement('td');
            td.className = `sensory-group-header ${span.group.toLowerCase()}`;
            td.colSpan = span.len;
            td.textContent = span.group;
            headerRow.appendChild(td);
        });
        table.appendChild(headerRow);

        const firstCols = new Map(data.sensorySpans.map(s => [s.start, s.color]));
        data.recipes.forEach((recipe, rowIndex) => {
            const row = document.createElement('tr');
            row.className = 'recipe-row';
            if (rowIndex > 0 && data.recipes[rowIndex - 1].group !== recipe.group) {
                row.classList.add('group-start');
            }

            const label = labelCell();
            label.title = recipe.display;
            const text = document.createElement('span');
            text.className = 'recipe-text';
            text.textContent = recipe.display;
            const button = document.createElement('button');
            button.className = 'recipe-button';
            button.dataset.recipe = recipe.id;
            button.textContent = '●';
            button.title = `Click to select/deselect ${recipe.display}`;
            button.onclick = () => toggleRecipe(recipe.id);
            label.appendChild(text);
            label.appendChild(button);
            row.appendChild(label);

            data.ingredients.forEach((ingredient, colIndex) => {
                const cell = document.createElement('td');
                cell.className = 'heatmap-cell';
                cell.dataset.row = rowIndex;
                cell.dataset.col = colIndex;
                if (firstCols.has(colIndex)) {
                    cell.style.borderLeft = `3px solid ${firstCols.get(colIndex)}`;
                }
                cell.addEventListener('mouseenter', showTooltip);
                cell.addEventListener('mouseleave', hideTooltip);
                cell.addEventListener('mousemove', moveTooltip);
                row.appendChild(cell);
            });
            table.appendChild(row);
        });

        const ingredientRow = document.createElement('tr');
        ingredientRow.appendChild(labelCell());
        data.ingredients.forEach(ingredient => {
            const td = document.createElement('td');
            td.className = 'ingredient-header';
            td.textContent = ingredient.id;
            td.title = ingredient.id;
            ingredientRow.appendChild(td);
        });
        table.appendChild(ingredientRow);
    }

    function updateHeatmap() {
        let shown = 0;
        document.querySelectorAll('.heatmap-cell').forEach(cell => {
            const row = parseInt(cell.dataset.row, 10);
            const value = data.values[row][parseInt(cell.dataset.col, 10)];
            if (isVisible(value)) {
                shown += 1;
                cell.style.backgroundColor = isSelected(data.recipes[row].id)
                    ? rampColor(value === null ? 0 : value)
                    : data.inactive;
            } else {
                cell.style.backgroundColor = data.neutral;
            }
        });
        document.querySelectorAll('.recipe-button').forEach(button => {
            button.classList.toggle('selected', selected !== null && selected.has(button.dataset.recipe));
        });
        const possible = data.recipes.length * data.ingredients.length;
        const density = possible === 0 ? 0 : (shown / possible) * 100;
        document.getElementById('stats').textContent =
            `${shown} of ${possible} cells shown (${density.toFixed(1)}%)`;
    }

    function showTooltip(event) {
        const row = parseInt(event.target.dataset.row, 10);
        const col = parseInt(event.target.dataset.col, 10);
        const value = data.values[row][col];
        const tooltip = document.getElementById('tooltip');
        tooltip.textContent = '';
        [
            ['Recipe', data.recipes[row].id],
            ['Ingredient', data.ingredients[col].id],
            ['Value', value === null ? 'n/a' : String(value)],
        ].forEach(([name, text], i) => {
            if (i > 0) tooltip.appendChild(document.createElement('br'));
            const strong = document.createElement('strong');
            strong.textContent = `${name}: `;
            tooltip.appendChild(strong);
            tooltip.appendChild(document.createTextNode(text));
        });
        tooltip.style.display = 'block';
    }

    function hideTooltip() {
        document.getElementById('tooltip').style.display = 'none';
    }

    function moveTooltip(event) {
        const tooltip = document.getElementById('tooltip');
        tooltip.style.left = event.pageX + 10 + 'px';
        tooltip.style.top = event.pageY + 10 + 'px';
    }

    document.getElementById('threshold-input').addEventListener('input', function(event) {
        threshold = parseFloat(event.target.value) || 0;
        updateHeatmap();
    });
    document.getElementById('group-input').addEventListener('change', function(event) {
        selectGroup(event.target.value);
    });

    createHeatmap();
    updateHeatmap();
})();
"#
}

/// Inline JavaScript for the dashboard page
fn dashboard_javascript() -> &'static str {
    r#"
(function() {
    const grid = document.getElementById('grid');
    const thresholdInput = document.getElementById('threshold-input');
    const policyInput = document.getElementById('policy-input');
    const groupInput = document.getElementById('group-input');
    // null means every recipe is active; otherwise a set of row indices
    let selected = null;
    // Full name of the picked recipe group, '' when none is picked
    let group = '';
    let pending = null;

    function query() {
        const params = new URLSearchParams();
        params.set('threshold', thresholdInput.value || '0');
        params.set('policy', policyInput.value);
        if (group !== '') {
            params.set('group', group);
        } else if (selected !== null) {
            params.set('selected', Array.from(selected).sort((a, b) => a - b).join(','));
        }
        return params.toString();
    }

    function refresh() {
        if (pending) pending.abort();
        pending = new AbortController();
        fetch('/api/grid?' + query(), { signal: pending.signal })
            .then(response => response.ok ? response.text() : response.json().then(body => Promise.reject(body.error)))
            .then(html => { grid.innerHTML = html; })
            .catch(err => { if (err && err.name !== 'AbortError') console.error(err); });
    }

    grid.addEventListener('click', function(event) {
        const button = event.target.closest('.recipe-button');
        if (!button) return;
        const row = parseInt(button.dataset.row, 10);
        if (group !== '') {
            // Continue from the group's rows as an explicit set
            selected = new Set(Array.from(grid.querySelectorAll('.recipe-button.selected'))
                .map(b => parseInt(b.dataset.row, 10)));
            group = '';
            groupInput.selectedIndex = -1;
        }
        if (selected === null) {
            selected = new Set([row]);
        } else if (selected.has(row)) {
            selected.delete(row);
        } else {
            selected.add(row);
        }
        refresh();
    });

    thresholdInput.addEventListener('input', refresh);
    policyInput.addEventListener('change', refresh);
    groupInput.addEventListener('change', function() {
        group = groupInput.value;
        selected = null;
        refresh();
    });
    document.getElementById('select-all').addEventListener('click', function() {
        selected = null;
        group = '';
        groupInput.value = '';
        refresh();
    });
    document.getElementById('select-none').addEventListener('click', function() {
        selected = new Set();
        group = '';
        groupInput.selectedIndex = -1;
        refresh();
    });
})();
"#
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
