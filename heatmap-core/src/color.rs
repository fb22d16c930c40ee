//! Cell colors
//!
//! A five-stop Viridis-like ramp over [0, 1], linearly interpolated between the
//! two nearest stops, plus the two flat tones for hidden and inactive cells.

use crate::threshold::CellState;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn css(&self) -> String {
        format!("rgb({}, {}, {})", self.0, self.1, self.2)
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Dark purple, blue-purple, teal, green, yellow at 0/25/50/75/100%
pub const VIRIDIS_STOPS: [Rgb; 5] = [
    Rgb(68, 1, 84),
    Rgb(59, 82, 139),
    Rgb(33, 144, 141),
    Rgb(94, 201, 98),
    Rgb(253, 231, 37),
];

/// Background for cells below the threshold
pub const NEUTRAL: Rgb = Rgb(240, 240, 240);

/// Passing cells of recipes outside the selection
pub const INACTIVE: Rgb = Rgb(211, 211, 211);

/// Sample the ramp. Values are clamped to [0, 1]; NaN maps to the first stop.
pub fn viridis(value: f64) -> Rgb {
    let v = if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    };
    let scaled = v * (VIRIDIS_STOPS.len() - 1) as f64;
    let lower = scaled.floor() as usize;
    let upper = scaled.ceil() as usize;
    if lower == upper {
        return VIRIDIS_STOPS[lower];
    }
    let fraction = scaled - lower as f64;
    let (a, b) = (VIRIDIS_STOPS[lower], VIRIDIS_STOPS[upper]);
    Rgb(
        lerp(a.0, b.0, fraction),
        lerp(a.1, b.1, fraction),
        lerp(a.2, b.2, fraction),
    )
}

fn lerp(a: u8, b: u8, fraction: f64) -> u8 {
    let (a, b) = (a as f64, b as f64);
    (a + (b - a) * fraction).round() as u8
}

/// Fill for a cell. A passing cell with no concentration (0.0 or absent)
/// keeps the neutral tone rather than the bottom of the ramp.
pub fn cell_color(state: CellState) -> Rgb {
    match state {
        CellState::Hidden => NEUTRAL,
        CellState::Active(v) if v <= 0.0 => NEUTRAL,
        CellState::Active(v) => viridis(v),
        CellState::Inactive(_) => INACTIVE,
    }
}

/// CSS gradient matching the ramp, bottom (0) to top (1)
pub fn css_gradient() -> String {
    let stops: Vec<String> = VIRIDIS_STOPS
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} {}%", c.css(), i * 25))
        .collect();
    format!("linear-gradient(to top, {})", stops.join(", "))
}
