//! Concentration threshold filter
//!
//! Global invariants enforced:
//! - A cell's visibility depends only on its value and the threshold
//! - Absent cells count as 0.0
//! - Raising the cutoff never reveals a cell

use crate::order::OrderedAxis;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Comparison used against the cutoff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdPolicy {
    /// Visible iff `value >= cutoff` (interactive variants)
    #[default]
    Inclusive,
    /// Visible iff `value > cutoff` (static raster)
    Exclusive,
}

impl ThresholdPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdPolicy::Inclusive => "inclusive",
            ThresholdPolicy::Exclusive => "exclusive",
        }
    }

    pub fn operator(&self) -> &'static str {
        match self {
            ThresholdPolicy::Inclusive => ">=",
            ThresholdPolicy::Exclusive => ">",
        }
    }
}

impl std::str::FromStr for ThresholdPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "inclusive" | ">=" => Ok(ThresholdPolicy::Inclusive),
            "exclusive" | ">" => Ok(ThresholdPolicy::Exclusive),
            other => anyhow::bail!("unknown threshold policy: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub cutoff: f64,
    pub policy: ThresholdPolicy,
}

impl Threshold {
    /// Default for the static raster: strictly above 0.45
    pub const STATIC_DEFAULT: Threshold = Threshold::exclusive(0.45);
    /// Default for the standalone document and dashboard: 0.4 or above
    pub const INTERACTIVE_DEFAULT: Threshold = Threshold::inclusive(0.4);

    pub const fn inclusive(cutoff: f64) -> Self {
        Threshold {
            cutoff,
            policy: ThresholdPolicy::Inclusive,
        }
    }

    pub const fn exclusive(cutoff: f64) -> Self {
        Threshold {
            cutoff,
            policy: ThresholdPolicy::Exclusive,
        }
    }

    /// Accept a cutoff only if it is finite and non-negative.
    /// Config files, CLI flags and dashboard queries all go through here.
    pub fn check_cutoff(cutoff: f64) -> anyhow::Result<f64> {
        if !cutoff.is_finite() {
            anyhow::bail!("threshold must be a finite number (got {})", cutoff);
        }
        if cutoff < 0.0 {
            anyhow::bail!("threshold must be non-negative (got {})", cutoff);
        }
        Ok(cutoff)
    }

    /// Whether a cell passes; absent cells are treated as 0.0
    pub fn is_visible(&self, value: Option<f64>) -> bool {
        let v = value.unwrap_or(0.0);
        match self.policy {
            ThresholdPolicy::Inclusive => v >= self.cutoff,
            ThresholdPolicy::Exclusive => v > self.cutoff,
        }
    }

    pub fn describe(&self) -> String {
        format!("values {} {} shown", self.policy.operator(), self.cutoff)
    }
}

/// Which recipes are highlighted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Every recipe is active
    #[default]
    All,
    /// Only these recipes are active; an empty set deactivates every row
    Only(BTreeSet<String>),
}

impl Selection {
    pub fn none() -> Self {
        Selection::Only(BTreeSet::new())
    }

    pub fn only<I, S>(recipes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Only(recipes.into_iter().map(Into::into).collect())
    }

    /// Exactly the recipes filed under `group` on the row axis
    pub fn group(recipes: &OrderedAxis, group: &str) -> Self {
        Selection::only(
            recipes
                .entries()
                .iter()
                .filter(|entry| entry.group == group)
                .map(|entry| entry.id.as_str()),
        )
    }

    pub fn is_selected(&self, recipe: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(set) => set.contains(recipe),
        }
    }

    /// Flip one recipe; toggling under `All` starts a subset containing just it.
    pub fn toggle(&mut self, recipe: &str) {
        match self {
            Selection::All => *self = Selection::only([recipe]),
            Selection::Only(set) => {
                if !set.remove(recipe) {
                    set.insert(recipe.to_string());
                }
            }
        }
    }
}

/// Rendering state of a single cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellState {
    /// Below threshold: neutral background
    Hidden,
    /// Passing and selected: full ramp color
    Active(f64),
    /// Passing but the recipe is not selected: inactive tone
    Inactive(f64),
}

impl CellState {
    pub fn evaluate(value: Option<f64>, threshold: &Threshold, selected: bool) -> Self {
        if !threshold.is_visible(value) {
            return CellState::Hidden;
        }
        let v = value.unwrap_or(0.0);
        if selected {
            CellState::Active(v)
        } else {
            CellState::Inactive(v)
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, CellState::Hidden)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CellState::Hidden => "hidden",
            CellState::Active(_) => "active",
            CellState::Inactive(_) => "inactive",
        }
    }
}

/// Visible-cell counts for a threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisibilityStats {
    pub shown: usize,
    pub possible: usize,
    /// shown / possible, 0.0 for an empty grid
    pub density: f64,
}

impl VisibilityStats {
    pub fn from_counts(shown: usize, possible: usize) -> Self {
        let density = if possible == 0 {
            0.0
        } else {
            shown as f64 / possible as f64
        };
        VisibilityStats {
            shown,
            possible,
            density,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_value_per_policy() {
        assert!(Threshold::inclusive(0.45).is_visible(Some(0.45)));
        assert!(!Threshold::exclusive(0.45).is_visible(Some(0.45)));
        assert!(Threshold::exclusive(0.45).is_visible(Some(0.4500001)));
    }

    #[test]
    fn test_absent_cell_reads_as_zero() {
        assert!(!Threshold::inclusive(0.1).is_visible(None));
        assert!(Threshold::inclusive(0.0).is_visible(None));
        assert!(!Threshold::exclusive(0.0).is_visible(None));
    }

    #[test]
    fn test_check_cutoff() {
        assert_eq!(Threshold::check_cutoff(0.0).unwrap(), 0.0);
        assert_eq!(Threshold::check_cutoff(0.45).unwrap(), 0.45);
        assert!(Threshold::check_cutoff(-0.1).is_err());
        assert!(Threshold::check_cutoff(f64::NAN).is_err());
        assert!(Threshold::check_cutoff(f64::INFINITY).is_err());
    }

    #[test]
    fn test_variant_defaults_stay_distinct() {
        assert_eq!(Threshold::STATIC_DEFAULT.cutoff, 0.45);
        assert_eq!(Threshold::STATIC_DEFAULT.policy, ThresholdPolicy::Exclusive);
        assert_eq!(Threshold::INTERACTIVE_DEFAULT.cutoff, 0.4);
        assert_eq!(
            Threshold::INTERACTIVE_DEFAULT.policy,
            ThresholdPolicy::Inclusive
        );
    }

    #[test]
    fn test_policy_parse_and_serde() {
        assert_eq!(
            "exclusive".parse::<ThresholdPolicy>().unwrap(),
            ThresholdPolicy::Exclusive
        );
        assert_eq!(
            ">=".parse::<ThresholdPolicy>().unwrap(),
            ThresholdPolicy::Inclusive
        );
        assert!("greater".parse::<ThresholdPolicy>().is_err());
        let p: ThresholdPolicy = serde_json::from_str(r#""inclusive""#).unwrap();
        assert_eq!(p, ThresholdPolicy::Inclusive);
    }

    #[test]
    fn test_cell_state() {
        let t = Threshold::inclusive(0.4);
        assert_eq!(CellState::evaluate(Some(0.3), &t, true), CellState::Hidden);
        assert_eq!(
            CellState::evaluate(Some(0.5), &t, true),
            CellState::Active(0.5)
        );
        assert_eq!(
            CellState::evaluate(Some(0.5), &t, false),
            CellState::Inactive(0.5)
        );
        assert!(CellState::Inactive(0.5).is_visible());
        assert!(!CellState::Hidden.is_visible());
    }

    #[test]
    fn test_selection_toggle() {
        let mut s = Selection::All;
        assert!(s.is_selected("a"));
        s.toggle("a");
        assert_eq!(s, Selection::only(["a"]));
        assert!(!s.is_selected("b"));
        s.toggle("b");
        s.toggle("a");
        assert_eq!(s, Selection::only(["b"]));
        assert!(!Selection::none().is_selected("b"));
    }

    #[test]
    fn test_stats_density() {
        let s = VisibilityStats::from_counts(3, 12);
        assert_eq!(s.density, 0.25);
        assert_eq!(VisibilityStats::from_counts(0, 0).density, 0.0);
    }
}
