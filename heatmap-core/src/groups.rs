//! Group definitions for both heatmap axes
//!
//! Recipe groups are ordered data tables (G1-G4 by default) passed explicitly
//! into the order builder. Sensory groups are a closed set of eight names whose
//! declaration order fixes the column traversal order.

use serde::{Deserialize, Serialize};

/// Group name used for ingredients with no recognised sensory note, and for
/// recipes when [`RecipeFallback::Ungrouped`] is selected.
pub const UNGROUPED: &str = "Ungrouped";

/// Sensory note buckets, declared in column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SensoryGroup {
    Sweet,
    Dry,
    Rich,
    Light,
    Smooth,
    Harsh,
    Cooling,
    Ungrouped,
}

impl SensoryGroup {
    /// All groups in traversal order (Ungrouped last)
    pub const ALL: [SensoryGroup; 8] = [
        SensoryGroup::Sweet,
        SensoryGroup::Dry,
        SensoryGroup::Rich,
        SensoryGroup::Light,
        SensoryGroup::Smooth,
        SensoryGroup::Harsh,
        SensoryGroup::Cooling,
        SensoryGroup::Ungrouped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensoryGroup::Sweet => "Sweet",
            SensoryGroup::Dry => "Dry",
            SensoryGroup::Rich => "Rich",
            SensoryGroup::Light => "Light",
            SensoryGroup::Smooth => "Smooth",
            SensoryGroup::Harsh => "Harsh",
            SensoryGroup::Cooling => "Cooling",
            SensoryGroup::Ungrouped => UNGROUPED,
        }
    }

    /// Match a classification label exactly (case-sensitive, no trimming).
    pub fn from_label(label: &str) -> Option<SensoryGroup> {
        SensoryGroup::ALL
            .iter()
            .copied()
            .find(|group| group.as_str() == label)
    }

    /// Border color used to mark the group's first column
    pub fn border_color(&self) -> &'static str {
        match self {
            SensoryGroup::Sweet
            | SensoryGroup::Rich
            | SensoryGroup::Smooth
            | SensoryGroup::Cooling => "#FF0000",
            SensoryGroup::Dry | SensoryGroup::Light | SensoryGroup::Harsh => "#00FF00",
            SensoryGroup::Ungrouped => "#808080",
        }
    }
}

impl std::fmt::Display for SensoryGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, ordered set of recipe identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeGroup {
    /// Full group name, e.g. "G1 - MGO and Filed"
    pub name: String,
    /// Short label shown next to recipe names, e.g. "G1"
    pub label: String,
    pub members: Vec<String>,
}

impl RecipeGroup {
    pub fn new(name: &str, label: &str, members: &[&str]) -> Self {
        RecipeGroup {
            name: name.to_string(),
            label: label.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// What happens to recipes present in the matrix but listed in no group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeFallback {
    /// Leave them out of the row order entirely
    #[default]
    Drop,
    /// Append them, in matrix order, under an "Ungrouped" band after the last group
    Ungrouped,
}

impl RecipeFallback {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeFallback::Drop => "drop",
            RecipeFallback::Ungrouped => "ungrouped",
        }
    }
}

/// Immutable group tables handed to the order builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTables {
    /// Recipe groups in declaration order
    pub recipe_groups: Vec<RecipeGroup>,
}

impl GroupTables {
    pub fn new(recipe_groups: Vec<RecipeGroup>) -> Self {
        GroupTables { recipe_groups }
    }

    /// The compiled-in tobacco recipe groups
    pub fn tobacco() -> Self {
        GroupTables::new(vec![
            RecipeGroup::new(
                "G1 - MGO and Filed",
                "G1",
                &[
                    "J1 Virginia Tobacco 5%",
                    "TOBACCO (VIRGINIA) 5% (+38% FL) E-400360",
                    "VIRGINIA TOBACCO 5% (DDS00451B)",
                    "(ILLINOIS) TOBACCO VT 5% NFC) DDS00734",
                    "TOBACCO(GOLDEN) 5% ( +38% FL) (E-400361)",
                ],
            ),
            RecipeGroup::new(
                "G2",
                "G2",
                &[
                    "RUBY TOBACCO (S2) 3% (40%VG) (E-400518)",
                    "PURPLE TOBACCO3% (E-400514)",
                    "TOBACCO(AMERICAN) 5% (E-400469)",
                    "(OREGON) AMERICAN TOBACCO 5% (CHINA WL) DDS00737",
                ],
            ),
            RecipeGroup::new(
                "G3",
                "G3",
                &[
                    "AUTUMN TOBACCO 3% (E-400519)",
                    "TOBACCO (BLONDE) 5% +25% FL (PAB00426B)",
                    "SRI LANKA  TOBACCO 5% (E-400451)",
                    "VERMONT TOBACCO  5% (E-400454)",
                    "(COLORADO) VIRGINIA TOBACCO 5% (DDS00735)",
                    "(ARIZONA) BLONDE TOBACCO5% (CHINA WL) DDS00736",
                ],
            ),
            RecipeGroup::new(
                "G4 - Unique",
                "G4",
                &[
                    "Classic Tobacco 5% (345-00006)",
                    "CALIFORNIA TOBACCO 5% (E-400452)",
                    "Golden Tobacco 5% J1 (345-00124)",
                ],
            ),
        ])
    }

    pub fn recipe_group(&self, name: &str) -> Option<&RecipeGroup> {
        self.recipe_groups.iter().find(|g| g.name == name)
    }

    /// Group by full name ("G1 - MGO and Filed") or short label ("G1")
    pub fn find_group(&self, key: &str) -> Option<&RecipeGroup> {
        self.recipe_groups
            .iter()
            .find(|g| g.name == key || g.label == key)
    }

    /// Short label for a group name; unknown names (e.g. "Ungrouped") map to themselves.
    pub fn label_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.recipe_group(name)
            .map(|g| g.label.as_str())
            .unwrap_or(name)
    }

    /// Total number of declared recipes across all groups
    pub fn declared_recipe_count(&self) -> usize {
        self.recipe_groups.iter().map(|g| g.members.len()).sum()
    }
}

impl Default for GroupTables {
    fn default() -> Self {
        GroupTables::tobacco()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensory_order_is_fixed() {
        let names: Vec<&str> = SensoryGroup::ALL.iter().map(|g| g.as_str()).collect();
        assert_eq!(
            names,
            vec!["Sweet", "Dry", "Rich", "Light", "Smooth", "Harsh", "Cooling", "Ungrouped"]
        );
        // Ord follows declaration order so BTreeMap iteration matches traversal order
        assert!(SensoryGroup::Sweet < SensoryGroup::Dry);
        assert!(SensoryGroup::Cooling < SensoryGroup::Ungrouped);
    }

    #[test]
    fn test_from_label_is_exact() {
        assert_eq!(SensoryGroup::from_label("Sweet"), Some(SensoryGroup::Sweet));
        assert_eq!(
            SensoryGroup::from_label("Ungrouped"),
            Some(SensoryGroup::Ungrouped)
        );
        assert_eq!(SensoryGroup::from_label("sweet"), None);
        assert_eq!(SensoryGroup::from_label("Sweet "), None);
        assert_eq!(SensoryGroup::from_label("Fruity"), None);
    }

    #[test]
    fn test_tobacco_tables() {
        let tables = GroupTables::default();
        let names: Vec<&str> = tables
            .recipe_groups
            .iter()
            .map(|g| g.name.as_str())
            .collect();
        assert_eq!(names, vec!["G1 - MGO and Filed", "G2", "G3", "G4 - Unique"]);
        assert_eq!(tables.declared_recipe_count(), 18);
        assert_eq!(tables.label_for("G4 - Unique"), "G4");
        assert_eq!(tables.label_for(UNGROUPED), UNGROUPED);
    }

    #[test]
    fn test_find_group_by_name_or_label() {
        let tables = GroupTables::tobacco();
        assert_eq!(tables.find_group("G4").unwrap().name, "G4 - Unique");
        assert_eq!(tables.find_group("G1 - MGO and Filed").unwrap().label, "G1");
        assert!(tables.find_group("g1").is_none());
        assert!(tables.find_group("G5").is_none());
    }

    #[test]
    fn test_fallback_serde() {
        let f: RecipeFallback = serde_json::from_str(r#""ungrouped""#).unwrap();
        assert_eq!(f, RecipeFallback::Ungrouped);
        assert_eq!(RecipeFallback::default(), RecipeFallback::Drop);
    }
}
