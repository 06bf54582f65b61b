//! Attribute-based exclusion of roads before comparison.

use super::Road;

/// Drops roads whose `name` or `ref` contains a fixed substring.
///
/// Matching looks at attributes only: a road without a string `name` and a
/// string `ref` is never excluded, whatever its geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRule {
    pattern: String,
}

impl ExclusionRule {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// An empty pattern excludes nothing.
    pub fn matches(&self, road: &Road) -> bool {
        if self.pattern.is_empty() {
            return false;
        }
        [road.name(), road.reference()]
            .into_iter()
            .flatten()
            .any(|value| value.contains(&self.pattern))
    }

    pub fn apply(&self, roads: Vec<Road>) -> Vec<Road> {
        let before = roads.len();
        let kept: Vec<Road> = roads.into_iter().filter(|r| !self.matches(r)).collect();
        if kept.len() < before {
            tracing::debug!(
                "Excluded {} features matching {:?}",
                before - kept.len(),
                self.pattern
            );
        }
        kept
    }
}
