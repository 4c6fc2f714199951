//! Similar-name lookup, run before creating a component.

use serde::Serialize;
use similar::TextDiff;

use crate::api::Gateway;
use crate::error::Result;
use crate::model::ComponentKind;
use crate::resources::ComponentCatalog;

pub const DEFAULT_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateMatch {
    pub gims_id: i64,
    pub name: String,
    pub match_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateReport {
    pub query: String,
    pub component_type: ComponentKind,
    pub threshold: f64,
    pub matches: Vec<DuplicateMatch>,
}

/// Case-insensitive character similarity in `0.0..=1.0`.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    f64::from(TextDiff::from_chars(a.as_str(), b.as_str()).ratio())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct FindDuplicatesCommand<'a> {
    gateway: &'a dyn Gateway,
}

impl<'a> FindDuplicatesCommand<'a> {
    pub fn new(gateway: &'a dyn Gateway) -> Self {
        Self { gateway }
    }

    /// Components whose name scores at least `threshold`, best first.
    pub fn execute(&self, name: &str, kind: ComponentKind, threshold: f64) -> Result<DuplicateReport> {
        let mut matches: Vec<DuplicateMatch> = ComponentCatalog::new(self.gateway, kind)
            .fetch_all()?
            .into_iter()
            .filter_map(|component| {
                let ratio = name_similarity(name, &component.name);
                (ratio >= threshold).then(|| DuplicateMatch {
                    gims_id: component.id,
                    name: component.name,
                    match_ratio: round2(ratio),
                })
            })
            .collect();
        matches.sort_by(|a, b| b.match_ratio.total_cmp(&a.match_ratio));

        Ok(DuplicateReport {
            query: name.to_string(),
            component_type: kind,
            threshold,
            matches,
        })
    }
}
