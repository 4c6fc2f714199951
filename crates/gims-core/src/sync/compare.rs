//! Export-date vs remote-timestamp comparison.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::api::Gateway;
use crate::error::{GimsError, Result};
use crate::model::ComponentKind;
use crate::resources::ComponentCatalog;

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Checkout,
    Publish,
    ManualCheck,
}

/// Result of `compare`, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompareOutcome {
    NotFoundInGims {
        recommendation: Recommendation,
        message: String,
    },
    NoUpdatedAt {
        message: String,
        recommendation: Recommendation,
    },
    InvalidGimsDate {
        message: String,
        recommendation: Recommendation,
    },
    GimsNewer {
        gims_updated_at: String,
        git_exported_at: String,
        recommendation: Recommendation,
        message: String,
    },
    GitNewer {
        gims_updated_at: String,
        git_exported_at: String,
        recommendation: Recommendation,
        message: String,
    },
    InSync {
        gims_updated_at: String,
        git_exported_at: String,
        message: String,
    },
}

impl CompareOutcome {
    pub fn recommendation(&self) -> Option<Recommendation> {
        match self {
            Self::NotFoundInGims { recommendation, .. }
            | Self::NoUpdatedAt { recommendation, .. }
            | Self::InvalidGimsDate { recommendation, .. }
            | Self::GimsNewer { recommendation, .. }
            | Self::GitNewer { recommendation, .. } => Some(*recommendation),
            Self::InSync { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub kind: ComponentKind,
    /// Component name in GIMS
    pub name: String,
    /// `exported_at` taken from a local `meta.yaml`
    pub exported_at: String,
}

impl CompareOptions {
    pub fn new(kind: ComponentKind, name: impl Into<String>, exported_at: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            exported_at: exported_at.into(),
        }
    }
}

pub struct CompareCommand<'a> {
    gateway: &'a dyn Gateway,
}

impl<'a> CompareCommand<'a> {
    pub fn new(gateway: &'a dyn Gateway) -> Self {
        Self { gateway }
    }

    pub fn execute(&self, options: &CompareOptions) -> Result<CompareOutcome> {
        let git_date = parse_timestamp(&options.exported_at).ok_or_else(|| {
            GimsError::InvalidInput(format!("Invalid date format: {}", options.exported_at))
        })?;

        let catalog = ComponentCatalog::new(self.gateway, options.kind);
        let Some(component) = catalog
            .fetch_all()?
            .into_iter()
            .find(|c| c.name == options.name)
        else {
            return Ok(CompareOutcome::NotFoundInGims {
                recommendation: Recommendation::Publish,
                message: format!(
                    "Component '{}' not found in GIMS. Publish is recommended.",
                    options.name
                ),
            });
        };

        let Some(gims_updated_at) = component.updated_at.filter(|t| !t.is_empty()) else {
            return Ok(CompareOutcome::NoUpdatedAt {
                message: "Component in GIMS has no updated_at field. Cannot compare.".to_string(),
                recommendation: Recommendation::ManualCheck,
            });
        };

        let Some(gims_date) = parse_timestamp(&gims_updated_at) else {
            return Ok(CompareOutcome::InvalidGimsDate {
                message: format!("Invalid date format in GIMS: {gims_updated_at}"),
                recommendation: Recommendation::ManualCheck,
            });
        };

        let git_exported_at = options.exported_at.clone();
        Ok(if gims_date > git_date {
            CompareOutcome::GimsNewer {
                gims_updated_at,
                git_exported_at,
                recommendation: Recommendation::Checkout,
                message: "GIMS version is newer. Checkout is recommended.".to_string(),
            }
        } else if gims_date < git_date {
            CompareOutcome::GitNewer {
                gims_updated_at,
                git_exported_at,
                recommendation: Recommendation::Publish,
                message: "Local version is newer. Publish is recommended.".to_string(),
            }
        } else {
            CompareOutcome::InSync {
                gims_updated_at,
                git_exported_at,
                message: "Versions are in sync.".to_string(),
            }
        })
    }
}
