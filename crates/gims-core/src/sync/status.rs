//! Bulk local-vs-remote timestamp status.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::api::Gateway;
use crate::error::{GimsError, Result};
use crate::model::ComponentKind;
use crate::resources::ComponentCatalog;
use crate::sync::compare::parse_timestamp;
use crate::sync::{DiscoveredComponent, scan_components};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    LocalOnly,
    InSync,
    LocalNewer,
    GimsNewer,
    GimsDeleted,
    Unknown,
    Error,
}

/// Classify a component from its locally recorded and live timestamps.
pub fn classify(local: Option<&str>, remote: Option<&str>) -> SyncStatus {
    match (local, remote) {
        (Some(l), Some(r)) if l == r => SyncStatus::InSync,
        (Some(l), Some(r)) => match (parse_timestamp(l), parse_timestamp(r)) {
            (Some(l), Some(r)) if l > r => SyncStatus::LocalNewer,
            (Some(l), Some(r)) if l < r => SyncStatus::GimsNewer,
            (Some(_), Some(_)) => SyncStatus::InSync,
            _ => SyncStatus::Unknown,
        },
        _ => SyncStatus::Unknown,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentStatus {
    pub name: Option<String>,
    pub gims_id: Option<i64>,
    pub component_type: ComponentKind,
    pub status: SyncStatus,
    pub path: PathBuf,
    pub local_updated_at: Option<String>,
    pub gims_updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub in_sync: usize,
    pub local_newer: usize,
    pub gims_newer: usize,
    pub local_only: usize,
    pub gims_deleted: usize,
    pub unknown: usize,
    pub error: usize,
}

impl StatusSummary {
    fn from_components(components: &[ComponentStatus]) -> Self {
        let mut summary = Self {
            total: components.len(),
            ..Self::default()
        };
        for component in components {
            let counter = match component.status {
                SyncStatus::InSync => &mut summary.in_sync,
                SyncStatus::LocalNewer => &mut summary.local_newer,
                SyncStatus::GimsNewer => &mut summary.gims_newer,
                SyncStatus::LocalOnly => &mut summary.local_only,
                SyncStatus::GimsDeleted => &mut summary.gims_deleted,
                SyncStatus::Unknown => &mut summary.unknown,
                SyncStatus::Error => &mut summary.error,
            };
            *counter += 1;
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub base_dir: PathBuf,
    pub components: Vec<ComponentStatus>,
    pub summary: StatusSummary,
}

pub struct StatusCommand<'a> {
    gateway: &'a dyn Gateway,
}

impl<'a> StatusCommand<'a> {
    pub fn new(gateway: &'a dyn Gateway) -> Self {
        Self { gateway }
    }

    pub fn execute(&self, base_dir: &Path) -> Result<StatusReport> {
        let components: Vec<ComponentStatus> = scan_components(base_dir)?
            .into_iter()
            .map(|found| self.status_of(found))
            .collect();

        Ok(StatusReport {
            base_dir: base_dir.to_path_buf(),
            summary: StatusSummary::from_components(&components),
            components,
        })
    }

    fn status_of(&self, found: DiscoveredComponent) -> ComponentStatus {
        let local_updated_at = found.meta.gims_updated_at.clone();
        let (status, gims_updated_at) = match found.gims_id {
            None => (SyncStatus::LocalOnly, None),
            Some(id) => match ComponentCatalog::new(self.gateway, found.component_type).fetch(id) {
                Ok(remote) => (
                    classify(local_updated_at.as_deref(), remote.updated_at.as_deref()),
                    remote.updated_at,
                ),
                Err(err) if err.is_not_found() => (SyncStatus::GimsDeleted, None),
                Err(err) => {
                    tracing::warn!(gims_id = id, error = %err, "status lookup failed");
                    (status_for_error(&err), None)
                }
            },
        };

        ComponentStatus {
            name: found.name,
            gims_id: found.gims_id,
            component_type: found.component_type,
            status,
            path: found.path,
            local_updated_at,
            gims_updated_at,
        }
    }
}

fn status_for_error(err: &GimsError) -> SyncStatus {
    match err {
        GimsError::Protocol { .. } => SyncStatus::Unknown,
        _ => SyncStatus::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_strings_are_in_sync() {
        assert_eq!(
            classify(Some("2025-01-01T00:00:00Z"), Some("2025-01-01T00:00:00Z")),
            SyncStatus::InSync
        );
    }

    #[test]
    fn newer_side_wins() {
        assert_eq!(
            classify(Some("2025-02-01T00:00:00Z"), Some("2025-01-01T00:00:00Z")),
            SyncStatus::LocalNewer
        );
        assert_eq!(
            classify(Some("2025-01-01T00:00:00Z"), Some("2025-02-01T00:00:00+00:00")),
            SyncStatus::GimsNewer
        );
    }

    #[test]
    fn same_instant_in_different_notation_is_in_sync() {
        assert_eq!(
            classify(Some("2025-01-01T03:00:00+03:00"), Some("2025-01-01T00:00:00Z")),
            SyncStatus::InSync
        );
    }

    #[test]
    fn missing_or_unparseable_is_unknown() {
        assert_eq!(classify(None, Some("2025-01-01T00:00:00Z")), SyncStatus::Unknown);
        assert_eq!(classify(Some("soon"), Some("later")), SyncStatus::Unknown);
    }
}
