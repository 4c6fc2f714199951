//! Local-first synchronization between component directories and GIMS.
//!
//! Remote state is the deployment target; local directories are the
//! editable projection. Commands return structured outcomes and never print.

pub mod checkout;
pub mod compare;
pub mod diff;
pub mod duplicates;
pub mod projection;
pub mod publish;
pub mod status;
pub mod validate;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{GimsError, Result};
use crate::model::ComponentKind;
use projection::{ComponentMeta, META_FILE, detect_kind, read_meta};

pub use checkout::{
    CheckoutCommand, CheckoutFolderCommand, CheckoutFolderOptions, CheckoutOptions,
    CheckoutOutcome, FolderSelector, Selector,
};
pub use compare::{CompareCommand, CompareOptions, CompareOutcome, Recommendation};
pub use diff::{ChangeSet, parameter_diff_always_update, property_diff_strict};
pub use duplicates::{DuplicateReport, FindDuplicatesCommand};
pub use projection::{Clock, FixedClock, SystemClock};
pub use publish::{PublishAllCommand, PublishAllOptions, PublishCommand, PublishOptions};
pub use status::{StatusCommand, StatusReport, SyncStatus};
pub use validate::{ValidationReport, validate_code};

/// A component directory found under a base directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveredComponent {
    pub path: PathBuf,
    pub name: Option<String>,
    pub gims_id: Option<i64>,
    pub component_type: ComponentKind,
    #[serde(skip)]
    pub meta: ComponentMeta,
}

/// Immediate subdirectories of `base_dir` that hold a `meta.yaml` and a
/// recognizable layout, sorted by path.
pub fn scan_components(base_dir: &Path) -> Result<Vec<DiscoveredComponent>> {
    if !base_dir.is_dir() {
        return Err(GimsError::InvalidInput(format!(
            "Directory not found: {}",
            base_dir.display()
        )));
    }

    let mut dirs = Vec::new();
    for entry in fs::read_dir(base_dir).map_err(|e| GimsError::io(base_dir, e))? {
        let path = entry.map_err(|e| GimsError::io(base_dir, e))?.path();
        if path.is_dir() && path.join(META_FILE).is_file() {
            dirs.push(path);
        }
    }
    dirs.sort();

    let mut found = Vec::new();
    for path in dirs {
        let Some(component_type) = detect_kind(&path) else {
            tracing::debug!(path = %path.display(), "skipping directory without a component layout");
            continue;
        };
        let meta = read_meta(&path)?;
        found.push(DiscoveredComponent {
            name: meta.name.clone(),
            gims_id: meta.gims_id,
            component_type,
            path,
            meta,
        });
    }
    Ok(found)
}

/// One-line description of a per-item failure inside a batch result.
pub(crate) fn item_error(err: &GimsError) -> String {
    match err {
        GimsError::Api {
            detail: Some(detail),
            ..
        }
        | GimsError::Validation {
            detail: Some(detail),
            ..
        } => format!("{err}: {detail}"),
        _ => err.to_string(),
    }
}
