//! Remote-to-local checkout.
//!
//! A checkout refuses to overwrite a directory whose recorded
//! `gims_updated_at` no longer matches the server, unless forced.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::api::Gateway;
use crate::error::{GimsError, Result};
use crate::folders::{build_folder_paths, find_by_name, path_of};
use crate::model::{ComponentKind, RemoteComponent};
use crate::resources::{ComponentCatalog, DatasourceTypeService, FolderService};
use crate::sync::item_error;
use crate::sync::projection::{
    CODE_FILE, Clock, Exporter, META_FILE, METHODS_DIR, MethodBundle, PROPERTIES_FILE, Projection,
    RemoteSnapshot, SystemClock, count_code_lines, default_dir_name, method_dirs, read_meta,
};

const CONFLICT_MESSAGE: &str = "Local files may contain unpublished changes";
const CONFLICT_RECOMMENDATION: &str = "Use --force to overwrite or publish to save changes to GIMS";

/// How the component to check out is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(i64),
    /// First exact name match wins
    Name(String),
}

impl Selector {
    /// Build from the `--id` / `--name` pair; the id wins when both are set.
    pub fn from_flags(id: Option<i64>, name: Option<String>) -> Result<Self> {
        match (id, name) {
            (Some(id), _) => Ok(Self::Id(id)),
            (None, Some(name)) => Ok(Self::Name(name)),
            (None, None) => Err(GimsError::InvalidInput("Specify --id or --name".to_string())),
        }
    }
}

/// Options shared by single checkout and every item of a folder checkout.
#[derive(Debug, Clone)]
pub struct CheckoutOptions {
    pub kind: ComponentKind,
    pub selector: Selector,
    /// Defaults to the component name, lowercased with spaces as `_`
    pub output_dir: Option<PathBuf>,
    pub dry_run: bool,
    pub force: bool,
}

impl CheckoutOptions {
    pub fn new(kind: ComponentKind, selector: Selector) -> Self {
        Self {
            kind,
            selector,
            output_dir: None,
            dry_run: false,
            force: false,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Per-kind counts reported with a checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckoutCounts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_lines: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    DryRun {
        gims_id: i64,
        name: String,
        output_dir: PathBuf,
        files: Vec<String>,
        #[serde(flatten)]
        counts: CheckoutCounts,
    },
    CheckedOut {
        gims_id: i64,
        name: String,
        output_dir: PathBuf,
        files: Vec<String>,
        #[serde(flatten)]
        counts: CheckoutCounts,
        gims_updated_at: Option<String>,
    },
    /// Nothing was written
    Conflict {
        gims_id: i64,
        name: String,
        local_updated_at: String,
        gims_updated_at: String,
        message: String,
        recommendation: String,
    },
}

impl CheckoutOutcome {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

pub struct CheckoutCommand<'a> {
    gateway: &'a dyn Gateway,
    clock: &'a dyn Clock,
}

impl<'a> CheckoutCommand<'a> {
    pub fn new(gateway: &'a dyn Gateway) -> Self {
        Self {
            gateway,
            clock: &SystemClock,
        }
    }

    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn execute(&self, options: &CheckoutOptions) -> Result<CheckoutOutcome> {
        let snapshot = self.fetch_snapshot(options.kind, &options.selector)?;
        let component = &snapshot.component;
        let projection =
            Exporter::new(self.gateway.system_url(), self.clock).export(&snapshot)?;

        let output_dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_dir_name(&component.name)));
        let counts = counts_for(&snapshot, &projection);
        let files = projection.paths();

        if options.dry_run {
            return Ok(CheckoutOutcome::DryRun {
                gims_id: component.id,
                name: component.name.clone(),
                output_dir,
                files,
                counts,
            });
        }

        if !options.force
            && let Some(conflict) = detect_conflict(&output_dir, component)?
        {
            return Ok(conflict);
        }

        projection.write_to(&output_dir)?;
        if options.kind.has_methods() {
            remove_stale_methods(&output_dir, &snapshot)?;
        }
        tracing::info!(
            gims_id = component.id,
            dir = %output_dir.display(),
            files = files.len(),
            "checked out"
        );

        Ok(CheckoutOutcome::CheckedOut {
            gims_id: component.id,
            name: component.name.clone(),
            output_dir,
            files,
            counts,
            gims_updated_at: component.updated_at.clone(),
        })
    }

    /// Fetch the component and everything nested under it.
    pub fn fetch_snapshot(&self, kind: ComponentKind, selector: &Selector) -> Result<RemoteSnapshot> {
        let catalog = ComponentCatalog::new(self.gateway, kind);
        let component = match selector {
            Selector::Id(id) => catalog.fetch(*id)?,
            Selector::Name(name) => catalog.fetch_by_name(name)?,
        };
        let folder_path = self.folder_path(kind, &component)?;

        let properties = if kind.has_properties() {
            catalog.fetch_properties(component.id)?
        } else {
            Vec::new()
        };

        let methods = if kind.has_methods() {
            let service = DatasourceTypeService::new(self.gateway);
            let mut bundles = Vec::new();
            for method in service.methods(component.id)? {
                let parameters = service.params(method.id)?;
                bundles.push(MethodBundle { method, parameters });
            }
            bundles
        } else {
            Vec::new()
        };

        Ok(RemoteSnapshot {
            kind,
            component,
            folder_path,
            properties,
            methods,
        })
    }

    fn folder_path(&self, kind: ComponentKind, component: &RemoteComponent) -> Result<String> {
        let fallback = || component.folder_path.clone().unwrap_or_else(|| "/".to_string());
        let Some(folder_id) = component.folder_ref() else {
            return Ok(fallback());
        };
        let folders = FolderService::new(self.gateway, kind).fetch()?;
        let paths = build_folder_paths(&folders)?;
        Ok(if paths.contains_key(&folder_id) {
            path_of(&paths, Some(folder_id))
        } else {
            fallback()
        })
    }
}

fn counts_for(snapshot: &RemoteSnapshot, projection: &Projection) -> CheckoutCounts {
    let code_lines = projection.get(CODE_FILE).map(count_code_lines);
    match snapshot.kind {
        ComponentKind::Script => CheckoutCounts {
            code_lines,
            ..CheckoutCounts::default()
        },
        ComponentKind::DatasourceType => CheckoutCounts {
            code_lines: None,
            methods_count: Some(snapshot.methods.len()),
            properties_count: Some(snapshot.properties.len()),
        },
        ComponentKind::ActivatorType => CheckoutCounts {
            code_lines,
            methods_count: None,
            properties_count: projection
                .get(PROPERTIES_FILE)
                .map(|_| snapshot.properties.len()),
        },
    }
}

fn detect_conflict(dir: &Path, component: &RemoteComponent) -> Result<Option<CheckoutOutcome>> {
    if !dir.join(META_FILE).is_file() {
        return Ok(None);
    }
    let local = read_meta(dir)?;
    Ok(match (local.gims_updated_at, &component.updated_at) {
        (Some(local_updated_at), Some(gims_updated_at)) if &local_updated_at != gims_updated_at => {
            tracing::debug!(gims_id = component.id, "refusing to overwrite local changes");
            Some(CheckoutOutcome::Conflict {
                gims_id: component.id,
                name: component.name.clone(),
                local_updated_at,
                gims_updated_at: gims_updated_at.clone(),
                message: CONFLICT_MESSAGE.to_string(),
                recommendation: CONFLICT_RECOMMENDATION.to_string(),
            })
        }
        _ => None,
    })
}

/// Drop `methods/<label>` directories of methods no longer on the server.
fn remove_stale_methods(dir: &Path, snapshot: &RemoteSnapshot) -> Result<()> {
    let live: HashSet<&str> = snapshot
        .methods
        .iter()
        .map(|b| b.method.label.as_str())
        .collect();
    for name in method_dirs(dir)? {
        if !live.contains(name.as_str()) {
            let stale = dir.join(METHODS_DIR).join(&name);
            tracing::debug!(method = %name, "removing method deleted in GIMS");
            fs::remove_dir_all(&stale).map_err(|e| GimsError::io(&stale, e))?;
        }
    }
    Ok(())
}

// ============================================================================
// Folder checkout
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderSelector {
    Id(i64),
    Name(String),
}

#[derive(Debug, Clone)]
pub struct CheckoutFolderOptions {
    pub kind: ComponentKind,
    /// `None` checks out every component of the kind
    pub folder: Option<FolderSelector>,
    pub output_base_dir: PathBuf,
    pub dry_run: bool,
    pub force: bool,
}

impl CheckoutFolderOptions {
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            folder: None,
            output_base_dir: PathBuf::from("."),
            dry_run: false,
            force: false,
        }
    }

    pub fn with_folder(mut self, folder: Option<FolderSelector>) -> Self {
        self.folder = folder;
        self
    }

    pub fn with_output_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_base_dir = dir.into();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    fn folder_name(&self) -> Option<String> {
        match &self.folder {
            Some(FolderSelector::Name(name)) => Some(name.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentRef {
    pub gims_id: i64,
    pub name: String,
}

/// A folder item that could not be checked out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub status: &'static str,
    pub gims_id: i64,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FolderItem {
    Done(CheckoutOutcome),
    Failed(ItemFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FolderCheckoutOutcome {
    DryRun {
        folder_id: Option<i64>,
        folder_name: Option<String>,
        component_type: ComponentKind,
        components_count: usize,
        components: Vec<ComponentRef>,
    },
    CheckedOut {
        folder_id: Option<i64>,
        folder_name: Option<String>,
        component_type: ComponentKind,
        components: Vec<FolderItem>,
    },
}

pub struct CheckoutFolderCommand<'a> {
    gateway: &'a dyn Gateway,
    checkout: CheckoutCommand<'a>,
}

impl<'a> CheckoutFolderCommand<'a> {
    pub fn new(gateway: &'a dyn Gateway) -> Self {
        Self {
            gateway,
            checkout: CheckoutCommand::new(gateway),
        }
    }

    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.checkout = self.checkout.with_clock(clock);
        self
    }

    pub fn execute(&self, options: &CheckoutFolderOptions) -> Result<FolderCheckoutOutcome> {
        let folder_id = self.resolve_folder(options)?;
        let components = ComponentCatalog::new(self.gateway, options.kind).fetch_in_folder(folder_id)?;

        if options.dry_run {
            return Ok(FolderCheckoutOutcome::DryRun {
                folder_id,
                folder_name: options.folder_name(),
                component_type: options.kind,
                components_count: components.len(),
                components: components
                    .into_iter()
                    .map(|c| ComponentRef {
                        gims_id: c.id,
                        name: c.name,
                    })
                    .collect(),
            });
        }

        let mut results = Vec::with_capacity(components.len());
        for component in components {
            let item = CheckoutOptions::new(options.kind, Selector::Id(component.id))
                .with_output_dir(options.output_base_dir.join(default_dir_name(&component.name)))
                .with_force(options.force);
            results.push(match self.checkout.execute(&item) {
                Ok(outcome) => FolderItem::Done(outcome),
                Err(err) => {
                    tracing::warn!(gims_id = component.id, error = %err, "checkout failed");
                    FolderItem::Failed(ItemFailure {
                        status: "error",
                        gims_id: component.id,
                        name: component.name,
                        error: item_error(&err),
                    })
                }
            });
        }

        Ok(FolderCheckoutOutcome::CheckedOut {
            folder_id,
            folder_name: options.folder_name(),
            component_type: options.kind,
            components: results,
        })
    }

    fn resolve_folder(&self, options: &CheckoutFolderOptions) -> Result<Option<i64>> {
        match &options.folder {
            None => Ok(None),
            Some(FolderSelector::Id(id)) => Ok(Some(*id)),
            Some(FolderSelector::Name(name)) => {
                let folders = FolderService::new(self.gateway, options.kind).fetch()?;
                find_by_name(&folders, name)
                    .map(|f| Some(f.id))
                    .ok_or_else(|| GimsError::NotFound(format!("Folder '{name}' not found")))
            }
        }
    }
}
