//! Local-to-remote publish with a two-stage confirmation gate.
//!
//! Without `confirm` a publish only reads: it reports what would be created
//! or which labels would be added, updated and deleted. With `confirm` the
//! same plan is applied, one request per item, in the order properties
//! (add, update, delete) then methods (add, update, delete). A failure part
//! way through leaves earlier changes in place; re-running the publish diffs
//! again and applies what is left.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::api::{Gateway, routes};
use crate::error::{GimsError, Result};
use crate::model::{ComponentKind, RemoteComponent, RemoteMethod};
use crate::resources::{ComponentCatalog, DatasourceTypeService};
use crate::sync::diff::{
    ChangeSet, index_by_label, method_diff, parameter_diff_always_update, property_diff_strict,
};
use crate::sync::projection::{
    LocalComponent, LocalMethod, ParameterRecord, PropertyRecord, count_code_lines, load_local,
    write_meta,
};
use crate::sync::validate::ensure_valid;
use crate::sync::{DiscoveredComponent, item_error, scan_components};

fn default_name(kind: ComponentKind) -> &'static str {
    match kind {
        ComponentKind::Script => "Unnamed Script",
        ComponentKind::DatasourceType => "Unnamed DataSource Type",
        ComponentKind::ActivatorType => "Unnamed Activator Type",
    }
}

#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub input_dir: PathBuf,
    /// Overrides the name from `meta.yaml`
    pub target_name: Option<String>,
    /// Destination folder for a create; overrides `gims_folder_id`
    pub folder_id: Option<i64>,
    pub confirm: bool,
}

impl PublishOptions {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            target_name: None,
            folder_id: None,
            confirm: false,
        }
    }

    pub fn with_target_name(mut self, name: Option<String>) -> Self {
        self.target_name = name;
        self
    }

    pub fn with_folder_id(mut self, folder_id: Option<i64>) -> Self {
        self.folder_id = folder_id;
        self
    }

    pub fn with_confirm(mut self, confirm: bool) -> Self {
        self.confirm = confirm;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannedAction {
    Create,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppliedAction {
    Created,
    Updated,
}

/// Per-collection changes. Absent keys do not apply to the component kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<ChangeSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods: Option<ChangeSet>,
}

/// First-stage report. No remote state was changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishPreview {
    pub gims_id: Option<i64>,
    pub name: String,
    pub action: PlannedAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<ChangeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_lines: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gims_lines: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_lines: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_confirmation: Option<Vec<String>>,
    /// Set when GIMS changed after the local checkout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl PublishPreview {
    fn new(gims_id: Option<i64>, name: String, action: PlannedAction) -> Self {
        Self {
            gims_id,
            name,
            action,
            folder_id: None,
            changes: None,
            local_lines: None,
            gims_lines: None,
            code_lines: None,
            properties_count: None,
            methods_count: None,
            requires_confirmation: None,
            warning: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub gims_id: i64,
    pub name: String,
    pub action: AppliedAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes_applied: Option<ChangeSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishOutcome {
    PendingConfirmation(PublishPreview),
    Published(PublishReport),
}

/// Deletes that need an explicit confirmation, as human-readable lines.
fn deletions(properties: Option<&ChangeSet>, methods: Option<&ChangeSet>) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(changes) = properties.filter(|c| c.has_deletes()) {
        lines.push(format!("delete properties: {}", changes.delete.join(", ")));
    }
    if let Some(changes) = methods.filter(|c| c.has_deletes()) {
        lines.push(format!("delete methods: {}", changes.delete.join(", ")));
    }
    lines
}

fn drift_warning(local: Option<&str>, remote: &RemoteComponent) -> Option<String> {
    match (local, remote.updated_at.as_deref()) {
        (Some(local), Some(remote)) if local != remote => Some(format!(
            "GIMS version changed since checkout (local: {local}, GIMS: {remote})"
        )),
        _ => None,
    }
}

fn created_id(response: &Value) -> Result<i64> {
    response
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| GimsError::Protocol {
            status: 200,
            detail: "Create response carries no id".to_string(),
        })
}

fn remote_id(kind: &str, label: &str, id: Option<i64>) -> Result<i64> {
    id.ok_or_else(|| GimsError::Protocol {
        status: 200,
        detail: format!("Remote {kind} '{label}' has no id"),
    })
}

fn with_owner(mut payload: Value, key: &str, owner_id: i64) -> Value {
    if let Some(obj) = payload.as_object_mut() {
        obj.insert(key.to_string(), json!(owner_id));
    }
    payload
}

/// Reject any code payload that does not parse, before the first request.
fn validate_local(local: &LocalComponent) -> Result<()> {
    if let Some(code) = &local.code {
        ensure_valid(code, None)?;
    }
    for method in &local.methods {
        ensure_valid(&method.code, Some(method.label()))?;
    }
    Ok(())
}

/// Remote state of an existing component, fetched for an update.
struct RemoteState {
    component: RemoteComponent,
    properties: Vec<PropertyRecord>,
    methods: Vec<RemoteMethod>,
}

/// Diff of a local component against its remote state.
struct UpdatePlan {
    code_changed: Option<bool>,
    properties: Option<ChangeSet>,
    methods: Option<ChangeSet>,
}

impl UpdatePlan {
    fn summary(&self, code_labels: (&'static str, &'static str)) -> ChangeSummary {
        ChangeSummary {
            code: self
                .code_changed
                .map(|changed| if changed { code_labels.0 } else { code_labels.1 }),
            properties: self.properties.clone(),
            methods: self.methods.clone(),
        }
    }
}

pub struct PublishCommand<'a> {
    gateway: &'a dyn Gateway,
}

impl<'a> PublishCommand<'a> {
    pub fn new(gateway: &'a dyn Gateway) -> Self {
        Self { gateway }
    }

    pub fn execute(&self, options: &PublishOptions) -> Result<PublishOutcome> {
        let mut local = load_local(&options.input_dir)?;
        validate_local(&local)?;

        let kind = local.kind;
        let name = options
            .target_name
            .clone()
            .or_else(|| local.meta.name.clone())
            .unwrap_or_else(|| default_name(kind).to_string());

        let existing = match local.meta.gims_id {
            Some(id) => match ComponentCatalog::new(self.gateway, kind).fetch(id) {
                Ok(component) => Some(component),
                Err(err) if err.is_not_found() => {
                    tracing::debug!(gims_id = id, "component gone from GIMS, publishing as new");
                    None
                }
                Err(err) => return Err(err),
            },
            None => None,
        };

        match existing {
            Some(component) => self.update(&mut local, component, name, options.confirm),
            None => self.create(&mut local, name, options),
        }
    }

    // ------------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------------

    fn fetch_remote_state(&self, kind: ComponentKind, component: RemoteComponent) -> Result<RemoteState> {
        let properties = if kind.has_properties() {
            ComponentCatalog::new(self.gateway, kind)
                .fetch_properties(component.id)?
                .iter()
                .map(PropertyRecord::from_remote)
                .collect()
        } else {
            Vec::new()
        };
        let methods = if kind.has_methods() {
            DatasourceTypeService::new(self.gateway).methods(component.id)?
        } else {
            Vec::new()
        };
        Ok(RemoteState {
            component,
            properties,
            methods,
        })
    }

    fn update(
        &self,
        local: &mut LocalComponent,
        component: RemoteComponent,
        name: String,
        confirm: bool,
    ) -> Result<PublishOutcome> {
        let kind = local.kind;
        let remote = self.fetch_remote_state(kind, component)?;
        let id = remote.component.id;
        let remote_code = remote.component.code.as_deref().unwrap_or("");

        let plan = UpdatePlan {
            code_changed: local.code.as_deref().map(|code| code != remote_code),
            properties: kind
                .has_properties()
                .then(|| property_diff_strict(&local.properties, &remote.properties)),
            methods: kind
                .has_methods()
                .then(|| method_diff(&local.methods, &remote.methods)),
        };

        if !confirm {
            let mut preview = PublishPreview::new(Some(id), name, PlannedAction::Update);
            preview.changes = Some(plan.summary(("modified", "unchanged")));
            if kind == ComponentKind::Script {
                preview.local_lines = local.code.as_deref().map(count_code_lines);
                preview.gims_lines = Some(count_code_lines(remote_code));
            } else {
                preview.requires_confirmation =
                    Some(deletions(plan.properties.as_ref(), plan.methods.as_ref()));
            }
            preview.warning = drift_warning(local.meta.gims_updated_at.as_deref(), &remote.component);
            return Ok(PublishOutcome::PendingConfirmation(preview));
        }

        let mut mutated = false;
        if plan.code_changed == Some(true)
            && let Some(code) = &local.code
        {
            self.gateway
                .patch(&kind.component_path(id), json!({ "code": code }))?;
            mutated = true;
        }
        if let Some(changes) = &plan.properties {
            self.apply_properties(kind, id, changes, &local.properties, &remote.properties)?;
            mutated |= !changes.is_empty();
        }
        if let Some(changes) = &plan.methods {
            self.apply_methods(id, changes, &local.methods, &remote.methods)?;
            mutated |= !changes.is_empty();
        }

        let updated_at = if mutated {
            ComponentCatalog::new(self.gateway, kind).fetch(id)?.updated_at
        } else {
            remote.component.updated_at.clone()
        };
        record_remote_state(local, id, updated_at)?;
        tracing::info!(gims_id = id, mutated, "publish applied");

        let changes_applied = match kind {
            ComponentKind::Script => None,
            _ => Some(plan.summary(("updated", "unchanged"))),
        };
        Ok(PublishOutcome::Published(PublishReport {
            gims_id: id,
            name,
            action: AppliedAction::Updated,
            changes_applied,
        }))
    }

    fn apply_properties(
        &self,
        kind: ComponentKind,
        owner_id: i64,
        changes: &ChangeSet,
        local: &[PropertyRecord],
        remote: &[PropertyRecord],
    ) -> Result<()> {
        let (path, owner_key) = kind.properties_route().ok_or_else(|| {
            GimsError::InvalidInput(format!("{}s have no properties", kind.display_name()))
        })?;
        let (_, local_by_label) = index_by_label(local);
        let (_, remote_by_label) = index_by_label(remote);

        for label in &changes.add {
            let payload = with_owner(local_by_label[label.as_str()].to_payload(), owner_key, owner_id);
            self.gateway.post(path, payload)?;
        }
        for label in &changes.update {
            let prop_id = remote_id("property", label, remote_by_label[label.as_str()].gims_id)?;
            self.gateway.patch(
                &routes::item(path, prop_id),
                local_by_label[label.as_str()].to_payload(),
            )?;
        }
        for label in &changes.delete {
            let prop_id = remote_id("property", label, remote_by_label[label.as_str()].gims_id)?;
            self.gateway.delete(&routes::item(path, prop_id))?;
        }
        Ok(())
    }

    fn apply_methods(
        &self,
        type_id: i64,
        changes: &ChangeSet,
        local: &[LocalMethod],
        remote: &[RemoteMethod],
    ) -> Result<()> {
        let service = DatasourceTypeService::new(self.gateway);
        let (_, local_by_label) = index_by_label(local);
        let (_, remote_by_label) = index_by_label(remote);

        for label in &changes.add {
            self.create_method(type_id, local_by_label[label.as_str()])?;
        }

        for label in &changes.update {
            let method = local_by_label[label.as_str()];
            let method_id = remote_by_label[label.as_str()].id;
            self.gateway.patch(
                &routes::item(routes::DS_METHODS, method_id),
                json!({
                    "name": method.name(),
                    "description": method.meta.description.clone().unwrap_or_default(),
                    "code": method.code,
                }),
            )?;

            let remote_params: Vec<ParameterRecord> = service
                .params(method_id)?
                .iter()
                .map(ParameterRecord::from_remote)
                .collect();
            let param_changes = parameter_diff_always_update(&method.parameters, &remote_params);
            self.apply_parameters(method_id, &param_changes, &method.parameters, &remote_params)?;
        }

        for label in &changes.delete {
            service.delete_method(remote_by_label[label.as_str()].id)?;
        }
        Ok(())
    }

    fn apply_parameters(
        &self,
        method_id: i64,
        changes: &ChangeSet,
        local: &[ParameterRecord],
        remote: &[ParameterRecord],
    ) -> Result<()> {
        let (_, local_by_label) = index_by_label(local);
        let (_, remote_by_label) = index_by_label(remote);

        for label in &changes.add {
            let payload = with_owner(
                local_by_label[label.as_str()].to_payload(),
                routes::PARAM_OWNER_PARAM,
                method_id,
            );
            self.gateway.post(routes::DS_METHOD_PARAMS, payload)?;
        }
        for label in &changes.update {
            let param_id = remote_id("parameter", label, remote_by_label[label.as_str()].gims_id)?;
            self.gateway.patch(
                &routes::item(routes::DS_METHOD_PARAMS, param_id),
                local_by_label[label.as_str()].to_payload(),
            )?;
        }
        for label in &changes.delete {
            let param_id = remote_id("parameter", label, remote_by_label[label.as_str()].gims_id)?;
            self.gateway
                .delete(&routes::item(routes::DS_METHOD_PARAMS, param_id))?;
        }
        Ok(())
    }

    fn create_method(&self, type_id: i64, method: &LocalMethod) -> Result<i64> {
        let created = self.gateway.post(
            routes::DS_METHODS,
            json!({
                "mds_type_id": type_id,
                "name": method.name(),
                "label": method.label(),
                "description": method.meta.description.clone().unwrap_or_default(),
                "code": method.code,
            }),
        )?;
        let method_id = created_id(&created)?;
        for param in &method.parameters {
            self.gateway.post(
                routes::DS_METHOD_PARAMS,
                with_owner(param.to_payload(), routes::PARAM_OWNER_PARAM, method_id),
            )?;
        }
        Ok(method_id)
    }

    // ------------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------------

    fn create(
        &self,
        local: &mut LocalComponent,
        name: String,
        options: &PublishOptions,
    ) -> Result<PublishOutcome> {
        let kind = local.kind;
        let folder_id = options
            .folder_id
            .or(local.meta.gims_folder_id)
            .filter(|id| *id > 0);

        if !options.confirm {
            let mut preview = PublishPreview::new(None, name, PlannedAction::Create);
            preview.folder_id = folder_id;
            preview.code_lines = local.code.as_deref().map(count_code_lines);
            preview.properties_count = kind.has_properties().then_some(local.properties.len());
            preview.methods_count = kind.has_methods().then_some(local.methods.len());
            return Ok(PublishOutcome::PendingConfirmation(preview));
        }

        let mut data = Map::new();
        data.insert("name".into(), json!(name));
        if kind != ComponentKind::Script {
            data.insert(
                "description".into(),
                json!(local.meta.description.clone().unwrap_or_default()),
            );
        }
        if let Some(code) = &local.code {
            data.insert("code".into(), json!(code));
        }
        if let Some(folder) = folder_id {
            data.insert(kind.folder_field().into(), json!(folder));
        }

        let created = self
            .gateway
            .post(kind.components_path(), Value::Object(data))?;
        let id = created_id(&created)?;
        tracing::info!(gims_id = id, kind = %kind, "component created");

        if kind.has_properties() {
            let added = ChangeSet {
                add: index_by_label(&local.properties)
                    .0
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                ..ChangeSet::default()
            };
            self.apply_properties(kind, id, &added, &local.properties, &[])?;
        }
        for method in &local.methods {
            self.create_method(id, method)?;
        }

        let updated_at = created
            .get("updated_at")
            .and_then(Value::as_str)
            .map(str::to_string);
        record_remote_state(local, id, updated_at)?;

        Ok(PublishOutcome::Published(PublishReport {
            gims_id: id,
            name,
            action: AppliedAction::Created,
            changes_applied: None,
        }))
    }
}

/// Write the remote id and timestamp back into `meta.yaml`.
fn record_remote_state(local: &mut LocalComponent, id: i64, updated_at: Option<String>) -> Result<()> {
    if local.meta.gims_id == Some(id) && local.meta.gims_updated_at == updated_at {
        return Ok(());
    }
    local.meta.gims_id = Some(id);
    local.meta.gims_updated_at = updated_at;
    write_meta(&local.dir, &local.meta)
}

// ============================================================================
// Publish all
// ============================================================================

#[derive(Debug, Clone)]
pub struct PublishAllOptions {
    pub base_dir: PathBuf,
    pub dry_run: bool,
    pub confirm: bool,
    /// Keep going after a failed component
    pub force: bool,
}

impl PublishAllOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            dry_run: false,
            confirm: false,
            force: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_confirm(mut self, confirm: bool) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishFailure {
    pub status: &'static str,
    pub name: Option<String>,
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PublishAllItem {
    Done(PublishOutcome),
    Failed(PublishFailure),
}

impl PublishAllItem {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishAllOutcome {
    DryRun {
        base_dir: PathBuf,
        components: Vec<DiscoveredComponent>,
    },
    PendingConfirmation {
        base_dir: PathBuf,
        components: Vec<DiscoveredComponent>,
        message: String,
    },
    /// At least one component failed and `force` was off
    Error {
        message: String,
        errors: Vec<PublishAllItem>,
        successful: Vec<PublishAllItem>,
    },
    Published {
        base_dir: PathBuf,
        results: Vec<PublishAllItem>,
    },
}

impl PublishAllOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

pub struct PublishAllCommand<'a> {
    publish: PublishCommand<'a>,
}

impl<'a> PublishAllCommand<'a> {
    pub fn new(gateway: &'a dyn Gateway) -> Self {
        Self {
            publish: PublishCommand::new(gateway),
        }
    }

    pub fn execute(&self, options: &PublishAllOptions) -> Result<PublishAllOutcome> {
        let base_dir = options.base_dir.clone();
        let components = scan_components(&base_dir)?;

        if options.dry_run {
            return Ok(PublishAllOutcome::DryRun {
                base_dir,
                components,
            });
        }
        if !options.confirm {
            return Ok(PublishAllOutcome::PendingConfirmation {
                base_dir,
                components,
                message: "Add --confirm to publish all components".to_string(),
            });
        }

        let results: Vec<PublishAllItem> = components
            .into_iter()
            .map(|component| self.publish_one(&component.path, component.name))
            .collect();

        if !options.force && results.iter().any(PublishAllItem::is_failure) {
            let (errors, successful): (Vec<_>, Vec<_>) =
                results.into_iter().partition(PublishAllItem::is_failure);
            return Ok(PublishAllOutcome::Error {
                message: "Publish aborted due to errors".to_string(),
                errors,
                successful,
            });
        }

        Ok(PublishAllOutcome::Published { base_dir, results })
    }

    fn publish_one(&self, path: &Path, name: Option<String>) -> PublishAllItem {
        let options = PublishOptions::new(path).with_confirm(true);
        match self.publish.execute(&options) {
            Ok(outcome) => PublishAllItem::Done(outcome),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "publish failed");
                PublishAllItem::Failed(PublishFailure {
                    status: "error",
                    name,
                    path: path.to_path_buf(),
                    error: item_error(&err),
                })
            }
        }
    }
}
