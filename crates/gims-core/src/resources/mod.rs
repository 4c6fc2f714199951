//! CRUD services per object kind.
//!
//! Services are thin: they shape request payloads, call the gateway and
//! return either typed rows or the server's JSON as-is.

pub mod activator_types;
pub mod datasource_types;
pub mod references;
pub mod scripts;

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::api::{self, ApiRequest, Gateway, routes};
use crate::error::{GimsError, Result};
use crate::folders::{build_folder_paths, path_of};
use crate::model::{ComponentKind, Folder, RemoteComponent, RemoteProperty};

pub use activator_types::ActivatorTypeService;
pub use datasource_types::DatasourceTypeService;
pub use references::ReferenceService;
pub use scripts::ScriptService;

/// Placeholder that replaces method code in listings
pub const FILTERED: &str = "[FILTERED]";

// ============================================================================
// Shared inputs
// ============================================================================

/// Where new code comes from on create/update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeSource {
    Inline(String),
    File(PathBuf),
}

impl CodeSource {
    /// Pick inline code over a file, as the CLI flags do.
    pub fn from_flags(code: Option<String>, code_file: Option<PathBuf>) -> Option<Self> {
        code.map(Self::Inline).or(code_file.map(Self::File))
    }

    pub fn read(&self) -> Result<String> {
        match self {
            Self::Inline(code) => Ok(code.clone()),
            Self::File(path) => std::fs::read_to_string(path).map_err(|e| GimsError::io(path, e)),
        }
    }
}

/// Folder reference in a partial update. `Some(0)` detaches the object.
pub(crate) fn folder_patch_value(folder_id: i64) -> Value {
    if folder_id > 0 {
        json!(folder_id)
    } else {
        Value::Null
    }
}

pub(crate) fn ensure_changes(data: &Map<String, Value>) -> Result<()> {
    if data.is_empty() {
        return Err(GimsError::InvalidInput("No changes specified".to_string()));
    }
    Ok(())
}

// ============================================================================
// Folders
// ============================================================================

/// Folder row with its derived path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderListing {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub parent_folder_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderPatch {
    pub name: Option<String>,
    /// `Some(0)` moves the folder to the root
    pub parent_folder_id: Option<i64>,
}

/// Folder operations, identical across kinds apart from the route.
pub struct FolderService<'a> {
    gateway: &'a dyn Gateway,
    kind: ComponentKind,
}

impl<'a> FolderService<'a> {
    pub fn new(gateway: &'a dyn Gateway, kind: ComponentKind) -> Self {
        Self { gateway, kind }
    }

    pub fn fetch(&self) -> Result<Vec<Folder>> {
        api::decode_list(self.gateway.get(self.kind.folders_path())?)
    }

    pub fn list(&self) -> Result<Vec<FolderListing>> {
        let folders = self.fetch()?;
        let paths = build_folder_paths(&folders)?;
        Ok(folders
            .into_iter()
            .map(|f| FolderListing {
                path: paths.get(&f.id).cloned().unwrap_or_else(|| f.name.clone()),
                id: f.id,
                name: f.name,
                parent_folder_id: f.parent_folder_id,
            })
            .collect())
    }

    pub fn create(&self, name: &str, parent_folder_id: Option<i64>) -> Result<Value> {
        let mut data = Map::new();
        data.insert("name".into(), json!(name));
        if let Some(parent) = parent_folder_id.filter(|id| *id > 0) {
            data.insert("parent_folder_id".into(), json!(parent));
        }
        self.gateway
            .post(self.kind.folders_path(), Value::Object(data))
    }

    pub fn update(&self, folder_id: i64, patch: &FolderPatch) -> Result<Value> {
        let mut data = Map::new();
        if let Some(name) = &patch.name {
            data.insert("name".into(), json!(name));
        }
        if let Some(parent) = patch.parent_folder_id {
            data.insert("parent_folder_id".into(), folder_patch_value(parent));
        }
        ensure_changes(&data)?;
        self.gateway.patch(
            &routes::item(self.kind.folders_path(), folder_id),
            Value::Object(data),
        )
    }

    pub fn delete(&self, folder_id: i64) -> Result<()> {
        self.gateway
            .delete(&routes::item(self.kind.folders_path(), folder_id))
    }
}

// ============================================================================
// Components
// ============================================================================

/// Listing row for any component kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentRow {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub folder_path: String,
    pub folder_id: Option<i64>,
}

/// Lookup and listing shared by every component kind.
pub struct ComponentCatalog<'a> {
    gateway: &'a dyn Gateway,
    kind: ComponentKind,
}

impl<'a> ComponentCatalog<'a> {
    pub fn new(gateway: &'a dyn Gateway, kind: ComponentKind) -> Self {
        Self { gateway, kind }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn fetch_all(&self) -> Result<Vec<RemoteComponent>> {
        api::decode_list(self.gateway.get(self.kind.components_path())?)
    }

    pub fn fetch(&self, id: i64) -> Result<RemoteComponent> {
        api::decode(self.gateway.get(&self.kind.component_path(id))?)
    }

    /// Full record of the first component whose name matches exactly.
    pub fn fetch_by_name(&self, name: &str) -> Result<RemoteComponent> {
        let summary = self
            .fetch_all()?
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| {
                GimsError::NotFound(format!("{} '{name}' not found", self.kind.display_name()))
            })?;
        self.fetch(summary.id)
    }

    /// Components filed under `folder_id`, or all when `None`.
    pub fn fetch_in_folder(&self, folder_id: Option<i64>) -> Result<Vec<RemoteComponent>> {
        let mut request = ApiRequest::get(self.kind.components_path());
        if let Some(id) = folder_id {
            request = request.with_query("folder_id", id);
        }
        let all: Vec<RemoteComponent> =
            api::decode_list(self.gateway.request(request)?.unwrap_or(Value::Null))?;
        Ok(match folder_id {
            Some(id) => all.into_iter().filter(|c| c.folder_ref() == Some(id)).collect(),
            None => all,
        })
    }

    /// Listing rows with derived folder paths.
    pub fn list(&self, folder_id: Option<i64>) -> Result<Vec<ComponentRow>> {
        let folders = FolderService::new(self.gateway, self.kind).fetch()?;
        let paths = build_folder_paths(&folders)?;
        let with_details = self.kind != ComponentKind::Script;

        Ok(self
            .fetch_all()?
            .into_iter()
            .filter(|c| folder_id.is_none() || c.folder_ref() == folder_id)
            .map(|c| {
                let folder = c.folder_ref();
                ComponentRow {
                    id: c.id,
                    description: with_details.then(|| c.description.clone().unwrap_or_default()),
                    version: with_details.then(|| c.version.clone().unwrap_or_default()),
                    name: c.name,
                    folder_path: path_of(&paths, folder),
                    folder_id: folder,
                }
            })
            .collect())
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        self.gateway.delete(&self.kind.component_path(id))
    }

    /// Properties owned by a datasource/activator type.
    pub fn fetch_properties(&self, owner_id: i64) -> Result<Vec<RemoteProperty>> {
        let Some((path, owner_key)) = self.kind.properties_route() else {
            return Ok(Vec::new());
        };
        let value = self
            .gateway
            .get_query(path, &[(owner_key, owner_id.to_string())])?;
        let props: Vec<RemoteProperty> = api::decode_list(value)?;
        let owner_of = |p: &RemoteProperty| match self.kind {
            ComponentKind::ActivatorType => p.activator_type_id,
            _ => p.mds_type_id,
        };
        // Some deployments ignore the owner query and return every property
        Ok(props
            .into_iter()
            .filter(|p| owner_of(p).is_none_or(|owner| owner == owner_id))
            .collect())
    }
}

// ============================================================================
// Properties
// ============================================================================

/// New property for a datasource or activator type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDraft {
    pub name: String,
    pub label: String,
    pub value_type_id: i64,
    pub section_id: i64,
    pub description: Option<String>,
    pub default_value: Option<String>,
    pub is_required: bool,
    pub is_hidden: bool,
    /// Activator types only
    pub default_dict_value_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyPatch {
    pub name: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub default_value: Option<String>,
    pub is_required: Option<bool>,
    pub is_hidden: Option<bool>,
}

impl PropertyPatch {
    pub(crate) fn payload(&self) -> Result<Value> {
        let mut data = Map::new();
        if let Some(name) = &self.name {
            data.insert("name".into(), json!(name));
        }
        if let Some(label) = &self.label {
            data.insert("label".into(), json!(label));
        }
        if let Some(description) = &self.description {
            data.insert("description".into(), json!(description));
        }
        if let Some(default_value) = &self.default_value {
            data.insert("default_value".into(), json!(default_value));
        }
        if let Some(required) = self.is_required {
            data.insert("is_required".into(), json!(required));
        }
        if let Some(hidden) = self.is_hidden {
            data.insert("is_hidden".into(), json!(hidden));
        }
        ensure_changes(&data)?;
        Ok(Value::Object(data))
    }
}

/// Property create/update/delete for kinds that carry properties.
pub struct PropertyService<'a> {
    gateway: &'a dyn Gateway,
    kind: ComponentKind,
}

impl<'a> PropertyService<'a> {
    pub fn new(gateway: &'a dyn Gateway, kind: ComponentKind) -> Self {
        Self { gateway, kind }
    }

    fn route(&self) -> Result<(&'static str, &'static str)> {
        self.kind.properties_route().ok_or_else(|| {
            GimsError::InvalidInput(format!("{}s have no properties", self.kind.display_name()))
        })
    }

    pub fn list(&self, owner_id: i64) -> Result<Vec<RemoteProperty>> {
        ComponentCatalog::new(self.gateway, self.kind).fetch_properties(owner_id)
    }

    pub fn create(&self, owner_id: i64, draft: &PropertyDraft) -> Result<Value> {
        let (path, owner_key) = self.route()?;
        let mut data = Map::new();
        data.insert(owner_key.into(), json!(owner_id));
        data.insert("name".into(), json!(draft.name));
        data.insert("label".into(), json!(draft.label));
        data.insert("value_type_id".into(), json!(draft.value_type_id));
        data.insert("section_name_id".into(), json!(draft.section_id));

        match self.kind {
            // Datasource properties are created with every field spelled out
            ComponentKind::DatasourceType => {
                data.insert(
                    "description".into(),
                    json!(draft.description.clone().unwrap_or_default()),
                );
                data.insert(
                    "default_value".into(),
                    json!(draft.default_value.clone().unwrap_or_default()),
                );
                data.insert("is_required".into(), json!(draft.is_required));
                data.insert("is_hidden".into(), json!(draft.is_hidden));
            }
            _ => {
                if let Some(description) = draft.description.as_ref().filter(|d| !d.is_empty()) {
                    data.insert("description".into(), json!(description));
                }
                if let Some(default) = draft.default_value.as_ref().filter(|d| !d.is_empty()) {
                    data.insert("default_value".into(), json!(default));
                }
                if draft.is_required {
                    data.insert("is_required".into(), json!(true));
                }
                if draft.is_hidden {
                    data.insert("is_hidden".into(), json!(true));
                }
                if let Some(dict_value) = draft.default_dict_value_id {
                    data.insert("default_dict_value_id".into(), json!(dict_value));
                }
            }
        }

        self.gateway.post(path, Value::Object(data))
    }

    pub fn update(&self, property_id: i64, patch: &PropertyPatch) -> Result<Value> {
        let (path, _) = self.route()?;
        self.gateway
            .patch(&routes::item(path, property_id), patch.payload()?)
    }

    pub fn delete(&self, property_id: i64) -> Result<()> {
        let (path, _) = self.route()?;
        self.gateway.delete(&routes::item(path, property_id))
    }
}

/// Serialize a typed record list under a single key, e.g. `{"properties": [...]}`.
pub fn wrap<T: Serialize>(key: &str, items: &T) -> Value {
    let mut map = Map::new();
    map.insert(
        key.to_string(),
        serde_json::to_value(items).unwrap_or(Value::Null),
    );
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_code_wins_over_file() {
        let source = CodeSource::from_flags(Some("x = 1".into()), Some(PathBuf::from("a.py")));
        assert_eq!(source, Some(CodeSource::Inline("x = 1".into())));
        assert_eq!(CodeSource::from_flags(None, None), None);
    }

    #[test]
    fn empty_property_patch_is_rejected() {
        let err = PropertyPatch::default().payload().unwrap_err();
        assert_eq!(err.to_string(), "No changes specified");
    }

    #[test]
    fn zero_folder_detaches() {
        assert_eq!(folder_patch_value(0), Value::Null);
        assert_eq!(folder_patch_value(12), json!(12));
    }
}
