//! Activator type CRUD, regex search and properties.

use regex::RegexBuilder;
use serde::Serialize;
use serde_json::{Map, Value, json};

use super::datasource_types::SearchIn;
use super::{
    CodeSource, ComponentCatalog, ComponentRow, FolderService, PropertyService, ensure_changes,
    folder_patch_value,
};
use crate::api::Gateway;
use crate::error::{GimsError, Result};
use crate::model::ComponentKind;

pub const DEFAULT_ACTIVATOR_CODE: &str =
    "# Print all built-in variables and functions for help\nprint_help()";
pub const FILTERED_ACTIVATOR_CODE: &str = "[FILTERED] Use --include-code or get-code command";
pub const DEFAULT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivatorDraft {
    pub name: String,
    pub code: Option<CodeSource>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub folder_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivatorPatch {
    pub name: Option<String>,
    pub code: Option<CodeSource>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub folder_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivatorSearchHit {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub matched_in: &'static str,
}

pub struct ActivatorTypeService<'a> {
    gateway: &'a dyn Gateway,
}

impl<'a> ActivatorTypeService<'a> {
    pub fn new(gateway: &'a dyn Gateway) -> Self {
        Self { gateway }
    }

    pub fn folders(&self) -> FolderService<'a> {
        FolderService::new(self.gateway, ComponentKind::ActivatorType)
    }

    pub fn properties(&self) -> PropertyService<'a> {
        PropertyService::new(self.gateway, ComponentKind::ActivatorType)
    }

    fn catalog(&self) -> ComponentCatalog<'a> {
        ComponentCatalog::new(self.gateway, ComponentKind::ActivatorType)
    }

    pub fn list(&self, folder_id: Option<i64>) -> Result<Vec<ComponentRow>> {
        self.catalog().list(folder_id)
    }

    /// `{"type": ..., "properties": [...]}`; code masked unless `include_code`.
    pub fn get(&self, type_id: i64, include_code: bool, include_properties: bool) -> Result<Value> {
        let mut act_type = self
            .gateway
            .get(&ComponentKind::ActivatorType.component_path(type_id))?;
        if !include_code && let Some(obj) = act_type.as_object_mut() {
            obj.insert("code".into(), json!(FILTERED_ACTIVATOR_CODE));
        }

        let mut result = Map::new();
        result.insert("type".into(), act_type);
        if include_properties {
            result.insert("properties".into(), json!(self.properties().list(type_id)?));
        }
        Ok(Value::Object(result))
    }

    pub fn get_code(&self, type_id: i64) -> Result<String> {
        Ok(self.catalog().fetch(type_id)?.code.unwrap_or_default())
    }

    pub fn create(&self, draft: &ActivatorDraft) -> Result<Value> {
        let code = match &draft.code {
            Some(source) => source.read()?,
            None => DEFAULT_ACTIVATOR_CODE.to_string(),
        };
        let mut data = Map::new();
        data.insert("name".into(), json!(draft.name));
        data.insert("code".into(), json!(code));
        if let Some(description) = draft.description.as_ref().filter(|d| !d.is_empty()) {
            data.insert("description".into(), json!(description));
        }
        data.insert(
            "version".into(),
            json!(draft.version.as_deref().unwrap_or(DEFAULT_VERSION)),
        );
        if let Some(folder) = draft.folder_id.filter(|id| *id > 0) {
            data.insert("folder".into(), json!(folder));
        }
        self.gateway.post(
            ComponentKind::ActivatorType.components_path(),
            Value::Object(data),
        )
    }

    pub fn update(&self, type_id: i64, patch: &ActivatorPatch) -> Result<Value> {
        let mut data = Map::new();
        if let Some(name) = &patch.name {
            data.insert("name".into(), json!(name));
        }
        if let Some(description) = &patch.description {
            data.insert("description".into(), json!(description));
        }
        if let Some(version) = &patch.version {
            data.insert("version".into(), json!(version));
        }
        if let Some(source) = &patch.code {
            data.insert("code".into(), json!(source.read()?));
        }
        if let Some(folder) = patch.folder_id {
            data.insert("folder".into(), folder_patch_value(folder));
        }
        ensure_changes(&data)?;
        self.gateway.patch(
            &ComponentKind::ActivatorType.component_path(type_id),
            Value::Object(data),
        )
    }

    pub fn delete(&self, type_id: i64) -> Result<()> {
        self.catalog().delete(type_id)
    }

    /// Regex search over names and/or code. Name hits are reported first and
    /// are not scanned again for code.
    pub fn search(
        &self,
        pattern: &str,
        search_in: SearchIn,
        case_sensitive: bool,
    ) -> Result<Vec<ActivatorSearchHit>> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| GimsError::InvalidInput(format!("Invalid search pattern: {e}")))?;

        let catalog = self.catalog();
        let types = catalog.fetch_all()?;
        let mut hits = Vec::new();

        if search_in.names() {
            for t in types.iter().filter(|t| regex.is_match(&t.name)) {
                hits.push(ActivatorSearchHit {
                    id: t.id,
                    name: t.name.clone(),
                    description: t.description.clone().unwrap_or_default(),
                    matched_in: "name",
                });
            }
        }

        if search_in.code() {
            for t in &types {
                if hits.iter().any(|h| h.id == t.id) {
                    continue;
                }
                let full = catalog.fetch(t.id)?;
                if regex.is_match(full.code.as_deref().unwrap_or("")) {
                    hits.push(ActivatorSearchHit {
                        id: t.id,
                        name: t.name.clone(),
                        description: t.description.clone().unwrap_or_default(),
                        matched_in: "code",
                    });
                }
            }
        }

        Ok(hits)
    }
}
