//! Script CRUD and server-side code search.

use serde_json::{Map, Value, json};

use super::{CodeSource, ComponentCatalog, ComponentRow, FolderService, ensure_changes, folder_patch_value};
use crate::api::{Gateway, routes};
use crate::error::Result;
use crate::model::ComponentKind;

/// Replaces script code unless the caller asked for it
pub const FILTERED_SCRIPT_CODE: &str = "[FILTERED] Use --include-code to see code";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptDraft {
    pub name: String,
    pub code: Option<CodeSource>,
    pub folder_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptPatch {
    pub name: Option<String>,
    pub code: Option<CodeSource>,
    /// `Some(0)` removes the script from its folder
    pub folder_id: Option<i64>,
}

/// Options for the code search endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeSearch {
    pub query: String,
    pub case_sensitive: bool,
    pub exact_match: bool,
}

pub struct ScriptService<'a> {
    gateway: &'a dyn Gateway,
}

impl<'a> ScriptService<'a> {
    pub fn new(gateway: &'a dyn Gateway) -> Self {
        Self { gateway }
    }

    pub fn folders(&self) -> FolderService<'a> {
        FolderService::new(self.gateway, ComponentKind::Script)
    }

    fn catalog(&self) -> ComponentCatalog<'a> {
        ComponentCatalog::new(self.gateway, ComponentKind::Script)
    }

    pub fn list(&self, folder_id: Option<i64>) -> Result<Vec<ComponentRow>> {
        self.catalog().list(folder_id)
    }

    /// Raw script record. Code is masked unless `include_code`.
    pub fn get(&self, script_id: i64, include_code: bool) -> Result<Value> {
        let mut script = self
            .gateway
            .get(&ComponentKind::Script.component_path(script_id))?;
        if !include_code && let Some(obj) = script.as_object_mut() {
            obj.insert("code".into(), json!(FILTERED_SCRIPT_CODE));
        }
        Ok(script)
    }

    pub fn get_code(&self, script_id: i64) -> Result<String> {
        let script = self.catalog().fetch(script_id)?;
        Ok(script.code.unwrap_or_default())
    }

    pub fn create(&self, draft: &ScriptDraft) -> Result<Value> {
        let code = match &draft.code {
            Some(source) => source.read()?,
            None => String::new(),
        };
        let mut data = Map::new();
        data.insert("name".into(), json!(draft.name));
        data.insert("code".into(), json!(code));
        if let Some(folder) = draft.folder_id.filter(|id| *id > 0) {
            data.insert("folder_id".into(), json!(folder));
        }
        self.gateway
            .post(ComponentKind::Script.components_path(), Value::Object(data))
    }

    pub fn update(&self, script_id: i64, patch: &ScriptPatch) -> Result<Value> {
        let mut data = Map::new();
        if let Some(name) = &patch.name {
            data.insert("name".into(), json!(name));
        }
        if let Some(source) = &patch.code {
            data.insert("code".into(), json!(source.read()?));
        }
        if let Some(folder) = patch.folder_id {
            data.insert("folder_id".into(), folder_patch_value(folder));
        }
        ensure_changes(&data)?;
        self.gateway.patch(
            &ComponentKind::Script.component_path(script_id),
            Value::Object(data),
        )
    }

    pub fn delete(&self, script_id: i64) -> Result<()> {
        self.catalog().delete(script_id)
    }

    /// `{"results": [...], "count": n}` from the server-side code search.
    pub fn search(&self, search: &CodeSearch) -> Result<Value> {
        let flag = |on: bool| if on { "true" } else { "false" }.to_string();
        let results = self.gateway.get_query(
            routes::SCRIPT_CODE_SEARCH,
            &[
                ("search_code", search.query.clone()),
                ("case_sensitive", flag(search.case_sensitive)),
                ("exact_match", flag(search.exact_match)),
            ],
        )?;
        let count = results.as_array().map_or(0, Vec::len);
        Ok(json!({ "results": results, "count": count }))
    }

    /// Log stream URLs registered for a script.
    pub fn log_urls(&self, script_id: i64) -> Result<Value> {
        self.gateway.get(&routes::script_log_url(script_id))
    }
}
