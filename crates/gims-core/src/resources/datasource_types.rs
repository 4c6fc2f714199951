//! DataSource types with their properties, methods and method parameters.

use serde::Serialize;
use serde_json::{Map, Value, json};

use super::{
    CodeSource, ComponentCatalog, ComponentRow, FILTERED, FolderService, PropertyService,
    ensure_changes, folder_patch_value,
};
use crate::api::{self, Gateway, routes};
use crate::error::Result;
use crate::model::{ComponentKind, RemoteComponent, RemoteMethod, RemoteParameter};

pub const DEFAULT_METHOD_CODE: &str = "# Method code\npass";
pub const DEFAULT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DsTypeDraft {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub folder_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DsTypePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub folder_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodDraft {
    pub name: String,
    pub label: String,
    pub code: Option<CodeSource>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodPatch {
    pub name: Option<String>,
    pub label: Option<String>,
    pub code: Option<CodeSource>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDraft {
    pub label: String,
    pub value_type_id: i64,
    /// `false` for output parameters
    pub input: bool,
    pub default_value: Option<String>,
    pub description: Option<String>,
    pub hidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamPatch {
    pub label: Option<String>,
    pub default_value: Option<String>,
    pub description: Option<String>,
    pub hidden: Option<bool>,
}

/// Where a search looks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchIn {
    #[default]
    Name,
    Code,
    Both,
}

impl SearchIn {
    pub fn names(self) -> bool {
        matches!(self, Self::Name | Self::Both)
    }

    pub fn code(self) -> bool {
        matches!(self, Self::Code | Self::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DsSearchHit {
    pub id: i64,
    pub name: String,
    pub matched_in: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matched_methods: Vec<MethodRef>,
}

pub struct DatasourceTypeService<'a> {
    gateway: &'a dyn Gateway,
}

impl<'a> DatasourceTypeService<'a> {
    pub fn new(gateway: &'a dyn Gateway) -> Self {
        Self { gateway }
    }

    pub fn folders(&self) -> FolderService<'a> {
        FolderService::new(self.gateway, ComponentKind::DatasourceType)
    }

    pub fn properties(&self) -> PropertyService<'a> {
        PropertyService::new(self.gateway, ComponentKind::DatasourceType)
    }

    fn catalog(&self) -> ComponentCatalog<'a> {
        ComponentCatalog::new(self.gateway, ComponentKind::DatasourceType)
    }

    // ------------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------------

    pub fn list(&self, folder_id: Option<i64>) -> Result<Vec<ComponentRow>> {
        self.catalog().list(folder_id)
    }

    /// `{"type": ..., "properties": [...], "methods": [...]}` with method
    /// code masked and parameters inlined.
    pub fn get(&self, type_id: i64, include_properties: bool, include_methods: bool) -> Result<Value> {
        let ds_type = self
            .gateway
            .get(&ComponentKind::DatasourceType.component_path(type_id))?;
        let mut result = Map::new();
        result.insert("type".into(), ds_type);

        if include_properties {
            let properties = self.properties().list(type_id)?;
            result.insert("properties".into(), json!(properties));
        }

        if include_methods {
            let mut methods = Vec::new();
            for method in self.raw_methods(type_id)? {
                let method_id = method.get("id").and_then(Value::as_i64);
                let mut method = mask_code(method);
                if let Some(id) = method_id
                    && let Some(obj) = method.as_object_mut()
                {
                    obj.insert("parameters".into(), json!(self.params(id)?));
                }
                methods.push(method);
            }
            result.insert("methods".into(), Value::Array(methods));
        }

        Ok(Value::Object(result))
    }

    pub fn create(&self, draft: &DsTypeDraft) -> Result<Value> {
        let mut data = Map::new();
        data.insert("name".into(), json!(draft.name));
        data.insert(
            "description".into(),
            json!(draft.description.clone().unwrap_or_default()),
        );
        data.insert(
            "version".into(),
            json!(draft.version.as_deref().unwrap_or(DEFAULT_VERSION)),
        );
        if let Some(folder) = draft.folder_id.filter(|id| *id > 0) {
            data.insert("folder".into(), json!(folder));
        }
        self.gateway.post(
            ComponentKind::DatasourceType.components_path(),
            Value::Object(data),
        )
    }

    pub fn update(&self, type_id: i64, patch: &DsTypePatch) -> Result<Value> {
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
        if let Some(folder) = patch.folder_id {
            data.insert("folder".into(), folder_patch_value(folder));
        }
        ensure_changes(&data)?;
        self.gateway.patch(
            &ComponentKind::DatasourceType.component_path(type_id),
            Value::Object(data),
        )
    }

    pub fn delete(&self, type_id: i64) -> Result<()> {
        self.catalog().delete(type_id)
    }

    // ------------------------------------------------------------------------
    // Methods
    // ------------------------------------------------------------------------

    fn raw_methods(&self, type_id: i64) -> Result<Vec<Value>> {
        let value = self.gateway.get_query(
            routes::DS_METHODS,
            &[(routes::METHOD_OWNER_PARAM, type_id.to_string())],
        )?;
        api::decode_list(value)
    }

    /// Typed methods including their code.
    pub fn methods(&self, type_id: i64) -> Result<Vec<RemoteMethod>> {
        self.raw_methods(type_id)?
            .into_iter()
            .map(api::decode)
            .collect()
    }

    /// Method listing without code.
    pub fn list_methods(&self, type_id: i64) -> Result<Vec<Value>> {
        Ok(self
            .raw_methods(type_id)?
            .into_iter()
            .map(|mut m| {
                if let Some(obj) = m.as_object_mut() {
                    obj.remove("code");
                }
                m
            })
            .collect())
    }

    /// `{"method": ..., "parameters": [...]}` with code masked.
    pub fn get_method(&self, method_id: i64) -> Result<Value> {
        let method = self.gateway.get(&routes::item(routes::DS_METHODS, method_id))?;
        let params = self.params(method_id)?;
        Ok(json!({ "method": mask_code(method), "parameters": params }))
    }

    pub fn get_method_code(&self, method_id: i64) -> Result<String> {
        let method: RemoteMethod =
            api::decode(self.gateway.get(&routes::item(routes::DS_METHODS, method_id))?)?;
        Ok(method.code.unwrap_or_default())
    }

    pub fn create_method(&self, type_id: i64, draft: &MethodDraft) -> Result<Value> {
        let code = match &draft.code {
            Some(source) => source.read()?,
            None => DEFAULT_METHOD_CODE.to_string(),
        };
        self.gateway.post(
            routes::DS_METHODS,
            json!({
                "mds_type_id": type_id,
                "name": draft.name,
                "label": draft.label,
                "code": code,
                "description": draft.description.clone().unwrap_or_default(),
            }),
        )
    }

    pub fn update_method(&self, method_id: i64, patch: &MethodPatch) -> Result<Value> {
        let mut data = Map::new();
        if let Some(name) = &patch.name {
            data.insert("name".into(), json!(name));
        }
        if let Some(label) = &patch.label {
            data.insert("label".into(), json!(label));
        }
        if let Some(description) = &patch.description {
            data.insert("description".into(), json!(description));
        }
        if let Some(source) = &patch.code {
            data.insert("code".into(), json!(source.read()?));
        }
        ensure_changes(&data)?;
        self.gateway
            .patch(&routes::item(routes::DS_METHODS, method_id), Value::Object(data))
    }

    pub fn delete_method(&self, method_id: i64) -> Result<()> {
        self.gateway.delete(&routes::item(routes::DS_METHODS, method_id))
    }

    // ------------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------------

    pub fn params(&self, method_id: i64) -> Result<Vec<RemoteParameter>> {
        let value = self.gateway.get_query(
            routes::DS_METHOD_PARAMS,
            &[(routes::PARAM_OWNER_PARAM, method_id.to_string())],
        )?;
        api::decode_list(value)
    }

    pub fn create_param(&self, method_id: i64, draft: &ParamDraft) -> Result<Value> {
        self.gateway.post(
            routes::DS_METHOD_PARAMS,
            json!({
                "method_id": method_id,
                "label": draft.label,
                "value_type_id": draft.value_type_id,
                "input_type": draft.input,
                "default_value": draft.default_value.clone().unwrap_or_default(),
                "description": draft.description.clone().unwrap_or_default(),
                "is_hidden": draft.hidden,
            }),
        )
    }

    pub fn update_param(&self, param_id: i64, patch: &ParamPatch) -> Result<Value> {
        let mut data = Map::new();
        if let Some(label) = &patch.label {
            data.insert("label".into(), json!(label));
        }
        if let Some(default_value) = &patch.default_value {
            data.insert("default_value".into(), json!(default_value));
        }
        if let Some(description) = &patch.description {
            data.insert("description".into(), json!(description));
        }
        if let Some(hidden) = patch.hidden {
            data.insert("is_hidden".into(), json!(hidden));
        }
        ensure_changes(&data)?;
        self.gateway.patch(
            &routes::item(routes::DS_METHOD_PARAMS, param_id),
            Value::Object(data),
        )
    }

    pub fn delete_param(&self, param_id: i64) -> Result<()> {
        self.gateway
            .delete(&routes::item(routes::DS_METHOD_PARAMS, param_id))
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    /// Substring search over type names and/or method code.
    ///
    /// A name hit short-circuits the code scan for that type.
    pub fn search(&self, query: &str, search_in: SearchIn, case_sensitive: bool) -> Result<Vec<DsSearchHit>> {
        let fold = |s: &str| {
            if case_sensitive {
                s.to_string()
            } else {
                s.to_lowercase()
            }
        };
        let needle = fold(query);
        let types: Vec<RemoteComponent> = self.catalog().fetch_all()?;
        let mut hits = Vec::new();

        for ds_type in types {
            if search_in.names() && fold(&ds_type.name).contains(&needle) {
                hits.push(DsSearchHit {
                    id: ds_type.id,
                    name: ds_type.name,
                    matched_in: "name",
                    matched_methods: Vec::new(),
                });
                continue;
            }

            if search_in.code() {
                let matched: Vec<MethodRef> = self
                    .methods(ds_type.id)?
                    .into_iter()
                    .filter(|m| fold(m.code.as_deref().unwrap_or("")).contains(&needle))
                    .map(|m| MethodRef {
                        id: m.id,
                        name: m.name,
                    })
                    .collect();
                if !matched.is_empty() {
                    hits.push(DsSearchHit {
                        id: ds_type.id,
                        name: ds_type.name,
                        matched_in: "code",
                        matched_methods: matched,
                    });
                }
            }
        }
        Ok(hits)
    }
}

/// Replace a `code` field, if present, with the filtered marker.
fn mask_code(mut record: Value) -> Value {
    if let Some(obj) = record.as_object_mut()
        && obj.contains_key("code")
    {
        obj.insert("code".into(), json!(FILTERED));
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_code_only_touches_existing_field() {
        assert_eq!(
            mask_code(json!({"id": 1, "code": "secret"})),
            json!({"id": 1, "code": "[FILTERED]"})
        );
        assert_eq!(mask_code(json!({"id": 1})), json!({"id": 1}));
    }

    #[test]
    fn search_scope_flags() {
        assert!(SearchIn::Both.names() && SearchIn::Both.code());
        assert!(!SearchIn::Name.code());
        assert!(!SearchIn::Code.names());
    }
}
