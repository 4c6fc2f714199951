//! Local projection of a remote component.
//!
//! A component is stored as a directory:
//!
//! ```text
//! <dir>/meta.yaml
//! <dir>/code.py                 script, activator type
//! <dir>/properties.yaml         datasource type, activator type
//! <dir>/methods/<label>/meta.yaml
//! <dir>/methods/<label>/code.py
//! <dir>/methods/<label>/params.yaml
//! ```
//!
//! Remote records are serialized into an ordered [`Projection`] (relative
//! path to content) and read back as a [`LocalComponent`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{GimsError, Result};
use crate::model::{
    ComponentKind, RemoteComponent, RemoteMethod, RemoteParameter, RemoteProperty, display_ref,
};

pub const META_FILE: &str = "meta.yaml";
pub const CODE_FILE: &str = "code.py";
pub const PROPERTIES_FILE: &str = "properties.yaml";
pub const METHODS_DIR: &str = "methods";
pub const PARAMS_FILE: &str = "params.yaml";

/// Placeholder written when a method or activator type has no code
pub const NO_CODE: &str = "# No code";
/// Section used when a property carries no section name
pub const DEFAULT_SECTION: &str = "Основные";
pub const DEFAULT_VERSION: &str = "1.0";

// ============================================================================
// Clock
// ============================================================================

/// Source of the export timestamp.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ============================================================================
// File records
// ============================================================================

/// Contents of a component's `meta.yaml`.
///
/// Keys this client does not know about are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentMeta {
    #[serde(default)]
    pub gims_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub gims_folder: Option<String>,
    #[serde(default)]
    pub gims_folder_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_file: Option<String>,
    #[serde(default)]
    pub gims_updated_at: Option<String>,
    #[serde(default)]
    pub exported_at: Option<String>,
    #[serde(default)]
    pub exported_from: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Contents of `methods/<label>/meta.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodMeta {
    #[serde(default)]
    pub gims_id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub code_file: Option<String>,
    #[serde(default)]
    pub params_file: Option<String>,
    #[serde(default)]
    pub gims_updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn empty_string_value() -> Value {
    json!("")
}

fn default_section() -> String {
    DEFAULT_SECTION.to_string()
}

fn default_true() -> bool {
    true
}

/// One entry of `properties.yaml`.
///
/// `value_type` and `section` are display names kept for readers; the API
/// payload uses only the id references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    #[serde(default)]
    pub gims_id: Option<i64>,
    #[serde(default)]
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub value_type: String,
    #[serde(default)]
    pub value_type_id: Option<i64>,
    #[serde(default = "empty_string_value")]
    pub default_value: Value,
    #[serde(default = "default_section")]
    pub section: String,
    #[serde(default)]
    pub section_id: Option<i64>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub is_inner: bool,
    #[serde(default)]
    pub description: String,
}

impl PropertyRecord {
    pub fn from_remote(prop: &RemoteProperty) -> Self {
        Self {
            gims_id: Some(prop.id),
            name: prop.name.clone(),
            label: prop.label.clone(),
            value_type: prop
                .value_type_name
                .clone()
                .or_else(|| display_ref(&prop.value_type))
                .unwrap_or_default(),
            value_type_id: prop.value_type_id,
            default_value: null_as_empty(&prop.default_value),
            section: prop
                .section_name
                .clone()
                .or_else(|| display_ref(&prop.section))
                .unwrap_or_else(default_section),
            section_id: prop.section_name_id,
            is_required: prop.is_required.unwrap_or(false),
            is_hidden: prop.is_hidden.unwrap_or(false),
            is_inner: prop.is_inner.unwrap_or(false),
            description: prop.description.clone().unwrap_or_default(),
        }
    }

    /// Create/update payload, without the owner reference.
    pub fn to_payload(&self) -> Value {
        json!({
            "name": self.name,
            "label": self.label,
            "value_type_id": self.value_type_id,
            "default_value": self.default_value,
            "section_name_id": self.section_id,
            "is_required": self.is_required,
            "is_hidden": self.is_hidden,
            "is_inner": self.is_inner,
            "description": self.description,
        })
    }
}

/// One entry of `params.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    #[serde(default)]
    pub gims_id: Option<i64>,
    pub label: String,
    /// `true` for input parameters, `false` for outputs
    #[serde(default = "default_true")]
    pub input_type: bool,
    #[serde(default)]
    pub value_type: String,
    #[serde(default)]
    pub value_type_id: Option<i64>,
    #[serde(default = "empty_string_value")]
    pub default_value: Value,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_hidden: bool,
}

impl ParameterRecord {
    pub fn from_remote(param: &RemoteParameter) -> Self {
        Self {
            gims_id: Some(param.id),
            label: param.label.clone(),
            input_type: param.input_type.unwrap_or(true),
            value_type: param
                .value_type_name
                .clone()
                .or_else(|| display_ref(&param.value_type))
                .unwrap_or_default(),
            value_type_id: param.value_type_id,
            default_value: null_as_empty(&param.default_value),
            description: param.description.clone().unwrap_or_default(),
            is_hidden: param.is_hidden.unwrap_or(false),
        }
    }

    /// Create/update payload, without the method reference.
    pub fn to_payload(&self) -> Value {
        json!({
            "label": self.label,
            "input_type": self.input_type,
            "value_type_id": self.value_type_id,
            "default_value": self.default_value,
            "description": self.description,
            "is_hidden": self.is_hidden,
        })
    }
}

fn null_as_empty(value: &Value) -> Value {
    match value {
        Value::Null => empty_string_value(),
        other => other.clone(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertiesFile {
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamsFile {
    #[serde(default)]
    pub parameters: Vec<ParameterRecord>,
}

// ============================================================================
// Serialization
// ============================================================================

/// A method together with its parameters, as fetched for checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodBundle {
    pub method: RemoteMethod,
    pub parameters: Vec<RemoteParameter>,
}

/// Everything fetched for one component.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSnapshot {
    pub kind: ComponentKind,
    pub component: RemoteComponent,
    /// Resolved folder path, `/` for unfiled components
    pub folder_path: String,
    pub properties: Vec<RemoteProperty>,
    pub methods: Vec<MethodBundle>,
}

/// Relative path to file content, in write order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    files: Vec<(String, String)>,
}

impl Projection {
    fn push(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.push((path.into(), content.into()));
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.iter().map(|(path, _)| path.clone()).collect()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, content)| content.as_str())
    }

    /// Write every file under `dir`, creating parent directories.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        for (relative, content) in &self.files {
            let path = dir.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| GimsError::io(parent, e))?;
            }
            fs::write(&path, content).map_err(|e| GimsError::io(&path, e))?;
        }
        Ok(())
    }
}

/// Turns remote snapshots into projections.
pub struct Exporter {
    system_url: String,
    exported_at: String,
}

impl Exporter {
    pub fn new(system_url: impl Into<String>, clock: &dyn Clock) -> Self {
        Self {
            system_url: system_url.into(),
            exported_at: clock.now().to_rfc3339_opts(SecondsFormat::Micros, false),
        }
    }

    pub fn export(&self, snapshot: &RemoteSnapshot) -> Result<Projection> {
        let component = &snapshot.component;
        let mut projection = Projection::default();

        let version = match snapshot.kind {
            ComponentKind::Script => DEFAULT_VERSION.to_string(),
            _ => component
                .version
                .clone()
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        };
        let meta = ComponentMeta {
            gims_id: Some(component.id),
            name: Some(component.name.clone()),
            description: Some(component.description.clone().unwrap_or_default()),
            version: Some(version),
            gims_folder: Some(snapshot.folder_path.clone()),
            gims_folder_id: component.folder_ref(),
            code_file: snapshot.kind.has_code().then(|| CODE_FILE.to_string()),
            gims_updated_at: component.updated_at.clone(),
            exported_at: Some(self.exported_at.clone()),
            exported_from: Some(self.system_url.clone()),
            extra: BTreeMap::new(),
        };
        projection.push(META_FILE, to_yaml(META_FILE, &meta)?);

        match snapshot.kind {
            ComponentKind::Script => {
                projection.push(CODE_FILE, component.code.clone().unwrap_or_default());
            }
            ComponentKind::ActivatorType => {
                projection.push(
                    CODE_FILE,
                    component.code.clone().unwrap_or_else(|| NO_CODE.to_string()),
                );
                projection.push(PROPERTIES_FILE, properties_yaml(&snapshot.properties)?);
            }
            ComponentKind::DatasourceType => {
                projection.push(PROPERTIES_FILE, properties_yaml(&snapshot.properties)?);
                for bundle in &snapshot.methods {
                    export_method(&mut projection, bundle)?;
                }
            }
        }

        Ok(projection)
    }
}

fn properties_yaml(properties: &[RemoteProperty]) -> Result<String> {
    let file = PropertiesFile {
        properties: properties.iter().map(PropertyRecord::from_remote).collect(),
    };
    to_yaml(PROPERTIES_FILE, &file)
}

/// A method label names a directory under `methods/`, so it must be a single
/// plain path component.
fn ensure_dir_label(label: &str) -> Result<()> {
    if label.is_empty()
        || label == "."
        || label == ".."
        || label.contains(['/', '\\'])
    {
        return Err(GimsError::InvalidInput(format!(
            "Method label '{label}' cannot be used as a directory name"
        )));
    }
    Ok(())
}

fn export_method(projection: &mut Projection, bundle: &MethodBundle) -> Result<()> {
    let method = &bundle.method;
    ensure_dir_label(&method.label)?;
    let base = format!("{METHODS_DIR}/{}", method.label);

    let meta = MethodMeta {
        gims_id: Some(method.id),
        name: method.name.clone(),
        label: Some(method.label.clone()),
        description: Some(method.description.clone().unwrap_or_default()),
        code_file: Some(CODE_FILE.to_string()),
        params_file: Some(PARAMS_FILE.to_string()),
        gims_updated_at: method.updated_at.clone(),
        extra: BTreeMap::new(),
    };
    let meta_path = format!("{base}/{META_FILE}");
    let meta_yaml = to_yaml(&meta_path, &meta)?;
    projection.push(meta_path, meta_yaml);

    projection.push(
        format!("{base}/{CODE_FILE}"),
        method.code.clone().unwrap_or_else(|| NO_CODE.to_string()),
    );

    let params = ParamsFile {
        parameters: bundle
            .parameters
            .iter()
            .map(ParameterRecord::from_remote)
            .collect(),
    };
    let params_path = format!("{base}/{PARAMS_FILE}");
    let params_yaml = to_yaml(&params_path, &params)?;
    projection.push(params_path, params_yaml);
    Ok(())
}

fn to_yaml<T: Serialize>(path: &str, value: &T) -> Result<String> {
    serde_yaml::to_string(value).map_err(|e| GimsError::Format {
        path: PathBuf::from(path),
        detail: e.to_string(),
    })
}

// ============================================================================
// Loading
// ============================================================================

/// A method directory read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMethod {
    pub dir_name: String,
    pub meta: MethodMeta,
    pub code: String,
    pub parameters: Vec<ParameterRecord>,
}

impl LocalMethod {
    /// Label from the method meta, falling back to the directory name.
    pub fn label(&self) -> &str {
        self.meta.label.as_deref().unwrap_or(&self.dir_name)
    }

    pub fn name(&self) -> &str {
        if self.meta.name.is_empty() {
            self.label()
        } else {
            &self.meta.name
        }
    }
}

/// A component directory read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalComponent {
    pub kind: ComponentKind,
    pub dir: PathBuf,
    pub meta: ComponentMeta,
    /// Component code; `None` for datasource types
    pub code: Option<String>,
    pub properties: Vec<PropertyRecord>,
    pub methods: Vec<LocalMethod>,
}

/// Kind of component stored in `dir`, judged by its layout.
pub fn detect_kind(dir: &Path) -> Option<ComponentKind> {
    if dir.join(METHODS_DIR).is_dir() {
        return Some(ComponentKind::DatasourceType);
    }
    let has_code = dir.join(CODE_FILE).is_file();
    if has_code && dir.join(PROPERTIES_FILE).is_file() {
        return Some(ComponentKind::ActivatorType);
    }
    if has_code && dir.join(META_FILE).is_file() {
        return Some(ComponentKind::Script);
    }
    None
}

pub fn read_meta(dir: &Path) -> Result<ComponentMeta> {
    read_yaml(&require_file(&dir.join(META_FILE))?)
}

pub fn write_meta(dir: &Path, meta: &ComponentMeta) -> Result<()> {
    let path = dir.join(META_FILE);
    let yaml = serde_yaml::to_string(meta).map_err(|e| GimsError::Format {
        path: path.clone(),
        detail: e.to_string(),
    })?;
    fs::write(&path, yaml).map_err(|e| GimsError::io(&path, e))
}

pub fn load_local(dir: &Path) -> Result<LocalComponent> {
    let meta = read_meta(dir)?;
    let kind = detect_kind(dir).ok_or_else(|| {
        GimsError::InvalidInput(
            "Could not detect component type from directory structure".to_string(),
        )
    })?;

    let code = if kind.has_code() {
        let path = require_file(&dir.join(CODE_FILE))?;
        Some(fs::read_to_string(&path).map_err(|e| GimsError::io(&path, e))?)
    } else {
        None
    };

    let properties = if kind.has_properties() {
        read_optional::<PropertiesFile>(&dir.join(PROPERTIES_FILE))?.properties
    } else {
        Vec::new()
    };

    let methods = if kind.has_methods() {
        load_methods(&dir.join(METHODS_DIR))?
    } else {
        Vec::new()
    };

    Ok(LocalComponent {
        kind,
        dir: dir.to_path_buf(),
        meta,
        code,
        properties,
        methods,
    })
}

fn load_methods(methods_dir: &Path) -> Result<Vec<LocalMethod>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(methods_dir).map_err(|e| GimsError::io(methods_dir, e))? {
        let entry = entry.map_err(|e| GimsError::io(methods_dir, e))?;
        let path = entry.path();
        if path.is_dir() && path.join(META_FILE).is_file() {
            dirs.push(path);
        }
    }
    dirs.sort();

    let mut methods = Vec::with_capacity(dirs.len());
    for dir in dirs {
        let meta: MethodMeta = read_yaml(&dir.join(META_FILE))?;
        let code_path = dir.join(CODE_FILE);
        let code = if code_path.is_file() {
            fs::read_to_string(&code_path).map_err(|e| GimsError::io(&code_path, e))?
        } else {
            String::new()
        };
        let parameters = read_optional::<ParamsFile>(&dir.join(PARAMS_FILE))?.parameters;
        methods.push(LocalMethod {
            dir_name: dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            meta,
            code,
            parameters,
        });
    }
    Ok(methods)
}

/// Method directory names currently on disk.
pub fn method_dirs(dir: &Path) -> Result<Vec<String>> {
    let methods_dir = dir.join(METHODS_DIR);
    if !methods_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(&methods_dir).map_err(|e| GimsError::io(&methods_dir, e))? {
        let entry = entry.map_err(|e| GimsError::io(&methods_dir, e))?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

fn require_file(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(GimsError::InvalidInput(format!(
            "File not found: {}",
            path.display()
        )))
    }
}

fn read_yaml<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| GimsError::io(path, e))?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(&content).map_err(|e| GimsError::Format {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

fn read_optional<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if path.is_file() {
        read_yaml(path)
    } else {
        Ok(T::default())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Non-blank lines of code.
pub fn count_code_lines(code: &str) -> usize {
    code.lines().filter(|line| !line.trim().is_empty()).count()
}

/// Directory name derived from a component name: lowercase, spaces to `_`.
pub fn default_dir_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn property_defaults_fill_sparse_yaml() {
        let file: PropertiesFile =
            serde_yaml::from_str("properties:\n- label: host\n  name: Host\n").unwrap();
        let prop = &file.properties[0];
        assert_eq!(prop.default_value, json!(""));
        assert_eq!(prop.section, DEFAULT_SECTION);
        assert!(!prop.is_required);
        assert_eq!(prop.description, "");
    }

    #[test]
    fn parameter_defaults_to_input_direction() {
        let file: ParamsFile = serde_yaml::from_str("parameters:\n- label: ip\n").unwrap();
        assert!(file.parameters[0].input_type);
    }

    #[test]
    fn property_payload_uses_id_references() {
        let remote: RemoteProperty = serde_json::from_value(json!({
            "id": 3,
            "name": "Host",
            "label": "host",
            "value_type_id": 1,
            "value_type_name": "String",
            "section_name_id": 2,
            "section_name": "Connection",
            "default_value": null,
        }))
        .unwrap();
        let record = PropertyRecord::from_remote(&remote);
        assert_eq!(record.value_type, "String");
        assert_eq!(record.section, "Connection");

        let payload = record.to_payload();
        assert_eq!(payload["section_name_id"], 2);
        assert_eq!(payload["default_value"], "");
        assert!(payload.get("section").is_none());
        assert!(payload.get("value_type").is_none());
    }

    #[test]
    fn unknown_meta_keys_survive() {
        let meta: ComponentMeta =
            serde_yaml::from_str("gims_id: 4\nname: Ping\nowner: ops\n").unwrap();
        assert_eq!(meta.extra.get("owner"), Some(&serde_yaml::Value::from("ops")));
        let again: ComponentMeta =
            serde_yaml::from_str(&serde_yaml::to_string(&meta).unwrap()).unwrap();
        assert_eq!(again, meta);
    }

    #[test]
    fn export_is_deterministic_for_a_fixed_clock() {
        let snapshot = RemoteSnapshot {
            kind: ComponentKind::Script,
            component: RemoteComponent {
                id: 9,
                name: "Ping".into(),
                code: Some("print(1)\n".into()),
                updated_at: Some("2025-01-01T00:00:00Z".into()),
                ..Default::default()
            },
            folder_path: "/Monitoring".into(),
            properties: Vec::new(),
            methods: Vec::new(),
        };
        let exporter = Exporter::new("https://gims.local", &clock());
        let first = exporter.export(&snapshot).unwrap();
        let second = exporter.export(&snapshot).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.paths(), vec![META_FILE, CODE_FILE]);

        let meta: ComponentMeta = serde_yaml::from_str(first.get(META_FILE).unwrap()).unwrap();
        assert_eq!(meta.version.as_deref(), Some("1.0"));
        assert_eq!(meta.gims_folder.as_deref(), Some("/Monitoring"));
        assert_eq!(meta.exported_at.as_deref(), Some("2025-03-01T12:00:00.000000+00:00"));
    }

    #[test]
    fn activator_without_code_gets_placeholder() {
        let snapshot = RemoteSnapshot {
            kind: ComponentKind::ActivatorType,
            component: RemoteComponent {
                id: 2,
                name: "Webhook".into(),
                ..Default::default()
            },
            folder_path: "/".into(),
            properties: Vec::new(),
            methods: Vec::new(),
        };
        let projection = Exporter::new("u", &clock()).export(&snapshot).unwrap();
        assert_eq!(projection.get(CODE_FILE), Some(NO_CODE));
        assert!(projection.get(PROPERTIES_FILE).is_some());
    }

    #[test]
    fn method_label_must_be_a_plain_directory_name() {
        for label in ["../escape", "a/b", "..", ".", "win\\path", ""] {
            let snapshot = RemoteSnapshot {
                kind: ComponentKind::DatasourceType,
                component: RemoteComponent {
                    id: 7,
                    name: "SNMP".into(),
                    ..Default::default()
                },
                folder_path: "/".into(),
                properties: Vec::new(),
                methods: vec![MethodBundle {
                    method: RemoteMethod {
                        id: 80,
                        label: label.into(),
                        ..Default::default()
                    },
                    parameters: Vec::new(),
                }],
            };
            let err = Exporter::new("u", &clock()).export(&snapshot).unwrap_err();
            assert!(matches!(err, GimsError::InvalidInput(_)), "{label}: {err:?}");
        }
    }

    #[test]
    fn counts_only_non_blank_lines() {
        assert_eq!(count_code_lines("a = 1\n\n   \nb = 2\n"), 2);
        assert_eq!(count_code_lines(""), 0);
    }

    #[test]
    fn dir_name_is_lowercase_with_underscores() {
        assert_eq!(default_dir_name("ICMP Monitor"), "icmp_monitor");
    }
}
