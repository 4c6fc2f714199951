//! Typed records for remote GIMS objects.
//!
//! Fields the server may omit are optional; unknown fields are ignored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The three kinds of automation component managed by GIMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Script,
    DatasourceType,
    ActivatorType,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 3] = [Self::Script, Self::DatasourceType, Self::ActivatorType];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::DatasourceType => "datasource_type",
            Self::ActivatorType => "activator_type",
        }
    }

    /// Human-readable name used in messages
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Script => "Script",
            Self::DatasourceType => "DataSource type",
            Self::ActivatorType => "Activator type",
        }
    }

    /// Whether the component itself carries a code payload.
    pub fn has_code(self) -> bool {
        !matches!(self, Self::DatasourceType)
    }

    pub fn has_properties(self) -> bool {
        !matches!(self, Self::Script)
    }

    pub fn has_methods(self) -> bool {
        matches!(self, Self::DatasourceType)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "script" => Ok(Self::Script),
            "datasource_type" => Ok(Self::DatasourceType),
            "activator_type" => Ok(Self::ActivatorType),
            other => Err(format!("Unknown component type: {other}")),
        }
    }
}

/// A script, datasource type or activator type as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteComponent {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub folder_id: Option<i64>,
    /// Datasource and activator endpoints report the folder under this key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<Value>,
    #[serde(default)]
    pub folder_path: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl RemoteComponent {
    /// Folder id regardless of which key the endpoint used.
    pub fn folder_ref(&self) -> Option<i64> {
        self.folder_id.or_else(|| match &self.folder {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::Object(obj)) => obj.get("id").and_then(Value::as_i64),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_folder_id: Option<i64>,
}

/// Property of a datasource or activator type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteProperty {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub value_type_id: Option<i64>,
    #[serde(default)]
    pub value_type_name: Option<String>,
    #[serde(default)]
    pub value_type: Option<Value>,
    #[serde(default)]
    pub default_value: Value,
    #[serde(default)]
    pub section_name_id: Option<i64>,
    #[serde(default)]
    pub section_name: Option<String>,
    #[serde(default)]
    pub section: Option<Value>,
    #[serde(default)]
    pub is_required: Option<bool>,
    #[serde(default)]
    pub is_hidden: Option<bool>,
    #[serde(default)]
    pub is_inner: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub activator_type_id: Option<i64>,
    #[serde(default)]
    pub mds_type_id: Option<i64>,
}

/// Method of a datasource type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteMethod {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Input or output parameter of a datasource method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteParameter {
    pub id: i64,
    pub label: String,
    #[serde(default)]
    pub input_type: Option<bool>,
    #[serde(default)]
    pub value_type_id: Option<i64>,
    #[serde(default)]
    pub value_type_name: Option<String>,
    #[serde(default)]
    pub value_type: Option<Value>,
    #[serde(default)]
    pub default_value: Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_hidden: Option<bool>,
}

/// Render a loosely typed reference field (string, number or object with a
/// `name`) as display text.
pub fn display_ref(value: &Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Object(obj)) => obj.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in ComponentKind::ALL {
            assert_eq!(kind.as_str().parse::<ComponentKind>().unwrap(), kind);
        }
        assert!("workflow".parse::<ComponentKind>().is_err());
    }

    #[test]
    fn folder_ref_reads_either_key() {
        let script: RemoteComponent =
            serde_json::from_value(json!({"id": 1, "name": "a", "folder_id": 7})).unwrap();
        assert_eq!(script.folder_ref(), Some(7));

        let ds: RemoteComponent =
            serde_json::from_value(json!({"id": 2, "name": "b", "folder": 9})).unwrap();
        assert_eq!(ds.folder_ref(), Some(9));

        let nested: RemoteComponent =
            serde_json::from_value(json!({"id": 3, "name": "c", "folder": {"id": 4, "name": "x"}}))
                .unwrap();
        assert_eq!(nested.folder_ref(), Some(4));
    }

    #[test]
    fn property_tolerates_sparse_records() {
        let prop: RemoteProperty =
            serde_json::from_value(json!({"id": 5, "label": "host"})).unwrap();
        assert_eq!(prop.name, "");
        assert_eq!(prop.default_value, Value::Null);
        assert_eq!(prop.is_required, None);
    }
}
