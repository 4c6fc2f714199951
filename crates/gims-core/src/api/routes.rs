//! Resource paths of the automation API, relative to `<url>/automation`.

use crate::model::ComponentKind;

pub const DS_METHODS: &str = "/datasource_types/method/";
pub const DS_METHOD_PARAMS: &str = "/datasource_types/method_params/";
pub const VALUE_TYPES: &str = "/value-types/value-type/";
pub const PROPERTY_SECTIONS: &str = "/property-sections/section-name/";
pub const SCRIPT_CODE_SEARCH: &str = "/scripts/search_code/";

/// Query key linking a method to its datasource type
pub const METHOD_OWNER_PARAM: &str = "mds_type_id";
/// Query key linking a parameter to its method
pub const PARAM_OWNER_PARAM: &str = "method_id";

pub fn script_log_url(script_id: i64) -> String {
    format!("/scripts/script_log_url/{script_id}/")
}

/// `<collection><id>/`
pub fn item(collection: &str, id: i64) -> String {
    format!("{collection}{id}/")
}

impl ComponentKind {
    pub fn components_path(self) -> &'static str {
        match self {
            Self::Script => "/scripts/script/",
            Self::DatasourceType => "/datasource_types/ds_type/",
            Self::ActivatorType => "/activator-types/activator-type/",
        }
    }

    pub fn folders_path(self) -> &'static str {
        match self {
            Self::Script => "/scripts/folder/",
            Self::DatasourceType => "/datasource_types/folder/",
            Self::ActivatorType => "/activator-types/folder/",
        }
    }

    /// Property collection and the query key that filters it by owner.
    pub fn properties_route(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Script => None,
            Self::DatasourceType => Some(("/datasource_types/properties/", "mds_type_id")),
            Self::ActivatorType => Some(("/activator-types/property/", "activator_type_id")),
        }
    }

    pub fn component_path(self, id: i64) -> String {
        item(self.components_path(), id)
    }

    /// Payload key that places a component into a folder.
    pub fn folder_field(self) -> &'static str {
        match self {
            Self::Script => "folder_id",
            Self::DatasourceType | Self::ActivatorType => "folder",
        }
    }
}
