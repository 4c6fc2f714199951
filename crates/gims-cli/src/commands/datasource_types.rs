//! `gims ds-type ...`: types, properties, methods and method parameters.

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

use gims_core::api::Gateway;
use gims_core::resources::datasource_types::{
    DsTypeDraft, DsTypePatch, MethodDraft, MethodPatch, ParamDraft, ParamPatch,
};
use gims_core::resources::{CodeSource, DatasourceTypeService, PropertyDraft, PropertyPatch, wrap};

use super::{SearchInArg, create_folder, delete_folder, list_folders, parse_bool_flag};
use crate::output::print_json;

#[derive(Subcommand)]
pub enum DsTypeCommand {
    /// List all datasource type folders
    ListFolders,

    /// Create a folder
    CreateFolder {
        #[arg(long)]
        name: String,
        #[arg(long)]
        parent_folder_id: Option<i64>,
    },

    /// Delete a folder
    DeleteFolder { folder_id: i64 },

    /// List all datasource types
    List {
        #[arg(long)]
        folder_id: Option<i64>,
    },

    /// Get a datasource type with its properties and methods
    Get {
        type_id: i64,
        /// Skip properties
        #[arg(long)]
        no_properties: bool,
        /// Skip methods
        #[arg(long)]
        no_methods: bool,
    },

    /// Create a datasource type
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Defaults to 1.0
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        folder_id: Option<i64>,
    },

    /// Update a datasource type
    Update {
        type_id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        version: Option<String>,
        /// New folder ID (0 to remove)
        #[arg(long)]
        folder_id: Option<i64>,
    },

    /// Delete a datasource type
    Delete { type_id: i64 },

    /// List properties of a type
    ListProperties { type_id: i64 },

    /// Create a property
    CreateProperty {
        #[arg(long)]
        type_id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        label: String,
        #[arg(long)]
        value_type_id: i64,
        #[arg(long)]
        section_id: i64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        default_value: Option<String>,
        #[arg(long)]
        required: bool,
        #[arg(long)]
        hidden: bool,
    },

    /// Update a property
    UpdateProperty {
        property_id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        default_value: Option<String>,
        #[arg(long, value_parser = parse_bool_flag)]
        required: Option<bool>,
        #[arg(long, value_parser = parse_bool_flag)]
        hidden: Option<bool>,
    },

    /// Delete a property
    DeleteProperty { property_id: i64 },

    /// List methods of a type (without code)
    ListMethods { type_id: i64 },

    /// Get a method with its parameters
    GetMethod { method_id: i64 },

    /// Print only the method code
    GetMethodCode { method_id: i64 },

    /// Create a method
    CreateMethod {
        #[arg(long)]
        type_id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        label: String,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        code_file: Option<PathBuf>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Update a method
    UpdateMethod {
        method_id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        code_file: Option<PathBuf>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a method
    DeleteMethod { method_id: i64 },

    /// List parameters of a method
    ListParams { method_id: i64 },

    /// Create a method parameter
    CreateParam {
        #[arg(long)]
        method_id: i64,
        #[arg(long)]
        label: String,
        #[arg(long)]
        value_type_id: i64,
        /// Input parameter (default)
        #[arg(long, conflicts_with = "output")]
        input: bool,
        /// Output parameter
        #[arg(long)]
        output: bool,
        #[arg(long)]
        default_value: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        hidden: bool,
    },

    /// Update a method parameter
    UpdateParam {
        param_id: i64,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        default_value: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_bool_flag)]
        hidden: Option<bool>,
    },

    /// Delete a method parameter
    DeleteParam { param_id: i64 },

    /// Search types by name and/or method code
    Search {
        #[arg(long)]
        query: String,
        #[arg(long, value_enum, default_value_t = SearchInArg::Name)]
        search_in: SearchInArg,
        #[arg(long)]
        case_sensitive: bool,
    },
}

pub fn run(gateway: &dyn Gateway, command: DsTypeCommand) -> Result<()> {
    let service = DatasourceTypeService::new(gateway);

    match command {
        DsTypeCommand::ListFolders => list_folders(&service.folders()),
        DsTypeCommand::CreateFolder {
            name,
            parent_folder_id,
        } => create_folder(&service.folders(), &name, parent_folder_id),
        DsTypeCommand::DeleteFolder { folder_id } => delete_folder(&service.folders(), folder_id),
        DsTypeCommand::List { folder_id } => print_json(&wrap("types", &service.list(folder_id)?)),
        DsTypeCommand::Get {
            type_id,
            no_properties,
            no_methods,
        } => print_json(&service.get(type_id, !no_properties, !no_methods)?),
        DsTypeCommand::Create {
            name,
            description,
            version,
            folder_id,
        } => print_json(&service.create(&DsTypeDraft {
            name,
            description,
            version,
            folder_id,
        })?),
        DsTypeCommand::Update {
            type_id,
            name,
            description,
            version,
            folder_id,
        } => print_json(&service.update(
            type_id,
            &DsTypePatch {
                name,
                description,
                version,
                folder_id,
            },
        )?),
        DsTypeCommand::Delete { type_id } => {
            service.delete(type_id)?;
            println!("DataSource type {type_id} deleted successfully");
            Ok(())
        }

        DsTypeCommand::ListProperties { type_id } => {
            print_json(&wrap("properties", &service.properties().list(type_id)?))
        }
        DsTypeCommand::CreateProperty {
            type_id,
            name,
            label,
            value_type_id,
            section_id,
            description,
            default_value,
            required,
            hidden,
        } => {
            let draft = PropertyDraft {
                name,
                label,
                value_type_id,
                section_id,
                description,
                default_value,
                is_required: required,
                is_hidden: hidden,
                default_dict_value_id: None,
            };
            print_json(&service.properties().create(type_id, &draft)?)
        }
        DsTypeCommand::UpdateProperty {
            property_id,
            name,
            label,
            description,
            default_value,
            required,
            hidden,
        } => {
            let patch = PropertyPatch {
                name,
                label,
                description,
                default_value,
                is_required: required,
                is_hidden: hidden,
            };
            print_json(&service.properties().update(property_id, &patch)?)
        }
        DsTypeCommand::DeleteProperty { property_id } => {
            service.properties().delete(property_id)?;
            println!("Property {property_id} deleted successfully");
            Ok(())
        }

        DsTypeCommand::ListMethods { type_id } => {
            print_json(&json!({ "methods": service.list_methods(type_id)? }))
        }
        DsTypeCommand::GetMethod { method_id } => print_json(&service.get_method(method_id)?),
        DsTypeCommand::GetMethodCode { method_id } => {
            println!("{}", service.get_method_code(method_id)?);
            Ok(())
        }
        DsTypeCommand::CreateMethod {
            type_id,
            name,
            label,
            code,
            code_file,
            description,
        } => {
            let draft = MethodDraft {
                name,
                label,
                code: CodeSource::from_flags(code, code_file),
                description,
            };
            print_json(&service.create_method(type_id, &draft)?)
        }
        DsTypeCommand::UpdateMethod {
            method_id,
            name,
            label,
            code,
            code_file,
            description,
        } => {
            let patch = MethodPatch {
                name,
                label,
                code: CodeSource::from_flags(code, code_file),
                description,
            };
            print_json(&service.update_method(method_id, &patch)?)
        }
        DsTypeCommand::DeleteMethod { method_id } => {
            service.delete_method(method_id)?;
            println!("Method {method_id} deleted successfully");
            Ok(())
        }

        DsTypeCommand::ListParams { method_id } => {
            print_json(&wrap("parameters", &service.params(method_id)?))
        }
        DsTypeCommand::CreateParam {
            method_id,
            label,
            value_type_id,
            input: _,
            output,
            default_value,
            description,
            hidden,
        } => {
            let draft = ParamDraft {
                label,
                value_type_id,
                input: !output,
                default_value,
                description,
                hidden,
            };
            print_json(&service.create_param(method_id, &draft)?)
        }
        DsTypeCommand::UpdateParam {
            param_id,
            label,
            default_value,
            description,
            hidden,
        } => {
            let patch = ParamPatch {
                label,
                default_value,
                description,
                hidden,
            };
            print_json(&service.update_param(param_id, &patch)?)
        }
        DsTypeCommand::DeleteParam { param_id } => {
            service.delete_param(param_id)?;
            println!("Parameter {param_id} deleted successfully");
            Ok(())
        }

        DsTypeCommand::Search {
            query,
            search_in,
            case_sensitive,
        } => {
            let results = service.search(&query, search_in.into(), case_sensitive)?;
            print_json(&json!({ "count": results.len(), "results": results }))
        }
    }
}
