//! `gims activator-type ...`

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

use gims_core::api::Gateway;
use gims_core::resources::activator_types::{ActivatorDraft, ActivatorPatch};
use gims_core::resources::{
    ActivatorTypeService, CodeSource, FolderPatch, PropertyDraft, PropertyPatch, wrap,
};

use super::{SearchInArg, create_folder, delete_folder, list_folders, parse_bool_flag};
use crate::output::print_json;

#[derive(Subcommand)]
pub enum ActivatorTypeCommand {
    /// List all activator type folders
    ListFolders,

    /// Create a folder
    CreateFolder {
        #[arg(long)]
        name: String,
        #[arg(long)]
        parent_folder_id: Option<i64>,
    },

    /// Rename or move a folder
    UpdateFolder {
        folder_id: i64,
        #[arg(long)]
        name: Option<String>,
        /// New parent folder ID (0 for root)
        #[arg(long)]
        parent_folder_id: Option<i64>,
    },

    /// Delete a folder
    DeleteFolder { folder_id: i64 },

    /// List all activator types
    List {
        #[arg(long)]
        folder_id: Option<i64>,
    },

    /// Get an activator type
    Get {
        type_id: i64,
        /// Include code in output
        #[arg(long)]
        include_code: bool,
        /// Skip properties
        #[arg(long)]
        no_properties: bool,
    },

    /// Print only the activator code
    GetCode { type_id: i64 },

    /// Create an activator type
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        code_file: Option<PathBuf>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        folder_id: Option<i64>,
    },

    /// Update an activator type
    Update {
        type_id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        code_file: Option<PathBuf>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        version: Option<String>,
        /// New folder ID (0 to remove)
        #[arg(long)]
        folder_id: Option<i64>,
    },

    /// Delete an activator type
    Delete { type_id: i64 },

    /// Regex search over names and/or code
    Search {
        #[arg(long)]
        query: String,
        #[arg(long, value_enum, default_value_t = SearchInArg::Name)]
        search_in: SearchInArg,
        #[arg(long)]
        case_sensitive: bool,
    },

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
        is_required: bool,
        #[arg(long)]
        is_hidden: bool,
        /// Default dictionary value for dictionary-typed properties
        #[arg(long)]
        default_dict_value_id: Option<i64>,
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
        is_required: Option<bool>,
        #[arg(long, value_parser = parse_bool_flag)]
        is_hidden: Option<bool>,
    },

    /// Delete a property
    DeleteProperty { property_id: i64 },
}

pub fn run(gateway: &dyn Gateway, command: ActivatorTypeCommand) -> Result<()> {
    let service = ActivatorTypeService::new(gateway);

    match command {
        ActivatorTypeCommand::ListFolders => list_folders(&service.folders()),
        ActivatorTypeCommand::CreateFolder {
            name,
            parent_folder_id,
        } => create_folder(&service.folders(), &name, parent_folder_id),
        ActivatorTypeCommand::UpdateFolder {
            folder_id,
            name,
            parent_folder_id,
        } => {
            let patch = FolderPatch {
                name,
                parent_folder_id,
            };
            print_json(&service.folders().update(folder_id, &patch)?)
        }
        ActivatorTypeCommand::DeleteFolder { folder_id } => {
            delete_folder(&service.folders(), folder_id)
        }

        ActivatorTypeCommand::List { folder_id } => {
            print_json(&wrap("types", &service.list(folder_id)?))
        }
        ActivatorTypeCommand::Get {
            type_id,
            include_code,
            no_properties,
        } => print_json(&service.get(type_id, include_code, !no_properties)?),
        ActivatorTypeCommand::GetCode { type_id } => {
            println!("{}", service.get_code(type_id)?);
            Ok(())
        }
        ActivatorTypeCommand::Create {
            name,
            code,
            code_file,
            description,
            version,
            folder_id,
        } => {
            let draft = ActivatorDraft {
                name,
                code: CodeSource::from_flags(code, code_file),
                description,
                version,
                folder_id,
            };
            print_json(&service.create(&draft)?)
        }
        ActivatorTypeCommand::Update {
            type_id,
            name,
            code,
            code_file,
            description,
            version,
            folder_id,
        } => {
            let patch = ActivatorPatch {
                name,
                code: CodeSource::from_flags(code, code_file),
                description,
                version,
                folder_id,
            };
            print_json(&service.update(type_id, &patch)?)
        }
        ActivatorTypeCommand::Delete { type_id } => {
            service.delete(type_id)?;
            println!("Activator type {type_id} deleted successfully");
            Ok(())
        }
        ActivatorTypeCommand::Search {
            query,
            search_in,
            case_sensitive,
        } => {
            let results = service.search(&query, search_in.into(), case_sensitive)?;
            print_json(&json!({ "count": results.len(), "results": results }))
        }

        ActivatorTypeCommand::ListProperties { type_id } => {
            print_json(&wrap("properties", &service.properties().list(type_id)?))
        }
        ActivatorTypeCommand::CreateProperty {
            type_id,
            name,
            label,
            value_type_id,
            section_id,
            description,
            default_value,
            is_required,
            is_hidden,
            default_dict_value_id,
        } => {
            let draft = PropertyDraft {
                name,
                label,
                value_type_id,
                section_id,
                description,
                default_value,
                is_required,
                is_hidden,
                default_dict_value_id,
            };
            print_json(&service.properties().create(type_id, &draft)?)
        }
        ActivatorTypeCommand::UpdateProperty {
            property_id,
            name,
            label,
            description,
            default_value,
            is_required,
            is_hidden,
        } => {
            let patch = PropertyPatch {
                name,
                label,
                description,
                default_value,
                is_required,
                is_hidden,
            };
            print_json(&service.properties().update(property_id, &patch)?)
        }
        ActivatorTypeCommand::DeleteProperty { property_id } => {
            service.properties().delete(property_id)?;
            println!("Property {property_id} deleted successfully");
            Ok(())
        }
    }
}
