//! `gims script ...`

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use gims_core::api::Gateway;
use gims_core::resources::scripts::{CodeSearch, ScriptDraft, ScriptPatch};
use gims_core::resources::{CodeSource, ScriptService, wrap};

use super::{create_folder, delete_folder, list_folders};
use crate::output::print_json;

#[derive(Subcommand)]
pub enum ScriptCommand {
    /// List all script folders
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

    /// List all scripts
    List {
        /// Filter by folder ID
        #[arg(long)]
        folder_id: Option<i64>,
    },

    /// Get a script
    Get {
        script_id: i64,
        /// Include code in output
        #[arg(long)]
        include_code: bool,
    },

    /// Print only the script code
    GetCode { script_id: i64 },

    /// Create a script
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: Option<String>,
        /// Read code from file
        #[arg(long)]
        code_file: Option<PathBuf>,
        #[arg(long)]
        folder_id: Option<i64>,
    },

    /// Update a script
    Update {
        script_id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        code_file: Option<PathBuf>,
        /// New folder ID (0 to remove)
        #[arg(long)]
        folder_id: Option<i64>,
    },

    /// Delete a script
    Delete { script_id: i64 },

    /// Search scripts by code
    Search {
        #[arg(long)]
        query: String,
        #[arg(long)]
        case_sensitive: bool,
        #[arg(long)]
        exact_match: bool,
    },
}

pub fn run(gateway: &dyn Gateway, command: ScriptCommand) -> Result<()> {
    let service = ScriptService::new(gateway);

    match command {
        ScriptCommand::ListFolders => list_folders(&service.folders()),
        ScriptCommand::CreateFolder {
            name,
            parent_folder_id,
        } => create_folder(&service.folders(), &name, parent_folder_id),
        ScriptCommand::DeleteFolder { folder_id } => delete_folder(&service.folders(), folder_id),
        ScriptCommand::List { folder_id } => print_json(&wrap("scripts", &service.list(folder_id)?)),
        ScriptCommand::Get {
            script_id,
            include_code,
        } => print_json(&service.get(script_id, include_code)?),
        ScriptCommand::GetCode { script_id } => {
            println!("{}", service.get_code(script_id)?);
            Ok(())
        }
        ScriptCommand::Create {
            name,
            code,
            code_file,
            folder_id,
        } => {
            let draft = ScriptDraft {
                name,
                code: CodeSource::from_flags(code, code_file),
                folder_id,
            };
            print_json(&service.create(&draft)?)
        }
        ScriptCommand::Update {
            script_id,
            name,
            code,
            code_file,
            folder_id,
        } => {
            let patch = ScriptPatch {
                name,
                code: CodeSource::from_flags(code, code_file),
                folder_id,
            };
            print_json(&service.update(script_id, &patch)?)
        }
        ScriptCommand::Delete { script_id } => {
            service.delete(script_id)?;
            println!("Script {script_id} deleted successfully");
            Ok(())
        }
        ScriptCommand::Search {
            query,
            case_sensitive,
            exact_match,
        } => print_json(&service.search(&CodeSearch {
            query,
            case_sensitive,
            exact_match,
        })?),
    }
}
