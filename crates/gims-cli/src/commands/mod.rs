//! Subcommand groups of the `gims` binary.

pub mod activator_types;
pub mod datasource_types;
pub mod logs;
pub mod references;
pub mod scripts;
pub mod sync;

use anyhow::Result;
use clap::ValueEnum;

use gims_core::model::ComponentKind;
use gims_core::resources::FolderService;
use gims_core::resources::datasource_types::SearchIn;
use gims_core::resources::wrap;

use crate::output::print_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    #[value(name = "script")]
    Script,
    #[value(name = "datasource_type")]
    DatasourceType,
    #[value(name = "activator_type")]
    ActivatorType,
}

impl From<KindArg> for ComponentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Script => ComponentKind::Script,
            KindArg::DatasourceType => ComponentKind::DatasourceType,
            KindArg::ActivatorType => ComponentKind::ActivatorType,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SearchInArg {
    #[default]
    Name,
    Code,
    Both,
}

impl From<SearchInArg> for SearchIn {
    fn from(arg: SearchInArg) -> Self {
        match arg {
            SearchInArg::Name => SearchIn::Name,
            SearchInArg::Code => SearchIn::Code,
            SearchInArg::Both => SearchIn::Both,
        }
    }
}

/// Values for `--required true|false` style options; anything but `true` is false.
pub fn parse_bool_flag(value: &str) -> Result<bool, String> {
    Ok(value.eq_ignore_ascii_case("true"))
}

// ============================================================================
// Folder commands shared by every kind
// ============================================================================

pub fn list_folders(folders: &FolderService<'_>) -> Result<()> {
    print_json(&wrap("folders", &folders.list()?))
}

pub fn create_folder(folders: &FolderService<'_>, name: &str, parent: Option<i64>) -> Result<()> {
    print_json(&folders.create(name, parent)?)
}

pub fn delete_folder(folders: &FolderService<'_>, folder_id: i64) -> Result<()> {
    folders.delete(folder_id)?;
    println!("Folder {folder_id} deleted successfully");
    Ok(())
}
