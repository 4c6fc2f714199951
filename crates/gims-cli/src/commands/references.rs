//! `gims ref ...`: read-only reference data.

use anyhow::Result;
use clap::Subcommand;

use gims_core::api::Gateway;
use gims_core::resources::ReferenceService;

use crate::output::print_json;

#[derive(Subcommand)]
pub enum RefCommand {
    /// List property value types
    ValueTypes,
    /// List property sections
    Sections,
}

pub fn run(gateway: &dyn Gateway, command: RefCommand) -> Result<()> {
    let service = ReferenceService::new(gateway);
    match command {
        RefCommand::ValueTypes => print_json(&service.value_types()?),
        RefCommand::Sections => print_json(&service.property_sections()?),
    }
}
