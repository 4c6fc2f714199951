//! Local-first workflow commands and their legacy aliases.
//!
//! Every command here reports through JSON on stdout, failures included, so
//! scripted callers parse one format.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use gims_core::api::{Gateway, HttpGateway};
use gims_core::error::GimsError;
use gims_core::model::ComponentKind;
use gims_core::sync::checkout::FolderSelector;
use gims_core::sync::duplicates::DEFAULT_THRESHOLD;
use gims_core::sync::{
    CheckoutCommand, CheckoutFolderCommand, CheckoutFolderOptions, CheckoutOptions,
    CompareCommand, CompareOptions, FindDuplicatesCommand, PublishAllCommand, PublishAllOptions,
    PublishCommand, PublishOptions, Selector, StatusCommand, validate_code,
};

use super::KindArg;
use crate::output::{error_envelope, failure, print_json};

#[derive(Subcommand)]
pub enum SyncCommand {
    /// Checkout a component from GIMS to local files
    Checkout(CheckoutArgs),

    /// Checkout every component of a GIMS folder
    CheckoutFolder(CheckoutFolderArgs),

    /// Publish local files to GIMS (preview first, then --confirm)
    Publish(PublishArgs),

    /// Publish every component directory under a base directory
    PublishAll(PublishAllArgs),

    /// Show status of local components vs GIMS
    Status {
        #[arg(long)]
        base_dir: PathBuf,
    },

    /// Find components with similar names
    FindDuplicates {
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        component_type: KindArg,
        /// Similarity threshold (0-1)
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,
    },

    /// Validate Python code syntax
    ValidateCode {
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        code: Option<String>,
    },

    /// Compare a GIMS component with an exported timestamp
    Compare {
        #[arg(long, value_enum)]
        component_type: KindArg,
        #[arg(long)]
        gims_name: String,
        /// `exported_at` from a local meta.yaml (ISO 8601)
        #[arg(long)]
        git_exported_at: String,
    },

    /// [Legacy] Use `checkout --component-type script`
    ExportScript {
        #[arg(long)]
        script_id: Option<i64>,
        #[arg(long)]
        script_name: Option<String>,
        #[command(flatten)]
        target: LegacyCheckoutArgs,
    },

    /// [Legacy] Use `publish`
    ImportScript {
        #[arg(long)]
        input_dir: PathBuf,
        #[arg(long)]
        target_name: Option<String>,
        #[arg(long)]
        folder_id: Option<i64>,
        /// [Deprecated] Same as --confirm
        #[arg(long)]
        update_existing: bool,
        /// Only preview
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        confirm: bool,
    },

    /// [Legacy] Use `checkout --component-type datasource_type`
    ExportDatasourceType {
        #[arg(long)]
        type_id: Option<i64>,
        #[arg(long)]
        type_name: Option<String>,
        #[command(flatten)]
        target: LegacyCheckoutArgs,
    },

    /// [Legacy] Use `checkout --component-type activator_type`
    ExportActivatorType {
        #[arg(long)]
        type_id: Option<i64>,
        #[arg(long)]
        type_name: Option<String>,
        #[command(flatten)]
        target: LegacyCheckoutArgs,
    },
}

#[derive(Args)]
pub struct CheckoutArgs {
    #[arg(long, value_enum)]
    component_type: KindArg,
    /// Component ID in GIMS
    #[arg(long)]
    id: Option<i64>,
    /// Component name in GIMS
    #[arg(long)]
    name: Option<String>,
    /// Output directory (default: derived from the component name)
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Show what would be checked out
    #[arg(long)]
    dry_run: bool,
    /// Overwrite local files even if modified
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
pub struct CheckoutFolderArgs {
    #[arg(long, value_enum)]
    component_type: KindArg,
    #[arg(long)]
    folder_id: Option<i64>,
    #[arg(long)]
    folder_name: Option<String>,
    /// Base output directory (default: current dir)
    #[arg(long)]
    output_base_dir: Option<PathBuf>,
    #[arg(long)]
    dry_run: bool,
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
pub struct PublishArgs {
    /// Directory with meta.yaml and code
    #[arg(long)]
    input_dir: PathBuf,
    /// Override component name
    #[arg(long)]
    target_name: Option<String>,
    /// Target folder ID for a new component
    #[arg(long)]
    folder_id: Option<i64>,
    /// Execute the previewed changes
    #[arg(long)]
    confirm: bool,
}

#[derive(Args)]
pub struct PublishAllArgs {
    #[arg(long)]
    base_dir: PathBuf,
    #[arg(long)]
    dry_run: bool,
    #[arg(long)]
    confirm: bool,
    /// Continue after a failed component
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
pub struct LegacyCheckoutArgs {
    #[arg(long)]
    output_dir: Option<PathBuf>,
    #[arg(long)]
    dry_run: bool,
    #[arg(long)]
    force: bool,
}

impl LegacyCheckoutArgs {
    fn into_checkout(
        self,
        kind: KindArg,
        id: Option<i64>,
        name: Option<String>,
    ) -> CheckoutArgs {
        CheckoutArgs {
            component_type: kind,
            id,
            name,
            output_dir: self.output_dir,
            dry_run: self.dry_run,
            force: self.force,
        }
    }
}

/// Run a workflow command. Failures become a JSON error envelope.
pub fn run(command: SyncCommand) -> ExitCode {
    match execute(command) {
        Ok(code) => code,
        Err(err) => {
            tracing::debug!(error = %err, "sync command failed");
            if let Err(print_err) = print_json(&error_envelope(&err)) {
                eprintln!("Error: {print_err:#}");
            }
            failure()
        }
    }
}

fn execute(command: SyncCommand) -> Result<ExitCode> {
    match command {
        SyncCommand::ValidateCode { file, code } => run_validate_code(file, code),
        command => {
            let gateway = HttpGateway::from_env()?;
            dispatch(&gateway, command)
        }
    }
}

fn dispatch(gateway: &dyn Gateway, command: SyncCommand) -> Result<ExitCode> {
    match command {
        SyncCommand::Checkout(args) => run_checkout(gateway, args),
        SyncCommand::CheckoutFolder(args) => run_checkout_folder(gateway, args),
        SyncCommand::Publish(args) => run_publish(gateway, args),
        SyncCommand::PublishAll(args) => run_publish_all(gateway, args),
        SyncCommand::Status { base_dir } => {
            emit(&StatusCommand::new(gateway).execute(&base_dir)?, true)
        }
        SyncCommand::FindDuplicates {
            name,
            component_type,
            threshold,
        } => {
            let report =
                FindDuplicatesCommand::new(gateway).execute(&name, component_type.into(), threshold)?;
            emit(&report, true)
        }
        SyncCommand::ValidateCode { file, code } => run_validate_code(file, code),
        SyncCommand::Compare {
            component_type,
            gims_name,
            git_exported_at,
        } => {
            let options = CompareOptions::new(component_type.into(), gims_name, git_exported_at);
            emit(&CompareCommand::new(gateway).execute(&options)?, true)
        }

        SyncCommand::ExportScript {
            script_id,
            script_name,
            target,
        } => {
            deprecated("export-script", "checkout --component-type script");
            run_checkout(gateway, target.into_checkout(KindArg::Script, script_id, script_name))
        }
        SyncCommand::ImportScript {
            input_dir,
            target_name,
            folder_id,
            update_existing,
            dry_run,
            confirm,
        } => {
            deprecated("import-script", "publish");
            let args = PublishArgs {
                input_dir,
                target_name,
                folder_id,
                confirm: (confirm || update_existing) && !dry_run,
            };
            run_publish(gateway, args)
        }
        SyncCommand::ExportDatasourceType {
            type_id,
            type_name,
            target,
        } => {
            deprecated(
                "export-datasource-type",
                "checkout --component-type datasource_type",
            );
            run_checkout(
                gateway,
                target.into_checkout(KindArg::DatasourceType, type_id, type_name),
            )
        }
        SyncCommand::ExportActivatorType {
            type_id,
            type_name,
            target,
        } => {
            deprecated(
                "export-activator-type",
                "checkout --component-type activator_type",
            );
            run_checkout(
                gateway,
                target.into_checkout(KindArg::ActivatorType, type_id, type_name),
            )
        }
    }
}

fn deprecated(command: &str, replacement: &str) {
    tracing::warn!("`{command}` is deprecated, use `{replacement}`");
}

/// Print `value`; a non-success outcome still prints but exits 1.
fn emit<T: Serialize>(value: &T, success: bool) -> Result<ExitCode> {
    print_json(value)?;
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        failure()
    })
}

fn run_checkout(gateway: &dyn Gateway, args: CheckoutArgs) -> Result<ExitCode> {
    let kind = ComponentKind::from(args.component_type);
    let selector = Selector::from_flags(args.id, args.name)?;
    let mut options = CheckoutOptions::new(kind, selector)
        .with_dry_run(args.dry_run)
        .with_force(args.force);
    if let Some(dir) = args.output_dir {
        options = options.with_output_dir(dir);
    }

    let outcome = CheckoutCommand::new(gateway).execute(&options)?;
    emit(&outcome, !outcome.is_conflict())
}

fn run_checkout_folder(gateway: &dyn Gateway, args: CheckoutFolderArgs) -> Result<ExitCode> {
    let folder = match (args.folder_id, args.folder_name) {
        (Some(id), _) => Some(FolderSelector::Id(id)),
        (None, Some(name)) => Some(FolderSelector::Name(name)),
        (None, None) => None,
    };
    let mut options = CheckoutFolderOptions::new(args.component_type.into())
        .with_folder(folder)
        .with_dry_run(args.dry_run)
        .with_force(args.force);
    if let Some(dir) = args.output_base_dir {
        options = options.with_output_base_dir(dir);
    }

    emit(&CheckoutFolderCommand::new(gateway).execute(&options)?, true)
}

fn run_publish(gateway: &dyn Gateway, args: PublishArgs) -> Result<ExitCode> {
    let options = PublishOptions::new(args.input_dir)
        .with_target_name(args.target_name)
        .with_folder_id(args.folder_id)
        .with_confirm(args.confirm);
    emit(&PublishCommand::new(gateway).execute(&options)?, true)
}

fn run_publish_all(gateway: &dyn Gateway, args: PublishAllArgs) -> Result<ExitCode> {
    let options = PublishAllOptions::new(args.base_dir)
        .with_dry_run(args.dry_run)
        .with_confirm(args.confirm)
        .with_force(args.force);
    let outcome = PublishAllCommand::new(gateway).execute(&options)?;
    emit(&outcome, !outcome.is_error())
}

fn run_validate_code(file: Option<PathBuf>, code: Option<String>) -> Result<ExitCode> {
    let code = match (file, code) {
        (Some(path), _) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, Some(code)) => code,
        (None, None) => {
            return Err(GimsError::InvalidInput("Specify --file or --code".to_string()).into());
        }
    };

    let report = validate_code(&code)?;
    emit(&report, report.valid)
}
