//! GIMS Core Library
//!
//! Client-side domain logic for the GIMS automation API: CRUD over scripts,
//! datasource types and activator types, local-first checkout/publish
//! synchronization, and log tailing.

pub mod api;
pub mod config;
pub mod error;
pub mod folders;
pub mod logs;
pub mod model;
pub mod resources;
pub mod sync;

pub use error::{GimsError, Result};

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration and errors
    pub use crate::config::{ConfigFile, GimsConfig};
    pub use crate::error::{GimsError, Result};

    // Remote API
    pub use crate::api::{ApiRequest, EventStream, Gateway, HttpGateway, HttpMethod, StreamEnd};
    pub use crate::model::{
        ComponentKind, Folder, RemoteComponent, RemoteMethod, RemoteParameter, RemoteProperty,
    };

    // CRUD services
    pub use crate::resources::{
        ActivatorTypeService, CodeSource, ComponentCatalog, DatasourceTypeService, FolderService,
        PropertyService, ReferenceService, ScriptService,
    };

    // Sync
    pub use crate::sync::{
        CheckoutCommand, CheckoutFolderCommand, CompareCommand, FindDuplicatesCommand,
        PublishAllCommand, PublishCommand, StatusCommand,
    };

    // Logs
    pub use crate::logs::{LogCapture, StreamOptions, stream_script_log};
}
