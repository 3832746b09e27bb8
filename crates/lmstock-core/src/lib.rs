pub mod app_config;
pub mod branches;
pub mod config;
pub mod stock;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, ExportFormat, HeaderRotation, TelegramCredentials};
pub use branches::{load_branches, Branch, BranchKind, BranchRegistry, BranchesFile};
pub use config::{load_app_config, load_app_config_from_env};
pub use stock::{AvailabilityRecord, StockQuery, StockStatus};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read branches file {path}: {source}")]
    BranchesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse branches file: {0}")]
    BranchesFileParse(#[source] serde_yaml::Error),

    #[error("branch validation failed: {0}")]
    Validation(String),
}
