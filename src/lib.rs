pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::storage::LocalStorage;
pub use app::report::{Report, ReportFormat, ReportQuery};
pub use config::{toml_config::ReportConfig, Settings};
pub use core::{
    engine::{AnalyticsEngine, MissingIssueIdPolicy},
    ingest::{parse_records, TransactionLoader},
};
pub use domain::model::{Issue, Party, SenderTotal, TransactionRecord};
pub use utils::error::{AnalyticsError, Result};
