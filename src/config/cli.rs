use crate::app::report::ReportFormat;
use crate::config::toml_config::{
    IssuesConfig, OutputConfig, QueryConfig, ReportConfig, SourceConfig,
};
use crate::config::Settings;
use crate::core::engine::MissingIssueIdPolicy;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::path::Path;

#[derive(Debug, Clone, Parser)]
#[command(name = "txn-analytics")]
#[command(about = "Analytical queries over a JSON file of transactions")]
pub struct CliConfig {
    /// Path to the transactions JSON file
    #[arg(short, long)]
    pub data_file: Option<String>,

    /// Path to a TOML configuration file; a relative `[source] path` in it
    /// is resolved against the file's own directory
    #[arg(short, long)]
    pub config: Option<String>,

    /// Sender whose total is reported
    #[arg(long)]
    pub sender: Option<String>,

    /// Client checked for open compliance issues
    #[arg(long)]
    pub client: Option<String>,

    /// Number of transactions in the ranking
    #[arg(long)]
    pub top: Option<usize>,

    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Fail when an unsolved issue has no id instead of skipping it
    #[arg(long)]
    pub fail_on_missing_issue_id: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Flags as a config layer; unset flags stay `None`.
    pub fn as_layer(&self) -> ReportConfig {
        ReportConfig {
            source: SourceConfig {
                path: self.data_file.clone(),
            },
            queries: QueryConfig {
                sender: self.sender.clone(),
                client: self.client.clone(),
                top_n: self.top,
            },
            issues: IssuesConfig {
                missing_id: self
                    .fail_on_missing_issue_id
                    .then_some(MissingIssueIdPolicy::Fail),
            },
            output: OutputConfig {
                format: self.format,
            },
        }
    }

    /// Command-line flags over the TOML file (if any) over defaults.
    pub fn resolve(&self) -> Result<Settings> {
        let file_layer = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                let mut config = ReportConfig::from_file(path)?;
                config.validate()?;
                config.source.path = config
                    .source
                    .path
                    .map(|data_file| relative_to_config(path, &data_file));
                config
            }
            None => ReportConfig::default(),
        };

        self.as_layer().overlay(file_layer).into_settings()
    }
}

/// 相對路徑以配置檔所在目錄為基準
fn relative_to_config(config_path: &str, data_file: &str) -> String {
    let data_path = Path::new(data_file);
    if data_path.is_absolute() {
        return data_file.to_string();
    }
    match Path::new(config_path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(data_path).to_string_lossy().into_owned(),
        _ => data_file.to_string(),
    }
}
