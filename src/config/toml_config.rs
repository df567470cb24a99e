use crate::app::report::ReportFormat;
use crate::config::{Settings, DEFAULT_TOP_N};
use crate::core::engine::MissingIssueIdPolicy;
use crate::utils::error::{AnalyticsError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Report configuration as read from a TOML file.
///
/// Every value is optional so the same shape can carry command-line
/// overrides (see `overlay`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub queries: QueryConfig,
    #[serde(default)]
    pub issues: IssuesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    pub sender: Option<String>,
    pub client: Option<String>,
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssuesConfig {
    pub missing_id: Option<MissingIssueIdPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub format: Option<ReportFormat>,
}

impl ReportConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AnalyticsError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AnalyticsError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定的變數原樣保留
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AnalyticsError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Layers `self` on top of `lower`: values set here win.
    pub fn overlay(self, lower: ReportConfig) -> ReportConfig {
        ReportConfig {
            source: SourceConfig {
                path: self.source.path.or(lower.source.path),
            },
            queries: QueryConfig {
                sender: self.queries.sender.or(lower.queries.sender),
                client: self.queries.client.or(lower.queries.client),
                top_n: self.queries.top_n.or(lower.queries.top_n),
            },
            issues: IssuesConfig {
                missing_id: self.issues.missing_id.or(lower.issues.missing_id),
            },
            output: OutputConfig {
                format: self.output.format.or(lower.output.format),
            },
        }
    }

    /// Fills in defaults and checks the result.
    pub fn into_settings(self) -> Result<Settings> {
        let data_file = validation::validate_required_field("source.path", &self.source.path)?.clone();

        let settings = Settings {
            data_file,
            sender: self.queries.sender,
            client: self.queries.client,
            top_n: self.queries.top_n.unwrap_or(DEFAULT_TOP_N),
            format: self.output.format.unwrap_or_default(),
            missing_issue_id: self.issues.missing_id.unwrap_or_default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(path) = &self.source.path {
            validation::validate_path("source.path", path)?;
        }

        if let Some(top_n) = self.queries.top_n {
            validation::validate_positive_number("queries.top_n", top_n, 1)?;
        }

        if let Some(sender) = &self.queries.sender {
            validation::validate_non_empty_string("queries.sender", sender)?;
        }

        if let Some(client) = &self.queries.client {
            validation::validate_non_empty_string("queries.client", client)?;
        }

        Ok(())
    }
}

impl Validate for ReportConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
