#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::app::report::{ReportFormat, ReportQuery};
use crate::core::engine::MissingIssueIdPolicy;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};

pub const DEFAULT_TOP_N: usize = 3;

/// Fully resolved settings for one report run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_file: String,
    pub sender: Option<String>,
    pub client: Option<String>,
    pub top_n: usize,
    pub format: ReportFormat,
    pub missing_issue_id: MissingIssueIdPolicy,
}

impl Settings {
    pub fn query(&self) -> ReportQuery {
        ReportQuery {
            sender: self.sender.clone(),
            client: self.client.clone(),
            top_n: self.top_n,
        }
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_path("source.path", &self.data_file)?;
        validation::validate_positive_number("queries.top_n", self.top_n, 1)?;
        if let Some(sender) = &self.sender {
            validation::validate_non_empty_string("queries.sender", sender)?;
        }
        if let Some(client) = &self.client {
            validation::validate_non_empty_string("queries.client", client)?;
        }
        Ok(())
    }
}
