use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Transaction #{index} is empty")]
    EmptyRecord { index: usize },

    #[error("Transaction #{index} is incomplete: missing field '{field}'")]
    IncompleteRecord { index: usize, field: String },

    #[error("Transaction #{index} has invalid field '{field}': {reason}")]
    InvalidField {
        index: usize,
        field: String,
        reason: String,
    },

    #[error("Unsolved issue on transaction {mtn} has no issue id")]
    MissingIssueId { mtn: u64 },

    #[error("Issue id '{value}' on transaction {mtn} is not numeric")]
    InvalidIssueId { mtn: u64, value: String },

    #[error("Operation '{operation}' requires at least one transaction")]
    EmptyCollection { operation: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Ingestion,
    Query,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl AnalyticsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AnalyticsError::IoError(_) => ErrorCategory::Io,
            AnalyticsError::SerializationError(_)
            | AnalyticsError::EmptyRecord { .. }
            | AnalyticsError::IncompleteRecord { .. }
            | AnalyticsError::InvalidField { .. }
            | AnalyticsError::ValidationError { .. } => ErrorCategory::Ingestion,
            AnalyticsError::MissingIssueId { .. }
            | AnalyticsError::InvalidIssueId { .. }
            | AnalyticsError::EmptyCollection { .. } => ErrorCategory::Query,
            AnalyticsError::ConfigError { .. }
            | AnalyticsError::MissingConfigError { .. }
            | AnalyticsError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Query => ErrorSeverity::Medium,
            ErrorCategory::Ingestion | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AnalyticsError::IoError(e) => format!("Could not read the transaction source: {}", e),
            AnalyticsError::SerializationError(e) => {
                format!("The transaction source is not valid JSON: {}", e)
            }
            AnalyticsError::EmptyRecord { index } => {
                format!("Transaction #{} in the source has no fields", index)
            }
            AnalyticsError::IncompleteRecord { index, field } => {
                format!("Transaction #{} is missing the '{}' field", index, field)
            }
            AnalyticsError::EmptyCollection { .. } => {
                "There are no transactions to rank".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AnalyticsError::IoError(_) => "Check that the data file exists and is readable",
            AnalyticsError::SerializationError(_) | AnalyticsError::ValidationError { .. } => {
                "The source must be a JSON array of transaction objects"
            }
            AnalyticsError::EmptyRecord { .. } | AnalyticsError::IncompleteRecord { .. } => {
                "Every transaction needs mtn, amount, senderFullName, senderAge, beneficiaryFullName, beneficiaryAge and issueSolved"
            }
            AnalyticsError::InvalidField { .. } => {
                "Fix the field type in the source (numbers for amounts and ages, boolean for issueSolved)"
            }
            AnalyticsError::MissingIssueId { .. } => {
                "Add the issueId to the transaction or run with the 'skip' missing-id policy"
            }
            AnalyticsError::InvalidIssueId { .. } => "Issue ids must be numeric",
            AnalyticsError::EmptyCollection { .. } => "Load at least one transaction",
            AnalyticsError::ConfigError { .. }
            | AnalyticsError::MissingConfigError { .. }
            | AnalyticsError::InvalidConfigValueError { .. } => {
                "Check the configuration file and command-line flags"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
