use crate::domain::model::{Issue, Party, TransactionRecord};
use crate::domain::ports::Storage;
use crate::utils::error::{AnalyticsError, Result};
use serde_json::{Map, Value};

pub const REQUIRED_FIELDS: [&str; 7] = [
    "mtn",
    "amount",
    "senderFullName",
    "senderAge",
    "beneficiaryFullName",
    "beneficiaryAge",
    "issueSolved",
];

/// Reads a transaction document through a `Storage` and validates it.
pub struct TransactionLoader<S: Storage> {
    storage: S,
}

impl<S: Storage> TransactionLoader<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn load(&self, path: &str) -> Result<Vec<TransactionRecord>> {
        tracing::debug!("Reading transactions from: {}", path);
        let data = self.storage.read_file(path)?;
        let records = parse_records(&data)?;
        tracing::info!("Loaded {} transactions from {}", records.len(), path);
        Ok(records)
    }
}

/// Parses a JSON array of source objects into validated records, in order.
pub fn parse_records(data: &[u8]) -> Result<Vec<TransactionRecord>> {
    let document: Value = serde_json::from_slice(data)?;
    let Value::Array(items) = document else {
        return Err(AnalyticsError::ValidationError {
            message: "top-level document must be an array of transactions".to_string(),
        });
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => parse_record(index, fields),
            _ => Err(AnalyticsError::ValidationError {
                message: format!("transaction #{} is not a JSON object", index),
            }),
        })
        .collect()
}

fn parse_record(index: usize, fields: &Map<String, Value>) -> Result<TransactionRecord> {
    if fields.is_empty() {
        return Err(AnalyticsError::EmptyRecord { index });
    }

    // 先確認必填欄位都在，再做型別轉換
    for field in REQUIRED_FIELDS {
        if fields.get(field).map_or(true, Value::is_null) {
            return Err(AnalyticsError::IncompleteRecord {
                index,
                field: field.to_string(),
            });
        }
    }

    let amount = read_f64(index, fields, "amount")?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(invalid(index, "amount", "amount must be a non-negative number"));
    }

    Ok(TransactionRecord {
        mtn: read_u64(index, fields, "mtn")?,
        amount,
        sender: Party {
            full_name: read_string(index, fields, "senderFullName")?,
            age: read_age(index, fields, "senderAge")?,
        },
        beneficiary: Party {
            full_name: read_string(index, fields, "beneficiaryFullName")?,
            age: read_age(index, fields, "beneficiaryAge")?,
        },
        issue: Issue {
            id: read_optional_id(index, fields, "issueId")?,
            solved: read_bool(index, fields, "issueSolved")?,
            message: read_optional_string(index, fields, "issueMessage")?,
        },
    })
}

fn invalid(index: usize, field: &str, reason: impl Into<String>) -> AnalyticsError {
    AnalyticsError::InvalidField {
        index,
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn read_u64(index: usize, fields: &Map<String, Value>, field: &str) -> Result<u64> {
    match &fields[field] {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| invalid(index, field, format!("expected a non-negative integer, got {}", n))),
        Value::String(s) => s
            .parse()
            .map_err(|_| invalid(index, field, format!("expected a non-negative integer, got '{}'", s))),
        other => Err(invalid(index, field, format!("expected an integer, got {}", other))),
    }
}

fn read_age(index: usize, fields: &Map<String, Value>, field: &str) -> Result<u32> {
    let value = read_u64(index, fields, field)?;
    u32::try_from(value).map_err(|_| invalid(index, field, format!("age {} is out of range", value)))
}

fn read_f64(index: usize, fields: &Map<String, Value>, field: &str) -> Result<f64> {
    match &fields[field] {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| invalid(index, field, format!("expected a number, got {}", n))),
        Value::String(s) => s
            .parse()
            .map_err(|_| invalid(index, field, format!("expected a number, got '{}'", s))),
        other => Err(invalid(index, field, format!("expected a number, got {}", other))),
    }
}

fn read_string(index: usize, fields: &Map<String, Value>, field: &str) -> Result<String> {
    match &fields[field] {
        Value::String(s) => Ok(s.clone()),
        other => Err(invalid(index, field, format!("expected a string, got {}", other))),
    }
}

fn read_bool(index: usize, fields: &Map<String, Value>, field: &str) -> Result<bool> {
    match &fields[field] {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(invalid(index, field, format!("expected a boolean, got {}", other))),
    }
}

fn read_optional_id(index: usize, fields: &Map<String, Value>, field: &str) -> Result<Option<String>> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(invalid(index, field, format!("expected a string or number, got {}", other))),
    }
}

fn read_optional_string(
    index: usize,
    fields: &Map<String, Value>,
    field: &str,
) -> Result<Option<String>> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(invalid(index, field, format!("expected a string, got {}", other))),
    }
}
