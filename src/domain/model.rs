use serde::{Deserialize, Serialize};
use std::fmt;

/// One side of a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub full_name: String,
    pub age: u32,
}

impl Party {
    pub fn new(full_name: impl Into<String>, age: u32) -> Self {
        Self {
            full_name: full_name.into(),
            age,
        }
    }
}

/// Compliance annotation attached to a transaction.
///
/// `solved` is always set, even when no issue was raised. An issue only
/// exists when `id` is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: Option<String>,
    pub solved: bool,
    pub message: Option<String>,
}

impl Default for Issue {
    fn default() -> Self {
        Self::none()
    }
}

impl Issue {
    /// No issue raised.
    pub fn none() -> Self {
        Self {
            id: None,
            solved: true,
            message: None,
        }
    }

    pub fn open(id: impl Into<String>, message: Option<String>) -> Self {
        Self {
            id: Some(id.into()),
            solved: false,
            message,
        }
    }

    pub fn solved(id: impl Into<String>, message: Option<String>) -> Self {
        Self {
            id: Some(id.into()),
            solved: true,
            message,
        }
    }

    pub fn is_raised(&self) -> bool {
        self.id.is_some()
    }

    /// An issue that was raised and has not been solved yet.
    pub fn is_open(&self) -> bool {
        self.is_raised() && !self.solved
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub mtn: u64,
    pub amount: f64,
    pub sender: Party,
    pub beneficiary: Party,
    pub issue: Issue,
}

impl TransactionRecord {
    pub fn new(mtn: u64, amount: f64, sender: Party, beneficiary: Party, issue: Issue) -> Self {
        Self {
            mtn,
            amount,
            sender,
            beneficiary,
            issue,
        }
    }

    /// True when `name` is the sender or the beneficiary.
    pub fn involves(&self, name: &str) -> bool {
        self.sender.full_name == name || self.beneficiary.full_name == name
    }
}

impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mtn={} | amount={:.2} | sender={} ({}) | beneficiary={} ({}) | issue={}, solved={}",
            self.mtn,
            self.amount,
            self.sender.full_name,
            self.sender.age,
            self.beneficiary.full_name,
            self.beneficiary.age,
            self.issue.id.as_deref().unwrap_or("-"),
            self.issue.solved,
        )?;
        if let Some(message) = &self.issue.message {
            write!(f, ", message={}", message)?;
        }
        Ok(())
    }
}

/// Total amount sent by one sender, rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderTotal {
    pub name: String,
    pub total: f64,
}
