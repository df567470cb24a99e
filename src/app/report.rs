use crate::core::engine::AnalyticsEngine;
use crate::domain::model::{SenderTotal, TransactionRecord};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Parameters for the name-based queries.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportQuery {
    pub sender: Option<String>,
    pub client: Option<String>,
    pub top_n: usize,
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self {
            sender: None,
            client: None,
            top_n: crate::config::DEFAULT_TOP_N,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientIssueStatus {
    pub client: String,
    pub has_open_issue: bool,
}

/// Results of every engine query for one snapshot.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub generated_at: DateTime<Utc>,
    pub transaction_count: usize,
    pub total_amount: f64,
    pub sender_total: Option<SenderTotal>,
    pub max_amount: f64,
    pub unique_clients: usize,
    pub compliance: Option<ClientIssueStatus>,
    pub transactions_by_beneficiary: BTreeMap<String, Vec<&'a TransactionRecord>>,
    pub unsolved_issue_ids: BTreeSet<i64>,
    pub solved_issue_messages: Vec<&'a str>,
    pub top_transactions: Vec<&'a TransactionRecord>,
    pub top_sender: Option<SenderTotal>,
}

impl<'a> Report<'a> {
    pub fn build(engine: &'a AnalyticsEngine, query: &ReportQuery) -> Result<Self> {
        Self::build_at(engine, query, Utc::now())
    }

    pub fn build_at(
        engine: &'a AnalyticsEngine,
        query: &ReportQuery,
        generated_at: DateTime<Utc>,
    ) -> Result<Self> {
        tracing::debug!("Building report over {} transactions", engine.len());

        let top_transactions = if engine.is_empty() {
            tracing::warn!("No transactions loaded, ranking left empty");
            Vec::new()
        } else {
            engine.top_by_amount(query.top_n)?
        };

        Ok(Self {
            generated_at,
            transaction_count: engine.len(),
            total_amount: engine.total_amount(),
            sender_total: query.sender.as_ref().map(|name| SenderTotal {
                name: name.clone(),
                total: engine.total_amount_sent_by(name),
            }),
            max_amount: engine.max_amount(),
            unique_clients: engine.count_unique_clients(),
            compliance: query.client.as_ref().map(|client| ClientIssueStatus {
                client: client.clone(),
                has_open_issue: engine.has_open_compliance_issue(client),
            }),
            transactions_by_beneficiary: engine.transactions_by_beneficiary(),
            unsolved_issue_ids: engine.unsolved_issue_ids()?,
            solved_issue_messages: engine.solved_issue_messages(),
            top_transactions,
            top_sender: engine.top_sender(),
        })
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Report generated at {}", self.generated_at.to_rfc3339())?;
        writeln!(f, "Transactions: {}", self.transaction_count)?;
        writeln!(f, "Total transaction amount: {:.2}", self.total_amount)?;
        if let Some(sender) = &self.sender_total {
            writeln!(f, "Total sent by {}: {:.2}", sender.name, sender.total)?;
        }
        writeln!(f, "Max transaction amount: {:.2}", self.max_amount)?;
        writeln!(f, "Unique clients: {}", self.unique_clients)?;
        if let Some(status) = &self.compliance {
            let answer = if status.has_open_issue { "yes" } else { "no" };
            writeln!(f, "Open compliance issues for {}: {}", status.client, answer)?;
        }

        writeln!(f, "\nTransactions by beneficiary:")?;
        for (beneficiary, records) in &self.transactions_by_beneficiary {
            writeln!(f, "  {}", beneficiary)?;
            for record in records {
                writeln!(f, "    {}", record)?;
            }
        }

        let ids: Vec<String> = self.unsolved_issue_ids.iter().map(i64::to_string).collect();
        writeln!(f, "\nUnsolved issue ids: [{}]", ids.join(", "))?;

        writeln!(f, "\nSolved issue messages:")?;
        for (i, message) in self.solved_issue_messages.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, message)?;
        }

        writeln!(f, "\nTop {} transactions by amount:", self.top_transactions.len())?;
        for record in &self.top_transactions {
            writeln!(f, "  {}", record)?;
        }

        match &self.top_sender {
            Some(top) => writeln!(f, "\nTop sender: {} ({:.2})", top.name, top.total),
            None => writeln!(f, "\nTop sender: none"),
        }
    }
}
