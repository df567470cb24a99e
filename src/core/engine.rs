use crate::domain::model::{SenderTotal, TransactionRecord};
use crate::utils::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// What `unsolved_issue_ids` does with an unsolved record that carries no issue id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingIssueIdPolicy {
    /// Leave the record out of the result.
    #[default]
    Skip,
    /// Return `AnalyticsError::MissingIssueId`.
    Fail,
}

/// Read-only query surface over a fixed snapshot of transactions.
///
/// The engine owns its records and never hands out mutable access, so every
/// query sees the same input order for the lifetime of the engine.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    records: Vec<TransactionRecord>,
    missing_issue_id: MissingIssueIdPolicy,
}

impl AnalyticsEngine {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        tracing::debug!("Analytics engine built over {} transactions", records.len());
        Self {
            records,
            missing_issue_id: MissingIssueIdPolicy::default(),
        }
    }

    pub fn with_missing_issue_id_policy(mut self, policy: MissingIssueIdPolicy) -> Self {
        self.missing_issue_id = policy;
        self
    }

    pub fn missing_issue_id_policy(&self) -> MissingIssueIdPolicy {
        self.missing_issue_id
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of every amount, whatever the issue state.
    pub fn total_amount(&self) -> f64 {
        self.records.iter().map(|r| r.amount).sum()
    }

    /// Sum of the amounts sent by `sender_full_name`, rounded to cents.
    pub fn total_amount_sent_by(&self, sender_full_name: &str) -> f64 {
        let total: f64 = self
            .records
            .iter()
            .filter(|r| r.sender.full_name == sender_full_name)
            .map(|r| r.amount)
            .sum();
        round_to_cents(total)
    }

    /// Highest amount, floored at 0 for an empty collection.
    pub fn max_amount(&self) -> f64 {
        self.records.iter().map(|r| r.amount).fold(0.0, f64::max)
    }

    /// Counts the names that occur exactly once across all sender and
    /// beneficiary slots.
    ///
    /// A name that shows up twice (on one record or on two) is not unique.
    pub fn count_unique_clients(&self) -> usize {
        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        for record in &self.records {
            *occurrences.entry(&record.sender.full_name).or_default() += 1;
            *occurrences.entry(&record.beneficiary.full_name).or_default() += 1;
        }
        occurrences.values().filter(|&&count| count == 1).count()
    }

    /// True if `client_full_name` is party to a transaction with a raised,
    /// unsolved issue.
    pub fn has_open_compliance_issue(&self, client_full_name: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.involves(client_full_name) && r.issue.is_open())
    }

    /// All transactions grouped by beneficiary name, each group in input order.
    pub fn transactions_by_beneficiary(&self) -> BTreeMap<String, Vec<&TransactionRecord>> {
        let mut grouped: BTreeMap<String, Vec<&TransactionRecord>> = BTreeMap::new();
        for record in &self.records {
            grouped
                .entry(record.beneficiary.full_name.clone())
                .or_default()
                .push(record);
        }
        grouped
    }

    /// Numeric ids of every unsolved issue. Ids may be signed.
    pub fn unsolved_issue_ids(&self) -> Result<BTreeSet<i64>> {
        let mut ids = BTreeSet::new();
        for record in self.records.iter().filter(|r| !r.issue.solved) {
            let Some(id) = record.issue.id.as_deref() else {
                match self.missing_issue_id {
                    MissingIssueIdPolicy::Skip => {
                        tracing::warn!(
                            "Skipping unsolved transaction {} without an issue id",
                            record.mtn
                        );
                        continue;
                    }
                    MissingIssueIdPolicy::Fail => {
                        return Err(AnalyticsError::MissingIssueId { mtn: record.mtn });
                    }
                }
            };

            let parsed = id
                .parse::<i64>()
                .map_err(|_| AnalyticsError::InvalidIssueId {
                    mtn: record.mtn,
                    value: id.to_string(),
                })?;
            ids.insert(parsed);
        }
        Ok(ids)
    }

    /// Messages of solved issues, in input order. Records without a message are skipped.
    pub fn solved_issue_messages(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.issue.solved)
            .filter_map(|r| r.issue.message.as_deref())
            .collect()
    }

    pub fn top3_by_amount(&self) -> Result<Vec<&TransactionRecord>> {
        self.top_by_amount(3)
    }

    /// Up to `n` transactions with the largest amounts, largest first.
    ///
    /// Equal amounts keep their input order. A record that is value-equal to
    /// one already taken is passed over for the next distinct record.
    pub fn top_by_amount(&self, n: usize) -> Result<Vec<&TransactionRecord>> {
        if self.records.is_empty() {
            return Err(AnalyticsError::EmptyCollection {
                operation: "top_by_amount".to_string(),
            });
        }

        let mut ranked: Vec<&TransactionRecord> = self.records.iter().collect();
        // sort_by 是穩定排序，同額時保留原始順序
        ranked.sort_by(|a, b| b.amount.total_cmp(&a.amount));

        let mut top: Vec<&TransactionRecord> = Vec::with_capacity(n);
        for record in ranked {
            if top.len() == n {
                break;
            }
            if top.contains(&record) {
                tracing::debug!("Duplicate transaction {} left out of ranking", record.mtn);
                continue;
            }
            top.push(record);
        }
        Ok(top)
    }

    /// Rounded total per distinct sender, in order of first appearance.
    pub fn sender_totals(&self) -> Vec<SenderTotal> {
        let mut order: Vec<&str> = Vec::new();
        let mut sums: HashMap<&str, f64> = HashMap::new();
        for record in &self.records {
            let name = record.sender.full_name.as_str();
            match sums.get_mut(name) {
                Some(sum) => *sum += record.amount,
                None => {
                    order.push(name);
                    sums.insert(name, record.amount);
                }
            }
        }

        order
            .into_iter()
            .map(|name| SenderTotal {
                name: name.to_string(),
                total: round_to_cents(sums[name]),
            })
            .collect()
    }

    /// Sender with the highest total. Ties go to whoever sent first.
    pub fn top_sender(&self) -> Option<SenderTotal> {
        self.sender_totals()
            .into_iter()
            .reduce(|best, candidate| {
                if candidate.total > best.total {
                    candidate
                } else {
                    best
                }
            })
    }
}

impl From<Vec<TransactionRecord>> for AnalyticsEngine {
    fn from(records: Vec<TransactionRecord>) -> Self {
        Self::new(records)
    }
}

/// Round half away from zero to two decimals.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Issue, Party};

    fn record(mtn: u64, amount: f64, sender: &str, beneficiary: &str, issue: Issue) -> TransactionRecord {
        TransactionRecord::new(
            mtn,
            amount,
            Party::new(sender, 30),
            Party::new(beneficiary, 40),
            issue,
        )
    }

    fn transfer(amount: f64, sender: &str, beneficiary: &str) -> TransactionRecord {
        record(1, amount, sender, beneficiary, Issue::none())
    }

    fn stub_solved(mtn: u64) -> TransactionRecord {
        record(
            mtn,
            1000.0,
            "Test sender1",
            "Test beneficiary1",
            Issue::solved("1", Some("Test solved issue message".to_string())),
        )
    }

    /// Two solved transfers that differ only by mtn, plus one with an open issue.
    fn stub_records() -> Vec<TransactionRecord> {
        vec![
            stub_solved(1),
            stub_solved(3),
            record(
                2,
                100.0,
                "Test sender2",
                "Test beneficiary2",
                Issue::open("2", Some("Test unsolved issue message".to_string())),
            ),
        ]
    }

    #[test]
    fn test_total_amount() {
        let engine = AnalyticsEngine::new(stub_records());
        assert_eq!(engine.total_amount(), 2100.0);
        assert_eq!(AnalyticsEngine::default().total_amount(), 0.0);
    }

    #[test]
    fn test_total_amount_sent_by() {
        let engine = AnalyticsEngine::new(stub_records());
        assert_eq!(engine.total_amount_sent_by("Test sender1"), 2000.0);
        assert_eq!(engine.total_amount_sent_by("Test sender2"), 100.0);
        assert_eq!(engine.total_amount_sent_by("Nobody"), 0.0);
        // exact match only
        assert_eq!(engine.total_amount_sent_by("test sender1"), 0.0);
    }

    #[test]
    fn test_total_amount_sent_by_rounds_to_cents() {
        let engine = AnalyticsEngine::new(vec![
            transfer(0.125, "A", "B"),
            transfer(10.004, "C", "D"),
            transfer(0.1, "E", "F"),
            transfer(0.2, "E", "G"),
        ]);
        assert_eq!(engine.total_amount_sent_by("A"), 0.13);
        assert_eq!(engine.total_amount_sent_by("C"), 10.0);
        assert_eq!(engine.total_amount_sent_by("E"), 0.3);
    }

    #[test]
    fn test_max_amount() {
        let engine = AnalyticsEngine::new(stub_records());
        assert_eq!(engine.max_amount(), 1000.0);
        assert_eq!(AnalyticsEngine::default().max_amount(), 0.0);
    }

    #[test]
    fn test_max_amount_never_decreases_as_records_grow() {
        let amounts = [5.0, 2.5, 40.0, 40.0, 1.0];
        let mut records = Vec::new();
        let mut previous = 0.0;
        for amount in amounts {
            records.push(transfer(amount, "A", "B"));
            let current = AnalyticsEngine::new(records.clone()).max_amount();
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(previous, 40.0);
    }

    #[test]
    fn test_count_unique_clients() {
        let engine = AnalyticsEngine::new(stub_records());
        assert_eq!(engine.count_unique_clients(), 2);

        let disjoint = AnalyticsEngine::new(vec![
            transfer(1.0, "A", "B"),
            transfer(1.0, "C", "D"),
            transfer(1.0, "E", "F"),
        ]);
        assert_eq!(disjoint.count_unique_clients(), 6);

        let chained = AnalyticsEngine::new(vec![transfer(1.0, "A", "B"), transfer(1.0, "B", "C")]);
        assert_eq!(chained.count_unique_clients(), 2);

        // sender and beneficiary on the same record
        let self_transfer = AnalyticsEngine::new(vec![transfer(1.0, "A", "A")]);
        assert_eq!(self_transfer.count_unique_clients(), 0);

        assert_eq!(AnalyticsEngine::default().count_unique_clients(), 0);
    }

    #[test]
    fn test_has_open_compliance_issue() {
        let engine = AnalyticsEngine::new(stub_records());
        assert!(engine.has_open_compliance_issue("Test sender2"));
        assert!(engine.has_open_compliance_issue("Test beneficiary2"));
        assert!(!engine.has_open_compliance_issue("Test sender1"));
        assert!(!engine.has_open_compliance_issue("Nobody"));
    }

    #[test]
    fn test_unsolved_without_id_is_not_an_open_issue() {
        let issue = Issue {
            id: None,
            solved: false,
            message: None,
        };
        let engine = AnalyticsEngine::new(vec![record(9, 5.0, "A", "B", issue)]);
        assert!(!engine.has_open_compliance_issue("A"));
    }

    #[test]
    fn test_transactions_by_beneficiary() {
        let records = stub_records();
        let engine = AnalyticsEngine::new(records.clone());
        let grouped = engine.transactions_by_beneficiary();

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["Test beneficiary1"].len(), 2);
        assert_eq!(grouped["Test beneficiary2"].len(), 1);

        let flattened: usize = grouped.values().map(Vec::len).sum();
        assert_eq!(flattened, records.len());
        for record in &records {
            let in_groups = grouped
                .values()
                .flatten()
                .filter(|r| **r == record)
                .count();
            let in_input = records.iter().filter(|r| *r == record).count();
            assert_eq!(in_groups, in_input);
        }
    }

    #[test]
    fn test_transactions_by_beneficiary_keeps_input_order() {
        let engine = AnalyticsEngine::new(vec![
            record(1, 1.0, "A", "X", Issue::none()),
            record(2, 2.0, "B", "Y", Issue::none()),
            record(3, 3.0, "C", "X", Issue::none()),
        ]);
        let grouped = engine.transactions_by_beneficiary();
        let mtns: Vec<u64> = grouped["X"].iter().map(|r| r.mtn).collect();
        assert_eq!(mtns, vec![1, 3]);
    }

    #[test]
    fn test_unsolved_issue_ids() {
        let engine = AnalyticsEngine::new(stub_records());
        let ids = engine.unsolved_issue_ids().unwrap();
        assert_eq!(ids, BTreeSet::from([2]));
    }

    #[test]
    fn test_unsolved_issue_ids_collapse_duplicates() {
        let engine = AnalyticsEngine::new(vec![
            record(1, 1.0, "A", "B", Issue::open("7", None)),
            record(2, 1.0, "C", "D", Issue::open("7", None)),
            record(3, 1.0, "E", "F", Issue::open("3", None)),
        ]);
        assert_eq!(engine.unsolved_issue_ids().unwrap(), BTreeSet::from([3, 7]));
    }

    #[test]
    fn test_unsolved_issue_without_id_follows_policy() {
        let issue = Issue {
            id: None,
            solved: false,
            message: None,
        };
        let records = vec![
            record(1, 1.0, "A", "B", Issue::open("4", None)),
            record(2, 1.0, "C", "D", issue),
        ];

        let skipping = AnalyticsEngine::new(records.clone());
        assert_eq!(skipping.missing_issue_id_policy(), MissingIssueIdPolicy::Skip);
        assert_eq!(skipping.unsolved_issue_ids().unwrap(), BTreeSet::from([4]));

        let failing =
            AnalyticsEngine::new(records).with_missing_issue_id_policy(MissingIssueIdPolicy::Fail);
        assert!(matches!(
            failing.unsolved_issue_ids(),
            Err(AnalyticsError::MissingIssueId { mtn: 2 })
        ));
    }

    #[test]
    fn test_unsolved_issue_ids_accept_signed_values() {
        let engine = AnalyticsEngine::new(vec![
            record(1, 1.0, "A", "B", Issue::open("-3", None)),
            record(2, 1.0, "C", "D", Issue::open("12", None)),
        ]);
        assert_eq!(engine.unsolved_issue_ids().unwrap(), BTreeSet::from([-3, 12]));
    }

    #[test]
    fn test_unsolved_issue_with_non_numeric_id() {
        let engine = AnalyticsEngine::new(vec![record(5, 1.0, "A", "B", Issue::open("abc", None))]);
        match engine.unsolved_issue_ids() {
            Err(AnalyticsError::InvalidIssueId { mtn, value }) => {
                assert_eq!(mtn, 5);
                assert_eq!(value, "abc");
            }
            other => panic!("expected InvalidIssueId, got {:?}", other),
        }
    }

    #[test]
    fn test_solved_issue_messages() {
        let engine = AnalyticsEngine::new(vec![
            record(1, 1.0, "A", "B", Issue::solved("1", Some("first".to_string()))),
            record(2, 1.0, "A", "B", Issue::solved("2", None)),
            record(3, 1.0, "A", "B", Issue::open("3", Some("still open".to_string()))),
            record(4, 1.0, "A", "B", Issue::solved("4", Some("second".to_string()))),
        ]);
        assert_eq!(engine.solved_issue_messages(), vec!["first", "second"]);
    }

    #[test]
    fn test_top3_by_amount() {
        let engine = AnalyticsEngine::new(stub_records());
        let top = engine.top3_by_amount().unwrap();
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].amount, 1000.0);
        assert_eq!(top[2].amount, 100.0);
    }

    #[test]
    fn test_top3_keeps_equal_amounts_from_distinct_records() {
        let engine = AnalyticsEngine::new(vec![
            record(1, 1000.0, "A", "B", Issue::none()),
            record(2, 1000.0, "A", "B", Issue::none()),
            record(3, 100.0, "C", "D", Issue::none()),
        ]);
        let mtns: Vec<u64> = engine.top3_by_amount().unwrap().iter().map(|r| r.mtn).collect();
        assert_eq!(mtns, vec![1, 2, 3]);
    }

    #[test]
    fn test_top3_skips_value_identical_duplicates() {
        let duplicate = record(1, 1000.0, "A", "B", Issue::none());
        let engine = AnalyticsEngine::new(vec![
            duplicate.clone(),
            record(2, 50.0, "C", "D", Issue::none()),
            duplicate,
            record(3, 500.0, "E", "F", Issue::none()),
        ]);
        let mtns: Vec<u64> = engine.top3_by_amount().unwrap().iter().map(|r| r.mtn).collect();
        assert_eq!(mtns, vec![1, 3, 2]);
    }

    #[test]
    fn test_top3_is_stable_on_ties() {
        let engine = AnalyticsEngine::new(vec![
            record(1, 10.0, "A", "B", Issue::none()),
            record(2, 20.0, "C", "D", Issue::none()),
            record(3, 10.0, "E", "F", Issue::none()),
            record(4, 10.0, "G", "H", Issue::none()),
        ]);
        let mtns: Vec<u64> = engine.top3_by_amount().unwrap().iter().map(|r| r.mtn).collect();
        assert_eq!(mtns, vec![2, 1, 3]);
    }

    #[test]
    fn test_top_by_amount_with_fewer_records() {
        let engine = AnalyticsEngine::new(vec![transfer(5.0, "A", "B")]);
        assert_eq!(engine.top3_by_amount().unwrap().len(), 1);
    }

    #[test]
    fn test_top_by_amount_fails_on_empty_collection() {
        let engine = AnalyticsEngine::default();
        assert!(matches!(
            engine.top3_by_amount(),
            Err(AnalyticsError::EmptyCollection { .. })
        ));
    }

    #[test]
    fn test_top_sender() {
        let engine = AnalyticsEngine::new(stub_records());
        let top = engine.top_sender().unwrap();
        assert_eq!(top.name, "Test sender1");
        assert_eq!(top.total, 2000.0);

        let engine = AnalyticsEngine::new(vec![transfer(1500.0, "A", "X"), transfer(500.0, "B", "Y")]);
        assert_eq!(
            engine.top_sender(),
            Some(SenderTotal {
                name: "A".to_string(),
                total: 1500.0
            })
        );
    }

    #[test]
    fn test_top_sender_tie_goes_to_first_sender() {
        let engine = AnalyticsEngine::new(vec![
            transfer(100.0, "B", "X"),
            transfer(60.0, "A", "Y"),
            transfer(40.0, "A", "Z"),
        ]);
        assert_eq!(engine.top_sender().unwrap().name, "B");
    }

    #[test]
    fn test_top_sender_on_empty_collection() {
        assert_eq!(AnalyticsEngine::default().top_sender(), None);
    }

    #[test]
    fn test_sender_totals_in_first_appearance_order() {
        let engine = AnalyticsEngine::new(vec![
            transfer(1.0, "B", "X"),
            transfer(2.0, "A", "Y"),
            transfer(3.0, "B", "Z"),
        ]);
        let totals = engine.sender_totals();
        let names: Vec<&str> = totals.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(totals[0].total, 4.0);
    }

    #[test]
    fn test_unsolved_issue_scenario() {
        let engine = AnalyticsEngine::new(vec![record(1, 10.0, "S", "R", Issue::open("7", None))]);
        assert_eq!(engine.unsolved_issue_ids().unwrap(), BTreeSet::from([7]));
        assert!(engine.has_open_compliance_issue("S"));
        assert!(engine.has_open_compliance_issue("R"));
    }

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(2.675_1), 2.68);
        assert_eq!(round_to_cents(0.0), 0.0);
    }
}
