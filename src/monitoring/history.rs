use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::verdict::Verdict;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub verdict: Verdict,
    pub recorded_at: DateTime<Utc>,
}

/// Newest-first list of recent verdicts. Entries past `capacity` are
/// evicted from the tail; a capacity of 0 means unbounded.
pub struct VerdictHistory {
    capacity: usize,
    records: VecDeque<VerdictRecord>,
}

impl VerdictHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: VecDeque::new(),
        }
    }

    pub fn push(&mut self, verdict: Verdict, recorded_at: DateTime<Utc>) {
        self.records.push_front(VerdictRecord {
            verdict,
            recorded_at,
        });

        if self.capacity > 0 {
            while self.records.len() > self.capacity {
                self.records.pop_back();
            }
        }
    }

    pub fn latest(&self) -> Option<&VerdictRecord> {
        self.records.front()
    }

    pub fn entries(&self) -> Vec<VerdictRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(label: &str) -> Verdict {
        Verdict {
            label: Some(label.to_string()),
            count: 1,
            total_samples: 1,
            average_confidence: Some(0.5),
            closed_at: Utc::now(),
        }
    }

    #[test]
    fn newest_entry_is_first() {
        let mut history = VerdictHistory::new(6);
        history.push(verdict("apple"), Utc::now());
        history.push(verdict("banana"), Utc::now());

        assert_eq!(history.len(), 2);
        assert_eq!(
            history.latest().unwrap().verdict.label.as_deref(),
            Some("banana")
        );
    }

    #[test]
    fn oldest_entries_are_evicted_past_capacity() {
        let mut history = VerdictHistory::new(2);
        history.push(verdict("apple"), Utc::now());
        history.push(verdict("banana"), Utc::now());
        history.push(verdict("cheese"), Utc::now());

        let labels: Vec<_> = history
            .entries()
            .iter()
            .map(|r| r.verdict.label.clone().unwrap())
            .collect();
        assert_eq!(labels, vec!["cheese", "banana"]);
    }

    #[test]
    fn zero_capacity_keeps_everything() {
        let mut history = VerdictHistory::new(0);
        for i in 0..50 {
            history.push(verdict(&format!("label-{i}")), Utc::now());
        }
        assert_eq!(history.len(), 50);
    }
}
