use super::history::{VerdictHistory, VerdictRecord};
use crate::verdict::Verdict;

/// Renders verdicts and history as human-readable status lines for the log
/// output.
pub struct VerdictReporter;

impl VerdictReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_verdict(&self, verdict: &Verdict) -> String {
        match &verdict.label {
            Some(label) => format!(
                "🧾 VERDICT: {} ({}/{} frames • avg conf {} • {})",
                label,
                verdict.count,
                verdict.total_samples,
                fmt_pct(verdict.average_confidence),
                verdict.closed_at.format("%H:%M:%S"),
            ),
            None => "🧾 VERDICT: no frames captured this window".to_string(),
        }
    }

    pub fn format_history(&self, history: &VerdictHistory) -> String {
        let mut output = String::new();

        output.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        output.push_str("  RECENT VERDICTS\n");
        output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

        if history.is_empty() {
            output.push_str("  (none yet)\n");
        }
        for record in history.entries() {
            output.push_str(&format!("  • {}\n", self.format_record(&record)));
        }

        output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        output
    }

    fn format_record(&self, record: &VerdictRecord) -> String {
        match &record.verdict.label {
            Some(label) => format!(
                "{} — {}/{} • {} • {}",
                label,
                record.verdict.count,
                record.verdict.total_samples,
                fmt_pct(record.verdict.average_confidence),
                record.recorded_at.format("%H:%M:%S"),
            ),
            None => format!("no data • {}", record.recorded_at.format("%H:%M:%S")),
        }
    }
}

fn fmt_pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.1}%", v * 100.0),
        _ => "—".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn formats_winning_verdict_with_share_and_confidence() {
        let reporter = VerdictReporter::new();
        let verdict = Verdict {
            label: Some("apple".to_string()),
            count: 2,
            total_samples: 3,
            average_confidence: Some(0.85),
            closed_at: Utc::now(),
        };

        let line = reporter.format_verdict(&verdict);
        assert!(line.contains("apple"));
        assert!(line.contains("2/3"));
        assert!(line.contains("85.0%"));
    }

    #[test]
    fn no_data_verdict_renders_a_distinct_message() {
        let reporter = VerdictReporter::new();
        let verdict = Verdict {
            label: None,
            count: 0,
            total_samples: 0,
            average_confidence: None,
            closed_at: Utc::now(),
        };

        let line = reporter.format_verdict(&verdict);
        assert!(line.contains("no frames captured"));
    }

    #[test]
    fn history_block_lists_entries_newest_first() {
        let reporter = VerdictReporter::new();
        let mut history = VerdictHistory::new(6);
        history.push(
            Verdict {
                label: Some("apple".to_string()),
                count: 4,
                total_samples: 5,
                average_confidence: Some(0.7),
                closed_at: Utc::now(),
            },
            Utc::now(),
        );
        history.push(
            Verdict {
                label: Some("banana".to_string()),
                count: 3,
                total_samples: 5,
                average_confidence: Some(0.6),
                closed_at: Utc::now(),
            },
            Utc::now(),
        );

        let block = reporter.format_history(&history);
        let apple_pos = block.find("apple").unwrap();
        let banana_pos = block.find("banana").unwrap();
        assert!(banana_pos < apple_pos);
    }
}
