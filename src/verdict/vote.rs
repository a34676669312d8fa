use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::config::{SamplingConfig, WindowPolicyKind};

/// When a window is considered complete. Exactly one policy is active per
/// aggregator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    Duration { window_ms: i64 },
    Count { target: u64 },
}

impl WindowPolicy {
    pub fn from_config(config: &SamplingConfig) -> Self {
        match config.window_policy {
            WindowPolicyKind::Duration => WindowPolicy::Duration {
                window_ms: config.window_duration_ms,
            },
            WindowPolicyKind::Count => WindowPolicy::Count {
                target: config.window_sample_target,
            },
        }
    }
}

/// The label judged most representative of a completed window.
///
/// `label` is `None` when the window closed without a single usable sample;
/// that is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: Option<String>,
    pub count: u64,
    pub total_samples: u64,
    pub average_confidence: Option<f64>,
    pub closed_at: DateTime<Utc>,
}

impl Verdict {
    fn no_data(closed_at: DateTime<Utc>) -> Self {
        Self {
            label: None,
            count: 0,
            total_samples: 0,
            average_confidence: None,
            closed_at,
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.label.is_none()
    }

    /// Fraction of the window's samples that voted for the winning label.
    pub fn share(&self) -> f64 {
        if self.total_samples == 0 {
            0.0
        } else {
            self.count as f64 / self.total_samples as f64
        }
    }
}

#[derive(Debug)]
struct Window {
    started_at: DateTime<Utc>,
    // Labels in first-seen order; keeps the final tie-break deterministic.
    order: Vec<String>,
    counts: HashMap<String, u64>,
    confidence_sums: HashMap<String, f64>,
    total_samples: u64,
}

impl Window {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            order: Vec::new(),
            counts: HashMap::new(),
            confidence_sums: HashMap::new(),
            total_samples: 0,
        }
    }

    fn record(&mut self, label: &str, confidence: f64) {
        if !self.counts.contains_key(label) {
            self.order.push(label.to_string());
        }
        *self.counts.entry(label.to_string()).or_insert(0) += 1;
        *self.confidence_sums.entry(label.to_string()).or_insert(0.0) += confidence;
        self.total_samples += 1;
    }
}

/// Tallies (label, confidence) samples over one window at a time and turns
/// a completed window into a plurality [`Verdict`]: highest count wins,
/// ties broken by higher average confidence, remaining ties by first-seen
/// order.
///
/// Closing does not reset state; the owner opens the next window
/// explicitly. All methods take `now` from the caller, which keeps the
/// aggregator clock-free and directly testable.
pub struct VoteAggregator {
    policy: WindowPolicy,
    window: Option<Window>,
}

impl VoteAggregator {
    pub fn new(policy: WindowPolicy) -> Self {
        Self {
            policy,
            window: None,
        }
    }

    /// Starts a fresh window. Always safe to call; any in-progress window
    /// is discarded without emitting a verdict.
    pub fn open(&mut self, now: DateTime<Utc>) {
        self.window = Some(Window::new(now));
    }

    /// Records one classification result. An empty label drops the sample;
    /// a non-finite confidence is coerced to 0.0 rather than rejected.
    /// Opens a window implicitly if none is open.
    pub fn record_sample(&mut self, label: &str, confidence: f64, now: DateTime<Utc>) {
        if label.is_empty() {
            return;
        }
        let confidence = if confidence.is_finite() { confidence } else { 0.0 };

        let window = self.window.get_or_insert_with(|| Window::new(now));
        window.record(label, confidence);
    }

    pub fn is_window_complete(&self, now: DateTime<Utc>) -> bool {
        let Some(window) = &self.window else {
            return false;
        };

        match self.policy {
            WindowPolicy::Duration { window_ms } => {
                (now - window.started_at).num_milliseconds() >= window_ms
            }
            WindowPolicy::Count { target } => window.total_samples >= target,
        }
    }

    /// Produces the verdict for the current window without mutating it.
    pub fn close_window(&self, now: DateTime<Utc>) -> Verdict {
        let Some(window) = &self.window else {
            return Verdict::no_data(now);
        };
        if window.total_samples == 0 {
            return Verdict::no_data(now);
        }

        let mut best_label: Option<&str> = None;
        let mut best_count: u64 = 0;
        let mut best_avg: f64 = -1.0;

        for label in &window.order {
            let count = window.counts[label.as_str()];
            let avg = window.confidence_sums[label.as_str()] / count as f64;

            if count > best_count || (count == best_count && avg > best_avg) {
                best_label = Some(label);
                best_count = count;
                best_avg = avg;
            }
        }

        match best_label {
            Some(label) => Verdict {
                label: Some(label.to_string()),
                count: best_count,
                total_samples: window.total_samples,
                average_confidence: Some(best_avg),
                closed_at: now,
            },
            None => Verdict::no_data(now),
        }
    }

    pub fn total_samples(&self) -> u64 {
        self.window.as_ref().map(|w| w.total_samples).unwrap_or(0)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.window.as_ref().map(|w| w.started_at)
    }
}
