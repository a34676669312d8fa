use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::verdict::Verdict;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MonitorEvent {
    SampleRecorded {
        label: String,
        confidence: f64,
        at: DateTime<Utc>,
    },
    ClassificationFailed {
        reason: String,
        at: DateTime<Utc>,
    },
    VerdictReady {
        verdict: Verdict,
    },
}

pub struct EventBus {
    sender: broadcast::Sender<MonitorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: MonitorEvent) {
        match self.sender.send(event.clone()) {
            Ok(receivers) => {
                tracing::debug!("📡 Event published to {} receivers: {:?}", receivers, event);
            }
            Err(_) => {
                // No receivers subscribed; normal for a headless run.
                tracing::debug!("Event dropped without receivers: {:?}", event);
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.sender.subscribe()
    }
}
