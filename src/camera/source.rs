use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One captured camera frame, ready to ship to the classifier.
#[derive(Debug, Clone)]
pub struct Frame {
    pub bytes: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            captured_at: Utc::now(),
        }
    }
}

/// Frame acquisition seam. A capture failure is a per-tick recoverable
/// error; the tick simply contributes no sample.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn next_frame(&self) -> Result<Frame>;
}
