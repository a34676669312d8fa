use anyhow::Result;
use async_trait::async_trait;

use super::source::{Frame, FrameSource};

const FAKE_FRAME_WIDTH: usize = 100;
const FAKE_FRAME_HEIGHT: usize = 100;

/// Stand-in camera that emits a fixed synthetic frame. Useful for running
/// the full pipeline on machines without a capture device.
pub struct FakeCamera {
    frame_bytes: Vec<u8>,
}

impl FakeCamera {
    pub fn new() -> Self {
        Self {
            frame_bytes: vec![0; FAKE_FRAME_WIDTH * FAKE_FRAME_HEIGHT * 3],
        }
    }
}

#[async_trait]
impl FrameSource for FakeCamera {
    async fn next_frame(&self) -> Result<Frame> {
        tracing::debug!("📷 Fake camera frame captured");
        Ok(Frame::new(self.frame_bytes.clone()))
    }
}
