use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::Mutex;

use super::source::{Frame, FrameSource};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Replays image files from a directory in sorted order, wrapping around
/// when it reaches the end. The directory is re-listed on every wrap so
/// frames dropped in while running get picked up.
pub struct DirectoryCamera {
    dir: PathBuf,
    cursor: Mutex<Cursor>,
}

struct Cursor {
    files: Vec<PathBuf>,
    next: usize,
}

impl DirectoryCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cursor: Mutex::new(Cursor {
                files: Vec::new(),
                next: 0,
            }),
        }
    }

    fn list_frames(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read frame directory {}", self.dir.display()))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();

        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl FrameSource for DirectoryCamera {
    async fn next_frame(&self) -> Result<Frame> {
        let mut cursor = self.cursor.lock().await;

        if cursor.next >= cursor.files.len() {
            cursor.files = self.list_frames()?;
            cursor.next = 0;
            if cursor.files.is_empty() {
                bail!("no image frames found in {}", self.dir.display());
            }
        }

        let path = cursor.files[cursor.next].clone();
        cursor.next += 1;
        drop(cursor);

        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read frame {}", path.display()))?;

        tracing::debug!("📷 Frame loaded from {}", path.display());
        Ok(Frame::new(bytes))
    }
}
