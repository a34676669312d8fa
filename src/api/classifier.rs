use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

use super::types::Prediction;
use crate::core::config::ClassifierConfig;

const ERROR_BODY_EXCERPT_LEN: usize = 150;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("API {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("request timed out")]
    Timeout,
    #[error("failed to decode prediction response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Seam between the sampling loop and whatever produces predictions.
///
/// Production uses [`ClassifierClient`]; tests substitute scripted
/// implementations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Classify: Send + Sync {
    async fn classify(
        &self,
        image: Vec<u8>,
        top_k: usize,
    ) -> Result<Prediction, ClassifierError>;
}

pub struct ClassifierClient {
    client: Client,
    config: ClassifierConfig,
}

impl ClassifierClient {
    pub fn new(config: ClassifierConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// Reachability probe against the service root.
    pub async fn ping(&self) -> anyhow::Result<bool> {
        let response = self.client.get(&self.config.base_url).send().await?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl Classify for ClassifierClient {
    async fn classify(
        &self,
        image: Vec<u8>,
        top_k: usize,
    ) -> Result<Prediction, ClassifierError> {
        let url = format!("{}/predict?top_k={}", self.config.base_url, top_k);

        let part = Part::bytes(image)
            .file_name("frame.jpg")
            .mime_str("image/jpeg")
            .map_err(ClassifierError::Http)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Timeout
                } else {
                    ClassifierError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = body.chars().take(ERROR_BODY_EXCERPT_LEN).collect();
            tracing::error!("Classifier API error: {} - {}", status, body);
            return Err(ClassifierError::Status { status, body });
        }

        response.json().await.map_err(|e| {
            if e.is_timeout() {
                ClassifierError::Timeout
            } else {
                ClassifierError::Decode(e)
            }
        })
    }
}
