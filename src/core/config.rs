use anyhow::Result;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub classifier: ClassifierConfig,
    pub sampling: SamplingConfig,
    pub camera: CameraConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub top_k: usize,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplingConfig {
    pub interval_ms: u64,
    pub window_policy: WindowPolicyKind,
    pub window_duration_ms: i64,
    pub window_sample_target: u64,
    pub check_interval_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPolicyKind {
    Duration,
    Count,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    pub source: CameraSourceKind,
    pub frame_dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraSourceKind {
    Fake,
    Directory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub history_capacity: usize,
    pub health_port: u16,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            classifier: ClassifierConfig {
                base_url: env::var("CLASSIFIER_BASE_URL")
                    .unwrap_or_else(|_| {
                        "https://elgatito1-food-classifier.hf.space".to_string()
                    })
                    .trim_end_matches('/')
                    .to_string(),
                top_k: env::var("CLASSIFIER_TOP_K")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .unwrap_or(3),
                request_timeout_ms: env::var("CLASSIFIER_TIMEOUT_MS")
                    .unwrap_or_else(|_| "10000".to_string())
                    .parse()
                    .unwrap_or(10_000),
            },
            sampling: SamplingConfig {
                interval_ms: env::var("SAMPLE_INTERVAL_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()
                    .unwrap_or(1000),
                window_policy: match env::var("WINDOW_POLICY")
                    .unwrap_or_else(|_| "duration".to_string())
                    .to_lowercase()
                    .as_str()
                {
                    "count" => WindowPolicyKind::Count,
                    _ => WindowPolicyKind::Duration,
                },
                window_duration_ms: env::var("WINDOW_DURATION_MS")
                    .unwrap_or_else(|_| "60000".to_string())
                    .parse()
                    .unwrap_or(60_000),
                window_sample_target: env::var("WINDOW_SAMPLE_TARGET")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap_or(60),
                check_interval_ms: env::var("WINDOW_CHECK_INTERVAL_MS")
                    .unwrap_or_else(|_| "250".to_string())
                    .parse()
                    .unwrap_or(250),
            },
            camera: CameraConfig {
                source: match env::var("CAMERA_SOURCE")
                    .unwrap_or_else(|_| "fake".to_string())
                    .to_lowercase()
                    .as_str()
                {
                    "directory" => CameraSourceKind::Directory,
                    _ => CameraSourceKind::Fake,
                },
                frame_dir: env::var("CAMERA_FRAME_DIR")
                    .unwrap_or_else(|_| "./frames".to_string()),
            },
            monitoring: MonitoringConfig {
                history_capacity: env::var("HISTORY_CAPACITY")
                    .unwrap_or_else(|_| "6".to_string())
                    .parse()
                    .unwrap_or(6),
                health_port: env::var("HEALTH_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }
}
