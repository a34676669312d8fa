use serde::{Deserialize, Serialize};

/// One classification response from the prediction endpoint.
///
/// The upstream service is loose about its payload shape, so every field is
/// optional or defaulted; missing labels are dropped later at the
/// aggregation seam rather than rejected here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub predicted_label: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub top_k: Vec<TopPrediction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopPrediction {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub prob: f64,
}

impl Prediction {
    pub fn label(&self) -> &str {
        self.predicted_label.as_deref().unwrap_or_default()
    }

    pub fn confidence_or_zero(&self) -> f64 {
        self.confidence.unwrap_or(0.0)
    }
}
