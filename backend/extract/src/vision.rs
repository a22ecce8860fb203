//! Gemini vision client: receipt extraction and material classification.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use timbang_config::VisionSettings;
use timbang_core::{ExtractionError, ExtractionResult, RetryPolicy, VisionModel};
use tracing::{debug, info, warn};

use crate::prompts;

/// Base confidence when the model omits its self-reported score: exactly at
/// the default acceptance threshold, so any quality penalty rejects.
const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Weight slack (tons) used only for the confidence penalty; the hard
/// validation tolerance lives in the pipeline gate.
const WEIGHT_SLACK: f64 = 0.5;

/// Client for a Gemini `generateContent` endpoint.
///
/// One instance per process, constructed at startup and shared behind
/// `Arc<dyn VisionModel>`.
pub struct GeminiVision {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl GeminiVision {
    pub fn new(settings: &VisionSettings) -> Self {
        Self {
            client: Client::new(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(settings.timeout_secs),
            retry: settings.retry.clone(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// One `generateContent` call; returns the first candidate's text.
    async fn generate_once(&self, body: &serde_json::Value) -> Result<String, ExtractionError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| ExtractionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Status { status: status.as_u16(), body });
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ExtractionError::Malformed(e.to_string()))?;

        value["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| ExtractionError::Malformed("response has no candidate text".into()))
    }

    /// Retry transient upstream failures with backoff; malformed responses
    /// and 4xx statuses are returned immediately.
    async fn generate(&self, body: &serde_json::Value) -> Result<String, ExtractionError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.generate_once(body).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_transient() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Vision call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Receipt fields as the model reports them.
#[derive(Debug, Deserialize)]
struct RawReceipt {
    #[serde(default)]
    receipt_number: String,
    #[serde(default)]
    scale_number: String,
    #[serde(default)]
    weighing_datetime: String,
    #[serde(default)]
    vehicle_number: String,
    #[serde(default)]
    material_name: String,
    #[serde(default)]
    gross_weight: f64,
    #[serde(default)]
    empty_weight: f64,
    #[serde(default)]
    net_weight: f64,
    confidence_score: Option<f64>,
}

/// Final confidence: the model's self-reported score (or a conservative
/// base) degraded by quality heuristics on the extracted fields.
fn derive_confidence(raw: &RawReceipt) -> f64 {
    let mut confidence = raw.confidence_score.unwrap_or(FALLBACK_CONFIDENCE);

    let calculated_net = raw.gross_weight - raw.empty_weight;
    if (calculated_net - raw.net_weight).abs() > WEIGHT_SLACK {
        confidence *= 0.7;
    }
    if raw.receipt_number.chars().count() < 5 {
        confidence *= 0.8;
    }
    if raw.material_name.chars().count() < 3 {
        confidence *= 0.7;
    }
    if raw.vehicle_number.chars().count() < 4 {
        confidence *= 0.8;
    }

    confidence.clamp(0.0, 1.0)
}

#[async_trait]
impl VisionModel for GeminiVision {
    async fn extract_receipt(
        &self,
        image: &Bytes,
        mime_type: &str,
    ) -> Result<ExtractionResult, ExtractionError> {
        let b64 = STANDARD.encode(image);
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": format!("{}\n\n{}", prompts::EXTRACTION_SYSTEM, prompts::EXTRACTION_PROMPT) },
                    { "inlineData": { "mimeType": mime_type, "data": b64 } }
                ]
            }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        let text = self.generate(&body).await?;
        debug!(response = %text, "Vision extraction response");

        let raw: RawReceipt = serde_json::from_str(&text)
            .map_err(|e| ExtractionError::Malformed(format!("{e}: {text}")))?;

        let confidence = derive_confidence(&raw);
        let result = ExtractionResult {
            receipt_number: raw.receipt_number,
            scale_number: raw.scale_number,
            weighing_datetime: raw.weighing_datetime,
            vehicle_number: raw.vehicle_number,
            material_name: raw.material_name,
            gross_weight: raw.gross_weight,
            empty_weight: raw.empty_weight,
            net_weight: raw.net_weight,
            confidence,
        };
        info!(
            receipt = %result.receipt_number,
            material = %result.material_name,
            net = result.net_weight,
            confidence = format!("{confidence:.2}"),
            "Extracted delivery receipt"
        );
        Ok(result)
    }

    async fn classify_material(&self, material_name: &str) -> Result<String, ExtractionError> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": format!(
                        "{}\n\n{}",
                        prompts::CATEGORIZATION_SYSTEM,
                        prompts::categorization_prompt(material_name)
                    ) }
                ]
            }],
            "generationConfig": { "temperature": 0.1 }
        });

        self.generate(&body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(confidence: Option<f64>) -> RawReceipt {
        RawReceipt {
            receipt_number: "A125BD00183725122415O1".into(),
            scale_number: "T21".into(),
            weighing_datetime: "2025-12-24 15:23:34".into(),
            vehicle_number: "B9683TVX".into(),
            material_name: "BATU PECAH 1/2 石子".into(),
            gross_weight: 23.29,
            empty_weight: 8.05,
            net_weight: 15.24,
            confidence_score: confidence,
        }
    }

    #[test]
    fn clean_receipt_keeps_reported_confidence() {
        assert_eq!(derive_confidence(&raw(Some(0.95))), 0.95);
    }

    #[test]
    fn missing_score_falls_back_conservatively() {
        assert_eq!(derive_confidence(&raw(None)), FALLBACK_CONFIDENCE);
    }

    #[test]
    fn weight_mismatch_penalizes() {
        let mut r = raw(Some(1.0));
        r.net_weight = 14.0;
        let c = derive_confidence(&r);
        assert!((c - 0.7).abs() < 1e-9);
    }

    #[test]
    fn short_fields_stack_penalties() {
        let mut r = raw(Some(1.0));
        r.receipt_number = "A1".into();
        r.vehicle_number = "B1".into();
        let c = derive_confidence(&r);
        assert!((c - 0.8 * 0.8).abs() < 1e-9);
    }

    #[test]
    fn unreadable_receipt_scores_near_zero() {
        let r = RawReceipt {
            receipt_number: String::new(),
            scale_number: String::new(),
            weighing_datetime: String::new(),
            vehicle_number: String::new(),
            material_name: String::new(),
            gross_weight: 0.0,
            empty_weight: 0.0,
            net_weight: 0.0,
            confidence_score: None,
        };
        assert!(derive_confidence(&r) < 0.25);
    }

    #[test]
    fn receipt_json_parses_without_confidence() {
        let text = r#"{
            "receipt_number": "N1234567",
            "scale_number": "T2",
            "weighing_datetime": "2025-12-24 15:23:34",
            "vehicle_number": "B9683TVX",
            "material_name": "PASIR",
            "gross_weight": 20.5,
            "empty_weight": 8.0,
            "net_weight": 12.5
        }"#;
        let parsed: RawReceipt = serde_json::from_str(text).unwrap();
        assert_eq!(parsed.confidence_score, None);
        assert_eq!(parsed.net_weight, 12.5);
    }
}
