//! Inference client.
//!
//! Talks to the remote activity-recognition service:
//! - `GET  {base}/health`  marks the backend online on any 2xx
//! - `POST {base}/predict` uploads one frame as multipart field `file`
//! - `GET  {base}/history` lists recent server-side predictions
//!
//! Every failure comes back as `ClientError::InferenceRequest` carrying the
//! HTTP status when the server answered. The client never retries.

use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::frame::{Frame, FRAME_CONTENT_TYPE, FRAME_FILENAME};

pub mod http;
pub mod multipart;

pub use http::{HttpClient, HttpRequest, HttpResponse, Method, UreqHttpClient};

/// Multipart field the frame bytes are uploaded under.
pub const FRAME_FIELD: &str = "file";

/// Decoded `/predict` response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: String,
    /// Nominally in [0, 1].
    pub confidence: f64,
    pub person_count: u32,
    /// Pose data; only its presence matters here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypoints: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl PredictionResult {
    pub fn has_keypoints(&self) -> bool {
        match &self.keypoints {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Array(points)) => !points.is_empty(),
            Some(_) => true,
        }
    }

    pub fn keypoint_count(&self) -> usize {
        match &self.keypoints {
            Some(serde_json::Value::Array(points)) => points.len(),
            _ => 0,
        }
    }
}

/// One row of `/history`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub input_data: String,
    pub prediction: String,
    pub confidence: f64,
    pub created_at: String,
}

pub struct InferenceClient {
    predict_url: String,
    health_url: String,
    history_url: String,
    http: Box<dyn HttpClient>,
}

impl InferenceClient {
    pub fn new(config: &ClientConfig, http: Box<dyn HttpClient>) -> Self {
        Self {
            predict_url: config.endpoint_url(&config.endpoints.predict),
            health_url: config.endpoint_url(&config.endpoints.health),
            history_url: config.endpoint_url(&config.endpoints.history),
            http,
        }
    }

    /// Client over the production `ureq` transport, honoring the configured timeout.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config, Box::new(UreqHttpClient::new(config.request_timeout)))
    }

    pub fn predict_url(&self) -> &str {
        &self.predict_url
    }

    /// Query the health endpoint. The body, when it is JSON, is informational.
    pub fn check_health(&self) -> Result<Option<serde_json::Value>, ClientError> {
        log::info!("checking backend health at {}", self.health_url);
        let response = self
            .http
            .send(HttpRequest::get(&self.health_url))
            .map_err(|e| ClientError::transport(format!("{:#}", e)))?;
        if !response.is_success() {
            return Err(ClientError::http_status(response.status, &response.body));
        }
        Ok(serde_json::from_slice(&response.body).ok())
    }

    /// Upload one frame and decode the prediction.
    pub fn submit_frame(&self, frame: Frame) -> Result<PredictionResult, ClientError> {
        let form = multipart::encode_file_part(
            FRAME_FIELD,
            FRAME_FILENAME,
            FRAME_CONTENT_TYPE,
            &frame.into_bytes(),
        );
        log::debug!(
            "sending frame to {} ({} byte body)",
            self.predict_url,
            form.body.len()
        );
        let response = self
            .http
            .send(HttpRequest::post(&self.predict_url, form.content_type, form.body))
            .map_err(|e| ClientError::transport(format!("{:#}", e)))?;
        log::debug!("predict response status {}", response.status);
        if !response.is_success() {
            return Err(ClientError::http_status(response.status, &response.body));
        }
        serde_json::from_slice(&response.body).map_err(|e| ClientError::InferenceRequest {
            status: Some(response.status),
            detail: format!("invalid prediction body: {}", e),
        })
    }

    /// Most recent server-side predictions, oldest first.
    pub fn fetch_history(&self, limit: u32) -> Result<Vec<HistoryRecord>, ClientError> {
        let url = format!("{}?limit={}", self.history_url, limit);
        let response = self
            .http
            .send(HttpRequest::get(&url))
            .map_err(|e| ClientError::transport(format!("{:#}", e)))?;
        if !response.is_success() {
            return Err(ClientError::http_status(response.status, &response.body));
        }
        serde_json::from_slice(&response.body).map_err(|e| ClientError::InferenceRequest {
            status: Some(response.status),
            detail: format!("invalid history body: {}", e),
        })
    }
}
