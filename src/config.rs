use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_PREDICT_PATH: &str = "/predict";
const DEFAULT_HEALTH_PATH: &str = "/health";
const DEFAULT_HISTORY_PATH: &str = "/history";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_CAPTURE_INTERVAL_MS: u64 = 1_000;
const DEFAULT_HISTORY_LIMIT: u32 = 50;
const DEFAULT_WEBCAM_DEVICE: &str = "stub://webcam";
const DEFAULT_WEBCAM_FPS: u32 = 10;
const DEFAULT_WEBCAM_WIDTH: u32 = 640;
const DEFAULT_WEBCAM_HEIGHT: u32 = 480;
const MAX_WEBCAM_DIMENSION: u32 = 8192;

#[derive(Debug, Deserialize, Default)]
struct ClientConfigFile {
    base_url: Option<String>,
    endpoints: Option<EndpointsConfigFile>,
    timeout_ms: Option<u64>,
    capture: Option<CaptureConfigFile>,
    history_limit: Option<u32>,
    webcam: Option<WebcamConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct EndpointsConfigFile {
    predict: Option<String>,
    health: Option<String>,
    history: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct WebcamConfigFile {
    device: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub endpoints: Endpoints,
    /// Applied to every request on the transport.
    pub request_timeout: Duration,
    /// Cadence of the capture-and-submit cycle for streaming sources.
    pub capture_interval: Duration,
    pub history_limit: u32,
    pub webcam: WebcamSettings,
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub predict: String,
    pub health: String,
    pub history: String,
}

#[derive(Debug, Clone)]
pub struct WebcamSettings {
    pub device: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoints: Endpoints {
                predict: DEFAULT_PREDICT_PATH.to_string(),
                health: DEFAULT_HEALTH_PATH.to_string(),
                history: DEFAULT_HISTORY_PATH.to_string(),
            },
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            capture_interval: Duration::from_millis(DEFAULT_CAPTURE_INTERVAL_MS),
            history_limit: DEFAULT_HISTORY_LIMIT,
            webcam: WebcamSettings {
                device: DEFAULT_WEBCAM_DEVICE.to_string(),
                target_fps: DEFAULT_WEBCAM_FPS,
                width: DEFAULT_WEBCAM_WIDTH,
                height: DEFAULT_WEBCAM_HEIGHT,
            },
        }
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("NEURALPOSE_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Full URL for an endpoint path, e.g. `endpoint_url("/health")`.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn from_file(file: ClientConfigFile) -> Self {
        let defaults = Self::default();
        let endpoints = file.endpoints.unwrap_or_default();
        let webcam = file.webcam.unwrap_or_default();
        Self {
            base_url: file.base_url.unwrap_or(defaults.base_url),
            endpoints: Endpoints {
                predict: endpoints.predict.unwrap_or(defaults.endpoints.predict),
                health: endpoints.health.unwrap_or(defaults.endpoints.health),
                history: endpoints.history.unwrap_or(defaults.endpoints.history),
            },
            request_timeout: file
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            capture_interval: file
                .capture
                .and_then(|capture| capture.interval_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.capture_interval),
            history_limit: file.history_limit.unwrap_or(defaults.history_limit),
            webcam: WebcamSettings {
                device: webcam.device.unwrap_or(defaults.webcam.device),
                target_fps: webcam.target_fps.unwrap_or(defaults.webcam.target_fps),
                width: webcam.width.unwrap_or(defaults.webcam.width),
                height: webcam.height.unwrap_or(defaults.webcam.height),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(base_url) = std::env::var("NEURALPOSE_BASE_URL") {
            if !base_url.trim().is_empty() {
                self.base_url = base_url.trim().to_string();
            }
        }
        if let Ok(timeout) = std::env::var("NEURALPOSE_TIMEOUT_MS") {
            let ms: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!("NEURALPOSE_TIMEOUT_MS must be an integer number of milliseconds")
            })?;
            self.request_timeout = Duration::from_millis(ms);
        }
        if let Ok(interval) = std::env::var("NEURALPOSE_CAPTURE_INTERVAL_MS") {
            let ms: u64 = interval.trim().parse().map_err(|_| {
                anyhow!("NEURALPOSE_CAPTURE_INTERVAL_MS must be an integer number of milliseconds")
            })?;
            self.capture_interval = Duration::from_millis(ms);
        }
        if let Ok(device) = std::env::var("NEURALPOSE_WEBCAM_DEVICE") {
            if !device.trim().is_empty() {
                self.webcam.device = device.trim().to_string();
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| anyhow!("invalid base_url '{}': {}", self.base_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "unsupported base_url scheme '{}'; expected http or https",
                url.scheme()
            ));
        }
        for (name, path) in [
            ("predict", &self.endpoints.predict),
            ("health", &self.endpoints.health),
            ("history", &self.endpoints.history),
        ] {
            if !path.starts_with('/') {
                return Err(anyhow!("{} endpoint must start with '/': {}", name, path));
            }
        }
        if self.request_timeout.is_zero() {
            return Err(anyhow!("request timeout must be greater than zero"));
        }
        if self.capture_interval.is_zero() {
            return Err(anyhow!("capture interval must be greater than zero"));
        }
        let (width, height) = (self.webcam.width, self.webcam.height);
        if !(1..=MAX_WEBCAM_DIMENSION).contains(&width)
            || !(1..=MAX_WEBCAM_DIMENSION).contains(&height)
        {
            return Err(anyhow!(
                "webcam resolution {}x{} out of range; each side must be 1..={}",
                width,
                height,
                MAX_WEBCAM_DIMENSION
            ));
        }
        if self.webcam.target_fps == 0 {
            return Err(anyhow!("webcam target_fps must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ClientConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.endpoint_url(&cfg.endpoints.health), "http://127.0.0.1:8000/health");
        assert_eq!(cfg.endpoint_url(&cfg.endpoints.predict), "http://127.0.0.1:8000/predict");
        assert_eq!(cfg.capture_interval, Duration::from_secs(1));
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn endpoint_url_tolerates_trailing_slash() {
        let cfg = ClientConfig {
            base_url: "http://pose.local:9000/".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(cfg.endpoint_url("/predict"), "http://pose.local:9000/predict");
    }

    #[test]
    fn rejects_non_http_base_url() {
        let cfg = ClientConfig {
            base_url: "ftp://pose.local".to_string(),
            ..ClientConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_capture_interval() {
        let cfg = ClientConfig {
            capture_interval: Duration::ZERO,
            ..ClientConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_webcam_resolution() {
        let mut cfg = ClientConfig::default();
        cfg.webcam.width = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = ClientConfig::default();
        cfg.webcam.width = 70_000;
        cfg.webcam.height = 70_000;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("70000x70000"));

        let mut cfg = ClientConfig::default();
        cfg.webcam.width = MAX_WEBCAM_DIMENSION;
        cfg.webcam.height = MAX_WEBCAM_DIMENSION;
        assert!(cfg.validate().is_ok());

        let mut cfg = ClientConfig::default();
        cfg.webcam.target_fps = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file: ClientConfigFile =
            toml::from_str("base_url = \"http://10.0.0.5:8000\"\n[capture]\ninterval_ms = 500\n")
                .unwrap();
        let cfg = ClientConfig::from_file(file);
        assert_eq!(cfg.base_url, "http://10.0.0.5:8000");
        assert_eq!(cfg.capture_interval, Duration::from_millis(500));
        assert_eq!(cfg.endpoints.history, "/history");
        assert_eq!(cfg.webcam.device, "stub://webcam");
    }
}
