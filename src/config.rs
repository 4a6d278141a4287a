use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

const DEFAULT_DETECT_URL: &str = "http://127.0.0.1:8000/api/v1/detect";
const DEFAULT_ATTENDANCE_BASE_URL: &str = "http://127.0.0.1:8000/api/v1";
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
const DEFAULT_CAMERA_DEVICE: &str = "stub://classroom";
const DEFAULT_CAMERA_INDEX: usize = 0;
const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;
const DEFAULT_CAMERA_FPS: u32 = 10;

#[derive(Debug, Deserialize, Default)]
struct HeadcountConfigFile {
    detect: Option<DetectConfigFile>,
    attendance: Option<AttendanceConfigFile>,
    camera: Option<CameraConfigFile>,
    auth: Option<AuthConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectConfigFile {
    url: Option<String>,
    poll_interval_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    failure_threshold: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct AttendanceConfigFile {
    base_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    index: Option<usize>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct AuthConfigFile {
    url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HeadcountConfig {
    pub detect: DetectSettings,
    pub attendance: AttendanceSettings,
    pub camera: CameraSettings,
    pub auth: Option<AuthSettings>,
}

#[derive(Debug, Clone)]
pub struct DetectSettings {
    pub url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub failure_threshold: u32,
}

#[derive(Debug, Clone)]
pub struct AttendanceSettings {
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Device scheme: `stub://...` for the synthetic backend, a `/dev/...`
    /// path for V4L2 (feature `capture-v4l2`).
    pub device: String,
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub url: String,
}

impl HeadcountConfig {
    /// Load from the file named by `HEADCOUNT_CONFIG` (JSON), apply
    /// `HEADCOUNT_*` env overrides, then validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("HEADCOUNT_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: HeadcountConfigFile) -> Self {
        let detect = DetectSettings {
            url: file
                .detect
                .as_ref()
                .and_then(|d| d.url.clone())
                .unwrap_or_else(|| DEFAULT_DETECT_URL.to_string()),
            poll_interval: Duration::from_millis(
                file.detect
                    .as_ref()
                    .and_then(|d| d.poll_interval_ms)
                    .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
            request_timeout: Duration::from_secs(
                file.detect
                    .as_ref()
                    .and_then(|d| d.request_timeout_secs)
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            failure_threshold: file
                .detect
                .as_ref()
                .and_then(|d| d.failure_threshold)
                .unwrap_or(DEFAULT_FAILURE_THRESHOLD),
        };
        let attendance = AttendanceSettings {
            base_url: file
                .attendance
                .as_ref()
                .and_then(|a| a.base_url.clone())
                .unwrap_or_else(|| DEFAULT_ATTENDANCE_BASE_URL.to_string()),
        };
        let camera = CameraSettings {
            device: file
                .camera
                .as_ref()
                .and_then(|c| c.device.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_DEVICE.to_string()),
            index: file
                .camera
                .as_ref()
                .and_then(|c| c.index)
                .unwrap_or(DEFAULT_CAMERA_INDEX),
            width: file
                .camera
                .as_ref()
                .and_then(|c| c.width)
                .unwrap_or(DEFAULT_CAMERA_WIDTH),
            height: file
                .camera
                .as_ref()
                .and_then(|c| c.height)
                .unwrap_or(DEFAULT_CAMERA_HEIGHT),
            target_fps: file
                .camera
                .as_ref()
                .and_then(|c| c.target_fps)
                .unwrap_or(DEFAULT_CAMERA_FPS),
        };
        let auth = file
            .auth
            .and_then(|a| a.url)
            .map(|url| AuthSettings { url });
        Self {
            detect,
            attendance,
            camera,
            auth,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("HEADCOUNT_DETECT_URL") {
            if !url.trim().is_empty() {
                self.detect.url = url;
            }
        }
        if let Ok(url) = std::env::var("HEADCOUNT_ATTENDANCE_URL") {
            if !url.trim().is_empty() {
                self.attendance.base_url = url;
            }
        }
        if let Ok(device) = std::env::var("HEADCOUNT_CAMERA_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(index) = std::env::var("HEADCOUNT_CAMERA_INDEX") {
            self.camera.index = index
                .parse()
                .map_err(|_| anyhow!("HEADCOUNT_CAMERA_INDEX must be an integer"))?;
        }
        if let Ok(interval) = std::env::var("HEADCOUNT_POLL_INTERVAL_MS") {
            let ms: u64 = interval
                .parse()
                .map_err(|_| anyhow!("HEADCOUNT_POLL_INTERVAL_MS must be an integer"))?;
            self.detect.poll_interval = Duration::from_millis(ms);
        }
        if let Ok(threshold) = std::env::var("HEADCOUNT_FAILURE_THRESHOLD") {
            self.detect.failure_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("HEADCOUNT_FAILURE_THRESHOLD must be an integer"))?;
        }
        if let Ok(url) = std::env::var("HEADCOUNT_AUTH_URL") {
            if !url.trim().is_empty() {
                self.auth = Some(AuthSettings { url });
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        Url::parse(&self.detect.url)
            .map_err(|e| anyhow!("invalid detect url '{}': {}", self.detect.url, e))?;
        Url::parse(&self.attendance.base_url).map_err(|e| {
            anyhow!(
                "invalid attendance base url '{}': {}",
                self.attendance.base_url,
                e
            )
        })?;
        if let Some(auth) = &self.auth {
            Url::parse(&auth.url).map_err(|e| anyhow!("invalid auth url '{}': {}", auth.url, e))?;
        }
        if self.detect.poll_interval.is_zero() {
            return Err(anyhow!("poll interval must be greater than zero"));
        }
        if self.detect.request_timeout.is_zero() {
            return Err(anyhow!("request timeout must be greater than zero"));
        }
        if self.detect.failure_threshold == 0 {
            return Err(anyhow!("failure threshold must be greater than zero"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera dimensions must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<HeadcountConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
