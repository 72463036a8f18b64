#![allow(dead_code)]

use anyhow::{anyhow, Result};
use rand::rngs::mock::StepRng;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use image::{Rgb, RgbImage};
use tempfile::TempDir;

use neuralpose_client::ingest::{CaptureStream, MediaCaptureProvider, QueuedFilePicker};
use neuralpose_client::inference::{HttpClient, HttpRequest, HttpResponse, Method};
use neuralpose_client::{
    ActivityRow, ClientConfig, ClientError, Frame, InferenceClient, InputKind, Metric, Session,
    SourceManager, View, VisibleSurface,
};

pub const PREDICT_URL: &str = "http://127.0.0.1:8000/predict";
pub const HEALTH_URL: &str = "http://127.0.0.1:8000/health";

pub fn prediction_json(prediction: &str, confidence: f64, persons: u32) -> String {
    format!(
        r#"{{"id":1,"input_data":"frame.jpg","prediction":"{}","confidence":{},"person_count":{},"created_at":"2024-05-01T12:00:00","keypoints":[]}}"#,
        prediction, confidence, persons
    )
}

// ----------------------------------------------------------------------------
// HTTP
// ----------------------------------------------------------------------------

/// Scripted transport. Requests are answered in order; once the script runs
/// out, health answers 200 and predict answers with `fallback`.
#[derive(Clone, Default)]
pub struct FakeHttp {
    script: Rc<RefCell<VecDeque<Result<HttpResponse, String>>>>,
    fallback: Rc<RefCell<Option<HttpResponse>>>,
    requests: Rc<RefCell<Vec<HttpRequest>>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: u16, body: &str) -> &Self {
        self.script.borrow_mut().push_back(Ok(HttpResponse {
            status,
            body: body.as_bytes().to_vec(),
        }));
        self
    }

    pub fn fail(&self, cause: &str) -> &Self {
        self.script.borrow_mut().push_back(Err(cause.to_string()));
        self
    }

    pub fn always(&self, status: u16, body: &str) {
        *self.fallback.borrow_mut() = Some(HttpResponse {
            status,
            body: body.as_bytes().to_vec(),
        });
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn count(&self, method: Method, url: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|request| request.method == method && request.url == url)
            .count()
    }

    pub fn predict_calls(&self) -> usize {
        self.count(Method::Post, PREDICT_URL)
    }
}

impl HttpClient for FakeHttp {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let is_health = request.url == HEALTH_URL;
        self.requests.borrow_mut().push(request);
        if let Some(next) = self.script.borrow_mut().pop_front() {
            return next.map_err(|cause| anyhow!(cause));
        }
        if is_health {
            return Ok(HttpResponse {
                status: 200,
                body: br#"{"status":"healthy"}"#.to_vec(),
            });
        }
        self.fallback
            .borrow()
            .clone()
            .ok_or_else(|| anyhow!("no scripted response"))
    }
}

// ----------------------------------------------------------------------------
// Capture devices
// ----------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct FakeCamera {
    pub deny: Rc<Cell<bool>>,
    pub opened: Rc<Cell<u32>>,
    pub stopped: Rc<Cell<u32>>,
    pub grabs: Rc<Cell<u32>>,
}

impl FakeCamera {
    pub fn live(&self) -> u32 {
        self.opened.get() - self.stopped.get()
    }
}

struct FakeStream {
    camera: FakeCamera,
    live: bool,
}

impl CaptureStream for FakeStream {
    fn label(&self) -> &str {
        "fake camera"
    }

    fn dimensions(&self) -> (u32, u32) {
        if self.live {
            (64, 48)
        } else {
            (0, 0)
        }
    }

    fn grab(&mut self) -> Result<Frame> {
        self.camera.grabs.set(self.camera.grabs.get() + 1);
        Ok(Frame::from_jpeg(vec![0xFF, 0xD8, 0xFF, 0xD9], 64, 48))
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.camera.stopped.set(self.camera.stopped.get() + 1);
        }
    }
}

impl MediaCaptureProvider for FakeCamera {
    fn open(&mut self) -> Result<Box<dyn CaptureStream>, ClientError> {
        if self.deny.get() {
            return Err(ClientError::DeviceAccess("NotAllowedError".to_string()));
        }
        self.opened.set(self.opened.get() + 1);
        Ok(Box::new(FakeStream {
            camera: self.clone(),
            live: true,
        }))
    }
}

// ----------------------------------------------------------------------------
// View
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ViewLog {
    pub statuses: Vec<String>,
    pub pose_labels: Vec<String>,
    pub metrics: HashMap<Metric, String>,
    pub activities: Vec<ActivityRow>,
    pub processing: Vec<bool>,
    pub inputs: Vec<InputKind>,
    pub surfaces: Vec<VisibleSurface>,
    /// Every call, in order.
    pub trace: Vec<String>,
}

impl ViewLog {
    pub fn last_status(&self) -> &str {
        self.statuses.last().map(String::as_str).unwrap_or("")
    }

    pub fn processing(&self) -> bool {
        self.processing.last().copied().unwrap_or(false)
    }

    pub fn metric(&self, metric: Metric) -> &str {
        self.metrics.get(&metric).map(String::as_str).unwrap_or("")
    }

    pub fn activity_names(&self) -> Vec<String> {
        self.activities
            .iter()
            .map(|row| match row {
                ActivityRow::Placeholder(text) => text.to_string(),
                ActivityRow::Entry { name, .. } => name.clone(),
            })
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct RecordingView {
    pub log: Rc<RefCell<ViewLog>>,
}

impl View for RecordingView {
    fn show_status(&mut self, message: &str) {
        let mut log = self.log.borrow_mut();
        log.statuses.push(message.to_string());
        log.trace.push(format!("status:{}", message));
    }

    fn show_pose_label(&mut self, label: &str) {
        let mut log = self.log.borrow_mut();
        log.pose_labels.push(label.to_string());
        log.trace.push("pose".to_string());
    }

    fn show_metric(&mut self, metric: Metric, display: &str) {
        let mut log = self.log.borrow_mut();
        log.metrics.insert(metric, display.to_string());
        log.trace.push(format!("metric:{}", metric));
    }

    fn show_activities(&mut self, rows: &[ActivityRow]) {
        let mut log = self.log.borrow_mut();
        log.activities = rows.to_vec();
        log.trace.push("activities".to_string());
    }

    fn show_processing(&mut self, processing: bool) {
        let mut log = self.log.borrow_mut();
        log.processing.push(processing);
        log.trace.push(format!("processing:{}", processing));
    }

    fn show_active_input(&mut self, kind: InputKind) {
        let mut log = self.log.borrow_mut();
        log.inputs.push(kind);
        log.trace.push(format!("input:{}", kind));
    }

    fn show_surface(&mut self, surface: VisibleSurface) {
        let mut log = self.log.borrow_mut();
        log.surfaces.push(surface);
        log.trace.push(format!("surface:{:?}", surface));
    }
}

// ----------------------------------------------------------------------------
// Media fixtures
// ----------------------------------------------------------------------------

fn gradient(width: u32, height: u32, shift: u8) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x as u8).wrapping_add(shift), y as u8, shift])
    })
}

pub fn write_png(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    gradient(32, 24, 0).save(&path)?;
    Ok(path)
}

/// Concatenated JPEG frames, which is what an `.mjpeg` file holds.
pub fn write_mjpeg(dir: &Path, name: &str, frames: u8) -> Result<PathBuf> {
    let mut bytes = Vec::new();
    for shift in 0..frames {
        bytes.extend(Frame::encode_rgb(&gradient(32, 24, shift * 40))?.into_bytes());
    }
    let path = dir.join(name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

// ----------------------------------------------------------------------------
// Harness
// ----------------------------------------------------------------------------

pub struct Harness {
    pub session: Session,
    pub http: FakeHttp,
    pub camera: FakeCamera,
    pub picker: QueuedFilePicker,
    pub view: Rc<RefCell<ViewLog>>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new() -> Result<Self> {
        let config = ClientConfig {
            capture_interval: Duration::from_millis(1000),
            ..ClientConfig::default()
        };
        let http = FakeHttp::new();
        let camera = FakeCamera::default();
        let picker = QueuedFilePicker::new();
        let view = RecordingView::default();
        let sources = SourceManager::new(Box::new(camera.clone()), Box::new(picker.clone()));
        let client = InferenceClient::new(&config, Box::new(http.clone()));
        // StepRng(0, 0) makes every uniform draw 0.0.
        let session = Session::new(&config, sources, client, Box::new(view.clone()))
            .with_rng(Box::new(StepRng::new(0, 0)));
        Ok(Self {
            session,
            http,
            camera,
            picker,
            view: view.log,
            dir: tempfile::tempdir()?,
        })
    }

    pub fn log(&self) -> std::cell::Ref<'_, ViewLog> {
        self.view.borrow()
    }

    /// Select video input and load a fresh MJPEG clip.
    pub fn load_video(&mut self) -> Result<()> {
        let path = write_mjpeg(self.dir.path(), "walk.mjpeg", 3)?;
        self.picker.queue(path);
        self.session.select_source(InputKind::Video);
        Ok(())
    }

    pub fn load_image(&mut self) -> Result<()> {
        let path = write_png(self.dir.path(), "pose.png")?;
        self.picker.queue(path);
        self.session.select_source(InputKind::Image);
        Ok(())
    }

    pub fn online(&mut self) -> Result<()> {
        if !self.session.check_health() {
            return Err(anyhow!("health check failed"));
        }
        Ok(())
    }
}
