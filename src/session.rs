//! Session orchestration.
//!
//! The `Session` is the single process-wide orchestration instance. It
//! composes the source manager, the inference client and the presentation
//! state, and owns the processing state machine:
//!
//! - `Idle` -> `Running` via `start()`. Webcam and video arm a periodic cycle
//!   timer; a still image is captured and submitted exactly once.
//! - `Running` -> `Idle` via `stop()`, `reset()`, a source switch, or a failed
//!   submission.
//!
//! Every cycle tick carries the generation it was started under. `stop()`
//! bumps the generation, so a response that arrives after its cycle was
//! cancelled is dropped instead of being applied.
//!
//! The session MUST NOT:
//! - Hold more than one cycle timer
//! - Tick while `Idle`
//! - Let an error escape without routing it through the status surface

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::time::{Duration, Instant};

use crate::catalog;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::frame::Frame;
use crate::inference::{HistoryRecord, InferenceClient, PredictionResult};
use crate::ingest::{InputKind, SourceManager, VisibleSurface};
use crate::presentation::{
    ActivityFeed, Metric, Metrics, SessionSnapshot, View, IDLE_POSE_LABEL,
};

/// Synthetic fps estimate: `FPS_BASE + U * FPS_SPREAD`.
const FPS_BASE: f64 = 0.8;
const FPS_SPREAD: f64 = 0.4;
/// Synthetic latency estimate in ms: `LATENCY_BASE_MS + U * LATENCY_SPREAD_MS`.
const LATENCY_BASE_MS: f64 = 300.0;
const LATENCY_SPREAD_MS: f64 = 400.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessingState {
    Idle,
    Running,
}

/// Ticket for one capture-and-submit cycle.
#[derive(Debug)]
pub struct Tick {
    generation: u64,
    started_at: Instant,
}

impl Tick {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

#[derive(Clone, Copy, Debug)]
struct CycleTimer {
    interval: Duration,
    next_due: Instant,
}

impl CycleTimer {
    fn armed(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_due: now + interval,
        }
    }

    /// True when due; advances to the next slot, skipping any that were missed.
    fn fire_if_due(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due += self.interval;
        if self.next_due <= now {
            self.next_due = now + self.interval;
        }
        true
    }
}

pub struct Session {
    capture_interval: Duration,
    history_limit: u32,
    sources: SourceManager,
    client: InferenceClient,
    view: Box<dyn View>,
    rng: Box<dyn RngCore>,
    state: ProcessingState,
    timer: Option<CycleTimer>,
    generation: u64,
    in_flight: Option<u64>,
    backend_online: bool,
    metrics: Metrics,
    activity: ActivityFeed,
    pose_label: String,
    status: String,
}

impl Session {
    pub fn new(
        config: &ClientConfig,
        sources: SourceManager,
        client: InferenceClient,
        view: Box<dyn View>,
    ) -> Self {
        let mut session = Self {
            capture_interval: config.capture_interval,
            history_limit: config.history_limit,
            sources,
            client,
            view,
            rng: Box::new(StdRng::from_entropy()),
            state: ProcessingState::Idle,
            timer: None,
            generation: 0,
            in_flight: None,
            backend_online: false,
            metrics: Metrics::new(),
            activity: ActivityFeed::new(),
            pose_label: IDLE_POSE_LABEL.to_string(),
            status: String::new(),
        };
        session.render_initial();
        session
    }

    /// Replace the jitter source for the synthetic fps/latency estimates.
    pub fn with_rng(mut self, rng: Box<dyn RngCore>) -> Self {
        self.rng = rng;
        self
    }

    fn render_initial(&mut self) {
        self.view.show_processing(false);
        self.view.show_active_input(self.sources.active());
        self.view.show_surface(VisibleSurface::Placeholder);
        self.view.show_pose_label(&self.pose_label);
        for (metric, display) in self.metrics.reset() {
            self.view.show_metric(metric, &display);
        }
        self.view.show_activities(&self.activity.rows());
    }

    // -------------------- Accessors --------------------

    pub fn state(&self) -> ProcessingState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ProcessingState::Running
    }

    pub fn active_input(&self) -> InputKind {
        self.sources.active()
    }

    pub fn backend_online(&self) -> bool {
        self.backend_online
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn pose_label(&self) -> &str {
        &self.pose_label
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn activity(&self) -> &ActivityFeed {
        &self.activity
    }

    pub fn sources(&self) -> &SourceManager {
        &self.sources
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// Time left until the next cycle tick, if a cycle is armed.
    pub fn time_until_next_tick(&self, now: Instant) -> Option<Duration> {
        self.timer
            .map(|timer| timer.next_due.saturating_duration_since(now))
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
        log::info!("status: {}", self.status);
        self.view.show_status(&self.status);
    }

    // -------------------- Backend --------------------

    /// Check the backend once. The result gates `start()`; there is no retry.
    pub fn check_health(&mut self) -> bool {
        match self.client.check_health() {
            Ok(body) => {
                self.backend_online = true;
                if let Some(body) = body {
                    log::info!("health check success: {}", body);
                }
                self.set_status("Connected to backend");
            }
            Err(err) => {
                log::warn!("backend health check failed: {}", err);
                self.backend_online = false;
                self.set_status("Backend offline - cannot process");
            }
        }
        self.backend_online
    }

    /// Server-side prediction history; `None` uses the configured limit.
    pub fn fetch_history(&mut self, limit: Option<u32>) -> Result<Vec<HistoryRecord>, ClientError> {
        let limit = limit.unwrap_or(self.history_limit);
        match self.client.fetch_history(limit) {
            Ok(records) => {
                self.set_status(format!("Loaded {} history records", records.len()));
                Ok(records)
            }
            Err(err) => {
                log::warn!("history request failed: {}", err);
                self.set_status(format!("Could not load history - {}", err));
                Err(err)
            }
        }
    }

    // -------------------- Input sources --------------------

    /// Switch the active input kind, stopping first if running. Video and
    /// image prompt the file picker and load whatever it yields.
    pub fn select_source(&mut self, kind: InputKind) {
        if self.is_running() {
            self.stop();
        }
        self.sources.set_active(kind);
        self.view.show_active_input(kind);
        self.set_status(format!("Selected: {}", kind));

        match self.sources.pick_and_load() {
            Ok(Some(loaded)) => {
                self.view.show_surface(self.sources.visible_surface());
                let noun = match loaded.kind {
                    InputKind::Image => "Image",
                    _ => "Video",
                };
                self.set_status(format!(
                    "{} loaded ({}). Start processing to submit frames",
                    noun, loaded.name
                ));
            }
            Ok(None) => {}
            Err(err) => {
                log::warn!("loading {} failed: {}", kind, err);
                self.set_status(format!("Could not load {} - {}", kind, err));
            }
        }
    }

    // -------------------- Processing --------------------

    /// The start/stop button.
    pub fn toggle(&mut self, now: Instant) -> Result<(), ClientError> {
        if self.is_running() {
            self.stop();
            Ok(())
        } else {
            self.start(now)
        }
    }

    /// Enter `Running`. Refusals are already reported on the status surface
    /// when this returns `Err`.
    pub fn start(&mut self, now: Instant) -> Result<(), ClientError> {
        if self.is_running() {
            log::debug!("start ignored: already running");
            return Ok(());
        }
        if !self.backend_online {
            self.set_status("Backend offline - cannot start");
            return Err(ClientError::BackendOffline);
        }
        let kind = self.sources.active();
        if !kind.is_streaming() {
            return self.start_image(now);
        }
        if kind == InputKind::Webcam {
            self.start_webcam()?;
        } else {
            self.start_video()?;
        }
        self.timer = Some(CycleTimer::armed(self.capture_interval, now));
        Ok(())
    }

    fn start_webcam(&mut self) -> Result<(), ClientError> {
        if let Err(err) = self.sources.acquire_webcam() {
            log::error!("webcam error: {}", err);
            self.set_status("Webcam access denied");
            return Err(err);
        }
        self.view.show_surface(VisibleSurface::Video);
        self.enter_running();
        self.set_status("Processing webcam...");
        Ok(())
    }

    fn start_video(&mut self) -> Result<(), ClientError> {
        if self.sources.current_frame_surface().is_none() {
            self.set_status("No video loaded");
            return Err(ClientError::NoMediaLoaded(InputKind::Video));
        }
        self.sources.play_video();
        self.enter_running();
        self.set_status("Processing video...");
        Ok(())
    }

    fn start_image(&mut self, now: Instant) -> Result<(), ClientError> {
        if self.sources.current_frame_surface().is_none() {
            self.set_status("No image loaded");
            return Err(ClientError::NoMediaLoaded(InputKind::Image));
        }
        self.enter_running();
        self.set_status("Processing image...");
        // A still image is the whole job: one submission, no timer, no auto-stop.
        self.run_tick(now);
        Ok(())
    }

    fn enter_running(&mut self) {
        self.state = ProcessingState::Running;
        self.view.show_processing(true);
    }

    /// Leave `Running`: cancel the cycle, release the webcam, pause video.
    /// A no-op while idle.
    pub fn stop(&mut self) {
        if self.halt() {
            self.set_status("Stopped");
        }
    }

    /// Tear down the running cycle without touching the status surface.
    fn halt(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        log::info!("stopping processing");
        self.timer = None;
        self.sources.release_webcam();
        self.sources.pause_video();
        self.state = ProcessingState::Idle;
        self.in_flight = None;
        self.generation += 1;
        self.view.show_processing(false);
        true
    }

    /// Stop, then return every piece of presentation to its initial state.
    pub fn reset(&mut self) {
        log::info!("resetting session");
        self.stop();
        self.sources.release_webcam();
        self.sources.clear_media();
        self.view.show_surface(VisibleSurface::Placeholder);

        self.pose_label = IDLE_POSE_LABEL.to_string();
        self.view.show_pose_label(&self.pose_label);
        for (metric, display) in self.metrics.reset() {
            self.view.show_metric(metric, &display);
        }
        self.activity.reset();
        self.view.show_activities(&self.activity.rows());

        self.sources.set_active(InputKind::default());
        self.view.show_active_input(InputKind::default());
        self.set_status("System reset");
    }

    /// Page-unload teardown.
    pub fn shutdown(&mut self) {
        self.stop();
        self.sources.release_webcam();
        log::info!("session shut down");
    }

    // -------------------- Cycle --------------------

    /// Drive the cycle timer. Returns true when a tick fired.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        if !timer.fire_if_due(now) {
            return false;
        }
        self.run_tick(now);
        true
    }

    /// Capture, submit and apply one frame, stamped with the caller's clock.
    fn run_tick(&mut self, now: Instant) {
        if let Some((tick, frame)) = self.begin_tick(now) {
            let outcome = self.client.submit_frame(frame);
            self.complete_tick(tick, outcome);
        }
    }

    /// Capture a frame for a new tick. `None` when idle, when the previous
    /// submission of this generation is still in flight, or when the capture
    /// came back empty.
    pub fn begin_tick(&mut self, now: Instant) -> Option<(Tick, Frame)> {
        if !self.is_running() {
            return None;
        }
        if self.in_flight == Some(self.generation) {
            log::debug!("previous submission still in flight; skipping tick");
            return None;
        }
        match self.sources.capture_frame() {
            Ok(frame) => {
                self.in_flight = Some(self.generation);
                Some((
                    Tick {
                        generation: self.generation,
                        started_at: now,
                    },
                    frame,
                ))
            }
            Err(err) => {
                log::debug!("skipped tick: {}", err);
                None
            }
        }
    }

    /// Apply the outcome of a submission. Outcomes from a cancelled
    /// generation are dropped. Returns true when the outcome was applied.
    pub fn complete_tick(
        &mut self,
        tick: Tick,
        outcome: Result<PredictionResult, ClientError>,
    ) -> bool {
        if tick.generation != self.generation {
            log::debug!(
                "discarding response from cancelled cycle (generation {} != {})",
                tick.generation,
                self.generation
            );
            return false;
        }
        self.in_flight = None;
        match outcome {
            Ok(result) => {
                log::debug!(
                    "prediction {} ({:.3}) in {:?}",
                    result.prediction,
                    result.confidence,
                    tick.started_at.elapsed()
                );
                self.apply_prediction(&result);
            }
            Err(err) => {
                log::error!("frame submission failed: {}", err);
                // The error stays on the status surface instead of "Stopped".
                self.halt();
                self.set_status(format!("Error processing frame - {}", err));
            }
        }
        true
    }

    fn apply_prediction(&mut self, result: &PredictionResult) {
        let confidence_pct = result.confidence * 100.0;

        self.pose_label = format!("{} ({:.1}%)", result.prediction, confidence_pct);
        self.view.show_pose_label(&self.pose_label);

        let icon = catalog::activity_icon(&result.prediction);
        if let Err(reason) = self
            .activity
            .append(&result.prediction, icon, Some(confidence_pct))
        {
            log::debug!("activity not recorded: {:?}", reason);
        }
        self.view.show_activities(&self.activity.rows());

        self.update_metric(Metric::Confidence, confidence_pct);
        self.update_metric(Metric::Persons, result.person_count as f64);

        if result.has_keypoints() {
            log::debug!("prediction carried {} keypoints", result.keypoint_count());
        }

        // Simulated, not measured.
        let fps = FPS_BASE + self.rng.gen::<f64>() * FPS_SPREAD;
        self.update_metric(Metric::Fps, fps);
        let latency = LATENCY_BASE_MS + self.rng.gen::<f64>() * LATENCY_SPREAD_MS;
        self.update_metric(Metric::Latency, latency);
    }

    fn update_metric(&mut self, metric: Metric, raw: f64) {
        let display = self.metrics.update(metric, raw);
        self.view.show_metric(metric, &display);
    }

    // -------------------- Export --------------------

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            model: catalog::default_model().name.to_string(),
            metrics: self.metrics.snapshot(),
            activities: self.activity.history().to_vec(),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.sources.release_webcam();
    }
}
