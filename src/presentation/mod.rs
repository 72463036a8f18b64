//! Presentation state and the render surface.
//!
//! `Metrics` and `ActivityFeed` hold what is shown; `View` is where it is
//! drawn. The session pushes every change into the view imperatively, one
//! call per element, and keeps no other copy of the displayed text.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::ingest::{InputKind, VisibleSurface};

pub mod activity;
pub mod metrics;

pub use activity::{ActivityEntry, ActivityFeed, ActivityRow, RejectedActivity};
pub use metrics::{Metric, Metrics, MetricsSnapshot};

/// Label shown before any prediction has arrived.
pub const IDLE_POSE_LABEL: &str = "Select input & start processing";

pub trait View {
    /// The single status-message surface.
    fn show_status(&mut self, message: &str);

    fn show_pose_label(&mut self, label: &str);

    fn show_metric(&mut self, metric: Metric, display: &str);

    /// Replace the whole activity list.
    fn show_activities(&mut self, rows: &[ActivityRow]);

    /// Start/stop button face and processing indicator.
    fn show_processing(&mut self, processing: bool);

    /// Highlight the active input method.
    fn show_active_input(&mut self, kind: InputKind);

    fn show_surface(&mut self, surface: VisibleSurface);
}

/// View that draws nothing; for headless tools.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullView;

impl View for NullView {
    fn show_status(&mut self, _message: &str) {}
    fn show_pose_label(&mut self, _label: &str) {}
    fn show_metric(&mut self, _metric: Metric, _display: &str) {}
    fn show_activities(&mut self, _rows: &[ActivityRow]) {}
    fn show_processing(&mut self, _processing: bool) {}
    fn show_active_input(&mut self, _kind: InputKind) {}
    fn show_surface(&mut self, _surface: VisibleSurface) {}
}

/// Exported view of the session's presentation state.
#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    /// RFC 3339 export time.
    pub timestamp: String,
    pub model: String,
    pub metrics: MetricsSnapshot,
    pub activities: Vec<ActivityEntry>,
}

impl SessionSnapshot {
    /// Write the snapshot as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self).context("serialize session snapshot")?;
        std::fs::write(path, json).with_context(|| format!("write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_writes_pretty_json() -> Result<()> {
        let mut metrics = Metrics::new();
        metrics.update(Metric::Confidence, 64.0);
        let mut feed = ActivityFeed::new();
        feed.append("Walking", "fa-walking", Some(64.0))
            .map_err(|reason| anyhow::anyhow!("{:?}", reason))?;

        let snapshot = SessionSnapshot {
            timestamp: "2024-05-01T12:00:00+00:00".to_string(),
            model: "YOLOv8n Pose".to_string(),
            metrics: metrics.snapshot(),
            activities: feed.history().to_vec(),
        };
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("export.json");
        snapshot.write_json(&path)?;

        let raw = std::fs::read_to_string(&path)?;
        assert!(raw.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        assert_eq!(value["metrics"]["confidence"], 64.0);
        assert_eq!(value["activities"][0]["icon"], "fa-walking");
        Ok(())
    }

    #[test]
    fn null_view_accepts_every_call() {
        let mut view: Box<dyn View> = Box::new(NullView);
        view.show_status("Stopped");
        view.show_metric(Metric::Fps, "0.0");
        view.show_activities(&ActivityFeed::new().rows());
        view.show_surface(VisibleSurface::Placeholder);
    }
}
