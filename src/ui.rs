//! Terminal rendering.
//!
//! `Ui` picks between an indicatif spinner (interactive terminals) and plain
//! `==>` lines (pipes, CI, `--ui plain`). `TerminalView` is the `View` the
//! interactive client draws the session into; `StageGuard` times one-shot
//! steps for the headless tools.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

use crate::ingest::{InputKind, VisibleSurface};
use crate::presentation::{ActivityRow, Metric, View};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
    disable_pretty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool, disable_pretty: bool) -> Self {
        Self {
            mode,
            is_tty,
            disable_pretty,
        }
    }

    pub fn from_args(ui_flag: Option<&str>, is_tty: bool, disable_pretty: bool) -> Self {
        let mode = match ui_flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        };
        Self::new(mode, is_tty, disable_pretty)
    }

    pub fn use_pretty(&self) -> bool {
        self.is_tty
            && match self.mode {
                UiMode::Pretty => true,
                UiMode::Auto => !self.disable_pretty,
                UiMode::Plain => false,
            }
    }

    pub fn stage(&self, name: &str) -> StageGuard {
        if self.use_pretty() {
            let spinner = spinner(&format!("{name}…"));
            StageGuard::new(name.to_string(), Some(spinner))
        } else {
            eprintln!("==> {}", name);
            StageGuard::new(name.to_string(), None)
        }
    }
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_draw_target(ProgressDrawTarget::stderr());
    spinner.enable_steady_tick(Duration::from_millis(120));
    let style = ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner
}

pub struct StageGuard {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
}

impl StageGuard {
    fn new(name: String, spinner: Option<ProgressBar>) -> Self {
        Self {
            name,
            start: Instant::now(),
            spinner,
        }
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let message = format!("✔ {} ({})", self.name, format_duration(elapsed));
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(message);
        } else {
            eprintln!("{message}");
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

// ----------------------------------------------------------------------------
// Session view
// ----------------------------------------------------------------------------

/// Draws the session to stderr. While processing in pretty mode a spinner
/// carries the latest pose label and metrics; otherwise each change is a line.
/// The activity feed is always printed as a line, above the spinner if any.
pub struct TerminalView {
    pretty: bool,
    spinner: Option<ProgressBar>,
    pose_label: String,
    metrics: [String; 4],
}

impl TerminalView {
    pub fn new(ui: &Ui) -> Self {
        Self {
            pretty: ui.use_pretty(),
            spinner: None,
            pose_label: String::new(),
            metrics: Metric::ALL.map(|metric| metric.format(0.0)),
        }
    }

    fn summary(&self) -> String {
        let gauges = Metric::ALL
            .iter()
            .zip(self.metrics.iter())
            .map(|(metric, display)| format!("{} {}", metric, display))
            .collect::<Vec<_>>()
            .join(" | ");
        format!("{}  [{}]", self.pose_label, gauges)
    }

    fn line(&self, text: &str) {
        match &self.spinner {
            Some(spinner) => spinner.println(text),
            None => eprintln!("{}", text),
        }
    }
}

fn slot(metric: Metric) -> usize {
    match metric {
        Metric::Fps => 0,
        Metric::Confidence => 1,
        Metric::Latency => 2,
        Metric::Persons => 3,
    }
}

/// One-line rendering of the activity feed.
fn render_rows(rows: &[ActivityRow]) -> String {
    rows.iter()
        .map(|row| match row {
            ActivityRow::Placeholder(text) => text.to_string(),
            ActivityRow::Entry {
                name,
                confidence_label,
                ..
            } => format!("{} {}", name, confidence_label),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl View for TerminalView {
    fn show_status(&mut self, message: &str) {
        self.line(&format!("==> {}", message));
    }

    fn show_pose_label(&mut self, label: &str) {
        self.pose_label = label.to_string();
        match &self.spinner {
            Some(spinner) => spinner.set_message(self.summary()),
            None if !self.pretty => eprintln!("    pose: {}", label),
            None => {}
        }
    }

    fn show_metric(&mut self, metric: Metric, display: &str) {
        self.metrics[slot(metric)] = display.to_string();
        if let Some(spinner) = &self.spinner {
            spinner.set_message(self.summary());
        } else if !self.pretty {
            eprintln!("    {}: {}", metric, display);
        }
    }

    fn show_activities(&mut self, rows: &[ActivityRow]) {
        self.line(&format!("    recent: {}", render_rows(rows)));
    }

    fn show_processing(&mut self, processing: bool) {
        if processing {
            if self.pretty && self.spinner.is_none() {
                self.spinner = Some(spinner(&self.summary()));
            }
        } else if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn show_active_input(&mut self, kind: InputKind) {
        log::debug!("active input: {}", kind);
    }

    fn show_surface(&mut self, surface: VisibleSurface) {
        log::debug!("visible surface: {:?}", surface);
    }
}

impl Drop for TerminalView {
    fn drop(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::activity::NO_ACTIVITIES_TEXT;

    #[test]
    fn pretty_requires_a_terminal() {
        assert!(!Ui::from_args(Some("pretty"), false, false).use_pretty());
        assert!(Ui::from_args(Some("pretty"), true, true).use_pretty());
        assert!(!Ui::from_args(None, true, true).use_pretty());
        assert!(!Ui::from_args(Some("plain"), true, false).use_pretty());
    }

    #[test]
    fn durations_switch_units_at_one_second() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }

    #[test]
    fn feed_rows_render_on_one_line() {
        let rows = [
            ActivityRow::Entry {
                name: "Running".to_string(),
                icon: "fa-running".to_string(),
                confidence_label: "85%".to_string(),
                bar_width: 85.0,
            },
            ActivityRow::Entry {
                name: "Standing".to_string(),
                icon: "fa-user".to_string(),
                confidence_label: "68%".to_string(),
                bar_width: 68.0,
            },
        ];
        assert_eq!(render_rows(&rows), "Running 85%, Standing 68%");
        assert_eq!(
            render_rows(&[ActivityRow::Placeholder(NO_ACTIVITIES_TEXT)]),
            NO_ACTIVITIES_TEXT
        );
    }

    #[test]
    fn pretty_view_prints_feed_without_a_spinner() {
        let mut view = TerminalView::new(&Ui::new(UiMode::Pretty, true, false));
        assert!(view.pretty);
        view.show_activities(&[ActivityRow::Placeholder(NO_ACTIVITIES_TEXT)]);
        view.show_processing(true);
        assert!(view.spinner.is_some());
        view.show_activities(&[ActivityRow::Placeholder(NO_ACTIVITIES_TEXT)]);
        view.show_processing(false);
        assert!(view.spinner.is_none());
    }

    #[test]
    fn plain_view_tracks_latest_readings() {
        let mut view = TerminalView::new(&Ui::new(UiMode::Plain, false, false));
        view.show_pose_label("Running (85.0%)");
        view.show_metric(Metric::Confidence, "85.0%");
        view.show_processing(true);
        assert!(view.spinner.is_none());
        assert!(view.summary().starts_with("Running (85.0%)"));
        assert!(view.summary().contains("confidence 85.0%"));
    }
}
