//! Metric gauges.
//!
//! Four independent gauges, each clamped to its own range and formatted for
//! display. The stored value is always the clamped one, so display and
//! state never disagree.

use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    Fps,
    Confidence,
    Latency,
    Persons,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Fps,
        Metric::Confidence,
        Metric::Latency,
        Metric::Persons,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Fps => "fps",
            Metric::Confidence => "confidence",
            Metric::Latency => "latency",
            Metric::Persons => "persons",
        }
    }

    /// Clamp a raw reading into this gauge's range. NaN reads as zero.
    pub fn clamp(&self, raw: f64) -> f64 {
        let raw = if raw.is_nan() { 0.0 } else { raw };
        let clamped = match self {
            Metric::Fps => raw.clamp(0.0, 60.0),
            Metric::Confidence => raw.clamp(0.0, 100.0),
            Metric::Latency => raw.max(0.0),
            Metric::Persons => raw.clamp(0.0, 10.0),
        };
        // -0.0 would display as "-0"
        clamped + 0.0
    }

    /// Display text for an already clamped value.
    pub fn format(&self, value: f64) -> String {
        match self {
            Metric::Fps => format!("{:.1}", value),
            Metric::Confidence => format!("{:.1}%", value),
            Metric::Latency => format!("{}ms", value.round()),
            Metric::Persons => format!("{}", value.round()),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored gauge values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub fps: f64,
    pub confidence: f64,
    pub latency: f64,
    pub persons: f64,
}

#[derive(Clone, Debug)]
pub struct Metrics {
    values: MetricsSnapshot,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut metrics = Self {
            values: MetricsSnapshot::default(),
        };
        metrics.reset();
        metrics
    }

    /// Clamp, store, and return the display text for a raw reading.
    pub fn update(&mut self, metric: Metric, raw: f64) -> String {
        let value = metric.clamp(raw);
        *self.slot(metric) = value;
        metric.format(value)
    }

    /// Zero every gauge through `update`.
    pub fn reset(&mut self) -> Vec<(Metric, String)> {
        Metric::ALL
            .iter()
            .map(|metric| (*metric, self.update(*metric, 0.0)))
            .collect()
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Fps => self.values.fps,
            Metric::Confidence => self.values.confidence,
            Metric::Latency => self.values.latency,
            Metric::Persons => self.values.persons,
        }
    }

    pub fn display(&self, metric: Metric) -> String {
        metric.format(self.get(metric))
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.values
    }

    fn slot(&mut self, metric: Metric) -> &mut f64 {
        match metric {
            Metric::Fps => &mut self.values.fps,
            Metric::Confidence => &mut self.values.confidence,
            Metric::Latency => &mut self.values.latency,
            Metric::Persons => &mut self.values.persons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_is_clamped_both_ways() {
        let mut metrics = Metrics::new();
        metrics.update(Metric::Fps, -5.0);
        assert_eq!(metrics.get(Metric::Fps), 0.0);
        assert_eq!(metrics.update(Metric::Fps, 999.0), "60.0");
        assert_eq!(metrics.get(Metric::Fps), 60.0);
    }

    #[test]
    fn every_gauge_stays_in_range() {
        let mut metrics = Metrics::new();
        for raw in [f64::NEG_INFINITY, -1e9, -0.5, 0.0, 3.7, 55.0, 1e9, f64::INFINITY, f64::NAN] {
            for metric in Metric::ALL {
                metrics.update(metric, raw);
                let value = metrics.get(metric);
                assert!(value >= 0.0, "{} below range for {}", metric, raw);
                match metric {
                    Metric::Fps => assert!(value <= 60.0),
                    Metric::Confidence => assert!(value <= 100.0),
                    Metric::Persons => assert!(value <= 10.0),
                    Metric::Latency => {}
                }
            }
        }
    }

    #[test]
    fn display_formats_follow_gauge_kind() {
        let mut metrics = Metrics::new();
        assert_eq!(metrics.update(Metric::Fps, 0.96), "1.0");
        assert_eq!(metrics.update(Metric::Confidence, 85.0), "85.0%");
        assert_eq!(metrics.update(Metric::Latency, 512.6), "513ms");
        assert_eq!(metrics.update(Metric::Persons, 1.0), "1");
        assert_eq!(metrics.update(Metric::Persons, 12.0), "10");
    }

    #[test]
    fn persons_stores_clamped_unrounded_value() {
        let mut metrics = Metrics::new();
        assert_eq!(metrics.update(Metric::Persons, 2.4), "2");
        assert_eq!(metrics.get(Metric::Persons), 2.4);
    }

    #[test]
    fn reset_zeroes_every_gauge() {
        let mut metrics = Metrics::new();
        metrics.update(Metric::Latency, 400.0);
        metrics.update(Metric::Confidence, 70.0);
        let shown = metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
        assert_eq!(
            shown,
            vec![
                (Metric::Fps, "0.0".to_string()),
                (Metric::Confidence, "0.0%".to_string()),
                (Metric::Latency, "0ms".to_string()),
                (Metric::Persons, "0".to_string()),
            ]
        );
    }
}
