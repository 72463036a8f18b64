//! Recent-activity feed.
//!
//! History is append-only and unbounded until `reset()`; rendering only
//! ever shows the last `VISIBLE_ACTIVITIES` entries, oldest first.

use serde::Serialize;

/// Entries rendered from the tail of the history.
pub const VISIBLE_ACTIVITIES: usize = 5;

pub const NO_ACTIVITIES_TEXT: &str = "No activities detected";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub name: String,
    pub icon: String,
    /// Percentage in [0, 100].
    pub confidence: f64,
}

/// One rendered row of the feed.
#[derive(Clone, Debug, PartialEq)]
pub enum ActivityRow {
    Placeholder(&'static str),
    Entry {
        name: String,
        icon: String,
        /// Rounded percentage label, e.g. `85%`.
        confidence_label: String,
        /// Confidence bar fill, in percent of full width.
        bar_width: f64,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub enum RejectedActivity {
    EmptyName,
    MissingConfidence,
}

#[derive(Clone, Debug, Default)]
pub struct ActivityFeed {
    entries: Vec<ActivityEntry>,
}

impl ActivityFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append one entry. Confidence is clamped into [0, 100];
    /// zero is a valid confidence, a non-finite one counts as missing.
    pub fn append(
        &mut self,
        name: &str,
        icon: &str,
        confidence: Option<f64>,
    ) -> Result<&ActivityEntry, RejectedActivity> {
        if name.trim().is_empty() {
            return Err(RejectedActivity::EmptyName);
        }
        let confidence = match confidence {
            Some(value) if value.is_finite() => value.clamp(0.0, 100.0),
            _ => return Err(RejectedActivity::MissingConfidence),
        };
        self.entries.push(ActivityEntry {
            name: name.to_string(),
            icon: icon.to_string(),
            confidence,
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// The visible window, oldest first.
    pub fn recent(&self) -> &[ActivityEntry] {
        let start = self.entries.len().saturating_sub(VISIBLE_ACTIVITIES);
        &self.entries[start..]
    }

    /// Rebuild the rendered rows from the visible window.
    pub fn rows(&self) -> Vec<ActivityRow> {
        if self.entries.is_empty() {
            return vec![ActivityRow::Placeholder(NO_ACTIVITIES_TEXT)];
        }
        self.recent()
            .iter()
            .map(|entry| {
                let confidence = entry.confidence.min(100.0);
                ActivityRow::Entry {
                    name: entry.name.clone(),
                    icon: entry.icon.clone(),
                    confidence_label: format!("{}%", confidence.round()),
                    bar_width: confidence,
                }
            })
            .collect()
    }

    pub fn history(&self) -> &[ActivityEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}
