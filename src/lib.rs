//! NeuralPose client
//!
//! Client-side orchestration for a remote human-activity-recognition service.
//! Frames are sampled from a webcam, an uploaded video clip, or a still image,
//! uploaded one at a time to the inference backend, and the returned
//! predictions drive a small dashboard: a pose label, four metric gauges and
//! a recent-activity feed.
//!
//! # Module Structure
//!
//! - `session`: the processing state machine and cycle timer
//! - `ingest`: input sources (webcam capture, file picker, decoded media)
//! - `inference`: HTTP client for `/health`, `/predict` and `/history`
//! - `presentation`: gauges, activity feed, and the `View` render surface
//! - `config`: defaults, config file and environment layering
//! - `catalog`: static activity icons and model metadata
//! - `command` / `ui`: the interactive terminal front end

pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod frame;
pub mod inference;
pub mod ingest;
pub mod presentation;
pub mod session;
pub mod ui;

pub use command::Command;
pub use config::{ClientConfig, WebcamSettings};
pub use error::ClientError;
pub use frame::Frame;
pub use inference::{HistoryRecord, HttpClient, InferenceClient, PredictionResult};
pub use ingest::{
    CaptureStream, FilePicker, InputKind, MediaCaptureProvider, QueuedFilePicker, SourceManager,
    VisibleSurface, WebcamProvider,
};
pub use presentation::{ActivityRow, Metric, NullView, SessionSnapshot, View};
pub use session::{ProcessingState, Session, Tick};
