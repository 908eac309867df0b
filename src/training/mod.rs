//! Training infrastructure: configuration, the episode loop, cooperative
//! cancellation, render hand-off and evaluation metrics.

pub mod config;
pub mod control;
pub mod metrics;
pub mod render;
pub mod trainer;

pub use config::TrainingConfig;
pub use control::StopHandle;
pub use metrics::EvaluationMetrics;
pub use render::{ChannelSink, RenderFrame, RenderSink};
pub use trainer::{Trainer, TrainerHandle, TrainingReport, SCORE_WINDOW};
