//! NephroMind: chronic kidney disease risk screening.
//!
//! A gradient-boosted tree classifier trained on imbalanced clinical data,
//! with recursive feature elimination, probability-threshold calibration
//! for a high-sensitivity screening operating point, and exact per-
//! prediction Shapley attributions.
//!
//! The crate splits into a training pipeline ([`pipeline`]) that produces a
//! self-contained [`artifact::ModelArtifact`], and an inference service
//! ([`service::RiskService`]) that loads one artifact at startup and
//! answers assessment requests against it read-only.

pub mod artifact;
pub mod boosting;
pub mod config;
pub mod error;
pub mod explain;
pub mod metrics;
pub mod pipeline;
pub mod schema;
pub mod service;

pub use artifact::ModelArtifact;
pub use error::{AppError, Result};
pub use pipeline::{PipelineConfig, TrainingReport};
pub use schema::PatientRecord;
pub use service::{RiskAssessment, RiskService};
