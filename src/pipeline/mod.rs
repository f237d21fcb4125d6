//! Training pipeline: table loading, standardization, feature selection,
//! threshold calibration, and end-to-end orchestration.
//!
//! Every fitted stage carries the ordered column names it was fitted on and
//! re-asserts them before transforming, so positional layout mismatches
//! surface as errors instead of silently wrong predictions.

pub mod calibrate;
pub mod dataset;
pub mod scaler;
pub mod selection;
pub mod trainer;

pub use calibrate::{calibrate_threshold, CalibrationOutcome, ThresholdGrid};
pub use dataset::{load_training_table, TrainingTable};
pub use scaler::StandardScaler;
pub use selection::{rfe_select, SelectedFeatures};
pub use trainer::{evaluate_artifact, train_pipeline, PipelineConfig, TrainingReport};
