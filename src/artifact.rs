use crate::boosting::GradientBoostedTrees;
use crate::error::{AppError, Result};
use crate::metrics::EvaluationReport;
use crate::pipeline::calibrate::CalibrationOutcome;
use crate::pipeline::scaler::StandardScaler;
use crate::pipeline::selection::SelectedFeatures;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

/// Bundle format version; bumped on incompatible layout changes
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

/// Provenance and held-out quality of a trained artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub trained_at: chrono::DateTime<chrono::Utc>,

    pub n_training_samples: usize,

    pub n_test_samples: usize,

    /// Imbalance compensation applied during fitting (n_neg / n_pos)
    pub scale_pos_weight: f64,

    /// Held-out evaluation at the calibrated threshold
    pub evaluation: EvaluationReport,

    /// Calibration operating point, including the degraded-calibration flag
    pub calibration: CalibrationOutcome,
}

/// Everything inference needs, persisted as a single bundle.
///
/// The scaler, column lists, threshold, and classifier are fitted against
/// each other; serializing them together means a loaded artifact can never
/// mix stages from different training runs. Read-only after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema_version: u32,

    /// Trained classifier over the selected, scaled features
    pub model: GradientBoostedTrees,

    /// Standardization fitted on the full training column set
    pub scaler: StandardScaler,

    /// Every feature column of the training table, in order
    pub all_columns: Vec<String>,

    /// Subset the classifier was fitted on
    pub selected: SelectedFeatures,

    /// Calibrated decision threshold
    pub threshold: f64,

    pub metadata: ArtifactMetadata,
}

impl ModelArtifact {
    /// Persist the bundle as JSON, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        info!("model artifact saved to {}", path.display());
        Ok(())
    }

    /// Load a bundle from disk, rejecting incompatible format versions.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(file))?;

        if artifact.schema_version != ARTIFACT_SCHEMA_VERSION {
            return Err(AppError::Serialization(format!(
                "artifact schema version {} is not supported (expected {})",
                artifact.schema_version, ARTIFACT_SCHEMA_VERSION
            )));
        }

        info!(
            "model artifact loaded from {} (threshold {:.2}, {} selected features)",
            path.display(),
            artifact.threshold,
            artifact.selected.len()
        );
        Ok(artifact)
    }
}
