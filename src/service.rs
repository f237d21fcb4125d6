use crate::artifact::ModelArtifact;
use crate::error::{AppError, Result};
use crate::explain::{Contributor, TreeExplainer};
use crate::pipeline::{load_training_table, train_pipeline, PipelineConfig, TrainingReport};
use crate::schema::{canonical_name, GfrStage, PatientRecord, RiskLevel};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

/// One risk assessment, produced fresh per request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 0 = below threshold, 1 = flagged for follow-up
    pub risk_class: u8,

    pub risk_level: RiskLevel,

    /// Positive-class probability
    pub probability: f64,

    /// Strongest factors behind this prediction, best-effort
    pub contributors: Vec<Contributor>,

    /// KDIGO stage of the submitted eGFR
    pub gfr_stage: GfrStage,

    /// Decision threshold in force
    pub model_threshold: f64,
}

/// Risk inference service.
///
/// Holds at most one immutable artifact: UNINITIALIZED until a load or
/// train succeeds, READY afterwards for the service's lifetime. All state
/// is read-only after construction, so a `RiskService` can be shared
/// across threads without locking.
#[derive(Debug, Clone, Default)]
pub struct RiskService {
    artifact: Option<Arc<ModelArtifact>>,
    explainer: TreeExplainer,
}

impl RiskService {
    /// Service with no artifact; every assessment fails with model-not-ready.
    pub fn uninitialized() -> Self {
        Self::default()
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        Self {
            artifact: Some(Arc::new(artifact)),
            explainer: TreeExplainer::new(),
        }
    }

    /// Load a persisted artifact.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_artifact(ModelArtifact::load(path)?))
    }

    /// Train from a labeled CSV and persist the resulting artifact.
    pub fn train_from_csv<P: AsRef<Path>, Q: AsRef<Path>>(
        data_path: P,
        artifact_path: Q,
        config: &PipelineConfig,
    ) -> Result<(Self, TrainingReport)> {
        let table = load_training_table(data_path)?;
        let (artifact, report) = train_pipeline(&table, config)?;
        artifact.save(artifact_path)?;
        Ok((Self::from_artifact(artifact), report))
    }

    /// Startup sequence: load the persisted artifact if present, otherwise
    /// train from the first dataset path that exists. A service that could
    /// do neither is returned uninitialized, and every assessment reports
    /// model-not-ready until an operator intervenes.
    pub fn load_or_train<P: AsRef<Path>>(
        artifact_path: P,
        dataset_paths: &[String],
        config: &PipelineConfig,
    ) -> Self {
        let artifact_path = artifact_path.as_ref();

        match ModelArtifact::load(artifact_path) {
            Ok(artifact) => {
                info!("✅ model loaded from {}", artifact_path.display());
                return Self::from_artifact(artifact);
            }
            Err(e) => {
                warn!(
                    "no usable artifact at {} ({}); attempting to train",
                    artifact_path.display(),
                    e
                );
            }
        }

        for candidate in dataset_paths {
            if !Path::new(candidate).exists() {
                continue;
            }
            info!("training model from {}", candidate);
            match Self::train_from_csv(candidate, artifact_path, config) {
                Ok((service, _)) => {
                    info!("✅ model trained successfully");
                    return service;
                }
                Err(e) => {
                    warn!("training from {} failed: {}", candidate, e);
                }
            }
        }

        warn!("⚠ no artifact and no dataset found; service is not ready");
        Self::uninitialized()
    }

    pub fn is_ready(&self) -> bool {
        self.artifact.is_some()
    }

    pub fn artifact(&self) -> Option<&ModelArtifact> {
        self.artifact.as_deref()
    }

    fn ready_artifact(&self) -> Result<&ModelArtifact> {
        self.artifact.as_deref().ok_or_else(|| {
            AppError::ModelNotReady("no model has been loaded or trained".to_string())
        })
    }

    /// Assess a validated patient record.
    pub fn assess(&self, record: &PatientRecord) -> Result<RiskAssessment> {
        record.validate()?;

        let input: HashMap<String, f64> = record
            .to_feature_pairs()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        self.assess_map(&input)
    }

    /// Assess a raw feature mapping.
    ///
    /// Accepts canonical or aliased names; unknown extras are dropped, and
    /// every column the fitted scaler expects but the input lacks is
    /// synthesized as 0 (upstream gap-filling supplies clinical defaults,
    /// this pipeline does not re-derive them).
    pub fn assess_map(&self, input: &HashMap<String, f64>) -> Result<RiskAssessment> {
        let artifact = self.ready_artifact()?;

        // aliased spellings first so a canonical spelling in the same
        // request deterministically wins
        let mut canonical: HashMap<&str, f64> = HashMap::with_capacity(input.len());
        for (name, &value) in input {
            let resolved = canonical_name(name);
            if resolved != name.as_str() {
                canonical.insert(resolved, value);
            }
        }
        for (name, &value) in input {
            if canonical_name(name) == name.as_str() {
                canonical.insert(name.as_str(), value);
            }
        }

        // project onto the scaler's layout, in its order
        let expected = artifact.scaler.columns();
        let raw_row: Vec<f64> = expected
            .iter()
            .map(|column| canonical.get(column.as_str()).copied().unwrap_or(0.0))
            .collect();

        let matrix = Array2::from_shape_vec((1, raw_row.len()), raw_row.clone())
            .map_err(|e| AppError::Scaling(format!("failed to shape input row: {}", e)))?;
        let scaled = artifact.scaler.transform(&matrix, expected)?;

        let selected_scaled = artifact.selected.project(&scaled);
        let selected_row = selected_scaled.row(0);

        let probability = artifact.model.predict_proba_row(selected_row);
        let risk_class = if probability >= artifact.threshold { 1 } else { 0 };

        // untransformed values of the selected features, for interpretability
        let raw_selected: Vec<f64> = artifact
            .selected
            .indices
            .iter()
            .map(|&i| raw_row[i])
            .collect();
        let contributors = self.explainer.top_contributors(
            &artifact.model,
            selected_row,
            &artifact.selected.names,
            &raw_selected,
        );

        let gfr = canonical.get("GFR").copied().unwrap_or(90.0);

        Ok(RiskAssessment {
            risk_class,
            risk_level: RiskLevel::from_class(risk_class),
            probability,
            contributors,
            gfr_stage: GfrStage::from_gfr(gfr),
            model_threshold: artifact.threshold,
        })
    }
}
