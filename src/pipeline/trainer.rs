use crate::artifact::{ArtifactMetadata, ModelArtifact, ARTIFACT_SCHEMA_VERSION};
use crate::boosting::{GbtParams, GradientBoostedTrees};
use crate::error::{AppError, Result};
use crate::metrics::EvaluationReport;
use crate::pipeline::calibrate::{calibrate_threshold, CalibrationOutcome, ThresholdGrid};
use crate::pipeline::dataset::TrainingTable;
use crate::pipeline::scaler::StandardScaler;
use crate::pipeline::selection::{rfe_select, SelectedFeatures};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// End-to-end training configuration.
///
/// Hyperparameter values are tuning choices; `scale_pos_weight` on the two
/// boosting configs is overwritten from the observed training label ratio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Held-out fraction for calibration and evaluation
    pub test_size: f64,

    /// Seed for the stratified split
    pub seed: u64,

    /// Feature count kept by recursive elimination
    pub n_selected_features: usize,

    /// Minimum screening sensitivity the calibrated threshold must reach
    pub sensitivity_floor: f64,

    pub threshold_grid: ThresholdGrid,

    /// Lightweight ranker refitted during elimination
    pub selector: GbtParams,

    /// Production classifier
    pub model: GbtParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            n_selected_features: 20,
            sensitivity_floor: 0.98,
            threshold_grid: ThresholdGrid::default(),
            selector: GbtParams {
                n_rounds: 100,
                learning_rate: 0.1,
                max_depth: 3,
                ..GbtParams::default()
            },
            model: GbtParams {
                n_rounds: 200,
                learning_rate: 0.1,
                max_depth: 5,
                ..GbtParams::default()
            },
        }
    }
}

/// Summary of one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub n_training_samples: usize,
    pub n_test_samples: usize,
    pub n_features_total: usize,
    pub scale_pos_weight: f64,
    pub selected_features: Vec<String>,
    pub calibration: CalibrationOutcome,
    pub evaluation: EvaluationReport,
}

/// Run the full pipeline: split, scale, select, fit, calibrate, evaluate.
///
/// The resulting artifact carries every fitted stage plus the calibrated
/// threshold; the report carries the held-out quality figures.
pub fn train_pipeline(
    table: &TrainingTable,
    config: &PipelineConfig,
) -> Result<(ModelArtifact, TrainingReport)> {
    info!(
        "training risk classifier on {} rows, {} features",
        table.n_samples(),
        table.n_features()
    );

    let n_pos = table.positive_count();
    let n_neg = table.negative_count();
    if n_pos == 0 || n_neg == 0 {
        return Err(AppError::Data(
            "training table must contain both positive and negative cases".to_string(),
        ));
    }
    info!("label distribution: {} positive / {} negative", n_pos, n_neg);

    let (train, test) = table.stratified_split(config.test_size, config.seed)?;

    // imbalance compensation from the training split only
    let train_pos = train.positive_count().max(1);
    let train_neg = train.negative_count();
    let scale_pos_weight = train_neg as f64 / train_pos as f64;
    info!("scale_pos_weight: {:.2}", scale_pos_weight);

    let scaler = StandardScaler::fit(&train.features, &train.columns)?;
    let train_scaled = scaler.transform(&train.features, &train.columns)?;
    let test_scaled = scaler.transform(&test.features, &test.columns)?;

    let selected: SelectedFeatures = rfe_select(
        &train_scaled,
        &train.labels,
        &train.columns,
        config.n_selected_features,
        config.selector.with_scale_pos_weight(scale_pos_weight),
    )?;
    info!(
        "selected features ({}): {:?}",
        selected.len(),
        selected.names
    );

    let train_selected = selected.project(&train_scaled);
    let test_selected = selected.project(&test_scaled);

    info!("fitting production classifier");
    let model = GradientBoostedTrees::fit(
        &train_selected,
        &train.labels,
        config.model.with_scale_pos_weight(scale_pos_weight),
    )?;

    let test_proba: Vec<f64> = model.predict_proba(&test_selected).to_vec();
    let calibration = calibrate_threshold(
        &test.labels,
        &test_proba,
        &config.threshold_grid,
        config.sensitivity_floor,
    )?;
    if !calibration.floor_met {
        warn!(
            "calibration degraded: sensitivity floor {:.2} not reached (best {:.4})",
            config.sensitivity_floor, calibration.sensitivity
        );
    }

    let evaluation =
        EvaluationReport::from_probabilities(&test.labels, &test_proba, calibration.threshold);
    info!(
        "held-out evaluation: accuracy {:.4}, ROC AUC {:.4}, sensitivity {:.4}, specificity {:.4}",
        evaluation.accuracy, evaluation.roc_auc, evaluation.sensitivity, evaluation.specificity
    );

    let report = TrainingReport {
        n_training_samples: train.n_samples(),
        n_test_samples: test.n_samples(),
        n_features_total: table.n_features(),
        scale_pos_weight,
        selected_features: selected.names.clone(),
        calibration,
        evaluation: evaluation.clone(),
    };

    let artifact = ModelArtifact {
        schema_version: ARTIFACT_SCHEMA_VERSION,
        model,
        scaler,
        all_columns: table.columns.clone(),
        selected,
        threshold: calibration.threshold,
        metadata: ArtifactMetadata {
            trained_at: chrono::Utc::now(),
            n_training_samples: train.n_samples(),
            n_test_samples: test.n_samples(),
            scale_pos_weight,
            evaluation,
            calibration,
        },
    };

    info!("✅ training completed");
    Ok((artifact, report))
}

/// Re-run the held-out evaluation of a persisted artifact against a
/// labeled table, replaying the exact training split.
pub fn evaluate_artifact(
    artifact: &ModelArtifact,
    table: &TrainingTable,
    config: &PipelineConfig,
) -> Result<EvaluationReport> {
    if table.columns != artifact.all_columns {
        return Err(AppError::Data(
            "table columns do not match the columns the artifact was trained on".to_string(),
        ));
    }

    let (_, test) = table.stratified_split(config.test_size, config.seed)?;
    let test_scaled = artifact.scaler.transform(&test.features, &test.columns)?;
    let test_selected = artifact.selected.project(&test_scaled);
    let test_proba: Vec<f64> = artifact.model.predict_proba(&test_selected).to_vec();

    let evaluation =
        EvaluationReport::from_probabilities(&test.labels, &test_proba, artifact.threshold);
    info!(
        "re-evaluation on {} held-out rows: accuracy {:.4}, sensitivity {:.4}, specificity {:.4}",
        evaluation.n_samples, evaluation.accuracy, evaluation.sensitivity, evaluation.specificity
    );
    Ok(evaluation)
}
