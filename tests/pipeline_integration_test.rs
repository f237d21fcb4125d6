/// Integration tests for the training pipeline
///
/// These tests exercise the complete path from a raw CSV on disk to a
/// persisted artifact: column dropping, stratified splitting, scaling,
/// recursive feature elimination, boosted-tree fitting, threshold
/// calibration, and artifact round-trips.
use nephromind::boosting::GbtParams;
use nephromind::metrics::ConfusionMatrix;
use nephromind::pipeline::{
    evaluate_artifact, load_training_table, train_pipeline, PipelineConfig,
};
use nephromind::ModelArtifact;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Deterministic generator for synthetic patient rows
struct Lcg(u64);

impl Lcg {
    fn next_unit(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_unit()
    }
}

/// 1000 balanced rows where the diagnosis follows a clean rule:
/// label = 1 iff SerumCreatinine > 2.0. Includes droppable columns so the
/// loader's contract is exercised on the way in.
fn write_synthetic_csv(dir: &tempfile::TempDir) -> PathBuf {
    let mut rng = Lcg(0x5eed);
    let mut csv = String::from(
        "PatientID,Age,SerumCreatinine,BMI,SystolicBP,BUNLevels,HemoglobinLevels,\
         FastingBloodSugar,Itching,GFR,Diagnosis\n",
    );

    for i in 0..1000 {
        let positive = i % 2 == 0;
        let creatinine = if positive {
            rng.uniform(2.2, 6.0)
        } else {
            rng.uniform(0.4, 1.8)
        };
        writeln!(
            csv,
            "{},{:.0},{:.3},{:.1},{:.0},{:.1},{:.1},{:.1},{:.1},{:.0},{}",
            i,
            rng.uniform(25.0, 85.0),
            creatinine,
            rng.uniform(18.0, 40.0),
            rng.uniform(95.0, 180.0),
            rng.uniform(5.0, 60.0),
            rng.uniform(9.0, 17.0),
            rng.uniform(70.0, 200.0),
            rng.uniform(0.0, 10.0),
            rng.uniform(15.0, 110.0),
            u8::from(positive),
        )
        .unwrap();
    }

    let path = dir.path().join("kidney_data.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

fn fast_config() -> PipelineConfig {
    PipelineConfig {
        n_selected_features: 5,
        selector: GbtParams {
            n_rounds: 15,
            learning_rate: 0.3,
            max_depth: 3,
            ..GbtParams::default()
        },
        model: GbtParams {
            n_rounds: 60,
            learning_rate: 0.3,
            max_depth: 4,
            ..GbtParams::default()
        },
        ..PipelineConfig::default()
    }
}

#[test]
fn test_loader_strips_identifier_and_leakage_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_synthetic_csv(&dir);

    let table = load_training_table(&path).unwrap();
    assert_eq!(table.n_samples(), 1000);
    assert!(!table.columns.contains(&"PatientID".to_string()));
    assert!(!table.columns.contains(&"GFR".to_string()));
    assert!(!table.columns.contains(&"Diagnosis".to_string()));
    assert!(table.columns.contains(&"SerumCreatinine".to_string()));
}

#[test]
fn test_training_produces_target_sized_selection() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_training_table(write_synthetic_csv(&dir)).unwrap();

    let (artifact, report) = train_pipeline(&table, &fast_config()).unwrap();
    assert_eq!(artifact.selected.len(), 5);
    assert_eq!(report.selected_features.len(), 5);
    assert_eq!(artifact.all_columns, table.columns);
}

#[test]
fn test_separable_rule_meets_sensitivity_target() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_training_table(write_synthetic_csv(&dir)).unwrap();

    let (artifact, report) = train_pipeline(&table, &fast_config()).unwrap();

    assert!(report.calibration.floor_met, "calibration degraded");
    assert!(
        report.evaluation.sensitivity >= 0.98,
        "held-out sensitivity {} below screening floor",
        report.evaluation.sensitivity
    );
    assert!(artifact
        .selected
        .names
        .contains(&"SerumCreatinine".to_string()));
}

#[test]
fn test_threshold_monotonicity_on_held_out_split() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_training_table(write_synthetic_csv(&dir)).unwrap();
    let config = fast_config();

    let (artifact, _) = train_pipeline(&table, &config).unwrap();
    let (_, test) = table.stratified_split(config.test_size, config.seed).unwrap();
    let scaled = artifact.scaler.transform(&test.features, &test.columns).unwrap();
    let proba = artifact.model.predict_proba(&artifact.selected.project(&scaled));

    let mut last_sensitivity = f64::INFINITY;
    let mut last_specificity = -1.0;
    for threshold in config.threshold_grid.values() {
        let y_pred: Vec<u8> = proba
            .iter()
            .map(|&p| if p >= threshold { 1 } else { 0 })
            .collect();
        let cm = ConfusionMatrix::from_predictions(&test.labels, &y_pred);

        assert!(cm.sensitivity() <= last_sensitivity + 1e-12);
        assert!(cm.specificity() >= last_specificity - 1e-12);
        last_sensitivity = cm.sensitivity();
        last_specificity = cm.specificity();
    }
}

#[test]
fn test_scaler_round_trip_on_training_rows() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_training_table(write_synthetic_csv(&dir)).unwrap();

    let (artifact, _) = train_pipeline(&table, &fast_config()).unwrap();
    let scaled = artifact
        .scaler
        .transform(&table.features, &table.columns)
        .unwrap();
    let restored = artifact.scaler.inverse_transform(&scaled).unwrap();

    for (orig, back) in table.features.iter().zip(restored.iter()) {
        assert!((orig - back).abs() < 1e-8);
    }
}

#[test]
fn test_artifact_round_trip_preserves_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_training_table(write_synthetic_csv(&dir)).unwrap();
    let config = fast_config();

    let (artifact, _) = train_pipeline(&table, &config).unwrap();
    let artifact_path = dir.path().join("model.json");
    artifact.save(&artifact_path).unwrap();
    let loaded = ModelArtifact::load(&artifact_path).unwrap();

    assert_eq!(loaded.threshold, artifact.threshold);
    assert_eq!(loaded.selected.names, artifact.selected.names);

    let scaled = artifact
        .scaler
        .transform(&table.features, &table.columns)
        .unwrap();
    let selected = artifact.selected.project(&scaled);
    let before = artifact.model.predict_proba(&selected);
    let after = loaded.model.predict_proba(&selected);
    for i in 0..before.len() {
        assert_eq!(before[i], after[i]);
    }
}

#[test]
fn test_evaluate_artifact_replays_split() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_training_table(write_synthetic_csv(&dir)).unwrap();
    let config = fast_config();

    let (artifact, report) = train_pipeline(&table, &config).unwrap();
    let evaluation = evaluate_artifact(&artifact, &table, &config).unwrap();

    assert_eq!(evaluation.n_samples, report.evaluation.n_samples);
    assert!((evaluation.roc_auc - report.evaluation.roc_auc).abs() < 1e-12);
}

#[test]
fn test_missing_label_column_aborts_training() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.csv");
    std::fs::write(&path, "Age,SerumCreatinine\n50,1.0\n60,3.0\n").unwrap();

    let err = load_training_table(&path).unwrap_err();
    assert_eq!(err.error_code(), "DATA_ERROR");
}
