/// Integration tests for the risk inference service
///
/// These tests verify the request path end to end: alias renaming, column
/// reconciliation against the fitted layout, scaling, projection onto the
/// selected subset, threshold comparison, and attribution, plus the
/// artifact lifecycle (uninitialized vs ready).
use nephromind::boosting::GbtParams;
use nephromind::pipeline::{load_training_table, train_pipeline, PipelineConfig};
use nephromind::schema::GfrStage;
use nephromind::{PatientRecord, RiskService};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Small separable cohort over a realistic column subset; the diagnosis
/// tracks serum creatinine alone.
fn trained_service() -> RiskService {
    let mut csv = String::from(
        "PatientID,Age,SerumCreatinine,BMI,SystolicBP,BUNLevels,FatigueLevels,GFR,Diagnosis\n",
    );
    for i in 0..400 {
        let positive = i % 2 == 0;
        let creatinine = if positive {
            2.5 + (i % 13) as f64 * 0.25
        } else {
            0.5 + (i % 13) as f64 * 0.1
        };
        writeln!(
            csv,
            "{},{},{:.2},{:.1},{},{:.1},{},{},{}",
            i,
            30 + i % 50,
            creatinine,
            20.0 + (i % 17) as f64,
            100 + i % 70,
            8.0 + (i % 29) as f64,
            i % 2,
            40 + i % 60,
            u8::from(positive),
        )
        .unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cohort.csv");
    std::fs::write(&path, csv).unwrap();

    let config = PipelineConfig {
        n_selected_features: 4,
        selector: GbtParams {
            n_rounds: 12,
            learning_rate: 0.3,
            max_depth: 3,
            ..GbtParams::default()
        },
        model: GbtParams {
            n_rounds: 50,
            learning_rate: 0.3,
            max_depth: 3,
            ..GbtParams::default()
        },
        ..PipelineConfig::default()
    };

    let table = load_training_table(&path).unwrap();
    let (artifact, _) = train_pipeline(&table, &config).unwrap();
    RiskService::from_artifact(artifact)
}

fn request(creatinine: f64) -> HashMap<String, f64> {
    let mut map = HashMap::new();
    map.insert("Age".to_string(), 50.0);
    map.insert("Gender".to_string(), 0.0);
    map.insert("SerumCreatinine".to_string(), creatinine);
    map.insert("BMI".to_string(), 26.0);
    map.insert("SystolicBP".to_string(), 130.0);
    map.insert("BUNLevels".to_string(), 18.0);
    map.insert("FatigueLevels".to_string(), 1.0);
    map
}

#[test]
fn test_uninitialized_service_fails_with_model_not_ready() {
    let service = RiskService::uninitialized();
    assert!(!service.is_ready());

    let err = service.assess_map(&request(1.0)).unwrap_err();
    assert_eq!(err.error_code(), "MODEL_NOT_READY");

    let err = service.assess(&PatientRecord::default()).unwrap_err();
    assert_eq!(err.error_code(), "MODEL_NOT_READY");
}

#[test]
fn test_risk_rises_with_creatinine() {
    let service = trained_service();

    let low = service.assess_map(&request(1.0)).unwrap();
    let high = service.assess_map(&request(4.0)).unwrap();

    assert!(high.probability > low.probability);
    assert_eq!(high.risk_class, 1);
    assert_eq!(high.risk_level.to_string(), "High");
    assert_eq!(low.risk_class, 0);
}

#[test]
fn test_identical_requests_yield_identical_results() {
    let service = trained_service();
    let input = request(2.8);

    let a = serde_json::to_vec(&service.assess_map(&input).unwrap()).unwrap();
    let b = serde_json::to_vec(&service.assess_map(&input).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_missing_field_matches_explicit_zero() {
    let service = trained_service();

    let mut omitted = request(3.0);
    omitted.remove("BUNLevels");
    let mut zeroed = request(3.0);
    zeroed.insert("BUNLevels".to_string(), 0.0);

    let a = service.assess_map(&omitted).unwrap();
    let b = service.assess_map(&zeroed).unwrap();
    assert_eq!(a.probability, b.probability);
    assert_eq!(a.risk_class, b.risk_class);
}

#[test]
fn test_alias_matches_canonical_name() {
    let service = trained_service();

    let canonical = request(3.0);

    let mut aliased = request(3.0);
    let bun = aliased.remove("BUNLevels").unwrap();
    let fatigue = aliased.remove("FatigueLevels").unwrap();
    aliased.insert("BUN".to_string(), bun);
    aliased.insert("Fatigue".to_string(), fatigue);

    let a = service.assess_map(&canonical).unwrap();
    let b = service.assess_map(&aliased).unwrap();
    assert_eq!(a.probability, b.probability);
}

#[test]
fn test_request_without_selected_features_still_answers() {
    let service = trained_service();

    // every model input defaults to zero; prediction degrades, not errors
    let result = service.assess_map(&HashMap::new()).unwrap();
    assert!(result.probability >= 0.0 && result.probability <= 1.0);
}

#[test]
fn test_contributors_are_ranked_and_carry_raw_values() {
    let service = trained_service();
    let result = service.assess_map(&request(5.0)).unwrap();

    assert!(!result.contributors.is_empty());
    assert!(result.contributors.len() <= 5);
    for pair in result.contributors.windows(2) {
        assert!(pair[0].impact.abs() >= pair[1].impact.abs());
    }

    if let Some(creatinine) = result
        .contributors
        .iter()
        .find(|c| c.feature == "SerumCreatinine")
    {
        assert_eq!(creatinine.value, 5.0);
        assert!(creatinine.impact > 0.0);
    }
}

#[test]
fn test_typed_record_with_defaults_and_staging() {
    let service = trained_service();

    let record: PatientRecord = serde_json::from_str(
        r#"{"Age": 61, "SerumCreatinine": 4.2, "GFR": 32.0, "BUN": 48.0}"#,
    )
    .unwrap();
    let result = service.assess(&record).unwrap();

    assert_eq!(result.gfr_stage, GfrStage::G3b);
    assert_eq!(result.risk_class, 1);
}

#[test]
fn test_load_or_train_without_sources_stays_uninitialized() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("missing.json");

    let service = RiskService::load_or_train(
        &artifact_path,
        &["does/not/exist.csv".to_string()],
        &PipelineConfig::default(),
    );
    assert!(!service.is_ready());
}

#[test]
fn test_load_or_train_recovers_persisted_artifact() {
    let service = trained_service();
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("model.json");
    service.artifact().unwrap().save(&artifact_path).unwrap();

    let reloaded = RiskService::load_or_train(&artifact_path, &[], &PipelineConfig::default());
    assert!(reloaded.is_ready());

    let a = service.assess_map(&request(2.0)).unwrap();
    let b = reloaded.assess_map(&request(2.0)).unwrap();
    assert_eq!(a.probability, b.probability);
}
