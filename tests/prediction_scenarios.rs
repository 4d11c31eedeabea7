// Prediction Integration Tests
//
// Purpose: End-to-end behaviour of a synthetically trained model
// Run with: cargo test --test prediction_scenarios

mod common;

use std::sync::Arc;

use common::{optimal_request, predictor, request, stressed_request, trained_artifact, TEST_MODEL_VERSION};
use hydro_health_engine::rules::{RiskLevel, Severity};
use hydro_health_engine::{
    ArtifactLoadError, GrowthRate, HealthStatus, ModelArtifact, PredictError, Predictor,
    PredictorHandle, RangePolicy, ValidationError,
};

const VISUALS: [&str; 5] = ["Healthy", "Yellowing", "Wilting", "Leaf Curling", "Spotting"];

// =========================================================================
// Section 1: Reference Scenarios
// =========================================================================

#[test]
fn test_optimal_conditions() {
    let response = predictor().predict(&optimal_request()).unwrap();

    assert_eq!(response.plant_health_status, HealthStatus::Healthy);
    assert_eq!(response.growth_rate, GrowthRate::High);
    assert!(
        (response.yield_score - 0.8).abs() <= 0.1,
        "yield_score {} not within 0.8 ± 0.1",
        response.yield_score
    );
    assert!(response.disease_risk.overall < 0.30);
    assert_eq!(response.disease_risk.level, RiskLevel::Low);
    assert_eq!(response.model_version, TEST_MODEL_VERSION);
    assert!(response.clamped_fields.is_empty());
}

#[test]
fn test_stressed_conditions() {
    let response = predictor().predict(&stressed_request()).unwrap();

    assert_eq!(response.plant_health_status, HealthStatus::Diseased);
    assert!(response.yield_score < 0.2, "yield_score {}", response.yield_score);
    assert!(response.disease_risk.overall > 0.60);
    assert_eq!(response.disease_risk.level, RiskLevel::High);

    // pH, EC and temperature all out of band
    assert!(response.environmental_recommendations[0].contains("too low"));
    assert!(response.environmental_recommendations[1].contains("too high"));
    assert!(response.environmental_recommendations[2].contains("too high"));
    assert!(response.confidence_score < 0.95);
}

// =========================================================================
// Section 2: Properties
// =========================================================================

#[test]
fn test_identical_input_gives_identical_output() {
    let p = predictor();
    let a = serde_json::to_string(&p.predict(&stressed_request()).unwrap()).unwrap();
    let b = serde_json::to_string(&p.predict(&stressed_request()).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_outputs_bounded_across_domain() {
    let p = predictor();

    for ph in [3.0, 4.5, 6.0, 7.5, 9.0] {
        for ec in [200.0, 1200.0, 3000.0] {
            for temp in [5.0, 21.0, 40.0] {
                for humidity in [10.0, 60.0, 100.0] {
                    for visual in VISUALS {
                        let r = p.predict(&request(ph, ec, temp, humidity, visual)).unwrap();
                        for score in [r.health_score, r.growth_score, r.yield_score] {
                            assert!((0.0..=1.0).contains(&score));
                        }
                        assert!((0.0..=100.0).contains(&r.yield_prediction));
                        assert!((0.30..=0.95).contains(&r.confidence_score));
                        assert!((0.0..=1.0).contains(&r.disease_risk.overall));
                        assert_eq!(r.environmental_recommendations.len(), 4);
                        assert!(!r.nutrient_issues.is_empty());
                    }
                }
            }
        }
    }
}

#[test]
fn test_health_does_not_rise_as_ph_drops() {
    let p = predictor();

    // pH 6.00 down to 4.00 in 0.01 steps, other readings optimal
    for visual in VISUALS {
        let sweep: Vec<(f64, f64)> = (0..=200)
            .map(|step| {
                let ph = 6.0 - step as f64 * 0.01;
                let health = p.predict(&request(ph, 1200.0, 21.0, 60.0, visual)).unwrap().health_score;
                (ph, health)
            })
            .collect();

        for pair in sweep.windows(2) {
            let ((ph_hi, before), (ph_lo, after)) = (pair[0], pair[1]);
            assert!(
                after <= before,
                "{}: health rose from {} to {} as pH dropped {:.2} -> {:.2}",
                visual,
                before,
                after,
                ph_hi,
                ph_lo
            );
        }
        assert!(sweep[200].1 < sweep[0].1, "{}: acidity had no effect", visual);
    }
}

#[test]
fn test_confidence_falls_as_readings_leave_bands() {
    let p = predictor();
    let steps = [
        request(6.2, 1300.0, 21.0, 62.0, "Healthy"),
        request(4.0, 1300.0, 21.0, 62.0, "Healthy"),
        request(4.0, 2600.0, 21.0, 62.0, "Healthy"),
        request(4.0, 2600.0, 33.0, 62.0, "Healthy"),
        request(4.0, 2600.0, 33.0, 20.0, "Healthy"),
    ];
    let confidence: Vec<f64> = steps
        .iter()
        .map(|r| p.predict(r).unwrap().confidence_score)
        .collect();

    assert_eq!(confidence[0], 0.95);
    for pair in confidence.windows(2) {
        assert!(pair[1] <= pair[0], "{:?}", confidence);
    }
}

#[test]
fn test_all_clear_only_when_nothing_flagged() {
    let p = predictor();

    let clear = p.predict(&optimal_request()).unwrap();
    assert_eq!(clear.nutrient_issues.len(), 1);
    assert_eq!(clear.nutrient_issues[0].severity, Severity::None);

    let flagged = p.predict(&request(6.0, 1200.0, 21.0, 60.0, "Yellowing")).unwrap();
    assert!(flagged.nutrient_issues.iter().all(|i| i.severity != Severity::None));
}

// =========================================================================
// Section 3: Validation
// =========================================================================

#[test]
fn test_unknown_visual_condition_rejected() {
    let err = predictor()
        .predict(&request(6.0, 1200.0, 21.0, 60.0, "Purple Spots"))
        .unwrap_err();
    match err {
        PredictError::Validation(ValidationError::UnknownCategory { value, expected, .. }) => {
            assert_eq!(value, "Purple Spots");
            assert!(expected.contains("Leaf Curling"));
        }
        other => panic!("expected UnknownCategory, got {:?}", other),
    }
}

#[test]
fn test_out_of_range_rejected_by_default() {
    let err = predictor()
        .predict(&request(6.0, 3500.0, 21.0, 60.0, "Healthy"))
        .unwrap_err();
    assert!(matches!(
        err,
        PredictError::Validation(ValidationError::OutOfRange { field: "ec_value", .. })
    ));

    let nan = predictor().predict(&request(f64::NAN, 1200.0, 21.0, 60.0, "Healthy"));
    assert!(nan.is_err());
}

#[test]
fn test_clamp_policy_flags_and_penalizes() {
    let clamping = Predictor::new(trained_artifact()).with_policy(RangePolicy::Clamp);

    let clamped = clamping.predict(&request(9.8, 1200.0, 21.0, 60.0, "Healthy")).unwrap();
    let at_bound = predictor().predict(&request(9.0, 1200.0, 21.0, 60.0, "Healthy")).unwrap();

    assert_eq!(clamped.clamped_fields, vec!["ph_value".to_string()]);
    assert!(at_bound.clamped_fields.is_empty());
    assert!(clamped.confidence_score < at_bound.confidence_score);
    // The model sees the same (clamped) input
    assert_eq!(clamped.health_score, at_bound.health_score);

    // Non-finite values are never clamped
    assert!(clamping
        .predict(&request(6.0, f64::INFINITY, 21.0, 60.0, "Healthy"))
        .is_err());
}

#[test]
fn test_batch_matches_sequential() {
    let p = predictor();
    let requests = vec![
        optimal_request(),
        stressed_request(),
        request(6.0, 1200.0, 21.0, 60.0, "Purple"),
        request(7.4, 900.0, 26.0, 85.0, "Spotting"),
    ];

    let batch = p.predict_batch(&requests);
    assert_eq!(batch.len(), requests.len());

    for (req, result) in requests.iter().zip(&batch) {
        match (p.predict(req), result) {
            (Ok(expected), Ok(actual)) => assert_eq!(&expected, actual),
            (Err(_), Err(_)) => {}
            (expected, actual) => panic!("batch mismatch: {:?} vs {:?}", expected, actual),
        }
    }
}

// =========================================================================
// Section 4: Artifact Persistence
// =========================================================================

#[test]
fn test_save_load_predict_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models").join("hydro_model.json");

    let artifact = trained_artifact();
    artifact.save(&path).unwrap();
    let loaded = ModelArtifact::load(&path).unwrap();

    assert_eq!(&loaded, artifact.as_ref());

    let before = predictor();
    let after = Predictor::new(Arc::new(loaded));
    for req in [optimal_request(), stressed_request(), request(5.1, 700.0, 17.5, 48.0, "Leaf Curling")] {
        assert_eq!(before.predict(&req).unwrap(), after.predict(&req).unwrap());
    }
}

#[test]
fn test_tampered_artifact_fails_fingerprint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tampered.json");

    let mut doc: serde_json::Value = serde_json::from_str(&trained_artifact().to_json().unwrap()).unwrap();
    let nodes = doc["ensemble"]["trees"][0]["nodes"].as_array_mut().unwrap();
    let leaf = nodes.iter_mut().find(|n| n["kind"] == "leaf").unwrap();
    let original = leaf["values"][0].as_f64().unwrap();
    leaf["values"][0] = serde_json::json!(original + 0.25);
    std::fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();

    let err = ModelArtifact::load(&path).unwrap_err();
    assert!(matches!(err, ArtifactLoadError::FingerprintMismatch { .. }), "{:?}", err);
}

#[test]
fn test_unknown_format_version_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.json");

    let mut doc: serde_json::Value = serde_json::from_str(&trained_artifact().to_json().unwrap()).unwrap();
    doc["format_version"] = serde_json::json!(2);
    std::fs::write(&path, doc.to_string()).unwrap();

    assert!(matches!(
        ModelArtifact::load(&path).unwrap_err(),
        ArtifactLoadError::UnsupportedVersion { found: 2, .. }
    ));
}

// =========================================================================
// Section 5: Predictor Handle
// =========================================================================

#[test]
fn test_handle_reload_and_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    trained_artifact().save(&path).unwrap();

    let handle = PredictorHandle::empty();
    assert!(!handle.health().model_loaded);

    handle.reload_from(&path, RangePolicy::Reject).unwrap();
    let report = handle.health();
    assert_eq!(report.status, "healthy");
    assert_eq!(report.model_version.as_deref(), Some(TEST_MODEL_VERSION));

    // A snapshot taken before a swap keeps working against its own model
    let snapshot = handle.current().unwrap();
    let previous = handle.replace(Predictor::new(trained_artifact()).with_policy(RangePolicy::Clamp));
    assert!(Arc::ptr_eq(&previous.unwrap(), &snapshot));
    assert_eq!(snapshot.policy(), RangePolicy::Reject);
    assert!(snapshot.predict(&optimal_request()).is_ok());
    assert_eq!(handle.current().unwrap().policy(), RangePolicy::Clamp);

    // Failed reload leaves the active predictor in place
    assert!(handle.reload_from(dir.path().join("missing.json"), RangePolicy::Reject).is_err());
    assert!(handle.current().is_some());
}
