//! End-to-end calculator tests through the engine
//!
//! Reference cases for every calculator, evaluated by name from a
//! `ParameterSet` exactly the way the CLI does it.

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use ee_calc::{CalcEngine, CalcError, CalculatorKind, FieldValue, ParameterSet, RiskLevel};

fn run(name: &str, set: ParameterSet) -> ee_calc::Report {
    CalcEngine::new().evaluate_named(name, &set).unwrap()
}

fn approx(actual: Option<f64>, expected: f64, tol: f64) {
    let actual = actual.expect("field should be defined");
    assert!(
        (actual - expected).abs() <= tol,
        "expected {} got {}",
        expected,
        actual
    );
}

// ============================================================================
// Reference cases
// ============================================================================

#[test]
fn test_ct_reference_case() {
    let set = ParameterSet::new()
        .with("ratio_p", 100.0)
        .with("ratio_s", 5.0)
        .with("ip", 80.0)
        .with("rb", 1.0)
        .with("rs", 0.2)
        .with("rwire", 0.05)
        .with("vk", 20.0)
        .with("ifault", 80.0);
    let report = run("ct", set);

    approx(report.number("isec"), 4.0, 1e-12);
    approx(report.number("z_total"), 1.25, 1e-12);
    approx(report.number("v_required"), 5.0, 1e-12);
    approx(report.number("margin"), 11.0, 1e-12);
    assert_eq!(report.classification, Some(RiskLevel::Ok));
}

#[test]
fn test_opamp_active_reference_case() {
    let set = ParameterSet::new()
        .with("topology", "non_inverting")
        .with("rin", 10_000.0)
        .with("rf", 100_000.0)
        .with("vin_peak", 0.2)
        .with("freq", 1000.0)
        .with("gbw", 1e6)
        .with("slew_rate", 0.5)
        .with("mode", "active");
    let report = run("opamp", set);

    approx(report.number("gain"), 11.0, 1e-12);
    approx(report.number("ideal_peak"), 2.2, 1e-12);
    approx(report.number("max_gain_at_freq"), 1000.0, 1e-9);
    approx(report.number("slew_limited_peak"), 79.577, 1e-3);
    assert!(!report.has_flag("bandwidth_limit"));
    assert!(!report.has_flag("slew_rate_limit"));
    // ±15 V rails with 1.5 V headroom leave 13.5 V, well above 2.2 V
    assert!(!report.has_flag("rail_limit"));
    approx(report.number("guaranteed_peak"), 2.2, 1e-12);
}

#[test]
fn test_power_single_phase_reference_case() {
    let set = ParameterSet::new()
        .with("mode", "single")
        .with("v", 220.0)
        .with("i", 10.0)
        .with("pf", 0.9);
    let report = run("power", set);

    approx(report.number("s"), 2200.0, 1e-9);
    approx(report.number("p"), 1980.0, 1e-9);
    approx(report.number("q"), 958.958, 0.001);
    assert!(report.get("voltage_unbalance_pct").unwrap().is_undefined());
    assert_eq!(report.classification, None);
}

#[test]
fn test_thd_reference_case() {
    let set = ParameterSet::new()
        .with("fund", 100.0)
        .with("h3", 0.0)
        .with("h5", 10.0)
        .with("h7", 5.0)
        .with("h11", 0.0);
    let report = run("thd", set);

    approx(report.number("thd_pct"), 125f64.sqrt(), 1e-9);
}

#[test]
fn test_protection_load_above_trip_always_wins() {
    for (ambient, i_start) in [(25.0, 10.0), (80.0, 2000.0), (-10.0, 0.0)] {
        let set = ParameterSet::new()
            .with("load", 150.0)
            .with("trip", 120.0)
            .with("ambient", ambient)
            .with("i_start", i_start);
        let report = run("protection", set);
        let status = report.assessment("status").unwrap();
        assert!(status.status.contains("immediate trip risk"));
        assert_eq!(status.level, Some(RiskLevel::Danger));
        assert_eq!(report.classification, Some(RiskLevel::Danger));
    }
}

#[test]
fn test_scaling_zero_tolerance_collapses_to_adc_margin() {
    let set = ParameterSet::new()
        .with("r1_tol", 0.0)
        .with("r2_tol", 0.0)
        .with("gain_tol", 0.0)
        .with("vref_tol", 0.0)
        .with("tcr_r1", 0.0)
        .with("tcr_r2", 0.0);
    let report = run("scaling", set);

    assert_eq!(report.number("divider_min"), report.number("divider_max"));
    assert_eq!(report.number("v_amp_min"), report.number("v_amp_max"));
    assert_eq!(report.get("code_min"), Some(&FieldValue::Integer(2699)));
    assert_eq!(report.get("code_max"), Some(&FieldValue::Integer(2706)));
}

#[test]
fn test_divider_midpoint() {
    let report = run("divider", ParameterSet::new().with("vin", 12.0));
    approx(report.number("vout"), 6.0, 1e-12);
}

// ============================================================================
// Engine-wide properties
// ============================================================================

#[test]
fn test_repeated_evaluation_is_identical() {
    let engine = CalcEngine::new();
    let set = ParameterSet::new().with("ifault", 3000.0).with("noise_rms", 0.5);
    for kind in CalculatorKind::ALL {
        let first = engine.evaluate(kind, &set).unwrap();
        let second = engine.evaluate(kind, &set).unwrap();
        assert_eq!(first, second, "{} is not idempotent", kind);
        assert_eq!(first.classification, second.classification);
    }
}

#[test]
fn test_non_finite_parameter_is_rejected_by_every_calculator() {
    let engine = CalcEngine::new();
    for kind in CalculatorKind::ALL {
        let name = kind
            .parameters()
            .into_iter()
            .find(|p| matches!(p.default, ee_calc::ParamDefault::Number(_)))
            .unwrap()
            .name;
        let set = ParameterSet::new().with(name, f64::NAN);
        match engine.evaluate(kind, &set) {
            Err(CalcError::InvalidParameter { name: rejected, .. }) => assert_eq!(rejected, name),
            other => panic!("{}: expected InvalidParameter, got {:?}", kind, other),
        }
    }
}

#[test]
fn test_input_error_message_is_preserved() {
    let err = CalcEngine::new()
        .evaluate_named("opamp", &ParameterSet::new().with("rin", 0.0))
        .unwrap_err();
    assert!(matches!(err, CalcError::InvalidInput(_)));
    assert!(!err.message().is_empty());
}

#[test]
fn test_parameters_from_yaml() {
    let yaml = r#"
topology: inverting
rin: 1000
rf: 47000
vin_peak: 0.5
mode: idle
"#;
    let set: ParameterSet = serde_yaml::from_str(yaml).unwrap();
    let report = CalcEngine::new()
        .evaluate(CalculatorKind::Opamp, &set)
        .unwrap();

    approx(report.number("gain"), -47.0, 1e-12);
    approx(report.number("guaranteed_peak"), 23.5, 1e-12);
    assert!(report.flags.is_empty());
    assert_eq!(report.classification, Some(RiskLevel::Ok));
}

#[test]
fn test_report_serialises_undefined_as_null() {
    let report = run("field", ParameterSet::new().with("noise_rms", 0.0));
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["fields"]["snr_db"].is_null());
}
