use std::sync::Arc;

use serde_json::json;

use affectsim::{
    Clause, ClauseReport, CompareOp, Expression, InMemoryRegistry, LookupRegistry,
    SimulationConfig, SimulationResult, Simulator,
};

fn registry() -> Arc<dyn LookupRegistry> {
    Arc::new(InMemoryRegistry::with_defaults())
}

fn expr(id: &str, logics: &[serde_json::Value]) -> Expression {
    Expression::new(id, logics.iter().cloned().map(Clause::new).collect())
}

fn run(id: &str, logics: &[serde_json::Value], samples: u64, seed: u64) -> SimulationResult {
    Simulator::new(registry())
        .with_config(SimulationConfig {
            sample_count: samples,
            ..SimulationConfig::default()
        })
        .with_seed(seed)
        .run(&expr(id, logics))
        .unwrap()
}

fn report_for<'a>(result: &'a SimulationResult, path: &str) -> &'a ClauseReport {
    result
        .clause_failures
        .iter()
        .find(|r| r.variable_path.as_deref() == Some(path))
        .unwrap_or_else(|| panic!("no clause report for {path}"))
}

#[test]
fn comparison_metadata_extracted_from_leaf() {
    let result = run(
        "leaf_meta",
        &[json!({">=": [{"var": "emotions.joy"}, 0.4]})],
        200,
        1,
    );

    let report = &result.clause_failures[0];
    assert_eq!(report.variable_path.as_deref(), Some("emotions.joy"));
    assert_eq!(report.comparison_operator, Some(CompareOp::Ge));
    assert_eq!(report.threshold_value, Some(0.4));
}

#[test]
fn reversed_operands_normalize_at_parse_time() {
    // `0.5 >= joy` reads as `joy <= 0.5`; the report shows the normalized
    // form.
    let result = run(
        "reversed",
        &[json!({">=": [0.5, {"var": "emotions.joy"}]})],
        200,
        2,
    );

    let report = &result.clause_failures[0];
    assert_eq!(report.variable_path.as_deref(), Some("emotions.joy"));
    assert_eq!(report.comparison_operator, Some(CompareOp::Le));
    assert_eq!(report.threshold_value, Some(0.5));
}

#[test]
fn counters_stay_consistent_with_the_run() {
    let result = run(
        "consistent",
        &[
            json!({">=": [{"var": "moodAxes.valence"}, 0]}),
            json!({"<=": [{"var": "moodAxes.arousal"}, 25]}),
        ],
        1500,
        3,
    );

    for report in &result.clause_failures {
        assert_eq!(report.sample_count, result.sample_count);
        assert_eq!(report.pass_count + report.failure_count, report.sample_count);
        assert!(report.failure_count <= report.sample_count);
        assert!((0.0..=1.0).contains(&report.failure_rate));
        assert!(report.near_miss_count <= report.sample_count);
        assert!(
            report.in_regime_pass_count + report.in_regime_fail_count
                == report.others_passed_count
        );
        // Samples where everything else passed split into fired samples
        // and last-mile failures of this clause.
        assert_eq!(
            report.others_passed_count - report.last_mile_fail_count,
            result.trigger_count
        );
    }
}

#[test]
fn observed_p99_never_exceeds_max() {
    let result = run(
        "quantiles",
        &[json!({">=": [{"var": "moodAxes.valence"}, 0]})],
        3000,
        4,
    );

    let report = &result.clause_failures[0];
    let p99 = report.observed_p99.unwrap();
    let max = report.max_observed_value.unwrap();
    assert!(p99 <= max, "p99 {p99} > max {max}");

    let range = report.achievable_range.unwrap();
    assert!(range.min <= range.max);
    assert_eq!(range.max, max);
}

#[test]
fn single_clause_regime_covers_every_sample() {
    let result = run(
        "single",
        &[json!({">=": [{"var": "emotions.joy"}, 0.3]})],
        800,
        5,
    );

    let report = &result.clause_failures[0];
    assert!(report.is_single_clause);
    // With no siblings, every sample is in-regime.
    assert_eq!(report.others_passed_count, result.sample_count);
    assert_eq!(report.last_mile_fail_count, report.failure_count);
    assert_eq!(report.last_mile_fail_rate, Some(report.failure_rate));
}

#[test]
fn clause_failures_sorted_by_failure_rate_descending() {
    let result = run(
        "sorted",
        &[
            json!({">=": [{"var": "moodAxes.valence"}, -1000]}),
            json!({">=": [{"var": "emotions.joy"}, 0.9]}),
            json!({">=": [{"var": "moodAxes.arousal"}, 0]}),
        ],
        1000,
        6,
    );

    let rates: Vec<f64> = result.clause_failures.iter().map(|r| r.failure_rate).collect();
    assert!(rates.windows(2).all(|w| w[0] >= w[1]), "{rates:?}");
    // The near-impossible joy threshold fails most often.
    assert_eq!(
        result.clause_failures[0].variable_path.as_deref(),
        Some("emotions.joy")
    );
}

#[test]
fn gate_report_only_on_gated_leaves() {
    let result = run(
        "gating",
        &[
            json!({">=": [{"var": "emotions.joy"}, 0.1]}),
            json!({">=": [{"var": "moodAxes.valence"}, -1000]}),
        ],
        1000,
        7,
    );

    let joy = report_for(&result, "emotions.joy");
    let gate = joy.gate.expect("derived emotion values are gated");
    assert_eq!(
        gate.gate_pass_in_regime_count + gate.gate_fail_in_regime_count,
        joy.others_passed_count
    );
    assert_eq!(
        gate.gate_pass_and_clause_pass_in_regime_count
            + gate.gate_pass_and_clause_fail_in_regime_count,
        gate.gate_pass_in_regime_count
    );

    let valence = report_for(&result, "moodAxes.valence");
    assert!(valence.gate.is_none());
}

#[test]
fn redundant_clause_flagged() {
    let result = run(
        "redundant",
        &[json!({">=": [{"var": "moodAxes.valence"}, -500]})],
        500,
        8,
    );

    let report = &result.clause_failures[0];
    assert_eq!(report.failure_count, 0);
    assert!(report.redundant_in_regime);
}

#[test]
fn near_misses_accumulate_around_the_threshold() {
    // A mid-scale mood threshold with the default 10-point epsilon: roughly
    // a tenth of uniform draws land in the band.
    let result = run(
        "near_miss_band",
        &[json!({">=": [{"var": "moodAxes.valence"}, 0]})],
        3000,
        9,
    );

    let report = &result.clause_failures[0];
    assert!(report.near_miss_count > 0);
    assert!(
        report.near_miss_rate > 0.02 && report.near_miss_rate < 0.25,
        "rate = {}",
        report.near_miss_rate
    );
}

#[test]
fn tuning_direction_follows_operator() {
    let result = run(
        "tuning",
        &[
            json!({">=": [{"var": "emotions.joy"}, 0.5]}),
            json!({"<=": [{"var": "moodAxes.threat"}, 10]}),
        ],
        200,
        10,
    );

    let joy = report_for(&result, "emotions.joy");
    assert_eq!(joy.tuning_direction.as_ref().unwrap().loosen, "threshold_down");

    let threat = report_for(&result, "moodAxes.threat");
    assert_eq!(threat.tuning_direction.as_ref().unwrap().loosen, "threshold_up");
}

#[test]
fn nested_reports_mirror_the_logic_tree() {
    let result = run(
        "nested",
        &[json!({
            "and": [
                {">=": [{"var": "emotions.joy"}, 0.2]},
                {"or": [
                    {"<": [{"var": "moodAxes.threat"}, 0]},
                    {">=": [{"var": "sexualArousal"}, 0.5]}
                ]}
            ]
        })],
        500,
        11,
    );

    let root = &result.clause_failures[0];
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[1].children.len(), 2);
    let arousal = &root.children[1].children[1];
    assert_eq!(arousal.variable_path.as_deref(), Some("sexualArousal"));
    assert_eq!(arousal.sample_count, 500);
}

#[test]
fn gate_conflict_surfaces_in_the_result() {
    // joy gates on `valence >= 0`; requiring valence <= -50 makes the gate
    // unsatisfiable whenever the expression's own constraints hold.
    let result = run(
        "gate_conflict",
        &[
            json!({">=": [{"var": "emotions.joy"}, 0.2]}),
            json!({"<=": [{"var": "moodAxes.valence"}, -50]}),
        ],
        500,
        12,
    );

    assert_eq!(result.gate_compatibility.len(), 1);
    let compat = &result.gate_compatibility[0];
    assert_eq!(compat.gated_value, "emotions.joy");
    assert!(!compat.compatible);
    assert!(compat.reason.as_deref().unwrap().contains("valence"));
}

#[test]
fn gate_conflict_not_reported_for_or_branch() {
    // `valence <= -50` conflicts with joy's `valence >= 0` gate, but it is
    // only one branch of an `or`; the threat branch fires the expression
    // without touching valence, so the gate must not be flagged.
    let result = run(
        "gate_or_branch",
        &[
            json!({">=": [{"var": "emotions.joy"}, 0.01]}),
            json!({"or": [
                {"<=": [{"var": "moodAxes.valence"}, -50]},
                {">=": [{"var": "moodAxes.threat"}, 10]}
            ]}),
        ],
        2000,
        16,
    );

    assert!(result.trigger_rate > 0.0, "expression can fire");
    assert_eq!(result.gate_compatibility.len(), 1);
    assert_eq!(result.gate_compatibility[0].gated_value, "emotions.joy");
    assert!(result.gate_compatibility[0].compatible);
    assert!(result.gate_compatibility[0].reason.is_none());
}

#[test]
fn gate_compatibility_ok_for_consistent_expression() {
    let result = run(
        "gate_ok",
        &[
            json!({">=": [{"var": "emotions.joy"}, 0.2]}),
            json!({">=": [{"var": "moodAxes.valence"}, 25]}),
        ],
        500,
        13,
    );

    assert_eq!(result.gate_compatibility.len(), 1);
    assert!(result.gate_compatibility[0].compatible);
    assert!(result.gate_compatibility[0].reason.is_none());
}

#[test]
fn clause_report_round_trips_through_json() {
    let result = run(
        "report_json",
        &[json!({">=": [{"var": "emotions.joy"}, 0.3]})],
        300,
        14,
    );

    let json = serde_json::to_string(&result.clause_failures).unwrap();
    let parsed: Vec<ClauseReport> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, result.clause_failures);
}
