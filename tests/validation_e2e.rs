use std::sync::Arc;

use serde_json::json;

use affectsim::{
    Clause, Expression, InMemoryRegistry, LookupRegistry, SimulationConfig, Simulator,
    WarningReason,
};

fn registry() -> Arc<dyn LookupRegistry> {
    Arc::new(InMemoryRegistry::with_defaults())
}

fn expr(id: &str, logics: &[serde_json::Value]) -> Expression {
    Expression::new(id, logics.iter().cloned().map(Clause::new).collect())
}

fn config(sample_count: u64) -> SimulationConfig {
    SimulationConfig {
        sample_count,
        ..SimulationConfig::default()
    }
}

#[test]
fn unknown_root_yields_exactly_one_warning() {
    let result = Simulator::new(registry())
        .with_config(config(100))
        .with_seed(1)
        .run(&expr(
            "bad_root",
            &[json!({"==": [{"var": "hasMaleGenitals"}, 1]})],
        ))
        .unwrap();

    assert_eq!(result.unseeded_var_warnings.len(), 1);
    let warning = &result.unseeded_var_warnings[0];
    assert_eq!(warning.path, "hasMaleGenitals");
    assert_eq!(warning.reason, WarningReason::UnknownRoot);
}

#[test]
fn repeated_path_across_clauses_deduplicates() {
    let result = Simulator::new(registry())
        .with_config(config(100))
        .with_seed(2)
        .run(&expr(
            "repeated_bad_root",
            &[
                json!({"==": [{"var": "hasMaleGenitals"}, 1]}),
                json!({">=": [{"var": "hasMaleGenitals"}, 0]}),
                json!({"and": [{"var": "hasMaleGenitals"}]}),
            ],
        ))
        .unwrap();

    assert_eq!(result.unseeded_var_warnings.len(), 1);
}

#[test]
fn fail_on_unseeded_vars_rejects_before_sampling() {
    let err = Simulator::new(registry())
        .with_config(SimulationConfig {
            sample_count: 100,
            fail_on_unseeded_vars: true,
            ..SimulationConfig::default()
        })
        .run(&expr(
            "strict",
            &[json!({"==": [{"var": "hasMaleGenitals"}, 1]})],
        ))
        .unwrap_err();

    assert!(err.is_validation());
    let msg = format!("{err}");
    assert!(msg.contains("hasMaleGenitals"), "{msg}");
}

#[test]
fn fail_on_unseeded_vars_passes_clean_expressions() {
    let result = Simulator::new(registry())
        .with_config(SimulationConfig {
            sample_count: 100,
            fail_on_unseeded_vars: true,
            ..SimulationConfig::default()
        })
        .with_seed(3)
        .run(&expr(
            "strict_clean",
            &[json!({">=": [{"var": "emotions.joy"}, 0.5]})],
        ))
        .unwrap();

    assert!(result.unseeded_var_warnings.is_empty());
}

#[test]
fn disabled_validation_produces_no_warnings() {
    let result = Simulator::new(registry())
        .with_config(SimulationConfig {
            sample_count: 100,
            validate_var_paths: false,
            fail_on_unseeded_vars: true,
            ..SimulationConfig::default()
        })
        .with_seed(4)
        .run(&expr(
            "unvalidated",
            &[json!({"==": [{"var": "hasMaleGenitals"}, 1]})],
        ))
        .unwrap();

    // Even with fail_on_unseeded_vars set, skipping validation means there
    // is nothing to fail on.
    assert!(result.unseeded_var_warnings.is_empty());
    assert_eq!(result.sample_count, 100);
}

#[test]
fn unknown_nested_key_warns_with_suggestion() {
    let result = Simulator::new(registry())
        .with_config(config(100))
        .with_seed(5)
        .run(&expr(
            "typo_key",
            &[json!({">=": [{"var": "emotions.jyo"}, 0.5]})],
        ))
        .unwrap();

    assert_eq!(result.unseeded_var_warnings.len(), 1);
    let warning = &result.unseeded_var_warnings[0];
    assert_eq!(warning.reason, WarningReason::UnknownNestedKey);
    assert_eq!(warning.suggestion.as_deref(), Some("emotions.joy"));
}

#[test]
fn nesting_under_scalar_warns_invalid_nesting() {
    let result = Simulator::new(registry())
        .with_config(config(100))
        .with_seed(6)
        .run(&expr(
            "scalar_nested",
            &[json!({">=": [{"var": "sexualArousal.level"}, 0.5]})],
        ))
        .unwrap();

    assert_eq!(result.unseeded_var_warnings.len(), 1);
    let warning = &result.unseeded_var_warnings[0];
    assert_eq!(warning.reason, WarningReason::InvalidNesting);
    assert_eq!(warning.suggestion.as_deref(), Some("sexualArousal"));
}

#[test]
fn warnings_do_not_stop_the_run_by_default() {
    let result = Simulator::new(registry())
        .with_config(config(200))
        .with_seed(7)
        .run(&expr(
            "warned_but_running",
            &[
                json!({"==": [{"var": "hasMaleGenitals"}, 1]}),
                json!({">=": [{"var": "moodAxes.valence"}, -1000]}),
            ],
        ))
        .unwrap();

    assert_eq!(result.sample_count, 200);
    assert_eq!(result.unseeded_var_warnings.len(), 1);
    // The unknown path fails its leaf every sample, so nothing fires.
    assert_eq!(result.trigger_count, 0);
}

#[test]
fn mixed_valid_and_invalid_paths_warn_only_on_invalid() {
    let result = Simulator::new(registry())
        .with_config(config(100))
        .with_seed(8)
        .run(&expr(
            "mixed",
            &[
                json!({">=": [{"var": "emotions.joy"}, 0.1]}),
                json!({">=": [{"var": "previousEmotions.fear"}, 0.1]}),
                json!({">=": [{"var": "mood.valence"}, 0]}),
                json!({">=": [{"var": "affectTraits.restrain"}, 10]}),
            ],
        ))
        .unwrap();

    assert_eq!(result.unseeded_var_warnings.len(), 1);
    let warning = &result.unseeded_var_warnings[0];
    assert_eq!(warning.path, "affectTraits.restrain");
    assert_eq!(warning.reason, WarningReason::UnknownNestedKey);
    assert_eq!(warning.suggestion.as_deref(), Some("affectTraits.restraint"));
}

#[test]
fn warning_serializes_with_snake_case_reason() {
    let result = Simulator::new(registry())
        .with_config(config(50))
        .with_seed(9)
        .run(&expr(
            "serialized_warning",
            &[json!({"==": [{"var": "nope"}, 1]})],
        ))
        .unwrap();

    let json = serde_json::to_value(&result.unseeded_var_warnings).unwrap();
    assert_eq!(json[0]["reason"], "unknown_root");
}
