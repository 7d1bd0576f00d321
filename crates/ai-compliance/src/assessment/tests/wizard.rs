use super::common::*;
use crate::assessment::domain::RiskCategory;
use crate::assessment::engine::ComplianceEngine;
use crate::assessment::error::EngineError;
use crate::assessment::wizard::{total_weight, wizard_steps};

#[test]
fn high_risk_template_is_numbered_and_open() {
    let steps = wizard_steps(RiskCategory::High, &embedded()).expect("template exists");

    assert_eq!(steps.len(), 7);
    let positions: Vec<u16> = steps.iter().map(|step| step.position).collect();
    assert_eq!(positions, (1..=7).collect::<Vec<u16>>());
    assert!(steps.iter().all(|step| !step.completed));
    assert_eq!(steps[0].title, "AI system classification");
}

#[test]
fn every_embedded_template_weighs_one_hundred() {
    let ruleset = embedded();

    for category in RiskCategory::ALL {
        let steps = wizard_steps(category, &ruleset).expect("template exists");
        assert_eq!(total_weight(&steps), 100, "{category}");
    }
}

#[test]
fn category_missing_from_document_is_unknown_not_empty() {
    let ruleset = load(&small_document()).expect("truncated document loads");

    match wizard_steps(RiskCategory::Limited, &ruleset) {
        Err(EngineError::UnknownCategory(category)) => assert_eq!(category, "limited"),
        other => panic!("expected unknown category, got {other:?}"),
    }
}

#[test]
fn engine_accepts_category_aliases() {
    let engine = engine();

    let steps = engine.wizard_steps("High_Risk").expect("alias resolves");
    assert_eq!(steps.len(), 7);

    let err = engine.wizard_steps("severe").expect_err("not a category");
    assert!(matches!(err, EngineError::UnknownCategory(ref raw) if raw == "severe"));
    assert!(err.is_caller_error());
}

#[test]
fn engine_reports_templates_missing_after_reload() {
    let engine = engine();
    let mut document = embedded_document();
    document["wizard"]
        .as_object_mut()
        .expect("wizard object")
        .remove("minimal");

    engine
        .reload(crate::assessment::ruleset::RulesetSource::Bytes(bytes(&document)))
        .expect("reload succeeds");

    assert!(matches!(
        engine.wizard_steps("minimal"),
        Err(EngineError::UnknownCategory(_))
    ));
    assert!(engine.wizard_steps("limited").is_ok());
}

#[test]
fn steps_do_not_depend_on_any_profile() {
    let first = ComplianceEngine::new(embedded())
        .wizard_steps("limited")
        .expect("template exists");
    let second = wizard_steps(RiskCategory::Limited, &embedded()).expect("template exists");

    assert_eq!(first, second);
}
