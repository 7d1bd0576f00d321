use serde::Serialize;
use tracing::error;

use super::classifier::Classification;
use super::domain::{Decision, InputProfile, RiskCategory};
use super::error::EngineError;
use super::ruleset::{DecisionThresholds, Rule, RuleSet, ScoringModel};

/// Discrete contribution to a risk score, kept for transparent audits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreComponent {
    pub source: String,
    pub delta: i16,
    pub notes: String,
}

/// Numeric score, band and decision for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreOutcome {
    pub risk_score: u8,
    pub risk_level: String,
    pub decision: Decision,
    /// Sum of all components before clamping.
    pub raw_score: i32,
    pub components: Vec<ScoreComponent>,
    /// Score adjustment rules that matched, in document order.
    pub matched_rules: Vec<String>,
}

pub fn score(
    profile: &InputProfile,
    classification: &Classification,
    ruleset: &RuleSet,
) -> Result<ScoreOutcome, EngineError> {
    let model = ruleset.scoring();
    let category = classification.category;

    let baseline = model.baselines.get(&category).copied().ok_or_else(|| {
        error!(%category, ruleset_version = ruleset.version(), "no baseline for category");
        EngineError::EvaluationInternal(format!("no baseline configured for category {category}"))
    })?;

    let mut components = vec![ScoreComponent {
        source: "baseline".to_string(),
        delta: i16::from(baseline),
        notes: format!("{category} category baseline"),
    }];

    if profile.handles_personal_data {
        components.push(ScoreComponent {
            source: "personal_data".to_string(),
            delta: i16::from(model.personal_data_delta),
            notes: "system processes personal data".to_string(),
        });
    }

    if profile.automated_decisions {
        components.push(ScoreComponent {
            source: "automated_decisions".to_string(),
            delta: i16::from(model.automated_decisions_delta),
            notes: "system drives automated decisions".to_string(),
        });
    }

    for impact in profile.distinct_impacts() {
        let delta = model.impact_delta(impact);
        if delta > 0 {
            components.push(ScoreComponent {
                source: format!("decision_impact:{}", impact.trim().to_ascii_lowercase()),
                delta: i16::from(delta),
                notes: format!("decisions affect {impact}"),
            });
        }
    }

    let mut matched_rules = Vec::new();
    for rule in ruleset.rules() {
        if let Rule::ScoreAdjustment(adjustment) = rule {
            if adjustment.common.predicate.matches(profile) {
                matched_rules.push(adjustment.common.id.clone());
                components.push(ScoreComponent {
                    source: format!("rule:{}", adjustment.common.id),
                    delta: i16::from(adjustment.delta),
                    notes: format!("score adjustment rule {}", adjustment.common.id),
                });
            }
        }
    }

    let raw_score: i32 = components
        .iter()
        .map(|component| i32::from(component.delta))
        .sum();
    let risk_score = raw_score.clamp(0, 100) as u8;

    Ok(ScoreOutcome {
        risk_score,
        risk_level: band_label(risk_score, model).to_string(),
        decision: decide(risk_score, category, model.thresholds),
        raw_score,
        components,
        matched_rules,
    })
}

/// Label of the highest band whose lower bound the score reaches.
pub fn band_label(score: u8, model: &ScoringModel) -> &str {
    model
        .bands
        .iter()
        .rev()
        .find(|band| band.min_score <= score)
        .or_else(|| model.bands.first())
        .map(|band| band.label.as_str())
        .unwrap_or_default()
}

/// `unacceptable` forces `NO_GO` irrespective of the numeric score.
pub fn decide(score: u8, category: RiskCategory, thresholds: DecisionThresholds) -> Decision {
    if category == RiskCategory::Unacceptable || score >= thresholds.no_go_at {
        Decision::NoGo
    } else if score < thresholds.go_below {
        Decision::Go
    } else {
        Decision::ConditionalGo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::ruleset::Band;
    use std::collections::BTreeMap;

    fn model() -> ScoringModel {
        ScoringModel {
            baselines: BTreeMap::new(),
            personal_data_delta: 10,
            automated_decisions_delta: 10,
            decision_impact_deltas: BTreeMap::new(),
            bands: vec![
                Band {
                    label: "LOW".to_string(),
                    min_score: 0,
                },
                Band {
                    label: "MEDIUM".to_string(),
                    min_score: 40,
                },
                Band {
                    label: "HIGH".to_string(),
                    min_score: 70,
                },
            ],
            thresholds: DecisionThresholds {
                go_below: 40,
                no_go_at: 80,
            },
        }
    }

    #[test]
    fn bands_are_monotonic_over_the_full_range() {
        let model = model();
        let rank = |label: &str| model.bands.iter().position(|band| band.label == label);

        let mut previous = rank(band_label(0, &model));
        for score in 1..=100u8 {
            let current = rank(band_label(score, &model));
            assert!(current >= previous, "band dropped at score {score}");
            previous = current;
        }
        assert_eq!(band_label(39, &model), "LOW");
        assert_eq!(band_label(40, &model), "MEDIUM");
        assert_eq!(band_label(100, &model), "HIGH");
    }

    #[test]
    fn decision_follows_thresholds() {
        let thresholds = model().thresholds;

        assert_eq!(decide(39, RiskCategory::Limited, thresholds), Decision::Go);
        assert_eq!(
            decide(40, RiskCategory::Limited, thresholds),
            Decision::ConditionalGo
        );
        assert_eq!(decide(80, RiskCategory::High, thresholds), Decision::NoGo);
    }

    #[test]
    fn unacceptable_category_overrides_low_score() {
        let thresholds = model().thresholds;

        assert_eq!(
            decide(0, RiskCategory::Unacceptable, thresholds),
            Decision::NoGo
        );
    }
}
