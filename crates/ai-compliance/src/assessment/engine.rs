use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde_json::{json, Value};
use tracing::{info, warn};

use super::classifier::{classify, Classification};
use super::domain::{AssessmentResult, InputProfile, RiskCategory, WizardStep};
use super::error::EngineError;
use super::guidance::compose_guidance;
use super::obligations::{contributing_rules, involves_personal_data, resolve_obligations};
use super::ruleset::{RuleSet, RulesetSource, RulesetSummary};
use super::scoring::{score, ScoreOutcome};
use super::wizard;

/// Evaluate one profile against one ruleset. Pure: no clock, no I/O.
pub fn evaluate(profile: &InputProfile, ruleset: &RuleSet) -> Result<AssessmentResult, EngineError> {
    ruleset.vocabulary().check(profile)?;

    let classification = classify(profile, ruleset);
    let scored = score(profile, &classification, ruleset)?;
    let obligations = resolve_obligations(profile, &classification, ruleset);
    let guidance = compose_guidance(profile, &classification, &obligations, ruleset);

    let compliance_status = ruleset
        .statuses()
        .render(scored.decision, classification.category);
    let assessment_details = details(profile, &classification, &scored, ruleset);
    let action_plan = guidance.action_plan();

    Ok(AssessmentResult {
        category: classification.category,
        risk_score: scored.risk_score,
        risk_level: scored.risk_level,
        decision: scored.decision,
        compliance_status,
        recommendations: guidance.recommendations,
        next_steps: guidance.next_steps,
        requirements: guidance.requirements,
        required_assessments: obligations.required_assessments,
        legal_references: obligations.legal_references,
        action_plan,
        assessment_details,
    })
}

fn details(
    profile: &InputProfile,
    classification: &Classification,
    scored: &ScoreOutcome,
    ruleset: &RuleSet,
) -> BTreeMap<String, Value> {
    let matched: Vec<&str> = contributing_rules(profile, classification, ruleset)
        .into_iter()
        .map(|rule| rule.id())
        .collect();
    let impacts = profile.distinct_impacts();

    let mut details = BTreeMap::new();
    details.insert("ai_classification".to_string(), json!(classification.category));
    details.insert(
        "classification_rule".to_string(),
        json!(classification.rule_id),
    );
    details.insert(
        "personal_data".to_string(),
        json!(involves_personal_data(profile, ruleset)),
    );
    details.insert(
        "automated_decisions".to_string(),
        json!(profile.automated_decisions),
    );
    details.insert("decision_impact_count".to_string(), json!(impacts.len()));
    details.insert(
        "high_impact_decisions".to_string(),
        json!(profile.automated_decisions && !impacts.is_empty()),
    );
    details.insert("raw_score".to_string(), json!(scored.raw_score));
    details.insert("score_components".to_string(), json!(scored.components));
    details.insert("matched_rules".to_string(), json!(matched));
    details.insert("role".to_string(), json!(profile.role));
    details.insert("sector".to_string(), json!(profile.sector));
    details.insert("ruleset_version".to_string(), json!(ruleset.version()));
    details
}

/// Holds the active ruleset and serves evaluations against it.
///
/// Evaluations take a snapshot of the current `Arc<RuleSet>` and never hold a
/// lock while computing. `reload` is serialized and swaps the handle only after
/// the replacement has been fully validated.
pub struct ComplianceEngine {
    active: RwLock<Arc<RuleSet>>,
    reload_guard: Mutex<()>,
}

impl ComplianceEngine {
    pub fn new(ruleset: RuleSet) -> Self {
        Self {
            active: RwLock::new(Arc::new(ruleset)),
            reload_guard: Mutex::new(()),
        }
    }

    pub fn load(source: RulesetSource) -> Result<Self, EngineError> {
        Ok(Self::new(RuleSet::load(source)?))
    }

    /// Snapshot of the active ruleset.
    pub fn ruleset(&self) -> Arc<RuleSet> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn summary(&self) -> RulesetSummary {
        self.ruleset().summary()
    }

    pub fn evaluate(&self, profile: &InputProfile) -> Result<AssessmentResult, EngineError> {
        evaluate(profile, &self.ruleset())
    }

    pub fn classify(&self, profile: &InputProfile) -> Result<Classification, EngineError> {
        let ruleset = self.ruleset();
        ruleset.vocabulary().check(profile)?;
        Ok(classify(profile, &ruleset))
    }

    /// Accepts any spelling `RiskCategory::from_str` accepts.
    pub fn wizard_steps(&self, category: &str) -> Result<Vec<WizardStep>, EngineError> {
        let category: RiskCategory = category
            .parse()
            .map_err(|_| EngineError::UnknownCategory(category.to_string()))?;
        wizard::wizard_steps(category, &self.ruleset())
    }

    /// Replace the active ruleset. On failure the previous one stays active.
    pub fn reload(&self, source: RulesetSource) -> Result<RulesetSummary, EngineError> {
        let _serialized = self
            .reload_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let replacement = match RuleSet::load(source) {
            Ok(ruleset) => Arc::new(ruleset),
            Err(err) => {
                warn!(error = %err, "ruleset reload rejected; keeping active ruleset");
                return Err(err.into());
            }
        };
        let summary = replacement.summary();

        let previous = {
            let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *active, replacement)
        };

        info!(
            previous = previous.version(),
            current = %summary.ruleset_version,
            "ruleset reloaded"
        );
        Ok(summary)
    }
}
