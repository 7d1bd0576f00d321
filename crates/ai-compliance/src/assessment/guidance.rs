use serde::Serialize;

use super::classifier::Classification;
use super::domain::{ActionPlan, InputProfile};
use super::obligations::{contributing_rules, Obligations};
use super::ruleset::{Guidance, RuleSet};

/// Number of entries shown in the capped action plan lists.
pub const GUIDANCE_CAP: usize = 3;

/// Canonical, uncapped guidance lists with exact-text duplicates removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComposedGuidance {
    pub recommendations: Vec<String>,
    pub next_steps: Vec<String>,
    pub requirements: Vec<String>,
}

impl ComposedGuidance {
    fn absorb(&mut self, fragments: &Guidance) {
        push_distinct(&mut self.recommendations, &fragments.recommendations);
        push_distinct(&mut self.next_steps, &fragments.next_steps);
        push_distinct(&mut self.requirements, &fragments.requirements);
    }

    /// Capped view; next steps past the cap move to `later_steps`.
    pub fn action_plan(&self) -> ActionPlan {
        let split = self.next_steps.len().min(GUIDANCE_CAP);
        let (priority, later) = self.next_steps.split_at(split);

        ActionPlan {
            priority_actions: priority.to_vec(),
            top_recommendations: self
                .recommendations
                .iter()
                .take(GUIDANCE_CAP)
                .cloned()
                .collect(),
            later_steps: later.to_vec(),
        }
    }
}

/// Category texts first, then contributing rules, then the texts of each
/// required assessment.
pub fn compose_guidance(
    profile: &InputProfile,
    classification: &Classification,
    obligations: &Obligations,
    ruleset: &RuleSet,
) -> ComposedGuidance {
    let mut composed = ComposedGuidance::default();

    if let Some(texts) = ruleset.category_guidance(classification.category) {
        composed.absorb(texts);
    }

    for rule in contributing_rules(profile, classification, ruleset) {
        composed.absorb(&rule.common().guidance);
    }

    for assessment in &obligations.required_assessments {
        if let Some(meta) = ruleset.obligations().assessments.get(assessment) {
            composed.absorb(&meta.guidance);
        }
    }

    composed
}

fn push_distinct(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
