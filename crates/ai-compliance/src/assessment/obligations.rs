use std::collections::BTreeSet;

use serde::Serialize;

use super::classifier::Classification;
use super::domain::{InputProfile, RequiredAssessment, RiskCategory};
use super::ruleset::{Rule, RuleSet};

/// Follow-up assessments and legal grounds derived for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Obligations {
    pub required_assessments: BTreeSet<RequiredAssessment>,
    /// Catalog ids in first-seen order.
    pub reference_ids: Vec<String>,
    /// Citations for `reference_ids`, same order.
    pub legal_references: Vec<String>,
}

pub fn resolve_obligations(
    profile: &InputProfile,
    classification: &Classification,
    ruleset: &RuleSet,
) -> Obligations {
    let mut required = BTreeSet::new();

    if involves_personal_data(profile, ruleset) {
        required.insert(RequiredAssessment::Dpia);
    }

    let fria_category = match classification.category {
        RiskCategory::High => true,
        RiskCategory::Unacceptable => ruleset.obligations().fria_for_unacceptable,
        RiskCategory::Limited | RiskCategory::Minimal => false,
    };
    if fria_category && !profile.decision_impact.is_empty() {
        required.insert(RequiredAssessment::Fria);
    }

    let rules = contributing_rules(profile, classification, ruleset);
    for rule in &rules {
        required.extend(rule.common().obligations.iter().copied());
        if let Rule::Obligation(obligation) = rule {
            required.extend(obligation.assessments.iter().copied());
        }
    }

    let mut reference_ids: Vec<String> = Vec::new();
    let rule_references = rules
        .iter()
        .flat_map(|rule| rule.common().legal_references.iter());
    let assessment_references = required.iter().flat_map(|assessment| {
        ruleset
            .obligations()
            .assessments
            .get(assessment)
            .map(|meta| meta.legal_references.as_slice())
            .unwrap_or_default()
            .iter()
    });
    for id in rule_references.chain(assessment_references) {
        if !reference_ids.contains(id) {
            reference_ids.push(id.clone());
        }
    }

    let legal_references = reference_ids
        .iter()
        .filter_map(|id| ruleset.citation(id))
        .map(str::to_string)
        .collect();

    Obligations {
        required_assessments: required,
        reference_ids,
        legal_references,
    }
}

/// Personal data appears either through the explicit flag or through a
/// data type the document lists as personal.
pub fn involves_personal_data(profile: &InputProfile, ruleset: &RuleSet) -> bool {
    profile.handles_personal_data
        || profile.data_types.iter().any(|data_type| {
            ruleset
                .obligations()
                .personal_data_types
                .iter()
                .any(|personal| personal.eq_ignore_ascii_case(data_type.trim()))
        })
}

/// The assigning category rule followed by every matching score adjustment
/// and obligation rule in document order.
pub fn contributing_rules<'a>(
    profile: &InputProfile,
    classification: &Classification,
    ruleset: &'a RuleSet,
) -> Vec<&'a Rule> {
    let assigning = classification
        .rule_id
        .as_deref()
        .and_then(|id| ruleset.rule(id));

    assigning
        .into_iter()
        .chain(
            ruleset
                .rules()
                .iter()
                .filter(|rule| !matches!(rule, Rule::Category(_)))
                .filter(|rule| rule.matches(profile)),
        )
        .collect()
}
