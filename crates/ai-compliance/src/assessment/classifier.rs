use serde::Serialize;
use tracing::debug;

use super::domain::{InputProfile, RiskCategory};
use super::ruleset::{CategoryRule, RuleSet};

/// Category assigned to a profile together with the rule that assigned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: RiskCategory,
    /// `None` when no category rule matched and the default applied.
    pub rule_id: Option<String>,
}

/// Two passes: `unacceptable` rules first regardless of document position,
/// then the remaining category rules by priority. No match defaults to
/// `minimal`.
pub fn classify(profile: &InputProfile, ruleset: &RuleSet) -> Classification {
    let matched = first_match(ruleset.override_rules(), profile)
        .or_else(|| first_match(ruleset.ordinary_category_rules(), profile));

    let classification = match matched {
        Some(rule) => Classification {
            category: rule.category,
            rule_id: Some(rule.common.id.clone()),
        },
        None => Classification {
            category: RiskCategory::Minimal,
            rule_id: None,
        },
    };

    debug!(
        category = %classification.category,
        rule = classification.rule_id.as_deref().unwrap_or("default"),
        "profile classified"
    );
    classification
}

fn first_match<'a>(
    mut rules: impl Iterator<Item = &'a CategoryRule>,
    profile: &InputProfile,
) -> Option<&'a CategoryRule> {
    rules.find(|rule| rule.common.predicate.matches(profile))
}
