use super::domain::{RiskCategory, WizardStep};
use super::error::EngineError;
use super::ruleset::RuleSet;

/// Ordered guided-assessment steps for a category. Independent of any profile.
pub fn wizard_steps(category: RiskCategory, ruleset: &RuleSet) -> Result<Vec<WizardStep>, EngineError> {
    ruleset
        .wizard_template(category)
        .map(<[WizardStep]>::to_vec)
        .ok_or_else(|| EngineError::UnknownCategory(category.to_string()))
}

/// Sum of step weights, used by reporting to normalise progress.
pub fn total_weight(steps: &[WizardStep]) -> u32 {
    steps.iter().map(|step| u32::from(step.weight)).sum()
}
