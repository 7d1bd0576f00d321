use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Caller supplied description of the AI system under assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputProfile {
    pub description: String,
    pub ai_system_type: String,
    pub sector: String,
    pub handles_personal_data: bool,
    pub automated_decisions: bool,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub data_types: Vec<String>,
    #[serde(default = "default_decision_type")]
    pub decision_type: String,
    #[serde(default)]
    pub decision_impact: Vec<String>,
}

pub(crate) fn default_role() -> String {
    "deployer".to_string()
}

pub(crate) fn default_decision_type() -> String {
    "monitoring".to_string()
}

impl InputProfile {
    /// Distinct decision impact tags in first-seen order.
    pub fn distinct_impacts(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for impact in &self.decision_impact {
            if !seen.iter().any(|known| known.eq_ignore_ascii_case(impact)) {
                seen.push(impact.as_str());
            }
        }
        seen
    }
}

/// Four-tier regulatory risk ladder, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Minimal,
    Limited,
    High,
    Unacceptable,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 4] = [
        RiskCategory::Unacceptable,
        RiskCategory::High,
        RiskCategory::Limited,
        RiskCategory::Minimal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Minimal => "minimal",
            RiskCategory::Limited => "limited",
            RiskCategory::High => "high",
            RiskCategory::Unacceptable => "unacceptable",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string does not name one of the four categories.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a risk category")]
pub struct ParseCategoryError(pub String);

impl FromStr for RiskCategory {
    type Err = ParseCategoryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "unacceptable" | "prohibited" => Ok(RiskCategory::Unacceptable),
            "high" | "high_risk" => Ok(RiskCategory::High),
            "limited" | "limited_risk" => Ok(RiskCategory::Limited),
            "minimal" | "minimal_risk" => Ok(RiskCategory::Minimal),
            _ => Err(ParseCategoryError(raw.to_string())),
        }
    }
}

/// Go/no-go outcome of an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Go,
    ConditionalGo,
    NoGo,
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Go => "GO",
            Decision::ConditionalGo => "CONDITIONAL_GO",
            Decision::NoGo => "NO_GO",
        }
    }
}

/// Mandatory follow-up analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RequiredAssessment {
    #[serde(rename = "DPIA")]
    Dpia,
    #[serde(rename = "FRIA")]
    Fria,
}

impl RequiredAssessment {
    pub fn label(&self) -> &'static str {
        match self {
            RequiredAssessment::Dpia => "DPIA",
            RequiredAssessment::Fria => "FRIA",
        }
    }
}

/// Capped presentation view over the canonical guidance lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub priority_actions: Vec<String>,
    pub top_recommendations: Vec<String>,
    pub later_steps: Vec<String>,
}

/// Output of a single evaluation. Built once and handed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub category: RiskCategory,
    pub risk_score: u8,
    pub risk_level: String,
    pub decision: Decision,
    pub compliance_status: String,
    pub recommendations: Vec<String>,
    pub next_steps: Vec<String>,
    pub requirements: Vec<String>,
    pub required_assessments: BTreeSet<RequiredAssessment>,
    pub legal_references: Vec<String>,
    pub action_plan: ActionPlan,
    pub assessment_details: BTreeMap<String, serde_json::Value>,
}

impl AssessmentResult {
    pub fn requires(&self, assessment: RequiredAssessment) -> bool {
        self.required_assessments.contains(&assessment)
    }
}

/// One stage of the guided, category-specific walkthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardStep {
    pub position: u16,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub weight: u8,
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_aliases_case_insensitively() {
        assert_eq!("HIGH".parse::<RiskCategory>(), Ok(RiskCategory::High));
        assert_eq!(
            "minimal_risk".parse::<RiskCategory>(),
            Ok(RiskCategory::Minimal)
        );
        assert_eq!(
            "Prohibited".parse::<RiskCategory>(),
            Ok(RiskCategory::Unacceptable)
        );
        assert!("severe".parse::<RiskCategory>().is_err());
    }

    #[test]
    fn category_order_follows_severity() {
        assert!(RiskCategory::Unacceptable > RiskCategory::High);
        assert!(RiskCategory::Limited > RiskCategory::Minimal);
    }

    #[test]
    fn profile_defaults_apply_when_fields_missing() {
        let profile: InputProfile = serde_json::from_value(serde_json::json!({
            "description": "Ticket triage",
            "ai_system_type": "nlp",
            "sector": "public",
            "handles_personal_data": false,
            "automated_decisions": false
        }))
        .expect("profile parses");

        assert_eq!(profile.role, "deployer");
        assert_eq!(profile.decision_type, "monitoring");
        assert!(profile.data_types.is_empty());
    }

    #[test]
    fn distinct_impacts_ignores_case_duplicates() {
        let profile = InputProfile {
            description: String::new(),
            ai_system_type: "ml".into(),
            sector: "hr".into(),
            handles_personal_data: true,
            automated_decisions: true,
            role: default_role(),
            data_types: Vec::new(),
            decision_type: default_decision_type(),
            decision_impact: vec!["employment".into(), "Employment".into(), "credit".into()],
        };

        assert_eq!(profile.distinct_impacts(), vec!["employment", "credit"]);
    }

    #[test]
    fn decisions_serialize_as_screaming_snake() {
        let value = serde_json::to_value(Decision::ConditionalGo).expect("serializes");
        assert_eq!(value, serde_json::json!("CONDITIONAL_GO"));
    }
}
