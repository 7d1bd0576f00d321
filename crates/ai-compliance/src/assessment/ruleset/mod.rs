//! Immutable, validated rule model loaded from a ruleset document.
//!
//! A [`RuleSet`] is built once per document by [`RuleSet::load`] and never
//! mutated afterwards. Loading either produces a fully checked model or a
//! [`RulesetError`] naming the offending rule (or section) and field.

mod document;
mod predicate;
mod validate;

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::domain::{Decision, InputProfile, RequiredAssessment, RiskCategory, WizardStep};
use super::error::EngineError;
use document::{RulesetDocument, SchemaHeader, SUPPORTED_SCHEMA_VERSION};

pub use predicate::{FlagField, Predicate, SetField, TagField, TextField};

/// Ruleset shipped with the crate: the EU AI Act four-tier ladder.
pub const EMBEDDED_RULESET: &str = include_str!("../../../rulesets/eu_ai_act.json");

/// Where a ruleset document is read from.
#[derive(Debug, Clone)]
pub enum RulesetSource {
    Embedded,
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// Load failures. Nothing is partially applied when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum RulesetError {
    #[error("unable to read ruleset document {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ruleset document is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported ruleset schema version '{found}' (supported: {supported})")]
    UnsupportedSchema {
        found: String,
        supported: &'static str,
    },
    #[error("rule '{rule}', field '{field}': {reason}")]
    Invalid {
        rule: String,
        field: String,
        reason: String,
    },
}

impl RulesetError {
    pub(crate) fn invalid(
        rule: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        RulesetError::Invalid {
            rule: rule.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Recognized tag vocabularies, one per tag field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pub ai_system_types: Vec<String>,
    pub sectors: Vec<String>,
    pub roles: Vec<String>,
    pub data_types: Vec<String>,
    pub decision_types: Vec<String>,
    pub decision_impacts: Vec<String>,
}

impl Vocabulary {
    pub fn terms(&self, field: TagField) -> &[String] {
        match field {
            TagField::AiSystemType => &self.ai_system_types,
            TagField::Sector => &self.sectors,
            TagField::Role => &self.roles,
            TagField::DataTypes => &self.data_types,
            TagField::DecisionType => &self.decision_types,
            TagField::DecisionImpact => &self.decision_impacts,
        }
    }

    pub fn recognizes(&self, field: TagField, value: &str) -> bool {
        let value = value.trim();
        self.terms(field)
            .iter()
            .any(|term| term.eq_ignore_ascii_case(value))
    }

    /// Reject the first tag in the profile that falls outside its vocabulary.
    pub fn check(&self, profile: &InputProfile) -> Result<(), EngineError> {
        for field in TagField::ALL {
            if let Some(value) = field
                .values(profile)
                .into_iter()
                .find(|value| !self.recognizes(field, value))
            {
                return Err(EngineError::UnrecognizedProfileField {
                    field: field.name(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Text fragments attached to rules, categories and assessments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guidance {
    pub recommendations: Vec<String>,
    pub next_steps: Vec<String>,
    pub requirements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Band {
    pub label: String,
    pub min_score: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionThresholds {
    pub go_below: u8,
    pub no_go_at: u8,
}

/// Document-configured scoring constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringModel {
    pub baselines: BTreeMap<RiskCategory, u8>,
    pub personal_data_delta: u8,
    pub automated_decisions_delta: u8,
    /// Keyed by lowercase decision impact tag.
    pub decision_impact_deltas: BTreeMap<String, u8>,
    /// Ascending by `min_score`, first band starts at 0.
    pub bands: Vec<Band>,
    pub thresholds: DecisionThresholds,
}

impl ScoringModel {
    pub fn impact_delta(&self, impact: &str) -> u8 {
        self.decision_impact_deltas
            .get(&impact.trim().to_ascii_lowercase())
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTemplates {
    pub go: String,
    pub conditional_go: String,
    pub no_go: String,
    pub prohibited: String,
}

impl StatusTemplates {
    pub fn render(&self, decision: Decision, category: RiskCategory) -> String {
        let template = match (category, decision) {
            (RiskCategory::Unacceptable, _) => &self.prohibited,
            (_, Decision::Go) => &self.go,
            (_, Decision::ConditionalGo) => &self.conditional_go,
            (_, Decision::NoGo) => &self.no_go,
        };
        template.replace("{category}", category.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssessmentMeta {
    pub legal_references: Vec<String>,
    pub guidance: Guidance,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObligationModel {
    pub personal_data_types: Vec<String>,
    pub fria_for_unacceptable: bool,
    pub assessments: BTreeMap<RequiredAssessment, AssessmentMeta>,
}

/// Metadata every rule shape carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCommon {
    pub id: String,
    pub predicate: Predicate,
    /// Catalog ids, resolved at load.
    pub legal_references: Vec<String>,
    pub guidance: Guidance,
    pub obligations: Vec<RequiredAssessment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub common: RuleCommon,
    pub category: RiskCategory,
    pub priority: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRule {
    pub common: RuleCommon,
    pub delta: i8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObligationRule {
    pub common: RuleCommon,
    pub assessments: Vec<RequiredAssessment>,
}

/// Closed set of rule shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Category(CategoryRule),
    ScoreAdjustment(ScoreRule),
    Obligation(ObligationRule),
}

impl Rule {
    pub fn common(&self) -> &RuleCommon {
        match self {
            Rule::Category(rule) => &rule.common,
            Rule::ScoreAdjustment(rule) => &rule.common,
            Rule::Obligation(rule) => &rule.common,
        }
    }

    pub fn id(&self) -> &str {
        &self.common().id
    }

    pub fn matches(&self, profile: &InputProfile) -> bool {
        self.common().predicate.matches(profile)
    }
}

/// Validated, immutable rule model.
#[derive(Debug, Clone)]
pub struct RuleSet {
    schema_version: String,
    version: String,
    effective_from: NaiveDate,
    vocabulary: Vocabulary,
    references: BTreeMap<String, String>,
    scoring: ScoringModel,
    statuses: StatusTemplates,
    obligations: ObligationModel,
    category_guidance: BTreeMap<RiskCategory, Guidance>,
    rules: Vec<Rule>,
    override_order: Vec<usize>,
    category_order: Vec<usize>,
    wizard: BTreeMap<RiskCategory, Vec<WizardStep>>,
}

impl RuleSet {
    pub fn load(source: RulesetSource) -> Result<Self, RulesetError> {
        match source {
            RulesetSource::Embedded => Self::from_slice(EMBEDDED_RULESET.as_bytes()),
            RulesetSource::Bytes(bytes) => Self::from_slice(&bytes),
            RulesetSource::Path(path) => {
                let bytes = std::fs::read(&path)
                    .map_err(|source| RulesetError::Read { path, source })?;
                Self::from_slice(&bytes)
            }
        }
    }

    pub fn embedded() -> Result<Self, RulesetError> {
        Self::load(RulesetSource::Embedded)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, RulesetError> {
        let header: SchemaHeader = serde_json::from_slice(bytes)?;
        if header.schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(RulesetError::UnsupportedSchema {
                found: header.schema_version,
                supported: SUPPORTED_SCHEMA_VERSION,
            });
        }

        let document: RulesetDocument = serde_json::from_slice(bytes)?;
        let ruleset = validate::compile(document)?;
        info!(
            ruleset_version = %ruleset.version,
            rules = ruleset.rules.len(),
            "ruleset loaded"
        );
        Ok(ruleset)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn effective_from(&self) -> NaiveDate {
        self.effective_from
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn scoring(&self) -> &ScoringModel {
        &self.scoring
    }

    pub fn statuses(&self) -> &StatusTemplates {
        &self.statuses
    }

    pub fn obligations(&self) -> &ObligationModel {
        &self.obligations
    }

    pub fn category_guidance(&self, category: RiskCategory) -> Option<&Guidance> {
        self.category_guidance.get(&category)
    }

    /// Rules in document order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id() == id)
    }

    /// `unacceptable` category rules by ascending priority.
    pub fn override_rules(&self) -> impl Iterator<Item = &CategoryRule> + '_ {
        self.category_rules_at(&self.override_order)
    }

    /// Remaining category rules by ascending priority.
    pub fn ordinary_category_rules(&self) -> impl Iterator<Item = &CategoryRule> + '_ {
        self.category_rules_at(&self.category_order)
    }

    fn category_rules_at<'a>(
        &'a self,
        order: &'a [usize],
    ) -> impl Iterator<Item = &'a CategoryRule> + 'a {
        order.iter().filter_map(move |index| match &self.rules[*index] {
            Rule::Category(rule) => Some(rule),
            _ => None,
        })
    }

    pub fn citation(&self, reference_id: &str) -> Option<&str> {
        self.references.get(reference_id).map(String::as_str)
    }

    pub fn wizard_template(&self, category: RiskCategory) -> Option<&[WizardStep]> {
        self.wizard.get(&category).map(Vec::as_slice)
    }

    pub fn summary(&self) -> RulesetSummary {
        RulesetSummary {
            schema_version: self.schema_version.clone(),
            ruleset_version: self.version.clone(),
            effective_from: self.effective_from,
            rule_count: self.rules.len(),
            wizard_categories: self.wizard.keys().copied().collect(),
        }
    }
}

/// Identifying facts about a loaded ruleset for reload/validate responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RulesetSummary {
    pub schema_version: String,
    pub ruleset_version: String,
    pub effective_from: NaiveDate,
    pub rule_count: usize,
    pub wizard_categories: Vec<RiskCategory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_ruleset_loads() {
        let ruleset = RuleSet::embedded().expect("embedded ruleset is valid");

        assert_eq!(ruleset.summary().schema_version, "1");
        assert!(ruleset.override_rules().count() >= 1);
        assert!(ruleset.ordinary_category_rules().count() >= 1);
        for category in RiskCategory::ALL {
            assert!(ruleset.scoring().baselines.contains_key(&category));
            assert!(ruleset.wizard_template(category).is_some());
        }
    }

    #[test]
    fn override_rules_only_target_unacceptable() {
        let ruleset = RuleSet::embedded().expect("embedded ruleset is valid");

        assert!(ruleset
            .override_rules()
            .all(|rule| rule.category == RiskCategory::Unacceptable));
        assert!(ruleset
            .ordinary_category_rules()
            .all(|rule| rule.category != RiskCategory::Unacceptable));
    }

    #[test]
    fn status_templates_substitute_category() {
        let statuses = StatusTemplates {
            go: "{category}: cleared".to_string(),
            conditional_go: "{category}: conditions".to_string(),
            no_go: "{category}: blocked".to_string(),
            prohibited: "prohibited practice".to_string(),
        };

        assert_eq!(
            statuses.render(Decision::ConditionalGo, RiskCategory::Limited),
            "limited: conditions"
        );
        assert_eq!(
            statuses.render(Decision::Go, RiskCategory::Unacceptable),
            "prohibited practice"
        );
    }

    #[test]
    fn missing_file_reports_path() {
        let path = PathBuf::from("/nonexistent/ruleset.json");
        match RuleSet::load(RulesetSource::Path(path.clone())) {
            Err(RulesetError::Read { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected read error, got {other:?}"),
        }
    }
}
