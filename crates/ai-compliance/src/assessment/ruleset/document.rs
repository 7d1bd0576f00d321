//! Serde model of the externally authored ruleset document.
//!
//! These types mirror the JSON exactly and carry no guarantees; `validate`
//! turns them into the checked [`super::RuleSet`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::assessment::domain::RequiredAssessment;

pub(crate) const SUPPORTED_SCHEMA_VERSION: &str = "1";

/// Only the version tag, read before the full parse so unknown schemas are
/// rejected without guessing at their layout.
#[derive(Debug, Deserialize)]
pub(crate) struct SchemaHeader {
    pub schema_version: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RulesetDocument {
    pub schema_version: String,
    pub ruleset_version: String,
    pub effective_from: NaiveDate,
    pub vocabulary: VocabularyDoc,
    pub legal_references: Vec<LegalReferenceDoc>,
    pub scoring: ScoringDoc,
    pub compliance_status: ComplianceStatusDoc,
    #[serde(default)]
    pub obligations: ObligationsDoc,
    #[serde(default)]
    pub category_guidance: BTreeMap<String, GuidanceDoc>,
    pub rules: Vec<RuleDoc>,
    #[serde(default)]
    pub wizard: BTreeMap<String, Vec<WizardStepDoc>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct VocabularyDoc {
    pub ai_system_types: Vec<String>,
    pub sectors: Vec<String>,
    pub roles: Vec<String>,
    #[serde(default)]
    pub data_types: Vec<String>,
    pub decision_types: Vec<String>,
    #[serde(default)]
    pub decision_impacts: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LegalReferenceDoc {
    pub id: String,
    pub citation: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScoringDoc {
    pub baselines: BTreeMap<String, i32>,
    pub personal_data_delta: i32,
    pub automated_decisions_delta: i32,
    #[serde(default)]
    pub decision_impact_deltas: BTreeMap<String, i32>,
    pub bands: Vec<BandDoc>,
    pub decision_thresholds: ThresholdsDoc,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BandDoc {
    pub label: String,
    pub min_score: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ThresholdsDoc {
    pub go_below: i32,
    pub no_go_at: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ComplianceStatusDoc {
    pub go: String,
    pub conditional_go: String,
    pub no_go: String,
    pub prohibited: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ObligationsDoc {
    #[serde(default)]
    pub personal_data_types: Vec<String>,
    #[serde(default)]
    pub fria_for_unacceptable: bool,
    #[serde(default)]
    pub assessments: BTreeMap<RequiredAssessment, AssessmentDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct AssessmentDoc {
    #[serde(default)]
    pub legal_references: Vec<String>,
    #[serde(default)]
    pub guidance: GuidanceDoc,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GuidanceDoc {
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
}

/// Every rule shape carries its own legal references, guidance and
/// obligation triggers. Misspelled keys fail the parse.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub(crate) enum RuleDoc {
    Category {
        id: String,
        priority: u32,
        category: String,
        when: PredicateDoc,
        #[serde(default)]
        legal_references: Vec<String>,
        #[serde(default)]
        guidance: GuidanceDoc,
        #[serde(default)]
        obligations: Vec<RequiredAssessment>,
    },
    ScoreAdjustment {
        id: String,
        delta: i32,
        when: PredicateDoc,
        #[serde(default)]
        legal_references: Vec<String>,
        #[serde(default)]
        guidance: GuidanceDoc,
        #[serde(default)]
        obligations: Vec<RequiredAssessment>,
    },
    Obligation {
        id: String,
        assessments: Vec<RequiredAssessment>,
        when: PredicateDoc,
        #[serde(default)]
        legal_references: Vec<String>,
        #[serde(default)]
        guidance: GuidanceDoc,
        #[serde(default)]
        obligations: Vec<RequiredAssessment>,
    },
}

impl RuleDoc {
    pub fn id(&self) -> &str {
        match self {
            RuleDoc::Category { id, .. }
            | RuleDoc::ScoreAdjustment { id, .. }
            | RuleDoc::Obligation { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub(crate) enum PredicateDoc {
    Always,
    All(Vec<PredicateDoc>),
    Any(Vec<PredicateDoc>),
    Not(Box<PredicateDoc>),
    TagIn { field: String, values: Vec<String> },
    Flag { field: String, value: bool },
    Mentions { field: String, keywords: Vec<String> },
    NonEmpty { field: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WizardStepDoc {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub weight: u8,
}
