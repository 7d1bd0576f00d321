//! AI system risk classification against a versioned ruleset document.
//!
//! The flow for one profile is vocabulary check, classification, scoring and
//! obligation resolution, then guidance composition. Every step is a pure
//! function of the profile and an immutable [`RuleSet`]; [`ComplianceEngine`]
//! owns the active ruleset handle and its atomic reload.

pub mod classifier;
pub mod domain;
pub mod engine;
pub mod error;
pub mod guidance;
pub mod import;
pub mod obligations;
pub mod report;
pub mod ruleset;
pub mod scoring;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use classifier::{classify, Classification};
pub use domain::{
    ActionPlan, AssessmentResult, Decision, InputProfile, ParseCategoryError, RequiredAssessment,
    RiskCategory, WizardStep,
};
pub use engine::{evaluate, ComplianceEngine};
pub use error::EngineError;
pub use guidance::{compose_guidance, ComposedGuidance, GUIDANCE_CAP};
pub use import::{ImportedProfile, ProfileCsvImporter, ProfileImportError};
pub use obligations::{resolve_obligations, Obligations};
pub use report::{ReviewPoint, SevenPointReview};
pub use ruleset::{RuleSet, RulesetError, RulesetSource, RulesetSummary};
pub use scoring::{score, ScoreComponent, ScoreOutcome};
pub use wizard::wizard_steps;
