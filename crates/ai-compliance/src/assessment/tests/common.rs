use serde_json::{json, Value};

use crate::assessment::domain::InputProfile;
use crate::assessment::engine::ComplianceEngine;
use crate::assessment::ruleset::{RuleSet, RulesetError, EMBEDDED_RULESET};

pub(super) fn embedded() -> RuleSet {
    RuleSet::embedded().expect("embedded ruleset is valid")
}

pub(super) fn engine() -> ComplianceEngine {
    ComplianceEngine::new(embedded())
}

pub(super) fn embedded_document() -> Value {
    serde_json::from_str(EMBEDDED_RULESET).expect("embedded ruleset is JSON")
}

pub(super) fn load(document: &Value) -> Result<RuleSet, RulesetError> {
    let bytes = serde_json::to_vec(document).expect("document serializes");
    RuleSet::from_slice(&bytes)
}

pub(super) fn bytes(document: &Value) -> Vec<u8> {
    serde_json::to_vec(document).expect("document serializes")
}

/// Small hand-written document. The ordinary `hr_high` rule is listed first
/// with the lowest priority; the `unacceptable` rule sits last.
pub(super) fn small_document() -> Value {
    json!({
        "schema_version": "1",
        "ruleset_version": "test-1",
        "effective_from": "2025-01-01",
        "vocabulary": {
            "ai_system_types": ["ml", "chatbot"],
            "sectors": ["hr", "retail", "public"],
            "roles": ["deployer", "provider"],
            "data_types": ["contact", "technical"],
            "decision_types": ["monitoring", "ranking"],
            "decision_impacts": ["employment", "access"]
        },
        "legal_references": [
            { "id": "art5", "citation": "Article 5" },
            { "id": "art6", "citation": "Article 6" },
            { "id": "art27", "citation": "Article 27" },
            { "id": "art35", "citation": "Article 35" }
        ],
        "scoring": {
            "baselines": { "unacceptable": 100, "high": 70, "limited": 40, "minimal": 10 },
            "personal_data_delta": 10,
            "automated_decisions_delta": 10,
            "decision_impact_deltas": { "employment": 10 },
            "bands": [
                { "label": "LOW", "min_score": 0 },
                { "label": "HIGH", "min_score": 50 }
            ],
            "decision_thresholds": { "go_below": 30, "no_go_at": 90 }
        },
        "compliance_status": {
            "go": "{category}: go",
            "conditional_go": "{category}: conditional",
            "no_go": "{category}: stop",
            "prohibited": "prohibited"
        },
        "obligations": {
            "personal_data_types": ["contact"],
            "assessments": {
                "DPIA": { "legal_references": ["art35"] },
                "FRIA": { "legal_references": ["art27"] }
            }
        },
        "rules": [
            {
                "kind": "category",
                "id": "hr_high",
                "priority": 1,
                "category": "high",
                "when": { "tag_in": { "field": "sector", "values": ["hr"] } },
                "legal_references": ["art6"]
            },
            {
                "kind": "category",
                "id": "social_scoring",
                "priority": 99,
                "category": "unacceptable",
                "when": { "mentions": { "field": "description", "keywords": ["Social Scoring"] } },
                "legal_references": ["art5"]
            }
        ],
        "wizard": {
            "high": [
                { "title": "Classify", "weight": 50 },
                { "title": "Document", "description": "Collect evidence", "weight": 50 }
            ]
        }
    })
}

pub(super) fn rules_mut(document: &mut Value) -> &mut Vec<Value> {
    document["rules"]
        .as_array_mut()
        .expect("document has a rules array")
}

/// Neutral profile that matches no category rule in either document.
pub(super) fn profile(ai_system_type: &str, sector: &str) -> InputProfile {
    InputProfile {
        description: "Internal analytics dashboard".to_string(),
        ai_system_type: ai_system_type.to_string(),
        sector: sector.to_string(),
        handles_personal_data: false,
        automated_decisions: false,
        role: "deployer".to_string(),
        data_types: Vec::new(),
        decision_type: "monitoring".to_string(),
        decision_impact: Vec::new(),
    }
}

/// HR screening with automated decisions over personal data.
pub(super) fn hr_screening() -> InputProfile {
    InputProfile {
        description: "Screens and shortlists job applicants".to_string(),
        ai_system_type: "ml".to_string(),
        sector: "HR".to_string(),
        handles_personal_data: true,
        automated_decisions: true,
        role: "deployer".to_string(),
        data_types: vec!["contact".to_string(), "employment_history".to_string()],
        decision_type: "ranking".to_string(),
        decision_impact: vec!["employment".to_string()],
    }
}

/// Stock forecasting on technical data only.
pub(super) fn stock_forecast() -> InputProfile {
    InputProfile {
        description: "Forecasts warehouse stock levels".to_string(),
        data_types: vec!["technical".to_string()],
        ..profile("ml", "retail")
    }
}

/// Social scoring use case with no other triggers.
pub(super) fn social_scoring() -> InputProfile {
    InputProfile {
        description: "Citizen social scoring for benefit eligibility".to_string(),
        ..profile("ml", "public")
    }
}
