//! Structured seven-point scorecard derived from an assessment result.

use serde::Serialize;

use super::domain::{AssessmentResult, RequiredAssessment, RiskCategory};

const MAX_POINT_SCORE: u8 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewPoint {
    pub key: &'static str,
    pub title: &'static str,
    pub score: u8,
    pub status: &'static str,
}

/// Per-topic scores out of ten plus an overall percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SevenPointReview {
    pub points: Vec<ReviewPoint>,
    pub overall_percent: u8,
}

impl SevenPointReview {
    pub fn from_result(result: &AssessmentResult) -> Self {
        let personal_data = result
            .assessment_details
            .get("personal_data")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        let points = vec![
            point(
                "ai_system",
                "AI system classification",
                if result.category == RiskCategory::Unacceptable {
                    0
                } else {
                    10
                },
            ),
            point(
                "personal_data",
                "Personal data processing",
                if personal_data { 8 } else { 10 },
            ),
            point(
                "gdpr",
                "GDPR compliance",
                if result.requires(RequiredAssessment::Dpia) {
                    9
                } else {
                    7
                },
            ),
            point(
                "ai_act",
                "AI Act compliance",
                MAX_POINT_SCORE.saturating_sub(result.risk_score / 15),
            ),
            point("training", "Training and validation", 8),
            point("resources", "Resources and competences", 7),
            point("requirements", "Fulfilment of requirements", 9),
        ];

        let earned: u32 = points.iter().map(|point| u32::from(point.score)).sum();
        let possible = u32::from(MAX_POINT_SCORE) * points.len() as u32;
        let overall_percent = ((earned * 100 + possible / 2) / possible) as u8;

        Self {
            points,
            overall_percent,
        }
    }
}

fn point(key: &'static str, title: &'static str, score: u8) -> ReviewPoint {
    ReviewPoint {
        key,
        title,
        score,
        status: "completed",
    }
}
