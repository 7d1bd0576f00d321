use crate::infra::AppState;
use ai_compliance::assessment::{
    wizard::total_weight, AssessmentResult, EngineError, InputProfile, RiskCategory,
    RulesetSource, RulesetSummary, SevenPointReview, WizardStep,
};
use ai_compliance::error::AppError;
use axum::body::Bytes;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct DetailedAssessmentRequest {
    pub(crate) system_name: String,
    #[serde(flatten)]
    pub(crate) profile: InputProfile,
}

#[derive(Debug, Serialize)]
pub(crate) struct DetailedAssessmentResponse {
    pub(crate) system_name: String,
    pub(crate) category: RiskCategory,
    pub(crate) result: AssessmentResult,
    pub(crate) review: SevenPointReview,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) wizard: Option<WizardView>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WizardView {
    pub(crate) steps: Vec<WizardStep>,
    pub(crate) current_step: u16,
    pub(crate) total_steps: usize,
    pub(crate) total_weight: u32,
}

impl WizardView {
    fn new(steps: Vec<WizardStep>) -> Self {
        Self {
            current_step: 1,
            total_steps: steps.len(),
            total_weight: total_weight(&steps),
            steps,
        }
    }
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/compliance/quick-check", post(quick_check_endpoint))
        .route(
            "/api/v1/compliance/detailed-assessment",
            post(detailed_assessment_endpoint),
        )
        .route(
            "/api/v1/compliance/assessment-wizard/:classification",
            get(wizard_endpoint),
        )
        .route("/api/v1/compliance/ruleset", get(ruleset_endpoint))
        .route(
            "/api/v1/compliance/ruleset/reload",
            post(reload_ruleset_endpoint),
        )
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({
            "status": "ready",
            "ruleset_version": state.engine.summary().ruleset_version,
        })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn quick_check_endpoint(
    Extension(state): Extension<AppState>,
    Json(profile): Json<InputProfile>,
) -> Result<Json<AssessmentResult>, AppError> {
    let result = state.engine.evaluate(&profile)?;
    Ok(Json(result))
}

pub(crate) async fn detailed_assessment_endpoint(
    Extension(state): Extension<AppState>,
    Json(request): Json<DetailedAssessmentRequest>,
) -> Result<Json<DetailedAssessmentResponse>, AppError> {
    let DetailedAssessmentRequest {
        system_name,
        profile,
    } = request;

    let result = state.engine.evaluate(&profile)?;
    let review = SevenPointReview::from_result(&result);
    let wizard = match state.engine.wizard_steps(result.category.as_str()) {
        Ok(steps) => Some(WizardView::new(steps)),
        Err(EngineError::UnknownCategory(_)) => None,
        Err(err) => return Err(err.into()),
    };

    info!(
        system = %system_name,
        category = %result.category,
        decision = result.decision.label(),
        "detailed assessment completed"
    );

    Ok(Json(DetailedAssessmentResponse {
        system_name,
        category: result.category,
        result,
        review,
        wizard,
    }))
}

pub(crate) async fn wizard_endpoint(
    Extension(state): Extension<AppState>,
    Path(classification): Path<String>,
) -> Result<Json<WizardView>, AppError> {
    let steps = state.engine.wizard_steps(&classification)?;
    Ok(Json(WizardView::new(steps)))
}

pub(crate) async fn ruleset_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<RulesetSummary> {
    Json(state.engine.summary())
}

pub(crate) async fn reload_ruleset_endpoint(
    Extension(state): Extension<AppState>,
    body: Bytes,
) -> Result<Json<RulesetSummary>, AppError> {
    // Parsing and validating a large document must not stall the runtime.
    let engine = state.engine.clone();
    let summary = tokio::task::spawn_blocking(move || {
        engine.reload(RulesetSource::Bytes(body.to_vec()))
    })
    .await
    .map_err(axum::Error::new)??;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_compliance::assessment::{ComplianceEngine, RuleSet};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state(ready: bool) -> AppState {
        let ruleset = RuleSet::embedded().expect("embedded ruleset is valid");
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            engine: Arc::new(ComplianceEngine::new(ruleset)),
        }
    }

    fn hr_profile() -> Value {
        json!({
            "description": "Screens and shortlists job applicants",
            "ai_system_type": "ml",
            "sector": "HR",
            "handles_personal_data": true,
            "automated_decisions": true,
            "data_types": ["contact"],
            "decision_type": "ranking",
            "decision_impact": ["employment"]
        })
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request builds")
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body collects");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn quick_check_returns_the_assessment() {
        let app = router(state(true));

        let (status, body) = send(
            app,
            post_json("/api/v1/compliance/quick-check", &hr_profile()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], json!("high"));
        assert_eq!(body["decision"], json!("NO_GO"));
        assert_eq!(body["required_assessments"], json!(["DPIA", "FRIA"]));
        assert_eq!(body["action_plan"]["priority_actions"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn quick_check_rejects_unknown_vocabulary() {
        let app = router(state(true));
        let mut profile = hr_profile();
        profile["sector"] = json!("aerospace");

        let (status, body) = send(app, post_json("/api/v1/compliance/quick-check", &profile)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], json!("unrecognized_profile_field"));
    }

    #[tokio::test]
    async fn detailed_assessment_bundles_review_and_wizard() {
        let app = router(state(true));
        let mut request = hr_profile();
        request["system_name"] = json!("Applicant Ranker");

        let (status, body) = send(
            app,
            post_json("/api/v1/compliance/detailed-assessment", &request),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["system_name"], json!("Applicant Ranker"));
        assert_eq!(body["category"], json!("high"));
        assert_eq!(body["review"]["points"].as_array().map(Vec::len), Some(7));
        assert_eq!(body["wizard"]["total_steps"], json!(7));
        assert_eq!(body["wizard"]["current_step"], json!(1));
    }

    #[tokio::test]
    async fn wizard_endpoint_lists_steps() {
        let app = router(state(true));

        let (status, body) = send(app, get("/api/v1/compliance/assessment-wizard/limited")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_steps"], json!(4));
        assert_eq!(body["steps"][0]["position"], json!(1));
        assert_eq!(body["steps"][0]["completed"], json!(false));
    }

    #[tokio::test]
    async fn wizard_endpoint_reports_unknown_categories() {
        let app = router(state(true));

        let (status, body) = send(app, get("/api/v1/compliance/assessment-wizard/severe")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], json!("unknown_category"));
    }

    #[tokio::test]
    async fn reload_rejects_bad_documents_and_keeps_serving() {
        let state = state(true);
        let before = state.engine.summary();

        let (status, body) = send(
            router(state.clone()),
            post_json(
                "/api/v1/compliance/ruleset/reload",
                &json!({ "schema_version": "9" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], json!("ruleset_invalid"));

        let (status, body) = send(router(state), get("/api/v1/compliance/ruleset")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ruleset_version"], json!(before.ruleset_version));
    }

    #[tokio::test]
    async fn reload_accepts_a_valid_document() {
        let state = state(true);
        let mut document: Value =
            serde_json::from_str(ai_compliance::assessment::ruleset::EMBEDDED_RULESET)
                .expect("embedded ruleset is JSON");
        document["ruleset_version"] = json!("2025.3-hotfix");

        let (status, body) = send(
            router(state.clone()),
            post_json("/api/v1/compliance/ruleset/reload", &document),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ruleset_version"], json!("2025.3-hotfix"));
        assert_eq!(state.engine.summary().ruleset_version, "2025.3-hotfix");
    }

    #[tokio::test]
    async fn reload_rejects_misspelled_rule_keys() {
        let state = state(true);
        let mut document: Value =
            serde_json::from_str(ai_compliance::assessment::ruleset::EMBEDDED_RULESET)
                .expect("embedded ruleset is JSON");
        document["ruleset_version"] = json!("2025.3-typo");
        document["rules"][0]["legal_refs"] = json!(["ai_act_art5"]);

        let (status, body) = send(
            router(state.clone()),
            post_json("/api/v1/compliance/ruleset/reload", &document),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], json!("ruleset_invalid"));
        assert_eq!(state.engine.summary().ruleset_version, "2025.2-eu-ai-act");
    }

    #[tokio::test]
    async fn readiness_reflects_startup_state() {
        let (status, body) = send(router(state(false)), get("/ready")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], json!("initializing"));

        let (status, body) = send(router(state(true)), get("/ready")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ruleset_version"], json!("2025.2-eu-ai-act"));
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let (status, body) = send(router(state(false)), get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("ok"));
    }
}
