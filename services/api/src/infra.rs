use ai_compliance::assessment::{ComplianceEngine, RulesetSource};
use ai_compliance::config::RulesetConfig;
use ai_compliance::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) engine: Arc<ComplianceEngine>,
}

/// An explicit `--ruleset` path wins over `APP_RULESET_PATH`.
pub(crate) fn ruleset_source(config: &RulesetConfig, path: Option<PathBuf>) -> RulesetSource {
    match path {
        Some(path) => RulesetSource::Path(path),
        None => config.source(),
    }
}

pub(crate) fn load_engine(source: RulesetSource) -> Result<ComplianceEngine, AppError> {
    Ok(ComplianceEngine::load(source)?)
}
