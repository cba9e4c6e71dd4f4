use crate::generation::pipeline::AnalysisPipeline;
use crate::session::AnalysisGuard;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Carries the injected generation service and per-call timeout.
    pub pipeline: AnalysisPipeline,
    pub guard: AnalysisGuard,
}
