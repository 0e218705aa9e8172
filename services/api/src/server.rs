use crate::cli::ServeArgs;
use crate::infra::{merge_profile_settings, AppState, InMemorySessionRepository};
use crate::routes::with_profile_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use boundary_profile::assessment::{AssessmentService, LikertAssessment, ProfileEngine};
use boundary_profile::config::AppConfig;
use boundary_profile::error::AppError;
use boundary_profile::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    config.profile = merge_profile_settings(config.profile, args.profile);

    telemetry::init(&config.telemetry)?;

    let engine = Arc::new(ProfileEngine::from_settings(&config.profile)?);
    let likert = Arc::new(LikertAssessment::standard()?);
    info!(
        items = engine.bank().len(),
        archetypes = engine.catalog().len(),
        balance_threshold = engine.policy().balance_threshold,
        "profile engine loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        engine: engine.clone(),
        likert,
    };

    let repository = Arc::new(InMemorySessionRepository::default());
    let assessment_service = Arc::new(AssessmentService::new(engine, repository));

    let app = with_profile_routes(assessment_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "boundary profile service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
