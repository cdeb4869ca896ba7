use crate::cli::ServeArgs;
use crate::infra::{
    AppState, ConfiguredAnalyzer, InMemoryElecIdRepository, InMemoryEvidenceRepository,
    InMemoryEvidenceStorage, InMemoryQualificationRepository,
};
use crate::routes::build_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use elec_mate::config::AppConfig;
use elec_mate::error::AppError;
use elec_mate::telemetry;
use elec_mate::workflows::elec_id::ElecIdService;
use elec_mate::workflows::evidence::EvidenceCaptureService;
use elec_mate::workflows::qualification::QualificationTreeLoader;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let loader = Arc::new(QualificationTreeLoader::new(Arc::new(
        InMemoryQualificationRepository::seeded()?,
    )));

    let analyzer = ConfiguredAnalyzer::from_config(&config.analysis);
    if !analyzer.is_enabled() {
        warn!("APP_ANALYSIS_ENDPOINT not set; evidence will be reviewed without suggestions");
    }
    let evidence = Arc::new(EvidenceCaptureService::new(
        Arc::new(InMemoryEvidenceStorage::new(
            config.evidence.public_base_url.clone(),
        )),
        Arc::new(analyzer),
        Arc::new(InMemoryEvidenceRepository::default()),
        &config.evidence,
    ));

    let elec_id = Arc::new(ElecIdService::new(
        Arc::new(InMemoryElecIdRepository::default()),
        config.credentials,
    ));

    let app = build_router(loader, evidence, elec_id)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "elec-mate api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
