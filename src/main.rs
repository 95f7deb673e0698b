use axum::{
    http::{header::ACCEPT, Method},
    Router,
};
use dotenv::dotenv;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use trainee_publisher::{
    config::Config,
    core::{
        clock::{Clock, SystemClock},
        logging,
        observability::TracingAlertSink,
        publishing::PublishPipeline,
    },
    domain::ConditionsOfJoiningSignedEvent,
    infrastructure::broker::InMemoryBroker,
    routes,
    services::ConditionsOfJoiningPublisher,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::init()?;
    logging::init_logging_with_config(&config.logging)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    // Loopback broker; a real client plugs in through `BrokerClient`.
    let broker = Arc::new(InMemoryBroker::with_auto_confirm(clock.clone()));

    let pipeline = PublishPipeline::<ConditionsOfJoiningSignedEvent>::new(
        broker,
        Arc::new(TracingAlertSink),
        clock.clone(),
        config.publisher.clone(),
    )
    .await?;
    let scheduler = pipeline.scheduler();
    scheduler.start().await?;

    let app_state = AppState {
        publisher: Arc::new(ConditionsOfJoiningPublisher::new(
            pipeline.gateway().clone(),
            clock,
        )),
        pipeline: Arc::new(pipeline),
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers([ACCEPT]);

    let app = Router::new()
        .nest("/api", routes::publisher_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    info!(
        port = config.port,
        exchange = %config.publisher.exchange,
        max_retries = config.publisher.max_retries,
        "Trainee publisher started"
    );

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    scheduler.stop().await?;
    info!("Trainee publisher stopped");
    Ok(())
}
