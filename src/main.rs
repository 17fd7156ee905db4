use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use axum::{routing::get, Router};
use http::HeaderValue;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::SmartIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use event_findr::config::Config;
use event_findr::services::{init, pipeline::PipelineClient};
use event_findr::{middleware, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init::init_tracing();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting Event Findr service");

    let pipeline = PipelineClient::new(&config.pipeline)?;
    tracing::info!(
        "Forwarding chat queries to {} (timeout {}s)",
        init::endpoint_for_log(pipeline.url()),
        config.pipeline.timeout_seconds
    );

    let app_state = Arc::new(AppState {
        config: config.clone(),
        pipeline,
    });

    let thread_shutdown = Arc::new(AtomicBool::new(false));

    // Per-IP rate limiting for the chat endpoints
    let mut chat_builder = GovernorConfigBuilder::default().key_extractor(SmartIpKeyExtractor);
    chat_builder.per_second(config.rate_limit.chat_per_second.into());
    chat_builder.burst_size(config.rate_limit.chat_burst);
    chat_builder.error_handler(middleware::rate_limit::governor_error_response);

    let chat_gov_conf = Arc::new(
        chat_builder
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Failed to build chat governor config"))?,
    );

    // Background cleanup for chat limiter storage
    let chat_cleaner = {
        let limiter = chat_gov_conf.limiter().clone();
        init::spawn_cleanup_thread(
            "Chat rate limiter",
            Duration::from_secs(60),
            thread_shutdown.clone(),
            move || {
                tracing::debug!("chat rate limiter size: {}", limiter.len());
                limiter.retain_recent();
            },
        )
    };

    let chat_rate_layer = GovernorLayer {
        config: chat_gov_conf.clone(),
    };

    let frontend_origin = config
        .server
        .frontend_url
        .parse::<HeaderValue>()
        .map_err(|_| anyhow::anyhow!("Invalid FRONTEND_URL for CORS"))?;

    // Build router
    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/chat", routes::chat::router().layer(chat_rate_layer))
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::csp::security_headers))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(frontend_origin)
                .allow_methods([http::Method::GET, http::Method::POST, http::Method::OPTIONS])
                .allow_headers([http::header::CONTENT_TYPE, http::header::ACCEPT]),
        );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(init::shutdown_signal(thread_shutdown.clone()));

    if let Err(e) = server.await {
        tracing::error!("Server error: {}", e);
    }

    // The cleanup thread checks the shutdown flag every second.
    thread_shutdown.store(true, Ordering::SeqCst);
    if let Err(e) = chat_cleaner.join() {
        tracing::warn!("Chat cleanup thread join failed: {:?}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
