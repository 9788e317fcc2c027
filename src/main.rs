use std::sync::Arc;

use ask_hoops::config::Config;
use ask_hoops::context::AppContext;
use ask_hoops::handlers::post_query;
use axum::Router;
use axum::routing::post;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_tracing(&config.logging)?;

    tracing::info!("starting ask-hoops query pipeline");

    let ctx = Arc::new(AppContext::new(config));

    let app = Router::new().route("/api/query", post(post_query)).layer(tower_http::trace::TraceLayer::new_for_http()).with_state(ctx);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!(addr = "0.0.0.0:8080", "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(logging: &ask_hoops::config::LoggingConfig) -> Result<(), anyhow::Error> {
    let env_filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter).with(tracing_subscriber::fmt::layer());

    if let Some(path) = &logging.file {
        let directory = std::path::Path::new(path).parent().unwrap_or_else(|| std::path::Path::new("."));
        std::fs::create_dir_all(directory)?;
        let file_appender = tracing_appender::rolling::daily(directory, "ask-hoops.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // Leaked intentionally: the guard must outlive the process for the
        // non-blocking writer to flush on exit, and main() never returns
        // early in normal operation.
        Box::leak(Box::new(guard));
        registry.with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false)).init();
    } else {
        registry.init();
    }

    Ok(())
}
