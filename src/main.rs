use std::sync::Arc;

use dotenvy::dotenv;
use tracing::info;

mod app;
mod common;
mod config;
mod docs;
mod modules;
mod routes;
mod state;
mod workers;

use config::settings::AppConfig;
use modules::media::encoder::FfmpegEncoder;
use modules::media::repository::MediaRegistry;
use modules::media::storage::MediaStore;
use state::AppState;
use workers::transcoder::TranscodeScheduler;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting server...");

    let config = AppConfig::new();
    let store = MediaStore::new(config.media_dir.clone(), config.hls_dir.clone())
        .expect("failed to prepare media directories");
    let encoder = Arc::new(FfmpegEncoder::new(config.ffmpeg_path.clone()));
    let transcoder = TranscodeScheduler::new(store.clone(), config.transcode_queue_cap);
    let state = AppState::new(
        config.clone(),
        store,
        MediaRegistry::new(),
        encoder,
        transcoder,
    );

    workers::transcoder::start_transcode_workers(&state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let app = app::create_app(state).await;

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await.unwrap();
}
