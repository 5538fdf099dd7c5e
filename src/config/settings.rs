use std::path::PathBuf;

use serde::Deserialize;

use crate::config::env::{self, EnvKey};

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    /// Root for original uploads (posts/, clips/, avatars/, comments/, _tmp/).
    pub media_dir: PathBuf,
    /// Root for transcoded HLS artifacts, one subdirectory per content id.
    pub hls_dir: PathBuf,
    pub hls_seg_seconds: u32,
    pub hls_use_ladder: bool,
    pub hls_fast_transcode: bool,
    pub transcode_workers: usize,
    pub transcode_queue_cap: usize,
    /// Explicit ffmpeg binary; when unset the PATH is searched.
    pub ffmpeg_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            media_dir: PathBuf::from(env::get_or(EnvKey::MediaDir, "./media")),
            hls_dir: PathBuf::from(env::get_or(EnvKey::HlsDir, "./media/hls")),
            hls_seg_seconds: env::get_parsed(EnvKey::HlsSegSeconds, 2),
            hls_use_ladder: env::get_parsed(EnvKey::HlsUseLadder, true),
            hls_fast_transcode: env::get_parsed(EnvKey::HlsFastTranscode, true),
            transcode_workers: env::get_parsed(EnvKey::TranscodeWorkers, 2),
            transcode_queue_cap: env::get_parsed(EnvKey::TranscodeQueueCap, 64),
            ffmpeg_path: env::get(EnvKey::FfmpegPath).ok().map(PathBuf::from),
        }
    }
}
