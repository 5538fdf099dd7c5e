use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    MediaDir,
    HlsDir,
    HlsSegSeconds,
    HlsUseLadder,
    HlsFastTranscode,
    TranscodeWorkers,
    TranscodeQueueCap,
    FfmpegPath,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::MediaDir => "MEDIA_DIR",
            EnvKey::HlsDir => "HLS_DIR",
            EnvKey::HlsSegSeconds => "HLS_SEG_SECONDS",
            EnvKey::HlsUseLadder => "HLS_USE_LADDER",
            EnvKey::HlsFastTranscode => "HLS_FAST_TRANSCODE",
            EnvKey::TranscodeWorkers => "TRANSCODE_WORKERS",
            EnvKey::TranscodeQueueCap => "TRANSCODE_QUEUE_CAP",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
