use std::sync::Arc;

use crate::config::settings::AppConfig;
use crate::modules::media::encoder::EncoderBackend;
use crate::modules::media::repository::MediaRegistry;
use crate::modules::media::storage::MediaStore;
use crate::workers::transcoder::TranscodeScheduler;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: MediaStore,
    pub registry: MediaRegistry,
    pub encoder: Arc<dyn EncoderBackend>,
    pub transcoder: TranscodeScheduler,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: MediaStore,
        registry: MediaRegistry,
        encoder: Arc<dyn EncoderBackend>,
        transcoder: TranscodeScheduler,
    ) -> Self {
        Self {
            config,
            store,
            registry,
            encoder,
            transcoder,
        }
    }
}
