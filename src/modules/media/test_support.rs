//! Shared fixtures for the media tests: a mock encoder backend and an
//! AppState wired onto a temp directory.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::Router;

use crate::config::settings::AppConfig;
use crate::state::AppState;
use crate::workers::transcoder::TranscodeScheduler;

use super::encoder::{EncodeCommand, EncodeError, EncoderBackend};
use super::repository::MediaRegistry;
use super::storage::MediaStore;

/// Stands in for ffmpeg: records every invocation and fabricates the output
/// the real encoder would leave behind (playlist plus one segment, or the
/// normalized file).
pub struct MockEncoder {
    invocations: Mutex<Vec<String>>,
    fail_label: Option<String>,
}

impl MockEncoder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { invocations: Mutex::new(Vec::new()), fail_label: None })
    }

    pub fn failing(label: &str) -> Arc<Self> {
        Arc::new(Self {
            invocations: Mutex::new(Vec::new()),
            fail_label: Some(label.to_string()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }
}

impl EncoderBackend for MockEncoder {
    fn run(&self, cmd: &EncodeCommand) -> Result<(), EncodeError> {
        self.invocations.lock().unwrap().push(cmd.label.clone());
        if self.fail_label.as_deref() == Some(cmd.label.as_str()) {
            return Err(EncodeError::Failed {
                label: cmd.label.clone(),
                diagnostics: "mock encode failure".to_string(),
            });
        }
        if let Some(parent) = cmd.expected_output.parent() {
            fs::create_dir_all(parent)?;
        }
        if cmd.expected_output.extension().is_some_and(|e| e == "m3u8") {
            let stem = cmd
                .expected_output
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "seg".to_string());
            let segment_name = match stem.as_str() {
                "master" => "seg_000000.ts".to_string(),
                other => format!("{other}_000000.ts"),
            };
            let dir = cmd.expected_output.parent().map(PathBuf::from).unwrap_or_default();
            fs::write(dir.join(&segment_name), b"mock segment")?;
            fs::write(
                &cmd.expected_output,
                format!(
                    "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:2\n#EXTINF:2.0,\n{segment_name}\n#EXT-X-ENDLIST\n"
                ),
            )?;
        } else {
            fs::write(&cmd.expected_output, b"mock output")?;
        }
        Ok(())
    }
}

pub fn test_state(encoder: Arc<dyn EncoderBackend>) -> (tempfile::TempDir, AppState) {
    let tmp = tempfile::tempdir().unwrap();
    let config = AppConfig {
        server_port: 0,
        media_dir: tmp.path().join("media"),
        hls_dir: tmp.path().join("media/hls"),
        hls_seg_seconds: 2,
        hls_use_ladder: true,
        hls_fast_transcode: true,
        transcode_workers: 1,
        transcode_queue_cap: 8,
        ffmpeg_path: None,
    };
    let store = MediaStore::new(config.media_dir.clone(), config.hls_dir.clone()).unwrap();
    let transcoder = TranscodeScheduler::new(store.clone(), config.transcode_queue_cap);
    let state = AppState::new(config, store, MediaRegistry::new(), encoder, transcoder);
    (tmp, state)
}

pub fn test_app(state: AppState) -> Router {
    crate::routes::configure_routes().with_state(state)
}

/// Minimal multipart/form-data body with a single `file` field.
pub fn multipart_body(filename: &str, content_type: &str, payload: &[u8]) -> (String, Vec<u8>) {
    let boundary = "test-boundary-7f2a";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}
