use std::path::PathBuf;

use anyhow::{anyhow, Result};
use axum::extract::multipart::Multipart;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::state::AppState;

use super::dto::MediaResponse;
use super::encoder;
use super::events::TranscodeJob;
use super::repository::MediaRecord;
use super::storage::{self, MediaCategory};

/// Clips are capped at two minutes during normalization.
const CLIP_MAX_SECONDS: u32 = 120;

pub struct MediaService;

impl MediaService {
    /// Stores an upload under its category, normalizing videos to MP4 and
    /// kicking off the HLS job. The transcode submit is fire-and-forget; the
    /// response never waits on it.
    pub async fn upload(
        state: AppState,
        category: MediaCategory,
        mut multipart: Multipart,
    ) -> Result<MediaResponse> {
        let Some(staged) = Self::stage_upload(&state, &mut multipart).await? else {
            return Err(anyhow!("missing 'file' field in multipart body"));
        };

        let ext = staged
            .filename
            .rsplit_once('.')
            .map(|(_, e)| e.to_ascii_lowercase())
            .unwrap_or_default();
        let looks_like_video = staged
            .content_type
            .as_deref()
            .map(|ct| ct.starts_with("video/"))
            .unwrap_or(false)
            || storage::is_video_ext(&ext);
        let is_video = looks_like_video && category.accepts_video();

        let stored = Self::store_staged(&state, category, &staged.tmp, &ext, is_video).await;
        let _ = tokio::fs::remove_file(&staged.tmp).await;
        let rel = stored?;

        let record = state.registry.insert(category, rel, is_video);
        if record.is_video {
            state.transcoder.submit(TranscodeJob {
                content_id: record.id,
                src_rel: record.path.clone(),
            });
        }
        info!("stored {} upload as content {}", category.as_dir(), record.id);
        Ok(Self::to_response(&state, &record))
    }

    pub fn media_info(state: &AppState, id: i64) -> Option<MediaResponse> {
        let record = state.registry.get(id)?;
        Some(Self::to_response(state, &record))
    }

    /// Deletes the record first, then best-effort removes the original file
    /// and the whole artifact directory. A failed cleanup leaks files but is
    /// never surfaced to the caller.
    pub fn delete(state: &AppState, id: i64) -> Option<()> {
        let record = state.registry.remove(id)?;
        state.store.delete_original(&record.path);
        state.store.delete_hls(id);
        Some(())
    }

    /// Per-request playback resolution: the manifest wins if and only if it
    /// exists right now, so polling clients flip to adaptive playback as soon
    /// as the background job completes.
    pub fn playback_url(state: &AppState, record: &MediaRecord) -> String {
        if record.is_video && state.store.master_exists(record.id) {
            format!("/hls/{}/master.m3u8", record.id)
        } else {
            format!("/media/{}", record.path)
        }
    }

    fn to_response(state: &AppState, record: &MediaRecord) -> MediaResponse {
        MediaResponse {
            id: record.id,
            path: record.path.clone(),
            url: Self::playback_url(state, record),
            hls_ready: record.is_video && state.store.master_exists(record.id),
        }
    }

    async fn stage_upload(
        state: &AppState,
        multipart: &mut Multipart,
    ) -> Result<Option<StagedUpload>> {
        while let Some(mut field) = multipart.next_field().await? {
            if field.name() != Some("file") {
                continue;
            }
            let filename = field.file_name().unwrap_or("upload.bin").to_string();
            let content_type = field.content_type().map(|ct| ct.to_string());

            let tmp = state.store.tmp_path();
            let mut out = tokio::fs::File::create(&tmp).await?;
            while let Some(chunk) = field.chunk().await? {
                let chunk: Bytes = chunk;
                out.write_all(&chunk).await?;
            }
            out.flush().await?;
            return Ok(Some(StagedUpload { tmp, filename, content_type }));
        }
        Ok(None)
    }

    async fn store_staged(
        state: &AppState,
        category: MediaCategory,
        tmp: &PathBuf,
        ext: &str,
        is_video: bool,
    ) -> Result<String> {
        if is_video {
            let (rel, dst) = state.store.new_rel(category, "mp4");
            let trim = (category == MediaCategory::Clips).then_some(CLIP_MAX_SECONDS);
            let cmd = encoder::normalize_command(tmp, &dst, trim);
            let enc = state.encoder.clone();
            tokio::task::spawn_blocking(move || enc.run(&cmd)).await??;
            Ok(rel)
        } else {
            // avatars keep whatever extension arrived; the other categories
            // whitelist images and coerce the rest to jpg
            let keep = storage::is_image_ext(ext)
                || (category == MediaCategory::Avatars && !ext.is_empty());
            let ext = if keep { ext } else { "jpg" };
            let (rel, dst) = state.store.new_rel(category, ext);
            tokio::fs::copy(tmp, &dst).await?;
            Ok(rel)
        }
    }
}

struct StagedUpload {
    tmp: PathBuf,
    filename: String,
    content_type: Option<String>,
}
