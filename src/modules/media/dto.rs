use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct MediaResponse {
    pub id: i64,
    /// Relative path of the stored original (e.g. `posts/ab12....mp4`).
    pub path: String,
    /// Playback URL: the HLS master once the transcode is done, the original
    /// file until then. Resolved per request.
    pub url: String,
    pub hls_ready: bool,
}
