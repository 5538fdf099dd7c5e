/// Fire-and-forget transcode request handed to the worker pool. Ephemeral:
/// nothing about a job survives a restart except whatever partial artifacts
/// it left on disk.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub content_id: i64,
    /// Path of the normalized original, relative to the media root
    /// (e.g. `posts/ab12...mp4`).
    pub src_rel: String,
}
