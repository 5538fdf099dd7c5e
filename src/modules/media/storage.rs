use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use uuid::Uuid;

/// Upload extensions treated as video (transcode-eligible).
pub const VIDEO_EXTS: &[&str] = &["mp4", "m4v", "mov", "3gp", "3gpp", "webm", "mkv"];
/// Upload extensions accepted as images; anything else is coerced to jpg.
pub const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

pub const MASTER_PLAYLIST: &str = "master.m3u8";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaCategory {
    Posts,
    Clips,
    Avatars,
    Comments,
}

impl MediaCategory {
    pub fn as_dir(&self) -> &'static str {
        match self {
            MediaCategory::Posts => "posts",
            MediaCategory::Clips => "clips",
            MediaCategory::Avatars => "avatars",
            MediaCategory::Comments => "comments",
        }
    }

    /// Only posts and clips may carry video; avatars and comments are image-only.
    pub fn accepts_video(&self) -> bool {
        matches!(self, MediaCategory::Posts | MediaCategory::Clips)
    }
}

impl FromStr for MediaCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(MediaCategory::Posts),
            "clips" => Ok(MediaCategory::Clips),
            "avatars" => Ok(MediaCategory::Avatars),
            "comments" => Ok(MediaCategory::Comments),
            _ => Err(()),
        }
    }
}

pub fn is_video_ext(ext: &str) -> bool {
    VIDEO_EXTS.contains(&ext.to_ascii_lowercase().as_str())
}

pub fn is_image_ext(ext: &str) -> bool {
    IMAGE_EXTS.contains(&ext.to_ascii_lowercase().as_str())
}

/// Filesystem layout for originals and transcoded artifacts.
///
/// Originals live at `{media_dir}/{category}/{uuid_hex}.{ext}`, artifacts at
/// `{hls_dir}/{content_id}/...` with `master.m3u8` marking a finished transcode.
#[derive(Clone, Debug)]
pub struct MediaStore {
    media_dir: PathBuf,
    hls_dir: PathBuf,
}

impl MediaStore {
    pub fn new(media_dir: PathBuf, hls_dir: PathBuf) -> io::Result<Self> {
        for sub in ["posts", "clips", "avatars", "comments", "_tmp"] {
            fs::create_dir_all(media_dir.join(sub))?;
        }
        fs::create_dir_all(&hls_dir)?;
        Ok(Self { media_dir, hls_dir })
    }

    pub fn media_root(&self) -> &Path {
        &self.media_dir
    }

    pub fn hls_root(&self) -> &Path {
        &self.hls_dir
    }

    /// Absolute path for a stored original, given its relative path
    /// (e.g. `posts/ab12....mp4`).
    pub fn abs_path(&self, rel: &str) -> PathBuf {
        self.media_dir.join(rel)
    }

    /// Allocates a fresh `{category}/{uuid_hex}.{ext}` name; returns
    /// (relative, absolute).
    pub fn new_rel(&self, category: MediaCategory, ext: &str) -> (String, PathBuf) {
        let rel = format!(
            "{}/{}.{}",
            category.as_dir(),
            Uuid::new_v4().as_simple(),
            ext
        );
        let abs = self.media_dir.join(&rel);
        (rel, abs)
    }

    /// Staging path for an upload still being received.
    pub fn tmp_path(&self) -> PathBuf {
        self.media_dir
            .join("_tmp")
            .join(format!("{}.bin", Uuid::new_v4().as_simple()))
    }

    /// Best-effort removal of a stored original. Missing files are fine.
    pub fn delete_original(&self, rel: &str) {
        if rel.is_empty() {
            return;
        }
        match fs::remove_file(self.abs_path(rel)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("failed to remove original {}: {}", rel, e);
            }
        }
    }

    // --- Transcoded artifacts ---

    pub fn hls_dir_for(&self, content_id: i64) -> PathBuf {
        self.hls_dir.join(content_id.to_string())
    }

    pub fn master_path(&self, content_id: i64) -> PathBuf {
        self.hls_dir_for(content_id).join(MASTER_PLAYLIST)
    }

    /// The sole "transcode complete" signal: the master playlist is present
    /// and readable.
    pub fn master_exists(&self, content_id: i64) -> bool {
        let path = self.master_path(content_id);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => fs::File::open(&path).is_ok(),
            _ => false,
        }
    }

    /// Removes the whole artifact directory for a content id. Idempotent,
    /// best-effort.
    pub fn delete_hls(&self, content_id: i64) {
        let dir = self.hls_dir_for(content_id);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("failed to remove hls dir for {}: {}", content_id, e);
            }
        }
    }
}
