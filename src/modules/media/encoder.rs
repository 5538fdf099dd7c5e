use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use super::hls::Rendition;

/// Keep only the tail of ffmpeg's diagnostics so a chatty run cannot bloat
/// logs or error values.
const MAX_DIAG_BYTES: usize = 4096;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("ffmpeg is not installed or not on PATH")]
    EncoderUnavailable,
    #[error("encode failed ({label}): {diagnostics}")]
    Failed { label: String, diagnostics: String },
    #[error("failed to write master playlist: {0}")]
    MasterWrite(std::io::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One planned encoder invocation: the full argument vector plus the output
/// file the run must produce. A run that exits zero but leaves
/// `expected_output` missing is still a failure.
#[derive(Clone, Debug)]
pub struct EncodeCommand {
    pub label: String,
    pub args: Vec<String>,
    pub expected_output: PathBuf,
}

pub trait EncoderBackend: Send + Sync {
    fn run(&self, cmd: &EncodeCommand) -> Result<(), EncodeError>;
}

fn arg(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

fn preset(fast: bool) -> &'static str {
    if fast { "veryfast" } else { "medium" }
}

/// Re-encode an upload to MP4 H.264 baseline / yuv420p / AAC with faststart,
/// optionally trimmed (clips are capped at 120 s).
pub fn normalize_command(src: &Path, dst: &Path, trim_seconds: Option<u32>) -> EncodeCommand {
    let mut args = vec!["-y".into(), "-v".into(), "error".into(), "-i".into(), arg(src)];
    if let Some(secs) = trim_seconds {
        args.push("-t".into());
        args.push(secs.to_string());
    }
    args.extend(
        [
            "-c:v",
            "libx264",
            "-profile:v",
            "baseline",
            "-level:v",
            "3.1",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-b:a",
            "128k",
            "-ac",
            "2",
            "-movflags",
            "+faststart",
        ]
        .map(String::from),
    );
    args.push(arg(dst));
    EncodeCommand {
        label: "normalize".to_string(),
        args,
        expected_output: dst.to_path_buf(),
    }
}

/// Single-rendition HLS: the encoder writes `master.m3u8` plus numbered
/// segments straight into the output directory.
pub fn hls_single_command(
    src: &Path,
    outdir: &Path,
    seg_seconds: u32,
    fast: bool,
) -> EncodeCommand {
    let playlist = outdir.join(super::storage::MASTER_PLAYLIST);
    let args = vec![
        "-y".into(),
        "-v".into(),
        "error".into(),
        "-i".into(),
        arg(src),
        "-c:v".into(),
        "libx264".into(),
        "-profile:v".into(),
        "main".into(),
        "-level".into(),
        "3.1".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        "128k".into(),
        "-ac".into(),
        "2".into(),
        "-ar".into(),
        "48000".into(),
        "-preset".into(),
        preset(fast).into(),
        "-hls_time".into(),
        seg_seconds.to_string(),
        "-hls_playlist_type".into(),
        "vod".into(),
        "-hls_segment_filename".into(),
        arg(&outdir.join("seg_%06d.ts")),
        arg(&playlist),
    ];
    EncodeCommand {
        label: "single".to_string(),
        args,
        expected_output: playlist,
    }
}

/// One rung of the ladder: scaled to the rendition's height, written as
/// `{name}/{name}.m3u8` plus `{name}_%06d.ts` segments.
pub fn hls_variant_command(
    src: &Path,
    vdir: &Path,
    rendition: &Rendition,
    seg_seconds: u32,
    fast: bool,
) -> EncodeCommand {
    let playlist = vdir.join(format!("{}.m3u8", rendition.name));
    let args = vec![
        "-y".into(),
        "-v".into(),
        "error".into(),
        "-i".into(),
        arg(src),
        "-vf".into(),
        format!("scale=-2:{}", rendition.height),
        "-c:v".into(),
        "libx264".into(),
        "-b:v".into(),
        format!("{}k", rendition.video_kbps),
        "-profile:v".into(),
        "main".into(),
        "-level".into(),
        "3.1".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        format!("{}k", rendition.audio_kbps),
        "-ac".into(),
        "2".into(),
        "-ar".into(),
        "48000".into(),
        "-preset".into(),
        preset(fast).into(),
        "-hls_time".into(),
        seg_seconds.to_string(),
        "-hls_playlist_type".into(),
        "vod".into(),
        "-hls_segment_filename".into(),
        arg(&vdir.join(format!("{}_%06d.ts", rendition.name))),
        arg(&playlist),
    ];
    EncodeCommand {
        label: rendition.name.to_string(),
        args,
        expected_output: playlist,
    }
}

/// Runs ffmpeg as a subprocess with captured output. No retries; the job
/// runner decides what a failure means.
pub struct FfmpegEncoder {
    configured: Option<PathBuf>,
}

impl FfmpegEncoder {
    pub fn new(configured: Option<PathBuf>) -> Self {
        Self { configured }
    }

    fn resolve(&self) -> Result<PathBuf, EncodeError> {
        if let Some(path) = &self.configured {
            if path.is_file() {
                return Ok(path.clone());
            }
            return Err(EncodeError::EncoderUnavailable);
        }
        find_in_path("ffmpeg").ok_or(EncodeError::EncoderUnavailable)
    }
}

impl EncoderBackend for FfmpegEncoder {
    fn run(&self, cmd: &EncodeCommand) -> Result<(), EncodeError> {
        let program = self.resolve()?;
        let output = Command::new(program).args(&cmd.args).output()?;
        if !output.status.success() || !cmd.expected_output.is_file() {
            let mut diagnostics = tail_text(&output.stderr);
            if diagnostics.is_empty() {
                diagnostics = tail_text(&output.stdout);
            }
            if diagnostics.is_empty() {
                diagnostics = format!("no output produced ({})", output.status);
            }
            return Err(EncodeError::Failed {
                label: cmd.label.clone(),
                diagnostics,
            });
        }
        Ok(())
    }
}

pub(crate) fn find_in_path(bin: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(bin))
        .find(|candidate| candidate.is_file())
}

fn tail_text(bytes: &[u8]) -> String {
    let start = bytes.len().saturating_sub(MAX_DIAG_BYTES);
    String::from_utf8_lossy(&bytes[start..]).trim().to_string()
}
