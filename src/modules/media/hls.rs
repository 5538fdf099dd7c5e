use std::fs;
use std::path::{Path, PathBuf};

use crate::config::settings::AppConfig;

use super::encoder::{self, EncodeError, EncoderBackend};
use super::playlist;
use super::storage::MediaStore;

/// One quality tier of the ladder. Bandwidth is the configured video bitrate
/// in bits/s, which is what the master manifest advertises.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendition {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub video_kbps: u32,
    pub audio_kbps: u32,
}

impl Rendition {
    pub fn bandwidth(&self) -> u64 {
        self.video_kbps as u64 * 1000
    }

    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// The fixed ladder, ascending by bandwidth. Targets come from configuration,
/// never from probing the source, so order here is what players see in the
/// master manifest.
pub fn ladder() -> Vec<Rendition> {
    vec![
        Rendition { name: "240p", width: 426, height: 240, video_kbps: 400, audio_kbps: 96 },
        Rendition { name: "360p", width: 640, height: 360, video_kbps: 800, audio_kbps: 96 },
        Rendition { name: "480p", width: 854, height: 480, video_kbps: 1200, audio_kbps: 128 },
    ]
}

#[derive(Clone, Debug)]
pub enum VariantPlan {
    /// One unscaled rendition; the encoder's playlist is the master.
    Single,
    Ladder(Vec<Rendition>),
}

pub fn plan_renditions(use_ladder: bool) -> VariantPlan {
    if use_ladder {
        VariantPlan::Ladder(ladder())
    } else {
        VariantPlan::Single
    }
}

#[derive(Clone, Debug)]
pub struct HlsOptions {
    pub seg_seconds: u32,
    pub use_ladder: bool,
    pub fast: bool,
}

impl HlsOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            seg_seconds: config.hls_seg_seconds,
            use_ladder: config.hls_use_ladder,
            fast: config.hls_fast_transcode,
        }
    }
}

/// Runs the full transcode pipeline for one content id and returns the master
/// playlist path. Renditions encode in planner order; the first failure aborts
/// the job and no master is written, so the artifact directory never signals
/// "complete" for a partial ladder.
pub fn generate_hls(
    encoder: &dyn EncoderBackend,
    store: &MediaStore,
    opts: &HlsOptions,
    src_abs: &Path,
    content_id: i64,
) -> Result<PathBuf, EncodeError> {
    let outdir = store.hls_dir_for(content_id);
    fs::create_dir_all(&outdir)?;

    match plan_renditions(opts.use_ladder) {
        VariantPlan::Single => {
            let cmd = encoder::hls_single_command(src_abs, &outdir, opts.seg_seconds, opts.fast);
            encoder.run(&cmd)?;
            Ok(cmd.expected_output)
        }
        VariantPlan::Ladder(renditions) => {
            let mut playlists = Vec::with_capacity(renditions.len());
            for rendition in renditions {
                let vdir = outdir.join(rendition.name);
                fs::create_dir_all(&vdir)?;
                let cmd = encoder::hls_variant_command(
                    src_abs,
                    &vdir,
                    &rendition,
                    opts.seg_seconds,
                    opts.fast,
                );
                encoder.run(&cmd)?;
                playlists.push((rendition, cmd.expected_output));
            }
            let master = store.master_path(content_id);
            playlist::write_master(&master, &playlists).map_err(EncodeError::MasterWrite)?;
            Ok(master)
        }
    }
}
