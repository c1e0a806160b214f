use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{OverlayConfig, OverlayJob};
use crate::error::Result;
use crate::video::ffmpeg::FfmpegCommand;
use crate::video::filter::{Filter, FilterChain, FilterGraph};
use crate::video::types::display_name;

/// Summary of an overlay batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayReport {
    pub burned: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Filter graph that scales input 1 to a square of side `video_width /
/// divisor` and overlays it on the bottom-right corner of input 0
pub fn corner_overlay_graph(divisor: u32) -> FilterGraph {
    let side = format!("iw/{}", divisor.max(1));
    FilterGraph::new()
        .chain(
            FilterChain::new()
                .input("1:v")
                .input("0:v")
                .filter(Filter::new("scale2ref").arg(&side).arg(&side))
                .output("ovrl")
                .output("main"),
        )
        .chain(
            FilterChain::new()
                .input("main")
                .input("ovrl")
                .filter(Filter::overlay("W-w", "H-h")),
        )
}

/// Burns corner overlays into videos, replacing the originals
pub struct OverlayBurner {
    ffmpeg: PathBuf,
    scratch_dir: PathBuf,
    overlay_dir: PathBuf,
    divisor: u32,
}

impl OverlayBurner {
    pub fn new(ffmpeg: PathBuf, scratch_dir: PathBuf, config: &OverlayConfig) -> Self {
        Self {
            ffmpeg,
            scratch_dir,
            overlay_dir: config.overlay_dir.clone(),
            divisor: config.scale_divisor,
        }
    }

    /// Build the command burning `overlay` into `video`, writing to `output`
    pub fn command(&self, video: &Path, overlay: &Path, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(output)
            .binary(&self.ffmpeg)
            .input(video)
            .input(overlay)
            .filter_complex(corner_overlay_graph(self.divisor))
            .audio_codec("copy")
    }

    /// Process every job in order
    ///
    /// Missing inputs are skipped. Failed invocations and failed
    /// replacements are logged and counted; the batch always runs to the end.
    pub async fn run(&self, jobs: &[OverlayJob]) -> Result<OverlayReport> {
        tokio::fs::create_dir_all(&self.scratch_dir).await?;
        let mut report = OverlayReport::default();

        for job in jobs {
            let video = job.video.as_path();
            let overlay = self.overlay_dir.join(&job.overlay);
            let name = display_name(video);

            if !video.exists() {
                warn!("  SKIP: video not found - {}", name);
                report.skipped.push(job.video.clone());
                continue;
            }
            if !overlay.exists() {
                warn!("  SKIP: overlay not found - {}", overlay.display());
                report.skipped.push(job.video.clone());
                continue;
            }

            info!("Processing: {}", name);
            let tmp_output = self.scratch_dir.join(&name);
            if let Err(e) = self.command(video, &overlay, &tmp_output).run().await {
                warn!("  FAILED: {}: {}", name, e);
                report.failed.push(job.video.clone());
                continue;
            }

            match replace_file(&tmp_output, video).await {
                Ok(()) => {
                    info!("  OK: {}", name);
                    report.burned.push(job.video.clone());
                }
                Err(e) => {
                    warn!("  FAILED: could not replace {}: {}", name, e);
                    // The original is untouched; drop the processed copy.
                    if let Err(e) = tokio::fs::remove_file(&tmp_output).await {
                        debug!("  No processed copy to remove for {}: {}", name, e);
                    }
                    report.failed.push(job.video.clone());
                }
            }
        }

        Ok(report)
    }
}

/// Move `from` over `to`, copying when a rename crosses filesystems
async fn replace_file(from: &Path, to: &Path) -> Result<()> {
    if tokio::fs::rename(from, to).await.is_err() {
        tokio::fs::copy(from, to).await?;
        tokio::fs::remove_file(from).await?;
    }
    Ok(())
}
