use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::Result,
    grid::{negotiate_duration, DurationNegotiation, GridPlan},
    labels::{write_label_image, LabelFont},
    video::{ensure_available, types::is_image_file, ClipProbe, FfmpegCommand, FfprobeProbe},
};

/// Everything needed to run the compositing invocation
#[derive(Debug, Clone)]
pub struct PreparedComposition {
    pub plan: GridPlan,
    pub label_image: PathBuf,
    pub command: FfmpegCommand,

    /// Predicted output size, when the side image could be read
    pub frame_size: Option<(u32, u32)>,
}

/// Summary of a finished composition
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeReport {
    pub output: PathBuf,
    pub duration: f64,
    pub label_image: PathBuf,
    pub frame_size: Option<(u32, u32)>,
}

/// Builds the labelled comparison-grid video
///
/// The engine follows a clear pipeline:
/// 1. Duration Negotiation - Probe every clip, keep the shortest duration
/// 2. Label Synthesis - Render the transparent label overlay
/// 3. Plan - Lay out cells and build the filter graph
/// 4. Output Generation - Run ffmpeg once over all inputs
pub struct GridCompositor<P: ClipProbe = FfprobeProbe> {
    config: Config,
    probe: P,
}

impl GridCompositor<FfprobeProbe> {
    /// Create a compositor probing clips with the configured `ffprobe`
    pub fn new(config: Config) -> Self {
        let probe = FfprobeProbe::new(config.tools.ffprobe.clone());
        Self { config, probe }
    }
}

impl<P: ClipProbe> GridCompositor<P> {
    pub fn with_probe(config: Config, probe: P) -> Self {
        Self { config, probe }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run steps 1-3 without invoking ffmpeg
    ///
    /// Writes the label image; useful on its own for dry runs.
    pub async fn prepare(&self) -> Result<PreparedComposition> {
        self.config.validate()?;

        let grid = &self.config.grid;
        let clips = grid.clip_paths();

        info!("🎬 Starting grid composition");
        info!("   Grid: {}x{} clips from {:?}", grid.layout().rows, grid.layout().cols, grid.clip_dir);
        info!("   Side image: {:?}", grid.side_image);
        info!("   Output: {:?}", grid.output);

        // Pipeline Step 1: Duration Negotiation
        let negotiation = self.negotiate(&clips).await?;

        // Pipeline Step 2: Label Synthesis
        let label_image = self.render_labels()?;

        // Pipeline Step 3: Plan
        let plan = GridPlan::new(grid.layout(), negotiation.duration, &negotiation.infos);
        let frame_size = self.predict_frame_size(&plan);
        let command = plan.command(
            &clips,
            &grid.side_image,
            &label_image,
            &grid.output,
            &self.config.encoder_settings(),
        );
        debug!("Filter graph: {}", plan.filter_graph());

        Ok(PreparedComposition {
            plan,
            label_image,
            command,
            frame_size,
        })
    }

    /// Run the full pipeline and write the output video
    pub async fn compose(&self) -> Result<ComposeReport> {
        let prepared = self.prepare().await?;

        // Pipeline Step 4: Output Generation
        self.generate_output(&prepared.command).await?;

        let output = prepared.command.output().to_path_buf();
        info!("🎉 Composition complete! Output saved to: {:?}", output);

        Ok(ComposeReport {
            output,
            duration: prepared.plan.duration,
            label_image: prepared.label_image,
            frame_size: prepared.frame_size,
        })
    }

    // ==========================================
    // PIPELINE STEP 1: DURATION NEGOTIATION
    // ==========================================

    async fn negotiate(&self, clips: &[PathBuf]) -> Result<DurationNegotiation> {
        info!("⏱️  Step 1: Probing {} clips...", clips.len());

        let negotiation = negotiate_duration(&self.probe, clips).await?;
        for clip in negotiation.clips(clips) {
            debug!("   Usable: {} ({:?})", clip.display_name(), clip.info.aspect_ratio());
        }
        if negotiation.failed_count() > 0 {
            warn!("   {} of {} clips could not be probed",
                  negotiation.failed_count(), clips.len());
        }
        Ok(negotiation)
    }

    // ==========================================
    // PIPELINE STEP 2: LABEL SYNTHESIS
    // ==========================================

    fn render_labels(&self) -> Result<PathBuf> {
        info!("🔤 Step 2: Rendering labels...");

        let labels = &self.config.labels;
        let font = LabelFont::resolve(&labels.font_candidates, labels.font_size);
        debug!("   Font: {}", font.describe());

        write_label_image(
            &self.config.grid.layout(),
            &self.config.grid.label_set(),
            &font,
            &self.config.scratch_dir,
        )
    }

    // ==========================================
    // PIPELINE STEP 3: PLAN
    // ==========================================

    fn predict_frame_size(&self, plan: &GridPlan) -> Option<(u32, u32)> {
        info!("📐 Step 3: Planning layout...");

        let (canvas_w, canvas_h) = plan.layout.canvas_size();
        info!("   Grid canvas: {}x{}", canvas_w, canvas_h);

        if !is_image_file(&self.config.grid.side_image) {
            warn!("   Side image {:?} does not look like an image file", self.config.grid.side_image);
        }

        match image::image_dimensions(&self.config.grid.side_image) {
            Ok(side) => {
                let (w, h) = plan.composed_size(side);
                info!("   Final frame: {}x{}", w, h);
                Some((w, h))
            }
            Err(e) => {
                warn!("   Could not read side image {:?}: {}", self.config.grid.side_image, e);
                None
            }
        }
    }

    // ==========================================
    // PIPELINE STEP 4: OUTPUT GENERATION
    // ==========================================

    async fn generate_output(&self, command: &FfmpegCommand) -> Result<()> {
        info!("🎞️  Step 4: Running ffmpeg...");

        ensure_available(&self.config.tools.ffmpeg).await?;
        create_parent_dir(command.output()).await?;

        info!("   {}", command.display_line());
        command.run().await?;
        Ok(())
    }
}

async fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}
