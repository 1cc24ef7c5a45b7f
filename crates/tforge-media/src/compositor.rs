//! Video assembly: thumbnail intro followed by the narrated background clip.

use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use metrics::histogram;
use tracing::{debug, info};

use tforge_models::Sentiment;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Seconds of thumbnail shown before the main clip.
pub const INTRO_SECS: u32 = 3;
/// Main clip length when the topic mood is positive.
pub const POSITIVE_MAIN_SECS: u32 = 8;
/// Main clip length otherwise.
pub const DEFAULT_MAIN_SECS: u32 = 10;

/// Clip durations for one video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub intro_secs: u32,
    pub main_secs: u32,
}

impl Pacing {
    /// Positive topics get a tighter main clip.
    pub fn for_sentiment(sentiment: Sentiment) -> Self {
        let main_secs = if sentiment.is_positive() {
            POSITIVE_MAIN_SECS
        } else {
            DEFAULT_MAIN_SECS
        };
        Self {
            intro_secs: INTRO_SECS,
            main_secs,
        }
    }

    pub fn total_secs(&self) -> u32 {
        self.intro_secs + self.main_secs
    }
}

/// Inputs and output for one composition.
#[derive(Debug, Clone)]
pub struct CompositionRequest {
    pub thumbnail: PathBuf,
    pub background: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
    pub pacing: Pacing,
}

/// Builds the final video file from still images and narration.
#[async_trait]
pub trait VideoCompositor: Send + Sync {
    async fn compose(&self, request: &CompositionRequest) -> MediaResult<()>;
}

/// [`VideoCompositor`] backed by the FFmpeg CLI (libx264/aac).
#[derive(Debug, Clone)]
pub struct FfmpegCompositor {
    runner: FfmpegRunner,
    width: u32,
    height: u32,
    fps: u32,
    preset: String,
}

impl Default for FfmpegCompositor {
    fn default() -> Self {
        Self {
            runner: FfmpegRunner::new(),
            width: 1280,
            height: 720,
            fps: 24,
            preset: "veryfast".to_string(),
        }
    }
}

impl FfmpegCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    fn frame_filter(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},format=yuv420p",
            w = self.width,
            h = self.height,
            fps = self.fps
        )
    }

    /// Filter graph: normalize both stills, concatenate, delay narration past the intro.
    pub fn filter_graph(&self, pacing: &Pacing) -> String {
        let frame = self.frame_filter();
        let delay_ms = pacing.intro_secs * 1000;
        format!(
            "[0:v]{frame}[intro];[1:v]{frame}[main];[intro][main]concat=n=2:v=1:a=0[v];[2:a]adelay={delay_ms}|{delay_ms},apad[a]"
        )
    }

    pub fn build_command(&self, request: &CompositionRequest) -> FfmpegCommand {
        let pacing = &request.pacing;
        FfmpegCommand::new(&request.output)
            .still_image(&request.thumbnail, f64::from(pacing.intro_secs))
            .still_image(&request.background, f64::from(pacing.main_secs))
            .input(&request.audio)
            .filter_complex(self.filter_graph(pacing))
            .map("[v]")
            .map("[a]")
            .video_codec("libx264")
            .preset(self.preset.clone())
            .pixel_format("yuv420p")
            .audio_codec("aac")
            .max_duration(f64::from(pacing.total_secs()))
    }
}

#[async_trait]
impl VideoCompositor for FfmpegCompositor {
    async fn compose(&self, request: &CompositionRequest) -> MediaResult<()> {
        let cmd = self.build_command(request);
        let total_ms = i64::from(request.pacing.total_secs()) * 1000;
        let start = Instant::now();

        self.runner
            .run_with_progress(&cmd, move |p| {
                debug!("Compositing {:.0}% (speed {:.2}x)", p.percentage(total_ms), p.speed);
            })
            .await?;

        let elapsed = start.elapsed().as_secs_f64();
        histogram!("tforge_ffmpeg_duration_seconds").record(elapsed);
        info!(
            output = %request.output.display(),
            duration_secs = request.pacing.total_secs(),
            "Video composed in {:.2}s",
            elapsed
        );
        Ok(())
    }
}
