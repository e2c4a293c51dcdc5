use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::geometry::ScalingMode;

/// Offline polyphase scaler for retro video captures
#[derive(Parser, Debug)]
#[command(name = "retroscale")]
#[command(version = "0.1.0")]
#[command(about = "Scale an image through polyphase filters, shadow masks and gamma tables", long_about = None)]
pub struct Cli {
    /// Input image (PNG)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output image (PNG)
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Output resolution (e.g., 1920x1080)
    #[arg(short, long, value_name = "WIDTHxHEIGHT")]
    pub res: String,

    /// Horizontal filter coefficient file
    #[arg(long = "horz-filter", value_name = "FILE")]
    pub horz_filter: Option<PathBuf>,

    /// Vertical filter coefficient file (defaults to the horizontal one)
    #[arg(long = "vert-filter", value_name = "FILE")]
    pub vert_filter: Option<PathBuf>,

    /// Shadow mask file
    #[arg(short, long, value_name = "FILE")]
    pub mask: Option<PathBuf>,

    /// Apply the shadow mask at double cell size
    #[arg(long = "mask-2x")]
    pub mask_2x: bool,

    /// Gamma table file (256 entries)
    #[arg(short, long, value_name = "FILE")]
    pub gamma: Option<PathBuf>,

    /// Scaling mode (fullscreen, aspect, vscale)
    #[arg(long, value_name = "MODE", default_value = "aspect")]
    pub mode: String,

    /// Vertical scale step for vscale mode: 1=whole, 2=half, 3=quarter
    #[arg(long = "vscale-step", value_name = "STEP", default_value_t = 1)]
    pub vscale_step: u32,

    /// Display aspect ratio correction (e.g., 4:3); default keeps square pixels
    #[arg(long = "aspect-ratio", value_name = "W:H")]
    pub aspect_ratio: Option<String>,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Fully resolved job settings the binary runs with
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub resolution: Resolution,
    pub horz_filter: Option<PathBuf>,
    pub vert_filter: Option<PathBuf>,
    pub mask: Option<PathBuf>,
    pub mask_2x: bool,
    pub gamma: Option<PathBuf>,
    pub mode: ScalingMode,
    pub vscale_step: u32,
    pub aspect_ratio: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Cli {
    /// Validate the raw arguments into job options
    pub fn into_options(self) -> Result<JobOptions> {
        let resolution = parse_resolution(&self.res).context("Invalid resolution format")?;
        let mode: ScalingMode = self.mode.parse().context("Invalid scaling mode")?;
        let aspect_ratio = match self.aspect_ratio {
            Some(ref s) => Some(parse_aspect_ratio(s).context("Invalid aspect ratio")?),
            None => None,
        };

        Ok(JobOptions {
            input: self.input,
            output: self.output,
            resolution,
            horz_filter: self.horz_filter,
            vert_filter: self.vert_filter,
            mask: self.mask,
            mask_2x: self.mask_2x,
            gamma: self.gamma,
            mode,
            vscale_step: self.vscale_step,
            aspect_ratio,
        })
    }
}

/// Parse a resolution argument like "640x480"
pub fn parse_resolution(s: &str) -> Result<Resolution> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| anyhow::anyhow!("resolution must be WIDTHxHEIGHT"))?;

    let width: u32 = w.parse().with_context(|| format!("invalid width {:?}", w))?;
    let height: u32 = h.parse().with_context(|| format!("invalid height {:?}", h))?;

    if width == 0 || height == 0 {
        anyhow::bail!("resolution dimensions must be non-zero");
    }

    Ok(Resolution { width, height })
}

/// Parse a display ratio like "4:3"
pub fn parse_aspect_ratio(s: &str) -> Result<(u32, u32)> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        anyhow::bail!("Aspect ratio must be in W:H format");
    }

    let w: u32 = parts[0].parse().context("Invalid ratio numerator")?;
    let h: u32 = parts[1].parse().context("Invalid ratio denominator")?;

    if w == 0 || h == 0 {
        anyhow::bail!("Aspect ratio values must be positive");
    }

    Ok((w, h))
}

impl JobOptions {
    /// Display aspect ratio for the source frame
    ///
    /// Falls back to the source's own pixel ratio (square pixels) when no
    /// explicit ratio was given.
    pub fn display_aspect(&self, src_width: u32, src_height: u32) -> f64 {
        match self.aspect_ratio {
            Some((w, h)) => w as f64 / h as f64,
            None => src_width as f64 / src_height as f64,
        }
    }
}
