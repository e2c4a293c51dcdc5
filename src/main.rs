use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use retroscale::cli::{Cli, JobOptions};
use retroscale::filter::FilterData;
use retroscale::gamma::GammaTable;
use retroscale::logging;
use retroscale::mask::ShadowMask;
use retroscale::pipeline::{OutputConfig, Pipeline};
use retroscale::pixmap::Pixmap;

/// Center-tap pass-through used when no coefficient file is given
const DEFAULT_FILTER: &str = "0, 128, 0, 0\n0, 128, 0, 0\n0, 128, 0, 0\n0, 128, 0, 0\n";

fn load_filter(path: Option<&Path>, fallback: &FilterData) -> Result<FilterData> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read filter file {}", path.display()))?;
            FilterData::parse(&text)
                .with_context(|| format!("Failed to parse filter file {}", path.display()))
        }
        None => Ok(fallback.clone()),
    }
}

fn load_image(path: &Path) -> Result<Pixmap> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open input image {}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Pixmap::from_raw(width, height, img.into_raw()).context("Decoded image has unexpected size")
}

fn save_image(path: &Path, canvas: Pixmap) -> Result<()> {
    let (width, height) = (canvas.width(), canvas.height());
    let img = image::RgbaImage::from_raw(width, height, canvas.into_raw())
        .context("Output buffer has unexpected size")?;
    img.save(path)
        .with_context(|| format!("Failed to write output image {}", path.display()))
}

fn run(opts: JobOptions) -> Result<()> {
    let src = load_image(&opts.input)?;
    info!("Loaded {} ({}x{})", opts.input.display(), src.width(), src.height());

    let builtin = FilterData::parse(DEFAULT_FILTER).context("Built-in filter is malformed")?;
    let horz = load_filter(opts.horz_filter.as_deref(), &builtin)?;
    let vert = match opts.vert_filter.as_deref() {
        Some(path) => load_filter(Some(path), &builtin)?,
        None => horz.clone(),
    };

    let mut pipeline = Pipeline::new(horz, vert);

    if let Some(ref path) = opts.gamma {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read gamma file {}", path.display()))?;
        let table = GammaTable::parse(&text)
            .with_context(|| format!("Failed to parse gamma file {}", path.display()))?;
        pipeline = pipeline.with_gamma(table);
    }

    if let Some(ref path) = opts.mask {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read mask file {}", path.display()))?;
        let mask = ShadowMask::parse(&text)
            .with_context(|| format!("Failed to parse mask file {}", path.display()))?;
        pipeline = pipeline.with_mask(mask, opts.mask_2x);
    }

    let config = OutputConfig {
        width: opts.resolution.width,
        height: opts.resolution.height,
        mode: opts.mode,
        aspect_ratio: opts.display_aspect(src.width(), src.height()),
        step_mode: opts.vscale_step,
    };

    let (canvas, placement) = pipeline
        .process(&src, &config)
        .context("Scaling pipeline failed")?;
    info!(
        "Placed {}x{} at {},{} (scale {})",
        placement.width, placement.height, placement.left, placement.top, placement.scale
    );

    save_image(&opts.output, canvas)?;
    info!("Wrote {}", opts.output.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(logging::level_from_flags(cli.quiet, cli.verbose));

    let opts = cli.into_options()?;
    run(opts)
}
