//! End-to-end runs through the scaling pipeline with artifacts loaded
//! from files, the way the binary drives it.

use std::fs;
use std::io::Write;

use tempfile::NamedTempFile;

use retroscale::geometry::ScalingMode;
use retroscale::pipeline::{OutputConfig, Pipeline};
use retroscale::{FilterData, GammaTable, Pixmap, ShadowMask};

const SHARP_FILTER: &str = "\
# Sharp interpolation, 4 phases
0, 128, 0, 0
-8, 120, 18, -2
-10, 74, 74, -10
-2, 18, 120, -8
";

fn write_temp(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

fn gradient(width: u32, height: u32) -> Pixmap {
    let mut pix = Pixmap::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = (x * 255 / width.max(1)) as u8;
            pix.set_pixel(x, y, [v, v, v, 255]);
        }
    }
    pix
}

#[test]
fn test_filter_file_round_trip_through_pipeline() {
    let file = write_temp(SHARP_FILTER);
    let text = fs::read_to_string(file.path()).unwrap();
    let filter = FilterData::parse(&text).unwrap();
    assert_eq!(filter.num_phases(), 4);
    assert!(!filter.is_adaptive());

    let pipeline = Pipeline::new(filter.clone(), filter);
    let src = gradient(64, 48);
    let config = OutputConfig {
        width: 256,
        height: 192,
        mode: ScalingMode::Fullscreen,
        aspect_ratio: 1.0,
        step_mode: 1,
    };

    let (canvas, placement) = pipeline.process(&src, &config).unwrap();
    assert_eq!((canvas.width(), canvas.height()), (256, 192));
    assert_eq!((placement.width, placement.height), (256, 192));
    // Gradient direction survives the resample
    assert!(canvas.pixel(250, 96)[0] > canvas.pixel(5, 96)[0]);
}

#[test]
fn test_serialized_filter_reparses_identically() {
    let original = FilterData::parse(SHARP_FILTER).unwrap();
    let file = write_temp(&original.to_text());
    let text = fs::read_to_string(file.path()).unwrap();
    let reparsed = FilterData::parse(&text).unwrap();
    assert_eq!(original, reparsed);
}

#[test]
fn test_mask_and_gamma_from_files() {
    // 2x1 aperture mask: left cell brightens red, right cell brightens blue
    let mask_file = write_temp("2,1\n400,100\n");
    let gamma_text: String = (0..=255).map(|v| format!("{}\n", v)).collect();
    let gamma_file = write_temp(&gamma_text);

    let mask = ShadowMask::parse(&fs::read_to_string(mask_file.path()).unwrap()).unwrap();
    let gamma = GammaTable::parse(&fs::read_to_string(gamma_file.path()).unwrap()).unwrap();
    assert_eq!(mask.sets().len(), 1);

    let filter = FilterData::parse(SHARP_FILTER).unwrap();
    let pipeline = Pipeline::new(filter.clone(), filter)
        .with_gamma(gamma)
        .with_mask(mask, false);

    let src = Pixmap::filled(8, 8, [128, 128, 128, 255]);
    let config = OutputConfig {
        width: 16,
        height: 16,
        mode: ScalingMode::Fullscreen,
        aspect_ratio: 1.0,
        step_mode: 1,
    };

    let (canvas, _) = pipeline.process(&src, &config).unwrap();
    // Identity gamma leaves values alone; the mask darkens the channels
    // whose brighten bit is clear, so columns alternate in red
    let red_even = canvas.pixel(4, 8)[0];
    let red_odd = canvas.pixel(5, 8)[0];
    assert_ne!(red_even, red_odd);
    assert_eq!(canvas.pixel(4, 8)[3], 255);
}

#[test]
fn test_vscale_pipeline_centers_output() {
    let filter = FilterData::parse(SHARP_FILTER).unwrap();
    let pipeline = Pipeline::new(filter.clone(), filter);

    let src = gradient(320, 240);
    let config = OutputConfig {
        width: 1920,
        height: 1080,
        mode: ScalingMode::SteppedVscale,
        aspect_ratio: 4.0 / 3.0,
        step_mode: 1,
    };

    let (canvas, placement) = pipeline.process(&src, &config).unwrap();
    assert_eq!(placement.scale, 4.0);
    assert_eq!((placement.width, placement.height), (1280, 960));
    assert_eq!((placement.left, placement.top), (320, 60));
    // Pillarbox bars are opaque black
    assert_eq!(canvas.pixel(0, 540), [0, 0, 0, 255]);
    assert_eq!(canvas.pixel(1919, 540), [0, 0, 0, 255]);
}
