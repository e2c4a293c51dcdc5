//! One-call processing session tying the stages together
//!
//! A `Pipeline` owns the parsed artifacts (filters, optional gamma table,
//! optional shadow mask) and runs them in a fixed order: gamma, horizontal
//! resample, vertical resample, mask, composition onto the output canvas.

use log::debug;

use crate::filter::FilterData;
use crate::gamma::GammaTable;
use crate::geometry::{
    place_aspect_fit, place_fullscreen, place_stepped_vscale, GeometryError, Placement,
    ScalingMode,
};
use crate::mask::ShadowMask;
use crate::pixmap::Pixmap;
use crate::scaler::{resample, Axis};

/// Output canvas and placement policy
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub width: u32,
    pub height: u32,
    pub mode: ScalingMode,
    /// Display aspect ratio (e.g. 4/3) driving the stepped-vscale width
    pub aspect_ratio: f64,
    /// Step granularity for `ScalingMode::SteppedVscale` (1, 2 or 3)
    pub step_mode: u32,
}

impl OutputConfig {
    fn placement(&self, src: &Pixmap) -> Result<Placement, GeometryError> {
        match self.mode {
            ScalingMode::Fullscreen => Ok(place_fullscreen(self.width, self.height)),
            ScalingMode::AspectFit => Ok(place_aspect_fit(
                src.width(),
                src.height(),
                self.width,
                self.height,
            )),
            ScalingMode::SteppedVscale => place_stepped_vscale(
                src.height(),
                self.width,
                self.height,
                self.aspect_ratio,
                self.step_mode,
            ),
        }
    }
}

/// Processing session holding the loaded artifacts
///
/// Replaces the ad-hoc global state a typical interactive tool keeps: once
/// built, a pipeline is immutable and `process` can run any number of
/// frames through it.
pub struct Pipeline {
    horz_filter: FilterData,
    vert_filter: FilterData,
    gamma: Option<GammaTable>,
    mask: Option<ShadowMask>,
    mask_2x: bool,
}

impl Pipeline {
    pub fn new(horz_filter: FilterData, vert_filter: FilterData) -> Self {
        Pipeline {
            horz_filter,
            vert_filter,
            gamma: None,
            mask: None,
            mask_2x: false,
        }
    }

    pub fn with_gamma(mut self, gamma: GammaTable) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn with_mask(mut self, mask: ShadowMask, double_size: bool) -> Self {
        self.mask = Some(mask);
        self.mask_2x = double_size;
        self
    }

    /// Run the full pipeline on one frame
    ///
    /// Returns the composed output canvas (always `config.width` x
    /// `config.height`, opaque black outside the placement) together with
    /// the placement that was applied. A degenerate placement yields an
    /// all-black canvas.
    pub fn process(
        &self,
        src: &Pixmap,
        config: &OutputConfig,
    ) -> Result<(Pixmap, Placement), GeometryError> {
        let placement = config.placement(src)?;
        let mut canvas = Pixmap::filled(config.width, config.height, [0, 0, 0, 255]);

        if placement.is_empty() {
            debug!("degenerate placement, emitting black canvas");
            return Ok((canvas, placement));
        }

        let scaled = self.scale(src, placement.width, placement.height, config.height);
        scaled.blit_into(&mut canvas, placement.left, placement.top);
        Ok((canvas, placement))
    }

    fn scale(&self, src: &Pixmap, width: u32, height: u32, canvas_height: u32) -> Pixmap {
        let mut frame = src.clone();

        if let Some(gamma) = &self.gamma {
            gamma.apply(&mut frame);
        }

        if frame.width() != width {
            frame = resample(&frame, &self.horz_filter, width, Axis::Horizontal);
        } else {
            debug!("horizontal pass skipped, extent already {}", width);
        }

        if frame.height() != height {
            frame = resample(&frame, &self.vert_filter, height, Axis::Vertical);
        } else {
            debug!("vertical pass skipped, extent already {}", height);
        }

        if let Some(mask) = &self.mask {
            mask.apply(&mut frame, self.mask_2x, canvas_height);
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamma::GammaTable;
    use crate::mask::ShadowMask;

    fn passthrough_filter() -> FilterData {
        FilterData::parse("0, 128, 0, 0\n0, 128, 0, 0\n0, 128, 0, 0\n0, 128, 0, 0\n").unwrap()
    }

    fn config(width: u32, height: u32, mode: ScalingMode) -> OutputConfig {
        OutputConfig {
            width,
            height,
            mode,
            aspect_ratio: 1.0,
            step_mode: 1,
        }
    }

    #[test]
    fn test_fullscreen_upscale_dims() {
        let pipeline = Pipeline::new(passthrough_filter(), passthrough_filter());
        let src = Pixmap::filled(4, 4, [120, 120, 120, 255]);
        let cfg = config(8, 8, ScalingMode::Fullscreen);

        let (canvas, placement) = pipeline.process(&src, &cfg).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (8, 8));
        assert_eq!((placement.width, placement.height), (8, 8));
        assert_eq!(canvas.pixel(3, 3), [120, 120, 120, 255]);
    }

    #[test]
    fn test_aspect_fit_letterboxes_black() {
        let pipeline = Pipeline::new(passthrough_filter(), passthrough_filter());
        let src = Pixmap::filled(8, 2, [200, 200, 200, 255]);
        let cfg = config(8, 8, ScalingMode::AspectFit);

        let (canvas, placement) = pipeline.process(&src, &cfg).unwrap();
        assert_eq!((placement.width, placement.height), (8, 2));
        assert_eq!(placement.top, 3);
        // Letterbox bars stay opaque black
        assert_eq!(canvas.pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(canvas.pixel(0, 7), [0, 0, 0, 255]);
        assert_eq!(canvas.pixel(4, 4), [200, 200, 200, 255]);
    }

    #[test]
    fn test_equal_extents_skip_both_passes() {
        // An identity-breaking filter that would darken if a pass ran
        let dimming = FilterData::parse("0, 64, 0, 0\n0, 64, 0, 0\n0, 64, 0, 0\n0, 64, 0, 0\n")
            .unwrap();
        let pipeline = Pipeline::new(dimming.clone(), dimming);
        let src = Pixmap::filled(4, 4, [100, 100, 100, 255]);
        let cfg = config(4, 4, ScalingMode::Fullscreen);

        let (canvas, _) = pipeline.process(&src, &cfg).unwrap();
        assert_eq!(canvas.pixel(2, 2), [100, 100, 100, 255]);
    }

    #[test]
    fn test_gamma_runs_before_scaling() {
        // Inverting gamma on a flat frame, then pass-through scaling
        let mut text = String::new();
        for v in (0..=255).rev() {
            text.push_str(&format!("{}\n", v));
        }
        let gamma = GammaTable::parse(&text).unwrap();

        let pipeline =
            Pipeline::new(passthrough_filter(), passthrough_filter()).with_gamma(gamma);
        let src = Pixmap::filled(4, 4, [0, 0, 0, 255]);
        let cfg = config(8, 8, ScalingMode::Fullscreen);

        let (canvas, _) = pipeline.process(&src, &cfg).unwrap();
        assert_eq!(canvas.pixel(4, 4), [255, 255, 255, 255]);
    }

    #[test]
    fn test_mask_applied_after_scaling() {
        // Single-cell mask that darkens every channel by half the value
        let mask = ShadowMask::parse("1,1\n708\n").unwrap();
        let pipeline =
            Pipeline::new(passthrough_filter(), passthrough_filter()).with_mask(mask, false);
        let src = Pixmap::filled(2, 2, [200, 200, 200, 255]);
        let cfg = config(4, 4, ScalingMode::Fullscreen);

        let (canvas, _) = pipeline.process(&src, &cfg).unwrap();
        // '7' brightens all channels, so brighten wins and the add nibble
        // is 0: values are unchanged
        assert_eq!(canvas.pixel(1, 1), [200, 200, 200, 255]);
    }

    #[test]
    fn test_degenerate_vscale_black_canvas() {
        let pipeline = Pipeline::new(passthrough_filter(), passthrough_filter());
        let src = Pixmap::filled(4, 100, [255, 255, 255, 255]);
        let cfg = config(8, 8, ScalingMode::SteppedVscale);

        let (canvas, placement) = pipeline.process(&src, &cfg).unwrap();
        assert!(placement.is_empty());
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(canvas.pixel(x, y), [0, 0, 0, 255]);
            }
        }
    }
}
