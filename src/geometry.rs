//! Output placement: scaling mode selection, aspect-ratio fitting and
//! stepped integer-ish vertical scale factors

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Placement computation errors
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("unknown scaling mode '{0}' (expected fullscreen, aspect or vscale)")]
    InvalidScalingMode(String),

    #[error("invalid vscale step mode {0} (expected 1, 2 or 3)")]
    InvalidStepMode(u32),
}

/// How the scaled image fills the output canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingMode {
    /// Stretch to the full canvas, ignoring aspect ratio
    Fullscreen,
    /// Largest size that fits the canvas while keeping the aspect ratio
    AspectFit,
    /// Vertical scale snapped down to a step, width follows the aspect ratio
    SteppedVscale,
}

impl FromStr for ScalingMode {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fullscreen" => Ok(ScalingMode::Fullscreen),
            "aspect" => Ok(ScalingMode::AspectFit),
            "vscale" => Ok(ScalingMode::SteppedVscale),
            other => Err(GeometryError::InvalidScalingMode(other.to_string())),
        }
    }
}

impl fmt::Display for ScalingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalingMode::Fullscreen => "fullscreen",
            ScalingMode::AspectFit => "aspect",
            ScalingMode::SteppedVscale => "vscale",
        };
        f.write_str(name)
    }
}

/// Granularity of the stepped vertical scale factor
pub fn vscale_step(mode: u32) -> Result<f64, GeometryError> {
    match mode {
        1 => Ok(1.0),
        2 => Ok(0.5),
        3 => Ok(0.25),
        other => Err(GeometryError::InvalidStepMode(other)),
    }
}

/// Where the scaled image lands on the output canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Vertical scale factor actually applied; 1.0 for fullscreen, which
    /// stretches each axis independently. Only a zero width/height (see
    /// [`Placement::is_empty`]) marks a degenerate placement.
    pub scale: f64,
    pub width: u32,
    pub height: u32,
    pub left: u32,
    pub top: u32,
}

impl Placement {
    /// True when the stepped scale collapsed to nothing
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

fn centered(out_width: u32, out_height: u32, width: u32, height: u32) -> (u32, u32) {
    let left = out_width.saturating_sub(width) / 2;
    let top = out_height.saturating_sub(height) / 2;
    (left, top)
}

/// Fill the whole canvas
pub fn place_fullscreen(out_width: u32, out_height: u32) -> Placement {
    Placement {
        scale: 1.0,
        width: out_width,
        height: out_height,
        left: 0,
        top: 0,
    }
}

/// Largest placement that fits the canvas without changing the source's
/// pixel aspect ratio
pub fn place_aspect_fit(
    src_width: u32,
    src_height: u32,
    out_width: u32,
    out_height: u32,
) -> Placement {
    let scale = (out_width as f64 / src_width as f64)
        .min(out_height as f64 / src_height as f64);

    let width = (src_width as f64 * scale).floor() as u32;
    let height = (src_height as f64 * scale).floor() as u32;
    let (left, top) = centered(out_width, out_height, width, height);

    Placement {
        scale,
        width,
        height,
        left,
        top,
    }
}

/// Vertical scale snapped down to the step for `step_mode`, then decremented
/// by whole steps until the implied width fits the canvas
///
/// `aspect_ratio` is the display aspect (e.g. 4/3): the placed width is
/// `floor(src_height * scale * aspect_ratio)`. A source taller than the
/// canvas (or too wide at the minimum step) yields a degenerate zero-size
/// placement rather than an error.
pub fn place_stepped_vscale(
    src_height: u32,
    out_width: u32,
    out_height: u32,
    aspect_ratio: f64,
    step_mode: u32,
) -> Result<Placement, GeometryError> {
    let step = vscale_step(step_mode)?;

    let mut scale = ((out_height as f64 / src_height as f64) / step).floor() * step;
    let width_for = |s: f64| (src_height as f64 * s * aspect_ratio).floor();

    while scale > 0.0 && width_for(scale) > out_width as f64 {
        scale -= step;
    }

    if scale <= 0.0 {
        return Ok(Placement {
            scale: 0.0,
            width: 0,
            height: 0,
            left: 0,
            top: 0,
        });
    }

    let width = width_for(scale) as u32;
    let height = (src_height as f64 * scale).floor() as u32;
    let (left, top) = centered(out_width, out_height, width, height);

    Ok(Placement {
        scale,
        width,
        height,
        left,
        top,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("fullscreen".parse::<ScalingMode>(), Ok(ScalingMode::Fullscreen));
        assert_eq!("aspect".parse::<ScalingMode>(), Ok(ScalingMode::AspectFit));
        assert_eq!("vscale".parse::<ScalingMode>(), Ok(ScalingMode::SteppedVscale));
        assert_eq!(
            "stretch".parse::<ScalingMode>(),
            Err(GeometryError::InvalidScalingMode("stretch".to_string()))
        );
    }

    #[rstest]
    #[case(1, 1.0)]
    #[case(2, 0.5)]
    #[case(3, 0.25)]
    fn test_vscale_step(#[case] mode: u32, #[case] expected: f64) {
        assert_eq!(vscale_step(mode), Ok(expected));
    }

    #[test]
    fn test_vscale_step_rejects_other_modes() {
        assert_eq!(vscale_step(0), Err(GeometryError::InvalidStepMode(0)));
        assert_eq!(vscale_step(4), Err(GeometryError::InvalidStepMode(4)));
    }

    #[test]
    fn test_fullscreen_covers_canvas() {
        let p = place_fullscreen(1920, 1080);
        assert_eq!((p.width, p.height, p.left, p.top), (1920, 1080, 0, 0));
        // Unit scale, never the zero-size degenerate marker
        assert_eq!(p.scale, 1.0);
        assert!(!p.is_empty());
    }

    #[test]
    fn test_aspect_fit_pillarboxes_narrow_source() {
        // 4:3 content on a 16:9 canvas: height-limited, centered horizontally
        let p = place_aspect_fit(320, 240, 1920, 1080);
        assert_eq!(p.height, 1080);
        assert_eq!(p.width, 1440);
        assert_eq!(p.left, 240);
        assert_eq!(p.top, 0);
    }

    #[test]
    fn test_aspect_fit_letterboxes_wide_source() {
        let p = place_aspect_fit(640, 200, 640, 480);
        assert_eq!(p.width, 640);
        assert_eq!(p.height, 200);
        assert_eq!(p.left, 0);
        assert_eq!(p.top, 140);
    }

    #[test]
    fn test_aspect_fit_floors_fractional_dims() {
        let p = place_aspect_fit(320, 240, 500, 500);
        // scale = 500/320 = 1.5625; height = floor(240 * 1.5625) = 375
        assert_eq!((p.width, p.height), (500, 375));
        assert_eq!((p.left, p.top), (0, 62));
    }

    #[test]
    fn test_stepped_vscale_exact_double() {
        let p = place_stepped_vscale(240, 640, 480, 4.0 / 3.0, 1).unwrap();
        assert_eq!(p.scale, 2.0);
        assert_eq!((p.width, p.height), (640, 480));
        assert_eq!((p.left, p.top), (0, 0));
    }

    #[test]
    fn test_stepped_vscale_snaps_down() {
        // 1080/240 = 4.5; whole steps snap to 4.0
        let p = place_stepped_vscale(240, 1920, 1080, 4.0 / 3.0, 1).unwrap();
        assert_eq!(p.scale, 4.0);
        assert_eq!((p.width, p.height), (1280, 960));
        assert_eq!((p.left, p.top), (320, 60));
    }

    #[test]
    fn test_stepped_vscale_half_steps() {
        let p = place_stepped_vscale(240, 1920, 1080, 4.0 / 3.0, 2).unwrap();
        assert_eq!(p.scale, 4.5);
        assert_eq!((p.width, p.height), (1440, 1080));
    }

    #[test]
    fn test_stepped_vscale_decrements_for_width() {
        // Height would allow 4x but a wide ratio only fits at 2x
        let p = place_stepped_vscale(100, 800, 400, 4.0, 1).unwrap();
        assert_eq!(p.scale, 2.0);
        assert_eq!((p.width, p.height), (800, 200));
        assert_eq!((p.left, p.top), (0, 100));
    }

    #[test]
    fn test_stepped_vscale_degenerate() {
        // Source taller than the canvas: scale snaps to zero
        let p = place_stepped_vscale(600, 640, 480, 4.0 / 3.0, 1).unwrap();
        assert!(p.is_empty());
        assert_eq!(p.scale, 0.0);
    }
}
