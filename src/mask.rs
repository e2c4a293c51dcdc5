//! CRT shadow-mask parsing and compositing
//!
//! A mask file describes a small grid of 3-character cells that is tiled
//! over the image. Each cell selects, per RGB channel, whether the channel
//! is brightened or darkened, and how strongly, as a sum of bit-shifted
//! copies of the channel value. Newer files carry several grids tagged with
//! a `Resolution=` threshold so the pattern can follow the output size.

use crate::pixmap::Pixmap;
use thiserror::Error;

/// Errors raised while parsing shadow-mask text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaskError {
    #[error("mask rows found before a width,height line")]
    MissingDimensions,

    #[error("no mask patterns found in input")]
    NoPatternsFound,

    #[error("malformed mask cell {token:?} on line {line}")]
    MalformedCell { line: usize, token: String },

    #[error("mask row on line {line} has {got} cells, expected {expected}")]
    RowMismatch {
        line: usize,
        expected: usize,
        got: usize,
    },

    #[error("mask block declares {expected} rows but contains {got}")]
    RowCountMismatch { expected: usize, got: usize },

    #[error("invalid resolution value on line {line}")]
    InvalidResolution { line: usize },
}

/// One decoded mask cell
///
/// All fields are single bits stored as 0/1. The darken-enable bits are
/// always the complement of the brighten-enable bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaskCell {
    pub rb: u8,
    pub gb: u8,
    pub bb: u8,
    pub rd: u8,
    pub gd: u8,
    pub bd: u8,
    pub b0: u8,
    pub b1: u8,
    pub b2: u8,
    pub b3: u8,
    pub c0: u8,
    pub c1: u8,
    pub c2: u8,
    pub c3: u8,
}

impl MaskCell {
    /// Decode a 3-character cell token
    ///
    /// First char: decimal digit whose low 3 bits are the r/g/b
    /// brighten-enables. Second and third chars: hex nibbles read LSB-first
    /// into the add and subtract weight selectors.
    pub fn decode(token: &str, line: usize) -> Result<Self, MaskError> {
        let malformed = || MaskError::MalformedCell {
            line,
            token: token.to_string(),
        };

        let mut chars = token.chars();
        let (Some(enable), Some(add), Some(sub), None) =
            (chars.next(), chars.next(), chars.next(), chars.next())
        else {
            return Err(malformed());
        };

        let enable = enable.to_digit(10).ok_or_else(malformed)?;
        let add = add.to_ascii_lowercase().to_digit(16).ok_or_else(malformed)?;
        let sub = sub.to_ascii_lowercase().to_digit(16).ok_or_else(malformed)?;

        let rb = ((enable >> 2) & 1) as u8;
        let gb = ((enable >> 1) & 1) as u8;
        let bb = (enable & 1) as u8;

        Ok(Self {
            rb,
            gb,
            bb,
            rd: rb ^ 1,
            gd: gb ^ 1,
            bd: bb ^ 1,
            b0: (add & 1) as u8,
            b1: ((add >> 1) & 1) as u8,
            b2: ((add >> 2) & 1) as u8,
            b3: ((add >> 3) & 1) as u8,
            c0: (sub & 1) as u8,
            c1: ((sub >> 1) & 1) as u8,
            c2: ((sub >> 2) & 1) as u8,
            c3: ((sub >> 3) & 1) as u8,
        })
    }

    /// Transform one 8-bit channel value
    ///
    /// `brighten`/`darken` are the channel's own enable bit pair. The 4-bit
    /// selectors act as a sum-of-shifted-copies approximation of a
    /// fractional multiply.
    #[inline]
    pub fn apply_channel(&self, value: u8, brighten: u8, darken: u8) -> u8 {
        let v = value as i32;
        let add = (v >> 4) * self.b0 as i32
            + (v >> 3) * self.b1 as i32
            + (v >> 2) * self.b2 as i32
            + (v >> 1) * self.b3 as i32;
        let sub = v
            - ((v >> 4) * self.c0 as i32
                + (v >> 3) * self.c1 as i32
                + (v >> 2) * self.c2 as i32
                + (v >> 1) * self.c3 as i32);
        (v + brighten as i32 * add - darken as i32 * sub).clamp(0, 255) as u8
    }
}

/// A tiled grid of mask cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskPattern {
    width: usize,
    height: usize,
    cells: Vec<MaskCell>,
}

impl MaskPattern {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell at image coordinates, tiling by modulo
    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> &MaskCell {
        &self.cells[(y % self.height) * self.width + (x % self.width)]
    }
}

/// A pattern tagged with the output resolution it targets
///
/// `resolution` 0 is the default/fallback entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskPatternSet {
    pub resolution: u32,
    pub pattern: MaskPattern,
}

/// A parsed shadow-mask file: one or more resolution-tagged patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowMask {
    sets: Vec<MaskPatternSet>,
}

/// Parser state for one pattern block
struct Block {
    resolution: u32,
    dims: Option<(usize, usize)>,
    rows: Vec<Vec<MaskCell>>,
}

impl Block {
    fn new(resolution: u32) -> Self {
        Self {
            resolution,
            dims: None,
            rows: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.dims.is_none() && self.rows.is_empty()
    }

    fn finish(self) -> Result<MaskPatternSet, MaskError> {
        let (width, height) = self.dims.ok_or(MaskError::MissingDimensions)?;
        if self.rows.len() != height {
            return Err(MaskError::RowCountMismatch {
                expected: height,
                got: self.rows.len(),
            });
        }
        let cells = self.rows.into_iter().flatten().collect();
        Ok(MaskPatternSet {
            resolution: self.resolution,
            pattern: MaskPattern {
                width,
                height,
                cells,
            },
        })
    }
}

impl ShadowMask {
    /// Parse mask text in either the legacy or the multi-resolution format
    ///
    /// Legacy input is a single `width,height` line plus cell rows and
    /// yields one pattern at resolution 0. Multi-resolution input repeats
    /// that structure under `Resolution=<n>` headers, each followed by a
    /// `v2` marker line.
    pub fn parse(text: &str) -> Result<Self, MaskError> {
        let mut sets = Vec::new();
        let mut block = Block::new(0);

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(value) = line.strip_prefix("Resolution=") {
                let resolution: u32 = value
                    .trim()
                    .parse()
                    .map_err(|_| MaskError::InvalidResolution { line: line_no })?;
                if !block.is_empty() {
                    sets.push(block.finish()?);
                }
                block = Block::new(resolution);
                continue;
            }

            // Format version marker inside multi-resolution blocks
            if line == "v2" {
                continue;
            }

            let width = match block.dims {
                Some((w, _)) => w,
                None => {
                    if let Some((w, h)) = parse_dimensions(line) {
                        block.dims = Some((w, h));
                        continue;
                    }
                    return Err(MaskError::MissingDimensions);
                }
            };
            let tokens: Vec<&str> = line.split(',').map(str::trim).collect();
            if tokens.len() != width {
                return Err(MaskError::RowMismatch {
                    line: line_no,
                    expected: width,
                    got: tokens.len(),
                });
            }
            let row = tokens
                .iter()
                .map(|t| MaskCell::decode(t, line_no))
                .collect::<Result<Vec<_>, _>>()?;
            block.rows.push(row);
        }

        if !block.is_empty() {
            sets.push(block.finish()?);
        }
        if sets.is_empty() {
            return Err(MaskError::NoPatternsFound);
        }

        log::debug!("shadow mask parsed: {} pattern set(s)", sets.len());
        Ok(Self { sets })
    }

    pub fn sets(&self) -> &[MaskPatternSet] {
        &self.sets
    }

    /// Pick the pattern for a target output height
    ///
    /// Highest resolution threshold that does not exceed the target wins;
    /// when none qualifies the lowest-resolution entry acts as the default.
    pub fn select_for_resolution(&self, target_height: u32) -> &MaskPatternSet {
        let mut best: Option<&MaskPatternSet> = None;
        let mut lowest = &self.sets[0];
        for set in &self.sets {
            if set.resolution < lowest.resolution {
                lowest = set;
            }
            if set.resolution <= target_height
                && best.map_or(true, |b| set.resolution > b.resolution)
            {
                best = Some(set);
            }
        }
        best.unwrap_or(lowest)
    }

    /// Apply the mask to a buffer in place
    ///
    /// `target_height` drives pattern selection and is the final output
    /// height, which can differ from the buffer's own height under
    /// letterboxing. With `double_size` each mask cell covers a 2x2 pixel
    /// block. Alpha passes through unchanged.
    pub fn apply(&self, pix: &mut Pixmap, double_size: bool, target_height: u32) {
        let pattern = &self.select_for_resolution(target_height).pattern;
        for y in 0..pix.height() {
            for x in 0..pix.width() {
                let (mx, my) = if double_size {
                    ((x / 2) as usize, (y / 2) as usize)
                } else {
                    (x as usize, y as usize)
                };
                let cell = pattern.cell(mx, my);
                let [r, g, b, a] = pix.pixel(x, y);
                pix.set_pixel(
                    x,
                    y,
                    [
                        cell.apply_channel(r, cell.rb, cell.rd),
                        cell.apply_channel(g, cell.gb, cell.gd),
                        cell.apply_channel(b, cell.bb, cell.bd),
                        a,
                    ],
                );
            }
        }
    }
}

/// Recognize a `width,height` dimensions line (two bare integers)
fn parse_dimensions(line: &str) -> Option<(usize, usize)> {
    let (w, h) = line.split_once(',')?;
    let w: usize = w.trim().parse().ok()?;
    let h: usize = h.trim().parse().ok()?;
    if w == 0 || h == 0 {
        return None;
    }
    Some((w, h))
}
