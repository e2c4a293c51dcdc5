//! Gamma lookup-table parsing and application
//!
//! A gamma file carries exactly 256 data lines, one per input value. A line
//! with commas sets the three channels independently; a bare integer sets
//! all three to the same value. The two line forms may be mixed freely.

use crate::pixmap::Pixmap;
use thiserror::Error;

/// Number of entries a complete gamma table must have
pub const GAMMA_ENTRIES: usize = 256;

/// Errors raised while parsing gamma text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GammaError {
    #[error("gamma table has more than {GAMMA_ENTRIES} entries (line {line})")]
    GammaTableOverflow { line: usize },

    #[error("gamma table has {rows} entries, expected {GAMMA_ENTRIES}")]
    GammaTableSizeMismatch { rows: usize },

    #[error("malformed gamma line {line}: {reason}")]
    MalformedGammaLine { line: usize, reason: String },
}

/// Per-channel 256-entry lookup tables, values clamped to [0, 255]
#[derive(Clone, PartialEq, Eq)]
pub struct GammaTable {
    r: [u8; GAMMA_ENTRIES],
    g: [u8; GAMMA_ENTRIES],
    b: [u8; GAMMA_ENTRIES],
}

impl std::fmt::Debug for GammaTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GammaTable")
            .field("r", &format!("[{}..{}]", self.r[0], self.r[255]))
            .field("g", &format!("[{}..{}]", self.g[0], self.g[255]))
            .field("b", &format!("[{}..{}]", self.b[0], self.b[255]))
            .finish()
    }
}

impl GammaTable {
    /// Parse gamma text into three channel tables
    pub fn parse(text: &str) -> Result<Self, GammaError> {
        let mut r = [0u8; GAMMA_ENTRIES];
        let mut g = [0u8; GAMMA_ENTRIES];
        let mut b = [0u8; GAMMA_ENTRIES];
        let mut rows = 0usize;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if rows == GAMMA_ENTRIES {
                return Err(GammaError::GammaTableOverflow { line: line_no });
            }

            if line.contains(',') {
                let parts: Vec<&str> = line.split(',').map(str::trim).collect();
                if parts.len() != 3 {
                    return Err(GammaError::MalformedGammaLine {
                        line: line_no,
                        reason: format!("expected 3 values, got {}", parts.len()),
                    });
                }
                r[rows] = parse_entry(parts[0], line_no)?;
                g[rows] = parse_entry(parts[1], line_no)?;
                b[rows] = parse_entry(parts[2], line_no)?;
            } else {
                let value = parse_entry(line, line_no)?;
                r[rows] = value;
                g[rows] = value;
                b[rows] = value;
            }
            rows += 1;
        }

        if rows != GAMMA_ENTRIES {
            return Err(GammaError::GammaTableSizeMismatch { rows });
        }

        Ok(Self { r, g, b })
    }

    /// The identity table: output equals input on every channel
    pub fn identity() -> Self {
        let mut table = [0u8; GAMMA_ENTRIES];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self {
            r: table,
            g: table,
            b: table,
        }
    }

    pub fn red(&self) -> &[u8; GAMMA_ENTRIES] {
        &self.r
    }

    pub fn green(&self) -> &[u8; GAMMA_ENTRIES] {
        &self.g
    }

    pub fn blue(&self) -> &[u8; GAMMA_ENTRIES] {
        &self.b
    }

    /// Substitute every RGB value through the tables, in place
    ///
    /// Alpha is untouched. Runs before any resampling when enabled.
    pub fn apply(&self, pix: &mut Pixmap) {
        for px in pix.data_mut().chunks_exact_mut(4) {
            px[0] = self.r[px[0] as usize];
            px[1] = self.g[px[1] as usize];
            px[2] = self.b[px[2] as usize];
        }
    }
}

/// Parse one integer entry, clamped to [0, 255]
fn parse_entry(token: &str, line: usize) -> Result<u8, GammaError> {
    let value: i64 = token.parse().map_err(|_| GammaError::MalformedGammaLine {
        line,
        reason: format!("invalid integer {:?}", token),
    })?;
    Ok(value.clamp(0, 255) as u8)
}
