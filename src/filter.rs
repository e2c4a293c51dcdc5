//! Polyphase coefficient filter parsing
//!
//! Filters are plain text: one row of four comma-separated signed integers
//! per phase. Two optional keywords in the leading lines change how the rows
//! are interpreted: `10bit` widens the coefficient range and the full-scale
//! divisor, `adaptive` splits the rows into a dark half and a light half
//! that the resampler blends by local brightness.

use thiserror::Error;

/// Phase counts the scaler hardware accepts
pub const VALID_PHASE_COUNTS: [usize; 5] = [4, 8, 16, 64, 256];

/// Leading lines searched for the `10bit` / `adaptive` keywords
const KEYWORD_WINDOW: usize = 5;

/// Errors raised while parsing filter text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("expected 4 coefficients, got {count} on line {line}")]
    MalformedCoefficientRow { line: usize, count: usize },

    #[error("invalid coefficient value {token:?} on line {line}")]
    InvalidInteger { line: usize, token: String },

    #[error("no coefficient rows found in filter text")]
    EmptyFilter,

    #[error("adaptive filter must have an even number of coefficient rows")]
    OddAdaptiveRowCount,

    #[error("invalid phase count: {0} (must be one of 4, 8, 16, 64, 256)")]
    InvalidPhaseCount(usize),
}

/// Parsed polyphase filter
///
/// Immutable once built. For adaptive filters the first `num_phases` rows
/// are the dark coefficients and the second half the light coefficients,
/// index-aligned by phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterData {
    coefficients: Vec<[i32; 4]>,
    is_10bit: bool,
    is_adaptive: bool,
    num_phases: usize,
}

impl FilterData {
    /// Parse filter text into a validated coefficient table
    pub fn parse(text: &str) -> Result<Self, FilterError> {
        let mut is_10bit = false;
        let mut is_adaptive = false;
        let mut coefficients: Vec<[i32; 4]> = Vec::new();
        let mut nonblank_seen = 0usize;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            nonblank_seen += 1;

            // Mode keywords only count in the leading lines of the file
            if nonblank_seen <= KEYWORD_WINDOW {
                if line == "10bit" {
                    is_10bit = true;
                    continue;
                }
                if line == "adaptive" {
                    is_adaptive = true;
                    continue;
                }
            }

            if line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            if parts.len() != 4 {
                return Err(FilterError::MalformedCoefficientRow {
                    line: line_no,
                    count: parts.len(),
                });
            }

            let mut row = [0i32; 4];
            for (slot, token) in row.iter_mut().zip(&parts) {
                *slot = token.parse().map_err(|_| FilterError::InvalidInteger {
                    line: line_no,
                    token: (*token).to_string(),
                })?;
            }

            let (min, max) = Self::coefficient_range(is_10bit);
            for &coeff in &row {
                if coeff < min || coeff > max {
                    // Deliberately tolerated: relaxed custom filters rely on it
                    log::warn!(
                        "coefficient {} out of range [{}, {}] on line {}",
                        coeff,
                        min,
                        max,
                        line_no
                    );
                }
            }

            coefficients.push(row);
        }

        if coefficients.is_empty() {
            return Err(FilterError::EmptyFilter);
        }
        if is_adaptive && coefficients.len() % 2 != 0 {
            return Err(FilterError::OddAdaptiveRowCount);
        }

        let num_phases = coefficients.len() / if is_adaptive { 2 } else { 1 };
        if !VALID_PHASE_COUNTS.contains(&num_phases) {
            return Err(FilterError::InvalidPhaseCount(num_phases));
        }

        log::debug!(
            "filter parsed: {} phases, {}-bit, {}",
            num_phases,
            if is_10bit { 10 } else { 9 },
            if is_adaptive { "adaptive" } else { "single" }
        );

        Ok(Self {
            coefficients,
            is_10bit,
            is_adaptive,
            num_phases,
        })
    }

    /// Valid coefficient bounds for the given bit depth
    pub fn coefficient_range(is_10bit: bool) -> (i32, i32) {
        if is_10bit {
            (-512, 511)
        } else {
            (-256, 255)
        }
    }

    pub fn num_phases(&self) -> usize {
        self.num_phases
    }

    pub fn is_10bit(&self) -> bool {
        self.is_10bit
    }

    pub fn is_adaptive(&self) -> bool {
        self.is_adaptive
    }

    /// Full-scale divisor applied to the tap dot product
    pub fn full_brightness(&self) -> i32 {
        if self.is_10bit {
            256
        } else {
            128
        }
    }

    /// Dark (or only) coefficient row for a phase
    #[inline]
    pub fn dark_row(&self, phase: usize) -> &[i32; 4] {
        &self.coefficients[phase]
    }

    /// Light coefficient row for a phase, when the filter is adaptive
    #[inline]
    pub fn light_row(&self, phase: usize) -> Option<&[i32; 4]> {
        if self.is_adaptive {
            Some(&self.coefficients[self.num_phases + phase])
        } else {
            None
        }
    }

    /// All coefficient rows in file order (dark half first when adaptive)
    pub fn rows(&self) -> &[[i32; 4]] {
        &self.coefficients
    }

    /// Render the filter back to its text form
    ///
    /// The output re-parses to an identical filter: keywords first, then the
    /// coefficient rows, with the dark/light halves labelled by comments.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if self.is_10bit {
            out.push_str("10bit\n");
        }
        if self.is_adaptive {
            out.push_str("adaptive\n");
            out.push_str("# Dark coefficients (low brightness)\n");
            for row in &self.coefficients[..self.num_phases] {
                out.push_str(&format_row(row));
            }
            out.push_str("\n# Light coefficients (high brightness)\n");
            for row in &self.coefficients[self.num_phases..] {
                out.push_str(&format_row(row));
            }
        } else {
            for row in &self.coefficients {
                out.push_str(&format_row(row));
            }
        }
        out
    }
}

fn format_row(row: &[i32; 4]) -> String {
    format!("{}, {}, {}, {}\n", row[0], row[1], row[2], row[3])
}
