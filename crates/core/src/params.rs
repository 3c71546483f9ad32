//! Reconstruction parameters.
//!
//! Contains SomParams, the single bag of tunable thresholds consulted by
//! every reconstruction phase.

use crate::error::{Result, SomError};

/// Parameters for semantic object model reconstruction.
///
/// The defaults are empirically tuned. They are treated as tunable knobs,
/// not as derived quantities.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SomParams {
    /// A filled rectangle whose thin side is at most this long may be a ruling line.
    pub line_shape_max_thickness: f64,

    /// Minimum long-side / short-side ratio for a filled rectangle to be a ruling line.
    pub line_shape_min_ratio: f64,

    /// Segments whose coordinates differ by less than this are the same ruling line.
    pub line_merge_tolerance: f64,

    /// Fraction of the orthogonal extent a separator may fall short of at
    /// each end and still count as separating.
    pub separator_margin_ratio: f64,

    /// A whitespace gap wider than this multiple of the natural space
    /// advance is a column-split candidate.
    pub column_gap_space_ratio: f64,

    /// Horizontal inflation, in default character widths, for whitespace merges.
    pub whitespace_inflate_chars: f64,

    /// Maximum relative line-height difference between runs on different lines.
    pub line_height_tolerance: f64,

    /// Two boxes share a visual line while union height / max height stays below this.
    pub same_line_height_ratio: f64,

    /// Horizontal inflation for fragments that follow each other in markup
    /// on the same visual line.
    pub consecutive_inflate: f64,

    /// Horizontal inflation, in default character widths, in every other case.
    pub char_inflate_ratio: f64,

    /// Vertical inflation, as a fraction of the run height, when testing a
    /// run against a block.
    pub line_gap_ratio: f64,

    /// Coordinate tolerance for the closed-rectangle search and row/table adjacency.
    pub table_tolerance: f64,

    /// Inflation applied to both blocks in the combine pass.
    pub combine_inflate: f64,

    /// Vertical inflation applied by the grouping pass.
    pub group_inflate_vertical: f64,
}

impl Default for SomParams {
    fn default() -> Self {
        Self {
            line_shape_max_thickness: 10.0,
            line_shape_min_ratio: 5.0,
            line_merge_tolerance: 0.1,
            separator_margin_ratio: 0.1,
            column_gap_space_ratio: 2.0,
            whitespace_inflate_chars: 3.0,
            line_height_tolerance: 0.1,
            same_line_height_ratio: 1.5,
            consecutive_inflate: 200.0,
            char_inflate_ratio: 1.5,
            line_gap_ratio: 0.5,
            table_tolerance: 1.0,
            combine_inflate: 1.0,
            group_inflate_vertical: 30.0,
        }
    }
}

impl SomParams {
    /// Checks that every parameter is finite and non-negative, and that the
    /// ratio parameters that divide or compare against 1.0 are meaningful.
    pub fn validate(&self) -> Result<()> {
        let fields: [(&'static str, f64); 14] = [
            ("line_shape_max_thickness", self.line_shape_max_thickness),
            ("line_shape_min_ratio", self.line_shape_min_ratio),
            ("line_merge_tolerance", self.line_merge_tolerance),
            ("separator_margin_ratio", self.separator_margin_ratio),
            ("column_gap_space_ratio", self.column_gap_space_ratio),
            ("whitespace_inflate_chars", self.whitespace_inflate_chars),
            ("line_height_tolerance", self.line_height_tolerance),
            ("same_line_height_ratio", self.same_line_height_ratio),
            ("consecutive_inflate", self.consecutive_inflate),
            ("char_inflate_ratio", self.char_inflate_ratio),
            ("line_gap_ratio", self.line_gap_ratio),
            ("table_tolerance", self.table_tolerance),
            ("combine_inflate", self.combine_inflate),
            ("group_inflate_vertical", self.group_inflate_vertical),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(SomError::InvalidParam { name, value });
            }
        }
        if self.separator_margin_ratio >= 0.5 {
            return Err(SomError::InvalidParam {
                name: "separator_margin_ratio",
                value: self.separator_margin_ratio,
            });
        }
        if self.same_line_height_ratio < 1.0 {
            return Err(SomError::InvalidParam {
                name: "same_line_height_ratio",
                value: self.same_line_height_ratio,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SomParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_negative_and_nan() {
        let params = SomParams {
            table_tolerance: -1.0,
            ..Default::default()
        };
        assert_eq!(
            params.validate(),
            Err(SomError::InvalidParam {
                name: "table_tolerance",
                value: -1.0
            })
        );

        let params = SomParams {
            consecutive_inflate: f64::NAN,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_margin_that_covers_whole_extent() {
        let params = SomParams {
            separator_margin_ratio: 0.5,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
