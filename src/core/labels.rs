use crate::types::MaskedArray;
use ndarray::Dimension;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Maps surface classification codes to a binary land/not-land label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceLabeler {
    /// Codes labelled 1
    pub land_codes: RangeInclusive<i64>,
}

impl Default for SurfaceLabeler {
    fn default() -> Self {
        Self { land_codes: 1..=7 }
    }
}

impl SurfaceLabeler {
    pub fn new(land_codes: RangeInclusive<i64>) -> Self {
        Self { land_codes }
    }

    /// Label a single code; missing codes count as code 0
    pub fn label(&self, code: Option<f64>) -> u8 {
        let code = code.unwrap_or(0.0);
        if code.fract() != 0.0 || !code.is_finite() {
            return 0;
        }
        u8::from(self.land_codes.contains(&(code as i64)))
    }

    /// Row-major labels for every element of the surface-type field
    pub fn flatten_labels<D: Dimension>(&self, surface_type: &MaskedArray<D>) -> Vec<u8> {
        surface_type.iter_valid().map(|code| self.label(code)).collect()
    }
}
