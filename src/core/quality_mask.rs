use crate::types::{fields, DdmError, DdmResult, MaskedArray};
use ndarray::{Array2, Ix2};
use serde::{Deserialize, Serialize};

/// Quality gate thresholds applied per specular point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// Minimum co-polarized receive antenna gain (inclusive)
    pub min_copol_gain: f64,
    /// Minimum cross-polarized receive antenna gain (inclusive)
    pub min_xpol_gain: f64,
    /// DDM SNR must be strictly above this value
    pub min_snr: f64,
    /// Slant distance window in meters (both bounds inclusive)
    pub min_distance: f64,
    pub max_distance: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_copol_gain: 5.0,
            min_xpol_gain: 5.0,
            min_snr: 0.0,
            min_distance: 2000.0,
            max_distance: 10000.0,
        }
    }
}

/// Per-point fields the quality gate reads, all shaped [track, xtrack]
#[derive(Debug, Clone, Copy)]
pub struct QualityInputs<'a> {
    pub copol_gain: &'a MaskedArray<Ix2>,
    pub xpol_gain: &'a MaskedArray<Ix2>,
    pub snr: &'a MaskedArray<Ix2>,
    pub distance: &'a MaskedArray<Ix2>,
    pub lat: &'a MaskedArray<Ix2>,
    pub lon: &'a MaskedArray<Ix2>,
}

/// Rejection counts from one mask build.
///
/// A cell failing several criteria is counted once under each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaskStats {
    pub total_cells: usize,
    pub kept_cells: usize,
    pub missing_value: usize,
    pub low_copol_gain: usize,
    pub low_xpol_gain: usize,
    pub low_snr: usize,
    pub distance_out_of_range: usize,
}

/// Builder for the per-cell keep mask
#[derive(Debug, Clone)]
pub struct QualityMask {
    thresholds: QualityThresholds,
}

impl QualityMask {
    pub fn new(thresholds: QualityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn standard() -> Self {
        Self::new(QualityThresholds::default())
    }

    /// Build the keep mask (`true` = cell passes every gate)
    pub fn build(&self, inputs: &QualityInputs<'_>) -> DdmResult<(Array2<bool>, MaskStats)> {
        let dim = inputs.copol_gain.data.dim();
        let named = [
            (fields::SP_RX_GAIN_XPOL, inputs.xpol_gain),
            (fields::DDM_SNR, inputs.snr),
            ("distance", inputs.distance),
            (fields::SP_LAT, inputs.lat),
            (fields::SP_LON, inputs.lon),
        ];
        for (name, field) in named {
            if field.data.dim() != dim {
                return Err(DdmError::Shape {
                    field: name.to_string(),
                    expected: format!("[{}, {}]", dim.0, dim.1),
                    found: format!("{:?}", field.shape()),
                });
            }
        }

        let th = &self.thresholds;
        let mut stats = MaskStats {
            total_cells: dim.0 * dim.1,
            ..Default::default()
        };

        let mask = Array2::from_shape_fn(dim, |idx| {
            let copol = inputs.copol_gain.get(idx);
            let xpol = inputs.xpol_gain.get(idx);
            let snr = inputs.snr.get(idx);
            let distance = inputs.distance.get(idx);
            let has_position = inputs.lat.get(idx).is_some() && inputs.lon.get(idx).is_some();

            let (copol, xpol, snr, distance) = match (copol, xpol, snr, distance) {
                (Some(c), Some(x), Some(s), Some(d)) if has_position => (c, x, s, d),
                _ => {
                    stats.missing_value += 1;
                    return false;
                }
            };

            let mut keep = true;
            if copol < th.min_copol_gain {
                stats.low_copol_gain += 1;
                keep = false;
            }
            if xpol < th.min_xpol_gain {
                stats.low_xpol_gain += 1;
                keep = false;
            }
            if snr <= th.min_snr {
                stats.low_snr += 1;
                keep = false;
            }
            // Explicit finiteness: grazing geometry can divide by ~zero
            if !distance.is_finite() || distance < th.min_distance || distance > th.max_distance {
                stats.distance_out_of_range += 1;
                keep = false;
            }
            keep
        });

        stats.kept_cells = mask.iter().filter(|&&k| k).count();
        log::debug!(
            "Quality mask kept {}/{} cells (missing {}, copol {}, xpol {}, snr {}, distance {})",
            stats.kept_cells,
            stats.total_cells,
            stats.missing_value,
            stats.low_copol_gain,
            stats.low_xpol_gain,
            stats.low_snr,
            stats.distance_out_of_range
        );

        Ok((mask, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    struct Grid {
        copol: MaskedArray<Ix2>,
        xpol: MaskedArray<Ix2>,
        snr: MaskedArray<Ix2>,
        distance: MaskedArray<Ix2>,
        lat: MaskedArray<Ix2>,
        lon: MaskedArray<Ix2>,
    }

    impl Grid {
        fn passing(dim: (usize, usize)) -> Self {
            Self {
                copol: MaskedArray::new(Array2::from_elem(dim, 8.0)),
                xpol: MaskedArray::new(Array2::from_elem(dim, 8.0)),
                snr: MaskedArray::new(Array2::from_elem(dim, 3.0)),
                distance: MaskedArray::new(Array2::from_elem(dim, 5000.0)),
                lat: MaskedArray::new(Array2::from_elem(dim, 45.0)),
                lon: MaskedArray::new(Array2::from_elem(dim, 9.0)),
            }
        }

        fn inputs(&self) -> QualityInputs<'_> {
            QualityInputs {
                copol_gain: &self.copol,
                xpol_gain: &self.xpol,
                snr: &self.snr,
                distance: &self.distance,
                lat: &self.lat,
                lon: &self.lon,
            }
        }
    }

    #[test]
    fn test_all_passing_cells_kept() {
        let grid = Grid::passing((3, 4));
        let (mask, stats) = QualityMask::standard().build(&grid.inputs()).unwrap();
        assert!(mask.iter().all(|&k| k));
        assert_eq!(stats.kept_cells, 12);
        assert_eq!(stats.total_cells, 12);
    }

    #[test]
    fn test_gain_threshold_is_inclusive() {
        let mut grid = Grid::passing((1, 3));
        grid.copol.data = arr2(&[[5.0, 4.999, 5.001]]).into_shared();
        let (mask, stats) = QualityMask::standard().build(&grid.inputs()).unwrap();
        assert_eq!(mask, arr2(&[[true, false, true]]));
        assert_eq!(stats.low_copol_gain, 1);
    }

    #[test]
    fn test_snr_threshold_is_strict() {
        let mut grid = Grid::passing((1, 3));
        grid.snr.data = arr2(&[[0.0, -1.0, 0.01]]).into_shared();
        let (mask, stats) = QualityMask::standard().build(&grid.inputs()).unwrap();
        assert_eq!(mask, arr2(&[[false, false, true]]));
        assert_eq!(stats.low_snr, 2);
    }

    #[test]
    fn test_distance_bounds_are_inclusive() {
        let mut grid = Grid::passing((1, 4));
        grid.distance.data = arr2(&[[2000.0, 10000.0, 1999.999, 10000.001]]).into_shared();
        let (mask, _) = QualityMask::standard().build(&grid.inputs()).unwrap();
        assert_eq!(mask, arr2(&[[true, true, false, false]]));
    }

    #[test]
    fn test_infinite_distance_rejected() {
        let mut grid = Grid::passing((1, 2));
        grid.distance.data = arr2(&[[f64::INFINITY, f64::NEG_INFINITY]]).into_shared();
        let thresholds = QualityThresholds {
            min_distance: f64::NEG_INFINITY,
            max_distance: f64::INFINITY,
            ..Default::default()
        };
        let (mask, stats) = QualityMask::new(thresholds).build(&grid.inputs()).unwrap();
        assert_eq!(mask, arr2(&[[false, false]]));
        assert_eq!(stats.distance_out_of_range, 2);
    }

    #[test]
    fn test_nan_and_masked_values_both_rejected() {
        let mut grid = Grid::passing((1, 3));
        grid.lat.data = arr2(&[[f64::NAN, 45.0, 45.0]]).into_shared();
        grid.lon = MaskedArray::with_mask(arr2(&[[9.0, 9.0, 9.0]]), arr2(&[[false, true, false]])).unwrap();
        let (mask, stats) = QualityMask::standard().build(&grid.inputs()).unwrap();
        assert_eq!(mask, arr2(&[[false, false, true]]));
        assert_eq!(stats.missing_value, 2);
    }

    #[test]
    fn test_tighter_gain_never_keeps_more() {
        let mut grid = Grid::passing((2, 3));
        grid.copol.data = arr2(&[[4.0, 5.0, 5.5], [6.0, 7.0, 5.0]]).into_shared();
        let (_, loose) = QualityMask::standard().build(&grid.inputs()).unwrap();
        let tight = QualityThresholds {
            min_copol_gain: 6.0,
            ..Default::default()
        };
        let (_, strict) = QualityMask::new(tight).build(&grid.inputs()).unwrap();
        assert!(strict.kept_cells <= loose.kept_cells);
        assert_eq!(loose.kept_cells, 5);
        assert_eq!(strict.kept_cells, 2);
    }

    #[test]
    fn test_shape_mismatch_names_field() {
        let mut grid = Grid::passing((2, 2));
        grid.snr = MaskedArray::new(Array2::from_elem((2, 3), 1.0));
        match QualityMask::standard().build(&grid.inputs()) {
            Err(DdmError::Shape { field, .. }) => assert_eq!(field, "ddm_snr"),
            other => panic!("Expected shape error, got {:?}", other),
        }
    }
}
