use crate::core::geometry::slant_distance;
use crate::core::labels::SurfaceLabeler;
use crate::core::quality_mask::{MaskStats, QualityInputs, QualityMask, QualityThresholds};
use crate::io::DdmSource;
use crate::types::{fields, DdmError, DdmResult, MaskedArray, SampleSet};
use ndarray::{s, Array2, Array4, ArrayView2, Axis, Ix1, Ix2, Ix4, Zip};
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Sample extraction configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    pub thresholds: QualityThresholds,
    pub labeler: SurfaceLabeler,
}

/// Sample counts at each pipeline stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Track × cross-track cells in the source grid
    pub grid_cells: usize,
    /// Cells that passed the quality mask
    pub quality_kept: usize,
    /// Quality-kept cells dropped for NaN bins or a non-positive DDM sum
    pub incomplete_rejected: usize,
    pub retained_samples: usize,
    pub positive_labels: usize,
    pub mask: MaskStats,
}

/// Turns a reflectometry data source into aligned training samples
pub struct SampleExtractor {
    config: ExtractorConfig,
}

impl SampleExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extractor with the standard quality gates and land codes 1..=7
    pub fn standard() -> Self {
        Self::new(ExtractorConfig::default())
    }

    /// Run the full filtering pipeline over `source`.
    ///
    /// Sample `i` of every output refers to the same specular point; samples
    /// appear in row-major grid order (track outer, cross-track inner).
    pub fn extract(&self, source: &dyn DdmSource) -> DdmResult<SampleSet> {
        let raw_counts = source
            .field(fields::RAW_COUNTS)?
            .into_rank::<Ix4>(fields::RAW_COUNTS)?;
        let (tracks, xtracks, delay_bins, doppler_bins) = raw_counts.data.dim();
        log::info!(
            "Extracting DDM samples: {} tracks x {} cross-track, DDM {}x{}",
            tracks,
            xtracks,
            delay_bins,
            doppler_bins
        );

        let ac_alt = source
            .field(fields::AC_ALT)?
            .into_rank::<Ix1>(fields::AC_ALT)?;
        let grid = |name: &str| read_grid(source, name, (tracks, xtracks));
        let sp_alt = grid(fields::SP_ALT)?;
        let inc_angle = grid(fields::SP_INC_ANGLE)?;
        let copol = grid(fields::SP_RX_GAIN_COPOL)?;
        let xpol = grid(fields::SP_RX_GAIN_XPOL)?;
        let snr = grid(fields::DDM_SNR)?;
        let lat = grid(fields::SP_LAT)?;
        let lon = grid(fields::SP_LON)?;
        // Checked against the grid once labels are derived
        let surface_type = source.field(fields::SP_SURFACE_TYPE)?;

        let distance = slant_distance(&ac_alt, &sp_alt, &inc_angle)?;
        let inputs = QualityInputs {
            copol_gain: &copol,
            xpol_gain: &xpol,
            snr: &snr,
            distance: &distance,
            lat: &lat,
            lon: &lon,
        };
        let (keep, mask_stats) = QualityMask::new(self.config.thresholds.clone()).build(&inputs)?;
        log::info!(
            "Quality mask kept {} of {} cells",
            mask_stats.kept_cells,
            mask_stats.total_cells
        );

        // The 4D volume is moved into the sample-major view; no copy survives
        let flat = filter_counts(&raw_counts, &keep)
            .into_shape((tracks * xtracks, delay_bins, doppler_bins))
            .map_err(|e| DdmError::Processing(format!("Failed to flatten counts: {}", e)))?;
        drop(raw_counts);

        let retained: Vec<usize> = flat
            .outer_iter()
            .enumerate()
            .filter(|(_, ddm)| is_complete(ddm.view()))
            .map(|(idx, _)| idx)
            .collect();
        log::debug!("{} samples complete after NaN/zero-sum filter", retained.len());

        let mut fit_data = Array2::<f32>::zeros((retained.len(), delay_bins * doppler_bins));
        for (mut row, &idx) in fit_data.outer_iter_mut().zip(&retained) {
            row.iter_mut()
                .zip(flat.index_axis(Axis(0), idx).iter())
                .for_each(|(dst, &src)| *dst = src);
        }
        drop(flat);

        let specular_point_lats = gather(&lat, &retained);
        let specular_point_lons = gather(&lon, &retained);

        let all_labels = self.config.labeler.flatten_labels(&surface_type);
        if all_labels.len() != tracks * xtracks {
            // One label per grid cell is required before any subsetting
            check_lengths(
                fit_data.nrows(),
                all_labels.len(),
                specular_point_lats.len(),
                specular_point_lons.len(),
            )?;
        }
        if surface_type.shape() != &[tracks, xtracks][..] {
            return Err(DdmError::Shape {
                field: fields::SP_SURFACE_TYPE.to_string(),
                expected: format!("[{}, {}]", tracks, xtracks),
                found: format!("{:?}", surface_type.shape()),
            });
        }
        let label_data: Vec<u8> = retained.iter().map(|&idx| all_labels[idx]).collect();

        check_lengths(
            fit_data.nrows(),
            label_data.len(),
            specular_point_lats.len(),
            specular_point_lons.len(),
        )?;

        let stats = ExtractionStats {
            grid_cells: tracks * xtracks,
            quality_kept: mask_stats.kept_cells,
            incomplete_rejected: mask_stats.kept_cells.saturating_sub(retained.len()),
            retained_samples: retained.len(),
            positive_labels: label_data.iter().filter(|&&l| l == 1).count(),
            mask: mask_stats,
        };
        log::info!(
            "Extracted {} samples ({} labelled land)",
            stats.retained_samples,
            stats.positive_labels
        );

        Ok(SampleSet {
            fit_data,
            label_data,
            specular_point_lats,
            specular_point_lons,
            sample_indices: retained,
            stats,
        })
    }
}

/// Extract with the standard configuration
pub fn extract_samples(source: &dyn DdmSource) -> DdmResult<SampleSet> {
    SampleExtractor::standard().extract(source)
}

/// All four outputs must describe the same samples
fn check_lengths(features: usize, labels: usize, lats: usize, lons: usize) -> DdmResult<()> {
    if features == labels && features == lats && features == lons {
        return Ok(());
    }
    log::error!(
        "Output length mismatch: fit_data {}, label_data {}, lats {}, lons {}",
        features,
        labels,
        lats,
        lons
    );
    Err(DdmError::LengthMismatch {
        features,
        labels,
        lats,
        lons,
    })
}

/// Read a [track, xtrack] field and check it against the grid extent
fn read_grid(
    source: &dyn DdmSource,
    name: &str,
    dim: (usize, usize),
) -> DdmResult<MaskedArray<Ix2>> {
    let field = source.field(name)?.into_rank::<Ix2>(name)?;
    if field.data.dim() != dim {
        return Err(DdmError::Shape {
            field: name.to_string(),
            expected: format!("[{}, {}]", dim.0, dim.1),
            found: format!("{:?}", field.shape()),
        });
    }
    Ok(field)
}

/// Copy whole DDMs of kept cells; every other cell becomes all-NaN.
///
/// Masked bins inside a kept DDM are written as NaN so the completeness
/// filter sees them.
fn filter_counts(raw: &MaskedArray<Ix4>, keep: &Array2<bool>) -> Array4<f32> {
    let mut filtered = Array4::<f32>::from_elem(raw.data.raw_dim(), f32::NAN);
    for ((t, x), _) in keep.indexed_iter().filter(|(_, &k)| k) {
        let mut dst = filtered.slice_mut(s![t, x, .., ..]);
        Zip::indexed(&mut dst)
            .and(raw.data.slice(s![t, x, .., ..]))
            .for_each(|(i, j), out, &value| {
                *out = if raw.is_masked((t, x, i, j)) {
                    f32::NAN
                } else {
                    value as f32
                };
            });
    }
    filtered
}

/// DDM has no NaN bin and a strictly positive total
fn is_complete<F: Float>(ddm: ArrayView2<'_, F>) -> bool {
    let mut sum = F::zero();
    for &value in ddm.iter() {
        if value.is_nan() {
            return false;
        }
        sum = sum + value;
    }
    sum > F::zero()
}

fn gather(field: &MaskedArray<Ix2>, indices: &[usize]) -> Vec<f64> {
    let flat: Vec<f64> = field.data.iter().copied().collect();
    indices.iter().map(|&idx| flat[idx]).collect()
}
