use ndarray::{ArcArray, Array, Array2, ArrayD, Dimension, IxDyn};

use crate::core::extract::ExtractionStats;

/// Field keys of the fixed reflectometry schema
pub mod fields {
    /// Raw DDM power counts, [track, xtrack, delay, doppler]
    pub const RAW_COUNTS: &str = "raw_counts";
    /// Aircraft altitude, [track]
    pub const AC_ALT: &str = "ac_alt";
    /// Specular point altitude, [track, xtrack]
    pub const SP_ALT: &str = "sp_alt";
    /// Specular point incidence angle in degrees, [track, xtrack]
    pub const SP_INC_ANGLE: &str = "sp_inc_angle";
    pub const SP_RX_GAIN_COPOL: &str = "sp_rx_gain_copol";
    pub const SP_RX_GAIN_XPOL: &str = "sp_rx_gain_xpol";
    pub const DDM_SNR: &str = "ddm_snr";
    pub const SP_LAT: &str = "sp_lat";
    pub const SP_LON: &str = "sp_lon";
    /// Integer surface classification code, may carry fill values
    pub const SP_SURFACE_TYPE: &str = "sp_surface_type";
}

/// Numeric field with a masked-value convention.
///
/// Missing data can arrive two ways: an explicit mask (fill values declared
/// by the file) or NaN in the data itself. The two are independent, so
/// [`MaskedArray::is_missing`] checks both.
///
/// Storage is reference counted: cloning a field out of a source shares the
/// buffer instead of copying it.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedArray<D: Dimension> {
    pub data: ArcArray<f64, D>,
    /// `true` marks a missing element
    pub mask: Option<ArcArray<bool, D>>,
}

impl<D: Dimension> MaskedArray<D> {
    /// Wrap plain data with no mask
    pub fn new(data: Array<f64, D>) -> Self {
        Self {
            data: data.into_shared(),
            mask: None,
        }
    }

    /// Wrap data together with a mask of the same shape
    pub fn with_mask(data: Array<f64, D>, mask: Array<bool, D>) -> DdmResult<Self> {
        if data.shape() != mask.shape() {
            return Err(DdmError::Shape {
                field: "mask".to_string(),
                expected: format!("{:?}", data.shape()),
                found: format!("{:?}", mask.shape()),
            });
        }
        Ok(Self {
            data: data.into_shared(),
            mask: Some(mask.into_shared()),
        })
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Element is flagged by the mask
    pub fn is_masked(&self, index: D::Pattern) -> bool
    where
        D::Pattern: ndarray::NdIndex<D>,
    {
        self.mask.as_ref().map_or(false, |m| m[index])
    }

    /// Element is masked or NaN
    pub fn is_missing(&self, index: D::Pattern) -> bool
    where
        D::Pattern: ndarray::NdIndex<D> + Clone,
    {
        self.is_masked(index.clone()) || self.data[index].is_nan()
    }

    /// Value at `index`, or `None` when missing under either convention
    pub fn get(&self, index: D::Pattern) -> Option<f64>
    where
        D::Pattern: ndarray::NdIndex<D> + Clone,
    {
        if self.is_missing(index.clone()) {
            None
        } else {
            Some(self.data[index])
        }
    }

    /// Row-major walk over values with missing elements reported as `None`
    pub fn iter_valid(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        let mask_iter: Box<dyn Iterator<Item = bool> + '_> = match &self.mask {
            Some(m) => Box::new(m.iter().copied()),
            None => Box::new(std::iter::repeat(false)),
        };
        self.data
            .iter()
            .zip(mask_iter)
            .map(|(&v, masked)| if masked || v.is_nan() { None } else { Some(v) })
    }
}

impl MaskedArray<IxDyn> {
    /// Build a dynamic-rank field from a shape and row-major values
    pub fn from_shape_vec(shape: &[usize], values: Vec<f64>) -> DdmResult<Self> {
        let data = ArrayD::from_shape_vec(IxDyn(shape), values)
            .map_err(|e| DdmError::Processing(format!("Failed to shape field data: {}", e)))?;
        Ok(Self::new(data))
    }

    /// Convert to a fixed rank, reporting `field` on mismatch
    pub fn into_rank<D2: Dimension>(self, field: &str) -> DdmResult<MaskedArray<D2>> {
        let found = format!("{:?}", self.data.shape());
        let shape_err = || DdmError::Shape {
            field: field.to_string(),
            expected: format!("rank {}", D2::NDIM.unwrap_or(0)),
            found: found.clone(),
        };
        let data = self
            .data
            .into_dimensionality::<D2>()
            .map_err(|_| shape_err())?;
        let mask = match self.mask {
            Some(m) => Some(m.into_dimensionality::<D2>().map_err(|_| shape_err())?),
            None => None,
        };
        Ok(MaskedArray { data, mask })
    }
}

/// Aligned training samples extracted from one data source
#[derive(Debug, Clone)]
pub struct SampleSet {
    /// One raveled DDM per row, row length = delay bins × Doppler bins
    pub fit_data: Array2<f32>,
    /// Binary surface label per sample
    pub label_data: Vec<u8>,
    pub specular_point_lats: Vec<f64>,
    pub specular_point_lons: Vec<f64>,
    /// Row-major grid index (track × xtrack_extent + xtrack) of each sample
    pub sample_indices: Vec<usize>,
    pub stats: ExtractionStats,
}

impl SampleSet {
    pub fn len(&self) -> usize {
        self.fit_data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split into `(fit_data, label_data, lats, lons)`
    pub fn into_parts(self) -> (Array2<f32>, Vec<u8>, Vec<f64>, Vec<f64>) {
        (
            self.fit_data,
            self.label_data,
            self.specular_point_lats,
            self.specular_point_lons,
        )
    }
}

/// Error types for DDM sample extraction
#[derive(Debug, thiserror::Error)]
pub enum DdmError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field '{field}' has incompatible shape: expected {expected}, found {found}")]
    Shape {
        field: String,
        expected: String,
        found: String,
    },

    #[error(
        "Shape mismatch: fit_data {features}, label_data {labels}, lats {lats}, lons {lons}"
    )]
    LengthMismatch {
        features: usize,
        labels: usize,
        lats: usize,
        lons: usize,
    },

    #[error("Processing error: {0}")]
    Processing(String),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for DDM extraction
pub type DdmResult<T> = Result<T, DdmError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Ix1, Ix2};

    #[test]
    fn test_mask_and_nan_are_independent() {
        let field = MaskedArray::with_mask(
            arr1(&[1.0, f64::NAN, 3.0]),
            arr1(&[false, false, true]),
        )
        .unwrap();

        assert_eq!(field.get(0), Some(1.0));
        assert!(field.is_missing(1));
        assert!(!field.is_masked(1));
        assert!(field.is_missing(2));
        assert!(field.is_masked(2));
        assert_eq!(
            field.iter_valid().collect::<Vec<_>>(),
            vec![Some(1.0), None, None]
        );
    }

    #[test]
    fn test_clone_shares_buffer() {
        let field = MaskedArray::new(arr2(&[[1.0, 2.0], [3.0, 4.0]]));
        let copy = field.clone();
        assert_eq!(copy.data.as_ptr(), field.data.as_ptr());
    }

    #[test]
    fn test_mask_shape_must_match() {
        let result = MaskedArray::with_mask(arr1(&[1.0, 2.0]), arr1(&[false]));
        assert!(matches!(result, Err(DdmError::Shape { .. })));
    }

    #[test]
    fn test_into_rank_checks_dimensionality() {
        let field = MaskedArray::from_shape_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();

        let grid = field.clone().into_rank::<Ix2>("sp_lat").unwrap();
        assert_eq!(grid.data, arr2(&[[1.0, 2.0], [3.0, 4.0]]));

        match field.into_rank::<Ix1>("sp_lat") {
            Err(DdmError::Shape { field, expected, .. }) => {
                assert_eq!(field, "sp_lat");
                assert_eq!(expected, "rank 1");
            }
            other => panic!("Expected shape error, got {:?}", other),
        }
    }
}
