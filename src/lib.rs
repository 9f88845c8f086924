//! ddmprep: quality-filtered DDM training samples from GNSS reflectometry data
//!
//! Reads raw delay-Doppler map counts and per-specular-point geometry, keeps
//! only points that pass the antenna gain, SNR and slant distance gates,
//! drops incomplete DDMs, and returns the surviving maps alongside binary
//! surface labels and specular point coordinates.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use crate::types::{fields, DdmError, DdmResult, MaskedArray, SampleSet};

pub use crate::io::{DdmSource, MemorySource};
#[cfg(feature = "gdal")]
pub use crate::io::NetcdfSource;

pub use crate::core::{
    extract_samples, ExtractionStats, ExtractorConfig, QualityThresholds, SampleExtractor,
    SurfaceLabeler,
};

#[cfg(feature = "python")]
mod python {
    use crate::{NetcdfSource, SampleExtractor};
    use numpy::{IntoPyArray, PyArray1, PyArray2};
    use pyo3::prelude::*;

    /// Python module definition
    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(py_extract_samples, m)?)?;
        Ok(())
    }

    /// Extract `(fit_data, label_data, lats, lons)` from a NetCDF file
    #[pyfunction]
    #[pyo3(name = "extract_samples")]
    fn py_extract_samples(
        py: Python<'_>,
        path: String,
    ) -> PyResult<(&PyArray2<f32>, Vec<u8>, &PyArray1<f64>, &PyArray1<f64>)> {
        let source = NetcdfSource::open(&path)
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("{}", e)))?;

        let samples = SampleExtractor::standard()
            .extract(&source)
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("{}", e)))?;

        let (fit_data, label_data, lats, lons) = samples.into_parts();
        Ok((
            fit_data.into_pyarray(py),
            label_data,
            lats.into_pyarray(py),
            lons.into_pyarray(py),
        ))
    }
}
