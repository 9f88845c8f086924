//! Data sources exposing reflectometry fields by name

pub mod source;
#[cfg(feature = "gdal")]
pub mod netcdf;

pub use source::{DdmSource, MemorySource};
#[cfg(feature = "gdal")]
pub use netcdf::NetcdfSource;
