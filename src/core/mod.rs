//! Core DDM filtering pipeline

pub mod geometry;
pub mod quality_mask;
pub mod labels;
pub mod extract;

// Re-export main types
pub use geometry::slant_distance;
pub use quality_mask::{QualityMask, QualityThresholds, QualityInputs, MaskStats};
pub use labels::SurfaceLabeler;
pub use extract::{SampleExtractor, ExtractorConfig, ExtractionStats, extract_samples};
