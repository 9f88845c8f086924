use crate::io::source::DdmSource;
use crate::types::{DdmError, DdmResult, MaskedArray};
use gdal::cpl::CslStringList;
use gdal::{Dataset, DatasetOptions, GdalOpenFlags};
use ndarray::{ArrayD, IxDyn};
use std::path::Path;

/// NetCDF reflectometry file opened through GDAL's multidimensional API
pub struct NetcdfSource {
    dataset: Dataset,
}

impl NetcdfSource {
    /// Open a NetCDF (or any multidimensional GDAL) file
    pub fn open<P: AsRef<Path>>(path: P) -> DdmResult<Self> {
        log::info!("Opening reflectometry file: {}", path.as_ref().display());

        let options = DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_MULTIDIM_RASTER,
            ..Default::default()
        };
        let dataset = Dataset::open_ex(path.as_ref(), options)?;

        Ok(Self { dataset })
    }
}

impl DdmSource for NetcdfSource {
    fn field(&self, name: &str) -> DdmResult<MaskedArray<IxDyn>> {
        let root = self.dataset.root_group()?;
        let variable = root
            .open_md_array(name, CslStringList::new())
            .map_err(|_| DdmError::MissingField(name.to_string()))?;

        let shape: Vec<usize> = variable
            .dimensions()?
            .iter()
            .map(|dim| dim.size())
            .collect();
        log::debug!("Reading variable '{}' with shape {:?}", name, shape);

        let start = vec![0u64; shape.len()];
        let values = variable.read_as::<f64>(start, shape.clone())?;
        let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
            .map_err(|e| DdmError::Processing(format!("Failed to reshape '{}': {}", name, e)))?;

        match variable.no_data_value_as_double() {
            Some(fill) if !fill.is_nan() => {
                let mask = data.mapv(|v| v == fill);
                let masked = mask.iter().filter(|&&m| m).count();
                if masked > 0 {
                    log::debug!("Variable '{}': {} elements equal fill value {}", name, masked, fill);
                }
                MaskedArray::with_mask(data, mask)
            }
            _ => Ok(MaskedArray::new(data)),
        }
    }
}
