use crate::types::{DdmError, DdmResult, MaskedArray};
use ndarray::IxDyn;
use std::collections::HashMap;

/// Named-field access to a reflectometry data file.
///
/// Implementations hand out whole variables; shape checking against the
/// extraction schema happens in the extractor.
pub trait DdmSource {
    /// Read the full variable `name`, failing with [`DdmError::MissingField`]
    /// when the source does not carry it
    fn field(&self, name: &str) -> DdmResult<MaskedArray<IxDyn>>;
}

/// Source backed by arrays already resident in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    fields: HashMap<String, MaskedArray<IxDyn>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_field(mut self, name: &str, array: MaskedArray<IxDyn>) -> Self {
        self.insert(name, array);
        self
    }

    /// Insert or replace a field, returning the previous value
    pub fn insert(&mut self, name: &str, array: MaskedArray<IxDyn>) -> Option<MaskedArray<IxDyn>> {
        log::debug!("Registering field '{}' with shape {:?}", name, array.shape());
        self.fields.insert(name.to_string(), array)
    }

    pub fn remove(&mut self, name: &str) -> Option<MaskedArray<IxDyn>> {
        self.fields.remove(name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl DdmSource for MemorySource {
    fn field(&self, name: &str) -> DdmResult<MaskedArray<IxDyn>> {
        self.fields
            .get(name)
            .cloned()
            .ok_or_else(|| DdmError::MissingField(name.to_string()))
    }
}
