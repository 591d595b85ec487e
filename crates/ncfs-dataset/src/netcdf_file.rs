//! netCDF file access.
//!
//! The netCDF C library is not thread-safe, so the open handle sits behind a
//! mutex and every call takes the lock for its whole duration. The file is
//! closed when the dataset is dropped.

use std::path::{Path, PathBuf};

use ncfs_core::{ArrayData, AttrValue, Dataset, DatasetError, Values};
use netcdf::AttributeValue;
use netcdf::types::{FloatType, IntType, NcVariableType};
use parking_lot::Mutex;
use tracing::{debug, info};

/// A netCDF file opened read-only.
pub struct NetcdfDataset {
    path: PathBuf,
    file: Mutex<netcdf::File>,
}

impl NetcdfDataset {
    /// Open a netCDF file.
    pub fn open(path: &Path) -> Result<Self, DatasetError> {
        let file = netcdf::open(path).map_err(|e| DatasetError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        info!("Opened netCDF dataset {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    fn with_variable<T>(
        &self,
        name: &str,
        f: impl FnOnce(&netcdf::Variable<'_>) -> Result<T, DatasetError>,
    ) -> Result<T, DatasetError> {
        let file = self.file.lock();
        let var = file
            .variable(name)
            .ok_or_else(|| DatasetError::VariableNotFound(name.to_string()))?;
        f(&var)
    }
}

impl Drop for NetcdfDataset {
    fn drop(&mut self) {
        debug!("Closing netCDF dataset {}", self.path.display());
    }
}

fn read_error(e: &netcdf::Error) -> DatasetError {
    DatasetError::Read(e.to_string())
}

impl Dataset for NetcdfDataset {
    fn source(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn variable_names(&self) -> Vec<String> {
        self.file.lock().variables().map(|v| v.name()).collect()
    }

    fn has_variable(&self, name: &str) -> bool {
        self.file.lock().variable(name).is_some()
    }

    fn shape(&self, variable: &str) -> Result<Vec<usize>, DatasetError> {
        self.with_variable(variable, |var| {
            Ok(var.dimensions().iter().map(netcdf::Dimension::len).collect())
        })
    }

    fn attribute_names(&self, variable: &str) -> Result<Vec<String>, DatasetError> {
        self.with_variable(variable, |var| {
            Ok(var.attributes().map(|a| a.name().to_string()).collect())
        })
    }

    fn attribute(&self, variable: &str, name: &str) -> Result<AttrValue, DatasetError> {
        self.with_variable(variable, |var| {
            let attr = var
                .attribute(name)
                .ok_or_else(|| DatasetError::AttributeNotFound {
                    variable: variable.to_string(),
                    attribute: name.to_string(),
                })?;
            let value = attr.value().map_err(|e| read_error(&e))?;
            convert_attribute(value).ok_or_else(|| DatasetError::UnsupportedType {
                name: format!("{variable}/{name}"),
                kind: "attribute".to_string(),
            })
        })
    }

    fn values(&self, variable: &str) -> Result<ArrayData, DatasetError> {
        self.with_variable(variable, |var| {
            let shape: Vec<usize> = var.dimensions().iter().map(netcdf::Dimension::len).collect();
            let values = match var.vartype() {
                NcVariableType::Int(IntType::I8) => Values::I8(read(var)?),
                NcVariableType::Int(IntType::U8) => Values::U8(read(var)?),
                NcVariableType::Int(IntType::I16) => Values::I16(read(var)?),
                NcVariableType::Int(IntType::U16) => Values::U16(read(var)?),
                NcVariableType::Int(IntType::I32) => Values::I32(read(var)?),
                NcVariableType::Int(IntType::U32) => Values::U32(read(var)?),
                NcVariableType::Int(IntType::I64) => Values::I64(read(var)?),
                NcVariableType::Int(IntType::U64) => Values::U64(read(var)?),
                NcVariableType::Float(FloatType::F32) => Values::F32(read(var)?),
                NcVariableType::Float(FloatType::F64) => Values::F64(read(var)?),
                other => {
                    return Err(DatasetError::UnsupportedType {
                        name: variable.to_string(),
                        kind: format!("{other:?}"),
                    });
                }
            };
            ArrayData::new(shape, values)
        })
    }
}

fn read<T>(var: &netcdf::Variable<'_>) -> Result<Vec<T>, DatasetError>
where
    T: netcdf::NcTypeDescriptor + Copy,
{
    var.get_values::<T, _>(..).map_err(|e| read_error(&e))
}

fn convert_attribute(value: AttributeValue) -> Option<AttrValue> {
    let numeric = |values: Values| Some(AttrValue::Numeric(values));
    match value {
        AttributeValue::Str(s) => Some(AttrValue::Text(s)),
        AttributeValue::Strs(v) => Some(AttrValue::Texts(v)),
        AttributeValue::Schar(x) => numeric(Values::I8(vec![x])),
        AttributeValue::Schars(v) => numeric(Values::I8(v)),
        AttributeValue::Uchar(x) => numeric(Values::U8(vec![x])),
        AttributeValue::Uchars(v) => numeric(Values::U8(v)),
        AttributeValue::Short(x) => numeric(Values::I16(vec![x])),
        AttributeValue::Shorts(v) => numeric(Values::I16(v)),
        AttributeValue::Ushort(x) => numeric(Values::U16(vec![x])),
        AttributeValue::Ushorts(v) => numeric(Values::U16(v)),
        AttributeValue::Int(x) => numeric(Values::I32(vec![x])),
        AttributeValue::Ints(v) => numeric(Values::I32(v)),
        AttributeValue::Uint(x) => numeric(Values::U32(vec![x])),
        AttributeValue::Uints(v) => numeric(Values::U32(v)),
        AttributeValue::Longlong(x) => numeric(Values::I64(vec![x])),
        AttributeValue::Longlongs(v) => numeric(Values::I64(v)),
        AttributeValue::Ulonglong(x) => numeric(Values::U64(vec![x])),
        AttributeValue::Ulonglongs(v) => numeric(Values::U64(v)),
        AttributeValue::Float(x) => numeric(Values::F32(vec![x])),
        AttributeValue::Floats(v) => numeric(Values::F32(v)),
        AttributeValue::Double(x) => numeric(Values::F64(vec![x])),
        AttributeValue::Doubles(v) => numeric(Values::F64(v)),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}
