//! In-memory dataset.
//!
//! [`MemoryDataset`] keeps every variable in memory in insertion order. It is
//! built either programmatically through [`MemoryDatasetBuilder`] or from a
//! JSON description:
//!
//! ```json
//! {
//!   "variables": {
//!     "temp": {
//!       "type": "f64",
//!       "shape": [2],
//!       "data": [1.0, 2.0],
//!       "attributes": { "units": "K", "valid_range": [-50, 50] }
//!     }
//!   }
//! }
//! ```
//!
//! `type` defaults to `f64` and `shape` to `[len(data)]`. An empty `shape`
//! declares a scalar. `null` elements of float variables load as NaN.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use ncfs_core::{ArrayData, AttrValue, Dataset, DatasetError, Values};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
struct Variable {
    data: ArrayData,
    attributes: IndexMap<String, AttrValue>,
}

/// Dataset held entirely in memory.
///
/// # Example
///
/// ```rust
/// use ncfs_core::{ArrayData, Dataset, Values};
/// use ncfs_dataset::MemoryDataset;
///
/// let dataset = MemoryDataset::builder()
///     .variable("temp", ArrayData::vector(Values::F64(vec![1.0, 2.0])))
///     .attribute("temp", "units", "K")
///     .build()
///     .unwrap();
///
/// assert_eq!(dataset.variable_names(), vec!["temp"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    source: Option<PathBuf>,
    variables: IndexMap<String, Variable>,
}

impl MemoryDataset {
    /// Create an empty dataset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a dataset.
    #[must_use]
    pub fn builder() -> MemoryDatasetBuilder {
        MemoryDatasetBuilder::default()
    }

    /// Add or replace a variable. Replacing keeps the original position.
    pub fn insert_variable(&mut self, name: impl Into<String>, data: ArrayData) {
        let name = name.into();
        match self.variables.get_mut(&name) {
            Some(existing) => existing.data = data,
            None => {
                self.variables.insert(
                    name,
                    Variable {
                        data,
                        attributes: IndexMap::new(),
                    },
                );
            }
        }
    }

    /// Add or replace an attribute of an existing variable.
    pub fn insert_attribute(
        &mut self,
        variable: &str,
        name: impl Into<String>,
        value: impl Into<AttrValue>,
    ) -> Result<(), DatasetError> {
        let var = self
            .variables
            .get_mut(variable)
            .ok_or_else(|| DatasetError::VariableNotFound(variable.to_string()))?;
        var.attributes.insert(name.into(), value.into());
        Ok(())
    }

    /// Record the file this dataset was loaded from.
    #[must_use]
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Parse a JSON description.
    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        let description: Description =
            serde_json::from_str(json).map_err(|e| DatasetError::Read(e.to_string()))?;

        let mut dataset = Self::new();
        for (name, var) in description.variables {
            let values = parse_values(&name, &var.kind, &var.data)?;
            let shape = var.shape.unwrap_or_else(|| vec![values.len()]);
            let data = ArrayData::new(shape, values)?;
            dataset.insert_variable(name.clone(), data);

            for (attr_name, raw) in &var.attributes {
                let value = parse_attribute(&name, attr_name, raw)?;
                dataset.insert_attribute(&name, attr_name.clone(), value)?;
            }
        }
        Ok(dataset)
    }

    /// Load a JSON description from disk.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let open_error = |reason: String| DatasetError::Open {
            path: path.display().to_string(),
            reason,
        };
        let json = fs::read_to_string(path).map_err(|e| open_error(e.to_string()))?;
        let dataset = Self::from_json_str(&json).map_err(|e| open_error(e.to_string()))?;
        debug!(
            "Loaded {} variables from {}",
            dataset.variables.len(),
            path.display()
        );
        Ok(dataset.with_source(path))
    }

    fn get(&self, variable: &str) -> Result<&Variable, DatasetError> {
        self.variables
            .get(variable)
            .ok_or_else(|| DatasetError::VariableNotFound(variable.to_string()))
    }
}

impl Dataset for MemoryDataset {
    fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    fn shape(&self, variable: &str) -> Result<Vec<usize>, DatasetError> {
        Ok(self.get(variable)?.data.shape().to_vec())
    }

    fn attribute_names(&self, variable: &str) -> Result<Vec<String>, DatasetError> {
        Ok(self.get(variable)?.attributes.keys().cloned().collect())
    }

    fn attribute(&self, variable: &str, name: &str) -> Result<AttrValue, DatasetError> {
        self.get(variable)?
            .attributes
            .get(name)
            .cloned()
            .ok_or_else(|| DatasetError::AttributeNotFound {
                variable: variable.to_string(),
                attribute: name.to_string(),
            })
    }

    fn values(&self, variable: &str) -> Result<ArrayData, DatasetError> {
        Ok(self.get(variable)?.data.clone())
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`MemoryDataset`].
///
/// Errors (such as an attribute naming an unknown variable) are deferred to
/// [`build`](Self::build).
#[derive(Debug, Default)]
pub struct MemoryDatasetBuilder {
    dataset: MemoryDataset,
    error: Option<DatasetError>,
}

impl MemoryDatasetBuilder {
    /// Add a variable.
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, data: ArrayData) -> Self {
        self.dataset.insert_variable(name, data);
        self
    }

    /// Add an attribute to a previously added variable.
    #[must_use]
    pub fn attribute(
        mut self,
        variable: &str,
        name: impl Into<String>,
        value: impl Into<AttrValue>,
    ) -> Self {
        if self.error.is_none()
            && let Err(e) = self.dataset.insert_attribute(variable, name, value)
        {
            self.error = Some(e);
        }
        self
    }

    /// Set the backing file reported by [`Dataset::source`].
    #[must_use]
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset.source = Some(path.into());
        self
    }

    /// Finish building.
    pub fn build(self) -> Result<MemoryDataset, DatasetError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.dataset),
        }
    }
}

// ============================================================================
// JSON description
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Description {
    #[serde(default)]
    variables: IndexMap<String, VariableDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VariableDescription {
    #[serde(rename = "type", default = "default_kind")]
    kind: String,
    #[serde(default)]
    shape: Option<Vec<usize>>,
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    attributes: IndexMap<String, Value>,
}

fn default_kind() -> String {
    "f64".to_string()
}

fn collect<T>(
    name: &str,
    kind: &str,
    items: &[Value],
    convert: impl Fn(&Value) -> Option<T>,
) -> Result<Vec<T>, DatasetError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            convert(item).ok_or_else(|| {
                DatasetError::Read(format!("{name}[{i}] is not a valid {kind}: {item}"))
            })
        })
        .collect()
}

fn int<T: TryFrom<i64>>(item: &Value) -> Option<T> {
    item.as_i64().and_then(|x| T::try_from(x).ok())
}

fn float(item: &Value) -> Option<f64> {
    if item.is_null() {
        return Some(f64::NAN);
    }
    item.as_f64()
}

#[allow(clippy::cast_possible_truncation)]
fn parse_values(name: &str, kind: &str, items: &[Value]) -> Result<Values, DatasetError> {
    Ok(match kind {
        "i8" => Values::I8(collect(name, kind, items, int)?),
        "u8" => Values::U8(collect(name, kind, items, int)?),
        "i16" => Values::I16(collect(name, kind, items, int)?),
        "u16" => Values::U16(collect(name, kind, items, int)?),
        "i32" => Values::I32(collect(name, kind, items, int)?),
        "u32" => Values::U32(collect(name, kind, items, int)?),
        "i64" => Values::I64(collect(name, kind, items, int)?),
        "u64" => Values::U64(collect(name, kind, items, Value::as_u64)?),
        "f32" => Values::F32(collect(name, kind, items, |v| float(v).map(|x| x as f32))?),
        "f64" => Values::F64(collect(name, kind, items, float)?),
        other => {
            return Err(DatasetError::UnsupportedType {
                name: name.to_string(),
                kind: other.to_string(),
            });
        }
    })
}

fn parse_attribute(variable: &str, name: &str, raw: &Value) -> Result<AttrValue, DatasetError> {
    let unsupported = |kind: &str| DatasetError::UnsupportedType {
        name: format!("{variable}/{name}"),
        kind: kind.to_string(),
    };

    match raw {
        Value::String(s) => Ok(AttrValue::Text(s.clone())),
        Value::Number(n) => match n.as_i64() {
            Some(x) => Ok(AttrValue::Numeric(Values::I64(vec![x]))),
            None => n
                .as_f64()
                .map(|x| AttrValue::Numeric(Values::F64(vec![x])))
                .ok_or_else(|| unsupported("number")),
        },
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_string) => Ok(
            AttrValue::Texts(items.iter().filter_map(|v| v.as_str().map(String::from)).collect()),
        ),
        Value::Array(items) if items.iter().all(Value::is_i64) => Ok(AttrValue::Numeric(
            Values::I64(items.iter().filter_map(Value::as_i64).collect()),
        )),
        Value::Array(items) if items.iter().all(Value::is_number) => Ok(AttrValue::Numeric(
            Values::F64(items.iter().filter_map(Value::as_f64).collect()),
        )),
        Value::Array(_) => Err(unsupported("mixed array")),
        Value::Bool(_) => Err(unsupported("bool")),
        Value::Null => Err(unsupported("null")),
        Value::Object(_) => Err(unsupported("object")),
    }
}
