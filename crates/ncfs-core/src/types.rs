//! Core value types for NCFS.
//!
//! ## Payloads
//! - [`Values`]: a flat, typed vector of numeric elements
//! - [`ArrayData`]: a variable's payload, [`Values`] plus its shape
//! - [`Scalar`]: one element widened to a common numeric type
//!
//! ## Metadata
//! - [`AttrValue`]: a variable attribute (text or short numeric array)

use std::fmt;

use crate::error::DatasetError;

// ============================================================================
// Numeric payloads
// ============================================================================

/// A flat vector of numeric elements of a single type.
///
/// Element order is the row-major order of the owning array.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Apply the same expression to the inner vector of every [`Values`] variant.
macro_rules! each_values {
    ($values:expr, $v:ident => $body:expr) => {
        match $values {
            Values::I8($v) => $body,
            Values::U8($v) => $body,
            Values::I16($v) => $body,
            Values::U16($v) => $body,
            Values::I32($v) => $body,
            Values::U32($v) => $body,
            Values::I64($v) => $body,
            Values::U64($v) => $body,
            Values::F32($v) => $body,
            Values::F64($v) => $body,
        }
    };
}

impl Values {
    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        each_values!(self, v => v.len())
    }

    /// True if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of one element in bytes.
    #[must_use]
    pub fn element_size(&self) -> usize {
        match self {
            Self::I8(_) | Self::U8(_) => 1,
            Self::I16(_) | Self::U16(_) => 2,
            Self::I32(_) | Self::U32(_) | Self::F32(_) => 4,
            Self::I64(_) | Self::U64(_) | Self::F64(_) => 8,
        }
    }

    /// Short type name, as used in dataset descriptions.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::I8(_) => "i8",
            Self::U8(_) => "u8",
            Self::I16(_) => "i16",
            Self::U16(_) => "u16",
            Self::I32(_) => "i32",
            Self::U32(_) => "u32",
            Self::I64(_) => "i64",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
        }
    }

    /// Element at `index`, widened.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Scalar> {
        match self {
            Self::I8(v) => v.get(index).map(|&x| Scalar::Int(i64::from(x))),
            Self::U8(v) => v.get(index).map(|&x| Scalar::UInt(u64::from(x))),
            Self::I16(v) => v.get(index).map(|&x| Scalar::Int(i64::from(x))),
            Self::U16(v) => v.get(index).map(|&x| Scalar::UInt(u64::from(x))),
            Self::I32(v) => v.get(index).map(|&x| Scalar::Int(i64::from(x))),
            Self::U32(v) => v.get(index).map(|&x| Scalar::UInt(u64::from(x))),
            Self::I64(v) => v.get(index).map(|&x| Scalar::Int(x)),
            Self::U64(v) => v.get(index).map(|&x| Scalar::UInt(x)),
            Self::F32(v) => v.get(index).map(|&x| Scalar::Float(f64::from(x))),
            Self::F64(v) => v.get(index).map(|&x| Scalar::Float(x)),
        }
    }

    /// Iterate over all elements, widened.
    pub fn iter(&self) -> impl Iterator<Item = Scalar> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Raw in-memory bytes in native byte order, no delimiters.
    #[must_use]
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() * self.element_size());
        each_values!(self, v => {
            for x in v {
                out.extend_from_slice(&x.to_ne_bytes());
            }
        });
        out
    }

    /// Printable form of the element at `index`.
    ///
    /// Floats use the shortest round-trip representation at their own
    /// precision, so an `f32` of `0.1` prints as `0.1`.
    fn repr_at(&self, index: usize) -> Option<String> {
        match self {
            Self::F32(v) => v.get(index).map(|x| float_repr(format!("{x:?}"))),
            Self::F64(v) => v.get(index).map(|x| float_repr(format!("{x:?}"))),
            _ => self.get(index).map(|s| s.to_string()),
        }
    }
}

/// A single numeric element widened to 64 bits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl Scalar {
    /// The value as a float.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(x) => x as f64,
            Self::UInt(x) => x as f64,
            Self::Float(x) => x,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(x) => write!(f, "{x}"),
            Self::UInt(x) => write!(f, "{x}"),
            Self::Float(x) => f.write_str(&float_repr(format!("{x:?}"))),
        }
    }
}

/// Rewrite Rust's shortest float `Debug` output into the conventional
/// printable form: `nan`, and exponents with an explicit sign and at least
/// two digits (`1e-05`, `1.5e+16`).
fn float_repr(debug: String) -> String {
    if debug == "NaN" {
        return "nan".to_string();
    }
    let Some((mantissa, exponent)) = debug.split_once('e') else {
        return debug;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// A variable's numeric payload: flat values plus shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayData {
    shape: Vec<usize>,
    values: Values,
}

impl ArrayData {
    /// Create a payload, checking that the shape covers every element.
    ///
    /// A scalar variable has an empty shape and exactly one element.
    pub fn new(shape: Vec<usize>, values: Values) -> Result<Self, DatasetError> {
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(DatasetError::ShapeMismatch {
                shape,
                len: values.len(),
            });
        }
        Ok(Self { shape, values })
    }

    /// A one-dimensional payload.
    #[must_use]
    pub fn vector(values: Values) -> Self {
        Self {
            shape: vec![values.len()],
            values,
        }
    }

    /// Dimension lengths, outermost first.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flattened elements in row-major order.
    #[must_use]
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the payload has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Size of the raw in-memory payload in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.values.len() * self.values.element_size()
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// A variable attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// A single string
    Text(String),
    /// A list of strings
    Texts(Vec<String>),
    /// A numeric scalar (one element) or short array
    Numeric(Values),
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for AttrValue {
    fn from(x: f64) -> Self {
        Self::Numeric(Values::F64(vec![x]))
    }
}

impl From<i32> for AttrValue {
    fn from(x: i32) -> Self {
        Self::Numeric(Values::I32(vec![x]))
    }
}

impl fmt::Display for AttrValue {
    /// Printable form: text verbatim, one-element arrays as a bare scalar,
    /// longer arrays as `[a b c]`, string lists as `['a', 'b']`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Texts(items) => {
                let quoted: Vec<String> = items.iter().map(|s| format!("'{s}'")).collect();
                write!(f, "[{}]", quoted.join(", "))
            }
            Self::Numeric(values) => {
                if values.len() == 1 {
                    return f.write_str(&values.repr_at(0).unwrap_or_default());
                }
                let items: Vec<String> = (0..values.len())
                    .filter_map(|i| values.repr_at(i))
                    .collect();
                write!(f, "[{}]", items.join(" "))
            }
        }
    }
}
