//! printf-style numeric formatting.
//!
//! A [`NumericFormat`] holds literal text around exactly one conversion:
//!
//! ```text
//! %[flags][width][.precision][length]conversion
//!   flags:       - + space 0 #
//!   length:      h hh l ll L q j z t   (accepted and ignored)
//!   conversion:  d i u   f F   e E   g G
//! ```
//!
//! `%%` is a literal percent sign. Integer conversions truncate floats toward
//! zero; float conversions widen integers.

use std::fmt;
use std::str::FromStr;

use ncfs_core::{ReprError, Scalar};

/// Largest accepted width or precision.
pub const MAX_FIELD: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Decimal,
    Fixed { upper: bool },
    Exponent { upper: bool },
    General { upper: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Directive {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alt: bool,
    width: usize,
    precision: Option<usize>,
    conversion: Conversion,
}

/// A parsed printf-style format with a single numeric conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericFormat {
    source: String,
    prefix: String,
    directive: Directive,
    suffix: String,
}

impl NumericFormat {
    /// Parse a format string such as `%f`, `%.1f` or `t=%8.3e K`.
    pub fn parse(format: &str) -> Result<Self, ReprError> {
        let invalid = |reason: String| ReprError::InvalidFormat {
            format: format.to_string(),
            reason,
        };

        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut directive = None;
        let mut chars = format.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                if directive.is_some() {
                    suffix.push(c);
                } else {
                    prefix.push(c);
                }
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                if directive.is_some() {
                    suffix.push('%');
                } else {
                    prefix.push('%');
                }
                continue;
            }
            if directive.is_some() {
                return Err(invalid("more than one conversion".to_string()));
            }

            let mut parsed = Directive {
                left: false,
                plus: false,
                space: false,
                zero: false,
                alt: false,
                width: 0,
                precision: None,
                conversion: Conversion::Decimal,
            };

            while let Some(&flag) = chars.peek() {
                match flag {
                    '-' => parsed.left = true,
                    '+' => parsed.plus = true,
                    ' ' => parsed.space = true,
                    '0' => parsed.zero = true,
                    '#' => parsed.alt = true,
                    _ => break,
                }
                chars.next();
            }

            parsed.width = take_number(&mut chars);
            if parsed.width > MAX_FIELD {
                return Err(invalid(format!("width exceeds {MAX_FIELD}")));
            }

            if chars.peek() == Some(&'.') {
                chars.next();
                let precision = take_number(&mut chars);
                if precision > MAX_FIELD {
                    return Err(invalid(format!("precision exceeds {MAX_FIELD}")));
                }
                parsed.precision = Some(precision);
            }

            while matches!(
                chars.peek().copied(),
                Some('h' | 'l' | 'L' | 'q' | 'j' | 'z' | 't')
            ) {
                chars.next();
            }

            parsed.conversion = match chars.next() {
                Some('d' | 'i' | 'u') => Conversion::Decimal,
                Some('f') => Conversion::Fixed { upper: false },
                Some('F') => Conversion::Fixed { upper: true },
                Some('e') => Conversion::Exponent { upper: false },
                Some('E') => Conversion::Exponent { upper: true },
                Some('g') => Conversion::General { upper: false },
                Some('G') => Conversion::General { upper: true },
                Some(other) => return Err(invalid(format!("unsupported conversion '{other}'"))),
                None => return Err(invalid("incomplete conversion".to_string())),
            };

            directive = Some(parsed);
        }

        let directive = directive.ok_or_else(|| invalid("no conversion".to_string()))?;
        Ok(Self {
            source: format.to_string(),
            prefix,
            directive,
            suffix,
        })
    }

    /// The format string this was parsed from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render one value.
    #[must_use]
    pub fn format(&self, value: Scalar) -> String {
        let directive = &self.directive;
        let (negative, body, finite) = match directive.conversion {
            Conversion::Decimal => format_decimal(value, directive.precision),
            conversion => format_float(value.as_f64(), conversion, directive),
        };

        let sign = if negative {
            "-"
        } else if directive.plus {
            "+"
        } else if directive.space {
            " "
        } else {
            ""
        };

        let len = sign.len() + body.len();
        let padded = if len >= directive.width {
            format!("{sign}{body}")
        } else if directive.left {
            format!("{sign}{body}{}", " ".repeat(directive.width - len))
        } else if directive.zero && finite && !self.zero_flag_ignored() {
            format!("{sign}{}{body}", "0".repeat(directive.width - len))
        } else {
            format!("{}{sign}{body}", " ".repeat(directive.width - len))
        };

        format!("{}{padded}{}", self.prefix, self.suffix)
    }

    /// An explicit precision on an integer conversion overrides the `0` flag.
    fn zero_flag_ignored(&self) -> bool {
        self.directive.conversion == Conversion::Decimal && self.directive.precision.is_some()
    }
}

impl FromStr for NumericFormat {
    type Err = ReprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for NumericFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> usize {
    let mut n = 0usize;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        n = n.saturating_mul(10).saturating_add(d as usize);
        chars.next();
    }
    n
}

/// Returns (negative, digits, finite).
///
/// Floats print as their exact truncated integer value. A zero precision
/// still prints `0`.
fn format_decimal(value: Scalar, precision: Option<usize>) -> (bool, String, bool) {
    let (negative, magnitude) = match value {
        Scalar::Int(x) => (x < 0, x.unsigned_abs().to_string()),
        Scalar::UInt(x) => (false, x.to_string()),
        Scalar::Float(x) if x.is_nan() => return (false, "nan".to_string(), false),
        Scalar::Float(x) if x.is_infinite() => return (x < 0.0, "inf".to_string(), false),
        Scalar::Float(x) => {
            let t = x.trunc();
            (t < 0.0, format!("{:.0}", t.abs()))
        }
    };
    let digits = match precision {
        Some(p) if magnitude.len() < p => format!("{magnitude:0>p$}"),
        _ => magnitude,
    };
    (negative, digits, true)
}

/// Returns (negative, digits, finite).
fn format_float(value: f64, conversion: Conversion, directive: &Directive) -> (bool, String, bool) {
    let upper = matches!(
        conversion,
        Conversion::Fixed { upper: true }
            | Conversion::Exponent { upper: true }
            | Conversion::General { upper: true }
    );

    if !value.is_finite() {
        let text = if value.is_nan() { "nan" } else { "inf" };
        let text = if upper { text.to_uppercase() } else { text.to_string() };
        return (value.is_sign_negative() && !value.is_nan(), text, false);
    }

    let negative = value.is_sign_negative();
    let abs = value.abs();
    let precision = directive.precision.unwrap_or(6);

    let body = match conversion {
        Conversion::Fixed { .. } | Conversion::Decimal => fixed(abs, precision, directive.alt),
        Conversion::Exponent { .. } => exponent(abs, precision, directive.alt, upper),
        Conversion::General { .. } => general(abs, precision, directive.alt, upper),
    };
    (negative, body, true)
}

fn fixed(abs: f64, precision: usize, alt: bool) -> String {
    let mut s = format!("{abs:.precision$}");
    if alt && precision == 0 {
        s.push('.');
    }
    s
}

/// `d.ddde±XX` with at least two exponent digits.
fn exponent(abs: f64, precision: usize, alt: bool, upper: bool) -> String {
    let (mantissa, exp) = split_exponent(abs, precision);
    let mut mantissa = mantissa;
    if alt && precision == 0 {
        mantissa.push('.');
    }
    join_exponent(&mantissa, exp, upper)
}

/// `%g`: the shorter of fixed and exponent notation, trailing zeros removed.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn general(abs: f64, precision: usize, alt: bool, upper: bool) -> String {
    let p = precision.max(1);
    let (_, x) = if abs == 0.0 {
        (String::new(), 0)
    } else {
        split_exponent(abs, p - 1)
    };

    if (p as i64) > x && x >= -4 {
        let decimals = (p as i64 - 1 - x) as usize;
        let s = fixed(abs, decimals, alt);
        if alt { s } else { strip_zeros(&s) }
    } else {
        let (mantissa, exp) = split_exponent(abs, p - 1);
        let mantissa = if alt {
            if mantissa.contains('.') { mantissa } else { format!("{mantissa}.") }
        } else {
            strip_zeros(&mantissa)
        };
        join_exponent(&mantissa, exp, upper)
    }
}

fn split_exponent(abs: f64, precision: usize) -> (String, i64) {
    let s = format!("{abs:.precision$e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => (mantissa.to_string(), exp.parse().unwrap_or(0)),
        None => (s, 0),
    }
}

fn join_exponent(mantissa: &str, exp: i64, upper: bool) -> String {
    let e = if upper { 'E' } else { 'e' };
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}{e}{sign}{:02}", exp.unsigned_abs())
}

fn strip_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}
