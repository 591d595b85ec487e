//! Path classification.
//!
//! Every path maps to exactly one [`PathRef`]. Classification only looks at
//! the path string and the set of variable names; it never reads the dataset
//! and never checks that an attribute exists.

use std::fmt;

/// Name of the payload file inside every variable directory.
pub const DATA_REPR: &str = "DATA_REPR";

/// Name reserved for a variable's dimensions. Recognized, never served.
pub const DIMENSIONS: &str = "dimensions";

/// Desktop trash directories contain this marker.
pub const TRASH_MARKER: &str = ".Trash";

/// What a path refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRef {
    /// The mount root
    Root,
    /// A variable directory
    VariableDir(String),
    /// A variable's `DATA_REPR` file
    DataNode(String),
    /// A variable's `dimensions` entry
    DimensionsNode(String),
    /// An attribute file; existence is not checked
    AttributeNode { variable: String, attribute: String },
    /// A trash path, answered without touching the dataset
    Blacklisted(String),
}

impl PathRef {
    /// True for entries presented as directories.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Root | Self::VariableDir(_))
    }

    /// The variable this path belongs to, if any.
    #[must_use]
    pub fn variable(&self) -> Option<&str> {
        match self {
            Self::VariableDir(v)
            | Self::DataNode(v)
            | Self::DimensionsNode(v)
            | Self::AttributeNode { variable: v, .. } => Some(v),
            Self::Root | Self::Blacklisted(_) => None,
        }
    }
}

/// Renders the entry a path resolves to. A single segment that names no
/// variable renders as the attribute lookup it becomes, `/name/name`.
impl fmt::Display for PathRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("/"),
            Self::VariableDir(v) => write!(f, "/{v}"),
            Self::DataNode(v) => write!(f, "/{v}/{DATA_REPR}"),
            Self::DimensionsNode(v) => write!(f, "/{v}/{DIMENSIONS}"),
            Self::AttributeNode {
                variable,
                attribute,
            } => write!(f, "/{variable}/{attribute}"),
            Self::Blacklisted(raw) => f.write_str(raw),
        }
    }
}

/// Classify a namespace path.
///
/// 1. One leading `/` is stripped; an empty remainder is [`PathRef::Root`].
/// 2. Anything containing [`TRASH_MARKER`] is [`PathRef::Blacklisted`].
/// 3. A single segment naming a variable is [`PathRef::VariableDir`]. A
///    single segment naming nothing falls through to
///    `AttributeNode { variable: name, attribute: name }`.
/// 4. Otherwise the second segment decides: [`DATA_REPR`], [`DIMENSIONS`],
///    or an attribute name. Further segments are ignored.
///
/// No other normalization is applied.
pub fn classify(path: &str, is_variable: impl Fn(&str) -> bool) -> PathRef {
    let rel = path.strip_prefix('/').unwrap_or(path);
    if rel.is_empty() {
        return PathRef::Root;
    }
    if path.contains(TRASH_MARKER) {
        return PathRef::Blacklisted(path.to_string());
    }

    let mut segments = rel.split('/');
    let name = segments.next().unwrap_or_default().to_string();

    match segments.next() {
        None if is_variable(&name) => PathRef::VariableDir(name),
        None => PathRef::AttributeNode {
            variable: name.clone(),
            attribute: name,
        },
        Some(DATA_REPR) => PathRef::DataNode(name),
        Some(DIMENSIONS) => PathRef::DimensionsNode(name),
        Some(attribute) => PathRef::AttributeNode {
            variable: name,
            attribute: attribute.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(name: &str) -> bool {
        matches!(name, "temp" | "abcd")
    }

    // ========== Classification Tests ==========

    #[test]
    fn test_classify_root() {
        assert_eq!(classify("/", vars), PathRef::Root);
        assert_eq!(classify("", vars), PathRef::Root);
    }

    #[test]
    fn test_classify_variable_dir() {
        assert_eq!(classify("/temp", vars), PathRef::VariableDir("temp".into()));
        assert_eq!(classify("abcd", vars), PathRef::VariableDir("abcd".into()));
    }

    #[test]
    fn test_classify_data_node() {
        assert_eq!(
            classify("/temp/DATA_REPR", vars),
            PathRef::DataNode("temp".into())
        );
    }

    #[test]
    fn test_classify_data_node_unknown_variable() {
        assert_eq!(
            classify("/ghost/DATA_REPR", vars),
            PathRef::DataNode("ghost".into())
        );
    }

    #[test]
    fn test_classify_dimensions() {
        assert_eq!(
            classify("/temp/dimensions", vars),
            PathRef::DimensionsNode("temp".into())
        );
    }

    #[test]
    fn test_classify_attribute() {
        assert_eq!(
            classify("/temp/units", vars),
            PathRef::AttributeNode {
                variable: "temp".into(),
                attribute: "units".into(),
            }
        );
    }

    #[test]
    fn test_classify_unknown_single_segment_falls_through() {
        assert_eq!(
            classify("/nope", vars),
            PathRef::AttributeNode {
                variable: "nope".into(),
                attribute: "nope".into(),
            }
        );
    }

    #[test]
    fn test_classify_extra_segments_ignored() {
        assert_eq!(
            classify("/temp/units/deeper", vars),
            PathRef::AttributeNode {
                variable: "temp".into(),
                attribute: "units".into(),
            }
        );
    }

    #[test]
    fn test_classify_trash() {
        for path in ["/.Trash", "/.Trash-1000", "/temp/.Trash/x", "/.Trash/DATA_REPR"] {
            assert_eq!(
                classify(path, vars),
                PathRef::Blacklisted(path.to_string()),
                "{path}"
            );
        }
    }

    #[test]
    fn test_classify_trash_wins_over_variable() {
        let is_var = |name: &str| name == ".Trash";
        assert!(matches!(classify("/.Trash", is_var), PathRef::Blacklisted(_)));
    }

    #[test]
    fn test_classify_is_pure() {
        for path in ["/", "/temp", "/temp/DATA_REPR", "/x/y", "/.Trash"] {
            assert_eq!(classify(path, vars), classify(path, vars));
        }
    }

    // ========== PathRef Tests ==========

    #[test]
    fn test_path_ref_is_dir() {
        assert!(PathRef::Root.is_dir());
        assert!(PathRef::VariableDir("v".into()).is_dir());
        assert!(!PathRef::DataNode("v".into()).is_dir());
        assert!(!PathRef::DimensionsNode("v".into()).is_dir());
        assert!(!PathRef::Blacklisted("/.Trash".into()).is_dir());
    }

    #[test]
    fn test_path_ref_variable() {
        assert_eq!(PathRef::Root.variable(), None);
        assert_eq!(PathRef::DataNode("v".into()).variable(), Some("v"));
        assert_eq!(
            PathRef::AttributeNode {
                variable: "v".into(),
                attribute: "a".into()
            }
            .variable(),
            Some("v")
        );
    }

    #[test]
    fn test_path_ref_display_round_trips() {
        for path in ["/", "/temp", "/temp/DATA_REPR", "/temp/dimensions", "/temp/units"] {
            assert_eq!(classify(path, vars).to_string(), path);
        }
    }

    #[test]
    fn test_path_ref_display_attribute_named_like_variable() {
        assert_eq!(classify("/temp/temp", vars).to_string(), "/temp/temp");
        assert_eq!(classify("/abcd/abcd", vars).to_string(), "/abcd/abcd");
    }

    #[test]
    fn test_path_ref_display_fall_through() {
        assert_eq!(classify("/nope", vars).to_string(), "/nope/nope");
    }
}
