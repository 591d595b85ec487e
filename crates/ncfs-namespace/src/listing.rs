//! Directory listings.

use ncfs_core::{Dataset, DatasetError};

use crate::resolver::DATA_REPR;

/// Entries of the root directory: `.`, `..`, then every variable in dataset
/// order.
pub fn list_root(dataset: &dyn Dataset) -> Vec<String> {
    let mut entries = vec![".".to_string(), "..".to_string()];
    entries.extend(dataset.variable_names());
    entries
}

/// Entries of a variable directory: `.`, `..`, every attribute in dataset
/// order, then `DATA_REPR`. `dimensions` is never listed.
pub fn list_variable(dataset: &dyn Dataset, variable: &str) -> Result<Vec<String>, DatasetError> {
    let mut entries = vec![".".to_string(), "..".to_string()];
    entries.extend(dataset.attribute_names(variable)?);
    entries.push(DATA_REPR.to_string());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncfs_core::{ArrayData, Values};
    use ncfs_dataset::MemoryDataset;

    fn empty() -> ArrayData {
        ArrayData::vector(Values::F64(vec![]))
    }

    #[test]
    fn test_list_root() {
        let ds = MemoryDataset::builder()
            .variable("a", empty())
            .variable("b", empty())
            .build()
            .unwrap();
        assert_eq!(list_root(&ds), vec![".", "..", "a", "b"]);
    }

    #[test]
    fn test_list_root_empty_dataset() {
        assert_eq!(list_root(&MemoryDataset::new()), vec![".", ".."]);
    }

    #[test]
    fn test_list_variable() {
        let ds = MemoryDataset::builder()
            .variable("temp", empty())
            .attribute("temp", "units", "K")
            .build()
            .unwrap();
        assert_eq!(
            list_variable(&ds, "temp").unwrap(),
            vec![".", "..", "units", "DATA_REPR"]
        );
    }

    #[test]
    fn test_list_variable_without_attributes() {
        let ds = MemoryDataset::builder().variable("v", empty()).build().unwrap();
        assert_eq!(list_variable(&ds, "v").unwrap(), vec![".", "..", "DATA_REPR"]);
    }

    #[test]
    fn test_list_variable_never_lists_dimensions() {
        let ds = MemoryDataset::builder()
            .variable("v", empty())
            .attribute("v", "long_name", "x")
            .build()
            .unwrap();
        assert!(!list_variable(&ds, "v").unwrap().iter().any(|e| e == "dimensions"));
    }

    #[test]
    fn test_list_unknown_variable() {
        let err = list_variable(&MemoryDataset::new(), "ghost").unwrap_err();
        assert!(matches!(err, DatasetError::VariableNotFound(_)));
    }
}
