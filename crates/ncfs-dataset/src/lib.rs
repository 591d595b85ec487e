//! # ncfs-dataset
//!
//! [`Dataset`] implementations for NCFS.
//!
//! - [`MemoryDataset`]: in-memory variables, built in code or loaded from a
//!   `.json` description
//! - `NetcdfDataset`: a netCDF file (requires the `netcdf` feature)
//!
//! [`open`] picks the loader from the file extension.

pub mod memory;
#[cfg(feature = "netcdf")]
pub mod netcdf_file;

use std::path::Path;
use std::sync::Arc;

use ncfs_core::{Dataset, DatasetError};
use tracing::debug;

pub use memory::{MemoryDataset, MemoryDatasetBuilder};
#[cfg(feature = "netcdf")]
pub use netcdf_file::NetcdfDataset;

/// Open a dataset file.
///
/// `.json` files load as a [`MemoryDataset`] description; everything else is
/// handed to the netCDF library.
pub fn open(path: &Path) -> Result<Arc<dyn Dataset>, DatasetError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        debug!("Loading JSON dataset description {}", path.display());
        return Ok(Arc::new(MemoryDataset::load(path)?));
    }
    open_netcdf(path)
}

#[cfg(feature = "netcdf")]
fn open_netcdf(path: &Path) -> Result<Arc<dyn Dataset>, DatasetError> {
    Ok(Arc::new(NetcdfDataset::open(path)?))
}

#[cfg(not(feature = "netcdf"))]
fn open_netcdf(path: &Path) -> Result<Arc<dyn Dataset>, DatasetError> {
    Err(DatasetError::Open {
        path: path.display().to_string(),
        reason: "netCDF support not compiled in (rebuild with the `netcdf` feature)".to_string(),
    })
}
