//! The namespace engine.
//!
//! [`NamespaceCore`] answers filesystem questions by path. It holds the
//! dataset, the two representation strategies and the mount context, and is
//! otherwise stateless: every answer is recomputed from the dataset.

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::sync::Arc;

use ncfs_core::{AttributeRepresentation, DataRepresentation, Dataset, DatasetError, Error, Result};
use tracing::{debug, warn};

use crate::listing::{list_root, list_variable};
use crate::metadata::{MountContext, StatRecord, synthesize};
use crate::resolver::{PathRef, classify};

/// Result of a write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Acknowledged as written, but nothing was stored.
    Discarded { len: usize },
}

impl WriteOutcome {
    /// Byte count reported back to the caller.
    #[must_use]
    pub fn len(self) -> usize {
        match self {
            Self::Discarded { len } => len,
        }
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

/// Path-addressed view of a dataset.
pub struct NamespaceCore {
    dataset: Arc<dyn Dataset>,
    data_repr: Box<dyn DataRepresentation>,
    attr_repr: Box<dyn AttributeRepresentation>,
    context: MountContext,
}

impl NamespaceCore {
    pub fn new(
        dataset: Arc<dyn Dataset>,
        data_repr: Box<dyn DataRepresentation>,
        attr_repr: Box<dyn AttributeRepresentation>,
        context: MountContext,
    ) -> Self {
        Self {
            dataset,
            data_repr,
            attr_repr,
            context,
        }
    }

    /// The dataset being served.
    #[must_use]
    pub fn dataset(&self) -> &Arc<dyn Dataset> {
        &self.dataset
    }

    #[must_use]
    pub fn context(&self) -> &MountContext {
        &self.context
    }

    /// Name of the payload representation in use.
    #[must_use]
    pub fn data_repr_name(&self) -> &str {
        self.data_repr.name()
    }

    /// Classify a path against this dataset's variables.
    pub fn classify(&self, path: &str) -> PathRef {
        classify(path, |name| self.dataset.has_variable(name))
    }

    /// Stat a path.
    pub fn attributes_of(&self, path: &str) -> Result<StatRecord> {
        let path_ref = self.classify(path);
        debug!("attributes_of: {path} -> {path_ref:?}");
        synthesize(
            &path_ref,
            self.dataset.as_ref(),
            self.data_repr.as_ref(),
            self.attr_repr.as_ref(),
            &self.context,
        )
    }

    /// List a directory.
    pub fn list(&self, path: &str) -> Result<Vec<String>> {
        let path_ref = self.classify(path);
        debug!("list: {path} -> {path_ref:?}");
        match &path_ref {
            PathRef::Root => Ok(list_root(self.dataset.as_ref())),
            PathRef::VariableDir(variable) => {
                list_variable(self.dataset.as_ref(), variable).map_err(|e| match e {
                    DatasetError::VariableNotFound(v) => {
                        Error::Internal(format!("variable {v} vanished while listing {path}"))
                    }
                    other => other.into(),
                })
            }
            PathRef::DimensionsNode(_) => Err(Error::NotFound(path.to_string())),
            PathRef::Blacklisted(_) => Err(Error::NotDirectory(path.to_string())),
            PathRef::DataNode(_) | PathRef::AttributeNode { .. } => {
                self.attributes_of(path)?;
                Err(Error::NotDirectory(path.to_string()))
            }
        }
    }

    /// Open a file. Existence of attributes is checked on read.
    pub fn open(&self, path: &str) -> Result<()> {
        let path_ref = self.classify(path);
        debug!("open: {path} -> {path_ref:?}");
        match path_ref {
            PathRef::Root | PathRef::VariableDir(_) => Err(Error::IsDirectory(path.to_string())),
            PathRef::DimensionsNode(_) | PathRef::Blacklisted(_) => {
                Err(Error::NotFound(path.to_string()))
            }
            PathRef::DataNode(_) | PathRef::AttributeNode { .. } => Ok(()),
        }
    }

    /// Read `length` bytes starting at `offset`.
    ///
    /// The full representation is materialized and sliced. Windows past the
    /// end are truncated; an offset past the end yields nothing.
    pub fn read(&self, path: &str, offset: u64, length: usize) -> Result<Vec<u8>> {
        let path_ref = self.classify(path);
        debug!("read: {path} offset={offset} length={length}");
        let bytes = self.content(&path_ref)?;
        Ok(window(&bytes, offset, length).to_vec())
    }

    /// Accept and discard a write.
    pub fn write(&self, path: &str, data: &[u8], offset: u64) -> Result<WriteOutcome> {
        warn!(
            "write: discarding {} bytes at offset {offset} to {path}",
            data.len()
        );
        Ok(WriteOutcome::Discarded { len: data.len() })
    }

    /// Release an open file. Nothing is held open, so this does nothing.
    pub fn close(&self, path: &str) {
        debug!("close: {path}");
    }

    /// Check access to the backing file.
    ///
    /// An execute request is checked as a read request. Datasets without a
    /// backing file always pass.
    #[allow(unsafe_code)]
    pub fn access(&self, path: &str, mode: i32) -> Result<()> {
        let Some(source) = self.dataset.source() else {
            return Ok(());
        };
        let mode = if mode & libc::X_OK == 0 {
            mode
        } else {
            (mode & !libc::X_OK) | libc::R_OK
        };
        debug!("access: {path} mode={mode} via {}", source.display());

        let denied = || Error::PermissionDenied(source.display().to_string());
        let c_path = CString::new(source.as_os_str().as_bytes()).map_err(|_| denied())?;
        // SAFETY: c_path is a valid NUL-terminated string that outlives the call
        let rc = unsafe { libc::access(c_path.as_ptr(), mode) };
        if rc == 0 { Ok(()) } else { Err(denied()) }
    }

    /// Every path is reported as existing; lookups fail later if it does not.
    pub fn exists(&self, _path: &str) -> bool {
        true
    }

    fn content(&self, path_ref: &PathRef) -> Result<Vec<u8>> {
        match path_ref {
            PathRef::DataNode(variable) => {
                let data = self.dataset.values(variable)?;
                Ok(self.data_repr.encode(&data))
            }
            PathRef::AttributeNode {
                variable,
                attribute,
            } => {
                let value = self.dataset.attribute(variable, attribute)?;
                Ok(self.attr_repr.encode(&value))
            }
            PathRef::Root | PathRef::VariableDir(_) => {
                Err(Error::IsDirectory(path_ref.to_string()))
            }
            PathRef::DimensionsNode(_) | PathRef::Blacklisted(_) => {
                Err(Error::NotFound(path_ref.to_string()))
            }
        }
    }
}

/// The sub-slice `[offset, offset + length)` clamped to `bytes`.
pub fn window(bytes: &[u8], offset: u64, length: usize) -> &[u8] {
    let start = usize::try_from(offset).map_or(bytes.len(), |o| o.min(bytes.len()));
    let end = start.saturating_add(length).min(bytes.len());
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncfs_core::{ArrayData, AttrValue, ErrorKind, Values};
    use ncfs_dataset::MemoryDataset;
    use ncfs_repr::{AttrTextRepr, BinaryRepr, FlatTextRepr};
    use parking_lot::Mutex;
    use std::path::Path;
    use std::time::{Duration, UNIX_EPOCH};

    fn ctx() -> MountContext {
        MountContext::new(UNIX_EPOCH + Duration::from_secs(1_600_000_000), 501, 20)
    }

    fn temp_dataset() -> MemoryDataset {
        MemoryDataset::builder()
            .variable("temp", ArrayData::vector(Values::F64(vec![1.0, 2.0])))
            .attribute("temp", "units", "K")
            .build()
            .unwrap()
    }

    fn core_with(dataset: Arc<dyn Dataset>) -> NamespaceCore {
        NamespaceCore::new(
            dataset,
            Box::new(FlatTextRepr::new("%.1f").unwrap()),
            Box::new(AttrTextRepr),
            ctx(),
        )
    }

    fn core() -> NamespaceCore {
        core_with(Arc::new(temp_dataset()))
    }

    /// Records every dataset call.
    struct RecordingDataset {
        inner: MemoryDataset,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingDataset {
        fn new(inner: MemoryDataset) -> Self {
            Self {
                inner,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, call: &str) {
            self.calls.lock().push(call.to_string());
        }
    }

    impl Dataset for RecordingDataset {
        fn source(&self) -> Option<&Path> {
            self.record("source");
            self.inner.source()
        }

        fn variable_names(&self) -> Vec<String> {
            self.record("variable_names");
            self.inner.variable_names()
        }

        fn shape(&self, variable: &str) -> std::result::Result<Vec<usize>, DatasetError> {
            self.record("shape");
            self.inner.shape(variable)
        }

        fn attribute_names(
            &self,
            variable: &str,
        ) -> std::result::Result<Vec<String>, DatasetError> {
            self.record("attribute_names");
            self.inner.attribute_names(variable)
        }

        fn attribute(
            &self,
            variable: &str,
            name: &str,
        ) -> std::result::Result<AttrValue, DatasetError> {
            self.record("attribute");
            self.inner.attribute(variable, name)
        }

        fn values(&self, variable: &str) -> std::result::Result<ArrayData, DatasetError> {
            self.record("values");
            self.inner.values(variable)
        }
    }

    /// Claims a variable exists but cannot list it.
    struct InconsistentDataset;

    impl Dataset for InconsistentDataset {
        fn source(&self) -> Option<&Path> {
            None
        }

        fn variable_names(&self) -> Vec<String> {
            vec!["ghost".to_string()]
        }

        fn shape(&self, variable: &str) -> std::result::Result<Vec<usize>, DatasetError> {
            Err(DatasetError::VariableNotFound(variable.to_string()))
        }

        fn attribute_names(
            &self,
            variable: &str,
        ) -> std::result::Result<Vec<String>, DatasetError> {
            Err(DatasetError::VariableNotFound(variable.to_string()))
        }

        fn attribute(
            &self,
            variable: &str,
            _name: &str,
        ) -> std::result::Result<AttrValue, DatasetError> {
            Err(DatasetError::VariableNotFound(variable.to_string()))
        }

        fn values(&self, variable: &str) -> std::result::Result<ArrayData, DatasetError> {
            Err(DatasetError::VariableNotFound(variable.to_string()))
        }
    }

    // ========== attributes_of Tests ==========

    #[test]
    fn test_attributes_of_end_to_end() {
        let core = core();

        let dir = core.attributes_of("/temp").unwrap();
        assert!(dir.is_dir);

        let units = core.attributes_of("/temp/units").unwrap();
        assert!(!units.is_dir);
        assert_eq!(units.size, 2);

        let data = core.attributes_of("/temp/DATA_REPR").unwrap();
        assert_eq!(data.size, 8);
    }

    #[test]
    fn test_attributes_of_unknown_single_segment() {
        let err = core().attributes_of("/nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.errno(), libc::ENOENT);
    }

    #[test]
    fn test_attributes_of_blacklisted_never_touches_dataset() {
        let recording = Arc::new(RecordingDataset::new(temp_dataset()));
        let core = core_with(recording.clone());

        // classification of a blacklisted path short-circuits before any
        // variable lookup
        let rec = core.attributes_of("/.Trash-1000/files").unwrap();
        assert_eq!(rec, StatRecord::baseline(&ctx()));
        assert!(recording.calls.lock().is_empty());
    }

    // ========== list Tests ==========

    #[test]
    fn test_list_root_and_variable() {
        let core = core();
        assert_eq!(core.list("/").unwrap(), vec![".", "..", "temp"]);
        assert_eq!(
            core.list("/temp").unwrap(),
            vec![".", "..", "units", "DATA_REPR"]
        );
    }

    #[test]
    fn test_list_file_is_not_directory() {
        let err = core().list("/temp/DATA_REPR").unwrap_err();
        assert!(matches!(err, Error::NotDirectory(_)));
        assert_eq!(err.errno(), libc::ENOTDIR);
    }

    #[test]
    fn test_list_missing_attribute_is_not_found() {
        let err = core().list("/temp/missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_list_vanished_variable_is_internal() {
        let core = core_with(Arc::new(InconsistentDataset));
        let err = core.list("/ghost").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalInconsistency);
    }

    // ========== open / close Tests ==========

    #[test]
    fn test_open_directory_fails() {
        let core = core();
        assert!(matches!(core.open("/"), Err(Error::IsDirectory(_))));
        assert!(matches!(core.open("/temp"), Err(Error::IsDirectory(_))));
    }

    #[test]
    fn test_open_files() {
        let core = core();
        assert!(core.open("/temp/DATA_REPR").is_ok());
        assert!(core.open("/temp/units").is_ok());
        // attribute existence is checked on read
        assert!(core.open("/temp/missing").is_ok());
        core.close("/temp/units");
    }

    #[test]
    fn test_open_dimensions_not_found() {
        assert!(matches!(core().open("/temp/dimensions"), Err(Error::NotFound(_))));
    }

    // ========== read Tests ==========

    #[test]
    fn test_read_attribute() {
        assert_eq!(core().read("/temp/units", 0, 4096).unwrap(), b"K\n");
    }

    #[test]
    fn test_read_data_text() {
        assert_eq!(
            core().read("/temp/DATA_REPR", 0, 4096).unwrap(),
            b"1.0\n2.0\n"
        );
    }

    #[test]
    fn test_read_data_binary() {
        let core = NamespaceCore::new(
            Arc::new(temp_dataset()),
            Box::new(BinaryRepr),
            Box::new(AttrTextRepr),
            ctx(),
        );
        let bytes = core.read("/temp/DATA_REPR", 0, 4096).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..8], &1.0f64.to_ne_bytes());
        assert_eq!(core.data_repr_name(), "binary");
    }

    #[test]
    fn test_read_windows_compose() {
        let core = core();
        let size = core.attributes_of("/temp/DATA_REPR").unwrap().size;
        let full = core.read("/temp/DATA_REPR", 0, 4096).unwrap();

        assert_eq!(core.read("/temp/DATA_REPR", 0, 8).unwrap(), full);
        assert_eq!(full.len() as u64, size);
        assert!(core.read("/temp/DATA_REPR", size + 1, 10).unwrap().is_empty());
        assert!(core.read("/temp/DATA_REPR", size, 10).unwrap().is_empty());
        assert_eq!(core.read("/temp/DATA_REPR", 2, 3).unwrap(), &full[2..5]);
        assert_eq!(core.read("/temp/DATA_REPR", 6, 100).unwrap(), b"0\n");
    }

    #[test]
    fn test_read_missing_attribute() {
        let err = core().read("/temp/missing", 0, 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_read_directory() {
        assert!(matches!(core().read("/temp", 0, 10), Err(Error::IsDirectory(_))));
    }

    #[test]
    fn test_read_blacklisted_and_dimensions() {
        let core = core();
        assert!(matches!(core.read("/.Trash", 0, 10), Err(Error::NotFound(_))));
        assert!(matches!(
            core.read("/temp/dimensions", 0, 10),
            Err(Error::NotFound(_))
        ));
    }

    // ========== window Tests ==========

    #[test]
    fn test_window() {
        let bytes = b"abcdef";
        assert_eq!(window(bytes, 0, 6), b"abcdef");
        assert_eq!(window(bytes, 1, 2), b"bc");
        assert_eq!(window(bytes, 4, 10), b"ef");
        assert_eq!(window(bytes, 6, 1), b"");
        assert_eq!(window(bytes, 100, 1), b"");
        assert_eq!(window(bytes, u64::MAX, usize::MAX), b"");
        assert_eq!(window(bytes, 0, 0), b"");
    }

    // ========== write / access / exists Tests ==========

    #[test]
    fn test_write_discarded() {
        let core = core();
        let outcome = core.write("/temp/units", b"mK\n", 0).unwrap();
        assert_eq!(outcome, WriteOutcome::Discarded { len: 3 });
        assert_eq!(outcome.len(), 3);
        assert_eq!(core.read("/temp/units", 0, 10).unwrap(), b"K\n");
    }

    #[test]
    fn test_access_without_source() {
        assert!(core().access("/temp", libc::R_OK | libc::X_OK).is_ok());
    }

    #[test]
    fn test_access_readable_source() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let ds = MemoryDataset::builder().source(file.path()).build().unwrap();
        let core = core_with(Arc::new(ds));

        assert!(core.access("/", libc::R_OK).is_ok());
        // execute is checked as read on a non-executable file
        assert!(core.access("/", libc::X_OK).is_ok());
    }

    #[test]
    fn test_access_missing_source() {
        let ds = MemoryDataset::builder()
            .source("/nonexistent/ncfs/data.nc")
            .build()
            .unwrap();
        let err = core_with(Arc::new(ds)).access("/", libc::R_OK).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert_eq!(err.errno(), libc::EACCES);
    }

    #[test]
    fn test_exists_always_true() {
        let core = core();
        for path in ["/", "/temp", "/nope", "/temp/missing/deeper"] {
            assert!(core.exists(path));
        }
    }

    // ========== Consistency Tests ==========

    #[test]
    fn test_well_formed_dataset_never_reports_internal_error() {
        let paths = [
            "/",
            "/temp",
            "/temp/DATA_REPR",
            "/temp/dimensions",
            "/temp/units",
            "/temp/missing",
            "/nope",
            "/.Trash-1000/x",
            "/temp/units/deeper",
            "/temp/",
            "//",
            "/temp/DATA_REPR/x",
        ];
        let text = core();
        let binary = NamespaceCore::new(
            Arc::new(temp_dataset()),
            Box::new(BinaryRepr::new()),
            Box::new(AttrTextRepr),
            ctx(),
        );

        for core in [&text, &binary] {
            for path in paths {
                let errors = [
                    core.attributes_of(path).err(),
                    core.list(path).err(),
                    core.open(path).err(),
                    core.read(path, 0, usize::MAX).err(),
                    core.read(path, 3, 1).err(),
                ];
                for err in errors.into_iter().flatten() {
                    assert_ne!(
                        err.kind(),
                        ErrorKind::InternalInconsistency,
                        "{path}: {err}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_context_is_fixed() {
        let core = core();
        assert_eq!(*core.context(), ctx());
        assert_eq!(core.attributes_of("/").unwrap().mtime, ctx().mount_time);
    }
}
