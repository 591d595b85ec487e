//! End-to-end tests over JSON dataset descriptions.
//!
//! Each test writes a description into a temp directory, opens it the way
//! the binary does, and drives the namespace (and the FUSE adapter logic)
//! without a kernel mount.

use std::ffi::OsStr;
use std::path::Path;

use ncfs_core::ErrorKind;
use ncfs_fuse::{NcFs, ROOT_INO};
use ncfs_namespace::{BASE_FILE_MODE, MountContext, NOMINAL_DIR_SIZE, NamespaceCore};
use ncfs_repr::{AttrTextRepr, DataReprKind};
use tempfile::tempdir;

const OCEAN: &str = r#"{
  "variables": {
    "temp": {
      "type": "f32",
      "shape": [2, 2],
      "data": [1.5, 2.0, -3.25, 4.0],
      "attributes": {
        "units": "degC",
        "valid_range": [-5.0, 40.0],
        "scale": 1e-05
      }
    },
    "depth": {
      "type": "i16",
      "data": [10, 20, 30],
      "attributes": {
        "positive": "down"
      }
    }
  }
}"#;

fn write_dataset(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn namespace(path: &Path, kind: DataReprKind, float_format: &str) -> NamespaceCore {
    let dataset = ncfs_dataset::open(path).unwrap();
    NamespaceCore::new(
        dataset,
        kind.build(float_format).unwrap(),
        Box::new(AttrTextRepr::new()),
        MountContext::capture(),
    )
}

fn read_all(core: &NamespaceCore, path: &str) -> String {
    String::from_utf8(core.read(path, 0, usize::MAX).unwrap()).unwrap()
}

#[test]
fn test_listing_follows_dataset_order() {
    let dir = tempdir().unwrap();
    let path = write_dataset(dir.path(), "ocean.json", OCEAN);
    let core = namespace(&path, DataReprKind::Text, "%f");

    assert_eq!(core.list("/").unwrap(), vec![".", "..", "temp", "depth"]);
    assert_eq!(
        core.list("/temp").unwrap(),
        vec![".", "..", "units", "valid_range", "scale", "DATA_REPR"]
    );
    assert_eq!(
        core.list("/depth").unwrap(),
        vec![".", "..", "positive", "DATA_REPR"]
    );
}

#[test]
fn test_text_payload() {
    let dir = tempdir().unwrap();
    let path = write_dataset(dir.path(), "ocean.json", OCEAN);

    let core = namespace(&path, DataReprKind::Text, "%.2f");
    assert_eq!(read_all(&core, "/temp/DATA_REPR"), "1.50\n2.00\n-3.25\n4.00\n");
    assert_eq!(read_all(&core, "/depth/DATA_REPR"), "10.00\n20.00\n30.00\n");

    let stat = core.attributes_of("/temp/DATA_REPR").unwrap();
    assert_eq!(stat.size, "1.50\n2.00\n-3.25\n4.00\n".len() as u64);
}

#[test]
fn test_binary_payload() {
    let dir = tempdir().unwrap();
    let path = write_dataset(dir.path(), "ocean.json", OCEAN);
    let core = namespace(&path, DataReprKind::Binary, "%f");

    let bytes = core.read("/depth/DATA_REPR", 0, usize::MAX).unwrap();
    let expected: Vec<u8> = [10i16, 20, 30].iter().flat_map(|v| v.to_ne_bytes()).collect();
    assert_eq!(bytes, expected);
    assert_eq!(core.attributes_of("/temp/DATA_REPR").unwrap().size, 16);
}

#[test]
fn test_attribute_printable_forms() {
    let dir = tempdir().unwrap();
    let path = write_dataset(dir.path(), "ocean.json", OCEAN);
    let core = namespace(&path, DataReprKind::Text, "%f");

    assert_eq!(read_all(&core, "/temp/units"), "degC\n");
    assert_eq!(read_all(&core, "/temp/valid_range"), "[-5.0 40.0]\n");
    assert_eq!(read_all(&core, "/temp/scale"), "1e-05\n");
    assert_eq!(read_all(&core, "/depth/positive"), "down\n");
}

#[test]
fn test_windowed_reads() {
    let dir = tempdir().unwrap();
    let path = write_dataset(dir.path(), "ocean.json", OCEAN);
    let core = namespace(&path, DataReprKind::Text, "%f");

    assert_eq!(core.read("/temp/units", 1, 2).unwrap(), b"eg");
    assert_eq!(core.read("/temp/units", 3, 100).unwrap(), b"C\n");
    assert!(core.read("/temp/units", 1000, 10).unwrap().is_empty());
}

#[test]
fn test_stat_records() {
    let dir = tempdir().unwrap();
    let path = write_dataset(dir.path(), "ocean.json", OCEAN);
    let core = namespace(&path, DataReprKind::Text, "%f");

    let root = core.attributes_of("/").unwrap();
    assert!(root.is_dir);
    assert_eq!(root.size, NOMINAL_DIR_SIZE);
    assert_eq!(root.nlink, 1);

    let var = core.attributes_of("/temp").unwrap();
    assert!(var.is_dir);
    assert_eq!(var.mode, root.mode);

    let units = core.attributes_of("/temp/units").unwrap();
    assert!(!units.is_dir);
    assert_eq!(units.mode, BASE_FILE_MODE);
    assert_eq!(units.size, 5);
}

#[test]
fn test_missing_entries() {
    let dir = tempdir().unwrap();
    let path = write_dataset(dir.path(), "ocean.json", OCEAN);
    let core = namespace(&path, DataReprKind::Text, "%f");

    for missing in ["/salinity", "/temp/missing", "/temp/dimensions"] {
        let err = core.attributes_of(missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{missing}");
    }
    assert_eq!(
        core.read("/temp/missing", 0, 10).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn test_trash_probe_gets_baseline() {
    let dir = tempdir().unwrap();
    let path = write_dataset(dir.path(), "ocean.json", OCEAN);
    let core = namespace(&path, DataReprKind::Text, "%f");

    let stat = core.attributes_of("/.Trash-1000").unwrap();
    assert!(!stat.is_dir);
    assert_eq!(stat.size, NOMINAL_DIR_SIZE);
    assert_eq!(stat.mode, BASE_FILE_MODE);
}

#[test]
fn test_writes_are_discarded() {
    let dir = tempdir().unwrap();
    let path = write_dataset(dir.path(), "ocean.json", OCEAN);
    let core = namespace(&path, DataReprKind::Text, "%f");

    let before = read_all(&core, "/temp/units");
    let outcome = core.write("/temp/units", b"kelvin", 0).unwrap();
    assert_eq!(outcome.len(), 6);
    assert_eq!(read_all(&core, "/temp/units"), before);
}

#[test]
fn test_access_follows_backing_file() {
    let dir = tempdir().unwrap();
    let path = write_dataset(dir.path(), "ocean.json", OCEAN);
    let core = namespace(&path, DataReprKind::Text, "%f");

    assert!(core.access("/temp/DATA_REPR", libc::R_OK).is_ok());
    assert!(core.access("/temp", libc::X_OK).is_ok());
}

#[test]
fn test_invalid_description_fails_to_open() {
    let dir = tempdir().unwrap();
    let path = write_dataset(
        dir.path(),
        "bad.json",
        r#"{"variables": {"v": {"shape": [3], "data": [1, 2]}}}"#,
    );
    assert!(ncfs_dataset::open(&path).is_err());
}

#[test]
fn test_invalid_float_format_rejected_up_front() {
    assert!(DataReprKind::Text.build("%d%d").is_err());
    assert!(DataReprKind::Text.build("no conversion").is_err());
}

#[test]
fn test_adapter_walk() {
    let dir = tempdir().unwrap();
    let path = write_dataset(dir.path(), "ocean.json", OCEAN);
    let mut fs = NcFs::new(namespace(&path, DataReprKind::Text, "%.1f"));

    let entries = fs.dir_entries(ROOT_INO).unwrap();
    let names: Vec<_> = entries.iter().map(|(_, _, name)| name.clone()).collect();
    assert_eq!(names, vec![".", "..", "temp", "depth"]);

    let depth = fs.resolve(ROOT_INO, OsStr::new("depth")).unwrap();
    let data = fs.resolve(depth.ino, OsStr::new("DATA_REPR")).unwrap();
    assert_eq!(data.size, "10.0\n20.0\n30.0\n".len() as u64);

    let bytes = fs.read_bytes(data.ino, 5, 5).unwrap();
    assert_eq!(bytes, b"20.0\n");

    let missing = fs.resolve(depth.ino, OsStr::new("nope")).unwrap_err();
    assert_eq!(missing, libc::ENOENT);
}
