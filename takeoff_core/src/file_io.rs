//! # File I/O Module
//!
//! Session files with safety features:
//! - **Atomic saves**: Write to .tmp, sync, rename to prevent corruption
//! - **Version validation**: Reject documents from another schema version
//! - **Lenient sections**: Missing or unreadable sections fall back to defaults
//!
//! ## File Format
//!
//! Sessions are saved as `.ashproj.json` files:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "saved_utc": "2026-01-01T12:00:00Z",
//!   "data": { "breeze_block": {}, "sweet_sand": {}, "concrete": {},
//!             "land_prep": {}, "manpower": {}, "equipment": {} }
//! }
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use takeoff_core::file_io::{load_session, save_session};
//! use takeoff_core::workbook::Workbook;
//! use std::path::Path;
//!
//! let workbook = Workbook::new();
//! save_session(&workbook, Path::new("site.ashproj.json"))?;
//!
//! let restored = load_session(Path::new("site.ashproj.json"))?;
//! # Ok::<(), takeoff_core::errors::CalcError>(())
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::errors::{CalcError, CalcResult};
use crate::workbook::Workbook;

/// Current session schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Conventional session file extension
pub const SESSION_EXTENSION: &str = "ashproj.json";

/// On-disk session document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDocument {
    pub schema_version: u32,
    pub saved_utc: DateTime<Utc>,
    /// One object per calculator, keyed by section name
    pub data: Map<String, Value>,
}

impl SessionDocument {
    /// Snapshot the workbook's inputs, stamped now.
    pub fn from_workbook(workbook: &Workbook) -> CalcResult<Self> {
        Ok(SessionDocument {
            schema_version: SCHEMA_VERSION,
            saved_utc: Utc::now(),
            data: workbook.export_data()?,
        })
    }
}

/// Append the session extension unless the path already carries it.
///
/// ```rust
/// use takeoff_core::file_io::with_session_extension;
/// use std::path::Path;
///
/// assert_eq!(with_session_extension(Path::new("site")), Path::new("site.ashproj.json"));
/// assert_eq!(
///     with_session_extension(Path::new("site.ashproj.json")),
///     Path::new("site.ashproj.json")
/// );
/// ```
pub fn with_session_extension(path: &Path) -> PathBuf {
    let name = path.to_string_lossy();
    if name.ends_with(&format!(".{SESSION_EXTENSION}")) {
        path.to_path_buf()
    } else {
        PathBuf::from(format!("{name}.{SESSION_EXTENSION}"))
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Save the workbook's inputs with atomic write semantics.
///
/// The save process:
/// 1. Serialize every section to JSON
/// 2. Write to a temporary file next to the target
/// 3. Sync to disk (fsync)
/// 4. Rename over the target
///
/// Parent directories are created as needed.
pub fn save_session(workbook: &Workbook, path: &Path) -> CalcResult<()> {
    let document = SessionDocument::from_workbook(workbook)?;
    let json = serde_json::to_string_pretty(&document)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            CalcError::file_error("create directory", parent.display().to_string(), e.to_string())
        })?;
    }

    let tmp_path = tmp_path_for(path);
    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    drop(tmp_file);

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    info!(path = %path.display(), "session saved");
    Ok(())
}

/// Load a session file into a fresh, recomputed workbook.
///
/// # Returns
///
/// * `Ok(Workbook)` - Every section restored (or defaulted) and recomputed
/// * `Err(CalcError::VersionMismatch)` - Missing or unsupported `schema_version`
/// * `Err(CalcError::MalformedDocument)` - Root or `data` is not an object
/// * `Err(CalcError::SerializationError)` - Not JSON at all
/// * `Err(CalcError::FileError)` - I/O error
pub fn load_session(path: &Path) -> CalcResult<Workbook> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;

    let root: Value = serde_json::from_str(&contents).map_err(|e| {
        CalcError::serialization(format!("Invalid JSON in {}: {}", path.display(), e))
    })?;

    let data = parse_document(&root)?;
    let workbook = Workbook::from_data(data);
    info!(path = %path.display(), "session loaded");
    Ok(workbook)
}

/// Check the document envelope and return its `data` object.
pub fn parse_document(root: &Value) -> CalcResult<&Map<String, Value>> {
    let root = root
        .as_object()
        .ok_or_else(|| CalcError::malformed("root is not an object"))?;

    let version = root.get("schema_version").and_then(Value::as_u64);
    if version != Some(u64::from(SCHEMA_VERSION)) {
        return Err(CalcError::VersionMismatch {
            file_version: root
                .get("schema_version")
                .map(Value::to_string)
                .unwrap_or_else(|| "missing".to_string()),
            expected_version: SCHEMA_VERSION.to_string(),
        });
    }

    match root.get("data") {
        Some(Value::Object(data)) => Ok(data),
        Some(_) => Err(CalcError::malformed("'data' is not an object")),
        None => Err(CalcError::malformed("'data' is missing")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::Component;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("site.ashproj.json");

        let mut workbook = Workbook::new();
        workbook.masonry.input_mut().wall_length = 10.0;
        workbook.masonry.input_mut().wall_height = 3.0;
        workbook.labor.input_mut().trade_mut(0).unwrap().workers = 10;
        save_session(&workbook, &path).unwrap();

        let loaded = load_session(&path).unwrap();
        assert_eq!(loaded.masonry.input(), workbook.masonry.input());
        assert_eq!(loaded.labor.input(), workbook.labor.input());
        // recomputed on load
        assert_eq!(loaded.masonry.output().unwrap().blocks_required, 375);
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/site.ashproj.json");

        save_session(&Workbook::new(), &path).unwrap();

        assert!(path.exists());
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn test_saved_document_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shape.ashproj.json");
        save_session(&Workbook::new(), &path).unwrap();

        let root: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(root["schema_version"], json!(1));
        assert!(root["saved_utc"].as_str().unwrap().parse::<DateTime<Utc>>().is_ok());
        for component in Component::ALL {
            assert!(root["data"][component.section_key()].is_object());
        }
    }

    #[test]
    fn test_version_mismatch() {
        let err = parse_document(&json!({"schema_version": 2, "data": {}})).unwrap_err();
        assert!(matches!(err, CalcError::VersionMismatch { .. }));

        let err = parse_document(&json!({"data": {}})).unwrap_err();
        match err {
            CalcError::VersionMismatch { file_version, .. } => assert_eq!(file_version, "missing"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            parse_document(&json!([1, 2, 3])).unwrap_err(),
            CalcError::MalformedDocument { .. }
        ));
        assert!(matches!(
            parse_document(&json!({"schema_version": 1})).unwrap_err(),
            CalcError::MalformedDocument { .. }
        ));
        assert!(matches!(
            parse_document(&json!({"schema_version": 1, "data": "nope"})).unwrap_err(),
            CalcError::MalformedDocument { .. }
        ));
    }

    #[test]
    fn test_load_errors_propagate() {
        let dir = tempdir().unwrap();

        let missing = dir.path().join("absent.ashproj.json");
        assert!(matches!(load_session(&missing).unwrap_err(), CalcError::FileError { .. }));

        let garbage = dir.path().join("garbage.ashproj.json");
        fs::write(&garbage, "{ not json").unwrap();
        assert!(matches!(
            load_session(&garbage).unwrap_err(),
            CalcError::SerializationError { .. }
        ));
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.ashproj.json");
        fs::write(
            &path,
            r#"{"schema_version": 1, "saved_utc": "2026-01-01T00:00:00Z",
                "data": {"manpower": {"days": 10}, "concrete": 42}}"#,
        )
        .unwrap();

        let loaded = load_session(&path).unwrap();
        assert_eq!(loaded.labor.input().days, 10);
        assert_eq!(loaded.labor.input().hours_normal, 8.0);
        assert_eq!(loaded.concrete.input(), &crate::calculations::ConcreteInput::default());
    }

    #[test]
    fn test_extension_helper() {
        assert_eq!(
            with_session_extension(Path::new("/tmp/job")),
            PathBuf::from("/tmp/job.ashproj.json")
        );
    }
}
