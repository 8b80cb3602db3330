//! Render-config files handed to the renderer process.
//!
//! Each write replaces the whole file through a sibling temp file and a
//! rename, so a reader sees either the previous record or the new one.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use estima_core::{EstimaError, EstimaResult};

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serialize `record` as JSON and overwrite `path` with it.
pub fn write_render_config<T: Serialize>(path: &Path, record: &T) -> EstimaResult<()> {
    write_json_atomic(path, record)?;
    debug!(path = %path.display(), "wrote render config");
    Ok(())
}

/// Replace `path` with the JSON form of `value` through a temp file and a
/// rename. Serialization happens before anything on disk is touched.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> EstimaResult<()> {
    let json = serde_json::to_string(value)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| EstimaError::io(parent, e))?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, json.as_bytes()).map_err(|e| EstimaError::io(&tmp, e))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(EstimaError::io(path, e));
    }
    Ok(())
}

pub fn read_render_config<T: DeserializeOwned>(path: &Path) -> EstimaResult<T> {
    let content = fs::read_to_string(path).map_err(|e| EstimaError::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use estima_core::{MleRenderConfig, MleRequest};

    #[test]
    fn test_round_trip_integers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let req = MleRequest::new(10, 7).unwrap();

        write_render_config(&path, &MleRenderConfig::from(&req)).unwrap();
        let back: MleRenderConfig = read_render_config(&path).unwrap();
        assert_eq!(back, MleRenderConfig { n: 10, x: 7 });
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{"n":10,"x":7}"#
        );
    }

    #[test]
    fn test_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "stale content that is much longer than the new record").unwrap();

        write_render_config(&path, &MleRenderConfig { n: 3, x: 1 }).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"n":3,"x":1}"#);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("config.json");
        write_render_config(&path, &MleRenderConfig { n: 1, x: 0 }).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let path = blocker.join("config.json");

        let err = write_render_config(&path, &MleRenderConfig { n: 1, x: 1 }).unwrap_err();
        assert!(matches!(err, EstimaError::Io { .. }));
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let p = temp_path(Path::new("out/config_regression.json"));
        assert_eq!(p, Path::new("out/config_regression.json.tmp"));
    }
}
