//! Persistence of the session between CLI invocations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use estima_core::Session;
use estima_render::write_json_atomic;

pub fn default_session_path() -> PathBuf {
    directories::ProjectDirs::from("dev", "estima", "estima")
        .map(|dirs| dirs.data_dir().join("session.json"))
        .unwrap_or_else(|| PathBuf::from("session.json"))
}

/// Load the session, or a blank one if none has been saved yet.
pub fn load_session(path: &Path) -> Result<Session> {
    if !path.exists() {
        return Ok(Session::default());
    }
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Saved through a temp file and a rename, so an interrupted save leaves the
/// previous session readable.
pub fn save_session(path: &Path, session: &Session) -> Result<()> {
    write_json_atomic(path, session)
        .with_context(|| format!("saving session to {}", path.display()))
}

pub fn clear_session(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("cannot remove {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estima_core::{Degree, RegressionResult};

    #[test]
    fn test_missing_file_gives_blank_session() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_session(&dir.path().join("session.json")).unwrap();
        assert_eq!(s, Session::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("session.json");
        let mut s = Session::default();
        s.record_fit(
            Degree::Cubic,
            &RegressionResult {
                coefficients: vec![0.25, -1.5, 4.0, 2.0],
            },
        );

        save_session(&path, &s).unwrap();
        assert_eq!(load_session(&path).unwrap(), s);

        clear_session(&path).unwrap();
        assert!(!path.exists());
        clear_session(&path).unwrap();
    }

    #[test]
    fn test_save_replaces_previous_session_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let long = format!("{{\"value_explanation\": \"{}\"}}", "x".repeat(4096));
        std::fs::write(&path, long).unwrap();

        let s = Session {
            model_generated: true,
            ..Session::default()
        };
        save_session(&path, &s).unwrap();
        assert_eq!(load_session(&path).unwrap(), s);
        assert!(!dir.path().join("session.json.tmp").exists());
    }

    #[test]
    fn test_save_into_unwritable_location_keeps_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let err = save_session(&blocker.join("session.json"), &Session::default()).unwrap_err();
        assert!(err.to_string().contains("saving session"));
    }

    #[test]
    fn test_corrupt_session_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_session(&path).is_err());
    }
}
