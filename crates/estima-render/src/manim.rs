//! Subprocess renderer driving `manim`.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use estima_core::{EstimaError, EstimaResult, RenderOutcome, Renderer, Scene};

/// Environment variable through which the scene script can find its config.
pub const CONFIG_ENV: &str = "ESTIMA_RENDER_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    pub program: String,
    /// Preview + high quality.
    pub flags: Vec<String>,
    pub script: PathBuf,
    pub workdir: PathBuf,
    pub media_dir: PathBuf,
    pub quality_dir: String,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            program: "manim".into(),
            flags: vec!["-pqh".into()],
            script: PathBuf::from("manim.py"),
            workdir: PathBuf::from("."),
            media_dir: PathBuf::from("media"),
            quality_dir: "1080p60".into(),
        }
    }
}

pub struct ManimRenderer {
    settings: RendererSettings,
}

impl ManimRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }
}

impl Renderer for ManimRenderer {
    /// `<workdir>/<media>/videos/<script stem>/<quality>/<Scene>.mp4`
    fn artifact_path(&self, scene: Scene) -> PathBuf {
        let stem = self
            .settings
            .script
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.settings
            .workdir
            .join(&self.settings.media_dir)
            .join("videos")
            .join(stem)
            .join(&self.settings.quality_dir)
            .join(format!("{}.mp4", scene.name()))
    }

    fn render(&self, scene: Scene, config_path: &Path) -> EstimaResult<RenderOutcome> {
        let artifact = self.artifact_path(scene);
        if let Some(dir) = artifact.parent() {
            std::fs::create_dir_all(dir).map_err(|e| EstimaError::io(dir, e))?;
        }
        // The child runs in `workdir`, so a path relative to our cwd would
        // resolve against the wrong directory there.
        let config_path =
            std::path::absolute(config_path).map_err(|e| EstimaError::io(config_path, e))?;

        let mut cmd = Command::new(&self.settings.program);
        cmd.args(&self.settings.flags)
            .arg(&self.settings.script)
            .arg(scene.name())
            .env(CONFIG_ENV, &config_path)
            .current_dir(&self.settings.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!(?cmd, "spawning renderer");

        let output = match cmd.output() {
            Ok(o) => o,
            Err(e) => {
                return Ok(RenderOutcome {
                    success: false,
                    output: format!("failed to spawn '{}': {e}", self.settings.program),
                    artifact,
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        info!(%scene, status = %output.status, "renderer finished");

        let text = if output.status.success() {
            stdout
        } else if stderr.trim().is_empty() {
            format!("{} exited with {}\n{stdout}", self.settings.program, output.status)
        } else {
            stderr
        };

        Ok(RenderOutcome {
            success: output.status.success(),
            output: text,
            artifact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_in(dir: &Path, program: &str, flags: &[&str]) -> RendererSettings {
        RendererSettings {
            program: program.into(),
            flags: flags.iter().map(|f| f.to_string()).collect(),
            workdir: dir.to_path_buf(),
            ..RendererSettings::default()
        }
    }

    #[test]
    fn test_artifact_path_layout() {
        let r = ManimRenderer::new(RendererSettings::default());
        assert_eq!(
            r.artifact_path(Scene::LikelihoodFunction),
            Path::new("./media/videos/manim/1080p60/LikelihoodFunction.mp4")
        );
        assert_eq!(
            r.artifact_path(Scene::RegressionFunction),
            Path::new("./media/videos/manim/1080p60/RegressionFunction.mp4")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_workdir_sees_same_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("out").join("config.json");
        std::fs::create_dir_all(config.parent().unwrap()).unwrap();
        std::fs::write(&config, r#"{"n":10,"x":7}"#).unwrap();

        let r = ManimRenderer::new(settings_in(
            &dir.path().join("out"),
            "sh",
            &["-c", "cat \"$ESTIMA_RENDER_CONFIG\""],
        ));
        let out = r.render(Scene::LikelihoodFunction, &config).unwrap();
        assert!(out.success, "{}", out.output);
        assert_eq!(out.output, r#"{"n":10,"x":7}"#);
    }

    #[test]
    fn test_missing_program_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let r = ManimRenderer::new(settings_in(dir.path(), "estima-no-such-renderer", &[]));
        let out = r
            .render(Scene::LikelihoodFunction, Path::new("config.json"))
            .unwrap();
        assert!(!out.success);
        assert!(out.output.contains("failed to spawn"));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_captures_stderr() {
        let dir = tempfile::tempdir().unwrap();
        // sh -c <script> <$0> <$1>: the script path and scene land in $0/$1.
        let r = ManimRenderer::new(settings_in(
            dir.path(),
            "sh",
            &["-c", "echo \"scene $1 exploded\" >&2; exit 3"],
        ));
        let out = r
            .render(Scene::RegressionFunction, Path::new("config_regression.json"))
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.output.trim(), "scene RegressionFunction exploded");
    }

    #[cfg(unix)]
    #[test]
    fn test_success_creates_artifact_dir_and_passes_config() {
        let dir = tempfile::tempdir().unwrap();
        let r = ManimRenderer::new(settings_in(
            dir.path(),
            "sh",
            &["-c", "echo \"$ESTIMA_RENDER_CONFIG\""],
        ));
        let out = r
            .render(Scene::LikelihoodFunction, Path::new("config.json"))
            .unwrap();
        assert!(out.success);
        let passed = PathBuf::from(out.output.trim());
        assert!(passed.is_absolute(), "{}", passed.display());
        assert_eq!(passed, std::env::current_dir().unwrap().join("config.json"));
        assert!(out.artifact.parent().unwrap().is_dir());
        assert!(!out.artifact.exists());
    }
}
