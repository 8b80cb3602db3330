//! The two analysis pipelines: compute, write the render config, run the
//! renderer, verify the artifact, then update the session.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use estima_core::{
    BiasVerdict, EstimaError, EstimaResult, MleRenderConfig, MleRequest, MleResult,
    RegressionRenderConfig, RegressionRequest, RegressionResult, RenderOutcome, Renderer,
    RendererFailure, Scene, Session,
};

use crate::config_file::write_render_config;

/// Where each pipeline writes its render config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub mle: PathBuf,
    pub regression: PathBuf,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self {
            mle: PathBuf::from("config.json"),
            regression: PathBuf::from("config_regression.json"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MleReport {
    pub request: MleRequest,
    pub result: MleResult,
    pub verdict: BiasVerdict,
    pub artifact: PathBuf,
    pub renderer_output: String,
}

#[derive(Debug, Clone)]
pub struct RegressionReport {
    pub request: RegressionRequest,
    pub result: RegressionResult,
    pub residuals: Vec<f64>,
    pub artifact: PathBuf,
    pub renderer_output: String,
}

pub struct Pipeline<R> {
    renderer: R,
    paths: ConfigPaths,
}

impl<R: Renderer> Pipeline<R> {
    pub fn new(renderer: R, paths: ConfigPaths) -> EstimaResult<Self> {
        if paths.mle == paths.regression {
            return Err(EstimaError::Validation(format!(
                "likelihood and regression configs must use different files, both are {}",
                paths.mle.display()
            )));
        }
        Ok(Self { renderer, paths })
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn run_likelihood(
        &self,
        session: &mut Session,
        request: MleRequest,
    ) -> EstimaResult<MleReport> {
        let result = request.estimate()?;
        write_render_config(&self.paths.mle, &MleRenderConfig::from(&request))?;

        let outcome = self.invoke(Scene::LikelihoodFunction, &self.paths.mle)?;
        session.record_estimate(&request, &result);
        info!(
            trials = request.trials,
            successes = request.successes,
            estimate = result.estimate,
            "likelihood pipeline finished"
        );

        Ok(MleReport {
            verdict: result.verdict(),
            request,
            result,
            artifact: outcome.artifact,
            renderer_output: outcome.output,
        })
    }

    pub fn run_regression(
        &self,
        session: &mut Session,
        request: RegressionRequest,
    ) -> EstimaResult<RegressionReport> {
        let result = request.fit()?;
        let record = RegressionRenderConfig::new(&request, &result);
        write_render_config(&self.paths.regression, &record)?;

        let outcome = self.invoke(Scene::RegressionFunction, &self.paths.regression)?;
        session.record_fit(request.degree, &result);
        info!(
            degree = request.degree.as_usize(),
            samples = request.samples.len(),
            "regression pipeline finished"
        );

        Ok(RegressionReport {
            residuals: result.residuals(&request.samples),
            request,
            result,
            artifact: outcome.artifact,
            renderer_output: outcome.output,
        })
    }

    /// A zero exit is not enough: the artifact has to be on disk as well,
    /// and written by this run.
    fn invoke(&self, scene: Scene, config_path: &Path) -> EstimaResult<RenderOutcome> {
        remove_stale_artifact(&self.renderer.artifact_path(scene))?;
        let outcome = self.renderer.render(scene, config_path)?;
        if !outcome.success {
            warn!(%scene, "renderer exited unsuccessfully");
            return Err(EstimaError::Renderer(RendererFailure::ProcessFailed {
                diagnostic: outcome.output,
            }));
        }
        if !outcome.artifact.is_file() {
            warn!(%scene, artifact = %outcome.artifact.display(), "renderer produced no artifact");
            return Err(EstimaError::Renderer(RendererFailure::ArtifactMissing {
                path: outcome.artifact,
                output: outcome.output,
            }));
        }
        Ok(outcome)
    }
}

/// Drop a video left over from an earlier run so it cannot pass for this one.
fn remove_stale_artifact(path: &Path) -> EstimaResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed previous artifact");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(EstimaError::io(path, e)),
    }
}
