use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EstimaResult;
use crate::mle::MleRequest;
use crate::regression::{RegressionRequest, RegressionResult};

/// Which predefined animation the renderer should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scene {
    LikelihoodFunction,
    RegressionFunction,
}

impl Scene {
    pub fn name(self) -> &'static str {
        match self {
            Self::LikelihoodFunction => "LikelihoodFunction",
            Self::RegressionFunction => "RegressionFunction",
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// On-disk records read by the renderer
// ---------------------------------------------------------------------------

/// `{"n": <int>, "x": <int>}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MleRenderConfig {
    pub n: u32,
    pub x: u32,
}

impl From<&MleRequest> for MleRenderConfig {
    fn from(req: &MleRequest) -> Self {
        Self {
            n: req.trials,
            x: req.successes,
        }
    }
}

/// `{"X": [..], "Y": [..], "grado": <int>, "coeficientes": [..]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionRenderConfig {
    #[serde(rename = "X")]
    pub x: Vec<f64>,
    #[serde(rename = "Y")]
    pub y: Vec<f64>,
    #[serde(rename = "grado")]
    pub degree: usize,
    #[serde(rename = "coeficientes")]
    pub coefficients: Vec<f64>,
}

impl RegressionRenderConfig {
    pub fn new(request: &RegressionRequest, result: &RegressionResult) -> Self {
        Self {
            x: request.xs(),
            y: request.ys(),
            degree: request.degree.as_usize(),
            coefficients: result.coefficients.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer seam
// ---------------------------------------------------------------------------

/// What a single renderer run reported. `success` reflects the exit status
/// only; whether `artifact` actually exists is for the caller to check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    pub success: bool,
    pub output: String,
    pub artifact: PathBuf,
}

pub trait Renderer {
    /// Where a successful run for `scene` leaves its video.
    fn artifact_path(&self, scene: Scene) -> PathBuf;

    /// Run the renderer for `scene` to completion. Blocks; there is no timeout.
    fn render(&self, scene: Scene, config_path: &Path) -> EstimaResult<RenderOutcome>;
}
