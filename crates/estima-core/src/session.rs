use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mle::{MleRequest, MleResult};
use crate::regression::{Degree, RegressionResult};

/// Per-user state carried between pipeline runs. Pipelines only touch it
/// after a run has fully succeeded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub model_generated: bool,
    pub show_interpretation: bool,
    pub value_explanation: String,
    pub last_estimate: Option<MleSnapshot>,
    pub last_fit: Option<FitSnapshot>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MleSnapshot {
    pub trials: u32,
    pub successes: u32,
    pub estimate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSnapshot {
    pub degree: Degree,
    pub coefficients: Vec<f64>,
}

impl FitSnapshot {
    pub fn result(&self) -> RegressionResult {
        RegressionResult {
            coefficients: self.coefficients.clone(),
        }
    }
}

impl Session {
    pub fn record_estimate(&mut self, request: &MleRequest, result: &MleResult) {
        self.model_generated = true;
        self.show_interpretation = false;
        self.last_estimate = Some(MleSnapshot {
            trials: request.trials,
            successes: request.successes,
            estimate: result.estimate,
        });
        self.touch();
    }

    pub fn record_fit(&mut self, degree: Degree, result: &RegressionResult) {
        self.model_generated = true;
        self.show_interpretation = false;
        self.last_fit = Some(FitSnapshot {
            degree,
            coefficients: result.coefficients.clone(),
        });
        self.touch();
    }

    pub fn record_explanation(&mut self, text: String) {
        self.show_interpretation = true;
        self.value_explanation = text;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}
