//! Maximum likelihood estimate of a coin's bias under a binomial model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EstimaError, EstimaResult};

/// Largest number of trials accepted at the intake boundary.
pub const MAX_TRIALS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MleRequest {
    pub trials: u32,
    pub successes: u32,
}

impl MleRequest {
    /// Validate intake: `1 <= trials <= MAX_TRIALS` and `successes <= trials`.
    pub fn new(trials: u32, successes: u32) -> EstimaResult<Self> {
        if trials == 0 || trials > MAX_TRIALS {
            return Err(EstimaError::Validation(format!(
                "number of trials must be between 1 and {MAX_TRIALS}, got {trials}"
            )));
        }
        if successes > trials {
            return Err(EstimaError::Validation(format!(
                "successes ({successes}) cannot exceed trials ({trials})"
            )));
        }
        Ok(Self { trials, successes })
    }

    pub fn estimate(&self) -> EstimaResult<MleResult> {
        estimate(self.trials, self.successes).map(|estimate| MleResult { estimate })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MleResult {
    pub estimate: f64,
}

impl MleResult {
    pub fn verdict(&self) -> BiasVerdict {
        BiasVerdict::from_estimate(self.estimate)
    }
}

/// `p̂ = successes / trials`.
pub fn estimate(trials: u32, successes: u32) -> EstimaResult<f64> {
    if trials == 0 {
        return Err(EstimaError::DivisionByZero);
    }
    Ok(f64::from(successes) / f64::from(trials))
}

/// Log-likelihood `x ln p + (n - x) ln(1 - p)` of the binomial model,
/// without the constant binomial coefficient.
pub fn log_likelihood(trials: u32, successes: u32, p: f64) -> f64 {
    let x = f64::from(successes);
    let n = f64::from(trials);
    let term = |count: f64, prob: f64| if count == 0.0 { 0.0 } else { count * prob.ln() };
    term(x, p) + term(n - x, 1.0 - p)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiasVerdict {
    Heads,
    Tails,
    Balanced,
    Indeterminate,
}

impl BiasVerdict {
    /// Checked in order: `> 0.6`, then `< 0.4`, then `[0.4, 0.6]`.
    /// Both 0.4 and 0.6 land on `Balanced`. NaN matches nothing.
    pub fn from_estimate(p: f64) -> Self {
        if p > 0.6 {
            Self::Heads
        } else if p < 0.4 {
            Self::Tails
        } else if (0.4..=0.6).contains(&p) {
            Self::Balanced
        } else {
            Self::Indeterminate
        }
    }
}

impl fmt::Display for BiasVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heads => write!(f, "The coin is strongly biased toward heads."),
            Self::Tails => write!(f, "The coin is strongly biased toward tails."),
            Self::Balanced => write!(f, "The coin is balanced and not significantly biased."),
            Self::Indeterminate => write!(
                f,
                "No clear interpretation could be determined for this value of p."
            ),
        }
    }
}
