//! Natural-language explanations of fitted values from an external
//! text-generation service.

use tracing::{info, warn};

use crate::error::{EstimaError, EstimaResult};
use crate::regression::Degree;
use crate::session::{FitSnapshot, MleSnapshot, Session};

pub trait Explainer {
    /// Submit `prompt` and return the generated text verbatim.
    fn generate(&self, prompt: &str) -> EstimaResult<String>;
}

/// Which stored result the explanation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Regression,
    Likelihood,
}

pub fn regression_prompt(fit: &FitSnapshot) -> String {
    match (fit.degree, fit.coefficients.as_slice()) {
        (Degree::Linear, [m, b]) => format!(
            "Analyze the linear regression obtained with slope m={m:.4} and intercept b={b:.4}. \
             Explain what these values mean in the context of the relationship between hours \
             worked and the machine's production."
        ),
        (degree, coefficients) => format!(
            "Analyze the polynomial regression of degree {} obtained with coefficients {:?}. \
             Explain what these values mean in the context of the relationship between hours \
             worked and the machine's production.",
            degree.as_usize(),
            coefficients
        ),
    }
}

pub fn likelihood_prompt(mle: &MleSnapshot) -> String {
    format!(
        "A coin was tossed {} times and landed heads {} times, giving a maximum likelihood \
         estimate p̂={:.4} for the probability of heads. Explain what this value implies about \
         whether the coin is biased.",
        mle.trials, mle.successes, mle.estimate
    )
}

/// Build the prompt for `subject` from the session, call the explainer and
/// store the returned text in the session.
pub fn request_interpretation(
    session: &mut Session,
    explainer: &dyn Explainer,
    subject: Subject,
) -> EstimaResult<String> {
    if !session.model_generated {
        return Err(EstimaError::Validation(
            "no model has been generated yet; run a pipeline first".into(),
        ));
    }
    let prompt = match subject {
        Subject::Regression => session
            .last_fit
            .as_ref()
            .map(regression_prompt)
            .ok_or_else(|| {
                EstimaError::Validation("no regression coefficients were found".into())
            })?,
        Subject::Likelihood => session
            .last_estimate
            .as_ref()
            .map(likelihood_prompt)
            .ok_or_else(|| EstimaError::Validation("no likelihood estimate was found".into()))?,
    };

    info!(?subject, "requesting interpretation");
    let text = explainer.generate(&prompt).inspect_err(|e| {
        warn!("text generation failed: {e}");
    })?;
    session.record_explanation(text.clone());
    Ok(text)
}
