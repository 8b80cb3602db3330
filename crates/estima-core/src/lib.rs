pub mod error;
pub mod explainer;
pub mod mle;
pub mod present;
pub mod regression;
pub mod render;
pub mod session;

pub use error::{EstimaError, EstimaResult, RendererFailure};
pub use explainer::{request_interpretation, Explainer, Subject};
pub use mle::{BiasVerdict, MleRequest, MleResult};
pub use regression::{Degree, RegressionRequest, RegressionResult, Sample};
pub use render::{MleRenderConfig, RegressionRenderConfig, RenderOutcome, Renderer, Scene};
pub use session::{FitSnapshot, MleSnapshot, Session};
