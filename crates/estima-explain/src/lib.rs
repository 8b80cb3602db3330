pub mod gemini;

pub use gemini::{GeminiExplainer, GeminiSettings};
