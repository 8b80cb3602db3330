pub mod config_file;
pub mod manim;
pub mod pipeline;

pub use config_file::{read_render_config, write_json_atomic, write_render_config};
pub use manim::{ManimRenderer, RendererSettings};
pub use pipeline::{ConfigPaths, MleReport, Pipeline, RegressionReport};
