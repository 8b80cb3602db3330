mod config;
mod intake;
mod session_store;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use estima_core::explainer::{request_interpretation, Subject};
use estima_core::mle::MAX_TRIALS;
use estima_core::present;
use estima_core::regression::default_samples;
use estima_core::{
    Degree, EstimaError, MleRequest, RegressionRequest, RendererFailure, Sample, Session,
};
use estima_explain::GeminiExplainer;
use estima_render::{ManimRenderer, Pipeline};

#[derive(Parser)]
#[command(
    name = "estima",
    version,
    about = "Explore maximum likelihood and least-squares estimators with animated plots"
)]
struct Cli {
    /// Path to the session file
    #[arg(long, global = true)]
    session: Option<PathBuf>,

    /// Directory the renderer runs in (overrides the config file)
    #[arg(long, global = true)]
    workdir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate a coin's bias from tosses and render the likelihood function
    Mle {
        /// Number of tosses (n)
        #[arg(short = 'n', long, default_value = "10",
              value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_TRIALS)))]
        trials: u32,

        /// Number of heads obtained (x)
        #[arg(short = 'x', long, default_value = "7")]
        successes: u32,
    },

    /// Fit a regression model to (x, y) data and render it
    Regress {
        /// Regression model
        #[arg(short, long, default_value = "linear")]
        model: CliModel,

        /// Data table file (`x,y` per line); `-` reads stdin
        #[arg(short, long, conflicts_with = "point")]
        data: Option<PathBuf>,

        /// A single data point `x,y` (repeatable)
        #[arg(short, long, value_parser = intake::parse_point)]
        point: Vec<Sample>,
    },

    /// Ask the text-generation service to explain the last result
    Explain {
        /// Which result to explain
        #[arg(short, long, default_value = "regression")]
        subject: CliSubject,
    },

    /// Show the saved session
    Status,

    /// Forget the saved session
    Reset,

    /// Show current configuration
    Config,
}

#[derive(Clone, ValueEnum)]
enum CliModel {
    Linear,
    Quadratic,
    Cubic,
}

impl From<CliModel> for Degree {
    fn from(val: CliModel) -> Self {
        match val {
            CliModel::Linear => Degree::Linear,
            CliModel::Quadratic => Degree::Quadratic,
            CliModel::Cubic => Degree::Cubic,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum CliSubject {
    Regression,
    Likelihood,
}

impl From<CliSubject> for Subject {
    fn from(val: CliSubject) -> Self {
        match val {
            CliSubject::Regression => Subject::Regression,
            CliSubject::Likelihood => Subject::Likelihood,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load_config()?;
    if let Some(dir) = cli.workdir {
        cfg.renderer.workdir = dir;
    }
    let session_path = cli
        .session
        .or_else(|| cfg.session.path.clone())
        .unwrap_or_else(session_store::default_session_path);
    debug!(
        session = %session_path.display(),
        workdir = %cfg.renderer.workdir.display(),
        "resolved paths"
    );

    match cli.command {
        Commands::Mle { trials, successes } => cmd_mle(&cfg, &session_path, trials, successes),
        Commands::Regress { model, data, point } => {
            cmd_regress(&cfg, &session_path, model.into(), data, point)
        }
        Commands::Explain { subject } => cmd_explain(&cfg, &session_path, subject.into()),
        Commands::Status => cmd_status(&session_path),
        Commands::Reset => cmd_reset(&session_path),
        Commands::Config => cmd_config(&cfg, &session_path),
    }
}

fn build_pipeline(cfg: &config::Config) -> Result<Pipeline<ManimRenderer>> {
    let renderer = ManimRenderer::new(cfg.renderer.clone());
    Ok(Pipeline::new(renderer, cfg.config_paths())?)
}

/// Print what the renderer said when it exited cleanly but left no video.
fn surface_render_error(err: EstimaError) -> anyhow::Error {
    if let EstimaError::Renderer(RendererFailure::ArtifactMissing { output, .. }) = &err {
        eprintln!("Renderer output:");
        eprintln!("{output}");
    }
    err.into()
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

fn cmd_mle(cfg: &config::Config, session_path: &Path, trials: u32, successes: u32) -> Result<()> {
    let request = MleRequest::new(trials, successes)?;
    let pipeline = build_pipeline(cfg)?;
    let mut session = session_store::load_session(session_path)?;

    eprintln!("Generating the likelihood function plot...");
    let report = pipeline
        .run_likelihood(&mut session, request)
        .map_err(surface_render_error)?;
    session_store::save_session(session_path, &session)?;

    println!("Likelihood function plot generated successfully.");
    println!("Video: {}", report.artifact.display());
    println!();
    println!("  {}", present::LIKELIHOOD_FORMULA);
    println!("  {}", present::ESTIMATOR_FORMULA);
    println!();
    println!("{}", present::estimate_line(&report.result));
    println!();
    println!("Interpretation:");
    println!("{}", report.verdict);
    Ok(())
}

fn read_samples(data: Option<PathBuf>, points: Vec<Sample>) -> Result<Vec<Sample>> {
    match data {
        Some(path) if path.as_os_str() == "-" => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading data table from stdin")?;
            Ok(intake::parse_table(&text)?)
        }
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            Ok(intake::parse_table(&text)?)
        }
        None if !points.is_empty() => Ok(points),
        None => Ok(default_samples()),
    }
}

fn cmd_regress(
    cfg: &config::Config,
    session_path: &Path,
    degree: Degree,
    data: Option<PathBuf>,
    points: Vec<Sample>,
) -> Result<()> {
    let samples = read_samples(data, points)?;
    let request = RegressionRequest::new(samples, degree)?;
    let pipeline = build_pipeline(cfg)?;
    let mut session = session_store::load_session(session_path)?;

    eprintln!("Generating the {degree} regression model...");
    let report = pipeline
        .run_regression(&mut session, request)
        .map_err(surface_render_error)?;
    session_store::save_session(session_path, &session)?;

    println!("Regression model generated successfully.");
    println!("Video: {}", report.artifact.display());
    println!();
    if degree == Degree::Linear {
        println!("  {}", present::LINEAR_FORMULA);
    }
    println!("  {}", present::polynomial_line(&report.result));
    println!();
    println!("Coefficient values:");
    for line in present::coefficient_lines(&report.result) {
        println!("  {line}");
    }
    println!();
    println!("Residuals:");
    for line in present::residual_lines(&report.request.xs(), &report.residuals) {
        println!("  {line}");
    }
    if let [m, b] = report.result.coefficients.as_slice() {
        println!();
        println!("{}", present::slope_interpretation(*m, *b));
    }
    Ok(())
}

fn resolve_api_key(cfg: &config::Config) -> Result<String> {
    if let Some(key) = cfg.api_key() {
        return Ok(key);
    }
    let key = rpassword::prompt_password_stderr("Gemini API key: ")
        .context("reading API key")?;
    if key.trim().is_empty() {
        bail!(
            "no API key configured; set `explain.api_key` or ${}",
            cfg.explain.api_key_env
        );
    }
    Ok(key.trim().to_string())
}

fn cmd_explain(cfg: &config::Config, session_path: &Path, subject: Subject) -> Result<()> {
    let mut session = session_store::load_session(session_path)?;
    if !session.model_generated {
        bail!("no model has been generated yet; run `estima regress` or `estima mle` first");
    }
    let explainer = GeminiExplainer::new(cfg.gemini_settings(), resolve_api_key(cfg)?);

    eprintln!("Generating explanation...");
    let text = request_interpretation(&mut session, &explainer, subject)?;
    session_store::save_session(session_path, &session)?;

    println!("### Generated explanation");
    println!("{text}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Session & config
// ---------------------------------------------------------------------------

fn print_session(session: &Session) {
    println!("  model_generated = {}", session.model_generated);
    println!("  show_interpretation = {}", session.show_interpretation);
    if let Some(mle) = &session.last_estimate {
        println!(
            "  last estimate: n = {}, x = {}, p̂ = {:.4}",
            mle.trials, mle.successes, mle.estimate
        );
    }
    if let Some(fit) = &session.last_fit {
        println!("  last fit: {} {:?}", fit.degree, fit.coefficients);
    }
    if let Some(at) = session.updated_at {
        println!("  updated_at = {}", at.to_rfc3339());
    }
    if !session.value_explanation.is_empty() {
        println!();
        println!("{}", session.value_explanation);
    }
}

fn cmd_status(session_path: &Path) -> Result<()> {
    let session = session_store::load_session(session_path)?;
    println!("Session: {}", session_path.display());
    print_session(&session);
    Ok(())
}

fn cmd_reset(session_path: &Path) -> Result<()> {
    session_store::clear_session(session_path)?;
    println!("Session cleared: {}", session_path.display());
    Ok(())
}

fn cmd_config(cfg: &config::Config, session_path: &Path) -> Result<()> {
    let paths = cfg.config_paths();
    println!("Config: {}", config::show_config_path());
    println!();
    println!("[renderer]");
    println!("  program = {}", cfg.renderer.program);
    println!("  flags = {:?}", cfg.renderer.flags);
    println!("  script = {}", cfg.renderer.script.display());
    println!("  workdir = {}", cfg.renderer.workdir.display());
    println!("  media_dir = {}", cfg.renderer.media_dir.display());
    println!("  quality_dir = {}", cfg.renderer.quality_dir);
    println!();
    println!("[render_config]");
    println!("  mle_path = {}", paths.mle.display());
    println!("  regression_path = {}", paths.regression.display());
    println!();
    println!("[explain]");
    println!("  endpoint = {}", cfg.explain.endpoint);
    println!("  model = {}", cfg.explain.model);
    println!(
        "  api_key = {}",
        if cfg.api_key().is_some() {
            "(set)"
        } else {
            "(not set)"
        }
    );
    println!("  api_key_env = {}", cfg.explain.api_key_env);
    println!();
    println!("[session]");
    println!("  path = {}", session_path.display());
    Ok(())
}
