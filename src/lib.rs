pub mod alignment;
pub mod cli;
pub mod error;
pub mod input;
pub mod render;
pub mod series;
pub mod settings;
mod utils;

pub use alignment::{AlignmentController, AlignmentResult, AlignmentSession, Command, Progress};
pub use error::{AlignError, Result};
pub use render::{LogRenderer, PlotLine, Renderer};
pub use series::{RawSeries, TimeAxis, TimeSeries};
pub use settings::{AlignerSettings, SettingsStore};

use clap::Parser;

/// Align `candidates` against `reference` with a caller-supplied renderer and
/// command source, returning the committed offsets once the operator is done.
pub fn manual_align<R, I>(
    reference: &RawSeries,
    candidates: &[RawSeries],
    scale: Option<f64>,
    renderer: R,
    commands: I,
) -> Result<AlignmentResult>
where
    R: Renderer,
    I: IntoIterator<Item = Command>,
{
    let mut controller =
        AlignmentController::from_raw(reference, candidates, renderer, AlignerSettings::default())?
            .with_initial_scale(scale);
    controller.begin();
    for command in commands {
        if controller.apply(&command) == Progress::Terminated {
            break;
        }
    }
    Ok(controller.finish())
}

pub fn run() {
    let debug_mode = std::env::var("ALIGNER_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    // Initialize logging (RUST_LOG still overrides the default level)
    env_logger::Builder::new()
        .filter_level(if debug_mode {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .init();

    let args = cli::Args::parse();
    log::info!("Loading recordings from {}", args.input.display());

    if let Err(err) = cli::run_cli(args, LogRenderer::new()) {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}
