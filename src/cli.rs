use std::io::{self, BufRead, BufReader, Write};
use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::alignment::{AlignmentController, AlignmentResult, AlignmentSnapshot, Command, Progress};
use crate::input::AlignmentInput;
use crate::render::Renderer;
use crate::settings::SettingsStore;
use crate::{log_info, log_warn};

const ENABLE_LOGS: bool = true;

/// Manually align sensor recordings against a reference stream.
///
/// Commands are read one per line: z/x zoom, left/right look, shift-left/right
/// and ctrl-shift-left/right shift, up/down scale, a auto-rescale, f/s/d flags,
/// `comment <text>`, delete resets the view, enter advances, backspace goes back.
#[derive(Debug, Parser)]
#[command(name = "aligner", version)]
pub struct Args {
    /// JSON file with the reference and candidate recordings
    pub input: PathBuf,

    /// Fixed amplitude scale for the first stream (auto-fit when omitted)
    #[arg(long)]
    pub scale: Option<f64>,

    /// Settings file with step factors (defaults when absent)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Read commands from this file instead of stdin
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Write the result JSON here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub fn run_cli<R: Renderer>(args: Args, renderer: R) -> Result<AlignmentResult> {
    let settings = match &args.settings {
        Some(path) => SettingsStore::new(path.clone())?.settings(),
        None => Default::default(),
    };

    let (reference, candidates) = AlignmentInput::load(&args.input)?.into_raw()?;
    let mut controller = AlignmentController::from_raw(&reference, &candidates, renderer, settings)?
        .with_initial_scale(args.scale);

    let commands: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(
            fs::File::open(path)
                .with_context(|| format!("Failed to open command script {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    controller.begin();
    report(&controller.snapshot());
    drive(&mut controller, commands)?;

    let result = controller.finish();
    write_result(&result, args.output.as_ref())?;
    Ok(result)
}

/// Feed command lines to the controller until it terminates or input ends.
pub fn drive<R: Renderer, B: BufRead>(controller: &mut AlignmentController<R>, commands: B) -> Result<()> {
    for line in commands.lines() {
        let line = line.context("Failed to read command")?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                log_warn!("{}", err);
                continue;
            }
        };

        if controller.apply(&command) == Progress::Terminated {
            return Ok(());
        }
        report(&controller.snapshot());
    }

    log_info!("Command input ended at {:?}", controller.progress());
    Ok(())
}

fn report(snapshot: &AlignmentSnapshot) {
    match (&snapshot.progress, &snapshot.stream, &snapshot.working) {
        (Progress::Aligning(index), Some(stream), Some(working)) => {
            eprintln!(
                "[{}/{}] {}: offset {:.4} s, scale {:.3}, view [{:.2}, {:.2}] s",
                index + 1,
                snapshot.total,
                stream,
                working.offset_seconds,
                working.scale,
                working.viewport.start(),
                working.viewport.end()
            );
        }
        (Progress::Done, _, _) => {
            eprintln!("Alignment complete. Press ENTER to close, or BACKSPACE to go back");
        }
        _ => {}
    }
}

fn write_result(result: &AlignmentResult, output: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    match output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("Failed to write result to {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json)?;
            Ok(())
        }
    }
}
