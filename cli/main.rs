//! glyph: train and evaluate a glyph classifier from image files.
//!
//! Usage:
//!   glyph train <model> [--spec topology.json] <image>...
//!   glyph eval  <model> [--spec topology.json] <image>...
//!
//! Each image is labelled by the first character of its file name. The model
//! file holds only weights and biases; pass the same `--spec` to every
//! command that touches it (the built-in default is a 20x20 grid, a..z).
//!
//! Set `RUST_LOG=info` (or `debug` for per-step training errors) for progress.

mod corpus;
mod imaging;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use glyph_nn::{Network, TopologySpec};
use log::{info, warn};

use crate::imaging::ImageSource;

const USAGE: &str = "usage: glyph <train|eval> <model> [--spec topology.json] <image>...";

enum Command {
    Train,
    Eval,
}

struct Invocation {
    command: Command,
    model: PathBuf,
    spec: TopologySpec,
    images: Vec<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match parse_args(&args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let outcome = match invocation.command {
        Command::Train => train(&invocation),
        Command::Eval => eval(&invocation),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> Result<Invocation, Box<dyn Error>> {
    let mut rest = args.iter();
    let command = match rest.next().map(String::as_str) {
        Some("train") => Command::Train,
        Some("eval") => Command::Eval,
        Some(other) => return Err(format!("unknown command `{other}`").into()),
        None => return Err("missing command".into()),
    };
    let model = PathBuf::from(rest.next().ok_or("missing model path")?);

    let mut spec = None;
    let mut images = Vec::new();
    while let Some(arg) = rest.next() {
        if arg == "--spec" {
            let path = rest.next().ok_or("--spec needs a file")?;
            spec = Some(TopologySpec::load_json(path)?);
        } else {
            images.push(PathBuf::from(arg));
        }
    }
    if images.is_empty() {
        return Err("no images given".into());
    }

    Ok(Invocation {
        command,
        model,
        spec: spec.unwrap_or_default(),
        images,
    })
}

fn train(invocation: &Invocation) -> Result<(), Box<dyn Error>> {
    let spec = invocation.spec.clone();
    let mut network = if invocation.model.exists() {
        Network::load(&invocation.model, spec)?
    } else {
        info!("{} not found, starting from a fresh network", invocation.model.display());
        Network::build(spec)?
    };
    let source = ImageSource::for_spec(network.spec())?;

    for path in &invocation.images {
        let Some(class) = class_of(network.spec(), path) else {
            warn!("skipping {}: no class for its label", path.display());
            continue;
        };
        let sample = source.sample(path)?;
        let report = network.train_report(&sample, class)?;
        info!(
            "{}: {} steps, squared error {:.6}{}",
            path.display(),
            report.steps,
            report.final_error,
            if report.converged { " (converged)" } else { "" }
        );
    }

    network.save(&invocation.model)?;
    Ok(())
}

fn eval(invocation: &Invocation) -> Result<(), Box<dyn Error>> {
    let mut network = Network::load(&invocation.model, invocation.spec.clone())?;
    let source = ImageSource::for_spec(network.spec())?;

    let mut failed = 0usize;
    let mut all = 0usize;
    for path in &invocation.images {
        let Some(class) = class_of(network.spec(), path) else {
            warn!("skipping {}: no class for its label", path.display());
            continue;
        };
        let sample = source.sample(path)?;
        let predicted = network.classify(&sample)?;
        all += 1;
        if predicted != class {
            failed += 1;
            info!(
                "{}: expected {}, got {}",
                path.display(),
                network.spec().label(class),
                network.spec().label(predicted)
            );
        }
    }

    let rate = if all == 0 { 0.0 } else { failed as f64 / all as f64 };
    println!("{failed}/{all}={rate}");
    Ok(())
}

fn class_of(spec: &TopologySpec, path: &Path) -> Option<usize> {
    let label = corpus::label_of(path)?;
    spec.class_of(&label)
}
