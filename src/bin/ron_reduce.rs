//! Reduce a stream of frames: one reduced frame per object.

use std::fs;
use std::io::Read;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ronframe::rdt::reducer_for;
use ronframe::ron::Batch;
use ronframe::ron::Frame;
use ronframe::ron::Op;
use ronframe::ron::Uuid;
use ronframe::stream;
use tracing::debug;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ron-reduce")]
#[command(about = "Merge frames of the same object into one frame per object", long_about = None)]
struct Cli {
    /// Frame stream to read; standard input when absent
    file: Option<PathBuf>,

    /// Frames carry a direction comment that is stripped before reducing
    #[arg(short, long)]
    annotated: bool,

    /// Write an error op for objects that fail to reduce instead of stopping
    #[arg(short, long)]
    keep_going: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let input = read_input(&cli)?;

    let frames: Vec<Frame> = if cli.annotated {
        stream::read_annotated(&input)
            .context("reading annotated frames")?
            .iter()
            .map(|raw| raw.frame())
            .collect()
    } else {
        stream::split(&input)
    };
    debug!(frames = frames.len(), "read frames");

    let mut reduced = Vec::new();
    for batch in stream::group_by_object(frames) {
        let kind = kind_of(&batch);
        let result = reducer_for(kind).and_then(|reducer| reducer.reduce(&batch));
        match result {
            Ok(frame) => reduced.push(frame),
            Err(error) if cli.keep_going => {
                warn!(%kind, %error, "object does not reduce");
                let mut frame = Frame::new();
                frame.push(&Op::ERROR);
                reduced.push(frame);
            }
            Err(error) => return Err(error).with_context(|| format!("reducing objects of type {kind}")),
        }
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(stream::join(&reduced).as_bytes())?;
    stdout.flush()?;
    return Ok(());
}

fn read_input(cli: &Cli) -> anyhow::Result<String> {
    if let Some(path) = &cli.file {
        return fs::read_to_string(path).with_context(|| format!("reading {}", path.display()));
    }
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input).context("reading standard input")?;
    return Ok(input);
}

/// The type of the object a batch describes: the kind of its first op.
fn kind_of(batch: &Batch) -> Uuid {
    return batch
        .iter()
        .find_map(|frame| frame.ops().op().map(|op| op.kind))
        .unwrap_or_default();
}
