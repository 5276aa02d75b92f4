use clap::{Parser, Subcommand};
use slicestream::config::{self, Config, SliceConfig};
use slicestream::imaging::{CropSpec, OutputFormat, RustBackend};
use slicestream::partition::SliceModeKind;
use slicestream::session::Session;
use slicestream::slice::{SliceSettings, plan_slices};
use slicestream::source::SourceImage;
use slicestream::stitch::{Composite, measure};
use slicestream::{output, scan};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Images to stitch, in order, with per-image crops.
#[derive(clap::Args, Clone)]
struct InputArgs {
    /// Image files or directories (expanded to their images, sorted by name)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Common width in pixels [default: widest image after crop]
    #[arg(long)]
    width: Option<u32>,

    /// Crop or pad input N (1-based): N=top,bottom,left,right. Negative pads.
    #[arg(long = "crop", value_name = "N=T,B,L,R", value_parser = parse_crop)]
    crops: Vec<CropArg>,
}

/// Slice settings. Each flag overrides the config file or preset.
#[derive(clap::Args, Clone)]
struct SliceArgs {
    /// Named preset from the config file
    #[arg(long)]
    preset: Option<String>,

    #[arg(long, value_enum)]
    mode: Option<SliceModeKind>,

    /// Pixels per slice (fixed-height) or number of slices (equal-parts)
    #[arg(long)]
    value: Option<u32>,

    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// JPEG quality, 0.0-1.0
    #[arg(long)]
    quality: Option<f32>,

    /// Filename template: <YYMMDD> is today's date, <NO> the slice number
    #[arg(long)]
    prefix: Option<String>,
}

#[derive(Parser)]
#[command(name = "slicestream")]
#[command(about = "Stitch screenshots into one long image and slice it into pages")]
#[command(long_about = "\
Stitch screenshots into one long image and slice it into pages

Inputs are stacked top to bottom in the order given, scaled to a common width.
The composite is then cut into slices, either of a fixed height or into a
number of equal parts (leftover rows go to the last slice).

Filename templates:
  slice              → slice_01.jpg, slice_02.jpg, ...
  chat-<YYMMDD>-<NO> → chat-251204-1.jpg, chat-251204-2.jpg, ...

Run 'slicestream gen-config' to generate a documented slicestream.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing slicestream.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stitch inputs into one composite PNG
    Stitch {
        #[command(flatten)]
        input: InputArgs,

        /// Where to write the composite
        #[arg(long, short, default_value = "composite.png")]
        output: PathBuf,
    },
    /// Stitch inputs and write the slices
    Slice {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        slice: SliceArgs,

        /// Directory the slices are written to
        #[arg(long, default_value = "slices")]
        out_dir: PathBuf,

        /// Also write slices.json describing the composite and every slice
        #[arg(long)]
        manifest: bool,
    },
    /// Show the slices that would be written, without encoding
    Plan {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        slice: SliceArgs,
    },
    /// Validate inputs and crops without writing anything
    Check {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print a stock slicestream.toml with all options documented
    GenConfig,
}

#[derive(Debug, Clone, Copy)]
struct CropArg {
    index: usize,
    crop: CropSpec,
}

fn parse_crop(s: &str) -> Result<CropArg, String> {
    let (index, values) = s
        .split_once('=')
        .ok_or_else(|| format!("expected N=T,B,L,R, got '{s}'"))?;
    let index: usize = index
        .trim()
        .parse()
        .map_err(|_| format!("invalid input number '{index}'"))?;
    if index == 0 {
        return Err("input numbers start at 1".into());
    }
    let values = values
        .split(',')
        .map(|v| v.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid crop value in '{s}': {e}"))?;
    let [top, bottom, left, right] = values[..] else {
        return Err(format!("expected 4 crop values, got {}", values.len()));
    };
    Ok(CropArg {
        index,
        crop: CropSpec::new(top, bottom, left, right),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(())
        }
        command => run(&cli.config, command),
    }
}

fn run(config_dir: &Path, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_config(config_dir)?;
    init_thread_pool(&config.processing);
    // Each command stitches once; the composite memo would never be hit.
    let session = Session::without_memo(RustBackend::with_max_pixels(config.stitch.max_pixels));
    let target_width = |input: &InputArgs| input.width.or(config.stitch.target_width);
    let today = chrono::Local::now().date_naive();

    match command {
        Command::Stitch {
            input,
            output: out_path,
        } => {
            let (_, sources) = load_inputs(&session, &input)?;
            let composite = stitch(&session, &sources, target_width(&input))?;
            let preview = composite.encode_preview(session.backend())?;
            std::fs::write(&out_path, &preview.png)?;
            output::print_composite(&composite);
            println!("==> Wrote {}", out_path.display());
        }
        Command::Slice {
            input,
            slice,
            out_dir,
            manifest,
        } => {
            let settings = slice_settings(&config, &slice)?;
            let (_, sources) = load_inputs(&session, &input)?;
            let composite = stitch(&session, &sources, target_width(&input))?;

            let ticket = session.begin();
            let slices = session
                .slice(ticket, &composite, &settings, today)?
                .ready()
                .ok_or("slicing was superseded")?;

            std::fs::create_dir_all(&out_dir)?;
            for s in &slices {
                std::fs::write(out_dir.join(&s.filename), &s.bytes)?;
            }
            if manifest {
                write_manifest(&out_dir, &composite, &slices)?;
            }
            output::print_slices(&slices, &settings, &out_dir);
        }
        Command::Plan { input, slice } => {
            let settings = slice_settings(&config, &slice)?;
            let (_, sources) = load_inputs(&session, &input)?;
            let (width, height, _) = measure(&sources, target_width(&input))?;
            println!("Composite {}x{}", width, height);
            let plan = plan_slices(width, height, &settings, today)?;
            output::print_plan(&plan, &settings);
        }
        Command::Check { input } => {
            let (files, sources) = load_inputs(&session, &input)?;
            output::print_inputs(&files, &sources);
            let (width, height, _) = measure(&sources, target_width(&input))?;
            println!("==> Inputs are valid ({}x{} composite)", width, height);
        }
        Command::GenConfig => unreachable!("gen-config is handled before loading config"),
    }

    debug!(memo = %session.stats(), "done");
    Ok(())
}

/// Install a stderr `tracing` subscriber filtered by `RUST_LOG` (default `warn`).
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Never more threads than available cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Scan, decode, and apply `--crop` flags.
fn load_inputs(
    session: &Session<RustBackend>,
    args: &InputArgs,
) -> Result<(Vec<scan::InputFile>, Vec<SourceImage>), Box<dyn std::error::Error>> {
    let files = scan::scan(&args.inputs)?;
    let mut sources = scan::load_sources(session.backend(), &files)?;
    for arg in &args.crops {
        let source = sources.get_mut(arg.index - 1).ok_or_else(|| {
            format!(
                "--crop {}: only {} input images",
                arg.index,
                files.len()
            )
        })?;
        source.crop = arg.crop;
    }
    Ok((files, sources))
}

fn stitch(
    session: &Session<RustBackend>,
    sources: &[SourceImage],
    width: Option<u32>,
) -> Result<Arc<Composite>, Box<dyn std::error::Error>> {
    let ticket = session.begin();
    let composite = session
        .stitch(ticket, sources, width)?
        .ready()
        .flatten()
        .ok_or("no composite produced")?;
    Ok(composite)
}

/// `[slice]` or the named preset, with command-line flags on top.
fn slice_settings(
    config: &Config,
    args: &SliceArgs,
) -> Result<SliceSettings, config::ConfigError> {
    let base = config.slice_config(args.preset.as_deref())?;
    let merged = SliceConfig {
        mode: args.mode.unwrap_or(base.mode),
        value: args.value.unwrap_or(base.value),
        format: args.format.unwrap_or(base.format),
        quality: args.quality.unwrap_or(base.quality),
        prefix: args.prefix.clone().unwrap_or_else(|| base.prefix.clone()),
    };
    merged.to_settings()
}

fn write_manifest(
    out_dir: &Path,
    composite: &Composite,
    slices: &[slicestream::slice::GeneratedSlice],
) -> Result<(), Box<dyn std::error::Error>> {
    let manifest = serde_json::json!({
        "composite": {
            "width": composite.width,
            "height": composite.height,
            "placements": composite.placements,
        },
        "slices": slices,
    });
    std::fs::write(
        out_dir.join("slices.json"),
        serde_json::to_string_pretty(&manifest)?,
    )?;
    Ok(())
}
