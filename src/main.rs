use clap::{Parser, Subcommand};
use imgxform::imaging::RustBackend;
use imgxform::pipeline::{Invocation, Pipeline};
use imgxform::{batch, config, output, query};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicUsize;
use tracing_subscriber::EnvFilter;

/// Steps shared by every command that runs a chain.
#[derive(clap::Args, Clone)]
struct ChainArgs {
    /// Transformation step as `name` or `name:key=value,...` (repeatable, applied in order)
    #[arg(short = 't', long = "transform", value_name = "STEP")]
    steps: Vec<String>,

    /// Named preset from the config file, applied before any -t steps
    #[arg(long)]
    preset: Option<String>,
}

#[derive(Parser)]
#[command(name = "imgxform")]
#[command(about = "Apply chains of named image transformations")]
#[command(long_about = "\
Apply chains of named image transformations

Each step names a transformation and its parameters:

  canvas:width=200,height=200,mode=center,bg=fff
  rotate:angle=90,bg=000
  flip-horizontally
  compress:quality=75

The whole chain is validated before any pixel is touched. Steps then run
in order against the same image; the first failure stops the chain.

Run 'imgxform list' for every transformation and its parameters, and
'imgxform gen-config' for a documented pipeline.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = defaults)
    #[arg(long, default_value = "pipeline.toml", global = true)]
    config: PathBuf,

    /// Log every step (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a chain on one image; the output extension picks the format
    Apply {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        chain: ChainArgs,
    },
    /// Run a chain on every image under a directory
    Batch {
        input_dir: PathBuf,
        output_dir: PathBuf,
        #[command(flatten)]
        chain: ChainArgs,
        /// Output extension (overrides output.format from the config)
        #[arg(long)]
        format: Option<String>,
        /// Write a JSON report of every file to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// List available transformations
    List,
    /// Print a stock pipeline.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli.command, &cli.config)
}

fn run(command: Command, config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Apply {
            input,
            output,
            chain,
        } => {
            let (config, pipeline) = load_pipeline(config_path)?;
            let chain = resolve_chain(&config, &chain)?;
            let steps = pipeline.prepare(&chain)?;
            let (before, image) = batch::process_file(&pipeline, &steps, &input, &output)?;
            output::print_apply_output(&input, &output, before, &image);
        }
        Command::Batch {
            input_dir,
            output_dir,
            chain,
            format,
            report,
        } => {
            let (config, pipeline) = load_pipeline(config_path)?;
            let chain = resolve_chain(&config, &chain)?;
            let format = format.as_deref().or(config.output_format());
            if let Some(ext) = format {
                batch::check_output_format(ext)?;
            }
            init_thread_pool(&config.processing);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                let counter = AtomicUsize::new(0);
                for event in rx {
                    for line in output::format_batch_event(&event, &counter) {
                        println!("{}", line);
                    }
                }
            });
            let result =
                batch::run_batch(&pipeline, &chain, &input_dir, &output_dir, format, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let result = result?;

            output::print_batch_summary(&result);
            if let Some(path) = report {
                result.write_json(&path)?;
            }
        }
        Command::List => {
            let (_, pipeline) = load_pipeline(config_path)?;
            output::print_transformation_list(pipeline.registry());
        }
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }
    Ok(())
}

/// Load the config and bind its registry to the production backend.
fn load_pipeline(
    config_path: &Path,
) -> Result<(config::PipelineConfig, Pipeline<RustBackend>), Box<dyn std::error::Error>> {
    let config = config::load_config(config_path)?;
    let pipeline = Pipeline::new(config.registry()?, RustBackend::new());
    Ok((config, pipeline))
}

/// Preset steps (if any) followed by the `-t` steps.
fn resolve_chain(
    config: &config::PipelineConfig,
    args: &ChainArgs,
) -> Result<Vec<Invocation>, Box<dyn std::error::Error>> {
    let mut chain = match &args.preset {
        Some(name) => config.preset(name)?,
        None => Vec::new(),
    };
    chain.extend(query::parse_chain(&args.steps)?);
    Ok(chain)
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose { "imgxform=debug" } else { "imgxform=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can only lower it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
