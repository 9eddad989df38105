use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use webpify::batch::{self, BatchOptions};
use webpify::config::{self, ConverterConfig};
use webpify::dimensions::TargetDimensions;
use webpify::imaging::{self, ImageBackend, RustBackend};
use webpify::output;
use webpify::session::Session;
use webpify::shell::Shell;
use webpify::upload::SourceFile;

fn version_string() -> &'static str {
    let tagged = env!("WEBPIFY_TAGGED");
    if tagged == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let commit = env!("WEBPIFY_COMMIT");
        if commit.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{commit}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "webpify")]
#[command(about = "Resize PNG, JPEG and GIF images and re-encode them as WebP")]
#[command(long_about = "\
Resize PNG, JPEG and GIF images and re-encode them as lossy WebP

Each input is decoded, drawn at the target size and encoded at the chosen
quality. The output is written as <name>.webp next to the input, or into
--output-dir.

Sizing:
  --width 400              height follows the aspect ratio (lock on)
  --width 400 --unlocked   height stays at the original
  --width 400 --height 90  exact size; the lock is released

Defaults (quality, aspect lock, resampling filter, overwrite) come from
webpify.toml in the working directory, or the file named by --config.

Run 'webpify gen-config' to generate a documented webpify.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./webpify.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

/// Size and quality flags shared by commands that encode.
#[derive(clap::Args, Clone)]
struct SizeArgs {
    /// Target width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Target height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Keep the other edge unchanged when only one is given
    #[arg(long)]
    unlocked: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one or more images to WebP
    Convert {
        /// Input files (PNG, JPEG, GIF)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        size: SizeArgs,

        /// WebP quality, 1-100
        #[arg(long, short)]
        quality: Option<u32>,

        /// Directory for the .webp files (default: next to each input)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Replace existing .webp files
        #[arg(long)]
        overwrite: bool,
    },
    /// Show type, size and dimensions of an image
    Info {
        input: PathBuf,
    },
    /// Encode at a range of qualities and report each size
    Sweep {
        input: PathBuf,

        #[command(flatten)]
        size: SizeArgs,

        /// Quality increment between samples
        #[arg(long, default_value_t = 10)]
        step: u32,
    },
    /// Edit one image interactively
    Shell,
    /// Print a stock webpify.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => config::load_config(path, true)?,
        None => config::load_config(&PathBuf::from(config::DEFAULT_CONFIG_FILE), false)?,
    };

    match cli.command {
        Command::Convert {
            inputs,
            size,
            quality,
            output_dir,
            overwrite,
        } => {
            init_thread_pool(&config.processing);
            let options = BatchOptions {
                width: size.width,
                height: size.height,
                quality,
                unlocked: size.unlocked,
                output_dir,
                overwrite: overwrite || config.output.overwrite,
            };
            let backend = RustBackend::new();
            let defaults = config.session_defaults();

            let summary = if cli.json {
                batch::convert_batch(&backend, &inputs, defaults, &options, None)
            } else {
                let (tx, rx) = std::sync::mpsc::channel();
                let printer = std::thread::spawn(move || {
                    for event in rx {
                        for line in output::format_batch_event(&event) {
                            println!("{}", line);
                        }
                    }
                });
                let summary = batch::convert_batch(&backend, &inputs, defaults, &options, Some(tx));
                printer
                    .join()
                    .map_err(|_| "progress printer panicked")?;
                summary
            };

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                output::print_batch_summary(&summary);
            }
            let skipped = summary.rejected + summary.failed;
            if skipped > 0 {
                return Err(format!("{} of {} inputs not converted", skipped, inputs.len()).into());
            }
        }
        Command::Info { input } => {
            let backend = RustBackend::new();
            let mut session = Session::new(config.session_defaults());
            let details = session
                .upload(&backend, SourceFile::from_path(&input)?)?
                .clone();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&details)?);
            } else {
                output::print_details("Original", &details);
            }
        }
        Command::Sweep { input, size, step } => {
            sweep(&config, &input, &size, step, cli.json)?;
        }
        Command::Shell => {
            let backend: Arc<dyn ImageBackend + Send> = Arc::new(RustBackend::new());
            let mut shell = Shell::new(backend, &config)?;
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            shell.run(stdin.lock(), &mut stdout)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn sweep(
    config: &ConverterConfig,
    input: &Path,
    size: &SizeArgs,
    step: u32,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = RustBackend::new();
    let file = SourceFile::from_path(input)?;
    let source = backend.decode(&file.bytes)?;

    // Same sizing rules as `convert`: both edges given means exact size.
    let exact = size.width.is_some() && size.height.is_some();
    let locked = config.conversion.lock_aspect_ratio && !size.unlocked && !exact;
    let mut target = TargetDimensions::seed(source.dimensions(), locked);
    if let Some(width) = size.width {
        target.set_width(width);
    }
    if let Some(height) = size.height {
        target.set_height(height);
    }
    let target = target.dimensions();

    let points = imaging::quality_sweep(
        &backend,
        &source,
        target,
        config.conversion.filter,
        &imaging::sweep_qualities(step),
    )?;
    if !imaging::grows_with_quality(&points) {
        warn!(name = %file.name, "output size did not grow with quality");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&points)?);
    } else {
        output::print_sweep(&file.name, target, &points);
    }
    Ok(())
}

/// Log to stderr. `-v` forces debug; otherwise `RUST_LOG` or warnings only.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
