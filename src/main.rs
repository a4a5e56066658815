use clap::{Parser, Subcommand};
use photo_formats::fitting::{Crop, CropRect, FormatSpec, SourceImage};
use photo_formats::render::{self, RustBackend};
use photo_formats::{config, output, process};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "photo-formats")]
#[command(about = "Fit photos into named output formats")]
#[command(long_about = "\
Fit photos into named output formats

A format is a target rectangle (max width x max height), optionally allowed
to grow taller for tall photos and optionally allowed to upscale small ones.
Photos are center-cropped to the format's shape unless a manual crop is given,
then scaled to fit.

Formats live in the config file:

  [formats.detail]
  max_width = 600
  max_height = 400
  flexible_height = true
  flexible_max_height = 800

Run 'photo-formats gen-config' to generate a documented config file.
Set RUST_LOG=debug to trace fitting decisions.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = "photo-formats.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Where `fit` takes its format from.
#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct FormatSource {
    /// Named format from the config file
    #[arg(long)]
    format: Option<String>,

    /// Ad-hoc format rectangle, WxH
    #[arg(long, value_name = "WxH")]
    max: Option<SourceImage>,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the crop and output size for a photo, without any pixels
    Fit {
        /// Source image size, WxH
        #[arg(long, value_name = "WxH")]
        size: SourceImage,

        #[command(flatten)]
        format: FormatSource,

        /// Flexible max height for an ad-hoc format
        #[arg(long, requires = "max")]
        flex: Option<u32>,

        /// Let an ad-hoc format upscale small photos
        #[arg(long, requires = "max")]
        stretch: bool,

        /// Manual crop, LEFT,TOP,WIDTH,HEIGHT
        #[arg(long, value_name = "L,T,W,H")]
        crop: Option<CropRect>,

        /// Print the fit result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render one photo in one configured format
    Render {
        source: PathBuf,
        output: PathBuf,

        /// Named format from the config file
        #[arg(long)]
        format: String,

        /// Manual crop, LEFT,TOP,WIDTH,HEIGHT
        #[arg(long, value_name = "L,T,W,H")]
        crop: Option<CropRect>,
    },
    /// Render one photo in every configured format and write manifest.json
    Process {
        source: PathBuf,
        output_dir: PathBuf,

        /// Manual crop for one format, NAME=LEFT,TOP,WIDTH,HEIGHT (repeatable)
        #[arg(long = "crop", value_name = "NAME=L,T,W,H", value_parser = parse_named_crop)]
        crops: Vec<(String, CropRect)>,
    },
    /// Create a thumbnail within the configured box
    Thumb { source: PathBuf, output: PathBuf },
    /// List configured formats
    Formats,
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Command::Fit {
            size,
            format,
            flex,
            stretch,
            crop,
            json,
        } => {
            let config = config::load_config(&cli.config)?;
            let spec = match (format.format, format.max) {
                (Some(name), _) => config
                    .format(&name)
                    .ok_or(process::ProcessError::UnknownFormat(name))?
                    .spec(),
                (None, Some(max)) => {
                    let spec = match flex {
                        Some(h) => FormatSpec::flexible(max.width, max.height, h),
                        None => FormatSpec::fixed(max.width, max.height),
                    };
                    spec.with_stretch(stretch)
                }
                (None, None) => return Err("either --format or --max is required".into()),
            };
            let fit = config.fitter().fit(size, Crop::from(crop), &spec)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&fit)?);
            } else {
                output::print_fit_result(size, &spec, &fit);
            }
        }
        Command::Render {
            source,
            output: out,
            format,
            crop,
        } => {
            let config = config::load_config(&cli.config)?;
            let format_config = config
                .format(&format)
                .ok_or(process::ProcessError::UnknownFormat(format))?;
            let photo = render::render_format(
                &RustBackend::new(),
                &config.fitter(),
                &source,
                &out,
                Crop::from(crop),
                &format_config.spec(),
                config.quality_for(format_config),
            )?;
            output::print_written(&out, photo.fit.output_size());
        }
        Command::Process {
            source,
            output_dir,
            crops,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let crops: BTreeMap<String, CropRect> = crops.into_iter().collect();
            let manifest = process::process(&source, &output_dir, &config, &crops)?;
            manifest.write(&output_dir.join("manifest.json"))?;
            output::print_process_manifest(&manifest);
        }
        Command::Thumb { source, output: out } => {
            let config = config::load_config(&cli.config)?;
            let size = render::create_thumbnail(
                &RustBackend::new(),
                &source,
                &out,
                &config.thumbnail_config(),
            )?;
            output::print_written(&out, size);
        }
        Command::Formats => {
            let config = config::load_config(&cli.config)?;
            output::print_formats(&config);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Parse `NAME=LEFT,TOP,WIDTH,HEIGHT`.
fn parse_named_crop(s: &str) -> Result<(String, CropRect), String> {
    let (name, rect) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=L,T,W,H, got '{s}'"))?;
    if name.is_empty() {
        return Err(format!("missing format name in '{s}'"));
    }
    let rect: CropRect = rect.parse().map_err(|e| format!("{e}"))?;
    Ok((name.to_string(), rect))
}
