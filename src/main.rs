use clap::{Parser, Subcommand};
use framer::config::{self, FramerConfig};
use framer::imaging::FontCatalog;
use framer::library::DirectoryLibrary;
use framer::settings::{BorderStyle, Color, Thickness};
use framer::{output, process};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "framer")]
#[command(about = "Put photos in a frame, with an optional caption")]
#[command(long_about = "\
Put photos in a frame, with an optional caption

Two border styles:

  solid       colored border, then a white mat; the canvas grows with the photo
              photo W×H, thickness 20, padding 150  →  (W+340)×(H+340)
  instagram   photo resized to fit 1000px, bordered, centered on 1080×1350 white

Caption resolution (first available wins):
  1. --caption TEXT
  2. capture month and year from EXIF   → \" - JUL '24 -\"
     (no EXIF date)                     → \" - --- -\"
  3. nothing, with --no-capture-date

Settings come from framer.toml (see 'framer gen-config'), then flags.
Unset thickness, padding, max size and font size follow the style preset.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./framer.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Frame a photo or every photo in a directory
    Frame(FrameArgs),
    /// List installed fonts usable for captions
    Fonts,
    /// Print a stock framer.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct FrameArgs {
    /// Photo file or directory (walked recursively)
    input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Border style
    #[arg(short, long, value_enum)]
    style: Option<BorderStyle>,

    /// Border thickness in pixels, or a percentage of the shorter side ("2.5%")
    #[arg(short, long)]
    thickness: Option<Thickness>,

    /// White padding around the border
    #[arg(long)]
    padding: Option<u32>,

    /// Border color (#rrggbb or #rrggbbaa)
    #[arg(long)]
    border_color: Option<Color>,

    /// Caption text; overrides the capture date
    #[arg(long)]
    caption: Option<String>,

    /// Do not caption photos with their capture date
    #[arg(long)]
    no_capture_date: bool,

    /// Caption font identifier (see `framer fonts`)
    #[arg(long)]
    font: Option<String>,

    /// Caption font size in pixels
    #[arg(long)]
    font_size: Option<f32>,

    /// Caption color (#rrggbb or #rrggbbaa)
    #[arg(long)]
    font_color: Option<Color>,

    /// Instagram style: longest side of the resized photo
    #[arg(long)]
    max_size: Option<u32>,

    /// JPEG quality (1-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Disable the render cache and re-render every photo
    #[arg(long)]
    no_cache: bool,
}

impl FrameArgs {
    /// Layer command-line flags over the loaded config.
    ///
    /// Choosing a style on the command line drops style-dependent values from
    /// the config file, so they fall back to the new style's preset.
    fn apply(&self, mut config: FramerConfig) -> FramerConfig {
        if let Some(style) = self.style
            && style != config.frame.style
        {
            config.frame.style = style;
            config.frame.thickness = None;
            config.frame.padding = None;
            config.frame.max_size = None;
            config.caption.font_size = None;
        }
        if let Some(dir) = &self.output {
            config.output.dir = dir.clone();
        }
        if self.thickness.is_some() {
            config.frame.thickness = self.thickness;
        }
        if self.padding.is_some() {
            config.frame.padding = self.padding;
        }
        if self.max_size.is_some() {
            config.frame.max_size = self.max_size;
        }
        if let Some(color) = self.border_color {
            config.frame.border_color = color;
        }
        if let Some(text) = &self.caption {
            config.caption.text = text.clone();
        }
        if self.no_capture_date {
            config.caption.use_capture_date = false;
        }
        if let Some(font) = &self.font {
            config.caption.font = font.clone();
        }
        if self.font_size.is_some() {
            config.caption.font_size = self.font_size;
        }
        if let Some(color) = self.font_color {
            config.caption.font_color = color;
        }
        if let Some(quality) = self.quality {
            config.output.quality = quality;
        }
        config
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Frame(args) => {
            let config = load_config(cli.config.as_deref())?;
            let config = args.apply(config);
            config.validate()?;

            let inputs = process::collect_inputs(&args.input)?;
            let fonts = FontCatalog::discover(&config.fonts.dirs);
            let library = DirectoryLibrary::new(&config.output.dir, config.output.quality);
            init_thread_pool(&config.processing);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::process(
                &inputs,
                &config.frame_spec(),
                &fonts,
                &library,
                config.output.quality,
                !args.no_cache,
                Some(tx),
            )?;
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            output::print_summary(&result, library.dir());

            if !result.failures.is_empty() {
                return Err(format!("{} photo(s) could not be framed", result.failures.len()).into());
            }
        }
        Command::Fonts => {
            let config = load_config(cli.config.as_deref())?;
            let fonts = FontCatalog::discover(&config.fonts.dirs);
            output::print_font_list(&fonts.available_fonts());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_config(explicit: Option<&std::path::Path>) -> Result<FramerConfig, config::ConfigError> {
    config::load_config(explicit, &std::env::current_dir()?)
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default level.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "framer=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
