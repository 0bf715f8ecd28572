use clap::{Parser, Subcommand};
use docs_slideshow::config::{self, SlideshowConfig};
use docs_slideshow::output;
use docs_slideshow::page::{InitReport, Page};
use docs_slideshow::probe::{FsProbe, NoProbe};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Shared flags for commands that load a page.
#[derive(clap::Args, Clone)]
struct PageArgs {
    /// HTML page to process
    input: PathBuf,

    /// Directory image sources resolve against (default: the input's directory)
    #[arg(long)]
    assets: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "docs-slideshow")]
#[command(about = "Turn slideshow containers in documentation pages into carousels")]
#[command(long_about = "\
Turn slideshow containers in documentation pages into carousels

Any element with class \"slideshow\" becomes a carousel. Its children are
scanned in order:

  <div class=\"slideshow\" data-aspect-ratio=\"16/9\">   # optional ratio override
    <img src=\"dawn.png\" alt=\"Dawn\">                  # image slide
    <div class=\"slide-caption\">Dawn *over* the ridge</div>   # caption for the item above
    <div data-youtube-id=\"dQw4w9WgXcQ\"></div>         # video slide
  </div>

Caption resolution (first available wins):
  caption block → data-caption attribute → alt text

Every frame in a carousel shares the widest slide ratio, so switching slides
never moves the content below. Images without a declared size are measured
from the files under --assets.

Run 'docs-slideshow gen-config' to generate a documented slideshow.toml.")]
#[command(version)]
struct Cli {
    /// Directory holding slideshow.toml (default: the input's directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render every carousel in place and write the resulting page
    Render {
        #[command(flatten)]
        page: PageArgs,

        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// List the carousels, slides and captions found on a page
    Inspect {
        #[command(flatten)]
        page: PageArgs,

        /// Print the inventory as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock slideshow.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Render { page, output: out } => {
            let (page, _) = load_page(&page, cli.config.as_deref())?;
            let html = page.to_html();
            match &out {
                Some(path) => {
                    std::fs::write(path, html)?;
                    info!(path = %path.display(), "page written");
                }
                None => print!("{}", html),
            }
            output::print_render_summary(&page, out.as_deref());
        }
        Command::Inspect { page, json } => {
            let (page, report) = load_page(&page, cli.config.as_deref())?;
            if json {
                let summaries: Vec<_> = page.carousels().map(output::summarize).collect();
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                output::print_inspect(&page, &report);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default: warnings from this crate).
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("docs_slideshow=warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Parse, initialize and resolve image loads for one page.
fn load_page(
    args: &PageArgs,
    config_dir: Option<&Path>,
) -> Result<(Page, InitReport), Box<dyn std::error::Error>> {
    let input_dir = parent_dir(&args.input);
    let config = load_config(config_dir.unwrap_or(input_dir.as_path()))?;
    let html = std::fs::read_to_string(&args.input)?;

    let mut page = Page::parse(&html, config)?;
    let report = page.initialize(&NoProbe);
    let probe = FsProbe::new(args.assets.clone().unwrap_or(input_dir));
    let resolved = page.resolve_pending_images(&probe);
    debug!(resolved, "image loads replayed");
    Ok((page, report))
}

fn load_config(dir: &Path) -> Result<SlideshowConfig, config::ConfigError> {
    let config = config::load_config(dir)?;
    debug!(dir = %dir.display(), "config loaded");
    Ok(config)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
