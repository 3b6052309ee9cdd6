use clap::{Parser, Subcommand};
use mdsections::config::{self, SiteConfig};
use mdsections::event::{Event, emit};
use mdsections::pipeline::{self, BuildMode, SectionReport};
use mdsections::{listing, output, serve, watch};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

#[derive(Parser)]
#[command(name = "mdsections")]
#[command(about = "Build sectioned static sites from Markdown and HTML templates")]
#[command(long_about = "\
Build sectioned static sites from Markdown and HTML templates

Each section pairs a directory of Markdown sources with a template and an
output directory. Sections are declared in site.toml at the project root.

Project structure (default config):

  site.toml                          # Sections, server and watch settings
  build-template-articles.html.txt   # Template with {{TITLE}}, {{ARTICLE_CONTENT}}, ...
  articles-markdown/                 # Sources: one page per .md file
  │   ├── index.md                   # Section landing page → /articles/
  │   └── first-post.md              # → articles/first-post.html
  articles/                          # Generated pages (orphans are removed)
  articles-list-index.js             # export const ARTICLE_FILE_NAMES = [...]

Front-matter (YAML between --- lines):
  title, description, hero, datePublished, dateModified

Documents missing a required field are skipped with a warning. The
section's index document does not need dates.

Run 'mdsections gen-config' to generate a documented site.toml.")]
#[command(version)]
struct Cli {
    /// Project root containing site.toml
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build every section once
    Build {
        /// Keep running: serve the site and rebuild sections on change
        #[arg(long)]
        live: bool,
    },
    /// Validate and render every document without writing anything
    Check,
    /// List a section's pages, newest first, from its index artifact
    List {
        /// Section name from site.toml
        section: String,
        /// Show only the N most recent pages (default 5)
        #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "5")]
        recent: Option<usize>,
        /// Print the list as an HTML fragment
        #[arg(long)]
        html: bool,
    },
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build { live } => {
            let config = config::load_config(&cli.root)?;
            let (tx, printer) = start_printer(&config.root);
            let reports = pipeline::build_all(&config, BuildMode::Write, Some(&tx));
            let live_result = if live { run_live(&config, &tx) } else { Ok(()) };
            finish_printer(tx, printer, live_result)?;
            if !live {
                output::print_summary(&reports);
            }
        }
        Command::Check => {
            let config = config::load_config(&cli.root)?;
            println!("==> Checking {}", config.root.display());
            let (tx, printer) = start_printer(&config.root);
            let reports = pipeline::build_all(&config, BuildMode::Check, Some(&tx));
            finish_printer(tx, printer, Ok(()))?;
            output::print_summary(&reports);
            if has_problems(&reports) {
                std::process::exit(1);
            }
            println!("==> Content is valid");
        }
        Command::List {
            section,
            recent,
            html,
        } => {
            let config = config::load_config(&cli.root)?;
            let listing = listing::load_listing(&config, &section)?;
            for (path, error) in &listing.unreadable {
                eprintln!("Warning: cannot read {path}: {error}");
            }
            let entries = match recent {
                Some(n) => listing.recent(n),
                None => &listing.entries[..],
            };
            if html {
                println!("{}", listing::render_list_html(entries));
            } else {
                output::print_listing(entries);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Spawn the thread that prints events as they arrive.
fn start_printer(root: &Path) -> (Sender<Event>, JoinHandle<()>) {
    let root = root.to_path_buf();
    let (tx, rx) = mpsc::channel();
    let printer = thread::spawn(move || {
        for event in rx {
            output::print_event(&event, &root);
        }
    });
    (tx, printer)
}

/// Close the event channel and wait for every queued event to print, then
/// hand back `result`. Errors surface only after the output is flushed.
fn finish_printer(
    tx: Sender<Event>,
    printer: JoinHandle<()>,
    result: Result<(), Box<dyn std::error::Error>>,
) -> Result<(), Box<dyn std::error::Error>> {
    drop(tx);
    printer.join().map_err(|_| "output thread panicked")?;
    result
}

/// Serve `site_root` and rebuild on change until Ctrl-C.
fn run_live(config: &SiteConfig, events: &Sender<Event>) -> Result<(), Box<dyn std::error::Error>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let server = match serve::spawn_server(&config.serve, &config.site_root, Some(events)) {
        Ok(handle) => Some(handle),
        Err(e) => {
            emit(
                Some(events),
                Event::ServerFailed {
                    error: e.to_string(),
                },
            );
            None
        }
    };

    let result = watch::watch_blocking(config, &running, Some(events));
    drop(server);
    Ok(result?)
}

/// Whether a check found a document that would be skipped or fail.
fn has_problems(reports: &[SectionReport]) -> bool {
    reports.iter().any(|r| r.skipped() > 0 || r.failed() > 0)
}
