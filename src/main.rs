use clap::Parser;
use pagebreak::config::{self, PagebreakConfig, ProcessingConfig};
use pagebreak::engine::Engine;
use pagebreak::output;
use pagebreak::pipeline::{Pipeline, RunOptions};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pagebreak")]
#[command(about = "Framework agnostic website pagination")]
#[command(long_about = "\
Framework agnostic website pagination

Run after your site generator has built the site. Pagebreak finds elements
marked with data-pagebreak and splits their children across pages:

  <section data-pagebreak=\"10\" data-pagebreak-url=\"./page/:num/\">
    <article>...</article>
    <article>...</article>
  </section>

  <a data-pagebreak-control=\"prev\">Previous</a>
  <a data-pagebreak-control=\"next\">Next</a>
  <span data-pagebreak-label=\"current\"></span> of
  <span data-pagebreak-label=\"total\"></span>

With -s and -o pointing at the same directory the site is paginated in
place. Otherwise the whole site is copied to the output with pages added.

Run 'pagebreak --gen-config' to generate a documented pagebreak.toml.")]
#[command(version = env!("PAGEBREAK_VERSION"))]
struct Cli {
    /// Directory of the built website
    #[arg(short, long, value_name = "PATH", default_value = ".")]
    source: PathBuf,

    /// Directory to write the paginated website to
    #[arg(short, long, value_name = "PATH", required_unless_present = "gen_config")]
    output: Option<PathBuf>,

    /// Config file (default: ./pagebreak.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum parallel workers (capped at the number of CPU cores)
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    jobs: Option<u16>,

    /// Paginate documents even when they have HTML parse errors
    #[arg(long)]
    lenient: bool,

    /// Log more detail to stderr (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Print a stock pagebreak.toml with all options documented
    #[arg(long)]
    gen_config: bool,
}

fn main() -> ExitCode {
    let start = Instant::now();
    let cli = Cli::parse();

    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return ExitCode::SUCCESS;
    }

    init_tracing(cli.verbose, cli.quiet);

    let Some(output_dir) = cli.output.clone() else {
        eprintln!("Pagebreak error: --output is required");
        return ExitCode::FAILURE;
    };

    let mut site_config = match config::load_config(cli.config.as_deref(), Path::new(".")) {
        Ok(site_config) => site_config,
        Err(err) => {
            eprintln!("Pagebreak error: {err}");
            return ExitCode::FAILURE;
        }
    };
    apply_overrides(&mut site_config, &cli);
    init_thread_pool(&site_config.processing);

    let engine = Engine::new(site_config.engine_options());
    let mut pipeline = Pipeline::new(RunOptions {
        source: cli.source.clone(),
        output: output_dir.clone(),
    });

    match pipeline.run(&engine) {
        Ok(summary) => {
            output::print_summary(&summary, &cli.source, &output_dir);
            output::print_finished(start.elapsed());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Pagebreak error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Command-line flags take precedence over the config file.
fn apply_overrides(site_config: &mut PagebreakConfig, cli: &Cli) {
    if cli.lenient {
        site_config.parsing.strict = false;
    }
    if let Some(jobs) = cli.jobs {
        site_config.processing.max_processes = Some(usize::from(jobs));
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Size the global rayon pool from the processing config.
fn init_thread_pool(processing: &ProcessingConfig) {
    let cores = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    let threads = processing.worker_threads(cores);
    if let Err(err) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        debug!("keeping existing thread pool: {err}");
    }
}
