//! linkcrawl main entry point
//!
//! This is the command-line interface for the linkcrawl link checker.

use anyhow::Context;
use clap::Parser;
use linkcrawl::config::{load_config, Config, Mode, When};
use linkcrawl::output::write_report;
use linkcrawl::pool::run_worker_process;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// linkcrawl: a concurrent website link checker
///
/// Crawls a site from one or more start URLs, checks every page and asset
/// it links to, and reports broken links along with the pages that
/// reference them. Exits with 0 only when no error was found.
#[derive(Parser, Debug)]
#[command(name = "linkcrawl")]
#[command(version)]
#[command(about = "A concurrent website link checker", long_about = None)]
struct Cli {
    /// URLs to start crawling from
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Check links to other hosts, without following their links
    #[arg(short = 'O', long)]
    test_outside: bool,

    /// Comma-separated hosts considered local (e.g. "*.example.com")
    #[arg(short = 'H', long, value_delimiter = ',')]
    accepted_hosts: Vec<String>,

    /// Comma-separated URL prefixes never fetched (e.g. "example.com/private/")
    #[arg(short, long = "ignore", value_delimiter = ',')]
    ignored_prefixes: Vec<String>,

    /// HTTP basic auth user
    #[arg(short, long)]
    username: Option<String>,

    /// HTTP basic auth password
    #[arg(short, long)]
    password: Option<String>,

    /// Comma-separated element types to follow (a, img, script, link)
    #[arg(short, long, value_delimiter = ',')]
    types: Vec<String>,

    /// Number of workers (default: 1 for thread and process, 1000 for green)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Worker pool backend
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Per-fetch timeout in seconds
    #[arg(short = 'T', long)]
    timeout: Option<u64>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// When to write the report
    #[arg(short = 'W', long, value_enum)]
    when: Option<When>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Serve a parent crawler over stdin/stdout
    #[arg(long, hide = true)]
    worker_process: bool,
}

impl Cli {
    /// Loads the config file, if any, and applies the command-line options
    /// on top of it
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => Config::default(),
        };

        config.start_urls.extend(self.urls);

        if self.test_outside {
            config.crawler.test_outside = true;
        }
        config.crawler.accepted_hosts.extend(self.accepted_hosts);
        config.crawler.ignored_prefixes.extend(self.ignored_prefixes);
        if !self.types.is_empty() {
            config.crawler.types = self.types;
        }
        if self.username.is_some() {
            config.crawler.username = self.username;
        }
        if self.password.is_some() {
            config.crawler.password = self.password;
        }

        if let Some(mode) = self.mode {
            config.performance.mode = mode;
        }
        if self.workers.is_some() {
            config.performance.workers = self.workers;
        }
        if let Some(timeout) = self.timeout {
            config.performance.timeout = timeout;
        }

        if let Some(when) = self.when {
            config.output.when = when;
        }
        if self.output.is_some() {
            config.output.output = self.output;
        }

        Ok(config)
    }
}

// the driver shares this thread with the cooperative workers' LocalSet
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if cli.worker_process {
        run_worker_process().await?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = cli.into_config()?;
    if config.start_urls.is_empty() {
        eprintln!("At least one starting URL must be supplied.");
        return Ok(ExitCode::FAILURE);
    }
    if config.performance.mode == Mode::Process && config.performance.worker_program.is_none() {
        // worker processes are copies of this executable
        let program = std::env::current_exe().context("Failed to locate the linkcrawl executable")?;
        config.performance.worker_program = Some(program);
    }

    tracing::info!(
        "Crawling {} in {:?} mode",
        config.start_urls.join(", "),
        config.performance.mode
    );

    let output = config.output.clone();
    let site = linkcrawl::crawl(config).await.context("Crawl failed")?;

    write_report(&site, &output).context("Failed to write the report")?;

    if site.is_ok() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs always go to stderr: stdout carries the report, and in a worker
/// process it is the channel back to the parent.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else {
        match verbose {
            0 => EnvFilter::new("linkcrawl=info,warn"),
            1 => EnvFilter::new("linkcrawl=debug,info"),
            2 => EnvFilter::new("linkcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
