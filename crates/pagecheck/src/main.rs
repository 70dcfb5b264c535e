//! pagecheck CLI
//!
//! Loads one page in a headless browser, runs a checklist against it and
//! exits 0 when every required check passed, 1 when something failed and 2
//! when the run could not be carried out at all.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use pagecheck::playwright::{Browser, DriverConfig};
use pagecheck::{Checklist, RunConfig, Session, Viewport};

#[derive(Parser, Debug)]
#[command(name = "pagecheck")]
#[command(about = "Smoke-test a rendered page against a declarative checklist")]
#[command(version)]
struct Args {
    /// Page to check: a file path or an http(s)/file URL
    target: Option<String>,

    /// Checklist YAML file (defaults to the bundled Frankis Motors checklist)
    #[arg(short, long, env = "PAGECHECK_CHECKS")]
    checks: Option<PathBuf>,

    /// Browser to use
    #[arg(long, value_enum, default_value = "chromium", env = "PAGECHECK_BROWSER")]
    browser: Browser,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Viewport width (overrides the checklist)
    #[arg(long, requires = "viewport_height")]
    viewport_width: Option<u32>,

    /// Viewport height (overrides the checklist)
    #[arg(long, requires = "viewport_width")]
    viewport_height: Option<u32>,

    /// Navigation timeout in milliseconds
    #[arg(long, default_value = "30000")]
    navigation_timeout_ms: u64,

    /// Per-query timeout in milliseconds
    #[arg(long, default_value = "10000")]
    query_timeout_ms: u64,

    /// Node executable
    #[arg(long, default_value = "node", env = "PAGECHECK_NODE")]
    node: PathBuf,

    /// Directory containing the playwright package (NODE_PATH)
    #[arg(long, env = "NODE_PATH")]
    node_path: Option<PathBuf>,

    /// Skip the `npx playwright --version` check
    #[arg(long)]
    skip_install_check: bool,

    /// Report console and page errors without failing the run
    #[arg(long)]
    allow_page_errors: bool,

    /// Also write the report as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Test failed: {:#}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> anyhow::Result<bool> {
    let checklist = match &args.checks {
        Some(path) => Checklist::from_file(path)
            .with_context(|| format!("loading checklist {}", path.display()))?,
        None => Checklist::bundled().context("loading bundled checklist")?,
    };

    let viewport = match (args.viewport_width, args.viewport_height) {
        (Some(width), Some(height)) => Some(Viewport { width, height }),
        _ => None,
    };

    let config = RunConfig {
        driver: DriverConfig {
            browser: args.browser,
            headless: !args.headed,
            navigation_timeout: Duration::from_millis(args.navigation_timeout_ms),
            query_timeout: Duration::from_millis(args.query_timeout_ms),
            node_binary: args.node,
            node_path: args.node_path,
            check_install: !args.skip_install_check,
            ..Default::default()
        },
        target: args.target,
        base_dir: std::env::current_dir().context("reading current directory")?,
        viewport,
        allow_page_errors: args.allow_page_errors,
        output: args.output,
    };

    let session = Session::new(config);
    let report = session
        .run(&checklist)
        .await
        .with_context(|| format!("running checklist '{}'", checklist.name))?;

    println!("{}", report);

    let passed = session.config().passed(&report);
    if report.success() && !passed {
        println!("✗ Page reported errors (use --allow-page-errors to ignore them)");
    }
    Ok(passed)
}
