//! Accord verification CLI
//!
//! Matches an actual request, response or message against the expected one
//! and prints every mismatch found.
//!
//! Usage:
//!   accord-verify --kind response --expected expected.json --actual actual.json

use accord_matching::{
    match_message, match_request, match_response, HttpRequest, HttpResponse, MatchResult,
    MatchingConfig, Message,
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Request,
    Response,
    Message,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Accord contract verifier
#[derive(Parser, Debug)]
#[command(name = "accord-verify")]
#[command(
    author,
    version,
    about = "Match an actual interaction against the expected one from a contract"
)]
struct Args {
    /// Interaction part being compared
    #[arg(short, long, value_enum, default_value = "response")]
    kind: Kind,

    /// JSON file holding the expected part, including its matchingRules
    #[arg(short, long)]
    expected: PathBuf,

    /// JSON file holding the actual part
    #[arg(short, long)]
    actual: PathBuf,

    /// YAML matching configuration
    #[arg(short, long, env = "ACCORD_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Verbose output (debug logging)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(result) if result.all_matched() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{RED}{BOLD}error:{RESET} {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<MatchResult> {
    let mut config = match &args.config {
        Some(path) => MatchingConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MatchingConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("Invalid feature override in environment")?;
    config.validate()?;
    config.install_features()?;

    let result = match args.kind {
        Kind::Request => {
            let expected: HttpRequest = load(&args.expected)?;
            let actual: HttpRequest = load(&args.actual)?;
            match_request(&expected, &actual, &config)
        }
        Kind::Response => {
            let expected: HttpResponse = load(&args.expected)?;
            let actual: HttpResponse = load(&args.actual)?;
            match_response(&expected, &actual, &config)
        }
        Kind::Message => {
            let expected: Message = load(&args.expected)?;
            let actual: Message = load(&args.actual)?;
            match_message(&expected, &actual, &config)
        }
    };

    match args.format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text => print_text(&result, args),
    }
    Ok(result)
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json(result: &MatchResult) -> Result<()> {
    let output = serde_json::json!({
        "matched": result.all_matched(),
        "mismatchCount": result.mismatch_count(),
        "results": result.results(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text(result: &MatchResult, args: &Args) {
    println!("{BOLD}{CYAN}Accord Verifier{RESET}");
    println!("{DIM}━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━{RESET}");
    println!("{DIM}Expected:{RESET} {CYAN}{}{RESET}", args.expected.display());
    println!("{DIM}Actual:{RESET}   {CYAN}{}{RESET}\n", args.actual.display());

    for category in result.results() {
        if category.mismatches.is_empty() {
            println!("  {GREEN}✓{RESET} {}", category.category.name());
            continue;
        }
        println!(
            "  {RED}✗{RESET} {} {DIM}({} mismatch(es)){RESET}",
            category.category.name(),
            category.mismatches.len()
        );
        for mismatch in &category.mismatches {
            println!("      {RED}{mismatch}{RESET}");
            if let Some(diff) = &mismatch.diff {
                for line in diff.lines() {
                    let color = match line.chars().next() {
                        Some('-') => RED,
                        Some('+') => GREEN,
                        _ => DIM,
                    };
                    println!("        {color}{line}{RESET}");
                }
            }
        }
    }

    println!();
    if result.all_matched() {
        println!("{GREEN}{BOLD}All parts matched{RESET}");
    } else {
        println!(
            "{YELLOW}{BOLD}{} mismatch(es) found{RESET}",
            result.mismatch_count()
        );
    }
}
