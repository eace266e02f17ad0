//! azsubsyn CLI entrypoint.
//!
//! This is the main entrypoint for the azsubsyn command-line tool.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use azsubsyn::azure::{self, ArmClient, SubscriptionApi};
use azsubsyn::cli::{Cli, Commands, OutputFormat, OutputFormatter};
use azsubsyn::config::{ConfigParser, Side, load_dotenv};
use azsubsyn::error::{AzsubsynError, Result};
use azsubsyn::planner::{Applier, Plan, PlanHeader, Planner};

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.output);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system. `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool, format: OutputFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        OutputFormat::Json => builder.json().init(),
        OutputFormat::Text => builder.init(),
    }
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    if !matches!(cli.command, Commands::Version) {
        load_dotenv(cli.env_file.as_deref())?;
    }

    match cli.command {
        Commands::Credcheck => cmd_credcheck(&formatter).await,
        Commands::Plan { out } => cmd_plan(&out, &formatter).await,
        Commands::Apply { plan, yes, strict } => cmd_apply(&plan, yes, strict, &formatter).await,
        Commands::Version => {
            cmd_version(cli.output);
            Ok(())
        }
    }
}

/// Check credentials and connectivity for both subscriptions.
async fn cmd_credcheck(formatter: &OutputFormatter) -> Result<()> {
    let parser = ConfigParser::from_env();
    let config = parser.load()?;
    info!("Configuration loaded, checking access to both subscriptions");

    let source = ArmClient::new(&config.source, &config.endpoints)?;
    let target = ArmClient::new(&config.target, &config.endpoints)?;

    let apis: [&dyn SubscriptionApi; 2] = [&source, &target];
    let found = azure::check_access(&apis).await?;
    let rows: Vec<_> = [Side::Source, Side::Target].into_iter().zip(found).collect();

    println!("{}", formatter.format_subscriptions(&rows));
    Ok(())
}

/// Compare both subscriptions and write the plan file.
async fn cmd_plan(out: &Path, formatter: &OutputFormatter) -> Result<()> {
    let parser = ConfigParser::from_env();
    let config = parser.load()?;

    let source = ArmClient::new(&config.source, &config.endpoints)?;
    let target = ArmClient::new(&config.target, &config.endpoints)?;

    let plan = Planner::new(&source, &target).plan().await?;
    debug!("Plan has {} entries", plan.len());

    let header = PlanHeader::new(
        config.source.subscription_id.as_str(),
        config.target.subscription_id.as_str(),
    );
    plan.save(out, &header).await?;

    println!("{}", formatter.format_plan(&plan, Some(out)));
    Ok(())
}

/// Apply a plan file to the target subscription.
async fn cmd_apply(
    plan_path: &Path,
    auto_approve: bool,
    strict: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let plan = Plan::load(plan_path).await?;

    if plan.is_empty() {
        eprintln!("No changes to apply.");
        return Ok(());
    }

    let parser = ConfigParser::from_env();
    let target_config = parser.load_side(Side::Target)?;
    let endpoints = parser.endpoints()?;
    let target = ArmClient::new(&target_config, &endpoints)?;

    // Show plan
    eprintln!("{}", OutputFormatter::new(OutputFormat::Text).format_plan(&plan, None));

    // Confirm
    if !auto_approve {
        eprint!(
            "Register these in target subscription {}? [y/N]: ",
            target_config.subscription_id
        );
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            eprintln!("Apply cancelled.");
            return Ok(());
        }
    }

    let report = Applier::new(&target).apply(&plan).await;
    println!("{}", formatter.format_apply_report(&report));

    if !report.all_successful() {
        if strict {
            return Err(AzsubsynError::ApplyIncomplete {
                failed: report.failed.len(),
                total: report.total(),
            });
        }
        warn!(
            "{} entries failed to register; rerun `azsubsyn plan` to see what is still missing",
            report.failed.len()
        );
    }

    Ok(())
}

/// Print the version.
fn cmd_version(format: OutputFormat) {
    let version = env!("CARGO_PKG_VERSION");
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "version": version })),
        OutputFormat::Text => println!("azsubsyn {version}"),
    }
}
