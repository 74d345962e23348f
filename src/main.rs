//! infratest - run infrastructure plan suites and deploy actions.
//!
//! Usage:
//!   infratest run <SUITE>               Run every case in a suite file
//!   infratest list <SUITE>              List the cases in a suite file
//!   infratest deploy <ACTION> -d <DIR>  Run init/validate/fmt/plan/apply/destroy

use clap::{Parser, Subcommand};
use infratest::config::resolve_binary;
use infratest::{DeployAction, Deployer, Options, SuiteRunner, Vars, load_cases};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

/// infratest - plan suites and deploys for terraform/tofu
#[derive(Parser)]
#[command(name = "infratest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cases of a suite file
    Run {
        /// Path to the suite YAML file
        #[arg(value_name = "SUITE")]
        suite: PathBuf,

        /// Only run the named case (repeatable)
        #[arg(long = "case", value_name = "NAME")]
        cases: Vec<String>,

        /// Override the number of cases run at once
        #[arg(short = 'j', long)]
        max_cases: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the cases of a suite file
    List {
        /// Path to the suite YAML file
        #[arg(value_name = "SUITE")]
        suite: PathBuf,
    },

    /// Run a deploy action against a directory
    Deploy {
        /// Action to perform
        #[arg(value_name = "ACTION", value_parser = ["init", "validate", "fmt", "plan", "apply", "destroy"])]
        action: String,

        /// Working directory with the definitions
        #[arg(short = 'd', long)]
        directory: PathBuf,

        /// Var file to pass to plan/apply/destroy
        #[arg(short = 'v', long)]
        var_file: Option<PathBuf>,

        /// Input variable as NAME=VALUE (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,

        /// Restrict to a resource or module address (repeatable)
        #[arg(long = "target")]
        targets: Vec<String>,

        /// Approve apply/destroy without a saved plan
        #[arg(long)]
        auto_approve: bool,

        /// Plan file to write (plan) or apply (apply)
        #[arg(long)]
        plan_file: Option<PathBuf>,

        /// Binary to run
        #[arg(long, default_value = "terraform")]
        binary: String,

        /// Per-command timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout carries only reports and command output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let ok = match cli.command {
        Commands::Run {
            suite,
            cases,
            max_cases,
            json,
        } => run_suite(suite, cases, max_cases, json).await?,
        Commands::List { suite } => {
            list_cases(suite)?;
            true
        }
        Commands::Deploy {
            action,
            directory,
            var_file,
            vars,
            targets,
            auto_approve,
            plan_file,
            binary,
            timeout,
        } => {
            // The binary runs with the definitions directory as its cwd.
            let cwd = std::env::current_dir()?;
            let mut builder = Options::builder(directory)
                .binary(resolve_binary(&cwd, &binary))
                .vars(parse_vars(&vars)?)
                .targets(targets)
                .no_color(false);
            if let Some(file) = var_file {
                builder = builder.var_file(file);
            }
            if let Some(file) = plan_file {
                builder = builder.plan_file(file);
            }
            if let Some(secs) = timeout {
                builder = builder.timeout(Duration::from_secs(secs));
            }
            let options = builder.build().with_default_retryable_errors();
            run_deploy(action.parse()?, options, auto_approve).await
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Run a suite file. Returns whether every case passed.
async fn run_suite(
    suite_path: PathBuf,
    only: Vec<String>,
    max_cases: Option<usize>,
    json: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    info!("Loading suite from: {}", suite_path.display());
    let (suite, mut cases) = load_cases(&suite_path)?;

    if !only.is_empty() {
        if let Some(missing) = only.iter().find(|n| !cases.iter().any(|c| &c.name == *n)) {
            return Err(format!("no case named '{}' in {}", missing, suite_path.display()).into());
        }
        cases.retain(|c| only.contains(&c.name));
    }

    let max = max_cases.or(suite.max_concurrent_cases).unwrap_or(1);
    info!("Running {} case(s), up to {} at a time", cases.len(), max);

    let report = SuiteRunner::new().with_max_concurrent(max).run(cases).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for case in &report.cases {
            let status = match &case.outcome {
                infratest::CaseOutcome::Passed => "PASS".to_string(),
                infratest::CaseOutcome::Skipped => "SKIP".to_string(),
                infratest::CaseOutcome::Fatal(msg) => format!("FAIL ({})", msg),
                infratest::CaseOutcome::AssertionFailed(msg) => format!("FAIL ({})", msg),
            };
            println!("{:<24} {} [{:?}]", case.name, status, case.duration);
            if let Some(err) = &case.destroy_error {
                println!("{:<24} destroy failed: {}", "", err);
            }
        }
        println!(
            "\n{} passed, {} failed, {} skipped",
            report.passed(),
            report.failed(),
            report.skipped()
        );
    }

    Ok(report.success())
}

/// List the cases of a suite file.
fn list_cases(suite_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let (_, cases) = load_cases(&suite_path)?;

    println!("{:<24} {:<10} {:<32} TARGETS", "CASE", "ENABLED", "DIR");
    println!("{}", "-".repeat(80));
    for case in &cases {
        let targets = if case.options.targets().is_empty() {
            "(all)".to_string()
        } else {
            case.options.targets().join(", ")
        };
        println!(
            "{:<24} {:<10} {:<32} {}",
            case.name,
            if case.enabled { "yes" } else { "no" },
            case.options.working_dir().display(),
            targets
        );
    }
    println!("\nTotal: {} case(s)", cases.len());
    Ok(())
}

/// Run one deploy action. Returns whether it succeeded.
async fn run_deploy(action: DeployAction, options: Options, auto_approve: bool) -> bool {
    let deployer = Deployer::new(options).with_auto_approve(auto_approve);
    match deployer.run(action).await {
        Ok(Some(out)) => {
            print!("{}", out);
            true
        }
        Ok(None) => true,
        Err(e) => {
            error!("{}", e);
            if let infratest::DeployError::Step { source, .. } = &e {
                if let Some(infratest::CommandError::Failed { stderr, .. }) = source.command_error() {
                    for line in stderr.trim().lines() {
                        warn!("    stderr: {}", line);
                    }
                }
            }
            false
        }
    }
}

fn parse_vars(raw: &[String]) -> Result<Vars, String> {
    raw.iter()
        .map(|r| {
            Vars::parse_assignment(r).ok_or_else(|| format!("invalid --var '{}', expected NAME=VALUE", r))
        })
        .collect()
}
