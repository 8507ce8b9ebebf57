use anyhow::{Context, Result};
use clap::Parser;
use mender::config::Config;
use mender::llm::ModelClient;
use mender::output;
use mender::repair::{self, RepairOrchestrator, RepairSession, SessionOutcome};
use mender::testrun::TestRunner;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mender",
    about = "Run a test suite, ask a model for line edits on failure, apply, repeat",
    version
)]
struct Args {
    /// Path to the script under repair
    script: PathBuf,

    /// Test identifier handed to the test runner
    #[arg(required_unless_present = "revert")]
    test_id: Option<String>,

    /// Maximum number of repair attempts
    #[arg(short = 'r', long, default_value_t = 3)]
    retry_limit: u32,

    /// Restore the pre-repair backup and exit
    #[arg(long)]
    revert: bool,

    /// Model identifier (defaults to MENDER_MODEL, then a built-in default)
    #[arg(short, long)]
    model: Option<String>,

    /// Test runner program
    #[arg(long, default_value = "pytest")]
    runner: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.revert {
        if repair::revert(&args.script)? {
            println!("Reverted changes to {}", args.script.display());
            return Ok(());
        }
        eprintln!("No backup file found for {}", args.script.display());
        std::process::exit(1);
    }

    let test_id = args
        .test_id
        .context("a test identifier is required unless --revert is given")?;

    let config = Config::load();
    let model = config.model(args.model.as_deref());
    let client = ModelClient::from_config(&config, model)?;
    let runner = TestRunner::new(&args.runner);

    let session = RepairSession {
        script: args.script,
        test_id,
        retry_limit: args.retry_limit,
    };

    let mut orchestrator = RepairOrchestrator::new(client, runner, session);
    match orchestrator.run().await? {
        SessionOutcome::Passed { .. } => Ok(()),
        SessionOutcome::BudgetExhausted { attempts } => {
            output::print_error(&format!(
                "tests still failing after {attempts} attempts; the backup is untouched (use --revert to restore)"
            ));
            std::process::exit(1);
        }
    }
}
