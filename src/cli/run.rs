use crate::cli::commands::RunArgs;
use crate::config;
use crate::errors::ReportError;
use crate::notify::ThreadStatus;
use crate::pipeline::{RunOutcome, RunRequest};
use crate::utils::formatting::{format_amount, format_duration};

/// Run once and return the process exit code.
pub async fn handle_run(args: RunArgs) -> Result<i32, ReportError> {
    let outcome = match super::prepare(config::load_from_env(), args.dry_run) {
        Ok(orchestrator) => orchestrator.run(RunRequest { target_date: args.date }).await,
        Err(outcome) => outcome,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(outcome.exit_code)
}

fn print_outcome(outcome: &RunOutcome) {
    let date = outcome
        .report_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());

    if outcome.is_success() {
        println!(
            "Report for {} delivered: {} {} in {}",
            date,
            format_amount(outcome.overall_total.unwrap_or_default()),
            outcome.currency.as_deref().unwrap_or(""),
            format_duration(outcome.duration_ms),
        );
        for thread in &outcome.threads {
            if let ThreadStatus::Failed { reason } = &thread.status {
                println!("  thread for {} failed: {}", thread.project_id, reason);
            }
        }
    } else {
        eprintln!(
            "Report for {} failed while {} ({}): {}",
            date,
            outcome.stage,
            outcome.error_type.as_deref().unwrap_or("InternalError"),
            outcome.error.as_deref().unwrap_or(""),
        );
    }
}
