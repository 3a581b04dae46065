use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "costcast", version, about = "Daily cloud billing report delivered to Slack")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "COSTCAST_JSON_LOGS")]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build and deliver the report once, then exit
    Run(RunArgs),
    /// Start the HTTP trigger server
    Serve(ServeArgs),
    /// Check configuration and the billing credential
    Validate,
}

#[derive(Args, Clone)]
pub struct RunArgs {
    /// Report date (YYYY-MM-DD); defaults to today minus REPORT_LAG_DAYS
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Print messages to stdout instead of posting to Slack
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run outcome as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Listen host
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Listen port
    #[arg(long, env = "PORT", default_value = "8080")]
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_parse() {
        let cli = Cli::try_parse_from(["costcast", "-vv", "run", "--date", "2026-10-14", "--dry-run"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.date, NaiveDate::from_ymd_opt(2026, 10, 14));
                assert!(args.dry_run);
                assert!(!args.json);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_bad_date_rejected() {
        assert!(Cli::try_parse_from(["costcast", "run", "--date", "14/10/2026"]).is_err());
    }
}
