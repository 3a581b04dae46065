use crate::config::{self, BillingCredential};
use crate::errors::ReportError;

/// Load configuration and the billing credential without contacting any
/// service, and print what was found.
pub async fn handle_validate() -> Result<i32, ReportError> {
    let config = config::load_from_env()?;
    let credential = BillingCredential::load(&config.credentials_path)?;

    println!("Configuration is valid");
    println!("  billing table:      {}", config.billing_table);
    println!("  credential:         {} ({})", credential.identity(), credential.source().display());
    println!("  job project:        {}", credential.project_id().unwrap_or(&config.billing_table.project));
    println!("  report lag:         {} days", config.lag_days);
    println!("  project breakdown:  {}", config.include_breakdown);
    println!("  thread details:     {}", config.include_thread_detail);
    println!("  failure alerts:     {}", config.send_failure_alerts);
    println!("  top projects:       {}", config.top_n);
    println!("  run timeout:        {}s", config.run_timeout.as_secs());
    println!("  trigger auth:       {}", if config.trigger_token.is_some() { "enabled" } else { "disabled" });
    Ok(0)
}
