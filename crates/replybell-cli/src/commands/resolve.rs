use clap::Args;
use std::path::PathBuf;

use super::load_config;

#[derive(Args)]
pub struct ResolveArgs {
    /// Generation duration in seconds
    duration_secs: f64,
    /// Config file (defaults to the user config)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: ResolveArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.duration_secs.is_finite() || args.duration_secs < 0.0 {
        return Err(format!("invalid duration: {}", args.duration_secs).into());
    }
    let config = load_config(args.config.as_deref())?;
    let rules = config.rule_set()?;
    let rule = rules.resolve(args.duration_secs);

    if args.json {
        let json = serde_json::json!({
            "duration_secs": args.duration_secs,
            "threshold_secs": rule.map(|r| r.threshold_secs),
            "actions": rule
                .map(|r| r.actions.iter().map(|a| a.to_string()).collect::<Vec<_>>())
                .unwrap_or_default(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    match rule {
        Some(rule) if rule.actions.is_empty() => {
            println!("threshold {}s: no actions", rule.threshold_secs);
        }
        Some(rule) => {
            let actions: Vec<String> = rule.actions.iter().map(|a| a.to_string()).collect();
            println!("threshold {}s: {}", rule.threshold_secs, actions.join(", "));
        }
        None => println!("no matching threshold"),
    }
    Ok(())
}
