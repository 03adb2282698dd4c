use std::{sync::Arc, time::Duration};

use clap::Parser;
use tracing::{error, info};

use keystone_consensus::{ReviewConfig, ReviewEngine, TracingObserver};
use keystone_node::{
    cli::{Args, Command},
    commands::{load_votes, run_calculate, run_replay, run_tier, ReplayOptions},
    logging::init_tracing,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _guard = init_tracing(args.audit_log.as_deref());

    let mut config = match &args.config {
        Some(path) => {
            info!("Config: {}", path.display());
            ReviewConfig::load_from_file(path)?
        }
        None => ReviewConfig::default(),
    };

    if let Command::Replay { deadline_ms: Some(deadline_ms), .. } = &args.command {
        config.session.deadline_ms = *deadline_ms;
        config.validate()?;
    }

    let engine = ReviewEngine::new(&config, Arc::new(TracingObserver));

    let output = match args.command {
        Command::Tier { trust } => serde_json::to_string_pretty(&run_tier(&engine, trust))?,
        Command::Calculate { votes, strategy, submitter_trust } => {
            let votes = load_votes(&votes)?;
            match run_calculate(&engine, &votes, &strategy, submitter_trust) {
                Ok(result) => serde_json::to_string_pretty(&result)?,
                Err(e) => {
                    error!("Failed to evaluate votes: {}", e);
                    return Err(e.into());
                }
            }
        }
        Command::Replay {
            votes,
            submitter_trust,
            submission_id,
            artifact,
            pace_ms,
            await_deadline,
            ..
        } => {
            let votes = load_votes(&votes)?;
            let options = ReplayOptions {
                submission_id,
                artifact: artifact.into(),
                submitter_trust,
                pace: Duration::from_millis(pace_ms),
                await_deadline,
            };
            let outcome = run_replay(&engine, votes, options).await?;
            serde_json::to_string_pretty(&outcome)?
        }
    };

    println!("{}", output);
    Ok(())
}
