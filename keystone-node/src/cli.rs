use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use keystone_common::review::ArtifactKind;

#[derive(Debug, Parser)]
#[command(name = "keystone", version, about = "Trust-gated validator review for world submissions")]
pub struct Args {
    /// Review configuration (JSON). Defaults apply when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Append decision events to this file.
    #[arg(long, global = true)]
    pub audit_log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify a submitter trust score.
    Tier {
        #[arg(long, allow_negative_numbers = true)]
        trust: f64,
    },

    /// Evaluate a vote file under one strategy.
    Calculate {
        /// JSON array of votes.
        #[arg(long)]
        votes: PathBuf,
        #[arg(long, default_value = "adaptive")]
        strategy: String,
        #[arg(long, allow_negative_numbers = true)]
        submitter_trust: Option<f64>,
    },

    /// Feed a vote file through a full review session.
    Replay {
        #[arg(long)]
        votes: PathBuf,
        #[arg(long, allow_negative_numbers = true)]
        submitter_trust: f64,
        /// Generated when omitted.
        #[arg(long)]
        submission_id: Option<String>,
        #[arg(long, value_enum, default_value_t = ArtifactArg::Schematic)]
        artifact: ArtifactArg,
        /// Overrides `session.deadline_ms` from the config.
        #[arg(long)]
        deadline_ms: Option<u64>,
        /// Delay between consecutive votes.
        #[arg(long, default_value_t = 0)]
        pace_ms: u64,
        /// Wait for the deadline instead of closing after the last vote.
        #[arg(long)]
        await_deadline: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ArtifactArg {
    Schematic,
    ChunkEdit,
}

impl From<ArtifactArg> for ArtifactKind {
    fn from(a: ArtifactArg) -> Self {
        match a {
            ArtifactArg::Schematic => ArtifactKind::Schematic,
            ArtifactArg::ChunkEdit => ArtifactKind::ChunkEdit,
        }
    }
}
