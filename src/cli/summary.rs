use crate::cli::run::RunOutcome;
use crate::error::Result;
use crate::fileio::create_file;
use crate::pipeline::{Action, RunTotals, StreamStatus};
use crate::tier::KeyTier;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Machine-readable digest of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub action: Action,
    pub key_tier: KeyTier,
    pub key_bits: Option<usize>,
    #[serde(flatten)]
    pub totals: RunTotals,
    pub chunk_capacity: usize,
    pub status: StreamStatus,
}

impl RunSummary {
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        Self {
            action: outcome.action,
            key_tier: outcome.tier,
            key_bits: outcome.tier.bits(),
            totals: outcome.totals,
            chunk_capacity: outcome.chunk_capacity,
            status: outcome.status,
        }
    }
}

/// Write the summary as pretty JSON
pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let mut file = create_file("summary", path)?;
    serde_json::to_writer_pretty(&mut file, summary)?;
    writeln!(file)?;
    Ok(())
}
