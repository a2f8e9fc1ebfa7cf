use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Per-run save directory: `<base>/<scenario>/seed-<seed>/<timestamp>`.
pub fn save_dir(base: &Path, scenario: &str, seed: u64) -> PathBuf {
    let ts = Utc::now().format("%Y%m%dT%H%M%S%3f");
    base.join(scenario)
        .join(format!("seed-{seed}"))
        .join(ts.to_string())
}

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse comma-separated numeric seeds.
pub fn parse_seeds(s: &str) -> Result<Vec<u64>> {
    split_csv(s)
        .iter()
        .map(|token| {
            token
                .parse::<u64>()
                .with_context(|| format!("invalid seed {token:?}"))
        })
        .collect()
}
