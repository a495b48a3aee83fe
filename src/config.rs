use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::enhance::EnhanceConfig;
use crate::repair::RepairRules;
use crate::rotation::Rotation;
use crate::scoring::ScoreBonuses;

/// Every tunable of the decision engine.
///
/// All fields are optional in the JSON file; unset fields keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvalConfig {
    /// Minimum raw confidence for a field to count as read.
    pub score_threshold: f64,
    /// Candidate orientations in tie-break order.
    pub rotations: Vec<Rotation>,
    /// Added to the confidence of every unit-hint vote.
    pub unit_hint_bonus: f64,
    pub bonuses: ScoreBonuses,
    pub repair: RepairRules,
    /// Degree-sign variants counted as a temperature hint, besides `c`.
    pub temperature_glyphs: Vec<String>,
    pub enhance: EnhanceConfig,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.70,
            rotations: Rotation::DEFAULT_ORDER.to_vec(),
            unit_hint_bonus: 0.15,
            bonuses: ScoreBonuses::default(),
            repair: RepairRules::default(),
            temperature_glyphs: vec!["°".to_string()],
            enhance: EnhanceConfig::default(),
        }
    }
}

impl EvalConfig {
    /// Reject configurations the evaluator cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rotations.is_empty() {
            bail!("at least one rotation is required");
        }
        for (i, r) in self.rotations.iter().enumerate() {
            if self.rotations[..i].contains(r) {
                bail!("rotation {}° listed twice", r.degrees());
            }
        }
        if !self.score_threshold.is_finite() {
            bail!("score_threshold must be a finite number");
        }
        if self.repair.angle_limit_abs.is_nan() || self.repair.angle_limit_abs <= 0.0 {
            bail!("repair.angle_limit_abs must be positive");
        }
        if self.repair.temp_max.is_nan() || self.repair.temp_max <= 0.0 {
            bail!("repair.temp_max must be positive");
        }
        if self.repair.depth_max_int_digits == 0 {
            bail!("repair.depth_max_int_digits must be at least 1");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<EvalConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let cfg: EvalConfig = serde_json::from_str(&text)
        .with_context(|| format!("parse error in {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

pub fn save_config(path: &Path, config: &EvalConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("cannot create dirs")?;
    }
    let text = serde_json::to_string_pretty(config).context("serialise error")?;
    fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))
}
