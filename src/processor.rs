use anyhow::Context;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::EvalConfig;
use crate::enhance::Enhancer;
use crate::evaluator::{GroupEvaluator, GroupResult, Mistake};
use crate::ocr::Recognizer;
use crate::record::{ResultRecord, UNREADABLE};
use crate::source::{load_group, scan_groups, GroupImages};

/// File name of the JSONL output inside the output directory.
pub const RESULTS_FILE: &str = "ocr_results.jsonl";

#[derive(Debug, Clone)]
pub struct BatchParams {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Worker threads; `None` uses rayon's default pool.
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub ok: usize,
    pub mistake: usize,
    pub jsonl: PathBuf,
}

/// Evaluate every group in parallel and return the results ordered by group
/// id (case-insensitive ascending, then byte order).
///
/// A recognizer failure aborts only its own group, reported as
/// `recognizer_error`.
pub fn evaluate_all(
    groups: &[GroupImages],
    recognizer: &dyn Recognizer,
    enhancer: &dyn Enhancer,
    config: &EvalConfig,
) -> Vec<GroupResult> {
    let evaluator = GroupEvaluator::new(recognizer, enhancer, config);
    let mut results: Vec<GroupResult> = groups
        .par_iter()
        .map(|group| evaluate_one(&evaluator, group))
        .collect();
    sort_by_id(&mut results);
    results
}

fn evaluate_one(evaluator: &GroupEvaluator<'_>, group: &GroupImages) -> GroupResult {
    evaluator.evaluate(group).unwrap_or_else(|e| {
        log::warn!("[batch] {}: recognizer failed: {e:#}", group.id);
        GroupResult::aborted(group.id.clone(), Mistake::RecognizerError, Vec::new())
    })
}

fn sort_by_id(results: &mut [GroupResult]) {
    results.sort_by(|a, b| {
        a.id.to_lowercase()
            .cmp(&b.id.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Scan `params.input_dir`, evaluate every group and write one JSON record per
/// line to `<output_dir>/ocr_results.jsonl`.
///
/// Returns `Ok(None)` when the folder holds no recognisable crops.
pub fn run_batch(
    params: &BatchParams,
    recognizer: &dyn Recognizer,
    enhancer: &dyn Enhancer,
    config: &EvalConfig,
) -> anyhow::Result<Option<BatchSummary>> {
    config.validate()?;

    let paths = scan_groups(&params.input_dir)?;
    if paths.is_empty() {
        return Ok(None);
    }
    log::info!(
        "[batch] {} groups under {}",
        paths.len(),
        params.input_dir.display()
    );

    // Each worker decodes, evaluates and drops one group at a time.
    let evaluator = GroupEvaluator::new(recognizer, enhancer, config);
    let run = || -> Vec<GroupResult> {
        let mut results: Vec<GroupResult> = paths
            .par_iter()
            .map(|(id, files)| evaluate_one(&evaluator, &load_group(id, files)))
            .collect();
        sort_by_id(&mut results);
        results
    };
    let results = match params.jobs {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n.max(1))
            .build()
            .context("cannot build worker pool")?
            .install(run),
        None => run(),
    };

    fs::create_dir_all(&params.output_dir)
        .with_context(|| format!("cannot create {}", params.output_dir.display()))?;
    let jsonl = params.output_dir.join(RESULTS_FILE);
    write_jsonl(&jsonl, &results)?;

    let mut summary = BatchSummary {
        ok: 0,
        mistake: 0,
        jsonl,
    };
    for r in &results {
        println!("{}", console_line(r));
        if r.is_ok() {
            summary.ok += 1;
        } else {
            summary.mistake += 1;
        }
    }
    Ok(Some(summary))
}

pub fn write_jsonl(path: &Path, results: &[GroupResult]) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("cannot write {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for r in results {
        writeln!(out, "{}", ResultRecord::from(r).to_json_line()?)?;
    }
    out.flush()?;
    Ok(())
}

/// Human-readable one-liner, e.g.
/// `g1 | OK | rot=180(angle_sign_first) | temp=37.5 | depth=12 | angle=+4.5`.
pub fn console_line(r: &GroupResult) -> String {
    let status = if r.is_ok() { "OK" } else { "MISTAKE" };
    match (&r.rotation, &r.readings) {
        (Some(choice), Some(readings)) => {
            let value = |reading: &crate::field::FieldReading| {
                reading
                    .repaired
                    .as_ref()
                    .map_or_else(|| UNREADABLE.to_string(), ToString::to_string)
            };
            format!(
                "{} | {status} | rot={}({}) | temp={} | depth={} | angle={}",
                r.id,
                choice.rotation.degrees(),
                choice.reason.as_str(),
                value(&readings.temp),
                value(&readings.depth),
                value(&readings.angle),
            )
        }
        _ => {
            let reason = r
                .mistakes
                .first()
                .map(ToString::to_string)
                .unwrap_or_default();
            format!("{} | {status} | {reason}", r.id)
        }
    }
}
