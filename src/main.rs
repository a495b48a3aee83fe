use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use gauge_reader::config::{load_config, save_config, EvalConfig};
use gauge_reader::enhance::{Enhancer, OcrEnhancer, Passthrough};
use gauge_reader::ocr::oar::{build_pipeline, OarRecognizer};
use gauge_reader::ocr::{Recognizer, Serialized};
use gauge_reader::processor::{run_batch, BatchParams};

#[derive(Parser, Debug)]
#[command(name = "gauge-reader")]
#[command(version, about = "Read angle, temperature and depth gauges from OCR crop groups", long_about = None)]
struct Cli {
    /// Folder holding one sub-folder of crops per group
    input: PathBuf,

    /// Output directory for ocr_results.jsonl
    #[arg(short, long, default_value = "output_readability")]
    out: PathBuf,

    /// PP-OCRv5 recognition model (ONNX)
    #[arg(long, default_value = "models/en_pp-ocrv5_mobile_rec.onnx")]
    rec_model: PathBuf,

    /// Character dictionary matching the recognition model
    #[arg(long, default_value = "models/ppocrv5_en_dict.txt")]
    dict: PathBuf,

    /// JSON configuration file (unset fields keep their defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Worker threads (default: one per core)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Feed crops to the recognizer without enhancement
    #[arg(long)]
    no_enhance: bool,

    /// Never call the recognizer from two workers at once
    #[arg(long)]
    serialize_recognizer: bool,

    /// Override the acceptance threshold
    #[arg(long)]
    threshold: Option<f64>,

    /// Override the largest accepted |angle|
    #[arg(long)]
    angle_limit: Option<f64>,

    /// Override the largest accepted temperature
    #[arg(long)]
    temp_max: Option<f64>,
}

fn effective_config(cli: &Cli) -> Result<EvalConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EvalConfig::default(),
    };
    if let Some(t) = cli.threshold {
        config.score_threshold = t;
    }
    if let Some(a) = cli.angle_limit {
        config.repair.angle_limit_abs = a;
    }
    if let Some(t) = cli.temp_max {
        config.repair.temp_max = t;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = effective_config(&cli)?;

    if let Some(path) = &cli.write_config {
        save_config(path, &config)?;
        println!("Config written to {}", path.display());
        return Ok(());
    }

    let pipeline = build_pipeline(&cli.rec_model, &cli.dict).context("oar-ocr init failed")?;
    log::info!("oar-ocr pipeline ready (model: {})", cli.rec_model.display());
    let recognizer: Box<dyn Recognizer> = if cli.serialize_recognizer {
        Box::new(Serialized::new(OarRecognizer::new(pipeline)))
    } else {
        Box::new(OarRecognizer::new(pipeline))
    };

    let enhancer: Box<dyn Enhancer> = if cli.no_enhance {
        Box::new(Passthrough)
    } else {
        Box::new(OcrEnhancer::new(config.enhance.clone()))
    };

    let params = BatchParams {
        input_dir: cli.input.clone(),
        output_dir: cli.out.clone(),
        jobs: cli.jobs,
    };
    let Some(summary) = run_batch(&params, recognizer.as_ref(), enhancer.as_ref(), &config)? else {
        println!("No crops found in: {}", cli.input.display());
        return Ok(());
    };

    println!("\nSUMMARY");
    println!("OK: {}", summary.ok);
    println!("MISTAKE: {}", summary.mistake);
    println!("JSONL: {}", summary.jsonl.display());
    Ok(())
}
