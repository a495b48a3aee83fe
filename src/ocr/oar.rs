use anyhow::{anyhow, Context};
use image::{DynamicImage, GrayImage};
use oar_ocr::predictors::TextRecognitionPredictor;
use std::path::Path;

use super::{Recognizer, Sample};

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Thin wrapper that owns the PP-OCRv5 recognition predictor.
pub struct OarPipeline {
    rec: TextRecognitionPredictor,
}

// ONNX Runtime sessions are not `Send`/`Sync` by default, but in practice the
// recognition predictor is stateless between calls and safe to share.
unsafe impl Send for OarPipeline {}
unsafe impl Sync for OarPipeline {}

/// Build a recognition-only pipeline (no text-detection step: gauge crops are
/// already cut to the readout).
pub fn build_pipeline(rec_model: &Path, dict: &Path) -> anyhow::Result<OarPipeline> {
    let rec = TextRecognitionPredictor::builder()
        .dict_path(dict)
        // score_threshold(0): acceptance is decided by the evaluator.
        .score_threshold(0.0)
        .build(rec_model)
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("loading recognition model {}", rec_model.display()))?;
    Ok(OarPipeline { rec })
}

// ── Recognizer impl ───────────────────────────────────────────────────────────

pub struct OarRecognizer {
    pipeline: OarPipeline,
}

impl OarRecognizer {
    pub fn new(pipeline: OarPipeline) -> Self {
        Self { pipeline }
    }
}

impl Recognizer for OarRecognizer {
    fn name(&self) -> &str {
        "oar-ocr/gray"
    }

    fn recognize(&self, image: &GrayImage) -> anyhow::Result<Sample> {
        // The model expects three channels; replicate luma into L, L, L.
        let rgb = DynamicImage::ImageLuma8(image.clone()).to_rgb8();

        let result = self
            .pipeline
            .rec
            .predict(vec![rgb])
            .map_err(|e| anyhow!("oar-ocr predict failed: {e}"))?;

        let text = result
            .texts
            .into_iter()
            .next()
            .map(|t| t.trim().to_string())
            .unwrap_or_default();
        let score = result.scores.into_iter().next().unwrap_or(0.0);

        log::trace!(
            "[oar] {}×{} → {:?} conf={score:.3}",
            image.width(),
            image.height(),
            text
        );

        Ok(Sample {
            text,
            confidence: score as f64,
        })
    }
}
