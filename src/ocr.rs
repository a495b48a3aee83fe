pub mod oar;

use anyhow::anyhow;
use image::GrayImage;
use std::sync::Mutex;

// ── Public types ─────────────────────────────────────────────────────────────

/// One raw recognition: the text guess and the model's confidence (0.0 – 1.0).
///
/// `Sample::default()` is the empty reading every candidate search starts from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    pub text: String,
    pub confidence: f64,
}

impl Sample {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Every OCR backend implements this.
///
/// `recognize` receives the already rotated and enhanced crop by reference.
/// An `Err` means the backend itself failed (not that the crop was illegible:
/// an illegible crop is an `Ok` sample with empty text or low confidence).
///
/// Implementations must be safe to call from several threads at once. A
/// backend that is not reentrant should be wrapped in [`Serialized`].
pub trait Recognizer: Send + Sync {
    fn name(&self) -> &str;
    fn recognize(&self, image: &GrayImage) -> anyhow::Result<Sample>;
}

impl<R: Recognizer + ?Sized> Recognizer for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, image: &GrayImage) -> anyhow::Result<Sample> {
        (**self).recognize(image)
    }
}

// ── Serialisation wrapper ────────────────────────────────────────────────────

/// Funnels every call to the wrapped recognizer through a mutex so a single
/// handle is never used by two workers at the same time.
pub struct Serialized<R> {
    name: String,
    inner: Mutex<R>,
}

impl<R: Recognizer> Serialized<R> {
    pub fn new(inner: R) -> Self {
        Self {
            name: format!("{} (serialized)", inner.name()),
            inner: Mutex::new(inner),
        }
    }
}

impl<R: Recognizer> Recognizer for Serialized<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn recognize(&self, image: &GrayImage) -> anyhow::Result<Sample> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("{}: recognizer lock poisoned", self.name))?;
        guard.recognize(image)
    }
}
