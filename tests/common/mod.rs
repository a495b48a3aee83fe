#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::bail;
use image::{GrayImage, Luma};

use gauge_reader::field::{Field, SourceVariant};
use gauge_reader::rotation::Rotation;
use gauge_reader::source::{GroupImages, LoadedImage};
use gauge_reader::{Recognizer, Sample};

/// Distinct 2×2 crop per (field, source): `[[tag, 1], [2, 3]]`.
///
/// Every rotation of every crop has a different byte layout, so a scripted
/// recognizer can tell exactly which crop and orientation it was handed.
pub fn crop(field: Field, source: SourceVariant) -> GrayImage {
    let field_idx = Field::ALL.iter().position(|f| *f == field).unwrap() as u8;
    let tag = 10 + field_idx * 10 + source.index() as u8;
    GrayImage::from_fn(2, 2, |x, y| match (x, y) {
        (0, 0) => Luma([tag]),
        (1, 0) => Luma([1]),
        (0, 1) => Luma([2]),
        _ => Luma([3]),
    })
}

pub fn full_group(id: &str) -> GroupImages {
    let mut group = GroupImages::new(id);
    for field in Field::ALL {
        for source in SourceVariant::ALL {
            group.insert(field, source, LoadedImage::Ready(crop(field, source)));
        }
    }
    group
}

/// Recognizer returning scripted samples keyed by the exact pixels it
/// receives; anything unscripted reads as an empty sample.
#[derive(Default)]
pub struct Script {
    table: HashMap<Vec<u8>, Sample>,
    calls: AtomicUsize,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        &mut self,
        field: Field,
        source: SourceVariant,
        rotation: Rotation,
        text: &str,
        confidence: f64,
    ) -> &mut Self {
        let key = rotation.apply(&crop(field, source)).into_raw();
        self.table.insert(key, Sample::new(text, confidence));
        self
    }

    /// Script the same reading for all three source variants.
    pub fn set_all(&mut self, field: Field, rotation: Rotation, text: &str, confidence: f64) -> &mut Self {
        for source in SourceVariant::ALL {
            self.set(field, source, rotation, text, confidence);
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Recognizer for Script {
    fn name(&self) -> &str {
        "script"
    }

    fn recognize(&self, image: &GrayImage) -> anyhow::Result<Sample> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.table.get(image.as_raw()).cloned().unwrap_or_default())
    }
}

/// Recognizer whose backend always fails.
pub struct Broken;

impl Recognizer for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn recognize(&self, _image: &GrayImage) -> anyhow::Result<Sample> {
        bail!("model session lost")
    }
}
