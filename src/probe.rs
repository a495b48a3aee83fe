use image::GrayImage;
use std::collections::HashMap;

use crate::enhance::Enhancer;
use crate::field::{Field, PerField, SourceVariant};
use crate::ocr::{Recognizer, Sample};
use crate::rotation::Rotation;

/// Decoded crops of one group, indexed by field and source variant.
pub type GroupCrops<'a> = PerField<[&'a GrayImage; 3]>;

/// Rotate → enhance → recognize, memoised per (field, source, rotation)
/// for the lifetime of one group evaluation.
pub struct Prober<'a> {
    recognizer: &'a dyn Recognizer,
    enhancer: &'a dyn Enhancer,
    crops: GroupCrops<'a>,
    cache: HashMap<(Field, SourceVariant, Rotation), Sample>,
}

impl<'a> Prober<'a> {
    pub fn new(
        recognizer: &'a dyn Recognizer,
        enhancer: &'a dyn Enhancer,
        crops: GroupCrops<'a>,
    ) -> Self {
        Self {
            recognizer,
            enhancer,
            crops,
            cache: HashMap::new(),
        }
    }

    pub fn probe(
        &mut self,
        field: Field,
        source: SourceVariant,
        rotation: Rotation,
    ) -> anyhow::Result<Sample> {
        let key = (field, source, rotation);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }

        let crop = self.crops.get(field)[source.index()];
        let prepared = self.enhancer.enhance(&rotation.apply(crop));
        let sample = self.recognizer.recognize(&prepared)?;
        log::trace!(
            "[ocr] {}_{} rot={} → {:?} conf={:.3}",
            field.key(),
            source.key(),
            rotation.degrees(),
            sample.text,
            sample.confidence
        );

        self.cache.insert(key, sample.clone());
        Ok(sample)
    }

    /// Number of distinct recognitions performed so far.
    pub fn recognitions(&self) -> usize {
        self.cache.len()
    }
}
