use serde::{Serialize, Serializer};

use crate::config::EvalConfig;
use crate::ocr::Sample;
use crate::probe::Prober;
use crate::repair::{RepairRules, RepairedValue};
use crate::rotation::Rotation;
use crate::text::extract_number;

/// The three gauge readouts captured per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Angle,
    Temperature,
    Depth,
}

impl Field {
    /// Evaluation order: angle, temperature, depth.
    pub const ALL: [Field; 3] = [Field::Angle, Field::Temperature, Field::Depth];

    /// Spelling used in image keys, reason codes and result records.
    pub fn key(self) -> &'static str {
        match self {
            Field::Angle => "angle",
            Field::Temperature => "temp",
            Field::Depth => "depth",
        }
    }
}

/// One of the independently produced images of the same field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceVariant {
    Sr,
    V7,
    V8,
}

impl SourceVariant {
    /// Probe order; earlier variants win ties.
    pub const ALL: [SourceVariant; 3] = [SourceVariant::Sr, SourceVariant::V7, SourceVariant::V8];

    pub fn key(self) -> &'static str {
        match self {
            SourceVariant::Sr => "sr",
            SourceVariant::V7 => "v7",
            SourceVariant::V8 => "v8",
        }
    }

    pub fn index(self) -> usize {
        match self {
            SourceVariant::Sr => 0,
            SourceVariant::V7 => 1,
            SourceVariant::V8 => 2,
        }
    }
}

impl Serialize for SourceVariant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

/// `{field}_{source}` key of the image-source contract, e.g. `"temp_v7"`.
pub fn image_key(field: Field, source: SourceVariant) -> String {
    format!("{}_{}", field.key(), source.key())
}

/// One value per field. Serialises as `{"temp", "depth", "angle"}` in that order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerField<T> {
    pub temp: T,
    pub depth: T,
    pub angle: T,
}

impl<T> PerField<T> {
    pub fn get(&self, field: Field) -> &T {
        match field {
            Field::Angle => &self.angle,
            Field::Temperature => &self.temp,
            Field::Depth => &self.depth,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> PerField<U> {
        PerField {
            temp: f(&self.temp),
            depth: f(&self.depth),
            angle: f(&self.angle),
        }
    }

    /// Build from a fallible constructor, invoked in `Field::ALL` order.
    pub fn try_from_fn<E>(mut f: impl FnMut(Field) -> Result<T, E>) -> Result<Self, E> {
        let angle = f(Field::Angle)?;
        let temp = f(Field::Temperature)?;
        let depth = f(Field::Depth)?;
        Ok(PerField { temp, depth, angle })
    }
}

/// Best recognition of a field at one rotation, before repair.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    /// `None` when no variant produced anything better than an empty sample.
    pub source: Option<SourceVariant>,
    pub sample: Sample,
}

/// Probe all source variants of `field` at `rotation` and keep the best
/// scoring one.
pub fn read_field(
    prober: &mut Prober<'_>,
    field: Field,
    rotation: Rotation,
    config: &EvalConfig,
) -> anyhow::Result<RawReading> {
    let mut candidates = Vec::with_capacity(SourceVariant::ALL.len());
    for source in SourceVariant::ALL {
        candidates.push((source, prober.probe(field, source, rotation)?));
    }
    let reading = match config.bonuses.best_of(candidates) {
        Some((source, sample)) => RawReading {
            source: Some(source),
            sample,
        },
        None => RawReading {
            source: None,
            sample: Sample::default(),
        },
    };
    log::debug!(
        "[field] {} rot={} best={} {:?}",
        field.key(),
        rotation.degrees(),
        reading.source.map_or("none", SourceVariant::key),
        reading.sample.text
    );
    Ok(reading)
}

/// Final per-field outcome of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldReading {
    pub source: Option<SourceVariant>,
    pub text: String,
    /// Raw recognizer confidence of the chosen sample.
    pub score: f64,
    pub repaired: Option<RepairedValue>,
}

impl FieldReading {
    pub fn from_raw(field: Field, raw: RawReading, rules: &RepairRules) -> Self {
        let number = extract_number(&raw.sample.text);
        let repaired = rules.repair(field, number.as_deref());
        Self {
            source: raw.source,
            text: raw.sample.text,
            score: raw.sample.confidence,
            repaired,
        }
    }
}
