//! Orientation hypotheses and the per-group rotation vote.
//!
//! The vote runs three tiers, each of which either settles the rotation or
//! defers to the next:
//!
//! 1. `angle_sign_first`: some rotation makes the angle gauge read as a
//!    signed number; the most confident such rotation wins.
//! 2. `unit_hint`: unit glyphs (`c`/degree on temperature, `m` on depth) are
//!    only legible the right way up; the rotation with the largest weighted
//!    vote wins if any vote was cast.
//! 3. `fallback_best_angle_score`: the rotation whose angle probe was read
//!    with the highest confidence.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::config::EvalConfig;
use crate::field::{Field, SourceVariant};
use crate::ocr::Sample;
use crate::probe::Prober;
use crate::scoring::first_max_by_key;
use crate::text::{has_depth_hint, has_sign_prefix, has_temperature_hint};

/// Physical orientation correction applied to every crop of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    Upright,
    /// Quarter turn clockwise (+90).
    Clockwise,
    /// Quarter turn counter-clockwise (-90).
    CounterClockwise,
    HalfTurn,
}

impl Rotation {
    /// Candidate order used when none is configured.
    pub const DEFAULT_ORDER: [Rotation; 4] = [
        Rotation::Upright,
        Rotation::Clockwise,
        Rotation::CounterClockwise,
        Rotation::HalfTurn,
    ];

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Upright => 0,
            Rotation::Clockwise => 90,
            Rotation::CounterClockwise => -90,
            Rotation::HalfTurn => 180,
        }
    }

    pub fn apply(self, image: &GrayImage) -> GrayImage {
        match self {
            Rotation::Upright => image.clone(),
            Rotation::Clockwise => image::imageops::rotate90(image),
            Rotation::CounterClockwise => image::imageops::rotate270(image),
            Rotation::HalfTurn => image::imageops::rotate180(image),
        }
    }
}

impl TryFrom<i32> for Rotation {
    type Error = String;

    fn try_from(deg: i32) -> Result<Self, Self::Error> {
        match deg {
            0 => Ok(Rotation::Upright),
            90 => Ok(Rotation::Clockwise),
            -90 | 270 => Ok(Rotation::CounterClockwise),
            180 | -180 => Ok(Rotation::HalfTurn),
            other => Err(format!("unsupported rotation {other}° (expected 0, 90, -90 or 180)")),
        }
    }
}

impl From<Rotation> for i32 {
    fn from(r: Rotation) -> i32 {
        r.degrees()
    }
}

/// Which tier of the vote settled the rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationReason {
    AngleSignFirst,
    UnitHint,
    FallbackBestAngleScore,
}

impl RotationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RotationReason::AngleSignFirst => "angle_sign_first",
            RotationReason::UnitHint => "unit_hint",
            RotationReason::FallbackBestAngleScore => "fallback_best_angle_score",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationChoice {
    pub rotation: Rotation,
    pub reason: RotationReason,
}

/// Decide the single rotation for a whole group.
///
/// `config.rotations` must be non-empty (checked by `EvalConfig::validate`).
pub fn select_rotation(prober: &mut Prober<'_>, config: &EvalConfig) -> anyhow::Result<RotationChoice> {
    let rotations = &config.rotations;
    anyhow::ensure!(!rotations.is_empty(), "no candidate rotations configured");

    // Angle probe: best angle-field recognition per rotation.
    let mut probes: Vec<(Rotation, Sample)> = Vec::with_capacity(rotations.len());
    for &rot in rotations {
        let mut candidates = Vec::with_capacity(SourceVariant::ALL.len());
        for source in SourceVariant::ALL {
            candidates.push((source, prober.probe(Field::Angle, source, rot)?));
        }
        let best = config
            .bonuses
            .best_of(candidates)
            .map(|(_, s)| s)
            .unwrap_or_default();
        probes.push((rot, best));
    }

    // Tier 1: a signed angle reading.
    let signed = probes.iter().filter(|(_, s)| has_sign_prefix(&s.text));
    if let Some((rot, _)) = first_max_by_key(signed, |(_, s)| s.confidence) {
        log::debug!("[rotation] {}° via signed angle", rot.degrees());
        return Ok(RotationChoice {
            rotation: *rot,
            reason: RotationReason::AngleSignFirst,
        });
    }

    // Tier 2: unit glyph votes from temperature and depth crops.
    let mut votes: Vec<(Rotation, f64)> = Vec::with_capacity(rotations.len());
    for &rot in rotations {
        let mut sum = 0.0;
        for source in SourceVariant::ALL {
            let s = prober.probe(Field::Temperature, source, rot)?;
            if has_temperature_hint(&s.text, &config.temperature_glyphs) {
                sum += s.confidence + config.unit_hint_bonus;
            }
        }
        for source in SourceVariant::ALL {
            let s = prober.probe(Field::Depth, source, rot)?;
            if has_depth_hint(&s.text) {
                sum += s.confidence + config.unit_hint_bonus;
            }
        }
        votes.push((rot, sum));
    }
    if let Some((rot, sum)) = first_max_by_key(votes.iter(), |(_, v)| *v) {
        if *sum > 0.0 {
            log::debug!("[rotation] {}° via unit hints (vote {sum:.3})", rot.degrees());
            return Ok(RotationChoice {
                rotation: *rot,
                reason: RotationReason::UnitHint,
            });
        }
    }

    // Tier 3: most confident angle probe.
    let rotation = first_max_by_key(probes.iter(), |(_, s)| s.confidence)
        .map(|(rot, _)| *rot)
        .unwrap_or(rotations[0]);
    log::debug!("[rotation] {}° via fallback angle score", rotation.degrees());
    Ok(RotationChoice {
        rotation,
        reason: RotationReason::FallbackBestAngleScore,
    })
}
