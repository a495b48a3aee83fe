use serde::{Serialize, Serializer};
use std::fmt;

use crate::config::EvalConfig;
use crate::enhance::Enhancer;
use crate::field::{image_key, read_field, Field, FieldReading, PerField, SourceVariant};
use crate::ocr::Recognizer;
use crate::probe::{GroupCrops, Prober};
use crate::rotation::{select_rotation, RotationChoice};
use crate::source::{GroupImages, LoadedImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "MISTAKE")]
    Mistake,
}

/// Reason code contributing to a MISTAKE classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mistake {
    MissingFiles,
    CantReadImage,
    /// The recognizer backend failed; raised by the batch layer, never by the
    /// evaluator itself.
    RecognizerError,
    Invalid(Field),
    LowScore(Field),
}

impl fmt::Display for Mistake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mistake::MissingFiles => f.write_str("missing_files"),
            Mistake::CantReadImage => f.write_str("cant_read_image"),
            Mistake::RecognizerError => f.write_str("recognizer_error"),
            Mistake::Invalid(field) => write!(f, "{}_invalid", field.key()),
            Mistake::LowScore(field) => write!(f, "{}_low_score", field.key()),
        }
    }
}

impl Serialize for Mistake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of evaluating one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupResult {
    pub id: String,
    pub status: Status,
    /// `None` when the group was rejected before any recognition.
    pub rotation: Option<RotationChoice>,
    pub readings: Option<PerField<FieldReading>>,
    /// Absent image keys, for `missing_files` rejections.
    pub missing: Vec<String>,
    pub mistakes: Vec<Mistake>,
}

impl GroupResult {
    /// A group rejected as a whole, without per-field readings.
    pub fn aborted(id: impl Into<String>, reason: Mistake, missing: Vec<String>) -> Self {
        Self {
            id: id.into(),
            status: Status::Mistake,
            rotation: None,
            readings: None,
            missing,
            mistakes: vec![reason],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

/// Evaluates groups against one recognizer, enhancer and configuration.
///
/// Holds no per-group state, so a single evaluator can be shared by every
/// worker of a batch.
pub struct GroupEvaluator<'a> {
    recognizer: &'a dyn Recognizer,
    enhancer: &'a dyn Enhancer,
    config: &'a EvalConfig,
}

impl<'a> GroupEvaluator<'a> {
    pub fn new(
        recognizer: &'a dyn Recognizer,
        enhancer: &'a dyn Enhancer,
        config: &'a EvalConfig,
    ) -> Self {
        Self {
            recognizer,
            enhancer,
            config,
        }
    }

    /// Classify one group.
    ///
    /// Missing or undecodable inputs yield a MISTAKE result without touching
    /// the recognizer. An `Err` is only returned when the recognizer fails.
    pub fn evaluate(&self, group: &GroupImages) -> anyhow::Result<GroupResult> {
        let crops = match collect_crops(group) {
            Ok(crops) => crops,
            Err(result) => return Ok(*result),
        };

        let mut prober = Prober::new(self.recognizer, self.enhancer, crops);
        let choice = select_rotation(&mut prober, self.config)?;

        let readings = PerField::try_from_fn(|field| {
            let raw = read_field(&mut prober, field, choice.rotation, self.config)?;
            Ok::<_, anyhow::Error>(FieldReading::from_raw(field, raw, &self.config.repair))
        })?;
        log::debug!(
            "[eval] {}: {} recognitions at rot={}",
            group.id,
            prober.recognitions(),
            choice.rotation.degrees()
        );

        let mut mistakes = Vec::new();
        for field in Field::ALL {
            if readings.get(field).repaired.is_none() {
                mistakes.push(Mistake::Invalid(field));
            }
        }
        for field in Field::ALL {
            if readings.get(field).score < self.config.score_threshold {
                mistakes.push(Mistake::LowScore(field));
            }
        }

        Ok(GroupResult {
            id: group.id.clone(),
            status: if mistakes.is_empty() {
                Status::Ok
            } else {
                Status::Mistake
            },
            rotation: Some(choice),
            readings: Some(readings),
            missing: Vec::new(),
            mistakes,
        })
    }
}

/// Resolve all nine crops, or the rejection explaining why they are not usable.
fn collect_crops(group: &GroupImages) -> Result<GroupCrops<'_>, Box<GroupResult>> {
    let missing: Vec<String> = Field::ALL
        .iter()
        .flat_map(|&f| SourceVariant::ALL.map(|s| image_key(f, s)))
        .filter(|k| !group.images.contains_key(k))
        .collect();
    if !missing.is_empty() {
        log::warn!("[eval] {}: missing {}", group.id, missing.join(", "));
        return Err(Box::new(GroupResult::aborted(
            group.id.clone(),
            Mistake::MissingFiles,
            missing,
        )));
    }

    let unreadable = || {
        Box::new(GroupResult::aborted(
            group.id.clone(),
            Mistake::CantReadImage,
            Vec::new(),
        ))
    };
    PerField::try_from_fn(|field| {
        let mut out = Vec::with_capacity(SourceVariant::ALL.len());
        for source in SourceVariant::ALL {
            match group.images.get(&image_key(field, source)) {
                Some(LoadedImage::Ready(img)) => out.push(img),
                _ => return Err(unreadable()),
            }
        }
        Ok([out[0], out[1], out[2]])
    })
}
