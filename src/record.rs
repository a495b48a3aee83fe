//! JSONL result records: the stable contract with downstream consumers.

use serde::Serialize;

use crate::evaluator::{GroupResult, Mistake, Status};
use crate::field::{FieldReading, PerField, SourceVariant};
use crate::repair::RepairedValue;

/// Written in place of a value that failed repair.
pub const UNREADABLE: &str = "UNREADABLE";

/// A field value as it appears under `values`: temperatures are numbers, angle
/// and depth keep their textual form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordValue {
    Number(f64),
    Text(String),
}

impl RecordValue {
    fn from_repaired(value: Option<&RepairedValue>) -> Self {
        match value {
            Some(RepairedValue::Temperature(v)) => RecordValue::Number(*v),
            Some(RepairedValue::Angle(s) | RepairedValue::Depth(s)) => RecordValue::Text(s.clone()),
            None => RecordValue::Text(UNREADABLE.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub rotation: i32,
    pub rotation_reason: &'static str,
    pub values: PerField<RecordValue>,
    pub sources: PerField<&'static str>,
    pub scores: PerField<f64>,
    pub raw_text: PerField<String>,
}

/// One line of `ocr_results.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub id: String,
    pub status: Status,
    /// Whole-group rejection reason; only set when no evaluation took place.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
    #[serde(flatten)]
    pub evaluation: Option<Evaluation>,
    pub mistakes: Vec<Mistake>,
}

impl From<&GroupResult> for ResultRecord {
    fn from(result: &GroupResult) -> Self {
        let evaluation = match (&result.rotation, &result.readings) {
            (Some(choice), Some(readings)) => Some(Evaluation {
                rotation: choice.rotation.degrees(),
                rotation_reason: choice.reason.as_str(),
                values: readings.map(|r: &FieldReading| RecordValue::from_repaired(r.repaired.as_ref())),
                sources: readings.map(|r| r.source.map_or("none", SourceVariant::key)),
                scores: readings.map(|r| r.score),
                raw_text: readings.map(|r| r.text.clone()),
            }),
            _ => None,
        };
        let reason = match evaluation {
            Some(_) => None,
            None => result.mistakes.first().map(ToString::to_string),
        };
        ResultRecord {
            id: result.id.clone(),
            status: result.status,
            reason,
            missing: result.missing.clone(),
            evaluation,
            mistakes: result.mistakes.clone(),
        }
    }
}

impl ResultRecord {
    /// Serialise as a single JSON line (no trailing newline).
    pub fn to_json_line(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
