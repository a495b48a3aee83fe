//! Decision and fusion engine for reading instrument gauges from OCR'd crops.
//!
//! Each group (one photographed instrument) provides three source variants of
//! an angle, a temperature and a depth crop. The [`evaluator::GroupEvaluator`]
//! picks one rotation for the whole group, reads every field at that
//! rotation, repairs the raw text into a bounded physical value and classifies
//! the group as OK or MISTAKE.

pub mod config;
pub mod enhance;
pub mod evaluator;
pub mod field;
pub mod ocr;
pub mod probe;
pub mod processor;
pub mod record;
pub mod repair;
pub mod rotation;
pub mod scoring;
pub mod source;
pub mod text;

pub use config::EvalConfig;
pub use evaluator::{GroupEvaluator, GroupResult, Mistake, Status};
pub use ocr::{Recognizer, Sample};
