use serde::{Deserialize, Serialize};

use crate::ocr::Sample;
use crate::text::{extract_number, has_sign_prefix, strip_spaces};

/// Additive bonuses that bias candidate ranking toward readings shaped like a
/// gauge value. Applied on top of the raw confidence without renormalising.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreBonuses {
    /// Text contains a parseable number.
    pub numeric: f64,
    /// Text contains a literal decimal point.
    pub decimal: f64,
    /// Text starts with a sign glyph followed by a digit.
    pub signed: f64,
}

impl Default for ScoreBonuses {
    fn default() -> Self {
        Self {
            numeric: 0.05,
            decimal: 0.05,
            signed: 0.08,
        }
    }
}

impl ScoreBonuses {
    /// Ranking score for one recognition. Can exceed 1.0.
    pub fn score(&self, text: &str, confidence: f64) -> f64 {
        let t = strip_spaces(text);
        let mut bonus = 0.0;
        if extract_number(&t).is_some() {
            bonus += self.numeric;
        }
        if t.contains('.') {
            bonus += self.decimal;
        }
        if has_sign_prefix(&t) {
            bonus += self.signed;
        }
        confidence + bonus
    }

    pub fn score_sample(&self, sample: &Sample) -> f64 {
        self.score(&sample.text, sample.confidence)
    }

    /// Pick the best-scoring candidate in enumeration order.
    ///
    /// The incumbent starts as the empty sample, and a candidate only replaces it
    /// when its score is strictly greater, so equal scores keep the earlier one.
    /// Returns `None` when nothing beats the empty sample.
    pub fn best_of<T>(&self, candidates: impl IntoIterator<Item = (T, Sample)>) -> Option<(T, Sample)> {
        let mut best: Option<(T, Sample)> = None;
        let mut best_score = self.score_sample(&Sample::default());
        for (tag, sample) in candidates {
            let s = self.score_sample(&sample);
            if s > best_score {
                best_score = s;
                best = Some((tag, sample));
            }
        }
        best
    }
}

/// First element holding the maximum key. Unlike `Iterator::max_by`, which
/// keeps the last of equal elements, ties resolve to the earliest.
pub fn first_max_by_key<T>(items: impl IntoIterator<Item = T>, key: impl Fn(&T) -> f64) -> Option<T> {
    let mut best: Option<(T, f64)> = None;
    for item in items {
        let k = key(&item);
        match &best {
            Some((_, bk)) if k <= *bk => {}
            _ => best = Some((item, k)),
        }
    }
    best.map(|(item, _)| item)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(text: &str, confidence: f64) -> Sample {
        Sample {
            text: text.to_string(),
            confidence,
        }
    }

    #[test]
    fn bonuses_stack_on_confidence() {
        let b = ScoreBonuses::default();
        assert!((b.score("abc", 0.5) - 0.5).abs() < 1e-12);
        assert!((b.score("12", 0.5) - 0.55).abs() < 1e-12);
        assert!((b.score("12.5", 0.5) - 0.60).abs() < 1e-12);
        assert!((b.score("+12.5", 0.5) - 0.68).abs() < 1e-12);
        assert!(b.score("+12.5", 0.95) > 1.0);
    }

    #[test]
    fn shape_can_outrank_confidence() {
        let b = ScoreBonuses::default();
        assert!(b.score("-4.5", 0.80) > b.score("ABC", 0.92));
    }

    #[test]
    fn best_of_keeps_first_on_tie() {
        let b = ScoreBonuses::default();
        let picked = b.best_of(vec![
            ("sr", sample("12", 0.8)),
            ("v7", sample("34", 0.8)),
            ("v8", sample("5", 0.7)),
        ]);
        assert_eq!(picked.map(|(tag, _)| tag), Some("sr"));
    }

    #[test]
    fn best_of_never_picks_an_empty_sample() {
        let b = ScoreBonuses::default();
        let picked = b.best_of(vec![("sr", Sample::default()), ("v7", sample("", 0.0))]);
        assert!(picked.is_none());
    }

    #[test]
    fn first_max_prefers_earliest() {
        let picked = first_max_by_key(vec![(0, 0.5), (1, 0.9), (2, 0.9)], |(_, v)| *v);
        assert_eq!(picked, Some((1, 0.9)));
        assert_eq!(first_max_by_key(Vec::<(i32, f64)>::new(), |(_, v)| *v), None);
    }
}
