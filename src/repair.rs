//! Field-specific validation and repair of extracted numeric strings.
//!
//! Every rule either returns a value that passed its physical bounds or rejects
//! the reading. No rule guesses a value outside those bounds.

use serde::{Deserialize, Serialize};

use crate::field::Field;

/// Fractional parts at or below this are treated as integers.
const FRACTION_EPS: f64 = 1e-9;

/// A reading that survived its field's repair rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RepairedValue {
    /// Signed decimal string, sign always present (e.g. `"+45.5"`).
    Angle(String),
    Temperature(f64),
    /// The extracted numeric string exactly as read.
    Depth(String),
}

impl std::fmt::Display for RepairedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepairedValue::Angle(s) | RepairedValue::Depth(s) => f.write_str(s),
            RepairedValue::Temperature(v) => write!(f, "{v:?}"),
        }
    }
}

/// Physical bounds of the instrument. All overridable through the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RepairRules {
    /// Largest accepted |angle|.
    pub angle_limit_abs: f64,
    /// Largest accepted temperature.
    pub temp_max: f64,
    /// Maximum digits before the decimal point of a depth reading.
    pub depth_max_int_digits: usize,
}

impl Default for RepairRules {
    fn default() -> Self {
        Self {
            angle_limit_abs: 100.0,
            temp_max: 80.0,
            depth_max_int_digits: 3,
        }
    }
}

impl RepairRules {
    /// Run the repair rule for `field` on an extracted numeric string.
    pub fn repair(&self, field: Field, num: Option<&str>) -> Option<RepairedValue> {
        let num = num?;
        match field {
            Field::Angle => self.normalize_angle(num).map(RepairedValue::Angle),
            Field::Temperature => self.repair_temp(num).map(RepairedValue::Temperature),
            Field::Depth => self
                .depth_valid(num)
                .then(|| RepairedValue::Depth(num.to_string())),
        }
    }

    /// Default the sign to `+` and bound the magnitude.
    pub fn normalize_angle(&self, num: &str) -> Option<String> {
        let mut s: String = num.chars().filter(|c| *c != ' ').collect();
        if s.is_empty() {
            return None;
        }
        if !s.starts_with(['+', '-']) {
            s.insert(0, '+');
        }
        let v: f64 = s.parse().ok()?;
        if !v.is_finite() || v.abs() > self.angle_limit_abs {
            return None;
        }
        Some(s)
    }

    /// `digits[.digits]` after dropping one sign, with a bounded integer part.
    pub fn depth_valid(&self, num: &str) -> bool {
        let s = strip_sign(num.trim());
        let s: String = s.chars().filter(|c| *c != ' ').collect();
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (s.as_str(), None),
        };
        let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
        all_digits(int_part)
            && frac_part.map_or(true, all_digits)
            && int_part.len() <= self.depth_max_int_digits
    }

    /// Repair a temperature readout, resolving missed decimal points and digit
    /// concatenation in 3+ digit strings.
    pub fn repair_temp(&self, num: &str) -> Option<f64> {
        let s: String = strip_sign(num.trim())
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if s.is_empty() {
            return None;
        }
        if s.contains('.') {
            let v: f64 = s.parse().ok()?;
            return self.within_temp(v);
        }
        if s.len() <= 2 {
            let v: f64 = s.parse::<u32>().ok()? as f64;
            return self.within_temp(v);
        }

        // `s` is ASCII digits only here, so byte slicing is safe.
        let mut candidates = vec![s[..2].to_string(), s[s.len() - 2..].to_string()];
        if s.len() == 3 {
            candidates.push(format!("{}.{}", &s[..2], &s[2..]));
        }

        let valid: Vec<f64> = candidates
            .iter()
            .filter_map(|c| c.parse::<f64>().ok())
            .filter(|c| *c <= self.temp_max)
            .collect();
        if let Some(decimal) = valid.iter().find(|v| (*v - v.trunc()).abs() > FRACTION_EPS) {
            return Some(*decimal);
        }
        valid.into_iter().reduce(f64::min)
    }

    fn within_temp(&self, v: f64) -> Option<f64> {
        (v.is_finite() && v <= self.temp_max).then_some(v)
    }
}

fn strip_sign(s: &str) -> &str {
    s.strip_prefix(['+', '-']).unwrap_or(s)
}
