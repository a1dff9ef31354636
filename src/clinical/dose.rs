//! Dose strings, units, and the arithmetic the validator applies to them.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::types::CdsError;

static RE_DOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)?\s*(mcg|ug|µg|mg|g|kg|ml|l|units?|iu)\s*$")
        .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Mass,
    Volume,
    Units,
    InternationalUnits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DoseUnit {
    #[serde(rename = "mcg")]
    Microgram,
    #[serde(rename = "mg")]
    Milligram,
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "ml")]
    Milliliter,
    #[serde(rename = "l")]
    Liter,
    #[serde(rename = "units")]
    Unit,
    #[serde(rename = "iu")]
    InternationalUnit,
}

impl DoseUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Microgram => "mcg",
            Self::Milligram => "mg",
            Self::Gram => "g",
            Self::Kilogram => "kg",
            Self::Milliliter => "ml",
            Self::Liter => "l",
            Self::Unit => "units",
            Self::InternationalUnit => "iu",
        }
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            Self::Microgram | Self::Milligram | Self::Gram | Self::Kilogram => Dimension::Mass,
            Self::Milliliter | Self::Liter => Dimension::Volume,
            Self::Unit => Dimension::Units,
            Self::InternationalUnit => Dimension::InternationalUnits,
        }
    }

    /// Multiplier to the dimension's base unit (mg for mass, ml for volume).
    fn base_factor(&self) -> f64 {
        match self {
            Self::Microgram => 0.001,
            Self::Milligram => 1.0,
            Self::Gram => 1_000.0,
            Self::Kilogram => 1_000_000.0,
            Self::Milliliter => 1.0,
            Self::Liter => 1_000.0,
            Self::Unit | Self::InternationalUnit => 1.0,
        }
    }
}

impl std::fmt::Display for DoseUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DoseUnit {
    type Err = CdsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mcg" | "ug" | "µg" => Ok(Self::Microgram),
            "mg" => Ok(Self::Milligram),
            "g" => Ok(Self::Gram),
            "kg" => Ok(Self::Kilogram),
            "ml" => Ok(Self::Milliliter),
            "l" => Ok(Self::Liter),
            "unit" | "units" => Ok(Self::Unit),
            "iu" => Ok(Self::InternationalUnit),
            other => Err(CdsError::InvalidDoseFormat(format!("unknown unit '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dose {
    pub amount: f64,
    pub unit: DoseUnit,
}

impl Dose {
    pub fn convert_to(&self, to: DoseUnit) -> Result<Dose, CdsError> {
        Ok(Dose {
            amount: convert(self.amount, self.unit, to)?,
            unit: to,
        })
    }
}

impl std::fmt::Display for Dose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", format_amount(self.amount), self.unit)
    }
}

/// Parse "500mg", "0.5 g", "10 units". A bare unit ("mg") means one unit.
pub fn parse_dose(raw: &str) -> Result<Dose, CdsError> {
    let caps = RE_DOSE
        .captures(raw)
        .ok_or_else(|| CdsError::InvalidDoseFormat(raw.to_string()))?;

    let amount = match caps.get(1) {
        Some(m) => m
            .as_str()
            .parse::<f64>()
            .map_err(|_| CdsError::InvalidDoseFormat(raw.to_string()))?,
        None => 1.0,
    };
    let unit = match caps.get(2) {
        Some(m) => DoseUnit::from_str(m.as_str())?,
        None => return Err(CdsError::InvalidDoseFormat(raw.to_string())),
    };

    Ok(Dose { amount, unit })
}

/// Parse `raw` and express it in `to_unit`.
pub fn convert_dose(raw: &str, to_unit: &str) -> Result<Dose, CdsError> {
    let to = DoseUnit::from_str(to_unit)?;
    parse_dose(raw)?.convert_to(to)
}

/// Convert an amount between units of the same dimension.
pub fn convert(amount: f64, from: DoseUnit, to: DoseUnit) -> Result<f64, CdsError> {
    if from == to {
        return Ok(amount);
    }
    if from.dimension() != to.dimension() {
        return Err(CdsError::UnsupportedConversion {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    Ok(amount * from.base_factor() / to.base_factor())
}

/// Young's Rule: child dose = age / (age + 12) × adult dose.
pub fn youngs_rule(adult_dose: f64, age_years: f64) -> f64 {
    age_years / (age_years + 12.0) * adult_dose
}

/// Clark's Rule: child dose = weight (kg) / 70 × adult dose.
pub fn clarks_rule(adult_dose: f64, weight_kg: f64) -> f64 {
    weight_kg / 70.0 * adult_dose
}

/// Renal reduction. Returns (adjusted dose, percent applied); below the
/// threshold the dose shrinks by `reduction_percent`, otherwise unchanged.
pub fn renal_adjustment(dose: f64, gfr: f64, gfr_threshold: f64, reduction_percent: f64) -> (f64, f64) {
    if gfr < gfr_threshold {
        (dose * (1.0 - reduction_percent / 100.0), reduction_percent)
    } else {
        (dose, 0.0)
    }
}

/// Administrations per day for a frequency string. `None` for as-needed or
/// unrecognised schedules.
pub fn doses_per_day(frequency: &str) -> Option<f64> {
    let f = frequency.trim().to_lowercase();
    if f.is_empty() || f.contains("prn") || f.contains("as needed") {
        return None;
    }

    let per_day = match f.as_str() {
        "qd" | "od" | "daily" | "once daily" | "once a day" | "qam" | "qhs" | "at bedtime" => 1.0,
        "bid" | "twice daily" | "twice a day" | "two times a day" => 2.0,
        "tid" | "three times daily" | "three times a day" => 3.0,
        "qid" | "four times daily" | "four times a day" => 4.0,
        "weekly" | "once weekly" | "qw" => 1.0 / 7.0,
        _ => return every_n_hours(&f),
    };
    Some(per_day)
}

static RE_EVERY_HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:q|every\s*)(\d+)\s*(?:h|hr|hrs|hours?)$")
        .unwrap()
});

fn every_n_hours(f: &str) -> Option<f64> {
    let hours: f64 = RE_EVERY_HOURS.captures(f)?.get(1)?.as_str().parse().ok()?;
    (hours > 0.0).then(|| 24.0 / hours)
}

/// Trim trailing zeros for display ("500", "0.25", "28.57").
pub fn format_amount(amount: f64) -> String {
    let rounded = (amount * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        let s = format!("{rounded:.2}");
        s.trim_end_matches('0').to_string()
    }
}
