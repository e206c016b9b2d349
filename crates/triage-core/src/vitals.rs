//! Operator-entered vital signs.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ShapeError;
use crate::schema::Feature;

/// Vital signs and presenting symptoms captured for one triage request.
///
/// Field names serialize to the feature schema names so JSON output lines up
/// with the columns the classifiers were trained on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VitalsRecord {
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "Systolic_BP")]
    pub systolic_bp: u32,
    #[serde(rename = "Diastolic_BP")]
    pub diastolic_bp: u32,
    #[serde(rename = "Heart_Rate")]
    pub heart_rate: u32,
    /// Degrees Fahrenheit.
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    /// SpO2 percentage.
    #[serde(rename = "Oxygen_Sat")]
    pub oxygen_sat: u32,
    #[serde(rename = "Chest_Pain")]
    pub chest_pain: bool,
    #[serde(rename = "Shortness_of_Breath")]
    pub shortness_of_breath: bool,
    #[serde(rename = "Dizziness")]
    pub dizziness: bool,
    #[serde(rename = "Vomiting")]
    pub vomiting: bool,
}

impl VitalsRecord {
    /// Numeric value of a vitals feature, booleans as 0.0 / 1.0.
    ///
    /// Returns `None` for [`Feature::HistoryScore`], which comes from the
    /// document scorer rather than the operator.
    pub fn feature(&self, feature: Feature) -> Option<f64> {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        match feature {
            Feature::Age => Some(f64::from(self.age)),
            Feature::SystolicBp => Some(f64::from(self.systolic_bp)),
            Feature::DiastolicBp => Some(f64::from(self.diastolic_bp)),
            Feature::HeartRate => Some(f64::from(self.heart_rate)),
            Feature::Temperature => Some(self.temperature),
            Feature::OxygenSat => Some(f64::from(self.oxygen_sat)),
            Feature::ChestPain => Some(flag(self.chest_pain)),
            Feature::ShortnessOfBreath => Some(flag(self.shortness_of_breath)),
            Feature::Dizziness => Some(flag(self.dizziness)),
            Feature::Vomiting => Some(flag(self.vomiting)),
            Feature::HistoryScore => None,
        }
    }

    /// Build a record from a JSON object keyed by feature name.
    ///
    /// Key order is irrelevant. Every vitals field must be present; symptom
    /// flags accept `true`/`false` or `0`/`1`. Unrelated keys are ignored.
    pub fn from_named(fields: &Map<String, Value>) -> Result<Self, ShapeError> {
        Ok(Self {
            age: integer(fields, Feature::Age)?,
            systolic_bp: integer(fields, Feature::SystolicBp)?,
            diastolic_bp: integer(fields, Feature::DiastolicBp)?,
            heart_rate: integer(fields, Feature::HeartRate)?,
            temperature: real(fields, Feature::Temperature)?,
            oxygen_sat: integer(fields, Feature::OxygenSat)?,
            chest_pain: flag(fields, Feature::ChestPain)?,
            shortness_of_breath: flag(fields, Feature::ShortnessOfBreath)?,
            dizziness: flag(fields, Feature::Dizziness)?,
            vomiting: flag(fields, Feature::Vomiting)?,
        })
    }
}

fn lookup(fields: &Map<String, Value>, feature: Feature) -> Result<&Value, ShapeError> {
    match fields.get(feature.name()) {
        None | Some(Value::Null) => Err(ShapeError::MissingField(feature.name())),
        Some(v) => Ok(v),
    }
}

fn integer(fields: &Map<String, Value>, feature: Feature) -> Result<u32, ShapeError> {
    let value = lookup(fields, feature)?;
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| ShapeError::Malformed {
            field: feature.name(),
            reason: format!("expected a non-negative integer, got {value}"),
        })
}

fn real(fields: &Map<String, Value>, feature: Feature) -> Result<f64, ShapeError> {
    let value = lookup(fields, feature)?;
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ShapeError::Malformed {
            field: feature.name(),
            reason: format!("expected a number, got {value}"),
        })
}

fn flag(fields: &Map<String, Value>, feature: Feature) -> Result<bool, ShapeError> {
    match lookup(fields, feature)? {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) if n.as_u64() == Some(0) => Ok(false),
        Value::Number(n) if n.as_u64() == Some(1) => Ok(true),
        other => Err(ShapeError::Malformed {
            field: feature.name(),
            reason: format!("expected true/false or 0/1, got {other}"),
        }),
    }
}
