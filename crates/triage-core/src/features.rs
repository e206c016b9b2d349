//! Feature assembly: vitals plus history score into the named feature vector.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ShapeError;
use crate::schema::{FEATURE_COUNT, Feature};
use crate::triage::MAX_HISTORY_SCORE;
use crate::vitals::VitalsRecord;

/// Eleven feature values in schema order.
///
/// Only [`assemble`] constructs one, and it fills every slot by looking the
/// value up through its [`Feature`] name, so a vector is always complete.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        Feature::from_name(name).map(|f| self.get(f))
    }

    /// Symptom flag as a boolean.
    pub fn flag(&self, feature: Feature) -> bool {
        self.get(feature) >= 0.5
    }

    /// Raw values in schema order.
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL.into_iter().map(|f| (f, self.get(f)))
    }
}

/// Merge vitals and a history score into a [`FeatureVector`].
pub fn assemble(vitals: &VitalsRecord, history_score: u8) -> Result<FeatureVector, ShapeError> {
    if history_score > MAX_HISTORY_SCORE {
        return Err(ShapeError::HistoryScoreOutOfRange(history_score));
    }

    let mut values = [0.0; FEATURE_COUNT];
    for feature in Feature::ALL {
        let value = match feature {
            Feature::HistoryScore => f64::from(history_score),
            _ => vitals
                .feature(feature)
                .ok_or(ShapeError::MissingField(feature.name()))?,
        };
        if !value.is_finite() {
            return Err(ShapeError::Malformed {
                field: feature.name(),
                reason: format!("non-finite value {value}"),
            });
        }
        if !feature.accepts(value) {
            let (lo, hi) = feature.bounds();
            return Err(ShapeError::Malformed {
                field: feature.name(),
                reason: format!("{value} is outside {lo}..={hi}"),
            });
        }
        values[feature.index()] = value;
    }

    debug!(history_score, "assembled feature vector");
    Ok(FeatureVector { values })
}

/// Parse vitals from a name-keyed JSON object and assemble them.
pub fn assemble_named(
    fields: &Map<String, Value>,
    history_score: u8,
) -> Result<FeatureVector, ShapeError> {
    assemble(&VitalsRecord::from_named(fields)?, history_score)
}

/// One Float64 column per feature, in schema order, for a set of vectors.
pub fn feature_columns(vectors: &[FeatureVector]) -> Vec<ArrayRef> {
    Feature::ALL
        .iter()
        .map(|&f| {
            let column: Float64Array = vectors.iter().map(|v| Some(v.get(f))).collect();
            Arc::new(column) as ArrayRef
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::feature_schema;
    use arrow::record_batch::RecordBatch;
    use serde_json::json;

    fn scenario_a() -> VitalsRecord {
        VitalsRecord {
            age: 45,
            systolic_bp: 190,
            diastolic_bp: 80,
            heart_rate: 75,
            temperature: 98.6,
            oxygen_sat: 90,
            chest_pain: true,
            shortness_of_breath: false,
            dizziness: false,
            vomiting: false,
        }
    }

    #[test]
    fn assembles_eleven_values_in_schema_order() {
        let fv = assemble(&scenario_a(), 3).unwrap();
        assert_eq!(
            fv.values(),
            &[45.0, 190.0, 80.0, 75.0, 98.6, 90.0, 1.0, 0.0, 0.0, 0.0, 3.0]
        );
        assert_eq!(fv.get(Feature::HistoryScore), 3.0);
        assert_eq!(fv.get_by_name("Oxygen_Sat"), Some(90.0));
        assert_eq!(fv.get_by_name("SpO2"), None);
        assert!(fv.flag(Feature::ChestPain));
    }

    #[test]
    fn history_score_above_cap_is_rejected() {
        assert_eq!(
            assemble(&scenario_a(), 6),
            Err(ShapeError::HistoryScoreOutOfRange(6))
        );
    }

    #[test]
    fn non_finite_temperature_is_rejected() {
        let mut v = scenario_a();
        v.temperature = f64::NAN;
        let err = assemble(&v, 0).unwrap_err();
        let ShapeError::Malformed { field, .. } = err else {
            panic!("unexpected {err:?}");
        };
        assert_eq!(field, "Temperature");
    }

    #[test]
    fn vitals_outside_clinical_ranges_are_rejected() {
        let cases: [(fn(&mut VitalsRecord), &str); 7] = [
            (|v| v.age = 0, "Age"),
            (|v| v.systolic_bp = 4000, "Systolic_BP"),
            (|v| v.diastolic_bp = 49, "Diastolic_BP"),
            (|v| v.heart_rate = 161, "Heart_Rate"),
            (|v| v.temperature = -40.0, "Temperature"),
            (|v| v.temperature = 106.1, "Temperature"),
            (|v| v.oxygen_sat = 250, "Oxygen_Sat"),
        ];
        for (mutate, expected) in cases {
            let mut v = scenario_a();
            mutate(&mut v);
            match assemble(&v, 0) {
                Err(ShapeError::Malformed { field, reason }) => {
                    assert_eq!(field, expected);
                    assert!(reason.contains("outside"), "{reason}");
                }
                other => panic!("{expected}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn range_limits_themselves_are_accepted() {
        let low = VitalsRecord {
            age: 1,
            systolic_bp: 80,
            diastolic_bp: 50,
            heart_rate: 40,
            temperature: 95.0,
            oxygen_sat: 80,
            ..scenario_a()
        };
        let high = VitalsRecord {
            age: 100,
            systolic_bp: 200,
            diastolic_bp: 120,
            heart_rate: 160,
            temperature: 106.0,
            oxygen_sat: 100,
            ..scenario_a()
        };
        assert!(assemble(&low, 0).is_ok());
        assert!(assemble(&high, 5).is_ok());
    }

    #[test]
    fn named_input_is_range_checked() {
        let fields = json!({
            "Age": 45, "Systolic_BP": 120, "Diastolic_BP": 80, "Heart_Rate": 75,
            "Temperature": 98.6, "Oxygen_Sat": 250, "Chest_Pain": 0,
            "Shortness_of_Breath": 0, "Dizziness": 0, "Vomiting": 0,
        });
        let err = assemble_named(fields.as_object().unwrap(), 0).unwrap_err();
        let ShapeError::Malformed { field, .. } = err else {
            panic!("unexpected {err:?}");
        };
        assert_eq!(field, "Oxygen_Sat");
    }

    #[test]
    fn field_order_of_input_does_not_matter() {
        let forward = json!({
            "Age": 60, "Systolic_BP": 150, "Diastolic_BP": 95, "Heart_Rate": 110,
            "Temperature": 101.2, "Oxygen_Sat": 93, "Chest_Pain": 0,
            "Shortness_of_Breath": 1, "Dizziness": 1, "Vomiting": 0,
        });
        let pairs: Vec<(String, Value)> = forward
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let expected = assemble_named(forward.as_object().unwrap(), 2).unwrap();

        // Every rotation of the key order, forwards and reversed.
        for shift in 0..pairs.len() {
            let mut rotated = pairs.clone();
            rotated.rotate_left(shift);
            let map: Map<String, Value> = rotated.iter().cloned().collect();
            assert_eq!(assemble_named(&map, 2).unwrap(), expected);

            rotated.reverse();
            let map: Map<String, Value> = rotated.into_iter().collect();
            assert_eq!(assemble_named(&map, 2).unwrap(), expected);
        }
    }

    #[test]
    fn missing_field_fails_before_padding() {
        let mut fields = json!({
            "Age": 60, "Systolic_BP": 150, "Diastolic_BP": 95, "Heart_Rate": 110,
            "Temperature": 101.2, "Oxygen_Sat": 93, "Chest_Pain": 0,
            "Shortness_of_Breath": 1, "Dizziness": 1, "Vomiting": 0,
        })
        .as_object()
        .unwrap()
        .clone();
        fields.remove("Vomiting");
        assert_eq!(
            assemble_named(&fields, 0),
            Err(ShapeError::MissingField("Vomiting"))
        );
    }

    #[test]
    fn columns_match_feature_schema() {
        let a = assemble(&scenario_a(), 0).unwrap();
        let b = assemble(&scenario_a(), 5).unwrap();
        let schema = Arc::new(feature_schema());
        let batch = RecordBatch::try_new(schema, feature_columns(&[a, b])).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), FEATURE_COUNT);
    }
}
