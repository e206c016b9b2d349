//! The named feature schema shared by training and serving.
//!
//! Both classifier heads are trained and queried against exactly these
//! eleven columns in exactly this order. Anything that moves feature values
//! between components goes through [`Feature`] rather than a bare index.

use arrow::datatypes::{DataType, Field, Schema};

use crate::triage::MAX_HISTORY_SCORE;

/// Number of columns in the feature schema.
pub const FEATURE_COUNT: usize = 11;

/// Column holding the synthesized risk tier ordinal in training batches.
pub const RISK_LABEL: &str = "Risk_Label";

/// Column holding the synthesized department ordinal in training batches.
pub const DEPT_LABEL: &str = "Dept_Label";

/// One named column of the feature schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Age,
    SystolicBp,
    DiastolicBp,
    HeartRate,
    Temperature,
    OxygenSat,
    ChestPain,
    ShortnessOfBreath,
    Dizziness,
    Vomiting,
    HistoryScore,
}

impl Feature {
    /// Every feature in schema order.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Age,
        Feature::SystolicBp,
        Feature::DiastolicBp,
        Feature::HeartRate,
        Feature::Temperature,
        Feature::OxygenSat,
        Feature::ChestPain,
        Feature::ShortnessOfBreath,
        Feature::Dizziness,
        Feature::Vomiting,
        Feature::HistoryScore,
    ];

    /// Column name as it appears in artifacts, batches and JSON input.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::SystolicBp => "Systolic_BP",
            Self::DiastolicBp => "Diastolic_BP",
            Self::HeartRate => "Heart_Rate",
            Self::Temperature => "Temperature",
            Self::OxygenSat => "Oxygen_Sat",
            Self::ChestPain => "Chest_Pain",
            Self::ShortnessOfBreath => "Shortness_of_Breath",
            Self::Dizziness => "Dizziness",
            Self::Vomiting => "Vomiting",
            Self::HistoryScore => "History_Score",
        }
    }

    /// Position of this feature in the schema.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Boolean symptoms, encoded as 0.0 / 1.0.
    pub const fn is_flag(self) -> bool {
        matches!(
            self,
            Self::ChestPain | Self::ShortnessOfBreath | Self::Dizziness | Self::Vomiting
        )
    }

    /// Inclusive range of values accepted for this feature.
    ///
    /// Vitals outside these limits are rejected as malformed input rather
    /// than classified. Temperature is in °F, oxygen saturation in percent.
    pub const fn bounds(self) -> (f64, f64) {
        match self {
            Self::Age => (1.0, 100.0),
            Self::SystolicBp => (80.0, 200.0),
            Self::DiastolicBp => (50.0, 120.0),
            Self::HeartRate => (40.0, 160.0),
            Self::Temperature => (95.0, 106.0),
            Self::OxygenSat => (80.0, 100.0),
            Self::ChestPain | Self::ShortnessOfBreath | Self::Dizziness | Self::Vomiting => {
                (0.0, 1.0)
            }
            Self::HistoryScore => (0.0, MAX_HISTORY_SCORE as f64),
        }
    }

    pub fn accepts(self, value: f64) -> bool {
        let (lo, hi) = self.bounds();
        (lo..=hi).contains(&value)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Feature column names in schema order.
pub fn feature_names() -> [&'static str; FEATURE_COUNT] {
    Feature::ALL.map(Feature::name)
}

/// Schema for assembled feature rows.
pub fn feature_schema() -> Schema {
    Schema::new(feature_fields())
}

/// Schema for the synthetic training population: features plus both label columns.
pub fn training_schema() -> Schema {
    let mut fields = feature_fields();
    fields.push(Field::new(RISK_LABEL, DataType::UInt8, false));
    fields.push(Field::new(DEPT_LABEL, DataType::UInt8, false));
    Schema::new(fields)
}

fn feature_fields() -> Vec<Field> {
    Feature::ALL
        .iter()
        .map(|f| Field::new(f.name(), DataType::Float64, false))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_schema_has_expected_fields() {
        let schema = feature_schema();
        assert_eq!(schema.fields().len(), FEATURE_COUNT);
        assert_eq!(schema.field(0).name(), "Age");
        assert_eq!(schema.field(10).name(), "History_Score");
    }

    #[test]
    fn training_schema_appends_labels() {
        let schema = training_schema();
        assert_eq!(schema.fields().len(), FEATURE_COUNT + 2);
        assert!(schema.field_with_name(RISK_LABEL).is_ok());
        assert!(schema.field_with_name(DEPT_LABEL).is_ok());
        assert_eq!(schema.index_of(RISK_LABEL).unwrap(), FEATURE_COUNT);
    }

    #[test]
    fn indices_follow_declaration_order() {
        for (i, f) in Feature::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(Feature::Age.accepts(1.0));
        assert!(Feature::Age.accepts(100.0));
        assert!(!Feature::Age.accepts(0.0));
        assert!(Feature::OxygenSat.accepts(80.0));
        assert!(!Feature::OxygenSat.accepts(100.5));
        assert!(!Feature::Temperature.accepts(94.9));
        assert!(Feature::Temperature.accepts(106.0));
        assert_eq!(Feature::HistoryScore.bounds(), (0.0, 5.0));
        for f in Feature::ALL.into_iter().filter(|f| f.is_flag()) {
            assert_eq!(f.bounds(), (0.0, 1.0));
        }
    }

    #[test]
    fn names_round_trip() {
        for f in Feature::ALL {
            assert_eq!(Feature::from_name(f.name()), Some(f));
        }
        assert_eq!(Feature::from_name("systolic_bp"), None);
    }

    #[test]
    fn schema_order_is_fixed() {
        assert_eq!(
            feature_names(),
            [
                "Age",
                "Systolic_BP",
                "Diastolic_BP",
                "Heart_Rate",
                "Temperature",
                "Oxygen_Sat",
                "Chest_Pain",
                "Shortness_of_Breath",
                "Dizziness",
                "Vomiting",
                "History_Score",
            ]
        );
    }
}
