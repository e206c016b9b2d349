//! Classification outcomes and per-request results.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownDepartment;

/// Upper bound of the keyword-derived history score.
pub const MAX_HISTORY_SCORE: u8 = 5;

/// Ordinal severity assigned to an encounter. Model I/O uses 0/1/2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    pub const fn index(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clinical service recommended to receive the patient. Model I/O uses 0..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "General Medicine")]
    GeneralMedicine,
    Cardiology,
    Neurology,
    Emergency,
}

impl Department {
    pub const ALL: [Department; 4] = [
        Self::GeneralMedicine,
        Self::Cardiology,
        Self::Neurology,
        Self::Emergency,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    pub const fn index(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GeneralMedicine => "General Medicine",
            Self::Cardiology => "Cardiology",
            Self::Neurology => "Neurology",
            Self::Emergency => "Emergency",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = UnknownDepartment;

    /// Case-insensitive; spaces, hyphens and underscores are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|d| normalize(d.as_str()) == wanted)
            .ok_or_else(|| UnknownDepartment(s.to_string()))
    }
}

fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Conditions found in an uploaded history document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryFindings {
    /// Title-cased condition names.
    pub matched_conditions: BTreeSet<String>,
    /// Sum of keyword weights, capped at [`MAX_HISTORY_SCORE`].
    pub score: u8,
}

impl HistoryFindings {
    /// No document, or nothing usable in it.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.matched_conditions.is_empty()
    }
}

/// Outcome of one triage evaluation. Lives for a single request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriageResult {
    pub risk: RiskTier,
    pub department: Department,
    pub narrative: String,
}
