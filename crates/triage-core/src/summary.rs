//! Deterministic clinical narrative for a triage outcome.

use std::collections::BTreeSet;

use crate::triage::{Department, RiskTier};
use crate::vitals::VitalsRecord;

/// Systolic pressure strictly above this is flagged as hypertensive urgency.
pub const HYPERTENSIVE_SYSTOLIC: u32 = 140;

/// SpO2 strictly below this is flagged as a hypoxia risk.
pub const HYPOXIA_SPO2: u32 = 95;

const ESCALATION: &str =
    "Immediate clinical intervention is prioritized due to unstable physiological markers.";

/// Render the markdown narrative for a classified encounter.
///
/// Pure template: identical inputs always yield byte-identical output.
/// `history` iterates in sorted order, which keeps the comorbidity list stable.
pub fn compose(
    risk: RiskTier,
    department: Department,
    vitals: &VitalsRecord,
    history: &BTreeSet<String>,
) -> String {
    let mut out = String::from("### AI Clinical Insights\n");

    out.push_str(&format!(
        "**Assessment:** Patient is currently classified as **{risk} RISK**."
    ));
    if risk == RiskTier::High {
        out.push(' ');
        out.push_str(ESCALATION);
    }

    out.push_str("\n\n**Clinical Observations:**\n");
    if vitals.systolic_bp > HYPERTENSIVE_SYSTOLIC {
        out.push_str(&format!(
            "- Hypertensive urgency noted: {} mmHg.\n",
            vitals.systolic_bp
        ));
    }
    if vitals.oxygen_sat < HYPOXIA_SPO2 {
        out.push_str(&format!(
            "- Hypoxia risk: SpO2 levels at {}%.\n",
            vitals.oxygen_sat
        ));
    }
    if !history.is_empty() {
        let conditions: Vec<&str> = history.iter().map(String::as_str).collect();
        out.push_str(&format!(
            "- Relevant Comorbidities: {}.\n",
            conditions.join(", ")
        ));
    }

    out.push_str(&format!(
        "\n**Recommended Plan:**\n\
         - Transfer to **{department}**\n\
         - Initiate continuous vitals monitoring\n\
         - Review full EHR for medication contraindications."
    ));
    out
}
