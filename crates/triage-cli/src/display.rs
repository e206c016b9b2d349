//! Terminal rendering for the dashboard and facility finder.
//!
//! Every renderer returns a `String` so output can be checked without a
//! terminal; `color` toggles ANSI escapes on the risk card.

use std::fmt::Write;

use triage_ai::{Assessment, Head, TrainedModels, TriageError};
use triage_core::{Department, HistoryFindings, RiskTier, VitalsRecord, facilities_for};

const LABEL_WIDTH: usize = 14;

const GREEN: &str = "\x1b[1;32m";
const YELLOW: &str = "\x1b[1;33m";
const RED: &str = "\x1b[1;31m";
const RESET: &str = "\x1b[0m";

/// Systolic pressure at or above this is flagged "High" on the ribbon.
const RIBBON_HIGH_SYSTOLIC: u32 = 130;

// ── Dashboard ──

pub fn render_header(vitals: &VitalsRecord) -> String {
    format!(
        "=== Clinical Dashboard ===\nAge: {}  |  Status: Active Analysis\n",
        vitals.age
    )
}

/// Four headline vitals, with a Normal/High marker on blood pressure.
pub fn render_vitals_ribbon(vitals: &VitalsRecord) -> String {
    let marker = if vitals.systolic_bp < RIBBON_HIGH_SYSTOLIC {
        "Normal"
    } else {
        "High"
    };
    let mut out = String::from("Vitals\n");
    row(
        &mut out,
        "BP Index",
        format!("{}/{} ({marker})", vitals.systolic_bp, vitals.diastolic_bp),
    );
    row(&mut out, "Heart Rate", format!("{} BPM", vitals.heart_rate));
    row(&mut out, "O2 Level", format!("{}%", vitals.oxygen_sat));
    row(
        &mut out,
        "Body Temp",
        format!("{:.1}°F", vitals.temperature),
    );
    out
}

pub fn render_findings(findings: &HistoryFindings) -> String {
    if findings.is_empty() {
        return "History: no documented comorbidities\n".to_string();
    }
    let conditions: Vec<&str> = findings
        .matched_conditions
        .iter()
        .map(String::as_str)
        .collect();
    format!(
        "History: score {} ({})\n",
        findings.score,
        conditions.join(", ")
    )
}

pub fn render_risk_card(risk: RiskTier, department: Department, color: bool) -> String {
    let colour = match risk {
        RiskTier::Low => GREEN,
        RiskTier::Medium => YELLOW,
        RiskTier::High => RED,
    };
    let headline = format!("{risk} RISK");
    format!(
        "{}\nTriage: {department}\n",
        paint(&format!("=== {headline} ==="), colour, color)
    )
}

/// Shown instead of a risk card when no result could be produced.
pub fn render_unavailable(err: &TriageError, color: bool) -> String {
    let hint = match err {
        TriageError::Shape(_) => "Check the entered vitals and try again.",
        TriageError::Prediction(_) => "Run `triage train` to produce model artifacts.",
    };
    format!(
        "{}\n{err}\n{hint}\n",
        paint("=== ASSESSMENT UNAVAILABLE ===", RED, color)
    )
}

/// Full dashboard: header, vitals, history, risk card and narrative.
pub fn render_dashboard(vitals: &VitalsRecord, assessment: &Assessment, color: bool) -> String {
    let result = &assessment.result;
    page(&[
        render_header(vitals),
        render_vitals_ribbon(vitals),
        render_findings(&assessment.findings),
        render_risk_card(result.risk, result.department, color),
        format!("{}\n", result.narrative),
    ])
}

/// Dashboard header followed by the unavailable card.
pub fn render_unavailable_page(vitals: &VitalsRecord, err: &TriageError, color: bool) -> String {
    page(&[render_header(vitals), render_unavailable(err, color)])
}

// ── Facility finder ──

pub fn render_facilities(department: Department) -> String {
    let mut out = format!("Showing best facilities for: {department}\n");
    for facility in facilities_for(department) {
        let _ = write!(
            out,
            "\n  {}\n    {}  (Navigate: {})\n",
            facility.name, facility.address, facility.distance
        );
    }
    out
}

// ── Training ──

pub fn render_training_report(trained: &TrainedModels) -> String {
    let summary = &trained.summary;
    let mut out = format!("Trained on {} synthetic rows\n", summary.rows);

    for (artifact, counts) in [
        (&trained.risk, &summary.risk_counts[..]),
        (&trained.department, &summary.dept_counts[..]),
    ] {
        let _ = writeln!(
            out,
            "\n{} head ({}): training accuracy {:.1}%",
            head_title(artifact.head),
            artifact.model.family(),
            artifact.training_accuracy * 100.0
        );
        for (label, count) in artifact.head.class_labels().iter().zip(counts) {
            row(&mut out, label, count.to_string());
        }
    }
    out
}

fn head_title(head: Head) -> &'static str {
    match head {
        Head::Risk => "Risk",
        Head::Department => "Department",
    }
}

// ── Helpers ──

/// Sections separated by one blank line.
fn page(sections: &[String]) -> String {
    sections.join("\n")
}

fn row(out: &mut String, label: &str, value: String) {
    let _ = writeln!(out, "  {label:<width$} {value}", width = LABEL_WIDTH);
}

fn paint(text: &str, colour: &str, enabled: bool) -> String {
    if enabled {
        format!("{colour}{text}{RESET}")
    } else {
        text.to_string()
    }
}
