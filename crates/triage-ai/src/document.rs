//! Medical-history scoring from an uploaded document.
//!
//! Text is pulled from the PDF, lowercased and scanned for a fixed set of
//! comorbidity keywords by substring. The score is the capped sum of the
//! matched keyword weights. Any extraction failure degrades to an empty
//! result; a bad upload never blocks an assessment.

use std::collections::BTreeSet;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, warn};
use triage_core::{HistoryFindings, MAX_HISTORY_SCORE};

/// Keyword weights, scanned in this order.
pub const HISTORY_KEYWORDS: [(&str, u8); 6] = [
    ("diabetes", 1),
    ("hypertension", 1),
    ("asthma", 1),
    ("cardiac", 2),
    ("stroke", 2),
    ("heart", 2),
];

/// Score already-extracted text.
pub fn score_text(text: &str) -> HistoryFindings {
    let text = text.to_lowercase();
    let mut matched_conditions = BTreeSet::new();
    let mut total: u32 = 0;

    for (keyword, weight) in HISTORY_KEYWORDS {
        if text.contains(keyword) {
            matched_conditions.insert(title_case(keyword));
            total += u32::from(weight);
        }
    }

    let score = total.min(u32::from(MAX_HISTORY_SCORE)) as u8;
    HistoryFindings {
        matched_conditions,
        score,
    }
}

/// Extract text from PDF bytes and score it.
///
/// Unreadable bytes, a parser panic, or a document with no text layer all
/// yield [`HistoryFindings::empty`].
pub fn score_document(bytes: &[u8]) -> HistoryFindings {
    if bytes.is_empty() {
        return HistoryFindings::empty();
    }

    // The PDF parser panics on some malformed inputs.
    let extract = AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes));
    let extracted = catch_unwind(extract);
    let text = match extracted {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!(error = %e, "document text extraction failed, ignoring history");
            return HistoryFindings::empty();
        }
        Err(_) => {
            warn!("document parser panicked, ignoring history");
            return HistoryFindings::empty();
        }
    };

    if text.trim().is_empty() {
        warn!("document has no text layer, ignoring history");
        return HistoryFindings::empty();
    }

    let findings = score_text(&text);
    debug!(
        chars = text.len(),
        score = findings.score,
        conditions = ?findings.matched_conditions,
        "scored document"
    );
    findings
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
