// src/narrative/mod.rs
pub mod client;
pub mod models;

pub use client::{LlmConfig, NarrativeImprover};

use chrono::NaiveDate;

const SOURCE_DATE_FORMAT: &str = "%b %d, %Y";
const REPORT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Details woven into the introduction of the improved narrative.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrativeContext {
    pub date: String,
    pub manager_name: String,
    pub force_name: String,
    pub location: String,
}

/// Date of the exercise as `DD/MM/YYYY`.
///
/// Exported narratives start with `Mon DD, YYYY | ...`. A prefix in another
/// format is kept verbatim; text without a `|` on its first line gets `today`.
pub fn derive_date(text: &str, today: NaiveDate) -> String {
    let first_line = text.trim_start_matches('\u{feff}').lines().next().unwrap_or("");

    match first_line.split_once('|').map(|(prefix, _)| prefix.trim()) {
        Some(prefix) if !prefix.is_empty() => match NaiveDate::parse_from_str(prefix, SOURCE_DATE_FORMAT) {
            Ok(date) => date.format(REPORT_DATE_FORMAT).to_string(),
            Err(_) => {
                tracing::warn!("Unrecognized date '{}', keeping it as written", prefix);
                prefix.to_string()
            }
        },
        _ => today.format(REPORT_DATE_FORMAT).to_string(),
    }
}
