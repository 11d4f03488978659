// src/grades/model.rs
use crate::utils::error::GradeError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Rounds to two decimal places, the precision every grade is shown with.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formats an already-rounded score: whole numbers keep one decimal (`8.0`),
/// anything else drops trailing zeros (`7.5`, `8.17`).
pub fn format_score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        let formatted = format!("{:.2}", value);
        formatted.trim_end_matches('0').to_string()
    }
}

/// Inclusive bounds accepted for a single rubric item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self { min: 1.0, max: 10.0 }
    }
}

impl ScoreRange {
    pub fn validate(&self) -> Result<(), GradeError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min < 0.0 || self.min >= self.max {
            return Err(GradeError::InvalidRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Accepts `score` for `item` if it lies inside the range.
    pub fn check(&self, item: &str, score: f64) -> Result<f64, GradeError> {
        if score.is_nan() || score < self.min || score > self.max {
            return Err(GradeError::OutOfRange {
                item: item.to_string(),
                score,
                min: self.min,
                max: self.max,
            });
        }
        Ok(score)
    }

    /// Parses operator input for `item` and range-checks it.
    pub fn parse(&self, item: &str, input: &str) -> Result<f64, GradeError> {
        let trimmed = input.trim();
        let score: f64 = trimmed
            .parse()
            .map_err(|_| GradeError::NotANumber(trimmed.to_string()))?;
        if !score.is_finite() {
            return Err(GradeError::NotANumber(trimmed.to_string()));
        }
        self.check(item, score)
    }
}

/// A named group of graded items.
#[derive(Debug, Clone, PartialEq)]
pub struct RubricPart {
    label: String,
    items: IndexMap<String, f64>,
    comment: Option<String>,
}

impl RubricPart {
    /// Builds a part; rejects a part without items since its average would be undefined.
    /// A blank comment is treated as no comment.
    pub fn new(
        label: impl Into<String>,
        items: IndexMap<String, f64>,
        comment: Option<String>,
    ) -> Result<Self, GradeError> {
        let label = label.into();
        if items.is_empty() {
            return Err(GradeError::EmptyPart(label));
        }
        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(Self {
            label,
            items,
            comment,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn items(&self) -> &IndexMap<String, f64> {
        &self.items
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Mean of the item scores, rounded to two decimals.
    pub fn average(&self) -> f64 {
        let total: f64 = self.items.values().sum();
        round2(total / self.items.len() as f64)
    }
}

fn first_duplicate<'a>(labels: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    labels.map(str::trim).find(|label| !seen.insert(*label))
}

/// All graded parts of one report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradesReport {
    parts: Vec<RubricPart>,
}

impl GradesReport {
    pub fn new(parts: Vec<RubricPart>) -> Self {
        Self { parts }
    }

    pub fn push(&mut self, part: RubricPart) {
        self.parts.push(part);
    }

    pub fn parts(&self) -> &[RubricPart] {
        &self.parts
    }

    /// A report is usable only once it has at least one part, and part labels
    /// must be unique since they key the comparison chart.
    pub fn validate(&self) -> Result<(), GradeError> {
        if self.parts.is_empty() {
            return Err(GradeError::NoParts);
        }
        if let Some(label) = first_duplicate(self.parts.iter().map(RubricPart::label)) {
            return Err(GradeError::DuplicateLabel(label.to_string()));
        }
        Ok(())
    }

    /// Mean of the part averages, rounded to two decimals. `None` while empty.
    pub fn final_grade(&self) -> Option<f64> {
        if self.parts.is_empty() {
            return None;
        }
        let total: f64 = self.parts.iter().map(RubricPart::average).sum();
        Some(round2(total / self.parts.len() as f64))
    }

    /// Part label → average, in part order.
    pub fn averages(&self) -> IndexMap<String, f64> {
        self.parts
            .iter()
            .map(|part| (part.label().to_string(), part.average()))
            .collect()
    }
}

/// Labels of the rubric an operator is asked to grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricTemplate {
    pub parts: Vec<RubricPartTemplate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricPartTemplate {
    pub label: String,
    pub items: Vec<String>,
}

impl RubricTemplate {
    pub fn validate(&self) -> Result<(), GradeError> {
        if self.parts.is_empty() {
            return Err(GradeError::NoParts);
        }
        if let Some(part) = self.parts.iter().find(|p| p.items.is_empty()) {
            return Err(GradeError::EmptyPart(part.label.clone()));
        }
        if let Some(label) = first_duplicate(self.parts.iter().map(|p| p.label.as_str())) {
            return Err(GradeError::DuplicateLabel(label.to_string()));
        }
        for part in &self.parts {
            if let Some(item) = first_duplicate(part.items.iter().map(String::as_str)) {
                return Err(GradeError::DuplicateLabel(item.to_string()));
            }
        }
        Ok(())
    }
}

impl Default for RubricTemplate {
    fn default() -> Self {
        let part = |label: &str, items: &[&str]| RubricPartTemplate {
            label: label.to_string(),
            items: items.iter().map(|s| s.to_string()).collect(),
        };

        Self {
            parts: vec![
                part(
                    "פיקוד ושליטה",
                    &[
                        "1.1 גיבוש תמונת מצב",
                        "1.2 ניהול הכוח, חלוקת גזרות, הזרמת כוחות",
                        "1.3 מיקום המפקד המאפשר שליטה בכוח (לא להישאב לרובאות)",
                    ],
                ),
                part(
                    "עבודת קשר",
                    &[
                        "2.1 נדב\"ר בסיסי - עלייה לפי פורמט",
                        "2.2 אסרטיביות ופיקוד בדגש על שליטה בכוח ומניעת קשקשת ברשת",
                        "2.3 דיווחים והכרזות בדגש על סיווג ואיפיון האירוע",
                        "2.4 וידוא קבלה בעיקר בציון ידיעות חשובות",
                    ],
                ),
                part(
                    "מבצעיות | עקרונות לחימה",
                    &[
                        "3.1 שימוש בשפה משותפת",
                        "3.2 פכת\"ט | רואה, מעריך, ממליץ - דיווחים קצרים ומדוייקים",
                        "3.3 מתן מענה לאירועים, קבלת החלטות נכונות",
                        "3.4 שימוש במעטפת - כוחות חבירים, תצפיות וכו'",
                        "3.5 הזדהות, חבירה וסגירת מעגלים - בדגש על מניעת דו\"צים",
                    ],
                ),
            ],
        }
    }
}

/// On-disk form of a graded rubric (`--grades file.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradesFile {
    pub parts: Vec<GradesFilePart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradesFilePart {
    pub label: String,
    pub items: IndexMap<String, f64>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl GradesFile {
    /// Validates every score against `range` and builds the report.
    /// Duplicate part labels are rejected.
    pub fn into_report(self, range: &ScoreRange) -> Result<GradesReport, GradeError> {
        let mut report = GradesReport::default();
        for part in self.parts {
            for (item, score) in &part.items {
                range.check(item, *score)?;
            }
            report.push(RubricPart::new(part.label, part.items, part.comment)?);
        }
        report.validate()?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(label: &str, scores: &[(&str, f64)]) -> RubricPart {
        let items = scores
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        RubricPart::new(label, items, None).unwrap()
    }

    #[test]
    fn part_average_is_rounded_mean() {
        let p = part("p", &[("a", 8.0), ("b", 6.0), ("c", 10.0)]);
        assert_eq!(p.average(), 8.0);

        let p = part("p", &[("a", 7.0), ("b", 8.0), ("c", 8.0)]);
        assert_eq!(p.average(), 7.67);
    }

    #[test]
    fn final_grade_is_rounded_mean_of_averages() {
        let report = GradesReport::new(vec![
            part("a", &[("x", 8.0)]),
            part("b", &[("x", 7.0), ("y", 8.0)]),
            part("c", &[("x", 9.0)]),
        ]);
        assert_eq!(report.final_grade(), Some(8.17));
    }

    #[test]
    fn averages_follow_items() {
        let mut items = IndexMap::new();
        items.insert("x".to_string(), 4.0);
        let first = RubricPart::new("p", items.clone(), None).unwrap();
        items.insert("y".to_string(), 10.0);
        let second = RubricPart::new("p", items, None).unwrap();
        assert_eq!(first.average(), 4.0);
        assert_eq!(second.average(), 7.0);
    }

    #[test]
    fn empty_part_is_rejected() {
        let err = RubricPart::new("ריק", IndexMap::new(), None).unwrap_err();
        assert_eq!(err, GradeError::EmptyPart("ריק".to_string()));
    }

    #[test]
    fn empty_report_has_no_final_grade() {
        let report = GradesReport::default();
        assert_eq!(report.final_grade(), None);
        assert_eq!(report.validate(), Err(GradeError::NoParts));
    }

    #[test]
    fn blank_comment_becomes_none() {
        let mut items = IndexMap::new();
        items.insert("x".to_string(), 5.0);
        let p = RubricPart::new("p", items, Some("   ".to_string())).unwrap();
        assert_eq!(p.comment(), None);
    }

    #[test]
    fn formats_scores_like_the_report() {
        assert_eq!(format_score(8.0), "8.0");
        assert_eq!(format_score(10.0), "10.0");
        assert_eq!(format_score(7.5), "7.5");
        assert_eq!(format_score(8.17), "8.17");
    }

    #[test]
    fn score_range_parsing() {
        let range = ScoreRange::default();
        assert_eq!(range.parse("x", " 7.5 "), Ok(7.5));
        assert!(matches!(range.parse("x", "11"), Err(GradeError::OutOfRange { .. })));
        assert!(matches!(range.parse("x", "0.5"), Err(GradeError::OutOfRange { .. })));
        assert!(matches!(range.parse("x", "abc"), Err(GradeError::NotANumber(_))));
        assert!(matches!(range.parse("x", "NaN"), Err(GradeError::NotANumber(_))));
    }

    #[test]
    fn invalid_range_is_rejected() {
        let range = ScoreRange { min: 10.0, max: 1.0 };
        assert!(range.validate().is_err());
        assert!(ScoreRange::default().validate().is_ok());
    }

    #[test]
    fn grades_file_keeps_order_and_checks_range() {
        let raw = r#"{
            "parts": [
                {"label": "עבודת קשר", "items": {"b": 9, "a": 7}, "comment": "טוב"},
                {"label": "פיקוד", "items": {"z": 10}}
            ]
        }"#;
        let file: GradesFile = serde_json::from_str(raw).unwrap();
        let report = file.into_report(&ScoreRange::default()).unwrap();
        let first = &report.parts()[0];
        assert_eq!(first.items().keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(first.comment(), Some("טוב"));
        assert_eq!(report.final_grade(), Some(9.0));

        let bad: GradesFile =
            serde_json::from_str(r#"{"parts": [{"label": "p", "items": {"a": 12}}]}"#).unwrap();
        assert!(matches!(
            bad.into_report(&ScoreRange::default()),
            Err(GradeError::OutOfRange { .. })
        ));

        let empty: GradesFile = serde_json::from_str(r#"{"parts": []}"#).unwrap();
        assert_eq!(empty.into_report(&ScoreRange::default()), Err(GradeError::NoParts));
    }

    #[test]
    fn repeated_part_label_is_rejected() {
        let raw = r#"{"parts": [
            {"label": "קשר", "items": {"a": 10}},
            {"label": "קשר", "items": {"a": 2}}
        ]}"#;
        let file: GradesFile = serde_json::from_str(raw).unwrap();
        assert_eq!(
            file.into_report(&ScoreRange::default()),
            Err(GradeError::DuplicateLabel("קשר".to_string()))
        );

        let report = GradesReport::new(vec![part("p", &[("a", 8.0)]), part("p", &[("a", 4.0)])]);
        assert_eq!(report.validate(), Err(GradeError::DuplicateLabel("p".to_string())));
    }

    #[test]
    fn rubric_with_repeated_labels_is_rejected() {
        let template = |label: &str, items: &[&str]| RubricPartTemplate {
            label: label.to_string(),
            items: items.iter().map(|s| s.to_string()).collect(),
        };

        let repeated_item = RubricTemplate {
            parts: vec![template("p", &["a", "b", "a"])],
        };
        assert_eq!(repeated_item.validate(), Err(GradeError::DuplicateLabel("a".to_string())));

        let repeated_part = RubricTemplate {
            parts: vec![template("p", &["a"]), template("p", &["b"])],
        };
        assert_eq!(repeated_part.validate(), Err(GradeError::DuplicateLabel("p".to_string())));
    }

    #[test]
    fn default_rubric_is_valid() {
        let rubric = RubricTemplate::default();
        assert!(rubric.validate().is_ok());
        let sizes: Vec<usize> = rubric.parts.iter().map(|p| p.items.len()).collect();
        assert_eq!(sizes, vec![3, 4, 5]);
    }
}
