// src/extractors/section.rs

// --- Imports ---
use crate::config::SectionsConfig;
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// --- Regex Patterns (Lazy Static) ---
// Any line-ending convention, normalized to "\n" before detection
static LINE_ENDING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\r\n?").expect("Failed to compile LINE_ENDING_RE")
});

// --- Data Structures ---

/// The fixed, ordered set of narrative sections in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SectionKey {
    Introduction,
    ExerciseOne,
    ExerciseTwo,
    Summary,
}

impl SectionKey {
    /// Canonical order, used for extraction and layout alike.
    pub const ALL: [SectionKey; 4] = [
        SectionKey::Introduction,
        SectionKey::ExerciseOne,
        SectionKey::ExerciseTwo,
        SectionKey::Summary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKey::Introduction => "Introduction",
            SectionKey::ExerciseOne => "Exercise 1",
            SectionKey::ExerciseTwo => "Exercise 2",
            SectionKey::Summary => "Summary",
        }
    }

    fn index(self) -> usize {
        match self {
            SectionKey::Introduction => 0,
            SectionKey::ExerciseOne => 1,
            SectionKey::ExerciseTwo => 2,
            SectionKey::Summary => 3,
        }
    }
}

/// Extracted content for every `SectionKey`; absent sections hold "".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    contents: [String; 4],
    missing: Vec<SectionKey>,
}

impl SectionMap {
    #[cfg(test)]
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (SectionKey, S)>,
        S: Into<String>,
    {
        let mut map = SectionMap::default();
        for (key, content) in pairs {
            map.contents[key.index()] = content.into();
        }
        map
    }

    pub fn get(&self, key: SectionKey) -> &str {
        &self.contents[key.index()]
    }

    /// Sections in canonical order, including empty ones.
    pub fn iter(&self) -> impl Iterator<Item = (SectionKey, &str)> + '_ {
        SectionKey::ALL.iter().map(move |key| (*key, self.get(*key)))
    }

    /// Keys whose heading was not found in the narrative at all.
    pub fn missing(&self) -> &[SectionKey] {
        &self.missing
    }

    pub fn populated(&self) -> Vec<SectionKey> {
        self.iter()
            .filter(|(_, content)| !content.is_empty())
            .map(|(key, _)| key)
            .collect()
    }
}

// --- Text Helpers ---

pub fn normalize_line_endings(text: &str) -> String {
    LINE_ENDING_RE.replace_all(text, "\n").into_owned()
}

/// Removes markdown emphasis (`**`, `*`). Idempotent.
pub fn strip_emphasis(text: &str) -> String {
    text.replace("**", "").replace('*', "")
}

/// Final cleanup of a section body: trim, drop `#`/`*`, trim again.
fn clean_content(raw: &str) -> String {
    raw.trim().replace(['#', '*'], "").trim().to_string()
}

fn alias_alternation<'a>(aliases: impl IntoIterator<Item = &'a String>) -> String {
    aliases
        .into_iter()
        .map(|alias| alias.trim())
        .filter(|alias| !alias.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|")
}

/// A heading is a whole line that starts with an alias and ends with "\n".
fn heading_regex(alternation: &str) -> Result<Regex, ExtractError> {
    Regex::new(&format!(r"(?im)^[^\S\n]*(?:{})[^\n]*\n", alternation))
        .map_err(|e| ExtractError::RegexError(e.to_string()))
}

// --- Main Extractor Structure ---

/// Splits free-form narrative text into the four report sections using a
/// configurable heading alias table.
#[derive(Debug, Clone)]
pub struct SectionExtractor {
    headings: Vec<(SectionKey, Regex)>,
    any_heading: Regex,
    primary_aliases: Vec<String>,
}

impl SectionExtractor {
    pub fn new(config: &SectionsConfig) -> Result<Self, ExtractError> {
        let mut headings = Vec::with_capacity(SectionKey::ALL.len());
        let mut primary_aliases = Vec::with_capacity(SectionKey::ALL.len());
        let mut every_alias = Vec::new();

        for key in SectionKey::ALL {
            let section = config.get(key);
            let alternation = alias_alternation(&section.aliases);
            if alternation.is_empty() {
                return Err(ExtractError::NoAliases(key.as_str().to_string()));
            }
            headings.push((key, heading_regex(&alternation)?));
            every_alias.push(alternation);

            // Checked non-empty above
            let primary = section
                .aliases
                .iter()
                .map(|a| a.trim())
                .find(|a| !a.is_empty())
                .unwrap_or_default();
            primary_aliases.push(primary.to_string());
        }

        let any_heading = heading_regex(&every_alias.join("|"))?;
        tracing::debug!("Section extractor built with {} heading patterns", headings.len());

        Ok(Self {
            headings,
            any_heading,
            primary_aliases,
        })
    }

    /// Extracts every section from `text`. Never fails: a section whose
    /// heading is not found is left empty, logged, and listed in
    /// `SectionMap::missing`.
    pub fn extract(&self, text: &str) -> SectionMap {
        let text = strip_emphasis(&normalize_line_endings(text));
        let mut map = SectionMap::default();

        for (key, pattern) in &self.headings {
            let heading = match pattern.find(&text) {
                Some(m) => m,
                None => {
                    tracing::warn!(
                        "Could not find section '{}' in the text. It may be missing or formatted differently.",
                        key.as_str()
                    );
                    map.missing.push(*key);
                    continue;
                }
            };

            // Content stops at the next heading of any section, or end of text.
            let start = heading.end();
            let end = self
                .any_heading
                .find_at(&text, start)
                .map(|next| next.start())
                .unwrap_or(text.len());

            let content = clean_content(&text[start..end]);
            tracing::debug!(
                "Section '{}': heading '{}', {} bytes of content",
                key.as_str(),
                heading.as_str().trim(),
                content.len()
            );
            map.contents[key.index()] = content;
        }

        map
    }

    /// Writes non-empty sections back out as `heading\ncontent` blocks using
    /// each section's first alias.
    pub fn render_narrative(&self, sections: &SectionMap) -> String {
        sections
            .iter()
            .filter(|(_, content)| !content.is_empty())
            .map(|(key, content)| format!("{}\n{}\n", self.primary_aliases[key.index()], content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SectionConfig, SectionsConfig};

    fn extractor() -> SectionExtractor {
        SectionExtractor::new(&SectionsConfig::default()).unwrap()
    }

    #[test]
    fn extracts_all_four_sections() {
        let text = "הקדמה\nכוח אלפא, מפקד דני.\n\nתרגיל 1\nהכוח נכנס לגזרה.\nשורה שנייה.\nתרגיל 2\nחילוץ פצוע.\nסיכום\nביצוע טוב.\n";
        let sections = extractor().extract(text);

        assert_eq!(sections.get(SectionKey::Introduction), "כוח אלפא, מפקד דני.");
        assert_eq!(
            sections.get(SectionKey::ExerciseOne),
            "הכוח נכנס לגזרה.\nשורה שנייה."
        );
        assert_eq!(sections.get(SectionKey::ExerciseTwo), "חילוץ פצוע.");
        assert_eq!(sections.get(SectionKey::Summary), "ביצוע טוב.");
        assert!(sections.missing().is_empty());
        for (_, content) in sections.iter() {
            assert!(!content.contains("תרגיל"));
        }
    }

    #[test]
    fn missing_heading_yields_empty_section() {
        let text = "מבוא\nטקסט א\nתרחיש 1\nטקסט ב\nסיכום\nטקסט ג";
        let sections = extractor().extract(text);

        assert_eq!(sections.get(SectionKey::Introduction), "טקסט א");
        assert_eq!(sections.get(SectionKey::ExerciseOne), "טקסט ב");
        assert_eq!(sections.get(SectionKey::ExerciseTwo), "");
        assert_eq!(sections.get(SectionKey::Summary), "טקסט ג");
        assert_eq!(sections.missing(), &[SectionKey::ExerciseTwo]);
    }

    #[test]
    fn english_headings_are_case_insensitive() {
        let text = "INTRODUCTION:\nIntro text\nexercise 1 - breach\nFirst\nExercise 2\nSecond\nsummary\nDone";
        let sections = extractor().extract(text);

        assert_eq!(sections.get(SectionKey::Introduction), "Intro text");
        assert_eq!(sections.get(SectionKey::ExerciseOne), "First");
        assert_eq!(sections.get(SectionKey::ExerciseTwo), "Second");
        assert_eq!(sections.get(SectionKey::Summary), "Done");
    }

    #[test]
    fn strips_markdown_and_handles_crlf() {
        let text = "**הקדמה**\r\n# כותרת משנה\r\n*טקסט* מודגש\r\nסיכום\r\n## סוף";
        let sections = extractor().extract(text);

        assert_eq!(sections.get(SectionKey::Introduction), "כותרת משנה\nטקסט מודגש");
        assert_eq!(sections.get(SectionKey::Summary), "סוף");
    }

    #[test]
    fn out_of_order_sections_do_not_bleed() {
        let text = "סיכום\nסוף\nהקדמה\nהתחלה\n";
        let sections = extractor().extract(text);

        assert_eq!(sections.get(SectionKey::Summary), "סוף");
        assert_eq!(sections.get(SectionKey::Introduction), "התחלה");
    }

    #[test]
    fn empty_text_yields_all_empty() {
        let sections = extractor().extract("");
        assert!(sections.iter().all(|(_, content)| content.is_empty()));
        assert_eq!(sections.missing(), &SectionKey::ALL);
    }

    #[test]
    fn heading_on_last_line_without_newline_is_not_a_heading() {
        let sections = extractor().extract("הקדמה\nטקסט\nסיכום");
        assert_eq!(sections.get(SectionKey::Introduction), "טקסט\nסיכום");
        assert_eq!(sections.get(SectionKey::Summary), "");
    }

    #[test]
    fn strip_emphasis_is_idempotent() {
        let text = "**bold** and *italic* and ***both***";
        let once = strip_emphasis(text);
        assert_eq!(once, "bold and italic and both");
        assert_eq!(strip_emphasis(&once), once);
    }

    #[test]
    fn round_trips_rendered_narrative() {
        let extractor = extractor();
        let original = SectionMap::from_pairs([
            (SectionKey::Introduction, "פתיחה"),
            (SectionKey::ExerciseOne, "שלב ראשון\nעם שתי שורות"),
            (SectionKey::ExerciseTwo, "שלב שני"),
            (SectionKey::Summary, "סיום"),
        ]);

        let rendered = extractor.render_narrative(&original);
        let reparsed = extractor.extract(&rendered);
        assert_eq!(reparsed, original);
    }

    #[test]
    fn custom_alias_table() {
        let mut config = SectionsConfig::default();
        config.introduction = SectionConfig {
            label: "Background".to_string(),
            aliases: vec!["Background".to_string()],
        };
        let extractor = SectionExtractor::new(&config).unwrap();
        let sections = extractor.extract("Background\nContext here\nSummary\nEnd\n");

        assert_eq!(sections.get(SectionKey::Introduction), "Context here");
        assert_eq!(sections.get(SectionKey::Summary), "End");
    }

    #[test]
    fn aliases_are_matched_literally() {
        let mut config = SectionsConfig::default();
        config.summary.aliases = vec!["Summary (final)".to_string()];
        let extractor = SectionExtractor::new(&config).unwrap();
        let sections = extractor.extract("Summary (final)\nok\n");
        assert_eq!(sections.get(SectionKey::Summary), "ok");
    }

    #[test]
    fn blank_alias_list_is_rejected() {
        let mut config = SectionsConfig::default();
        config.exercise_two.aliases = vec!["  ".to_string()];
        assert!(matches!(
            SectionExtractor::new(&config),
            Err(ExtractError::NoAliases(_))
        ));
    }
}
