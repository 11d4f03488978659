// src/config/mod.rs
use crate::extractors::section::SectionKey;
use crate::grades::model::{RubricTemplate, ScoreRange};
use crate::report::blocks::Alignment;
use crate::utils::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Presentation variant of the generated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LayoutVariant {
    /// Centered text, clickable contacts, closing logo.
    #[default]
    Standard,
    /// Cover page, right-aligned sections, plain contacts, left-aligned signature.
    Cover,
}

impl LayoutVariant {
    pub fn includes_cover(self) -> bool {
        matches!(self, LayoutVariant::Cover)
    }

    pub fn section_alignment(self) -> Alignment {
        match self {
            LayoutVariant::Standard => Alignment::Center,
            LayoutVariant::Cover => Alignment::Right,
        }
    }

    pub fn signature_alignment(self) -> Alignment {
        match self {
            LayoutVariant::Standard => Alignment::Center,
            LayoutVariant::Cover => Alignment::Left,
        }
    }

    pub fn supports_hyperlinks(self) -> bool {
        matches!(self, LayoutVariant::Standard)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutVariant::Standard => "standard",
            LayoutVariant::Cover => "cover",
        }
    }
}

/// Display label and recognized headings of one narrative section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub label: String,
    /// Tried in order; the first one is used when writing a narrative back out.
    pub aliases: Vec<String>,
}

/// The heading alias table, one entry per `SectionKey`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionsConfig {
    pub introduction: SectionConfig,
    pub exercise_one: SectionConfig,
    pub exercise_two: SectionConfig,
    pub summary: SectionConfig,
}

impl SectionsConfig {
    pub fn get(&self, key: SectionKey) -> &SectionConfig {
        match key {
            SectionKey::Introduction => &self.introduction,
            SectionKey::ExerciseOne => &self.exercise_one,
            SectionKey::ExerciseTwo => &self.exercise_two,
            SectionKey::Summary => &self.summary,
        }
    }
}

fn section(label: &str, aliases: &[&str]) -> SectionConfig {
    SectionConfig {
        label: label.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

impl Default for SectionsConfig {
    fn default() -> Self {
        Self {
            introduction: section("הקדמה", &["הקדמה", "מבוא", "Introduction"]),
            exercise_one: section("תרגיל 1", &["תרגיל 1", "תרחיש 1", "Exercise 1", "Scenario 1"]),
            exercise_two: section("תרגיל 2", &["תרגיל 2", "תרחיש 2", "Exercise 2", "Scenario 2"]),
            summary: section("סיכום", &["סיכום", "Summary"]),
        }
    }
}

/// Fixed wording printed in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportLabels {
    pub default_title: String,
    pub cover_title: String,
    pub cover_description: String,
    pub grades_heading: String,
    pub final_grade: String,
    pub part_axis: String,
    pub comparison_title: String,
    pub comparison_axis: String,
    pub closing_title: String,
    pub thank_you: String,
}

impl Default for ReportLabels {
    fn default() -> Self {
        Self {
            default_title: "אימון בסימולטור DCA".to_string(),
            cover_title: "דוח סיכום קרב".to_string(),
            cover_description: "DCA היא חברה המתמחה באימונים בסימולטורים מתקדמים עבור כוחות הביטחון. \
                                אנו מחויבים להעניק את ההכשרה המקצועית והאיכותית ביותר למתאמנים שלנו."
                .to_string(),
            grades_heading: "דוח ציונים".to_string(),
            final_grade: "ציון סופי".to_string(),
            part_axis: "ציון".to_string(),
            comparison_title: "ציון ממוצע לכל חלק".to_string(),
            comparison_axis: "ציון ממוצע".to_string(),
            closing_title: "תודה שהשתתפתם באימון שלנו".to_string(),
            thank_you: "אנו מודים לכם על השתתפותכם באימון שלנו. נשמח לעמוד לשירותכם בכל עת."
                .to_string(),
        }
    }
}

/// Optional logo images; a configured file that does not exist is skipped with a warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Branding {
    pub cover_logo: Option<PathBuf>,
    pub closing_logo: Option<PathBuf>,
    /// Inches
    pub cover_logo_width: f32,
    /// Inches
    pub closing_logo_width: f32,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            cover_logo: Some(PathBuf::from("dca_logo.png")),
            closing_logo: Some(PathBuf::from("dca_logo2.png")),
            cover_logo_width: 2.0,
            closing_logo_width: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    Web,
    Email,
    Phone,
}

/// One line of the closing page contact list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactEntry {
    pub label: String,
    pub value: String,
    pub kind: ContactKind,
}

impl ContactEntry {
    pub fn display(&self) -> String {
        format!("{}: {}", self.label, self.value)
    }

    /// Link target when the entry can be clicked; phone numbers stay plain text.
    pub fn link_target(&self) -> Option<String> {
        match self.kind {
            ContactKind::Web => Some(self.value.clone()),
            ContactKind::Email => Some(format!("mailto:{}", self.value)),
            ContactKind::Phone => None,
        }
    }
}

fn default_contacts() -> Vec<ContactEntry> {
    let entry = |label: &str, value: &str, kind| ContactEntry {
        label: label.to_string(),
        value: value.to_string(),
        kind,
    };
    vec![
        entry("אתר האינטרנט", "https://www.dca.co.il", ContactKind::Web),
        entry("דוא\"ל", "contact@dca.co.il", ContactKind::Email),
        entry("טלפון", "+972-3-1234567", ContactKind::Phone),
        entry("LinkedIn", "https://www.linkedin.com/company/dca-israel/", ContactKind::Web),
    ]
}

/// Font and locale handed to the document renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentStyle {
    pub font_family: String,
    /// Points
    pub body_size: f32,
    /// Points, indexed by heading level; deeper levels reuse the last entry.
    pub heading_sizes: Vec<f32>,
    pub language: String,
    pub right_to_left: bool,
    /// Width of chart images, inches
    pub chart_width: f32,
}

impl Default for DocumentStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            body_size: 12.0,
            heading_sizes: vec![24.0, 16.0, 14.0],
            language: "he".to_string(),
            right_to_left: true,
            chart_width: 6.0,
        }
    }
}

impl DocumentStyle {
    pub fn heading_size(&self, level: u8) -> f32 {
        self.heading_sizes
            .get(level as usize)
            .or_else(|| self.heading_sizes.last())
            .copied()
            .unwrap_or(self.body_size)
    }
}

/// Everything the extractor, composer and renderers need, passed explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub layout: LayoutVariant,
    pub sections: SectionsConfig,
    pub labels: ReportLabels,
    pub rubric: RubricTemplate,
    pub score_range: ScoreRange,
    pub branding: Branding,
    #[serde(default = "default_contacts")]
    pub contacts: Vec<ContactEntry>,
    pub style: DocumentStyle,
    /// Scratch directory for transient chart images.
    pub chart_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            layout: LayoutVariant::default(),
            sections: SectionsConfig::default(),
            labels: ReportLabels::default(),
            rubric: RubricTemplate::default(),
            score_range: ScoreRange::default(),
            branding: Branding::default(),
            contacts: default_contacts(),
            style: DocumentStyle::default(),
            chart_dir: std::env::temp_dir(),
        }
    }
}

impl ReportConfig {
    /// Loads configuration from a TOML file. Missing keys keep their defaults;
    /// relative asset paths are resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: ReportConfig = toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let source_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        config.resolve_paths(&source_dir);
        config.validate()?;

        tracing::info!("Loaded report configuration from {}", path.display());
        Ok(config)
    }

    fn resolve_paths(&mut self, source_dir: &Path) {
        let resolve = |candidate: &mut PathBuf| {
            if candidate.is_relative() {
                *candidate = source_dir.join(&*candidate);
            }
        };
        if let Some(logo) = self.branding.cover_logo.as_mut() {
            resolve(logo);
        }
        if let Some(logo) = self.branding.closing_logo.as_mut() {
            resolve(logo);
        }
        resolve(&mut self.chart_dir);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.score_range
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.rubric
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.style.body_size <= 0.0 || self.style.heading_sizes.iter().any(|s| *s <= 0.0) {
            return Err(ConfigError::Invalid("font sizes must be positive".to_string()));
        }
        Ok(())
    }
}
