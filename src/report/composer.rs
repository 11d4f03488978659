// src/report/composer.rs
use crate::config::ReportConfig;
use crate::extractors::section::SectionMap;
use crate::grades::model::{format_score, GradesReport};
use crate::report::blocks::{Alignment, DocumentBlock, ImageSource};
use crate::report::chart::{BarChart, ChartArtifact, ChartRenderer};
use crate::utils::error::{ChartError, ComposeError, GradeError};
use std::fs;
use std::path::Path;

const PART_CHART_COLOR: &str = "skyblue";
const COMPARISON_CHART_COLOR: &str = "lightgreen";
const COMPARISON_CHART_STEM: &str = "final_grade";

/// Presentation metadata for one report. Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub date: Option<String>,
    pub signature: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Lays out a report as an ordered list of `DocumentBlock`s.
///
/// Chart images are rendered into a private scratch directory under
/// `config.chart_dir`, read back into the
/// image block, and deleted before the next block is produced.
pub struct ReportComposer<'a, R: ChartRenderer + ?Sized> {
    config: &'a ReportConfig,
    charts: &'a R,
}

impl<'a, R: ChartRenderer + ?Sized> ReportComposer<'a, R> {
    pub fn new(config: &'a ReportConfig, charts: &'a R) -> Self {
        Self { config, charts }
    }

    pub fn compose(
        &self,
        sections: &SectionMap,
        grades: Option<&GradesReport>,
        meta: &Metadata,
    ) -> Result<Vec<DocumentBlock>, ComposeError> {
        // Reject structurally invalid grades before anything is laid out
        if let Some(grades) = grades {
            grades.validate()?;
        }

        let mut blocks = Vec::new();

        if self.config.layout.includes_cover() {
            self.push_cover(&mut blocks, meta);
        }

        if let Some(title) = non_empty(&meta.title) {
            blocks.push(DocumentBlock::heading(title, 0, Alignment::Center));
        }

        self.push_sections(&mut blocks, sections);

        if let Some(grades) = grades {
            self.push_grades(&mut blocks, grades)?;
        }

        self.push_closing(&mut blocks, meta);

        tracing::info!(
            "Composed report with {} blocks ({} layout)",
            blocks.len(),
            self.config.layout.as_str()
        );
        Ok(blocks)
    }

    fn push_cover(&self, blocks: &mut Vec<DocumentBlock>, meta: &Metadata) {
        let branding = &self.config.branding;
        let labels = &self.config.labels;

        if let Some(logo) = self.branding_image(branding.cover_logo.as_deref(), branding.cover_logo_width) {
            blocks.push(logo);
        }
        blocks.push(DocumentBlock::heading(&labels.cover_title, 0, Alignment::Center));
        if let Some(date) = non_empty(&meta.date) {
            blocks.push(DocumentBlock::paragraph(date, Alignment::Center));
        }
        blocks.push(DocumentBlock::paragraph(&labels.cover_description, Alignment::Center));
        blocks.push(DocumentBlock::PageBreak);
    }

    fn push_sections(&self, blocks: &mut Vec<DocumentBlock>, sections: &SectionMap) {
        let alignment = self.config.layout.section_alignment();

        for (key, content) in sections.iter() {
            if content.is_empty() {
                tracing::debug!("Skipping empty section '{}'", key.as_str());
                continue;
            }
            let label = &self.config.sections.get(key).label;
            blocks.push(DocumentBlock::heading(label, 1, alignment));
            blocks.push(DocumentBlock::paragraph(content, alignment));
        }
    }

    fn push_grades(&self, blocks: &mut Vec<DocumentBlock>, grades: &GradesReport) -> Result<(), ComposeError> {
        let labels = &self.config.labels;
        let axis_max = self.config.score_range.max;
        let right_to_left = self.config.style.right_to_left;

        fs::create_dir_all(&self.config.chart_dir).map_err(ChartError::from)?;
        // Removed with everything in it when this call returns
        let scratch = tempfile::Builder::new()
            .prefix("charts_")
            .tempdir_in(&self.config.chart_dir)
            .map_err(ChartError::from)?;

        blocks.push(DocumentBlock::PageBreak);
        blocks.push(DocumentBlock::heading(&labels.grades_heading, 1, Alignment::Center));

        for part in grades.parts() {
            blocks.push(DocumentBlock::heading(part.label(), 2, Alignment::Center));

            let chart = BarChart {
                title: part.label().to_string(),
                x_label: labels.part_axis.clone(),
                bars: part.items().iter().map(|(label, score)| (label.clone(), *score)).collect(),
                axis_max,
                right_to_left,
                color: PART_CHART_COLOR,
            };
            blocks.push(self.chart_block(&chart, scratch.path(), part.label())?);

            if let Some(comment) = part.comment() {
                blocks.push(DocumentBlock::paragraph(comment, Alignment::Center));
            }
        }

        let final_grade = grades.final_grade().ok_or(GradeError::NoParts)?;
        blocks.push(DocumentBlock::bold_paragraph(
            format!("{}: {}", labels.final_grade, format_score(final_grade)),
            Alignment::Center,
        ));

        let comparison = BarChart {
            title: labels.comparison_title.clone(),
            x_label: labels.comparison_axis.clone(),
            bars: grades.averages().into_iter().collect(),
            axis_max,
            right_to_left,
            color: COMPARISON_CHART_COLOR,
        };
        blocks.push(self.chart_block(&comparison, scratch.path(), COMPARISON_CHART_STEM)?);

        Ok(())
    }

    /// Renders a chart, captures its bytes and lets the artifact guard delete the file.
    fn chart_block(&self, chart: &BarChart, dir: &Path, stem: &str) -> Result<DocumentBlock, ChartError> {
        let artifact = ChartArtifact::render(self.charts, chart, dir, stem)?;
        let data = artifact.read()?;
        let name = artifact
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| stem.to_string());

        Ok(DocumentBlock::Image {
            source: ImageSource::Embedded {
                name,
                media_type: self.charts.media_type(),
                data,
            },
            width: self.config.style.chart_width,
        })
    }

    fn push_closing(&self, blocks: &mut Vec<DocumentBlock>, meta: &Metadata) {
        let labels = &self.config.labels;
        let layout = self.config.layout;
        let branding = &self.config.branding;

        blocks.push(DocumentBlock::PageBreak);
        blocks.push(DocumentBlock::heading(&labels.closing_title, 0, Alignment::Center));
        blocks.push(DocumentBlock::paragraph(&labels.thank_you, Alignment::Center));

        for contact in &self.config.contacts {
            let target = contact.link_target().filter(|_| layout.supports_hyperlinks());
            match target {
                Some(target) => blocks.push(DocumentBlock::Hyperlink {
                    label: contact.display(),
                    target,
                    alignment: Alignment::Center,
                }),
                None => blocks.push(DocumentBlock::paragraph(contact.display(), Alignment::Center)),
            }
        }

        if let Some(logo) = self.branding_image(branding.closing_logo.as_deref(), branding.closing_logo_width) {
            blocks.push(logo);
        }

        if let Some(signature) = non_empty(&meta.signature) {
            blocks.push(DocumentBlock::bold_paragraph(signature, layout.signature_alignment()));
        }
    }

    /// Image block for a configured asset; a missing file is skipped with a warning.
    fn branding_image(&self, path: Option<&Path>, width: f32) -> Option<DocumentBlock> {
        let path = path?;
        if !path.is_file() {
            tracing::warn!("Logo file '{}' not found. Skipping logo.", path.display());
            return None;
        }
        Some(DocumentBlock::Image {
            source: ImageSource::File(path.to_path_buf()),
            width,
        })
    }
}
