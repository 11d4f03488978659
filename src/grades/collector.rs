// src/grades/collector.rs
use crate::grades::model::{format_score, GradesReport, RubricPart, RubricTemplate, ScoreRange};
use crate::utils::error::{AppError, GradeError};
use indexmap::IndexMap;
use std::io::{BufRead, Write};

/// Where the collector is in the rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    AwaitingItem { part: usize, item: usize },
    AwaitingComment { part: usize },
    Done,
}

/// What the operator should be asked next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt<'a> {
    Item { part: &'a str, item: &'a str },
    Comment { part: &'a str },
}

/// Walks a rubric one input event at a time and yields a finished `GradesReport`.
///
/// Invalid scores leave the state untouched so the same item can be asked again.
/// Nothing about the front-end (console, chat, form) leaks into the report.
#[derive(Debug)]
pub struct GradeCollector {
    rubric: RubricTemplate,
    range: ScoreRange,
    state: CollectorState,
    pending: IndexMap<String, f64>,
    report: GradesReport,
}

impl GradeCollector {
    pub fn new(rubric: RubricTemplate, range: ScoreRange) -> Result<Self, GradeError> {
        rubric.validate()?;
        range.validate()?;

        Ok(Self {
            rubric,
            range,
            state: CollectorState::AwaitingItem { part: 0, item: 0 },
            pending: IndexMap::new(),
            report: GradesReport::default(),
        })
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    pub fn range(&self) -> ScoreRange {
        self.range
    }

    pub fn prompt(&self) -> Option<Prompt<'_>> {
        match self.state {
            CollectorState::AwaitingItem { part, item } => {
                let template = &self.rubric.parts[part];
                Some(Prompt::Item {
                    part: &template.label,
                    item: &template.items[item],
                })
            }
            CollectorState::AwaitingComment { part } => Some(Prompt::Comment {
                part: &self.rubric.parts[part].label,
            }),
            CollectorState::Done => None,
        }
    }

    /// Feeds one answer to the current prompt and returns the new state.
    pub fn submit(&mut self, input: &str) -> Result<CollectorState, GradeError> {
        match self.state {
            CollectorState::AwaitingItem { part, item } => {
                let template = &self.rubric.parts[part];
                let label = &template.items[item];
                let score = self.range.parse(label, input)?;
                tracing::debug!("Recorded {} for '{}'", format_score(score), label);
                self.pending.insert(label.clone(), score);

                self.state = if item + 1 < template.items.len() {
                    CollectorState::AwaitingItem { part, item: item + 1 }
                } else {
                    CollectorState::AwaitingComment { part }
                };
            }
            CollectorState::AwaitingComment { part } => {
                let label = self.rubric.parts[part].label.clone();
                let items = std::mem::take(&mut self.pending);
                let rubric_part = RubricPart::new(label, items, Some(input.to_string()))?;
                tracing::info!(
                    "Part '{}' graded, average {}",
                    rubric_part.label(),
                    format_score(rubric_part.average())
                );
                self.report.push(rubric_part);

                self.state = if part + 1 < self.rubric.parts.len() {
                    CollectorState::AwaitingItem {
                        part: part + 1,
                        item: 0,
                    }
                } else {
                    CollectorState::Done
                };
            }
            CollectorState::Done => {
                tracing::debug!("Ignoring input after grade collection finished");
            }
        }
        Ok(self.state)
    }

    pub fn finish(self) -> Result<GradesReport, GradeError> {
        if self.state != CollectorState::Done {
            return Err(GradeError::Unfinished);
        }
        self.report.validate()?;
        Ok(self.report)
    }
}

/// Console front-end: asks every prompt on `output`, reads answers line by line
/// from `input`, and re-asks after an invalid grade.
pub fn collect_interactive<R: BufRead, W: Write>(
    mut collector: GradeCollector,
    mut input: R,
    mut output: W,
) -> Result<GradesReport, AppError> {
    let range = collector.range();
    writeln!(
        output,
        "Please enter grades between {} and {} for each item.",
        range.min, range.max
    )?;

    let mut line = String::new();
    while let Some(prompt) = collector.prompt() {
        match prompt {
            Prompt::Item { part, item } => {
                if matches!(collector.state(), CollectorState::AwaitingItem { item: 0, .. }) {
                    writeln!(output, "\n{}:", part)?;
                }
                write!(output, "Enter grade for {}: ", item)?;
            }
            Prompt::Comment { part } => write!(output, "Enter comment for {}: ", part)?,
        }
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "input ended before all grades were collected",
            )
            .into());
        }

        if let Err(e) = collector.submit(line.trim_end_matches(&['\r', '\n'][..])) {
            writeln!(output, "{}", e)?;
        }
    }

    Ok(collector.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grades::model::RubricPartTemplate;
    use std::io::Cursor;

    fn small_rubric() -> RubricTemplate {
        RubricTemplate {
            parts: vec![
                RubricPartTemplate {
                    label: "קשר".to_string(),
                    items: vec!["a".to_string(), "b".to_string()],
                },
                RubricPartTemplate {
                    label: "פיקוד".to_string(),
                    items: vec!["c".to_string()],
                },
            ],
        }
    }

    #[test]
    fn walks_states_in_rubric_order() {
        let mut collector = GradeCollector::new(small_rubric(), ScoreRange::default()).unwrap();
        assert_eq!(collector.state(), CollectorState::AwaitingItem { part: 0, item: 0 });
        assert_eq!(
            collector.prompt(),
            Some(Prompt::Item { part: "קשר", item: "a" })
        );

        assert_eq!(
            collector.submit("8").unwrap(),
            CollectorState::AwaitingItem { part: 0, item: 1 }
        );
        assert_eq!(
            collector.submit("6").unwrap(),
            CollectorState::AwaitingComment { part: 0 }
        );
        assert_eq!(
            collector.submit("טוב").unwrap(),
            CollectorState::AwaitingItem { part: 1, item: 0 }
        );
        assert_eq!(
            collector.submit("10").unwrap(),
            CollectorState::AwaitingComment { part: 1 }
        );
        assert_eq!(collector.submit("").unwrap(), CollectorState::Done);
        assert_eq!(collector.prompt(), None);

        let report = collector.finish().unwrap();
        assert_eq!(report.parts().len(), 2);
        assert_eq!(report.parts()[0].average(), 7.0);
        assert_eq!(report.parts()[0].comment(), Some("טוב"));
        assert_eq!(report.parts()[1].comment(), None);
        assert_eq!(report.final_grade(), Some(8.5));
    }

    #[test]
    fn invalid_grade_keeps_state() {
        let mut collector = GradeCollector::new(small_rubric(), ScoreRange::default()).unwrap();
        assert!(matches!(collector.submit("11"), Err(GradeError::OutOfRange { .. })));
        assert!(matches!(collector.submit("x"), Err(GradeError::NotANumber(_))));
        assert_eq!(collector.state(), CollectorState::AwaitingItem { part: 0, item: 0 });
    }

    #[test]
    fn unfinished_collection_is_rejected() {
        let mut collector = GradeCollector::new(small_rubric(), ScoreRange::default()).unwrap();
        collector.submit("5").unwrap();
        assert_eq!(collector.finish().unwrap_err(), GradeError::Unfinished);
    }

    #[test]
    fn empty_rubric_is_rejected() {
        let rubric = RubricTemplate { parts: vec![] };
        assert_eq!(
            GradeCollector::new(rubric, ScoreRange::default()).unwrap_err(),
            GradeError::NoParts
        );
    }

    #[test]
    fn rubric_with_repeated_item_is_rejected() {
        let mut rubric = small_rubric();
        rubric.parts[0].items.push("a".to_string());
        assert_eq!(
            GradeCollector::new(rubric, ScoreRange::default()).unwrap_err(),
            GradeError::DuplicateLabel("a".to_string())
        );
    }

    #[test]
    fn console_loop_reprompts_on_bad_input() {
        let collector = GradeCollector::new(small_rubric(), ScoreRange::default()).unwrap();
        let input = Cursor::new("12\n9\n7\nהערה\n10\n\n");
        let mut output = Vec::new();

        let report = collect_interactive(collector, input, &mut output).unwrap();
        assert_eq!(report.parts()[0].average(), 8.0);
        assert_eq!(report.parts()[0].comment(), Some("הערה"));

        let transcript = String::from_utf8(output).unwrap();
        assert_eq!(transcript.matches("Enter grade for a:").count(), 2);
        assert!(transcript.contains("outside the range"));
    }

    #[test]
    fn console_loop_fails_on_early_eof() {
        let collector = GradeCollector::new(small_rubric(), ScoreRange::default()).unwrap();
        let result = collect_interactive(collector, Cursor::new("5\n"), Vec::new());
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
