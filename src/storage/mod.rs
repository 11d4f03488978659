// src/storage/mod.rs
pub mod html;

use crate::config::{DocumentStyle, LayoutVariant};
use crate::extractors::section::{SectionKey, SectionMap};
use crate::grades::model::GradesReport;
use crate::report::blocks::DocumentBlock;
use crate::report::composer::Metadata;
use crate::utils::error::StorageError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

fn key_names(keys: &[SectionKey]) -> Vec<&'static str> {
    keys.iter().map(|key| key.as_str()).collect()
}

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// Writes the (improved) narrative as UTF-8 text and returns its path.
    pub fn write_narrative(&self, file_name: &str, text: &str) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(file_name);
        fs::write(&file_path, text.as_bytes()).map_err(StorageError::IoError)?;

        tracing::info!("Saved narrative to {} ({} bytes)", file_path.display(), text.len());
        Ok(file_path)
    }

    /// Reads a narrative back. Any failure, including invalid UTF-8, is fatal
    /// for the caller rather than silently becoming empty text.
    pub fn read_narrative(&self, path: &Path) -> Result<String, StorageError> {
        let text = fs::read_to_string(path).map_err(|source| StorageError::NarrativeUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!("Read {} bytes of narrative from {}", text.len(), path.display());
        Ok(text)
    }

    /// Renders the blocks and writes the document, replacing any earlier output.
    pub fn save_report(
        &self,
        blocks: &[DocumentBlock],
        style: &DocumentStyle,
        file_name: &str,
    ) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(file_name);

        // Delete the old report first so a file held open elsewhere is reported clearly
        if file_path.exists() {
            if let Err(e) = fs::remove_file(&file_path) {
                tracing::error!("Error deleting '{}': {}", file_path.display(), e);
                return Err(StorageError::OutputLocked(file_path));
            }
            tracing::info!("Deleted existing file '{}'", file_path.display());
        }

        let document = html::render_document(blocks, style);
        fs::write(&file_path, document.as_bytes()).map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => StorageError::OutputLocked(file_path.clone()),
            _ => StorageError::IoError(e),
        })?;

        tracing::info!("Saved report to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves metadata about the report in JSON format next to it
    pub fn save_report_metadata(
        &self,
        file_name: &str,
        meta: &Metadata,
        layout: LayoutVariant,
        sections: &SectionMap,
        grades: Option<&GradesReport>,
    ) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(file_name);

        let parts = grades
            .map(|g| {
                g.parts()
                    .iter()
                    .map(|part| {
                        serde_json::json!({
                            "label": part.label(),
                            "average": part.average(),
                            "items": part.items(),
                            "comment": part.comment(),
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        // Create metadata structure
        let metadata = serde_json::json!({
            "title": meta.title,
            "date": meta.date,
            "signature": meta.signature,
            "layout": layout.as_str(),
            "sections_populated": key_names(&sections.populated()),
            "sections_missing": key_names(sections.missing()),
            "parts": parts,
            "final_grade": grades.and_then(GradesReport::final_grade),
            "generated_at": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grades::model::RubricPart;
    use crate::report::blocks::Alignment;
    use indexmap::IndexMap;
    use tempfile::tempdir;

    #[test]
    fn creates_base_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("out/reports");
        let storage = StorageManager::new(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(storage.base_dir, nested);
    }

    #[test]
    fn narrative_round_trips_hebrew() {
        let dir = tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        let text = "הקדמה\nכוח \"אלפא\" – מפקד דני ✓\n";

        let path = storage.write_narrative("middle.txt", text).unwrap();
        assert_eq!(storage.read_narrative(&path).unwrap(), text);
    }

    #[test]
    fn missing_narrative_is_an_error() {
        let dir = tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        let result = storage.read_narrative(&dir.path().join("middle.txt"));
        assert!(matches!(result, Err(StorageError::NarrativeUnreadable { .. })));
    }

    #[test]
    fn report_replaces_previous_output() {
        let dir = tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        fs::write(dir.path().join("report.html"), "old").unwrap();

        let blocks = vec![DocumentBlock::heading("דוח", 0, Alignment::Center)];
        let path = storage
            .save_report(&blocks, &DocumentStyle::default(), "report.html")
            .unwrap();

        let written = fs::read_to_string(path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
        assert!(written.contains("דוח"));
    }

    #[test]
    fn undeletable_output_is_reported_as_locked() {
        let dir = tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        // A directory in the way cannot be removed as a file
        fs::create_dir(dir.path().join("report.html")).unwrap();

        let result = storage.save_report(&[], &DocumentStyle::default(), "report.html");
        match result {
            Err(e @ StorageError::OutputLocked(_)) => {
                assert!(e.to_string().contains("close the document"));
            }
            other => panic!("expected OutputLocked, got {:?}", other),
        }
    }

    #[test]
    fn metadata_lists_sections_and_grades() {
        let dir = tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();

        let mut items = IndexMap::new();
        items.insert("x".to_string(), 8.0);
        items.insert("y".to_string(), 7.0);
        let grades = GradesReport::new(vec![RubricPart::new("קשר", items, None).unwrap()]);
        let sections = SectionMap::from_pairs([(SectionKey::Summary, "סוף")]);
        let meta = Metadata {
            title: Some("אימון".to_string()),
            ..Metadata::default()
        };

        let path = storage
            .save_report_metadata("report_meta.json", &meta, LayoutVariant::Cover, &sections, Some(&grades))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(value["title"], "אימון");
        assert_eq!(value["layout"], "cover");
        assert_eq!(value["sections_populated"], serde_json::json!(["Summary"]));
        assert_eq!(value["parts"][0]["average"], 7.5);
        assert_eq!(value["final_grade"], 7.5);
        assert!(value["date"].is_null());
    }
}
