// src/report/blocks.rs
use std::path::PathBuf;

/// Horizontal placement of a block on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn as_css(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Normal,
    Bold,
}

/// Where the bytes of an image come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// A static asset on disk, read by the renderer.
    File(PathBuf),
    /// Bytes captured at composition time; the file they came from is gone.
    Embedded {
        name: String,
        media_type: &'static str,
        data: Vec<u8>,
    },
}

/// One unit of the composed report, handed to a document renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentBlock {
    /// Level 0 is a title; 1 and 2 are section and sub-section headings.
    Heading {
        text: String,
        level: u8,
        alignment: Alignment,
    },
    Paragraph {
        text: String,
        alignment: Alignment,
        emphasis: Emphasis,
    },
    /// `width` is in inches.
    Image { source: ImageSource, width: f32 },
    PageBreak,
    Hyperlink {
        label: String,
        target: String,
        alignment: Alignment,
    },
}

impl DocumentBlock {
    pub fn heading(text: impl Into<String>, level: u8, alignment: Alignment) -> Self {
        DocumentBlock::Heading {
            text: text.into(),
            level,
            alignment,
        }
    }

    pub fn paragraph(text: impl Into<String>, alignment: Alignment) -> Self {
        DocumentBlock::Paragraph {
            text: text.into(),
            alignment,
            emphasis: Emphasis::Normal,
        }
    }

    pub fn bold_paragraph(text: impl Into<String>, alignment: Alignment) -> Self {
        DocumentBlock::Paragraph {
            text: text.into(),
            alignment,
            emphasis: Emphasis::Bold,
        }
    }

    /// Text of a heading block, `None` for anything else.
    pub fn heading_text(&self) -> Option<&str> {
        match self {
            DocumentBlock::Heading { text, .. } => Some(text),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn paragraph_text(&self) -> Option<&str> {
        match self {
            DocumentBlock::Paragraph { text, .. } => Some(text),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_image(&self) -> bool {
        matches!(self, DocumentBlock::Image { .. })
    }
}
