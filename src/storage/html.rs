// src/storage/html.rs
use crate::config::DocumentStyle;
use crate::report::blocks::{DocumentBlock, Emphasis, ImageSource};
use crate::utils::markup::escape;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fs;
use std::path::Path;

const FALLBACK_TITLE: &str = "Report";

fn media_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "image/png",
    }
}

fn data_uri(media_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(data))
}

/// Escaped text with line breaks kept.
fn text_html(text: &str) -> String {
    text.lines().map(escape).collect::<Vec<_>>().join("<br/>\n")
}

fn image_html(source: &ImageSource, width: f32) -> Option<String> {
    let (uri, alt) = match source {
        ImageSource::Embedded {
            name,
            media_type,
            data,
        } => (data_uri(media_type, data), name.clone()),
        ImageSource::File(path) => match fs::read(path) {
            Ok(data) => (
                data_uri(media_type_for(path), &data),
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ),
            Err(e) => {
                tracing::warn!("Cannot read image {}: {}. Skipping image.", path.display(), e);
                return None;
            }
        },
    };

    Some(format!(
        "<p class=\"image\"><img src=\"{}\" alt=\"{}\" style=\"width: {}in\"/></p>\n",
        uri,
        escape(&alt),
        width
    ))
}

/// Serializes report blocks into a self-contained HTML document.
///
/// Images are inlined as data URIs so the file can be shared on its own.
/// Direction, language, font family and sizes come from `style`.
pub fn render_document(blocks: &[DocumentBlock], style: &DocumentStyle) -> String {
    let title = blocks
        .iter()
        .find_map(DocumentBlock::heading_text)
        .unwrap_or(FALLBACK_TITLE);
    let direction = if style.right_to_left { "rtl" } else { "ltr" };

    let mut html = String::from("<!DOCTYPE html>\n");
    html.push_str(&format!(
        "<html lang=\"{}\" dir=\"{}\">\n<head>\n<meta charset=\"utf-8\"/>\n<title>{}</title>\n<style>\n",
        escape(&style.language),
        direction,
        escape(title)
    ));

    html.push_str(&format!(
        "body {{ font-family: '{}', sans-serif; font-size: {}pt; }}\n",
        escape(&style.font_family),
        style.body_size
    ));
    html.push_str(&format!("h1.title {{ font-size: {}pt; }}\n", style.heading_size(0)));
    for level in 1..=5u8 {
        html.push_str(&format!(
            "h{} {{ font-size: {}pt; }}\n",
            level + 1,
            style.heading_size(level)
        ));
    }
    html.push_str(".image { text-align: center; }\n");
    html.push_str(".page-break { page-break-after: always; break-after: page; }\n");
    html.push_str("</style>\n</head>\n<body>\n");

    for block in blocks {
        match block {
            DocumentBlock::Heading {
                text,
                level,
                alignment,
            } => {
                let (tag, class) = match level {
                    0 => ("h1".to_string(), " class=\"title\""),
                    n => (format!("h{}", (*n as usize + 1).min(6)), ""),
                };
                html.push_str(&format!(
                    "<{tag}{class} style=\"text-align: {align}\">{text}</{tag}>\n",
                    tag = tag,
                    class = class,
                    align = alignment.as_css(),
                    text = escape(text)
                ));
            }
            DocumentBlock::Paragraph {
                text,
                alignment,
                emphasis,
            } => {
                let body = match emphasis {
                    Emphasis::Bold => format!("<strong>{}</strong>", text_html(text)),
                    Emphasis::Normal => text_html(text),
                };
                html.push_str(&format!(
                    "<p style=\"text-align: {}\">{}</p>\n",
                    alignment.as_css(),
                    body
                ));
            }
            DocumentBlock::Image { source, width } => {
                if let Some(img) = image_html(source, *width) {
                    html.push_str(&img);
                }
            }
            DocumentBlock::PageBreak => html.push_str("<div class=\"page-break\"></div>\n"),
            DocumentBlock::Hyperlink {
                label,
                target,
                alignment,
            } => {
                html.push_str(&format!(
                    "<p style=\"text-align: {}\"><a href=\"{}\">{}</a></p>\n",
                    alignment.as_css(),
                    escape(target),
                    escape(label)
                ));
            }
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::blocks::Alignment;
    use std::path::PathBuf;

    #[test]
    fn renders_blocks_in_order() {
        let blocks = vec![
            DocumentBlock::heading("דוח <סיכום>", 0, Alignment::Center),
            DocumentBlock::heading("הקדמה", 1, Alignment::Right),
            DocumentBlock::paragraph("שורה 1\nשורה 2", Alignment::Right),
            DocumentBlock::PageBreak,
            DocumentBlock::bold_paragraph("ציון סופי: 8.17", Alignment::Center),
            DocumentBlock::Hyperlink {
                label: "אתר: https://example.org".to_string(),
                target: "https://example.org/?a=1&b=2".to_string(),
                alignment: Alignment::Center,
            },
        ];
        let html = render_document(&blocks, &DocumentStyle::default());

        assert!(html.contains("<html lang=\"he\" dir=\"rtl\">"));
        assert!(html.contains("<title>דוח &lt;סיכום&gt;</title>"));
        assert!(html.contains("font-family: 'Arial'"));
        assert!(html.contains("h1.title { font-size: 24pt; }"));
        assert!(html.contains("<h2 style=\"text-align: right\">הקדמה</h2>"));
        assert!(html.contains("שורה 1<br/>\nשורה 2"));
        assert!(html.contains("<strong>ציון סופי: 8.17</strong>"));
        assert!(html.contains("<a href=\"https://example.org/?a=1&amp;b=2\">"));
        assert!(html.contains("class=\"page-break\""));

        let heading = html.find("הקדמה</h2>").unwrap();
        let strong = html.find("<strong>").unwrap();
        assert!(heading < strong);
    }

    #[test]
    fn inlines_embedded_images() {
        let blocks = vec![DocumentBlock::Image {
            source: ImageSource::Embedded {
                name: "part_chart.svg".to_string(),
                media_type: "image/svg+xml",
                data: b"<svg/>".to_vec(),
            },
            width: 6.0,
        }];
        let html = render_document(&blocks, &DocumentStyle::default());
        assert!(html.contains("src=\"data:image/svg+xml;base64,PHN2Zy8+\""));
        assert!(html.contains("width: 6in"));
    }

    #[test]
    fn unreadable_image_file_is_skipped() {
        let blocks = vec![DocumentBlock::Image {
            source: ImageSource::File(PathBuf::from("/definitely/not/here.png")),
            width: 2.0,
        }];
        let html = render_document(&blocks, &DocumentStyle::default());
        assert!(!html.contains("<img"));
        assert!(html.contains("<title>Report</title>"));
    }

    #[test]
    fn left_to_right_style() {
        let style = DocumentStyle {
            language: "en".to_string(),
            right_to_left: false,
            ..DocumentStyle::default()
        };
        let html = render_document(&[], &style);
        assert!(html.contains("<html lang=\"en\" dir=\"ltr\">"));
    }

    #[test]
    fn media_types_follow_extension() {
        assert_eq!(media_type_for(Path::new("logo.PNG")), "image/png");
        assert_eq!(media_type_for(Path::new("logo.jpeg")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("logo.svg")), "image/svg+xml");
    }
}
