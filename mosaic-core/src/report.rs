//! PDF report — one US-Letter page with the trait scores and a quote.
//!
//! Text is drawn at fixed positions with the standard Helvetica faces and is
//! never wrapped; a long quote simply runs off the right edge.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use thiserror::Error;

use crate::traits::TraitScoreMap;

pub const REPORT_FILE_NAME: &str = "personacraft_pro_report.pdf";
pub const REPORT_MIME: &str = "application/pdf";
pub const REPORT_TITLE: &str = "Mind Mosaic chatbot Report";
pub const QUOTE_LABEL: &str = "Personalized Quote:";

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const LEFT_MARGIN: i64 = 100;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("PDF write failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    HelveticaBold,
    Helvetica,
}

impl Font {
    fn resource_name(&self) -> &'static str {
        match self {
            Font::HelveticaBold => "F1",
            Font::Helvetica => "F2",
        }
    }
}

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub font: Font,
    pub size: i64,
    pub x: i64,
    pub y: i64,
    pub text: String,
}

impl TextLine {
    fn body(y: i64, text: impl Into<String>) -> Self {
        Self {
            font: Font::Helvetica,
            size: 12,
            x: LEFT_MARGIN,
            y,
            text: text.into(),
        }
    }
}

/// Fixed layout: title, one line per trait, then the quote label and quote.
pub fn layout(traits: &TraitScoreMap, quote: &str) -> Vec<TextLine> {
    let mut lines = vec![TextLine {
        font: Font::HelveticaBold,
        size: 16,
        x: LEFT_MARGIN,
        y: 750,
        text: REPORT_TITLE.to_string(),
    }];

    let mut y = 700;
    for s in traits.iter() {
        lines.push(TextLine::body(y, format!("{}: {:.2}", s.label.display_label(), s.score)));
        y -= 20;
    }

    lines.push(TextLine::body(y - 40, QUOTE_LABEL));
    lines.push(TextLine::body(y - 60, quote));
    lines
}

/// Render the report to PDF bytes.
pub fn render_report(traits: &TraitScoreMap, quote: &str) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            Font::HelveticaBold.resource_name() => bold_id,
            Font::Helvetica.resource_name() => regular_id,
        },
    });

    let mut operations = Vec::new();
    for line in layout(traits, quote) {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![line.font.resource_name().into(), line.size.into()],
        ));
        operations.push(Operation::new("Td", vec![line.x.into(), line.y.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(win_ansi_bytes(&line.text))],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    tracing::debug!(bytes = buffer.len(), "Rendered PDF report");
    Ok(buffer)
}

/// Encode text for the base-14 fonts (WinAnsiEncoding). Whitespace controls
/// become spaces; characters the encoding lacks (emoji) are dropped.
fn win_ansi_bytes(text: &str) -> Vec<u8> {
    text.chars().filter_map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        '\n' | '\r' | '\t' => b' ',
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        // C0/C1 controls have no glyph; 0x80-0x9F are the slots remapped above.
        c if c.is_control() => return None,
        c => return u8::try_from(u32::from(c)).ok(),
    };
    Some(byte)
}
