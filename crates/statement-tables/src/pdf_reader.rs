use std::collections::BTreeMap;
use std::fmt::Display;
use std::panic::{self, UnwindSafe};

use encoding_rs::UTF_16BE;
use lopdf::Document;
use lopdf::Object;
use lopdf::content::Content;
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::model::PageText;
use crate::options::PageSelection;
use crate::table_parse::{split_line_into_cells, split_statement_line};
use crate::warning::{ExtractWarning, WarningCode};

/// Page texts of a document plus whatever whole-document text could be read.
#[derive(Debug, Clone, Default)]
pub(crate) struct DocumentText {
    pub pages: Vec<PageText>,
    pub full_text: Option<String>,
    pub warnings: Vec<ExtractWarning>,
}

fn split_text_into_pages(raw_text: &str) -> Vec<String> {
    let mut pages = raw_text
        .split('\u{000C}')
        .map(str::to_string)
        .collect::<Vec<_>>();
    if pages.last().is_some_and(String::is_empty) {
        pages.pop();
    }
    pages
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();

    replacement * 8 > total || control * 5 > total
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    let utf16_hinted = encoding.is_some_and(|name| {
        let lower = name.to_ascii_lowercase();
        lower.contains("utf16")
            || lower.contains("ucs2")
            || lower.contains("identity-h")
            || lower.contains("unicode")
    });
    let has_bom = bytes.starts_with(&[0xFE, 0xFF]);
    if has_bom || utf16_hinted {
        let body = if has_bom { &bytes[2..] } else { bytes };
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(body);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    String::from_utf8_lossy(bytes).to_string()
}

fn extraction_quality_score(text: &str) -> i64 {
    if text.trim().is_empty() {
        return i64::MIN / 4;
    }

    let mut non_empty_lines = 0_i64;
    let mut multi_cell_lines = 0_i64;
    let mut amount_lines = 0_i64;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        non_empty_lines += 1;

        if split_line_into_cells(line).len() >= 2 || split_statement_line(line).len() >= 2 {
            multi_cell_lines += 1;
        }

        let has_digit = line.chars().any(|ch| ch.is_ascii_digit());
        if has_digit && (line.contains(',') || line.contains('(')) {
            amount_lines += 1;
        }
    }

    let broken_penalty = if looks_decoding_broken(text) { 800 } else { 0 };
    multi_cell_lines * 50 + amount_lines * 15 + non_empty_lines - broken_penalty
}

/// Text-showing operators of one content stream, gathered into lines.
#[derive(Default)]
struct LineCollector<'a> {
    lines: Vec<String>,
    current: String,
    encoding: Option<&'a str>,
}

impl LineCollector<'_> {
    fn push_operands(&mut self, operands: &[Object]) {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => {
                    let decoded = decode_pdf_bytes(self.encoding, bytes);
                    self.current.push_str(&decoded);
                }
                Object::Array(items) => {
                    self.push_operands(items);
                    self.current.push(' ');
                }
                // Large negative kerning inside TJ separates columns.
                Object::Integer(offset) if *offset < -100 => self.current.push(' '),
                _ => {}
            }
        }
    }

    fn break_line(&mut self) {
        if !self.current.trim().is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
        self.current.clear();
    }

    fn finish(mut self) -> Option<String> {
        self.break_line();
        (!self.lines.is_empty()).then(|| self.lines.join("\n"))
    }
}

fn extract_text_from_page_content(document: &Document, page_id: lopdf::ObjectId) -> Option<String> {
    let content = Content::decode(&document.get_page_content(page_id).ok()?).ok()?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut collector = LineCollector::default();
    for operation in &content.operations {
        match operation.operator.as_str() {
            "Tf" => {
                collector.encoding = operation
                    .operands
                    .first()
                    .and_then(|operand| operand.as_name().ok())
                    .and_then(|font| encodings.get(font).copied());
            }
            "Tj" | "TJ" | "'" | "\"" => collector.push_operands(&operation.operands),
            "T*" | "Td" | "TD" | "ET" => collector.break_line(),
            _ => {}
        }
    }
    collector.finish()
}

/// Runs the whole-document extractor, which panics on some fonts and
/// encodings it does not support. The per-page readers still cover every
/// page when it fails.
fn document_text_layer<F, E>(
    input_pdf: &[u8],
    extract: F,
    warnings: &mut Vec<ExtractWarning>,
) -> Option<String>
where
    F: FnOnce(&[u8]) -> Result<String, E> + UnwindSafe,
    E: Display,
{
    match panic::catch_unwind(|| extract(input_pdf)) {
        Ok(Ok(text)) => Some(text),
        Ok(Err(error)) => {
            debug!(%error, "pdf-extract could not read document text");
            None
        }
        Err(_) => {
            warn!("pdf-extract panicked; falling back to per-page text");
            warnings.push(ExtractWarning::new(
                WarningCode::TextLayerUnavailable,
                "document text extractor failed; pages were read individually",
            ));
            None
        }
    }
}

/// Reads every selected page of an in-memory PDF.
///
/// Each page takes the best-scoring text among the pdf-extract split, a
/// content-stream walk and lopdf's own extractor. A page none of them can
/// read keeps an empty text and gets a `PageUnreadable` warning.
pub(crate) fn read_pdf_text(
    input_pdf: &[u8],
    page_selection: Option<&PageSelection>,
) -> Result<DocumentText, ExtractError> {
    let document = Document::load_mem(input_pdf)?;
    let pages_map = document.get_pages();

    let mut warnings = Vec::new();
    let full_text =
        document_text_layer(input_pdf, pdf_extract::extract_text_from_mem, &mut warnings);
    let split_pages = full_text
        .as_deref()
        .map(split_text_into_pages)
        .filter(|pages| pages.len() == pages_map.len());

    let mut text = DocumentText {
        full_text: full_text.filter(|text| !text.trim().is_empty()),
        warnings,
        ..DocumentText::default()
    };
    for (index, (page_no, page_id)) in pages_map.iter().enumerate() {
        if page_selection.is_some_and(|selection| !selection.contains(*page_no)) {
            continue;
        }

        let mut candidates = Vec::new();
        if let Some(page_text) = split_pages
            .as_ref()
            .and_then(|pages| pages.get(index).cloned())
            .filter(|page_text| !page_text.trim().is_empty())
        {
            candidates.push(page_text);
        }
        if let Some(page_text) = extract_text_from_page_content(&document, *page_id) {
            candidates.push(page_text);
        }
        if let Some(page_text) = document
            .extract_text(&[*page_no])
            .ok()
            .filter(|page_text| !page_text.trim().is_empty())
        {
            candidates.push(page_text);
        }

        let best = candidates
            .into_iter()
            .max_by_key(|candidate| extraction_quality_score(candidate))
            .unwrap_or_default();
        if best.trim().is_empty() {
            warn!(page = *page_no, "page has no extractable text");
            text.warnings.push(
                ExtractWarning::new(
                    WarningCode::PageUnreadable,
                    "page has no extractable text; it contributes no tables",
                )
                .with_page(*page_no),
            );
        }

        text.pages.push(PageText {
            page_number: *page_no,
            text: best,
        });
    }

    if text.pages.is_empty() {
        return Err(ExtractError::NoPagesSelected);
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use crate::pdf_reader::{
        decode_pdf_bytes, document_text_layer, extraction_quality_score, split_text_into_pages,
    };
    use crate::warning::WarningCode;

    #[test]
    fn splits_form_feed_delimited_pages() {
        let pages = split_text_into_pages("p1\u{000C}p2\u{000C}");
        assert_eq!(pages, vec!["p1", "p2"]);
    }

    #[test]
    fn decodes_utf16_with_byte_order_mark() {
        let bytes = [0xFE, 0xFF, 0x00, 0x24, 0x00, 0x35];
        assert_eq!(decode_pdf_bytes(Some("Identity-H"), &bytes), "$5");
    }

    #[test]
    fn statement_text_outscores_prose() {
        let statement = "Revenue  1,200  1,100\nCost of sales  (400)  (350)";
        let prose = "Management discussion\nof the results";
        assert!(extraction_quality_score(statement) > extraction_quality_score(prose));
    }

    #[test]
    fn panicking_text_extractor_degrades_to_a_warning() {
        let mut warnings = Vec::new();
        let text = document_text_layer(
            b"%PDF-1.5",
            |_: &[u8]| -> Result<String, String> { panic!("unsupported font encoding") },
            &mut warnings,
        );

        assert_eq!(text, None);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, WarningCode::TextLayerUnavailable);
    }

    #[test]
    fn failing_text_extractor_is_silent() {
        let mut warnings = Vec::new();
        let text = document_text_layer(
            b"%PDF-1.5",
            |_: &[u8]| Err::<String, _>("no text layer"),
            &mut warnings,
        );

        assert_eq!(text, None);
        assert!(warnings.is_empty());
    }
}
