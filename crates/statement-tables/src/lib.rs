mod assemble;
mod classify;
mod csv_out;
mod error;
mod header;
mod model;
mod normalize;
mod options;
mod pdf_reader;
mod table_detect;
mod table_parse;
mod warning;
mod xlsx_out;

use std::collections::VecDeque;
use std::path::Path;

use tracing::debug;

use crate::header::header_row_count;
use crate::model::{DetectedTable, PageText};
use crate::pdf_reader::read_pdf_text;
use crate::table_detect::{LOW_CONFIDENCE_THRESHOLD, detect_tables_in_page};

pub use assemble::{Workbook, WorkbookAssembler};
pub use classify::{ClassifierRules, classify, keyword_scores};
pub use error::ExtractError;
pub use model::{LineItem, RawTable, Sheet, SheetRow, StatementCategory, TableOrigin};
pub use normalize::{
    CanonicalNames, NormalizedTable, UNLABELLED, label_key, normalize_table, parse_amount,
};
pub use options::{ExtractOptions, HeaderMode, PageSelection, QualityMode};
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};
pub use xlsx_out::{EMPTY_MARKER, NO_DATA_SHEET};

pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Tables of one document, detected page by page as the iterator advances.
///
/// When no page yields a table, the whole-document text is tried once as a
/// single page before the iterator ends.
#[derive(Debug)]
pub struct LocalTables {
    source_id: String,
    options: ExtractOptions,
    pages: VecDeque<PageText>,
    full_text: Option<String>,
    pending: VecDeque<RawTable>,
    warnings: Vec<ExtractWarning>,
    next_table_id: usize,
}

impl LocalTables {
    /// Page-level warnings plus those raised so far for skipped tables.
    #[must_use]
    pub fn warnings(&self) -> &[ExtractWarning] {
        &self.warnings
    }

    fn prepare(&mut self, table: DetectedTable) -> Option<RawTable> {
        let table_id = self.next_table_id;
        self.next_table_id += 1;

        let mut warnings = Vec::new();
        if table.confidence < LOW_CONFIDENCE_THRESHOLD {
            let warning = ExtractWarning::new(
                ExtractWarningCode::LowConfidence,
                match self.options.quality_mode {
                    QualityMode::BestEffort => "table confidence is low; kept in best-effort mode",
                    QualityMode::SkipAmbiguous => "skipping low-confidence table",
                },
            )
            .with_page(table.page)
            .with_table_id(table_id)
            .with_confidence(table.confidence);

            if self.options.quality_mode == QualityMode::SkipAmbiguous {
                self.warnings.push(warning);
                return None;
            }
            warnings.push(warning);
        }

        let header_rows =
            header_row_count(&table, self.options.header_mode, &mut warnings, table_id);
        debug!(
            source = %self.source_id,
            page = table.page,
            table_id,
            rows = table.rows.len(),
            header_rows,
            confidence = table.confidence,
            "detected table"
        );

        Some(RawTable {
            source_id: self.source_id.clone(),
            page: table.page,
            caption: table.caption,
            rows: table.rows,
            header_rows,
            origin: TableOrigin::Local,
            confidence: table.confidence,
            warnings,
        })
    }

    fn detect_next_page(&mut self) -> bool {
        let page = match self.pages.pop_front() {
            Some(page) => page,
            None => match self.full_text.take() {
                Some(text) if self.next_table_id == 1 => {
                    self.warnings.push(ExtractWarning::new(
                        ExtractWarningCode::DocumentTextFallback,
                        "no page-level tables detected; retried with document-level text extraction",
                    ));
                    PageText {
                        page_number: 1,
                        text,
                    }
                }
                _ => return false,
            },
        };

        for table in detect_tables_in_page(&page, self.options.min_cols) {
            if let Some(prepared) = self.prepare(table) {
                self.pending.push_back(prepared);
            }
        }
        true
    }
}

impl Iterator for LocalTables {
    type Item = RawTable;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(table) = self.pending.pop_front() {
                return Some(table);
            }
            if !self.detect_next_page() {
                return None;
            }
        }
    }
}

/// Reads the text layer of an in-memory PDF and returns its tables lazily.
///
/// Loading the document is the only fallible step; pages that cannot be
/// read simply contribute nothing.
pub fn extract_tables(
    source_id: &str,
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<LocalTables, ExtractError> {
    options.validate()?;
    let text = read_pdf_text(input_pdf, options.pages.as_ref())?;

    Ok(LocalTables {
        source_id: source_id.to_string(),
        options: options.clone(),
        pages: text.pages.into(),
        full_text: text.full_text,
        pending: VecDeque::new(),
        warnings: text.warnings,
        next_table_id: 1,
    })
}

pub fn extract_tables_from_path(
    input_pdf: &Path,
    options: &ExtractOptions,
) -> Result<LocalTables, ExtractError> {
    let bytes = std::fs::read(input_pdf)?;
    let source_id = input_pdf
        .file_name()
        .map_or_else(|| input_pdf.display().to_string(), |name| name.to_string_lossy().into_owned());
    extract_tables(&source_id, &bytes, options)
}

pub fn write_workbook_xlsx(path: &Path, workbook: &Workbook) -> Result<(), ExtractError> {
    xlsx_out::write_xlsx(path, workbook)
}

pub fn workbook_to_xlsx_bytes(workbook: &Workbook) -> Result<Vec<u8>, ExtractError> {
    xlsx_out::write_xlsx_to_buffer(workbook)
}

pub fn write_workbook_csv(path: &Path, workbook: &Workbook) -> Result<(), ExtractError> {
    csv_out::write_csv(path, workbook)
}

pub fn workbook_to_csv_string(workbook: &Workbook) -> Result<String, ExtractError> {
    csv_out::write_csv_to_string(workbook)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::LocalTables;
    use crate::model::PageText;
    use crate::options::{ExtractOptions, QualityMode};
    use crate::warning::WarningCode;

    fn tables_for(pages: &[&str], full_text: Option<&str>, options: ExtractOptions) -> LocalTables {
        LocalTables {
            source_id: "doc".to_string(),
            options,
            pages: pages
                .iter()
                .zip(1..)
                .map(|(text, page_number)| PageText {
                    page_number,
                    text: (*text).to_string(),
                })
                .collect::<VecDeque<_>>(),
            full_text: full_text.map(str::to_string),
            pending: VecDeque::new(),
            warnings: Vec::new(),
            next_table_id: 1,
        }
    }

    #[test]
    fn yields_tables_across_pages_with_header_rows() {
        let tables = tables_for(
            &[
                "Income Statement\nItem  2023  2022\nRevenue  100  90\n",
                "narrative only",
                "Cash Flow Statement\nNet income  10  9\nDepreciation  2  2\n",
            ],
            None,
            ExtractOptions::default(),
        )
        .collect::<Vec<_>>();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].page, 1);
        assert_eq!(tables[0].header_rows, 1);
        assert_eq!(tables[0].caption.as_deref(), Some("Income Statement"));
        assert_eq!(tables[1].page, 3);
        assert_eq!(tables[1].header_rows, 0);
    }

    #[test]
    fn falls_back_to_document_text_when_pages_have_no_tables() {
        let mut tables = tables_for(
            &["nothing here"],
            Some("Revenue  100  90\nNet income  10  9\n"),
            ExtractOptions::default(),
        );
        let found = tables.by_ref().collect::<Vec<_>>();

        assert_eq!(found.len(), 1);
        assert!(
            tables
                .warnings()
                .iter()
                .any(|warning| warning.code == WarningCode::DocumentTextFallback)
        );
    }

    #[test]
    fn skip_ambiguous_drops_low_confidence_tables() {
        let options = ExtractOptions {
            quality_mode: QualityMode::SkipAmbiguous,
            ..ExtractOptions::default()
        };
        let mut tables = tables_for(&["A  B  C\n1  2\n3  4  5  6\n7  8\n"], None, options);

        assert_eq!(tables.next(), None);
        assert_eq!(tables.warnings()[0].code, WarningCode::LowConfidence);
    }

    #[test]
    fn best_effort_keeps_low_confidence_tables_with_a_warning() {
        let tables = tables_for(&["A  B  C\n1  2\n3  4  5  6\n7  8\n"], None, ExtractOptions::default())
            .collect::<Vec<_>>();

        assert_eq!(tables.len(), 1);
        assert!(
            tables[0]
                .warnings
                .iter()
                .any(|warning| warning.code == WarningCode::LowConfidence)
        );
    }
}
