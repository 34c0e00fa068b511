use std::fmt::{self, Display, Formatter};

use rust_decimal::Decimal;

use crate::warning::ExtractWarning;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageText {
    pub page_number: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DetectedTable {
    pub page: u32,
    pub caption: Option<String>,
    pub rows: Vec<Vec<String>>,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOrigin {
    Local,
    Cloud,
}

/// A table region found in one page of a source document.
///
/// The first `header_rows` rows are headers; the last of them carries the
/// period labels for the value columns.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub source_id: String,
    pub page: u32,
    pub caption: Option<String>,
    pub rows: Vec<Vec<String>>,
    pub header_rows: usize,
    pub origin: TableOrigin,
    pub confidence: f32,
    pub warnings: Vec<ExtractWarning>,
}

impl RawTable {
    #[must_use]
    pub fn new(source_id: impl Into<String>, page: u32, rows: Vec<Vec<String>>) -> Self {
        Self {
            source_id: source_id.into(),
            page,
            caption: None,
            rows,
            header_rows: 0,
            origin: TableOrigin::Local,
            confidence: 1.0,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header_rows(mut self, header_rows: usize) -> Self {
        self.header_rows = header_rows;
        self
    }

    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: TableOrigin) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub fn header(&self) -> Option<&[String]> {
        let count = self.header_rows.min(self.rows.len());
        count
            .checked_sub(1)
            .and_then(|last| self.rows.get(last))
            .map(Vec::as_slice)
    }

    #[must_use]
    pub fn header_rows(&self) -> &[Vec<String>] {
        &self.rows[..self.header_rows.min(self.rows.len())]
    }

    #[must_use]
    pub fn data_rows(&self) -> &[Vec<String>] {
        &self.rows[self.header_rows.min(self.rows.len())..]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatementCategory {
    IncomeStatement,
    ProfitAndLoss,
    CashFlow,
    Unclassified,
}

impl StatementCategory {
    /// Categories that can become sheets, in output order. This is also the
    /// tie-break precedence used by the classifier.
    pub const SHEETS: [Self; 3] = [Self::IncomeStatement, Self::ProfitAndLoss, Self::CashFlow];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IncomeStatement => "income_statement",
            Self::ProfitAndLoss => "profit_and_loss",
            Self::CashFlow => "cash_flow",
            Self::Unclassified => "unclassified",
        }
    }

    #[must_use]
    pub const fn sheet_title(self) -> &'static str {
        match self {
            Self::IncomeStatement => "Income Statement",
            Self::ProfitAndLoss => "Profit and Loss",
            Self::CashFlow => "Cash Flow Statement",
            Self::Unclassified => "Unclassified",
        }
    }
}

impl Display for StatementCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub canonical_name: String,
    pub raw_label: String,
    pub period: String,
    pub value: Option<Decimal>,
    pub source_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub line_item: String,
    pub source_id: String,
    pub values: Vec<Option<Decimal>>,
}

/// Pivoted view of one category: periods as columns, line items as rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub category: StatementCategory,
    pub title: &'static str,
    pub periods: Vec<String>,
    pub rows: Vec<SheetRow>,
}
