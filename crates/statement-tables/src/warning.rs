#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    LowConfidence,
    HeaderInferenceLowConfidence,
    PageUnreadable,
    /// The whole-document text extractor failed; only per-page readers ran.
    TextLayerUnavailable,
    DocumentTextFallback,
    NoTablesDetected,
    Unclassified,
    NonNumericCell,
}

impl WarningCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LowConfidence => "low_confidence",
            Self::HeaderInferenceLowConfidence => "header_inference_low_confidence",
            Self::PageUnreadable => "page_unreadable",
            Self::TextLayerUnavailable => "text_layer_unavailable",
            Self::DocumentTextFallback => "document_text_fallback",
            Self::NoTablesDetected => "no_tables_detected",
            Self::Unclassified => "unclassified",
            Self::NonNumericCell => "non_numeric_cell",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractWarning {
    pub code: WarningCode,
    pub message: String,
    pub page: Option<u32>,
    pub table_id: Option<usize>,
    pub confidence: Option<f32>,
}

impl ExtractWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
            table_id: None,
            confidence: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_table_id(mut self, table_id: usize) -> Self {
        self.table_id = Some(table_id);
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}
