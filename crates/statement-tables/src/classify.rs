use crate::model::{RawTable, StatementCategory};
use crate::normalize::label_key;

const INCOME_STATEMENT_KEYWORDS: &[&str] = &[
    "income statement",
    "statement of income",
    "statement of operations",
    "statement of earnings",
    "revenue",
    "revenues",
    "net income",
    "operating expenses",
    "cost of revenue",
    "earnings per share",
    "income before",
];

const PROFIT_AND_LOSS_KEYWORDS: &[&str] = &[
    "profit and loss",
    "p&l",
    "profit or loss",
    "gross profit",
    "net profit",
    "operating profit",
    "profit before tax",
    "profit for the year",
    "loss for the year",
    "turnover",
];

const CASH_FLOW_KEYWORDS: &[&str] = &[
    "cash flow",
    "cash flows",
    "operating activities",
    "investing activities",
    "financing activities",
    "cash and cash equivalents",
    "net change in cash",
    "net increase in cash",
    "net decrease in cash",
    "capital expenditures",
];

/// Keyword sets and thresholds driving [`classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierRules {
    keywords: Vec<(StatementCategory, Vec<String>)>,
    /// Data-row labels inspected after the header rows.
    pub label_rows: usize,
    /// Distinct keyword hits a category needs before it can win.
    pub min_matches: usize,
}

impl ClassifierRules {
    /// Replaces the keyword set of `category`.
    #[must_use]
    pub fn with_keywords(mut self, category: StatementCategory, keywords: &[&str]) -> Self {
        let keys = keywords.iter().map(|keyword| label_key(keyword)).collect();
        match self.keywords.iter_mut().find(|(known, _)| *known == category) {
            Some((_, existing)) => *existing = keys,
            None => self.keywords.push((category, keys)),
        }
        self
    }

    #[must_use]
    pub fn with_label_rows(mut self, label_rows: usize) -> Self {
        self.label_rows = label_rows;
        self
    }

    #[must_use]
    pub fn with_min_matches(mut self, min_matches: usize) -> Self {
        self.min_matches = min_matches.max(1);
        self
    }

    fn keywords_for(&self, category: StatementCategory) -> &[String] {
        self.keywords
            .iter()
            .find(|(known, _)| *known == category)
            .map(|(_, keywords)| keywords.as_slice())
            .unwrap_or_default()
    }
}

impl Default for ClassifierRules {
    fn default() -> Self {
        let rules = Self {
            keywords: Vec::new(),
            label_rows: 5,
            min_matches: 1,
        };
        rules
            .with_keywords(StatementCategory::IncomeStatement, INCOME_STATEMENT_KEYWORDS)
            .with_keywords(StatementCategory::ProfitAndLoss, PROFIT_AND_LOSS_KEYWORDS)
            .with_keywords(StatementCategory::CashFlow, CASH_FLOW_KEYWORDS)
    }
}

/// Caption, header cells and the first few row labels as one padded key.
fn classification_text(table: &RawTable, label_rows: usize) -> String {
    let header_cells = table.header_rows().iter().flatten().map(String::as_str);
    let labels = table
        .data_rows()
        .iter()
        .take(label_rows)
        .filter_map(|row| row.first())
        .map(String::as_str);

    let joined = table
        .caption
        .as_deref()
        .into_iter()
        .chain(header_cells)
        .chain(labels)
        .map(label_key)
        .filter(|key| !key.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");
    format!(" {joined} ")
}

/// Distinct keyword hits per sheet category, in precedence order.
#[must_use]
pub fn keyword_scores(table: &RawTable, rules: &ClassifierRules) -> Vec<(StatementCategory, usize)> {
    let text = classification_text(table, rules.label_rows);
    StatementCategory::SHEETS
        .iter()
        .map(|category| {
            let hits = rules
                .keywords_for(*category)
                .iter()
                .filter(|keyword| text.contains(&format!(" {keyword} ")))
                .count();
            (*category, hits)
        })
        .collect()
}

/// Picks the category with the most keyword hits.
///
/// Ties go to the earlier category in [`StatementCategory::SHEETS`]; fewer
/// than `min_matches` hits everywhere means `Unclassified`.
#[must_use]
pub fn classify(table: &RawTable, rules: &ClassifierRules) -> StatementCategory {
    let mut best = (StatementCategory::Unclassified, 0_usize);
    for (category, hits) in keyword_scores(table, rules) {
        if hits > best.1 {
            best = (category, hits);
        }
    }

    if best.1 >= rules.min_matches.max(1) {
        best.0
    } else {
        StatementCategory::Unclassified
    }
}
