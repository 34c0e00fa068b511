use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::model::{LineItem, RawTable};
use crate::table_parse::pad_rows;

/// Label used for data rows whose first cell is blank.
pub const UNLABELLED: &str = "(unlabelled)";

static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("hardcoded label key regex is valid"));

const CURRENCY_CHARS: [char; 6] = ['$', '€', '£', '¥', '₹', '\u{a0}'];

const DEFAULT_ALIASES: &[(&str, &[&str])] = &[
    (
        "Revenue",
        &[
            "revenue",
            "revenues",
            "total revenue",
            "total revenues",
            "sales",
            "net sales",
            "sales revenue",
            "turnover",
        ],
    ),
    (
        "Cost of Goods Sold",
        &["cost of goods sold", "cost of sales", "cost of revenue", "cogs"],
    ),
    ("Gross Profit", &["gross profit", "gross margin"]),
    (
        "Operating Expenses",
        &[
            "operating expenses",
            "total operating expenses",
            "opex",
            "operating costs",
        ],
    ),
    (
        "Operating Income",
        &["operating income", "operating profit", "income from operations", "ebit"],
    ),
    ("Interest Expense", &["interest expense", "finance costs"]),
    (
        "Income Before Tax",
        &[
            "income before tax",
            "income before taxes",
            "income before income taxes",
            "profit before tax",
            "earnings before tax",
        ],
    ),
    (
        "Income Tax Expense",
        &["income tax", "income tax expense", "income taxes", "tax expense", "taxation"],
    ),
    (
        "Net Income",
        &[
            "net income",
            "net profit",
            "net earnings",
            "profit for the year",
            "profit for the period",
            "net income loss",
            "net profit loss",
        ],
    ),
    ("Earnings Per Share", &["earnings per share", "eps", "basic eps"]),
    (
        "Depreciation and Amortization",
        &[
            "depreciation and amortization",
            "depreciation and amortisation",
            "d and a",
        ],
    ),
    (
        "Net Cash from Operating Activities",
        &[
            "net cash from operating activities",
            "net cash provided by operating activities",
            "net cash generated from operating activities",
            "cash flow from operations",
            "cash flows from operating activities",
        ],
    ),
    (
        "Net Cash from Investing Activities",
        &[
            "net cash from investing activities",
            "net cash used in investing activities",
            "net cash provided by investing activities",
        ],
    ),
    (
        "Net Cash from Financing Activities",
        &[
            "net cash from financing activities",
            "net cash used in financing activities",
            "net cash provided by financing activities",
        ],
    ),
    (
        "Capital Expenditures",
        &[
            "capital expenditures",
            "capital expenditure",
            "capex",
            "purchase of property and equipment",
            "purchases of property plant and equipment",
        ],
    ),
    (
        "Net Change in Cash",
        &[
            "net change in cash",
            "net increase in cash",
            "net decrease in cash",
            "net increase decrease in cash",
            "net increase in cash and cash equivalents",
        ],
    ),
];

/// Case- and punctuation-insensitive key for labels and keywords.
///
/// `&` reads as `and`, every other run of non-alphanumerics collapses to a
/// single space.
#[must_use]
pub fn label_key(text: &str) -> String {
    let lowered = text.to_lowercase().replace('&', " and ");
    NON_ALNUM_RE.replace_all(&lowered, " ").trim().to_string()
}

/// Parses statement cell text as an amount.
///
/// Currency symbols, thousands separators and whitespace are ignored and
/// `(1,200)` reads as `-1200`. Anything else yields `None`.
#[must_use]
pub fn parse_amount(cell: &str) -> Option<Decimal> {
    let stripped = cell
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != ',' && !CURRENCY_CHARS.contains(ch))
        .collect::<String>();

    let (negative, body) = if let Some(inner) = stripped
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        (true, inner)
    } else if let Some(rest) = stripped
        .strip_prefix('-')
        .or_else(|| stripped.strip_prefix('\u{2212}'))
    {
        (true, rest)
    } else {
        (false, stripped.as_str())
    };

    let digits = body.chars().filter(char::is_ascii_digit).count();
    let dots = body.chars().filter(|ch| *ch == '.').count();
    if digits == 0 || dots > 1 || digits + dots != body.chars().count() {
        return None;
    }

    let value = Decimal::from_str(body).ok()?;
    Some(if negative { -value } else { value })
}

/// Lookup from label variants to canonical line-item names.
#[derive(Debug, Clone)]
pub struct CanonicalNames {
    aliases: HashMap<String, String>,
}

impl CanonicalNames {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            aliases: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: &str, canonical: &str) -> Self {
        self.aliases
            .insert(label_key(alias), canonical.trim().to_string());
        self
    }

    /// Unmapped labels come back trimmed but otherwise verbatim.
    #[must_use]
    pub fn canonical_name(&self, raw_label: &str) -> String {
        let trimmed = raw_label.trim();
        if trimmed.is_empty() {
            return UNLABELLED.to_string();
        }
        self.aliases
            .get(&label_key(trimmed))
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }
}

impl Default for CanonicalNames {
    fn default() -> Self {
        DEFAULT_ALIASES
            .iter()
            .fold(Self::empty(), |names, (canonical, aliases)| {
                aliases
                    .iter()
                    .fold(names.with_alias(canonical, canonical), |names, alias| {
                        names.with_alias(alias, canonical)
                    })
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTable {
    pub items: Vec<LineItem>,
    /// Non-empty cells that did not parse as amounts and became null values.
    pub non_numeric_cells: usize,
}

fn period_labels(table: &RawTable, width: usize) -> Vec<String> {
    let header = table.header().unwrap_or_default();
    (1..width)
        .map(|index| {
            header
                .get(index)
                .map(|label| label.trim())
                .filter(|label| !label.is_empty())
                .map_or_else(|| format!("col_{}", index + 1), str::to_string)
        })
        .collect()
}

/// Turns every data row into one line item per period column.
///
/// Cells that are missing or not numeric still produce an item, with a
/// null value, so gaps in extraction stay visible.
#[must_use]
pub fn normalize_table(table: &RawTable, names: &CanonicalNames) -> NormalizedTable {
    let data_rows = table.data_rows();
    let width = data_rows
        .iter()
        .map(Vec::len)
        .chain(table.header().map(<[String]>::len))
        .max()
        .unwrap_or(0);
    let periods = period_labels(table, width);

    let mut normalized = NormalizedTable::default();
    for row in pad_rows(data_rows, width) {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let raw_label = row[0].trim().to_string();
        let canonical_name = names.canonical_name(&raw_label);
        for (period, cell) in periods.iter().zip(row.iter().skip(1)) {
            let value = parse_amount(cell);
            if value.is_none() && !cell.trim().is_empty() {
                normalized.non_numeric_cells += 1;
            }
            normalized.items.push(LineItem {
                canonical_name: canonical_name.clone(),
                raw_label: raw_label.clone(),
                period: period.clone(),
                value,
                source_id: table.source_id.clone(),
            });
        }
    }

    normalized
}
