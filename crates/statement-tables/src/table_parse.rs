use std::collections::HashMap;

use crate::normalize::parse_amount;

const CURRENCY_SYMBOLS: [&str; 5] = ["$", "€", "£", "¥", "₹"];
const EMPTY_PLACEHOLDERS: [&str; 5] = ["-", "–", "—", "n/a", "N/A"];

pub(crate) fn split_line_into_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut whitespace_run = 0_usize;

    for ch in trimmed.chars() {
        if ch == '\t' {
            if !current.trim().is_empty() {
                cells.push(current.trim().to_string());
                current.clear();
            }
            whitespace_run = 0;
            continue;
        }

        if ch.is_whitespace() {
            whitespace_run += 1;
            if whitespace_run >= 2 {
                if !current.trim().is_empty() {
                    cells.push(current.trim().to_string());
                    current.clear();
                }
                continue;
            }
            current.push(' ');
            continue;
        }

        whitespace_run = 0;
        current.push(ch);
    }

    if !current.trim().is_empty() {
        cells.push(current.trim().to_string());
    }

    cells
}

pub(crate) fn is_value_token(token: &str) -> bool {
    EMPTY_PLACEHOLDERS.contains(&token) || parse_amount(token).is_some()
}

/// Splits a single-spaced statement line into a label followed by its
/// trailing amount cells, e.g. `Net income 1,200 (300)`.
///
/// Lone currency symbols between amounts are dropped. A line without
/// trailing amounts comes back as one cell.
pub(crate) fn split_statement_line(line: &str) -> Vec<String> {
    let tokens = line.split_whitespace().collect::<Vec<_>>();
    let mut label_end = tokens.len();
    let mut values = Vec::new();

    while label_end > 0 {
        let token = tokens[label_end - 1];
        if CURRENCY_SYMBOLS.contains(&token) && !values.is_empty() {
            label_end -= 1;
            continue;
        }
        if !is_value_token(token) {
            break;
        }
        values.push(token.to_string());
        label_end -= 1;
    }

    let label = tokens[..label_end].join(" ");
    if values.is_empty() || label.is_empty() {
        let whole = tokens.join(" ");
        return if whole.is_empty() { Vec::new() } else { vec![whole] };
    }

    values.reverse();
    let mut cells = Vec::with_capacity(values.len() + 1);
    cells.push(label);
    cells.extend(values);
    cells
}

pub(crate) fn pad_rows(rows: &[Vec<String>], width: usize) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let mut out = row.clone();
            if out.len() < width {
                out.resize(width, String::new());
            }
            out
        })
        .collect()
}

pub(crate) fn modal_width(rows: &[Vec<String>]) -> usize {
    let mut freq = HashMap::new();
    for width in rows.iter().map(Vec::len) {
        *freq.entry(width).or_insert(0_usize) += 1;
    }

    freq.into_iter()
        .max_by_key(|(width, count)| (*count, *width))
        .map_or(0, |(width, _)| width)
}
