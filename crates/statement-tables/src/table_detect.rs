use std::collections::VecDeque;

use crate::model::{DetectedTable, PageText};
use crate::table_parse::{is_value_token, modal_width, split_line_into_cells, split_statement_line};

pub(crate) const LOW_CONFIDENCE_THRESHOLD: f32 = 0.60;

/// Non-table lines kept as a caption for the table that follows them.
const CAPTION_LINES: usize = 2;

fn table_confidence(rows: &[Vec<String>]) -> f32 {
    if rows.len() < 2 {
        return 0.0;
    }

    let modal = modal_width(rows);
    if modal == 0 {
        return 0.0;
    }

    let consistent =
        rows.iter().filter(|row| row.len() == modal).count() as f32 / rows.len() as f32;
    let max_width = rows.iter().map(Vec::len).max().unwrap_or(modal);
    let min_width = rows.iter().map(Vec::len).min().unwrap_or(modal);
    let uniformity = if max_width == 0 {
        0.0
    } else {
        1.0 - ((max_width - min_width) as f32 / max_width as f32)
    };

    (consistent * 0.75 + uniformity * 0.25).clamp(0.0, 1.0)
}

fn looks_like_sentence(line: &str) -> bool {
    ['.', '!', '?']
        .iter()
        .any(|punctuation| line.trim_end().ends_with(*punctuation))
}

fn split_candidate_row(line: &str, min_cols: usize) -> Vec<String> {
    let cells = split_line_into_cells(line);
    if cells.len() >= min_cols || looks_like_sentence(line) {
        return cells;
    }

    let statement_cells = split_statement_line(line);
    let has_amount = statement_cells
        .iter()
        .skip(1)
        .any(|cell| is_value_token(cell));
    if statement_cells.len() >= min_cols && has_amount {
        statement_cells
    } else {
        cells
    }
}

pub(crate) fn detect_tables_in_page(page: &PageText, min_cols: usize) -> Vec<DetectedTable> {
    let mut tables = Vec::new();
    let mut current_rows: Vec<Vec<String>> = Vec::new();
    let mut recent_lines: VecDeque<String> = VecDeque::with_capacity(CAPTION_LINES);
    let mut caption: Option<String> = None;

    // A caption belongs to one table only: lines before an emitted table
    // are forgotten once it is flushed.
    let flush_current = |rows: &mut Vec<Vec<String>>,
                         caption: &mut Option<String>,
                         recent_lines: &mut VecDeque<String>,
                         tables: &mut Vec<DetectedTable>| {
        if rows.len() >= 2 {
            let confidence = table_confidence(rows);
            tables.push(DetectedTable {
                page: page.page_number,
                caption: caption.take(),
                rows: std::mem::take(rows),
                confidence,
            });
            recent_lines.clear();
        } else {
            rows.clear();
            *caption = None;
        }
    };

    for line in page.text.lines() {
        let cells = split_candidate_row(line, min_cols);

        if cells.len() >= min_cols {
            if current_rows.is_empty() {
                caption = (!recent_lines.is_empty())
                    .then(|| recent_lines.iter().cloned().collect::<Vec<_>>().join(" "));
            }
            current_rows.push(cells);
            continue;
        }

        flush_current(&mut current_rows, &mut caption, &mut recent_lines, &mut tables);
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            if recent_lines.len() == CAPTION_LINES {
                recent_lines.pop_front();
            }
            recent_lines.push_back(trimmed.to_string());
        }
    }

    flush_current(&mut current_rows, &mut caption, &mut recent_lines, &mut tables);
    tables
}

#[cfg(test)]
mod tests {
    use super::{LOW_CONFIDENCE_THRESHOLD, detect_tables_in_page};
    use crate::model::PageText;

    fn page(text: &str) -> PageText {
        PageText {
            page_number: 1,
            text: text.to_string(),
        }
    }

    #[test]
    fn detects_statement_table_with_caption() {
        let tables = detect_tables_in_page(
            &page(
                "Acme Corp\nConsolidated Statement of Cash Flows\nItem  2023  2022\nNet income  500  450\nNet cash used in investing activities  (120)  (80)\n",
            ),
            2,
        );

        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].caption.as_deref(),
            Some("Acme Corp Consolidated Statement of Cash Flows")
        );
        assert_eq!(tables[0].rows.len(), 3);
        assert!(tables[0].confidence >= LOW_CONFIDENCE_THRESHOLD);
    }

    #[test]
    fn single_spaced_statement_lines_are_split_on_trailing_amounts() {
        let tables = detect_tables_in_page(
            &page("Revenue 1,000 900\nCost of sales (400) (350)\n"),
            2,
        );
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[1], vec!["Cost of sales", "(400)", "(350)"]);
    }

    #[test]
    fn prose_breaks_tables_apart() {
        let tables = detect_tables_in_page(
            &page("A  1  2\nB  3  4\nThis paragraph explains the figures above.\nC  5  6\nD  7  8\n"),
            2,
        );
        assert_eq!(tables.len(), 2);
        assert_eq!(
            tables[1].caption.as_deref(),
            Some("This paragraph explains the figures above.")
        );
    }

    #[test]
    fn caption_does_not_carry_over_to_the_next_table() {
        let tables = detect_tables_in_page(
            &page(
                "Income Statement\nRevenue  100  90\nNet income  10  9\n\nDepreciation  2  2\nWorking capital  (1)  3\n",
            ),
            2,
        );

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].caption.as_deref(), Some("Income Statement"));
        assert_eq!(tables[1].caption, None);
    }

    #[test]
    fn ragged_rows_lower_confidence() {
        let tables = detect_tables_in_page(&page("A  B  C\n1  2\n3  4  5  6\n7  8\n"), 2);
        assert_eq!(tables.len(), 1);
        assert!(tables[0].confidence < LOW_CONFIDENCE_THRESHOLD);
    }
}
