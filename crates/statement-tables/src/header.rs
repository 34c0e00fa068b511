use crate::model::DetectedTable;
use crate::normalize::parse_amount;
use crate::options::HeaderMode;
use crate::warning::{ExtractWarning, WarningCode};

const HEADER_CONFIDENCE_THRESHOLD: f32 = 0.55;

/// Bare years such as `2023` label periods rather than amounts.
fn is_year(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.len() == 4
        && trimmed.chars().all(|ch| ch.is_ascii_digit())
        && trimmed
            .parse::<u16>()
            .is_ok_and(|year| (1900..=2100).contains(&year))
}

fn is_amount(value: &str) -> bool {
    !is_year(value) && parse_amount(value).is_some()
}

fn non_amount_ratio(cells: &[String]) -> f32 {
    if cells.is_empty() {
        return 0.0;
    }

    let non_amount = cells.iter().filter(|cell| !is_amount(cell)).count();
    non_amount as f32 / cells.len() as f32
}

pub(crate) fn infer_has_header(rows: &[Vec<String>]) -> (bool, f32) {
    if rows.is_empty() {
        return (false, 0.0);
    }

    let first = non_amount_ratio(&rows[0]);
    let second = rows.get(1).map_or(0.0, |row| non_amount_ratio(row));

    let confidence = (first * 0.6 + (1.0 - second) * 0.4).clamp(0.0, 1.0);
    let has_header = first >= 0.6 && second <= 0.7;
    (has_header, confidence)
}

/// Number of leading header rows for a detected table under `mode`.
pub(crate) fn header_row_count(
    table: &DetectedTable,
    mode: HeaderMode,
    warnings: &mut Vec<ExtractWarning>,
    table_id: usize,
) -> usize {
    if table.rows.is_empty() {
        return 0;
    }

    match mode {
        HeaderMode::HasHeader => 1,
        HeaderMode::NoHeader => 0,
        HeaderMode::AutoDetect => {
            let (has_header, confidence) = infer_has_header(&table.rows);
            if has_header && confidence >= HEADER_CONFIDENCE_THRESHOLD {
                return 1;
            }

            if confidence < HEADER_CONFIDENCE_THRESHOLD {
                warnings.push(
                    ExtractWarning::new(
                        WarningCode::HeaderInferenceLowConfidence,
                        "header inference confidence is low; keeping the first row as data",
                    )
                    .with_page(table.page)
                    .with_table_id(table_id)
                    .with_confidence(confidence),
                );
            }

            0
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::header::infer_has_header;

    fn rows(lines: &[&[&str]]) -> Vec<Vec<String>> {
        lines
            .iter()
            .map(|line| line.iter().map(|cell| (*cell).to_string()).collect())
            .collect()
    }

    #[test]
    fn year_columns_count_as_header_labels() {
        let (has_header, confidence) =
            infer_has_header(&rows(&[&["Item", "2023", "2022"], &["Revenue", "1,000", "900"]]));
        assert!(has_header);
        assert!(confidence > 0.55);
    }

    #[test]
    fn amount_first_row_is_data() {
        let (has_header, _) = infer_has_header(&rows(&[
            &["Revenue", "1,000", "900"],
            &["Cost of sales", "(400)", "(350)"],
        ]));
        assert!(!has_header);
    }
}
