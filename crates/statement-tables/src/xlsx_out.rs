use std::path::Path;

use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook as XlsxWorkbook, Worksheet, XlsxError};

use crate::assemble::Workbook;
use crate::error::ExtractError;
use crate::model::Sheet;

/// Rendered in place of a null value.
pub const EMPTY_MARKER: &str = "-";
pub const NO_DATA_SHEET: &str = "No Data";

const HEADER_FILL: u32 = 0x0036_6092;
const MAX_COLUMN_WIDTH: usize = 50;
const AMOUNT_FORMAT: &str = "#,##0.00;(#,##0.00)";

struct Formats {
    header: Format,
    amount: Format,
    empty: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(HEADER_FILL))
                .set_align(FormatAlign::Center),
            amount: Format::new()
                .set_num_format(AMOUNT_FORMAT)
                .set_align(FormatAlign::Right),
            empty: Format::new().set_align(FormatAlign::Center),
        }
    }
}

fn header_cells(sheet: &Sheet) -> Vec<&str> {
    let mut cells = vec!["Line Item", "Source"];
    cells.extend(sheet.periods.iter().map(String::as_str));
    cells
}

fn column_widths(sheet: &Sheet) -> Vec<f64> {
    let mut widths = header_cells(sheet)
        .iter()
        .map(|cell| cell.chars().count())
        .collect::<Vec<_>>();

    for row in &sheet.rows {
        widths[0] = widths[0].max(row.line_item.chars().count());
        widths[1] = widths[1].max(row.source_id.chars().count());
        for (offset, value) in row.values.iter().enumerate() {
            let len = value.map_or(EMPTY_MARKER.len(), |value| value.to_string().len());
            widths[offset + 2] = widths[offset + 2].max(len);
        }
    }

    widths
        .into_iter()
        .map(|width| (width + 2).min(MAX_COLUMN_WIDTH) as f64)
        .collect()
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet, formats: &Formats) -> Result<(), XlsxError> {
    worksheet.set_name(sheet.title)?;

    for (col, width) in column_widths(sheet).into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width)?;
    }

    for (col, header) in header_cells(sheet).into_iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &formats.header)?;
    }

    for (index, row) in sheet.rows.iter().enumerate() {
        let row_no = (index + 1) as u32;
        worksheet.write_string(row_no, 0, &row.line_item)?;
        worksheet.write_string(row_no, 1, &row.source_id)?;
        for (offset, value) in row.values.iter().enumerate() {
            let col = (offset + 2) as u16;
            match value.and_then(|value| value.to_f64()) {
                Some(number) => {
                    worksheet.write_number_with_format(row_no, col, number, &formats.amount)?;
                }
                None => {
                    worksheet.write_string_with_format(row_no, col, EMPTY_MARKER, &formats.empty)?;
                }
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn build_xlsx(workbook: &Workbook) -> Result<XlsxWorkbook, XlsxError> {
    let formats = Formats::new();
    let mut xlsx = XlsxWorkbook::new();

    let sheets = workbook.sheets();
    if sheets.is_empty() {
        xlsx.add_worksheet().set_name(NO_DATA_SHEET)?;
    }
    for sheet in &sheets {
        write_sheet(xlsx.add_worksheet(), sheet, &formats)?;
    }

    Ok(xlsx)
}

pub(crate) fn write_xlsx(path: &Path, workbook: &Workbook) -> Result<(), ExtractError> {
    build_xlsx(workbook)?.save(path)?;
    Ok(())
}

pub(crate) fn write_xlsx_to_buffer(workbook: &Workbook) -> Result<Vec<u8>, ExtractError> {
    Ok(build_xlsx(workbook)?.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{column_widths, write_xlsx_to_buffer};
    use crate::assemble::{Workbook, WorkbookAssembler};
    use crate::model::{LineItem, StatementCategory};

    fn sample_workbook() -> Workbook {
        let mut assembler = WorkbookAssembler::new();
        assembler.append(
            StatementCategory::IncomeStatement,
            vec![
                LineItem {
                    canonical_name: "Revenue".to_string(),
                    raw_label: "Sales".to_string(),
                    period: "FY2023".to_string(),
                    value: Some(dec!(1234.5)),
                    source_id: "q4-report.pdf".to_string(),
                },
                LineItem {
                    canonical_name: "Revenue".to_string(),
                    raw_label: "Sales".to_string(),
                    period: "FY2022".to_string(),
                    value: None,
                    source_id: "q4-report.pdf".to_string(),
                },
            ],
        );
        assembler.finalize()
    }

    #[test]
    fn writes_zip_container() {
        let bytes = write_xlsx_to_buffer(&sample_workbook()).expect("xlsx should be written");
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn empty_workbook_still_produces_a_valid_file() {
        let bytes = write_xlsx_to_buffer(&Workbook::default()).expect("xlsx should be written");
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn column_widths_follow_longest_cell_with_padding() {
        let sheets = sample_workbook().sheets();
        let widths = column_widths(&sheets[0]);
        assert_eq!(widths, vec![11.0, 15.0, 8.0, 8.0]);
    }
}
