use std::path::Path;

use csv::WriterBuilder;

use crate::assemble::Workbook;
use crate::error::ExtractError;

const HEADERS: [&str; 5] = ["category", "line_item", "period", "value", "source"];

fn write_records<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    workbook: &Workbook,
) -> Result<(), ExtractError> {
    writer.write_record(HEADERS)?;
    for category in workbook.categories() {
        for item in workbook.line_items(category) {
            let value = item.value.map(|value| value.to_string()).unwrap_or_default();
            writer.write_record([
                category.as_str(),
                item.canonical_name.as_str(),
                item.period.as_str(),
                value.as_str(),
                item.source_id.as_str(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_csv(path: &Path, workbook: &Workbook) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    write_records(&mut writer, workbook)
}

pub(crate) fn write_csv_to_string(workbook: &Workbook) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::<u8>::new());
    write_records(&mut writer, workbook)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, error)))
}
