use std::collections::{BTreeMap, HashMap};

use crate::model::{LineItem, Sheet, SheetRow, StatementCategory};

/// Collects line items per category across every processed document.
#[derive(Debug, Default)]
pub struct WorkbookAssembler {
    categories: BTreeMap<StatementCategory, Vec<LineItem>>,
}

impl WorkbookAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends in arrival order without deduplicating. Unclassified items
    /// are discarded.
    pub fn append(&mut self, category: StatementCategory, items: impl IntoIterator<Item = LineItem>) {
        if category == StatementCategory::Unclassified {
            return;
        }
        self.categories.entry(category).or_default().extend(items);
    }

    #[must_use]
    pub fn line_item_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn finalize(self) -> Workbook {
        let categories = self
            .categories
            .into_iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(category, items)| (category, order_line_items(items)))
            .collect();
        Workbook { categories }
    }
}

fn first_seen_ranks<'a>(keys: impl Iterator<Item = &'a str>) -> HashMap<&'a str, usize> {
    let mut ranks = HashMap::new();
    for key in keys {
        let next = ranks.len();
        ranks.entry(key).or_insert(next);
    }
    ranks
}

/// Stable order by first-seen canonical name, then first-seen period.
fn order_line_items(items: Vec<LineItem>) -> Vec<LineItem> {
    let ranks = {
        let names = first_seen_ranks(items.iter().map(|item| item.canonical_name.as_str()));
        let periods = first_seen_ranks(items.iter().map(|item| item.period.as_str()));
        items
            .iter()
            .map(|item| {
                (
                    names[item.canonical_name.as_str()],
                    periods[item.period.as_str()],
                )
            })
            .collect::<Vec<_>>()
    };

    let mut ranked = ranks.into_iter().zip(items).collect::<Vec<_>>();
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().map(|(_, item)| item).collect()
}

/// Finalized per-category line items; one sheet per populated category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    categories: Vec<(StatementCategory, Vec<LineItem>)>,
}

impl Workbook {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    #[must_use]
    pub fn categories(&self) -> Vec<StatementCategory> {
        self.categories.iter().map(|(category, _)| *category).collect()
    }

    #[must_use]
    pub fn line_items(&self, category: StatementCategory) -> &[LineItem] {
        self.categories
            .iter()
            .find(|(known, _)| *known == category)
            .map(|(_, items)| items.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn line_item_count(&self) -> usize {
        self.categories.iter().map(|(_, items)| items.len()).sum()
    }

    #[must_use]
    pub fn sheets(&self) -> Vec<Sheet> {
        self.categories
            .iter()
            .map(|(category, items)| pivot_sheet(*category, items))
            .collect()
    }
}

/// Rows keyed by (line item, source); a repeated key for an already filled
/// period opens a new row instead of overwriting.
fn pivot_sheet(category: StatementCategory, items: &[LineItem]) -> Sheet {
    let mut periods: Vec<String> = Vec::new();
    for item in items {
        if !periods.contains(&item.period) {
            periods.push(item.period.clone());
        }
    }

    let mut rows: Vec<SheetRow> = Vec::new();
    let mut filled: Vec<Vec<bool>> = Vec::new();
    for item in items {
        let column = periods
            .iter()
            .position(|period| *period == item.period)
            .unwrap_or_default();
        let open_row = rows.iter().enumerate().position(|(index, row)| {
            row.line_item == item.canonical_name
                && row.source_id == item.source_id
                && !filled[index][column]
        });

        let index = open_row.unwrap_or_else(|| {
            rows.push(SheetRow {
                line_item: item.canonical_name.clone(),
                source_id: item.source_id.clone(),
                values: vec![None; periods.len()],
            });
            filled.push(vec![false; periods.len()]);
            rows.len() - 1
        });

        rows[index].values[column] = item.value;
        filled[index][column] = true;
    }

    Sheet {
        category,
        title: category.sheet_title(),
        periods,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::WorkbookAssembler;
    use crate::model::{LineItem, StatementCategory};

    fn item(name: &str, period: &str, value: Option<rust_decimal::Decimal>, source: &str) -> LineItem {
        LineItem {
            canonical_name: name.to_string(),
            raw_label: name.to_string(),
            period: period.to_string(),
            value,
            source_id: source.to_string(),
        }
    }

    #[test]
    fn unclassified_and_empty_categories_produce_no_sheets() {
        let mut assembler = WorkbookAssembler::new();
        assembler.append(
            StatementCategory::CashFlow,
            vec![item("Net Change in Cash", "2023", Some(dec!(5)), "a")],
        );
        assembler.append(
            StatementCategory::Unclassified,
            vec![item("Alice", "col_2", Some(dec!(30)), "a")],
        );
        assembler.append(StatementCategory::ProfitAndLoss, Vec::new());
        assembler.append(
            StatementCategory::IncomeStatement,
            vec![item("Revenue", "2023", Some(dec!(100)), "a")],
        );

        let workbook = assembler.finalize();
        assert_eq!(
            workbook.categories(),
            vec![StatementCategory::IncomeStatement, StatementCategory::CashFlow]
        );
        let titles = workbook.sheets().iter().map(|sheet| sheet.title).collect::<Vec<_>>();
        assert_eq!(titles, vec!["Income Statement", "Cash Flow Statement"]);
    }

    #[test]
    fn keeps_duplicates_across_documents_and_orders_by_first_seen_name() {
        let mut assembler = WorkbookAssembler::new();
        assembler.append(
            StatementCategory::IncomeStatement,
            vec![
                item("Revenue", "2023", Some(dec!(100)), "a"),
                item("Net Income", "2023", Some(dec!(10)), "a"),
            ],
        );
        assembler.append(
            StatementCategory::IncomeStatement,
            vec![
                item("Net Income", "2022", Some(dec!(8)), "b"),
                item("Revenue", "2022", Some(dec!(90)), "b"),
            ],
        );

        let workbook = assembler.finalize();
        let ordered = workbook
            .line_items(StatementCategory::IncomeStatement)
            .iter()
            .map(|item| (item.canonical_name.as_str(), item.period.as_str(), item.source_id.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            ordered,
            vec![
                ("Revenue", "2023", "a"),
                ("Revenue", "2022", "b"),
                ("Net Income", "2023", "a"),
                ("Net Income", "2022", "b"),
            ]
        );

        let sheets = workbook.sheets();
        let sheet = &sheets[0];
        assert_eq!(sheet.periods, vec!["2023", "2022"]);
        assert_eq!(sheet.rows.len(), 4);
        assert_eq!(sheet.rows[1].source_id, "b");
        assert_eq!(sheet.rows[1].values, vec![None, Some(dec!(90))]);
    }

    #[test]
    fn repeated_label_in_one_document_opens_a_second_row() {
        let mut assembler = WorkbookAssembler::new();
        assembler.append(
            StatementCategory::CashFlow,
            vec![
                item("Other", "2023", Some(dec!(1)), "a"),
                item("Other", "2023", None, "a"),
            ],
        );

        let sheets = assembler.finalize().sheets();
        let sheet = &sheets[0];
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].values, vec![Some(dec!(1))]);
        assert_eq!(sheet.rows[1].values, vec![None]);
    }
}
