use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::ExtractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    AutoDetect,
    HasHeader,
    NoHeader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityMode {
    /// Keep low-confidence tables and attach a warning to them.
    BestEffort,
    /// Drop low-confidence tables.
    SkipAmbiguous,
}

/// Inclusive 1-based page ranges, stored as parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    ranges: Vec<RangeInclusive<u32>>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.ranges.iter().any(|range| range.contains(&page))
    }
}

fn page_number(raw: &str, token: &str) -> Result<u32, ExtractError> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(ExtractError::InvalidPageSelection(format!(
            "'{token}': pages are 1-based"
        ))),
        Ok(page) => Ok(page),
        Err(_) => Err(ExtractError::InvalidPageSelection(format!(
            "'{token}': '{}' is not a page number",
            raw.trim()
        ))),
    }
}

/// Parses selections such as `1-3,5`; whitespace around tokens is ignored.
impl FromStr for PageSelection {
    type Err = ExtractError;

    fn from_str(selection: &str) -> Result<Self, Self::Err> {
        let mut ranges = Vec::new();
        for token in selection.split(',').map(str::trim).filter(|token| !token.is_empty()) {
            let (first, last) = match token.split_once('-') {
                Some((first, last)) => (page_number(first, token)?, page_number(last, token)?),
                None => {
                    let page = page_number(token, token)?;
                    (page, page)
                }
            };
            if last < first {
                return Err(ExtractError::InvalidPageSelection(format!(
                    "invalid range '{token}': {last} comes before {first}"
                )));
            }
            ranges.push(first..=last);
        }

        if ranges.is_empty() {
            return Err(ExtractError::InvalidPageSelection(
                "no pages given".to_string(),
            ));
        }
        Ok(Self { ranges })
    }
}

/// Tunables for the local (text layout) table extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub pages: Option<PageSelection>,
    pub header_mode: HeaderMode,
    pub quality_mode: QualityMode,
    pub min_cols: usize,
}

impl ExtractOptions {
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.min_cols < 2 {
            return Err(ExtractError::InvalidOption(
                "min_cols must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pages: None,
            header_mode: HeaderMode::AutoDetect,
            quality_mode: QualityMode::BestEffort,
            min_cols: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExtractOptions, PageSelection};
    use std::str::FromStr;

    #[test]
    fn selection_combines_ranges_and_single_pages() {
        let selection = PageSelection::from_str(" 2-4 , 7").expect("selection");
        let picked = (1..=8).filter(|page| selection.contains(*page)).collect::<Vec<_>>();
        assert_eq!(picked, vec![2, 3, 4, 7]);
    }

    #[test]
    fn open_ended_range_is_stored_without_expanding() {
        let selection = PageSelection::from_str("3-4294967295").expect("selection");
        assert!(selection.contains(4_000_000_000));
        assert!(selection.contains(3));
        assert!(!selection.contains(2));
    }

    #[test]
    fn malformed_selections_are_rejected() {
        for (input, fragment) in [
            ("5-2", "comes before"),
            ("0,2", "1-based"),
            ("1-x", "not a page number"),
            (" , ", "no pages"),
        ] {
            let error = PageSelection::from_str(input).expect_err(input);
            assert!(error.to_string().contains(fragment), "{input}: {error}");
        }
    }

    #[test]
    fn min_cols_below_two_is_rejected() {
        let options = ExtractOptions {
            min_cols: 1,
            ..ExtractOptions::default()
        };
        assert!(options.validate().is_err());
        assert!(ExtractOptions::default().validate().is_ok());
    }
}
