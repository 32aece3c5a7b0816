use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Widest range a single token may expand to when no page count bounds it.
const MAX_RANGE_SPAN: u32 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageRangeError {
    #[error("invalid page token '{token}': {reason}")]
    MalformedToken { token: String, reason: &'static str },

    #[error("invalid range '{token}': start page {start} is after end page {end}")]
    InvalidRange { token: String, start: u32, end: u32 },

    #[error("page {index} is out of range ({})", window(.total))]
    PageOutOfBounds { index: u32, total: Option<u32> },
}

fn window(total: &Option<u32>) -> String {
    match total {
        Some(0) => "document has no pages".to_string(),
        Some(total) => format!("valid pages are 1-{}", total),
        None => "pages start at 1".to_string(),
    }
}

/// A validated set of 1-based page numbers, ascending and without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSelection {
    pages: Vec<u32>,
}

impl PageSelection {
    pub fn pages(&self) -> &[u32] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn contains(&self, page: u32) -> bool {
        self.pages.binary_search(&page).is_ok()
    }

    /// Page indices for APIs that count from zero.
    pub fn to_zero_based(&self) -> Vec<usize> {
        self.pages.iter().map(|&p| p as usize - 1).collect()
    }

    /// Pages in `1..=total` that are not part of this selection.
    pub fn complement(&self, total: u32) -> Vec<u32> {
        (1..=total).filter(|p| !self.contains(*p)).collect()
    }
}

impl From<PageSelection> for Vec<u32> {
    fn from(selection: PageSelection) -> Self {
        selection.pages
    }
}

/// Renders consecutive runs as ranges, e.g. `[2, 5, 6, 7, 9]` becomes `2,5-7,9`.
impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut iter = self.pages.iter().copied().peekable();
        while let Some(start) = iter.next() {
            let mut end = start;
            while iter.peek() == Some(&(end + 1)) {
                end += 1;
                iter.next();
            }

            if !first {
                f.write_str(",")?;
            }
            first = false;

            if start == end {
                write!(f, "{}", start)?;
            } else {
                write!(f, "{}-{}", start, end)?;
            }
        }
        Ok(())
    }
}

impl FromStr for PageSelection {
    type Err = PageRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_page_selection(s, None)
    }
}

/// One parsed token: a single page when `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: u32,
    end: u32,
}

impl Span {
    fn parse(token: &str) -> Result<Self, PageRangeError> {
        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_number(start, token)?;
                let end = parse_number(end, token)?;
                if start > end {
                    return Err(PageRangeError::InvalidRange {
                        token: token.to_string(),
                        start,
                        end,
                    });
                }
                Ok(Span { start, end })
            }
            None => {
                let page = parse_number(token, token)?;
                Ok(Span {
                    start: page,
                    end: page,
                })
            }
        }
    }

    /// The smallest page of this span that lies outside `1..=total`.
    fn first_out_of_bounds(&self, total: Option<u32>) -> Option<u32> {
        if self.start == 0 {
            return Some(0);
        }
        match total {
            Some(total) if self.end > total => Some(self.start.max(total + 1)),
            _ => None,
        }
    }
}

fn parse_number(part: &str, token: &str) -> Result<u32, PageRangeError> {
    let malformed = |reason| PageRangeError::MalformedToken {
        token: token.to_string(),
        reason,
    };

    let part = part.trim();
    if part.is_empty() {
        return Err(malformed("missing page number"));
    }
    // `u32::from_str` accepts a leading '+', which is not a page number
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("not a page number"));
    }
    part.parse::<u32>().map_err(|_| malformed("page number too large"))
}

/// Parse a page selection such as `"2,5-7,9"` into sorted, unique 1-based pages.
///
/// Empty or whitespace-only input yields an empty selection. Any malformed
/// token, descending range, or page outside `1..=total_pages` fails the
/// whole parse; nothing is ever partially selected.
pub fn parse_page_selection(
    s: &str,
    total_pages: Option<u32>,
) -> Result<PageSelection, PageRangeError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(PageSelection::default());
    }

    let spans = s
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| Span::parse(token).map(|span| (token, span)))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(index) = spans
        .iter()
        .filter_map(|(_, span)| span.first_out_of_bounds(total_pages))
        .min()
    {
        return Err(PageRangeError::PageOutOfBounds {
            index,
            total: total_pages,
        });
    }

    let mut pages = BTreeSet::new();
    for (token, span) in spans {
        if total_pages.is_none() && span.end - span.start >= MAX_RANGE_SPAN {
            return Err(PageRangeError::MalformedToken {
                token: token.to_string(),
                reason: "range too large",
            });
        }
        pages.extend(span.start..=span.end);
    }

    Ok(PageSelection {
        pages: pages.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<Vec<u32>, PageRangeError> {
        parse_page_selection(s, None).map(Vec::from)
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse("").unwrap(), Vec::<u32>::new());
        assert_eq!(parse("   ").unwrap(), Vec::<u32>::new());
        assert_eq!(parse(" , ,").unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_mixed_tokens() {
        assert_eq!(parse("2,5-7,9").unwrap(), vec![2, 5, 6, 7, 9]);
    }

    #[test]
    fn test_duplicates_collapse() {
        assert_eq!(parse("9,2,5-7,7").unwrap(), vec![2, 5, 6, 7, 9]);
        assert_eq!(parse("1-4,3-6").unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_whitespace_and_empty_tokens() {
        assert_eq!(parse("1,,3").unwrap(), vec![1, 3]);
        assert_eq!(parse(" 1 , 3 - 4 ,").unwrap(), vec![1, 3, 4]);
    }

    #[test]
    fn test_single_page_range() {
        assert_eq!(parse("4-4").unwrap(), vec![4]);
    }

    #[test]
    fn test_descending_range() {
        let err = parse("5-2").unwrap_err();
        assert_eq!(
            err,
            PageRangeError::InvalidRange {
                token: "5-2".to_string(),
                start: 5,
                end: 2,
            }
        );
    }

    #[test]
    fn test_malformed_tokens() {
        for input in ["abc", "1,abc", "-5", "3-", "1-2-3", "+4", "2.5", "1-x"] {
            match parse(input) {
                Err(PageRangeError::MalformedToken { .. }) => {}
                other => panic!("{:?} should be malformed, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_malformed_names_token() {
        let err = parse("1, 2x ,3").unwrap_err();
        assert_eq!(
            err,
            PageRangeError::MalformedToken {
                token: "2x".to_string(),
                reason: "not a page number",
            }
        );
        assert_eq!(
            err.to_string(),
            "invalid page token '2x': not a page number"
        );
    }

    #[test]
    fn test_number_overflow() {
        assert!(matches!(
            parse("99999999999"),
            Err(PageRangeError::MalformedToken {
                reason: "page number too large",
                ..
            })
        ));
    }

    #[test]
    fn test_page_zero() {
        assert_eq!(
            parse("0").unwrap_err(),
            PageRangeError::PageOutOfBounds {
                index: 0,
                total: None
            }
        );
        assert!(parse("0-3").is_err());
    }

    #[test]
    fn test_page_exceeds_total() {
        let err = parse_page_selection("1,6", Some(5)).unwrap_err();
        assert_eq!(
            err,
            PageRangeError::PageOutOfBounds {
                index: 6,
                total: Some(5)
            }
        );
        assert_eq!(err.to_string(), "page 6 is out of range (valid pages are 1-5)");
    }

    #[test]
    fn test_range_crossing_total() {
        let err = parse_page_selection("2,4-8", Some(5)).unwrap_err();
        assert_eq!(
            err,
            PageRangeError::PageOutOfBounds {
                index: 6,
                total: Some(5)
            }
        );
    }

    #[test]
    fn test_within_total() {
        let pages = parse_page_selection("1,3-5", Some(5)).unwrap();
        assert_eq!(pages.pages(), &[1, 3, 4, 5]);
    }

    #[test]
    fn test_syntax_errors_win_over_bounds() {
        assert!(matches!(
            parse_page_selection("9,abc", Some(5)),
            Err(PageRangeError::MalformedToken { .. })
        ));
    }

    #[test]
    fn test_huge_unbounded_range() {
        assert!(matches!(
            parse("1-4000000000"),
            Err(PageRangeError::MalformedToken {
                reason: "range too large",
                ..
            })
        ));
        // A page count turns the same input into a bounds error instead
        assert!(matches!(
            parse_page_selection("1-4000000000", Some(10)),
            Err(PageRangeError::PageOutOfBounds { index: 11, .. })
        ));
    }

    #[test]
    fn test_huge_range_within_total() {
        let pages = parse_page_selection("1-1500000", Some(2_000_000)).unwrap();
        assert_eq!(pages.len(), 1_500_000);
        assert_eq!(pages.pages().last(), Some(&1_500_000));
    }

    #[test]
    fn test_sorted_and_unique() {
        let pages = parse("10,1-3,2,8-9,3").unwrap();
        let mut expected = pages.clone();
        expected.sort_unstable();
        expected.dedup();
        assert_eq!(pages, expected);
    }

    #[test]
    fn test_display_collapses_runs() {
        let selection = parse_page_selection("9,2,5-7", None).unwrap();
        assert_eq!(selection.to_string(), "2,5-7,9");
        assert_eq!(PageSelection::default().to_string(), "");
    }

    #[test]
    fn test_reparse_is_idempotent() {
        for input in ["2,5-7,9", "2,5,6,7,9", "7,1-3,3", "1"] {
            let first = parse_page_selection(input, None).unwrap();
            let again: PageSelection = first.to_string().parse().unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_zero_based_and_complement() {
        let selection = parse_page_selection("2,4", Some(5)).unwrap();
        assert_eq!(selection.to_zero_based(), vec![1, 3]);
        assert_eq!(selection.complement(5), vec![1, 3, 5]);
        assert!(selection.contains(4));
        assert!(!selection.contains(5));
    }
}
