//! Collection view projection
//!
//! [`project`] derives the page of records to display, the page count and the
//! total value of the filtered collection. It is a pure function of the record
//! set and the [`ViewState`], so callers simply re-run it whenever either changes.

use serde::{Deserialize, Serialize};

use crate::record::CollectionRecord;

/// Records shown per page
pub const ITEMS_PER_PAGE: usize = 20;

/// Transient search and paging state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    /// Case-insensitive substring matched against record names
    pub search_term: String,
    /// 1-based page number
    pub current_page: usize,
    pub items_per_page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            current_page: 1,
            items_per_page: ITEMS_PER_PAGE,
        }
    }
}

impl ViewState {
    pub fn new(search_term: impl Into<String>, current_page: usize) -> Self {
        Self {
            search_term: search_term.into(),
            current_page,
            ..Self::default()
        }
    }
}

/// One projected page plus aggregates over the filtered collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionView {
    pub page: Vec<CollectionRecord>,
    pub current_page: usize,
    pub total_pages: usize,
    /// Number of records matching the search
    pub total_items: usize,
    pub items_per_page: usize,
    /// Sum of `price × quantity` over every matching record, not only this page
    pub total_value: f64,
    pub next_page_command: Option<String>,
    pub prev_page_command: Option<String>,
}

/// Keep records whose name contains `search_term`, ignoring case
pub fn filter_records<'a>(
    records: &'a [CollectionRecord],
    search_term: &str,
) -> Vec<&'a CollectionRecord> {
    if search_term.is_empty() {
        return records.iter().collect();
    }

    let needle = search_term.to_lowercase();
    records
        .iter()
        .filter(|record| record.name.to_lowercase().contains(&needle))
        .collect()
}

/// Sum of `price × quantity`, missing prices count as zero
pub fn total_value<'a>(records: impl IntoIterator<Item = &'a CollectionRecord>) -> f64 {
    records.into_iter().map(CollectionRecord::line_value).sum()
}

/// Slice bounds for a 1-based page
///
/// Returns `None` when the page lies outside the available items.
pub fn page_bounds(total_items: usize, page: usize, limit: usize) -> Option<(usize, usize)> {
    let start = page.checked_sub(1)?.checked_mul(limit)?;

    if start >= total_items {
        return None;
    }

    let end = start.saturating_add(limit).min(total_items);
    Some((start, end))
}

fn view_command(search_term: &str, page: usize) -> String {
    if search_term.is_empty() {
        format!("cardvault view --page {page}")
    } else {
        format!("cardvault view --search {search_term:?} --page {page}")
    }
}

/// Project a record set through the current view state
pub fn project(records: &[CollectionRecord], state: &ViewState) -> CollectionView {
    let limit = state.items_per_page.max(1);
    let filtered = filter_records(records, &state.search_term);

    let total_items = filtered.len();
    let total_pages = total_items.div_ceil(limit);
    let total_value = total_value(filtered.iter().copied());

    let page = match page_bounds(total_items, state.current_page, limit) {
        Some((start, end)) => filtered[start..end].iter().map(|r| (*r).clone()).collect(),
        None => Vec::new(),
    };

    let next_page_command = (state.current_page < total_pages)
        .then(|| view_command(&state.search_term, state.current_page + 1));

    let prev_page_command = (state.current_page > 1 && total_pages > 0).then(|| {
        view_command(
            &state.search_term,
            (state.current_page - 1).min(total_pages),
        )
    });

    CollectionView {
        page,
        current_page: state.current_page,
        total_pages,
        total_items,
        items_per_page: limit,
        total_value,
        next_page_command,
        prev_page_command,
    }
}

/// Format a market price for display, `-` when there is none
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(price) => format!("${price:.2}"),
        None => "-".to_string(),
    }
}

/// Format a collection total for display
pub fn format_total(total: f64) -> String {
    format!("${total:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EnrichmentState;

    fn record(name: &str, price: Option<f64>, quantity: u32) -> CollectionRecord {
        CollectionRecord {
            name: name.to_string(),
            quantity,
            enrichment: match price {
                Some(p) => EnrichmentState::Enriched {
                    market_price: Some(p),
                    image_url: None,
                },
                None => EnrichmentState::Unenriched,
            },
            ..CollectionRecord::default()
        }
    }

    fn numbered(count: usize) -> Vec<CollectionRecord> {
        (0..count)
            .map(|i| record(&format!("Card {i}"), Some(1.0), 1))
            .collect()
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let records = vec![
            record("Lightning Bolt", None, 1),
            record("Shock", None, 1),
        ];

        let view = project(&records, &ViewState::new("bolt", 1));

        assert_eq!(view.total_items, 1);
        assert_eq!(view.page.len(), 1);
        assert_eq!(view.page[0].name, "Lightning Bolt");
    }

    #[test]
    fn test_empty_search_keeps_everything() {
        let records = vec![record("A", None, 1), record("B", None, 1)];
        let view = project(&records, &ViewState::default());
        assert_eq!(view.total_items, 2);
    }

    #[test]
    fn test_third_page_of_forty_five() {
        let records = numbered(45);

        let view = project(&records, &ViewState::new("", 3));

        assert_eq!(view.total_pages, 3);
        assert_eq!(view.page.len(), 5);
        assert_eq!(view.page[0].name, "Card 40");
        assert_eq!(view.page[4].name, "Card 44");
        assert_eq!(view.next_page_command, None);
        assert_eq!(
            view.prev_page_command.as_deref(),
            Some("cardvault view --page 2")
        );
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let records = numbered(45);

        let view = project(&records, &ViewState::new("", 10));

        assert!(view.page.is_empty());
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.total_items, 45);
        assert_eq!(
            view.prev_page_command.as_deref(),
            Some("cardvault view --page 3")
        );
    }

    #[test]
    fn test_page_zero_is_empty() {
        let view = project(&numbered(5), &ViewState::new("", 0));
        assert!(view.page.is_empty());
        assert_eq!(view.total_pages, 1);
    }

    #[test]
    fn test_empty_collection_has_zero_pages() {
        let view = project(&[], &ViewState::default());

        assert!(view.page.is_empty());
        assert_eq!(view.total_pages, 0);
        assert_eq!(view.total_value, 0.0);
        assert_eq!(view.next_page_command, None);
        assert_eq!(view.prev_page_command, None);
    }

    #[test]
    fn test_total_value_covers_filtered_set_only() {
        let mut records = numbered(25);
        records.push(record("Shock", Some(100.0), 2));

        let everything = project(&records, &ViewState::default());
        assert_eq!(everything.total_value, 225.0);
        assert_eq!(everything.page.len(), 20);

        let shocks = project(&records, &ViewState::new("SHOCK", 1));
        assert_eq!(shocks.total_value, 200.0);
    }

    #[test]
    fn test_total_value_without_prices_is_zero() {
        let records = vec![record("A", None, 3), record("B", None, 7)];
        let view = project(&records, &ViewState::default());
        assert_eq!(view.total_value, 0.0);
    }

    #[test]
    fn test_projection_is_repeatable() {
        let records = numbered(30);
        let state = ViewState::new("", 1);

        assert_eq!(project(&records, &state), project(&records, &state));
    }

    #[test]
    fn test_navigation_commands_carry_search() {
        let records = numbered(45);
        let view = project(&records, &ViewState::new("card", 1));

        assert_eq!(
            view.next_page_command.as_deref(),
            Some("cardvault view --search \"card\" --page 2")
        );
        assert_eq!(view.prev_page_command, None);
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(100, 2, 10), Some((10, 20)));
        assert_eq!(page_bounds(95, 10, 10), Some((90, 95)));
        assert_eq!(page_bounds(95, 11, 10), None);
        assert_eq!(page_bounds(0, 1, 10), None);
        assert_eq!(page_bounds(10, 0, 10), None);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Some(3.5)), "$3.50");
        assert_eq!(format_price(Some(0.0)), "$0.00");
        assert_eq!(format_price(None), "-");
        assert_eq!(format_total(1204.987), "$1204.99");
    }
}
