//! Batch merge
//!
//! The shell collects one [`LookupResult`] per record, indexed like the input,
//! and this module folds them back into the record set in a single pass.

use serde::Serialize;

use crate::catalog::{CatalogListing, LookupError, LookupResult};
use crate::record::{CollectionRecord, EnrichmentFailure, EnrichmentState};

/// Apply one lookup result to its record
///
/// Only the enrichment state changes; import fields are carried through.
pub fn merge_outcome(record: CollectionRecord, outcome: LookupResult) -> CollectionRecord {
    let enrichment = match outcome {
        Ok(CatalogListing {
            market_price,
            image_url,
        }) => EnrichmentState::Enriched {
            market_price,
            image_url,
        },
        Err(err) => {
            let reason = err.failure();
            EnrichmentState::failed(reason, err.into_image_url())
        }
    };

    record.with_enrichment(enrichment)
}

/// Merge a full batch of results into the record set
///
/// `outcomes[i]` belongs to `records[i]`. Order and length of `records` are
/// preserved; a record left without a result is marked as a failed lookup.
pub fn merge_outcomes(
    records: Vec<CollectionRecord>,
    outcomes: Vec<LookupResult>,
) -> Vec<CollectionRecord> {
    let mut outcomes = outcomes.into_iter();

    records
        .into_iter()
        .map(|record| {
            let outcome = outcomes.next().unwrap_or_else(|| {
                Err(LookupError::LookupFailed(
                    "no result produced for record".to_string(),
                ))
            });
            merge_outcome(record, outcome)
        })
        .collect()
}

/// Counts describing the state of a record set after a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub enriched: usize,
    pub priced: usize,
    pub missing_identifier: usize,
    pub no_listing_id: usize,
    pub lookup_failed: usize,
    pub total_value: f64,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.missing_identifier + self.no_listing_id + self.lookup_failed
    }
}

/// Summarize a record set
pub fn summarize(records: &[CollectionRecord]) -> BatchSummary {
    records
        .iter()
        .fold(BatchSummary::default(), |mut summary, record| {
            summary.total += 1;
            summary.total_value += record.line_value();

            match &record.enrichment {
                EnrichmentState::Unenriched => {}
                EnrichmentState::Enriched { market_price, .. } => {
                    summary.enriched += 1;
                    if market_price.is_some() {
                        summary.priced += 1;
                    }
                }
                EnrichmentState::Failed { reason, .. } => match reason {
                    EnrichmentFailure::MissingIdentifier => summary.missing_identifier += 1,
                    EnrichmentFailure::NoListingId => summary.no_listing_id += 1,
                    EnrichmentFailure::LookupFailed => summary.lookup_failed += 1,
                },
            }

            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, id: &str, quantity: u32) -> CollectionRecord {
        CollectionRecord {
            name: name.to_string(),
            set_code: "m10".to_string(),
            quantity,
            foil: "".to_string(),
            external_id: id.to_string(),
            collector_number: "1".to_string(),
            enrichment: EnrichmentState::Unenriched,
        }
    }

    fn listing(price: f64, image: &str) -> LookupResult {
        Ok(CatalogListing {
            market_price: Some(price),
            image_url: Some(image.to_string()),
        })
    }

    #[test]
    fn test_merge_success() {
        let merged = merge_outcome(record("Bolt", "a", 4), listing(1.5, "https://img/a"));

        assert_eq!(merged.market_price(), Some(1.5));
        assert_eq!(merged.image_url(), Some("https://img/a"));
        assert_eq!(merged.enrichment_error(), None);
    }

    #[test]
    fn test_merge_no_listing_id_keeps_image_drops_price() {
        let merged = merge_outcome(
            record("Bolt", "a", 4),
            Err(LookupError::NoListingId {
                image_url: Some("https://img/a".to_string()),
            }),
        );

        assert_eq!(merged.market_price(), None);
        assert_eq!(merged.image_url(), Some("https://img/a"));
        assert_eq!(
            merged.enrichment_error().map(|e| e.to_string()),
            Some("No listing id".to_string())
        );
    }

    #[test]
    fn test_merge_lookup_failed_clears_previous_enrichment() {
        let already = record("Bolt", "a", 4).with_enrichment(EnrichmentState::Enriched {
            market_price: Some(9.0),
            image_url: Some("https://img/old".to_string()),
        });

        let merged = merge_outcome(already, Err(LookupError::LookupFailed("timeout".into())));

        assert_eq!(merged.market_price(), None);
        assert_eq!(merged.image_url(), None);
        assert_eq!(
            merged.enrichment_error().map(|e| e.to_string()),
            Some("Lookup failed".to_string())
        );
    }

    #[test]
    fn test_merge_missing_identifier() {
        let merged = merge_outcome(record("Bolt", "", 4), Err(LookupError::MissingIdentifier));

        assert_eq!(
            merged.enrichment_error().map(|e| e.to_string()),
            Some("Missing identifier".to_string())
        );
        assert_eq!(merged.image_url(), None);
    }

    #[test]
    fn test_merge_outcomes_isolates_failures() {
        let records = vec![
            record("A", "a", 1),
            record("B", "b", 2),
            record("C", "c", 3),
        ];
        let outcomes = vec![
            listing(1.0, "https://img/a"),
            Err(LookupError::LookupFailed("HTTP 500".into())),
            listing(3.0, "https://img/c"),
        ];

        let merged = merge_outcomes(records.clone(), outcomes);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].market_price(), Some(1.0));
        assert_eq!(merged[0].enrichment_error(), None);
        assert_eq!(
            merged[1].enrichment_error(),
            Some(EnrichmentFailure::LookupFailed)
        );
        assert_eq!(merged[2].market_price(), Some(3.0));
        assert_eq!(merged[2].image_url(), Some("https://img/c"));

        for (before, after) in records.iter().zip(&merged) {
            assert_eq!(before.name, after.name);
            assert_eq!(before.quantity, after.quantity);
            assert_eq!(before.external_id, after.external_id);
        }
    }

    #[test]
    fn test_merge_outcomes_with_short_results_never_drops_records() {
        let records = vec![record("A", "a", 1), record("B", "b", 1)];
        let merged = merge_outcomes(records, vec![listing(1.0, "https://img/a")]);

        assert_eq!(merged.len(), 2);
        assert_eq!(
            merged[1].enrichment_error(),
            Some(EnrichmentFailure::LookupFailed)
        );
    }

    #[test]
    fn test_merge_is_repeatable() {
        let records = vec![record("A", "a", 2)];
        let first = merge_outcomes(records, vec![listing(2.0, "https://img/a")]);
        let second = merge_outcomes(first.clone(), vec![listing(2.0, "https://img/a")]);

        assert_eq!(first, second);
    }

    #[test]
    fn test_summarize() {
        let records = merge_outcomes(
            vec![
                record("A", "a", 2),
                record("B", "", 1),
                record("C", "c", 1),
                record("D", "d", 5),
            ],
            vec![
                listing(1.25, "https://img/a"),
                Err(LookupError::MissingIdentifier),
                Err(LookupError::NoListingId { image_url: None }),
                Ok(CatalogListing {
                    market_price: None,
                    image_url: None,
                }),
            ],
        );

        let summary = summarize(&records);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.enriched, 2);
        assert_eq!(summary.priced, 1);
        assert_eq!(summary.missing_identifier, 1);
        assert_eq!(summary.no_listing_id, 1);
        assert_eq!(summary.lookup_failed, 0);
        assert_eq!(summary.failed(), 2);
        assert_eq!(summary.total_value, 2.5);
    }
}
