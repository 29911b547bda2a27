//! Collection data model
//!
//! A [`CollectionRecord`] is one physical line item of an imported collection.
//! The import fields are plain strings carried through untouched; everything the
//! catalog contributes lives in a single [`EnrichmentState`] so "never looked up"
//! and "looked up, nothing found" cannot be confused.
//!
//! On the wire (persisted collections) a record is flat camelCase JSON:
//!
//! ```json
//! { "name": "Lightning Bolt", "setCode": "2xm", "quantity": 4, "foil": "",
//!   "scryfallId": "…", "collectorNumber": "117",
//!   "marketPrice": 1.25, "imageUrl": "https://…", "error": null }
//! ```
//!
//! `marketPrice` missing means the record was never enriched, `marketPrice: null`
//! means a batch ran and produced no price.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::import::parse_quantity;

/// Reason a record could not be priced during a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnrichmentFailure {
    /// The record has no catalog identifier, so no lookup was attempted.
    MissingIdentifier,
    /// The catalog knows the card but exposes no listing id, so its price is not trusted.
    NoListingId,
    /// Transport failure, non-success status or undecodable body.
    LookupFailed,
}

impl EnrichmentFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentFailure::MissingIdentifier => "Missing identifier",
            EnrichmentFailure::NoListingId => "No listing id",
            EnrichmentFailure::LookupFailed => "Lookup failed",
        }
    }

    /// Map a stored error tag back onto a failure.
    ///
    /// Collections saved by older releases used different wording for the same
    /// three outcomes; those are accepted too. Anything else is a lookup failure.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Missing identifier" | "Missing Scryfall ID" => EnrichmentFailure::MissingIdentifier,
            "No listing id" | "No TCGPlayer ID" => EnrichmentFailure::NoListingId,
            _ => EnrichmentFailure::LookupFailed,
        }
    }
}

impl fmt::Display for EnrichmentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog data attached to a record
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnrichmentState {
    #[default]
    Unenriched,
    Enriched {
        market_price: Option<f64>,
        image_url: Option<String>,
    },
    Failed {
        reason: EnrichmentFailure,
        image_url: Option<String>,
    },
}

impl EnrichmentState {
    /// Build a failed state. Only `NoListingId` keeps an image, the other
    /// failures never reached a usable catalog entry.
    pub fn failed(reason: EnrichmentFailure, image_url: Option<String>) -> Self {
        let image_url = match reason {
            EnrichmentFailure::NoListingId => image_url,
            EnrichmentFailure::MissingIdentifier | EnrichmentFailure::LookupFailed => None,
        };
        EnrichmentState::Failed { reason, image_url }
    }
}

/// Accept a price only if it is a finite, non-negative number.
///
/// Negative zero is folded into zero.
pub fn sanitize_price(price: f64) -> Option<f64> {
    (price.is_finite() && price >= 0.0).then_some(price.abs())
}

/// One line item of a card collection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "StoredRecord", into = "StoredRecord")]
pub struct CollectionRecord {
    pub name: String,
    pub set_code: String,
    pub quantity: u32,
    pub foil: String,
    /// Catalog identifier (Scryfall ID). Empty when the import had none.
    pub external_id: String,
    pub collector_number: String,
    pub enrichment: EnrichmentState,
}

impl CollectionRecord {
    /// Identifier to look the card up with, if there is a usable one.
    pub fn lookup_id(&self) -> Option<&str> {
        let id = self.external_id.trim();
        (!id.is_empty()).then_some(id)
    }

    pub fn market_price(&self) -> Option<f64> {
        match &self.enrichment {
            EnrichmentState::Enriched { market_price, .. } => *market_price,
            _ => None,
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        match &self.enrichment {
            EnrichmentState::Enriched { image_url, .. }
            | EnrichmentState::Failed { image_url, .. } => image_url.as_deref(),
            EnrichmentState::Unenriched => None,
        }
    }

    pub fn enrichment_error(&self) -> Option<EnrichmentFailure> {
        match &self.enrichment {
            EnrichmentState::Failed { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// `market price × quantity`, zero when there is no price.
    pub fn line_value(&self) -> f64 {
        self.market_price().unwrap_or(0.0) * f64::from(self.quantity)
    }

    /// Replace the enrichment state, keeping every import field as is.
    pub fn with_enrichment(self, enrichment: EnrichmentState) -> Self {
        Self { enrichment, ..self }
    }
}

/// Flat persisted form of a record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    #[serde(default, deserialize_with = "nullable_string")]
    name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    set_code: String,
    #[serde(default, deserialize_with = "lenient_quantity")]
    quantity: u32,
    #[serde(default, deserialize_with = "nullable_string")]
    foil: String,
    #[serde(default, deserialize_with = "nullable_string")]
    scryfall_id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    collector_number: String,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    market_price: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Distinguishes a missing key (outer `None`) from an explicit `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Older collections may hold `null`, strings or fractional numbers here.
fn lenient_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => match (n.as_u64(), n.as_f64()) {
            (Some(q), _) => u32::try_from(q).unwrap_or(u32::MAX),
            (None, Some(q)) if q.is_finite() && q > 0.0 => q.min(f64::from(u32::MAX)) as u32,
            _ => 0,
        },
        serde_json::Value::String(s) => parse_quantity(&s),
        _ => 0,
    })
}

impl From<CollectionRecord> for StoredRecord {
    fn from(record: CollectionRecord) -> Self {
        let (market_price, image_url, error) = match record.enrichment {
            EnrichmentState::Unenriched => (None, None, None),
            EnrichmentState::Enriched {
                market_price,
                image_url,
            } => (Some(market_price), image_url, None),
            EnrichmentState::Failed { reason, image_url } => {
                (Some(None), image_url, Some(reason.to_string()))
            }
        };

        StoredRecord {
            name: record.name,
            set_code: record.set_code,
            quantity: record.quantity,
            foil: record.foil,
            scryfall_id: record.external_id,
            collector_number: record.collector_number,
            market_price,
            image_url,
            error,
        }
    }
}

impl From<StoredRecord> for CollectionRecord {
    fn from(stored: StoredRecord) -> Self {
        let enrichment = match (stored.error, stored.market_price, stored.image_url) {
            (Some(tag), _, image_url) => {
                EnrichmentState::failed(EnrichmentFailure::from_tag(&tag), image_url)
            }
            (None, Some(price), image_url) => EnrichmentState::Enriched {
                market_price: price.and_then(sanitize_price),
                image_url,
            },
            (None, None, Some(image_url)) => EnrichmentState::Enriched {
                market_price: None,
                image_url: Some(image_url),
            },
            (None, None, None) => EnrichmentState::Unenriched,
        };

        CollectionRecord {
            name: stored.name,
            set_code: stored.set_code,
            quantity: stored.quantity,
            foil: stored.foil,
            external_id: stored.scryfall_id,
            collector_number: stored.collector_number,
            enrichment,
        }
    }
}
