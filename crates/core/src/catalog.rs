//! Catalog response interpretation
//!
//! Pure half of the catalog adapter: the HTTP client in the shell decodes a
//! Scryfall card into [`CatalogCard`] and hands it to [`interpret_card`],
//! which decides what the card contributes to a record.

use serde::{Deserialize, Serialize};

use crate::record::{sanitize_price, EnrichmentFailure};

/// Scryfall card object, reduced to the fields enrichment reads
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogCard {
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
    /// Present on double-faced cards, which carry images per face.
    #[serde(default)]
    pub card_faces: Option<Vec<CardFace>>,
    #[serde(default)]
    pub prices: Option<CardPrices>,
    /// TCGplayer product id. Prices are only trusted when this is present.
    #[serde(default)]
    pub tcgplayer_id: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImageUris {
    #[serde(default)]
    pub normal: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CardFace {
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CardPrices {
    #[serde(default)]
    pub usd: Option<String>,
}

/// What a successful lookup contributes to a record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogListing {
    pub market_price: Option<f64>,
    pub image_url: Option<String>,
}

/// Error type for a single record's lookup
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LookupError {
    #[error("record has no catalog identifier")]
    MissingIdentifier,

    #[error("catalog entry has no listing id")]
    NoListingId { image_url: Option<String> },

    #[error("catalog lookup failed: {0}")]
    LookupFailed(String),
}

impl LookupError {
    /// Failure tag recorded on the record
    pub fn failure(&self) -> EnrichmentFailure {
        match self {
            LookupError::MissingIdentifier => EnrichmentFailure::MissingIdentifier,
            LookupError::NoListingId { .. } => EnrichmentFailure::NoListingId,
            LookupError::LookupFailed(_) => EnrichmentFailure::LookupFailed,
        }
    }

    /// Image recovered before the lookup failed, if any
    pub fn into_image_url(self) -> Option<String> {
        match self {
            LookupError::NoListingId { image_url } => image_url,
            LookupError::MissingIdentifier | LookupError::LookupFailed(_) => None,
        }
    }
}

/// Result of looking one identifier up in the catalog
pub type LookupResult = Result<CatalogListing, LookupError>;

/// Parse a currency formatted price such as `"3.50"`, `"$3.50"` or `"$1,204.99"`
///
/// Unparsable, negative or non-finite values are `None`.
pub fn parse_price(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let amount = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    let normalized: String = amount.chars().filter(|c| *c != ',').collect();

    normalized.parse::<f64>().ok().and_then(sanitize_price)
}

/// Image reference for a card, falling back to the first face that has one
pub fn card_image(card: &CatalogCard) -> Option<String> {
    card.image_uris
        .as_ref()
        .and_then(|uris| uris.normal.clone())
        .or_else(|| {
            card.card_faces.as_ref().and_then(|faces| {
                faces
                    .iter()
                    .find_map(|face| face.image_uris.as_ref()?.normal.clone())
            })
        })
}

/// Decide what a decoded catalog card contributes to a record
///
/// A card without a listing id keeps its image but loses its price.
pub fn interpret_card(card: &CatalogCard) -> LookupResult {
    let image_url = card_image(card);

    if card.tcgplayer_id.is_none() {
        return Err(LookupError::NoListingId { image_url });
    }

    let market_price = card
        .prices
        .as_ref()
        .and_then(|prices| prices.usd.as_deref())
        .and_then(parse_price);

    Ok(CatalogListing {
        market_price,
        image_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card(value: serde_json::Value) -> CatalogCard {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_price_formats() {
        assert_eq!(parse_price("3.50"), Some(3.5));
        assert_eq!(parse_price("$3.50"), Some(3.5));
        assert_eq!(parse_price(" $ 0.25 "), Some(0.25));
        assert_eq!(parse_price("$1,204.99"), Some(1204.99));
        assert_eq!(parse_price("0"), Some(0.0));
    }

    #[test]
    fn test_parse_price_negative_zero_is_zero() {
        let price = parse_price("-0").unwrap();
        assert!(price.is_sign_positive());
        assert_eq!(crate::view::format_price(Some(price)), "$0.00");
    }

    #[test]
    fn test_parse_price_rejects_garbage() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("N/A"), None);
        assert_eq!(parse_price("-1.00"), None);
        assert_eq!(parse_price("NaN"), None);
        assert_eq!(parse_price("inf"), None);
    }

    #[test]
    fn test_interpret_priced_card() {
        let scryfall = card(json!({
            "object": "card",
            "id": "e3285e6b-3e79-4d7c-bf96-d920f973b80d",
            "name": "Lightning Bolt",
            "tcgplayer_id": 214805,
            "image_uris": { "small": "https://img/s.jpg", "normal": "https://img/n.jpg" },
            "prices": { "usd": "2.19", "usd_foil": "5.43", "eur": null }
        }));

        let listing = interpret_card(&scryfall).unwrap();

        assert_eq!(listing.market_price, Some(2.19));
        assert_eq!(listing.image_url.as_deref(), Some("https://img/n.jpg"));
    }

    #[test]
    fn test_interpret_card_without_listing_id_keeps_image() {
        let scryfall = card(json!({
            "image_uris": { "normal": "https://img/n.jpg" },
            "prices": { "usd": "$3.50" }
        }));

        let err = interpret_card(&scryfall).unwrap_err();

        assert_eq!(err.failure(), EnrichmentFailure::NoListingId);
        assert_eq!(err.into_image_url().as_deref(), Some("https://img/n.jpg"));
    }

    #[test]
    fn test_interpret_card_with_null_price() {
        let scryfall = card(json!({
            "tcgplayer_id": 1,
            "prices": { "usd": null }
        }));

        let listing = interpret_card(&scryfall).unwrap();

        assert_eq!(listing.market_price, None);
        assert_eq!(listing.image_url, None);
    }

    #[test]
    fn test_interpret_card_with_unparsable_price_is_not_a_failure() {
        let scryfall = card(json!({
            "tcgplayer_id": 1,
            "prices": { "usd": "call for price" }
        }));

        assert_eq!(
            interpret_card(&scryfall),
            Ok(CatalogListing {
                market_price: None,
                image_url: None
            })
        );
    }

    #[test]
    fn test_double_faced_card_uses_face_image() {
        let scryfall = card(json!({
            "tcgplayer_id": 7,
            "card_faces": [
                { "name": "Delver of Secrets" },
                { "image_uris": { "normal": "https://img/back.jpg" } }
            ],
            "prices": { "usd": "0.30" }
        }));

        let listing = interpret_card(&scryfall).unwrap();

        assert_eq!(listing.image_url.as_deref(), Some("https://img/back.jpg"));
    }

    #[test]
    fn test_lookup_error_tags() {
        assert_eq!(
            LookupError::MissingIdentifier.failure(),
            EnrichmentFailure::MissingIdentifier
        );
        assert_eq!(
            LookupError::LookupFailed("HTTP 404".to_string()).failure(),
            EnrichmentFailure::LookupFailed
        );
        assert_eq!(
            LookupError::LookupFailed("HTTP 404".to_string()).into_image_url(),
            None
        );
    }
}
