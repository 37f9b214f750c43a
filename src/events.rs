// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// Parlor Telemetry - Domain Event Types

//! # Domain Event Types
//!
//! Collaborator types consumed at the emitter boundary. The telemetry core
//! only reads these; they are owned by the game server. Each type knows how
//! to render itself as a JSON payload fragment.

use serde_json::{json, Map, Value};

/// Provenance of a card or deck.
///
/// Carried explicitly by every entity so the emitter never has to infer
/// provenance from the concrete entity type. Additional custom-deck sources
/// become new variants here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSource {
    /// Shipped with the server's built-in card database
    BuiltIn,
    /// Loaded from a user-supplied deck source
    Custom,
}

impl CardSource {
    /// Whether this entity came from a user-supplied source.
    #[must_use]
    pub fn is_custom(self) -> bool {
        matches!(self, CardSource::Custom)
    }
}

/// Geolocation lookup result for a connecting user.
///
/// Every field is optional; fields the upstream lookup could not resolve are
/// omitted from the payload entirely rather than serialized as null.
#[derive(Debug, Clone, Default)]
pub struct GeoLookup {
    /// City name
    pub city: Option<String>,
    /// ISO country code
    pub country: Option<String>,
    /// ISO subdivision codes, most specific last
    pub subdivisions: Vec<String>,
    /// ISO code of the represented country (e.g. military bases)
    pub represented_country: Option<String>,
    /// Postal code
    pub postal: Option<String>,
}

impl GeoLookup {
    pub(crate) fn to_payload(&self) -> Map<String, Value> {
        let mut geo = Map::new();
        if let Some(ref city) = self.city {
            geo.insert("city".to_string(), json!(city));
        }
        if let Some(ref country) = self.country {
            geo.insert("country".to_string(), json!(country));
        }
        if !self.subdivisions.is_empty() {
            geo.insert("subdivisions".to_string(), json!(self.subdivisions));
        }
        if let Some(ref represented) = self.represented_country {
            geo.insert("representedCountry".to_string(), json!(represented));
        }
        if let Some(ref postal) = self.postal {
            geo.insert("postal".to_string(), json!(postal));
        }
        geo
    }
}

/// Parsed user-agent details for a connecting user.
#[derive(Debug, Clone)]
pub struct BrowserAgent {
    /// Browser name
    pub name: String,
    /// Browser type (desktop, mobile, bot, ...)
    pub kind: String,
    /// Operating system
    pub os: String,
    /// Accept-language value
    pub language: String,
}

impl BrowserAgent {
    pub(crate) fn to_payload(&self) -> Map<String, Value> {
        let mut browser = Map::new();
        browser.insert("name".to_string(), json!(self.name));
        browser.insert("type".to_string(), json!(self.kind));
        browser.insert("os".to_string(), json!(self.os));
        browser.insert("language".to_string(), json!(self.language));
        browser
    }
}

/// Summary of one deck in use by a game.
#[derive(Debug, Clone)]
pub struct DeckSummary {
    /// Deck provenance
    pub source: CardSource,
    /// Deck identifier; custom deck ids are not stable across restarts
    pub id: i64,
    /// Display name
    pub name: String,
    /// Number of white cards in the deck
    pub white_count: usize,
    /// Number of black cards in the deck
    pub black_count: usize,
}

impl DeckSummary {
    pub(crate) fn to_payload(&self) -> Value {
        json!({
            "isCustom": self.source.is_custom(),
            "id": self.id,
            "name": self.name,
            "whiteCount": self.white_count,
            "blackCount": self.black_count,
        })
    }
}

/// A white card played during a round.
#[derive(Debug, Clone)]
pub struct PlayedCard {
    /// Card provenance
    pub source: CardSource,
    /// Whether the player wrote the card text in at play time
    pub write_in: bool,
    /// Card identifier; custom card ids are not stable across restarts
    pub id: i64,
    /// Card text
    pub text: String,
}

impl PlayedCard {
    pub(crate) fn to_payload(&self) -> Value {
        json!({
            "isCustom": self.source.is_custom(),
            "isWriteIn": self.write_in,
            "id": self.id,
            "text": self.text,
        })
    }
}

/// The black card a round was played against.
#[derive(Debug, Clone)]
pub struct BlackCardPlayed {
    /// Card provenance
    pub source: CardSource,
    /// Card identifier; custom card ids are not stable across restarts
    pub id: i64,
    /// Card text
    pub text: String,
    /// Number of extra cards each player draws
    pub draw: u32,
    /// Number of cards each player must play
    pub pick: u32,
}

impl BlackCardPlayed {
    pub(crate) fn to_payload(&self) -> Value {
        json!({
            "isCustom": self.source.is_custom(),
            "id": self.id,
            "text": self.text,
            "draw": self.draw,
            "pick": self.pick,
        })
    }
}
