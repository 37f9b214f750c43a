// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// Parlor Telemetry - Event Emitter

//! # Telemetry Event Emitter
//!
//! One method per domain event. Each method maps its typed arguments to a
//! payload, wraps it in an [`Envelope`], and hands it to the dispatch path
//! for best-effort delivery.
//!
//! ## Failure policy
//!
//! No method here ever returns an error or panics because of telemetry
//! trouble. Every failure mode (broker down, construction in progress,
//! saturated send buffer, asynchronous delivery failure) ends in a log line
//! and a lost event. Game-server correctness must never depend on telemetry
//! delivery.

use crate::backends::kafka::KafkaConnector;
use crate::backends::traits::{EventSink, SinkConnector};
use crate::config::TelemetryConfig;
use crate::envelope::Envelope;
use crate::errors::Result;
use crate::events::{BlackCardPlayed, BrowserAgent, DeckSummary, GeoLookup, PlayedCard};
use crate::metrics_constants::{METRIC_EVENTS_DROPPED_TOTAL, METRIC_EVENTS_ENQUEUED_TOTAL};
use crate::producer::ProducerCell;
use prometheus::Counter;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, error, info, instrument, trace, warn};

static EVENTS_ENQUEUED_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    crate::metrics_utils::counter(
        METRIC_EVENTS_ENQUEUED_TOTAL,
        "Total number of events enqueued into the broker client's send buffer",
    )
});
static EVENTS_DROPPED_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    crate::metrics_utils::counter(
        METRIC_EVENTS_DROPPED_TOTAL,
        "Total number of events dropped because no live producer was available",
    )
});

/// Emits game-server telemetry events into the configured event stream.
///
/// Cheap to share behind an `Arc`; all methods take `&self` and are safe to
/// call from arbitrarily many threads with no external synchronization.
pub struct TelemetryEmitter<C: SinkConnector = KafkaConnector> {
    build: String,
    cell: ProducerCell<C>,
}

impl TelemetryEmitter<KafkaConnector> {
    /// Create an emitter publishing to Kafka.
    ///
    /// Validates the configuration and makes one eager connection attempt so
    /// a healthy deployment is ready before the first event; a failed attempt
    /// is logged and retried lazily on the first send.
    pub fn new(config: TelemetryConfig) -> Result<Self> {
        let connector = KafkaConnector::new(config)?;
        info!(topic = connector.topic(), "sending telemetry to Kafka");
        let emitter = Self {
            build: connector.build().to_string(),
            cell: ProducerCell::new(connector),
        };
        emitter.cell.ensure_ready();
        Ok(emitter)
    }
}

impl<C: SinkConnector> TelemetryEmitter<C> {
    /// Create an emitter over an arbitrary backend.
    ///
    /// No eager connection is made; the first event connects.
    pub fn with_connector(build: impl Into<String>, connector: C) -> Self {
        Self {
            build: build.into(),
            cell: ProducerCell::new(connector),
        }
    }

    /// Record a server (re)start.
    #[instrument(skip(self))]
    pub fn server_start(&self, startup_id: &str) {
        let mut data = Map::new();
        data.insert("startupId".to_string(), json!(startup_id));
        self.dispatch("serverStart", data);
    }

    /// Record a user connecting.
    ///
    /// Geolocation sub-fields the lookup could not resolve are omitted from
    /// the payload; the `geo` object itself is always present.
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub fn user_connect(
        &self,
        persistent_id: &str,
        session_id: &str,
        geo: Option<&GeoLookup>,
        agent: &BrowserAgent,
    ) {
        let mut data = Map::new();
        data.insert("persistentId".to_string(), json!(persistent_id));
        data.insert("sessionId".to_string(), json!(session_id));
        data.insert("browser".to_string(), Value::Object(agent.to_payload()));
        let geo_payload = geo.map(GeoLookup::to_payload).unwrap_or_default();
        data.insert("geo".to_string(), Value::Object(geo_payload));
        self.dispatch("userConnect", data);
    }

    /// Record a user disconnecting.
    #[instrument(skip(self))]
    pub fn user_disconnect(&self, session_id: &str) {
        let mut data = Map::new();
        data.insert("sessionId".to_string(), json!(session_id));
        self.dispatch("userDisconnect", data);
    }

    /// Record a game starting.
    #[instrument(skip_all, fields(game_id = %game_id))]
    pub fn game_start(
        &self,
        game_id: &str,
        decks: &[DeckSummary],
        blank_cards: usize,
        max_players: usize,
        score_goal: usize,
        has_password: bool,
    ) {
        let mut data = Map::new();
        data.insert("gameId".to_string(), json!(game_id));
        data.insert("blankCardsInDeck".to_string(), json!(blank_cards));
        data.insert("maxPlayers".to_string(), json!(max_players));
        data.insert("scoreGoal".to_string(), json!(score_goal));
        data.insert("hasPassword".to_string(), json!(has_password));
        let deck_payloads: Vec<Value> = decks.iter().map(DeckSummary::to_payload).collect();
        data.insert("decks".to_string(), Value::Array(deck_payloads));
        self.dispatch("gameStart", data);
    }

    /// Record a completed round: who judged, who won, and every card played.
    #[instrument(skip_all, fields(game_id = %game_id, round_id = %round_id))]
    pub fn round_complete(
        &self,
        game_id: &str,
        round_id: &str,
        judge_session_id: &str,
        winner_session_id: &str,
        black_card: &BlackCardPlayed,
        cards_by_user: &HashMap<String, Vec<PlayedCard>>,
    ) {
        let mut data = Map::new();
        data.insert("gameId".to_string(), json!(game_id));
        data.insert("roundId".to_string(), json!(round_id));
        data.insert("judgeSessionId".to_string(), json!(judge_session_id));
        data.insert("winnerSessionId".to_string(), json!(winner_session_id));

        let mut all_cards = Map::new();
        for (user_id, cards) in cards_by_user {
            let payloads: Vec<Value> = cards.iter().map(PlayedCard::to_payload).collect();
            all_cards.insert(user_id.clone(), Value::Array(payloads));
        }
        data.insert("cardsByUserId".to_string(), Value::Object(all_cards));
        data.insert("blackCard".to_string(), black_card.to_payload());

        self.dispatch("roundComplete", data);
    }

    /// Close the current producer if one is live.
    ///
    /// Safe to call at most once at process teardown; extra calls are no-ops.
    pub fn shutdown(&self) {
        debug!("telemetry emitter shutting down");
        self.cell.shutdown();
    }

    /// Best-effort dispatch: serialize, ensure a live sink, enqueue.
    ///
    /// Absorbs every failure; see the module docs for the policy.
    fn dispatch(&self, event_type: &str, data: Map<String, Value>) {
        let envelope = Envelope::new(event_type, data, &self.build);
        let payload = match envelope.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                error!(event = event_type, error = %e, "failed to serialize telemetry event");
                return;
            }
        };
        trace!(event = event_type, payload = %payload, "dispatching telemetry event");

        match self.cell.ensure_ready() {
            Some((generation, sink)) => match sink.enqueue(&payload) {
                Ok(()) => EVENTS_ENQUEUED_TOTAL.inc(),
                Err(e) => {
                    error!(
                        event = event_type,
                        error = %e,
                        "failed to enqueue telemetry event; invalidating producer"
                    );
                    self.cell.invalidate(generation);
                }
            },
            None => {
                EVENTS_DROPPED_TOTAL.inc();
                warn!(event = event_type, payload = %payload, "dropping telemetry event");
            }
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CardSource;
    use crate::testing::MemoryConnector;

    fn emitter_with_hub() -> (
        TelemetryEmitter<MemoryConnector>,
        std::sync::Arc<crate::testing::MemoryHub>,
    ) {
        let connector = MemoryConnector::new();
        let hub = connector.hub();
        (TelemetryEmitter::with_connector("build-1", connector), hub)
    }

    fn single_event(hub: &crate::testing::MemoryHub) -> Value {
        let enqueued = hub.enqueued();
        assert_eq!(enqueued.len(), 1);
        serde_json::from_str(&enqueued[0]).unwrap()
    }

    #[test]
    fn test_server_start_payload() {
        let (emitter, hub) = emitter_with_hub();
        emitter.server_start("startup-abc");

        let event = single_event(&hub);
        assert_eq!(event["type"], json!("serverStart"));
        assert_eq!(event["build"], json!("build-1"));
        assert_eq!(event["data"], json!({ "startupId": "startup-abc" }));
    }

    #[test]
    fn test_user_disconnect_payload() {
        let (emitter, hub) = emitter_with_hub();
        emitter.user_disconnect("sess-1");

        let event = single_event(&hub);
        assert_eq!(event["type"], json!("userDisconnect"));
        assert_eq!(event["data"]["sessionId"], json!("sess-1"));
    }

    #[test]
    fn test_user_connect_payload_with_geo() {
        let (emitter, hub) = emitter_with_hub();
        let geo = GeoLookup {
            city: Some("Berlin".to_string()),
            country: Some("DE".to_string()),
            ..Default::default()
        };
        let agent = BrowserAgent {
            name: "Firefox".to_string(),
            kind: "desktop".to_string(),
            os: "Linux".to_string(),
            language: "de-DE".to_string(),
        };
        emitter.user_connect("pid-1", "sess-2", Some(&geo), &agent);

        let event = single_event(&hub);
        let data = &event["data"];
        assert_eq!(data["persistentId"], json!("pid-1"));
        assert_eq!(data["sessionId"], json!("sess-2"));
        assert_eq!(
            data["browser"],
            json!({ "name": "Firefox", "type": "desktop", "os": "Linux", "language": "de-DE" })
        );
        assert_eq!(data["geo"], json!({ "city": "Berlin", "country": "DE" }));
    }

    #[test]
    fn test_user_connect_without_geo_has_empty_geo_object() {
        let (emitter, hub) = emitter_with_hub();
        let agent = BrowserAgent {
            name: "Safari".to_string(),
            kind: "mobile".to_string(),
            os: "iOS".to_string(),
            language: "en-US".to_string(),
        };
        emitter.user_connect("pid-2", "sess-3", None, &agent);

        let event = single_event(&hub);
        assert_eq!(event["data"]["geo"], json!({}));
    }

    #[test]
    fn test_game_start_deck_provenance_flags() {
        let (emitter, hub) = emitter_with_hub();
        let decks = vec![
            DeckSummary {
                source: CardSource::BuiltIn,
                id: 1,
                name: "Base Set".to_string(),
                white_count: 460,
                black_count: 90,
            },
            DeckSummary {
                source: CardSource::Custom,
                id: -7,
                name: "House Rules".to_string(),
                white_count: 40,
                black_count: 10,
            },
        ];
        emitter.game_start("game-1", &decks, 5, 10, 8, true);

        let event = single_event(&hub);
        let data = &event["data"];
        assert_eq!(data["gameId"], json!("game-1"));
        assert_eq!(data["blankCardsInDeck"], json!(5));
        assert_eq!(data["maxPlayers"], json!(10));
        assert_eq!(data["scoreGoal"], json!(8));
        assert_eq!(data["hasPassword"], json!(true));
        assert_eq!(data["decks"][0]["isCustom"], json!(false));
        assert_eq!(data["decks"][1]["isCustom"], json!(true));
        assert_eq!(data["decks"][1]["name"], json!("House Rules"));
    }

    #[test]
    fn test_round_complete_payload() {
        let (emitter, hub) = emitter_with_hub();
        let black_card = BlackCardPlayed {
            source: CardSource::BuiltIn,
            id: 42,
            text: "Why? _".to_string(),
            draw: 0,
            pick: 1,
        };
        let mut cards_by_user = HashMap::new();
        cards_by_user.insert(
            "user-a".to_string(),
            vec![PlayedCard {
                source: CardSource::Custom,
                write_in: true,
                id: -3,
                text: "a write-in".to_string(),
            }],
        );
        emitter.round_complete("game-1", "round-9", "sess-j", "sess-w", &black_card, &cards_by_user);

        let event = single_event(&hub);
        let data = &event["data"];
        assert_eq!(data["judgeSessionId"], json!("sess-j"));
        assert_eq!(data["winnerSessionId"], json!("sess-w"));
        assert_eq!(data["blackCard"]["id"], json!(42));
        assert_eq!(data["blackCard"]["isCustom"], json!(false));
        let played = &data["cardsByUserId"]["user-a"][0];
        assert_eq!(played["isCustom"], json!(true));
        assert_eq!(played["isWriteIn"], json!(true));
        assert_eq!(played["text"], json!("a write-in"));
    }

    #[test]
    fn test_event_dropped_when_connect_fails() {
        let (emitter, hub) = emitter_with_hub();
        hub.set_fail_connects(true);
        emitter.server_start("s-1");
        assert!(hub.enqueued().is_empty());
    }

    #[test]
    fn test_delivery_failure_forces_reconnect_on_next_event() {
        let (emitter, hub) = emitter_with_hub();
        emitter.user_disconnect("sess-1");
        assert_eq!(hub.connect_attempts(), 1);

        assert!(hub.trip_delivery_failure());
        emitter.user_disconnect("sess-2");

        assert_eq!(hub.connect_attempts(), 2);
        assert_eq!(hub.enqueued().len(), 2);
    }

    #[test]
    fn test_enqueue_failure_invalidates_producer() {
        let (emitter, hub) = emitter_with_hub();
        emitter.server_start("s-1");
        assert_eq!(hub.sink_close_calls(), 0);

        hub.set_fail_enqueues(true);
        emitter.server_start("s-2");
        assert_eq!(hub.sink_close_calls(), 1);

        hub.set_fail_enqueues(false);
        emitter.server_start("s-3");
        assert_eq!(hub.connect_attempts(), 2);
        assert_eq!(hub.enqueued().len(), 2);
    }

    #[test]
    fn test_shutdown_closes_producer() {
        let (emitter, hub) = emitter_with_hub();
        emitter.server_start("s-1");
        emitter.shutdown();
        assert_eq!(hub.sink_close_calls(), 1);
    }
}
