//! DTOs for realtime change-feed envelopes.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum EventTypeDto {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChangeEnvelopeDto {
    pub(super) table: String,
    #[serde(rename = "eventType")]
    pub(super) event_type: EventTypeDto,
    #[serde(default)]
    pub(super) new: Value,
    #[serde(default)]
    pub(super) old: Value,
}
