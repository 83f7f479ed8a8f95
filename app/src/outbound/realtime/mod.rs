//! Realtime change-feed decoding and dispatch.
//!
//! The hosted backend pushes row-level change envelopes for subscribed
//! tables. Envelopes for `session_enrollments` are decoded into
//! [`ChangeEvent`]s and merged into an already loaded roster.

mod dto;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use self::dto::{ChangeEnvelopeDto, EventTypeDto};
use crate::domain::{AttendanceService, ChangeEvent, EnrollmentId, RosterEntry};
use crate::outbound::rows::{ENROLLMENTS_TABLE, EnrollmentKeyDto, EnrollmentRowDto};

/// Errors raised while decoding a change envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealtimeDecodeError {
    /// The envelope itself was not valid JSON or lacked required fields.
    #[error("invalid change envelope: {0}")]
    Envelope(String),
    /// The row image could not be mapped to a roster entry.
    #[error("invalid enrollment row: {0}")]
    Row(String),
}

/// Decode one change envelope.
///
/// Returns `Ok(None)` for envelopes about other tables.
///
/// # Examples
/// ```
/// use wild_robot::domain::ChangeEvent;
/// use wild_robot::outbound::realtime::decode_enrollment_change;
///
/// let payload = br#"{"table":"session_enrollments","eventType":"DELETE","new":{},"old":{"id":7}}"#;
/// let event = decode_enrollment_change(payload).expect("valid envelope");
/// assert!(matches!(event, Some(ChangeEvent::Deleted(id)) if id.get() == 7));
/// ```
pub fn decode_enrollment_change(
    payload: &[u8],
) -> Result<Option<ChangeEvent<RosterEntry>>, RealtimeDecodeError> {
    let envelope: ChangeEnvelopeDto = serde_json::from_slice(payload)
        .map_err(|err| RealtimeDecodeError::Envelope(err.to_string()))?;
    if envelope.table != ENROLLMENTS_TABLE {
        return Ok(None);
    }

    let event = match envelope.event_type {
        EventTypeDto::Insert => ChangeEvent::Inserted(decode_row(envelope.new)?),
        EventTypeDto::Update => ChangeEvent::Updated(decode_row(envelope.new)?),
        EventTypeDto::Delete => ChangeEvent::Deleted(decode_key(envelope.old)?),
    };
    Ok(Some(event))
}

fn decode_row(image: Value) -> Result<RosterEntry, RealtimeDecodeError> {
    let row: EnrollmentRowDto =
        serde_json::from_value(image).map_err(|err| RealtimeDecodeError::Row(err.to_string()))?;
    row.into_entry().map_err(RealtimeDecodeError::Row)
}

fn decode_key(image: Value) -> Result<EnrollmentId, RealtimeDecodeError> {
    let key: EnrollmentKeyDto =
        serde_json::from_value(image).map_err(|err| RealtimeDecodeError::Row(err.to_string()))?;
    EnrollmentId::new(key.id).map_err(|err| RealtimeDecodeError::Row(err.to_string()))
}

/// Merge every envelope received on `feed` into `service` until the
/// channel closes. Undecodable envelopes are logged and skipped.
///
/// Returns the number of changes applied.
pub async fn pump_enrollment_changes<G>(
    mut feed: mpsc::Receiver<Vec<u8>>,
    service: &AttendanceService<G>,
) -> usize {
    let mut applied = 0;
    while let Some(payload) = feed.recv().await {
        match decode_enrollment_change(&payload) {
            Ok(Some(event)) => {
                if service.apply_change(event) {
                    applied += 1;
                }
            }
            Ok(None) => debug!("skipping change for another table"),
            Err(error) => warn!(%error, "dropping undecodable change envelope"),
        }
    }
    debug!(applied, "change feed closed");
    applied
}
