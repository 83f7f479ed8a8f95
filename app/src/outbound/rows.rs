//! Row DTOs shared by the REST gateway and the realtime decoder.
//!
//! Both transports carry `session_enrollments` rows in the same JSON shape;
//! they decode into [`EnrollmentRowDto`] first and map to domain entries in
//! one pass.

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{AttendanceStatus, EnrollmentId, RosterEntry, SessionId};

/// Backend table holding one row per athlete per session.
pub(crate) const ENROLLMENTS_TABLE: &str = "session_enrollments";

/// Columns requested when reading roster rows.
pub(crate) const ENROLLMENT_COLUMNS: &str = "id,session_id,athlete_name,status";

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollmentRowDto {
    pub(crate) id: i64,
    pub(crate) session_id: Uuid,
    #[serde(default)]
    pub(crate) athlete_name: Option<String>,
    pub(crate) status: String,
}

impl EnrollmentRowDto {
    pub(crate) fn into_entry(self) -> Result<RosterEntry, String> {
        let id = EnrollmentId::new(self.id).map_err(|err| format!("row {}: {err}", self.id))?;
        let status = self
            .status
            .parse::<AttendanceStatus>()
            .map_err(|err| format!("row {}: {err}", self.id))?;
        Ok(RosterEntry::new(
            id,
            SessionId::from(self.session_id),
            self.athlete_name.unwrap_or_default(),
            status,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollmentKeyDto {
    pub(crate) id: i64,
}
