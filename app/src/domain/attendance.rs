//! Attendance roster entities.
//!
//! A roster is the list of `session_enrollments` rows for one class session.
//! The hosted backend owns the rows; these types are the transient copies the
//! client renders and mutates optimistically.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::optimistic::Keyed;

/// Validation errors raised while building roster entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceValidationError {
    /// Enrollment ids are positive row keys.
    NonPositiveEnrollmentId,
    /// Session id was not a UUID.
    InvalidSessionId,
    /// Status string did not name a known attendance status.
    UnknownStatus {
        /// The rejected input.
        value: String,
    },
}

impl fmt::Display for AttendanceValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveEnrollmentId => write!(f, "enrollment id must be positive"),
            Self::InvalidSessionId => write!(f, "session id must be a valid UUID"),
            Self::UnknownStatus { value } => write!(f, "unknown attendance status: {value}"),
        }
    }
}

impl std::error::Error for AttendanceValidationError {}

/// Primary key of a `session_enrollments` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct EnrollmentId(i64);

impl EnrollmentId {
    /// Validate and wrap a row key.
    pub fn new(raw: i64) -> Result<Self, AttendanceValidationError> {
        if raw <= 0 {
            return Err(AttendanceValidationError::NonPositiveEnrollmentId);
        }
        Ok(Self(raw))
    }

    /// Raw row key.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for EnrollmentId {
    type Error = AttendanceValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EnrollmentId> for i64 {
    fn from(value: EnrollmentId) -> Self {
        value.0
    }
}

impl fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Class session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Parse a session id from its textual UUID form.
    pub fn parse(raw: &str) -> Result<Self, AttendanceValidationError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| AttendanceValidationError::InvalidSessionId)
    }

    /// Generate a random session id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for SessionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Attendance state of one athlete in one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Not yet marked.
    Pending,
    /// Attended.
    Present,
    /// Did not attend.
    Absent,
    /// Arrived after the session started.
    Late,
    /// Absence approved in advance.
    Excused,
}

impl AttendanceStatus {
    /// Wire name used by the hosted backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
            Self::Excused => "excused",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = AttendanceValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "late" => Ok(Self::Late),
            "excused" => Ok(Self::Excused),
            _ => Err(AttendanceValidationError::UnknownStatus {
                value: s.to_owned(),
            }),
        }
    }
}

/// One row of a session roster.
///
/// # Examples
/// ```
/// use wild_robot::domain::{AttendanceStatus, EnrollmentId, RosterEntry, SessionId};
///
/// let id = EnrollmentId::new(2).expect("positive id");
/// let entry = RosterEntry::new(id, SessionId::random(), "Sam", AttendanceStatus::Pending);
/// let marked = entry.with_status(AttendanceStatus::Present);
/// assert_eq!(marked.status(), AttendanceStatus::Present);
/// assert_eq!(entry.status(), AttendanceStatus::Pending);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    id: EnrollmentId,
    session_id: SessionId,
    athlete_name: String,
    status: AttendanceStatus,
}

impl RosterEntry {
    /// Build a roster entry.
    pub fn new(
        id: EnrollmentId,
        session_id: SessionId,
        athlete_name: impl Into<String>,
        status: AttendanceStatus,
    ) -> Self {
        Self {
            id,
            session_id,
            athlete_name: athlete_name.into(),
            status,
        }
    }

    /// Enrollment row key.
    pub fn id(&self) -> EnrollmentId {
        self.id
    }

    /// Session this entry belongs to.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Display name of the enrolled athlete.
    pub fn athlete_name(&self) -> &str {
        self.athlete_name.as_str()
    }

    /// Current attendance status.
    pub fn status(&self) -> AttendanceStatus {
        self.status
    }

    /// Copy of this entry carrying `status`.
    #[must_use]
    pub fn with_status(&self, status: AttendanceStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

impl Keyed for RosterEntry {
    type Key = EnrollmentId;

    fn key(&self) -> Self::Key {
        self.id
    }
}
