//! Driven port for attendance rows held by the hosted backend.
//!
//! Adapters translate between the backend's table gateway and roster
//! entities. The domain never retries through this port; a failed write is
//! rolled back locally and the user re-triggers the action.

use async_trait::async_trait;

use crate::domain::{AttendanceStatus, EnrollmentId, RosterEntry, SessionId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by attendance gateway adapters.
    pub enum AttendanceGatewayError {
        /// The backend could not be reached.
        Transport { message: String } =>
            "attendance gateway transport failed: {message}",
        /// The backend did not answer in time.
        Timeout { message: String } =>
            "attendance gateway timed out: {message}",
        /// The access token was missing, expired, or lacks permission.
        Unauthorized { message: String } =>
            "attendance gateway refused credentials: {message}",
        /// The backend rejected the request.
        Rejected { status: u16, message: String } =>
            "attendance gateway rejected request ({status}): {message}",
        /// The response body could not be decoded.
        Decode { message: String } =>
            "attendance gateway response invalid: {message}",
    }
}

/// Port for reading rosters and persisting attendance marks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceGateway: Send + Sync {
    /// Fetch every enrollment of `session`, ordered by enrollment id.
    async fn fetch_roster(
        &self,
        session: &SessionId,
    ) -> Result<Vec<RosterEntry>, AttendanceGatewayError>;

    /// Persist `status` for one enrollment row.
    async fn record_status(
        &self,
        id: EnrollmentId,
        status: AttendanceStatus,
    ) -> Result<(), AttendanceGatewayError>;
}
