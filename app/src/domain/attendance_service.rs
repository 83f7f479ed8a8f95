//! Attendance roster service.
//!
//! Binds one class session's roster to the optimistic mutation controller:
//! marks are shown immediately, persisted through [`AttendanceGateway`], and
//! reverted with a notification when the backend refuses them.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use super::optimistic::{BulkMutationReport, ChangeEvent, OptimisticMutationController, Settlement};
use super::ports::{AttendanceGateway, AttendanceGatewayError, Notifier};
use super::{AttendanceStatus, EnrollmentId, Error, RosterEntry, SessionId};

const MARK_ACTION: &str = "attendance update";

/// Roster service for a single session.
pub struct AttendanceService<G> {
    session: SessionId,
    gateway: Arc<G>,
    roster: OptimisticMutationController<RosterEntry>,
}

impl<G> AttendanceService<G> {
    /// Create an empty roster for `session`; call [`Self::load`] to fill it.
    pub fn new(session: SessionId, gateway: Arc<G>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            session,
            gateway,
            roster: OptimisticMutationController::new(Vec::new(), notifier),
        }
    }

    /// Session this roster belongs to.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Displayed roster, including unconfirmed marks.
    pub fn roster(&self) -> Vec<RosterEntry> {
        self.roster.snapshot()
    }

    /// Merge a realtime change for this session's enrollments.
    ///
    /// Returns `false` when the event belongs to another session and was
    /// ignored. Deletes carry only a key and always apply.
    pub fn apply_change(&self, event: ChangeEvent<RosterEntry>) -> bool {
        let foreign = match &event {
            ChangeEvent::Inserted(entry) | ChangeEvent::Updated(entry) => {
                entry.session_id() != self.session
            }
            ChangeEvent::Deleted(_) => false,
        };
        if foreign {
            debug!(session = %self.session, "ignoring change for another session");
            return false;
        }
        self.roster.apply_change(event);
        true
    }
}

impl<G> AttendanceService<G>
where
    G: AttendanceGateway + 'static,
{
    /// Fetch the roster from the backend, replacing anything displayed.
    ///
    /// # Errors
    ///
    /// Maps gateway failures to domain errors; the displayed roster is left
    /// unchanged on failure.
    pub async fn load(&self) -> Result<usize, Error> {
        let entries = self
            .gateway
            .fetch_roster(&self.session)
            .await
            .map_err(|error| map_gateway_error(self.session, error))?;
        let entries: Vec<_> = entries
            .into_iter()
            .filter(|entry| entry.session_id() == self.session)
            .collect();
        let count = entries.len();
        self.roster.replace_all(entries);
        debug!(session = %self.session, count, "roster loaded");
        Ok(count)
    }

    /// Mark one enrollment optimistically.
    ///
    /// # Errors
    ///
    /// Returns [`Error::not_found`] without contacting the backend when `id`
    /// is not on the roster. Write failures are not errors: they roll back
    /// and notify, and surface as [`Settlement::RolledBack`] or
    /// [`Settlement::RollbackDiscarded`].
    pub async fn mark(&self, id: EnrollmentId, status: AttendanceStatus) -> Result<Settlement, Error> {
        let gateway = Arc::clone(&self.gateway);
        self.roster
            .mutate(
                &id,
                MARK_ACTION,
                |entry| entry.with_status(status),
                move |entry| async move { gateway.record_status(entry.id(), entry.status()).await },
            )
            .await
    }

    /// Mark every enrollment whose status differs from `status`.
    ///
    /// Each enrollment is an independent mutation; one failed write only
    /// reverts its own row.
    pub async fn mark_all(&self, status: AttendanceStatus) -> BulkMutationReport<EnrollmentId> {
        let targets: Vec<_> = self
            .roster
            .snapshot()
            .iter()
            .filter(|entry| entry.status() != status)
            .map(RosterEntry::id)
            .collect();
        let gateway = &self.gateway;
        self.roster
            .mutate_many(
                &targets,
                MARK_ACTION,
                |entry| entry.with_status(status),
                |entry| {
                    let gateway = Arc::clone(gateway);
                    async move { gateway.record_status(entry.id(), entry.status()).await }
                },
            )
            .await
    }
}

/// Translate a gateway failure, recording the session (and the backend
/// status for rejections) in the error details.
fn map_gateway_error(session: SessionId, error: AttendanceGatewayError) -> Error {
    let mut details = json!({ "session": session.to_string() });
    let mapped = match error {
        AttendanceGatewayError::Unauthorized { message } => {
            Error::unauthorized(format!("roster access refused: {message}"))
        }
        AttendanceGatewayError::Transport { message }
        | AttendanceGatewayError::Timeout { message } => {
            Error::service_unavailable(format!("roster backend unavailable: {message}"))
        }
        AttendanceGatewayError::Rejected { status, message } => {
            details["status"] = json!(status);
            Error::internal(format!("roster request rejected ({status}): {message}"))
        }
        AttendanceGatewayError::Decode { message } => {
            Error::internal(format!("roster payload invalid: {message}"))
        }
    };
    mapped.with_details(details)
}

#[cfg(test)]
mod tests;
