//! Domain primitives, services, and ports.
//!
//! Purpose: hold the academy client's behaviour independent of the hosted
//! backend. Adapters in `outbound` implement the traits in [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`) and ErrorCode: transport-agnostic
//!   failures.
//! - OptimisticCollection / OptimisticMutationController: optimistic
//!   mutations with sequence-guarded rollback.
//! - AttendanceService: optimistic attendance marking for one session.
//! - evaluate_access, Role, Zone: role-based zone gating.
//! - FailureKind, FallbackView: fallback selection for unexpected failures.
//! - RecurrenceRule: weekly session generation for batches.

pub mod access;
pub mod attendance;
pub mod attendance_service;
pub mod error;
pub mod failure;
pub mod optimistic;
pub mod ports;
pub mod schedule;

pub use self::access::{
    AccessDecision, AuthenticatedProfile, LOGIN_PATH, ProfileValidationError, Role, Zone,
    evaluate_access,
};
pub use self::attendance::{
    AttendanceStatus, AttendanceValidationError, EnrollmentId, RosterEntry, SessionId,
};
pub use self::attendance_service::AttendanceService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::failure::{FailureKind, FallbackAction, FallbackView};
pub use self::optimistic::{
    BulkMutationReport, ChangeEvent, Keyed, MutationTicket, OptimisticCollection,
    OptimisticMutationController, Settlement,
};
pub use self::schedule::{
    MAX_SESSION_HOURS, MAX_SLOTS, RecurrenceRule, RecurrenceValidationError, SessionSlot,
};
