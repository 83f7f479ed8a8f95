//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod attendance_gateway;
mod notifier;

#[cfg(test)]
pub use attendance_gateway::MockAttendanceGateway;
pub use attendance_gateway::{AttendanceGateway, AttendanceGatewayError};
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{Notification, Notifier, Severity};
