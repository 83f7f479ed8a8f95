//! REST table gateway adapters.
//!
//! This module provides a thin HTTP implementation of the
//! `AttendanceGateway` port against the hosted backend's `/rest/v1` API.

mod http_gateway;

pub use http_gateway::RestAttendanceGateway;
