//! Outbound adapters for the hosted backend and user notifications.

pub mod gateway;
pub mod notify;
pub mod realtime;

mod rows;
