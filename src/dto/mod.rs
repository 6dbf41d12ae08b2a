use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod catalog;
pub mod common;
pub mod health;
pub mod room;
pub mod validation;
pub mod ws;

/// Render a timestamp in the RFC 3339 form the HTTP and WS payloads carry.
pub(crate) fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Current wall-clock time, already formatted for a payload.
pub(crate) fn now_timestamp() -> String {
    format_system_time(SystemTime::now())
}
