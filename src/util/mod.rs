//! Utility functions: deterministic identifiers and timestamp handling.

pub mod id;
pub mod time;

pub use id::{encode_component, generate_history_id, generate_request_id, random_id};
pub use time::{Timings, coerce_millis, day_start, now_millis};
