//! Telemetry domain: progress events, routing and session ids.

mod types;

pub mod events;
pub mod routing;

pub use events::{ProgressEvent, SessionEndedData, SessionStartedData, SlotEventData};
pub use routing::bus::ProgressBus;
pub use types::{new_session_id, now_millis};
