//! Event routing: in-process fan-out to progress subscribers.

pub mod bus;
