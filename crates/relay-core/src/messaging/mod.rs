//! Messenger abstractions: the inbound event model and the outbound port.

pub mod paced;
pub mod port;
pub mod types;
