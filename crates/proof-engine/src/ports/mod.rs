//! # Ports Layer
//!
//! - `inbound.rs` - Driving ports (stage event handling)
//! - `outbound.rs` - Driven ports (store, exchange)

pub mod inbound;
pub mod outbound;
