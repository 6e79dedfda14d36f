//! # Proof Bus - Broker Plumbing for the Proof Engine
//!
//! Two channels connect the engine to the rest of the system:
//!
//! ```text
//!  anchoring stages                                front-end instances
//! ┌──────────────┐   cal/btc/eth   ┌────────┐   route = instance id   ┌──────┐
//! │ aggregator,  │ ──────────────→ │ engine │ ──────────────────────→ │ fe-1 │
//! │ calendar,    │   StageQueue    │        │  NotificationPublisher  ├──────┤
//! │ anchor svcs  │ ←── ack/reject ─│        │                         │ fe-2 │
//! └──────────────┘                 └────────┘                         └──────┘
//! ```
//!
//! - **Stage queue:** at-least-once delivery. Every delivery is settled with
//!   exactly one `ack` or `reject`; rejected deliveries are requeued until
//!   the redelivery limit moves them to the dead-letter list.
//! - **Notification exchange:** header routing, not broadcast. Each binding
//!   has its own buffer and only receives notifications whose route equals
//!   its instance id.
//!
//! The in-memory implementations back tests and the replay runtime; a
//! networked broker implements the same traits.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod binding;
pub mod exchange;
pub mod queue;

pub use binding::InstanceBinding;
pub use exchange::{InMemoryNotificationExchange, NotificationPublisher, PublishError};
pub use queue::{Delivery, InMemoryStageQueue, QueueError, QueueStats, StageQueue};

/// Notifications buffered per binding before further ones are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Deliveries rejected more often than this are dead-lettered.
pub const DEFAULT_MAX_REDELIVERIES: u32 = 5;
