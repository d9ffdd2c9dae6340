//! Signal bus boundary of the passenger welcome engine.
//!
//! - [`SignalBus`]: the get / set / batched set / subscribe contract the
//!   scenario controller needs from a vehicle data broker client.
//! - [`SignalEvent`] and [`Subscription`]: change notifications for one
//!   signal, delivered in publish order.
//! - [`apply_batch`]: atomic submission of a [`Batch`](welcome_core::Batch).
//! - [`MemorySignalBus`]: in-process broker backed by
//!   `tokio::sync::broadcast`, used for local runs and tests.

pub mod batch;
pub mod client;
pub mod event;
pub mod memory;

pub use batch::{apply_batch, BatchApplyError};
pub use client::{BusError, RejectedEntry, SignalBus};
pub use event::{SignalEvent, Subscription};
pub use memory::MemorySignalBus;
