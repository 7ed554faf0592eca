//! # Batching Core
//!
//! The machinery behind [`BatchCoordinator`](crate::BatchCoordinator).
//!
//! ## Module Structure
//!
//! * [`strategy`] - Decides, per model queue, whether a batch should be cut now.
//!   Implements the fixed-size, time-window and adaptive strategies.
//!
//! * [`queue`] - Per-model FIFO queues of pending requests and the batch
//!   cutting pass over them.
//!
//! * [`batch`] - The background collection loop that cuts batches and spawns
//!   their dispatch.
//!
//! * [`handler`] - The `BatchHandler` trait the loop dispatches through.
//!
//! * [`dispatch`] - The predictor-backed `BatchHandler`: one model call per
//!   batch, outputs fanned back by position.
//!
//! * [`worker`] - Owns the background task and shuts it down on drop.
pub mod batch;
pub mod dispatch;
pub mod handler;
pub mod queue;
pub mod strategy;
pub mod worker;
