//! # microbatch
//!
//! Adaptive batching of fine-grained async operations, built on Tokio.
//!
//! Many small operations (individual publishes, acknowledgments, row writes)
//! are aggregated into fewer, larger calls to a caller-supplied handler while
//! bounding batch item count, batch byte size and handler concurrency. Every
//! item gets its own completion signal carrying the outcome of the batch it
//! was dispatched in.
//!
//! ## Features
//!
//! - **FIFO batching** with per-batch count and byte ceilings
//! - **Bounded handler concurrency** — never more than `max_handlers`
//!   invocations in flight
//! - **Per-item completion** — awaitable (`add`) or deferred (`add_no_wait`)
//! - **Graceful drain** — `shutdown_and_drain` dispatches every queued item,
//!   below-threshold remainders included, and waits for quiescence
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use microbatch::{Batcher, OptionsBuilder};
//!
//! let options = OptionsBuilder::default()
//!     .min_batch_size(10usize)
//!     .max_batch_size(100usize)
//!     .max_handlers(4usize)
//!     .build()?;
//!
//! let batcher = Batcher::new(options, |items: Vec<String>| async move {
//!     publish_all(items).await?;
//!     Ok(())
//! });
//!
//! batcher.add("hello".to_string()).await?;
//! batcher.shutdown_and_drain().await;
//! ```
//!
//! ## Modules
//!
//! - [`batcher`] - The batching primitive: facade, options, handler trait,
//!   splitter and error types

pub mod batcher;

pub use batcher::{
    split, BatchHandler, Batcher, BatcherError, Completion, HandlerError, Options, OptionsBuilder,
    OptionsBuilderError, Sizable,
};
