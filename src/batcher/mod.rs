pub mod batcher;
pub mod config;
pub mod handler;
pub mod split;
pub mod types;

pub use batcher::Batcher;
pub use config::{Options, OptionsBuilder, OptionsBuilderError};
pub use handler::{BatchHandler, HandlerError};
pub use split::split;
pub use types::{BatcherError, Completion, Sizable};
