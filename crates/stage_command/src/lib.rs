//! # stage_command - Scene Commands & Command Stream
//!
//! Producers describe scene mutations as immutable [`Command`] values and
//! publish them on a [`CommandStream`]. Exactly one [`CommandConsumer`]
//! receives them, in arrival order.
//!
//! ## Architecture
//!
//! ```text
//! UI ──────┐
//! Script ──┼──► CommandStream ──► CommandConsumer ──► applier
//! Network ─┘
//! ```
//!
//! ## Example
//!
//! ```
//! use stage_command::prelude::*;
//!
//! let stream = CommandStream::new(StreamConfig::unbounded());
//! let ui = stream.publisher("ui");
//! let consumer = stream.into_consumer();
//!
//! ui.publish(Command::ClearAll).unwrap();
//! drop(ui);
//!
//! let envelope = consumer.recv().unwrap();
//! assert_eq!(envelope.command, Command::ClearAll);
//! assert!(consumer.recv().is_none());
//! ```

pub mod command;
pub mod stream;

pub use command::Command;
pub use stream::{
    Backpressure, CommandConsumer, CommandEnvelope, CommandPublisher, CommandStream,
    ProducerId, StreamConfig, StreamError, StreamStats,
};

/// Prelude
pub mod prelude {
    pub use crate::command::Command;
    pub use crate::stream::{
        Backpressure, CommandConsumer, CommandEnvelope, CommandPublisher, CommandStream,
        StreamConfig, StreamError,
    };
}
