//! # stage_kernel - Command Applier & Scene Processor
//!
//! The kernel owns the mutable side of Stagehand: the runtime, the scene
//! registry and the anchor table. It consumes the command stream on a single
//! thread and applies one command at a time.
//!
//! ## Architecture
//!
//! ```text
//! CommandConsumer ──► SceneProcessor ──► CommandApplier ──┬─► SceneRegistry::resolve
//!                          │                              ├─► SceneRuntime attach/detach
//!                          │                              └─► AnchorTable
//!                          ├──► AnchorView (published after each command)
//!                          └──► ReportSink (one CommandReport per command)
//! ```
//!
//! Every command is all-or-nothing: a rejected command leaves the table and
//! registry exactly as they were.

pub mod apply;
pub mod config;
pub mod processor;
pub mod sink;

pub use apply::{
    ApplyStats, CommandApplier, CommandReport, Outcome, PlacementConfig, RejectReason,
};
pub use config::{ConfigError, ConfigResult, KernelConfig, SceneEntry, BUILTIN_SCENES};
pub use processor::{KernelError, ProcessorHandle, ProcessorSummary, SceneProcessor};
pub use sink::{ChannelSink, FanoutSink, LogSink, ReportSink};

/// Prelude
pub mod prelude {
    pub use crate::apply::{CommandApplier, CommandReport, Outcome, RejectReason};
    pub use crate::config::KernelConfig;
    pub use crate::processor::{ProcessorHandle, SceneProcessor};
    pub use crate::sink::{ChannelSink, LogSink, ReportSink};
}
