//! # stage_anchor - Anchor Table
//!
//! The live set of placed anchors, in placement order.
//!
//! The table itself is plain owned data: only the consumer thread mutates
//! it, so it needs no locking. Other threads read through an [`AnchorView`],
//! which the owner republishes after each command. A reader sees the table
//! either entirely before or entirely after a command, never half of a
//! `ClearAll`.

pub mod table;
pub mod view;

pub use table::{AnchorContent, AnchorEntry, AnchorError, AnchorTable};
pub use view::{AnchorSnapshot, AnchorView};

/// Prelude
pub mod prelude {
    pub use crate::table::{AnchorContent, AnchorEntry, AnchorError, AnchorTable};
    pub use crate::view::{AnchorSnapshot, AnchorView};
}
