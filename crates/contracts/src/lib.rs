//! # Contracts
//!
//! Frozen interface contracts shared by every emulator crate.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Every stream event carries a relative offset in milliseconds from run start
//! - Wall-clock time is only sampled at fire time (artifact `timestamp` field)

mod blueprint;
mod broker;
mod control;
mod entity;
mod error;
mod event;
mod selection;

pub use blueprint::*;
pub use broker::*;
pub use control::*;
pub use entity::*;
pub use error::*;
pub use event::*;
pub use selection::Selection;
