//! # STRATUM Core
//!
//! Foundational types and traits for the STRATUM PTP timestamping engine.
//!
//! This crate carries no hardware knowledge. It defines:
//! - The unified error type used across the driver stack
//! - Strong newtypes for sequence ids and hardware timestamps
//! - The traits through which the engine talks to the network stack
//!   and the deferred-work machinery
//!
//! ## Design Principles
//!
//! 1. **No panics**: every failure is a typed [`Error`]
//! 2. **Strong typing**: a sequence id is never a bare `u16` in an API
//! 3. **Seams as traits**: the network stack and work scheduler are
//!    collaborators behind traits, never ambient globals

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// =============================================================================
// MODULE EXPORTS
// =============================================================================

pub mod error;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use error::{Error, Result};
pub use traits::*;
pub use types::*;
