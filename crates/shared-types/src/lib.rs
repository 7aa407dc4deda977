//! # Shared Types Crate
//!
//! Identity and error types shared by every Feedline subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-subsystem identities are defined here.
//! - **Qualified References**: content is always addressed as `EntityRef`
//!   (kind + id), never as a bare integer.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
