//! Core types for ModaMatch.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod clothing;
pub mod id;
pub mod price;

pub use clothing::ClothingType;
pub use id::*;
pub use price::{Currency, Price};
