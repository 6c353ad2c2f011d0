//! Shared foundational types used across the warmstart code cache.
//!
//! This crate provides content hashing with an explicit hash seed and the
//! per-context string interner.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;

pub use hash::{ContentHash, HashSeed};
pub use ident::{Ident, Interner};
