//! Core types, algorithms and the storage trait for the sift corpus engine.
//!
//! This crate has no HTTP or database dependencies. The pure pieces of the
//! engine live here (literal matching, the snippet primitive, the
//! co-occurrence counter and graph assembly) so that every backend computes
//! them the same way.

pub mod anchor;
pub mod capability;
pub mod corpus;
pub mod entity;
pub mod error;
pub mod graph;
pub mod keyword;
pub mod literal;
pub mod registry;
pub mod search;
pub mod snippet;
pub mod store;

pub use error::{Error, Result};
