//! Remote service layer.
//!
//! This module provides the port the engine uses to reach the book catalog
//! and its two adapters. The controller only depends on the trait, which is
//! what makes the sync logic testable without a network.
//!
//! # Modules
//!
//! - `backend`: the [`BookStore`] trait abstraction
//! - `http`: adapter talking to the real service over HTTP
//! - `memory`: in-process adapter with the same observable semantics

pub mod backend;
pub mod http;
pub mod memory;

pub use backend::BookStore;
pub use http::HttpBookStore;
pub use memory::MemoryBookStore;
