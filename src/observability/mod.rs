//! Structured logging for the synchronization engine.
//!
//! Every interesting transition in the crate is traced with structured
//! fields: reload tickets and applied revisions, request methods and paths,
//! event dispatch counts, swallowed handler panics. This module provides the
//! default subscriber setup; hosts embedding the engine into a larger
//! application can skip it and install their own.
//!
//! # Configuration
//!
//! Trace level is controlled via:
//! 1. `RUST_LOG` environment variable (highest priority)
//! 2. `trace_level` config option
//! 3. Default: `"info"`
//!
//! # Usage
//!
//! Initialize tracing early in the host lifecycle:
//!
//! ```rust
//! use shelfsync::observability::init_tracing;
//! use shelfsync::Config;
//!
//! let config = Config::default();
//! init_tracing(&config);
//!
//! tracing::debug!("engine initialized");
//! ```
//!
//! # Modules
//!
//! - [`init`]: Tracing initialization and subscriber setup

mod init;

pub use init::init_tracing;
