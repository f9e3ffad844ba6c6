//! Embedding sidecar client
//!
//! TigerStyle: All similarity I/O goes through one trait so tests and
//! simulations can swap the transport.
//!
//! The sidecar is a sentence-transformer HTTP service
//! (paraphrase-MiniLM-L6-v2, 384 dims by default) exposing `/embed`,
//! `/similarity`, `/analyze-drift`, and `/health`. This crate provides:
//! - [`EmbeddingService`]: the trait the routing pipeline depends on
//! - [`HttpEmbeddingService`]: production implementation over reqwest
//! - [`MockEmbeddingService`]: deterministic token-hash implementation for tests

pub mod client;
pub mod error;
pub mod mock;
pub mod types;

pub use client::{EmbeddingService, HttpEmbeddingService};
pub use error::{EmbedError, EmbedResult};
pub use mock::MockEmbeddingService;
pub use types::{DriftAnalysis, EmbeddingHealth, EntityOverlap, MessageSignals};
