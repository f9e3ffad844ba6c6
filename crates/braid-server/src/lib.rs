//! Braid server library
//!
//! The drift-routing engine: a staged pipeline that ingests one message,
//! embeds it, scores it against the conversation's branch centroids,
//! classifies the outcome (STAY / ROUTE / BRANCH), and atomically
//! materializes the decision. The REST surface and the binary wire it up.

pub mod api;
pub mod classifier;
pub mod executor;
pub mod facts;
pub mod models;
pub mod pipeline;
pub mod state;
