//! Braid core: error taxonomy, routing policy, and the similarity kernel
//!
//! TigerStyle: Explicit types, explicit limits, no hidden control flow.
//!
//! This crate holds everything the rest of the workspace agrees on:
//! - The [`Error`] taxonomy every crate converts into
//! - Named constants for every tunable (no magic numbers at call sites)
//! - [`RoutingPolicy`]: the resolved knob set a single routing request runs under
//! - The pure similarity kernel: [`cosine`], [`drift_action`], [`update_centroid`]

pub mod constants;
pub mod error;
pub mod policy;
pub mod similarity;

pub use constants::*;
pub use error::{Error, Result};
pub use policy::{PolicyOverrides, RoutingPolicy};
pub use similarity::{cosine, drift_action, update_centroid, DriftAction};
