//! Reader and post-processor for nanowire-network simulation snapshots.
//!
//! The simulation engine writes a device's topology and its electrical state
//! at every step to versioned binary files. This crate decodes them, maps the
//! network into connected components and prepares the dominant component for
//! drawing.

pub mod codec;
pub mod components;
pub mod config;
pub mod device;
pub mod error;
pub mod matrix;
pub mod output;
pub mod render;
pub mod run;
pub mod state;
pub mod stats;

pub use error::{NnsError, Result};
