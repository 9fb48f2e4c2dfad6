//! Versioned binary file format shared with the simulation engine.

pub mod decode;
pub mod encode;

use std::path::Path;

use serde::Deserialize;

use crate::components::ComponentRecord;
use crate::device::{Datasheet, Interface, Mea, Topology};
use crate::error::{NnsError, Result};
use crate::state::NetworkState;
use crate::stats::Stats;

/// The only file version this crate reads or writes.
pub const FORMAT_VERSION: i32 = 0;

/// Whether a topology file ends with the per-wire component map.
///
/// Depends on the engine release that wrote the file, not on anything in the
/// file itself, so it has to be declared by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyVariant {
    #[default]
    Plain,
    WithComponentMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Version the caller expects in every header.
    pub version: i32,
    pub variant: TopologyVariant,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            variant: TopologyVariant::Plain,
        }
    }
}

/// Contents of a topology file.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyFile {
    pub datasheet: Datasheet,
    pub topology: Topology,
    /// Present only for `TopologyVariant::WithComponentMap`.
    pub component_ids: Option<Vec<i32>>,
}

/// Read and decode a topology file.
pub fn load_topology(path: &Path, options: &DecodeOptions, stats: Option<&mut Stats>) -> Result<TopologyFile> {
    let _span = tracing::info_span!("load_topology", path = %path.display()).entered();
    let bytes = read_file(path, stats)?;
    let file = decode::decode_topology(&bytes, options)?;
    tracing::info!(
        wires = file.topology.wires_count(),
        junctions = file.topology.junctions_count(),
        "topology loaded"
    );
    Ok(file)
}

/// Read and decode a state file.
pub fn load_state(path: &Path, options: &DecodeOptions, stats: Option<&mut Stats>) -> Result<NetworkState> {
    let _span = tracing::debug_span!("load_state", path = %path.display()).entered();
    let bytes = read_file(path, stats)?;
    let state = decode::decode_state(&bytes, options)?;
    tracing::debug!(size = state.size(), edges = state.edge_count(), "state loaded");
    Ok(state)
}

/// Read and decode an interface file.
pub fn load_interface(path: &Path, options: &DecodeOptions, stats: Option<&mut Stats>) -> Result<Interface> {
    let _span = tracing::debug_span!("load_interface", path = %path.display()).entered();
    let bytes = read_file(path, stats)?;
    decode::decode_interface(&bytes, options)
}

/// Read and decode a micro-electrode array file.
pub fn load_mea(path: &Path, options: &DecodeOptions, stats: Option<&mut Stats>) -> Result<Mea> {
    let _span = tracing::debug_span!("load_mea", path = %path.display()).entered();
    let bytes = read_file(path, stats)?;
    decode::decode_mea(&bytes, options)
}

/// Read and decode a connected-component file.
pub fn load_component(path: &Path, options: &DecodeOptions, stats: Option<&mut Stats>) -> Result<ComponentRecord> {
    let _span = tracing::debug_span!("load_component", path = %path.display()).entered();
    let bytes = read_file(path, stats)?;
    decode::decode_component(&bytes, options)
}

/// Read a whole file; the handle is closed before decoding starts.
fn read_file(path: &Path, stats: Option<&mut Stats>) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|e| {
        NnsError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    if let Some(s) = stats {
        s.record_file(bytes.len());
    }
    Ok(bytes)
}
