//! Render-ready views of a snapshot.
//!
//! Drawing itself happens elsewhere. These helpers pick which nodes to draw
//! (the dominant component), where to put them (wire centroids) and which
//! value ranges colour scales should span across an animation.

use crate::components::ComponentMap;
use crate::device::{Point, Topology};
use crate::error::{NnsError, Result};
use crate::state::{min_max, NetworkState};

/// One node to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeLayout {
    /// Index of the wire in the topology.
    pub wire: usize,
    pub component: usize,
    pub position: Point,
    pub voltage: f64,
}

/// Lay out the dominant-component nodes of `state`.
///
/// A full state (one node per wire) is filtered down to the dominant
/// component. A state that was already reduced to the dominant component is
/// paired with the dominant wires in ascending order. Any other size does not
/// fit the topology.
pub fn node_layout(topology: &Topology, components: &ComponentMap, state: &NetworkState) -> Result<Vec<NodeLayout>> {
    if components.len() != topology.wires_count() {
        return Err(NnsError::ShapeMismatch(format!(
            "component map covers {} nodes, topology has {} wires",
            components.len(),
            topology.wires_count()
        )));
    }
    let dominant = components.dominant_members();
    let full = state.size() == topology.wires_count();
    if !full && state.size() != dominant.len() {
        return Err(NnsError::ShapeMismatch(format!(
            "state has {} nodes, expected {} (all wires) or {} (dominant component)",
            state.size(),
            topology.wires_count(),
            dominant.len()
        )));
    }
    let Some(component) = components.dominant() else {
        return Ok(Vec::new());
    };

    let voltages = state.voltages();
    let layout = dominant
        .iter()
        .enumerate()
        .map(|(k, &wire)| NodeLayout {
            wire,
            component,
            position: topology.wires[wire].centroid,
            voltage: if full { voltages[wire] } else { voltages[k] },
        })
        .collect();
    Ok(layout)
}

/// `(min, max)` voltage across all states.
pub fn voltage_range<'a>(states: impl IntoIterator<Item = &'a NetworkState>) -> Option<(f64, f64)> {
    let ranges = states.into_iter().filter_map(NetworkState::voltage_range);
    min_max(ranges.flat_map(|(lo, hi)| [lo, hi]))
}

/// `(min, max)` edge admittance across all states.
pub fn admittance_range<'a>(states: impl IntoIterator<Item = &'a NetworkState>) -> Option<(f64, f64)> {
    let ranges = states.into_iter().filter_map(NetworkState::admittance_range);
    min_max(ranges.flat_map(|(lo, hi)| [lo, hi]))
}
