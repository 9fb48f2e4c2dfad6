//! Results output formatting (CSV and text summary).

use std::io::Write;

use crate::components::ComponentMap;
use crate::device::{Datasheet, Topology};
use crate::error::Result;
use crate::render::NodeLayout;
use crate::state::NetworkState;

/// Write laid-out nodes as CSV.
///
/// Format:
/// ```csv
/// node,component,x,y,voltage
/// 0,0,12.5,40.1,5
/// 3,0,18.2,33.0,4.2
/// ```
pub fn write_nodes_csv<W: Write>(nodes: &[NodeLayout], writer: &mut W) -> Result<()> {
    writeln!(writer, "node,component,x,y,voltage")?;
    for node in nodes {
        writeln!(
            writer,
            "{},{},{},{},{}",
            node.wire, node.component, node.position.x, node.position.y, node.voltage
        )?;
    }
    Ok(())
}

/// Write the edges of a state as CSV, one row per upper-triangle edge.
///
/// `nodes` maps state indices back to wire indices; pass `None` when the
/// state holds one node per wire.
///
/// Format:
/// ```csv
/// from,to,admittance
/// 0,3,0.001
/// ```
pub fn write_edges_csv<W: Write>(state: &NetworkState, nodes: Option<&[usize]>, writer: &mut W) -> Result<()> {
    writeln!(writer, "from,to,admittance")?;
    for (i, j, y) in state.edges() {
        let (from, to) = match nodes {
            Some(map) => (map[i], map[j]),
            None => (i, j),
        };
        writeln!(writer, "{},{},{}", from, to, y)?;
    }
    Ok(())
}

/// Human-readable summary of a run.
pub fn write_summary<W: Write>(
    datasheet: &Datasheet,
    topology: &Topology,
    components: &ComponentMap,
    writer: &mut W,
) -> Result<()> {
    writeln!(writer, "Datasheet")?;
    writeln!(writer, "  wires:           {}", datasheet.wires_count)?;
    writeln!(
        writer,
        "  length:          {} ± {} µm",
        datasheet.length_mean, datasheet.length_std_dev
    )?;
    writeln!(writer, "  package:         {} µm", datasheet.package_size)?;
    writeln!(writer, "  seed:            {}", datasheet.generation_seed)?;
    writeln!(writer, "Topology")?;
    writeln!(writer, "  junctions:       {}", topology.junctions_count())?;
    writeln!(writer, "Components")?;
    writeln!(writer, "  count:           {}", components.component_count())?;
    match components.dominant() {
        Some(id) => writeln!(
            writer,
            "  dominant:        {} ({} of {} wires)",
            id,
            components.dominant_size(),
            components.len()
        )?,
        None => writeln!(writer, "  dominant:        none")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Point;
    use crate::matrix::Matrix;

    #[test]
    fn test_nodes_csv() {
        let nodes = vec![NodeLayout {
            wire: 4,
            component: 1,
            position: Point::new(1.5, 2.0),
            voltage: 0.25,
        }];
        let mut out = Vec::new();
        write_nodes_csv(&nodes, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "node,component,x,y,voltage\n4,1,1.5,2,0.25\n");
    }

    #[test]
    fn test_edges_csv_maps_nodes() {
        let a = Matrix::from_rows(vec![vec![false, true], vec![true, false]]).unwrap();
        let y = Matrix::from_rows(vec![vec![0.0, 0.5], vec![0.5, 0.0]]).unwrap();
        let state = NetworkState::new(a, y, vec![0.0, 0.0]).unwrap();

        let mut out = Vec::new();
        write_edges_csv(&state, None, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "from,to,admittance\n0,1,0.5\n");

        let mut out = Vec::new();
        write_edges_csv(&state, Some(&[3, 7]), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "from,to,admittance\n3,7,0.5\n");
    }

    #[test]
    fn test_summary_mentions_dominant() {
        let ds = Datasheet {
            wires_count: 0,
            length_mean: 10.0,
            length_std_dev: 1.0,
            package_size: 20,
            generation_seed: 1,
        };
        let topology = Topology::new(Vec::new(), Vec::new()).unwrap();
        let map = ComponentMap::from_topology(&topology);
        let mut out = Vec::new();
        write_summary(&ds, &topology, &map, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("dominant:        none"));
        assert!(text.contains("package:         20 µm"));
    }
}
