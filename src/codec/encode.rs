//! Binary encoders, the exact inverse of `decode`.
//!
//! The engine is the usual producer of these files; encoding is used to write
//! fixtures and to export filtered states in the same layout.

use std::io::Write;
use std::path::Path;

use super::FORMAT_VERSION;
use crate::components::ComponentRecord;
use crate::device::{Connection, Datasheet, Interface, Mea, Point, Topology, Wire, MEA_ELECTRODES};
use crate::error::{NnsError, Result};
use crate::state::NetworkState;

/// Write a topology file. `component_ids`, when given, becomes the trailing map section.
pub fn encode_topology<W: Write>(
    datasheet: &Datasheet,
    topology: &Topology,
    component_ids: Option<&[i32]>,
    writer: &mut W,
) -> Result<()> {
    if usize::try_from(datasheet.wires_count).ok() != Some(topology.wires_count()) {
        return Err(NnsError::ShapeMismatch(format!(
            "datasheet declares {} wires, topology has {}",
            datasheet.wires_count,
            topology.wires_count()
        )));
    }
    if let Some(ids) = component_ids {
        if ids.len() != topology.wires_count() {
            return Err(NnsError::ShapeMismatch(format!(
                "component map has {} entries for {} wires",
                ids.len(),
                topology.wires_count()
            )));
        }
    }

    write_i32(writer, FORMAT_VERSION)?;
    write_i32(writer, datasheet.wires_count)?;
    write_f64(writer, datasheet.length_mean)?;
    write_f64(writer, datasheet.length_std_dev)?;
    write_i32(writer, datasheet.package_size)?;
    write_i32(writer, datasheet.generation_seed)?;
    write_i32(writer, len_i32(topology.junctions_count())?)?;

    for wire in &topology.wires {
        write_wire(writer, wire)?;
    }
    for junction in &topology.junctions {
        write_i32(writer, junction.first_wire)?;
        write_i32(writer, junction.second_wire)?;
        write_point(writer, junction.position)?;
    }
    if let Some(ids) = component_ids {
        for &id in ids {
            write_i32(writer, id)?;
        }
    }
    Ok(())
}

/// Write a state file.
pub fn encode_state<W: Write>(state: &NetworkState, writer: &mut W) -> Result<()> {
    write_i32(writer, FORMAT_VERSION)?;
    write_i32(writer, len_i32(state.size())?)?;
    let adjacency: Vec<u8> = state.adjacency().as_slice().iter().map(|&a| u8::from(a)).collect();
    writer.write_all(&adjacency)?;
    for &y in state.admittance().as_slice() {
        write_f64(writer, y)?;
    }
    for &v in state.voltages() {
        write_f64(writer, v)?;
    }
    Ok(())
}

/// Write an interface file.
pub fn encode_interface<W: Write>(interface: &Interface, writer: &mut W) -> Result<()> {
    write_i32(writer, FORMAT_VERSION)?;
    for indices in [&interface.sources, &interface.grounds] {
        write_i32(writer, len_i32(indices.len())?)?;
        for &i in indices.iter() {
            write_i32(writer, i)?;
        }
    }
    write_i32(writer, len_i32(interface.loads.len())?)?;
    for load in &interface.loads {
        write_i32(writer, load.wire)?;
    }
    for load in &interface.loads {
        write_f64(writer, load.weight)?;
    }
    Ok(())
}

/// Write a micro-electrode array file. Weights of non-load electrodes are written as 0.
pub fn encode_mea<W: Write>(mea: &Mea, writer: &mut W) -> Result<()> {
    if mea.electrodes.len() != MEA_ELECTRODES {
        return Err(NnsError::ShapeMismatch(format!(
            "MEA has {} electrodes, the file layout holds {}",
            mea.electrodes.len(),
            MEA_ELECTRODES
        )));
    }
    write_i32(writer, FORMAT_VERSION)?;
    for electrode in &mea.electrodes {
        write_point(writer, electrode.position)?;
    }
    for electrode in &mea.electrodes {
        let wire = match electrode.wire {
            Some(w) => len_i32(w)?,
            None => -1,
        };
        write_i32(writer, wire)?;
    }
    for electrode in &mea.electrodes {
        write_i32(writer, electrode.connection.code())?;
    }
    for electrode in &mea.electrodes {
        let weight = match electrode.connection {
            Connection::Load(weight) => weight,
            _ => 0.0,
        };
        write_f64(writer, weight)?;
    }
    Ok(())
}

/// Write a connected-component file.
pub fn encode_component<W: Write>(record: &ComponentRecord, writer: &mut W) -> Result<()> {
    write_i32(writer, FORMAT_VERSION)?;
    write_i32(writer, len_i32(record.wires_count)?)?;
    write_i32(writer, len_i32(record.junctions_count())?)?;
    write_i32(writer, len_i32(record.wires_skip)?)?;
    write_i32(writer, len_i32(record.junctions_skip)?)?;
    for &index in &record.junctions {
        write_i32(writer, len_i32(index)?)?;
    }
    Ok(())
}

/// Encode a state straight to `path`.
pub fn write_state(path: &Path, state: &NetworkState) -> Result<()> {
    let mut bytes = Vec::new();
    encode_state(state, &mut bytes)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Encode a topology straight to `path`.
pub fn write_topology(
    path: &Path,
    datasheet: &Datasheet,
    topology: &Topology,
    component_ids: Option<&[i32]>,
) -> Result<()> {
    let mut bytes = Vec::new();
    encode_topology(datasheet, topology, component_ids, &mut bytes)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Encode an interface straight to `path`.
pub fn write_interface(path: &Path, interface: &Interface) -> Result<()> {
    let mut bytes = Vec::new();
    encode_interface(interface, &mut bytes)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Encode a micro-electrode array straight to `path`.
pub fn write_mea(path: &Path, mea: &Mea) -> Result<()> {
    let mut bytes = Vec::new();
    encode_mea(mea, &mut bytes)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Encode a connected component straight to `path`.
pub fn write_component(path: &Path, record: &ComponentRecord) -> Result<()> {
    let mut bytes = Vec::new();
    encode_component(record, &mut bytes)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn len_i32(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| NnsError::ShapeMismatch(format!("{len} records exceed the i32 count field")))
}

fn write_i32<W: Write>(writer: &mut W, value: i32) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn write_f64<W: Write>(writer: &mut W, value: f64) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn write_point<W: Write>(writer: &mut W, point: Point) -> Result<()> {
    write_f64(writer, point.x)?;
    write_f64(writer, point.y)
}

fn write_wire<W: Write>(writer: &mut W, wire: &Wire) -> Result<()> {
    write_point(writer, wire.centroid)?;
    write_point(writer, wire.start)?;
    write_point(writer, wire.end)?;
    write_f64(writer, wire.length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode::{DATASHEET_SIZE, INT_SIZE, JUNCTION_SIZE, POINT_SIZE, WIRE_SIZE};
    use crate::device::{Electrode, Junction, Load};
    use crate::matrix::Matrix;

    fn sample() -> (Datasheet, Topology) {
        let ds = Datasheet {
            wires_count: 1,
            length_mean: 10.0,
            length_std_dev: 3.5,
            package_size: 30,
            generation_seed: 1234,
        };
        let wire = Wire {
            centroid: Point::new(1.0, 2.0),
            start: Point::new(0.0, 0.0),
            end: Point::new(2.0, 4.0),
            length: 4.47,
        };
        let junction = Junction {
            first_wire: 0,
            second_wire: 0,
            position: Point::new(1.0, 2.0),
        };
        (ds, Topology::new(vec![wire], vec![junction]).unwrap())
    }

    #[test]
    fn test_topology_layout_size() {
        let (ds, topology) = sample();
        let mut plain = Vec::new();
        encode_topology(&ds, &topology, None, &mut plain).unwrap();
        assert_eq!(plain.len(), INT_SIZE + DATASHEET_SIZE + INT_SIZE + WIRE_SIZE + JUNCTION_SIZE);
        assert_eq!(&plain[..4], &[0, 0, 0, 0]);

        let mut mapped = Vec::new();
        encode_topology(&ds, &topology, Some(&[0]), &mut mapped).unwrap();
        assert_eq!(mapped.len(), plain.len() + INT_SIZE);
    }

    #[test]
    fn test_topology_rejects_wrong_map_length() {
        let (ds, topology) = sample();
        let err = encode_topology(&ds, &topology, Some(&[0, 1]), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, NnsError::ShapeMismatch(_)));
    }

    #[test]
    fn test_topology_rejects_datasheet_mismatch() {
        let (ds, topology) = sample();
        let ds = Datasheet { wires_count: 3, ..ds };
        assert!(encode_topology(&ds, &topology, None, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_state_layout() {
        let a = Matrix::from_rows(vec![vec![false, true], vec![true, false]]).unwrap();
        let y = Matrix::from_rows(vec![vec![0.0, 0.5], vec![0.5, 0.0]]).unwrap();
        let state = NetworkState::new(a, y, vec![1.0, 2.0]).unwrap();
        let mut bytes = Vec::new();
        encode_state(&state, &mut bytes).unwrap();
        assert_eq!(bytes.len(), 4 + 4 + 4 + 4 * 8 + 2 * 8);
        assert_eq!(&bytes[4..8], &2i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &[0, 1, 1, 0]);
    }

    #[test]
    fn test_interface_layout() {
        let it = Interface {
            sources: vec![4],
            grounds: vec![],
            loads: vec![Load { wire: 1, weight: 0.25 }],
        };
        let mut bytes = Vec::new();
        encode_interface(&it, &mut bytes).unwrap();
        // version, n, source, n, n, load wire, load weight
        assert_eq!(bytes.len(), 6 * 4 + 8);
        assert_eq!(&bytes[20..24], &1i32.to_le_bytes());
        assert_eq!(&bytes[24..], &0.25f64.to_le_bytes());
    }

    #[test]
    fn test_mea_layout() {
        let electrode = Electrode {
            position: Point::new(1.0, 1.0),
            wire: None,
            connection: Connection::Ground,
        };
        let mut mea = Mea {
            electrodes: vec![electrode; MEA_ELECTRODES],
        };
        mea.electrodes[2] = Electrode {
            wire: Some(7),
            connection: Connection::Load(0.5),
            ..electrode
        };
        let mut bytes = Vec::new();
        encode_mea(&mea, &mut bytes).unwrap();
        assert_eq!(bytes.len(), INT_SIZE + 16 * (POINT_SIZE + 2 * INT_SIZE + 8));
        let wires = INT_SIZE + 16 * POINT_SIZE;
        assert_eq!(&bytes[wires..wires + 4], &(-1i32).to_le_bytes());
        assert_eq!(&bytes[wires + 8..wires + 12], &7i32.to_le_bytes());

        mea.electrodes.pop();
        assert!(matches!(encode_mea(&mea, &mut Vec::new()), Err(NnsError::ShapeMismatch(_))));
    }

    #[test]
    fn test_component_layout() {
        let record = ComponentRecord::new(2, 5, 1, vec![1]).unwrap();
        let mut bytes = Vec::new();
        encode_component(&record, &mut bytes).unwrap();
        let expected: Vec<u8> = [0i32, 2, 1, 5, 1, 1].iter().flat_map(|v| v.to_le_bytes()).collect();
        assert_eq!(bytes, expected);
    }
}
